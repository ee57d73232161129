//! Tracing subscriber setup for binaries embedding the crate.
//!
//! Diagnostics from this crate are emitted under the `token_auth` target,
//! so they can be filtered apart from the host application's own logs.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Tracing target prefix of every event emitted by this crate.
pub const CRATE_TARGET: &str = "token_auth";

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// Level applied to every target not matched below
    pub default_level: String,
    /// Level applied to `token_auth` events
    pub token_auth_level: String,
    /// Emit JSON lines instead of the human-readable format
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            default_level: "info".to_string(),
            // Signature and decode failures are reported at warn
            token_auth_level: "warn".to_string(),
            json: false,
        }
    }
}

impl LogSettings {
    /// Read `TOKEN_AUTH_LOG` and `TOKEN_AUTH_LOG_JSON` through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();
        if let Some(level) = lookup("TOKEN_AUTH_LOG").filter(|v| !v.trim().is_empty()) {
            settings.token_auth_level = level.trim().to_string();
        }
        if let Some(json) = lookup("TOKEN_AUTH_LOG_JSON") {
            settings.json = matches!(json.trim(), "1" | "true" | "TRUE" | "yes");
        }
        settings
    }

    /// Filter directives used when `RUST_LOG` is unset.
    #[must_use]
    pub fn directives(&self) -> String {
        format!(
            "{},{}={}",
            self.default_level, CRATE_TARGET, self.token_auth_level
        )
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over [`LogSettings::directives`].
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(settings: &LogSettings) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(settings.directives()));

    let registry = tracing_subscriber::registry().with(filter);
    if settings.json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()?;
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()?;
    }

    tracing::debug!(target: CRATE_TARGET, directives = %settings.directives(), "tracing installed");
    Ok(())
}
