//! Token configuration.
//!
//! Configuration is built once, validated, and moved into the services at
//! construction. Nothing mutates it afterwards.

use crate::error::TokenError;
use std::env;

/// Milliseconds in one day.
pub const MILLIS_PER_DAY: i64 = 86_400_000;

const DEFAULT_ISSUER_DOMAIN: &str = "localhost";
const DEFAULT_ACCESS_LIFETIME_DAYS: i64 = 1;
const DEFAULT_REFRESH_LIFETIME_DAYS: i64 = 30;

/// Token issuance configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Issuer written into the `iss` claim
    pub issuer_domain: String,
    /// Access token lifetime in days
    pub access_lifetime_days: i64,
    /// Refresh token lifetime in days
    pub refresh_lifetime_days: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            issuer_domain: DEFAULT_ISSUER_DOMAIN.to_string(),
            access_lifetime_days: DEFAULT_ACCESS_LIFETIME_DAYS,
            refresh_lifetime_days: DEFAULT_REFRESH_LIFETIME_DAYS,
        }
    }
}

impl Config {
    /// Create a configuration from explicit values.
    #[must_use]
    pub fn new(
        issuer_domain: impl Into<String>,
        access_lifetime_days: i64,
        refresh_lifetime_days: i64,
    ) -> Self {
        Self {
            issuer_domain: issuer_domain.into(),
            access_lifetime_days,
            refresh_lifetime_days,
        }
    }

    /// Set the issuer domain.
    #[must_use]
    pub fn with_issuer_domain(mut self, domain: impl Into<String>) -> Self {
        self.issuer_domain = domain.into();
        self
    }

    /// Set the access token lifetime.
    #[must_use]
    pub const fn with_access_lifetime_days(mut self, days: i64) -> Self {
        self.access_lifetime_days = days;
        self
    }

    /// Set the refresh token lifetime.
    #[must_use]
    pub const fn with_refresh_lifetime_days(mut self, days: i64) -> Self {
        self.refresh_lifetime_days = days;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file is read first when present.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but invalid.
    pub fn from_env() -> Result<Self, TokenError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, TokenError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let issuer_domain = lookup("TOKEN_ISSUER_DOMAIN")
            .unwrap_or_else(|| DEFAULT_ISSUER_DOMAIN.to_string());
        let access_lifetime_days = parse_var(
            &lookup,
            "TOKEN_ACCESS_LIFETIME_DAYS",
            DEFAULT_ACCESS_LIFETIME_DAYS,
        )?;
        let refresh_lifetime_days = parse_var(
            &lookup,
            "TOKEN_REFRESH_LIFETIME_DAYS",
            DEFAULT_REFRESH_LIFETIME_DAYS,
        )?;

        let config = Self {
            issuer_domain,
            access_lifetime_days,
            refresh_lifetime_days,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values that would produce unusable tokens.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty issuer or a negative lifetime.
    pub fn validate(&self) -> Result<(), TokenError> {
        if self.issuer_domain.trim().is_empty() {
            return Err(TokenError::config("issuer domain must not be empty"));
        }
        if self.access_lifetime_days < 0 {
            return Err(TokenError::config(format!(
                "access lifetime must not be negative, got {}",
                self.access_lifetime_days
            )));
        }
        if self.refresh_lifetime_days < 0 {
            return Err(TokenError::config(format!(
                "refresh lifetime must not be negative, got {}",
                self.refresh_lifetime_days
            )));
        }
        Ok(())
    }

    /// Access token lifetime in milliseconds.
    #[must_use]
    pub const fn access_lifetime_ms(&self) -> i64 {
        self.access_lifetime_days.saturating_mul(MILLIS_PER_DAY)
    }

    /// Refresh token lifetime in milliseconds.
    #[must_use]
    pub const fn refresh_lifetime_ms(&self) -> i64 {
        self.refresh_lifetime_days.saturating_mul(MILLIS_PER_DAY)
    }
}

/// Parse a variable with a default value.
fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> Result<T, TokenError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(val) => val
            .trim()
            .parse()
            .map_err(|e| TokenError::config(format!("Invalid {}: {}", name, e))),
        None => Ok(default),
    }
}
