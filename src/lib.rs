//! Token authentication library.
//!
//! Issues and verifies HMAC-SHA512 signed access/refresh token pairs bound to
//! an identity record, and issues and verifies CSRF tokens. Everything is
//! synchronous and stateless; transport and storage belong to the caller.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod clock;
pub mod config;
pub mod csrf;
pub mod diagnostics;
pub mod error;
pub mod identity;
pub mod metrics;
pub mod telemetry;
pub mod token;

// Re-exports for convenience
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use csrf::{CsrfClaims, CsrfService, CsrfToken};
pub use diagnostics::{DiagnosticSink, TracingSink};
pub use error::TokenError;
pub use identity::Identity;
pub use telemetry::{LogSettings, init_tracing};
pub use token::{KeyedToken, TokenPair, TokenService, ValidationOutcome, Verified};
