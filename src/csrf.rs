//! Anti-forgery tokens.
//!
//! A CSRF token is the hex HMAC-SHA512 of `{"id":..,"createdAt":..}`. The
//! digest cannot be reversed, so the caller keeps `id` and `created_at`
//! (typically in session state) and hands them back for verification.

use crate::clock::{Clock, SystemClock};
use crate::diagnostics::{DiagnosticSink, TracingSink};
use crate::error::TokenError;
use crate::metrics;
use crate::token::signer::{SignatureEncoding, TokenSigner};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Context a CSRF token is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsrfClaims {
    /// Caller-chosen identifier, e.g. a session id
    pub id: String,
    /// Issue time, epoch milliseconds
    pub created_at: i64,
}

impl CsrfClaims {
    /// Bind `id` to `created_at`.
    #[must_use]
    pub fn new(id: impl Into<String>, created_at: i64) -> Self {
        Self {
            id: id.into(),
            created_at,
        }
    }

    fn message(&self) -> Result<String, TokenError> {
        serde_json::to_string(self)
            .map_err(|e| TokenError::internal(format!("csrf serialization failed: {}", e)))
    }
}

/// Issued CSRF token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsrfToken {
    /// Hex signature handed to the client
    pub csrf_token: String,
    /// Identifier the signature is bound to
    pub id: String,
    /// Issue time, epoch milliseconds
    pub created_at: i64,
}

impl CsrfToken {
    /// Claims to retain for later verification.
    #[must_use]
    pub fn claims(&self) -> CsrfClaims {
        CsrfClaims::new(self.id.clone(), self.created_at)
    }
}

/// Issues and verifies CSRF tokens.
pub struct CsrfService {
    clock: Arc<dyn Clock>,
    sink: Arc<dyn DiagnosticSink>,
}

impl Default for CsrfService {
    fn default() -> Self {
        Self::new()
    }
}

impl CsrfService {
    /// Create a service using the system clock and tracing diagnostics.
    #[must_use]
    pub fn new() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            sink: Arc::new(TracingSink),
        }
    }

    /// Replace the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the diagnostic sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Issue a token bound to `id` and the current time.
    ///
    /// Any key is accepted, including an empty one.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the claims fail to serialize.
    pub fn generate(&self, id: &str, key: &str) -> Result<CsrfToken, TokenError> {
        let claims = CsrfClaims::new(id, self.clock.now_millis());
        let result = Self::sign(&claims, key);
        metrics::record_csrf("generate", if result.is_ok() { "success" } else { "failure" });

        let csrf_token = result.inspect_err(|err| {
            self.sink.report("CsrfService::generate", err);
        })?;
        debug!(id = %claims.id, created_at = claims.created_at, "Issued CSRF token");

        Ok(CsrfToken {
            csrf_token,
            id: claims.id,
            created_at: claims.created_at,
        })
    }

    /// Check `token` against the retained claims.
    #[must_use]
    pub fn verify(&self, key: &str, claims: &CsrfClaims, token: &str) -> bool {
        let valid = match claims.message() {
            Ok(message) => TokenSigner::verify(&message, key, token, SignatureEncoding::Hex),
            Err(err) => {
                self.sink.report("CsrfService::verify", &err);
                false
            }
        };

        metrics::record_csrf("verify", if valid { "success" } else { "failure" });
        valid
    }

    fn sign(claims: &CsrfClaims, key: &str) -> Result<String, TokenError> {
        TokenSigner::sign(&claims.message()?, key, SignatureEncoding::Hex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::diagnostics::NullSink;

    fn service() -> CsrfService {
        CsrfService::new()
            .with_clock(Arc::new(ManualClock::new(1_000)))
            .with_sink(Arc::new(NullSink))
    }

    #[test]
    fn test_claims_json() {
        let claims = CsrfClaims::new("x", 1000);
        assert_eq!(claims.message().unwrap(), r#"{"id":"x","createdAt":1000}"#);
    }

    #[test]
    fn test_generate_and_verify() {
        let svc = service();
        let token = svc.generate("session-1", "secret").unwrap();

        assert_eq!(token.id, "session-1");
        assert_eq!(token.created_at, 1_000);
        assert_eq!(token.csrf_token.len(), 128);
        assert!(svc.verify("secret", &token.claims(), &token.csrf_token));
    }

    #[test]
    fn test_verify_rejects_other_context() {
        let svc = service();
        let token = svc.generate("session-1", "secret").unwrap();

        assert!(!svc.verify("other", &token.claims(), &token.csrf_token));
        assert!(!svc.verify("secret", &CsrfClaims::new("session-2", 1_000), &token.csrf_token));
        assert!(!svc.verify("secret", &CsrfClaims::new("session-1", 1_001), &token.csrf_token));
    }

    #[test]
    fn test_matches_direct_hmac() {
        let expected = TokenSigner::sign(
            r#"{"id":"x","createdAt":1000}"#,
            "key",
            SignatureEncoding::Hex,
        )
        .unwrap();
        assert_eq!(service().generate("x", "key").unwrap().csrf_token, expected);
    }

    #[test]
    fn test_empty_key_round_trip() {
        let svc = service();
        let expected = TokenSigner::sign(
            r#"{"id":"x","createdAt":1000}"#,
            "",
            SignatureEncoding::Hex,
        )
        .unwrap();

        let token = svc.generate("x", "").unwrap();
        assert_eq!(token.csrf_token, expected);
        assert!(svc.verify("", &CsrfClaims::new("x", 1_000), &expected));
        assert!(!svc.verify("secret", &CsrfClaims::new("x", 1_000), &expected));
    }

    #[test]
    fn test_token_serialization() {
        let token = service().generate("x", "key").unwrap();
        let json = serde_json::to_value(&token).unwrap();
        assert_eq!(json["id"], "x");
        assert_eq!(json["createdAt"], 1_000);
        assert!(json["csrfToken"].is_string());
    }
}
