//! Access/refresh token issuance and verification.

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::diagnostics::{DiagnosticSink, TracingSink};
use crate::error::TokenError;
use crate::identity::{Identity, ensure_fields_match};
use crate::metrics;
use crate::token::codec::{DecodedToken, Header, Payload, TokenCodec};
use crate::token::signer::{SignatureEncoding, TokenSigner, constant_time_eq};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Outcome of [`TokenService::validate`].
///
/// Expiry is reported as a success: callers decide what an expired but
/// decodable token means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// Signature matches and the token has not expired
    Valid,
    /// Token expiry lies in the past
    Expired,
    /// Signature does not match
    Invalid,
    /// Token could not be decoded
    Corrupted,
}

impl ValidationOutcome {
    /// Whether the outcome counts as success (`Valid` or `Expired`).
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Valid | Self::Expired)
    }

    /// Reason label.
    #[must_use]
    pub const fn reason(self) -> &'static str {
        match self {
            Self::Valid => "VALID",
            Self::Expired => "EXPIRED",
            Self::Invalid => "INVALID",
            Self::Corrupted => "CORRUPTED",
        }
    }

    /// Error describing a failed outcome, `None` on success.
    #[must_use]
    pub fn error(self) -> Option<TokenError> {
        match self {
            Self::Valid | Self::Expired => None,
            Self::Invalid => Some(TokenError::SignatureMismatch),
            Self::Corrupted => Some(TokenError::corrupted("token could not be decoded")),
        }
    }
}

/// Which token established a successful verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// The access token validated on its own
    Access,
    /// The access token failed and the refresh token validated
    Refresh,
}

/// Successful verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verified {
    /// Token that carried the verification
    pub kind: TokenKind,
    /// Validation outcome of that token
    pub outcome: ValidationOutcome,
}

impl Verified {
    /// Whether the accepting token had already expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.outcome == ValidationOutcome::Expired
    }
}

/// A token together with the key it should validate under.
#[derive(Debug, Clone, Copy)]
pub struct KeyedToken<'a> {
    /// Signing key
    pub key: &'a str,
    /// Transport-encoded token
    pub token: &'a str,
}

impl<'a> KeyedToken<'a> {
    /// Pair a key with a token.
    #[must_use]
    pub const fn new(key: &'a str, token: &'a str) -> Self {
        Self { key, token }
    }

    const fn is_supplied(&self) -> bool {
        !self.key.is_empty() && !self.token.is_empty()
    }
}

/// Tokens produced by [`TokenService::generate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    /// Access token
    pub access_token: String,
    /// Access token expiry, epoch milliseconds
    pub date_access: i64,
    /// Refresh token, when a refresh key was supplied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Refresh token expiry, epoch milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_refresh: Option<i64>,
}

/// Issues and verifies signed, expiring tokens.
pub struct TokenService {
    config: Config,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn DiagnosticSink>,
}

impl TokenService {
    /// Create a service using the system clock and tracing diagnostics.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` fails [`Config::validate`].
    pub fn new(config: Config) -> Result<Self, TokenError> {
        config.validate()?;
        Ok(Self {
            config,
            clock: Arc::new(SystemClock),
            sink: Arc::new(TracingSink),
        })
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

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Sign `data` into a token expiring after the access lifetime.
    ///
    /// # Errors
    ///
    /// `MissingKey` if `key` is empty.
    pub fn encode(&self, data: Value, key: &str) -> Result<String, TokenError> {
        let now = self.clock.now_millis();
        let payload = Payload {
            iss: self.config.issuer_domain.clone(),
            r#gen: now,
            exp: now.saturating_add(self.config.access_lifetime_ms()),
            data,
        };
        self.encode_payload(&payload, key)
    }

    /// Sign a caller-built payload.
    ///
    /// # Errors
    ///
    /// `MissingKey` if `key` is empty.
    pub fn encode_payload(&self, payload: &Payload, key: &str) -> Result<String, TokenError> {
        self.observe("TokenService::encode", || {
            if key.is_empty() {
                return Err(TokenError::MissingKey);
            }
            let signing_input = TokenCodec::encode(&Header::default(), payload)?;
            let signature = TokenSigner::sign(&signing_input, key, SignatureEncoding::Base64)?;
            Ok(TokenCodec::assemble(&signing_input, &signature))
        })
    }

    /// Decode a token without checking its signature.
    ///
    /// # Errors
    ///
    /// `MalformedToken` for empty or structurally invalid input,
    /// `CorruptedInput` for undecodable segments.
    pub fn decode(&self, token: &str) -> Result<DecodedToken, TokenError> {
        self.observe("TokenService::decode", || {
            if token.is_empty() {
                return Err(TokenError::malformed("empty token"));
            }
            TokenCodec::decode(token)
        })
    }

    /// Check a token's expiry and signature.
    ///
    /// Expiry is checked before the signature.
    #[must_use]
    pub fn validate(&self, token: &str, key: &str) -> ValidationOutcome {
        let outcome = match self.decode(token) {
            Err(_) => ValidationOutcome::Corrupted,
            Ok(decoded) if decoded.payload.is_expired_at(self.clock.now_millis()) => {
                ValidationOutcome::Expired
            }
            Ok(decoded) => {
                let matches = TokenSigner::sign(&decoded.signing_input, key, SignatureEncoding::Base64)
                    .map(|expected| constant_time_eq(&expected, &decoded.signature))
                    .unwrap_or(false);
                if matches {
                    ValidationOutcome::Valid
                } else {
                    self.sink
                        .report("TokenService::validate", &TokenError::SignatureMismatch);
                    ValidationOutcome::Invalid
                }
            }
        };

        metrics::record_validation(outcome.reason());
        debug!(reason = outcome.reason(), "Validated token");
        outcome
    }

    /// Verify that `access` (or, failing that, `refresh`) authenticates `identity`.
    ///
    /// # Errors
    ///
    /// `MissingIdentityField` when the identity is incomplete, decoding errors
    /// for unreadable tokens, `IdentityMismatch` when token data diverges, and
    /// the failed validation's error when neither token validates.
    pub fn verify(
        &self,
        identity: &Identity,
        access: KeyedToken<'_>,
        refresh: Option<KeyedToken<'_>>,
    ) -> Result<Verified, TokenError> {
        let result = self.verify_chain(identity, access, refresh);

        let (via, status) = match &result {
            Ok(verified) => (
                match verified.kind {
                    TokenKind::Access => "access",
                    TokenKind::Refresh => "refresh",
                },
                "success",
            ),
            Err(err) => ("none", err.code()),
        };
        metrics::record_verification(via, status);
        debug!(via, status, "Verified identity");

        result
    }

    fn verify_chain(
        &self,
        identity: &Identity,
        access: KeyedToken<'_>,
        refresh: Option<KeyedToken<'_>>,
    ) -> Result<Verified, TokenError> {
        self.observe("TokenService::verify", || identity.ensure_verifiable())?;

        let access_decoded = self.decode(access.token)?;
        self.observe("TokenService::verify", || {
            identity.ensure_matches(&access_decoded.payload.data)
        })?;

        let access_outcome = self.validate(access.token, access.key);
        if access_outcome.is_success() {
            return Ok(Verified {
                kind: TokenKind::Access,
                outcome: access_outcome,
            });
        }

        let Some(refresh) = refresh.filter(KeyedToken::is_supplied) else {
            return Err(access_outcome
                .error()
                .unwrap_or_else(|| TokenError::internal("failed outcome without error")));
        };

        let refresh_decoded = self.decode(refresh.token)?;
        self.observe("TokenService::verify", || match &refresh_decoded.payload.data {
            Value::Object(refresh_data) => {
                ensure_fields_match(&access_decoded.payload.data, refresh_data)
            }
            _ => Err(TokenError::identity_mismatch("refresh data is not an object")),
        })?;

        let refresh_outcome = self.validate(refresh.token, refresh.key);
        match refresh_outcome.error() {
            None => Ok(Verified {
                kind: TokenKind::Refresh,
                outcome: refresh_outcome,
            }),
            Some(err) => Err(err),
        }
    }

    /// Issue an access token, plus a refresh token when `refresh_key` is non-empty.
    ///
    /// # Errors
    ///
    /// `MissingKey` if `access_key` is empty.
    pub fn generate(
        &self,
        identity: &Identity,
        access_key: &str,
        refresh_key: Option<&str>,
    ) -> Result<TokenPair, TokenError> {
        let now = self.clock.now_millis();
        let mut payload = Payload {
            iss: self.config.issuer_domain.clone(),
            r#gen: now,
            exp: now.saturating_add(self.config.access_lifetime_ms()),
            data: identity.to_data(),
        };

        let access_token = self.encode_payload(&payload, access_key)?;
        let date_access = payload.exp;
        metrics::record_token_issued("access");

        let mut pair = TokenPair {
            access_token,
            date_access,
            refresh_token: None,
            date_refresh: None,
        };

        if let Some(refresh_key) = refresh_key.filter(|key| !key.is_empty()) {
            payload.exp = now.saturating_add(self.config.refresh_lifetime_ms());
            pair.refresh_token = Some(self.encode_payload(&payload, refresh_key)?);
            pair.date_refresh = Some(payload.exp);
            metrics::record_token_issued("refresh");
        }

        debug!(
            issuer = %self.config.issuer_domain,
            date_access = pair.date_access,
            date_refresh = ?pair.date_refresh,
            "Generated token pair"
        );

        Ok(pair)
    }

    /// Run `op`, reporting any failure to the sink under `context`.
    fn observe<T>(
        &self,
        context: &str,
        op: impl FnOnce() -> Result<T, TokenError>,
    ) -> Result<T, TokenError> {
        op().inspect_err(|err| self.sink.report(context, err))
    }
}
