//! Error types for token and CSRF operations.
//!
//! Every failure inside the crate is converted into a [`TokenError`] at the
//! operation boundary. None of them are transient, so nothing here is retried.

use thiserror::Error;

/// Errors returned by token and CSRF operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Token does not have three `.` separated segments.
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    /// Token segments are not valid base64, UTF-8 or JSON.
    #[error("Corrupted token input: {0}")]
    CorruptedInput(String),

    /// Recomputed signature differs from the stored one.
    #[error("Token signature mismatch")]
    SignatureMismatch,

    /// Encode or generate invoked without a signing key.
    #[error("Missing signing key")]
    MissingKey,

    /// Identity record lacks a field required for verification.
    #[error("Identity is missing required field: {0}")]
    MissingIdentityField(&'static str),

    /// Token payload data diverges from the identity or the paired token.
    #[error("Identity mismatch on field: {0}")]
    IdentityMismatch(String),

    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unexpected internal failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TokenError {
    /// Create a malformed token error.
    #[must_use]
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedToken(msg.into())
    }

    /// Create a corrupted input error.
    #[must_use]
    pub fn corrupted(msg: impl Into<String>) -> Self {
        Self::CorruptedInput(msg.into())
    }

    /// Create an identity mismatch error.
    #[must_use]
    pub fn identity_mismatch(field: impl Into<String>) -> Self {
        Self::IdentityMismatch(field.into())
    }

    /// Create a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Stable error code for callers that map errors onto responses.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MalformedToken(_) => TOKEN_MALFORMED,
            Self::CorruptedInput(_) => TOKEN_CORRUPTED,
            Self::SignatureMismatch => TOKEN_SIGNATURE_MISMATCH,
            Self::MissingKey => TOKEN_MISSING_KEY,
            Self::MissingIdentityField(_) => TOKEN_IDENTITY_INCOMPLETE,
            Self::IdentityMismatch(_) => TOKEN_IDENTITY_MISMATCH,
            Self::Config(_) => TOKEN_CONFIG_ERROR,
            Self::Internal(_) => TOKEN_INTERNAL_ERROR,
        }
    }

    /// Cryptographic and structural failures never succeed on retry.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        false
    }
}

impl From<serde_json::Error> for TokenError {
    fn from(err: serde_json::Error) -> Self {
        Self::CorruptedInput(err.to_string())
    }
}

impl From<base64::DecodeError> for TokenError {
    fn from(err: base64::DecodeError) -> Self {
        Self::CorruptedInput(err.to_string())
    }
}

// Error codes
/// Token structure is malformed.
pub const TOKEN_MALFORMED: &str = "TOKEN_MALFORMED";
/// Token segments could not be decoded.
pub const TOKEN_CORRUPTED: &str = "TOKEN_CORRUPTED";
/// Token signature did not match.
pub const TOKEN_SIGNATURE_MISMATCH: &str = "TOKEN_SIGNATURE_MISMATCH";
/// No signing key supplied.
pub const TOKEN_MISSING_KEY: &str = "TOKEN_MISSING_KEY";
/// Identity lacks required fields.
pub const TOKEN_IDENTITY_INCOMPLETE: &str = "TOKEN_IDENTITY_INCOMPLETE";
/// Token data does not match identity.
pub const TOKEN_IDENTITY_MISMATCH: &str = "TOKEN_IDENTITY_MISMATCH";
/// Configuration invalid.
pub const TOKEN_CONFIG_ERROR: &str = "TOKEN_CONFIG_ERROR";
/// Internal failure.
pub const TOKEN_INTERNAL_ERROR: &str = "TOKEN_INTERNAL_ERROR";
