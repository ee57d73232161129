//! HMAC-SHA512 signing.
//!
//! Token signatures are base64, CSRF signatures are hex. Verification uses
//! constant-time comparison.

use crate::error::TokenError;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use sha2::Sha512;
use subtle::ConstantTimeEq;

type HmacSha512 = Hmac<Sha512>;

/// Output encoding of a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureEncoding {
    /// Standard padded base64, used for access and refresh tokens
    Base64,
    /// Lowercase hex, used for CSRF tokens
    Hex,
}

/// Computes HMAC-SHA512 digests.
pub struct TokenSigner;

impl TokenSigner {
    /// Sign `message` with `key`.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the MAC cannot be keyed.
    pub fn sign(message: &str, key: &str, encoding: SignatureEncoding) -> Result<String, TokenError> {
        let mut mac = HmacSha512::new_from_slice(key.as_bytes())
            .map_err(|e| TokenError::internal(format!("hmac key rejected: {}", e)))?;
        mac.update(message.as_bytes());
        let digest = mac.finalize().into_bytes();

        Ok(match encoding {
            SignatureEncoding::Base64 => STANDARD.encode(digest),
            SignatureEncoding::Hex => hex::encode(digest),
        })
    }

    /// Check `expected` against a fresh signature of `message`.
    #[must_use]
    pub fn verify(message: &str, key: &str, expected: &str, encoding: SignatureEncoding) -> bool {
        let Ok(computed) = Self::sign(message, key, encoding) else {
            return false;
        };
        constant_time_eq(&computed, expected)
    }
}

/// Compare two strings without short-circuiting on content.
///
/// The length check leaks only the length, which is fixed per encoding.
#[must_use]
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
