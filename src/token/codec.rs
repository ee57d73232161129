//! Compact token serialization.
//!
//! Wire format: `urlencode(b64(header) "." b64(payload) "." signature)`.

use crate::error::TokenError;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

/// Label written into every header. Signing is always HMAC-SHA512.
pub const HEADER_ALG: &str = "SHA256";

/// Token header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Hashing scheme label
    pub alg: String,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            alg: HEADER_ALG.to_string(),
        }
    }
}

/// Token payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    /// Issuer domain
    pub iss: String,
    /// Generation time, epoch milliseconds
    pub r#gen: i64,
    /// Expiry time, epoch milliseconds
    pub exp: i64,
    /// Claims bound to the identity
    pub data: Value,
}

impl Payload {
    /// Whether the payload expired strictly before `now_millis`.
    #[must_use]
    pub const fn is_expired_at(&self, now_millis: i64) -> bool {
        self.exp < now_millis
    }
}

/// A token split into its parts.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedToken {
    /// Parsed header
    pub header: Header,
    /// Parsed payload
    pub payload: Payload,
    /// First two segments exactly as they appeared, joined by `.`
    pub signing_input: String,
    /// Opaque signature segment
    pub signature: String,
}

/// Serializes and parses compact tokens.
pub struct TokenCodec;

impl TokenCodec {
    /// Build the signing input `b64(header) "." b64(payload)`.
    ///
    /// # Errors
    ///
    /// Returns an error if either part fails to serialize.
    pub fn encode(header: &Header, payload: &Payload) -> Result<String, TokenError> {
        let header = encode_segment(header)?;
        let payload = encode_segment(payload)?;
        Ok(format!("{}.{}", header, payload))
    }

    /// Append the signature segment and percent-encode for transport.
    #[must_use]
    pub fn assemble(signing_input: &str, signature: &str) -> String {
        let compact = format!("{}.{}", signing_input, signature);
        urlencoding::encode(&compact).into_owned()
    }

    /// Parse a transport-encoded token.
    ///
    /// # Errors
    ///
    /// `MalformedToken` when fewer than three segments are present,
    /// `CorruptedInput` when a segment fails to decode.
    pub fn decode(token: &str) -> Result<DecodedToken, TokenError> {
        let compact = urlencoding::decode(token)
            .map_err(|e| TokenError::corrupted(format!("percent-decoding failed: {}", e)))?;

        let mut segments = compact.splitn(3, '.');
        let (Some(header_b64), Some(payload_b64), Some(signature)) =
            (segments.next(), segments.next(), segments.next())
        else {
            return Err(TokenError::malformed(format!(
                "expected 3 segments, got {}",
                compact.split('.').count()
            )));
        };

        let header: Header = decode_segment(header_b64)?;
        let payload: Payload = decode_segment(payload_b64)?;

        Ok(DecodedToken {
            header,
            payload,
            signing_input: format!("{}.{}", header_b64, payload_b64),
            signature: signature.to_string(),
        })
    }
}

fn encode_segment<T: Serialize>(value: &T) -> Result<String, TokenError> {
    let json = serde_json::to_vec(value)
        .map_err(|e| TokenError::internal(format!("segment serialization failed: {}", e)))?;
    Ok(STANDARD.encode(json))
}

fn decode_segment<T: DeserializeOwned>(segment: &str) -> Result<T, TokenError> {
    let bytes = STANDARD.decode(segment)?;
    Ok(serde_json::from_slice(&bytes)?)
}
