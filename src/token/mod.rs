//! Compact signed tokens: wire codec, HMAC signer and the issuing service.

pub mod codec;
pub mod service;
pub mod signer;

pub use codec::{DecodedToken, Header, Payload, TokenCodec};
pub use service::{KeyedToken, TokenKind, TokenPair, TokenService, ValidationOutcome, Verified};
pub use signer::{SignatureEncoding, TokenSigner};
