//! Integration tests for the access → refresh verification chain.

use proptest::prelude::*;
use std::sync::{Arc, Mutex};
use token_auth::config::MILLIS_PER_DAY;
use token_auth::diagnostics::NullSink;
use token_auth::token::{SignatureEncoding, TokenCodec, TokenKind};
use token_auth::{
    Config, DiagnosticSink, Identity, KeyedToken, ManualClock, TokenError, TokenService,
    ValidationOutcome,
};

const NOW: i64 = 1_700_000_000_000;

struct RecordingSink(Mutex<Vec<String>>);

impl DiagnosticSink for RecordingSink {
    fn report(&self, context: &str, error: &TokenError) {
        if let Ok(mut entries) = self.0.lock() {
            entries.push(format!("{}: {}", context, error.code()));
        }
    }
}

fn service(clock: Arc<ManualClock>) -> TokenService {
    TokenService::new(Config::new("auth.example.com", 1, 7))
        .unwrap()
        .with_clock(clock)
        .with_sink(Arc::new(NullSink))
}

/// Flip the first character of the signature segment.
fn corrupt_signature(token: &str) -> String {
    let compact = urlencoding::decode(token).unwrap();
    let (signing_input, signature) = compact.rsplit_once('.').unwrap();
    let mut chars: Vec<char> = signature.chars().collect();
    chars[0] = if chars[0] == 'A' { 'B' } else { 'A' };
    TokenCodec::assemble(signing_input, &chars.into_iter().collect::<String>())
}

#[test]
fn test_generate_verify_scenario() {
    let svc = service(Arc::new(ManualClock::new(NOW)));
    let identity = Identity::new("u1", "k1", "k2");

    let pair = svc.generate(&identity, "k1", Some("k2")).unwrap();
    let access = pair.access_token.clone();
    let refresh = pair.refresh_token.clone().unwrap();

    let verified = svc
        .verify(
            &identity,
            KeyedToken::new("k1", &access),
            Some(KeyedToken::new("k2", &refresh)),
        )
        .unwrap();
    assert_eq!(verified.kind, TokenKind::Access);
    assert_eq!(verified.outcome, ValidationOutcome::Valid);

    // A tampered access signature falls through to the refresh token
    let tampered = corrupt_signature(&access);
    assert_ne!(tampered, access);
    assert_eq!(svc.validate(&tampered, "k1"), ValidationOutcome::Invalid);

    let verified = svc
        .verify(
            &identity,
            KeyedToken::new("k1", &tampered),
            Some(KeyedToken::new("k2", &refresh)),
        )
        .unwrap();
    assert_eq!(verified.kind, TokenKind::Refresh);
    assert_eq!(verified.outcome, ValidationOutcome::Valid);

    // Without the refresh pair the tampered token is rejected
    assert_eq!(
        svc.verify(&identity, KeyedToken::new("k1", &tampered), None),
        Err(TokenError::SignatureMismatch)
    );
}

#[test]
fn test_refresh_outlives_access() {
    let clock = Arc::new(ManualClock::new(NOW));
    let svc = service(Arc::clone(&clock));
    let identity = Identity::new("u1", "k1", "k2");

    let pair = svc.generate(&identity, "k1", Some("k2")).unwrap();
    assert_eq!(pair.date_access, NOW + MILLIS_PER_DAY);
    assert_eq!(pair.date_refresh, Some(NOW + 7 * MILLIS_PER_DAY));

    clock.advance(3 * MILLIS_PER_DAY);
    assert_eq!(
        svc.validate(&pair.access_token, "k1"),
        ValidationOutcome::Expired
    );
    assert_eq!(
        svc.validate(pair.refresh_token.as_deref().unwrap(), "k2"),
        ValidationOutcome::Valid
    );
}

#[test]
fn test_corrupted_access_token_fails_before_fallback() {
    let svc = service(Arc::new(ManualClock::new(NOW)));
    let identity = Identity::new("u1", "k1", "k2");
    let pair = svc.generate(&identity, "k1", Some("k2")).unwrap();

    let result = svc.verify(
        &identity,
        KeyedToken::new("k1", "not-a-token"),
        Some(KeyedToken::new("k2", pair.refresh_token.as_deref().unwrap())),
    );
    assert!(matches!(result, Err(TokenError::MalformedToken(_))));
}

#[test]
fn test_corrupted_refresh_token() {
    let svc = service(Arc::new(ManualClock::new(NOW)));
    let identity = Identity::new("u1", "k1", "k2");
    let pair = svc.generate(&identity, "k1", None).unwrap();

    let result = svc.verify(
        &identity,
        KeyedToken::new("wrong", &pair.access_token),
        Some(KeyedToken::new("k2", "a.b")),
    );
    assert!(matches!(result, Err(TokenError::MalformedToken(_))));
}

#[test]
fn test_generate_does_not_touch_identity() {
    let svc = service(Arc::new(ManualClock::new(NOW)));
    let identity = Identity::new("u1", "k1", "k2").with_field("role", "admin");
    let before = identity.clone();

    let pair = svc.generate(&identity, "k1", Some("k2")).unwrap();
    assert_eq!(identity, before);

    let decoded = svc.decode(&pair.access_token).unwrap();
    assert_eq!(decoded.payload.data, identity.to_data());
}

#[test]
fn test_failures_reach_diagnostic_sink() {
    let sink = Arc::new(RecordingSink(Mutex::new(Vec::new())));
    let svc = TokenService::new(Config::default())
        .unwrap()
        .with_clock(Arc::new(ManualClock::new(NOW)))
        .with_sink(sink.clone());

    assert!(svc.decode("only.two").is_err());
    assert!(svc.encode(serde_json::json!({}), "").is_err());

    let entries = sink.0.lock().unwrap();
    assert_eq!(
        *entries,
        vec![
            "TokenService::decode: TOKEN_MALFORMED".to_string(),
            "TokenService::encode: TOKEN_MISSING_KEY".to_string(),
        ]
    );
}

#[test]
fn test_signature_encoding_is_base64() {
    let svc = service(Arc::new(ManualClock::new(NOW)));
    let token = svc.encode(serde_json::json!({"userId": "u1"}), "k1").unwrap();
    let decoded = svc.decode(&token).unwrap();

    let expected = token_auth::token::TokenSigner::sign(
        &decoded.signing_input,
        "k1",
        SignatureEncoding::Base64,
    )
    .unwrap();
    assert_eq!(decoded.signature, expected);
}

fn arb_identity() -> impl Strategy<Value = Identity> {
    ("[a-z0-9]{1,16}", "[a-z0-9]{1,16}", "[a-z0-9]{1,16}")
        .prop_map(|(id, key, rkey)| Identity::new(id, key, rkey))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// An identity missing any required field never verifies.
    #[test]
    fn prop_incomplete_identity_never_verifies(
        identity in arb_identity(),
        missing in prop::sample::select(vec!["userId", "userKey", "userRkey"]),
    ) {
        let svc = service(Arc::new(ManualClock::new(NOW)));
        let pair = svc.generate(&identity, "k1", Some("k2")).unwrap();

        let mut fields = identity.fields().clone();
        fields.remove(missing);
        let incomplete = Identity::from_map(fields);

        let result = svc.verify(
            &incomplete,
            KeyedToken::new("k1", &pair.access_token),
            Some(KeyedToken::new("k2", pair.refresh_token.as_deref().unwrap())),
        );
        prop_assert_eq!(result, Err(TokenError::MissingIdentityField(missing)));
    }

    /// Tokens issued for one identity never verify another.
    #[test]
    fn prop_identity_binding(a in arb_identity(), b in arb_identity()) {
        prop_assume!(a != b);
        let svc = service(Arc::new(ManualClock::new(NOW)));
        let pair = svc.generate(&a, "k1", None).unwrap();

        let result = svc.verify(&b, KeyedToken::new("k1", &pair.access_token), None);
        let is_mismatch = matches!(result, Err(TokenError::IdentityMismatch(_)));
        prop_assert!(is_mismatch);
    }

    /// Generating with only an access key omits the refresh token.
    #[test]
    fn prop_access_only_generation(identity in arb_identity(), access_days in 0i64..30) {
        let svc = TokenService::new(Config::new("auth.example.com", access_days, access_days + 1))
            .unwrap()
            .with_clock(Arc::new(ManualClock::new(NOW)))
            .with_sink(Arc::new(NullSink));

        let access_only = svc.generate(&identity, "k1", None).unwrap();
        prop_assert!(access_only.refresh_token.is_none());
        prop_assert!(access_only.date_refresh.is_none());

        let both = svc.generate(&identity, "k1", Some("k2")).unwrap();
        prop_assert!(both.refresh_token.is_some());
        prop_assert!(both.date_refresh.unwrap() > both.date_access);
    }
}
