//! Prometheus metrics for token operations.

use once_cell::sync::Lazy;
use prometheus::{CounterVec, register_counter_vec};

/// Tokens issued counter.
pub static TOKENS_ISSUED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "token_auth_tokens_issued_total",
        "Total number of tokens issued",
        &["token_type"]
    )
    .expect("Failed to register tokens_issued metric")
});

/// Token validations counter.
pub static VALIDATIONS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "token_auth_validations_total",
        "Total number of token validations",
        &["reason"]
    )
    .expect("Failed to register validations metric")
});

/// Identity verifications counter.
pub static VERIFICATIONS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "token_auth_verifications_total",
        "Total number of identity verifications",
        &["via", "status"]
    )
    .expect("Failed to register verifications metric")
});

/// CSRF operations counter.
pub static CSRF_OPERATIONS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "token_auth_csrf_total",
        "Total number of CSRF operations",
        &["operation", "status"]
    )
    .expect("Failed to register csrf metric")
});

/// Record a token issuance.
pub fn record_token_issued(token_type: &str) {
    TOKENS_ISSUED.with_label_values(&[token_type]).inc();
}

/// Record a validation outcome.
pub fn record_validation(reason: &str) {
    VALIDATIONS.with_label_values(&[reason]).inc();
}

/// Record a verification result.
pub fn record_verification(via: &str, status: &str) {
    VERIFICATIONS.with_label_values(&[via, status]).inc();
}

/// Record a CSRF operation.
pub fn record_csrf(operation: &str, status: &str) {
    CSRF_OPERATIONS
        .with_label_values(&[operation, status])
        .inc();
}
