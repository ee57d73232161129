//! Identity records bound into tokens.
//!
//! An identity is an arbitrary JSON object owned by the caller. Tokens carry
//! it as their `data` claim and verification compares it field by field.

use crate::error::TokenError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field holding the user identifier.
pub const USER_ID: &str = "userId";
/// Field holding the user's access key reference.
pub const USER_KEY: &str = "userKey";
/// Field holding the user's refresh key reference.
pub const USER_RKEY: &str = "userRkey";

/// Fields an identity must expose to be verifiable.
pub const REQUIRED_FIELDS: [&str; 3] = [USER_ID, USER_KEY, USER_RKEY];

/// Read-only identity record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity {
    fields: Map<String, Value>,
}

impl Identity {
    /// Create an identity with the three required fields.
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        user_key: impl Into<String>,
        user_rkey: impl Into<String>,
    ) -> Self {
        Self::default()
            .with_field(USER_ID, user_id.into())
            .with_field(USER_KEY, user_key.into())
            .with_field(USER_RKEY, user_rkey.into())
    }

    /// Create an identity from an existing JSON object.
    #[must_use]
    pub const fn from_map(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Build an identity from any serializable record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record does not serialize to a JSON object.
    pub fn from_record<T: Serialize>(record: &T) -> Result<Self, TokenError> {
        match serde_json::to_value(record)? {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(TokenError::corrupted(format!(
                "identity must be a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Add or replace a field.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Look up a field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Underlying JSON object.
    #[must_use]
    pub const fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// The identity as a token `data` value.
    #[must_use]
    pub fn to_data(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    /// Ensure every field in [`REQUIRED_FIELDS`] is present.
    ///
    /// # Errors
    ///
    /// Returns the first missing field.
    pub fn ensure_verifiable(&self) -> Result<(), TokenError> {
        match REQUIRED_FIELDS
            .iter()
            .find(|field| !self.fields.contains_key(**field))
        {
            Some(field) => Err(TokenError::MissingIdentityField(*field)),
            None => Ok(()),
        }
    }

    /// Check that every field of `data` equals the same-named identity field.
    ///
    /// # Errors
    ///
    /// Returns the first diverging field name. Non-object data never matches.
    pub fn ensure_matches(&self, data: &Value) -> Result<(), TokenError> {
        ensure_fields_match(data, &self.fields)
    }
}

/// Check that every field of `data` equals the same-named field of `expected`.
pub(crate) fn ensure_fields_match(
    data: &Value,
    expected: &Map<String, Value>,
) -> Result<(), TokenError> {
    let Value::Object(claims) = data else {
        return Err(TokenError::identity_mismatch(format!(
            "data is {}, expected object",
            json_kind(data)
        )));
    };

    for (name, value) in claims {
        if expected.get(name) != Some(value) {
            return Err(TokenError::identity_mismatch(name.clone()));
        }
    }
    Ok(())
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
