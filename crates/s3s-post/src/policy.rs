//! POST Policy documents for browser-based uploads
//!
//! See <https://docs.aws.amazon.com/AmazonS3/latest/API/sigv4-HTTPPOSTConstructPolicy.html>

use crate::credentials::Credentials;
use crate::field;
use crate::options::PostOptions;

use std::borrow::Cow;

use base64_simd::STANDARD;
use serde::de::IgnoredAny;
use serde_json::{Map, Value};

/// A condition in a POST policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// `{"field": "value"}`
    ExactMatch { field: String, value: String },
    /// `["starts-with", "$field", "prefix"]`
    StartsWith { field: String, prefix: String },
    /// `["content-length-range", min, max]`
    ContentLengthRange { min: u64, max: u64 },
}

/// Error type for policies that can not be decoded.
#[derive(Debug, thiserror::Error)]
pub enum InvalidPolicy {
    #[error("policy is not valid base64")]
    Base64,
    #[error("policy is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid policy document: {0}")]
    Document(&'static str),
}

impl Condition {
    #[must_use]
    pub fn exact(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::ExactMatch {
            field: field.into(),
            value: value.into(),
        }
    }

    #[must_use]
    pub fn starts_with(field: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self::StartsWith {
            field: field.into(),
            prefix: prefix.into(),
        }
    }

    /// The form field this condition applies to.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::ExactMatch { field, .. } | Self::StartsWith { field, .. } => Some(field),
            Self::ContentLengthRange { .. } => None,
        }
    }

    fn to_json(&self) -> Value {
        match self {
            Self::ExactMatch { field, value } => {
                let mut map = Map::with_capacity(1);
                map.insert(field.clone(), Value::String(value.clone()));
                Value::Object(map)
            }
            Self::StartsWith { field, prefix } => Value::Array(vec![
                Value::from("starts-with"),
                Value::String(format!("${field}")),
                Value::String(prefix.clone()),
            ]),
            Self::ContentLengthRange { min, max } => {
                Value::Array(vec![Value::from("content-length-range"), Value::from(*min), Value::from(*max)])
            }
        }
    }

    fn from_json(value: &Value) -> Result<Self, InvalidPolicy> {
        match value {
            Value::Object(map) => {
                let mut entries = map.iter();
                let (Some((field, value)), None) = (entries.next(), entries.next()) else {
                    return Err(InvalidPolicy::Document("exact-match condition must have exactly one field"));
                };
                let value = value
                    .as_str()
                    .ok_or(InvalidPolicy::Document("expected value must be a string"))?;
                Ok(Self::exact(field.as_str(), value))
            }
            Value::Array(arr) => {
                let [op, a, b] = arr.as_slice() else {
                    return Err(InvalidPolicy::Document("condition array must have exactly 3 elements"));
                };
                let op = op
                    .as_str()
                    .ok_or(InvalidPolicy::Document("condition operator must be a string"))?;

                match op {
                    "eq" | "starts-with" => {
                        let field = a.as_str().ok_or(InvalidPolicy::Document("field name must be a string"))?;
                        let field = normalize_field_name(field);
                        let value = b.as_str().ok_or(InvalidPolicy::Document("condition value must be a string"))?;
                        if op == "eq" {
                            Ok(Self::exact(field, value))
                        } else {
                            Ok(Self::starts_with(field, value))
                        }
                    }
                    "content-length-range" => {
                        let min = a
                            .as_u64()
                            .ok_or(InvalidPolicy::Document("content-length-range min must be a number"))?;
                        let max = b
                            .as_u64()
                            .ok_or(InvalidPolicy::Document("content-length-range max must be a number"))?;
                        Ok(Self::ContentLengthRange { min, max })
                    }
                    _ => Err(InvalidPolicy::Document("unknown condition operator")),
                }
            }
            _ => Err(InvalidPolicy::Document("condition must be an object or an array")),
        }
    }
}

/// Removes the `$` prefix of a field reference.
fn normalize_field_name(field: &str) -> &str {
    field.strip_prefix('$').unwrap_or(field)
}

/// POST Policy document for browser-based uploads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostPolicy {
    expiration: String,
    conditions: Vec<Condition>,
}

impl PostPolicy {
    /// Builds the policy for a signing session.
    ///
    /// The expiration and the `X-amz-date` condition come from the signing time
    /// carried by `credentials`; the clock is never read here.
    #[must_use]
    pub fn generate(options: &PostOptions, credentials: &Credentials, bucket: &str) -> Self {
        let expiration = credentials.signing_time().saturating_add(options.expires());

        let mut conditions = vec![
            Condition::exact(field::BUCKET, bucket),
            Condition::exact(field::ACL, options.acl().as_str()),
            Condition::exact(field::X_AMZ_CREDENTIAL, credentials.amz_credential()),
            Condition::exact(field::X_AMZ_ALGORITHM, field::ALGORITHM),
            Condition::exact(field::X_AMZ_DATE, credentials.amz_date().fmt_iso8601()),
        ];

        let filename = options.default_filename();
        conditions.push(match filename.find(field::FILENAME_PLACEHOLDER) {
            Some(pos) => Condition::starts_with(field::KEY, &filename[..pos]),
            None => Condition::exact(field::KEY, filename),
        });

        let content_type = options.content_type();
        conditions.push(match content_type.strip_suffix('*') {
            Some(prefix) => Condition::starts_with(field::CONTENT_TYPE, prefix),
            None => Condition::exact(field::CONTENT_TYPE, content_type),
        });

        if let Some(redirect) = options.success_action_redirect() {
            conditions.push(Condition::exact(field::SUCCESS_ACTION_REDIRECT, redirect));
        }
        if let Some(status) = options.success_action_status() {
            conditions.push(Condition::exact(field::SUCCESS_ACTION_STATUS, status.to_string()));
        }
        if let Some((min, max)) = options.content_length_range() {
            conditions.push(Condition::ContentLengthRange { min, max });
        }

        for (name, value) in options.additional_inputs() {
            conditions.push(Condition::exact(name.as_str(), value.as_str()));
        }

        Self {
            expiration: expiration.fmt_rfc3339(),
            conditions,
        }
    }

    /// Parse policy from base64-encoded string
    ///
    /// # Errors
    /// Returns error if the policy is not valid base64, not valid JSON, or not a policy document
    pub fn from_base64(policy_b64: &str) -> Result<Self, InvalidPolicy> {
        let policy_bytes = STANDARD.decode_to_vec(policy_b64).map_err(|_| InvalidPolicy::Base64)?;
        let doc: Value = serde_json::from_slice(&policy_bytes)?;

        let expiration = doc
            .get("expiration")
            .and_then(Value::as_str)
            .ok_or(InvalidPolicy::Document("missing expiration"))?;

        let conditions = doc
            .get("conditions")
            .and_then(Value::as_array)
            .ok_or(InvalidPolicy::Document("missing conditions"))?
            .iter()
            .map(Condition::from_json)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            expiration: expiration.to_owned(),
            conditions,
        })
    }

    #[must_use]
    pub fn expiration(&self) -> &str {
        &self.expiration
    }

    #[must_use]
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// The policy document, `expiration` first.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut doc = Map::with_capacity(2);
        doc.insert("expiration".to_owned(), Value::String(self.expiration.clone()));
        doc.insert(
            "conditions".to_owned(),
            Value::Array(self.conditions.iter().map(Condition::to_json).collect()),
        );
        Value::Object(doc)
    }

    /// Compact JSON with a fixed key order.
    #[must_use]
    pub fn to_json(&self) -> String {
        self.to_value().to_string()
    }

    /// The signable artifact: standard base64 with padding and no line breaks.
    #[must_use]
    pub fn to_base64(&self) -> String {
        STANDARD.encode_to_string(self.to_json())
    }
}

/// Returns the base64 form of a policy given as raw JSON or already encoded.
///
/// Input that decodes as base64 into a JSON document is taken as encoded;
/// anything else is encoded as-is.
#[must_use]
pub fn encode_policy_input(input: &str) -> Cow<'_, str> {
    let trimmed = input.trim();
    if is_encoded_policy(trimmed) {
        Cow::Borrowed(trimmed)
    } else {
        Cow::Owned(STANDARD.encode_to_string(input))
    }
}

fn is_encoded_policy(s: &str) -> bool {
    if s.is_empty() {
        return false;
    }
    match STANDARD.decode_to_vec(s) {
        Ok(bytes) => serde_json::from_slice::<IgnoredAny>(&bytes).is_ok(),
        Err(_) => false,
    }
}
