//! Upload constraints
//!
//! [`PostOptions`] describes what the browser is allowed to upload. It is built
//! from defaults, optionally overlaid with [`OptionsOverrides`], and then only
//! changes through [`PostOptions::merge`].
//!
//! # Example
//! ```
//! use s3s_post::options::{OptionsOverrides, PostOptions};
//!
//! let mut options = PostOptions::default();
//! assert_eq!(options.content_type(), "image/*");
//!
//! options
//!     .merge(OptionsOverrides {
//!         acl: Some("private".to_owned()),
//!         default_filename: Some("uploads/${filename}".to_owned()),
//!         ..Default::default()
//!     })
//!     .unwrap();
//! assert_eq!(options.acl().as_str(), "private");
//!
//! // invalid merges leave the options untouched
//! let before = options.clone();
//! assert!(options.merge(OptionsOverrides { acl: Some("public".to_owned()), ..Default::default() }).is_err());
//! assert_eq!(options, before);
//! ```

use crate::acl::CannedAcl;
use crate::clock::{AmzDate, SigningTime};
use crate::error::Result;
use crate::field;

use std::time::Duration;

use indexmap::IndexMap;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub const DEFAULT_CONTENT_TYPE: &str = "image/*";
pub const DEFAULT_SUCCESS_ACTION_STATUS: u16 = 201;
pub const DEFAULT_EXPIRES: Duration = Duration::from_secs(5 * 60);

/// Status codes S3 accepts for `success_action_status`.
pub const ALLOWED_SUCCESS_ACTION_STATUS: [u16; 3] = [200, 201, 204];

/// Error type for option values that can not be accepted.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum InvalidOptions {
    #[error("options must be absent, an object or prebuilt options, got {0}")]
    UnsupportedShape(&'static str),

    #[error("malformed options: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("additional input {0:?} collides with a reserved field name")]
    ReservedInput(String),

    #[error("additional input names must not be empty")]
    EmptyInputName,

    #[error("invalid expires: {0:?}")]
    InvalidExpires(String),

    #[error("expires must be at least one second")]
    ZeroExpires,

    #[error("unsupported success_action_status: {0}")]
    SuccessActionStatus(u16),

    #[error("content-length-range minimum {min} exceeds maximum {max}")]
    ContentLengthRange { min: u64, max: u64 },

    #[error("policy expiration is out of range")]
    ExpirationOutOfRange,
}

/// Upload constraints.
///
/// Immutable except through [`merge`](Self::merge).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostOptions {
    content_type: String,
    acl: CannedAcl,
    success_action_redirect: Option<String>,
    success_action_status: Option<u16>,
    default_filename: String,
    expires: Duration,
    content_length_range: Option<(u64, u64)>,
    additional_inputs: IndexMap<String, String>,
}

impl Default for PostOptions {
    fn default() -> Self {
        Self {
            content_type: DEFAULT_CONTENT_TYPE.to_owned(),
            acl: CannedAcl::default(),
            success_action_redirect: None,
            success_action_status: Some(DEFAULT_SUCCESS_ACTION_STATUS),
            default_filename: field::FILENAME_PLACEHOLDER.to_owned(),
            expires: DEFAULT_EXPIRES,
            content_length_range: None,
            additional_inputs: IndexMap::new(),
        }
    }
}

/// A partial set of options.
///
/// Every `Some` field replaces the corresponding [`PostOptions`] field on merge.
/// For the optional fields, `Some(None)` (or `null` in JSON) clears the value.
///
/// Deserializes from a JSON object with the same field names. `expires` accepts
/// whole seconds or text such as `"5m"`, `"6 hours"` or `"+1 day"`.
/// `success_action_status` accepts a number or a numeric string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptionsOverrides {
    pub content_type: Option<String>,

    /// Canned ACL name, validated on merge.
    pub acl: Option<String>,

    #[serde(deserialize_with = "deserialize_some")]
    pub success_action_redirect: Option<Option<String>>,

    #[serde(deserialize_with = "deserialize_status")]
    pub success_action_status: Option<Option<u16>>,

    pub default_filename: Option<String>,

    #[serde(deserialize_with = "deserialize_expires")]
    pub expires: Option<Duration>,

    #[serde(deserialize_with = "deserialize_some")]
    pub content_length_range: Option<Option<(u64, u64)>>,

    /// Replaces the whole map. Entries are not merged one by one.
    pub additional_inputs: Option<IndexMap<String, String>>,
}

/// Everything [`PostOptions::normalize`] accepts.
#[derive(Debug, Clone, Default)]
pub enum OptionsInput {
    #[default]
    Absent,
    Overrides(OptionsOverrides),
    Prebuilt(PostOptions),
}

impl From<OptionsOverrides> for OptionsInput {
    fn from(value: OptionsOverrides) -> Self {
        Self::Overrides(value)
    }
}

impl From<PostOptions> for OptionsInput {
    fn from(value: PostOptions) -> Self {
        Self::Prebuilt(value)
    }
}

impl From<Option<OptionsOverrides>> for OptionsInput {
    fn from(value: Option<OptionsOverrides>) -> Self {
        value.map_or(Self::Absent, Self::Overrides)
    }
}

impl OptionsOverrides {
    /// Reads overrides from a JSON value. `null` means no overrides.
    ///
    /// # Errors
    /// Returns [`InvalidOptions`] if the value is not `null` or an object, or if
    /// the object has unknown fields or values of the wrong type.
    pub fn from_json(value: &Value) -> Result<Self> {
        let shape = match value {
            Value::Null => return Ok(Self::default()),
            Value::Object(_) => return Self::deserialize(value).map_err(|e| InvalidOptions::Malformed(e).into()),
            Value::Bool(_) => "a boolean",
            Value::Number(_) => "a number",
            Value::String(_) => "a string",
            Value::Array(_) => "an array",
        };
        Err(InvalidOptions::UnsupportedShape(shape).into())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl PostOptions {
    /// Builds options from any accepted input.
    ///
    /// # Errors
    /// Returns an error if the overrides hold an invalid ACL or violate an option invariant.
    pub fn normalize(input: impl Into<OptionsInput>) -> Result<Self> {
        match input.into() {
            OptionsInput::Absent => Ok(Self::default()),
            OptionsInput::Overrides(overrides) => {
                let mut options = Self::default();
                options.merge(overrides)?;
                Ok(options)
            }
            OptionsInput::Prebuilt(options) => Ok(options),
        }
    }

    /// Builds options from a JSON value (`null` or an object of overrides).
    ///
    /// # Errors
    /// See [`OptionsOverrides::from_json`] and [`normalize`](Self::normalize).
    pub fn from_json(value: &Value) -> Result<Self> {
        Self::normalize(OptionsOverrides::from_json(value)?)
    }

    /// Overlays the provided fields, leaving the others untouched.
    ///
    /// `additional_inputs` is replaced wholesale: to add one input, pass the
    /// current map plus the new entry.
    ///
    /// The result is validated as a whole before it is committed, so on error
    /// `self` is unchanged.
    ///
    /// # Errors
    /// Returns [`InvalidAcl`](crate::acl::InvalidAcl) for an unknown ACL and
    /// [`InvalidOptions`] when the merged options violate an invariant.
    pub fn merge(&mut self, overrides: OptionsOverrides) -> Result<()> {
        let mut next = self.clone();

        if let Some(content_type) = overrides.content_type {
            next.content_type = content_type;
        }
        if let Some(acl) = overrides.acl {
            next.acl = acl.parse()?;
        }
        if let Some(redirect) = overrides.success_action_redirect {
            next.success_action_redirect = redirect;
        }
        if let Some(status) = overrides.success_action_status {
            next.success_action_status = status;
        }
        if let Some(default_filename) = overrides.default_filename {
            next.default_filename = default_filename;
        }
        if let Some(expires) = overrides.expires {
            next.expires = expires;
        }
        if let Some(range) = overrides.content_length_range {
            next.content_length_range = range;
        }
        if let Some(inputs) = overrides.additional_inputs {
            next.additional_inputs = inputs;
        }

        next.validate()?;
        *self = next;
        Ok(())
    }

    fn validate(&self) -> Result<(), InvalidOptions> {
        if self.expires.as_secs() == 0 {
            return Err(InvalidOptions::ZeroExpires);
        }

        if let Some(status) = self.success_action_status
            && !ALLOWED_SUCCESS_ACTION_STATUS.contains(&status)
        {
            return Err(InvalidOptions::SuccessActionStatus(status));
        }

        if let Some((min, max)) = self.content_length_range
            && min > max
        {
            return Err(InvalidOptions::ContentLengthRange { min, max });
        }

        for name in self.additional_inputs.keys() {
            if name.is_empty() {
                return Err(InvalidOptions::EmptyInputName);
            }
            if field::is_reserved(name) {
                return Err(InvalidOptions::ReservedInput(name.clone()));
            }
        }

        Ok(())
    }

    /// Computes the policy expiration for a signing instant.
    ///
    /// # Errors
    /// Returns [`InvalidOptions::ExpirationOutOfRange`] if the expiration is not representable.
    pub fn expiration(&self, signing_time: SigningTime) -> Result<AmzDate, InvalidOptions> {
        signing_time
            .checked_add(self.expires)
            .ok_or(InvalidOptions::ExpirationOutOfRange)
    }

    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    #[must_use]
    pub fn acl(&self) -> CannedAcl {
        self.acl
    }

    #[must_use]
    pub fn success_action_redirect(&self) -> Option<&str> {
        self.success_action_redirect.as_deref()
    }

    #[must_use]
    pub fn success_action_status(&self) -> Option<u16> {
        self.success_action_status
    }

    #[must_use]
    pub fn default_filename(&self) -> &str {
        &self.default_filename
    }

    #[must_use]
    pub fn expires(&self) -> Duration {
        self.expires
    }

    #[must_use]
    pub fn content_length_range(&self) -> Option<(u64, u64)> {
        self.content_length_range
    }

    #[must_use]
    pub fn additional_inputs(&self) -> &IndexMap<String, String> {
        &self.additional_inputs
    }
}

/// Parses an `expires` value.
///
/// Accepts whole seconds (`"300"`) or a count followed by a unit (`"5m"`,
/// `"6 hours"`, `"+1 day"`). Units: seconds, minutes, hours, days, weeks.
///
/// # Errors
/// Returns [`InvalidOptions::InvalidExpires`] if the text is not understood.
pub fn parse_expires(s: &str) -> Result<Duration, InvalidOptions> {
    let invalid = || InvalidOptions::InvalidExpires(s.to_owned());

    let text = s.trim();
    let text = text.strip_prefix('+').unwrap_or(text).trim_start();

    let split = text.find(|c: char| !c.is_ascii_digit()).unwrap_or(text.len());
    let (count, unit) = text.split_at(split);
    let count: u64 = count.parse().map_err(|_| invalid())?;

    let multiplier: u64 = match unit.trim().to_ascii_lowercase().as_str() {
        "" | "s" | "sec" | "secs" | "second" | "seconds" => 1,
        "m" | "min" | "mins" | "minute" | "minutes" => 60,
        "h" | "hour" | "hours" => 60 * 60,
        "d" | "day" | "days" => 24 * 60 * 60,
        "w" | "week" | "weeks" => 7 * 24 * 60 * 60,
        _ => return Err(invalid()),
    };

    let secs = count.checked_mul(multiplier).ok_or_else(invalid)?;
    Ok(Duration::from_secs(secs))
}

fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(u64),
    Text(String),
}

fn deserialize_status<'de, D>(deserializer: D) -> Result<Option<Option<u16>>, D::Error>
where
    D: Deserializer<'de>,
{
    let status = match Option::<NumberOrText>::deserialize(deserializer)? {
        None => None,
        Some(NumberOrText::Text(s)) if s.trim().is_empty() => None,
        Some(NumberOrText::Text(s)) => Some(
            s.trim()
                .parse::<u16>()
                .map_err(|_| D::Error::custom(format!("invalid success_action_status: {s:?}")))?,
        ),
        Some(NumberOrText::Number(n)) => {
            Some(u16::try_from(n).map_err(|_| D::Error::custom(format!("invalid success_action_status: {n}")))?)
        }
    };
    Ok(Some(status))
}

fn deserialize_expires<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrText>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrText::Number(secs)) => Ok(Some(Duration::from_secs(secs))),
        Some(NumberOrText::Text(s)) => parse_expires(&s).map(Some).map_err(D::Error::custom),
    }
}
