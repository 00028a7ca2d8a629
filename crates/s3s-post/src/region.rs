//! S3 Region utilities
//!
//! Browser uploads are signed for a specific region, so only the regions
//! listed in [`KNOWN_REGIONS`] are accepted.

use std::fmt;
use std::str::FromStr;

/// Region identifiers accepted for signing.
pub const KNOWN_REGIONS: &[&str] = &[
    "us-east-1",
    "us-east-2",
    "us-west-1",
    "us-west-2",
    "us-gov-east-1",
    "us-gov-west-1",
    "ca-central-1",
    "sa-east-1",
    "eu-west-1",
    "eu-west-2",
    "eu-west-3",
    "eu-central-1",
    "eu-north-1",
    "eu-south-1",
    "me-south-1",
    "af-south-1",
    "ap-east-1",
    "ap-south-1",
    "ap-northeast-1",
    "ap-northeast-2",
    "ap-northeast-3",
    "ap-southeast-1",
    "ap-southeast-2",
    "cn-north-1",
    "cn-northwest-1",
];

/// A validated S3 region identifier.
///
/// The inner string always points into [`KNOWN_REGIONS`], which makes the type `Copy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Region(&'static str);

/// Error type for region strings outside of [`KNOWN_REGIONS`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid region: {region:?}")]
pub struct InvalidRegion {
    region: String,
}

impl InvalidRegion {
    /// The rejected input.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }
}

impl Region {
    /// Creates a new `Region` from a string, checking it against the allow-list.
    ///
    /// # Errors
    /// Returns `InvalidRegion` if the region is not a known region identifier.
    ///
    /// # Examples
    /// ```
    /// # use s3s_post::region::Region;
    /// let region = Region::new("us-east-1").unwrap();
    /// assert_eq!(region.as_str(), "us-east-1");
    ///
    /// assert!(Region::new("mars-central-1").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, InvalidRegion> {
        match KNOWN_REGIONS.iter().find(|&&r| r == s) {
            Some(&r) => Ok(Self(r)),
            None => Err(InvalidRegion { region: s.to_owned() }),
        }
    }

    /// Iterates over every accepted region.
    pub fn all() -> impl Iterator<Item = Self> {
        KNOWN_REGIONS.iter().map(|&r| Self(r))
    }

    /// Returns the region as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl AsRef<str> for Region {
    fn as_ref(&self) -> &str {
        self.0
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl FromStr for Region {
    type Err = InvalidRegion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Checks whether `s` is an accepted region identifier.
///
/// # Examples
/// ```
/// # use s3s_post::region::is_valid_region;
/// assert!(is_valid_region("us-east-1"));
/// assert!(is_valid_region("cn-north-1"));
/// assert!(!is_valid_region("local"));
/// assert!(!is_valid_region("US-EAST-1"));
/// ```
#[must_use]
pub fn is_valid_region(s: &str) -> bool {
    KNOWN_REGIONS.contains(&s)
}
