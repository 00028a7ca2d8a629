//! Signing instants
//!
//! A signing session captures exactly one [`SigningTime`]. The credential scope,
//! the `X-amz-date` field, the policy expiration and the signature are all
//! derived from it.

use std::fmt;
use std::time::Duration;

use time::OffsetDateTime;
use time::format_description::FormatItem;
use time::macros::format_description;

/// Source of signing instants.
pub trait Clock: Send + Sync + 'static {
    /// Returns the current instant.
    fn now(&self) -> SigningTime;
}

/// Reads the system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SigningTime {
        SigningTime::now()
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(SigningTime);

impl FixedClock {
    #[must_use]
    pub fn new(time: SigningTime) -> Self {
        Self(time)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> SigningTime {
        self.0
    }
}

/// A UTC instant with whole-second precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SigningTime(OffsetDateTime);

impl SigningTime {
    /// Samples the system clock, dropping sub-second precision.
    #[must_use]
    pub fn now() -> Self {
        Self(whole_seconds(OffsetDateTime::now_utc()))
    }

    /// Creates a signing time from epoch seconds.
    ///
    /// # Errors
    /// Returns an error if the timestamp is outside the supported calendar range.
    pub fn from_unix_timestamp(secs: i64) -> Result<Self, time::error::ComponentRange> {
        OffsetDateTime::from_unix_timestamp(secs).map(Self)
    }

    /// Epoch seconds.
    #[must_use]
    pub fn unix_timestamp(&self) -> i64 {
        self.0.unix_timestamp()
    }

    #[must_use]
    pub fn amz_date(&self) -> AmzDate {
        AmzDate::from_datetime(self.0)
    }

    /// The instant `expires` after this one, or `None` if it leaves the calendar range.
    #[must_use]
    pub fn checked_add(&self, expires: Duration) -> Option<AmzDate> {
        let secs = i64::try_from(expires.as_secs()).ok()?;
        let t = self.0.checked_add(time::Duration::seconds(secs))?;
        Some(AmzDate::from_datetime(t))
    }

    /// Like [`checked_add`](Self::checked_add), clamped to the end of the calendar range.
    #[must_use]
    pub fn saturating_add(&self, expires: Duration) -> AmzDate {
        let secs = i64::try_from(expires.as_secs()).unwrap_or(i64::MAX);
        AmzDate::from_datetime(whole_seconds(self.0.saturating_add(time::Duration::seconds(secs))))
    }
}

fn whole_seconds(t: OffsetDateTime) -> OffsetDateTime {
    t.saturating_sub(time::Duration::nanoseconds(i64::from(t.nanosecond())))
}

impl From<SigningTime> for OffsetDateTime {
    fn from(value: SigningTime) -> Self {
        value.0
    }
}

/// `YYYYMMDD'T'HHMMSS'Z'`
const ISO8601_BASIC: &[FormatItem<'_>] = format_description!("[year][month][day]T[hour][minute][second]Z");

/// `YYYYMMDD`
const DATE: &[FormatItem<'_>] = format_description!("[year][month][day]");

/// See <https://github.com/minio/minio-java/issues/1419>
const RFC3339: &[FormatItem<'_>] = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z");

/// A UTC instant formatted the ways `SigV4` needs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AmzDate(OffsetDateTime);

impl AmzDate {
    fn from_datetime(t: OffsetDateTime) -> Self {
        Self(t)
    }

    fn format(&self, description: &[FormatItem<'_>]) -> String {
        self.0
            .format(description)
            .expect("an OffsetDateTime can be formatted with a date and time description")
    }

    /// `YYYYMMDD'T'HHMMSS'Z'`
    #[must_use]
    pub fn fmt_iso8601(&self) -> String {
        self.format(ISO8601_BASIC)
    }

    /// `YYYYMMDD`
    #[must_use]
    pub fn fmt_date(&self) -> String {
        self.format(DATE)
    }

    /// `YYYY-MM-DD'T'HH:MM:SS.sss'Z'`, the form used by policy expirations.
    #[must_use]
    pub fn fmt_rfc3339(&self) -> String {
        self.format(RFC3339)
    }
}

impl fmt::Display for AmzDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fmt_iso8601())
    }
}
