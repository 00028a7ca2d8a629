//! Credential scope
//!
//! See <https://docs.aws.amazon.com/IAM/latest/UserGuide/reference_sigv-create-signed-request.html#create-string-to-sign>

use crate::clock::{AmzDate, SigningTime};
use crate::region::{InvalidRegion, Region};

/// The service component of every credential scope.
pub const SERVICE: &str = "s3";

/// The terminator of every credential scope.
pub const TERMINATOR: &str = "aws4_request";

/// Access key bound to a region and a signing instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key: String,
    region: Region,
    signing_time: SigningTime,
    date: AmzDate,
}

impl Credentials {
    /// # Errors
    /// Returns `InvalidRegion` if `region` is not a known region identifier.
    pub fn derive(access_key: impl Into<String>, region: &str, signing_time: SigningTime) -> Result<Self, InvalidRegion> {
        let region = Region::new(region)?;
        Ok(Self::with_region(access_key.into(), region, signing_time))
    }

    pub(crate) fn with_region(access_key: String, region: Region, signing_time: SigningTime) -> Self {
        Self {
            access_key,
            region,
            signing_time,
            date: signing_time.amz_date(),
        }
    }

    #[must_use]
    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    #[must_use]
    pub fn region(&self) -> Region {
        self.region
    }

    #[must_use]
    pub fn signing_time(&self) -> SigningTime {
        self.signing_time
    }

    #[must_use]
    pub fn amz_date(&self) -> &AmzDate {
        &self.date
    }

    /// `YYYYMMDD`
    #[must_use]
    pub fn date(&self) -> String {
        self.date.fmt_date()
    }

    /// `date/region/s3/aws4_request`
    #[must_use]
    pub fn scope(&self) -> String {
        format!("{}/{}/{SERVICE}/{TERMINATOR}", self.date.fmt_date(), self.region)
    }

    /// `access_key/date/region/s3/aws4_request`, the `X-amz-credential` value.
    #[must_use]
    pub fn amz_credential(&self) -> String {
        format!("{}/{}", self.access_key, self.scope())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time() -> SigningTime {
        SigningTime::from_unix_timestamp(1_700_000_000).unwrap()
    }

    #[test]
    fn scope() {
        let cred = Credentials::derive("AKIAEXAMPLE", "us-east-1", time()).unwrap();
        assert_eq!(cred.access_key(), "AKIAEXAMPLE");
        assert_eq!(cred.region().as_str(), "us-east-1");
        assert_eq!(cred.date(), "20231114");
        assert_eq!(cred.scope(), "20231114/us-east-1/s3/aws4_request");
        assert_eq!(cred.amz_credential(), "AKIAEXAMPLE/20231114/us-east-1/s3/aws4_request");
        assert_eq!(cred.amz_date().fmt_iso8601(), "20231114T221320Z");
        assert_eq!(cred.signing_time(), time());
    }

    #[test]
    fn rejects_unknown_region() {
        let err = Credentials::derive("AKIAEXAMPLE", "mars-central-1", time()).unwrap_err();
        assert_eq!(err.region(), "mars-central-1");
    }
}
