//! AWS Signature Version 4 for POST policies
//!
//! See <https://docs.aws.amazon.com/AmazonS3/latest/API/sig-v4-authenticating-requests.html>
//!
//! ```text
//! kSecret   = "AWS4" + secret
//! kDate     = HMAC-SHA256(kSecret,  YYYYMMDD)
//! kRegion   = HMAC-SHA256(kDate,    region)
//! kService  = HMAC-SHA256(kRegion,  "s3")
//! kSigning  = HMAC-SHA256(kService, "aws4_request")
//! signature = hex(HMAC-SHA256(kSigning, policy_base64))
//! ```
//!
//! Every link uses the raw bytes of the previous one as its key.

use crate::credentials::{Credentials, SERVICE, TERMINATOR};
use crate::region::Region;
use crate::secret_key::SecretKey;

use std::fmt;
use std::sync::OnceLock;

use hmac::{Hmac, KeyInit, Mac};
use sha2::Sha256;
use tracing::trace;
use zeroize::Zeroizing;

type HmacSha256 = Hmac<Sha256>;

/// Produces signatures for base64 policies.
pub trait PolicySigner: Send + Sync + 'static {
    /// Signs `policy` for the date and region of `credentials`.
    ///
    /// Returns the lowercase hex signature.
    fn sign_policy(&self, credentials: &Credentials, policy: &str) -> String;
}

#[must_use]
#[allow(clippy::missing_panics_doc)] // HMAC accepts keys of any length
pub fn hmac_sha256(key: &[u8], data: &[u8]) -> [u8; 32] {
    let mut m = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    m.update(data);
    m.finalize().into_bytes().into()
}

#[must_use]
pub fn hex(data: impl AsRef<[u8]>) -> String {
    hex_simd::encode_to_string(data.as_ref(), hex_simd::AsciiCase::Lower)
}

/// Derives the scoped signing key.
#[must_use]
pub fn signing_key(secret: &SecretKey, date: &str, region: &str, service: &str) -> Zeroizing<[u8; 32]> {
    let k_secret = Zeroizing::new(format!("AWS4{}", secret.expose()));
    let k_date = Zeroizing::new(hmac_sha256(k_secret.as_bytes(), date.as_bytes()));
    let k_region = Zeroizing::new(hmac_sha256(k_date.as_slice(), region.as_bytes()));
    let k_service = Zeroizing::new(hmac_sha256(k_region.as_slice(), service.as_bytes()));
    Zeroizing::new(hmac_sha256(k_service.as_slice(), TERMINATOR.as_bytes()))
}

/// Signs `policy` with a derived signing key.
#[must_use]
pub fn sign(signing_key: &[u8; 32], policy: &str) -> String {
    hex(hmac_sha256(signing_key, policy.as_bytes()))
}

struct CachedKey {
    date: String,
    region: Region,
    key: Zeroizing<[u8; 32]>,
}

impl CachedKey {
    fn matches(&self, date: &str, region: Region) -> bool {
        self.date == date && self.region == region
    }
}

/// The default [`PolicySigner`].
///
/// The signing key of the first `(date, region)` it sees is kept for the
/// lifetime of the signer; other scopes are derived on demand.
pub struct HmacSigner {
    secret: SecretKey,
    cached: OnceLock<CachedKey>,
}

impl HmacSigner {
    #[must_use]
    pub fn new(secret: impl Into<SecretKey>) -> Self {
        Self {
            secret: secret.into(),
            cached: OnceLock::new(),
        }
    }
}

impl fmt::Debug for HmacSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HmacSigner")
            .field("secret", &self.secret)
            .field("cached", &self.cached.get().is_some())
            .finish()
    }
}

impl PolicySigner for HmacSigner {
    fn sign_policy(&self, credentials: &Credentials, policy: &str) -> String {
        let date = credentials.date();
        let region = credentials.region();

        let cached = self.cached.get_or_init(|| {
            trace!(%date, %region, "deriving signing key");
            CachedKey {
                key: signing_key(&self.secret, &date, region.as_str(), SERVICE),
                date: date.clone(),
                region,
            }
        });

        if cached.matches(&date, region) {
            sign(&cached.key, policy)
        } else {
            trace!(%date, %region, "deriving uncached signing key");
            let key = signing_key(&self.secret, &date, region.as_str(), SERVICE);
            sign(&key, policy)
        }
    }
}
