//! Form field names

pub const CONTENT_TYPE: &str = "Content-Type";
pub const ACL: &str = "acl";
pub const SUCCESS_ACTION_REDIRECT: &str = "success_action_redirect";
pub const SUCCESS_ACTION_STATUS: &str = "success_action_status";
pub const POLICY: &str = "policy";
pub const X_AMZ_CREDENTIAL: &str = "X-amz-credential";
pub const X_AMZ_ALGORITHM: &str = "X-amz-algorithm";
pub const X_AMZ_DATE: &str = "X-amz-date";
pub const X_AMZ_SIGNATURE: &str = "X-amz-signature";
pub const KEY: &str = "key";

/// Policy-only condition field.
pub const BUCKET: &str = "bucket";

/// The fixed hidden inputs of every form, in emission order.
pub const RESERVED: [&str; 10] = [
    CONTENT_TYPE,
    ACL,
    SUCCESS_ACTION_REDIRECT,
    SUCCESS_ACTION_STATUS,
    POLICY,
    X_AMZ_CREDENTIAL,
    X_AMZ_ALGORITHM,
    X_AMZ_DATE,
    X_AMZ_SIGNATURE,
    KEY,
];

/// The only supported signing algorithm.
pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Placeholder that browsers replace with the uploaded file's name.
pub const FILENAME_PLACEHOLDER: &str = "${filename}";

/// Form field names are matched case-insensitively by S3.
#[must_use]
pub fn is_reserved(name: &str) -> bool {
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}
