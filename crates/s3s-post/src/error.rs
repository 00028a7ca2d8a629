use crate::acl::InvalidAcl;
use crate::options::InvalidOptions;
use crate::region::InvalidRegion;

/// Errors raised by a signing session.
///
/// Every variant except `Render` is a caller input mistake, detected before
/// any signing happens.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    InvalidRegion(#[from] InvalidRegion),

    #[error(transparent)]
    InvalidAcl(#[from] InvalidAcl),

    #[error(transparent)]
    InvalidOptions(#[from] InvalidOptions),

    #[error("signing time out of range: {0}")]
    InvalidSigningTime(#[from] time::error::ComponentRange),

    #[error("failed to render form: {0}")]
    Render(#[from] askama::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
