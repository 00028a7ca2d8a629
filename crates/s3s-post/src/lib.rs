//! Signed browser-based POST uploads for S3
//!
//! `s3s-post` produces the hidden form fields a browser needs to upload a file
//! straight to an S3 bucket with a multipart POST, without the bytes passing
//! through your server. The fields carry a POST policy document and its AWS
//! Signature Version 4.
//!
//! # Example
//!
//! ```
//! use s3s_post::clock::{FixedClock, SigningTime};
//! use s3s_post::form::PostFormBuilder;
//! use s3s_post::options::OptionsOverrides;
//!
//! let mut builder = PostFormBuilder::new("my-bucket", "us-east-1", "AKIAEXAMPLE", "secret");
//! builder.set_clock(FixedClock::new(SigningTime::from_unix_timestamp(1_700_000_000).unwrap()));
//! builder.set_options(OptionsOverrides {
//!     default_filename: Some("uploads/${filename}".to_owned()),
//!     ..Default::default()
//! });
//! let form = builder.build().unwrap();
//!
//! assert_eq!(form.form_url(), "//my-bucket.s3-us-east-1.amazonaws.com");
//!
//! let inputs = form.inputs();
//! assert_eq!(inputs["X-amz-date"], "20231114T221320Z");
//! assert_eq!(inputs["X-amz-signature"].len(), 64);
//! ```
//!
//! # Modules
//!
//! - [`form`]: the signing session and its outputs
//! - [`options`]: upload constraints
//! - [`credentials`]: credential scope
//! - [`policy`]: POST policy documents
//! - [`signature`]: `SigV4` key derivation and signing
//! - [`region`], [`acl`], [`clock`]: domain types
//! - [`html`]: hidden input rendering
//!
//! # Security
//!
//! Secret keys and derived signing keys are never logged and are wiped from
//! memory when dropped. Anyone holding a signing key can forge uploads for its
//! day and region.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(
    clippy::bool_assert_comparison, // I don't like `assert!(!expression)`. It's very misleading.
    clippy::multiple_crate_versions, // Sometimes not fixable
    clippy::module_name_repetitions,
    clippy::single_match_else,
    clippy::let_underscore_untyped,
)]

mod error;
mod secret_key;

pub mod acl;
pub mod clock;
pub mod credentials;
pub mod field;
pub mod form;
pub mod html;
pub mod options;
pub mod policy;
pub mod region;
pub mod signature;

pub use self::error::*;
pub use self::form::{PostForm, PostFormBuilder, SignedPolicy};
pub use self::secret_key::SecretKey;
