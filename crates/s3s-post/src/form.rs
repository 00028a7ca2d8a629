//! Signed upload forms
//!
//! [`PostForm`] ties a bucket, credentials, options and one signing instant
//! together and produces every hidden field a browser needs to upload
//! directly to S3.

use crate::clock::{Clock, SystemClock};
use crate::credentials::Credentials;
use crate::error::Result;
use crate::field;
use crate::html;
use crate::options::{OptionsInput, OptionsOverrides, PostOptions};
use crate::policy::{PostPolicy, encode_policy_input};
use crate::region::Region;
use crate::secret_key::SecretKey;
use crate::signature::{HmacSigner, PolicySigner};

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

/// Fields for a policy signed outside of the session's own policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedPolicy {
    /// `X-amz-credential`
    pub credential: String,
    /// `X-amz-date`
    pub datetime: String,
    /// `X-amz-signature`
    pub signature: String,
    /// The base64 policy that was signed.
    pub policy: String,
}

/// A signing session.
#[derive(Clone)]
pub struct PostForm {
    bucket: String,
    credentials: Credentials,
    options: PostOptions,
    clock: Arc<dyn Clock>,
    signer: Arc<dyn PolicySigner>,
}

/// Builder for [`PostForm`].
pub struct PostFormBuilder {
    bucket: String,
    region: String,
    access_key: String,
    secret: SecretKey,
    options: OptionsInput,
    clock: Option<Arc<dyn Clock>>,
    signer: Option<Arc<dyn PolicySigner>>,
}

impl PostFormBuilder {
    /// Creates a new builder.
    ///
    /// Options, clock and signer are optional and can be set using the `set_*` methods.
    ///
    /// # Example
    ///
    /// ```
    /// use s3s_post::clock::{FixedClock, SigningTime};
    /// use s3s_post::form::PostFormBuilder;
    ///
    /// let mut builder = PostFormBuilder::new("my-bucket", "us-east-1", "AKIAEXAMPLE", "secret");
    /// builder.set_clock(FixedClock::new(SigningTime::from_unix_timestamp(1_700_000_000).unwrap()));
    /// let form = builder.build().unwrap();
    /// assert_eq!(form.signing_time(), 1_700_000_000);
    /// ```
    #[must_use]
    pub fn new(
        bucket: impl Into<String>,
        region: impl Into<String>,
        access_key: impl Into<String>,
        secret: impl Into<SecretKey>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            region: region.into(),
            access_key: access_key.into(),
            secret: secret.into(),
            options: OptionsInput::Absent,
            clock: None,
            signer: None,
        }
    }

    /// Sets the upload constraints.
    ///
    /// If not set, defaults to [`PostOptions::default()`].
    pub fn set_options(&mut self, options: impl Into<OptionsInput>) {
        self.options = options.into();
    }

    /// Sets the clock the signing instant is read from.
    ///
    /// If not set, defaults to [`SystemClock`].
    pub fn set_clock(&mut self, clock: impl Clock) {
        self.clock = Some(Arc::new(clock));
    }

    /// Sets the policy signer.
    ///
    /// If not set, defaults to an [`HmacSigner`] over the builder's secret key.
    pub fn set_signer(&mut self, signer: impl PolicySigner) {
        self.signer = Some(Arc::new(signer));
    }

    /// Validates the inputs and captures the signing instant.
    ///
    /// # Errors
    /// Returns an error if the region is unknown, the ACL is invalid, or the
    /// options violate an invariant. No signing happens before validation passes.
    pub fn build(self) -> Result<PostForm> {
        let Self {
            bucket,
            region,
            access_key,
            secret,
            options,
            clock,
            signer,
        } = self;

        let region = Region::new(&region)?;
        let options = PostOptions::normalize(options)?;

        let clock = clock.unwrap_or_else(|| Arc::new(SystemClock));
        let signing_time = clock.now();
        options.expiration(signing_time)?;

        let credentials = Credentials::with_region(access_key, region, signing_time);
        let signer = signer.unwrap_or_else(|| Arc::new(HmacSigner::new(secret)));

        debug!(%bucket, %region, signing_time = signing_time.unix_timestamp(), "created post form");

        Ok(PostForm {
            bucket,
            credentials,
            options,
            clock,
            signer,
        })
    }
}

impl PostForm {
    /// Creates a session signed with the system clock.
    ///
    /// # Errors
    /// See [`PostFormBuilder::build`].
    pub fn new(
        bucket: impl Into<String>,
        region: impl Into<String>,
        access_key: impl Into<String>,
        secret: impl Into<SecretKey>,
        options: impl Into<OptionsInput>,
    ) -> Result<Self> {
        let mut builder = PostFormBuilder::new(bucket, region, access_key, secret);
        builder.set_options(options);
        builder.build()
    }

    /// The policy document for the current options.
    ///
    /// Generated on every call, so it always reflects [`set_options`](Self::set_options).
    #[must_use]
    pub fn post_policy(&self) -> PostPolicy {
        PostPolicy::generate(&self.options, &self.credentials, &self.bucket)
    }

    /// The base64 policy.
    #[must_use]
    pub fn policy(&self) -> String {
        self.post_policy().to_base64()
    }

    /// The lowercase hex signature of [`policy`](Self::policy).
    #[must_use]
    pub fn signature(&self) -> String {
        self.signer.sign_policy(&self.credentials, &self.policy())
    }

    /// Signs a policy given as raw JSON or base64.
    ///
    /// Unlike [`signature`](Self::signature), this reads the clock on every call,
    /// so the credential, date and signature follow the current instant.
    #[must_use]
    pub fn sign(&self, policy: &str) -> SignedPolicy {
        let credentials = Credentials::with_region(
            self.credentials.access_key().to_owned(),
            self.credentials.region(),
            self.clock.now(),
        );

        let policy = encode_policy_input(policy);
        debug!(already_encoded = matches!(policy, Cow::Borrowed(_)), "signing external policy");

        SignedPolicy {
            credential: credentials.amz_credential(),
            datetime: credentials.amz_date().fmt_iso8601(),
            signature: self.signer.sign_policy(&credentials, &policy),
            policy: policy.into_owned(),
        }
    }

    /// The upload endpoint, protocol-relative.
    #[must_use]
    pub fn form_url(&self) -> String {
        format!("//{}.s3-{}.amazonaws.com", self.bucket, self.credentials.region())
    }

    /// Every hidden input in emission order: the ten fixed fields, then the
    /// additional inputs. Unset optional fields are empty strings.
    #[must_use]
    pub fn inputs(&self) -> IndexMap<String, String> {
        let options = &self.options;
        let policy = self.policy();
        let signature = self.signer.sign_policy(&self.credentials, &policy);

        let fixed = [
            (field::CONTENT_TYPE, options.content_type().to_owned()),
            (field::ACL, options.acl().as_str().to_owned()),
            (
                field::SUCCESS_ACTION_REDIRECT,
                options.success_action_redirect().unwrap_or_default().to_owned(),
            ),
            (
                field::SUCCESS_ACTION_STATUS,
                options.success_action_status().map(|s| s.to_string()).unwrap_or_default(),
            ),
            (field::POLICY, policy),
            (field::X_AMZ_CREDENTIAL, self.credentials.amz_credential()),
            (field::X_AMZ_ALGORITHM, field::ALGORITHM.to_owned()),
            (field::X_AMZ_DATE, self.credentials.amz_date().fmt_iso8601()),
            (field::X_AMZ_SIGNATURE, signature),
            (field::KEY, options.default_filename().to_owned()),
        ];

        let mut inputs = IndexMap::with_capacity(fixed.len() + options.additional_inputs().len());
        for (name, value) in fixed {
            inputs.insert(name.to_owned(), value);
        }
        for (name, value) in options.additional_inputs() {
            inputs.insert(name.clone(), value.clone());
        }
        inputs
    }

    /// [`inputs`](Self::inputs) rendered as hidden `<input/>` elements, one per line.
    ///
    /// # Errors
    /// Returns [`Error::Render`](crate::Error::Render) if the template fails to render.
    pub fn inputs_as_html(&self) -> Result<String> {
        let inputs = self.inputs();
        Ok(html::hidden_inputs(inputs.iter().map(|(k, v)| (k.as_str(), v.as_str())))?)
    }

    /// A complete upload `<form>` posting to [`form_url`](Self::form_url).
    ///
    /// # Errors
    /// Returns [`Error::Render`](crate::Error::Render) if the template fails to render.
    pub fn html_form(&self) -> Result<String> {
        let action = self.form_url();
        let inputs = self.inputs();
        Ok(html::upload_form(&action, inputs.iter().map(|(k, v)| (k.as_str(), v.as_str())))?)
    }

    /// Merges `overrides` into the session options.
    ///
    /// Later calls to [`policy`](Self::policy), [`signature`](Self::signature)
    /// and [`inputs`](Self::inputs) reflect the change; values obtained before
    /// are stale. On error the session is unchanged.
    ///
    /// # Errors
    /// See [`PostOptions::merge`].
    pub fn set_options(&mut self, overrides: OptionsOverrides) -> Result<()> {
        let mut options = self.options.clone();
        options.merge(overrides)?;
        options.expiration(self.credentials.signing_time())?;

        debug!(?options, "updated post form options");
        self.options = options;
        Ok(())
    }

    /// Consuming variant of [`set_options`](Self::set_options).
    ///
    /// # Errors
    /// See [`PostOptions::merge`].
    pub fn with_options(mut self, overrides: OptionsOverrides) -> Result<Self> {
        self.set_options(overrides)?;
        Ok(self)
    }

    /// The captured signing instant, in epoch seconds.
    #[must_use]
    pub fn signing_time(&self) -> i64 {
        self.credentials.signing_time().unix_timestamp()
    }

    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    #[must_use]
    pub fn options(&self) -> &PostOptions {
        &self.options
    }
}

impl fmt::Debug for PostForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostForm")
            .field("bucket", &self.bucket)
            .field("credentials", &self.credentials)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
