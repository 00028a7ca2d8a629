//! Integration tests for signed POST forms

use s3s_post::clock::{Clock, FixedClock, SigningTime};
use s3s_post::credentials::Credentials;
use s3s_post::options::{InvalidOptions, OptionsOverrides, PostOptions};
use s3s_post::policy::{Condition, PostPolicy};
use s3s_post::signature::PolicySigner;
use s3s_post::{Error, PostForm, PostFormBuilder};

use std::sync::atomic::{AtomicI64, Ordering};

use serde_json::{Value, json};

const SIGNING_TIME: i64 = 1_700_000_000; // 2023-11-14T22:13:20Z

const EXPECTED_POLICY: &str = concat!(
    "eyJleHBpcmF0aW9uIjoiMjAyMy0xMS0xNFQyMjoxODoyMC4wMDBaIiwiY29uZGl0aW9ucyI6W3siYnVja2V0IjoibXktYnVja2V0In0seyJhY2wiOiJwdWJsaWMtcmVhZCJ9LHsiWC1hbXotY3JlZGVudGlhbCI6IkFLSUFFWEFNUExFLzIwMjMxMTE0L3VzLWVhc3QtMS9zMy9hd3M0X3JlcXVlc3QifSx7IlgtYW16LWFsZ29yaXRobSI6IkFXUzQtSE1BQy1TSEEyNTYifSx7IlgtYW16LWRhdGUiOiIyMDIzMTExNFQyMjEzMjBaIn0sWyJzdGFydHMtd2l0aCIsIiRrZXkiLCIiXSxbInN0YXJ0cy13aXRoIiwiJENvbnRlbnQtVHlwZSIsImltYWdlLyJdLHsic3VjY2Vzc19hY3Rpb25fc3RhdHVzIjoiMjAxIn1dfQ==",
);

const EXPECTED_SIGNATURE: &str = "ba947bdd01dcd313ab49a35fe1737d9a65ee38d36e2a517e0f8a11fc059873a9";

const FIXED_INPUTS: [&str; 10] = [
    "Content-Type",
    "acl",
    "success_action_redirect",
    "success_action_status",
    "policy",
    "X-amz-credential",
    "X-amz-algorithm",
    "X-amz-date",
    "X-amz-signature",
    "key",
];

fn signing_time() -> SigningTime {
    SigningTime::from_unix_timestamp(SIGNING_TIME).unwrap()
}

fn builder() -> PostFormBuilder {
    let mut builder = PostFormBuilder::new("my-bucket", "us-east-1", "AKIAEXAMPLE", "secret");
    builder.set_clock(FixedClock::new(signing_time()));
    builder
}

fn form() -> PostForm {
    builder().build().unwrap()
}

fn decode(policy_b64: &str) -> Value {
    let policy = PostPolicy::from_base64(policy_b64).unwrap();
    policy.to_value()
}

/// Advances one second on every reading.
struct TickingClock(AtomicI64);

impl Clock for TickingClock {
    fn now(&self) -> SigningTime {
        SigningTime::from_unix_timestamp(self.0.fetch_add(1, Ordering::SeqCst)).unwrap()
    }
}

struct StubSigner;

impl PolicySigner for StubSigner {
    fn sign_policy(&self, credentials: &Credentials, policy: &str) -> String {
        format!("{}:{}", credentials.date(), policy.len())
    }
}

#[test]
fn fixed_inputs_produce_stable_policy_and_signature() {
    let form = form();

    assert_eq!(form.signing_time(), SIGNING_TIME);
    assert_eq!(form.policy(), EXPECTED_POLICY);
    assert_eq!(form.policy(), form.policy());
    assert_eq!(form.signature(), EXPECTED_SIGNATURE);
    assert_eq!(form.signature(), form.signature());

    let signature = form.signature();
    assert_eq!(signature.len(), 64);
    assert_eq!(signature, signature.to_ascii_lowercase());
}

#[test]
fn policy_decodes_to_expected_conditions() {
    let doc = decode(&form().policy());
    assert_eq!(
        doc,
        json!({
            "expiration": "2023-11-14T22:18:20.000Z",
            "conditions": [
                { "bucket": "my-bucket" },
                { "acl": "public-read" },
                { "X-amz-credential": "AKIAEXAMPLE/20231114/us-east-1/s3/aws4_request" },
                { "X-amz-algorithm": "AWS4-HMAC-SHA256" },
                { "X-amz-date": "20231114T221320Z" },
                ["starts-with", "$key", ""],
                ["starts-with", "$Content-Type", "image/"],
                { "success_action_status": "201" },
            ]
        })
    );
}

#[test]
fn inputs_have_fixed_order() {
    let form = form();
    let inputs = form.inputs();

    let keys: Vec<&str> = inputs.keys().map(String::as_str).collect();
    assert_eq!(keys, FIXED_INPUTS);

    assert_eq!(inputs["Content-Type"], "image/*");
    assert_eq!(inputs["acl"], "public-read");
    assert_eq!(inputs["success_action_redirect"], "");
    assert_eq!(inputs["success_action_status"], "201");
    assert_eq!(inputs["policy"], EXPECTED_POLICY);
    assert_eq!(inputs["X-amz-credential"], "AKIAEXAMPLE/20231114/us-east-1/s3/aws4_request");
    assert_eq!(inputs["X-amz-algorithm"], "AWS4-HMAC-SHA256");
    assert_eq!(inputs["X-amz-date"], "20231114T221320Z");
    assert_eq!(inputs["X-amz-signature"], EXPECTED_SIGNATURE);
    assert_eq!(inputs["key"], "${filename}");
}

#[test]
fn additional_inputs_follow_fixed_inputs() {
    let mut builder = builder();
    builder.set_options(OptionsOverrides {
        additional_inputs: Some(
            [("x-amz-meta-uuid", "14365123651274"), ("x-amz-meta-tag", "holiday")]
                .into_iter()
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect(),
        ),
        ..Default::default()
    });
    let form = builder.build().unwrap();
    let inputs = form.inputs();

    let keys: Vec<&str> = inputs.keys().map(String::as_str).collect();
    assert_eq!(keys.len(), 12);
    assert_eq!(keys[..10], FIXED_INPUTS);
    assert_eq!(keys[10..], ["x-amz-meta-uuid", "x-amz-meta-tag"]);

    let doc = decode(&inputs["policy"]);
    let conditions = doc["conditions"].as_array().unwrap();
    assert_eq!(conditions[conditions.len() - 2], json!({ "x-amz-meta-uuid": "14365123651274" }));
    assert_eq!(conditions[conditions.len() - 1], json!({ "x-amz-meta-tag": "holiday" }));
}

#[test]
fn set_options_is_visible_to_later_policies() {
    let mut form = form();
    let before_policy = form.policy();
    let before_signature = form.signature();

    form.set_options(OptionsOverrides {
        acl: Some("private".to_owned()),
        content_type: Some("application/pdf".to_owned()),
        success_action_redirect: Some(Some("https://example.com/done".to_owned())),
        ..Default::default()
    })
    .unwrap();

    assert_ne!(form.policy(), before_policy);
    assert_ne!(form.signature(), before_signature);
    assert_eq!(form.signing_time(), SIGNING_TIME);

    let policy = PostPolicy::from_base64(&form.policy()).unwrap();
    assert!(policy.conditions().contains(&Condition::exact("acl", "private")));
    assert!(policy.conditions().contains(&Condition::exact("Content-Type", "application/pdf")));
    assert!(
        policy
            .conditions()
            .contains(&Condition::exact("success_action_redirect", "https://example.com/done"))
    );

    let inputs = form.inputs();
    assert_eq!(inputs["acl"], "private");
    assert_eq!(inputs["success_action_redirect"], "https://example.com/done");
}

#[test]
fn with_options_matches_set_options() {
    let overrides = OptionsOverrides {
        default_filename: Some("avatars/${filename}".to_owned()),
        ..Default::default()
    };

    let mut a = form();
    a.set_options(overrides.clone()).unwrap();
    let b = form().with_options(overrides).unwrap();

    assert_eq!(a.policy(), b.policy());
    assert_eq!(a.signature(), b.signature());
    assert_eq!(b.inputs()["key"], "avatars/${filename}");
}

#[test]
fn failed_set_options_keeps_session() {
    let mut form = form();

    let err = form
        .set_options(OptionsOverrides {
            acl: Some("everyone".to_owned()),
            ..Default::default()
        })
        .unwrap_err();
    assert!(matches!(err, Error::InvalidAcl(_)));

    let err = form
        .set_options(OptionsOverrides {
            additional_inputs: Some([("X-Amz-Signature".to_owned(), "forged".to_owned())].into_iter().collect()),
            ..Default::default()
        })
        .unwrap_err();
    assert!(matches!(err, Error::InvalidOptions(InvalidOptions::ReservedInput(_))));

    assert_eq!(form.options(), &PostOptions::default());
    assert_eq!(form.policy(), EXPECTED_POLICY);
}

#[test]
fn construction_errors_are_distinct() {
    let mut b = builder();
    b.set_options(OptionsOverrides {
        acl: Some("public".to_owned()),
        ..Default::default()
    });
    assert!(matches!(b.build(), Err(Error::InvalidAcl(_))));

    let options = PostOptions::from_json(&json!(["not", "an", "object"]));
    assert!(matches!(options, Err(Error::InvalidOptions(InvalidOptions::UnsupportedShape(_)))));

    let b = PostFormBuilder::new("my-bucket", "mars-central-1", "AKIAEXAMPLE", "secret");
    assert!(matches!(b.build(), Err(Error::InvalidRegion(_))));

    // 9999-12-31T23:59:59Z
    let mut b = PostFormBuilder::new("my-bucket", "us-east-1", "AKIAEXAMPLE", "secret");
    b.set_clock(FixedClock::new(SigningTime::from_unix_timestamp(253_402_300_799).unwrap()));
    assert!(matches!(
        b.build(),
        Err(Error::InvalidOptions(InvalidOptions::ExpirationOutOfRange))
    ));

    assert!(matches!(
        SigningTime::from_unix_timestamp(i64::MAX).map_err(Error::from),
        Err(Error::InvalidSigningTime(_))
    ));
}

#[test]
fn sign_detects_encoding() {
    let form = form();
    let raw = r#"{"expiration":"2023-11-15T00:00:00.000Z","conditions":[{"bucket":"my-bucket"}]}"#;
    let encoded = base64_of(raw);

    let from_raw = form.sign(raw);
    let from_encoded = form.sign(&encoded);

    assert_eq!(from_raw.signature, from_encoded.signature);
    assert_eq!(from_raw.policy, encoded);
    assert_eq!(from_encoded.policy, encoded);
    assert_eq!(from_raw.credential, "AKIAEXAMPLE/20231114/us-east-1/s3/aws4_request");
    assert_eq!(from_raw.datetime, "20231114T221320Z");
}

#[test]
fn sign_matches_session_signature_at_same_instant() {
    let form = form();
    let signed = form.sign(&form.policy());
    assert_eq!(signed.signature, form.signature());
    assert_eq!(signed.signature, EXPECTED_SIGNATURE);
}

#[test]
fn sign_reads_the_clock_per_call() {
    let mut builder = builder();
    builder.set_clock(TickingClock(AtomicI64::new(SIGNING_TIME)));
    let form = builder.build().unwrap();

    let first = form.sign("{}");
    let second = form.sign("{}");

    assert_eq!(form.signing_time(), SIGNING_TIME);
    assert_eq!(first.datetime, "20231114T221321Z");
    assert_eq!(second.datetime, "20231114T221322Z");

    // the session's own fields keep the captured instant
    assert_eq!(form.inputs()["X-amz-date"], "20231114T221320Z");
}

#[test]
fn custom_signer() {
    let mut builder = builder();
    builder.set_signer(StubSigner);
    let form = builder.build().unwrap();

    let expected = format!("20231114:{}", EXPECTED_POLICY.len());
    assert_eq!(form.signature(), expected);
    assert_eq!(form.inputs()["X-amz-signature"], expected);
}

#[test]
fn html_has_one_input_per_line() {
    let mut builder = builder();
    builder.set_options(OptionsOverrides {
        success_action_redirect: Some(Some("https://example.com/?a=1&b=2".to_owned())),
        ..Default::default()
    });
    let form = builder.build().unwrap();

    let html = form.inputs_as_html().unwrap();
    let lines: Vec<&str> = html.lines().collect();
    assert_eq!(lines.len(), 10);
    assert!(lines.iter().all(|l| l.starts_with(r#"<input type="hidden" name=""#) && l.ends_with("\"/>")));
    assert!(lines[0].starts_with(r#"<input type="hidden" name="Content-Type" value=""#));
    assert_eq!(lines[1], r#"<input type="hidden" name="acl" value="public-read"/>"#);
    assert!(lines[2].starts_with(r#"<input type="hidden" name="success_action_redirect" value=""#));
    assert!(!lines[2].contains("1&b"));
    assert_eq!(lines[9], r#"<input type="hidden" name="key" value="${filename}"/>"#);
}

#[test]
fn html_form_posts_to_form_url() {
    let form = form();
    let html = form.html_form().unwrap();
    let lines: Vec<&str> = html.lines().collect();

    assert_eq!(
        lines[0],
        r#"<form action="//my-bucket.s3-us-east-1.amazonaws.com" method="post" enctype="multipart/form-data">"#
    );
    assert_eq!(lines[1..11].join("\n"), form.inputs_as_html().unwrap());
    assert_eq!(lines[11], r#"<input type="file" name="file"/>"#);
    assert_eq!(lines.last(), Some(&"</form>"));
}

#[test]
fn form_url() {
    let mut builder = PostFormBuilder::new("photos", "eu-west-1", "AKIAEXAMPLE", "secret");
    builder.set_clock(FixedClock::new(signing_time()));
    let form = builder.build().unwrap();
    assert_eq!(form.form_url(), "//photos.s3-eu-west-1.amazonaws.com");
    assert_eq!(form.bucket(), "photos");
}

fn base64_of(raw: &str) -> String {
    base64_simd::STANDARD.encode_to_string(raw)
}
