//! Command line generator for signed S3 POST upload forms
//!
//! # Usage
//!
//! ```bash
//! export AWS_ACCESS_KEY_ID=AKIAEXAMPLE
//! export AWS_SECRET_ACCESS_KEY=secret
//!
//! # hidden fields as JSON
//! s3s-post-form --bucket my-bucket --region us-east-1
//!
//! # hidden fields as HTML, with options from a file
//! s3s-post-form --bucket my-bucket --region us-east-1 --options upload.json --format html
//!
//! # sign a policy built elsewhere
//! s3s-post-form --bucket my-bucket --region us-east-1 --sign '{"expiration":"...","conditions":[]}'
//! ```
//!
//! Logs go to stderr and are controlled with `RUST_LOG`.

use s3s_post::clock::{FixedClock, SigningTime};
use s3s_post::options::{OptionsOverrides, parse_expires};
use s3s_post::{PostForm, PostFormBuilder};

use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use tracing::info;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum Format {
    #[default]
    Json,
    Html,
}

#[derive(clap::Parser)]
#[command(name = "s3s-post-form")]
#[command(about = "Generates signed fields for browser-based S3 POST uploads", long_about = None)]
struct Args {
    /// Target bucket
    #[arg(long)]
    bucket: String,

    /// Bucket region
    #[arg(long, env = "AWS_REGION", default_value = "us-east-1")]
    region: String,

    /// Access key id
    #[arg(long, env = "AWS_ACCESS_KEY_ID")]
    access_key: String,

    /// Secret access key
    #[arg(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    secret_key: String,

    /// JSON file with upload options
    #[arg(long)]
    options: Option<PathBuf>,

    /// Canned ACL, overrides the options file
    #[arg(long)]
    acl: Option<String>,

    /// Content type, overrides the options file
    #[arg(long)]
    content_type: Option<String>,

    /// Object key template, overrides the options file
    #[arg(long)]
    key: Option<String>,

    /// Policy lifetime such as "300", "5m" or "6 hours", overrides the options file
    #[arg(long, value_parser = parse_expires)]
    expires: Option<Duration>,

    /// Signing instant in epoch seconds instead of the current time
    #[arg(long)]
    signing_time: Option<i64>,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    format: Format,

    /// Sign this policy (raw JSON or base64) instead of generating one
    #[arg(long)]
    sign: Option<String>,
}

fn load_overrides(args: &Args) -> anyhow::Result<OptionsOverrides> {
    let mut overrides = match &args.options {
        Some(path) => {
            let text = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
            let value: serde_json::Value =
                serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))?;
            OptionsOverrides::from_json(&value)?
        }
        None => OptionsOverrides::default(),
    };

    if let Some(acl) = &args.acl {
        overrides.acl = Some(acl.clone());
    }
    if let Some(content_type) = &args.content_type {
        overrides.content_type = Some(content_type.clone());
    }
    if let Some(key) = &args.key {
        overrides.default_filename = Some(key.clone());
    }
    if let Some(expires) = args.expires {
        overrides.expires = Some(expires);
    }

    Ok(overrides)
}

fn build_form(args: &Args) -> anyhow::Result<PostForm> {
    let mut builder = PostFormBuilder::new(
        args.bucket.as_str(),
        args.region.as_str(),
        args.access_key.as_str(),
        args.secret_key.as_str(),
    );

    builder.set_options(load_overrides(args)?);

    if let Some(secs) = args.signing_time {
        let t = SigningTime::from_unix_timestamp(secs).with_context(|| format!("invalid signing time: {secs}"))?;
        builder.set_clock(FixedClock::new(t));
    }

    Ok(builder.build()?)
}

fn render(args: &Args, form: &PostForm) -> anyhow::Result<String> {
    if let Some(policy) = &args.sign {
        let signed = form.sign(policy);
        return Ok(serde_json::to_string_pretty(&signed)?);
    }

    match args.format {
        Format::Json => {
            let output = serde_json::json!({
                "form_url": form.form_url(),
                "inputs": form.inputs(),
            });
            Ok(serde_json::to_string_pretty(&output)?)
        }
        Format::Html => Ok(form.html_form()?),
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(io::stderr)
        .init();

    let form = build_form(&args)?;
    info!(bucket = %form.bucket(), region = %form.credentials().region(), "signing post form");

    println!("{}", render(&args, &form)?);
    Ok(())
}
