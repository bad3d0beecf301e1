use std::collections::HashMap;

use object_store::aws::{AmazonS3, AmazonS3Builder};
use tracing::warn;
use url::Url;

use super::{Result, StoreError};

/// Build an S3 client for the bucket of `location`.
///
/// Credentials come from the environment (`AWS_ACCESS_KEY_ID`, `AWS_PROFILE`, ...).
/// The public song-play bucket can be read anonymously with `aws_skip_signature`.
/// Options accept the `aws_`-prefixed keys `region`, `endpoint`, `access_key_id`,
/// `secret_access_key`, `session_token`, `allow_http` and `skip_signature`.
pub(super) fn build_store(
    location: &Url,
    options: &HashMap<String, String>,
) -> Result<AmazonS3> {
    let flag = |value: &str| value.parse::<bool>().unwrap_or(false);
    let mut builder = AmazonS3Builder::from_env();

    if let Some(bucket) = location.host_str() {
        builder = builder.with_bucket_name(bucket);
    }

    for (key, value) in options {
        let key = key.strip_prefix("aws_").unwrap_or(key);
        builder = match key {
            "region" => builder.with_region(value),
            "endpoint" => builder.with_endpoint(value),
            "access_key_id" => builder.with_access_key_id(value),
            "secret_access_key" => builder.with_secret_access_key(value),
            "session_token" => builder.with_token(value),
            "allow_http" => builder.with_allow_http(flag(value)),
            "skip_signature" => builder.with_skip_signature(flag(value)),
            unknown => {
                warn!(key = unknown, "ignoring unknown S3 storage option");
                builder
            }
        };
    }

    builder.build().map_err(|source| StoreError::Build {
        location: location.to_string(),
        source,
    })
}
