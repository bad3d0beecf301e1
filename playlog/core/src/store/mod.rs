//! Object stores the embedded engine reads staging datasets from.
//!
//! `file://` and `memory://` locations are served by DataFusion itself. `s3://` and
//! `s3a://` prefixes get an `object_store` client registered on the session before the
//! dataset is listed, when built with the `s3` feature.

use std::collections::HashMap;
#[cfg(feature = "s3")]
use std::sync::Arc;

use datafusion::prelude::SessionContext;
use miette::Diagnostic;
use url::Url;

#[cfg(feature = "s3")]
mod s3;

#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum StoreError {
    #[error("Cannot read staging data from '{0}' locations")]
    #[diagnostic(
        code(playlog::store::unsupported_scheme),
        help("Point the s3 section at file:// paths, or at s3:// with the 's3' feature enabled")
    )]
    UnsupportedScheme(String),

    #[error("Failed to open object store for '{location}': {source}")]
    #[diagnostic(code(playlog::store::build))]
    Build {
        location: String,
        #[source]
        source: object_store::Error,
    },
}

pub type Result<T> = core::result::Result<T, StoreError>;

fn is_native(scheme: &str) -> bool {
    matches!(scheme, "file" | "memory")
}

/// Make `location` readable by `ctx`.
///
/// `storage_options` configure remote stores and are ignored for native locations.
pub fn register_object_store(
    ctx: &SessionContext,
    location: &Url,
    storage_options: &HashMap<String, String>,
) -> Result<()> {
    match location.scheme() {
        scheme if is_native(scheme) => Ok(()),
        #[cfg(feature = "s3")]
        "s3" | "s3a" => {
            let store = s3::build_store(location, storage_options)?;
            ctx.runtime_env()
                .register_object_store(location, Arc::new(store));
            Ok(())
        }
        scheme => {
            let _ = (ctx, storage_options);
            Err(StoreError::UnsupportedScheme(scheme.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_locations_are_not_registered() {
        let ctx = SessionContext::new();
        let url = Url::parse("file:///tmp/song_data/").unwrap();

        assert!(register_object_store(&ctx, &url, &HashMap::new()).is_ok());
    }

    #[test]
    fn test_unsupported_scheme_is_named() {
        let ctx = SessionContext::new();
        let url = Url::parse("ftp://example.com/log_data/").unwrap();

        let error = register_object_store(&ctx, &url, &HashMap::new()).unwrap_err();
        assert!(
            error.to_string().contains("'ftp'"),
            "Expected error message to name 'ftp', got: {error}"
        );
    }

    #[cfg(feature = "s3")]
    #[test]
    fn test_s3_prefix_is_registered() {
        let ctx = SessionContext::new();
        let url = Url::parse("s3://udacity-dend/song_data/").unwrap();
        let options = HashMap::from([
            ("aws_region".to_string(), "us-west-2".to_string()),
            ("aws_skip_signature".to_string(), "true".to_string()),
        ]);

        register_object_store(&ctx, &url, &options).unwrap();
        let table_url = datafusion::datasource::listing::ListingTableUrl::parse(url.as_str()).unwrap();
        assert!(ctx.runtime_env().object_store(&table_url).is_ok());
    }
}
