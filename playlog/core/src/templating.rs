use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock};
use std::{collections::HashMap, path::Path};

use miette::{Diagnostic, NamedSource, SourceOffset, SourceSpan};
use playlog_schemas::WarehouseConfig;
use regex::Regex;
use tracing::debug;

#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum TemplateError {
    #[error("Cannot read warehouse configuration '{file_path}'")]
    #[diagnostic(
        code(playlog::config::not_found),
        help("Pass the configuration with -c, e.g. `playlog run -c dwh.toml`")
    )]
    NotFound {
        #[source]
        source: std::io::Error,
        file_path: String,
    },

    #[error("Configuration format '{0}' is not available")]
    #[diagnostic(
        code(playlog::config::unknown_format),
        help(
            "Formats compiled into this build: {}.\n\
             Enable the `json`, `yaml` or `toml` feature to read other files.",
            Self::enabled_formats()
        )
    )]
    UnknownFormat(TemplateFormat),

    #[error("No value for configuration parameters {0:?}")]
    #[diagnostic(
        code(playlog::config::missing_params),
        help(
            "Every ${{name}} placeholder needs a value on the command line, e.g.\n\
             playlog run -c dwh.toml -p host=dwh.example.com -p password=..."
        )
    )]
    MissingParams(BTreeSet<String>),

    #[cfg(feature = "json")]
    #[error("Invalid JSON configuration")]
    #[diagnostic(code(playlog::config::json))]
    ParseJson {
        #[source_code]
        source_code: Arc<NamedSource<String>>,
        #[label("{}", error)]
        span: SourceSpan,
        #[source]
        error: serde_json::Error,
    },

    #[cfg(feature = "yaml")]
    #[error("Invalid YAML configuration")]
    #[diagnostic(code(playlog::config::yaml))]
    ParseYaml {
        #[source_code]
        source_code: Arc<NamedSource<String>>,
        #[label("{}", error)]
        span: SourceSpan,
        #[source]
        error: serde_yml::Error,
    },

    #[cfg(feature = "toml")]
    #[error("Invalid TOML configuration")]
    #[diagnostic(code(playlog::config::toml))]
    ParseToml {
        #[source_code]
        source_code: Arc<NamedSource<String>>,
        #[label("{}", error)]
        span: SourceSpan,
        #[source]
        error: toml::de::Error,
    },

    #[cfg(feature = "toml")]
    #[error(transparent)]
    #[diagnostic(code(playlog::config::toml_render))]
    RenderToml(#[from] toml::ser::Error),
}

impl TemplateError {
    fn enabled_formats() -> String {
        let formats = [
            (cfg!(feature = "json"), "json"),
            (cfg!(feature = "yaml"), "yaml/yml"),
            (cfg!(feature = "toml"), "toml"),
        ];

        let enabled: Vec<&str> = formats
            .into_iter()
            .filter_map(|(enabled, name)| enabled.then_some(name))
            .collect();

        if enabled.is_empty() {
            "none".to_string()
        } else {
            enabled.join(", ")
        }
    }
}

/// File format of a warehouse configuration, usually picked by [`format_from_path`].
#[derive(Debug, Clone)]
pub enum TemplateFormat {
    Json,
    Toml,
    Yaml,
    /// Extension that maps to no known format
    Unknown(String),
}

impl std::fmt::Display for TemplateFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TemplateFormat::Json => "json",
            TemplateFormat::Toml => "toml",
            TemplateFormat::Yaml => "yaml",
            TemplateFormat::Unknown(format) => format.as_str(),
        };
        f.write_str(name)
    }
}

/// Loading of warehouse configurations with parameter substitution.
///
/// Configuration files may contain `${parameter_name}` placeholders (letters, digits
/// and underscores). The file is parsed and re-rendered before substitution, so syntax
/// errors point into the file as written and placeholders inside comments are dropped.
pub trait TemplateLoader: Sized {
    fn from_file<P: AsRef<Path>>(
        path: P,
        format: TemplateFormat,
        params: HashMap<String, String>,
    ) -> Result<Self, TemplateError>;

    fn from_str<T: AsRef<str>>(
        value: T,
        format: TemplateFormat,
        params: HashMap<String, String>,
    ) -> Result<Self, TemplateError>;

    /// Replace every `${name}` with its value.
    ///
    /// Fails with every placeholder left without a value.
    fn substitute_params(
        raw: &str,
        params: HashMap<String, String>,
    ) -> Result<String, TemplateError> {
        static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
        let placeholder = PLACEHOLDER
            .get_or_init(|| Regex::new(r"\$\{([a-zA-Z0-9_]+)\}").expect("invalid regex"));

        let mut missing = BTreeSet::new();
        let rendered = placeholder.replace_all(raw, |captures: &regex::Captures<'_>| {
            let name = &captures[1];
            match params.get(name) {
                Some(value) => value.clone(),
                None => {
                    missing.insert(name.to_string());
                    captures[0].to_string()
                }
            }
        });

        if !missing.is_empty() {
            return Err(TemplateError::MissingParams(missing));
        }

        Ok(rendered.into_owned())
    }
}

impl TemplateLoader for WarehouseConfig {
    fn from_file<T: AsRef<Path>>(
        path: T,
        format: TemplateFormat,
        params: HashMap<String, String>,
    ) -> Result<WarehouseConfig, TemplateError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| TemplateError::NotFound {
            source,
            file_path: path.display().to_string(),
        })?;
        Self::from_str(contents, format, params)
    }

    fn from_str<T: AsRef<str>>(
        value: T,
        format: TemplateFormat,
        params: HashMap<String, String>,
    ) -> Result<WarehouseConfig, TemplateError> {
        debug!(%format, "loading warehouse configuration");

        let normalized = normalize(value.as_ref(), &format)?;
        let definition = Self::substitute_params(&normalized, params)?;
        decode(&definition, &format)
    }
}

/// Parse the raw file into a generic value and render it back.
fn normalize(contents: &str, format: &TemplateFormat) -> Result<String, TemplateError> {
    match format {
        #[cfg(feature = "toml")]
        TemplateFormat::Toml => {
            let value = toml::from_str::<toml::Value>(contents)
                .map_err(|error| toml_error(contents, error))?;
            Ok(toml::to_string(&value)?)
        }
        #[cfg(feature = "json")]
        TemplateFormat::Json => serde_json::from_str::<serde_json::Value>(contents)
            .and_then(|value| serde_json::to_string(&value))
            .map_err(|error| json_error(contents, error)),
        #[cfg(feature = "yaml")]
        TemplateFormat::Yaml => serde_yml::from_str::<serde_yml::Value>(contents)
            .and_then(|value| serde_yml::to_string(&value))
            .map_err(|error| yaml_error(contents, error)),
        other => Err(TemplateError::UnknownFormat(other.clone())),
    }
}

fn decode(definition: &str, format: &TemplateFormat) -> Result<WarehouseConfig, TemplateError> {
    match format {
        #[cfg(feature = "toml")]
        TemplateFormat::Toml => {
            toml::from_str(definition).map_err(|error| toml_error(definition, error))
        }
        #[cfg(feature = "json")]
        TemplateFormat::Json => {
            serde_json::from_str(definition).map_err(|error| json_error(definition, error))
        }
        #[cfg(feature = "yaml")]
        TemplateFormat::Yaml => {
            serde_yml::from_str(definition).map_err(|error| yaml_error(definition, error))
        }
        other => Err(TemplateError::UnknownFormat(other.clone())),
    }
}

fn source_code(name: &str, contents: &str) -> Arc<NamedSource<String>> {
    Arc::new(NamedSource::new(name, contents.to_string()))
}

#[cfg(feature = "toml")]
fn toml_error(contents: &str, error: toml::de::Error) -> TemplateError {
    let start = error.span().map(|span| span.start).unwrap_or_default();

    TemplateError::ParseToml {
        source_code: source_code("dwh.toml", contents),
        span: SourceSpan::new(SourceOffset::from(start), 1),
        error,
    }
}

#[cfg(feature = "json")]
fn json_error(contents: &str, error: serde_json::Error) -> TemplateError {
    let offset = SourceOffset::from_location(contents, error.line(), error.column());

    TemplateError::ParseJson {
        source_code: source_code("dwh.json", contents),
        span: SourceSpan::new(offset, 1),
        error,
    }
}

#[cfg(feature = "yaml")]
fn yaml_error(contents: &str, error: serde_yml::Error) -> TemplateError {
    let offset = error
        .location()
        .map(|at| SourceOffset::from_location(contents, at.line(), at.column()))
        .unwrap_or_else(|| SourceOffset::from(0));

    TemplateError::ParseYaml {
        source_code: source_code("dwh.yaml", contents),
        span: SourceSpan::new(offset, 1),
        error,
    }
}

/// Pick the configuration format from a file extension.
pub fn format_from_path<P: AsRef<Path>>(path: P) -> TemplateFormat {
    match path.as_ref().extension().and_then(|ext| ext.to_str()) {
        Some("toml") => TemplateFormat::Toml,
        Some("json") => TemplateFormat::Json,
        Some("yml" | "yaml") => TemplateFormat::Yaml,
        Some(other) => TemplateFormat::Unknown(other.to_string()),
        None => TemplateFormat::Unknown("unknown_ext".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const TOML_CONFIG: &str = r#"
# connection is only needed for the Redshift engine
[cluster]
host = "dwh.abc123.us-west-2.redshift.amazonaws.com"
db_name = "dwh"
user = "dwhuser"
password = "${password}"

[iam_role]
arn = "arn:aws:iam::123456789012:role/dwhRole"

[s3]
log_data = "${bucket}/log_data"
log_jsonpath = "${bucket}/log_json_path.json"
song_data = "${bucket}/song_data"
"#;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_toml_with_params() {
        let config = WarehouseConfig::from_str(
            TOML_CONFIG,
            TemplateFormat::Toml,
            params(&[("password", "hunter2"), ("bucket", "s3://udacity-dend")]),
        )
        .unwrap();

        assert_eq!(config.cluster.unwrap().password, "hunter2");
        assert_eq!(
            config.s3.log_jsonpath.as_str(),
            "s3://udacity-dend/log_json_path.json"
        );
    }

    #[test]
    fn test_missing_params_are_all_reported() {
        let result = WarehouseConfig::from_str(TOML_CONFIG, TemplateFormat::Toml, HashMap::new());

        match result {
            Err(TemplateError::MissingParams(missing)) => {
                assert_eq!(
                    missing.into_iter().collect::<Vec<_>>(),
                    vec!["bucket".to_string(), "password".to_string()]
                );
            }
            other => panic!("Expected MissingParams, got {other:?}"),
        }
    }

    #[test]
    fn test_yaml_config() {
        let yaml = r#"
iam_role:
  arn: arn:aws:iam::123456789012:role/dwhRole
s3:
  log_data: ${data_dir}/log_data
  log_jsonpath: ${data_dir}/log_json_path.json
  song_data: ${data_dir}/song_data
  region: eu-west-1
"#;

        let config = WarehouseConfig::from_str(
            yaml,
            TemplateFormat::Yaml,
            params(&[("data_dir", "/tmp/playlog")]),
        )
        .unwrap();

        assert!(config.cluster.is_none());
        assert_eq!(config.s3.region, "eu-west-1");
        assert_eq!(config.s3.song_data.scheme(), "file");
    }

    #[test]
    fn test_json_syntax_error_has_span() {
        let result = WarehouseConfig::from_str("{ \"s3\": ", TemplateFormat::Json, HashMap::new());
        assert!(matches!(result, Err(TemplateError::ParseJson { .. })));
    }

    #[test]
    fn test_invalid_role_is_a_parse_error() {
        let raw = TOML_CONFIG.replace("arn:aws:iam::123456789012:role/dwhRole", "dwhRole");
        let result = WarehouseConfig::from_str(
            raw,
            TemplateFormat::Toml,
            params(&[("password", "x"), ("bucket", "s3://b")]),
        );

        assert!(matches!(result, Err(TemplateError::ParseToml { .. })));
    }

    #[test]
    fn test_missing_file() {
        let result = WarehouseConfig::from_file(
            "/definitely/not/here/dwh.toml",
            TemplateFormat::Toml,
            HashMap::new(),
        );
        assert!(matches!(result, Err(TemplateError::NotFound { .. })));
    }

    #[rstest]
    #[case("dwh.toml", "toml")]
    #[case("dwh.yml", "yaml")]
    #[case("dwh.json", "json")]
    #[case("dwh.ini", "ini")]
    fn test_format_from_path(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(format_from_path(path).to_string(), expected);
    }
}
