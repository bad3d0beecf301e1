//! Warehouse configuration types.
//!
//! The layout mirrors the three sections operators already keep for the cluster:
//! `[cluster]` for the connection, `[iam_role]` for the role the cluster assumes while
//! bulk-loading, and `[s3]` for the dataset prefixes.

use std::sync::OnceLock;

use bon::Builder;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use crate::serde_helpers::{default_driver, default_port, default_region};
use crate::Location;

/// Errors raised while validating configuration values
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("'{0}' is not an IAM role ARN (expected arn:aws:iam::<account-id>:role/<name>)")]
    InvalidRoleArn(String),
}

/// Complete configuration of one pipeline run.
///
/// Constructed once at startup and passed by reference to the statement catalog and to
/// the warehouse connection.
#[derive(Debug, Clone, Serialize, Deserialize, Builder)]
#[serde(rename_all = "snake_case")]
pub struct WarehouseConfig {
    /// Connection to the Redshift cluster, not needed for the embedded engine
    #[serde(default)]
    pub cluster: Option<ClusterConfig>,

    /// Role the cluster assumes to read from the object store
    pub iam_role: IamRole,

    /// Dataset prefixes
    pub s3: S3Config,
}

/// Redshift cluster connection settings
#[derive(Clone, Serialize, Deserialize, Builder)]
#[serde(rename_all = "snake_case")]
pub struct ClusterConfig {
    /// Cluster endpoint host name
    #[builder(into)]
    pub host: String,

    #[serde(default = "default_port")]
    #[builder(default = default_port())]
    pub port: u16,

    #[builder(into)]
    pub db_name: String,

    #[builder(into)]
    pub user: String,

    #[builder(into)]
    pub password: String,

    /// ODBC driver name as registered in `odbcinst.ini`
    #[serde(default = "default_driver")]
    #[builder(default = default_driver(), into)]
    pub driver: String,

    /// Full ODBC connection string, takes precedence over the individual fields
    #[serde(default)]
    pub connection_string: Option<String>,
}

impl ClusterConfig {
    /// ODBC connection string for this cluster
    pub fn connection_string(&self) -> String {
        if let Some(connection_string) = &self.connection_string {
            return connection_string.clone();
        }

        format!(
            "Driver={{{}}};Server={};Port={};Database={};UID={};PWD={};",
            self.driver,
            self.host,
            self.port,
            self.db_name,
            odbc_value(&self.user),
            odbc_value(&self.password),
        )
    }
}

// values containing separators have to be braced, closing braces are doubled inside
fn odbc_value(value: &str) -> String {
    if value.contains([';', '{', '}', '=']) || value.trim() != value {
        format!("{{{}}}", value.replace('}', "}}"))
    } else {
        value.to_string()
    }
}

impl std::fmt::Debug for ClusterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("db_name", &self.db_name)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("driver", &self.driver)
            .field(
                "connection_string",
                &self.connection_string.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// IAM role the warehouse assumes for delegated object-store access
#[derive(Debug, Clone, Serialize, Deserialize, Builder)]
pub struct IamRole {
    pub arn: RoleArn,
}

/// A validated IAM role ARN.
///
/// Validation happens at construction so the value can be embedded in statement text
/// without further checks on the hot path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleArn(String);

impl RoleArn {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<&str> for RoleArn {
    type Error = ConfigError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        static ARN_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = ARN_REGEX.get_or_init(|| {
            Regex::new(r"^arn:aws(-[a-z]+)*:iam::\d{12}:role/[A-Za-z0-9+=,.@_/-]+$")
                .expect("invalid regex")
        });

        let value = value.trim();
        if regex.is_match(value) {
            Ok(RoleArn(value.to_string()))
        } else {
            Err(ConfigError::InvalidRoleArn(value.to_string()))
        }
    }
}

impl TryFrom<String> for RoleArn {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        RoleArn::try_from(value.as_str())
    }
}

impl<'de> Deserialize<'de> for RoleArn {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        RoleArn::try_from(s.as_str()).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for RoleArn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Object-store inputs of the staging load
#[derive(Debug, Clone, Serialize, Deserialize, Builder)]
#[serde(rename_all = "snake_case")]
pub struct S3Config {
    /// Prefix of the event log dataset
    pub log_data: Location,

    /// jsonpaths descriptor mapping event log keys to `staging_events` columns
    pub log_jsonpath: Location,

    /// Prefix of the song metadata dataset
    pub song_data: Location,

    /// Region of the bucket
    #[serde(default = "default_region")]
    #[builder(default = default_region(), into)]
    pub region: String,
}
