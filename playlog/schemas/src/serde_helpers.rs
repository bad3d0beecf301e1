//! Shared serde default values for the configuration types

/// Default Redshift port
pub fn default_port() -> u16 {
    5439
}

/// Region the public song-play datasets live in
pub fn default_region() -> String {
    "us-west-2".to_string()
}

/// Name the Amazon Redshift ODBC driver registers under on 64 bit hosts
pub fn default_driver() -> String {
    "Amazon Redshift (x64)".to_string()
}
