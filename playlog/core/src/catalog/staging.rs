//! Bulk loads of the staging tables.
//!
//! On Redshift a load is a single `COPY` reading JSON from S3 with the cluster's own
//! parallelism. The embedded engine has no `COPY`; it registers the same prefix as a
//! newline-delimited JSON listing table and moves the rows over with
//! `INSERT ... SELECT`, mapping each column from its source key.

use std::collections::HashMap;
use std::sync::OnceLock;

use playlog_schemas::{Location, RoleArn, Table};
use regex::Regex;
use serde_json::json;

use super::{CatalogError, StagingSource};
use crate::dialect::{string_literal, Dialect};

/// How the fields of a source document map onto staging columns
#[derive(Debug, Clone, Copy)]
pub enum JsonMapping<'a> {
    /// Explicit jsonpaths descriptor, one path per column in column order
    Paths(&'a Location),
    /// Match document keys to column names
    Auto,
}

/// One staging table and the dataset it is loaded from
#[derive(Debug, Clone, Copy)]
pub struct StagingLoad<'a> {
    pub table: &'a Table,
    pub location: &'a Location,
    pub mapping: JsonMapping<'a>,
}

/// jsonpaths descriptor for a staging table.
///
/// Redshift matches paths to columns by position, so the descriptor is derived from the
/// column list instead of being maintained by hand next to it.
pub fn jsonpaths(table: &Table) -> serde_json::Value {
    let paths = table
        .columns
        .iter()
        .map(|column| format!("$['{}']", column.source_key()))
        .collect::<Vec<_>>();

    json!({ "jsonpaths": paths })
}

/// Name the local engine registers a load's source dataset under
pub fn source_name(table: &Table) -> String {
    format!("{}_source", table.name)
}

/// Redshift `COPY` for one staging table
pub(crate) fn redshift_copy(
    load: &StagingLoad<'_>,
    role: &RoleArn,
    region: &str,
) -> Result<String, CatalogError> {
    let location = s3_literal(&load.table.name, load.location)?;
    let credentials = string_literal("iam_role", &format!("aws_iam_role={role}"))?;
    let region = region_literal(region)?;

    let format = match load.mapping {
        JsonMapping::Paths(jsonpaths) => {
            let jsonpaths = s3_literal("log_jsonpath", jsonpaths)?;
            format!("format as JSON {jsonpaths}\n    timeformat as 'epochmillisecs'")
        }
        JsonMapping::Auto => "format as JSON 'auto'".to_string(),
    };

    Ok(format!(
        "COPY {} FROM {location}\n    credentials {credentials}\n    region {region}\n    {format}",
        Dialect::Redshift.ident(&load.table.name)
    ))
}

/// `INSERT ... SELECT` moving a registered JSON source into its staging table.
///
/// Values are converted with `CAST`, so a field that does not fit its column type fails
/// the load. Columns marked `empty_as_null` load an empty string as `NULL`.
pub(crate) fn local_load(
    dialect: Dialect,
    load: &StagingLoad<'_>,
    region: &str,
) -> (String, StagingSource) {
    let table = load.table;
    let source = source_name(table);

    let columns = table
        .columns
        .iter()
        .map(|column| dialect.ident(&column.name))
        .collect::<Vec<_>>()
        .join(", ");

    let values = table
        .columns
        .iter()
        .map(|column| {
            let field = dialect.qualified("src", column.source_key());
            let value = if column.empty_as_null {
                format!("NULLIF(CAST({field} AS VARCHAR), '')")
            } else {
                field
            };

            format!("    CAST({value} AS {})", dialect.cast_type(column.data_type))
        })
        .collect::<Vec<_>>()
        .join(",\n");

    let sql = format!(
        "INSERT INTO {} ({columns})\nSELECT\n{values}\nFROM {} src",
        dialect.ident(&table.name),
        dialect.ident(&source),
    );

    let mut storage_options = HashMap::new();
    if load.location.is_s3() {
        storage_options.insert("aws_region".to_string(), region.to_string());
    }

    let source = StagingSource {
        name: source,
        location: load.location.as_prefix(),
        storage_options,
    };

    (sql, source)
}

fn s3_literal(name: &str, location: &Location) -> Result<String, CatalogError> {
    if !location.is_s3() {
        return Err(CatalogError::UnsupportedLocation {
            name: name.to_string(),
            location: location.to_string(),
        });
    }

    string_literal(name, location.as_str())
}

fn region_literal(region: &str) -> Result<String, CatalogError> {
    static REGION_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = REGION_REGEX
        .get_or_init(|| Regex::new(r"^[a-z]{2}(-[a-z]+)+-\d+$").expect("invalid regex"));

    if !regex.is_match(region) {
        return Err(CatalogError::InvalidRegion(region.to_string()));
    }

    string_literal("region", region)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tables::{table, STAGING_EVENTS, STAGING_SONGS};
    use rstest::rstest;

    fn location(s: &str) -> Location {
        Location::try_from(s).unwrap()
    }

    fn role() -> RoleArn {
        RoleArn::try_from("arn:aws:iam::123456789012:role/dwhRole").unwrap()
    }

    #[test]
    fn test_jsonpaths_follow_column_order() {
        let descriptor = jsonpaths(table(STAGING_EVENTS).unwrap());
        let paths = descriptor["jsonpaths"].as_array().unwrap();

        assert_eq!(paths.len(), 18);
        assert_eq!(paths[0], "$['artist']");
        assert_eq!(paths[2], "$['firstName']");
        assert_eq!(paths[17], "$['userId']");
    }

    #[test]
    fn test_events_copy() {
        let log_data = location("s3://udacity-dend/log_data");
        let jsonpath = location("s3://udacity-dend/log_json_path.json");
        let load = StagingLoad {
            table: table(STAGING_EVENTS).unwrap(),
            location: &log_data,
            mapping: JsonMapping::Paths(&jsonpath),
        };

        let sql = redshift_copy(&load, &role(), "us-west-2").unwrap();

        assert_eq!(
            sql,
            "COPY staging_events FROM 's3://udacity-dend/log_data'\n    \
            credentials 'aws_iam_role=arn:aws:iam::123456789012:role/dwhRole'\n    \
            region 'us-west-2'\n    \
            format as JSON 's3://udacity-dend/log_json_path.json'\n    \
            timeformat as 'epochmillisecs'"
        );
    }

    #[test]
    fn test_songs_copy_uses_auto_mapping() {
        let song_data = location("s3://udacity-dend/song_data");
        let load = StagingLoad {
            table: table(STAGING_SONGS).unwrap(),
            location: &song_data,
            mapping: JsonMapping::Auto,
        };

        let sql = redshift_copy(&load, &role(), "eu-central-1").unwrap();

        assert!(sql.starts_with("COPY staging_songs FROM 's3://udacity-dend/song_data'"));
        assert!(sql.contains("region 'eu-central-1'"));
        assert!(sql.ends_with("format as JSON 'auto'"));
        assert!(!sql.contains("timeformat"));
    }

    #[test]
    fn test_copy_rejects_local_paths() {
        let song_data = location("/data/song_data");
        let load = StagingLoad {
            table: table(STAGING_SONGS).unwrap(),
            location: &song_data,
            mapping: JsonMapping::Auto,
        };

        let result = redshift_copy(&load, &role(), "us-west-2");
        assert!(matches!(
            result,
            Err(CatalogError::UnsupportedLocation { .. })
        ));
    }

    #[rstest]
    #[case("us-west-2'")]
    #[case("US-WEST-2")]
    #[case("")]
    fn test_copy_rejects_invalid_region(#[case] region: &str) {
        let song_data = location("s3://udacity-dend/song_data");
        let load = StagingLoad {
            table: table(STAGING_SONGS).unwrap(),
            location: &song_data,
            mapping: JsonMapping::Auto,
        };

        let result = redshift_copy(&load, &role(), region);
        assert!(matches!(result, Err(CatalogError::InvalidRegion(_))));
    }

    #[test]
    fn test_local_load_maps_source_keys() {
        let log_data = location("/data/log_data");
        let load = StagingLoad {
            table: table(STAGING_EVENTS).unwrap(),
            location: &log_data,
            mapping: JsonMapping::Auto,
        };

        let (sql, source) = local_load(Dialect::DataFusion, &load, "us-west-2");

        assert!(sql.starts_with(r#"INSERT INTO "staging_events" ("artist", "auth", "firstname""#));
        assert!(sql.contains("    CAST(src.\"firstName\" AS VARCHAR),\n"));
        assert!(sql.contains("    CAST(src.\"ts\" AS BIGINT),\n"));
        assert!(sql.contains("    CAST(src.\"length\" AS DOUBLE),\n"));
        assert!(sql.contains("    CAST(src.\"sessionId\" AS INT),\n"));
        assert!(sql.contains("    CAST(NULLIF(CAST(src.\"userId\" AS VARCHAR), '') AS INT)\n"));
        assert!(!sql.contains("TRY_CAST"));
        assert!(sql.ends_with("FROM \"staging_events_source\" src"));

        assert_eq!(source.name, "staging_events_source");
        assert!(source.location.as_str().ends_with("/data/log_data/"));
        assert!(source.storage_options.is_empty());
    }

    #[test]
    fn test_local_load_passes_region_for_s3() {
        let song_data = location("s3://udacity-dend/song_data");
        let load = StagingLoad {
            table: table(STAGING_SONGS).unwrap(),
            location: &song_data,
            mapping: JsonMapping::Auto,
        };

        let (_, source) = local_load(Dialect::DataFusion, &load, "us-west-2");

        assert_eq!(source.location.as_str(), "s3://udacity-dend/song_data/");
        assert_eq!(
            source.storage_options.get("aws_region").map(String::as_str),
            Some("us-west-2")
        );
    }
}
