//! SQL dialects statements are rendered in.
//!
//! The catalog describes tables and transforms once; everything engine specific
//! (identifier quoting, type names, timestamp arithmetic, identity columns) goes through
//! a [`Dialect`].

use std::str::FromStr;

use playlog_schemas::{Column, ColumnType};
use serde::{Deserialize, Serialize};

use crate::catalog::CatalogError;

/// SQL flavor of the target warehouse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// Amazon Redshift, the production warehouse
    Redshift,
    /// Apache DataFusion, the embedded engine used for local runs
    #[serde(rename = "datafusion", alias = "local")]
    DataFusion,
}

/// Calendar fields extracted into the `time` dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePart {
    Hour,
    Day,
    /// ISO 8601 week of the year
    Week,
    Month,
    Year,
    /// Day of the week, 0 = Sunday
    Weekday,
}

impl DatePart {
    pub const ALL: [DatePart; 6] = [
        DatePart::Hour,
        DatePart::Day,
        DatePart::Week,
        DatePart::Month,
        DatePart::Year,
        DatePart::Weekday,
    ];

    /// Column of the `time` dimension holding this field
    pub fn column(&self) -> &'static str {
        match self {
            DatePart::Hour => "hour",
            DatePart::Day => "day",
            DatePart::Week => "week",
            DatePart::Month => "month",
            DatePart::Year => "year",
            DatePart::Weekday => "weekday",
        }
    }
}

impl Dialect {
    /// Quote an identifier.
    ///
    /// Redshift folds unquoted identifiers to lower case and the catalog only uses lower
    /// case names, so they are emitted bare. DataFusion reserves some of the names used
    /// by the schema (`time`, `hour`, ...) and gets every identifier quoted.
    pub fn ident(&self, name: &str) -> String {
        match self {
            Dialect::Redshift => name.to_string(),
            Dialect::DataFusion => format!("\"{}\"", name.replace('"', "\"\"")),
        }
    }

    /// Qualified column reference `alias.column`
    pub fn qualified(&self, alias: &str, column: &str) -> String {
        format!("{alias}.{}", self.ident(column))
    }

    /// Type name used in `CREATE TABLE`
    pub fn column_type(&self, data_type: ColumnType) -> &'static str {
        match (self, data_type) {
            (Dialect::Redshift, ColumnType::Text) => "VARCHAR(MAX)",
            (Dialect::Redshift, ColumnType::Double) => "FLOAT",
            (Dialect::DataFusion, ColumnType::Text) => "VARCHAR",
            (Dialect::DataFusion, ColumnType::Double) => "DOUBLE",
            (_, ColumnType::Integer) => "INT",
            (_, ColumnType::BigInt) => "BIGINT",
            (_, ColumnType::Timestamp) => "TIMESTAMP",
        }
    }

    /// Type name used in `CAST` expressions
    pub fn cast_type(&self, data_type: ColumnType) -> &'static str {
        match data_type {
            ColumnType::Text => "VARCHAR",
            other => self.column_type(other),
        }
    }

    /// Whether the engine assigns identity columns itself
    pub fn supports_identity(&self) -> bool {
        matches!(self, Dialect::Redshift)
    }

    /// Column clause of a `CREATE TABLE` statement.
    ///
    /// Storage hints and key constraints are Redshift only: DataFusion would parse the
    /// constraints but the engine neither needs them nor understands sort/dist keys.
    pub fn column_definition(&self, column: &Column) -> String {
        let name = self.ident(&column.name);

        match self {
            Dialect::Redshift => {
                let mut definition = format!("{name} {}", self.column_type(column.data_type));

                if column.identity {
                    definition.push_str(" IDENTITY(0,1)");
                }
                if column.dist_key {
                    definition.push_str(" DISTKEY");
                }
                if column.sort_key {
                    definition.push_str(" SORTKEY");
                }
                if column.not_null {
                    definition.push_str(" NOT NULL");
                }
                if column.primary_key {
                    definition.push_str(" PRIMARY KEY");
                }

                definition
            }
            Dialect::DataFusion => {
                let data_type = if column.identity {
                    ColumnType::BigInt
                } else {
                    column.data_type
                };

                format!("{name} {}", self.column_type(data_type))
            }
        }
    }

    /// Convert an epoch-milliseconds expression into a timestamp, truncating to seconds
    pub fn epoch_millis_to_timestamp(&self, expr: &str) -> String {
        match self {
            Dialect::Redshift => {
                format!("TIMESTAMP 'epoch' + ({expr} / 1000) * INTERVAL '1 second'")
            }
            Dialect::DataFusion => {
                format!("CAST(to_timestamp_seconds({expr} / 1000) AS TIMESTAMP)")
            }
        }
    }

    /// Extract a calendar field from a timestamp expression as an integer
    pub fn date_part(&self, part: DatePart, expr: &str) -> String {
        match self {
            Dialect::Redshift => {
                let field = match part {
                    DatePart::Hour => "hour",
                    DatePart::Day => "day",
                    DatePart::Week => "week",
                    DatePart::Month => "month",
                    DatePart::Year => "year",
                    DatePart::Weekday => "weekday",
                };
                format!("EXTRACT({field} FROM {expr})")
            }
            Dialect::DataFusion => {
                let field = match part {
                    DatePart::Hour => "hour",
                    DatePart::Day => "day",
                    DatePart::Week => "week",
                    DatePart::Month => "month",
                    DatePart::Year => "year",
                    DatePart::Weekday => "dow",
                };
                format!("CAST(date_part('{field}', {expr}) AS INT)")
            }
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::Redshift => write!(f, "redshift"),
            Dialect::DataFusion => write!(f, "datafusion"),
        }
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "redshift" => Ok(Dialect::Redshift),
            "datafusion" | "local" => Ok(Dialect::DataFusion),
            other => Err(format!("unknown dialect '{other}'")),
        }
    }
}

/// Render a value as a single quoted SQL string literal.
///
/// Quotes and backslashes are escaped; control characters are rejected outright since
/// no configuration value legitimately contains them.
pub fn string_literal(name: &str, value: &str) -> Result<String, CatalogError> {
    if let Some(c) = value.chars().find(|c| c.is_control()) {
        return Err(CatalogError::InvalidValue {
            name: name.to_string(),
            reason: format!("contains control character {c:?}"),
        });
    }

    let escaped = value.replace('\\', "\\\\").replace('\'', "''");
    Ok(format!("'{escaped}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Dialect::Redshift, "time", "time")]
    #[case(Dialect::DataFusion, "time", "\"time\"")]
    #[case(Dialect::DataFusion, "odd\"name", "\"odd\"\"name\"")]
    fn test_ident(#[case] dialect: Dialect, #[case] name: &str, #[case] expected: &str) {
        assert_eq!(dialect.ident(name), expected);
    }

    #[test]
    fn test_redshift_column_definition() {
        let column = Column::new("start_time", ColumnType::Timestamp)
            .not_null()
            .sort_key()
            .dist_key()
            .primary_key();

        assert_eq!(
            Dialect::Redshift.column_definition(&column),
            "start_time TIMESTAMP DISTKEY SORTKEY NOT NULL PRIMARY KEY"
        );
    }

    #[test]
    fn test_redshift_identity_column() {
        let column = Column::new("songplay_id", ColumnType::Integer)
            .identity()
            .primary_key();

        assert_eq!(
            Dialect::Redshift.column_definition(&column),
            "songplay_id INT IDENTITY(0,1) PRIMARY KEY"
        );
    }

    #[test]
    fn test_datafusion_column_definition_drops_hints() {
        let identity = Column::new("songplay_id", ColumnType::Integer)
            .identity()
            .primary_key();
        let text = Column::new("title", ColumnType::Text).not_null();

        assert_eq!(
            Dialect::DataFusion.column_definition(&identity),
            "\"songplay_id\" BIGINT"
        );
        assert_eq!(
            Dialect::DataFusion.column_definition(&text),
            "\"title\" VARCHAR"
        );
    }

    #[test]
    fn test_epoch_conversion() {
        assert_eq!(
            Dialect::Redshift.epoch_millis_to_timestamp("e.ts"),
            "TIMESTAMP 'epoch' + (e.ts / 1000) * INTERVAL '1 second'"
        );
        assert_eq!(
            Dialect::DataFusion.epoch_millis_to_timestamp("e.\"ts\""),
            "CAST(to_timestamp_seconds(e.\"ts\" / 1000) AS TIMESTAMP)"
        );
    }

    #[test]
    fn test_weekday_part() {
        assert_eq!(
            Dialect::Redshift.date_part(DatePart::Weekday, "ts"),
            "EXTRACT(weekday FROM ts)"
        );
        assert_eq!(
            Dialect::DataFusion.date_part(DatePart::Weekday, "ts"),
            "CAST(date_part('dow', ts) AS INT)"
        );
    }

    #[rstest]
    #[case("s3://udacity-dend/log_data", "'s3://udacity-dend/log_data'")]
    #[case("it's", "'it''s'")]
    #[case("back\\slash", "'back\\\\slash'")]
    fn test_string_literal(#[case] value: &str, #[case] expected: &str) {
        assert_eq!(string_literal("value", value).unwrap(), expected);
    }

    #[test]
    fn test_string_literal_rejects_control_characters() {
        let result = string_literal("log_data", "s3://bucket/\nprefix");
        assert!(matches!(result, Err(CatalogError::InvalidValue { .. })));
    }

    #[test]
    fn test_dialect_from_str() {
        assert_eq!("Redshift".parse::<Dialect>().unwrap(), Dialect::Redshift);
        assert_eq!("local".parse::<Dialect>().unwrap(), Dialect::DataFusion);
        assert!("mysql".parse::<Dialect>().is_err());
    }
}
