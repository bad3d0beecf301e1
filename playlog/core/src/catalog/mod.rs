//! Statement catalog.
//!
//! The catalog renders the four statement lists the loader runs, in a fixed order:
//!
//! - drop: `DROP TABLE IF EXISTS` for each table
//! - create: `CREATE TABLE IF NOT EXISTS` for each table
//! - copy: the two staging loads
//! - insert: the five warehouse transforms
//!
//! Drop and create lists follow table declaration order (staging, fact, dimensions).

use std::collections::HashMap;

use miette::Diagnostic;
use playlog_schemas::{Phase, Table, WarehouseConfig};
use url::Url;

use crate::dialect::Dialect;

pub mod ddl;
pub mod staging;
pub mod tables;
pub mod transforms;

use staging::{JsonMapping, StagingLoad};
use tables::{STAGING_EVENTS, STAGING_SONGS};

/// Errors raised while rendering statements from configuration values
#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum CatalogError {
    #[error("Invalid value for '{name}': {reason}")]
    #[diagnostic(code(playlog::catalog::invalid_value))]
    InvalidValue { name: String, reason: String },

    #[error("'{name}' must be an s3:// location for a Redshift COPY, got '{location}'")]
    #[diagnostic(
        code(playlog::catalog::unsupported_location),
        help("Redshift can only bulk-load from S3. Use --engine local to load from the filesystem.")
    )]
    UnsupportedLocation { name: String, location: String },

    #[error("'{0}' is not an AWS region")]
    #[diagnostic(
        code(playlog::catalog::invalid_region),
        help("Regions look like 'us-west-2' or 'eu-central-1'")
    )]
    InvalidRegion(String),

    #[error("Unknown table '{0}'")]
    #[diagnostic(code(playlog::catalog::unknown_table))]
    UnknownTable(String),
}

/// Which tables a drop list covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableScope {
    /// All seven tables
    All,
    /// Only the two staging tables
    Staging,
}

/// A dataset the local engine has to register before running a load statement
#[derive(Debug, Clone, PartialEq)]
pub struct StagingSource {
    /// Table name the dataset is registered under for the duration of the statement
    pub name: String,
    /// Listing prefix of the dataset
    pub location: Url,
    /// Object store options (region)
    pub storage_options: HashMap<String, String>,
}

/// One rendered SQL statement
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub phase: Phase,
    /// Table the statement acts on
    pub table: String,
    pub sql: String,
    /// Source dataset of a local staging load
    pub source: Option<StagingSource>,
}

impl Statement {
    fn new(phase: Phase, table: &Table, sql: String) -> Self {
        Self {
            phase,
            table: table.name.clone(),
            sql,
            source: None,
        }
    }
}

/// Renders the loader's statements for one SQL dialect
#[derive(Debug, Clone, Copy, derive_new::new)]
pub struct Catalog {
    dialect: Dialect,
}

impl Catalog {
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Tables in declaration order
    pub fn tables(&self) -> &'static [Table] {
        tables::tables()
    }

    pub fn drop_table_statements(&self, scope: TableScope) -> Vec<Statement> {
        self.tables()
            .iter()
            .filter(|table| scope == TableScope::All || table.is_staging())
            .map(|table| Statement::new(Phase::Drop, table, ddl::drop_table(self.dialect, table)))
            .collect()
    }

    pub fn create_table_statements(&self) -> Vec<Statement> {
        self.tables()
            .iter()
            .map(|table| {
                Statement::new(Phase::Create, table, ddl::create_table(self.dialect, table))
            })
            .collect()
    }

    /// Staging loads: events first, then songs.
    ///
    /// Configuration values are validated and escaped here; a value that cannot be
    /// embedded safely fails the whole list before anything runs.
    pub fn copy_table_statements(
        &self,
        config: &WarehouseConfig,
    ) -> Result<Vec<Statement>, CatalogError> {
        let events = self.table(STAGING_EVENTS)?;
        let songs = self.table(STAGING_SONGS)?;

        let loads = [
            StagingLoad {
                table: events,
                location: &config.s3.log_data,
                mapping: JsonMapping::Paths(&config.s3.log_jsonpath),
            },
            StagingLoad {
                table: songs,
                location: &config.s3.song_data,
                mapping: JsonMapping::Auto,
            },
        ];

        loads
            .iter()
            .map(|load| match self.dialect {
                Dialect::Redshift => {
                    let sql =
                        staging::redshift_copy(load, &config.iam_role.arn, &config.s3.region)?;
                    Ok(Statement::new(Phase::Copy, load.table, sql))
                }
                Dialect::DataFusion => {
                    let (sql, source) =
                        staging::local_load(self.dialect, load, &config.s3.region);
                    Ok(Statement {
                        source: Some(source),
                        ..Statement::new(Phase::Copy, load.table, sql)
                    })
                }
            })
            .collect()
    }

    /// Transforms: songplays, users, songs, artists, time
    pub fn insert_table_statements(&self) -> Vec<Statement> {
        self.tables()
            .iter()
            .filter(|table| !table.is_staging())
            .filter_map(|table| {
                let render: fn(Dialect, &Table) -> String = match table.name.as_str() {
                    tables::SONGPLAYS => transforms::songplays,
                    tables::USERS => transforms::users,
                    tables::SONGS => transforms::songs,
                    tables::ARTISTS => transforms::artists,
                    tables::TIME => transforms::time,
                    _ => return None,
                };

                Some(Statement::new(
                    Phase::Insert,
                    table,
                    render(self.dialect, table),
                ))
            })
            .collect()
    }

    /// Statements of one phase; copy statements need the configuration
    pub fn phase_statements(
        &self,
        phase: Phase,
        config: Option<&WarehouseConfig>,
    ) -> Result<Vec<Statement>, CatalogError> {
        match phase {
            Phase::Drop => Ok(self.drop_table_statements(TableScope::All)),
            Phase::Create => Ok(self.create_table_statements()),
            Phase::Copy => match config {
                Some(config) => self.copy_table_statements(config),
                None => Err(CatalogError::InvalidValue {
                    name: "config".to_string(),
                    reason: "copy statements need a warehouse configuration".to_string(),
                }),
            },
            Phase::Insert => Ok(self.insert_table_statements()),
        }
    }

    fn table(&self, name: &str) -> Result<&'static Table, CatalogError> {
        tables::table(name).ok_or_else(|| CatalogError::UnknownTable(name.to_string()))
    }
}
