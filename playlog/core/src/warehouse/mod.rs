//! Warehouse connections statements are executed against.

use async_trait::async_trait;
use datafusion::arrow::array::RecordBatch;
use miette::Diagnostic;

use crate::catalog::Statement;
use crate::dialect::Dialect;
use crate::store::StoreError;

pub mod local;
pub use local::LocalWarehouse;

#[cfg(feature = "odbc")]
pub mod redshift;
#[cfg(feature = "odbc")]
pub use redshift::RedshiftWarehouse;

/// Errors reported by a warehouse engine, carrying the engine's own message
#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum WarehouseError {
    #[error("{0}")]
    #[diagnostic(code(playlog::warehouse::datafusion))]
    DataFusion(#[from] datafusion::error::DataFusionError),

    #[error("{0}")]
    #[diagnostic(code(playlog::warehouse::arrow))]
    Arrow(#[from] datafusion::arrow::error::ArrowError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[cfg(feature = "odbc")]
    #[error("{0}")]
    #[diagnostic(code(playlog::warehouse::odbc))]
    Odbc(#[from] playlog_odbc::OdbcError),
}

pub type Result<T> = core::result::Result<T, WarehouseError>;

/// A database the loader's statements run on.
///
/// Statements are executed one at a time, in the order given, on a single connection.
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// SQL dialect statements for this warehouse are rendered in
    fn dialect(&self) -> Dialect;

    /// Execute a statement, returning the number of rows written when the engine reports it
    async fn execute(&self, statement: &Statement) -> Result<Option<u64>>;

    /// Run a query and collect its result
    async fn query(&self, sql: &str) -> Result<Vec<RecordBatch>>;
}
