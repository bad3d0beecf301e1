use thiserror::Error;

/// Error types for ODBC operations.
///
/// IMPORTANT: This type never includes connection strings or other sensitive
/// information in error messages to prevent password leakage.
#[derive(Error, Debug)]
pub enum OdbcError {
    #[error(transparent)]
    ArrowOdbc(#[from] arrow_odbc::Error),

    #[error(transparent)]
    OdbcApi(#[from] arrow_odbc::odbc_api::Error),

    #[error(transparent)]
    Arrow(#[from] datafusion::arrow::error::ArrowError),

    #[error("Query did not produce a result set")]
    NoResultSet,

    #[error("ODBC connection is unusable after a panic in another statement")]
    Poisoned,
}

pub type Result<T> = core::result::Result<T, OdbcError>;
