use crate::{
    catalog::CatalogError, templating::TemplateError, warehouse::WarehouseError,
};

use miette::Diagnostic;
use playlog_schemas::Phase;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum Error {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Template(Box<TemplateError>),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Catalog(Box<CatalogError>),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Warehouse(Box<WarehouseError>),

    /// A statement failed; the rest of the run was not executed
    #[error("{phase} statement for '{table}' failed: {source}")]
    #[diagnostic(
        code(playlog::pipeline::statement_failed),
        help("Statements after the failing one were not run. Fix the cause and re-run.")
    )]
    Statement {
        phase: Phase,
        table: String,
        #[source]
        source: Box<WarehouseError>,
    },

    #[error("Unexpected result for '{sql}'")]
    #[diagnostic(code(playlog::pipeline::unexpected_result))]
    UnexpectedResult { sql: String },
}

impl From<TemplateError> for Error {
    fn from(error: TemplateError) -> Self {
        Error::Template(Box::new(error))
    }
}

impl From<CatalogError> for Error {
    fn from(error: CatalogError) -> Self {
        Error::Catalog(Box::new(error))
    }
}

impl From<WarehouseError> for Error {
    fn from(error: WarehouseError) -> Self {
        Error::Warehouse(Box::new(error))
    }
}
