//! Prelude module that exports commonly used types and functions.
//!
//! `use playlog_core::prelude::*;` brings in everything needed to render and run the
//! loader's statements.

pub use crate::{Error, Result};

// Configuration
pub use crate::templating::{format_from_path, TemplateFormat, TemplateLoader};
pub use playlog_schemas::{Location, Phase, ProgressEvent, WarehouseConfig};

// Statement catalog
pub use crate::catalog::{Catalog, Statement, TableScope};
pub use crate::dialect::Dialect;

// Warehouses
pub use crate::warehouse::{LocalWarehouse, Warehouse};
#[cfg(feature = "odbc")]
pub use crate::warehouse::RedshiftWarehouse;

// Pipeline execution
pub use crate::pipeline::{
    run_pipeline, run_plan, table_row_counts, LoggingProgressTracker, Plan, ProgressTracker,
    RunSummary,
};
