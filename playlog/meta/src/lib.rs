//! Playlog - load song-play event logs into a star-schema warehouse
//!
//! This crate is a meta-package that re-exports the most commonly used
//! types and functions from the playlog crates.
//!
//! # Features
//!
//! - **core**: Statement catalog, warehouses and pipeline driver (enabled by default)
//! - **s3**: Read staging datasets from Amazon S3 with the embedded engine (enabled by default)
//! - **toml**: TOML configuration files (enabled by default)
//! - **yaml**: YAML configuration files (enabled by default)
//! - **json**: JSON configuration files
//! - **odbc**: Run against an Amazon Redshift cluster over ODBC
//! - **full**: All features
//!
//! # Examples
//!
//! ```no_run
//! use std::collections::HashMap;
//! use playlog::prelude::*;
//!
//! # async fn run() -> playlog::Result<()> {
//! let config = WarehouseConfig::from_file("dwh.toml", TemplateFormat::Toml, HashMap::new())?;
//!
//! // Recreate the staging tables, load them and populate the star schema
//! let warehouse = LocalWarehouse::new();
//! run_plan(&warehouse, Plan::Run { reset: false }, &config, None).await?;
//!
//! for count in table_row_counts(&warehouse).await? {
//!     println!("{}: {}", count.table, count.rows);
//! }
//! # Ok(())
//! # }
//! ```

pub use datafusion;
pub use playlog_schemas::{self as schemas};

// Re-exports from core
#[cfg(feature = "core")]
pub use playlog_core::{self as core, prelude as core_prelude};

#[cfg(feature = "core")]
pub use playlog_core::{
    catalog, dialect, error, pipeline,
    pipeline::{run_pipeline, run_plan, LoggingProgressTracker, Plan, ProgressTracker},
    warehouse, Error, Result,
};

// Re-exports from odbc
#[cfg(feature = "odbc")]
pub use playlog_odbc as odbc;

/// Prelude module that exports commonly used types and functions.
///
/// This module provides a convenient way to import all the necessary
/// components with a single `use playlog::prelude::*;` statement.
pub mod prelude {
    pub use playlog_schemas::{Location, Phase, ProgressEvent, WarehouseConfig};

    #[cfg(feature = "core")]
    pub use playlog_core::prelude::*;
}
