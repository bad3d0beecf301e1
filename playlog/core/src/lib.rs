//! # Playlog Core
//!
//! Renders and runs the statements that load song-play event logs and song metadata into
//! a star schema: two staging tables, the `songplays` fact table and the `users`,
//! `songs`, `artists` and `time` dimensions.
//!
//! A run is a fixed sequence of statements (drop, create, copy, insert) executed one by
//! one against a [`warehouse::Warehouse`], either an Amazon Redshift cluster over ODBC
//! (feature `odbc`) or an embedded DataFusion session.
//!
//! ```rust,no_run
//! use std::{collections::HashMap, sync::Arc};
//! use playlog_core::prelude::*;
//!
//! # async fn load() -> playlog_core::Result<()> {
//! let config = WarehouseConfig::from_file("dwh.toml", format_from_path("dwh.toml"), HashMap::new())?;
//! let warehouse = LocalWarehouse::new();
//!
//! let summary = run_plan(
//!     &warehouse,
//!     Plan::Run { reset: false },
//!     &config,
//!     Some(Arc::new(LoggingProgressTracker)),
//! )
//! .await?;
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod dialect;
pub mod error;
pub mod pipeline;
pub mod prelude;
pub mod store;
pub mod templating;
pub mod warehouse;

pub use error::{Error, Result};
