//! # Playlog Schemas
//!
//! This crate contains the configuration and table model types used throughout the
//! playlog workspace. Keeping them here lets the core, ODBC and CLI crates share one
//! definition of the warehouse configuration and of the seven-table star schema without
//! depending on each other.

pub mod config;
pub mod location;
pub mod progress;
pub mod table;

mod serde_helpers;

pub use config::{ClusterConfig, ConfigError, IamRole, RoleArn, S3Config, WarehouseConfig};
pub use location::Location;
pub use progress::{Phase, ProgressEvent};
pub use table::{Column, ColumnType, Table, TableKind};
