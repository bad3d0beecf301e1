//! Pipeline definitions and execution logic
//!
//! - plan rendering and execution through [`run_plan`] / [`run_pipeline`]
//! - progress tracking through the [`ProgressTracker`] trait
//! - per-table row counts for run reports

use crate::error;

pub mod progress_tracker;
pub use progress_tracker::{LoggingProgressTracker, ProgressTracker};

pub mod report;
pub use report::{table_row_counts, TableCount};

pub mod run;
pub use run::{run_pipeline, run_plan, Plan, RunSummary, StatementOutcome};

pub type Result<T> = core::result::Result<T, error::Error>;
