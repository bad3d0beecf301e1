//! Pipeline execution logic

use std::{sync::Arc, time::Instant};

use playlog_schemas::{Phase, ProgressEvent, WarehouseConfig};
use serde::Serialize;
use tracing::{debug, instrument, Span};
use uuid::Uuid;

use crate::catalog::{Catalog, Statement, TableScope};
use crate::error::Error;
use crate::pipeline::progress_tracker::ProgressTracker;
use crate::pipeline::Result;
use crate::warehouse::Warehouse;

/// Which statement lists a run executes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan {
    /// Drop and recreate all tables
    CreateTables,
    /// Load staging, then populate the warehouse tables
    Etl,
    /// Recreate staging (or everything with `reset`), then load and transform
    Run { reset: bool },
}

impl Plan {
    /// Render this plan's statements in execution order
    pub fn statements(
        &self,
        catalog: &Catalog,
        config: &WarehouseConfig,
    ) -> Result<Vec<Statement>> {
        let mut statements = Vec::new();

        match self {
            Plan::CreateTables => {
                statements.extend(catalog.drop_table_statements(TableScope::All));
                statements.extend(catalog.create_table_statements());
            }
            Plan::Etl => {
                statements.extend(catalog.copy_table_statements(config)?);
                statements.extend(catalog.insert_table_statements());
            }
            Plan::Run { reset } => {
                let scope = if *reset {
                    TableScope::All
                } else {
                    TableScope::Staging
                };

                statements.extend(catalog.drop_table_statements(scope));
                statements.extend(catalog.create_table_statements());
                statements.extend(catalog.copy_table_statements(config)?);
                statements.extend(catalog.insert_table_statements());
            }
        }

        Ok(statements)
    }
}

/// Outcome of one executed statement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatementOutcome {
    pub phase: Phase,
    pub table: String,
    /// Rows written, when the engine reports it
    pub rows: Option<u64>,
    pub duration_ms: u64,
}

/// Outcome of a completed run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub statements: Vec<StatementOutcome>,
    pub duration_ms: u64,
}

impl RunSummary {
    /// Rows a phase wrote into a table, if the engine reported them
    pub fn rows(&self, phase: Phase, table: &str) -> Option<u64> {
        let mut outcomes = self
            .statements
            .iter()
            .filter(|outcome| outcome.phase == phase && outcome.table == table)
            .peekable();

        outcomes.peek()?;
        outcomes.map(|outcome| outcome.rows).sum()
    }
}

/// Render `plan` for the warehouse's dialect and execute it
pub async fn run_plan(
    warehouse: &dyn Warehouse,
    plan: Plan,
    config: &WarehouseConfig,
    progress_tracker: Option<Arc<dyn ProgressTracker>>,
) -> Result<RunSummary> {
    let catalog = Catalog::new(warehouse.dialect());
    let statements = plan.statements(&catalog, config)?;

    run_pipeline(warehouse, &statements, progress_tracker).await
}

/// Execute statements in order, stopping at the first failure.
///
/// The progress tracker receives an event before and after every statement.
#[instrument(skip_all, fields(run_id = tracing::field::Empty, statements = statements.len()), err)]
pub async fn run_pipeline(
    warehouse: &dyn Warehouse,
    statements: &[Statement],
    progress_tracker: Option<Arc<dyn ProgressTracker>>,
) -> Result<RunSummary> {
    let run_id = Uuid::new_v4();
    Span::current().record("run_id", tracing::field::display(run_id));

    let start_time = Instant::now();
    let mut outcomes = Vec::with_capacity(statements.len());

    debug!("Running {} statements ...", statements.len());

    if let Some(tracker) = &progress_tracker {
        tracker.on_progress(ProgressEvent::Started {
            statements: statements.len(),
        });
    }

    for (position, statement) in statements.iter().enumerate() {
        let time = Instant::now();

        debug!(
            "Running {} statement for {} #{position}:\n{}",
            statement.phase, statement.table, statement.sql
        );

        if let Some(tracker) = &progress_tracker {
            tracker.on_progress(ProgressEvent::StatementStarted {
                phase: statement.phase,
                table: statement.table.clone(),
                position,
            });
        }

        let rows = warehouse
            .execute(statement)
            .await
            .map_err(|source| Error::Statement {
                phase: statement.phase,
                table: statement.table.clone(),
                source: Box::new(source),
            })?;

        let elapsed = time.elapsed();
        debug!(
            "Finished {} statement for {} ... Elapsed time: {:.2?}",
            statement.phase, statement.table, elapsed
        );

        if let Some(tracker) = &progress_tracker {
            tracker.on_progress(ProgressEvent::StatementCompleted {
                phase: statement.phase,
                table: statement.table.clone(),
                position,
                rows,
                duration_ms: elapsed.as_millis() as u64,
            });
        }

        outcomes.push(StatementOutcome {
            phase: statement.phase,
            table: statement.table.clone(),
            rows,
            duration_ms: elapsed.as_millis() as u64,
        });
    }

    let total_duration = start_time.elapsed();
    debug!(
        "Finished processing pipeline ... Total time: {:.2?}",
        total_duration
    );

    if let Some(tracker) = &progress_tracker {
        tracker.on_progress(ProgressEvent::Completed {
            duration_ms: total_duration.as_millis() as u64,
        });
    }

    Ok(RunSummary {
        run_id,
        statements: outcomes,
        duration_ms: total_duration.as_millis() as u64,
    })
}
