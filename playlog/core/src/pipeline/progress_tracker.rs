use playlog_schemas::ProgressEvent;
use tracing::{info, instrument};

/// A trait for handling progress events during pipeline execution
pub trait ProgressTracker: Send + Sync {
    /// Called when a progress event occurs during pipeline execution
    fn on_progress(&self, event: ProgressEvent);
}

#[derive(Debug)]
pub struct LoggingProgressTracker;

impl ProgressTracker for LoggingProgressTracker {
    #[instrument(skip_all)]
    fn on_progress(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Started { statements } => {
                info!("🚀 Pipeline execution started ({statements} statements)");
            }
            ProgressEvent::StatementStarted {
                phase,
                table,
                position,
            } => {
                info!("⚙️  Running {phase} for {table} (position: {position})");
            }
            ProgressEvent::StatementCompleted {
                phase,
                table,
                rows: Some(rows),
                duration_ms,
                ..
            } => {
                info!(
                    "✅ Completed {phase} for {table}: {rows} rows (took: {:.2}s)",
                    duration_ms as f64 / 1000.0
                );
            }
            ProgressEvent::StatementCompleted {
                phase,
                table,
                rows: None,
                duration_ms,
                ..
            } => {
                info!(
                    "✅ Completed {phase} for {table} (took: {:.2}s)",
                    duration_ms as f64 / 1000.0
                );
            }
            ProgressEvent::Completed { duration_ms } => {
                info!(
                    "🎉 Pipeline execution completed (total time: {:.2}s)",
                    duration_ms as f64 / 1000.0
                );
            }
        }
    }
}
