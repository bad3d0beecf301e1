//! Progress event types for tracking pipeline execution

use serde::{Deserialize, Serialize};

/// Phase a statement belongs to, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// `DROP TABLE IF EXISTS`
    Drop,
    /// `CREATE TABLE IF NOT EXISTS`
    Create,
    /// Bulk load of a staging table
    Copy,
    /// `INSERT ... SELECT` into a warehouse table
    Insert,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Drop => write!(f, "drop"),
            Phase::Create => write!(f, "create"),
            Phase::Copy => write!(f, "copy"),
            Phase::Insert => write!(f, "insert"),
        }
    }
}

/// Progress events emitted during pipeline execution
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// Pipeline execution started
    Started {
        /// Number of statements in the run
        statements: usize,
    },
    /// A statement was sent to the warehouse
    StatementStarted {
        phase: Phase,
        /// Table the statement acts on
        table: String,
        /// Position of the statement within the run
        position: usize,
    },
    /// A statement finished successfully
    StatementCompleted {
        phase: Phase,
        table: String,
        position: usize,
        /// Rows written, when the engine reports it
        rows: Option<u64>,
        duration_ms: u64,
    },
    /// Pipeline execution completed
    Completed {
        /// Total duration of the pipeline execution
        duration_ms: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_order() {
        assert!(Phase::Drop < Phase::Create);
        assert!(Phase::Create < Phase::Copy);
        assert!(Phase::Copy < Phase::Insert);
    }

    #[test]
    fn test_event_serialization() {
        let event = ProgressEvent::StatementCompleted {
            phase: Phase::Insert,
            table: "songplays".to_string(),
            position: 9,
            rows: Some(333),
            duration_ms: 12,
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "statement_completed");
        assert_eq!(json["phase"], "insert");
        assert_eq!(json["rows"], 333);
    }
}
