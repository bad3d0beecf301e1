//! ODBC session used to run statements on the Redshift cluster.
//!
//! One [`OdbcSession`] owns one connection. Statements are executed synchronously and
//! one at a time; the connection sits behind a mutex so the session can be shared with
//! async code.

use std::sync::{Mutex, OnceLock};

use arrow_odbc::odbc_api::{Connection, ConnectionOptions, Environment};
use arrow_odbc::OdbcReaderBuilder;
use datafusion::arrow::{array::RecordBatch, error::ArrowError};
use tracing::debug;

pub mod error;

pub use error::{OdbcError, Result};

// The ODBC environment has to outlive every connection, so there is one per process.
fn environment() -> Result<&'static Environment> {
    static ENVIRONMENT: OnceLock<Environment> = OnceLock::new();

    if let Some(environment) = ENVIRONMENT.get() {
        return Ok(environment);
    }

    let environment = Environment::new()?;
    Ok(ENVIRONMENT.get_or_init(|| environment))
}

/// A single ODBC connection
pub struct OdbcSession {
    connection: Mutex<Connection<'static>>,
}

impl OdbcSession {
    /// Connect with a full ODBC connection string
    /// ```rust,ignore
    /// let session = OdbcSession::connect(
    ///     "Driver={Amazon Redshift (x64)};Server=dwh.abc123.us-west-2.redshift.amazonaws.com;\
    ///      Port=5439;Database=dwh;UID=dwhuser;PWD=secret;",
    /// )?;
    /// session.execute("DROP TABLE IF EXISTS staging_events")?;
    /// ```
    pub fn connect(connection_string: &str) -> Result<Self> {
        let connection = environment()?
            .connect_with_connection_string(connection_string, ConnectionOptions::default())?;

        debug!("Opened ODBC connection");

        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    /// Execute a statement, discarding any result set
    pub fn execute(&self, sql: &str) -> Result<()> {
        let connection = self.connection.lock().map_err(|_| OdbcError::Poisoned)?;
        connection.execute(sql, (), None)?;

        Ok(())
    }

    /// Execute a query and read its result set into Arrow batches
    pub fn query(&self, sql: &str) -> Result<Vec<RecordBatch>> {
        let connection = self.connection.lock().map_err(|_| OdbcError::Poisoned)?;

        let cursor = connection
            .execute(sql, (), None)?
            .ok_or(OdbcError::NoResultSet)?;

        let reader = OdbcReaderBuilder::new().build(cursor)?;

        let batches = reader
            .into_iter()
            .collect::<std::result::Result<Vec<RecordBatch>, ArrowError>>()?;

        Ok(batches)
    }
}

impl std::fmt::Debug for OdbcSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OdbcSession").finish_non_exhaustive()
    }
}
