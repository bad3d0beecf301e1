use async_trait::async_trait;
use datafusion::arrow::array::RecordBatch;
use playlog_odbc::OdbcSession;
use playlog_schemas::ClusterConfig;
use tracing::{debug, instrument};

use super::{Result, Warehouse};
use crate::catalog::Statement;
use crate::dialect::Dialect;

/// Redshift cluster reached over ODBC.
///
/// The driver does not report affected rows through the session, so executed statements
/// yield no row count.
#[derive(Debug)]
pub struct RedshiftWarehouse {
    session: OdbcSession,
}

impl RedshiftWarehouse {
    pub fn connect(cluster: &ClusterConfig) -> Result<Self> {
        debug!("Connecting to {}:{}/{}", cluster.host, cluster.port, cluster.db_name);

        let session = OdbcSession::connect(&cluster.connection_string())?;
        Ok(Self { session })
    }
}

#[async_trait]
impl Warehouse for RedshiftWarehouse {
    fn dialect(&self) -> Dialect {
        Dialect::Redshift
    }

    #[instrument(skip_all, fields(phase = %statement.phase, table = %statement.table))]
    async fn execute(&self, statement: &Statement) -> Result<Option<u64>> {
        self.session.execute(&statement.sql)?;
        Ok(None)
    }

    async fn query(&self, sql: &str) -> Result<Vec<RecordBatch>> {
        Ok(self.session.query(sql)?)
    }
}
