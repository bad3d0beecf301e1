//! Embedded DataFusion warehouse.
//!
//! Tables live in memory for the lifetime of the session. Staging loads register their
//! source dataset as a newline-delimited JSON listing table, run the load statement and
//! deregister the source again.

use std::sync::Arc;

use async_trait::async_trait;
use datafusion::arrow::array::{Array, AsArray, RecordBatch};
use datafusion::arrow::datatypes::UInt64Type;
use datafusion::prelude::{NdJsonReadOptions, SessionConfig, SessionContext};
use tracing::{debug, instrument};

use super::{Result, Warehouse};
use crate::catalog::{StagingSource, Statement};
use crate::dialect::Dialect;
use crate::store::register_object_store;

/// Warehouse backed by a DataFusion [`SessionContext`]
#[derive(Clone)]
pub struct LocalWarehouse {
    ctx: Arc<SessionContext>,
}

impl LocalWarehouse {
    /// Create a session whose listing tables also read files below nested prefixes,
    /// e.g. `log_data/2018/11/*.json`
    pub fn new() -> Self {
        let config = SessionConfig::new().set_bool(
            "datafusion.execution.listing_table_ignore_subdirectory",
            false,
        );

        Self::with_context(Arc::new(SessionContext::new_with_config(config)))
    }

    /// Use an existing session, e.g. one with object stores already registered
    pub fn with_context(ctx: Arc<SessionContext>) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> Arc<SessionContext> {
        self.ctx.clone()
    }

    async fn register_source(&self, source: &StagingSource) -> Result<()> {
        register_object_store(&self.ctx, &source.location, &source.storage_options)?;

        let options = NdJsonReadOptions::default().file_extension(".json");
        self.ctx
            .register_json(source.name.as_str(), source.location.as_str(), options)
            .await?;

        debug!("Registered source {} at {}", source.name, source.location);
        Ok(())
    }

    async fn run(&self, sql: &str) -> Result<Vec<RecordBatch>> {
        let df = self.ctx.sql(sql).await?;
        Ok(df.collect().await?)
    }
}

impl Default for LocalWarehouse {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LocalWarehouse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalWarehouse")
            .field("session_id", &self.ctx.session_id())
            .finish()
    }
}

#[async_trait]
impl Warehouse for LocalWarehouse {
    fn dialect(&self) -> Dialect {
        Dialect::DataFusion
    }

    #[instrument(skip_all, fields(phase = %statement.phase, table = %statement.table))]
    async fn execute(&self, statement: &Statement) -> Result<Option<u64>> {
        if let Some(source) = &statement.source {
            self.register_source(source).await?;
        }

        let result = self.run(&statement.sql).await;

        if let Some(source) = &statement.source {
            self.ctx.deregister_table(source.name.as_str())?;
        }

        Ok(inserted_rows(&result?))
    }

    async fn query(&self, sql: &str) -> Result<Vec<RecordBatch>> {
        self.run(sql).await
    }
}

// DML statements report a single `count` column
fn inserted_rows(batches: &[RecordBatch]) -> Option<u64> {
    let batch = batches.first()?;
    let column = batch.column_by_name("count")?;
    let counts = column.as_primitive_opt::<UInt64Type>()?;

    (!counts.is_empty() && counts.is_valid(0)).then(|| counts.value(0))
}
