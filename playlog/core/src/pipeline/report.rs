use datafusion::arrow::util::display::array_value_to_string;
use serde::Serialize;
use tracing::instrument;

use crate::catalog::Catalog;
use crate::error::Error;
use crate::pipeline::Result;
use crate::warehouse::Warehouse;

/// Number of rows in one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableCount {
    pub table: String,
    pub rows: u64,
}

/// Count the rows of every table, in declaration order
#[instrument(skip_all, err)]
pub async fn table_row_counts(warehouse: &dyn Warehouse) -> Result<Vec<TableCount>> {
    let catalog = Catalog::new(warehouse.dialect());
    let dialect = catalog.dialect();

    let mut counts = Vec::with_capacity(catalog.tables().len());

    for table in catalog.tables() {
        let sql = format!(
            "SELECT COUNT(*) AS row_count FROM {}",
            dialect.ident(&table.name)
        );

        let batches = warehouse.query(&sql).await?;
        let rows = batches
            .iter()
            .find(|batch| batch.num_rows() > 0)
            .map(|batch| array_value_to_string(batch.column(0), 0))
            .transpose()
            .map_err(crate::warehouse::WarehouseError::from)?
            .and_then(|value| value.parse::<u64>().ok())
            .ok_or_else(|| Error::UnexpectedResult { sql: sql.clone() })?;

        counts.push(TableCount {
            table: table.name.clone(),
            rows,
        });
    }

    Ok(counts)
}
