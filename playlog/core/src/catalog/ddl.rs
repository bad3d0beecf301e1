use playlog_schemas::Table;

use crate::dialect::Dialect;

/// `DROP TABLE IF EXISTS <table>`
pub fn drop_table(dialect: Dialect, table: &Table) -> String {
    format!("DROP TABLE IF EXISTS {}", dialect.ident(&table.name))
}

/// `CREATE TABLE IF NOT EXISTS <table> (...)` with one column clause per line
pub fn create_table(dialect: Dialect, table: &Table) -> String {
    let columns = table
        .columns
        .iter()
        .map(|column| format!("    {}", dialect.column_definition(column)))
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n{columns}\n)",
        dialect.ident(&table.name)
    )
}
