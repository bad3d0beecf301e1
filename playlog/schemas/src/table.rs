//! Dialect independent table model.
//!
//! Tables are described once and rendered into `CREATE TABLE` statements per SQL dialect
//! by the core crate. Attributes that only some engines understand (identity columns,
//! sort and distribution keys) are recorded here and ignored by dialects without them.

use serde::{Deserialize, Serialize};

/// Logical column type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// Unbounded string
    Text,
    /// 32 bit signed integer
    Integer,
    /// 64 bit signed integer
    BigInt,
    /// Double precision float
    Double,
    /// Timestamp without time zone
    Timestamp,
}

/// Role of a table within the star schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    /// Untyped landing zone, dropped and reloaded on every run
    Staging,
    /// Central event table
    Fact,
    /// Descriptive entity table referenced by the fact table
    Dimension,
}

/// A column definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data_type: ColumnType,
    #[serde(default)]
    pub not_null: bool,
    #[serde(default)]
    pub primary_key: bool,
    /// Engine assigned surrogate key, seed 0 step 1
    #[serde(default)]
    pub identity: bool,
    #[serde(default)]
    pub sort_key: bool,
    #[serde(default)]
    pub dist_key: bool,
    /// Key of the source JSON document this column is loaded from (staging tables only)
    #[serde(default)]
    pub source_key: Option<String>,
    /// Load an empty string in the source document as `NULL`
    #[serde(default)]
    pub empty_as_null: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            data_type,
            not_null: false,
            primary_key: false,
            identity: false,
            sort_key: false,
            dist_key: false,
            source_key: None,
            empty_as_null: false,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn identity(mut self) -> Self {
        self.identity = true;
        self
    }

    pub fn sort_key(mut self) -> Self {
        self.sort_key = true;
        self
    }

    pub fn dist_key(mut self) -> Self {
        self.dist_key = true;
        self
    }

    /// Load this column from a differently named key of the source document
    pub fn from_key(mut self, key: impl Into<String>) -> Self {
        self.source_key = Some(key.into());
        self
    }

    pub fn empty_as_null(mut self) -> Self {
        self.empty_as_null = true;
        self
    }

    /// Key of the source document, defaults to the column name
    pub fn source_key(&self) -> &str {
        self.source_key.as_deref().unwrap_or(self.name.as_str())
    }
}

/// A table definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub kind: TableKind,
    pub columns: Vec<Column>,
}

impl Table {
    pub fn new(name: impl Into<String>, kind: TableKind, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            kind,
            columns,
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Name of the declared primary key column, if any
    pub fn primary_key(&self) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.primary_key)
            .map(|c| c.name.as_str())
    }

    /// Columns a load has to provide values for, i.e. everything but identity columns
    pub fn insertable_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| !c.identity)
    }

    pub fn is_staging(&self) -> bool {
        self.kind == TableKind::Staging
    }
}
