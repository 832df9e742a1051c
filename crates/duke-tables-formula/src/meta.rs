//! Related-table metadata access
//!
//! Rollup and lookup columns take their type from a column in another table.
//! The validation pass fetches that table through [`TableMetaSource`], which
//! callers back with whatever store they have (a database, a cache, an RPC
//! client). [`TableStore`] implements it in memory.

use async_trait::async_trait;
use duke_tables_core::{TableMeta, TableStore};

/// Error returned by a metadata source
pub type MetaError = Box<dyn std::error::Error + Send + Sync>;

/// Source of table metadata.
///
/// # Example
///
/// ```rust
/// use duke_tables_core::{TableMeta, TableStore};
/// use duke_tables_formula::TableMetaSource;
///
/// # async fn example() -> Result<(), duke_tables_formula::MetaError> {
/// let store: TableStore = vec![TableMeta::new("t1", "Orders")].into_iter().collect();
/// let orders = store.table_meta("t1").await?;
/// assert_eq!(orders.title, "Orders");
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait TableMetaSource: Send + Sync {
    /// Fetch the column snapshot of a table by ID.
    async fn table_meta(&self, table_id: &str) -> Result<TableMeta, MetaError>;
}

#[async_trait]
impl TableMetaSource for TableStore {
    async fn table_meta(&self, table_id: &str) -> Result<TableMeta, MetaError> {
        Ok(self.get(table_id)?.clone())
    }
}
