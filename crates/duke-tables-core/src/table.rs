//! Table metadata

use ahash::AHashMap;

use crate::column::Column;
use crate::error::{Error, Result};

/// A table's column snapshot
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TableMeta {
    pub id: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub title: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub columns: Vec<Column>,
}

impl TableMeta {
    /// Create an empty table
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            columns: Vec::new(),
        }
    }

    /// Append a column
    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Find a column by ID
    pub fn column(&self, id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == id)
    }

    /// Find a column by ID, falling back to its title
    pub fn column_by_ref(&self, name: &str) -> Option<&Column> {
        self.column(name)
            .or_else(|| self.columns.iter().find(|c| c.title == name))
    }

    /// Find a column by ID or title, failing if absent
    pub fn require_column(&self, name: &str) -> Result<&Column> {
        self.column_by_ref(name).ok_or_else(|| Error::ColumnNotFound {
            table: self.id.clone(),
            column: name.to_string(),
        })
    }
}

/// In-memory collection of table snapshots, keyed by table ID
#[derive(Debug, Clone, Default)]
pub struct TableStore {
    tables: AHashMap<String, TableMeta>,
}

impl TableStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a table
    pub fn insert(&mut self, table: TableMeta) {
        self.tables.insert(table.id.clone(), table);
    }

    /// Look up a table by ID
    pub fn get(&self, id: &str) -> Result<&TableMeta> {
        self.tables
            .get(id)
            .ok_or_else(|| Error::TableNotFound(id.to_string()))
    }

    /// Look up a table by ID, falling back to its title
    pub fn find(&self, name: &str) -> Result<&TableMeta> {
        self.get(name).or_else(|_| {
            self.tables
                .values()
                .find(|t| t.title == name)
                .ok_or_else(|| Error::TableNotFound(name.to_string()))
        })
    }

    /// Iterate over all tables
    pub fn tables(&self) -> impl Iterator<Item = &TableMeta> {
        self.tables.values()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl FromIterator<TableMeta> for TableStore {
    fn from_iter<I: IntoIterator<Item = TableMeta>>(iter: I) -> Self {
        let mut store = TableStore::new();
        for table in iter {
            store.insert(table);
        }
        store
    }
}
