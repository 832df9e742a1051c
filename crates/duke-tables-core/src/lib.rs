//! # duke-tables-core
//!
//! Core data structures for the duke-tables formula engine.
//!
//! This crate provides the fundamental types used throughout duke-tables:
//! - [`FormulaExpr`] - The formula syntax tree, annotated with [`FormulaDataType`]s
//! - [`Column`] and [`UiType`] - Column snapshots handed to the engine
//! - [`TableMeta`] and [`TableStore`] - Per-table column sets
//! - [`AbstractSqlType`] and [`SqlTypeMapper`] - Database type classification
//!
//! ## Example
//!
//! ```rust
//! use duke_tables_core::{Column, TableMeta, UiType};
//!
//! let table = TableMeta::new("t1", "Products")
//!     .with_column(Column::new("c1", "Price", UiType::Decimal))
//!     .with_column(Column::formula("c2", "Price x2", "{c1} * 2"));
//!
//! assert!(table.column_by_ref("Price x2").unwrap().is_formula());
//! ```

pub mod ast;
pub mod column;
pub mod data_type;
pub mod error;
pub mod sql_type;
pub mod table;
pub mod ui_type;

// Re-exports for convenience
pub use ast::{
    BinaryOperator, ExprKind, FormulaExpr, Identifier, Literal, LiteralValue, LogicalOperator,
    UnaryOperator,
};
pub use column::{Column, ColumnOptions, RollupFunction};
pub use data_type::FormulaDataType;
pub use error::{Error, Result};
pub use sql_type::{AbstractSqlType, GenericSqlTypes, SqlTypeMapper};
pub use table::{TableMeta, TableStore};
pub use ui_type::UiType;
