//! # duke-tables-formula
//!
//! Formula parser, printer and type checker for duke-tables.
//!
//! This crate provides:
//! - Formula parsing (text → AST), with `{Column Name}` references
//! - Formula printing (AST → text)
//! - Built-in function descriptors and argument checks
//! - Async type checking against a table's columns, including rollup and
//!   lookup columns in related tables
//! - Circular reference detection between formula columns
//! - Column alias/ID substitution
//!
//! ## Example
//!
//! ```rust
//! use duke_tables_core::{Column, FormulaDataType, TableStore, UiType};
//! use duke_tables_formula::{to_formula, validate_formula, ValidationContext};
//!
//! # futures::executor::block_on(async {
//! let columns = vec![
//!     Column::new("c1", "First Name", UiType::SingleLineText),
//!     Column::new("c2", "Last Name", UiType::SingleLineText),
//! ];
//! let store = TableStore::new();
//! let ctx = ValidationContext::new(&columns, &store);
//!
//! let tree = validate_formula("CONCAT({First Name}, ' ', {Last Name})", &ctx)
//!     .await
//!     .unwrap();
//! assert_eq!(tree.data_type, Some(FormulaDataType::String));
//! assert_eq!(to_formula(&tree), "CONCAT({c1}, \" \", {c2})");
//! # });
//! ```

pub mod dependency;
pub mod error;
pub mod functions;
mod lexer;
pub mod meta;
pub mod parser;
pub mod printer;
pub mod resolver;
pub mod substitution;
pub mod validator;

pub use dependency::{check_circular_reference, DependencyGraph};
pub use error::{FormulaError, FormulaErrorKind, FormulaResult, ParseError};
pub use functions::{registry, FunctionDef, FunctionRegistry};
pub use meta::{MetaError, TableMetaSource};
pub use parser::parse_formula;
pub use printer::{to_formula, FormulaDisplay};
pub use resolver::column_data_type;
pub use substitution::{substitute_alias_with_id, substitute_id_with_alias};
pub use validator::{validate_expr, validate_formula, ValidationContext, ValidationOptions};
