//! Column alias/ID substitution
//!
//! Formulas are stored with column IDs so that renaming a column does not
//! break them, and shown to users with column titles. These functions convert
//! between the two spellings. Function names are never touched.

use duke_tables_core::Column;

use crate::error::{FormulaError, FormulaResult};
use crate::parser::parse_formula;
use crate::printer::to_formula;

/// Rewrite every column reference to the referenced column's ID.
///
/// References may use a column's ID, database column name or title.
///
/// # Example
/// ```rust
/// use duke_tables_core::{Column, UiType};
/// use duke_tables_formula::substitute_alias_with_id;
///
/// let columns = vec![Column::new("c1", "Unit Price", UiType::Decimal)];
/// let stored = substitute_alias_with_id("{Unit Price} * 2", &columns).unwrap();
/// assert_eq!(stored, "({c1} * 2)");
/// ```
pub fn substitute_alias_with_id(formula: &str, columns: &[Column]) -> FormulaResult<String> {
    let mut tree = parse_formula(formula)?;

    let mut unresolved = None;
    tree.for_each_column_ref_mut(&mut |ident| {
        match columns.iter().find(|c| c.is_named(&ident.name)) {
            Some(column) => ident.name = column.id.clone(),
            None => {
                unresolved.get_or_insert_with(|| ident.name.clone());
            }
        }
    });

    match unresolved {
        Some(name) => Err(FormulaError::InvalidColumn(name)),
        None => Ok(to_formula(&tree)),
    }
}

/// Rewrite every column reference to the referenced column's title.
///
/// A reference no column matches keeps the name written at the same position
/// in `raw_formula`, when given, or its own name otherwise.
pub fn substitute_id_with_alias(
    formula: &str,
    columns: &[Column],
    raw_formula: Option<&str>,
) -> FormulaResult<String> {
    let mut tree = parse_formula(formula)?;
    let raw_tree = raw_formula.map(parse_formula).transpose()?;
    let raw_names: Vec<String> = raw_tree
        .iter()
        .flat_map(|raw| raw.column_refs())
        .map(|ident| ident.name.clone())
        .collect();

    let mut position = 0;
    tree.for_each_column_ref_mut(&mut |ident| {
        if let Some(column) = columns.iter().find(|c| c.is_named(&ident.name)) {
            ident.name = column.title.clone();
        } else if let Some(raw) = raw_names.get(position) {
            ident.name = raw.clone();
        }
        position += 1;
    });

    Ok(to_formula(&tree))
}
