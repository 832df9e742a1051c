//! Column types

use crate::ast::FormulaExpr;
use crate::ui_type::UiType;

/// Column metadata, as seen by the formula engine
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Column {
    /// Stable internal identifier
    pub id: String,
    /// Human-readable alias
    pub title: String,
    /// Name of the backing database column, if any
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub column_name: Option<String>,
    pub ui_type: UiType,
    /// Database type descriptor (e.g. `varchar`, `int8`)
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub db_type: Option<String>,
    /// Type-specific options
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub options: Option<ColumnOptions>,
}

/// Type-specific column options
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum ColumnOptions {
    /// Formula column
    Formula {
        formula: String,
        /// Previously validated tree, if the caller kept one
        #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
        parsed_tree: Option<FormulaExpr>,
    },
    /// Aggregate over a related table
    Rollup {
        relation_column_id: String,
        rollup_column_id: String,
        rollup_function: RollupFunction,
    },
    /// Value of a column in a related table
    Lookup {
        relation_column_id: String,
        lookup_column_id: String,
    },
    /// Relation to another table
    Link { related_table_id: String },
}

/// Rollup aggregate functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum RollupFunction {
    Count,
    Min,
    Max,
    Avg,
    Sum,
    CountDistinct,
    SumDistinct,
    AvgDistinct,
}

impl RollupFunction {
    /// Aggregates that always produce a number, whatever they aggregate
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            RollupFunction::Count
                | RollupFunction::Avg
                | RollupFunction::Sum
                | RollupFunction::CountDistinct
                | RollupFunction::SumDistinct
                | RollupFunction::AvgDistinct
        )
    }
}

impl Column {
    /// Create a plain column
    pub fn new(id: impl Into<String>, title: impl Into<String>, ui_type: UiType) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            column_name: None,
            ui_type,
            db_type: None,
            options: None,
        }
    }

    /// Create a formula column
    pub fn formula(
        id: impl Into<String>,
        title: impl Into<String>,
        formula: impl Into<String>,
    ) -> Self {
        Self::new(id, title, UiType::Formula).with_options(ColumnOptions::Formula {
            formula: formula.into(),
            parsed_tree: None,
        })
    }

    /// Create a rollup column
    pub fn rollup(
        id: impl Into<String>,
        title: impl Into<String>,
        relation_column_id: impl Into<String>,
        rollup_column_id: impl Into<String>,
        rollup_function: RollupFunction,
    ) -> Self {
        Self::new(id, title, UiType::Rollup).with_options(ColumnOptions::Rollup {
            relation_column_id: relation_column_id.into(),
            rollup_column_id: rollup_column_id.into(),
            rollup_function,
        })
    }

    /// Create a lookup column
    pub fn lookup(
        id: impl Into<String>,
        title: impl Into<String>,
        relation_column_id: impl Into<String>,
        lookup_column_id: impl Into<String>,
    ) -> Self {
        Self::new(id, title, UiType::Lookup).with_options(ColumnOptions::Lookup {
            relation_column_id: relation_column_id.into(),
            lookup_column_id: lookup_column_id.into(),
        })
    }

    /// Create a relation column pointing at another table
    pub fn link(
        id: impl Into<String>,
        title: impl Into<String>,
        related_table_id: impl Into<String>,
    ) -> Self {
        Self::new(id, title, UiType::LinkToAnotherRecord).with_options(ColumnOptions::Link {
            related_table_id: related_table_id.into(),
        })
    }

    pub fn with_options(mut self, options: ColumnOptions) -> Self {
        self.options = Some(options);
        self
    }

    pub fn with_column_name(mut self, column_name: impl Into<String>) -> Self {
        self.column_name = Some(column_name.into());
        self
    }

    pub fn with_db_type(mut self, db_type: impl Into<String>) -> Self {
        self.db_type = Some(db_type.into());
        self
    }

    /// Attach a memoized, already validated tree to a formula column
    pub fn with_parsed_tree(mut self, tree: FormulaExpr) -> Self {
        if let Some(ColumnOptions::Formula { parsed_tree, .. }) = &mut self.options {
            *parsed_tree = Some(tree);
        }
        self
    }

    pub fn is_formula(&self) -> bool {
        self.ui_type == UiType::Formula
    }

    /// Stored formula text of a formula column
    pub fn formula_text(&self) -> Option<&str> {
        match &self.options {
            Some(ColumnOptions::Formula { formula, .. }) => Some(formula),
            _ => None,
        }
    }

    /// Memoized tree of a formula column
    pub fn parsed_tree(&self) -> Option<&FormulaExpr> {
        match &self.options {
            Some(ColumnOptions::Formula { parsed_tree, .. }) => parsed_tree.as_ref(),
            _ => None,
        }
    }

    /// Related table of a relation column
    pub fn related_table_id(&self) -> Option<&str> {
        match &self.options {
            Some(ColumnOptions::Link { related_table_id }) => Some(related_table_id),
            _ => None,
        }
    }

    /// Whether `name` is this column's ID, database column name or title
    pub fn is_named(&self, name: &str) -> bool {
        self.id == name || self.column_name.as_deref() == Some(name) || self.title == name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_formula_column() {
        let col = Column::formula("c1", "Total", "{Price} * 2");
        assert!(col.is_formula());
        assert_eq!(col.formula_text(), Some("{Price} * 2"));
        assert!(col.parsed_tree().is_none());

        let col = col.with_parsed_tree(FormulaExpr::number(1.0));
        assert_eq!(col.parsed_tree(), Some(&FormulaExpr::number(1.0)));
    }

    #[test]
    fn test_is_named() {
        let col = Column::new("c1", "Unit Price", UiType::Decimal).with_column_name("unit_price");
        assert!(col.is_named("c1"));
        assert!(col.is_named("unit_price"));
        assert!(col.is_named("Unit Price"));
        assert!(!col.is_named("price"));
    }

    #[test]
    fn test_rollup_numeric_functions() {
        assert!(RollupFunction::CountDistinct.is_numeric());
        assert!(RollupFunction::Sum.is_numeric());
        assert!(!RollupFunction::Min.is_numeric());
        assert!(!RollupFunction::Max.is_numeric());
    }

    #[test]
    fn test_related_table() {
        let col = Column::link("l1", "Orders", "t_orders");
        assert_eq!(col.related_table_id(), Some("t_orders"));
        assert_eq!(Column::new("c", "C", UiType::Number).related_table_id(), None);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_column_json() {
        let json = r#"{
            "id": "r1",
            "title": "Spend",
            "ui_type": "Rollup",
            "options": {
                "kind": "rollup",
                "relation_column_id": "l1",
                "rollup_column_id": "c9",
                "rollup_function": "countDistinct"
            }
        }"#;
        let col: Column = serde_json::from_str(json).unwrap();
        assert_eq!(
            col,
            Column::rollup("r1", "Spend", "l1", "c9", RollupFunction::CountDistinct)
        );

        let id: Column = serde_json::from_str(r#"{"id":"c1","title":"Id","ui_type":"ID"}"#).unwrap();
        assert_eq!(id.ui_type, UiType::Id);
        assert!(id.options.is_none());
    }
}
