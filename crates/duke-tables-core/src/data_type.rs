//! Abstract data types used by formula validation

use std::fmt;

/// The engine's abstract type of a formula node.
///
/// These are independent of storage column types: every column type is
/// classified into one of these before validation compares anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FormulaDataType {
    Numeric,
    String,
    Date,
    Logical,
    /// Result of a comparison or a boolean combination (`AND`, `OR`, `&&`)
    ConditionalExpression,
    Null,
    Boolean,
    /// Column type that could not be classified; compatible with anything
    Unknown,
}

impl FormulaDataType {
    /// Stable lowercase tag
    pub fn as_str(&self) -> &'static str {
        match self {
            FormulaDataType::Numeric => "numeric",
            FormulaDataType::String => "string",
            FormulaDataType::Date => "date",
            FormulaDataType::Logical => "logical",
            FormulaDataType::ConditionalExpression => "conditional_expression",
            FormulaDataType::Null => "null",
            FormulaDataType::Boolean => "boolean",
            FormulaDataType::Unknown => "unknown",
        }
    }

    /// Whether a value of this type satisfies an argument expecting `expected`.
    ///
    /// `null` and `unknown` are accepted everywhere.
    pub fn satisfies(&self, expected: FormulaDataType) -> bool {
        *self == expected || matches!(self, FormulaDataType::Null | FormulaDataType::Unknown)
    }
}

impl fmt::Display for FormulaDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_satisfies() {
        assert!(FormulaDataType::Numeric.satisfies(FormulaDataType::Numeric));
        assert!(FormulaDataType::Null.satisfies(FormulaDataType::Numeric));
        assert!(FormulaDataType::Unknown.satisfies(FormulaDataType::Date));
        assert!(!FormulaDataType::String.satisfies(FormulaDataType::Numeric));
        assert!(!FormulaDataType::Boolean.satisfies(FormulaDataType::Numeric));
    }

    #[test]
    fn test_tags() {
        assert_eq!(
            FormulaDataType::ConditionalExpression.to_string(),
            "conditional_expression"
        );
        assert_eq!(FormulaDataType::Numeric.as_str(), "numeric");
    }
}
