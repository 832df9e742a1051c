//! Text function argument checks

use duke_tables_core::{FormulaDataType, FormulaExpr};

use super::expect_type;
use crate::error::FormulaResult;

/// LEFT, RIGHT, REPEAT, SUBSTR, MID: a string followed by numbers
pub fn validate_string_then_numbers(function: &str, args: &[FormulaExpr]) -> FormulaResult<()> {
    let Some((text, rest)) = args.split_first() else {
        return Ok(());
    };
    expect_type(function, text, FormulaDataType::String)?;
    for arg in rest {
        expect_type(function, arg, FormulaDataType::Numeric)?;
    }
    Ok(())
}

/// REGEX_MATCH, REGEX_EXTRACT, REGEX_REPLACE: string arguments
///
/// Literal patterns are left to the database's regex dialect.
pub fn validate_regex_args(function: &str, args: &[FormulaExpr]) -> FormulaResult<()> {
    for arg in args {
        expect_type(function, arg, FormulaDataType::String)?;
    }
    Ok(())
}
