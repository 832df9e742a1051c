//! Branching function return types

use duke_tables_core::{FormulaDataType, FormulaExpr};

/// Result type of an expression that returns one of several branches.
///
/// `null` branches are ignored, since any type may be blank. Mixed branch
/// types, or any string branch, make the result a string; otherwise the first
/// of numeric, boolean or date present wins. When none of those apply, the
/// first candidate's own type is used.
pub fn unify_branch_types(candidates: &[FormulaDataType]) -> FormulaDataType {
    let mut distinct: Vec<FormulaDataType> = Vec::new();
    for t in candidates {
        if *t != FormulaDataType::Null && !distinct.contains(t) {
            distinct.push(*t);
        }
    }

    if distinct.len() > 1 || distinct.contains(&FormulaDataType::String) {
        return FormulaDataType::String;
    }
    for preferred in [
        FormulaDataType::Numeric,
        FormulaDataType::Boolean,
        FormulaDataType::Date,
    ] {
        if distinct.contains(&preferred) {
            return preferred;
        }
    }

    candidates.first().copied().unwrap_or(FormulaDataType::Null)
}

/// IF(expr, then, [else]): unify every branch after the condition
pub fn if_return_type(args: &[FormulaExpr]) -> FormulaDataType {
    let candidates: Vec<FormulaDataType> = args.iter().skip(1).map(type_of).collect();
    unify_branch_types(&candidates)
}

/// SWITCH(expr, pattern, value, ..., [default]): unify the values and the
/// default
pub fn switch_return_type(args: &[FormulaExpr]) -> FormulaDataType {
    let mut candidates: Vec<FormulaDataType> = args.iter().skip(2).step_by(2).map(type_of).collect();

    // An even argument count leaves a trailing default
    if args.len() >= 4 && args.len() % 2 == 0 {
        if let Some(default) = args.last() {
            candidates.push(type_of(default));
        }
    }

    unify_branch_types(&candidates)
}

fn type_of(expr: &FormulaExpr) -> FormulaDataType {
    expr.data_type.unwrap_or(FormulaDataType::Unknown)
}
