//! Formula printer
//!
//! Turns a [`FormulaExpr`] back into formula text. Binary and logical
//! operations are always parenthesized, so the output re-parses to the same
//! tree regardless of operator precedence.

use std::fmt::{self, Write};

use duke_tables_core::{ExprKind, FormulaExpr, LiteralValue};

use crate::lexer::is_bare_identifier;

/// Print an expression tree as formula text
///
/// # Example
/// ```rust
/// use duke_tables_formula::{parse_formula, to_formula};
///
/// let ast = parse_formula("ADD({a},1)*2").unwrap();
/// assert_eq!(to_formula(&ast), "(ADD({a}, 1) * 2)");
/// ```
pub fn to_formula(expr: &FormulaExpr) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_expr(&mut out, expr, false);
    out
}

/// Display adapter for [`to_formula`]
pub struct FormulaDisplay<'a>(pub &'a FormulaExpr);

impl fmt::Display for FormulaDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_expr(f, self.0, false)
    }
}

fn write_expr<W: Write>(out: &mut W, expr: &FormulaExpr, is_callee: bool) -> fmt::Result {
    match &expr.kind {
        ExprKind::Binary {
            operator,
            left,
            right,
        } => {
            out.write_char('(')?;
            write_expr(out, left, false)?;
            write!(out, " {} ", operator.as_str())?;
            write_expr(out, right, false)?;
            out.write_char(')')
        }

        ExprKind::Logical {
            operator,
            left,
            right,
        } => {
            out.write_char('(')?;
            write_expr(out, left, false)?;
            write!(out, " {} ", operator.as_str())?;
            write_expr(out, right, false)?;
            out.write_char(')')
        }

        ExprKind::Unary { operator, argument } => {
            out.write_str(operator.as_str())?;
            write_expr(out, argument, false)
        }

        ExprKind::Member {
            object,
            property,
            computed,
        } => {
            write_operand(out, object, false)?;

            if *computed {
                out.write_char('[')?;
                write_expr(out, property, false)?;
                out.write_char(']')
            } else {
                out.write_char('.')?;
                write_expr(out, property, true)
            }
        }

        // Function and property names print bare when they lex back that way;
        // column references get curly brackets
        ExprKind::Identifier(ident) => {
            if is_callee && is_bare_identifier(&ident.name) {
                out.write_str(&ident.name)
            } else {
                write!(out, "{{{}}}", ident.name)
            }
        }

        ExprKind::Literal(lit) => write_literal(out, &lit.value),

        ExprKind::Call { callee, arguments } => {
            write_operand(out, callee, true)?;
            out.write_char('(')?;
            write_list(out, arguments)?;
            out.write_char(')')
        }

        ExprKind::Array { elements } => {
            out.write_char('[')?;
            write_list(out, elements)?;
            out.write_char(']')
        }

        ExprKind::Compound { body } => {
            for (i, e) in body.iter().enumerate() {
                if i > 0 {
                    out.write_str("; ")?;
                }
                write_expr(out, e, false)?;
            }
            Ok(())
        }

        ExprKind::Conditional {
            test,
            consequent,
            alternate,
        } => {
            out.write_char('(')?;
            write_expr(out, test, false)?;
            out.write_str(" ? ")?;
            write_expr(out, consequent, false)?;
            out.write_str(" : ")?;
            write_expr(out, alternate, false)?;
            out.write_char(')')
        }
    }
}

/// Object of a member access or callee of a call
fn write_operand<W: Write>(out: &mut W, expr: &FormulaExpr, is_callee: bool) -> fmt::Result {
    let wrap = matches!(
        expr.kind,
        ExprKind::Unary { .. } | ExprKind::Conditional { .. } | ExprKind::Literal(_)
    );
    if wrap {
        out.write_char('(')?;
        write_expr(out, expr, false)?;
        out.write_char(')')
    } else {
        write_expr(out, expr, is_callee)
    }
}

fn write_list<W: Write>(out: &mut W, items: &[FormulaExpr]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.write_str(", ")?;
        }
        write_expr(out, item, false)?;
    }
    Ok(())
}

fn write_literal<W: Write>(out: &mut W, value: &LiteralValue) -> fmt::Result {
    match value {
        LiteralValue::Number(n) => write!(out, "{}", n),
        LiteralValue::String(s) => {
            out.write_char('"')?;
            for c in s.chars() {
                if matches!(c, '\\' | '"' | '\'') {
                    out.write_char('\\')?;
                }
                out.write_char(c)?;
            }
            out.write_char('"')
        }
        LiteralValue::Boolean(b) => write!(out, "{}", b),
        LiteralValue::Null => out.write_str("null"),
    }
}
