//! Printing a tree and parsing the text back yields the same tree

use duke_tables_core::{BinaryOperator, ExprKind, FormulaExpr, LogicalOperator, UnaryOperator};
use duke_tables_formula::{parse_formula, to_formula};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

const KEYWORDS: [&str; 3] = ["true", "false", "null"];

fn binary_operator() -> impl Strategy<Value = BinaryOperator> {
    prop_oneof![
        Just(BinaryOperator::Add),
        Just(BinaryOperator::Subtract),
        Just(BinaryOperator::Multiply),
        Just(BinaryOperator::Divide),
        Just(BinaryOperator::Modulo),
        Just(BinaryOperator::Equal),
        Just(BinaryOperator::NotEqual),
        Just(BinaryOperator::StrictEqual),
        Just(BinaryOperator::StrictNotEqual),
        Just(BinaryOperator::LessThan),
        Just(BinaryOperator::LessEqual),
        Just(BinaryOperator::GreaterThan),
        Just(BinaryOperator::GreaterEqual),
        Just(BinaryOperator::BitOr),
        Just(BinaryOperator::BitXor),
        Just(BinaryOperator::BitAnd),
        Just(BinaryOperator::ShiftLeft),
        Just(BinaryOperator::ShiftRight),
        Just(BinaryOperator::UnsignedShiftRight),
    ]
}

fn logical_operator() -> impl Strategy<Value = LogicalOperator> {
    prop_oneof![Just(LogicalOperator::And), Just(LogicalOperator::Or)]
}

fn unary_operator() -> impl Strategy<Value = UnaryOperator> {
    prop_oneof![
        Just(UnaryOperator::Negate),
        Just(UnaryOperator::Plus),
        Just(UnaryOperator::Not),
        Just(UnaryOperator::BitNot),
    ]
}

/// Bare name usable after `.`
fn property_name() -> impl Strategy<Value = String> {
    "[a-z_][a-z0-9_]{0,5}".prop_filter("keywords are literals", |name| {
        !KEYWORDS.contains(&name.as_str())
    })
}

/// Column title; may contain spaces or collide with a keyword
fn title() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9 _]{0,10}"
}

/// Function name, either bare or one that needs curly brackets
fn function_name() -> impl Strategy<Value = String> {
    prop_oneof!["[A-Z][A-Z_]{0,6}", title()]
}

fn leaf() -> impl Strategy<Value = FormulaExpr> {
    prop_oneof![
        title().prop_map(FormulaExpr::column),
        (0u32..100_000).prop_map(|n| FormulaExpr::number(f64::from(n))),
        (0.0f64..1e6).prop_map(FormulaExpr::number),
        // Negative literals come back as negation, so only magnitudes here
        prop::num::f64::NORMAL.prop_map(|n| FormulaExpr::number(n.abs())),
        "[a-zA-Z0-9 '\"\\\\]{0,8}".prop_map(FormulaExpr::string),
        any::<bool>().prop_map(FormulaExpr::boolean),
        Just(FormulaExpr::null()),
    ]
}

fn expr() -> impl Strategy<Value = FormulaExpr> {
    leaf().prop_recursive(4, 48, 4, |inner| {
        prop_oneof![
            (binary_operator(), inner.clone(), inner.clone())
                .prop_map(|(op, left, right)| FormulaExpr::binary(op, left, right)),
            (logical_operator(), inner.clone(), inner.clone())
                .prop_map(|(op, left, right)| FormulaExpr::logical(op, left, right)),
            (unary_operator(), inner.clone())
                .prop_map(|(op, argument)| FormulaExpr::unary(op, argument)),
            (function_name(), prop::collection::vec(inner.clone(), 0..4))
                .prop_map(|(name, args)| FormulaExpr::call(name, args)),
            (inner.clone(), prop::collection::vec(inner.clone(), 0..3)).prop_map(
                |(callee, arguments)| {
                    FormulaExpr::new(ExprKind::Call {
                        callee: Box::new(callee),
                        arguments,
                    })
                }
            ),
            (inner.clone(), property_name()).prop_map(|(object, name)| {
                FormulaExpr::member(object, FormulaExpr::identifier(name), false)
            }),
            (inner.clone(), inner.clone())
                .prop_map(|(object, property)| FormulaExpr::member(object, property, true)),
            prop::collection::vec(inner.clone(), 0..4).prop_map(FormulaExpr::array),
            (inner.clone(), inner.clone(), inner.clone()).prop_map(
                |(test, consequent, alternate)| {
                    FormulaExpr::conditional(test, consequent, alternate)
                }
            ),
        ]
    })
}

/// A single expression, or several of them as a top-level compound
fn program() -> impl Strategy<Value = FormulaExpr> {
    prop_oneof![
        3 => expr(),
        1 => prop::collection::vec(expr(), 2..4).prop_map(FormulaExpr::compound),
    ]
}

proptest! {
    #[test]
    fn print_then_parse_is_identity(tree in program()) {
        let printed = to_formula(&tree);
        let reparsed = parse_formula(&printed)
            .map_err(|e| TestCaseError::fail(format!("{} for {:?}", e, printed)))?;
        prop_assert_eq!(reparsed, tree);
    }

    #[test]
    fn printing_is_stable(tree in program()) {
        let printed = to_formula(&tree);
        let reprinted = to_formula(&parse_formula(&printed).unwrap());
        prop_assert_eq!(reprinted, printed);
    }
}

#[test]
fn test_source_formulas_round_trip() {
    for formula in [
        "IF({Price} > 100, \"big\", \"small\")",
        "CONCAT({{First Name}}, ' ', {Last Name})",
        "DATEADD({Due Date}, -2, 'week')",
        "SWITCH({Status}, 1, \"One\", 2, \"Two\", \"N/A\")",
        "{a} * ({b} + {c}) / 2 % 3",
        "{a} >= 1 && !{b} || {c} ? [1, 2] : {d}.e[0]",
        "~{bits} << 2 >>> 1 | 4 ^ 5 & 6",
        "{a}, [0]; -{b}",
        "1.5e300 + 2.5e-300",
        "{my func}({x})",
        "{a}.{b c}(1)",
    ] {
        let tree = parse_formula(formula).unwrap();
        let printed = to_formula(&tree);
        assert_eq!(parse_formula(&printed).unwrap(), tree, "{}", formula);
    }
}
