//! Formula Abstract Syntax Tree types

use crate::data_type::FormulaDataType;

/// Formula expression AST node
///
/// `data_type` is `None` straight out of the parser and filled in by the
/// validation pass for every node it accepts.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FormulaExpr {
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub kind: ExprKind,
    #[cfg_attr(
        feature = "serde",
        serde(rename = "dataType", default, skip_serializing_if = "Option::is_none")
    )]
    pub data_type: Option<FormulaDataType>,
}

/// Node variants
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type"))]
pub enum ExprKind {
    /// Several top-level expressions (`a, b` or `a; b`)
    Compound { body: Vec<FormulaExpr> },

    // === References ===
    /// Column reference or bare name
    Identifier(Identifier),
    /// `object[property]` or `object.property`
    #[cfg_attr(feature = "serde", serde(rename = "MemberExpression"))]
    Member {
        object: Box<FormulaExpr>,
        property: Box<FormulaExpr>,
        computed: bool,
    },

    // === Literals ===
    Literal(Literal),

    // === Function call ===
    #[cfg_attr(feature = "serde", serde(rename = "CallExpression"))]
    Call {
        callee: Box<FormulaExpr>,
        arguments: Vec<FormulaExpr>,
    },

    // === Operators ===
    #[cfg_attr(feature = "serde", serde(rename = "UnaryExpression"))]
    Unary {
        operator: UnaryOperator,
        argument: Box<FormulaExpr>,
    },
    #[cfg_attr(feature = "serde", serde(rename = "BinaryExpression"))]
    Binary {
        operator: BinaryOperator,
        left: Box<FormulaExpr>,
        right: Box<FormulaExpr>,
    },
    #[cfg_attr(feature = "serde", serde(rename = "LogicalExpression"))]
    Logical {
        operator: LogicalOperator,
        left: Box<FormulaExpr>,
        right: Box<FormulaExpr>,
    },

    // === Array ===
    #[cfg_attr(feature = "serde", serde(rename = "ArrayExpression"))]
    Array { elements: Vec<FormulaExpr> },

    // === Ternary ===
    #[cfg_attr(feature = "serde", serde(rename = "ConditionalExpression"))]
    Conditional {
        test: Box<FormulaExpr>,
        consequent: Box<FormulaExpr>,
        alternate: Box<FormulaExpr>,
    },
}

/// Identifier node
///
/// `raw` is the source slice, including any curly delimiters. It is
/// ignored by equality.
#[derive(Debug, Clone, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Identifier {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub raw: String,
}

impl PartialEq for Identifier {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// Literal node; equality compares the value only
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Literal {
    pub value: LiteralValue,
    #[cfg_attr(feature = "serde", serde(default))]
    pub raw: String,
}

impl PartialEq for Literal {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

/// Literal values
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum LiteralValue {
    Number(f64),
    String(String),
    Boolean(bool),
    Null,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BinaryOperator {
    // Arithmetic
    #[cfg_attr(feature = "serde", serde(rename = "+"))]
    Add,
    #[cfg_attr(feature = "serde", serde(rename = "-"))]
    Subtract,
    #[cfg_attr(feature = "serde", serde(rename = "*"))]
    Multiply,
    #[cfg_attr(feature = "serde", serde(rename = "/"))]
    Divide,
    #[cfg_attr(feature = "serde", serde(rename = "%"))]
    Modulo,

    // Comparison
    #[cfg_attr(feature = "serde", serde(rename = "=="))]
    Equal,
    #[cfg_attr(feature = "serde", serde(rename = "!="))]
    NotEqual,
    #[cfg_attr(feature = "serde", serde(rename = "==="))]
    StrictEqual,
    #[cfg_attr(feature = "serde", serde(rename = "!=="))]
    StrictNotEqual,
    #[cfg_attr(feature = "serde", serde(rename = "<"))]
    LessThan,
    #[cfg_attr(feature = "serde", serde(rename = "<="))]
    LessEqual,
    #[cfg_attr(feature = "serde", serde(rename = ">"))]
    GreaterThan,
    #[cfg_attr(feature = "serde", serde(rename = ">="))]
    GreaterEqual,

    // Bitwise
    #[cfg_attr(feature = "serde", serde(rename = "|"))]
    BitOr,
    #[cfg_attr(feature = "serde", serde(rename = "^"))]
    BitXor,
    #[cfg_attr(feature = "serde", serde(rename = "&"))]
    BitAnd,
    #[cfg_attr(feature = "serde", serde(rename = "<<"))]
    ShiftLeft,
    #[cfg_attr(feature = "serde", serde(rename = ">>"))]
    ShiftRight,
    #[cfg_attr(feature = "serde", serde(rename = ">>>"))]
    UnsignedShiftRight,
}

impl BinaryOperator {
    /// Source symbol
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::StrictEqual => "===",
            BinaryOperator::StrictNotEqual => "!==",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterEqual => ">=",
            BinaryOperator::BitOr => "|",
            BinaryOperator::BitXor => "^",
            BinaryOperator::BitAnd => "&",
            BinaryOperator::ShiftLeft => "<<",
            BinaryOperator::ShiftRight => ">>",
            BinaryOperator::UnsignedShiftRight => ">>>",
        }
    }

    /// Binding power, higher binds tighter
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOperator::BitOr => 3,
            BinaryOperator::BitXor => 4,
            BinaryOperator::BitAnd => 5,
            BinaryOperator::Equal
            | BinaryOperator::NotEqual
            | BinaryOperator::StrictEqual
            | BinaryOperator::StrictNotEqual => 6,
            BinaryOperator::LessThan
            | BinaryOperator::LessEqual
            | BinaryOperator::GreaterThan
            | BinaryOperator::GreaterEqual => 7,
            BinaryOperator::ShiftLeft
            | BinaryOperator::ShiftRight
            | BinaryOperator::UnsignedShiftRight => 8,
            BinaryOperator::Add | BinaryOperator::Subtract => 9,
            BinaryOperator::Multiply | BinaryOperator::Divide | BinaryOperator::Modulo => 10,
        }
    }

    /// Comparison operators that produce a conditional expression
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Equal
                | BinaryOperator::NotEqual
                | BinaryOperator::LessThan
                | BinaryOperator::LessEqual
                | BinaryOperator::GreaterThan
                | BinaryOperator::GreaterEqual
        )
    }
}

/// Short-circuit operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LogicalOperator {
    #[cfg_attr(feature = "serde", serde(rename = "||"))]
    Or,
    #[cfg_attr(feature = "serde", serde(rename = "&&"))]
    And,
}

impl LogicalOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalOperator::Or => "||",
            LogicalOperator::And => "&&",
        }
    }

    pub fn precedence(&self) -> u8 {
        match self {
            LogicalOperator::Or => 1,
            LogicalOperator::And => 2,
        }
    }
}

/// Unary prefix operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UnaryOperator {
    #[cfg_attr(feature = "serde", serde(rename = "-"))]
    Negate,
    #[cfg_attr(feature = "serde", serde(rename = "+"))]
    Plus,
    #[cfg_attr(feature = "serde", serde(rename = "!"))]
    Not,
    #[cfg_attr(feature = "serde", serde(rename = "~"))]
    BitNot,
}

impl UnaryOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOperator::Negate => "-",
            UnaryOperator::Plus => "+",
            UnaryOperator::Not => "!",
            UnaryOperator::BitNot => "~",
        }
    }
}

impl FormulaExpr {
    /// Wrap a node kind without a type
    pub fn new(kind: ExprKind) -> Self {
        Self {
            kind,
            data_type: None,
        }
    }

    /// Bare identifier, e.g. a function name
    pub fn identifier(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(ExprKind::Identifier(Identifier {
            raw: name.clone(),
            name,
        }))
    }

    /// Curly-bracketed column reference `{name}`
    pub fn column(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(ExprKind::Identifier(Identifier {
            raw: format!("{{{}}}", name),
            name,
        }))
    }

    pub fn number(value: f64) -> Self {
        Self::literal(LiteralValue::Number(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::literal(LiteralValue::String(value.into()))
    }

    pub fn boolean(value: bool) -> Self {
        Self::literal(LiteralValue::Boolean(value))
    }

    pub fn null() -> Self {
        Self::literal(LiteralValue::Null)
    }

    fn literal(value: LiteralValue) -> Self {
        Self::new(ExprKind::Literal(Literal {
            value,
            raw: String::new(),
        }))
    }

    /// Function call with an identifier callee
    pub fn call(name: impl Into<String>, arguments: Vec<FormulaExpr>) -> Self {
        Self::new(ExprKind::Call {
            callee: Box::new(Self::identifier(name)),
            arguments,
        })
    }

    pub fn binary(operator: BinaryOperator, left: FormulaExpr, right: FormulaExpr) -> Self {
        Self::new(ExprKind::Binary {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn logical(operator: LogicalOperator, left: FormulaExpr, right: FormulaExpr) -> Self {
        Self::new(ExprKind::Logical {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn unary(operator: UnaryOperator, argument: FormulaExpr) -> Self {
        Self::new(ExprKind::Unary {
            operator,
            argument: Box::new(argument),
        })
    }

    pub fn member(object: FormulaExpr, property: FormulaExpr, computed: bool) -> Self {
        Self::new(ExprKind::Member {
            object: Box::new(object),
            property: Box::new(property),
            computed,
        })
    }

    pub fn array(elements: Vec<FormulaExpr>) -> Self {
        Self::new(ExprKind::Array { elements })
    }

    pub fn conditional(test: FormulaExpr, consequent: FormulaExpr, alternate: FormulaExpr) -> Self {
        Self::new(ExprKind::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        })
    }

    pub fn compound(body: Vec<FormulaExpr>) -> Self {
        Self::new(ExprKind::Compound { body })
    }

    /// Set the inferred type
    pub fn with_type(mut self, data_type: FormulaDataType) -> Self {
        self.data_type = Some(data_type);
        self
    }

    /// Get the identifier if this node is one
    pub fn as_identifier(&self) -> Option<&Identifier> {
        match &self.kind {
            ExprKind::Identifier(ident) => Some(ident),
            _ => None,
        }
    }

    /// Get the literal value if this node is a literal
    pub fn as_literal(&self) -> Option<&LiteralValue> {
        match &self.kind {
            ExprKind::Literal(lit) => Some(&lit.value),
            _ => None,
        }
    }

    /// Visit every identifier that refers to a column.
    ///
    /// Call callees (function names) and non-computed member properties are
    /// names, not column references, and are skipped.
    pub fn for_each_column_ref_mut(&mut self, f: &mut impl FnMut(&mut Identifier)) {
        match &mut self.kind {
            ExprKind::Identifier(ident) => f(ident),
            ExprKind::Literal(_) => {}
            ExprKind::Compound { body } => {
                body.iter_mut().for_each(|e| e.for_each_column_ref_mut(f))
            }
            ExprKind::Member {
                object,
                property,
                computed,
            } => {
                object.for_each_column_ref_mut(f);
                if *computed {
                    property.for_each_column_ref_mut(f);
                }
            }
            ExprKind::Call { arguments, .. } => arguments
                .iter_mut()
                .for_each(|e| e.for_each_column_ref_mut(f)),
            ExprKind::Unary { argument, .. } => argument.for_each_column_ref_mut(f),
            ExprKind::Binary { left, right, .. } | ExprKind::Logical { left, right, .. } => {
                left.for_each_column_ref_mut(f);
                right.for_each_column_ref_mut(f);
            }
            ExprKind::Array { elements } => elements
                .iter_mut()
                .for_each(|e| e.for_each_column_ref_mut(f)),
            ExprKind::Conditional {
                test,
                consequent,
                alternate,
            } => {
                test.for_each_column_ref_mut(f);
                consequent.for_each_column_ref_mut(f);
                alternate.for_each_column_ref_mut(f);
            }
        }
    }

    /// Column references in source order
    pub fn column_refs(&self) -> Vec<&Identifier> {
        let mut refs = Vec::new();
        self.collect_column_refs(&mut refs);
        refs
    }

    fn collect_column_refs<'a>(&'a self, out: &mut Vec<&'a Identifier>) {
        match &self.kind {
            ExprKind::Identifier(ident) => out.push(ident),
            ExprKind::Literal(_) => {}
            ExprKind::Compound { body } => body.iter().for_each(|e| e.collect_column_refs(out)),
            ExprKind::Member {
                object,
                property,
                computed,
            } => {
                object.collect_column_refs(out);
                if *computed {
                    property.collect_column_refs(out);
                }
            }
            ExprKind::Call { arguments, .. } => {
                arguments.iter().for_each(|e| e.collect_column_refs(out))
            }
            ExprKind::Unary { argument, .. } => argument.collect_column_refs(out),
            ExprKind::Binary { left, right, .. } | ExprKind::Logical { left, right, .. } => {
                left.collect_column_refs(out);
                right.collect_column_refs(out);
            }
            ExprKind::Array { elements } => {
                elements.iter().for_each(|e| e.collect_column_refs(out))
            }
            ExprKind::Conditional {
                test,
                consequent,
                alternate,
            } => {
                test.collect_column_refs(out);
                consequent.collect_column_refs(out);
                alternate.collect_column_refs(out);
            }
        }
    }
}
