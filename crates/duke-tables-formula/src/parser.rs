//! Formula parser
//!
//! A precedence-climbing parser producing a [`FormulaExpr`] tree. The
//! grammar is a small JavaScript-like expression language: binary, logical
//! and ternary operators, unary prefixes, function calls, member access and
//! array literals, with column references written as `{Column Name}`.

use duke_tables_core::{
    BinaryOperator, ExprKind, FormulaExpr, Identifier, Literal, LiteralValue, LogicalOperator,
    UnaryOperator,
};

use crate::error::{FormulaError, FormulaResult};
use crate::lexer::{Lexer, Spanned, Token};

/// Parse a formula string into an AST
///
/// Several top-level expressions separated by `,`, `;` or whitespace produce
/// a `Compound` node.
///
/// # Example
/// ```rust
/// use duke_tables_formula::parse_formula;
///
/// let ast = parse_formula("1 + 2").unwrap();
/// let ast = parse_formula("CONCAT({First Name}, \" \", {Last Name})").unwrap();
/// let ast = parse_formula("IF({Qty} > 0, \"In stock\", \"Sold out\")").unwrap();
/// ```
pub fn parse_formula(formula: &str) -> FormulaResult<FormulaExpr> {
    let mut parser = FormulaParser::new(formula)?;
    parser.parse_program()
}

/// Parse a formula as stored on a column, where older formulas may still
/// use doubled `{{...}}` delimiters
pub(crate) fn parse_stored_formula(formula: &str) -> FormulaResult<FormulaExpr> {
    parse_formula(&formula.replace("{{", "{").replace("}}", "}"))
}

/// Binary or logical operator, as found between two operands
#[derive(Debug, Clone, Copy)]
enum InfixOperator {
    Binary(BinaryOperator),
    Logical(LogicalOperator),
}

impl InfixOperator {
    fn from_token(token: &Token) -> Option<Self> {
        let op = match token {
            Token::OrOr => InfixOperator::Logical(LogicalOperator::Or),
            Token::AndAnd => InfixOperator::Logical(LogicalOperator::And),
            Token::Pipe => InfixOperator::Binary(BinaryOperator::BitOr),
            Token::Caret => InfixOperator::Binary(BinaryOperator::BitXor),
            Token::Ampersand => InfixOperator::Binary(BinaryOperator::BitAnd),
            Token::EqualEqual => InfixOperator::Binary(BinaryOperator::Equal),
            Token::NotEqual => InfixOperator::Binary(BinaryOperator::NotEqual),
            Token::StrictEqual => InfixOperator::Binary(BinaryOperator::StrictEqual),
            Token::StrictNotEqual => InfixOperator::Binary(BinaryOperator::StrictNotEqual),
            Token::LessThan => InfixOperator::Binary(BinaryOperator::LessThan),
            Token::LessEqual => InfixOperator::Binary(BinaryOperator::LessEqual),
            Token::GreaterThan => InfixOperator::Binary(BinaryOperator::GreaterThan),
            Token::GreaterEqual => InfixOperator::Binary(BinaryOperator::GreaterEqual),
            Token::ShiftLeft => InfixOperator::Binary(BinaryOperator::ShiftLeft),
            Token::ShiftRight => InfixOperator::Binary(BinaryOperator::ShiftRight),
            Token::UnsignedShiftRight => InfixOperator::Binary(BinaryOperator::UnsignedShiftRight),
            Token::Plus => InfixOperator::Binary(BinaryOperator::Add),
            Token::Minus => InfixOperator::Binary(BinaryOperator::Subtract),
            Token::Star => InfixOperator::Binary(BinaryOperator::Multiply),
            Token::Slash => InfixOperator::Binary(BinaryOperator::Divide),
            Token::Percent => InfixOperator::Binary(BinaryOperator::Modulo),
            _ => return None,
        };
        Some(op)
    }

    fn precedence(&self) -> u8 {
        match self {
            InfixOperator::Binary(op) => op.precedence(),
            InfixOperator::Logical(op) => op.precedence(),
        }
    }

    fn build(self, left: FormulaExpr, right: FormulaExpr) -> FormulaExpr {
        match self {
            InfixOperator::Binary(op) => FormulaExpr::binary(op, left, right),
            InfixOperator::Logical(op) => FormulaExpr::logical(op, left, right),
        }
    }
}

/// Deepest nesting of parentheses, brackets, calls and prefix operators
const MAX_NESTING_DEPTH: usize = 100;

/// Formula parser
struct FormulaParser<'a> {
    input: &'a str,
    lexer: Lexer<'a>,
    current: Spanned,
    depth: usize,
}

impl<'a> FormulaParser<'a> {
    fn new(input: &'a str) -> FormulaResult<Self> {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token()?;
        Ok(Self {
            input,
            lexer,
            current,
            depth: 0,
        })
    }

    // === Token handling ===

    fn current_token(&self) -> &Token {
        &self.current.token
    }

    fn consume(&mut self) -> FormulaResult<Spanned> {
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn expect(&mut self, expected: &Token, what: &str) -> FormulaResult<Spanned> {
        if self.current_token() == expected {
            self.consume()
        } else {
            Err(self.unexpected(Some(what)))
        }
    }

    fn unexpected(&self, expected: Option<&str>) -> FormulaError {
        let found = match self.current_token() {
            Token::Eof => "end of input".to_string(),
            _ => format!("\"{}\"", &self.input[self.current.start..self.current.end]),
        };
        let message = match expected {
            Some(what) => format!("Expected {} but found {}", what, found),
            None => format!("Unexpected {}", found),
        };
        FormulaError::parse(message, self.current.start)
    }

    /// Run `parse` one nesting level deeper
    fn nested(
        &mut self,
        parse: impl FnOnce(&mut Self) -> FormulaResult<FormulaExpr>,
    ) -> FormulaResult<FormulaExpr> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(FormulaError::parse(
                "Formula is nested too deeply",
                self.current.start,
            ));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    // === Expression parsing with precedence ===
    // Precedence (lowest to highest):
    // 1. Ternary: ? :
    // 2. Binary/logical operators, by InfixOperator::precedence
    // 3. Unary: - + ! ~
    // 4. Postfix: member access, calls
    // 5. Primary: literals, identifiers, arrays, parentheses

    fn parse_program(&mut self) -> FormulaResult<FormulaExpr> {
        let mut body = Vec::new();

        loop {
            match self.current_token() {
                Token::Eof => break,
                Token::Comma | Token::Semicolon => {
                    self.consume()?;
                }
                _ => body.push(self.parse_expression()?),
            }
        }

        match body.len() {
            0 => Err(FormulaError::parse("Empty formula", 0)),
            1 => Ok(body.remove(0)),
            _ => Ok(FormulaExpr::compound(body)),
        }
    }

    fn parse_expression(&mut self) -> FormulaResult<FormulaExpr> {
        self.nested(Self::parse_conditional)
    }

    fn parse_conditional(&mut self) -> FormulaResult<FormulaExpr> {
        let test = self.parse_binary(1)?;

        if !matches!(self.current_token(), Token::Question) {
            return Ok(test);
        }

        self.consume()?;
        let consequent = self.parse_expression()?;
        self.expect(&Token::Colon, "\":\"")?;
        let alternate = self.parse_expression()?;

        Ok(FormulaExpr::conditional(test, consequent, alternate))
    }

    fn parse_binary(&mut self, min_precedence: u8) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_unary()?;

        while let Some(op) = InfixOperator::from_token(self.current_token()) {
            let precedence = op.precedence();
            if precedence < min_precedence {
                break;
            }

            self.consume()?;
            // Left associative: the right side only takes tighter operators
            let right = self.parse_binary(precedence + 1)?;
            left = op.build(left, right);
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> FormulaResult<FormulaExpr> {
        let operator = match self.current_token() {
            Token::Minus => UnaryOperator::Negate,
            Token::Plus => UnaryOperator::Plus,
            Token::Bang => UnaryOperator::Not,
            Token::Tilde => UnaryOperator::BitNot,
            _ => return self.parse_postfix(),
        };

        self.consume()?;
        let argument = self.nested(Self::parse_unary)?;
        Ok(FormulaExpr::unary(operator, argument))
    }

    fn parse_postfix(&mut self) -> FormulaResult<FormulaExpr> {
        let mut expr = self.parse_primary()?;

        loop {
            match self.current_token() {
                Token::Dot => {
                    self.consume()?;
                    let property = match self.current_token().clone() {
                        Token::Identifier { name, raw } => {
                            self.consume()?;
                            FormulaExpr::new(ExprKind::Identifier(Identifier { name, raw }))
                        }
                        _ => return Err(self.unexpected(Some("property name"))),
                    };
                    expr = FormulaExpr::member(expr, property, false);
                }
                Token::LeftBracket => {
                    self.consume()?;
                    let property = self.parse_expression()?;
                    self.expect(&Token::RightBracket, "\"]\"")?;
                    expr = FormulaExpr::member(expr, property, true);
                }
                Token::LeftParen => {
                    self.consume()?;
                    let arguments = self.parse_arguments(&Token::RightParen, "\")\"")?;
                    expr = FormulaExpr::new(ExprKind::Call {
                        callee: Box::new(expr),
                        arguments,
                    });
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    fn parse_primary(&mut self) -> FormulaResult<FormulaExpr> {
        match self.current_token().clone() {
            Token::Number(n) => {
                let spanned = self.consume()?;
                Ok(self.literal(LiteralValue::Number(n), &spanned))
            }

            Token::String(s) => {
                let spanned = self.consume()?;
                Ok(self.literal(LiteralValue::String(s), &spanned))
            }

            Token::Boolean(b) => {
                let spanned = self.consume()?;
                Ok(self.literal(LiteralValue::Boolean(b), &spanned))
            }

            Token::Null => {
                let spanned = self.consume()?;
                Ok(self.literal(LiteralValue::Null, &spanned))
            }

            Token::Identifier { name, raw } => {
                self.consume()?;
                Ok(FormulaExpr::new(ExprKind::Identifier(Identifier { name, raw })))
            }

            Token::LeftParen => {
                self.consume()?;
                let expr = self.parse_expression()?;
                self.expect(&Token::RightParen, "\")\"")?;
                Ok(expr)
            }

            Token::LeftBracket => {
                self.consume()?;
                let elements = self.parse_arguments(&Token::RightBracket, "\"]\"")?;
                Ok(FormulaExpr::array(elements))
            }

            _ => Err(self.unexpected(None)),
        }
    }

    /// Comma separated expressions up to `closing`, which is consumed
    fn parse_arguments(&mut self, closing: &Token, what: &str) -> FormulaResult<Vec<FormulaExpr>> {
        let mut args = Vec::new();

        if self.current_token() == closing {
            self.consume()?;
            return Ok(args);
        }

        args.push(self.parse_expression()?);
        while matches!(self.current_token(), Token::Comma) {
            self.consume()?;
            args.push(self.parse_expression()?);
        }

        self.expect(closing, what)?;
        Ok(args)
    }

    fn literal(&self, value: LiteralValue, spanned: &Spanned) -> FormulaExpr {
        FormulaExpr::new(ExprKind::Literal(Literal {
            value,
            raw: self.input[spanned.start..spanned.end].to_string(),
        }))
    }
}
