//! Formula tokenizer
//!
//! Splits formula text into tokens. Besides the usual expression grammar
//! (numbers, quoted strings, identifiers, operators) it recognises column
//! references wrapped in curly brackets, `{Unit Price}` or the legacy
//! `{{Unit Price}}`, so column names may contain spaces and punctuation.

use crate::error::ParseError;

/// Token types
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    // Literals
    Number(f64),
    String(String),
    Boolean(bool),
    Null,

    // Identifiers (`raw` keeps curly brackets when present)
    Identifier { name: String, raw: String },

    // Logical / bitwise
    OrOr,
    AndAnd,
    Pipe,
    Caret,
    Ampersand,

    // Comparison
    EqualEqual,
    NotEqual,
    StrictEqual,
    StrictNotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,

    // Shift
    ShiftLeft,
    ShiftRight,
    UnsignedShiftRight,

    // Arithmetic
    Plus,
    Minus,
    Star,
    Slash,
    Percent,

    // Unary-only
    Bang,
    Tilde,

    // Punctuation
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Comma,
    Semicolon,
    Dot,
    Question,
    Colon,

    // End of input
    Eof,
}

/// A token with its source span (byte offsets)
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
    pub token: Token,
    pub start: usize,
    pub end: usize,
}

/// Formula tokenizer
pub(crate) struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Scan the next token
    pub fn next_token(&mut self) -> Result<Spanned, ParseError> {
        self.skip_whitespace();
        let start = self.pos;
        let token = self.scan_token()?;
        Ok(Spanned {
            token,
            start,
            end: self.pos,
        })
    }

    fn scan_token(&mut self) -> Result<Token, ParseError> {
        let c = match self.peek_char() {
            Some(c) => c,
            None => return Ok(Token::Eof),
        };

        // Single-character tokens
        let single = match c {
            '(' => Some(Token::LeftParen),
            ')' => Some(Token::RightParen),
            '[' => Some(Token::LeftBracket),
            ']' => Some(Token::RightBracket),
            ',' => Some(Token::Comma),
            ';' => Some(Token::Semicolon),
            '?' => Some(Token::Question),
            ':' => Some(Token::Colon),
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            '%' => Some(Token::Percent),
            '^' => Some(Token::Caret),
            '~' => Some(Token::Tilde),
            _ => None,
        };
        if let Some(token) = single {
            self.advance();
            return Ok(token);
        }

        match c {
            '{' => return self.scan_column_identifier(),
            '"' | '\'' => return self.scan_string(c),
            '|' => return Ok(self.one_or_two('|', Token::Pipe, Token::OrOr)),
            '&' => return Ok(self.one_or_two('&', Token::Ampersand, Token::AndAnd)),
            '=' => {
                if self.starts_with("===") {
                    self.pos += 3;
                    return Ok(Token::StrictEqual);
                }
                if self.starts_with("==") {
                    self.pos += 2;
                    return Ok(Token::EqualEqual);
                }
                return Err(ParseError::new("Unexpected \"=\"", self.pos));
            }
            '!' => {
                if self.starts_with("!==") {
                    self.pos += 3;
                    return Ok(Token::StrictNotEqual);
                }
                if self.starts_with("!=") {
                    self.pos += 2;
                    return Ok(Token::NotEqual);
                }
                self.advance();
                return Ok(Token::Bang);
            }
            '<' => {
                if self.starts_with("<<") {
                    self.pos += 2;
                    return Ok(Token::ShiftLeft);
                }
                return Ok(self.one_or_two('=', Token::LessThan, Token::LessEqual));
            }
            '>' => {
                if self.starts_with(">>>") {
                    self.pos += 3;
                    return Ok(Token::UnsignedShiftRight);
                }
                if self.starts_with(">>") {
                    self.pos += 2;
                    return Ok(Token::ShiftRight);
                }
                return Ok(self.one_or_two('=', Token::GreaterThan, Token::GreaterEqual));
            }
            _ => {}
        }

        // Number
        if c.is_ascii_digit()
            || (c == '.' && self.peek_char_at(1).map_or(false, |c| c.is_ascii_digit()))
        {
            return self.scan_number();
        }

        if c == '.' {
            self.advance();
            return Ok(Token::Dot);
        }

        if is_identifier_start(c) {
            return Ok(self.scan_identifier());
        }

        Err(ParseError::new(format!("Unexpected \"{}\"", c), self.pos))
    }

    /// `{name}` or `{{name}}`
    fn scan_column_identifier(&mut self) -> Result<Token, ParseError> {
        let start = self.pos;
        let close = self.input[start..]
            .find('}')
            .map(|idx| start + idx)
            .ok_or_else(|| ParseError::new("Unterminated identifier", start))?;

        let mut end = close + 1;
        let double = self.input[start..].starts_with("{{");
        if double {
            if !self.input[end..].starts_with('}') {
                return Err(ParseError::new("Unterminated identifier", start));
            }
            end += 1;
        }

        let raw = &self.input[start..end];
        let name = if double {
            &raw[2..raw.len() - 2]
        } else {
            &raw[1..raw.len() - 1]
        };
        self.pos = end;

        Ok(Token::Identifier {
            name: name.to_string(),
            raw: raw.to_string(),
        })
    }

    fn scan_string(&mut self, quote: char) -> Result<Token, ParseError> {
        let start = self.pos;
        self.advance(); // Skip opening quote

        let mut s = String::new();
        loop {
            let c = self
                .peek_char()
                .ok_or_else(|| ParseError::new("Unclosed quote", start))?;
            self.advance();

            if c == quote {
                break;
            }
            if c != '\\' {
                s.push(c);
                continue;
            }

            let escaped = self
                .peek_char()
                .ok_or_else(|| ParseError::new("Unclosed quote", start))?;
            self.advance();
            s.push(match escaped {
                'n' => '\n',
                'r' => '\r',
                't' => '\t',
                'b' => '\u{8}',
                'f' => '\u{c}',
                'v' => '\u{b}',
                other => other,
            });
        }

        Ok(Token::String(s))
    }

    fn scan_number(&mut self) -> Result<Token, ParseError> {
        let start = self.pos;

        // Integer part
        self.skip_digits();

        // Decimal part
        if self.peek_char() == Some('.') {
            self.advance();
            self.skip_digits();
        }

        // Exponent part
        if self.peek_char().map_or(false, |c| c == 'e' || c == 'E') {
            self.advance();
            if self.peek_char().map_or(false, |c| c == '+' || c == '-') {
                self.advance();
            }
            if !self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                return Err(ParseError::new("Expected exponent", self.pos));
            }
            self.skip_digits();
        }

        match self.peek_char() {
            Some(c) if is_identifier_start(c) => {
                return Err(ParseError::new(
                    "Variable names cannot start with a number",
                    start,
                ))
            }
            Some('.') => return Err(ParseError::new("Unexpected period", self.pos)),
            _ => {}
        }

        let num_str = &self.input[start..self.pos];
        match num_str.parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(Token::Number(n)),
            _ => Err(ParseError::new(format!("Invalid number {}", num_str), start)),
        }
    }

    fn scan_identifier(&mut self) -> Token {
        let start = self.pos;
        while self.peek_char().map_or(false, is_identifier_part) {
            self.advance();
        }

        let text = &self.input[start..self.pos];
        match text {
            "true" => Token::Boolean(true),
            "false" => Token::Boolean(false),
            "null" => Token::Null,
            _ => Token::Identifier {
                name: text.to_string(),
                raw: text.to_string(),
            },
        }
    }

    // === Helper methods ===

    fn one_or_two(&mut self, second: char, one: Token, two: Token) -> Token {
        self.advance();
        if self.peek_char() == Some(second) {
            self.advance();
            two
        } else {
            one
        }
    }

    fn starts_with(&self, s: &str) -> bool {
        self.input[self.pos..].starts_with(s)
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_digits(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_whitespace()) {
            self.advance();
        }
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$' || !c.is_ascii()
}

fn is_identifier_part(c: char) -> bool {
    is_identifier_start(c) || c.is_ascii_digit()
}

/// Whether `name` lexes back as a bare identifier
pub(crate) fn is_bare_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().map_or(false, is_identifier_start)
        && chars.all(is_identifier_part)
        && !matches!(name, "true" | "false" | "null")
}
