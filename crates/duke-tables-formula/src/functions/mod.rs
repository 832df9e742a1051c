//! Built-in formula functions
//!
//! The registry describes every function a formula may call: how many
//! arguments it takes, what types those arguments must have, and what type
//! the call produces. Nothing here evaluates a function; the descriptors are
//! consumed by the validation pass.

pub mod date;
pub mod logical;
pub mod text;

use std::sync::OnceLock;

use ahash::AHashMap;
use duke_tables_core::{ExprKind, FormulaDataType, FormulaExpr};

use crate::error::{FormulaError, FormulaResult};

/// Custom argument check, run after the arguments have been typed.
///
/// Receives the uppercase function name and the annotated arguments.
pub type ArgValidator = fn(&str, &[FormulaExpr]) -> FormulaResult<()>;

/// Return type computed from the annotated arguments
pub type ReturnRule = fn(&[FormulaExpr]) -> FormulaDataType;

/// Argument count and type constraints
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArgRule {
    /// Minimum argument count
    pub min: Option<usize>,
    /// Maximum argument count
    pub max: Option<usize>,
    /// Exact argument count
    pub required: Option<usize>,
    /// Type every argument must have
    pub arg_type: Option<FormulaDataType>,
}

impl ArgRule {
    /// No constraints
    pub const fn any() -> Self {
        Self {
            min: None,
            max: None,
            required: None,
            arg_type: None,
        }
    }

    /// Exactly `n` arguments
    pub const fn exactly(n: usize) -> Self {
        Self {
            required: Some(n),
            ..Self::any()
        }
    }

    /// At least `n` arguments
    pub const fn at_least(n: usize) -> Self {
        Self {
            min: Some(n),
            ..Self::any()
        }
    }

    /// At most `n` arguments
    pub const fn at_most(n: usize) -> Self {
        Self {
            max: Some(n),
            ..Self::any()
        }
    }

    /// Between `min` and `max` arguments
    pub const fn between(min: usize, max: usize) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            ..Self::any()
        }
    }

    /// Require every argument to have `arg_type`
    pub const fn of(self, arg_type: FormulaDataType) -> Self {
        Self {
            arg_type: Some(arg_type),
            ..self
        }
    }
}

/// Return type of a function
#[derive(Clone, Copy)]
pub enum ReturnType {
    Fixed(FormulaDataType),
    Computed(ReturnRule),
}

impl std::fmt::Debug for ReturnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReturnType::Fixed(t) => write!(f, "Fixed({})", t),
            ReturnType::Computed(_) => f.write_str("Computed"),
        }
    }
}

/// Function definition
pub struct FunctionDef {
    /// Function name (uppercase)
    pub name: &'static str,
    /// Argument constraints
    pub args: ArgRule,
    /// Custom check; replaces the uniform `args.arg_type` check when present
    pub validator: Option<ArgValidator>,
    pub return_type: ReturnType,
    pub description: &'static str,
    pub syntax: &'static str,
    pub examples: &'static [&'static str],
}

impl std::fmt::Debug for FunctionDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionDef")
            .field("name", &self.name)
            .field("args", &self.args)
            .field("validator", &self.validator.is_some())
            .field("return_type", &self.return_type)
            .finish()
    }
}

impl FunctionDef {
    /// Check the argument count, before the arguments are typed
    pub fn check_arg_count(&self, actual: usize) -> FormulaResult<()> {
        let rule = &self.args;
        if let Some(required) = rule.required {
            if required != actual {
                return Err(FormulaError::RequiredArgs {
                    function: self.name.to_string(),
                    required,
                    actual,
                });
            }
        }
        if let Some(min) = rule.min {
            if actual < min {
                return Err(FormulaError::MinArgs {
                    function: self.name.to_string(),
                    min,
                    actual,
                });
            }
        }
        if let Some(max) = rule.max {
            if actual > max {
                return Err(FormulaError::MaxArgs {
                    function: self.name.to_string(),
                    max,
                    actual,
                });
            }
        }
        Ok(())
    }

    /// Check the typed arguments against the custom validator or, failing
    /// that, the uniform argument type
    pub fn check_args(&self, args: &[FormulaExpr]) -> FormulaResult<()> {
        if let Some(validator) = self.validator {
            return validator(self.name, args);
        }
        if let Some(expected) = self.args.arg_type {
            for arg in args {
                expect_type(self.name, arg, expected)?;
            }
        }
        Ok(())
    }

    /// Result type of a call with these typed arguments
    pub fn return_type(&self, args: &[FormulaExpr]) -> FormulaDataType {
        match self.return_type {
            ReturnType::Fixed(t) => t,
            ReturnType::Computed(rule) => rule(args),
        }
    }
}

/// Fail with `TYPE_MISMATCH` unless `arg` satisfies `expected`
pub(crate) fn expect_type(
    function: &str,
    arg: &FormulaExpr,
    expected: FormulaDataType,
) -> FormulaResult<()> {
    let actual = arg.data_type.unwrap_or(FormulaDataType::Unknown);
    if actual.satisfies(expected) {
        return Ok(());
    }
    Err(FormulaError::TypeMismatch {
        function: function.to_string(),
        column: column_label(arg),
        expected,
        actual,
    })
}

/// Column name as the user wrote it, for error messages
fn column_label(arg: &FormulaExpr) -> Option<String> {
    match &arg.kind {
        ExprKind::Identifier(ident) if !ident.raw.is_empty() => Some(
            ident
                .raw
                .trim_start_matches('{')
                .trim_end_matches('}')
                .to_string(),
        ),
        ExprKind::Identifier(ident) => Some(ident.name.clone()),
        _ => None,
    }
}

/// Function registry
pub struct FunctionRegistry {
    functions: AHashMap<String, FunctionDef>,
}

impl FunctionRegistry {
    /// Create a new registry with all built-in functions
    pub fn new() -> Self {
        let mut registry = Self {
            functions: AHashMap::new(),
        };

        registry.register_math_functions();
        registry.register_text_functions();
        registry.register_date_functions();
        registry.register_logical_functions();
        registry.register_statistical_functions();
        registry.register_info_functions();

        registry
    }

    /// Look up a function by name (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(&name.to_uppercase())
    }

    /// Register a function
    pub fn register(&mut self, def: FunctionDef) {
        self.functions.insert(def.name.to_uppercase(), def);
    }

    /// All functions, sorted by name
    pub fn iter(&self) -> impl Iterator<Item = &FunctionDef> {
        let mut defs: Vec<&FunctionDef> = self.functions.values().collect();
        defs.sort_by_key(|def| def.name);
        defs.into_iter()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    fn register_math_functions(&mut self) {
        use FormulaDataType::Numeric;

        self.register(FunctionDef {
            name: "AVG",
            args: ArgRule::at_least(1).of(Numeric),
            validator: None,
            return_type: ReturnType::Fixed(Numeric),
            description: "Average of input parameters",
            syntax: "AVG(value1, [value2, ...])",
            examples: &["AVG(10, 5) => 7.5", "AVG({column1}, {column2})"],
        });

        self.register(FunctionDef {
            name: "ADD",
            args: ArgRule::at_least(1).of(Numeric),
            validator: None,
            return_type: ReturnType::Fixed(Numeric),
            description: "Sum of input parameters",
            syntax: "ADD(value1, [value2, ...])",
            examples: &["ADD(5, 5) => 10", "ADD({column1}, {column2})"],
        });

        self.register(FunctionDef {
            name: "MIN",
            args: ArgRule::at_least(1).of(Numeric),
            validator: None,
            return_type: ReturnType::Fixed(Numeric),
            description: "Minimum value amongst input parameters",
            syntax: "MIN(value1, [value2, ...])",
            examples: &["MIN(1000, 2000) => 1000", "MIN({column1}, {column2})"],
        });

        self.register(FunctionDef {
            name: "MAX",
            args: ArgRule::at_least(1).of(Numeric),
            validator: None,
            return_type: ReturnType::Fixed(Numeric),
            description: "Maximum value amongst input parameters",
            syntax: "MAX(value1, [value2, ...])",
            examples: &["MAX(1000, 2000) => 2000", "MAX({column1}, {column2})"],
        });

        // Single-argument rounding and sign functions
        let unary: [(&'static str, &'static str, &'static str, &'static [&'static str]); 7] = [
            (
                "CEILING",
                "Rounded next largest integer value of input parameter",
                "CEILING(value)",
                &["CEILING(1.01) => 2", "CEILING({column1})"],
            ),
            (
                "FLOOR",
                "Rounded largest integer less than or equal to input parameter",
                "FLOOR(value)",
                &["FLOOR(3.1415) => 3", "FLOOR({column1})"],
            ),
            (
                "SQRT",
                "Square root of the input parameter",
                "SQRT(value)",
                &["SQRT(100) => 10", "SQRT({column1})"],
            ),
            (
                "ABS",
                "Absolute value of the input parameter",
                "ABS(value)",
                &["ABS({column1})"],
            ),
            (
                "INT",
                "Integer value of input parameter",
                "INT(value)",
                &["INT(3.1415) => 3", "INT({column1})"],
            ),
            (
                "EVEN",
                "Nearest even integer that is greater than or equal to the input parameter",
                "EVEN(value)",
                &["EVEN({column})"],
            ),
            (
                "ODD",
                "Nearest odd integer that is greater than or equal to the input parameter",
                "ODD(value)",
                &["ODD({column})"],
            ),
        ];
        for (name, description, syntax, examples) in unary {
            self.register(FunctionDef {
                name,
                args: ArgRule::exactly(1).of(Numeric),
                validator: None,
                return_type: ReturnType::Fixed(Numeric),
                description,
                syntax,
                examples,
            });
        }

        self.register(FunctionDef {
            name: "ROUND",
            args: ArgRule::between(1, 2).of(Numeric),
            validator: None,
            return_type: ReturnType::Fixed(Numeric),
            description: "Number rounded to the given decimal places, or to an integer",
            syntax: "ROUND(value, [precision])",
            examples: &["ROUND(3.1415) => 3", "ROUND(3.1415, 2) => 3.14"],
        });

        self.register(FunctionDef {
            name: "ROUNDDOWN",
            args: ArgRule::between(1, 2).of(Numeric),
            validator: None,
            return_type: ReturnType::Fixed(Numeric),
            description: "Number rounded down to the given decimal places",
            syntax: "ROUNDDOWN(value, [precision])",
            examples: &["ROUNDDOWN({field1})", "ROUNDDOWN({field1}, 2)"],
        });

        self.register(FunctionDef {
            name: "ROUNDUP",
            args: ArgRule::between(1, 2).of(Numeric),
            validator: None,
            return_type: ReturnType::Fixed(Numeric),
            description: "Number rounded up to the given decimal places",
            syntax: "ROUNDUP(value, [precision])",
            examples: &["ROUNDUP({field1})", "ROUNDUP({field1}, 2)"],
        });

        self.register(FunctionDef {
            name: "MOD",
            args: ArgRule::exactly(2).of(Numeric),
            validator: None,
            return_type: ReturnType::Fixed(Numeric),
            description: "Remainder after integer division of input parameters",
            syntax: "MOD(value1, value2)",
            examples: &["MOD(1024, 1000) => 24", "MOD({column}, 2)"],
        });

        self.register(FunctionDef {
            name: "POWER",
            args: ArgRule::exactly(2).of(Numeric),
            validator: None,
            return_type: ReturnType::Fixed(Numeric),
            description: "Base raised to the exponent power",
            syntax: "POWER(base, exponent)",
            examples: &["POWER(2, 10) => 1024", "POWER({column1}, 10)"],
        });

        self.register(FunctionDef {
            name: "LOG",
            args: ArgRule::any().of(Numeric),
            validator: None,
            return_type: ReturnType::Fixed(Numeric),
            description: "Logarithm of the input parameter to the base (default = e)",
            syntax: "LOG([base], value)",
            examples: &["LOG(2, 1024) => 10", "LOG(2, {column1})"],
        });

        self.register(FunctionDef {
            name: "EXP",
            args: ArgRule::any().of(Numeric),
            validator: None,
            return_type: ReturnType::Fixed(Numeric),
            description: "Exponential value of the input parameter (e ^ power)",
            syntax: "EXP(power)",
            examples: &["EXP(1) => 2.718281828459045", "EXP({column1})"],
        });

        self.register(FunctionDef {
            name: "VALUE",
            args: ArgRule::exactly(1),
            validator: None,
            return_type: ReturnType::Fixed(Numeric),
            description: "Numeric value extracted from a string, honouring `%` and `-`",
            syntax: "VALUE(value)",
            examples: &["VALUE({field})", "VALUE(\"$10000\")"],
        });
    }

    fn register_text_functions(&mut self) {
        use FormulaDataType::{Numeric, String};

        self.register(FunctionDef {
            name: "CONCAT",
            args: ArgRule::at_least(1).of(String),
            validator: None,
            return_type: ReturnType::Fixed(String),
            description: "Concatenated string of input parameters",
            syntax: "CONCAT(str1, [str2, ...])",
            examples: &["CONCAT(\"AA\", \"BB\", \"CC\") => \"AABBCC\""],
        });

        self.register(FunctionDef {
            name: "TRIM",
            args: ArgRule::exactly(1).of(String),
            validator: None,
            return_type: ReturnType::Fixed(String),
            description: "Input parameter without leading and trailing whitespace",
            syntax: "TRIM(str)",
            examples: &["TRIM(\" HELLO WORLD \") => \"HELLO WORLD\"", "TRIM({column1})"],
        });

        self.register(FunctionDef {
            name: "UPPER",
            args: ArgRule::exactly(1).of(String),
            validator: None,
            return_type: ReturnType::Fixed(String),
            description: "Upper case converted string of input parameter",
            syntax: "UPPER(str)",
            examples: &["UPPER(\"duke\") => \"DUKE\"", "UPPER({column1})"],
        });

        self.register(FunctionDef {
            name: "LOWER",
            args: ArgRule::exactly(1).of(String),
            validator: None,
            return_type: ReturnType::Fixed(String),
            description: "Lower case converted string of input parameter",
            syntax: "LOWER(str)",
            examples: &["LOWER(\"DUKE\") => \"duke\"", "LOWER({column1})"],
        });

        self.register(FunctionDef {
            name: "URL",
            args: ArgRule::exactly(1).of(String),
            validator: None,
            return_type: ReturnType::Fixed(String),
            description: "Hyperlink of the input if it is a valid URL",
            syntax: "URL(str)",
            examples: &["URL(\"https://example.com\")", "URL({column1})"],
        });

        self.register(FunctionDef {
            name: "LEN",
            args: ArgRule::exactly(1).of(String),
            validator: None,
            return_type: ReturnType::Fixed(Numeric),
            description: "Character length of the input parameter",
            syntax: "LEN(value)",
            examples: &["LEN(\"Duke\") => 4", "LEN({column1})"],
        });

        self.register(FunctionDef {
            name: "REPEAT",
            args: ArgRule::exactly(2),
            validator: Some(text::validate_string_then_numbers),
            return_type: ReturnType::Fixed(String),
            description: "Input string repeated the given number of times",
            syntax: "REPEAT(str, count)",
            examples: &["REPEAT(\"A\", 5) => \"AAAAA\"", "REPEAT({column}, 5)"],
        });

        self.register(FunctionDef {
            name: "LEFT",
            args: ArgRule::exactly(2),
            validator: Some(text::validate_string_then_numbers),
            return_type: ReturnType::Fixed(String),
            description: "First n characters of the input string",
            syntax: "LEFT(str, n)",
            examples: &["LEFT(\"ABCD\", 2) => \"AB\"", "LEFT({column1}, 2)"],
        });

        self.register(FunctionDef {
            name: "RIGHT",
            args: ArgRule::exactly(2),
            validator: Some(text::validate_string_then_numbers),
            return_type: ReturnType::Fixed(String),
            description: "Last n characters of the input string",
            syntax: "RIGHT(str, n)",
            examples: &["RIGHT(\"HELLO WORLD\", 5) => \"WORLD\"", "RIGHT({column1}, 3)"],
        });

        self.register(FunctionDef {
            name: "SUBSTR",
            args: ArgRule::between(2, 3),
            validator: Some(text::validate_string_then_numbers),
            return_type: ReturnType::Fixed(String),
            description: "Substring of length n from the given position",
            syntax: "SUBSTR(str, position, [n])",
            examples: &[
                "SUBSTR(\"HELLO WORLD\", 7) => \"WORLD\"",
                "SUBSTR(\"HELLO WORLD\", 7, 3) => \"WOR\"",
            ],
        });

        self.register(FunctionDef {
            name: "MID",
            args: ArgRule::exactly(3),
            validator: Some(text::validate_string_then_numbers),
            return_type: ReturnType::Fixed(String),
            description: "Alias for SUBSTR",
            syntax: "MID(str, position, count)",
            examples: &["MID(\"Duke\", 2, 2) => \"uk\"", "MID({column1}, 3, 2)"],
        });

        self.register(FunctionDef {
            name: "REPLACE",
            args: ArgRule::exactly(3).of(String),
            validator: None,
            return_type: ReturnType::Fixed(String),
            description: "String with every occurrence of srchStr replaced by rplcStr",
            syntax: "REPLACE(str, srchStr, rplcStr)",
            examples: &["REPLACE(\"AABBCC\", \"AA\", \"BB\") => \"BBBBCC\""],
        });

        self.register(FunctionDef {
            name: "SEARCH",
            args: ArgRule::exactly(2).of(String),
            validator: None,
            return_type: ReturnType::Fixed(Numeric),
            description: "Index of srchStr if found, 0 otherwise",
            syntax: "SEARCH(str, srchStr)",
            examples: &["SEARCH(\"HELLO WORLD\", \"WORLD\") => 7"],
        });

        self.register(FunctionDef {
            name: "REGEX_MATCH",
            args: ArgRule::exactly(2).of(String),
            validator: Some(text::validate_regex_args),
            return_type: ReturnType::Fixed(Numeric),
            description: "1 if the input text matches a regular expression, 0 otherwise",
            syntax: "REGEX_MATCH(string, regex)",
            examples: &["REGEX_MATCH({title}, \"abc.*\")"],
        });

        self.register(FunctionDef {
            name: "REGEX_EXTRACT",
            args: ArgRule::exactly(2).of(String),
            validator: Some(text::validate_regex_args),
            return_type: ReturnType::Fixed(String),
            description: "First match of a regular expression in a string",
            syntax: "REGEX_EXTRACT(string, regex)",
            examples: &["REGEX_EXTRACT({title}, \"abc.*\")"],
        });

        self.register(FunctionDef {
            name: "REGEX_REPLACE",
            args: ArgRule::exactly(3).of(String),
            validator: Some(text::validate_regex_args),
            return_type: ReturnType::Fixed(String),
            description: "String with every match of a regular expression replaced",
            syntax: "REGEX_REPLACE(string, regex, replacement)",
            examples: &["REGEX_REPLACE({title}, \"abc.*\", \"abcd\")"],
        });
    }

    fn register_date_functions(&mut self) {
        use FormulaDataType::{Date, Numeric, String};

        self.register(FunctionDef {
            name: "NOW",
            args: ArgRule::exactly(0).of(Date),
            validator: None,
            return_type: ReturnType::Fixed(Date),
            description: "Current date and time",
            syntax: "NOW()",
            examples: &["NOW() => 2022-05-19 17:20:43"],
        });

        self.register(FunctionDef {
            name: "DATEADD",
            args: ArgRule::exactly(3).of(Date),
            validator: Some(date::validate_dateadd),
            return_type: ReturnType::Fixed(Date),
            description: "Date with \"count\" units added",
            syntax: "DATEADD(date | datetime, value, [\"day\" | \"week\" | \"month\" | \"year\"])",
            examples: &[
                "DATEADD({column1}, 2, \"day\")",
                "DATEADD({column1}, -2, \"week\")",
                "DATEADD({column1}, 2, \"month\")",
            ],
        });

        self.register(FunctionDef {
            name: "DATETIME_DIFF",
            args: ArgRule::between(2, 3).of(Date),
            validator: Some(date::validate_datetime_diff),
            return_type: ReturnType::Fixed(Numeric),
            description: "Difference of two dates or datetimes in the given unit",
            syntax: "DATETIME_DIFF(date | datetime, date | datetime, [unit])",
            examples: &[
                "DATETIME_DIFF({column1}, {column2})",
                "DATETIME_DIFF({column1}, {column2}, \"seconds\")",
                "DATETIME_DIFF({column1}, {column2}, \"d\")",
            ],
        });

        self.register(FunctionDef {
            name: "WEEKDAY",
            args: ArgRule::between(1, 2).of(Numeric),
            validator: Some(date::validate_weekday),
            return_type: ReturnType::Fixed(Numeric),
            description: "Day of the week as an integer from 0 to 6, starting from Monday by default",
            syntax: "WEEKDAY(date, [startDayOfWeek])",
            examples: &["WEEKDAY(\"2021-06-09\")", "WEEKDAY(NOW(), \"sunday\")"],
        });

        self.register(FunctionDef {
            name: "DATESTR",
            args: ArgRule::exactly(1),
            validator: None,
            return_type: ReturnType::Fixed(String),
            description: "Datetime formatted as a string (YYYY-MM-DD)",
            syntax: "DATESTR(date)",
            examples: &["DATESTR({column1})"],
        });

        self.register(FunctionDef {
            name: "DAY",
            args: ArgRule::exactly(1),
            validator: None,
            return_type: ReturnType::Fixed(String),
            description: "Day of a date (1-31)",
            syntax: "DAY(date)",
            examples: &["DAY({column1})"],
        });

        self.register(FunctionDef {
            name: "MONTH",
            args: ArgRule::exactly(1),
            validator: None,
            return_type: ReturnType::Fixed(String),
            description: "Month of a date (1-12)",
            syntax: "MONTH(date)",
            examples: &["MONTH({column1})"],
        });

        self.register(FunctionDef {
            name: "HOUR",
            args: ArgRule::exactly(1),
            validator: None,
            return_type: ReturnType::Fixed(String),
            description: "Hour of a datetime (0-23)",
            syntax: "HOUR(datetime)",
            examples: &["HOUR({column1})"],
        });
    }

    fn register_logical_functions(&mut self) {
        use FormulaDataType::{Boolean, ConditionalExpression, Null, Numeric};

        self.register(FunctionDef {
            name: "IF",
            args: ArgRule::between(2, 3),
            validator: None,
            return_type: ReturnType::Computed(logical::if_return_type),
            description: "successCase if expr evaluates to TRUE, elseCase otherwise",
            syntax: "IF(expr, successCase, [elseCase])",
            examples: &["IF(5 > 1, \"YES\", \"NO\") => \"YES\"", "IF({column} > 1, \"YES\", \"NO\")"],
        });

        self.register(FunctionDef {
            name: "SWITCH",
            args: ArgRule::at_least(3),
            validator: None,
            return_type: ReturnType::Computed(logical::switch_return_type),
            description: "Value of the first pattern matching expr, or the default",
            syntax: "SWITCH(expr, [pattern, value, ..., default])",
            examples: &[
                "SWITCH(1, 1, \"One\", 2, \"Two\", \"N/A\") => \"One\"",
                "SWITCH({column1}, 1, \"One\", 2, \"Two\", \"N/A\")",
            ],
        });

        self.register(FunctionDef {
            name: "AND",
            args: ArgRule::at_least(1),
            validator: None,
            return_type: ReturnType::Fixed(ConditionalExpression),
            description: "TRUE if all expr evaluate to TRUE",
            syntax: "AND(expr1, [expr2, ...])",
            examples: &["AND(5 > 2, 5 < 10) => 1", "AND({column1} > 2, {column2} < 10)"],
        });

        self.register(FunctionDef {
            name: "OR",
            args: ArgRule::at_least(1),
            validator: None,
            return_type: ReturnType::Fixed(ConditionalExpression),
            description: "TRUE if at least one expr evaluates to TRUE",
            syntax: "OR(expr1, [expr2, ...])",
            examples: &["OR(5 > 2, 5 < 10) => 1", "OR({column1} > 2, {column2} < 10)"],
        });

        self.register(FunctionDef {
            name: "XOR",
            args: ArgRule::at_least(1),
            validator: None,
            return_type: ReturnType::Fixed(Boolean),
            description: "TRUE if an odd number of arguments are TRUE",
            syntax: "XOR(expression, [exp2, ...])",
            examples: &["XOR(TRUE(), FALSE(), TRUE())"],
        });

        self.register(FunctionDef {
            name: "TRUE",
            args: ArgRule::at_most(0),
            validator: None,
            return_type: ReturnType::Fixed(Numeric),
            description: "Returns 1",
            syntax: "TRUE()",
            examples: &["TRUE()"],
        });

        self.register(FunctionDef {
            name: "FALSE",
            args: ArgRule::at_most(0),
            validator: None,
            return_type: ReturnType::Fixed(Numeric),
            description: "Returns 0",
            syntax: "FALSE()",
            examples: &["FALSE()"],
        });

        self.register(FunctionDef {
            name: "BLANK",
            args: ArgRule::exactly(0),
            validator: None,
            return_type: ReturnType::Fixed(Null),
            description: "Blank value (null)",
            syntax: "BLANK()",
            examples: &["BLANK()"],
        });
    }

    fn register_statistical_functions(&mut self) {
        use FormulaDataType::Numeric;

        self.register(FunctionDef {
            name: "COUNTA",
            args: ArgRule::at_least(1),
            validator: None,
            return_type: ReturnType::Fixed(Numeric),
            description: "Number of non-empty arguments",
            syntax: "COUNTA(value1, [value2, ...])",
            examples: &["COUNTA({field1}, {field2})"],
        });

        self.register(FunctionDef {
            name: "COUNT",
            args: ArgRule::at_least(1),
            validator: None,
            return_type: ReturnType::Fixed(Numeric),
            description: "Number of arguments that are numbers",
            syntax: "COUNT(value1, [value2, ...])",
            examples: &["COUNT({field1}, {field2})"],
        });

        self.register(FunctionDef {
            name: "COUNTALL",
            args: ArgRule::at_least(1),
            validator: None,
            return_type: ReturnType::Fixed(Numeric),
            description: "Number of arguments",
            syntax: "COUNTALL(value1, [value2, ...])",
            examples: &["COUNTALL({field1}, {field2})"],
        });
    }

    fn register_info_functions(&mut self) {
        self.register(FunctionDef {
            name: "RECORD_ID",
            args: ArgRule::exactly(0),
            validator: None,
            return_type: ReturnType::Fixed(FormulaDataType::String),
            description: "Record id of the current record",
            syntax: "RECORD_ID()",
            examples: &["RECORD_ID()"],
        });
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static FUNCTION_REGISTRY: OnceLock<FunctionRegistry> = OnceLock::new();

/// The process-wide registry of built-in functions
pub fn registry() -> &'static FunctionRegistry {
    FUNCTION_REGISTRY.get_or_init(FunctionRegistry::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(expr: FormulaExpr, t: FormulaDataType) -> FormulaExpr {
        expr.with_type(t)
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let reg = registry();
        assert_eq!(reg.get("concat").map(|d| d.name), Some("CONCAT"));
        assert_eq!(reg.get("Regex_Match").map(|d| d.name), Some("REGEX_MATCH"));
        assert!(reg.get("SUM").is_none());
    }

    #[test]
    fn test_catalog_size() {
        assert_eq!(registry().len(), 55);
        let names: Vec<&str> = registry().iter().map(|d| d.name).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_arg_count_order() {
        let left = registry().get("LEFT").unwrap();
        assert!(matches!(
            left.check_arg_count(1),
            Err(FormulaError::RequiredArgs { required: 2, actual: 1, .. })
        ));

        let round = registry().get("ROUND").unwrap();
        assert!(matches!(
            round.check_arg_count(0),
            Err(FormulaError::MinArgs { min: 1, .. })
        ));
        assert!(matches!(
            round.check_arg_count(3),
            Err(FormulaError::MaxArgs { max: 2, .. })
        ));
        assert!(round.check_arg_count(2).is_ok());

        // LOG carries no count constraints
        assert!(registry().get("LOG").unwrap().check_arg_count(0).is_ok());
    }

    #[test]
    fn test_uniform_type_check() {
        let abs = registry().get("ABS").unwrap();
        assert!(abs
            .check_args(&[typed(FormulaExpr::number(1.0), FormulaDataType::Numeric)])
            .is_ok());
        assert!(abs
            .check_args(&[typed(FormulaExpr::null(), FormulaDataType::Null)])
            .is_ok());
        assert!(abs
            .check_args(&[typed(FormulaExpr::column("x"), FormulaDataType::Unknown)])
            .is_ok());

        let err = abs
            .check_args(&[typed(FormulaExpr::column("Title"), FormulaDataType::String)])
            .unwrap_err();
        match err {
            FormulaError::TypeMismatch {
                function,
                column,
                expected,
                actual,
            } => {
                assert_eq!(function, "ABS");
                assert_eq!(column.as_deref(), Some("Title"));
                assert_eq!(expected, FormulaDataType::Numeric);
                assert_eq!(actual, FormulaDataType::String);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_fixed_return_types() {
        let reg = registry();
        assert_eq!(reg.get("LEN").unwrap().return_type(&[]), FormulaDataType::Numeric);
        assert_eq!(reg.get("BLANK").unwrap().return_type(&[]), FormulaDataType::Null);
        assert_eq!(
            reg.get("AND").unwrap().return_type(&[]),
            FormulaDataType::ConditionalExpression
        );
        assert_eq!(reg.get("XOR").unwrap().return_type(&[]), FormulaDataType::Boolean);
    }
}
