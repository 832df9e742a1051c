//! Date/time function argument checks
//!
//! Column arguments are trusted; literal arguments are checked for shape:
//! date strings must match one of the recognised date formats, and unit or
//! weekday names must come from a fixed set.

use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveDateTime};
use duke_tables_core::{FormulaDataType, FormulaExpr, LiteralValue};
use regex::Regex;

use crate::error::{FormulaError, FormulaResult};

/// Day-first, month-first and year-first layouts, with `-`, `/` or space
const DATE_FORMATS: [&str; 9] = [
    "%d-%m-%Y", "%m-%d-%Y", "%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d", "%d %m %Y",
    "%m %d %Y", "%Y %m %d",
];

/// Year-month layouts, as (format, separator)
const MONTH_FORMATS: [(&str, &str); 2] = [("%Y-%m", "-"), ("%Y %m", " ")];

const TIME_FORMATS: [&str; 3] = ["%H:%M", "%H:%M:%S", "%H:%M:%S%.3f"];

const DATEADD_UNITS: [&str; 4] = ["day", "week", "month", "year"];

const DATETIME_DIFF_UNITS: [&str; 18] = [
    "milliseconds",
    "ms",
    "seconds",
    "s",
    "minutes",
    "m",
    "hours",
    "h",
    "days",
    "d",
    "weeks",
    "w",
    "months",
    "M",
    "quarters",
    "Q",
    "years",
    "y",
];

const WEEKDAYS: [&str; 7] = [
    "sunday",
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
];

/// Zero-padded field widths of every recognised layout; chrono alone accepts
/// `2021-6-9` and surrounding whitespace
const DATE_SHAPE: &str = concat!(
    r"^(?:[0-9]{2}[-/ ][0-9]{2}[-/ ][0-9]{4}",
    r"|[0-9]{4}[-/ ][0-9]{2}[-/ ][0-9]{2}",
    r"|[0-9]{4}[- ][0-9]{2})",
    r"(?: [0-9]{2}:[0-9]{2}(?::[0-9]{2}(?:\.[0-9]{3})?)?)?$",
);

static DATE_SHAPE_REGEX: OnceLock<Option<Regex>> = OnceLock::new();

fn has_date_shape(value: &str) -> bool {
    DATE_SHAPE_REGEX
        .get_or_init(|| Regex::new(DATE_SHAPE).ok())
        .as_ref()
        .map_or(false, |re| re.is_match(value))
}

/// Whether `value` is a date, optionally followed by a time, in one of the
/// recognised formats
pub fn is_date_string(value: &str) -> bool {
    if !has_date_shape(value) {
        return false;
    }

    let with_day = DATE_FORMATS.iter().any(|format| {
        NaiveDate::parse_from_str(value, format).is_ok()
            || TIME_FORMATS.iter().any(|time| {
                NaiveDateTime::parse_from_str(value, &format!("{} {}", format, time)).is_ok()
            })
    });
    if with_day {
        return true;
    }

    // chrono needs a day to build a date; pin year-month values to the 1st
    MONTH_FORMATS.iter().any(|(format, sep)| {
        let padded = format!("{}{}01", value, sep);
        NaiveDate::parse_from_str(&padded, &format!("{}{}%d", format, sep)).is_ok()
    })
}

/// DATEADD(date, count, unit)
pub fn validate_dateadd(function: &str, args: &[FormulaExpr]) -> FormulaResult<()> {
    if let Some(arg) = args.first() {
        literal_date(function, arg)?;
    }

    if let Some(value) = args.get(1).and_then(|a| a.as_literal()) {
        if !matches!(value, LiteralValue::Number(_)) {
            return Err(FormulaError::TypeMismatch {
                function: function.to_string(),
                column: None,
                expected: FormulaDataType::Numeric,
                actual: literal_type(value),
            });
        }
    }

    if let Some(arg) = args.get(2) {
        literal_in(function, 2, arg, &DATEADD_UNITS, false)?;
    }
    Ok(())
}

/// DATETIME_DIFF(date, date, [unit])
pub fn validate_datetime_diff(function: &str, args: &[FormulaExpr]) -> FormulaResult<()> {
    for arg in args.iter().take(2) {
        literal_date(function, arg)?;
    }
    if let Some(arg) = args.get(2) {
        literal_in(function, 2, arg, &DATETIME_DIFF_UNITS, false)?;
    }
    Ok(())
}

/// WEEKDAY(date, [startDayOfWeek])
pub fn validate_weekday(function: &str, args: &[FormulaExpr]) -> FormulaResult<()> {
    if let Some(arg) = args.first() {
        literal_date(function, arg)?;
    }
    if let Some(arg) = args.get(1) {
        literal_in(function, 1, arg, &WEEKDAYS, true)?;
    }
    Ok(())
}

/// A literal argument must be a recognised date string
fn literal_date(function: &str, arg: &FormulaExpr) -> FormulaResult<()> {
    let Some(value) = arg.as_literal() else {
        return Ok(());
    };
    match value {
        LiteralValue::String(s) if is_date_string(s) => Ok(()),
        other => Err(FormulaError::TypeMismatch {
            function: function.to_string(),
            column: None,
            expected: FormulaDataType::Date,
            actual: literal_type(other),
        }),
    }
}

/// A literal argument must be one of `allowed`
fn literal_in(
    function: &str,
    index: usize,
    arg: &FormulaExpr,
    allowed: &[&str],
    ignore_case: bool,
) -> FormulaResult<()> {
    let Some(value) = arg.as_literal() else {
        return Ok(());
    };
    let accepted = match value {
        LiteralValue::String(s) if ignore_case => {
            allowed.iter().any(|a| a.eq_ignore_ascii_case(s))
        }
        LiteralValue::String(s) => allowed.contains(&s.as_str()),
        _ => false,
    };
    if accepted {
        return Ok(());
    }
    Err(FormulaError::invalid_value(
        function,
        index,
        format!("expected one of {}", allowed.join(", ")),
    ))
}

fn literal_type(value: &LiteralValue) -> FormulaDataType {
    match value {
        LiteralValue::Number(_) => FormulaDataType::Numeric,
        LiteralValue::String(_) => FormulaDataType::String,
        LiteralValue::Boolean(_) => FormulaDataType::Boolean,
        LiteralValue::Null => FormulaDataType::Null,
    }
}
