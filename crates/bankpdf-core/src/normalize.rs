//! Cell value normalization: statement dates and amounts
//!
//! Both parsers are total. Text that does not look like a date or an amount
//! yields `None` and the caller decides what a missing value means.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

lazy_static! {
    /// Recognized date layouts, tried in order. The shape check pins the
    /// number of year digits, which chrono's `%Y` does not.
    static ref DATE_FORMATS: Vec<(Regex, &'static str)> = vec![
        (Regex::new(r"^\d{1,2}/\d{1,2}/\d{4}$").unwrap(), "%d/%m/%Y"),
        (Regex::new(r"^\d{1,2}/\d{1,2}/\d{2}$").unwrap(), "%d/%m/%y"),
        (Regex::new(r"^\d{1,2}-[A-Za-z]{3}-\d{2}$").unwrap(), "%d-%b-%y"),
        (Regex::new(r"^\d{1,2}-[A-Za-z]{3}-\d{4}$").unwrap(), "%d-%b-%Y"),
    ];
}

/// Values that mean "no amount" in statement cells
const AMOUNT_PLACEHOLDERS: &[&str] = &["", "-", "--"];

/// Largest power of ten a Decimal can scale by
const MAX_EXPONENT: i32 = 28;

/// Parse a statement date
///
/// Accepts `05/03/2024`, `05/03/24`, `05-Mar-24` and `05-Mar-2024`
/// (day first, month names case-insensitive).
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .filter(|(shape, _)| shape.is_match(text))
        .find_map(|(_, fmt)| NaiveDate::parse_from_str(text, fmt).ok())
}

/// ISO `YYYY-MM-DD` rendering of a parsed statement date
pub fn format_iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// An amount as it arrives from a cell: raw text or an already-typed number
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawAmount<'a> {
    Text(&'a str),
    Number(f64),
    Decimal(Decimal),
}

impl<'a> From<&'a str> for RawAmount<'a> {
    fn from(s: &'a str) -> Self {
        RawAmount::Text(s)
    }
}

impl<'a> From<&'a String> for RawAmount<'a> {
    fn from(s: &'a String) -> Self {
        RawAmount::Text(s.as_str())
    }
}

impl From<f64> for RawAmount<'_> {
    fn from(n: f64) -> Self {
        RawAmount::Number(n)
    }
}

impl From<Decimal> for RawAmount<'_> {
    fn from(d: Decimal) -> Self {
        RawAmount::Decimal(d)
    }
}

/// Parse a signed amount
///
/// Thousands separators are stripped before parsing. Placeholders (`""`,
/// `"-"`, `"--"`) and anything unparsable give `None`.
pub fn parse_amount<'a>(input: impl Into<RawAmount<'a>>) -> Option<Decimal> {
    match input.into() {
        RawAmount::Decimal(d) => Some(d),
        RawAmount::Number(n) => Decimal::from_f64(n),
        RawAmount::Text(text) => parse_amount_text(text),
    }
}

fn parse_amount_text(text: &str) -> Option<Decimal> {
    let cleaned = text.replace(',', "");
    let cleaned = cleaned.trim();
    if AMOUNT_PLACEHOLDERS.contains(&cleaned) {
        return None;
    }

    if let Ok(d) = Decimal::from_str(cleaned) {
        return Some(d);
    }

    parse_scientific(cleaned)
}

/// `1.5e3` style amounts, with the exponent bounded so scaling cannot overflow
fn parse_scientific(text: &str) -> Option<Decimal> {
    let (mantissa, exponent) = text.split_once(['e', 'E'])?;
    let mantissa = Decimal::from_str(mantissa).ok()?;
    let exponent: i32 = exponent.parse().ok()?;
    if exponent.abs() > MAX_EXPONENT {
        return None;
    }

    let mut value = mantissa;
    for _ in 0..exponent.abs() {
        value = if exponent > 0 {
            value.checked_mul(Decimal::TEN)?
        } else {
            value.checked_div(Decimal::TEN)?
        };
    }
    Some(value)
}
