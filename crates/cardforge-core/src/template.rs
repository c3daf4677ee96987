//! Validation of user-supplied generation arguments.
//!
//! A literal template pins any of the record's sub-fields, for example
//! `411111|12|29|123` or `411111|xx|xx|xxx`. Only one segment layout is
//! accepted per deployment, selected by [`LiteralShape`].

use serde::{Deserialize, Serialize};

use crate::errors::{CardError, Result};
use crate::fields::{CVV_WILDCARDS, DATE_WILDCARD, FieldValue};
use crate::synth::{
    AMEX_CARD_LENGTH, GenerationSpec, MAX_PREFIX_LEN, MIN_PREFIX_LEN, card_length_for,
    truncate_bin,
};

pub const SEGMENT_SEPARATOR: char = '|';

/// Segment layout accepted for literal templates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiteralShape {
    /// `prefix|MM|YY|CVV`
    #[default]
    Full,
    /// `prefix|MM|YYYY|CVV`
    FullLongYear,
    /// `prefix|MM|CVV`, year always random.
    Short,
}

impl LiteralShape {
    pub fn usage(&self) -> &'static str {
        match self {
            LiteralShape::Full => "<bin>|<MM|xx>|<YY|xx>|<cvv|xxx>",
            LiteralShape::FullLongYear => "<bin>|<MM|xx>|<YYYY|xx>|<cvv|xxx>",
            LiteralShape::Short => "<bin>|<MM|xx>|<cvv|xxx>",
        }
    }

    fn segments(&self) -> usize {
        match self {
            LiteralShape::Full | LiteralShape::FullLongYear => 4,
            LiteralShape::Short => 3,
        }
    }
}

/// A validated literal template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardTemplate {
    pub prefix: String,
    pub exp_month: FieldValue,
    pub exp_year: FieldValue,
    pub cvv: FieldValue,
}

impl CardTemplate {
    pub fn bin(&self) -> &str {
        truncate_bin(&self.prefix)
    }

    pub fn into_spec(self, length: usize) -> GenerationSpec {
        GenerationSpec {
            prefix: self.prefix,
            length,
            exp_month: self.exp_month,
            exp_year: self.exp_year,
            cvv: self.cvv,
        }
    }
}

pub fn is_template(arg: &str) -> bool {
    arg.contains(SEGMENT_SEPARATOR)
}

/// Parse a literal template in the given layout.
pub fn parse_template(raw: &str, shape: LiteralShape) -> Result<CardTemplate> {
    let segments: Vec<&str> = raw.split(SEGMENT_SEPARATOR).map(str::trim).collect();
    if segments.len() != shape.segments() {
        return Err(CardError::validation(
            "template",
            format!(
                "expected {} segments ({}), got {}",
                shape.segments(),
                shape.usage(),
                segments.len()
            ),
        ));
    }

    let prefix = parse_prefix(segments[0])?;
    let exp_month = parse_month(segments[1])?;
    let (exp_year, cvv_raw) = match shape {
        LiteralShape::Full => (parse_year(segments[2], 2)?, segments[3]),
        LiteralShape::FullLongYear => (parse_year(segments[2], 4)?, segments[3]),
        LiteralShape::Short => (FieldValue::Wildcard, segments[2]),
    };
    let cvv = parse_cvv(cvv_raw, &prefix)?;

    Ok(CardTemplate {
        prefix,
        exp_month,
        exp_year,
        cvv,
    })
}

/// A standalone BIN argument: first six characters, all digits.
pub fn parse_bin_arg(raw: &str) -> Result<String> {
    let bin = truncate_bin(raw.trim());
    if bin.len() != MIN_PREFIX_LEN || !all_digits(bin) {
        return Err(CardError::validation("bin", "BIN must be at least 6 digits"));
    }
    Ok(bin.to_string())
}

/// A positive batch size no larger than `max`.
pub fn parse_count(raw: &str, max: usize) -> Result<usize> {
    let count: usize = raw
        .trim()
        .parse()
        .map_err(|_| CardError::validation("amount", "amount should be a number"))?;
    if count == 0 {
        return Err(CardError::validation("amount", "amount must be at least 1"));
    }
    if count > max {
        return Err(CardError::validation(
            "amount",
            format!("amount must not exceed {max}"),
        ));
    }
    Ok(count)
}

/// ISO 3166-1 alpha-2 code, upper-cased.
pub fn parse_country_arg(raw: &str) -> Result<String> {
    let code = raw.trim();
    if code.len() != 2 || !code.bytes().all(|b| b.is_ascii_alphabetic()) {
        return Err(CardError::validation(
            "country_code",
            "country code must be two letters",
        ));
    }
    Ok(code.to_ascii_uppercase())
}

fn parse_prefix(raw: &str) -> Result<String> {
    if !all_digits(raw) {
        return Err(CardError::validation("bin", "BIN must contain only digits"));
    }
    if !(MIN_PREFIX_LEN..=MAX_PREFIX_LEN).contains(&raw.len()) {
        return Err(CardError::validation(
            "bin",
            format!("BIN must be {MIN_PREFIX_LEN} to {MAX_PREFIX_LEN} digits"),
        ));
    }
    Ok(raw.to_string())
}

fn parse_month(raw: &str) -> Result<FieldValue> {
    if raw.eq_ignore_ascii_case(DATE_WILDCARD) {
        return Ok(FieldValue::Wildcard);
    }
    if raw.len() != 2 || !all_digits(raw) {
        return Err(CardError::validation(
            "month",
            "expiration month must be two digits",
        ));
    }
    match raw.parse::<u8>() {
        Ok(1..=12) => Ok(FieldValue::literal(raw)),
        _ => Err(CardError::validation(
            "month",
            "expiration month must be between 01 and 12",
        )),
    }
}

fn parse_year(raw: &str, digits: usize) -> Result<FieldValue> {
    if raw.eq_ignore_ascii_case(DATE_WILDCARD) {
        return Ok(FieldValue::Wildcard);
    }
    if raw.len() != digits || !all_digits(raw) {
        let reason = if digits == 2 {
            "expiration year must be two digits"
        } else {
            "expiration year must be four digits"
        };
        return Err(CardError::validation("year", reason));
    }
    Ok(FieldValue::literal(&raw[raw.len() - 2..]))
}

fn parse_cvv(raw: &str, prefix: &str) -> Result<FieldValue> {
    if CVV_WILDCARDS
        .iter()
        .any(|sentinel| raw.eq_ignore_ascii_case(sentinel))
    {
        return Ok(FieldValue::Wildcard);
    }
    let four_allowed = card_length_for(prefix, None) == AMEX_CARD_LENGTH;
    let len_ok = raw.len() == 3 || (four_allowed && raw.len() == 4);
    if !len_ok || !all_digits(raw) {
        let reason = if four_allowed {
            "CVV must be three or four digits"
        } else {
            "CVV must be three digits"
        };
        return Err(CardError::validation("cvv", reason));
    }
    Ok(FieldValue::literal(raw))
}

fn all_digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}
