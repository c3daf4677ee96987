use std::fmt;

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::errors::{CardError, Result};
use crate::fields::{FieldRandomizer, FieldValue};
use crate::luhn;

pub const MIN_PREFIX_LEN: usize = 6;
pub const MAX_PREFIX_LEN: usize = 15;
pub const DEFAULT_CARD_LENGTH: usize = 16;
pub const AMEX_CARD_LENGTH: usize = 15;

/// Everything needed to synthesize one card record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationSpec {
    pub prefix: String,
    pub length: usize,
    pub exp_month: FieldValue,
    pub exp_year: FieldValue,
    pub cvv: FieldValue,
}

impl GenerationSpec {
    /// Spec with every sub-field left to the randomizer.
    pub fn random(prefix: impl Into<String>, length: usize) -> Self {
        Self {
            prefix: prefix.into(),
            length,
            exp_month: FieldValue::Wildcard,
            exp_year: FieldValue::Wildcard,
            cvv: FieldValue::Wildcard,
        }
    }

    /// The leading six digits used for catalog lookups.
    pub fn bin(&self) -> &str {
        truncate_bin(&self.prefix)
    }
}

/// A synthesized test card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardRecord {
    pub number: String,
    pub exp_month: String,
    pub exp_year: String,
    pub cvv: String,
}

impl CardRecord {
    pub fn fields(&self) -> [&str; 4] {
        [
            self.number.as_str(),
            self.exp_month.as_str(),
            self.exp_year.as_str(),
            self.cvv.as_str(),
        ]
    }
}

impl fmt::Display for CardRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|{}|{}",
            self.number, self.exp_month, self.exp_year, self.cvv
        )
    }
}

/// First six characters of `value`, or all of it when shorter.
pub fn truncate_bin(value: &str) -> &str {
    match value.char_indices().nth(MIN_PREFIX_LEN) {
        Some((end, _)) => &value[..end],
        None => value,
    }
}

/// Card number length implied by the brand, or by the prefix when the brand is unknown.
pub fn card_length_for(prefix: &str, brand: Option<&str>) -> usize {
    let fifteen = match brand {
        Some(brand) => {
            let brand = brand.trim().to_ascii_uppercase();
            brand == "AMEX" || brand == "AMERICAN EXPRESS"
        }
        None => prefix.starts_with("34") || prefix.starts_with("37"),
    };
    if fifteen {
        AMEX_CARD_LENGTH
    } else {
        DEFAULT_CARD_LENGTH
    }
}

/// Build one Luhn-valid record from `spec`.
pub fn synthesize(
    spec: &GenerationSpec,
    randomizer: &FieldRandomizer,
    rng: &mut dyn RngCore,
) -> Result<CardRecord> {
    let mut digits = luhn::digits_of(&spec.prefix)
        .filter(|digits| !digits.is_empty())
        .ok_or_else(|| CardError::validation("bin", "BIN must contain only digits"))?;
    if digits.len() >= spec.length {
        return Err(CardError::PrefixTooLong {
            prefix: spec.prefix.clone(),
            length: spec.length,
        });
    }

    digits.reserve(spec.length - digits.len());
    while digits.len() < spec.length - 1 {
        digits.push(rng.random_range(0..=9u8));
    }
    let check = luhn::check_digit(&digits);
    digits.push(check);

    let number = digits.iter().map(|digit| char::from(b'0' + digit)).collect();
    let (exp_month, exp_year) = randomizer.expiration(&spec.exp_month, &spec.exp_year, rng);
    let cvv = randomizer.cvv(&spec.cvv, rng);

    Ok(CardRecord {
        number,
        exp_month,
        exp_year,
        cvv,
    })
}
