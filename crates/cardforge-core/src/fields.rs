use chrono::{Datelike, Utc};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

/// Sentinel that marks a month or year segment as random.
pub const DATE_WILDCARD: &str = "xx";
/// Sentinels that mark a CVV segment as random.
pub const CVV_WILDCARDS: &[&str] = &["xxx", "xxxx"];

/// A record field that is either fixed by the caller or left to the randomizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Literal(String),
    Wildcard,
}

impl FieldValue {
    pub fn literal(value: impl Into<String>) -> Self {
        FieldValue::Literal(value.into())
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, FieldValue::Wildcard)
    }

    pub fn as_literal(&self) -> Option<&str> {
        match self {
            FieldValue::Literal(value) => Some(value.as_str()),
            FieldValue::Wildcard => None,
        }
    }
}

/// Closed range of expiration years, as full calendar years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearWindow {
    pub min: i32,
    pub max: i32,
}

impl YearWindow {
    pub fn new(min: i32, max: i32) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// Window anchored on the current UTC year.
    pub fn from_offsets(min_offset: u16, max_offset: u16) -> Self {
        let year = Utc::now().year();
        Self::new(year + i32::from(min_offset), year + i32::from(max_offset))
    }
}

impl Default for YearWindow {
    fn default() -> Self {
        Self::from_offsets(0, 7)
    }
}

/// Resolves expiration and CVV fields, honoring caller literals.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldRandomizer {
    years: YearWindow,
}

impl FieldRandomizer {
    pub fn new(years: YearWindow) -> Self {
        Self { years }
    }

    pub fn years(&self) -> YearWindow {
        self.years
    }

    /// Returns `(month, year)`; literals are passed through untouched.
    pub fn expiration(
        &self,
        month: &FieldValue,
        year: &FieldValue,
        rng: &mut dyn RngCore,
    ) -> (String, String) {
        let month = match month {
            FieldValue::Literal(value) => value.clone(),
            FieldValue::Wildcard => format!("{:02}", rng.random_range(1..=12u8)),
        };
        let year = match year {
            FieldValue::Literal(value) => value.clone(),
            FieldValue::Wildcard => {
                let full = rng.random_range(self.years.min..=self.years.max);
                format!("{:02}", full.rem_euclid(100))
            }
        };
        (month, year)
    }

    pub fn cvv(&self, value: &FieldValue, rng: &mut dyn RngCore) -> String {
        match value {
            FieldValue::Literal(value) => value.clone(),
            FieldValue::Wildcard => format!("{:03}", rng.random_range(0..=999u16)),
        }
    }
}
