//! Signed in-fiction money value with compact rendering.

use std::{
    cmp::Ordering,
    fmt,
    iter::Sum,
    ops::{Add, Neg, Sub},
};

use serde::{Deserialize, Serialize};

use crate::DomainError;

const THOUSAND: f64 = 1_000.0;
const MILLION: f64 = 1_000_000.0;
const GROUPING_SEPARATOR: char = ',';
const COMPACT_DECIMAL_SEPARATOR: &str = ",";
const PLAIN_PRECISION: usize = 3;

/// Immutable amount of credits. Every operation returns a new value.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credits(f64);

impl Credits {
    pub const ZERO: Credits = Credits(0.0);

    pub fn new(value: f64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0.0
    }

    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    pub fn add(&self, other: Credits) -> Self {
        Self(self.0 + other.0)
    }

    pub fn subtract(&self, other: Credits) -> Self {
        Self(self.0 - other.0)
    }

    pub fn multiply(&self, factor: f64) -> Self {
        Self(self.0 * factor)
    }

    /// Divides the amount, refusing to produce an infinite value.
    pub fn divide(&self, divisor: f64) -> Result<Self, DomainError> {
        if divisor == 0.0 {
            return Err(DomainError::DivisionByZero);
        }
        Ok(Self(self.0 / divisor))
    }

    /// Numeric ordering; `-0.0` and `0.0` compare equal, NaN sorts last.
    pub fn compare(&self, other: &Credits) -> Ordering {
        self.0.partial_cmp(&other.0).unwrap_or_else(|| {
            match (self.0.is_nan(), other.0.is_nan()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                _ => Ordering::Less,
            }
        })
    }

    pub fn equals(&self, other: &Credits) -> bool {
        self.0 == other.0
    }

    pub fn is_greater_than(&self, other: &Credits) -> bool {
        self.0 > other.0
    }

    pub fn is_less_than(&self, other: &Credits) -> bool {
        self.0 < other.0
    }

    /// Renders the amount the way the session table shows it.
    ///
    /// Zero is a dash, millions use an `mcr` suffix, thousands `kcr`, and
    /// anything smaller is printed in full with a `cr` suffix. Fractional
    /// compact values keep at most two decimals and use a decimal comma.
    pub fn render(&self) -> String {
        if self.is_zero() {
            return "-".into();
        }
        let magnitude = self.0.abs();
        if magnitude >= MILLION {
            format!("{}mcr", compact(self.0 / MILLION))
        } else if magnitude >= THOUSAND {
            format!("{}kcr", compact(self.0 / THOUSAND))
        } else {
            format!("{}cr", format_plain(self.0))
        }
    }
}

fn compact(scaled: f64) -> String {
    if scaled.fract() == 0.0 {
        return format!("{:.0}", scaled);
    }
    let fixed = format!("{:.2}", round_half_up(scaled, 2));
    trim_fraction(&fixed).replacen('.', COMPACT_DECIMAL_SEPARATOR, 1)
}

fn format_plain(value: f64) -> String {
    let fixed = format!(
        "{:.*}",
        PLAIN_PRECISION,
        round_half_up(value.abs(), PLAIN_PRECISION as i32)
    );
    let trimmed = trim_fraction(&fixed);
    let (int_part, fraction) = match trimmed.find('.') {
        Some(pos) => (&trimmed[..pos], &trimmed[pos..]),
        None => (trimmed, ""),
    };
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}{}", sign, group_digits(int_part), fraction)
}

/// Rounds ties away from zero; `format!` alone rounds exact ties to even.
fn round_half_up(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn trim_fraction(fixed: &str) -> &str {
    if fixed.contains('.') {
        fixed.trim_end_matches('0').trim_end_matches('.')
    } else {
        fixed
    }
}

fn group_digits(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (count, ch) in digits.chars().rev().enumerate() {
        if count != 0 && count % 3 == 0 {
            grouped.insert(0, GROUPING_SEPARATOR);
        }
        grouped.insert(0, ch);
    }
    grouped
}

impl fmt::Display for Credits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<f64> for Credits {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl From<i64> for Credits {
    fn from(value: i64) -> Self {
        Self(value as f64)
    }
}

impl Add for Credits {
    type Output = Credits;

    fn add(self, rhs: Credits) -> Credits {
        Credits(self.0 + rhs.0)
    }
}

impl Sub for Credits {
    type Output = Credits;

    fn sub(self, rhs: Credits) -> Credits {
        self.subtract(rhs)
    }
}

impl Neg for Credits {
    type Output = Credits;

    fn neg(self) -> Credits {
        Credits(-self.0)
    }
}

impl Sum for Credits {
    fn sum<I: Iterator<Item = Credits>>(iter: I) -> Self {
        iter.fold(Credits::ZERO, |acc, item| acc + item)
    }
}

impl<'a> Sum<&'a Credits> for Credits {
    fn sum<I: Iterator<Item = &'a Credits>>(iter: I) -> Self {
        iter.copied().sum()
    }
}
