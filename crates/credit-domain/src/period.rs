//! Calendar-aware spans of simulated time.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Duration, Months, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::DomainError;

/// Units a [`Period`] can be expressed in, finest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeriodUnit {
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl PeriodUnit {
    pub const ALL: [PeriodUnit; 5] = [
        PeriodUnit::Hour,
        PeriodUnit::Day,
        PeriodUnit::Week,
        PeriodUnit::Month,
        PeriodUnit::Year,
    ];

    pub fn letter(self) -> char {
        match self {
            PeriodUnit::Hour => 'h',
            PeriodUnit::Day => 'd',
            PeriodUnit::Week => 'w',
            PeriodUnit::Month => 'm',
            PeriodUnit::Year => 'y',
        }
    }

    pub fn singular(self) -> &'static str {
        match self {
            PeriodUnit::Hour => "hour",
            PeriodUnit::Day => "day",
            PeriodUnit::Week => "week",
            PeriodUnit::Month => "month",
            PeriodUnit::Year => "year",
        }
    }

    fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_lowercase() {
            'h' => Some(PeriodUnit::Hour),
            'd' => Some(PeriodUnit::Day),
            'w' => Some(PeriodUnit::Week),
            'm' => Some(PeriodUnit::Month),
            'y' => Some(PeriodUnit::Year),
            _ => None,
        }
    }

    fn rank(self) -> u8 {
        match self {
            PeriodUnit::Hour => 0,
            PeriodUnit::Day => 1,
            PeriodUnit::Week => 2,
            PeriodUnit::Month => 3,
            PeriodUnit::Year => 4,
        }
    }
}

impl fmt::Display for PeriodUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.singular())
    }
}

/// Number of `smaller` units in one `larger` unit, using casual calendar
/// lengths (a month is 30 days or 4 weeks, a year 365 days or 52 weeks).
fn units_per(larger: PeriodUnit, smaller: PeriodUnit) -> f64 {
    use PeriodUnit::*;
    match (larger, smaller) {
        (Year, Month) => 12.0,
        (Year, Week) => 52.0,
        (Year, Day) => 365.0,
        (Year, Hour) => 365.0 * 24.0,
        (Month, Week) => 4.0,
        (Month, Day) => 30.0,
        (Month, Hour) => 30.0 * 24.0,
        (Week, Day) => 7.0,
        (Week, Hour) => 7.0 * 24.0,
        (Day, Hour) => 24.0,
        _ => 1.0,
    }
}

fn convert(amount: f64, from: PeriodUnit, to: PeriodUnit) -> f64 {
    if from == to {
        amount
    } else if from.rank() > to.rank() {
        amount * units_per(from, to)
    } else {
        amount / units_per(to, from)
    }
}

/// A signed span made of calendar components.
///
/// Applying a period to an instant shifts years and months on the calendar
/// (clamping the day to the end of a shorter month), then adds weeks and days,
/// then hours.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Period {
    pub years: i32,
    pub months: i32,
    pub weeks: i32,
    pub days: i32,
    pub hours: i32,
}

impl Period {
    pub fn of(unit: PeriodUnit, amount: i32) -> Self {
        let mut period = Period::default();
        match unit {
            PeriodUnit::Hour => period.hours = amount,
            PeriodUnit::Day => period.days = amount,
            PeriodUnit::Week => period.weeks = amount,
            PeriodUnit::Month => period.months = amount,
            PeriodUnit::Year => period.years = amount,
        }
        period
    }

    pub fn hours(amount: i32) -> Self {
        Self::of(PeriodUnit::Hour, amount)
    }

    pub fn days(amount: i32) -> Self {
        Self::of(PeriodUnit::Day, amount)
    }

    pub fn weeks(amount: i32) -> Self {
        Self::of(PeriodUnit::Week, amount)
    }

    pub fn months(amount: i32) -> Self {
        Self::of(PeriodUnit::Month, amount)
    }

    pub fn years(amount: i32) -> Self {
        Self::of(PeriodUnit::Year, amount)
    }

    pub fn component(&self, unit: PeriodUnit) -> i32 {
        match unit {
            PeriodUnit::Hour => self.hours,
            PeriodUnit::Day => self.days,
            PeriodUnit::Week => self.weeks,
            PeriodUnit::Month => self.months,
            PeriodUnit::Year => self.years,
        }
    }

    pub fn is_zero(&self) -> bool {
        PeriodUnit::ALL.iter().all(|unit| self.component(*unit) == 0)
    }

    /// True when no component is negative and at least one is positive.
    pub fn is_positive(&self) -> bool {
        let components = PeriodUnit::ALL.map(|unit| self.component(unit));
        components.iter().all(|value| *value >= 0) && components.iter().any(|value| *value > 0)
    }

    /// Component-wise negation; `i32::MIN` saturates to `i32::MAX`.
    pub fn negated(&self) -> Self {
        Self {
            years: self.years.saturating_neg(),
            months: self.months.saturating_neg(),
            weeks: self.weeks.saturating_neg(),
            days: self.days.saturating_neg(),
            hours: self.hours.saturating_neg(),
        }
    }

    /// Expresses the whole period as a (possibly fractional) count of `unit`.
    pub fn as_unit(&self, unit: PeriodUnit) -> f64 {
        PeriodUnit::ALL
            .iter()
            .map(|component| convert(self.component(*component) as f64, *component, unit))
            .sum()
    }

    /// Short label: the singular unit name for exactly one unit, otherwise
    /// `<n><letter>` in the coarsest unit that holds a whole count.
    pub fn describe(&self) -> Result<String, DomainError> {
        if !self.is_positive() {
            return Err(DomainError::InvalidConversion(format!(
                "period {} has no positive magnitude",
                self
            )));
        }
        for unit in PeriodUnit::ALL {
            if self.as_unit(unit) == 1.0 {
                return Ok(unit.singular().to_string());
            }
        }
        for unit in PeriodUnit::ALL.iter().rev() {
            let count = self.as_unit(*unit);
            if count > 0.0 && count.fract() == 0.0 {
                return Ok(format!("{}{}", count, unit.letter()));
            }
        }
        Err(DomainError::InvalidConversion(format!(
            "period {} has no whole unit magnitude",
            self
        )))
    }

    pub fn checked_add_to(&self, instant: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let months = i64::from(self.years) * 12 + i64::from(self.months);
        let shifted = shift_months(instant, months)?;
        let days = i64::from(self.weeks) * 7 + i64::from(self.days);
        shifted
            .checked_add_signed(Duration::days(days))?
            .checked_add_signed(Duration::hours(i64::from(self.hours)))
    }

    pub fn checked_sub_from(&self, instant: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.negated().checked_add_to(instant)
    }

    /// Parses compact forms such as `3d`, `12h`, `2w`, `1m`, `1y` or `1m2d`.
    pub fn parse_shorthand(input: &str) -> Result<Self, DomainError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidPeriod("empty period".into()));
        }
        let mut period = Period::default();
        let mut digits = String::new();
        for ch in trimmed.chars() {
            if ch.is_ascii_digit() || (ch == '-' && digits.is_empty()) {
                digits.push(ch);
                continue;
            }
            let unit = PeriodUnit::from_letter(ch).ok_or_else(|| {
                DomainError::InvalidPeriod(format!("unknown unit `{}` in `{}`", ch, input))
            })?;
            let amount = parse_amount(&digits, input)?;
            period = period.plus_component(unit, amount)?;
            digits.clear();
        }
        if !digits.is_empty() {
            return Err(DomainError::InvalidPeriod(format!(
                "missing unit after `{}` in `{}`",
                digits, input
            )));
        }
        Ok(period)
    }

    /// ISO-8601 duration text, e.g. `P1W`, `P1M2D`, `PT12H`.
    pub fn to_iso(&self) -> String {
        if self.is_zero() {
            return "PT0S".into();
        }
        let mut out = String::from("P");
        for (value, designator) in [
            (self.years, 'Y'),
            (self.months, 'M'),
            (self.weeks, 'W'),
            (self.days, 'D'),
        ] {
            if value != 0 {
                out.push_str(&format!("{}{}", value, designator));
            }
        }
        if self.hours != 0 {
            out.push_str(&format!("T{}H", self.hours));
        }
        out
    }

    fn plus_component(mut self, unit: PeriodUnit, amount: i32) -> Result<Self, DomainError> {
        let slot = match unit {
            PeriodUnit::Hour => &mut self.hours,
            PeriodUnit::Day => &mut self.days,
            PeriodUnit::Week => &mut self.weeks,
            PeriodUnit::Month => &mut self.months,
            PeriodUnit::Year => &mut self.years,
        };
        *slot = slot.checked_add(amount).ok_or_else(|| {
            DomainError::InvalidPeriod(format!("too many {}s in one period", unit.singular()))
        })?;
        Ok(self)
    }
}

fn shift_months(instant: DateTime<Utc>, months: i64) -> Option<DateTime<Utc>> {
    if months >= 0 {
        let count = u32::try_from(months).ok()?;
        instant.checked_add_months(Months::new(count))
    } else {
        let count = u32::try_from(-months).ok()?;
        instant.checked_sub_months(Months::new(count))
    }
}

fn parse_amount(digits: &str, input: &str) -> Result<i32, DomainError> {
    digits
        .parse::<i32>()
        .map_err(|_| DomainError::InvalidPeriod(format!("expected a number in `{}`", input)))
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso())
    }
}

impl FromStr for Period {
    type Err = DomainError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = || DomainError::InvalidPeriod(format!("`{}` is not an ISO duration", input));
        let body = input.trim().strip_prefix('P').ok_or_else(invalid)?;
        let mut period = Period::default();
        let mut digits = String::new();
        let mut in_time = false;
        for ch in body.chars() {
            match ch {
                'T' if !in_time && digits.is_empty() => in_time = true,
                '0'..='9' | '-' => digits.push(ch),
                designator => {
                    if digits.is_empty() {
                        return Err(invalid());
                    }
                    let unit = match (in_time, designator) {
                        (false, 'Y') => PeriodUnit::Year,
                        (false, 'M') => PeriodUnit::Month,
                        (false, 'W') => PeriodUnit::Week,
                        (false, 'D') => PeriodUnit::Day,
                        (true, 'H') => PeriodUnit::Hour,
                        (true, 'S') if digits == "0" => {
                            digits.clear();
                            continue;
                        }
                        _ => return Err(invalid()),
                    };
                    let amount = parse_amount(&digits, input)?;
                    period = period.plus_component(unit, amount)?;
                    digits.clear();
                }
            }
        }
        if !digits.is_empty() {
            return Err(invalid());
        }
        Ok(period)
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_iso())
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}
