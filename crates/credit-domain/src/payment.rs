//! Recurring payment rules and their binding to players and time windows.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Credits, DomainError, Period, PeriodUnit, PlayerId};

/// "This much, every this often."
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RuleFields")]
pub struct RecurringPayment {
    amount: Credits,
    period: Period,
}

#[derive(Deserialize)]
struct RuleFields {
    amount: Credits,
    period: Period,
}

impl TryFrom<RuleFields> for RecurringPayment {
    type Error = DomainError;

    fn try_from(fields: RuleFields) -> Result<Self, Self::Error> {
        RecurringPayment::new(fields.amount, fields.period)
    }
}

impl RecurringPayment {
    /// Builds a rule, rejecting periods that would never advance the schedule.
    pub fn new(amount: Credits, period: Period) -> Result<Self, DomainError> {
        if !period.is_positive() {
            return Err(DomainError::InvalidPeriod(format!(
                "recurring period {} must be positive",
                period
            )));
        }
        Ok(Self { amount, period })
    }

    pub fn amount(&self) -> Credits {
        self.amount
    }

    pub fn period(&self) -> Period {
        self.period
    }

    /// Rate of this payment per single `unit`.
    pub fn amount_per_unit(&self, unit: PeriodUnit) -> Result<Credits, DomainError> {
        self.amount.divide(self.period.as_unit(unit))
    }

    pub fn amount_per_hour(&self) -> Result<Credits, DomainError> {
        self.amount_per_unit(PeriodUnit::Hour)
    }

    pub fn amount_per_month(&self) -> Result<Credits, DomainError> {
        self.amount_per_unit(PeriodUnit::Month)
    }

    pub fn amount_per_year(&self) -> Result<Credits, DomainError> {
        self.amount_per_unit(PeriodUnit::Year)
    }

    pub fn describe_period(&self) -> Result<String, DomainError> {
        self.period.describe()
    }

    /// `"<amount>/<period>"`, e.g. `100cr/week`.
    pub fn label(&self) -> Result<String, DomainError> {
        Ok(format!("{}/{}", self.amount.render(), self.describe_period()?))
    }
}

/// A recurring payment owed by one player over an optionally open-ended window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledPayment {
    pub id: Uuid,
    pub player_id: PlayerId,
    pub name: String,
    pub rule: RecurringPayment,
    pub start_instant: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_instant: Option<DateTime<Utc>>,
}

impl ScheduledPayment {
    pub fn new(
        player_id: PlayerId,
        name: impl Into<String>,
        rule: RecurringPayment,
        start_instant: DateTime<Utc>,
        end_instant: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            player_id,
            name: name.into(),
            rule,
            start_instant,
            end_instant,
        }
    }

    pub fn is_active(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start_instant && self.end_instant.map_or(true, |end| instant <= end)
    }

    /// Copy of this payment with its window closed at `end`.
    pub fn end_at(&self, end: DateTime<Utc>) -> Self {
        Self {
            end_instant: Some(end),
            ..self.clone()
        }
    }

    /// First occurrence strictly after `after`, if the payment is active then
    /// and the occurrence still falls inside the window.
    pub fn next_occurrence_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if !self.is_active(after) {
            return None;
        }
        let mut candidate = self.start_instant;
        while candidate <= after {
            candidate = self.step(candidate)?;
        }
        if self.exceeds_end(candidate) {
            return None;
        }
        Some(candidate)
    }

    /// Every occurrence in `[start, end]` that also lies inside the payment
    /// window, ascending. Empty when the payment is not active at `start`.
    pub fn occurrences_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Occurrences<'_> {
        let mut first = None;
        if self.is_active(start) {
            let mut cursor = Some(self.start_instant);
            while let Some(instant) = cursor {
                if instant >= start {
                    break;
                }
                cursor = self.step(instant);
            }
            first = cursor;
        }
        Occurrences {
            payment: self,
            cursor: first,
            until: end,
        }
    }

    fn step(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.rule
            .period()
            .checked_add_to(from)
            .filter(|next| *next > from)
    }

    fn exceeds_end(&self, instant: DateTime<Utc>) -> bool {
        self.end_instant.map_or(false, |end| instant > end)
    }
}

/// Lazily enumerated occurrence instants of a [`ScheduledPayment`].
///
/// Each call to [`ScheduledPayment::occurrences_between`] starts a fresh
/// iterator; the payment itself carries no cursor.
#[derive(Debug, Clone)]
pub struct Occurrences<'a> {
    payment: &'a ScheduledPayment,
    cursor: Option<DateTime<Utc>>,
    until: DateTime<Utc>,
}

impl Iterator for Occurrences<'_> {
    type Item = DateTime<Utc>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.cursor?;
        if current > self.until || self.payment.exceeds_end(current) {
            self.cursor = None;
            return None;
        }
        self.cursor = self.payment.step(current);
        Some(current)
    }
}

impl fmt::Display for ScheduledPayment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rule.label() {
            Ok(label) => write!(f, "{} ({})", self.name, label),
            Err(_) => write!(
                f,
                "{} ({} every {})",
                self.name,
                self.rule.amount(),
                self.rule.period()
            ),
        }
    }
}
