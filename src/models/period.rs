//! Budget cycles, periods and date windows
//!
//! A budget repeats over a [`Cycle`]: an anchor date plus a [`CycleLength`].
//! Each repetition is a [`Period`], a derived value identified by its sequence
//! index counted from the anchor. Windows are half open: `[start, end)`.

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::BudgetId;

/// A half-open date window `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// A window covering exactly one day
    pub fn single_day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date.succ_opt().unwrap_or(date),
        }
    }

    /// Check if a date falls within this window
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end
    }

    /// Check if the two windows share at least one day
    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// A window whose end is not after its start covers no days
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Number of days covered
    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days().max(0)
    }

    /// Smallest window covering both
    pub fn union(&self, other: &DateRange) -> DateRange {
        DateRange {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}..{}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

/// How long one repetition of a budget lasts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CycleLength {
    Weekly,
    BiWeekly,
    /// Calendar month anchored on the anchor's day of month (default)
    #[default]
    Monthly,
    Quarterly,
    Yearly,
    /// Fixed number of days
    Days(u32),
    /// Fixed number of months
    Months(u32),
}

/// The primitive step a cycle advances by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CycleStep {
    Days(u32),
    Months(u32),
}

impl CycleLength {
    pub(crate) fn step(&self) -> CycleStep {
        match self {
            Self::Weekly => CycleStep::Days(7),
            Self::BiWeekly => CycleStep::Days(14),
            Self::Monthly => CycleStep::Months(1),
            Self::Quarterly => CycleStep::Months(3),
            Self::Yearly => CycleStep::Months(12),
            Self::Days(n) => CycleStep::Days(*n),
            Self::Months(n) => CycleStep::Months(*n),
        }
    }

    /// A cycle of zero days or months cannot tile the timeline
    pub fn is_degenerate(&self) -> bool {
        matches!(self.step(), CycleStep::Days(0) | CycleStep::Months(0))
    }
}

impl FromStr for CycleLength {
    type Err = String;

    /// Named lengths, or `<n>d` / `<n>m` for custom day and month counts
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "weekly" => return Ok(Self::Weekly),
            "biweekly" | "bi-weekly" => return Ok(Self::BiWeekly),
            "monthly" => return Ok(Self::Monthly),
            "quarterly" => return Ok(Self::Quarterly),
            "yearly" | "annual" => return Ok(Self::Yearly),
            _ => {}
        }

        let invalid = || format!("Unknown cycle length: {}", s);
        if let Some(days) = s.strip_suffix('d') {
            return days.parse().map(Self::Days).map_err(|_| invalid());
        }
        if let Some(months) = s.strip_suffix('m') {
            return months.parse().map(Self::Months).map_err(|_| invalid());
        }
        Err(invalid())
    }
}

impl fmt::Display for CycleLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Weekly => write!(f, "weekly"),
            Self::BiWeekly => write!(f, "bi-weekly"),
            Self::Monthly => write!(f, "monthly"),
            Self::Quarterly => write!(f, "quarterly"),
            Self::Yearly => write!(f, "yearly"),
            Self::Days(n) => write!(f, "every {} days", n),
            Self::Months(n) => write!(f, "every {} months", n),
        }
    }
}

/// Anchor date plus cycle length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cycle {
    pub anchor: NaiveDate,
    #[serde(default)]
    pub length: CycleLength,
}

impl Cycle {
    pub fn new(anchor: NaiveDate, length: CycleLength) -> Self {
        Self { anchor, length }
    }

    /// Calendar-month cycle anchored on the given date
    pub fn monthly(anchor: NaiveDate) -> Self {
        Self::new(anchor, CycleLength::Monthly)
    }

    /// Start date of the period with the given sequence index
    ///
    /// Month-based boundaries are computed from the anchor rather than from
    /// the previous boundary, so an anchor on the 31st clamps to the 30th in
    /// April but returns to the 31st in May. Returns `None` past the end of
    /// the supported calendar.
    pub fn boundary(&self, index: u64) -> Option<NaiveDate> {
        match self.length.step() {
            CycleStep::Days(n) => {
                let days = index.checked_mul(u64::from(n))?;
                self.anchor.checked_add_days(Days::new(days))
            }
            CycleStep::Months(n) => {
                let months = u32::try_from(index.checked_mul(u64::from(n))?).ok()?;
                self.anchor.checked_add_months(Months::new(months))
            }
        }
    }

    /// Sequence index of the period containing `date` (`date >= anchor`)
    pub(crate) fn index_for(&self, date: NaiveDate) -> Option<u64> {
        if date < self.anchor {
            return None;
        }
        match self.length.step() {
            CycleStep::Days(0) | CycleStep::Months(0) => None,
            CycleStep::Days(n) => {
                let elapsed = (date - self.anchor).num_days() as u64;
                Some(elapsed / u64::from(n))
            }
            CycleStep::Months(n) => {
                use chrono::Datelike;
                let elapsed_months = (date.year() - self.anchor.year()) as i64 * 12
                    + date.month() as i64
                    - self.anchor.month() as i64;
                let mut index = (elapsed_months.max(0) as u64) / u64::from(n);
                // Same month as the boundary but before its day
                while index > 0 && self.boundary(index)? > date {
                    index -= 1;
                }
                Some(index)
            }
        }
    }
}

/// One repetition of a budget's cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Period {
    pub budget_id: BudgetId,
    /// First day of the period
    pub start: NaiveDate,
    /// First day of the next period (exclusive)
    pub end: NaiveDate,
    /// 0 for the period starting on the anchor date
    pub sequence_index: u64,
}

impl Period {
    /// The period's window as a date range
    pub fn range(&self) -> DateRange {
        DateRange::new(self.start, self.end)
    }

    /// Check if a date falls within this period
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.range().contains(date)
    }

    pub fn is_first(&self) -> bool {
        self.sequence_index == 0
    }

    /// Last day of the period (inclusive), for display
    pub fn last_day(&self) -> NaiveDate {
        self.end.pred_opt().unwrap_or(self.end)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} - {}",
            self.sequence_index,
            self.start.format("%Y-%m-%d"),
            self.last_day().format("%Y-%m-%d")
        )
    }
}
