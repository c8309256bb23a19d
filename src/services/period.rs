//! Period resolver
//!
//! Maps dates to the periods of a budget's cycle. Pure and I/O free; the only
//! failure for a valid budget is a date before the cycle's anchor.

use chrono::NaiveDate;

use crate::error::{EngineError, EngineResult};
use crate::models::{Budget, Period};

/// Stateless period arithmetic over budget cycles
pub struct PeriodResolver;

impl PeriodResolver {
    /// Get the period of `budget` that contains `date`
    pub fn resolve_period(budget: &Budget, date: NaiveDate) -> EngineResult<Period> {
        let cycle = &budget.cycle;
        if date < cycle.anchor {
            return Err(EngineError::OutOfRange {
                budget_id: budget.id,
                date,
                anchor: cycle.anchor,
            });
        }
        let index = cycle.index_for(date).ok_or_else(|| {
            EngineError::Validation(format!("Budget {} has an empty cycle", budget.id))
        })?;
        Self::period_at(budget, index)
    }

    /// Get the period with the given sequence index
    pub fn period_at(budget: &Budget, index: u64) -> EngineResult<Period> {
        if budget.cycle.length.is_degenerate() {
            return Err(EngineError::Validation(format!(
                "Budget {} has an empty cycle",
                budget.id
            )));
        }
        let beyond_calendar = || {
            EngineError::Validation(format!(
                "Period #{} of budget {} is beyond the supported calendar",
                index, budget.id
            ))
        };
        let start = budget.cycle.boundary(index).ok_or_else(beyond_calendar)?;
        let end = index
            .checked_add(1)
            .and_then(|next| budget.cycle.boundary(next))
            .ok_or_else(beyond_calendar)?;

        Ok(Period {
            budget_id: budget.id,
            start,
            end,
            sequence_index: index,
        })
    }

    /// Get the period before the given one (None for the first period)
    pub fn previous(budget: &Budget, period: &Period) -> EngineResult<Option<Period>> {
        match period.sequence_index.checked_sub(1) {
            Some(index) => Self::period_at(budget, index).map(Some),
            None => Ok(None),
        }
    }

    /// Get the ordered periods intersecting `[from, to)`
    ///
    /// `from` is clamped to the anchor; a window ending at or before the
    /// anchor is out of range.
    pub fn periods_between(
        budget: &Budget,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<Vec<Period>> {
        let anchor = budget.cycle.anchor;
        if to <= anchor {
            return Err(EngineError::OutOfRange {
                budget_id: budget.id,
                date: to,
                anchor,
            });
        }

        let from = from.max(anchor);
        if from >= to {
            return Ok(Vec::new());
        }

        let first = Self::resolve_period(budget, from)?.sequence_index;
        let last_day = to.pred_opt().unwrap_or(to);
        let last = Self::resolve_period(budget, last_day)?.sequence_index;

        (first..=last)
            .map(|index| Self::period_at(budget, index))
            .collect()
    }
}
