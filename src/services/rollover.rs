//! Rollover calculator
//!
//! Decides how much of a closed period's remainder carries into the next one.

use crate::models::{BudgetUsage, Money, RolloverPolicy};

/// Amount carried into the period after `prior`
///
/// `None` always carries nothing, even if called. `CarryUnspent` forgives
/// deficits; `CarryDeficit` carries the remainder unclamped.
pub fn carry_forward(policy: RolloverPolicy, prior: &BudgetUsage) -> Money {
    match policy {
        RolloverPolicy::None => Money::zero(),
        RolloverPolicy::CarryUnspent => prior.rollover_amount().non_negative(),
        RolloverPolicy::CarryDeficit => prior.rollover_amount(),
    }
}
