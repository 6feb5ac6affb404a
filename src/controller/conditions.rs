//! # Conditions
//!
//! Helpers for keeping a single condition per type on a status.
//!
//! `lastTransitionTime` only moves when the status of a condition changes.
//! Updating the reason or message of a condition in the same status keeps the
//! original timestamp.

use crate::crd::{Condition, ConditionStatus};
use chrono::{DateTime, SecondsFormat, Utc};
use tracing::info;

/// Set a condition, inserting it if no condition of that type exists yet
pub fn set_condition(
    conditions: &mut Vec<Condition>,
    condition_type: &str,
    status: ConditionStatus,
    reason: &str,
    message: &str,
    now: DateTime<Utc>,
    observed_generation: Option<i64>,
) {
    let mut condition = Condition {
        r#type: condition_type.to_string(),
        status,
        last_transition_time: Some(now.to_rfc3339_opts(SecondsFormat::Secs, true)),
        reason: Some(reason.to_string()),
        message: Some(message.to_string()),
        observed_generation,
    };

    match conditions.iter_mut().find(|c| c.r#type == condition_type) {
        Some(existing) => {
            if existing.status == status {
                condition
                    .last_transition_time
                    .clone_from(&existing.last_transition_time);
            } else {
                info!(
                    condition = condition_type,
                    old_status = %existing.status,
                    new_status = %status,
                    "condition status changed, setting lastTransitionTime"
                );
            }
            *existing = condition;
        }
        None => conditions.push(condition),
    }
}

/// True when a condition of the given type has the given status
#[must_use]
pub fn has_condition(conditions: &[Condition], condition_type: &str, status: ConditionStatus) -> bool {
    conditions.iter().any(|c| c.is(condition_type, status))
}
