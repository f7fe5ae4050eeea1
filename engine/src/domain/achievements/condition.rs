//! Typed custom conditions on snapshot statistics.

use serde::{Deserialize, Serialize};

use crate::domain::progress::{StatField, StatSnapshot, StatValue};

/// Comparison applied by a [`Condition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    Contains,
}

/// Right-hand side of a condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ConditionValue {
    Number(f64),
    Text(String),
    Flag(bool),
}

/// `field operator value`, e.g. `total_sessions greater_than 10`.
///
/// Counter fields compare against numbers with every operator except
/// `contains`. Set fields (achievements, badges, titles) accept text with
/// `contains` for membership and `not_equals` for absence. Any other
/// pairing, including every flag value, does not hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub field: StatField,
    pub operator: ConditionOperator,
    pub value: ConditionValue,
}

impl Condition {
    /// Evaluate the condition against `stats`.
    pub fn holds(&self, stats: &StatSnapshot) -> bool {
        let stat = stats.stat(self.field);
        match (stat, &self.value) {
            (StatValue::Number(actual), ConditionValue::Number(expected)) => {
                compare_number(actual, self.operator, *expected)
            }
            (StatValue::Achievements(_) | StatValue::Labels(_), ConditionValue::Text(text)) => {
                match self.operator {
                    ConditionOperator::Contains => stat.contains(text),
                    ConditionOperator::NotEquals => !stat.contains(text),
                    ConditionOperator::Equals
                    | ConditionOperator::GreaterThan
                    | ConditionOperator::LessThan => false,
                }
            }
            (_, ConditionValue::Flag(_))
            | (StatValue::Number(_), ConditionValue::Text(_))
            | (StatValue::Achievements(_) | StatValue::Labels(_), ConditionValue::Number(_)) => {
                false
            }
        }
    }
}

// Counters stay far below 2^53, so the f64 conversion is exact.
fn compare_number(actual: u64, operator: ConditionOperator, expected: f64) -> bool {
    if !expected.is_finite() {
        return false;
    }
    let actual = actual as f64;
    match operator {
        ConditionOperator::Equals => actual == expected,
        ConditionOperator::NotEquals => actual != expected,
        ConditionOperator::GreaterThan => actual > expected,
        ConditionOperator::LessThan => actual < expected,
        ConditionOperator::Contains => false,
    }
}
