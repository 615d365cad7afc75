// crates/origin-issuer-core/src/core/condition.rs
// ============================================================================
// Module: Origin Issuer Condition Model
// Description: Typed status conditions with transition-time bookkeeping.
// Purpose: Make reconciliation outcomes observable on resource status.
// Dependencies: crate::core::time, serde
// ============================================================================

//! ## Overview
//! Conditions are stored as a short ordered list searched linearly; at most
//! one condition per type is meaningful. Setting a condition only moves
//! `lastTransitionTime` when the status actually changes, so reason and
//! message updates at a steady status never look like transitions.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Condition Values
// ============================================================================

/// Condition type identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionType {
    /// Resource is ready (issuer verified, certificate issued).
    Ready,
    /// Request was approved by an approval controller.
    Approved,
    /// Request was denied by an approval controller.
    Denied,
    /// Condition type not interpreted by this controller.
    #[serde(untagged)]
    Other(String),
}

impl ConditionType {
    /// Returns the wire label for the condition type.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Ready => "Ready",
            Self::Approved => "Approved",
            Self::Denied => "Denied",
            Self::Other(value) => value,
        }
    }
}

impl fmt::Display for ConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Condition status value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionStatus {
    /// The condition holds.
    True,
    /// The condition does not hold.
    False,
    /// The condition could not be determined.
    Unknown,
}

impl ConditionStatus {
    /// Returns the wire label for the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::True => "True",
            Self::False => "False",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single status condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Condition type.
    #[serde(rename = "type")]
    pub condition_type: ConditionType,
    /// Condition status.
    pub status: ConditionStatus,
    /// Time of the last status change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<Timestamp>,
    /// Machine-readable reason for the last update.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
    /// Human-readable message for the last update.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

/// Result of setting a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionChange {
    /// No condition of the type existed; one was appended.
    Added,
    /// The stored status changed from the given value.
    Transitioned {
        /// Status before the update.
        from: ConditionStatus,
    },
    /// Status unchanged; reason and message were refreshed.
    Refreshed,
}

impl ConditionChange {
    /// Returns true when the update changed (or introduced) the status.
    #[must_use]
    pub const fn is_transition(self) -> bool {
        !matches!(self, Self::Refreshed)
    }
}

// ============================================================================
// SECTION: Condition List
// ============================================================================

/// Ordered condition list keyed by condition type.
///
/// # Invariants
/// - Insertion order is preserved; new types are appended.
/// - `set` never creates a second entry for an existing type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conditions(Vec<Condition>);

impl Conditions {
    /// Creates an empty condition list.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Returns the first condition of the given type.
    #[must_use]
    pub fn get(&self, condition_type: &ConditionType) -> Option<&Condition> {
        self.0.iter().find(|condition| &condition.condition_type == condition_type)
    }

    /// Returns true when a condition of the type has the status and, if given, the reason.
    #[must_use]
    pub fn has(
        &self,
        condition_type: &ConditionType,
        status: ConditionStatus,
        reason: Option<&str>,
    ) -> bool {
        self.0.iter().any(|condition| {
            &condition.condition_type == condition_type
                && condition.status == status
                && reason.is_none_or(|reason| condition.reason == reason)
        })
    }

    /// Returns true when the condition type is present with status `True`.
    #[must_use]
    pub fn is_true(&self, condition_type: &ConditionType) -> bool {
        self.has(condition_type, ConditionStatus::True, None)
    }

    /// Sets a condition, moving the transition time only on a status change.
    pub fn set(
        &mut self,
        condition_type: ConditionType,
        status: ConditionStatus,
        reason: impl Into<String>,
        message: impl Into<String>,
        now: Timestamp,
    ) -> ConditionChange {
        let reason = reason.into();
        let message = message.into();
        let Some(existing) =
            self.0.iter_mut().find(|condition| condition.condition_type == condition_type)
        else {
            self.0.push(Condition {
                condition_type,
                status,
                last_transition_time: Some(now),
                reason,
                message,
            });
            return ConditionChange::Added;
        };

        let change = if existing.status == status {
            ConditionChange::Refreshed
        } else {
            let from = existing.status;
            existing.status = status;
            existing.last_transition_time = Some(now);
            ConditionChange::Transitioned {
                from,
            }
        };
        existing.reason = reason;
        existing.message = message;
        change
    }

    /// Returns the conditions as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Condition] {
        &self.0
    }

    /// Returns the number of stored conditions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when no conditions are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Condition>> for Conditions {
    fn from(value: Vec<Condition>) -> Self {
        Self(value)
    }
}

// ============================================================================
// SECTION: Status Access
// ============================================================================

/// Resource status that carries a condition list.
pub trait HasConditions {
    /// Returns the condition list.
    fn conditions(&self) -> &Conditions;

    /// Returns the mutable condition list.
    fn conditions_mut(&mut self) -> &mut Conditions;
}

/// Sets a condition on a resource status.
///
/// The caller is responsible for persisting the mutated status.
pub fn set_condition<S: HasConditions>(
    status: &mut S,
    condition_type: ConditionType,
    condition_status: ConditionStatus,
    reason: impl Into<String>,
    message: impl Into<String>,
    now: Timestamp,
) -> ConditionChange {
    status.conditions_mut().set(condition_type, condition_status, reason, message, now)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "Test-only assertions.")]

    use super::*;

    fn at(seconds: i64) -> Timestamp {
        Timestamp::from_unix_seconds(seconds).expect("timestamp")
    }

    #[test]
    fn unrecognized_condition_types_survive_serde() {
        let json = r#"[{"type":"InvalidRequest","status":"False"}]"#;
        let conditions: Conditions = serde_json::from_str(json).unwrap();
        assert_eq!(
            conditions.as_slice()[0].condition_type,
            ConditionType::Other("InvalidRequest".to_string())
        );
        let encoded = serde_json::to_string(&conditions).unwrap();
        assert_eq!(encoded, json);
    }

    #[test]
    fn has_ignores_reason_when_not_requested() {
        let mut conditions = Conditions::new();
        conditions.set(ConditionType::Ready, ConditionStatus::False, "Pending", "", at(1));
        assert!(conditions.has(&ConditionType::Ready, ConditionStatus::False, None));
        assert!(conditions.has(&ConditionType::Ready, ConditionStatus::False, Some("Pending")));
        assert!(!conditions.has(&ConditionType::Ready, ConditionStatus::False, Some("Failed")));
        assert!(!conditions.is_true(&ConditionType::Ready));
    }
}
