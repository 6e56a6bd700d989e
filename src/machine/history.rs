//! Timestamped log of committed transitions.
//!
//! The log is an immutable value: `record` returns a new log with the
//! transition appended.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One committed transition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateTransition {
    /// Operation that caused the transition
    pub operation: String,
    /// State before the transition
    pub from: String,
    /// State after the transition
    pub to: String,
    /// When the new state was committed
    pub timestamp: DateTime<Utc>,
}

impl StateTransition {
    /// A transition timestamped now.
    pub fn new(operation: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            from: from.into(),
            to: to.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Ordered log of committed transitions.
///
/// # Example
///
/// ```rust
/// use specwright::machine::{StateHistory, StateTransition};
///
/// let history = StateHistory::new()
///     .record(StateTransition::new("pay", "pending", "paid"))
///     .record(StateTransition::new("ship", "paid", "shipped"));
///
/// assert_eq!(history.get_path(), ["pending", "paid", "shipped"]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StateHistory {
    transitions: Vec<StateTransition>,
}

impl StateHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a transition, returning a new log. `self` is unchanged.
    pub fn record(&self, transition: StateTransition) -> Self {
        let mut transitions = self.transitions.clone();
        transitions.push(transition);
        Self { transitions }
    }

    /// Append `transition` in place.
    pub(crate) fn push(&mut self, transition: StateTransition) {
        self.transitions.push(transition);
    }

    /// States traversed: the first source, then each target.
    pub fn get_path(&self) -> Vec<&str> {
        let mut path = Vec::new();
        if let Some(first) = self.transitions.first() {
            path.push(first.from.as_str());
        }
        for transition in &self.transitions {
            path.push(transition.to.as_str());
        }
        path
    }

    /// Time between the first and last transition.
    pub fn duration(&self) -> Option<Duration> {
        let (first, last) = (self.transitions.first()?, self.transitions.last()?);
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }

    /// Recorded transitions, oldest first.
    pub fn transitions(&self) -> &[StateTransition] {
        &self.transitions
    }

    /// Number of recorded transitions.
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_history_is_empty() {
        let history = StateHistory::new();
        assert!(history.is_empty());
        assert!(history.get_path().is_empty());
        assert!(history.duration().is_none());
    }

    #[test]
    fn record_is_immutable() {
        let history = StateHistory::new();
        let next = history.record(StateTransition::new("open", "closed", "open"));

        assert_eq!(history.len(), 0);
        assert_eq!(next.len(), 1);
        assert_eq!(next.transitions()[0].operation, "open");
    }

    #[test]
    fn duration_spans_first_to_last() {
        let history = StateHistory::new().record(StateTransition::new("a", "x", "y"));
        std::thread::sleep(Duration::from_millis(10));
        let history = history.record(StateTransition::new("b", "y", "z"));

        assert!(history.duration().unwrap() >= Duration::from_millis(10));
    }

    #[test]
    fn single_transition_has_zero_duration() {
        let history = StateHistory::new().record(StateTransition::new("a", "x", "y"));
        assert_eq!(history.duration(), Some(Duration::from_secs(0)));
    }

    #[test]
    fn history_serializes() {
        let history = StateHistory::new().record(StateTransition::new("pay", "pending", "paid"));
        let json = serde_json::to_string(&history).unwrap();
        let back: StateHistory = serde_json::from_str(&json).unwrap();
        assert_eq!(back, history);
    }
}
