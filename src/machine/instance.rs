//! Per-entity machine state.

use super::history::{StateHistory, StateTransition};
use uuid::Uuid;

/// Current state of one entity, with its optional visited-state history
/// and timestamped transition log.
///
/// Only a [`MachineDefinition`](super::MachineDefinition) can change the
/// state, so it is always one of the declared states.
#[derive(Clone, Debug, PartialEq)]
pub struct MachineInstance {
    id: Uuid,
    revision: u64,
    machine: String,
    initial: String,
    state: String,
    track_history: bool,
    visited: Vec<String>,
    log: StateHistory,
}

/// Identity of an instance at one point in its life. Every commit moves
/// the revision forward; clones share the id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Stamp {
    id: Uuid,
    revision: u64,
}

impl MachineInstance {
    pub(crate) fn new(machine: &str, initial: &str, track_history: bool) -> Self {
        Self::from_parts(
            machine.to_string(),
            initial.to_string(),
            initial.to_string(),
            track_history,
            if track_history {
                vec![initial.to_string()]
            } else {
                Vec::new()
            },
            StateHistory::new(),
        )
    }

    pub(crate) fn from_parts(
        machine: String,
        initial: String,
        state: String,
        track_history: bool,
        visited: Vec<String>,
        log: StateHistory,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            revision: 0,
            machine,
            initial,
            state,
            track_history,
            visited,
            log,
        }
    }

    /// Name of the machine definition this instance belongs to.
    pub fn machine_name(&self) -> &str {
        &self.machine
    }

    /// State the instance started in.
    pub fn initial(&self) -> &str {
        &self.initial
    }

    /// Current state.
    pub fn state(&self) -> &str {
        &self.state
    }

    /// Whether visited states and the log are kept.
    pub fn tracks_history(&self) -> bool {
        self.track_history
    }

    /// Snapshot of visited states, initial state first. Empty when history
    /// is not tracked.
    pub fn history(&self) -> Vec<String> {
        self.visited.clone()
    }

    /// Every committed transition, oldest first. Empty when history is not
    /// tracked.
    pub fn transitions(&self) -> &[StateTransition] {
        self.log.transitions()
    }

    pub(crate) fn log(&self) -> &StateHistory {
        &self.log
    }

    pub(crate) fn stamp(&self) -> Stamp {
        Stamp {
            id: self.id,
            revision: self.revision,
        }
    }

    /// Make `to` the current state. The last step of a transition.
    pub(crate) fn commit(&mut self, operation: &str, to: &str) {
        if self.track_history {
            self.log
                .push(StateTransition::new(operation, self.state.as_str(), to));
            self.visited.push(to.to_string());
        }
        self.state = to.to_string();
        self.revision += 1;
    }
}

/// An entity driven by a state machine.
///
/// # Example
///
/// ```rust
/// use specwright::machine::{MachineInstance, Stateful};
///
/// struct Door {
///     machine: MachineInstance,
///     opened: u32,
/// }
///
/// impl Stateful for Door {
///     fn machine(&self) -> &MachineInstance {
///         &self.machine
///     }
///
///     fn machine_mut(&mut self) -> &mut MachineInstance {
///         &mut self.machine
///     }
/// }
/// ```
pub trait Stateful {
    /// The embedded instance.
    fn machine(&self) -> &MachineInstance;

    /// Mutable access for the definition driving this entity. Swapping the
    /// instance while an operation runs makes that operation fail.
    fn machine_mut(&mut self) -> &mut MachineInstance;

    /// Current state of the embedded instance.
    fn state(&self) -> &str {
        self.machine().state()
    }

    /// Visited states of the embedded instance.
    fn history(&self) -> Vec<String> {
        self.machine().history()
    }
}

impl Stateful for MachineInstance {
    fn machine(&self) -> &MachineInstance {
        self
    }

    fn machine_mut(&mut self) -> &mut MachineInstance {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracked_instance_starts_with_initial() {
        let instance = MachineInstance::new("Order", "pending", true);
        assert_eq!(instance.state(), "pending");
        assert_eq!(instance.history(), ["pending"]);
    }

    #[test]
    fn untracked_instance_keeps_no_history_or_log() {
        let mut instance = MachineInstance::new("Order", "pending", false);
        instance.commit("pay", "paid");
        assert_eq!(instance.state(), "paid");
        assert!(instance.history().is_empty());
        assert!(instance.transitions().is_empty());
    }

    #[test]
    fn commit_moves_the_stamp_forward() {
        let mut instance = MachineInstance::new("Order", "pending", false);
        let before = instance.stamp();
        let copy = instance.clone();
        assert_eq!(copy.stamp(), before);

        instance.commit("pay", "paid");
        assert_ne!(instance.stamp(), before);
        assert_ne!(MachineInstance::new("Order", "pending", false).stamp(), before);
    }

    #[test]
    fn history_snapshot_is_detached() {
        let mut instance = MachineInstance::new("Order", "pending", true);
        instance.commit("pay", "paid");

        let mut snapshot = instance.history();
        snapshot.push("tampered".to_string());
        snapshot.clear();

        assert_eq!(instance.history(), ["pending", "paid"]);
    }

    #[test]
    fn commit_logs_operation_and_states() {
        let mut instance = MachineInstance::new("Order", "pending", true);
        instance.commit("pay", "paid");

        let transition = &instance.transitions()[0];
        assert_eq!(transition.operation, "pay");
        assert_eq!(transition.from, "pending");
        assert_eq!(transition.to, "paid");
    }
}
