//! Checkpoint and resume for machine instances.
//!
//! A checkpoint captures one instance's state and, when history is
//! tracked, its visited states and transition log. Restoring goes through
//! the machine definition, which rejects any checkpoint that would break an
//! instance invariant.

use crate::machine::{MachineDefinition, MachineInstance, StateHistory};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use uuid::Uuid;

pub mod error;

pub use error::CheckpointError;

/// Version identifier for checkpoint format
pub const CHECKPOINT_VERSION: u32 = 1;

/// Serializable snapshot of a machine instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Checkpoint format version
    pub version: u32,

    /// Unique checkpoint identifier
    pub id: String,

    /// When checkpoint was created
    pub timestamp: DateTime<Utc>,

    /// Name of the machine definition
    pub machine: String,

    pub initial_state: String,

    pub current_state: String,

    pub track_history: bool,

    /// Visited states; empty unless history is tracked
    pub history: Vec<String>,

    /// Timestamped transition log; empty unless history is tracked
    pub transitions: StateHistory,
}

impl Checkpoint {
    /// Snapshot `instance` as it is now.
    pub fn capture(instance: &MachineInstance) -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            machine: instance.machine_name().to_string(),
            initial_state: instance.initial().to_string(),
            current_state: instance.state().to_string(),
            track_history: instance.tracks_history(),
            history: instance.history(),
            transitions: instance.log().clone(),
        }
    }

    /// Pretty-printed JSON encoding.
    pub fn to_json(&self) -> Result<String, CheckpointError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    /// Decode a JSON checkpoint. The result is not yet validated; see `restore`.
    pub fn from_json(json: &str) -> Result<Self, CheckpointError> {
        serde_json::from_str(json).map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))
    }

    /// Compact binary encoding (bincode).
    pub fn to_binary(&self) -> Result<Vec<u8>, CheckpointError> {
        bincode::serialize(self).map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    /// Decode a binary checkpoint.
    pub fn from_binary(bytes: &[u8]) -> Result<Self, CheckpointError> {
        bincode::deserialize(bytes)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))
    }
}

type Check = Validation<(), NonEmptyVec<String>>;

fn declared<E>(definition: &MachineDefinition<E>, what: &str, state: &str) -> Check {
    if definition.has_state(state) {
        Validation::success(())
    } else {
        Validation::fail(format!("{what} '{state}' is not a declared state"))
    }
}

fn holds(ok: bool, problem: impl FnOnce() -> String) -> Check {
    if ok {
        Validation::success(())
    } else {
        Validation::fail(problem())
    }
}

impl<E> MachineDefinition<E> {
    /// Snapshot `instance`.
    pub fn checkpoint(&self, instance: &MachineInstance) -> Checkpoint {
        Checkpoint::capture(instance)
    }

    /// Rebuild an instance from `checkpoint`.
    ///
    /// Every state the checkpoint names must be declared by this
    /// definition, and a tracked history must run from the initial state to
    /// the current one.
    pub fn restore(&self, checkpoint: &Checkpoint) -> Result<MachineInstance, CheckpointError> {
        if checkpoint.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found: checkpoint.version,
                supported: CHECKPOINT_VERSION,
            });
        }
        if checkpoint.machine != self.name() {
            return Err(CheckpointError::MachineMismatch {
                expected: self.name().to_string(),
                found: checkpoint.machine.clone(),
            });
        }

        let log = checkpoint.transitions.transitions();
        let mut checks: Vec<Check> = vec![
            holds(checkpoint.initial_state == self.initial(), || {
                format!(
                    "initial state '{}' differs from '{}'",
                    checkpoint.initial_state,
                    self.initial()
                )
            }),
            declared(self, "current state", &checkpoint.current_state),
            holds(checkpoint.track_history == self.tracks_history(), || {
                "history tracking does not match the definition".to_string()
            }),
        ];
        checks.extend(
            checkpoint
                .history
                .iter()
                .map(|state| declared(self, "history entry", state)),
        );
        for transition in log {
            checks.push(declared(self, "transition source", &transition.from));
            checks.push(declared(self, "transition target", &transition.to));
        }
        if checkpoint.track_history {
            checks.push(holds(
                checkpoint.history.first().map(String::as_str) == Some(self.initial())
                    && checkpoint.history.last() == Some(&checkpoint.current_state),
                || "history must run from the initial state to the current state".to_string(),
            ));
            checks.push(holds(checkpoint.history.len() == log.len() + 1, || {
                format!(
                    "history has {} entries but {} transition(s) are logged",
                    checkpoint.history.len(),
                    log.len()
                )
            }));
            checks.extend(log.iter().enumerate().map(|(i, transition)| {
                let from = checkpoint.history.get(i);
                let to = checkpoint.history.get(i + 1);
                holds(from == Some(&transition.from) && to == Some(&transition.to), || {
                    format!(
                        "transition {} ('{}': '{}' -> '{}') does not follow the history",
                        i + 1,
                        transition.operation,
                        transition.from,
                        transition.to
                    )
                })
            }));
        } else {
            checks.push(holds(checkpoint.history.is_empty() && log.is_empty(), || {
                "history and log must be empty when history is not tracked".to_string()
            }));
        }

        if let Validation::Failure(problems) = Validation::all_vec(checks) {
            let reason = problems.iter().cloned().collect::<Vec<_>>().join("; ");
            tracing::warn!(machine = %checkpoint.machine, id = %checkpoint.id, %reason, "checkpoint rejected");
            return Err(CheckpointError::ValidationFailed(reason));
        }

        tracing::debug!(
            machine = %checkpoint.machine,
            id = %checkpoint.id,
            state = %checkpoint.current_state,
            "checkpoint restored"
        );

        Ok(MachineInstance::from_parts(
            checkpoint.machine.clone(),
            checkpoint.initial_state.clone(),
            checkpoint.current_state.clone(),
            checkpoint.track_history,
            checkpoint.history.clone(),
            checkpoint.transitions.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::{MachineBuilder, StateTransition, TransitionBuilder};

    fn order() -> MachineDefinition<MachineInstance> {
        MachineBuilder::new("Order")
            .states(["pending", "paid", "shipped"])
            .initial("pending")
            .track_history(true)
            .transition(TransitionBuilder::new("pay").from("pending").to("paid"))
            .transition(TransitionBuilder::new("ship").from("paid").to("shipped"))
            .build()
            .unwrap()
    }

    fn paid_checkpoint() -> (MachineDefinition<MachineInstance>, Checkpoint) {
        let machine = order();
        let mut instance = machine.instantiate();
        machine.invoke(&mut instance, "pay", |_| Ok(())).unwrap();
        let checkpoint = machine.checkpoint(&instance);
        (machine, checkpoint)
    }

    #[test]
    fn json_round_trip_resumes_workflow() {
        let (machine, checkpoint) = paid_checkpoint();
        let json = checkpoint.to_json().unwrap();
        let mut restored = machine.restore(&Checkpoint::from_json(&json).unwrap()).unwrap();

        assert_eq!(restored.state(), "paid");
        machine.invoke(&mut restored, "ship", |_| Ok(())).unwrap();
        assert_eq!(restored.history(), ["pending", "paid", "shipped"]);
        assert_eq!(restored.transitions().len(), 2);
    }

    #[test]
    fn binary_round_trip_preserves_checkpoint() {
        let (_, checkpoint) = paid_checkpoint();
        let bytes = checkpoint.to_binary().unwrap();
        assert_eq!(Checkpoint::from_binary(&bytes).unwrap(), checkpoint);
    }

    #[test]
    fn rejects_unsupported_version() {
        let (machine, mut checkpoint) = paid_checkpoint();
        checkpoint.version = 99;
        assert_eq!(
            machine.restore(&checkpoint).unwrap_err(),
            CheckpointError::UnsupportedVersion {
                found: 99,
                supported: CHECKPOINT_VERSION
            }
        );
    }

    #[test]
    fn rejects_other_machine() {
        let (machine, mut checkpoint) = paid_checkpoint();
        checkpoint.machine = "Invoice".to_string();
        assert!(matches!(
            machine.restore(&checkpoint),
            Err(CheckpointError::MachineMismatch { .. })
        ));
    }

    #[test]
    fn rejects_undeclared_states() {
        let (machine, mut checkpoint) = paid_checkpoint();
        checkpoint.current_state = "lost".to_string();
        checkpoint.history.push("lost".to_string());

        let reason = match machine.restore(&checkpoint) {
            Err(CheckpointError::ValidationFailed(reason)) => reason,
            other => panic!("expected a validation failure, got {other:?}"),
        };
        assert_eq!(
            reason,
            "current state 'lost' is not a declared state; \
             history entry 'lost' is not a declared state; \
             history has 3 entries but 1 transition(s) are logged"
        );
    }

    fn untracked_machine() -> MachineDefinition<MachineInstance> {
        MachineBuilder::new("Door")
            .states(["open", "closed"])
            .initial("open")
            .transition(TransitionBuilder::new("close").from("open").to("closed"))
            .build()
            .unwrap()
    }

    #[test]
    fn untracked_checkpoint_must_carry_no_history() {
        let machine = untracked_machine();
        let mut instance = machine.instantiate();
        machine.invoke(&mut instance, "close", |_| Ok(())).unwrap();

        let mut checkpoint = machine.checkpoint(&instance);
        assert!(checkpoint.history.is_empty());
        assert!(checkpoint.transitions.is_empty());
        assert_eq!(machine.restore(&checkpoint).unwrap().state(), "closed");

        checkpoint.history = vec!["open".to_string(), "closed".to_string(), "open".to_string()];
        assert_eq!(
            machine.restore(&checkpoint).unwrap_err(),
            CheckpointError::ValidationFailed(
                "history and log must be empty when history is not tracked".to_string()
            )
        );
    }

    #[test]
    fn history_and_log_must_agree() {
        let (machine, mut checkpoint) = paid_checkpoint();
        checkpoint.transitions = StateHistory::new();
        let reason = match machine.restore(&checkpoint) {
            Err(CheckpointError::ValidationFailed(reason)) => reason,
            other => panic!("expected a validation failure, got {other:?}"),
        };
        assert_eq!(reason, "history has 2 entries but 0 transition(s) are logged");
    }

    #[test]
    fn log_must_follow_the_history() {
        let (machine, mut checkpoint) = paid_checkpoint();
        checkpoint.transitions = StateHistory::new()
            .record(StateTransition::new("ship", "paid", "shipped"));
        let reason = match machine.restore(&checkpoint) {
            Err(CheckpointError::ValidationFailed(reason)) => reason,
            other => panic!("expected a validation failure, got {other:?}"),
        };
        assert_eq!(
            reason,
            "transition 1 ('ship': 'paid' -> 'shipped') does not follow the history"
        );
    }

    #[test]
    fn rejects_history_that_does_not_end_in_current_state() {
        let (machine, mut checkpoint) = paid_checkpoint();
        checkpoint.current_state = "shipped".to_string();
        assert!(matches!(
            machine.restore(&checkpoint),
            Err(CheckpointError::ValidationFailed(_))
        ));
    }

    #[test]
    fn malformed_input_is_a_deserialization_error() {
        assert!(matches!(
            Checkpoint::from_json("{ not json"),
            Err(CheckpointError::DeserializationFailed(_))
        ));
        assert!(matches!(
            Checkpoint::from_binary(&[1, 2, 3]),
            Err(CheckpointError::DeserializationFailed(_))
        ));
    }
}
