//! Machine definitions: declared states, guarded operations and hooks.

use super::instance::{MachineInstance, Stateful};
use super::transition::{TransitionBuilder, TransitionDescriptor, TransitionError};
use crate::core::{DefinitionError, Fault};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::sync::Arc;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Lifecycle hook run around a committed transition.
pub type Hook<E> = Arc<dyn Fn(&mut E) -> Result<(), Fault> + Send + Sync>;

type Check = Validation<(), NonEmptyVec<String>>;

fn check(ok: bool, problem: impl FnOnce() -> String) -> Check {
    if ok {
        Validation::success(())
    } else {
        Validation::fail(problem())
    }
}

fn bracketed<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    format!("[{}]", names.into_iter().collect::<Vec<_>>().join(", "))
}

/// Builder for a [`MachineDefinition`].
///
/// # Example
///
/// ```rust
/// use specwright::machine::{MachineBuilder, MachineInstance, TransitionBuilder};
///
/// let order = MachineBuilder::<MachineInstance>::new("Order")
///     .states(["pending", "paid", "shipped"])
///     .initial("pending")
///     .track_history(true)
///     .transition(TransitionBuilder::new("pay").from("pending").to("paid"))
///     .transition(TransitionBuilder::new("ship").from("paid").to("shipped"))
///     .build()
///     .unwrap();
///
/// let mut instance = order.instantiate();
/// order.invoke(&mut instance, "pay", |_| Ok(())).unwrap();
/// assert_eq!(instance.state(), "paid");
/// assert!(order.invoke(&mut instance, "pay", |_| Ok(())).is_err());
/// ```
pub struct MachineBuilder<E> {
    name: String,
    states: Option<Vec<String>>,
    initial: Option<String>,
    track_history: Option<bool>,
    transitions: Vec<TransitionBuilder>,
    on_enter: Vec<(String, Hook<E>)>,
    on_exit: Vec<(String, Hook<E>)>,
    base: Option<MachineDefinition<E>>,
}

impl<E> MachineBuilder<E> {
    /// Start declaring the machine `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            states: None,
            initial: None,
            track_history: None,
            transitions: Vec::new(),
            on_enter: Vec::new(),
            on_exit: Vec::new(),
            base: None,
        }
    }

    /// Declared states, in order. Replaces any inherited set.
    pub fn states<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.states = Some(states.into_iter().map(Into::into).collect());
        self
    }

    /// State every instance starts in (required unless inherited).
    pub fn initial(mut self, state: impl Into<String>) -> Self {
        self.initial = Some(state.into());
        self
    }

    /// Record every visited state. Off unless set here or inherited.
    pub fn track_history(mut self, enabled: bool) -> Self {
        self.track_history = Some(enabled);
        self
    }

    /// Add a guarded operation. Overrides an inherited one of the same name.
    pub fn transition(mut self, transition: TransitionBuilder) -> Self {
        self.transitions.push(transition);
        self
    }

    /// Run `hook` right after entering `state`.
    pub fn on_enter<F>(mut self, state: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&mut E) -> Result<(), Fault> + Send + Sync + 'static,
    {
        self.on_enter.push((state.into(), Arc::new(hook)));
        self
    }

    /// Run `hook` right before leaving `state`.
    pub fn on_exit<F>(mut self, state: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&mut E) -> Result<(), Fault> + Send + Sync + 'static,
    {
        self.on_exit.push((state.into(), Arc::new(hook)));
        self
    }

    /// Inherit states, initial state, history flag, operations and hooks
    /// from `base`. Anything declared on this builder overrides them.
    pub fn extends(mut self, base: &MachineDefinition<E>) -> Self {
        self.base = Some(base.clone());
        self
    }

    /// Validate the declaration and produce the definition.
    pub fn build(self) -> Result<MachineDefinition<E>, DefinitionError> {
        let name = self.name;
        let invalid = |reason: String| DefinitionError::InvalidState {
            machine: name.clone(),
            reason,
        };
        let base = self.base;

        let states = self
            .states
            .or_else(|| base.as_ref().map(|b| b.states.clone()))
            .unwrap_or_default();
        if states.is_empty() {
            return Err(invalid("must define at least one state".to_string()));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = states.iter().find(|s| !seen.insert(s.as_str())) {
            return Err(invalid(format!("declares state '{dup}' more than once")));
        }

        let initial = self
            .initial
            .or_else(|| base.as_ref().map(|b| b.initial.clone()))
            .ok_or_else(|| invalid("must define an initial state".to_string()))?;
        if !seen.contains(initial.as_str()) {
            return Err(invalid(format!(
                "initial state '{initial}' is not in the defined states {}",
                bracketed(states.iter().map(String::as_str))
            )));
        }

        let track_history = self
            .track_history
            .or_else(|| base.as_ref().map(|b| b.track_history))
            .unwrap_or(false);

        let mut transitions = base
            .as_ref()
            .map(|b| b.transitions.clone())
            .unwrap_or_default();
        let mut declared = HashSet::new();
        for builder in self.transitions {
            if !declared.insert(builder.operation().to_string()) {
                return Err(invalid(format!(
                    "declares transition '{}' more than once",
                    builder.operation()
                )));
            }
            let descriptor = builder.build(&name)?;
            match transitions
                .iter_mut()
                .find(|t| t.operation == descriptor.operation)
            {
                Some(inherited) => *inherited = descriptor,
                None => transitions.push(descriptor),
            }
        }

        let (mut on_enter, mut on_exit) = match &base {
            Some(b) => (b.on_enter.clone(), b.on_exit.clone()),
            None => (BTreeMap::new(), BTreeMap::new()),
        };
        on_enter.extend(self.on_enter);
        on_exit.extend(self.on_exit);

        let mut checks: Vec<Check> = Vec::new();
        for t in &transitions {
            let unknown: Vec<&str> = t
                .sources
                .iter()
                .map(String::as_str)
                .filter(|s| !seen.contains(s))
                .collect();
            checks.push(check(unknown.is_empty(), || {
                format!(
                    "transition '{}' references invalid from_state(s): {}",
                    t.operation,
                    bracketed(unknown.iter().copied())
                )
            }));
            checks.push(check(seen.contains(t.target.as_str()), || {
                format!(
                    "transition '{}' references invalid to_state: '{}'",
                    t.operation, t.target
                )
            }));
        }
        for (kind, hooks) in [("on_enter", &on_enter), ("on_exit", &on_exit)] {
            for state in hooks.keys() {
                checks.push(check(seen.contains(state.as_str()), || {
                    format!("{kind} hook is keyed by undeclared state '{state}'")
                }));
            }
        }
        if let Validation::Failure(problems) = Validation::all_vec(checks) {
            let reason = problems.iter().cloned().collect::<Vec<_>>().join("; ");
            return Err(invalid(reason));
        }

        tracing::debug!(
            machine = %name,
            states = states.len(),
            transitions = transitions.len(),
            track_history,
            "machine defined"
        );

        Ok(MachineDefinition {
            name,
            states,
            initial,
            track_history,
            transitions,
            on_enter,
            on_exit,
        })
    }
}

/// A validated state machine.
///
/// Definitions are immutable and shareable. Each entity carries its own
/// [`MachineInstance`]; [`invoke`](Self::invoke) is the only way to change
/// its state.
pub struct MachineDefinition<E> {
    name: String,
    states: Vec<String>,
    initial: String,
    track_history: bool,
    transitions: Vec<TransitionDescriptor>,
    on_enter: BTreeMap<String, Hook<E>>,
    on_exit: BTreeMap<String, Hook<E>>,
}

impl<E> Clone for MachineDefinition<E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            states: self.states.clone(),
            initial: self.initial.clone(),
            track_history: self.track_history,
            transitions: self.transitions.clone(),
            on_enter: self.on_enter.clone(),
            on_exit: self.on_exit.clone(),
        }
    }
}

impl<E> MachineDefinition<E> {
    /// Machine name, recorded on every instance it creates.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared states, in declaration order.
    pub fn states(&self) -> &[String] {
        &self.states
    }

    /// True when `state` is declared.
    pub fn has_state(&self, state: &str) -> bool {
        self.states.iter().any(|s| s == state)
    }

    /// State every new instance starts in.
    pub fn initial(&self) -> &str {
        &self.initial
    }

    /// Whether instances record visited states and a transition log.
    pub fn tracks_history(&self) -> bool {
        self.track_history
    }

    /// Guarded operations, inherited ones first.
    pub fn transitions(&self) -> &[TransitionDescriptor] {
        &self.transitions
    }

    /// The descriptor for `operation`, if declared.
    pub fn transition(&self, operation: &str) -> Option<&TransitionDescriptor> {
        self.transitions.iter().find(|t| t.operation == operation)
    }

    /// A fresh instance in the initial state.
    pub fn instantiate(&self) -> MachineInstance {
        MachineInstance::new(&self.name, &self.initial, self.track_history)
    }

    /// True when `operation` exists and allows the instance's current state.
    pub fn can_invoke(&self, instance: &MachineInstance, operation: &str) -> bool {
        self.transition(operation)
            .is_some_and(|t| t.allows(instance.state()))
    }

    fn check_owned(&self, instance: &MachineInstance, operation: &str) -> Result<(), TransitionError> {
        if instance.machine_name() == self.name && self.has_state(instance.state()) {
            return Ok(());
        }
        tracing::warn!(
            machine = %self.name,
            operation,
            instance_machine = %instance.machine_name(),
            state = %instance.state(),
            "foreign instance rejected"
        );
        Err(TransitionError::ForeignInstance {
            machine: self.name.clone(),
            operation: operation.to_string(),
            instance_machine: instance.machine_name().to_string(),
            state: instance.state().to_string(),
        })
    }

    /// Serializable summary of the definition.
    pub fn describe(&self) -> MachineDescription {
        MachineDescription {
            name: self.name.clone(),
            states: self.states.clone(),
            initial: self.initial.clone(),
            track_history: self.track_history,
            transitions: self.transitions.clone(),
        }
    }

    /// Run `body` as the guarded operation `operation`.
    ///
    /// The entity's instance must come from this definition. The body only
    /// runs when the current state is an allowed source. If it fails, the
    /// state is unchanged. If it succeeds: the exit hook of the old state
    /// runs, the target state is committed, then the enter hook of the new
    /// state runs. A failing exit hook aborts before the commit; a failing
    /// enter hook is reported after it.
    ///
    /// The body and the exit hook must leave the instance alone. If either
    /// replaces it (or runs another operation on the same entity), nothing
    /// is committed and [`TransitionError::InstanceReplaced`] is returned.
    pub fn invoke<T, F>(&self, entity: &mut E, operation: &str, body: F) -> Result<T, Fault>
    where
        E: Stateful,
        F: FnOnce(&mut E) -> Result<T, Fault>,
    {
        self.check_owned(entity.machine(), operation)?;

        let transition = self
            .transition(operation)
            .ok_or_else(|| TransitionError::UnknownOperation {
                machine: self.name.clone(),
                operation: operation.to_string(),
            })?;

        let current = entity.state().to_string();
        if !transition.allows(&current) {
            tracing::warn!(
                machine = %self.name,
                operation,
                state = %current,
                "transition rejected"
            );
            return Err(TransitionError::InvalidTransition {
                machine: self.name.clone(),
                operation: operation.to_string(),
                current,
                target: transition.target.clone(),
                sources: transition.sources.iter().cloned().collect(),
            }
            .into());
        }

        let stamp = entity.machine().stamp();
        let replaced = |entity: &E| {
            if entity.machine().stamp() == stamp {
                return Ok(());
            }
            tracing::warn!(machine = %self.name, operation, "instance replaced during operation");
            Err(TransitionError::InstanceReplaced {
                machine: self.name.clone(),
                operation: operation.to_string(),
            })
        };

        let result = body(entity)?;
        replaced(&*entity)?;

        if let Some(hook) = self.on_exit.get(&current) {
            hook(entity)?;
            replaced(&*entity)?;
        }
        entity.machine_mut().commit(operation, &transition.target);
        tracing::debug!(
            machine = %self.name,
            operation,
            from = %current,
            to = %transition.target,
            "transition committed"
        );
        if let Some(hook) = self.on_enter.get(&transition.target) {
            hook(entity)?;
        }

        Ok(result)
    }
}

impl<E> fmt::Debug for MachineDefinition<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MachineDefinition")
            .field("name", &self.name)
            .field("states", &self.states)
            .field("initial", &self.initial)
            .field("track_history", &self.track_history)
            .field("transitions", &self.transitions)
            .field("on_enter", &self.on_enter.keys().collect::<BTreeSet<_>>())
            .field("on_exit", &self.on_exit.keys().collect::<BTreeSet<_>>())
            .finish()
    }
}

/// What a definition declares, without its hooks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MachineDescription {
    pub name: String,
    pub states: Vec<String>,
    pub initial: String,
    pub track_history: bool,
    pub transitions: Vec<TransitionDescriptor>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::builtin;
    use pretty_assertions::assert_eq;

    struct Door {
        machine: MachineInstance,
        events: Vec<String>,
    }

    impl Stateful for Door {
        fn machine(&self) -> &MachineInstance {
            &self.machine
        }

        fn machine_mut(&mut self) -> &mut MachineInstance {
            &mut self.machine
        }
    }

    fn door_machine() -> MachineDefinition<Door> {
        MachineBuilder::new("Door")
            .states(["closed", "open"])
            .initial("closed")
            .track_history(true)
            .transition(TransitionBuilder::new("open").from("closed").to("open"))
            .transition(TransitionBuilder::new("close").from("open").to("closed"))
            .on_exit("closed", |door: &mut Door| {
                door.events.push(format!("exit closed while {}", door.state()));
                Ok(())
            })
            .on_enter("open", |door: &mut Door| {
                door.events.push(format!("enter open while {}", door.state()));
                Ok(())
            })
            .build()
            .unwrap()
    }

    fn door(definition: &MachineDefinition<Door>) -> Door {
        Door {
            machine: definition.instantiate(),
            events: Vec::new(),
        }
    }

    #[test]
    fn hooks_see_old_then_new_state() {
        let machine = door_machine();
        let mut door = door(&machine);

        machine
            .invoke(&mut door, "open", |d| {
                d.events.push("body".to_string());
                Ok(())
            })
            .unwrap();

        assert_eq!(
            door.events,
            ["body", "exit closed while closed", "enter open while open"]
        );
        assert_eq!(door.history(), ["closed", "open"]);
    }

    #[test]
    fn rejected_transition_never_runs_body() {
        let machine = door_machine();
        let mut door = door(&machine);
        let mut ran = false;

        let fault = machine
            .invoke(&mut door, "close", |_| {
                ran = true;
                Ok(())
            })
            .unwrap_err();

        assert!(!ran);
        assert!(fault.is(&builtin::invalid_transition_error()));
        assert_eq!(
            fault.message(),
            "Cannot transition from 'closed' to 'closed' via 'close'. Valid source state(s): open"
        );
        assert_eq!(door.state(), "closed");
    }

    #[test]
    fn failing_body_leaves_state_unchanged() {
        let machine = door_machine();
        let mut door = door(&machine);
        let stuck = builtin::exception().subtype("StuckError");
        let raised = stuck.clone();

        let fault = machine
            .invoke(&mut door, "open", |_| -> Result<(), Fault> {
                Err(Fault::new(raised, "jammed"))
            })
            .unwrap_err();

        assert_eq!(fault.error_type(), &stuck);
        assert_eq!(door.state(), "closed");
        assert_eq!(door.history(), ["closed"]);
        assert!(door.events.is_empty());
    }

    #[test]
    fn failing_enter_hook_does_not_roll_back() {
        let alarm = builtin::exception().subtype("AlarmError");
        let raised = alarm.clone();
        let machine = MachineBuilder::<MachineInstance>::new("Door")
            .states(["closed", "open"])
            .initial("closed")
            .transition(TransitionBuilder::new("open").from("closed").to("open"))
            .on_enter("open", move |_| Err(Fault::new(raised.clone(), "alarm")))
            .build()
            .unwrap();
        let mut instance = machine.instantiate();

        let fault = machine.invoke(&mut instance, "open", |_| Ok(())).unwrap_err();
        assert_eq!(fault.error_type(), &alarm);
        assert_eq!(instance.state(), "open");
    }

    fn lock_machine() -> MachineDefinition<MachineInstance> {
        MachineBuilder::new("Lock")
            .states(["closed", "locked"])
            .initial("closed")
            .track_history(true)
            .transition(TransitionBuilder::new("lock").from("closed").to("locked"))
            .build()
            .unwrap()
    }

    fn plain_door() -> MachineDefinition<MachineInstance> {
        MachineBuilder::new("Door")
            .states(["closed", "open"])
            .initial("closed")
            .track_history(true)
            .transition(TransitionBuilder::new("open").from("closed").to("open"))
            .build()
            .unwrap()
    }

    #[test]
    fn instance_of_another_machine_is_rejected() {
        let door = plain_door();
        let mut lock = lock_machine().instantiate();
        let mut ran = false;

        let fault = door
            .invoke(&mut lock, "open", |_| {
                ran = true;
                Ok(())
            })
            .unwrap_err();

        assert!(!ran);
        assert!(fault.is(&builtin::invalid_state_error()));
        assert_eq!(
            fault.message(),
            "StateMachine 'Door' cannot run 'open' on an instance of 'Lock' in state 'closed'"
        );
        assert_eq!(lock.state(), "closed");
        assert_eq!(lock.history(), ["closed"]);
    }

    #[test]
    fn body_swapping_the_instance_commits_nothing() {
        let door = plain_door();
        let lock = lock_machine();
        let mut locked = lock.instantiate();
        lock.invoke(&mut locked, "lock", |_| Ok(())).unwrap();

        let mut instance = door.instantiate();
        let fault = door
            .invoke(&mut instance, "open", |inst| {
                *inst = locked.clone();
                Ok(())
            })
            .unwrap_err();

        assert!(matches!(
            fault.cause::<TransitionError>(),
            Some(TransitionError::InstanceReplaced { .. })
        ));
        assert_eq!(instance, locked);
        assert_eq!(instance.history(), ["closed", "locked"]);
    }

    #[test]
    fn body_restoring_an_older_clone_is_detected() {
        let door = MachineBuilder::<MachineInstance>::new("Door")
            .states(["closed", "open"])
            .initial("closed")
            .transition(TransitionBuilder::new("open").from("closed").to("open"))
            .transition(TransitionBuilder::new("close").from("open").to("closed"))
            .build()
            .unwrap();
        let mut instance = door.instantiate();
        let stale = instance.clone();
        door.invoke(&mut instance, "open", |_| Ok(())).unwrap();
        door.invoke(&mut instance, "close", |_| Ok(())).unwrap();

        let result = door.invoke(&mut instance, "open", |inst| {
            *inst = stale.clone();
            Ok(())
        });
        assert!(result.is_err());
        assert_eq!(instance.state(), "closed");
    }

    #[test]
    fn nested_operation_on_same_entity_is_rejected() {
        let door = MachineBuilder::<MachineInstance>::new("Door")
            .states(["closed", "open"])
            .initial("closed")
            .track_history(true)
            .transition(TransitionBuilder::new("open").from("closed").to("open"))
            .transition(TransitionBuilder::new("reopen").from_any(["closed", "open"]).to("open"))
            .build()
            .unwrap();
        let mut instance = door.instantiate();

        let fault = door
            .invoke(&mut instance, "reopen", |inst| door.invoke(inst, "open", |_| Ok(())))
            .unwrap_err();

        assert!(fault.is(&builtin::invalid_state_error()));
        assert_eq!(instance.history(), ["closed", "open"]);
    }

    #[test]
    fn failing_exit_hook_aborts_before_commit() {
        let alarm = builtin::exception().subtype("AlarmError");
        let raised = alarm.clone();
        let machine = MachineBuilder::new("Door")
            .states(["closed", "open"])
            .initial("closed")
            .track_history(true)
            .transition(TransitionBuilder::new("open").from("closed").to("open"))
            .on_exit("closed", move |_: &mut Door| Err(Fault::new(raised.clone(), "stuck")))
            .on_enter("open", |door: &mut Door| {
                door.events.push("entered open".to_string());
                Ok(())
            })
            .build()
            .unwrap();
        let mut door = door(&machine);

        let fault = machine.invoke(&mut door, "open", |_| Ok(())).unwrap_err();

        assert_eq!(fault.error_type(), &alarm);
        assert_eq!(door.state(), "closed");
        assert_eq!(door.history(), ["closed"]);
        assert!(door.machine().transitions().is_empty());
        assert!(door.events.is_empty());
    }

    #[test]
    fn derived_definition_inherits_and_overrides_hooks() {
        let base = door_machine();
        let derived = MachineBuilder::new("Door")
            .extends(&base)
            .on_enter("open", |door: &mut Door| {
                door.events.push("derived enter open".to_string());
                Ok(())
            })
            .build()
            .unwrap();
        let mut door = door(&derived);

        derived.invoke(&mut door, "open", |_| Ok(())).unwrap();

        assert_eq!(
            door.events,
            ["exit closed while closed", "derived enter open"]
        );
    }

    #[test]
    fn unknown_operation_is_rejected() {
        let machine = door_machine();
        let mut door = door(&machine);
        let fault = machine.invoke(&mut door, "slam", |_| Ok(())).unwrap_err();
        assert!(matches!(
            fault.cause::<TransitionError>(),
            Some(TransitionError::UnknownOperation { .. })
        ));
    }

    #[test]
    fn body_result_is_returned() {
        let machine = door_machine();
        let mut door = door(&machine);
        let value = machine.invoke(&mut door, "open", |_| Ok(42)).unwrap();
        assert_eq!(value, 42);
        assert!(machine.can_invoke(door.machine(), "close"));
        assert!(!machine.can_invoke(door.machine(), "open"));
    }

    fn build_err(builder: MachineBuilder<MachineInstance>) -> String {
        builder.build().unwrap_err().to_string()
    }

    #[test]
    fn definition_errors() {
        assert_eq!(
            build_err(MachineBuilder::new("Empty").initial("x")),
            "StateMachine 'Empty': must define at least one state"
        );
        assert_eq!(
            build_err(MachineBuilder::new("NoInitial").states(["a"])),
            "StateMachine 'NoInitial': must define an initial state"
        );
        assert_eq!(
            build_err(MachineBuilder::new("Bad").states(["a", "b"]).initial("c")),
            "StateMachine 'Bad': initial state 'c' is not in the defined states [a, b]"
        );
        assert_eq!(
            build_err(MachineBuilder::new("Dup").states(["a", "a"]).initial("a")),
            "StateMachine 'Dup': declares state 'a' more than once"
        );
    }

    #[test]
    fn every_bad_reference_is_reported() {
        let message = build_err(
            MachineBuilder::new("Order")
                .states(["pending", "paid"])
                .initial("pending")
                .transition(TransitionBuilder::new("ship").from("paid").from("packed").to("shipped"))
                .on_enter("lost", |_| Ok(())),
        );
        assert_eq!(
            message,
            "StateMachine 'Order': \
             transition 'ship' references invalid from_state(s): [packed]; \
             transition 'ship' references invalid to_state: 'shipped'; \
             on_enter hook is keyed by undeclared state 'lost'"
        );
    }

    #[test]
    fn incomplete_transition_is_rejected() {
        let err = MachineBuilder::<MachineInstance>::new("Order")
            .states(["pending"])
            .initial("pending")
            .transition(TransitionBuilder::new("pay").to("pending"))
            .build()
            .unwrap_err();
        assert!(matches!(err, DefinitionError::IncompleteTransition { .. }));
    }

    #[test]
    fn derived_definition_inherits_and_overrides() {
        let base = MachineBuilder::<MachineInstance>::new("Order")
            .states(["pending", "paid", "shipped"])
            .initial("pending")
            .transition(TransitionBuilder::new("pay").from("pending").to("paid"))
            .transition(TransitionBuilder::new("ship").from("paid").to("shipped"))
            .build()
            .unwrap();

        let derived = MachineBuilder::new("ExpressOrder")
            .extends(&base)
            .track_history(true)
            .transition(TransitionBuilder::new("ship").from("pending").from("paid").to("shipped"))
            .build()
            .unwrap();

        assert_eq!(derived.states(), base.states());
        assert_eq!(derived.initial(), "pending");
        assert_eq!(
            derived
                .transitions()
                .iter()
                .map(|t| t.operation.as_str())
                .collect::<Vec<_>>(),
            ["pay", "ship"]
        );
        let mut instance = derived.instantiate();
        derived.invoke(&mut instance, "ship", |_| Ok(())).unwrap();
        assert_eq!(instance.history(), ["pending", "shipped"]);
    }

    #[test]
    fn inherited_operations_are_checked_against_new_states() {
        let base = MachineBuilder::<MachineInstance>::new("Order")
            .states(["pending", "paid"])
            .initial("pending")
            .transition(TransitionBuilder::new("pay").from("pending").to("paid"))
            .build()
            .unwrap();
        let err = MachineBuilder::new("Quote")
            .extends(&base)
            .states(["pending", "accepted"])
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("transition 'pay' references invalid to_state: 'paid'"));
    }

    #[test]
    fn description_serializes() {
        let description = door_machine().describe();
        let json = serde_json::to_value(&description).unwrap();
        assert_eq!(json["initial"], "closed");
        assert_eq!(json["transitions"][0]["operation"], "open");
        assert_eq!(json["transitions"][0]["sources"][0], "closed");
        assert_eq!(json["transitions"][0]["target"], "open");
    }
}
