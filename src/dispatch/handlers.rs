//! Handling strategies and the ordered handler map.

use crate::core::{DefinitionError, ErrorType, Fault, Value};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

type Recovery = dyn Fn(Fault) -> Result<Value, Fault> + Send + Sync;

/// What to do with a fault whose type matches a handler.
#[derive(Clone)]
pub enum Strategy {
    /// Suppress the fault; the call returns `Value::None`.
    Ignore,
    /// Record the fault with its backtrace, then return it unchanged.
    Log,
    /// Hand the fault to a function. `Ok` becomes the call's result; `Err`
    /// replaces the original fault.
    Call(Arc<Recovery>),
    /// Suppress the fault and return this value.
    Value(Value),
}

impl Strategy {
    /// Recover with `f`.
    pub fn call<F>(f: F) -> Self
    where
        F: Fn(Fault) -> Result<Value, Fault> + Send + Sync + 'static,
    {
        Self::Call(Arc::new(f))
    }

    /// Return `value` instead of the fault.
    pub fn value(value: impl Into<Value>) -> Self {
        Self::Value(value.into())
    }

    /// Strategy name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ignore => "ignore",
            Self::Log => "log",
            Self::Call(_) => "call",
            Self::Value(_) => "value",
        }
    }
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Call(_) => f.write_str("Call(<fn>)"),
            Self::Ignore => f.write_str("Ignore"),
            Self::Log => f.write_str("Log"),
        }
    }
}

/// Error types mapped to strategies, in declaration order.
///
/// The first entry whose type the fault is assignable to wins. A broad type
/// listed before a narrower one therefore shadows it.
///
/// # Example
///
/// ```rust
/// use specwright::core::{builtin, Fault};
/// use specwright::dispatch::{HandlerMap, Strategy};
///
/// let lookup = builtin::exception().subtype("LookupError");
/// let key = lookup.subtype("KeyError");
///
/// let handlers = HandlerMap::builder()
///     .on(key.clone(), Strategy::value(-1_i64))
///     .on(lookup.clone(), Strategy::Ignore)
///     .build()
///     .unwrap();
///
/// let (matched, _) = handlers.resolve(&Fault::new(key.clone(), "k")).unwrap();
/// assert_eq!(matched, &key);
/// ```
#[derive(Clone, Debug, Default)]
pub struct HandlerMap {
    entries: Vec<(ErrorType, Strategy)>,
}

impl HandlerMap {
    /// Start an empty map.
    pub fn builder() -> HandlerMapBuilder {
        HandlerMapBuilder::default()
    }

    /// Entries in match order.
    pub fn entries(&self) -> &[(ErrorType, Strategy)] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry whose type `fault` is assignable to.
    pub fn resolve(&self, fault: &Fault) -> Option<(&ErrorType, &Strategy)> {
        self.entries
            .iter()
            .find(|(ty, _)| fault.is(ty))
            .map(|(ty, strategy)| (ty, strategy))
    }
}

/// Builder for [`HandlerMap`]. Keys are checked in `build`.
#[derive(Clone, Debug, Default)]
pub struct HandlerMapBuilder {
    entries: Vec<(ErrorType, Strategy)>,
}

impl HandlerMapBuilder {
    /// Append an entry. Earlier entries win.
    pub fn on(mut self, error_type: ErrorType, strategy: Strategy) -> Self {
        self.entries.push((error_type, strategy));
        self
    }

    /// Swallow `error_type`, returning None.
    pub fn ignore(self, error_type: ErrorType) -> Self {
        self.on(error_type, Strategy::Ignore)
    }

    /// Record `error_type` to the sink and re-raise it.
    pub fn log(self, error_type: ErrorType) -> Self {
        self.on(error_type, Strategy::Log)
    }

    /// Hand `error_type` to `f`.
    pub fn recover<F>(self, error_type: ErrorType, f: F) -> Self
    where
        F: Fn(Fault) -> Result<Value, Fault> + Send + Sync + 'static,
    {
        self.on(error_type, Strategy::call(f))
    }

    /// Replace `error_type` with `value`.
    pub fn value(self, error_type: ErrorType, value: impl Into<Value>) -> Self {
        self.on(error_type, Strategy::value(value))
    }

    /// Each error type may appear once.
    pub fn build(self) -> Result<HandlerMap, DefinitionError> {
        let mut seen = HashSet::new();
        if let Some((dup, _)) = self.entries.iter().find(|(ty, _)| !seen.insert(ty.clone())) {
            return Err(DefinitionError::InvalidHandler {
                reason: format!("error type '{dup}' is listed more than once"),
            });
        }
        Ok(HandlerMap {
            entries: self.entries,
        })
    }
}
