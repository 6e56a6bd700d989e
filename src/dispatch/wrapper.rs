//! The error-dispatching wrapper.

use super::handlers::{HandlerMap, Strategy};
use super::sink::{DiagnosticsSink, TracingSink};
use crate::contract::{Args, Callable, ContractMetadata};
use crate::core::{Fault, Value};
use std::fmt;
use std::sync::Arc;

/// Wraps a callable and applies the first matching strategy to any fault
/// it returns.
///
/// Faults no handler matches pass through unchanged. Contract metadata of
/// the wrapped callable stays reachable through [`Callable::contract`].
///
/// # Example
///
/// ```rust
/// use specwright::contract::{Args, Callable};
/// use specwright::core::{builtin, Fault, Value};
/// use specwright::dispatch::{Dispatch, HandlerMap};
///
/// let value_error = builtin::exception().subtype("ValueError");
/// let raised = value_error.clone();
/// let parse = move |_: Args| -> Result<Value, Fault> { Err(Fault::new(raised.clone(), "bad")) };
///
/// let handlers = HandlerMap::builder().value(value_error, 0_i64).build().unwrap();
/// let safe = Dispatch::wrap(handlers, parse);
/// assert_eq!(safe.call(Args::new()).unwrap(), Value::Int(0));
/// ```
#[derive(Clone)]
pub struct Dispatch<C> {
    handlers: HandlerMap,
    inner: C,
    name: Option<String>,
    sink: Arc<dyn DiagnosticsSink>,
}

impl<C: Callable> Dispatch<C> {
    /// Wrap `inner`, logging through [`TracingSink`].
    pub fn wrap(handlers: HandlerMap, inner: C) -> Self {
        Self {
            handlers,
            inner,
            name: None,
            sink: Arc::new(TracingSink),
        }
    }

    /// Report faults under `qualname` instead of the wrapped callable's
    /// name. Plain closures have none of their own.
    pub fn named(mut self, qualname: impl Into<String>) -> Self {
        self.name = Some(qualname.into());
        self
    }

    /// Send `Log` records to `sink` instead of `tracing`.
    pub fn with_sink(mut self, sink: impl DiagnosticsSink + 'static) -> Self {
        self.sink = Arc::new(sink);
        self
    }

    /// The handler map, in match order.
    pub fn handlers(&self) -> &HandlerMap {
        &self.handlers
    }

    /// The wrapped callable.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    fn handle(&self, fault: Fault) -> Result<Value, Fault> {
        let Some((handler, strategy)) = self.handlers.resolve(&fault) else {
            return Err(fault);
        };
        tracing::debug!(
            function = self.qualname(),
            error_type = %fault.error_type(),
            %handler,
            strategy = strategy.name(),
            "fault matched handler"
        );
        match strategy {
            Strategy::Ignore => Ok(Value::None),
            Strategy::Log => {
                self.sink.record(self.qualname(), &fault);
                Err(fault)
            }
            Strategy::Call(recover) => recover(fault),
            Strategy::Value(value) => Ok(value.clone()),
        }
    }
}

impl<C: Callable> Callable for Dispatch<C> {
    fn call(&self, args: Args) -> Result<Value, Fault> {
        self.inner.call(args).or_else(|fault| self.handle(fault))
    }

    fn qualname(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| self.inner.qualname())
    }

    fn contract(&self) -> Option<&ContractMetadata> {
        self.inner.contract()
    }
}

impl<C> fmt::Debug for Dispatch<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatch")
            .field("handlers", &self.handlers)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
