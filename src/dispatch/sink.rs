//! Where the `Log` strategy records faults.

use crate::core::Fault;
use std::sync::{Arc, Mutex};

/// Receives faults handled with [`Strategy::Log`](super::Strategy::Log).
pub trait DiagnosticsSink: Send + Sync {
    fn record(&self, qualname: &str, fault: &Fault);
}

/// Emits each fault as a `tracing` error event, backtrace included.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn record(&self, qualname: &str, fault: &Fault) {
        tracing::error!(
            function = qualname,
            error_type = %fault.error_type(),
            backtrace = %fault.backtrace(),
            "Error in '{qualname}': {}",
            fault.message()
        );
    }
}

/// A fault captured by [`MemorySink`].
#[derive(Clone, Debug)]
pub struct LoggedFault {
    pub qualname: String,
    pub fault: Fault,
}

/// Keeps every recorded fault in memory. Clones share the same buffer.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<LoggedFault>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far, oldest first.
    pub fn records(&self) -> Vec<LoggedFault> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl DiagnosticsSink for MemorySink {
    fn record(&self, qualname: &str, fault: &Fault) {
        let entry = LoggedFault {
            qualname: qualname.to_string(),
            fault: fault.clone(),
        };
        match self.records.lock() {
            Ok(mut records) => records.push(entry),
            Err(poisoned) => poisoned.into_inner().push(entry),
        }
    }
}
