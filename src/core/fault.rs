//! Error types and raised faults.
//!
//! An `ErrorType` is a node in an explicit single-inheritance hierarchy.
//! Handler matching asks whether a fault's type is assignable to a declared
//! type, which walks the parent chain; types compare by identity, not name.

use std::backtrace::Backtrace;
use std::error::Error;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

struct ErrorTypeInner {
    name: String,
    parent: Option<ErrorType>,
}

/// A declared error type.
///
/// # Example
///
/// ```rust
/// use specwright::core::fault::builtin;
///
/// let lookup = builtin::exception().subtype("LookupError");
/// let key = lookup.subtype("KeyError");
///
/// assert!(key.is_assignable_to(&lookup));
/// assert!(key.is_assignable_to(&builtin::exception()));
/// assert!(!lookup.is_assignable_to(&key));
/// ```
#[derive(Clone)]
pub struct ErrorType(Arc<ErrorTypeInner>);

impl ErrorType {
    /// Declare a new root type. Most types should derive from
    /// [`builtin::exception`] instead.
    pub fn root(name: impl Into<String>) -> Self {
        Self(Arc::new(ErrorTypeInner {
            name: name.into(),
            parent: None,
        }))
    }

    /// Declare a new type whose parent is `self`.
    pub fn subtype(&self, name: impl Into<String>) -> Self {
        Self(Arc::new(ErrorTypeInner {
            name: name.into(),
            parent: Some(self.clone()),
        }))
    }

    /// Type name, e.g. `InputValidationError`.
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Direct parent; None for the root.
    pub fn parent(&self) -> Option<&ErrorType> {
        self.0.parent.as_ref()
    }

    /// This type followed by each of its ancestors, nearest first.
    pub fn lineage(&self) -> impl Iterator<Item = &ErrorType> {
        std::iter::successors(Some(self), |ty| ty.parent())
    }

    /// True when `self` is `ancestor` or derives from it.
    pub fn is_assignable_to(&self, ancestor: &ErrorType) -> bool {
        self.lineage().any(|ty| ty == ancestor)
    }
}

impl PartialEq for ErrorType {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ErrorType {}

impl Hash for ErrorType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Arc::as_ptr(&self.0), state);
    }
}

impl fmt::Debug for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ErrorType({})", self.name())
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error types raised by this crate's own engines.
///
/// ```text
/// Exception
/// └── SpecwrightError
///     ├── SpecError
///     │   ├── InputValidationError
///     │   ├── OutputValidationError
///     │   ├── MissingDocstringError
///     │   └── MissingTypeHintError
///     ├── HandlingStrategyError
///     ├── InvalidTransitionError
///     ├── InvalidStateError
///     ├── MissingTestsError
///     ├── InvalidTestNameError
///     └── CheckpointError
/// ```
pub mod builtin {
    use super::ErrorType;
    use std::sync::OnceLock;

    macro_rules! builtin_type {
        ($(#[$meta:meta])* $fn_name:ident => $name:literal under $parent:ident) => {
            $(#[$meta])*
            pub fn $fn_name() -> ErrorType {
                static CELL: OnceLock<ErrorType> = OnceLock::new();
                CELL.get_or_init(|| $parent().subtype($name)).clone()
            }
        };
    }

    /// Root of every error type.
    pub fn exception() -> ErrorType {
        static CELL: OnceLock<ErrorType> = OnceLock::new();
        CELL.get_or_init(|| ErrorType::root("Exception")).clone()
    }

    builtin_type!(
        /// Base of every error raised by this crate.
        specwright_error => "SpecwrightError" under exception
    );
    builtin_type!(
        /// Base of contract declaration and validation errors.
        spec_error => "SpecError" under specwright_error
    );
    builtin_type!(input_validation_error => "InputValidationError" under spec_error);
    builtin_type!(output_validation_error => "OutputValidationError" under spec_error);
    builtin_type!(missing_docstring_error => "MissingDocstringError" under spec_error);
    builtin_type!(missing_type_hint_error => "MissingTypeHintError" under spec_error);
    builtin_type!(handling_strategy_error => "HandlingStrategyError" under specwright_error);
    builtin_type!(invalid_transition_error => "InvalidTransitionError" under specwright_error);
    builtin_type!(invalid_state_error => "InvalidStateError" under specwright_error);
    builtin_type!(missing_tests_error => "MissingTestsError" under specwright_error);
    builtin_type!(invalid_test_name_error => "InvalidTestNameError" under specwright_error);
    builtin_type!(checkpoint_error => "CheckpointError" under specwright_error);

    /// Every built-in type, root first.
    pub fn all() -> Vec<ErrorType> {
        vec![
            exception(),
            specwright_error(),
            spec_error(),
            input_validation_error(),
            output_validation_error(),
            missing_docstring_error(),
            missing_type_hint_error(),
            handling_strategy_error(),
            invalid_transition_error(),
            invalid_state_error(),
            missing_tests_error(),
            invalid_test_name_error(),
            checkpoint_error(),
        ]
    }
}

/// A raised error: its type, a message, an optional typed cause and the
/// backtrace captured where it was raised.
#[derive(Clone)]
pub struct Fault {
    error_type: ErrorType,
    message: String,
    cause: Option<Arc<dyn Error + Send + Sync>>,
    backtrace: Arc<Backtrace>,
}

impl Fault {
    /// Raise `error_type` with `message`.
    pub fn new(error_type: ErrorType, message: impl Into<String>) -> Self {
        Self {
            error_type,
            message: message.into(),
            cause: None,
            backtrace: Arc::new(Backtrace::capture()),
        }
    }

    /// Raise `error` as a fault of type `error_type`, keeping it as the cause.
    pub fn from_error<E>(error_type: ErrorType, error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self::new(error_type, error.to_string()).with_cause(error)
    }

    /// Attach a typed cause, reachable through `cause`.
    pub fn with_cause<E>(mut self, cause: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        self.cause = Some(Arc::new(cause));
        self
    }

    /// Type handlers match against.
    pub fn error_type(&self) -> &ErrorType {
        &self.error_type
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// True when this fault's type is `ty` or derives from it.
    pub fn is(&self, ty: &ErrorType) -> bool {
        self.error_type.is_assignable_to(ty)
    }

    /// The typed cause, if it is an `E`.
    pub fn cause<E: Error + 'static>(&self) -> Option<&E> {
        self.cause.as_deref().and_then(|c| c.downcast_ref::<E>())
    }

    /// Captured where the fault was raised.
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error_type, self.message)
    }
}

impl fmt::Debug for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fault")
            .field("error_type", &self.error_type.name())
            .field("message", &self.message)
            .field("cause", &self.cause)
            .finish()
    }
}

impl Error for Fault {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause
            .as_deref()
            .map(|c| c as &(dyn Error + 'static))
    }
}
