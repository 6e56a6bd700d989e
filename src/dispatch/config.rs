//! Handler maps declared as data.
//!
//! A configuration names error types as strings; they are resolved against
//! an [`ErrorRegistry`] when the handler map is built.

use super::handlers::{HandlerMap, Strategy};
use crate::core::{builtin, DefinitionError, ErrorType, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Error types addressable by name.
#[derive(Clone, Debug, Default)]
pub struct ErrorRegistry {
    types: BTreeMap<String, ErrorType>,
}

impl ErrorRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in error type.
    pub fn with_builtins() -> Self {
        builtin::all()
            .into_iter()
            .fold(Self::new(), |registry, ty| registry.declare(ty))
    }

    /// Make `error_type` addressable by its name, replacing any previous
    /// type of the same name.
    pub fn declare(mut self, error_type: ErrorType) -> Self {
        self.types.insert(error_type.name().to_string(), error_type);
        self
    }

    /// Registered type `name`.
    pub fn get(&self, name: &str) -> Option<&ErrorType> {
        self.types.get(name)
    }

    /// Registered type `name`, or an `InvalidHandler` error.
    pub fn resolve(&self, name: &str) -> Result<ErrorType, DefinitionError> {
        self.get(name)
            .cloned()
            .ok_or_else(|| DefinitionError::InvalidHandler {
                reason: format!("'{name}' is not a known error type"),
            })
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }
}

/// Strategy as written in configuration: `"ignore"`, `"log"` or
/// `{ "value": <literal> }`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyConfig {
    Ignore,
    Log,
    Value(serde_json::Value),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HandlerEntry {
    pub error: String,
    pub strategy: StrategyConfig,
}

/// Ordered handler entries.
///
/// # Example
///
/// ```rust
/// use specwright::dispatch::{ErrorRegistry, HandlerConfig};
///
/// let config = HandlerConfig::from_json(
///     r#"[
///         { "error": "InputValidationError", "strategy": { "value": 0 } },
///         { "error": "SpecError", "strategy": "log" }
///     ]"#,
/// )
/// .unwrap();
///
/// let handlers = config.resolve(&ErrorRegistry::with_builtins()).unwrap();
/// assert_eq!(handlers.len(), 2);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandlerConfig {
    pub entries: Vec<HandlerEntry>,
}

impl HandlerConfig {
    /// Parse the JSON list form. Names are resolved later.
    pub fn from_json(json: &str) -> Result<Self, DefinitionError> {
        serde_json::from_str(json).map_err(|e| DefinitionError::InvalidHandler {
            reason: e.to_string(),
        })
    }

    /// Resolve every name and build the handler map, keeping entry order.
    pub fn resolve(&self, registry: &ErrorRegistry) -> Result<HandlerMap, DefinitionError> {
        self.entries
            .iter()
            .try_fold(HandlerMap::builder(), |builder, entry| {
                let error_type = registry.resolve(&entry.error)?;
                let strategy = match &entry.strategy {
                    StrategyConfig::Ignore => Strategy::Ignore,
                    StrategyConfig::Log => Strategy::Log,
                    StrategyConfig::Value(literal) => Strategy::Value(from_json(literal)?),
                };
                Ok::<_, DefinitionError>(builder.on(error_type, strategy))
            })?
            .build()
    }
}

/// Convert a configured literal. Object keys keep their file order.
fn from_json(json: &serde_json::Value) -> Result<Value, DefinitionError> {
    use serde_json::Value as Json;
    Ok(match json {
        Json::Null => Value::None,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None if n.is_f64() => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            None => {
                return Err(DefinitionError::InvalidHandler {
                    reason: format!("integer literal {n} does not fit in a 64-bit signed int"),
                })
            }
        },
        Json::String(s) => Value::Str(s.clone()),
        Json::Array(items) => Value::List(items.iter().map(from_json).collect::<Result<_, _>>()?),
        Json::Object(fields) => Value::Map(
            fields
                .iter()
                .map(|(k, v)| Ok((Value::Str(k.clone()), from_json(v)?)))
                .collect::<Result<_, DefinitionError>>()?,
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Fault;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_every_strategy_form() {
        let config = HandlerConfig::from_json(
            r#"[
                { "error": "InputValidationError", "strategy": "ignore" },
                { "error": "OutputValidationError", "strategy": "log" },
                { "error": "SpecError", "strategy": { "value": [1, 2.5, null] } }
            ]"#,
        )
        .unwrap();
        assert_eq!(
            config.entries[2].strategy,
            StrategyConfig::Value(serde_json::json!([1, 2.5, null]))
        );

        let handlers = config.resolve(&ErrorRegistry::with_builtins()).unwrap();
        let fault = Fault::new(builtin::missing_docstring_error(), "no doc");
        match handlers.resolve(&fault) {
            Some((_, Strategy::Value(value))) => assert_eq!(
                value,
                &Value::List(vec![Value::Int(1), Value::Float(2.5), Value::None])
            ),
            other => panic!("unexpected resolution: {other:?}"),
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        let config =
            HandlerConfig::from_json(r#"[{ "error": "ValueError", "strategy": "ignore" }]"#)
                .unwrap();
        let err = config.resolve(&ErrorRegistry::with_builtins()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid handler configuration: 'ValueError' is not a known error type"
        );
    }

    #[test]
    fn declared_types_resolve() {
        let value_error = builtin::exception().subtype("ValueError");
        let registry = ErrorRegistry::with_builtins().declare(value_error.clone());
        assert_eq!(registry.resolve("ValueError").unwrap(), value_error);
    }

    fn resolved_value(json: &str) -> Result<Value, DefinitionError> {
        let handlers = HandlerConfig::from_json(json)?.resolve(&ErrorRegistry::with_builtins())?;
        match handlers.entries().first() {
            Some((_, Strategy::Value(value))) => Ok(value.clone()),
            other => panic!("expected a value strategy, got {other:?}"),
        }
    }

    #[test]
    fn object_literals_keep_file_order() {
        let value = resolved_value(
            r#"[{ "error": "SpecError", "strategy": { "value": { "zeta": 1, "alpha": 2 } } }]"#,
        )
        .unwrap();
        assert_eq!(
            value,
            Value::Map(vec![
                (Value::from("zeta"), Value::Int(1)),
                (Value::from("alpha"), Value::Int(2)),
            ])
        );
    }

    #[test]
    fn out_of_range_integer_is_rejected() {
        let err = resolved_value(
            r#"[{ "error": "SpecError", "strategy": { "value": [18446744073709551615] } }]"#,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid handler configuration: integer literal 18446744073709551615 \
             does not fit in a 64-bit signed int"
        );
    }

    #[test]
    fn unknown_strategy_is_a_configuration_error() {
        let err =
            HandlerConfig::from_json(r#"[{ "error": "SpecError", "strategy": "retry" }]"#)
                .unwrap_err();
        assert!(matches!(err, DefinitionError::InvalidHandler { .. }));
    }
}
