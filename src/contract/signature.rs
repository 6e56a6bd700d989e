//! Declared parameters and argument binding.

use crate::core::{builtin, Fault, TypeDescriptor, Value};
use thiserror::Error;

/// How a parameter receives its argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamKind {
    /// Implicit receiver (`self`). Bound positionally, never type checked.
    Receiver,
    /// Bound by position or by keyword.
    Positional,
    /// Bound by keyword only.
    KeywordOnly,
    /// Collects surplus positional arguments.
    VarArgs,
    /// Collects surplus keyword arguments.
    VarKwargs,
}

impl ParamKind {
    fn takes_position(self) -> bool {
        matches!(self, Self::Receiver | Self::Positional)
    }

    /// Receivers and variadics carry no type obligation.
    pub fn is_typed(self) -> bool {
        matches!(self, Self::Positional | Self::KeywordOnly)
    }
}

/// A declared type: either an expression parsed at decoration time or a
/// ready-made descriptor.
#[derive(Clone, Debug, PartialEq)]
pub enum Annotation {
    Expr(String),
    Descriptor(TypeDescriptor),
}

impl From<&str> for Annotation {
    fn from(expr: &str) -> Self {
        Annotation::Expr(expr.to_string())
    }
}

impl From<String> for Annotation {
    fn from(expr: String) -> Self {
        Annotation::Expr(expr)
    }
}

impl From<TypeDescriptor> for Annotation {
    fn from(descriptor: TypeDescriptor) -> Self {
        Annotation::Descriptor(descriptor)
    }
}

/// One declared parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub kind: ParamKind,
    pub annotation: Option<Annotation>,
    pub default: Option<Value>,
}

/// Arguments of a single call, as the caller supplied them.
///
/// # Example
///
/// ```rust
/// use specwright::contract::Args;
///
/// let args = Args::new().arg(2_i64).kwarg("scale", 1.5);
/// assert_eq!(args.positional().len(), 1);
/// assert_eq!(args.keyword().len(), 1);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Args {
    positional: Vec<Value>,
    keyword: Vec<(String, Value)>,
}

impl Args {
    /// No arguments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Append a keyword argument.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keyword.push((name.into(), value.into()));
        self
    }

    /// Positional arguments, in call order.
    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    /// Keyword arguments, in call order.
    pub fn keyword(&self) -> &[(String, Value)] {
        &self.keyword
    }
}

impl<T: Into<Value>> From<Vec<T>> for Args {
    fn from(values: Vec<T>) -> Self {
        Self {
            positional: values.into_iter().map(Into::into).collect(),
            keyword: Vec::new(),
        }
    }
}

/// Why a call could not be matched against the declared parameters.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BindingError {
    #[error("takes {expected} positional argument(s) but {given} were given")]
    TooManyPositional { expected: usize, given: usize },

    #[error("got multiple values for argument '{name}'")]
    MultipleValues { name: String },

    #[error("got an unexpected keyword argument '{name}'")]
    UnexpectedKeyword { name: String },

    #[error("missing a required argument: '{name}'")]
    MissingArgument { name: String },
}

/// Arguments matched to their parameters, with defaults applied.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BoundArgs {
    named: Vec<(String, Value)>,
    receiver: Option<String>,
    rest: Vec<Value>,
    extra: Vec<(String, Value)>,
}

impl BoundArgs {
    /// Value bound to a named parameter, the receiver included.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.named.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Named bindings in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.named.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Surplus positional arguments collected by a var-args parameter.
    pub fn rest(&self) -> &[Value] {
        &self.rest
    }

    /// Surplus keyword arguments collected by a var-kwargs parameter.
    pub fn extra(&self) -> &[(String, Value)] {
        &self.extra
    }

    /// Value bound to the receiver, if one is declared.
    pub fn receiver(&self) -> Option<&Value> {
        self.receiver.as_deref().and_then(|name| self.get(name))
    }

    /// Fetch a required binding, failing with an input validation fault.
    pub fn require(&self, name: &str) -> Result<&Value, Fault> {
        self.get(name).ok_or_else(|| {
            Fault::new(
                builtin::input_validation_error(),
                format!("no argument bound to '{name}'"),
            )
        })
    }

    /// Bound `int` argument.
    pub fn int(&self, name: &str) -> Result<i64, Fault> {
        let value = self.require(name)?;
        value.as_int().ok_or_else(|| wrong_kind(name, "int", value))
    }

    /// Bound `float` argument.
    pub fn float(&self, name: &str) -> Result<f64, Fault> {
        let value = self.require(name)?;
        value.as_float().ok_or_else(|| wrong_kind(name, "float", value))
    }

    /// Bound `bool` argument.
    pub fn bool(&self, name: &str) -> Result<bool, Fault> {
        let value = self.require(name)?;
        value.as_bool().ok_or_else(|| wrong_kind(name, "bool", value))
    }

    /// Bound `str` argument.
    pub fn str(&self, name: &str) -> Result<&str, Fault> {
        let value = self.require(name)?;
        value.as_str().ok_or_else(|| wrong_kind(name, "str", value))
    }

    /// Rebuild call arguments: named bindings in declaration order, then
    /// the collected surplus. Keyword-only bindings are passed by keyword.
    pub fn to_args(&self, parameters: &[Parameter]) -> Args {
        let mut args = Args::new();
        let mut after_rest = false;
        for param in parameters {
            after_rest |= param.kind == ParamKind::VarArgs;
            let Some(value) = self.get(&param.name) else {
                continue;
            };
            args = match param.kind {
                ParamKind::KeywordOnly => args.kwarg(param.name.clone(), value.clone()),
                ParamKind::Positional if after_rest => args.kwarg(param.name.clone(), value.clone()),
                _ => args.arg(value.clone()),
            };
        }
        for item in &self.rest {
            args = args.arg(item.clone());
        }
        for (name, item) in &self.extra {
            args = args.kwarg(name.clone(), item.clone());
        }
        args
    }
}

fn wrong_kind(name: &str, expected: &str, value: &Value) -> Fault {
    Fault::new(
        builtin::input_validation_error(),
        format!(
            "argument '{name}' is {} ({value}), not {expected}",
            value.kind_name()
        ),
    )
}

/// Match `args` against `parameters` the way a keyword-aware call does:
/// positionals fill positional slots in order, keywords fill by name,
/// surplus goes to the variadics, then defaults fill what is left.
/// Parameters declared after the var-args parameter bind by keyword only.
pub fn bind(parameters: &[Parameter], args: Args) -> Result<BoundArgs, BindingError> {
    let mut slots: Vec<Option<Value>> = vec![None; parameters.len()];
    let mut bound = BoundArgs::default();

    let positional_slots: Vec<usize> = parameters
        .iter()
        .enumerate()
        .take_while(|(_, p)| p.kind != ParamKind::VarArgs)
        .filter(|(_, p)| p.kind.takes_position())
        .map(|(i, _)| i)
        .collect();
    let accepts_rest = parameters.iter().any(|p| p.kind == ParamKind::VarArgs);
    let accepts_extra = parameters.iter().any(|p| p.kind == ParamKind::VarKwargs);

    let given = args.positional.len();
    let mut positional = args.positional.into_iter();
    for &slot in &positional_slots {
        match positional.next() {
            Some(value) => slots[slot] = Some(value),
            None => break,
        }
    }
    let surplus: Vec<Value> = positional.collect();
    if !surplus.is_empty() {
        if !accepts_rest {
            return Err(BindingError::TooManyPositional {
                expected: positional_slots.len(),
                given,
            });
        }
        bound.rest = surplus;
    }

    for (name, value) in args.keyword {
        let slot = parameters.iter().position(|p| {
            p.name == name && matches!(p.kind, ParamKind::Positional | ParamKind::KeywordOnly)
        });
        match slot {
            Some(i) if slots[i].is_some() => {
                return Err(BindingError::MultipleValues { name });
            }
            Some(i) => slots[i] = Some(value),
            None if accepts_extra => {
                if bound.extra.iter().any(|(n, _)| *n == name) {
                    return Err(BindingError::MultipleValues { name });
                }
                bound.extra.push((name, value));
            }
            None => return Err(BindingError::UnexpectedKeyword { name }),
        }
    }

    for (param, slot) in parameters.iter().zip(slots) {
        match param.kind {
            ParamKind::VarArgs | ParamKind::VarKwargs => continue,
            ParamKind::Receiver => bound.receiver = Some(param.name.clone()),
            _ => {}
        }
        let value = match slot.or_else(|| param.default.clone()) {
            Some(value) => value,
            None => {
                return Err(BindingError::MissingArgument {
                    name: param.name.clone(),
                })
            }
        };
        bound.named.push((param.name.clone(), value));
    }

    Ok(bound)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(name: &str, kind: ParamKind) -> Parameter {
        Parameter {
            name: name.to_string(),
            kind,
            annotation: Some(Annotation::from("int")),
            default: None,
        }
    }

    fn with_default(mut p: Parameter, value: impl Into<Value>) -> Parameter {
        p.default = Some(value.into());
        p
    }

    #[test]
    fn parameter_after_var_args_binds_by_keyword_only() {
        let params = [
            param("x", ParamKind::Positional),
            param("rest", ParamKind::VarArgs),
            param("y", ParamKind::Positional),
        ];

        let bound = bind(&params, Args::from(vec![1_i64, 2, 3]).kwarg("y", 4_i64)).unwrap();
        assert_eq!(bound.get("x"), Some(&Value::Int(1)));
        assert_eq!(bound.rest(), [Value::Int(2), Value::Int(3)]);
        assert_eq!(bound.get("y"), Some(&Value::Int(4)));

        let err = bind(&params, Args::from(vec![1_i64, 2])).unwrap_err();
        assert_eq!(err, BindingError::MissingArgument { name: "y".to_string() });

        let again = bind(&params, bound.to_args(&params)).unwrap();
        assert_eq!(again, bound);
    }

    #[test]
    fn binds_positional_and_keyword() {
        let params = [param("x", ParamKind::Positional), param("y", ParamKind::Positional)];
        let bound = bind(&params, Args::new().arg(1_i64).kwarg("y", 2_i64)).unwrap();
        assert_eq!(bound.get("x"), Some(&Value::Int(1)));
        assert_eq!(bound.get("y"), Some(&Value::Int(2)));
    }

    #[test]
    fn applies_defaults() {
        let params = [
            param("x", ParamKind::Positional),
            with_default(param("y", ParamKind::Positional), "default"),
        ];
        let bound = bind(&params, Args::new().arg(42_i64)).unwrap();
        assert_eq!(bound.get("y"), Some(&Value::from("default")));
    }

    #[test]
    fn rejects_too_many_positionals() {
        let params = [param("x", ParamKind::Positional)];
        let err = bind(&params, Args::from(vec![1_i64, 2, 3])).unwrap_err();
        assert_eq!(
            err,
            BindingError::TooManyPositional {
                expected: 1,
                given: 3
            }
        );
    }

    #[test]
    fn rejects_duplicate_and_unknown_keywords() {
        let params = [param("x", ParamKind::Positional)];
        assert!(matches!(
            bind(&params, Args::new().arg(1_i64).kwarg("x", 2_i64)),
            Err(BindingError::MultipleValues { .. })
        ));
        assert!(matches!(
            bind(&params, Args::new().kwarg("z", 2_i64)),
            Err(BindingError::UnexpectedKeyword { .. })
        ));
    }

    #[test]
    fn reports_missing_argument() {
        let params = [param("x", ParamKind::Positional), param("y", ParamKind::KeywordOnly)];
        let err = bind(&params, Args::new().arg(1_i64)).unwrap_err();
        assert_eq!(err.to_string(), "missing a required argument: 'y'");
    }

    #[test]
    fn keyword_only_cannot_bind_positionally() {
        let params = [param("x", ParamKind::KeywordOnly)];
        assert!(matches!(
            bind(&params, Args::new().arg(1_i64)),
            Err(BindingError::TooManyPositional { .. })
        ));
    }

    #[test]
    fn variadics_collect_surplus() {
        let params = [
            param("self", ParamKind::Receiver),
            param("x", ParamKind::Positional),
            param("args", ParamKind::VarArgs),
            param("kwargs", ParamKind::VarKwargs),
        ];
        let bound = bind(
            &params,
            Args::new()
                .arg("receiver")
                .arg(1_i64)
                .arg(2_i64)
                .arg(3_i64)
                .kwarg("flag", true),
        )
        .unwrap();

        assert_eq!(bound.receiver(), Some(&Value::from("receiver")));
        assert_eq!(bound.rest(), &[Value::Int(2), Value::Int(3)]);
        assert_eq!(bound.extra(), &[("flag".to_string(), Value::Bool(true))]);
        assert_eq!(bound.get("args"), None);
    }

    #[test]
    fn to_args_rebuilds_an_equivalent_call() {
        let params = [
            param("x", ParamKind::Positional),
            param("args", ParamKind::VarArgs),
            param("k", ParamKind::KeywordOnly),
        ];
        let original = Args::new().arg(1_i64).arg(2_i64).kwarg("k", 3_i64);
        let bound = bind(&params, original.clone()).unwrap();
        let rebuilt = bind(&params, bound.to_args(&params)).unwrap();
        assert_eq!(bound, rebuilt);
    }

    #[test]
    fn typed_accessors_report_wrong_kind() {
        let params = [param("x", ParamKind::Positional)];
        let bound = bind(&params, Args::new().arg("text")).unwrap();
        assert_eq!(bound.str("x").unwrap(), "text");
        let fault = bound.int("x").unwrap_err();
        assert!(fault.is(&builtin::input_validation_error()));
        assert!(bound.require("missing").is_err());
    }
}
