//! Declaring contracts and the contract-checked function wrapper.

use super::config::ContractConfig;
use super::metadata::ContractMetadata;
use super::signature::{bind, Annotation, Args, BoundArgs, ParamKind, Parameter};
use super::validate::{mismatches, validate_inputs, validate_output};
use super::violations::ContractViolation;
use crate::core::{DefinitionError, DescriptorError, Fault, TypeDescriptor, TypeRegistry, Value};
use crate::testing::{TestPlan, TestRegistry, TestRequirements};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Anything that can be called with dynamic arguments.
///
/// Contract wrappers, error dispatchers and plain closures all implement
/// this, so wrappers nest in either order.
pub trait Callable {
    fn call(&self, args: Args) -> Result<Value, Fault>;

    /// Qualified name used in diagnostics.
    fn qualname(&self) -> &str {
        "<anonymous>"
    }

    /// Contract metadata, when the callable (or one it wraps) has a contract.
    fn contract(&self) -> Option<&ContractMetadata> {
        None
    }
}

impl<F> Callable for F
where
    F: Fn(Args) -> Result<Value, Fault>,
{
    fn call(&self, args: Args) -> Result<Value, Fault> {
        self(args)
    }
}

type BoundBody = dyn Fn(&BoundArgs) -> Result<Value, Fault> + Send + Sync;

#[derive(Clone)]
enum Body {
    Bound(Arc<BoundBody>),
    Inner(Arc<dyn Callable + Send + Sync>),
}

/// Builder for a contract-checked function.
///
/// Type expressions are parsed when the contract is wrapped, never per
/// call. A declaration that is incomplete never produces a wrapper.
///
/// # Example
///
/// ```rust
/// use specwright::contract::{Args, Callable, Contract};
/// use specwright::core::Value;
///
/// let add = Contract::new("add")
///     .doc("Add two integers.")
///     .param("x", "int")
///     .param("y", "int")
///     .returns("int")
///     .wrap(|args| Ok(Value::Int(args.int("x")? + args.int("y")?)))
///     .unwrap();
///
/// assert_eq!(add.call(Args::from(vec![2_i64, 3])).unwrap(), Value::Int(5));
/// assert!(add.call(Args::new().arg("2").arg(3_i64)).is_err());
/// ```
#[derive(Clone, Debug)]
pub struct Contract {
    name: String,
    qualname: Option<String>,
    module: Option<String>,
    doc: Option<String>,
    parameters: Vec<Parameter>,
    returns: Option<Annotation>,
    config: ContractConfig,
    types: TypeRegistry,
    tests: Option<TestPlan>,
}

impl Contract {
    /// Start declaring the function `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            qualname: None,
            module: None,
            doc: None,
            parameters: Vec::new(),
            returns: None,
            config: ContractConfig::default(),
            types: TypeRegistry::new(),
            tests: None,
        }
    }

    /// Qualified name, e.g. `Account.deposit`. Defaults to the name.
    pub fn qualname(mut self, qualname: impl Into<String>) -> Self {
        self.qualname = Some(qualname.into());
        self
    }

    /// Module the function lives in, for reports.
    pub fn module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    /// Doc text. Required unless the config turns the check off.
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    fn push(
        mut self,
        name: impl Into<String>,
        kind: ParamKind,
        annotation: Option<Annotation>,
        default: Option<Value>,
    ) -> Self {
        let after_rest = self.parameters.iter().any(|p| p.kind == ParamKind::VarArgs);
        let kind = match kind {
            ParamKind::Positional if after_rest => ParamKind::KeywordOnly,
            other => other,
        };
        self.parameters.push(Parameter {
            name: name.into(),
            kind,
            annotation,
            default,
        });
        self
    }

    /// A positional-or-keyword parameter.
    pub fn param(self, name: impl Into<String>, annotation: impl Into<Annotation>) -> Self {
        self.push(name, ParamKind::Positional, Some(annotation.into()), None)
    }

    /// A positional-or-keyword parameter with a default value.
    pub fn param_default(
        self,
        name: impl Into<String>,
        annotation: impl Into<Annotation>,
        default: impl Into<Value>,
    ) -> Self {
        self.push(
            name,
            ParamKind::Positional,
            Some(annotation.into()),
            Some(default.into()),
        )
    }

    /// A parameter that can only be passed by keyword.
    pub fn keyword_only(self, name: impl Into<String>, annotation: impl Into<Annotation>) -> Self {
        self.push(name, ParamKind::KeywordOnly, Some(annotation.into()), None)
    }

    /// A parameter declared without a type. Wrapping fails unless it is
    /// annotated.
    pub fn param_untyped(self, name: impl Into<String>) -> Self {
        self.push(name, ParamKind::Positional, None, None)
    }

    /// The implicit receiver. Bound first, never type checked.
    pub fn receiver(self, name: impl Into<String>) -> Self {
        self.push(name, ParamKind::Receiver, None, None)
    }

    /// Collect surplus positionals. Positional parameters declared after
    /// this one become keyword-only.
    pub fn var_args(self, name: impl Into<String>) -> Self {
        self.push(name, ParamKind::VarArgs, None, None)
    }

    /// Collect surplus keyword arguments.
    pub fn var_kwargs(self, name: impl Into<String>) -> Self {
        self.push(name, ParamKind::VarKwargs, None, None)
    }

    /// Declared return type (required).
    pub fn returns(mut self, annotation: impl Into<Annotation>) -> Self {
        self.returns = Some(annotation.into());
        self
    }

    /// Replace the default checks.
    pub fn config(mut self, config: ContractConfig) -> Self {
        self.config = config;
        self
    }

    /// Record types available to this contract's type expressions.
    pub fn types(mut self, registry: &TypeRegistry) -> Self {
        self.types = registry.clone();
        self
    }

    /// Tests this function must have. Case names are checked on wrap.
    pub fn requires_tests(mut self, plan: TestPlan) -> Self {
        self.tests = Some(plan);
        self
    }

    /// Wrap a body that reads its arguments from the bound call.
    pub fn wrap<F>(self, body: F) -> Result<ContractFn, DefinitionError>
    where
        F: Fn(&BoundArgs) -> Result<Value, Fault> + Send + Sync + 'static,
    {
        self.finish(Body::Bound(Arc::new(body)))
    }

    /// Wrap another callable. It receives the bound arguments re-packed in
    /// declaration order, defaults applied.
    pub fn wrap_callable<C>(self, inner: C) -> Result<ContractFn, DefinitionError>
    where
        C: Callable + Send + Sync + 'static,
    {
        self.finish(Body::Inner(Arc::new(inner)))
    }

    fn resolve(
        &self,
        qualname: &str,
        name: &str,
        annotation: Option<&Annotation>,
        missing: &mut Vec<String>,
        unresolved: &mut Vec<(String, Vec<String>)>,
    ) -> Result<Option<TypeDescriptor>, DefinitionError> {
        let expr = match annotation {
            None => {
                missing.push(name.to_string());
                return Ok(None);
            }
            Some(Annotation::Descriptor(descriptor)) => return Ok(Some(descriptor.clone())),
            Some(Annotation::Expr(expr)) => expr,
        };
        match TypeDescriptor::parse(expr, &self.types) {
            Ok(descriptor) => Ok(Some(descriptor)),
            Err(DescriptorError::Unresolved { names }) => {
                tracing::debug!(function = qualname, parameter = name, ?names, "unresolved type names");
                missing.push(name.to_string());
                unresolved.push((name.to_string(), names));
                Ok(None)
            }
            Err(source) => Err(DefinitionError::InvalidTypeExpression {
                qualname: qualname.to_string(),
                parameter: name.to_string(),
                source,
            }),
        }
    }

    fn finish(self, body: Body) -> Result<ContractFn, DefinitionError> {
        let qualname = self.qualname.clone().unwrap_or_else(|| self.name.clone());

        let docstring = self.doc.clone().unwrap_or_default();
        if self.config.require_docstring && docstring.trim().is_empty() {
            return Err(DefinitionError::MissingDocstring { qualname });
        }

        let mut seen = HashSet::new();
        if let Some(dup) = self.parameters.iter().find(|p| !seen.insert(p.name.as_str())) {
            return Err(DefinitionError::DuplicateParameter {
                qualname,
                parameter: dup.name.clone(),
            });
        }

        let mut missing = Vec::new();
        let mut unresolved = Vec::new();
        let mut typed = Vec::new();
        for param in self.parameters.iter().filter(|p| p.kind.is_typed()) {
            let annotation = param.annotation.as_ref();
            if let Some(descriptor) =
                self.resolve(&qualname, &param.name, annotation, &mut missing, &mut unresolved)?
            {
                typed.push((param.name.clone(), descriptor));
            }
        }
        let return_type = self.resolve(
            &qualname,
            "return",
            self.returns.as_ref(),
            &mut missing,
            &mut unresolved,
        )?;

        let return_type = match return_type {
            Some(ty) if missing.is_empty() => ty,
            _ => {
                return Err(DefinitionError::MissingTypeHints {
                    qualname,
                    missing,
                    unresolved,
                })
            }
        };

        let tests = self
            .tests
            .map(|plan| TestRequirements::new(&self.name, &qualname, self.module.clone(), plan))
            .transpose()?;

        tracing::debug!(
            function = %qualname,
            parameters = typed.len(),
            returns = %return_type,
            "contract declared"
        );

        let metadata = ContractMetadata {
            name: self.name,
            qualname,
            module: self.module,
            docstring,
            parameters: typed,
            return_type,
        };

        Ok(ContractFn {
            inner: Arc::new(ContractInner {
                metadata,
                parameters: self.parameters,
                config: self.config,
                tests,
                body,
            }),
        })
    }
}

struct ContractInner {
    metadata: ContractMetadata,
    parameters: Vec<Parameter>,
    config: ContractConfig,
    tests: Option<TestRequirements>,
    body: Body,
}

/// A function whose calls are checked against its declared contract.
///
/// Cheap to clone; clones share the same declaration.
#[derive(Clone)]
pub struct ContractFn {
    inner: Arc<ContractInner>,
}

impl ContractFn {
    /// The resolved declaration.
    pub fn metadata(&self) -> &ContractMetadata {
        &self.inner.metadata
    }

    /// Every declared parameter, receiver and variadics included.
    pub fn parameters(&self) -> &[Parameter] {
        &self.inner.parameters
    }

    /// Checks applied on each call.
    pub fn config(&self) -> ContractConfig {
        self.inner.config
    }

    /// Required tests, when declared.
    pub fn test_requirements(&self) -> Option<&TestRequirements> {
        self.inner.tests.as_ref()
    }

    /// Add this function's test requirements to `registry`. Returns false
    /// when it declares none.
    pub fn register_tests(&self, registry: &mut TestRegistry) -> bool {
        match &self.inner.tests {
            Some(requirements) => {
                registry.register(requirements.clone());
                true
            }
            None => false,
        }
    }

    fn violation(&self, violation: ContractViolation) -> Fault {
        tracing::debug!(function = %self.inner.metadata.qualname, %violation, "contract violated");
        violation.into()
    }
}

impl Callable for ContractFn {
    fn call(&self, args: Args) -> Result<Value, Fault> {
        let inner = &*self.inner;
        let qualname = &inner.metadata.qualname;

        let bound = bind(&inner.parameters, args).map_err(|source| {
            self.violation(ContractViolation::Binding {
                qualname: qualname.clone(),
                source,
            })
        })?;

        if inner.config.validate_inputs {
            let result = validate_inputs(&inner.metadata.parameters, &bound);
            if result.is_failure() {
                return Err(self.violation(ContractViolation::Input {
                    qualname: qualname.clone(),
                    mismatches: mismatches(result),
                }));
            }
        }

        let value = match &inner.body {
            Body::Bound(body) => body(&bound)?,
            Body::Inner(callable) => callable.call(bound.to_args(&inner.parameters))?,
        };

        if inner.config.validate_output {
            validate_output(&inner.metadata.return_type, &value).map_err(|mismatch| {
                self.violation(ContractViolation::Output {
                    qualname: qualname.clone(),
                    mismatch,
                })
            })?;
        }

        Ok(value)
    }

    fn qualname(&self) -> &str {
        &self.inner.metadata.qualname
    }

    fn contract(&self) -> Option<&ContractMetadata> {
        Some(&self.inner.metadata)
    }
}

impl fmt::Debug for ContractFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContractFn")
            .field("signature", &self.inner.metadata.signature())
            .field("config", &self.inner.config)
            .finish()
    }
}
