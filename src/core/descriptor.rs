//! Structural type descriptors.
//!
//! A `TypeDescriptor` is built once, when a contract is declared, by parsing
//! a type expression such as `dict[str, list[int]]` or `int | None` against
//! a `TypeRegistry` of known record types. Checking a value against it is a
//! pure structural walk with no coercion.

use super::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Leaf kinds of a descriptor tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveKind {
    Any,
    None,
    Bool,
    Int,
    Float,
    Str,
    Bytes,
}

impl PrimitiveKind {
    /// Name used in type expressions.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Any => "Any",
            Self::None => "None",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "str",
            Self::Bytes => "bytes",
        }
    }

    /// Strict check: `Bool` never satisfies `Int`, `Int` never satisfies `Float`.
    fn accepts(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (Self::Any, _)
                | (Self::None, Value::None)
                | (Self::Bool, Value::Bool(_))
                | (Self::Int, Value::Int(_))
                | (Self::Float, Value::Float(_))
                | (Self::Str, Value::Str(_))
                | (Self::Bytes, Value::Bytes(_))
        )
    }
}

/// A declared record type: a name and its ordered, typed fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordDescriptor {
    pub name: String,
    pub fields: Vec<(String, TypeDescriptor)>,
}

impl RecordDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Add a field. An absent field is checked as None.
    pub fn field(mut self, name: impl Into<String>, descriptor: TypeDescriptor) -> Self {
        self.fields.push((name.into(), descriptor));
        self
    }
}

/// Structural representation of a declared type.
///
/// # Example
///
/// ```rust
/// use specwright::core::{TypeDescriptor, TypeRegistry, Value};
///
/// let registry = TypeRegistry::new();
/// let ty = TypeDescriptor::parse("list[int]", &registry).unwrap();
///
/// assert!(ty.matches(&Value::from(vec![1_i64, 2])));
/// assert!(!ty.matches(&Value::from(vec![true])));
/// assert_eq!(ty.to_string(), "list[int]");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TypeDescriptor {
    Primitive(PrimitiveKind),
    Optional(Box<TypeDescriptor>),
    Sequence(Box<TypeDescriptor>),
    Mapping(Box<TypeDescriptor>, Box<TypeDescriptor>),
    Record(RecordDescriptor),
    Union(Vec<TypeDescriptor>),
}

impl TypeDescriptor {
    /// Accepts every value.
    pub fn any() -> Self {
        Self::Primitive(PrimitiveKind::Any)
    }

    pub fn none() -> Self {
        Self::Primitive(PrimitiveKind::None)
    }

    pub fn bool() -> Self {
        Self::Primitive(PrimitiveKind::Bool)
    }

    pub fn int() -> Self {
        Self::Primitive(PrimitiveKind::Int)
    }

    pub fn float() -> Self {
        Self::Primitive(PrimitiveKind::Float)
    }

    pub fn string() -> Self {
        Self::Primitive(PrimitiveKind::Str)
    }

    pub fn bytes() -> Self {
        Self::Primitive(PrimitiveKind::Bytes)
    }

    /// `inner` or None.
    pub fn optional(inner: TypeDescriptor) -> Self {
        Self::Optional(Box::new(inner))
    }

    /// A list whose every element matches `element`.
    pub fn list(element: TypeDescriptor) -> Self {
        Self::Sequence(Box::new(element))
    }

    /// A map whose every key and value match.
    pub fn dict(key: TypeDescriptor, value: TypeDescriptor) -> Self {
        Self::Mapping(Box::new(key), Box::new(value))
    }

    /// Build a union, flattening nested unions. A single alternative is
    /// returned as-is.
    pub fn union(alternatives: impl IntoIterator<Item = TypeDescriptor>) -> Self {
        let mut flat = Vec::new();
        for alt in alternatives {
            match alt {
                Self::Union(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        if flat.len() == 1 {
            if let Some(only) = flat.pop() {
                return only;
            }
        }
        Self::Union(flat)
    }

    /// Parse a type expression, resolving record names in `registry`.
    ///
    /// Every unknown name is reported, not only the first.
    pub fn parse(expr: &str, registry: &TypeRegistry) -> Result<Self, DescriptorError> {
        Parser::new(expr, registry)?.parse()
    }

    /// Strictly check `value` against this descriptor.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Primitive(kind), v) => kind.accepts(v),
            (Self::Optional(inner), v) => v.is_none() || inner.matches(v),
            (Self::Sequence(element), Value::List(items)) => {
                items.iter().all(|item| element.matches(item))
            }
            (Self::Mapping(key, val), Value::Map(entries)) => entries
                .iter()
                .all(|(k, v)| key.matches(k) && val.matches(v)),
            (Self::Record(desc), Value::Record(record)) => {
                desc.name == record.name()
                    && desc.fields.iter().all(|(field, ty)| {
                        ty.matches(record.get(field).unwrap_or(&Value::None))
                    })
            }
            (Self::Union(alternatives), v) => alternatives.iter().any(|alt| alt.matches(v)),
            _ => false,
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(kind) => write!(f, "{}", kind.name()),
            Self::Optional(inner) => write!(f, "Optional[{inner}]"),
            Self::Sequence(element) => write!(f, "list[{element}]"),
            Self::Mapping(key, value) => write!(f, "dict[{key}, {value}]"),
            Self::Record(desc) => write!(f, "{}", desc.name),
            Self::Union(alternatives) => {
                for (i, alt) in alternatives.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{alt}")?;
                }
                Ok(())
            }
        }
    }
}

/// Errors produced while turning a type expression into a descriptor.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DescriptorError {
    #[error("invalid type expression '{expr}': {reason}")]
    Syntax { expr: String, reason: String },

    #[error("unresolved type name(s): {}", .names.join(", "))]
    Unresolved { names: Vec<String> },
}

/// Record types known to the parser.
#[derive(Clone, Debug, Default)]
pub struct TypeRegistry {
    records: BTreeMap<String, RecordDescriptor>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a record type, replacing any previous one with the same name.
    pub fn register(mut self, record: RecordDescriptor) -> Self {
        self.records.insert(record.name.clone(), record);
        self
    }

    /// Declare a record whose field types are given as expressions.
    ///
    /// Field expressions may refer to records registered earlier.
    pub fn define_record<'a>(
        self,
        name: &str,
        fields: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, DescriptorError> {
        let mut record = RecordDescriptor::new(name);
        let mut unresolved = Vec::new();
        for (field, expr) in fields {
            match TypeDescriptor::parse(expr, &self) {
                Ok(ty) => record = record.field(field, ty),
                Err(DescriptorError::Unresolved { names }) => unresolved.extend(names),
                Err(err) => return Err(err),
            }
        }
        if !unresolved.is_empty() {
            return Err(DescriptorError::Unresolved { names: unresolved });
        }
        Ok(self.register(record))
    }

    /// Registered record `name`.
    pub fn get(&self, name: &str) -> Option<&RecordDescriptor> {
        self.records.get(name)
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Ident(String),
    Open,
    Close,
    Comma,
    Pipe,
}

fn tokenize(expr: &str) -> Result<Vec<Token>, DescriptorError> {
    let mut tokens = Vec::new();
    let mut chars = expr.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '[' => {
                chars.next();
                tokens.push(Token::Open);
            }
            ']' => {
                chars.next();
                tokens.push(Token::Close);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            '|' => {
                chars.next();
                tokens.push(Token::Pipe);
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut ident = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' || c == '.' {
                        ident.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(ident));
            }
            other => {
                return Err(DescriptorError::Syntax {
                    expr: expr.to_string(),
                    reason: format!("unexpected character '{other}'"),
                })
            }
        }
    }
    Ok(tokens)
}

struct Parser<'a> {
    expr: &'a str,
    registry: &'a TypeRegistry,
    tokens: Vec<Token>,
    pos: usize,
    unresolved: Vec<String>,
}

impl<'a> Parser<'a> {
    fn new(expr: &'a str, registry: &'a TypeRegistry) -> Result<Self, DescriptorError> {
        Ok(Self {
            expr,
            registry,
            tokens: tokenize(expr)?,
            pos: 0,
            unresolved: Vec::new(),
        })
    }

    fn parse(mut self) -> Result<TypeDescriptor, DescriptorError> {
        if self.tokens.is_empty() {
            return Err(self.syntax("empty type expression"));
        }
        let ty = self.union()?;
        if let Some(token) = self.tokens.get(self.pos) {
            return Err(self.syntax(&format!("unexpected trailing {token:?}")));
        }
        if !self.unresolved.is_empty() {
            return Err(DescriptorError::Unresolved {
                names: self.unresolved,
            });
        }
        Ok(ty)
    }

    fn syntax(&self, reason: &str) -> DescriptorError {
        DescriptorError::Syntax {
            expr: self.expr.to_string(),
            reason: reason.to_string(),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> Result<(), DescriptorError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.syntax(&format!("expected {token:?}")))
        }
    }

    fn union(&mut self) -> Result<TypeDescriptor, DescriptorError> {
        let mut alternatives = vec![self.term()?];
        while self.eat(&Token::Pipe) {
            alternatives.push(self.term()?);
        }
        Ok(TypeDescriptor::union(alternatives))
    }

    fn arguments(&mut self) -> Result<Vec<TypeDescriptor>, DescriptorError> {
        if !self.eat(&Token::Open) {
            return Ok(Vec::new());
        }
        let mut args = vec![self.union()?];
        while self.eat(&Token::Comma) {
            args.push(self.union()?);
        }
        self.expect(&Token::Close)?;
        Ok(args)
    }

    fn term(&mut self) -> Result<TypeDescriptor, DescriptorError> {
        let name = match self.tokens.get(self.pos) {
            Some(Token::Ident(name)) => name.clone(),
            _ => return Err(self.syntax("expected a type name")),
        };
        self.pos += 1;
        let args = self.arguments()?;
        let arity = |expected: usize, parser: &Self| {
            if args.len() == expected {
                Ok(())
            } else {
                Err(parser.syntax(&format!(
                    "'{name}' takes {expected} type argument(s), got {}",
                    args.len()
                )))
            }
        };

        let ty = match name.as_str() {
            "Any" | "typing.Any" => TypeDescriptor::any(),
            "None" | "NoneType" => TypeDescriptor::none(),
            "bool" => TypeDescriptor::bool(),
            "int" => TypeDescriptor::int(),
            "float" => TypeDescriptor::float(),
            "str" => TypeDescriptor::string(),
            "bytes" => TypeDescriptor::bytes(),
            "list" | "List" | "Sequence" => match args.len() {
                0 => TypeDescriptor::list(TypeDescriptor::any()),
                _ => {
                    arity(1, self)?;
                    TypeDescriptor::list(args[0].clone())
                }
            },
            "dict" | "Dict" | "Mapping" => match args.len() {
                0 => TypeDescriptor::dict(TypeDescriptor::any(), TypeDescriptor::any()),
                _ => {
                    arity(2, self)?;
                    TypeDescriptor::dict(args[0].clone(), args[1].clone())
                }
            },
            "Optional" => {
                arity(1, self)?;
                TypeDescriptor::optional(args[0].clone())
            }
            "Union" => {
                if args.is_empty() {
                    return Err(self.syntax("'Union' needs at least one type argument"));
                }
                TypeDescriptor::union(args)
            }
            other => match self.registry.get(other) {
                Some(record) => TypeDescriptor::Record(record.clone()),
                None => {
                    self.unresolved.push(other.to_string());
                    TypeDescriptor::any()
                }
            },
        };
        Ok(ty)
    }
}
