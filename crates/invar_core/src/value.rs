//! Runtime value model.
//!
//! Contract enforcement operates on dynamically typed values. [`Value`]
//! covers the primitive scalar and collection types given special treatment
//! by the `Function` validator, plus callables, primitive constructor
//! objects, and record instances. [`TypeTag`] names each runtime type and
//! knows which tags form the fixed primitive set.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Runtime type of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    /// Null/absent reference
    Null,
    /// Boolean
    Bool,
    /// Signed integer
    Int,
    /// Floating point number
    Float,
    /// Complex number
    Complex,
    /// String
    Str,
    /// Immutable byte sequence
    Bytes,
    /// Mutable byte buffer
    ByteArray,
    /// List
    List,
    /// Tuple
    Tuple,
    /// Set
    Set,
    /// Mapping
    Map,
    /// Callable object
    Fn,
    /// Primitive constructor object
    Ctor,
    /// Record instance
    Record,
}

impl TypeTag {
    /// Returns true for the fixed set of primitive value types that the
    /// `Function` validator rejects outright.
    pub fn is_primitive(self) -> bool {
        matches!(
            self,
            TypeTag::Bytes
                | TypeTag::ByteArray
                | TypeTag::Complex
                | TypeTag::Map
                | TypeTag::Float
                | TypeTag::Int
                | TypeTag::List
                | TypeTag::Set
                | TypeTag::Str
                | TypeTag::Tuple
        )
    }

    /// Human-readable type name, used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            TypeTag::Null => "null",
            TypeTag::Bool => "boolean",
            TypeTag::Int => "integer",
            TypeTag::Float => "float",
            TypeTag::Complex => "complex",
            TypeTag::Str => "string",
            TypeTag::Bytes => "bytes",
            TypeTag::ByteArray => "bytearray",
            TypeTag::List => "list",
            TypeTag::Tuple => "tuple",
            TypeTag::Set => "set",
            TypeTag::Map => "map",
            TypeTag::Fn => "function",
            TypeTag::Ctor => "constructor",
            TypeTag::Record => "record",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A callable value: a user function, closure, or any object exposing a
/// call capability.
#[derive(Clone)]
pub struct Callable {
    name: String,
    body: Arc<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>,
}

impl Callable {
    /// Creates a callable from a name and a body.
    pub fn new(
        name: impl Into<String>,
        body: impl Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            body: Arc::new(body),
        }
    }

    /// Returns the callable's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invokes the callable with the given arguments.
    pub fn invoke(&self, args: &[Value]) -> Result<Value> {
        (self.body)(args)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable").field("name", &self.name).finish()
    }
}

impl PartialEq for Callable {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.body, &other.body)
    }
}

/// Field-map data of a record instance.
///
/// This is the plain value that travels inside [`Value::Record`]; the
/// enforcement wrapper lives in the runtime crate and routes every write
/// through the bound field validator before it reaches this map. Field
/// order follows declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    type_name: String,
    ancestry: Vec<String>,
    fields: Vec<(String, Value)>,
}

impl Record {
    /// Creates an empty record of the given type with its base-type chain.
    pub fn new(type_name: impl Into<String>, ancestry: Vec<String>) -> Self {
        Self {
            type_name: type_name.into(),
            ancestry,
            fields: Vec::new(),
        }
    }

    /// Returns the record's type name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Returns true if this record's type is `name` or derives from it.
    pub fn is_instance_of(&self, name: &str) -> bool {
        self.type_name == name || self.ancestry.iter().any(|a| a == name)
    }

    /// Returns the current value of a field, if set.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    /// Stores a field value, preserving first-assignment order.
    ///
    /// This is the raw storage path; it does not validate. Enforcement
    /// happens in the runtime crate before this is reached.
    pub fn insert(&mut self, field: impl Into<String>, value: Value) {
        let field = field.into();
        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((field, value)),
        }
    }

    /// Iterates over set fields in assignment order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.type_name)?;
        for (i, (name, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        write!(f, ")")
    }
}

/// A dynamically typed runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null/absent reference
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Floating point value
    Float(f64),
    /// Complex number value
    Complex {
        /// Real part
        re: f64,
        /// Imaginary part
        im: f64,
    },
    /// String value
    Str(String),
    /// Immutable byte sequence
    Bytes(Vec<u8>),
    /// Mutable byte buffer
    ByteArray(Vec<u8>),
    /// List of values
    List(Vec<Value>),
    /// Tuple of values
    Tuple(Vec<Value>),
    /// Set of values (insertion order, unique elements by convention)
    Set(Vec<Value>),
    /// Mapping from string keys to values
    Map(BTreeMap<String, Value>),
    /// Callable value
    Fn(Callable),
    /// Primitive constructor object (e.g. the raw list constructor)
    Ctor(TypeTag),
    /// Record instance data
    Record(Record),
}

impl Value {
    /// Returns the runtime type tag of this value.
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::Null => TypeTag::Null,
            Value::Bool(_) => TypeTag::Bool,
            Value::Int(_) => TypeTag::Int,
            Value::Float(_) => TypeTag::Float,
            Value::Complex { .. } => TypeTag::Complex,
            Value::Str(_) => TypeTag::Str,
            Value::Bytes(_) => TypeTag::Bytes,
            Value::ByteArray(_) => TypeTag::ByteArray,
            Value::List(_) => TypeTag::List,
            Value::Tuple(_) => TypeTag::Tuple,
            Value::Set(_) => TypeTag::Set,
            Value::Map(_) => TypeTag::Map,
            Value::Fn(_) => TypeTag::Fn,
            Value::Ctor(_) => TypeTag::Ctor,
            Value::Record(_) => TypeTag::Record,
        }
    }

    /// Returns the type name used in error messages. Records report their
    /// declared type name rather than the generic tag.
    pub fn type_name(&self) -> String {
        match self {
            Value::Record(record) => record.type_name().to_string(),
            other => other.type_tag().name().to_string(),
        }
    }

    /// Truthiness: null, zero numbers, and empty collections are falsy;
    /// everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Complex { re, im } => *re != 0.0 || *im != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Bytes(b) | Value::ByteArray(b) => !b.is_empty(),
            Value::List(v) | Value::Tuple(v) | Value::Set(v) => !v.is_empty(),
            Value::Map(m) => !m.is_empty(),
            Value::Fn(_) | Value::Ctor(_) | Value::Record(_) => true,
        }
    }

    /// Returns true if this value can be called.
    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Fn(_) | Value::Ctor(_))
    }

    /// Attempts to get this value as an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Attempts to get this value as a float, coercing integers.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Attempts to get this value as a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to get this value as record data.
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Feeds this value into a hasher.
    ///
    /// Floats hash by bit pattern; sets and lists hash in stored order.
    /// Only meaningful for record types that opt into `unsafe_hash`.
    pub fn feed_hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Complex { re, im } => {
                re.to_bits().hash(state);
                im.to_bits().hash(state);
            }
            Value::Str(s) => s.hash(state),
            Value::Bytes(b) | Value::ByteArray(b) => b.hash(state),
            Value::List(v) | Value::Tuple(v) | Value::Set(v) => {
                for item in v {
                    item.feed_hash(state);
                }
            }
            Value::Map(m) => {
                for (k, v) in m {
                    k.hash(state);
                    v.feed_hash(state);
                }
            }
            Value::Fn(c) => c.name().hash(state),
            Value::Ctor(tag) => tag.hash(state),
            Value::Record(r) => {
                r.type_name().hash(state);
                for (name, value) in r.fields() {
                    name.hash(state);
                    value.feed_hash(state);
                }
            }
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Bool(a), Value::Bool(b)) => a.partial_cmp(b),
            (Value::Str(a), Value::Str(b)) => a.partial_cmp(b),
            (Value::Bytes(a), Value::Bytes(b)) => a.partial_cmp(b),
            (Value::ByteArray(a), Value::ByteArray(b)) => a.partial_cmp(b),
            (Value::List(a), Value::List(b)) => a.partial_cmp(b),
            (Value::Tuple(a), Value::Tuple(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Complex { re, im } => write!(f, "complex({}, {})", re, im),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Bytes(b) => write!(f, "b\"{}\"", b.escape_ascii()),
            Value::ByteArray(b) => write!(f, "bytearray(b\"{}\")", b.escape_ascii()),
            Value::List(items) => {
                write!(f, "[")?;
                write_items(f, items)?;
                write!(f, "]")
            }
            Value::Tuple(items) => {
                write!(f, "(")?;
                write_items(f, items)?;
                write!(f, ")")
            }
            Value::Set(items) => {
                write!(f, "{{")?;
                write_items(f, items)?;
                write!(f, "}}")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}: {}", k, v)?;
                }
                write!(f, "}}")
            }
            Value::Fn(c) => write!(f, "<function {}>", c.name()),
            Value::Ctor(tag) => write!(f, "<constructor {}>", tag),
            Value::Record(r) => write!(f, "{}", r),
        }
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl From<Callable> for Value {
    fn from(c: Callable) -> Self {
        Value::Fn(c)
    }
}

impl From<Record> for Value {
    fn from(r: Record) -> Self {
        Value::Record(r)
    }
}
