//! The validator family.
//!
//! A [`ValidatorSpec`] is a named, reusable predicate over runtime values.
//! The family covers generic type-membership checks, the callable-ness check
//! with primitive-type exclusions ("Function"), numeric positivity, pattern
//! matching, user-supplied predicates, and composed ("mixin") validators
//! that AND a primitive base-type check together with extra predicates.
//!
//! Composition is explicit: a composed validator holds an ordered list of
//! sub-predicates evaluated with short-circuit on the first failure. No
//! inheritance mechanism is involved, so checking one value never leaks
//! state into subsequent checks.

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::{ContractError, Result, TypeTag, Value};

/// A single predicate over a runtime value.
#[derive(Clone)]
pub enum Predicate {
    /// Value must be an instance of the target type
    TypeIs(TypeTag),
    /// Value must be an instance of the named record type (or derive from it)
    RecordIs(String),
    /// The `Function` rules: callable-ness with primitive-type exclusions
    Callable,
    /// Value must be a number greater than zero
    Positive,
    /// String value must match the pattern
    Matches(Regex),
    /// User-supplied predicate
    Custom(Arc<dyn Fn(&Value) -> Result<()> + Send + Sync>),
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::TypeIs(tag) => write!(f, "TypeIs({tag})"),
            Predicate::RecordIs(name) => write!(f, "RecordIs({name})"),
            Predicate::Callable => write!(f, "Callable"),
            Predicate::Positive => write!(f, "Positive"),
            Predicate::Matches(re) => write!(f, "Matches({})", re.as_str()),
            Predicate::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// A named validator: one leading predicate plus optional extra predicates
/// for composed validators, evaluated in order with short-circuit on the
/// first failure.
#[derive(Debug, Clone)]
pub struct ValidatorSpec {
    name: String,
    predicate: Predicate,
    parts: Vec<Predicate>,
}

impl ValidatorSpec {
    /// Generic type-membership validator for a runtime type.
    pub fn type_is(name: impl Into<String>, tag: TypeTag) -> Self {
        Self {
            name: name.into(),
            predicate: Predicate::TypeIs(tag),
            parts: Vec::new(),
        }
    }

    /// Membership validator for a contract-enforced record type.
    pub fn record_is(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            predicate: Predicate::RecordIs(name.clone()),
            name,
            parts: Vec::new(),
        }
    }

    /// The `Function` validator: accepts callables, rejects primitive
    /// value types and primitive constructor objects.
    pub fn function() -> Self {
        Self {
            name: "Function".to_string(),
            predicate: Predicate::Callable,
            parts: Vec::new(),
        }
    }

    /// The `Positive` validator: value must be a number greater than zero.
    pub fn positive() -> Self {
        Self {
            name: "Positive".to_string(),
            predicate: Predicate::Positive,
            parts: Vec::new(),
        }
    }

    /// The `NaturalNum` composed validator: integer AND positive.
    pub fn natural_num() -> Self {
        Self::composed("NaturalNum", TypeTag::Int, vec![Predicate::Positive])
    }

    /// A composed ("mixin") validator: membership in a primitive base type
    /// AND every extra predicate, left to right.
    pub fn composed(name: impl Into<String>, base: TypeTag, parts: Vec<Predicate>) -> Self {
        Self {
            name: name.into(),
            predicate: Predicate::TypeIs(base),
            parts,
        }
    }

    /// A pattern validator: string AND regex match. Fails at definition
    /// time if the pattern does not compile.
    pub fn matches(name: impl Into<String>, pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| ContractError::InvalidPattern {
            pattern: pattern.to_string(),
            error: e.to_string(),
        })?;
        Ok(Self {
            name: name.into(),
            predicate: Predicate::TypeIs(TypeTag::Str),
            parts: vec![Predicate::Matches(regex)],
        })
    }

    /// A validator around a user-supplied predicate.
    pub fn predicate(
        name: impl Into<String>,
        check: impl Fn(&Value) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            predicate: Predicate::Custom(Arc::new(check)),
            parts: Vec::new(),
        }
    }

    /// Returns the validator's registered name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Checks a value against this validator.
    ///
    /// The leading predicate runs first, then the extra predicates in
    /// declaration order; the first failure aborts the whole check.
    pub fn check(&self, value: &Value) -> Result<()> {
        self.run(&self.predicate, value)?;
        for part in &self.parts {
            self.run(part, value)?;
        }
        Ok(())
    }

    fn run(&self, predicate: &Predicate, value: &Value) -> Result<()> {
        match predicate {
            Predicate::TypeIs(tag) => {
                if value.type_tag() == *tag {
                    Ok(())
                } else {
                    Err(ContractError::violation(tag.name(), value.type_name()))
                }
            }
            Predicate::RecordIs(name) => match value.as_record() {
                Some(record) if record.is_instance_of(name) => Ok(()),
                _ => Err(ContractError::violation(name, value.type_name())),
            },
            Predicate::Callable => check_function(value),
            Predicate::Positive => check_positive(value),
            Predicate::Matches(regex) => match value {
                Value::Str(s) if regex.is_match(s) => Ok(()),
                Value::Str(s) => Err(ContractError::PatternMismatch {
                    value: format!("{:?}", s),
                    pattern: regex.as_str().to_string(),
                }),
                other => Err(ContractError::type_mismatch("string", other.type_name())),
            },
            Predicate::Custom(check) => check(value),
        }
    }
}

/// The `Function` rules.
///
/// Truthy values that are not of a primitive value type must be callable.
/// Primitive-typed values are rejected whether truthy or falsy, and the
/// primitive constructor objects are rejected outright even though they
/// are callable. Falsy non-primitive values (an absent reference) pass
/// without any callability requirement.
fn check_function(value: &Value) -> Result<()> {
    if value.is_truthy() {
        match value {
            Value::Ctor(tag) => Err(ContractError::type_mismatch(
                "function",
                format!("constructor {tag}"),
            )),
            _ if value.type_tag().is_primitive() => {
                Err(ContractError::type_mismatch("function", value.type_name()))
            }
            _ if value.is_callable() => Ok(()),
            _ => Err(ContractError::type_mismatch("function", value.type_name())),
        }
    } else if value.type_tag().is_primitive() {
        Err(ContractError::EmptyPrimitive {
            expected: "function".to_string(),
            actual: value.type_name(),
        })
    } else {
        Ok(())
    }
}

fn check_positive(value: &Value) -> Result<()> {
    match value.as_float() {
        Some(n) if n > 0.0 => Ok(()),
        Some(_) => Err(ContractError::NotPositive {
            value: value.to_string(),
        }),
        None => Err(ContractError::type_mismatch("number", value.type_name())),
    }
}
