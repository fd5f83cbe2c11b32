//! Function contract decoration.
//!
//! A [`CheckedFn`] wraps a callable with declared parameter types and
//! checks every bound argument before the body runs. Argument binding
//! failures (wrong arity, unknown keyword) are reported as binding errors,
//! distinct from contract violations; any check failure aborts the call
//! before a single side effect of the body is observed.

use std::fmt;
use std::sync::Arc;

use invar_core::{ContractError, Result, TypeTag, Value, ValidatorSpec};

use crate::{Instance, Registries};

/// A declared type reference on a field or parameter: either a plain
/// runtime type or a name resolved through the registries (a registered
/// validator, a composed validator, or a record type).
#[derive(Debug, Clone, PartialEq)]
pub enum TypeRef {
    /// A runtime type, checked by membership
    Tag(TypeTag),
    /// A name resolved through the registries
    Named(String),
}

impl TypeRef {
    /// Resolves this reference to an executable validator.
    ///
    /// Registered validators are used directly. A name of a finalized
    /// record type resolves to that type's membership validator. A plain
    /// runtime type falls back to a synthesized membership check, cached
    /// under the type's identity. Composition is resolved structurally, so
    /// no per-call state is exposed or cleaned up.
    pub fn resolve(&self, registries: &Registries) -> Result<Arc<ValidatorSpec>> {
        match self {
            TypeRef::Tag(tag) => Ok(registries.contracts().synthesize_tag(*tag)),
            TypeRef::Named(name) => {
                if let Some(spec) = registries.contracts().resolve(name) {
                    return Ok(spec);
                }
                if registries.derived().resolve(name).is_some() {
                    return Ok(registries.contracts().synthesize_record(name));
                }
                Err(ContractError::UnknownTypeRef(name.clone()))
            }
        }
    }
}

impl From<TypeTag> for TypeRef {
    fn from(tag: TypeTag) -> Self {
        TypeRef::Tag(tag)
    }
}

impl From<&str> for TypeRef {
    fn from(name: &str) -> Self {
        TypeRef::Named(name.to_string())
    }
}

impl From<String> for TypeRef {
    fn from(name: String) -> Self {
        TypeRef::Named(name)
    }
}

/// One declared parameter of a callable.
#[derive(Debug, Clone)]
pub struct Param {
    name: String,
    type_ref: Option<TypeRef>,
    default: Option<Value>,
}

impl Param {
    /// A parameter with a declared type.
    pub fn new(name: impl Into<String>, type_ref: impl Into<TypeRef>) -> Self {
        Self {
            name: name.into(),
            type_ref: Some(type_ref.into()),
            default: None,
        }
    }

    /// A parameter without a declared type; its arguments are not checked.
    pub fn untyped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_ref: None,
            default: None,
        }
    }

    /// Attaches a default value, making the parameter optional.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Returns the parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared type reference, if any.
    pub fn type_ref(&self) -> Option<&TypeRef> {
        self.type_ref.as_ref()
    }
}

/// Declared signature of a callable.
#[derive(Debug, Clone, Default)]
pub struct Signature {
    params: Vec<Param>,
}

impl Signature {
    /// Creates a signature from its parameters, in declaration order.
    pub fn new(params: Vec<Param>) -> Self {
        Self { params }
    }

    /// Returns the declared parameters.
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Binds positional and keyword arguments to declared parameters.
    ///
    /// Positional arguments fill parameters in order; keyword arguments
    /// match by name. Wrong arity, unknown keywords, duplicate bindings,
    /// and missing required arguments all fail with a binding error before
    /// any type checking happens.
    pub fn bind(
        &self,
        callee: &str,
        args: &[Value],
        kwargs: &[(String, Value)],
    ) -> Result<Vec<Value>> {
        if args.len() > self.params.len() {
            // Only positional overflow is detected here, so only the
            // positional count is reported.
            return Err(ContractError::Arity {
                callee: callee.to_string(),
                expected: self.params.len(),
                given: args.len(),
            });
        }

        let mut slots: Vec<Option<Value>> = self.params.iter().map(|_| None).collect();
        for (slot, value) in slots.iter_mut().zip(args.iter()) {
            *slot = Some(value.clone());
        }

        for (keyword, value) in kwargs {
            let position = self
                .params
                .iter()
                .position(|p| p.name == *keyword)
                .ok_or_else(|| ContractError::UnknownKeyword {
                    callee: callee.to_string(),
                    keyword: keyword.clone(),
                })?;
            if slots[position].is_some() {
                return Err(ContractError::DuplicateArgument {
                    callee: callee.to_string(),
                    name: keyword.clone(),
                });
            }
            slots[position] = Some(value.clone());
        }

        self.params
            .iter()
            .zip(slots)
            .map(|(param, slot)| {
                slot.or_else(|| param.default.clone())
                    .ok_or_else(|| ContractError::MissingArgument {
                        callee: callee.to_string(),
                        name: param.name.clone(),
                    })
            })
            .collect()
    }
}

/// Checks bound arguments against their declared types, resolving each
/// reference through the registries. Shared by free functions, methods,
/// and record construction paths.
pub(crate) fn check_bound(sig: &Signature, bound: &[Value], registries: &Registries) -> Result<()> {
    for (param, value) in sig.params.iter().zip(bound) {
        if let Some(type_ref) = &param.type_ref {
            let spec = type_ref.resolve(registries)?;
            spec.check(value)
                .map_err(|e| ContractError::for_param(&param.name, e))?;
        }
    }
    Ok(())
}

/// Body of a call-checked free function.
pub type FnBody = Arc<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>;

/// A call-checked callable with the same calling convention as the
/// callable it wraps. When every check passes, the original body runs with
/// the original arguments and its result is returned unchanged; the
/// wrapper adds no effect of its own.
#[derive(Clone)]
pub struct CheckedFn {
    name: String,
    sig: Signature,
    body: FnBody,
    registries: Registries,
}

impl CheckedFn {
    /// Wraps a callable with its declared signature.
    pub fn wrap(
        name: impl Into<String>,
        sig: Signature,
        registries: &Registries,
        body: impl Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            sig,
            body: Arc::new(body),
            registries: registries.clone(),
        }
    }

    /// Returns the wrapped callable's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Calls with positional arguments only.
    pub fn call(&self, args: &[Value]) -> Result<Value> {
        self.call_with(args, &[])
    }

    /// Calls with positional and keyword arguments.
    ///
    /// Binds, checks every annotated argument, and only then invokes the
    /// body. Any failure aborts before the body executes.
    pub fn call_with(&self, args: &[Value], kwargs: &[(String, Value)]) -> Result<Value> {
        let bound = self.sig.bind(&self.name, args, kwargs)?;
        check_bound(&self.sig, &bound, &self.registries)?;
        (self.body)(&bound)
    }

    /// Exposes the wrapper as a plain [`invar_core::Callable`] value, so a
    /// checked function can itself be stored in a `Function` field.
    pub fn as_value(&self) -> Value {
        let this = self.clone();
        Value::Fn(invar_core::Callable::new(self.name.clone(), move |args| {
            this.call(args)
        }))
    }
}

impl fmt::Debug for CheckedFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckedFn")
            .field("name", &self.name)
            .field("sig", &self.sig)
            .finish()
    }
}

/// Body of a call-checked record method.
pub type MethodBody = Arc<dyn Fn(&mut Instance, &[Value]) -> Result<Value> + Send + Sync>;

/// A record method wrapped by the function contract decorator. Wrapping
/// happens exactly once, when the record type is finalized.
#[derive(Clone)]
pub struct Method {
    name: String,
    sig: Signature,
    body: MethodBody,
    registries: Registries,
}

impl Method {
    /// Wraps a method body with its declared signature (receiver excluded).
    pub fn wrap(
        name: impl Into<String>,
        sig: Signature,
        registries: &Registries,
        body: impl Fn(&mut Instance, &[Value]) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            sig,
            body: Arc::new(body),
            registries: registries.clone(),
        }
    }

    pub(crate) fn from_parts(
        name: String,
        sig: Signature,
        registries: Registries,
        body: MethodBody,
    ) -> Self {
        Self {
            name,
            sig,
            body,
            registries,
        }
    }

    /// Returns the method name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Binds and checks arguments, then invokes the body on the receiver.
    pub fn call(
        &self,
        receiver: &mut Instance,
        args: &[Value],
        kwargs: &[(String, Value)],
    ) -> Result<Value> {
        let bound = self.sig.bind(&self.name, args, kwargs)?;
        check_bound(&self.sig, &bound, &self.registries)?;
        (self.body)(receiver, &bound)
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("name", &self.name)
            .field("sig", &self.sig)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use invar_core::ErrorKind;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn greet(registries: &Registries) -> CheckedFn {
        CheckedFn::wrap(
            "greet",
            Signature::new(vec![Param::new("name", TypeTag::Str)]),
            registries,
            |args| {
                let name = args[0].as_str().unwrap_or_default();
                Ok(Value::Str(format!("hello {name}")))
            },
        )
    }

    #[test]
    fn test_checked_call_passes_through() {
        let registries = Registries::new();
        let f = greet(&registries);
        let out = f.call(&[Value::Str("x".into())]).unwrap();
        assert_eq!(out, Value::Str("hello x".into()));
    }

    #[test]
    fn test_mismatched_argument_aborts_before_body() {
        let registries = Registries::new();
        let effects = Arc::new(AtomicUsize::new(0));
        let seen = effects.clone();
        let f = CheckedFn::wrap(
            "greet",
            Signature::new(vec![Param::new("name", TypeTag::Str)]),
            &registries,
            move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(Value::Null)
            },
        );

        let err = f.call(&[Value::Int(42)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Violation);
        assert_eq!(
            err.to_string(),
            "parameter 'name': Expected string got integer"
        );
        assert_eq!(effects.load(Ordering::SeqCst), 0);

        f.call(&[Value::Str("x".into())]).unwrap();
        assert_eq!(effects.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_binding_errors_are_distinct() {
        let registries = Registries::new();
        let f = greet(&registries);

        let err = f
            .call(&[Value::Str("a".into()), Value::Str("b".into())])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Binding);
        assert_eq!(err.to_string(), "greet() takes 1 arguments but 2 were given");

        // Keywords do not inflate the reported positional count.
        let err = f
            .call_with(
                &[Value::Str("a".into()), Value::Str("b".into())],
                &[("name".to_string(), Value::Str("c".into()))],
            )
            .unwrap_err();
        assert_eq!(err.to_string(), "greet() takes 1 arguments but 2 were given");

        let err = f
            .call_with(&[], &[("nom".to_string(), Value::Str("a".into()))])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Binding);
        assert_eq!(err.to_string(), "greet() got an unexpected keyword argument 'nom'");

        let err = f
            .call_with(
                &[Value::Str("a".into())],
                &[("name".to_string(), Value::Str("b".into()))],
            )
            .unwrap_err();
        assert_eq!(err.to_string(), "greet() got multiple values for argument 'name'");

        let err = f.call(&[]).unwrap_err();
        assert_eq!(err.to_string(), "greet() missing required argument 'name'");
    }

    #[test]
    fn test_keyword_binding_and_defaults() {
        let registries = Registries::new();
        let f = CheckedFn::wrap(
            "scale",
            Signature::new(vec![
                Param::new("n", "NaturalNum"),
                Param::new("by", TypeTag::Int).with_default(2i64),
            ]),
            &registries,
            |args| {
                let n = args[0].as_int().unwrap_or_default();
                let by = args[1].as_int().unwrap_or_default();
                Ok(Value::Int(n * by))
            },
        );

        assert_eq!(f.call(&[Value::Int(3)]).unwrap(), Value::Int(6));
        assert_eq!(
            f.call_with(&[Value::Int(3)], &[("by".to_string(), Value::Int(5))])
                .unwrap(),
            Value::Int(15)
        );

        // Composed validator resolved by name from the registry.
        let err = f.call(&[Value::Int(0)]).unwrap_err();
        assert_eq!(err.to_string(), "parameter 'n': value 0 must be > 0");
    }

    #[test]
    fn test_unknown_type_reference() {
        let registries = Registries::new();
        let f = CheckedFn::wrap(
            "f",
            Signature::new(vec![Param::new("x", "NoSuchType")]),
            &registries,
            |_| Ok(Value::Null),
        );
        let err = f.call(&[Value::Int(1)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_checked_fn_as_value_is_callable() {
        let registries = Registries::new();
        let f = greet(&registries);
        let spec = registries.contracts().resolve("Function").unwrap();
        assert!(spec.check(&f.as_value()).is_ok());
    }
}
