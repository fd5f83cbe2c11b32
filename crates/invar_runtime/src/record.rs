//! Record types and enforced instances.
//!
//! A [`RecordType`] is the finalized product of the construction pipeline:
//! every declared field carries an attribute validator bound once at
//! definition time, every method is wrapped by the function contract
//! decorator, and the generated value semantics follow the type's
//! configuration. An [`Instance`] routes construction and every later
//! mutation through the bound validators, so at every observable point a
//! stored field value satisfies its validator.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use invar_core::{ContractError, Record, Result, Value, ValidatorSpec};

use crate::function::{Method, Signature};

/// An attribute validator: one validator bound to one field of one record
/// type, at definition time, immutable thereafter.
#[derive(Debug, Clone)]
pub struct FieldBinding {
    name: String,
    validator: Arc<ValidatorSpec>,
}

impl FieldBinding {
    /// Binds a validator to a field name.
    pub fn new(name: impl Into<String>, validator: Arc<ValidatorSpec>) -> Self {
        Self {
            name: name.into(),
            validator,
        }
    }

    /// Returns the bound field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the bound validator.
    pub fn validator(&self) -> &Arc<ValidatorSpec> {
        &self.validator
    }

    /// Checks a value destined for this field. On failure nothing is
    /// stored; the caller leaves the field at its previous value.
    pub fn check(&self, value: &Value) -> Result<()> {
        self.validator
            .check(value)
            .map_err(|e| ContractError::for_field(&self.name, e))
    }
}

/// Generated value-semantics configuration for a record type.
///
/// Defaults: constructor, representation, and equality on; ordering and
/// hashing off; mutable after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Semantics {
    /// Generate the construction call
    pub init: bool,
    /// Generate the display representation
    pub repr: bool,
    /// Generate field-wise equality
    pub eq: bool,
    /// Generate field-wise ordering
    pub order: bool,
    /// Generate hashing
    pub unsafe_hash: bool,
    /// Reject every assignment after construction
    pub frozen: bool,
}

impl Default for Semantics {
    fn default() -> Self {
        Self {
            init: true,
            repr: true,
            eq: true,
            order: false,
            unsafe_hash: false,
            frozen: false,
        }
    }
}

impl Semantics {
    /// Parses an explicit configuration mapping.
    ///
    /// Only the keys `init`, `repr`, `eq`, `order`, `unsafe_hash`, and
    /// `frozen` are recognized, each mapped to a boolean; anything else is
    /// a configuration error, raised before the type can be finalized.
    pub fn from_config(config: &serde_json::Value) -> Result<Self> {
        let entries = config
            .as_object()
            .ok_or_else(|| ContractError::InvalidConfig(config.to_string()))?;

        let mut semantics = Self::default();
        for (key, value) in entries {
            let slot = match key.as_str() {
                "init" => &mut semantics.init,
                "repr" => &mut semantics.repr,
                "eq" => &mut semantics.eq,
                "order" => &mut semantics.order,
                "unsafe_hash" => &mut semantics.unsafe_hash,
                "frozen" => &mut semantics.frozen,
                _ => {
                    return Err(ContractError::UnknownConfigKey { key: key.clone() });
                }
            };
            *slot = value
                .as_bool()
                .ok_or_else(|| ContractError::NonBooleanConfig {
                    key: key.clone(),
                    actual: value.to_string(),
                })?;
        }
        Ok(semantics)
    }
}

/// A finalized contract-enforced record type.
///
/// Created once by the construction pipeline and effectively immutable
/// configuration thereafter.
#[derive(Debug)]
pub struct RecordType {
    name: String,
    fields: Vec<FieldBinding>,
    methods: HashMap<String, Arc<Method>>,
    semantics: Semantics,
    interface_only: bool,
    ancestry: Vec<String>,
    ctor_sig: Signature,
}

impl RecordType {
    pub(crate) fn from_parts(
        name: String,
        fields: Vec<FieldBinding>,
        methods: HashMap<String, Arc<Method>>,
        semantics: Semantics,
        interface_only: bool,
        ancestry: Vec<String>,
        ctor_sig: Signature,
    ) -> Self {
        Self {
            name,
            fields,
            methods,
            semantics,
            interface_only,
            ancestry,
            ctor_sig,
        }
    }

    /// Returns the type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the value-semantics configuration.
    pub fn semantics(&self) -> Semantics {
        self.semantics
    }

    /// True for types that declare no fields at all and exist for shared
    /// behavior reuse.
    pub fn interface_only(&self) -> bool {
        self.interface_only
    }

    /// Returns the field bindings in declared order.
    pub fn fields(&self) -> &[FieldBinding] {
        &self.fields
    }

    /// Looks up a field binding by name.
    pub fn field(&self, name: &str) -> Option<&FieldBinding> {
        self.fields.iter().find(|b| b.name() == name)
    }

    /// Looks up a wrapped method by name, including inherited ones.
    pub fn method(&self, name: &str) -> Option<&Arc<Method>> {
        self.methods.get(name)
    }

    /// Iterates over the names of all methods, including inherited ones.
    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    /// Returns the base-type chain, nearest base first.
    pub fn ancestry(&self) -> &[String] {
        &self.ancestry
    }

    /// Constructs an instance from positional arguments.
    pub fn construct(self: &Arc<Self>, args: &[Value]) -> Result<Instance> {
        self.construct_with(args, &[])
    }

    /// Constructs an instance from positional and keyword arguments
    /// matching declared fields in declared order.
    ///
    /// Arguments are bound like a call, then validated field by field in
    /// declared order into a buffer that is committed atomically: the
    /// first failure aborts construction and no partially built instance
    /// is ever observable.
    pub fn construct_with(self: &Arc<Self>, args: &[Value], kwargs: &[(String, Value)]) -> Result<Instance> {
        if !self.semantics.init {
            return Err(ContractError::NoConstructor(self.name.clone()));
        }

        let bound = self.ctor_sig.bind(&self.name, args, kwargs)?;
        let mut data = Record::new(&self.name, self.ancestry.clone());
        for (binding, value) in self.fields.iter().zip(bound) {
            binding.check(&value)?;
            data.insert(binding.name(), value);
        }
        Ok(Instance {
            ty: Arc::clone(self),
            data,
        })
    }

    /// Creates an instance with every field unset, for types that disable
    /// constructor generation. Fields are assigned afterwards through the
    /// validated [`Instance::set`] path.
    pub fn uninit(self: &Arc<Self>) -> Instance {
        Instance {
            ty: Arc::clone(self),
            data: Record::new(&self.name, self.ancestry.clone()),
        }
    }
}

/// An enforced record instance.
#[derive(Debug, Clone)]
pub struct Instance {
    ty: Arc<RecordType>,
    data: Record,
}

impl Instance {
    /// Returns the instance's record type.
    pub fn record_type(&self) -> &Arc<RecordType> {
        &self.ty
    }

    /// Returns the current value of a field, if set.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    /// Assigns a field, routing the value through the bound validator.
    ///
    /// Every mutation is intercepted, not only construction. On failure
    /// nothing is stored and the field keeps its previous value. Frozen
    /// types reject all assignments.
    pub fn set(&mut self, field: &str, value: Value) -> Result<()> {
        if self.ty.semantics.frozen {
            return Err(ContractError::FrozenRecord {
                rtype: self.ty.name.clone(),
                field: field.to_string(),
            });
        }
        let binding = self
            .ty
            .field(field)
            .ok_or_else(|| ContractError::UnknownField {
                rtype: self.ty.name.clone(),
                field: field.to_string(),
            })?;
        binding.check(&value)?;
        self.data.insert(field, value);
        Ok(())
    }

    /// Calls a wrapped method with positional arguments.
    pub fn call_method(&mut self, name: &str, args: &[Value]) -> Result<Value> {
        self.call_method_with(name, args, &[])
    }

    /// Calls a wrapped method with positional and keyword arguments.
    pub fn call_method_with(
        &mut self,
        name: &str,
        args: &[Value],
        kwargs: &[(String, Value)],
    ) -> Result<Value> {
        let method = self
            .ty
            .method(name)
            .cloned()
            .ok_or_else(|| ContractError::UnknownMethod {
                rtype: self.ty.name.clone(),
                method: name.to_string(),
            })?;
        method.call(self, args, kwargs)
    }

    /// Snapshot of this instance as a plain value, usable as a field value
    /// or call argument of another contract.
    pub fn value(&self) -> Value {
        Value::Record(self.data.clone())
    }

    /// Field-wise hash for types that opt into `unsafe_hash`.
    pub fn hash_code(&self) -> Result<u64> {
        if !self.ty.semantics.unsafe_hash {
            return Err(ContractError::HashingDisabled(self.ty.name.clone()));
        }
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.ty.name.hash(&mut hasher);
        for (name, value) in self.data.fields() {
            name.hash(&mut hasher);
            value.feed_hash(&mut hasher);
        }
        Ok(hasher.finish())
    }
}

impl From<&Instance> for Value {
    fn from(instance: &Instance) -> Self {
        instance.value()
    }
}

impl PartialEq for Instance {
    /// Field-wise equality when the type generates `eq`; otherwise only an
    /// instance equals itself.
    fn eq(&self, other: &Self) -> bool {
        if !self.ty.semantics.eq {
            return std::ptr::eq(self, other);
        }
        self.ty.name == other.ty.name && self.data == other.data
    }
}

impl PartialOrd for Instance {
    /// Field-wise ordering in declared order when the type generates
    /// `order`; incomparable otherwise.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if !self.ty.semantics.order || self.ty.name != other.ty.name {
            return None;
        }
        for binding in &self.ty.fields {
            let ordering = self
                .get(binding.name())?
                .partial_cmp(other.get(binding.name())?)?;
            if ordering != Ordering::Equal {
                return Some(ordering);
            }
        }
        Some(Ordering::Equal)
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ty.semantics.repr {
            write!(f, "{}", self.data)
        } else {
            write!(f, "<{} instance>", self.ty.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use invar_core::ErrorKind;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_semantics_defaults() {
        let semantics = Semantics::default();
        assert!(semantics.init && semantics.repr && semantics.eq);
        assert!(!semantics.order && !semantics.unsafe_hash && !semantics.frozen);
    }

    #[test]
    fn test_semantics_from_config() {
        let semantics = Semantics::from_config(&json!({ "frozen": true, "order": true })).unwrap();
        assert!(semantics.frozen);
        assert!(semantics.order);
        assert!(semantics.init);
    }

    #[test]
    fn test_semantics_rejects_unknown_key() {
        let err = Semantics::from_config(&json!({ "turbo": true })).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(
            err.to_string(),
            "unknown config key 'turbo', expected one of: init, repr, eq, order, unsafe_hash, frozen"
        );
    }

    #[test]
    fn test_semantics_rejects_non_boolean() {
        let err = Semantics::from_config(&json!({ "order": "yes" })).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(err.to_string(), "config key 'order' must be a boolean, got \"yes\"");
    }

    #[test]
    fn test_semantics_rejects_non_mapping() {
        let err = Semantics::from_config(&json!(true)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
}
