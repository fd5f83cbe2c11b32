//! Record construction pipeline.
//!
//! [`RecordTypeBuilder`] collects a type definition (capabilities, base,
//! fields, methods, value-semantics configuration) and
//! [`finalize`](RecordTypeBuilder::finalize) wires it into a
//! [`RecordType`]: capability check, field resolution into attribute
//! validators, one-time method wrapping, semantics generation, the
//! interface-only flag, and registration in the derived type registry.

use std::collections::HashMap;
use std::sync::Arc;

use invar_core::{ContractError, Result};
use tracing::debug;

use crate::function::{Method, MethodBody, Param, Signature, TypeRef};
use crate::record::{FieldBinding, RecordType, Semantics};
use crate::{Instance, Registries};

/// Capabilities a record definition must carry.
///
/// `Enforced` opts the type into contract enforcement; `Checkable` makes
/// it usable as a checked value. A definition claiming one without the
/// other is structurally invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Contract-enforced aggregate
    Enforced,
    /// Checkable value
    Checkable,
}

/// Builder for defining a contract-enforced record type.
pub struct RecordTypeBuilder {
    name: String,
    capabilities: Vec<Capability>,
    base: Option<String>,
    fields: Vec<(String, TypeRef)>,
    methods: Vec<(String, Signature, MethodBody)>,
    params: Option<serde_json::Value>,
}

impl RecordTypeBuilder {
    /// Starts a definition with no capabilities declared.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            capabilities: Vec::new(),
            base: None,
            fields: Vec::new(),
            methods: Vec::new(),
            params: None,
        }
    }

    /// Starts a contract definition carrying both required capabilities.
    /// This is the ordinary entry point.
    pub fn contract(name: impl Into<String>) -> Self {
        Self::new(name)
            .capability(Capability::Enforced)
            .capability(Capability::Checkable)
    }

    /// Declares a capability.
    pub fn capability(mut self, capability: Capability) -> Self {
        if !self.capabilities.contains(&capability) {
            self.capabilities.push(capability);
        }
        self
    }

    /// Derives from an already-finalized record type. Fields of
    /// non-interface-only bases precede own fields; methods are inherited
    /// with override.
    pub fn derive_from(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    /// Declares a field: name and declared type reference, in order.
    pub fn field(mut self, name: impl Into<String>, type_ref: impl Into<TypeRef>) -> Self {
        self.fields.push((name.into(), type_ref.into()));
        self
    }

    /// Declares a method; it will be wrapped by the function contract
    /// decorator exactly once, at finalization.
    pub fn method(
        mut self,
        name: impl Into<String>,
        sig: Signature,
        body: impl Fn(&mut Instance, &[invar_core::Value]) -> Result<invar_core::Value>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.methods.push((name.into(), sig, Arc::new(body)));
        self
    }

    /// Supplies an explicit value-semantics configuration mapping.
    pub fn params(mut self, config: serde_json::Value) -> Self {
        self.params = Some(config);
        self
    }

    /// Finalizes the definition into a registered record type.
    pub fn finalize(self, registries: &Registries) -> Result<Arc<RecordType>> {
        // 1. Capability check.
        if !self.capabilities.contains(&Capability::Enforced)
            || !self.capabilities.contains(&Capability::Checkable)
        {
            return Err(ContractError::MissingCapability { name: self.name });
        }

        // 4. Value-semantics configuration, validated before anything else
        // of the type exists.
        let semantics = match &self.params {
            Some(config) => Semantics::from_config(config)?,
            None => Semantics::default(),
        };

        let base = self
            .base
            .as_ref()
            .map(|name| {
                registries
                    .derived()
                    .resolve(name)
                    .ok_or_else(|| ContractError::UnknownTypeRef(name.clone()))
            })
            .transpose()?;

        // 2. Field resolution into attribute validators, declaration order.
        // Interface-only bases contribute no field slots.
        let mut fields: Vec<FieldBinding> = Vec::new();
        if let Some(base) = &base {
            if !base.interface_only() {
                fields.extend(base.fields().iter().cloned());
            }
        }
        for (field_name, type_ref) in &self.fields {
            if fields.iter().any(|b| b.name() == field_name) {
                return Err(ContractError::DuplicateField {
                    rtype: self.name,
                    field: field_name.clone(),
                });
            }
            let validator = type_ref.resolve(registries)?;
            fields.push(FieldBinding::new(field_name, validator));
        }

        // 3. Method wrapping, once per method. Own methods override
        // inherited ones.
        let mut methods: HashMap<String, Arc<Method>> = base
            .as_ref()
            .map(|b| {
                b.method_names()
                    .map(|name| (name.to_string(), b.method(name).unwrap().clone()))
                    .collect()
            })
            .unwrap_or_default();
        for (method_name, sig, body) in self.methods {
            let method = Method::from_parts(method_name.clone(), sig, registries.clone(), body);
            methods.insert(method_name, Arc::new(method));
        }

        // 5. Interface reuse: no fields at all means no field-slot
        // bookkeeping for subclasses to inherit.
        let interface_only = fields.is_empty();

        let mut ancestry = Vec::new();
        if let Some(base) = &base {
            ancestry.push(base.name().to_string());
            ancestry.extend(base.ancestry().iter().cloned());
        }

        let ctor_sig = Signature::new(fields.iter().map(|b| Param::untyped(b.name())).collect());
        let rtype = Arc::new(RecordType::from_parts(
            self.name,
            fields,
            methods,
            semantics,
            interface_only,
            ancestry,
            ctor_sig,
        ));

        // 6. Registration: the finalized type becomes referenceable as a
        // field or parameter type in other contracts.
        registries.derived().define(rtype.clone())?;
        debug!(record_type = %rtype.name(), fields = rtype.fields().len(), "finalized record type");
        Ok(rtype)
    }
}
