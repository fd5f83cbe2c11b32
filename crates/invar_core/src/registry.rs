//! Contract registry.
//!
//! Process-wide table mapping a validator's declared name to its
//! definition. Defining a validator registers it at that moment; duplicate
//! names are rejected rather than silently overridden. Reads never mutate,
//! and writes are serialized by an interior lock so that the embedding
//! application can confine definitions to a startup phase without extra
//! synchronization.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::{debug, warn};

use crate::{ContractError, Result, TypeTag, ValidatorSpec};

/// Registry of named validators plus caches of validators synthesized on
/// first reference to an unregistered type.
///
/// Runtime tags and record types get separate caches: a record type may
/// legally share its name with a runtime type name, and the two must keep
/// resolving to their own membership validators.
#[derive(Debug)]
pub struct ContractRegistry {
    specs: RwLock<HashMap<String, Arc<ValidatorSpec>>>,
    synthesized_tags: RwLock<HashMap<TypeTag, Arc<ValidatorSpec>>>,
    synthesized_records: RwLock<HashMap<String, Arc<ValidatorSpec>>>,
}

impl ContractRegistry {
    /// Creates an empty registry with no validators defined.
    pub fn empty() -> Self {
        Self {
            specs: RwLock::new(HashMap::new()),
            synthesized_tags: RwLock::new(HashMap::new()),
            synthesized_records: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a registry with the builtin validator family defined:
    /// `Function`, `Positive`, and the composed `NaturalNum`.
    pub fn with_builtins() -> Self {
        let registry = Self::empty();
        for spec in [
            ValidatorSpec::function(),
            ValidatorSpec::positive(),
            ValidatorSpec::natural_num(),
        ] {
            // Fresh registry, names are distinct: cannot collide.
            registry
                .define(spec)
                .expect("builtin validator names are unique");
        }
        registry
    }

    /// Defines a validator, registering it under its own name.
    ///
    /// Returns the shared spec on success. A name that is already taken is
    /// rejected with a configuration error; the existing definition stays
    /// in place.
    pub fn define(&self, spec: ValidatorSpec) -> Result<Arc<ValidatorSpec>> {
        let name = spec.name().to_string();
        let mut specs = self.specs.write().expect("contract registry poisoned");
        if specs.contains_key(&name) {
            warn!(validator = %name, "rejecting duplicate validator definition");
            return Err(ContractError::DuplicateValidator(name));
        }
        debug!(validator = %name, "registered validator");
        let spec = Arc::new(spec);
        specs.insert(name, spec.clone());
        Ok(spec)
    }

    /// Resolves a validator by name. Never mutates.
    pub fn resolve(&self, name: &str) -> Option<Arc<ValidatorSpec>> {
        self.specs
            .read()
            .expect("contract registry poisoned")
            .get(name)
            .cloned()
    }

    /// Returns a generic type-membership validator for a runtime type that
    /// has no registered validator of its own.
    ///
    /// The first reference synthesizes the validator; it is then cached
    /// under the type's identity so repeated references reuse it.
    pub fn synthesize_tag(&self, tag: TypeTag) -> Arc<ValidatorSpec> {
        if let Some(spec) = self
            .synthesized_tags
            .read()
            .expect("contract registry poisoned")
            .get(&tag)
        {
            return spec.clone();
        }
        let mut cache = self
            .synthesized_tags
            .write()
            .expect("contract registry poisoned");
        cache
            .entry(tag)
            .or_insert_with(|| {
                debug!(target_type = %tag, "synthesized membership validator");
                Arc::new(ValidatorSpec::type_is(tag.name(), tag))
            })
            .clone()
    }

    /// Returns (synthesizing and caching on first reference) a membership
    /// validator for a contract-enforced record type.
    pub fn synthesize_record(&self, name: &str) -> Arc<ValidatorSpec> {
        if let Some(spec) = self
            .synthesized_records
            .read()
            .expect("contract registry poisoned")
            .get(name)
        {
            return spec.clone();
        }
        let mut cache = self
            .synthesized_records
            .write()
            .expect("contract registry poisoned");
        cache
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!(record_type = %name, "synthesized record membership validator");
                Arc::new(ValidatorSpec::record_is(name))
            })
            .clone()
    }
}

impl Default for ContractRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorKind, Value};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builtins_resolve() {
        let registry = ContractRegistry::with_builtins();
        for name in ["Function", "Positive", "NaturalNum"] {
            assert!(registry.resolve(name).is_some(), "{name} should be defined");
        }
        assert!(registry.resolve("Missing").is_none());
    }

    #[test]
    fn test_duplicate_definition_rejected() {
        let registry = ContractRegistry::with_builtins();
        let err = registry.define(ValidatorSpec::positive()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(err.to_string(), "validator 'Positive' is already registered");

        // Existing definition still works.
        let spec = registry.resolve("Positive").unwrap();
        assert!(spec.check(&Value::Int(1)).is_ok());
    }

    #[test]
    fn test_synthesized_validators_are_cached() {
        let registry = ContractRegistry::empty();
        let first = registry.synthesize_tag(TypeTag::Str);
        let second = registry.synthesize_tag(TypeTag::Str);
        assert!(Arc::ptr_eq(&first, &second));
        assert!(first.check(&Value::Str("hi".into())).is_ok());
        assert!(first.check(&Value::Int(1)).is_err());
    }

    #[test]
    fn test_tag_and_record_caches_are_disjoint() {
        let registry = ContractRegistry::empty();
        // A record type may share its name with a runtime type name.
        let tag = registry.synthesize_tag(TypeTag::Int);
        let record = registry.synthesize_record("integer");
        assert!(!Arc::ptr_eq(&tag, &record));

        assert!(tag.check(&Value::Int(5)).is_ok());
        // The record validator still requires a record instance.
        let err = record.check(&Value::Int(5)).unwrap_err();
        assert_eq!(err.to_string(), "Expected integer got integer");

        let instance = crate::Record::new("integer", vec![]);
        assert!(record.check(&Value::Record(instance)).is_ok());

        // Warming order does not matter either way around.
        let registry = ContractRegistry::empty();
        let record = registry.synthesize_record("integer");
        let tag = registry.synthesize_tag(TypeTag::Int);
        assert!(!Arc::ptr_eq(&tag, &record));
        assert!(record.check(&Value::Int(5)).is_err());
        assert!(tag.check(&Value::Int(5)).is_ok());
    }

    #[test]
    fn test_user_defined_membership_validator() {
        let registry = ContractRegistry::with_builtins();
        registry
            .define(ValidatorSpec::type_is("CMap", TypeTag::Map))
            .unwrap();
        let spec = registry.resolve("CMap").unwrap();
        assert!(spec.check(&Value::Map(Default::default())).is_ok());
        assert_eq!(
            spec.check(&Value::Int(1)).unwrap_err().to_string(),
            "Expected map got integer"
        );
    }
}
