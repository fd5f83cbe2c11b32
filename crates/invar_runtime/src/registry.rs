//! Derived type registry and the shared registry handle.
//!
//! Finalized record types are recorded here so they can be referenced as
//! field or parameter types inside other contract-enforced aggregates.
//! Like the contract registry, this table is mutated only when a type is
//! defined; ordinary construction, assignment, and calls only read it.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, RwLock};

use invar_core::{ContractError, ContractRegistry, Result};
use tracing::debug;

use crate::RecordType;

/// Registry of finalized record types, keyed by type name.
#[derive(Debug, Default)]
pub struct DerivedTypeRegistry {
    types: RwLock<HashMap<String, Arc<RecordType>>>,
}

impl DerivedTypeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a finalized type. Duplicate names are rejected.
    pub fn define(&self, rtype: Arc<RecordType>) -> Result<()> {
        let name = rtype.name().to_string();
        let mut types = self.types.write().expect("derived type registry poisoned");
        if types.contains_key(&name) {
            return Err(ContractError::DuplicateRecordType(name));
        }
        debug!(record_type = %name, interface_only = rtype.interface_only(), "registered record type");
        types.insert(name, rtype);
        Ok(())
    }

    /// Resolves a record type by name. Never mutates.
    pub fn resolve(&self, name: &str) -> Option<Arc<RecordType>> {
        self.types
            .read()
            .expect("derived type registry poisoned")
            .get(name)
            .cloned()
    }
}

/// Shared handle over the two definition-time tables: the contract
/// registry (named validators) and the derived type registry (record
/// types). Cloning the handle shares the underlying tables.
#[derive(Debug, Clone)]
pub struct Registries {
    contracts: Arc<ContractRegistry>,
    derived: Arc<DerivedTypeRegistry>,
}

impl Registries {
    /// Creates a fresh pair of registries with the builtin validator
    /// family defined. Useful for tests and embeddings that want isolation
    /// from the process-wide tables.
    pub fn new() -> Self {
        Self {
            contracts: Arc::new(ContractRegistry::with_builtins()),
            derived: Arc::new(DerivedTypeRegistry::new()),
        }
    }

    /// Returns a handle to the process-wide registries.
    ///
    /// All definitions through this handle must happen before concurrent
    /// use; typical embeddings confine them to a startup phase.
    pub fn global() -> Self {
        static GLOBAL: LazyLock<Registries> = LazyLock::new(Registries::new);
        GLOBAL.clone()
    }

    /// The validator name table.
    pub fn contracts(&self) -> &ContractRegistry {
        &self.contracts
    }

    /// The record type table.
    pub fn derived(&self) -> &DerivedTypeRegistry {
        &self.derived
    }
}

impl Default for Registries {
    fn default() -> Self {
        Self::new()
    }
}
