//! Error types for contract enforcement.
//!
//! Every failure raised by the engine is a [`ContractError`]. Variants are
//! grouped into five kinds (see [`ErrorKind`]): predicate failures
//! (violations), category failures (type mismatches), definition-time
//! configuration problems, structural problems, and argument-binding
//! problems. Errors are raised synchronously at the point of failure and
//! never retried or swallowed internally.

use thiserror::Error;

/// Result type for contract enforcement operations.
pub type Result<T> = std::result::Result<T, ContractError>;

/// Coarse classification of a [`ContractError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A value failed a predicate while being of a recognized category.
    Violation,
    /// A value belongs to the wrong category entirely.
    TypeMismatch,
    /// Invalid definition-time configuration.
    Configuration,
    /// A type claims enforcement capability without the checkable capability.
    Structural,
    /// Call arguments could not be matched to declared parameters.
    Binding,
}

/// Main error type for contract enforcement operations.
#[derive(Error, Debug)]
pub enum ContractError {
    /// Value is not an instance of the expected type
    #[error("Expected {expected} got {actual}")]
    Violation {
        /// Expected type or validator name
        expected: String,
        /// Actual runtime type of the value
        actual: String,
    },

    /// Value failed the positivity predicate
    #[error("value {value} must be > 0")]
    NotPositive {
        /// Display form of the offending value
        value: String,
    },

    /// Value failed a named custom predicate
    #[error("check '{name}' rejected value {value}")]
    PredicateFailed {
        /// Predicate name
        name: String,
        /// Display form of the offending value
        value: String,
    },

    /// String value does not match the required pattern
    #[error("value {value} does not match pattern '{pattern}'")]
    PatternMismatch {
        /// Display form of the offending value
        value: String,
        /// Pattern that was required
        pattern: String,
    },

    /// Value belongs to the wrong category (e.g. a primitive where a
    /// callable is required)
    #[error("Expected {expected} got {actual}")]
    TypeMismatch {
        /// Expected category
        expected: String,
        /// Actual runtime type of the value
        actual: String,
    },

    /// Empty or zero-valued primitive where a callable is required
    #[error("Expected {expected} got empty {actual}")]
    EmptyPrimitive {
        /// Expected category
        expected: String,
        /// Actual runtime type of the value
        actual: String,
    },

    /// Failure while checking a record field, wrapping the underlying error
    #[error("field '{field}': {source}")]
    Field {
        /// Field name
        field: String,
        /// Underlying check failure
        #[source]
        source: Box<ContractError>,
    },

    /// Failure while checking a call argument, wrapping the underlying error
    #[error("parameter '{param}': {source}")]
    Param {
        /// Parameter name
        param: String,
        /// Underlying check failure
        #[source]
        source: Box<ContractError>,
    },

    /// Assignment to a field of a frozen record type
    #[error("record type '{rtype}' is frozen; cannot assign field '{field}'")]
    FrozenRecord {
        /// Record type name
        rtype: String,
        /// Field that was assigned
        field: String,
    },

    /// Value-semantics configuration key is not recognized
    #[error(
        "unknown config key '{key}', expected one of: init, repr, eq, order, unsafe_hash, frozen"
    )]
    UnknownConfigKey {
        /// The offending key
        key: String,
    },

    /// Value-semantics configuration value is not a boolean
    #[error("config key '{key}' must be a boolean, got {actual}")]
    NonBooleanConfig {
        /// The offending key
        key: String,
        /// Display form of the offending value
        actual: String,
    },

    /// Value-semantics configuration is not a mapping at all
    #[error("params must be a mapping of option names to booleans, got {0}")]
    InvalidConfig(String),

    /// A validator with this name is already registered
    #[error("validator '{0}' is already registered")]
    DuplicateValidator(String),

    /// A record type with this name is already registered
    #[error("record type '{0}' is already registered")]
    DuplicateRecordType(String),

    /// A field name appears more than once on a record type
    #[error("record type '{rtype}' declares field '{field}' more than once")]
    DuplicateField {
        /// Record type name
        rtype: String,
        /// Duplicated field name
        field: String,
    },

    /// A declared type reference resolves to nothing
    #[error("unknown type reference '{0}'")]
    UnknownTypeRef(String),

    /// Invalid regex supplied to a pattern validator
    #[error("invalid pattern '{pattern}': {error}")]
    InvalidPattern {
        /// The offending pattern
        pattern: String,
        /// Compilation error text
        error: String,
    },

    /// Constructor generation is disabled (`init: false`) for this type
    #[error("constructor generation is disabled for record type '{0}'")]
    NoConstructor(String),

    /// Hash generation is disabled (`unsafe_hash: false`) for this type
    #[error("hash generation is disabled for record type '{0}'")]
    HashingDisabled(String),

    /// A type claims enforcement without the checkable capability (or the
    /// other way around)
    #[error("record type '{name}' must provide both the enforced and checkable capabilities")]
    MissingCapability {
        /// Record type name
        name: String,
    },

    /// Too many positional arguments
    #[error("{callee}() takes {expected} arguments but {given} were given")]
    Arity {
        /// Callable or record type name
        callee: String,
        /// Declared parameter count
        expected: usize,
        /// Number of arguments supplied
        given: usize,
    },

    /// Keyword argument does not name a declared parameter
    #[error("{callee}() got an unexpected keyword argument '{keyword}'")]
    UnknownKeyword {
        /// Callable or record type name
        callee: String,
        /// The offending keyword
        keyword: String,
    },

    /// A parameter was bound both positionally and by keyword
    #[error("{callee}() got multiple values for argument '{name}'")]
    DuplicateArgument {
        /// Callable or record type name
        callee: String,
        /// Parameter name
        name: String,
    },

    /// A required parameter received no argument
    #[error("{callee}() missing required argument '{name}'")]
    MissingArgument {
        /// Callable or record type name
        callee: String,
        /// Parameter name
        name: String,
    },

    /// Field access on a record type that does not declare the field
    #[error("record type '{rtype}' has no field '{field}'")]
    UnknownField {
        /// Record type name
        rtype: String,
        /// Field name
        field: String,
    },

    /// Method call on a record type that does not define the method
    #[error("record type '{rtype}' has no method '{method}'")]
    UnknownMethod {
        /// Record type name
        rtype: String,
        /// Method name
        method: String,
    },
}

impl ContractError {
    /// Creates a new type-membership violation error.
    pub fn violation(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::Violation {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Creates a new category mismatch error.
    pub fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Wraps an error with the field it was raised for.
    pub fn for_field(field: impl Into<String>, source: ContractError) -> Self {
        Self::Field {
            field: field.into(),
            source: Box::new(source),
        }
    }

    /// Wraps an error with the parameter it was raised for.
    pub fn for_param(param: impl Into<String>, source: ContractError) -> Self {
        Self::Param {
            param: param.into(),
            source: Box::new(source),
        }
    }

    /// Returns the kind this error belongs to.
    ///
    /// `Field` and `Param` wrappers delegate to the wrapped error, so a
    /// violation stays a violation no matter where it surfaced.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Violation { .. }
            | Self::NotPositive { .. }
            | Self::PredicateFailed { .. }
            | Self::PatternMismatch { .. }
            | Self::FrozenRecord { .. } => ErrorKind::Violation,

            Self::TypeMismatch { .. } | Self::EmptyPrimitive { .. } => ErrorKind::TypeMismatch,

            Self::Field { source, .. } | Self::Param { source, .. } => source.kind(),

            Self::UnknownConfigKey { .. }
            | Self::NonBooleanConfig { .. }
            | Self::InvalidConfig(_)
            | Self::DuplicateValidator(_)
            | Self::DuplicateRecordType(_)
            | Self::DuplicateField { .. }
            | Self::UnknownTypeRef(_)
            | Self::InvalidPattern { .. }
            | Self::NoConstructor(_)
            | Self::HashingDisabled(_) => ErrorKind::Configuration,

            Self::MissingCapability { .. } => ErrorKind::Structural,

            Self::Arity { .. }
            | Self::UnknownKeyword { .. }
            | Self::DuplicateArgument { .. }
            | Self::MissingArgument { .. }
            | Self::UnknownField { .. }
            | Self::UnknownMethod { .. } => ErrorKind::Binding,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_violation_message() {
        let err = ContractError::violation("integer", "string");
        assert_eq!(err.to_string(), "Expected integer got string");
        assert_eq!(err.kind(), ErrorKind::Violation);
    }

    #[test]
    fn test_wrapped_errors_keep_kind() {
        let err = ContractError::for_field("first", ContractError::type_mismatch("function", "list"));
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        assert_eq!(err.to_string(), "field 'first': Expected function got list");

        let err = ContractError::for_param(
            "n",
            ContractError::NotPositive {
                value: "0".to_string(),
            },
        );
        assert_eq!(err.kind(), ErrorKind::Violation);
    }

    #[test]
    fn test_binding_errors() {
        let err = ContractError::Arity {
            callee: "greet".to_string(),
            expected: 1,
            given: 2,
        };
        assert_eq!(err.kind(), ErrorKind::Binding);
        assert_eq!(err.to_string(), "greet() takes 1 arguments but 2 were given");
    }
}
