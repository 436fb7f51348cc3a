//! The error taxonomy shared across the engine.

use thiserror::Error as ThisError;

use crate::{
    key::Key,
    value::{Domain, Value},
    BoundedString,
};

/// Everything that can go wrong inside the table engine.
///
/// Validation failures are detected before any row of output is produced:
/// callers never observe a partially built table. Per-row anomalies during
/// scans (an unmatched foreign key in an index join, say) are expected and
/// simply exclude that row, so they do not appear here.
#[derive(Debug, Clone, PartialEq, ThisError)]
pub enum Error {
    /// Unknown domain name or a malformed attribute/key specification.
    #[error("schema error: {0}")]
    Schema(String),

    /// An inserted tuple's length disagrees with the schema arity.
    #[error("arity mismatch: tuple has {actual} values, schema expects {expected}")]
    ArityMismatch { expected: usize, actual: usize },

    /// An inserted value's runtime type disagrees with its declared domain.
    #[error("domain violation: attribute '{attribute}' expects {expected}, got {found} value {value}")]
    DomainViolation {
        attribute: BoundedString,
        expected: Domain,
        found: Domain,
        value: Value,
    },

    /// A referenced attribute name does not exist in the schema.
    #[error("attribute '{0}' not found")]
    AttributeNotFound(BoundedString),

    /// Union/minus operands differ in arity or domain sequence.
    #[error("incompatible tables: {0}")]
    IncompatibleTables(String),

    /// A join was invoked with attribute lists that cannot be matched up.
    #[error("join configuration error: {0}")]
    JoinConfiguration(String),

    /// A keyed lookup was attempted on a table built without an index.
    #[error("no index available on table '{0}'")]
    IndexUnavailable(BoundedString),

    /// An insert would store a second tuple under an existing primary key.
    #[error("duplicate key {key} in table '{table}'")]
    DuplicateKey { table: BoundedString, key: Key },

    /// A snapshot is missing, unreadable or corrupted.
    #[error("persistence failure: {0}")]
    Persistence(String),
}
