//! Composite lookup keys.

use std::fmt::Display;

use crate::{table::Tuple, value::Value};

/// An ordered sequence of values extracted from a tuple's key attributes
/// (or from an explicit comparison-attribute list).
///
/// Keys compare structurally: two keys are equal iff all corresponding
/// elements are equal, and the order is lexicographic over the elements.
/// The same type doubles as the "tuple fingerprint" used for duplicate
/// elimination in project/union/minus.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key(Vec<Value>);

impl Key {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }

    /// Extract a key from `tuple` at the given positions, preserving the
    /// position order.
    pub(crate) fn from_positions(tuple: &Tuple, positions: &[usize]) -> Self {
        Self(positions.iter().map(|&p| tuple.data[p].clone()).collect())
    }
}

impl From<Vec<Value>> for Key {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "(")?;
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", v)?;
        }
        write!(f, ")")
    }
}
