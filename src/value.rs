//! Attribute domains and the tagged values stored in tuples.

use std::fmt::Display;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// The domain (primitive kind) of an attribute.
///
/// A closed set: every value in a table conforms to exactly one of these
/// tags, checked when the tuple is inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Domain {
    Integer,
    Real,
    Text,
    Char,
}

impl Domain {
    /// Resolve a domain name as it appears in a schema specification.
    ///
    /// Several spellings map to the same tag (all integer widths are
    /// `Integer`, all float widths are `Real`). Unknown names are a
    /// [`Error::Schema`].
    pub fn resolve(name: &str) -> Result<Self, Error> {
        match name {
            "Integer" | "Int" | "Long" | "Short" | "Byte" => Ok(Domain::Integer),
            "Real" | "Double" | "Float" => Ok(Domain::Real),
            "Text" | "String" => Ok(Domain::Text),
            "Char" | "Character" => Ok(Domain::Char),
            _ => Err(Error::Schema(format!("unknown domain name '{}'", name))),
        }
    }
}

impl Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Domain::Integer => write!(f, "Integer"),
            Domain::Real => write!(f, "Real"),
            Domain::Text => write!(f, "Text"),
            Domain::Char => write!(f, "Char"),
        }
    }
}

/// A value contained within a table's cell.
///
/// `Real` wraps [`OrderedFloat`] so that every value has a total order and
/// can be hashed, which is what lets composite keys live in any of the
/// index backings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Value {
    Int(i64),
    Real(OrderedFloat<f64>),
    Text(String),
    Char(char),
}

impl Value {
    /// The domain tag this value conforms to.
    pub fn domain(&self) -> Domain {
        match self {
            Value::Int(_) => Domain::Integer,
            Value::Real(_) => Domain::Real,
            Value::Text(_) => Domain::Text,
            Value::Char(_) => Domain::Char,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Real(r) => Some(r.into_inner()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(r: f64) -> Self {
        Value::Real(OrderedFloat(r))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Char(c)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{}", r),
            Value::Text(s) => write!(f, "{}", s),
            Value::Char(c) => write!(f, "{}", c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Domain, Value};
    use crate::error::Error;

    #[test]
    fn resolve_domain_names() {
        assert_eq!(Domain::resolve("Integer"), Ok(Domain::Integer));
        assert_eq!(Domain::resolve("Long"), Ok(Domain::Integer));
        assert_eq!(Domain::resolve("Double"), Ok(Domain::Real));
        assert_eq!(Domain::resolve("String"), Ok(Domain::Text));
        assert_eq!(Domain::resolve("Character"), Ok(Domain::Char));

        assert!(matches!(
            Domain::resolve("Blob"),
            Err(Error::Schema(_))
        ));
    }

    #[test]
    fn value_domains() {
        assert_eq!(Value::Int(1).domain(), Domain::Integer);
        assert_eq!(Value::from(1.5).domain(), Domain::Real);
        assert_eq!(Value::from("x").domain(), Domain::Text);
        assert_eq!(Value::from('x').domain(), Domain::Char);
    }

    #[test]
    fn value_ordering_is_total() {
        let mut vals = vec![Value::from(2.0), Value::from(1.0), Value::from(f64::NAN)];
        vals.sort();
        assert_eq!(vals[0], Value::from(1.0));
        assert_eq!(vals[1], Value::from(2.0));
    }

    #[test]
    fn accessors() {
        assert_eq!(Value::Int(42).as_int(), Some(42));
        assert_eq!(Value::from("42").as_int(), None);
        assert_eq!(Value::from(2.5).as_real(), Some(2.5));
        assert_eq!(Value::from("hi").as_str(), Some("hi"));
    }
}
