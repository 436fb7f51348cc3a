//! Schema representation and the string construction surface.

use crate::{
    column::Column,
    error::Error,
    value::Domain,
    BoundedString,
};

/// A table's schema: an ordered list of attributes and the primary key.
///
/// Invariants, checked at construction: attribute names are unique, the
/// arity is at least one, and every key attribute appears in the attribute
/// list.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    name: BoundedString,
    columns: Vec<Column>,
    key: Vec<BoundedString>,
}

impl Schema {
    pub fn new(
        name: BoundedString,
        columns: Vec<Column>,
        key: Vec<BoundedString>,
    ) -> Result<Self, Error> {
        if columns.is_empty() {
            return Err(Error::Schema(format!(
                "table '{}' must have at least one attribute",
                name
            )));
        }
        for (i, col) in columns.iter().enumerate() {
            if columns[..i].iter().any(|c| c.name() == col.name()) {
                return Err(Error::Schema(format!(
                    "duplicate attribute '{}' in table '{}'",
                    col.name(),
                    name
                )));
            }
        }
        if key.is_empty() {
            return Err(Error::Schema(format!(
                "table '{}' must have a primary key",
                name
            )));
        }
        for k in &key {
            if !columns.iter().any(|c| c.name() == k) {
                return Err(Error::Schema(format!(
                    "key attribute '{}' is not an attribute of table '{}'",
                    k, name
                )));
            }
        }
        Ok(Self { name, columns, key })
    }

    /// Build a schema from space-separated attribute, domain and key name
    /// lists, e.g. `("Professor", "id name deptId", "Integer String String",
    /// "id")`.
    pub fn parse(name: &str, attributes: &str, domains: &str, key: &str) -> Result<Self, Error> {
        let attrs: Vec<&str> = attributes.split_whitespace().collect();
        let doms: Vec<&str> = domains.split_whitespace().collect();
        if attrs.len() != doms.len() {
            return Err(Error::Schema(format!(
                "table '{}' declares {} attributes but {} domains",
                name,
                attrs.len(),
                doms.len()
            )));
        }
        let columns = attrs
            .iter()
            .zip(&doms)
            .map(|(attr, dom)| Ok(Column::new((*attr).into(), Domain::resolve(dom)?)))
            .collect::<Result<Vec<_>, Error>>()?;
        let key = key.split_whitespace().map(Into::into).collect();
        Self::new(name.into(), columns, key)
    }

    /// The same schema under a different table name. Used by the operators
    /// to label their derived tables.
    pub(crate) fn renamed(&self, name: BoundedString) -> Self {
        Self {
            name,
            columns: self.columns.clone(),
            key: self.key.clone(),
        }
    }

    pub fn name(&self) -> &BoundedString {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn key(&self) -> &[BoundedString] {
        &self.key
    }

    pub fn arity(&self) -> usize {
        self.columns.len()
    }

    pub fn domains(&self) -> impl Iterator<Item = Domain> + '_ {
        self.columns.iter().map(|c| c.domain())
    }

    /// The zero-based position of a named attribute.
    pub fn col(&self, attr: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == attr)
    }

    /// Resolve a list of attribute names to their positions, preserving the
    /// given order. Any unknown name fails the whole lookup.
    pub fn positions(&self, attrs: &[&str]) -> Result<Vec<usize>, Error> {
        attrs
            .iter()
            .map(|attr| {
                self.col(attr)
                    .ok_or_else(|| Error::AttributeNotFound((*attr).into()))
            })
            .collect()
    }

    /// Positions of the key attributes, in key declaration order.
    pub(crate) fn key_positions(&self) -> Vec<usize> {
        self.key
            .iter()
            .map(|k| self.col(k.as_str()).expect("key attribute validated at construction"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::Schema;
    use crate::{error::Error, value::Domain};

    #[test]
    fn parse_schema() {
        let schema = Schema::parse(
            "Professor",
            "id name deptId",
            "Integer String String",
            "id",
        )
        .unwrap();

        assert_eq!(schema.name(), "Professor");
        assert_eq!(schema.arity(), 3);
        assert_eq!(schema.key().len(), 1);
        assert_eq!(schema.columns()[1].name(), "name");
        assert_eq!(schema.columns()[2].domain(), Domain::Text);
    }

    #[test]
    fn parse_composite_key() {
        let schema = Schema::parse(
            "Teaching",
            "crsCode semester profId",
            "String String Integer",
            "crsCode semester",
        )
        .unwrap();
        assert_eq!(schema.key_positions(), vec![0, 1]);
    }

    #[test]
    fn attribute_lookup() {
        let schema =
            Schema::parse("Student", "id name address", "Integer String String", "id").unwrap();
        assert_eq!(schema.col("name"), Some(1));
        assert_eq!(schema.col("nope"), None);
        assert_eq!(schema.positions(&["address", "id"]).unwrap(), vec![2, 0]);
        assert_eq!(
            schema.positions(&["nope"]),
            Err(Error::AttributeNotFound("nope".into()))
        );
    }

    #[test]
    fn rejects_malformed_specs() {
        // unknown domain name
        assert!(matches!(
            Schema::parse("T", "a", "Blob", "a"),
            Err(Error::Schema(_))
        ));
        // attribute/domain count mismatch
        assert!(matches!(
            Schema::parse("T", "a b", "Integer", "a"),
            Err(Error::Schema(_))
        ));
        // key not among attributes
        assert!(matches!(
            Schema::parse("T", "a b", "Integer Integer", "c"),
            Err(Error::Schema(_))
        ));
        // duplicate attribute names
        assert!(matches!(
            Schema::parse("T", "a a", "Integer Integer", "a"),
            Err(Error::Schema(_))
        ));
        // no attributes at all
        assert!(matches!(
            Schema::parse("T", "", "", ""),
            Err(Error::Schema(_))
        ));
    }
}
