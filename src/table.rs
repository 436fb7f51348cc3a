//! Table storage, validated inserts and the set/filter operators.
//!
//! The join operators live in [`crate::join`]; they are the other half of
//! this type's public surface.

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::{
    error::Error,
    index::{IndexStrategy, KeyIndex},
    key::Key,
    schema::Schema,
    value::Value,
    BoundedString,
};

/// A row in a table: an ordered, fixed-length sequence of typed values
/// conforming to the table's schema. Never mutated once stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tuple {
    pub data: Vec<Value>,
}

impl Tuple {
    pub fn new(data: Vec<Value>) -> Self {
        Self { data }
    }

    pub fn values(&self) -> &[Value] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&Value> {
        self.data.get(i)
    }

    /// This tuple followed by all of `other`'s values.
    pub(crate) fn concat(&self, other: &Tuple) -> Tuple {
        let mut data = self.data.clone();
        data.extend(other.data.iter().cloned());
        Tuple { data }
    }
}

impl From<Vec<Value>> for Tuple {
    fn from(data: Vec<Value>) -> Self {
        Self { data }
    }
}

/// A relational table: a schema, an ordered collection of tuples and an
/// optional primary-key index.
///
/// `insert` is the only operation that mutates a table in place. Every
/// relational operator leaves its inputs untouched and returns a fresh
/// table with a freshly derived schema.
#[derive(Debug)]
pub struct Table {
    schema: Schema,
    rows: Vec<Tuple>,
    strategy: IndexStrategy,
    index: Option<Box<dyn KeyIndex>>,
}

/// Label for a derived table, built from the operand names.
pub(crate) fn derived_name(base: &str, tag: &str) -> BoundedString {
    BoundedString::from_str_truncate(format!("{}_{}", base, tag))
}

impl Table {
    /// An empty table over `schema`, with the index backing chosen by
    /// `strategy`.
    pub fn new(schema: Schema, strategy: IndexStrategy) -> Self {
        Self {
            schema,
            rows: Vec::new(),
            strategy,
            index: strategy.make(),
        }
    }

    /// Build an empty table straight from the raw string specifications.
    ///
    /// ```
    /// # use minirel::{Table, IndexStrategy};
    /// let professor = Table::create(
    ///     "Professor",
    ///     "id name deptId",
    ///     "Integer String String",
    ///     "id",
    ///     IndexStrategy::LinHash,
    /// ).unwrap();
    /// ```
    pub fn create(
        name: &str,
        attributes: &str,
        domains: &str,
        key: &str,
        strategy: IndexStrategy,
    ) -> Result<Self, Error> {
        let schema = Schema::parse(name, attributes, domains, key)?;
        debug!("DDL> create table {} ({})", name, attributes);
        Ok(Self::new(schema, strategy))
    }

    /// A table pre-populated with `rows` (the output of an operator or a
    /// loaded snapshot). The index is rebuilt from the rows; when derived
    /// rows repeat a key, which joins legitimately produce, the last row
    /// wins the index slot.
    pub(crate) fn from_rows(schema: Schema, strategy: IndexStrategy, rows: Vec<Tuple>) -> Self {
        let mut index = strategy.make();
        if let Some(ix) = index.as_mut() {
            let positions = schema.key_positions();
            for row in &rows {
                ix.put(Key::from_positions(row, &positions), row.clone());
            }
        }
        Self {
            schema,
            rows,
            strategy,
            index,
        }
    }

    pub fn name(&self) -> &BoundedString {
        self.schema.name()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows(&self) -> &[Tuple] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn strategy(&self) -> IndexStrategy {
        self.strategy
    }

    pub(crate) fn index(&self) -> Option<&dyn KeyIndex> {
        self.index.as_deref()
    }

    /// The zero-based position of a named attribute.
    pub fn col(&self, attr: &str) -> Option<usize> {
        self.schema.col(attr)
    }

    /// Validate `tuple` against the schema, then append it and index it by
    /// its primary key.
    ///
    /// Fails with [`Error::ArityMismatch`] or [`Error::DomainViolation`]
    /// when the tuple does not conform, and with [`Error::DuplicateKey`]
    /// when the key is already stored. A failed insert leaves the table
    /// unchanged. Without an index ([`IndexStrategy::None`]) there is
    /// nothing to consult, so key uniqueness is not enforced.
    pub fn insert(&mut self, tuple: Tuple) -> Result<(), Error> {
        trace!("DML> insert into {} values {:?}", self.name(), tuple.values());
        self.type_check(&tuple)?;
        let key = Key::from_positions(&tuple, &self.schema.key_positions());
        if let Some(ix) = &self.index {
            if ix.get(&key).is_some() {
                return Err(Error::DuplicateKey {
                    table: *self.name(),
                    key,
                });
            }
        }
        self.rows.push(tuple.clone());
        if let Some(ix) = &mut self.index {
            ix.put(key, tuple);
        }
        Ok(())
    }

    fn type_check(&self, tuple: &Tuple) -> Result<(), Error> {
        if tuple.len() != self.schema.arity() {
            return Err(Error::ArityMismatch {
                expected: self.schema.arity(),
                actual: tuple.len(),
            });
        }
        for (col, val) in self.schema.columns().iter().zip(tuple.values()) {
            if val.domain() != col.domain() {
                return Err(Error::DomainViolation {
                    attribute: *col.name(),
                    expected: col.domain(),
                    found: val.domain(),
                    value: val.clone(),
                });
            }
        }
        Ok(())
    }

    /// Project onto the named attributes, in the given order.
    ///
    /// Duplicate projected tuples are eliminated by full-value equality.
    /// The result keeps the original key when the projection contains it;
    /// otherwise the projected attribute list becomes the key, with the
    /// value-equality dedup standing in as the uniqueness guarantee.
    pub fn project(&self, attributes: &[&str]) -> Result<Table, Error> {
        debug!("RA> {}.project {:?}", self.name(), attributes);
        let positions = self.schema.positions(attributes)?;
        let columns = positions
            .iter()
            .map(|&p| self.schema.columns()[p].clone())
            .collect();
        let key = if self
            .schema
            .key()
            .iter()
            .all(|k| attributes.iter().any(|a| *a == k.as_str()))
        {
            self.schema.key().to_vec()
        } else {
            attributes.iter().map(|a| (*a).into()).collect()
        };
        let schema = Schema::new(derived_name(self.name(), "proj"), columns, key)?;

        let mut seen = hashbrown::HashSet::new();
        let mut rows = Vec::new();
        for tuple in &self.rows {
            let sub = Tuple::new(positions.iter().map(|&p| tuple.data[p].clone()).collect());
            if seen.insert(sub.clone()) {
                rows.push(sub);
            }
        }
        Ok(Table::from_rows(schema, self.strategy, rows))
    }

    /// Keep every tuple satisfying `predicate`, in storage order.
    pub fn select<P>(&self, predicate: P) -> Table
    where
        P: Fn(&Tuple) -> bool,
    {
        debug!("RA> {}.select <predicate>", self.name());
        let rows = self.rows.iter().filter(|t| predicate(t)).cloned().collect();
        Table::from_rows(
            self.schema.renamed(derived_name(self.name(), "sel")),
            self.strategy,
            rows,
        )
    }

    /// Point lookup through the index: the result carries the single tuple
    /// whose primary key equals `key`, or no tuple at all.
    ///
    /// On a derived table whose rows repeat a key (a union or join output),
    /// the rebuilt index keeps only the last row per key, so this returns
    /// at most one row where [`Table::scan_key`] returns them all. Tables
    /// populated through `insert` never repeat a key and the two agree.
    pub fn select_key(&self, key: &Key) -> Result<Table, Error> {
        debug!("RA> {}.select {}", self.name(), key);
        let ix = self
            .index
            .as_ref()
            .ok_or_else(|| Error::IndexUnavailable(*self.name()))?;
        let rows = ix.get(key).cloned().into_iter().collect();
        Ok(Table::from_rows(
            self.schema.renamed(derived_name(self.name(), "sel")),
            self.strategy,
            rows,
        ))
    }

    /// The same lookup as [`Table::select_key`], as a full linear scan that
    /// recomputes each tuple's key. The non-accelerated baseline, and the
    /// correctness oracle for the indexed path.
    pub fn scan_key(&self, key: &Key) -> Table {
        debug!("RA> {}.scan {}", self.name(), key);
        let positions = self.schema.key_positions();
        let rows = self
            .rows
            .iter()
            .filter(|t| Key::from_positions(t, &positions) == *key)
            .cloned()
            .collect();
        Table::from_rows(
            self.schema.renamed(derived_name(self.name(), "sel")),
            self.strategy,
            rows,
        )
    }

    /// Set union: all of this table's tuples plus every tuple of `other`
    /// not already present by full-value equality.
    pub fn union(&self, other: &Table) -> Result<Table, Error> {
        debug!("RA> {}.union {}", self.name(), other.name());
        self.check_compatible(other)?;
        let mut rows = self.rows.clone();
        let mut seen: hashbrown::HashSet<Tuple> = self.rows.iter().cloned().collect();
        for tuple in &other.rows {
            if seen.insert(tuple.clone()) {
                rows.push(tuple.clone());
            }
        }
        let name = derived_name(self.name(), &format!("union_{}", other.name()));
        Ok(Table::from_rows(
            self.schema.renamed(name),
            self.strategy,
            rows,
        ))
    }

    /// Relational difference: this table's tuples whose full value sequence
    /// does not occur among `other`'s tuples.
    pub fn minus(&self, other: &Table) -> Result<Table, Error> {
        debug!("RA> {}.minus {}", self.name(), other.name());
        self.check_compatible(other)?;
        let exclude: hashbrown::HashSet<&Tuple> = other.rows.iter().collect();
        let rows = self
            .rows
            .iter()
            .filter(|t| !exclude.contains(t))
            .cloned()
            .collect();
        let name = derived_name(self.name(), &format!("minus_{}", other.name()));
        Ok(Table::from_rows(
            self.schema.renamed(name),
            self.strategy,
            rows,
        ))
    }

    /// Two tables are compatible iff they have equal arity and identical
    /// domain sequences. Attribute names play no part.
    pub fn compatible(&self, other: &Table) -> bool {
        self.check_compatible(other).is_ok()
    }

    pub(crate) fn check_compatible(&self, other: &Table) -> Result<(), Error> {
        if self.schema.arity() != other.schema.arity() {
            return Err(Error::IncompatibleTables(format!(
                "'{}' has arity {} but '{}' has arity {}",
                self.name(),
                self.schema.arity(),
                other.name(),
                other.schema.arity()
            )));
        }
        for (j, (a, b)) in self
            .schema
            .domains()
            .zip(other.schema.domains())
            .enumerate()
        {
            if a != b {
                return Err(Error::IncompatibleTables(format!(
                    "'{}' and '{}' disagree on domain {} ({} vs {})",
                    self.name(),
                    other.name(),
                    j,
                    a,
                    b
                )));
            }
        }
        Ok(())
    }

    /// Diagnostic dump of the index contents, one `key -> tuple` line per
    /// entry. Not part of the data model's contract.
    pub fn index_dump(&self) -> String {
        let mut out = format!("Index for {}\n", self.name());
        match &self.index {
            None => out.push_str("(no index)\n"),
            Some(ix) => {
                for (key, tuple) in ix.entries() {
                    out.push_str(&format!("{} -> {:?}\n", key, tuple.values()));
                }
            }
        }
        out
    }
}

/// Fixed-width tabular rendering of the attribute names and all tuples.
#[cfg(feature = "terminal-output")]
impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use tabled::builder::Builder;

        let mut builder = Builder::default();
        builder.set_columns(self.schema.columns().iter().map(|c| c.name().to_string()));
        for tuple in &self.rows {
            builder.add_record(tuple.values().iter().map(|v| v.to_string()));
        }
        write!(
            f,
            "Table {}\n{}",
            self.name(),
            builder.build().with(tabled::Style::ascii())
        )
    }
}
