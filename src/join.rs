//! The join engine: index join, nested-loop equi-join and natural join.
//!
//! All three are equality joins. They differ in how the equality condition
//! is supplied and how attribute-name collisions are handled. None of them
//! deduplicates output rows, and none of them touches its inputs: name
//! disambiguation happens on the result schema only.

use log::{debug, warn};

use crate::{
    column::Column,
    error::Error,
    key::Key,
    schema::Schema,
    table::{derived_name, Table, Tuple},
    BoundedString,
};

/// Right-hand columns for a join result, with any name colliding with a
/// left-hand attribute suffixed by the `"2"` marker.
fn disambiguate(left: &Schema, right_columns: &[Column]) -> Vec<Column> {
    right_columns
        .iter()
        .map(|col| {
            if left.col(col.name().as_str()).is_some() {
                Column::new(
                    BoundedString::from_str_truncate(format!("{}2", col.name())),
                    col.domain(),
                )
            } else {
                col.clone()
            }
        })
        .collect()
}

impl Table {
    /// Index-assisted equality join, for the foreign-key → primary-key
    /// shape: `left_attrs` name attributes of this table and `right_attrs`
    /// must name `right`'s entire primary key in key order, because each
    /// left tuple's extracted key probes `right`'s index directly. A partial
    /// or reordered key could never match a stored index entry, so it is
    /// rejected up front instead of silently joining to nothing.
    ///
    /// A probe miss is an expected per-row anomaly: the left tuple simply
    /// contributes no output (inner join semantics). Cost is
    /// O(|left| · lookup) instead of the nested loop's O(|left| · |right|).
    ///
    /// The result schema is the concatenation of both attribute lists, with
    /// colliding right-hand names suffixed by `"2"`; the result key is this
    /// table's key.
    pub fn index_join(
        &self,
        left_attrs: &[&str],
        right_attrs: &[&str],
        right: &Table,
    ) -> Result<Table, Error> {
        debug!(
            "RA> {}.index_join ({:?}, {:?}, {})",
            self.name(),
            left_attrs,
            right_attrs,
            right.name()
        );
        let left_pos = self.schema().positions(left_attrs).map_err(|_| {
            Error::JoinConfiguration(format!(
                "left attributes {:?} are not all attributes of '{}'",
                left_attrs,
                self.name()
            ))
        })?;
        let right_key: Vec<&str> = right.schema().key().iter().map(|k| k.as_str()).collect();
        if right_attrs != right_key.as_slice() {
            return Err(Error::JoinConfiguration(format!(
                "right attributes {:?} must be the full key {:?} of '{}', in key order",
                right_attrs,
                right_key,
                right.name()
            )));
        }
        if left_attrs.len() != right_attrs.len() {
            return Err(Error::JoinConfiguration(format!(
                "comparison lists differ in length ({} vs {})",
                left_attrs.len(),
                right_attrs.len()
            )));
        }
        let ix = right
            .index()
            .ok_or_else(|| Error::IndexUnavailable(*right.name()))?;

        let mut rows = Vec::new();
        for tuple in self.rows() {
            let probe = Key::from_positions(tuple, &left_pos);
            if let Some(matched) = ix.get(&probe) {
                rows.push(tuple.concat(matched));
            }
        }

        let mut columns = self.schema().columns().to_vec();
        columns.extend(disambiguate(self.schema(), right.schema().columns()));
        let schema = Schema::new(
            derived_name(self.name(), &format!("join_{}", right.name())),
            columns,
            self.schema().key().to_vec(),
        )?;
        Ok(Table::from_rows(schema, self.strategy(), rows))
    }

    /// Nested-loop equality join: every pair of tuples is compared, and a
    /// pair joins when the `left_attrs` values equal the `right_attrs`
    /// values position by position. O(|left| · |right|), no index needed.
    ///
    /// The comparison lists must have the same length; anything else is a
    /// configuration error and aborts before any row is produced.
    pub fn equi_join(
        &self,
        left_attrs: &[&str],
        right_attrs: &[&str],
        right: &Table,
    ) -> Result<Table, Error> {
        debug!(
            "RA> {}.equi_join ({:?}, {:?}, {})",
            self.name(),
            left_attrs,
            right_attrs,
            right.name()
        );
        if left_attrs.len() != right_attrs.len() {
            return Err(Error::JoinConfiguration(format!(
                "comparison lists differ in length ({} vs {})",
                left_attrs.len(),
                right_attrs.len()
            )));
        }
        let left_pos = self.schema().positions(left_attrs)?;
        let right_pos = right.schema().positions(right_attrs)?;

        let mut rows = Vec::new();
        for tuple in self.rows() {
            for other in right.rows() {
                let matched = left_pos
                    .iter()
                    .zip(&right_pos)
                    .all(|(&l, &r)| tuple.data[l] == other.data[r]);
                if matched {
                    rows.push(tuple.concat(other));
                }
            }
        }

        let mut columns = self.schema().columns().to_vec();
        columns.extend(disambiguate(self.schema(), right.schema().columns()));
        let schema = Schema::new(
            derived_name(self.name(), &format!("join_{}", right.name())),
            columns,
            self.schema().key().to_vec(),
        )?;
        Ok(Table::from_rows(schema, self.strategy(), rows))
    }

    /// Natural join: discovers the common attributes (same name, same
    /// domain), matches on equality of all of them, and projects the
    /// duplicate columns away, so the output arity is
    /// |left| + |right| − |common|.
    ///
    /// With no common attributes the join degrades to an empty result over
    /// the concatenated schema, and says so in the log.
    pub fn natural_join(&self, right: &Table) -> Result<Table, Error> {
        debug!("RA> {}.natural_join ({})", self.name(), right.name());

        let mut left_common = Vec::new();
        let mut right_common = Vec::new();
        for (l, col) in self.schema().columns().iter().enumerate() {
            if let Some(r) = right.schema().col(col.name().as_str()) {
                if right.schema().columns()[r].domain() == col.domain() {
                    left_common.push(l);
                    right_common.push(r);
                }
            }
        }
        let right_rest: Vec<usize> = (0..right.schema().arity())
            .filter(|r| !right_common.contains(r))
            .collect();

        let mut rows = Vec::new();
        if left_common.is_empty() {
            warn!(
                "natural join of {} and {}: no common attributes",
                self.name(),
                right.name()
            );
        } else {
            for tuple in self.rows() {
                let left_key = Key::from_positions(tuple, &left_common);
                for other in right.rows() {
                    if Key::from_positions(other, &right_common) == left_key {
                        let rest =
                            Tuple::new(right_rest.iter().map(|&r| other.data[r].clone()).collect());
                        rows.push(tuple.concat(&rest));
                    }
                }
            }
        }

        let rest_columns: Vec<Column> = right_rest
            .iter()
            .map(|&r| right.schema().columns()[r].clone())
            .collect();
        let mut columns = self.schema().columns().to_vec();
        columns.extend(disambiguate(self.schema(), &rest_columns));
        let schema = Schema::new(
            derived_name(self.name(), &format!("join_{}", right.name())),
            columns,
            self.schema().key().to_vec(),
        )?;
        Ok(Table::from_rows(schema, self.strategy(), rows))
    }
}
