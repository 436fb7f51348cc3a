//! Whole-table snapshots on disk.
//!
//! A snapshot is a plain serialization of a table's full state (schema +
//! tuple sequence + index strategy); the index itself is not persisted and
//! is rebuilt on load. Purely a wrapper around the in-memory state, not an
//! algorithmic concern.

use std::fs;
use std::path::{Path, PathBuf};

use hashbrown::HashSet;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    error::Error,
    index::IndexStrategy,
    key::Key,
    schema::Schema,
    table::{Table, Tuple},
    value::{Domain, Value},
    BoundedString,
};

const EXT: &str = "json";

/// The on-disk shape of a table. Kept independent of the in-memory types
/// so the snapshot format does not move when they do.
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    name: String,
    attributes: Vec<String>,
    domains: Vec<Domain>,
    key: Vec<String>,
    strategy: IndexStrategy,
    rows: Vec<Vec<Value>>,
}

fn snapshot_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.{}", name, EXT))
}

/// Save `table` under `dir/<table name>.json`, creating `dir` if needed.
/// Returns the path written.
pub fn save(table: &Table, dir: &Path) -> Result<PathBuf, Error> {
    let snapshot = Snapshot {
        name: table.name().to_string(),
        attributes: table
            .schema()
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect(),
        domains: table.schema().domains().collect(),
        key: table.schema().key().iter().map(|k| k.to_string()).collect(),
        strategy: table.strategy(),
        rows: table.rows().iter().map(|t| t.data.clone()).collect(),
    };
    fs::create_dir_all(dir)
        .map_err(|e| Error::Persistence(format!("cannot create '{}': {}", dir.display(), e)))?;
    let path = snapshot_path(dir, &snapshot.name);
    let json = serde_json::to_string(&snapshot)
        .map_err(|e| Error::Persistence(format!("cannot serialize '{}': {}", snapshot.name, e)))?;
    fs::write(&path, json)
        .map_err(|e| Error::Persistence(format!("cannot write '{}': {}", path.display(), e)))?;
    debug!("saved table {} to {}", table.name(), path.display());
    Ok(path)
}

/// Load the table named `name` from its snapshot under `dir`.
///
/// A missing, unreadable or corrupted snapshot is an
/// [`Error::Persistence`]; a partially populated table is never returned.
/// Rows are validated the way `insert` validates them: arity, per-position
/// domain, and primary-key uniqueness all have to hold.
pub fn load(dir: &Path, name: &str) -> Result<Table, Error> {
    let path = snapshot_path(dir, name);
    let json = fs::read_to_string(&path)
        .map_err(|e| Error::Persistence(format!("cannot read '{}': {}", path.display(), e)))?;
    let snapshot: Snapshot = serde_json::from_str(&json)
        .map_err(|e| Error::Persistence(format!("corrupted snapshot '{}': {}", path.display(), e)))?;

    let columns = snapshot
        .attributes
        .iter()
        .zip(&snapshot.domains)
        .map(|(attr, &dom)| crate::column::Column::new(attr.as_str().into(), dom))
        .collect();
    let key: Vec<BoundedString> = snapshot.key.iter().map(|k| k.as_str().into()).collect();
    let schema = Schema::new(snapshot.name.as_str().into(), columns, key)
        .map_err(|e| Error::Persistence(format!("corrupted snapshot '{}': {}", path.display(), e)))?;

    let arity = schema.arity();
    let key_pos = schema.key_positions();
    let mut seen_keys: HashSet<Key> = HashSet::with_capacity(snapshot.rows.len());
    let mut rows = Vec::with_capacity(snapshot.rows.len());
    for (i, data) in snapshot.rows.into_iter().enumerate() {
        if data.len() != arity {
            return Err(Error::Persistence(format!(
                "corrupted snapshot '{}': row {} has {} values, schema expects {}",
                path.display(),
                i,
                data.len(),
                arity
            )));
        }
        for (col, val) in schema.columns().iter().zip(&data) {
            if val.domain() != col.domain() {
                return Err(Error::Persistence(format!(
                    "corrupted snapshot '{}': row {} holds {} in {} column '{}'",
                    path.display(),
                    i,
                    val.domain(),
                    col.domain(),
                    col.name()
                )));
            }
        }
        let tuple = Tuple::new(data);
        if !seen_keys.insert(Key::from_positions(&tuple, &key_pos)) {
            return Err(Error::Persistence(format!(
                "corrupted snapshot '{}': row {} repeats an earlier primary key",
                path.display(),
                i
            )));
        }
        rows.push(tuple);
    }
    debug!("loaded table {} from {}", name, path.display());
    Ok(Table::from_rows(schema, snapshot.strategy, rows))
}

#[cfg(test)]
mod tests {
    use assert_fs::TempDir;
    use pretty_assertions::assert_eq;

    use super::{load, save};
    use crate::{
        error::Error,
        index::IndexStrategy,
        key::Key,
        table::{Table, Tuple},
    };

    fn sample() -> Table {
        let mut table = Table::create(
            "Professor",
            "id name deptId",
            "Integer String String",
            "id",
            IndexStrategy::BTree,
        )
        .unwrap();
        table
            .insert(Tuple::new(vec![1.into(), "Smith".into(), "CS".into()]))
            .unwrap();
        table
            .insert(Tuple::new(vec![2.into(), "Jones".into(), "EE".into()]))
            .unwrap();
        table
    }

    #[test]
    fn snapshot_round_trip() {
        let dir = TempDir::new().unwrap();
        let table = sample();

        save(&table, dir.path()).unwrap();
        let loaded = load(dir.path(), "Professor").unwrap();

        assert_eq!(loaded.name(), table.name());
        assert_eq!(loaded.schema(), table.schema());
        assert_eq!(loaded.rows(), table.rows());
        assert_eq!(loaded.strategy(), IndexStrategy::BTree);

        // the index came back too
        let hit = loaded.select_key(&Key::new(vec![2.into()])).unwrap();
        assert_eq!(hit.rows()[0].values()[1], crate::value::Value::from("Jones"));
    }

    #[test]
    fn missing_snapshot_is_reported() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            load(dir.path(), "Nothing"),
            Err(Error::Persistence(_))
        ));
    }

    #[test]
    fn corrupted_snapshot_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            load(dir.path(), "Broken"),
            Err(Error::Persistence(_))
        ));
    }

    #[test]
    fn wrong_domain_in_snapshot_row_is_reported() {
        let dir = TempDir::new().unwrap();
        // a Text value smuggled into the Integer id column
        let json = r#"{
            "name": "Professor",
            "attributes": ["id", "name"],
            "domains": ["Integer", "Text"],
            "key": ["id"],
            "strategy": "LinHash",
            "rows": [[{"Text": "not-a-number"}, {"Text": "Smith"}]]
        }"#;
        std::fs::write(dir.path().join("Professor.json"), json).unwrap();
        assert!(matches!(
            load(dir.path(), "Professor"),
            Err(Error::Persistence(_))
        ));
    }

    #[test]
    fn repeated_key_in_snapshot_is_reported() {
        let dir = TempDir::new().unwrap();
        let json = r#"{
            "name": "Professor",
            "attributes": ["id", "name"],
            "domains": ["Integer", "Text"],
            "key": ["id"],
            "strategy": "LinHash",
            "rows": [
                [{"Int": 1}, {"Text": "Smith"}],
                [{"Int": 1}, {"Text": "Jones"}]
            ]
        }"#;
        std::fs::write(dir.path().join("Professor.json"), json).unwrap();
        assert!(matches!(
            load(dir.path(), "Professor"),
            Err(Error::Persistence(_))
        ));
    }
}
