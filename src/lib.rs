//! A minimal in-memory relational table engine.
//!
//! Tables are built from schema strings, populated with validated
//! `insert`s, and composed with the core relational-algebra operators:
//! project, select, union, minus and three equality-join strategies
//! (index join, nested-loop equi-join, natural join). Key-based lookups
//! and foreign-key → primary-key joins are accelerated by a pluggable
//! primary-key index with ordered-map, hash-map and linear-hashing
//! backings.
//!
//! ```
//! use minirel::{IndexStrategy, Table, Tuple};
//!
//! let mut professor = Table::create(
//!     "Professor",
//!     "id name deptId",
//!     "Integer String String",
//!     "id",
//!     IndexStrategy::LinHash,
//! )?;
//! professor.insert(Tuple::new(vec![1.into(), "Smith".into(), "CS".into()]))?;
//! professor.insert(Tuple::new(vec![2.into(), "Jones".into(), "EE".into()]))?;
//!
//! let roster = professor.project(&["id", "name"])?;
//! assert_eq!(roster.row_count(), 2);
//! # Ok::<(), minirel::Error>(())
//! ```
//!
//! Every operator returns a fresh table and leaves its inputs untouched;
//! `insert` is the single in-place mutation. The engine is synchronous and
//! single-threaded: callers sharing a table across threads must serialize
//! mutation externally.

mod column;
mod error;
mod generate;
mod index;
mod join;
mod key;
mod schema;
mod storage;
mod table;
mod value;

pub use column::Column;
pub use error::Error;
pub use generate::TupleGenerator;
pub use index::{BTreeIndex, HashIndex, IndexStrategy, KeyIndex, LinHashIndex};
pub use key::Key;
pub use schema::Schema;
pub use storage::{load, save};
pub use table::{Table, Tuple};
pub use value::{Domain, Value};

use arraystring::{typenum::U63, ArrayString};

/// A fixed capacity copy-able string, used for table and attribute names.
pub type BoundedString = ArrayString<U63>;
