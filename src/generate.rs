//! Synthetic, foreign-key-consistent tuple generation.
//!
//! Test harnesses register a set of related schemas plus their declared
//! foreign-key references, then ask for a number of tuples per schema.
//! Every generated foreign key resolves to a key value that actually
//! exists among the referenced schema's generated tuples, so the output
//! can be fed straight into tables via `insert` and index-joined without
//! dangling references. The table core imposes nothing else on this
//! module.

use hashbrown::HashSet;
use log::debug;
use rand::{distributions::Alphanumeric, Rng};

use crate::{
    error::Error,
    key::Key,
    schema::Schema,
    table::Tuple,
    value::{Domain, Value},
};

/// Give up on a row after this many unique-key attempts; at that point the
/// registered key space is exhausted for the requested count.
const MAX_KEY_ATTEMPTS: usize = 1000;

/// A resolved foreign-key reference: positions in the owning schema that
/// must equal the referenced positions of an earlier registered schema.
#[derive(Debug)]
struct FkPlan {
    local_pos: Vec<usize>,
    referenced: usize,
    referenced_pos: Vec<usize>,
}

#[derive(Debug)]
struct RelSpec {
    schema: Schema,
    fks: Vec<FkPlan>,
}

/// Generates tuples for a set of related schemas.
///
/// Schemas must be registered before anything that references them; a
/// forward reference is rejected at registration time.
#[derive(Debug, Default)]
pub struct TupleGenerator {
    specs: Vec<RelSpec>,
}

impl TupleGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema together with its foreign-key triples
    /// `(local attrs, referenced schema, referenced attrs)`, every list
    /// space-separated like the schema construction surface.
    ///
    /// ```
    /// # use minirel::TupleGenerator;
    /// let mut gen = TupleGenerator::new();
    /// gen.add_rel_schema("Professor", "id name deptId", "Integer String String", "id", &[])
    ///     .unwrap();
    /// gen.add_rel_schema(
    ///     "Teaching",
    ///     "crsCode semester profId",
    ///     "String String Integer",
    ///     "crsCode semester",
    ///     &[("profId", "Professor", "id")],
    /// )
    /// .unwrap();
    /// ```
    pub fn add_rel_schema(
        &mut self,
        name: &str,
        attributes: &str,
        domains: &str,
        key: &str,
        fks: &[(&str, &str, &str)],
    ) -> Result<(), Error> {
        let schema = Schema::parse(name, attributes, domains, key)?;
        let mut plans = Vec::with_capacity(fks.len());
        for (local, referenced, referenced_attrs) in fks {
            let local: Vec<&str> = local.split_whitespace().collect();
            let referenced_attrs: Vec<&str> = referenced_attrs.split_whitespace().collect();
            if local.len() != referenced_attrs.len() {
                return Err(Error::Schema(format!(
                    "foreign key of '{}' pairs {} local attributes with {} referenced",
                    name,
                    local.len(),
                    referenced_attrs.len()
                )));
            }
            let target = self
                .specs
                .iter()
                .position(|s| s.schema.name() == *referenced)
                .ok_or_else(|| {
                    Error::Schema(format!(
                        "foreign key of '{}' references unregistered schema '{}'",
                        name, referenced
                    ))
                })?;
            plans.push(FkPlan {
                local_pos: schema.positions(&local)?,
                referenced_pos: self.specs[target].schema.positions(&referenced_attrs)?,
                referenced: target,
            });
        }
        self.specs.push(RelSpec { schema, fks: plans });
        Ok(())
    }

    /// Generate `counts[i]` tuples for the i-th registered schema.
    /// Randomness comes from the caller-supplied `rng`, so runs are
    /// reproducible with a seeded generator.
    pub fn generate<R: Rng>(
        &self,
        counts: &[usize],
        rng: &mut R,
    ) -> Result<Vec<Vec<Tuple>>, Error> {
        if counts.len() != self.specs.len() {
            return Err(Error::Schema(format!(
                "generate: {} counts supplied for {} registered schemas",
                counts.len(),
                self.specs.len()
            )));
        }
        let mut generated: Vec<Vec<Tuple>> = Vec::with_capacity(self.specs.len());
        for (spec, &count) in self.specs.iter().zip(counts) {
            debug!("generating {} tuples for {}", count, spec.schema.name());
            let key_pos = spec.schema.key_positions();
            let mut used_keys: HashSet<Key> = HashSet::with_capacity(count);
            let mut rows = Vec::with_capacity(count);
            for _ in 0..count {
                let mut attempts = 0;
                let tuple = loop {
                    let mut data: Vec<Value> = spec
                        .schema
                        .columns()
                        .iter()
                        .map(|c| random_value(rng, c.domain()))
                        .collect();
                    for fk in &spec.fks {
                        // one donor row per reference keeps composite keys
                        // internally consistent
                        let source = &generated[fk.referenced];
                        if source.is_empty() {
                            return Err(Error::Schema(format!(
                                "foreign key of '{}' cannot resolve: no tuples generated for its target",
                                spec.schema.name()
                            )));
                        }
                        let donor = &source[rng.gen_range(0..source.len())];
                        for (&lp, &rp) in fk.local_pos.iter().zip(&fk.referenced_pos) {
                            data[lp] = donor.data[rp].clone();
                        }
                    }
                    let tuple = Tuple::new(data);
                    if used_keys.insert(Key::from_positions(&tuple, &key_pos)) {
                        break tuple;
                    }
                    attempts += 1;
                    if attempts >= MAX_KEY_ATTEMPTS {
                        return Err(Error::Schema(format!(
                            "could not generate {} distinct keys for '{}'",
                            count,
                            spec.schema.name()
                        )));
                    }
                };
                rows.push(tuple);
            }
            generated.push(rows);
        }
        Ok(generated)
    }
}

fn random_value<R: Rng>(rng: &mut R, domain: Domain) -> Value {
    match domain {
        Domain::Integer => Value::Int(rng.gen_range(0..1_000_000)),
        Domain::Real => Value::from(rng.gen_range(0.0..1_000_000.0f64)),
        Domain::Text => {
            let s: String = (0..10).map(|_| char::from(rng.sample(Alphanumeric))).collect();
            Value::Text(s)
        }
        Domain::Char => Value::Char(char::from(rng.gen_range(b'a'..=b'z'))),
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::TupleGenerator;
    use crate::{error::Error, index::IndexStrategy, key::Key, table::Table};

    fn registration() -> TupleGenerator {
        let mut gen = TupleGenerator::new();
        gen.add_rel_schema(
            "Professor",
            "id name deptId",
            "Integer String String",
            "id",
            &[],
        )
        .unwrap();
        gen.add_rel_schema(
            "Course",
            "crsCode deptId crsName descr",
            "String String String String",
            "crsCode",
            &[],
        )
        .unwrap();
        gen.add_rel_schema(
            "Teaching",
            "crsCode semester profId",
            "String String Integer",
            "crsCode semester",
            &[
                ("profId", "Professor", "id"),
                ("crsCode", "Course", "crsCode"),
            ],
        )
        .unwrap();
        gen
    }

    #[test]
    fn rejects_forward_and_malformed_references() {
        let mut gen = TupleGenerator::new();
        assert!(matches!(
            gen.add_rel_schema(
                "Teaching",
                "crsCode semester profId",
                "String String Integer",
                "crsCode semester",
                &[("profId", "Professor", "id")],
            ),
            Err(Error::Schema(_))
        ));

        gen.add_rel_schema("Professor", "id name", "Integer String", "id", &[])
            .unwrap();
        // uneven attribute pairing
        assert!(matches!(
            gen.add_rel_schema(
                "Teaching",
                "crsCode profId",
                "String Integer",
                "crsCode",
                &[("profId crsCode", "Professor", "id")],
            ),
            Err(Error::Schema(_))
        ));
    }

    #[test]
    fn generated_keys_are_unique_and_typed() {
        let gen = registration();
        let mut rng = StdRng::seed_from_u64(7);
        let out = gen.generate(&[50, 30, 200], &mut rng).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].len(), 50);
        assert_eq!(out[2].len(), 200);

        // everything inserts cleanly: right arity, right domains, unique keys
        let mut professor = Table::create(
            "Professor",
            "id name deptId",
            "Integer String String",
            "id",
            IndexStrategy::LinHash,
        )
        .unwrap();
        for tuple in &out[0] {
            professor.insert(tuple.clone()).unwrap();
        }
        assert_eq!(professor.row_count(), 50);
    }

    #[test]
    fn foreign_keys_resolve() {
        let gen = registration();
        let mut rng = StdRng::seed_from_u64(42);
        let out = gen.generate(&[20, 10, 100], &mut rng).unwrap();

        let professor_ids: Vec<_> = out[0].iter().map(|t| t.data[0].clone()).collect();
        let course_codes: Vec<_> = out[1].iter().map(|t| t.data[0].clone()).collect();
        for teaching in &out[2] {
            assert!(course_codes.contains(&teaching.data[0]));
            assert!(professor_ids.contains(&teaching.data[2]));
        }
    }

    #[test]
    fn composite_foreign_keys_stay_consistent() {
        let mut gen = TupleGenerator::new();
        gen.add_rel_schema(
            "Teaching",
            "crsCode semester profId",
            "String String Integer",
            "crsCode semester",
            &[],
        )
        .unwrap();
        gen.add_rel_schema(
            "Transcript",
            "studId crsCode semester grade",
            "Integer String String String",
            "studId crsCode semester",
            &[("crsCode semester", "Teaching", "crsCode semester")],
        )
        .unwrap();

        let mut rng = StdRng::seed_from_u64(3);
        let out = gen.generate(&[15, 60], &mut rng).unwrap();
        let offered: Vec<Key> = out[0]
            .iter()
            .map(|t| Key::new(vec![t.data[0].clone(), t.data[1].clone()]))
            .collect();
        for transcript in &out[1] {
            let fk = Key::new(vec![transcript.data[1].clone(), transcript.data[2].clone()]);
            assert!(offered.contains(&fk), "dangling (crsCode, semester) pair");
        }
    }

    #[test]
    fn count_mismatch_is_rejected() {
        let gen = registration();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            gen.generate(&[10, 10], &mut rng),
            Err(Error::Schema(_))
        ));
    }
}
