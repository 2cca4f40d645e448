//! Record generator: builds every field sampler of a schema and drives them.

use crate::samplers::object::{sample_fields, BoundField};
use crate::seed_tree::HierarchicalSeedTree;
use std::collections::HashMap;
use synth_core::{Record, Schema};
use tracing::debug;

/// Error type for generator operations.
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    /// Table not found in schema
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Schema error
    #[error("Schema error: {0}")]
    Schema(#[from] synth_core::SchemaError),

    /// A sampler parameter is out of range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A vocabulary seed file could not be read or parsed
    #[error("Vocabulary {source_name}: {reason}")]
    Vocabulary { source_name: String, reason: String },

    /// The diurnal simulation did not produce a record within its step cap
    #[error("Step limit of {limit} exceeded while generating a record")]
    StepLimitExceeded { limit: u64 },
}

/// Seed used when neither the schema nor the caller provides one.
pub const DEFAULT_SEED: u64 = 0;

/// Built samplers of one table and the index of its next record.
#[derive(Debug)]
struct TableState {
    fields: Vec<BoundField>,
    next_index: u64,
}

/// Generates records for the tables of a schema.
///
/// Every field sampler is built when the generator is created, on the seed
/// stream `root / table / field`, so a bad vocabulary file or parameter
/// fails before any record is produced and output is reproducible for a
/// given seed. Record indices count per table.
#[derive(Debug)]
pub struct RecordGenerator {
    /// Schema defining the tables and field samplers
    schema: Schema,
    /// Root seed of the stream tree
    seed: u64,
    /// Per-table samplers and counters
    tables: HashMap<String, TableState>,
}

impl RecordGenerator {
    /// Create a generator seeded from the schema (or [`DEFAULT_SEED`]).
    pub fn new(schema: Schema) -> Result<Self, GeneratorError> {
        let seed = schema.seed.unwrap_or(DEFAULT_SEED);
        Self::with_seed(schema, seed)
    }

    /// Create a generator with an explicit root seed, overriding the schema.
    pub fn with_seed(schema: Schema, seed: u64) -> Result<Self, GeneratorError> {
        schema.validate()?;

        let tree = HierarchicalSeedTree::new(seed);
        let mut tables = HashMap::new();
        for table in &schema.tables {
            let node = tree.child(table.name.as_str());
            let fields = table
                .fields
                .iter()
                .map(|field| BoundField::build(field, &node, &table.name))
                .collect::<Result<Vec<_>, _>>()?;
            tables.insert(
                table.name.clone(),
                TableState {
                    fields,
                    next_index: 0,
                },
            );
        }
        debug!(seed, tables = tables.len(), "Built record generator");

        Ok(Self {
            schema,
            seed,
            tables,
        })
    }

    /// Set the index of the next record of every table.
    ///
    /// Only index-driven samplers (`sequential`, `pattern`) follow the new
    /// index; random streams continue where they are.
    pub fn with_start_index(mut self, index: u64) -> Self {
        for state in self.tables.values_mut() {
            state.next_index = index;
        }
        self
    }

    /// Root seed in use.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Index of the next record of `table`; 0 for unknown tables.
    pub fn current_index(&self, table: &str) -> u64 {
        self.tables.get(table).map_or(0, |state| state.next_index)
    }

    /// Get a reference to the schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Generate the next record for the given table.
    pub fn next_record(&mut self, table: &str) -> Result<Record, GeneratorError> {
        let state = self
            .tables
            .get_mut(table)
            .ok_or_else(|| GeneratorError::TableNotFound(table.to_string()))?;

        let index = state.next_index;
        let values = sample_fields(&mut state.fields, index)?;
        state.next_index += 1;

        Ok(Record::new(table, index, values))
    }

    /// Lazily generate `count` records for the given table.
    pub fn records(
        &mut self,
        table: &str,
        count: u64,
    ) -> Result<RecordIterator<'_>, GeneratorError> {
        if !self.tables.contains_key(table) {
            return Err(GeneratorError::TableNotFound(table.to_string()));
        }

        Ok(RecordIterator {
            generator: self,
            table: table.to_string(),
            remaining: count,
        })
    }
}

/// Iterator returned by [`RecordGenerator::records`].
pub struct RecordIterator<'a> {
    generator: &'a mut RecordGenerator,
    table: String,
    remaining: u64,
}

impl Iterator for RecordIterator<'_> {
    type Item = Result<Record, GeneratorError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let result = self.generator.next_record(&self.table);
        if result.is_err() {
            // a failed record ends the stream
            self.remaining = 0;
        }
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining as usize;
        (0, Some(remaining))
    }
}
