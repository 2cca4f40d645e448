//! Stochastic record generation for the synth tool.
//!
//! This crate provides the [`RecordGenerator`], which turns a YAML
//! [`Schema`](synth_core::Schema) into a reproducible stream of records. Its
//! realism comes from three pieces:
//!
//! - [`seed_tree`] - path-addressed random streams, so every field (and
//!   every nested item) has its own stable randomness
//! - [`long_tail`] - a Pitman-Yor process with lazily materialized items,
//!   for vocabularies with realistic repetition
//! - [`diurnal`] - a day/night activity simulation producing bursty
//!   per-entity timelines
//!
//! # Architecture
//!
//! ```text
//! Schema (YAML)
//!        │
//!        ▼
//! ┌──────────────────────┐
//! │   RecordGenerator    │
//! │                      │
//! │  root / table / field│──► HierarchicalSeedTree
//! │  FieldSampler per    │
//! │  field               │──► LongTail (word, domain, pitman_yor)
//! │                      │──► DiurnalActivityStateMachine (bursts, dns)
//! └──────────┬───────────┘
//!            │
//!            ▼
//!    Record { table, index, fields }
//! ```
//!
//! # Example
//!
//! ```rust
//! use synth_core::Schema;
//! use synth_generator::RecordGenerator;
//!
//! let schema = Schema::from_yaml(r#"
//! seed: 42
//! tables:
//!   - name: visits
//!     fields:
//!       - name: user
//!         generator:
//!           type: word
//!       - name: site
//!         flat: true
//!         generator:
//!           type: domain
//!       - name: at
//!         flat: true
//!         generator:
//!           type: bursts
//!           end: "2024-01-08"
//! "#).unwrap();
//!
//! let mut generator = RecordGenerator::new(schema).unwrap();
//! let record = generator.next_record("visits").unwrap();
//! assert!(record.get_field("timestamp_ms").is_some());
//! ```
//!
//! # Samplers
//!
//! - `pitman_yor` - long-tailed integer index
//! - `word` - long-tailed words, optionally seeded from a weighted file
//! - `domain` - long-tailed domains with their reversed form
//! - `bursts` - diurnal action timestamps around an inner sampler
//! - `dns` - one client per record: an IP address and its day/night
//!   stream of long-tailed domain lookups
//! - `object` / `repeat` - nesting
//! - `sequential`, `int_range`, `float_range`, `weighted_bool`, `one_of`,
//!   `pattern`, `uuid`, `static` - simple values

pub mod diurnal;
pub mod generator;
pub mod long_tail;
pub mod samplers;
pub mod seed_tree;
pub mod vocabulary;

// Re-exports for convenience
pub use diurnal::{
    DiurnalActivityStateMachine, DiurnalConfig, DiurnalEvent, DiurnalParameters, DiurnalState,
};
pub use generator::{GeneratorError, RecordGenerator, RecordIterator, DEFAULT_SEED};
pub use long_tail::{ChineseRestaurant, LongTail, MaterializedVocabulary};
pub use samplers::{FieldSampler, Sampler};
pub use seed_tree::{HierarchicalSeedTree, SeedLabel, SeedNode};
pub use vocabulary::WeightedVocabulary;
