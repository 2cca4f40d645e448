//! Core types for the synth record generator.
//!
//! This crate holds everything that is not random:
//!
//! - [`Schema`] - YAML schema with tables, fields and their samplers
//! - [`SamplerConfig`] - the closed registry of sampler kinds
//! - [`SampledValue`] / [`Record`] - generated values and rows
//! - [`TimeFormat`] - timestamp rendering and parsing
//! - [`units`] - duration and rate strings
//!
//! # Architecture
//!
//! ```text
//! synth-core (this crate)
//!    │
//!    └─── synth-generator  (seed tree, long-tail and diurnal processes, samplers)
//!             │
//!             └─── synth   (command-line driver)
//! ```
//!
//! # Example
//!
//! ```rust
//! use synth_core::Schema;
//!
//! let schema = Schema::from_yaml(r#"
//! tables:
//!   - name: users
//!     fields:
//!       - name: nickname
//!         generator:
//!           type: word
//! "#).unwrap();
//! assert_eq!(schema.table_names(), vec!["users"]);
//! ```

pub mod schema;
pub mod time_format;
pub mod units;
pub mod values;

// Re-exports for convenience
pub use schema::{
    validate_long_tail, BurstsConfig, DnsConfig, FieldSchema, ResolvedBursts, SamplerConfig, Schema,
    SchemaError, TableSchema,
};
pub use time_format::{TimeFormat, TimeFormatError, DEFAULT_TIME_FORMAT};
pub use units::UnitError;
pub use values::{insert_field, FieldMap, Record, SampledValue};
