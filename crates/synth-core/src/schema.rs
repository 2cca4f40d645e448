//! Schema definitions for the synth record generator.
//!
//! A schema is a YAML document listing tables, each with an ordered list of
//! fields. Every field names the sampler that fills it through a
//! `type`-tagged [`SamplerConfig`]. The set of sampler kinds is closed: an
//! unknown `type` is rejected while the YAML is parsed, and
//! [`Schema::validate`] checks every remaining rule before a single record
//! is produced.
//!
//! ```yaml
//! version: 1
//! seed: 42
//! tables:
//!   - name: sessions
//!     fields:
//!       - name: user
//!         generator:
//!           type: word
//!       - name: activity
//!         flat: true
//!         generator:
//!           type: bursts
//!           start: "2024-01-01"
//!           end: "2024-01-06"
//!           rate: "2/min"
//! ```

use crate::time_format::{TimeFormat, DEFAULT_TIME_FORMAT};
use crate::units::{parse_duration_ms, parse_rate_as_interval_ms};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

// ============================================================================
// Error Types
// ============================================================================

/// Error type for schema operations.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Error reading schema file
    #[error("Failed to read schema file: {0}")]
    IoError(#[from] std::io::Error),

    /// Error parsing YAML
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Table not found in schema
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// A sampler definition breaks a configuration rule
    #[error("Invalid configuration at '{path}': {reason}")]
    InvalidConfig { path: String, reason: String },
}

impl SchemaError {
    fn invalid(path: &str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

// ============================================================================
// Sampler Registry
// ============================================================================

fn default_one() -> f64 {
    1.0
}

fn default_word_discount() -> f64 {
    0.8
}

fn default_domain_alpha() -> f64 {
    1000.0
}

fn default_domain_discount() -> f64 {
    0.3
}

fn default_true() -> bool {
    true
}

/// Sampler configuration for a field.
///
/// The `type` tag selects the sampler kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SamplerConfig {
    /// Long-tailed integer index (Pitman-Yor process)
    PitmanYor {
        /// Strength, must be > 0
        #[serde(default = "default_one")]
        alpha: f64,
        /// Discount, must be in [0, 1)
        #[serde(default)]
        discount: f64,
    },

    /// Long-tailed vocabulary of words
    Word {
        /// Strength, must be > 0
        #[serde(default = "default_one")]
        alpha: f64,
        /// Discount, must be in [0, 1)
        #[serde(default = "default_word_discount")]
        discount: f64,
        /// Optional weighted seed file (`<word>\t<weight>` per line)
        #[serde(default)]
        vocabulary: Option<PathBuf>,
    },

    /// Long-tailed vocabulary of internet domains
    Domain {
        /// Strength, must be > 0
        #[serde(default = "default_domain_alpha")]
        alpha: f64,
        /// Discount, must be in [0, 1)
        #[serde(default = "default_domain_discount")]
        discount: f64,
        /// Optional weighted seed file of well-known domains
        #[serde(default)]
        vocabulary: Option<PathBuf>,
    },

    /// Timestamped actions with day/night clustering
    Bursts(Box<BurstsConfig>),

    /// One client per record: an IP address and its day of DNS queries
    Dns(Box<DnsConfig>),

    /// Nested record
    Object {
        /// Fields of the nested record
        fields: Vec<FieldSchema>,
    },

    /// List of samples from an inner sampler
    Repeat {
        /// Inner sampler
        value: Box<SamplerConfig>,
        /// Minimum list length (inclusive)
        #[serde(default)]
        min_length: usize,
        /// Maximum list length (inclusive)
        max_length: usize,
    },

    /// Sequential integers starting from `start`
    Sequential {
        /// Starting value
        #[serde(default)]
        start: i64,
    },

    /// Random integers in a range
    IntRange {
        /// Minimum value (inclusive)
        min: i64,
        /// Maximum value (inclusive)
        max: i64,
    },

    /// Random floats in a range
    FloatRange {
        /// Minimum value (inclusive)
        min: f64,
        /// Maximum value (exclusive)
        max: f64,
    },

    /// Boolean with a configurable probability of `true`
    WeightedBool {
        /// Weight for true value (0.0 to 1.0)
        true_weight: f64,
    },

    /// Uniform selection from a list of values
    OneOf {
        /// Pool of values to select from
        values: Vec<serde_yaml::Value>,
    },

    /// Pattern string with `{index}` and `{rand:N}` placeholders
    Pattern {
        /// Pattern string
        pattern: String,
    },

    /// Random UUID drawn from the field's own stream
    Uuid,

    /// A fixed value
    Static {
        /// The static value to use
        value: serde_yaml::Value,
    },
}

impl SamplerConfig {
    /// Registry name of this sampler kind, as written in the `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PitmanYor { .. } => "pitman_yor",
            Self::Word { .. } => "word",
            Self::Domain { .. } => "domain",
            Self::Bursts(_) => "bursts",
            Self::Dns(_) => "dns",
            Self::Object { .. } => "object",
            Self::Repeat { .. } => "repeat",
            Self::Sequential { .. } => "sequential",
            Self::IntRange { .. } => "int_range",
            Self::FloatRange { .. } => "float_range",
            Self::WeightedBool { .. } => "weighted_bool",
            Self::OneOf { .. } => "one_of",
            Self::Pattern { .. } => "pattern",
            Self::Uuid => "uuid",
            Self::Static { .. } => "static",
        }
    }

    /// Check this sampler and everything nested in it.
    pub fn validate(&self, path: &str) -> Result<(), SchemaError> {
        match self {
            Self::PitmanYor { alpha, discount }
            | Self::Word {
                alpha, discount, ..
            }
            | Self::Domain {
                alpha, discount, ..
            } => validate_long_tail(path, *alpha, *discount),
            Self::Bursts(config) => config.validate(path),
            Self::Dns(config) => config.validate(path),
            Self::Object { fields } => validate_fields(path, fields),
            Self::Repeat {
                value,
                min_length,
                max_length,
            } => {
                if min_length > max_length {
                    return Err(SchemaError::invalid(
                        path,
                        format!("min_length {min_length} exceeds max_length {max_length}"),
                    ));
                }
                value.validate(&format!("{path}[]"))
            }
            Self::IntRange { min, max } => {
                if min > max {
                    return Err(SchemaError::invalid(path, format!("min {min} exceeds max {max}")));
                }
                Ok(())
            }
            Self::FloatRange { min, max } => {
                if !(min.is_finite() && max.is_finite() && min < max) {
                    return Err(SchemaError::invalid(
                        path,
                        format!("float range [{min}, {max}) is empty or not finite"),
                    ));
                }
                Ok(())
            }
            Self::WeightedBool { true_weight } => {
                if !(0.0..=1.0).contains(true_weight) {
                    return Err(SchemaError::invalid(
                        path,
                        format!("true_weight {true_weight} must be in [0, 1]"),
                    ));
                }
                Ok(())
            }
            Self::OneOf { values } => {
                if values.is_empty() {
                    return Err(SchemaError::invalid(path, "one_of needs at least one value"));
                }
                Ok(())
            }
            Self::Sequential { .. } | Self::Pattern { .. } | Self::Uuid | Self::Static { .. } => {
                Ok(())
            }
        }
    }
}

/// Check Pitman-Yor parameters: `alpha > 0` and `discount` in `[0, 1)`.
pub fn validate_long_tail(path: &str, alpha: f64, discount: f64) -> Result<(), SchemaError> {
    if !(alpha.is_finite() && alpha > 0.0) {
        return Err(SchemaError::invalid(
            path,
            format!("alpha must be positive, got {alpha}"),
        ));
    }
    if !(0.0..1.0).contains(&discount) {
        return Err(SchemaError::invalid(
            path,
            format!("discount must be in [0, 1), got {discount}"),
        ));
    }
    Ok(())
}

fn validate_fields(path: &str, fields: &[FieldSchema]) -> Result<(), SchemaError> {
    let mut seen = HashSet::new();
    for field in fields {
        let field_path = format!("{path}.{}", field.name);
        if !seen.insert(field.name.as_str()) {
            return Err(SchemaError::invalid(&field_path, "duplicate field name"));
        }
        field.generator.validate(&field_path)?;
    }
    Ok(())
}

// ============================================================================
// Bursts
// ============================================================================

fn default_start() -> String {
    "2024-01-01 00:00:00".to_string()
}

fn default_format() -> String {
    DEFAULT_TIME_FORMAT.to_string()
}

fn default_rate() -> String {
    "1/min".to_string()
}

fn default_events() -> usize {
    1
}

fn default_min_offset() -> String {
    "1ms".to_string()
}

fn default_active_mean() -> String {
    "10m".to_string()
}

fn default_inactive_mean() -> String {
    "4h".to_string()
}

fn default_gamma_shape() -> f64 {
    6.0
}

fn default_sunrise_mean() -> String {
    "19h".to_string()
}

fn default_sunrise_sd() -> String {
    "5h".to_string()
}

fn default_night_length() -> String {
    "19h".to_string()
}

fn default_max_steps() -> u64 {
    10_000_000
}

/// Configuration for the `bursts` sampler.
///
/// Durations accept the forms understood by
/// [`parse_duration_ms`](crate::units::parse_duration_ms); `rate` is a
/// `<count>/<unit>` string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BurstsConfig {
    /// Simulation start
    #[serde(default = "default_start")]
    pub start: String,

    /// Simulation end; unbounded when absent
    #[serde(default)]
    pub end: Option<String>,

    /// Output pattern for the `time` field (`Q` and `s` select epoch integers)
    #[serde(default = "default_format")]
    pub format: String,

    /// Mean action rate while active in daytime
    #[serde(default = "default_rate")]
    pub rate: String,

    /// Actions per record; more than one yields a list
    #[serde(default = "default_events")]
    pub events: usize,

    /// Offset past a sun boundary and floor on every sampled delay
    #[serde(default = "default_min_offset")]
    pub min_offset: String,

    /// Mean of the per-entity mean active-period length
    #[serde(default = "default_active_mean")]
    pub active_mean: String,

    /// Mean of the per-entity mean inactive-period length
    #[serde(default = "default_inactive_mean")]
    pub inactive_mean: String,

    /// Gamma shape for the log night-time dilation
    #[serde(default = "default_gamma_shape")]
    pub dilation_shape: f64,

    /// Gamma scale for the log night-time dilation
    #[serde(default = "default_one")]
    pub dilation_scale: f64,

    /// Gamma shape for the log idle multiplier
    #[serde(default = "default_gamma_shape")]
    pub idle_shape: f64,

    /// Gamma scale for the log idle multiplier
    #[serde(default = "default_one")]
    pub idle_scale: f64,

    /// Population mode of sunrise, as a UTC time of day
    #[serde(default = "default_sunrise_mean")]
    pub sunrise_mean: String,

    /// Spread of sunrise across entities
    #[serde(default = "default_sunrise_sd")]
    pub sunrise_sd: String,

    /// Length of the night; daytime lasts the rest of the day
    #[serde(default = "default_night_length")]
    pub night_length: String,

    /// Step cap per record
    #[serde(default = "default_max_steps")]
    pub max_steps: u64,

    /// Merge time fields into an object inner value
    #[serde(default = "default_true")]
    pub flatten: bool,

    /// Inner sampler invoked once per action
    #[serde(default)]
    pub value: Option<Box<SamplerConfig>>,
}

impl Default for BurstsConfig {
    fn default() -> Self {
        Self {
            start: default_start(),
            end: None,
            format: default_format(),
            rate: default_rate(),
            events: default_events(),
            min_offset: default_min_offset(),
            active_mean: default_active_mean(),
            inactive_mean: default_inactive_mean(),
            dilation_shape: default_gamma_shape(),
            dilation_scale: default_one(),
            idle_shape: default_gamma_shape(),
            idle_scale: default_one(),
            sunrise_mean: default_sunrise_mean(),
            sunrise_sd: default_sunrise_sd(),
            night_length: default_night_length(),
            max_steps: default_max_steps(),
            flatten: true,
            value: None,
        }
    }
}

/// Bursts configuration with every string resolved to numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedBursts {
    /// Output time format
    pub format: TimeFormat,
    /// Start, epoch milliseconds
    pub start_ms: f64,
    /// End, epoch milliseconds
    pub end_ms: Option<f64>,
    /// Mean interval between actions, ms
    pub mean_interval_ms: f64,
    /// Minimum delay, ms
    pub min_offset_ms: f64,
    /// Hyper mean of active-period means, ms
    pub active_mean_ms: f64,
    /// Hyper mean of inactive-period means, ms
    pub inactive_mean_ms: f64,
    /// Sunrise mode, ms after midnight UTC
    pub sunrise_mean_ms: f64,
    /// Sunrise spread, ms
    pub sunrise_sd_ms: f64,
    /// Night length, ms
    pub night_length_ms: f64,
}

impl BurstsConfig {
    /// Resolve every duration, rate and timestamp string.
    pub fn resolve(&self, path: &str) -> Result<ResolvedBursts, SchemaError> {
        let format = TimeFormat::new(&self.format)
            .map_err(|e| SchemaError::invalid(path, e.to_string()))?;
        let parse_time = |s: &str| {
            format
                .parse(s)
                .map(|ms| ms as f64)
                .map_err(|e| SchemaError::invalid(path, e.to_string()))
        };
        let duration = |name: &str, s: &str| {
            parse_duration_ms(s).map_err(|e| SchemaError::invalid(path, format!("{name}: {e}")))
        };

        let start_ms = parse_time(&self.start)?;
        let end_ms = self.end.as_deref().map(parse_time).transpose()?;

        Ok(ResolvedBursts {
            start_ms,
            end_ms,
            mean_interval_ms: parse_rate_as_interval_ms(&self.rate)
                .map_err(|e| SchemaError::invalid(path, format!("rate: {e}")))?,
            min_offset_ms: duration("min_offset", &self.min_offset)?,
            active_mean_ms: duration("active_mean", &self.active_mean)?,
            inactive_mean_ms: duration("inactive_mean", &self.inactive_mean)?,
            sunrise_mean_ms: duration("sunrise_mean", &self.sunrise_mean)?,
            sunrise_sd_ms: duration("sunrise_sd", &self.sunrise_sd)?,
            night_length_ms: duration("night_length", &self.night_length)?,
            format,
        })
    }

    /// Check the time window, hyper-parameters and inner sampler.
    pub fn validate(&self, path: &str) -> Result<(), SchemaError> {
        let resolved = self.resolve(path)?;

        if let Some(end) = resolved.end_ms {
            if end <= resolved.start_ms {
                return Err(SchemaError::invalid(
                    path,
                    format!("end '{}' is not after start '{}'", end, resolved.start_ms),
                ));
            }
        }
        if self.events == 0 {
            return Err(SchemaError::invalid(path, "events must be at least 1"));
        }
        if self.max_steps == 0 {
            return Err(SchemaError::invalid(path, "max_steps must be at least 1"));
        }
        for (name, value) in [
            ("active_mean", resolved.active_mean_ms),
            ("inactive_mean", resolved.inactive_mean_ms),
        ] {
            if value <= 0.0 {
                return Err(SchemaError::invalid(path, format!("{name} must be positive")));
            }
        }
        let day_ms = crate::units::DAY_MS;
        if resolved.night_length_ms <= 0.0 || resolved.night_length_ms >= day_ms {
            return Err(SchemaError::invalid(
                path,
                "night_length must be strictly between 0 and 24h",
            ));
        }
        // the nudge past a sun boundary must land inside the next period
        let shortest_period = resolved.night_length_ms.min(day_ms - resolved.night_length_ms);
        if !(resolved.min_offset_ms > 0.0 && resolved.min_offset_ms < shortest_period) {
            return Err(SchemaError::invalid(
                path,
                format!(
                    "min_offset must be positive and shorter than both day and night ({} ms)",
                    shortest_period
                ),
            ));
        }
        let start_ms = resolved.start_ms as i64;
        if resolved.format.parse(&resolved.format.format(start_ms)).is_err() {
            return Err(SchemaError::invalid(
                path,
                format!("time format '{}' cannot be parsed back", resolved.format),
            ));
        }
        for (name, shape, scale) in [
            ("dilation", self.dilation_shape, self.dilation_scale),
            ("idle", self.idle_shape, self.idle_scale),
        ] {
            if !(shape.is_finite() && shape > 0.0 && scale.is_finite() && scale > 0.0) {
                return Err(SchemaError::invalid(
                    path,
                    format!("{name}_shape and {name}_scale must be positive"),
                ));
            }
        }

        if let Some(value) = &self.value {
            value.validate(&format!("{path}.value"))?;
        }
        Ok(())
    }
}

// ============================================================================
// DNS
// ============================================================================

/// Fields a `dns` record or query can carry.
pub const DNS_FIELDS: &[&str] = &[
    "ip",
    "ipx",
    "ip_v4",
    "domain",
    "rev_domain",
    "time",
    "timestamp_ms",
    "timestamp_s",
];

/// Window used by `dns` when no `end` is given.
pub const DEFAULT_DNS_WINDOW_MS: f64 = 3.0 * crate::units::DAY_MS;

fn default_v4_prob() -> f64 {
    0.3
}

/// Configuration for the `dns` sampler.
///
/// Every record is one client: a random IP address plus the whole query
/// timeline of a fresh diurnal entity over `[start, end]`, each query naming
/// a long-tailed domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DnsConfig {
    /// Simulation start
    #[serde(default = "default_start")]
    pub start: String,

    /// Simulation end; three days after `start` when absent
    #[serde(default)]
    pub end: Option<String>,

    /// Output pattern for the `time` field
    #[serde(default = "default_format")]
    pub format: String,

    /// Mean query rate while active in daytime
    #[serde(default = "default_rate")]
    pub rate: String,

    /// Probability that a client has an IPv4 address
    #[serde(default = "default_v4_prob")]
    pub v4_prob: f64,

    /// Domain strength, must be > 0
    #[serde(default = "default_domain_alpha")]
    pub alpha: f64,

    /// Domain discount, must be in [0, 1)
    #[serde(default = "default_domain_discount")]
    pub discount: f64,

    /// Optional weighted seed file of well-known domains
    #[serde(default)]
    pub vocabulary: Option<PathBuf>,

    /// Keep only these fields (any of [`DNS_FIELDS`])
    #[serde(default)]
    pub fields: Option<Vec<String>>,

    /// Emit one object per query with the client fields copied in,
    /// instead of `{ip, ..., queries: [...]}`
    #[serde(default)]
    pub flatten: bool,

    /// Step cap per record
    #[serde(default = "default_max_steps")]
    pub max_steps: u64,
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            start: default_start(),
            end: None,
            format: default_format(),
            rate: default_rate(),
            v4_prob: default_v4_prob(),
            alpha: default_domain_alpha(),
            discount: default_domain_discount(),
            vocabulary: None,
            fields: None,
            flatten: false,
            max_steps: default_max_steps(),
        }
    }
}

impl DnsConfig {
    /// The diurnal timeline behind the queries, with default behaviour knobs.
    pub fn timeline(&self) -> BurstsConfig {
        BurstsConfig {
            start: self.start.clone(),
            end: self.end.clone(),
            format: self.format.clone(),
            rate: self.rate.clone(),
            max_steps: self.max_steps,
            ..BurstsConfig::default()
        }
    }

    /// Resolve the timeline, closing the window when `end` is absent.
    pub fn resolve(&self, path: &str) -> Result<ResolvedBursts, SchemaError> {
        let mut resolved = self.timeline().resolve(path)?;
        if resolved.end_ms.is_none() {
            resolved.end_ms = Some(resolved.start_ms + DEFAULT_DNS_WINDOW_MS);
        }
        Ok(resolved)
    }

    /// Check the timeline, the domain process, `v4_prob` and `fields`.
    pub fn validate(&self, path: &str) -> Result<(), SchemaError> {
        self.timeline().validate(path)?;
        validate_long_tail(path, self.alpha, self.discount)?;
        if !(0.0..=1.0).contains(&self.v4_prob) {
            return Err(SchemaError::invalid(
                path,
                format!("v4_prob {} must be in [0, 1]", self.v4_prob),
            ));
        }
        for field in self.fields.iter().flatten() {
            if !DNS_FIELDS.contains(&field.as_str()) {
                return Err(SchemaError::invalid(
                    path,
                    format!("unknown dns field '{field}' (known: {})", DNS_FIELDS.join(", ")),
                ));
            }
        }
        Ok(())
    }

    /// Whether `field` survives the `fields` filter.
    pub fn keeps(&self, field: &str) -> bool {
        self.fields
            .as_ref()
            .is_none_or(|fields| fields.iter().any(|f| f == field))
    }
}

// ============================================================================
// Tables and Schema
// ============================================================================

/// Field with its sampler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSchema {
    /// Field name
    pub name: String,

    /// Merge an object-valued sample into the enclosing record
    #[serde(default)]
    pub flat: bool,

    /// Sampler configuration for this field
    pub generator: SamplerConfig,
}

/// Table definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    /// Table name
    pub name: String,

    /// Field definitions, in output order
    pub fields: Vec<FieldSchema>,
}

impl TableSchema {
    /// Get a field schema by name.
    pub fn get_field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Get all field names.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }
}

fn default_version() -> u32 {
    1
}

/// Full schema.
///
/// Loaded from YAML; the source of truth for record generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schema {
    /// Schema version
    #[serde(default = "default_version")]
    pub version: u32,

    /// Root seed for the hierarchical random streams
    #[serde(default)]
    pub seed: Option<u64>,

    /// Table definitions
    pub tables: Vec<TableSchema>,

    /// Cached table lookup (not serialized)
    #[serde(skip)]
    table_map: HashMap<String, usize>,
}

impl Schema {
    /// Load and validate a schema from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SchemaError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse and validate a schema from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, SchemaError> {
        let mut schema: Schema = serde_yaml::from_str(yaml)?;
        schema.build_table_map();
        schema.validate()?;
        Ok(schema)
    }

    /// Build a schema directly from tables.
    pub fn new(seed: Option<u64>, tables: Vec<TableSchema>) -> Result<Self, SchemaError> {
        let mut schema = Self {
            version: default_version(),
            seed,
            tables,
            table_map: HashMap::new(),
        };
        schema.build_table_map();
        schema.validate()?;
        Ok(schema)
    }

    fn build_table_map(&mut self) {
        self.table_map = self
            .tables
            .iter()
            .enumerate()
            .map(|(idx, table)| (table.name.clone(), idx))
            .collect();
    }

    /// Check every table and sampler.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let mut seen = HashSet::new();
        for table in &self.tables {
            if !seen.insert(table.name.as_str()) {
                return Err(SchemaError::invalid(&table.name, "duplicate table name"));
            }
            validate_fields(&table.name, &table.fields)?;
        }
        Ok(())
    }

    /// Get a table schema by name.
    pub fn get_table(&self, name: &str) -> Option<&TableSchema> {
        self.table_map
            .get(name)
            .and_then(|&idx| self.tables.get(idx))
    }

    /// Get all table names in the schema.
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }
}
