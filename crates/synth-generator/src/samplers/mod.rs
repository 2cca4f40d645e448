//! Field samplers.
//!
//! Every [`SamplerConfig`] kind maps to one [`FieldSampler`] variant. A
//! sampler is built once, up front, with its own seed-tree node and keeps
//! its random stream for the life of the generator, so the values of one
//! field do not depend on which other fields exist.

pub mod bursts;
pub mod dns;
pub mod domain;
pub mod numeric;
pub mod object;
pub mod pattern;
pub mod pitman_yor;
pub mod repeat;
pub mod static_value;
pub mod uuid;
pub mod word;

use crate::generator::GeneratorError;
use crate::seed_tree::SeedNode;
use synth_core::{SampledValue, SamplerConfig};

pub use bursts::BurstsSampler;
pub use dns::DnsSampler;
pub use domain::DomainSampler;
pub use numeric::{FloatRangeSampler, IntRangeSampler, SequentialSampler, WeightedBoolSampler};
pub use object::ObjectSampler;
pub use pattern::PatternSampler;
pub use pitman_yor::PitmanYorSampler;
pub use repeat::RepeatSampler;
pub use static_value::{OneOfSampler, StaticSampler};
pub use self::uuid::UuidSampler;
pub use word::WordSampler;

/// Something that produces one value per record.
pub trait Sampler {
    /// Produce the value for the record at `index`.
    fn sample(&mut self, index: u64) -> Result<SampledValue, GeneratorError>;
}

/// A built sampler of any kind.
#[derive(Debug)]
pub enum FieldSampler {
    PitmanYor(PitmanYorSampler),
    Word(WordSampler),
    Domain(DomainSampler),
    Bursts(Box<BurstsSampler>),
    Dns(Box<DnsSampler>),
    Object(ObjectSampler),
    Repeat(Box<RepeatSampler>),
    Sequential(SequentialSampler),
    IntRange(IntRangeSampler),
    FloatRange(FloatRangeSampler),
    WeightedBool(WeightedBoolSampler),
    OneOf(OneOfSampler),
    Pattern(PatternSampler),
    Uuid(UuidSampler),
    Static(StaticSampler),
}

impl FieldSampler {
    /// Build the sampler for `config`, drawing from `node`.
    ///
    /// `path` names the field in error messages, e.g. `users.activity`.
    pub fn build(
        config: &SamplerConfig,
        node: SeedNode,
        path: &str,
    ) -> Result<Self, GeneratorError> {
        let sampler = match config {
            SamplerConfig::PitmanYor { alpha, discount } => {
                Self::PitmanYor(PitmanYorSampler::new(*alpha, *discount, &node)?)
            }
            SamplerConfig::Word {
                alpha,
                discount,
                vocabulary,
            } => Self::Word(WordSampler::new(
                *alpha,
                *discount,
                vocabulary.as_deref(),
                &node,
            )?),
            SamplerConfig::Domain {
                alpha,
                discount,
                vocabulary,
            } => Self::Domain(DomainSampler::new(
                *alpha,
                *discount,
                vocabulary.as_deref(),
                &node,
            )?),
            SamplerConfig::Bursts(bursts) => {
                Self::Bursts(Box::new(BurstsSampler::new(bursts, node, path)?))
            }
            SamplerConfig::Dns(dns) => Self::Dns(Box::new(DnsSampler::new(dns, node, path)?)),
            SamplerConfig::Object { fields } => Self::Object(ObjectSampler::new(fields, &node, path)?),
            SamplerConfig::Repeat {
                value,
                min_length,
                max_length,
            } => Self::Repeat(Box::new(RepeatSampler::new(
                value,
                *min_length,
                *max_length,
                &node,
                path,
            )?)),
            SamplerConfig::Sequential { start } => Self::Sequential(SequentialSampler::new(*start)),
            SamplerConfig::IntRange { min, max } => {
                Self::IntRange(IntRangeSampler::new(*min, *max, &node))
            }
            SamplerConfig::FloatRange { min, max } => {
                Self::FloatRange(FloatRangeSampler::new(*min, *max, &node))
            }
            SamplerConfig::WeightedBool { true_weight } => {
                Self::WeightedBool(WeightedBoolSampler::new(*true_weight, &node))
            }
            SamplerConfig::OneOf { values } => Self::OneOf(OneOfSampler::new(values, &node)),
            SamplerConfig::Pattern { pattern } => {
                Self::Pattern(PatternSampler::new(pattern, &node))
            }
            SamplerConfig::Uuid => Self::Uuid(UuidSampler::new(&node)),
            SamplerConfig::Static { value } => Self::Static(StaticSampler::new(value)),
        };
        Ok(sampler)
    }
}

impl Sampler for FieldSampler {
    fn sample(&mut self, index: u64) -> Result<SampledValue, GeneratorError> {
        match self {
            Self::PitmanYor(s) => s.sample(index),
            Self::Word(s) => s.sample(index),
            Self::Domain(s) => s.sample(index),
            Self::Bursts(s) => s.sample(index),
            Self::Dns(s) => s.sample(index),
            Self::Object(s) => s.sample(index),
            Self::Repeat(s) => s.sample(index),
            Self::Sequential(s) => s.sample(index),
            Self::IntRange(s) => s.sample(index),
            Self::FloatRange(s) => s.sample(index),
            Self::WeightedBool(s) => s.sample(index),
            Self::OneOf(s) => s.sample(index),
            Self::Pattern(s) => s.sample(index),
            Self::Uuid(s) => s.sample(index),
            Self::Static(s) => s.sample(index),
        }
    }
}
