//! Lists of samples from an inner sampler.

use super::{FieldSampler, Sampler};
use crate::generator::GeneratorError;
use crate::seed_tree::SeedNode;
use rand::rngs::StdRng;
use rand::Rng;
use synth_core::{SampledValue, SamplerConfig};

#[derive(Debug)]
pub struct RepeatSampler {
    inner: FieldSampler,
    min_length: usize,
    max_length: usize,
    rng: StdRng,
}

impl RepeatSampler {
    pub fn new(
        value: &SamplerConfig,
        min_length: usize,
        max_length: usize,
        node: &SeedNode,
        path: &str,
    ) -> Result<Self, GeneratorError> {
        if min_length > max_length {
            return Err(GeneratorError::InvalidParameter(format!(
                "{path}: min_length {min_length} exceeds max_length {max_length}"
            )));
        }
        Ok(Self {
            inner: FieldSampler::build(value, node.child("value"), &format!("{path}[]"))?,
            min_length,
            max_length,
            rng: node.child("length").random_generator(),
        })
    }
}

impl Sampler for RepeatSampler {
    fn sample(&mut self, index: u64) -> Result<SampledValue, GeneratorError> {
        let length = self.rng.random_range(self.min_length..=self.max_length);
        let items = (0..length)
            .map(|_| self.inner.sample(index))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SampledValue::Array(items))
    }
}
