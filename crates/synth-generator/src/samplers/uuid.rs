//! UUIDs drawn from the field's own stream.

use super::Sampler;
use crate::generator::GeneratorError;
use crate::seed_tree::SeedNode;
use rand::rngs::StdRng;
use rand::Rng;
use synth_core::SampledValue;
use uuid::{Builder, Uuid};

/// Random UUID v4 from `rng`.
pub fn random_uuid<R: Rng>(rng: &mut R) -> Uuid {
    let mut bytes = [0u8; 16];
    rng.fill(&mut bytes);
    Builder::from_random_bytes(bytes).into_uuid()
}

#[derive(Debug)]
pub struct UuidSampler {
    rng: StdRng,
}

impl UuidSampler {
    pub fn new(node: &SeedNode) -> Self {
        Self {
            rng: node.random_generator(),
        }
    }
}

impl Sampler for UuidSampler {
    fn sample(&mut self, _index: u64) -> Result<SampledValue, GeneratorError> {
        Ok(SampledValue::String(random_uuid(&mut self.rng).to_string()))
    }
}
