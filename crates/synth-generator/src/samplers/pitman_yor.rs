//! Raw long-tailed integer indices.

use super::Sampler;
use crate::generator::GeneratorError;
use crate::long_tail::ChineseRestaurant;
use crate::seed_tree::SeedNode;
use synth_core::SampledValue;

/// Emits the table index of each Pitman-Yor draw.
#[derive(Debug)]
pub struct PitmanYorSampler {
    process: ChineseRestaurant,
}

impl PitmanYorSampler {
    pub fn new(alpha: f64, discount: f64, node: &SeedNode) -> Result<Self, GeneratorError> {
        Ok(Self {
            process: ChineseRestaurant::new(alpha, discount, node.random_generator())?,
        })
    }

    /// The underlying process.
    pub fn process(&self) -> &ChineseRestaurant {
        &self.process
    }
}

impl Sampler for PitmanYorSampler {
    fn sample(&mut self, _index: u64) -> Result<SampledValue, GeneratorError> {
        Ok(SampledValue::Int64(self.process.sample() as i64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed_tree::HierarchicalSeedTree;

    #[test]
    fn test_indices_are_dense() {
        let mut sampler =
            PitmanYorSampler::new(10.0, 0.2, &HierarchicalSeedTree::new(4).child("i")).unwrap();
        let mut max_seen = -1;
        for i in 0..1000 {
            let value = sampler.sample(i).unwrap().as_i64().unwrap();
            // a new table is always the next index
            assert!(value <= max_seen + 1);
            max_seen = max_seen.max(value);
        }
        assert_eq!(max_seen + 1, sampler.process().table_count() as i64);
    }

    #[test]
    fn test_invalid_parameters() {
        let node = HierarchicalSeedTree::new(0).child("i");
        assert!(PitmanYorSampler::new(0.0, 0.0, &node).is_err());
        assert!(PitmanYorSampler::new(1.0, 1.0, &node).is_err());
    }
}
