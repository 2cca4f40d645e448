//! Fixed values and uniform choice from a fixed list.

use super::Sampler;
use crate::generator::GeneratorError;
use crate::seed_tree::SeedNode;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use synth_core::SampledValue;

#[derive(Debug)]
pub struct StaticSampler {
    value: SampledValue,
}

impl StaticSampler {
    pub fn new(value: &serde_yaml::Value) -> Self {
        Self {
            value: SampledValue::from_yaml(value),
        }
    }
}

impl Sampler for StaticSampler {
    fn sample(&mut self, _index: u64) -> Result<SampledValue, GeneratorError> {
        Ok(self.value.clone())
    }
}

#[derive(Debug)]
pub struct OneOfSampler {
    values: Vec<SampledValue>,
    rng: StdRng,
}

impl OneOfSampler {
    pub fn new(values: &[serde_yaml::Value], node: &SeedNode) -> Self {
        Self {
            values: values.iter().map(SampledValue::from_yaml).collect(),
            rng: node.random_generator(),
        }
    }
}

impl Sampler for OneOfSampler {
    fn sample(&mut self, _index: u64) -> Result<SampledValue, GeneratorError> {
        Ok(self
            .values
            .choose(&mut self.rng)
            .cloned()
            .unwrap_or(SampledValue::Null))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed_tree::HierarchicalSeedTree;

    #[test]
    fn test_static_object() {
        let yaml: serde_yaml::Value = serde_yaml::from_str("{ version: 1, name: test }").unwrap();
        let mut sampler = StaticSampler::new(&yaml);
        let value = sampler.sample(0).unwrap();
        assert_eq!(value.get("version"), Some(&SampledValue::Int64(1)));
        assert_eq!(value.get("name"), Some(&SampledValue::from("test")));
        assert_eq!(sampler.sample(1).unwrap(), value);
    }

    #[test]
    fn test_one_of_picks_from_pool() {
        let values: Vec<serde_yaml::Value> = serde_yaml::from_str("[a, 2, true]").unwrap();
        let pool: Vec<SampledValue> = values.iter().map(SampledValue::from_yaml).collect();
        let mut sampler = OneOfSampler::new(&values, &HierarchicalSeedTree::new(1).child("o"));
        for i in 0..30 {
            assert!(pool.contains(&sampler.sample(i).unwrap()));
        }
    }

    #[test]
    fn test_one_of_empty_is_null() {
        let mut sampler = OneOfSampler::new(&[], &HierarchicalSeedTree::new(1).child("o"));
        assert!(sampler.sample(0).unwrap().is_null());
    }
}
