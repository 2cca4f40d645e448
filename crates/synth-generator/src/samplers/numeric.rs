//! Numeric samplers.

use super::Sampler;
use crate::generator::GeneratorError;
use crate::seed_tree::SeedNode;
use rand::rngs::StdRng;
use rand::Rng;
use synth_core::SampledValue;

/// `start + index`.
#[derive(Debug)]
pub struct SequentialSampler {
    start: i64,
}

impl SequentialSampler {
    pub fn new(start: i64) -> Self {
        Self { start }
    }
}

impl Sampler for SequentialSampler {
    fn sample(&mut self, index: u64) -> Result<SampledValue, GeneratorError> {
        Ok(SampledValue::Int64(self.start.wrapping_add(index as i64)))
    }
}

/// Uniform integer in `[min, max]`.
#[derive(Debug)]
pub struct IntRangeSampler {
    min: i64,
    max: i64,
    rng: StdRng,
}

impl IntRangeSampler {
    pub fn new(min: i64, max: i64, node: &SeedNode) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
            rng: node.random_generator(),
        }
    }
}

impl Sampler for IntRangeSampler {
    fn sample(&mut self, _index: u64) -> Result<SampledValue, GeneratorError> {
        Ok(SampledValue::Int64(self.rng.random_range(self.min..=self.max)))
    }
}

/// Uniform float in `[min, max)`.
#[derive(Debug)]
pub struct FloatRangeSampler {
    min: f64,
    max: f64,
    rng: StdRng,
}

impl FloatRangeSampler {
    pub fn new(min: f64, max: f64, node: &SeedNode) -> Self {
        Self {
            min,
            max,
            rng: node.random_generator(),
        }
    }
}

impl Sampler for FloatRangeSampler {
    fn sample(&mut self, _index: u64) -> Result<SampledValue, GeneratorError> {
        let u: f64 = self.rng.random();
        Ok(SampledValue::Float64(self.min + u * (self.max - self.min)))
    }
}

/// `true` with probability `true_weight`.
#[derive(Debug)]
pub struct WeightedBoolSampler {
    true_weight: f64,
    rng: StdRng,
}

impl WeightedBoolSampler {
    pub fn new(true_weight: f64, node: &SeedNode) -> Self {
        Self {
            true_weight: true_weight.clamp(0.0, 1.0),
            rng: node.random_generator(),
        }
    }
}

impl Sampler for WeightedBoolSampler {
    fn sample(&mut self, _index: u64) -> Result<SampledValue, GeneratorError> {
        Ok(SampledValue::Bool(self.rng.random_bool(self.true_weight)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed_tree::HierarchicalSeedTree;

    fn node() -> SeedNode {
        HierarchicalSeedTree::new(42).child("n")
    }

    #[test]
    fn test_sequential() {
        let mut sampler = SequentialSampler::new(100);
        assert_eq!(sampler.sample(0).unwrap(), SampledValue::Int64(100));
        assert_eq!(sampler.sample(7).unwrap(), SampledValue::Int64(107));
    }

    #[test]
    fn test_int_range() {
        let mut sampler = IntRangeSampler::new(10, 20, &node());
        for i in 0..100 {
            let v = sampler.sample(i).unwrap().as_i64().unwrap();
            assert!((10..=20).contains(&v));
        }
    }

    #[test]
    fn test_float_range() {
        let mut sampler = FloatRangeSampler::new(0.0, 100.0, &node());
        for i in 0..100 {
            let v = sampler.sample(i).unwrap().as_f64().unwrap();
            assert!((0.0..100.0).contains(&v));
        }
    }

    #[test]
    fn test_weighted_bool_extremes() {
        let mut always = WeightedBoolSampler::new(1.0, &node());
        let mut never = WeightedBoolSampler::new(0.0, &node());
        for i in 0..50 {
            assert_eq!(always.sample(i).unwrap(), SampledValue::Bool(true));
            assert_eq!(never.sample(i).unwrap(), SampledValue::Bool(false));
        }
    }
}
