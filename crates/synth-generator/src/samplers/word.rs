//! Long-tailed words.
//!
//! Table `i` of the process becomes the `i`-th seed-file word, and
//! `word-<i>` once the seed file runs out. Seed weights are seated as
//! prior table occupancy, so frequent words are frequent from the start.

use super::Sampler;
use crate::generator::GeneratorError;
use crate::long_tail::{ChineseRestaurant, LongTail};
use crate::seed_tree::SeedNode;
use crate::vocabulary::WeightedVocabulary;
use std::path::Path;
use synth_core::SampledValue;

#[derive(Debug)]
pub struct WordSampler {
    words: LongTail<String>,
}

impl WordSampler {
    pub fn new(
        alpha: f64,
        discount: f64,
        vocabulary: Option<&Path>,
        node: &SeedNode,
    ) -> Result<Self, GeneratorError> {
        let seeds = WeightedVocabulary::load_optional(vocabulary)?;
        Self::with_vocabulary(alpha, discount, seeds, node)
    }

    /// Build from an already loaded vocabulary.
    pub fn with_vocabulary(
        alpha: f64,
        discount: f64,
        seeds: WeightedVocabulary,
        node: &SeedNode,
    ) -> Result<Self, GeneratorError> {
        let process = ChineseRestaurant::new(alpha, discount, node.random_generator())?
            .with_prior(seeds.prior_counts());
        let names = seeds.names();
        let words = LongTail::new(process, move |i| {
            names.get(i).cloned().unwrap_or_else(|| format!("word-{i}"))
        });
        Ok(Self { words })
    }

    pub fn set_alpha(&mut self, alpha: f64) -> Result<(), GeneratorError> {
        self.words.set_alpha(alpha)
    }

    pub fn set_discount(&mut self, discount: f64) -> Result<(), GeneratorError> {
        self.words.set_discount(discount)
    }

    /// Words materialized so far, in table order.
    pub fn materialized(&self) -> &[String] {
        self.words.vocabulary().items()
    }
}

impl Sampler for WordSampler {
    fn sample(&mut self, _index: u64) -> Result<SampledValue, GeneratorError> {
        Ok(SampledValue::String(self.words.sample()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed_tree::HierarchicalSeedTree;
    use std::collections::HashMap;

    fn node() -> SeedNode {
        HierarchicalSeedTree::new(12).child("t").child("word")
    }

    #[test]
    fn test_placeholders_without_vocabulary() {
        let mut sampler = WordSampler::new(5.0, 0.5, None, &node()).unwrap();
        for i in 0..200 {
            let word = sampler.sample(i).unwrap();
            assert!(word.as_str().unwrap().starts_with("word-"));
        }
        let materialized = sampler.materialized();
        for (i, word) in materialized.iter().enumerate() {
            assert_eq!(word, &format!("word-{i}"));
        }
    }

    #[test]
    fn test_seed_words_dominate() {
        let seeds = WeightedVocabulary::parse("the\t5000\nof\t2000\nzebra\t1\n", "inline").unwrap();
        let mut sampler = WordSampler::with_vocabulary(1.0, 0.8, seeds, &node()).unwrap();

        let mut counts: HashMap<String, u32> = HashMap::new();
        for i in 0..10_000 {
            let word = sampler.sample(i).unwrap();
            *counts.entry(word.as_str().unwrap().to_string()).or_default() += 1;
        }
        let the = counts.get("the").copied().unwrap_or(0);
        let of = counts.get("of").copied().unwrap_or(0);
        assert!(the > of, "the {the}, of {of}");
        assert!(the > 3_000, "the {the}");
    }

    #[test]
    fn test_missing_vocabulary_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("words.tsv");
        let mut sampler = WordSampler::new(1.0, 0.8, Some(&missing), &node()).unwrap();
        assert!(sampler.sample(0).unwrap().as_str().unwrap().starts_with("word-"));
    }
}
