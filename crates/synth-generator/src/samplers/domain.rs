//! Long-tailed internet domains.
//!
//! Seed-file domains come first; after that each new table gets a synthetic
//! name built from syllables and a weighted top-level domain. Synthetic
//! name `i` is drawn from the stream at `field / "name" / i`, so it does not
//! depend on how many draws happened before it was first needed.

use super::Sampler;
use crate::generator::GeneratorError;
use crate::long_tail::{ChineseRestaurant, LongTail};
use crate::seed_tree::SeedNode;
use crate::vocabulary::WeightedVocabulary;
use rand::seq::IndexedRandom;
use rand::Rng;
use std::path::Path;
use synth_core::{FieldMap, SampledValue};

const SYLLABLES: &[&str] = &[
    "ac", "al", "an", "ar", "bel", "bo", "cor", "da", "del", "en", "fa", "gen", "har", "in",
    "jo", "ka", "lin", "lo", "ma", "mer", "na", "nor", "ol", "pe", "quin", "ra", "ro", "sa",
    "sen", "ta", "tor", "ul", "va", "ver", "wes", "xi", "yo", "za",
];

const TLDS: &[(&str, u32)] = &[
    ("com", 60),
    ("net", 10),
    ("org", 9),
    ("io", 5),
    ("de", 4),
    ("co.uk", 3),
    ("info", 3),
    ("us", 3),
    ("biz", 2),
    ("fr", 1),
];

/// Synthetic domain for table `i`.
fn synthetic_domain(node: &SeedNode, i: usize) -> String {
    let mut rng = node.child(i).random_generator();
    let syllables = rng.random_range(2..=4);
    let mut name = String::new();
    for _ in 0..syllables {
        if let Some(s) = SYLLABLES.choose(&mut rng) {
            name.push_str(s);
        }
    }
    let tld = TLDS
        .choose_weighted(&mut rng, |(_, weight)| *weight)
        .map(|(tld, _)| *tld)
        .unwrap_or("com");
    format!("{name}.{tld}")
}

/// `www.example.com` -> `com.example.www`
pub fn reverse_domain(domain: &str) -> String {
    domain.rsplit('.').collect::<Vec<_>>().join(".")
}

#[derive(Debug)]
pub struct DomainSampler {
    domains: LongTail<String>,
}

impl DomainSampler {
    pub fn new(
        alpha: f64,
        discount: f64,
        vocabulary: Option<&Path>,
        node: &SeedNode,
    ) -> Result<Self, GeneratorError> {
        let seeds = WeightedVocabulary::load_optional(vocabulary)?;
        let process = ChineseRestaurant::new(alpha, discount, node.random_generator())?
            .with_prior(seeds.prior_counts());
        let known = seeds.names();
        let names = node.child("name");
        let domains = LongTail::new(process, move |i| {
            known
                .get(i)
                .cloned()
                .unwrap_or_else(|| synthetic_domain(&names, i))
        });
        Ok(Self { domains })
    }

    pub fn set_alpha(&mut self, alpha: f64) -> Result<(), GeneratorError> {
        self.domains.set_alpha(alpha)
    }

    pub fn set_discount(&mut self, discount: f64) -> Result<(), GeneratorError> {
        self.domains.set_discount(discount)
    }

    /// Number of distinct domains produced so far.
    pub fn distinct(&self) -> usize {
        self.domains.vocabulary().len()
    }
}

impl Sampler for DomainSampler {
    fn sample(&mut self, _index: u64) -> Result<SampledValue, GeneratorError> {
        let domain = self.domains.sample();
        let mut fields = FieldMap::new();
        fields.insert("rev_domain".to_string(), reverse_domain(&domain).into());
        fields.insert("domain".to_string(), domain.into());
        Ok(SampledValue::Object(fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed_tree::HierarchicalSeedTree;
    use std::collections::HashSet;
    use std::io::Write;

    #[test]
    fn test_reverse_domain() {
        assert_eq!(reverse_domain("www.example.com"), "com.example.www");
        assert_eq!(reverse_domain("localhost"), "localhost");
    }

    #[test]
    fn test_domain_shape() {
        let node = HierarchicalSeedTree::new(1).child("t").child("site");
        let mut sampler = DomainSampler::new(1000.0, 0.3, None, &node).unwrap();
        for i in 0..500 {
            let value = sampler.sample(i).unwrap();
            let domain = value.get("domain").and_then(|v| v.as_str()).unwrap();
            let rev = value.get("rev_domain").and_then(|v| v.as_str()).unwrap();
            assert!(domain.contains('.'));
            assert_eq!(reverse_domain(rev), domain);
        }
    }

    #[test]
    fn test_synthetic_names_are_addressed_by_index() {
        let node = HierarchicalSeedTree::new(1).child("t").child("site").child("name");
        assert_eq!(synthetic_domain(&node, 17), synthetic_domain(&node, 17));

        let distinct: HashSet<_> = (0..200).map(|i| synthetic_domain(&node, i)).collect();
        assert!(distinct.len() > 150, "{}", distinct.len());
    }

    #[test]
    fn test_repeats_are_realistic() {
        let node = HierarchicalSeedTree::new(2).child("t").child("site");
        let mut sampler = DomainSampler::new(1000.0, 0.3, None, &node).unwrap();
        for i in 0..20_000 {
            sampler.sample(i).unwrap();
        }
        // far fewer distinct domains than draws, far more than a handful
        let distinct = sampler.distinct();
        assert!(distinct > 1_000 && distinct < 20_000, "{distinct}");
    }

    #[test]
    fn test_seed_domains_first() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# popular").unwrap();
        writeln!(file, "example.com\t100000").unwrap();

        let node = HierarchicalSeedTree::new(3).child("t").child("site");
        let mut sampler = DomainSampler::new(10.0, 0.3, Some(file.path()), &node).unwrap();
        let hits = (0..100)
            .filter(|i| {
                sampler.sample(*i).unwrap().get("domain").and_then(|v| v.as_str())
                    == Some("example.com")
            })
            .count();
        assert!(hits > 90, "{hits}");
    }
}
