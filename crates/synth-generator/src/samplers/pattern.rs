//! Pattern-based strings.
//!
//! Supports placeholders:
//! - `{index}` - record index
//! - `{uuid}` - UUID from the field's stream
//! - `{rand:N}` - random N-digit number

use super::uuid::random_uuid;
use super::Sampler;
use crate::generator::GeneratorError;
use crate::seed_tree::SeedNode;
use rand::rngs::StdRng;
use rand::Rng;
use synth_core::SampledValue;

#[derive(Debug)]
pub struct PatternSampler {
    pattern: String,
    rng: StdRng,
}

impl PatternSampler {
    pub fn new(pattern: &str, node: &SeedNode) -> Self {
        Self {
            pattern: pattern.to_string(),
            rng: node.random_generator(),
        }
    }
}

impl Sampler for PatternSampler {
    fn sample(&mut self, index: u64) -> Result<SampledValue, GeneratorError> {
        Ok(SampledValue::String(render_pattern(
            &self.pattern,
            &mut self.rng,
            index,
        )))
    }
}

/// Expand the placeholders of `pattern`. Malformed `{rand:...}` is left as is.
pub fn render_pattern<R: Rng>(pattern: &str, rng: &mut R, index: u64) -> String {
    let mut result = pattern.replace("{index}", &index.to_string());

    while result.contains("{uuid}") {
        result = result.replacen("{uuid}", &random_uuid(rng).to_string(), 1);
    }

    let mut searched = 0;
    while let Some(offset) = result[searched..].find("{rand:") {
        let start = searched + offset;
        let Some(len) = result[start..].find('}') else {
            break;
        };
        let end = start + len;
        match result[start + 6..end].parse::<usize>() {
            Ok(digits) => {
                let number = random_digits(rng, digits);
                result.replace_range(start..=end, &number);
                searched = start + number.len();
            }
            Err(_) => searched = end + 1,
        }
    }

    result
}

/// A random number with exactly `digits` digits.
fn random_digits<R: Rng>(rng: &mut R, digits: usize) -> String {
    if digits == 0 {
        return String::new();
    }

    let mut result = String::with_capacity(digits);
    // no leading zero
    result.push(char::from(b'0' + rng.random_range(1..10u8)));
    for _ in 1..digits {
        result.push(char::from(b'0' + rng.random_range(0..10u8)));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn test_pattern_index() {
        assert_eq!(
            render_pattern("user_{index}@example.com", &mut rng(), 123),
            "user_123@example.com"
        );
    }

    #[test]
    fn test_pattern_uuid_is_reproducible() {
        let a = render_pattern("id-{uuid}", &mut rng(), 0);
        let b = render_pattern("id-{uuid}", &mut rng(), 0);
        assert!(a.starts_with("id-"));
        assert_eq!(a.len(), 3 + 36);
        assert_eq!(a, b);
    }

    #[test]
    fn test_pattern_random_digits() {
        let s = render_pattern("code-{rand:6}", &mut rng(), 0);
        assert_eq!(s.len(), 5 + 6);
        assert!(s[5..].chars().all(|c| c.is_ascii_digit()));
        assert_ne!(&s[5..6], "0");
    }

    #[test]
    fn test_pattern_multiple_placeholders() {
        let s = render_pattern("user_{index}_code_{rand:4}_{rand:2}", &mut rng(), 42);
        assert!(s.starts_with("user_42_code_"));
        assert_eq!(s.len(), 13 + 4 + 1 + 2);
    }

    #[test]
    fn test_malformed_placeholder_kept() {
        let s = render_pattern("{rand:x}-{rand:3}", &mut rng(), 0);
        assert!(s.starts_with("{rand:x}-"));
        assert_eq!(s.len(), 9 + 3);
    }
}
