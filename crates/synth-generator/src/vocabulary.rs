//! Weighted vocabulary seed files.
//!
//! One entry per line, `<name>\t<weight>`. Lines starting with `#` and blank
//! lines are skipped; a line without a weight column counts as weight 1.
//!
//! ```text
//! # common words
//! the	1200
//! of	640.5
//! rare
//! ```

use crate::generator::GeneratorError;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Entries of a seed file, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightedVocabulary {
    entries: Vec<(String, f64)>,
}

impl WeightedVocabulary {
    /// Parse seed-file text. `source` is only used in error messages.
    pub fn parse(content: &str, source: &str) -> Result<Self, GeneratorError> {
        let mut entries = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }

            let mut columns = line.split('\t');
            let name = columns.next().unwrap_or_default().trim();
            if name.is_empty() {
                return Err(vocabulary_error(source, line_no, "empty name"));
            }
            let weight = match columns.next().map(str::trim) {
                None | Some("") => 1.0,
                Some(text) => text.parse::<f64>().map_err(|_| {
                    vocabulary_error(source, line_no, format!("invalid weight '{text}'"))
                })?,
            };
            if !weight.is_finite() || weight < 0.0 {
                return Err(vocabulary_error(
                    source,
                    line_no,
                    format!("weight must be a non-negative number, got {weight}"),
                ));
            }
            entries.push((name.to_string(), weight));
        }
        Ok(Self { entries })
    }

    /// Read and parse a seed file.
    pub fn from_file(path: &Path) -> Result<Self, GeneratorError> {
        let content = fs::read_to_string(path).map_err(|e| GeneratorError::Vocabulary {
            source_name: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let vocabulary = Self::parse(&content, &path.display().to_string())?;
        debug!(path = %path.display(), entries = vocabulary.len(), "Loaded vocabulary");
        Ok(vocabulary)
    }

    /// Load an optional seed file.
    ///
    /// A configured file that does not exist is logged and replaced by an
    /// empty vocabulary. A file that exists but does not parse is an error.
    pub fn load_optional(path: Option<&Path>) -> Result<Self, GeneratorError> {
        match path {
            None => Ok(Self::default()),
            Some(path) if !path.exists() => {
                warn!(
                    path = %path.display(),
                    "Vocabulary file not found, falling back to placeholders"
                );
                Ok(Self::default())
            }
            Some(path) => Self::from_file(path),
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry names in file order.
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Weights rounded to table occupancies, at least 1 each.
    pub fn prior_counts(&self) -> Vec<u64> {
        self.entries
            .iter()
            .map(|(_, weight)| (weight.round() as u64).max(1))
            .collect()
    }
}

fn vocabulary_error(source: &str, line_no: usize, reason: impl Into<String>) -> GeneratorError {
    GeneratorError::Vocabulary {
        source_name: source.to_string(),
        reason: format!("line {}: {}", line_no + 1, reason.into()),
    }
}
