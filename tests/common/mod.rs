use std::collections::HashMap;

use codeppl::error::Error;
use codeppl::models::LanguageModel;

/// One token per char. The loss of a window is looked up by its first char,
/// so each test file picks its loss with its leading character.
pub struct TableModel {
    pub max_length: usize,
    pub losses: HashMap<char, f64>,
}

impl TableModel {
    pub fn new(max_length: usize, losses: &[(char, f64)]) -> Self {
        Self {
            max_length,
            losses: losses.iter().copied().collect(),
        }
    }
}

impl LanguageModel for TableModel {
    fn tokenize(&self, text: &str) -> Result<Vec<u32>, Error> {
        Ok(text.chars().map(|c| c as u32).collect())
    }

    fn score(&self, ids: &[u32]) -> Result<f64, Error> {
        assert!(ids.len() <= self.max_length, "window over max_length");
        char::from_u32(ids[0])
            .and_then(|c| self.losses.get(&c).copied())
            .ok_or_else(|| Error::ModelInference("resource exhausted".to_string()))
    }

    fn max_length(&self) -> usize {
        self.max_length
    }
}

/// Uniform distribution over a vocabulary of `vocab` tokens.
pub struct UniformModel {
    pub vocab: usize,
}

impl LanguageModel for UniformModel {
    fn tokenize(&self, text: &str) -> Result<Vec<u32>, Error> {
        Ok(text.bytes().map(u32::from).collect())
    }

    fn score(&self, _ids: &[u32]) -> Result<f64, Error> {
        Ok((self.vocab as f64).ln())
    }

    fn max_length(&self) -> usize {
        1024
    }
}
