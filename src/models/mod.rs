/*! Language models.

Scoring goes through the [LanguageModel] trait so that the perplexity code never
depends on a concrete model. [Gpt2] is the candle-backed implementation, built
with a [ModelBuilder].
!*/
mod builder;
mod device;
#[cfg(test)]
mod fixtures;
mod gpt2;

pub use builder::ModelBuilder;
pub use device::DeviceChoice;
pub use gpt2::{Gpt2, Gpt2Config};

use crate::error::Error;

/// Causal language model capability.
pub trait LanguageModel: Send + Sync {
    /// Tokenize text into ids. No special tokens are added.
    fn tokenize(&self, text: &str) -> Result<Vec<u32>, Error>;

    /// Mean natural-log cross-entropy of `ids`, each token predicted from the
    /// preceding ones. Callers never pass more than [LanguageModel::max_length] ids.
    fn score(&self, ids: &[u32]) -> Result<f64, Error>;

    /// Maximum number of tokens scored in a single window.
    fn max_length(&self) -> usize;
}
