//! Token-weighted loss accumulation.
//!
//! Corpus perplexity is `exp(Σ loss_i * n_i / Σ n_i)` where `loss_i` is the mean
//! per-token loss of text `i` and `n_i` its number of scored tokens. Averaging
//! per-text perplexities instead would favour short texts.
use log::trace;
use serde::Serialize;

use crate::error::Error;

/// Mean loss of one text and the number of tokens it was averaged over.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredUnit {
    pub mean_loss: f64,
    pub token_count: usize,
}

impl ScoredUnit {
    pub fn new(mean_loss: f64, token_count: usize) -> Self {
        Self {
            mean_loss,
            token_count,
        }
    }
}

/// Running sums over [ScoredUnit]s.
///
/// Partial aggregators (one per worker) can be combined with [Aggregator::merge].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregator {
    total_weighted_loss: f64,
    total_tokens: usize,
    units: usize,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a unit. Units with no tokens carry no information and are ignored.
    pub fn add(&mut self, unit: ScoredUnit) {
        if unit.token_count == 0 {
            trace!("ignoring unit with no tokens");
            return;
        }
        self.total_weighted_loss += unit.mean_loss * unit.token_count as f64;
        self.total_tokens += unit.token_count;
        self.units += 1;
    }

    pub fn merge(mut self, other: Self) -> Self {
        self.total_weighted_loss += other.total_weighted_loss;
        self.total_tokens += other.total_tokens;
        self.units += other.units;
        self
    }

    pub fn total_weighted_loss(&self) -> f64 {
        self.total_weighted_loss
    }

    pub fn total_tokens(&self) -> usize {
        self.total_tokens
    }

    /// Number of units that contributed tokens.
    pub fn units(&self) -> usize {
        self.units
    }

    /// Token-weighted mean loss (corpus cross-entropy, in nats).
    pub fn mean_loss(&self) -> Result<f64, Error> {
        if self.total_tokens == 0 {
            return Err(Error::NoTokensScored);
        }
        Ok(self.total_weighted_loss / self.total_tokens as f64)
    }

    pub fn perplexity(&self) -> Result<f64, Error> {
        self.mean_loss().map(f64::exp)
    }

    /// Summarize, counting `files_skipped` texts that did not contribute.
    pub fn report(&self, files_skipped: usize) -> Result<Report, Error> {
        let mean_loss = self.mean_loss()?;
        Ok(Report {
            perplexity: mean_loss.exp(),
            mean_loss,
            tokens: self.total_tokens,
            files_scored: self.units,
            files_skipped,
        })
    }
}

impl Extend<ScoredUnit> for Aggregator {
    fn extend<T: IntoIterator<Item = ScoredUnit>>(&mut self, iter: T) {
        for unit in iter {
            self.add(unit);
        }
    }
}

impl FromIterator<ScoredUnit> for Aggregator {
    fn from_iter<T: IntoIterator<Item = ScoredUnit>>(iter: T) -> Self {
        let mut agg = Aggregator::new();
        agg.extend(iter);
        agg
    }
}

/// Corpus perplexity of a sequence of scored units, in a single pass.
pub fn aggregate<I>(units: I) -> Result<f64, Error>
where
    I: IntoIterator<Item = ScoredUnit>,
{
    units.into_iter().collect::<Aggregator>().perplexity()
}

/// Outcome of a corpus evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub perplexity: f64,
    pub mean_loss: f64,
    pub tokens: usize,
    pub files_scored: usize,
    pub files_skipped: usize,
}
