//! Corpus evaluation.
//!
//! Folds a stream of corpus entries into an [Aggregator]. Failures on a single
//! entry (unreadable file, model error, empty text) are logged and counted as
//! skipped; they never abort the run.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::corpus::SourceText;
use crate::error::Error;
use crate::models::LanguageModel;

use super::aggregator::{Aggregator, Report};
use super::window::{score_text, WindowMode};

/// Partial result of a (sub)corpus.
#[derive(Debug, Default)]
struct Tally {
    aggregator: Aggregator,
    skipped: usize,
}

impl Tally {
    fn merge(self, other: Self) -> Self {
        Self {
            aggregator: self.aggregator.merge(other.aggregator),
            skipped: self.skipped + other.skipped,
        }
    }

    fn report(self) -> Result<Report, Error> {
        info!(
            "scored {} files ({} tokens), skipped {}",
            self.aggregator.units(),
            self.aggregator.total_tokens(),
            self.skipped
        );
        if self.aggregator.units() == 0 && self.skipped == 0 {
            warn!("no matching files found");
        }
        self.aggregator.report(self.skipped)
    }
}

pub struct Evaluator<'m, M: LanguageModel + ?Sized> {
    model: &'m M,
    mode: WindowMode,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'m, M: LanguageModel + ?Sized> Evaluator<'m, M> {
    pub fn new(model: &'m M, mode: WindowMode) -> Self {
        Self {
            model,
            mode,
            cancel: None,
        }
    }

    /// Stop between files once `flag` is set.
    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map_or(false, |flag| flag.load(Ordering::Relaxed))
    }

    fn process(&self, tally: &mut Tally, entry: Result<SourceText, Error>) {
        let source = match entry {
            Ok(source) => source,
            Err(e) => {
                warn!("skipping: {e}");
                tally.skipped += 1;
                return;
            }
        };

        match score_text(&source.text, self.model, self.mode) {
            Ok(Some(unit)) => {
                debug!(
                    "{:?}: {} tokens, loss {:.4}",
                    source.path, unit.token_count, unit.mean_loss
                );
                tally.aggregator.add(unit);
            }
            Ok(None) => {
                debug!("{:?} has no scorable tokens, skipping", source.path);
                tally.skipped += 1;
            }
            Err(e) => {
                warn!("{:?} could not be scored, excluding it: {e}", source.path);
                tally.skipped += 1;
            }
        }
    }

    /// Evaluate sequentially.
    pub fn evaluate<I>(&self, entries: I) -> Result<Report, Error>
    where
        I: IntoIterator<Item = Result<SourceText, Error>>,
    {
        let mut tally = Tally::default();
        for entry in entries {
            if self.is_cancelled() {
                warn!("cancelled after {} files", tally.aggregator.units());
                return Err(Error::Cancelled);
            }
            self.process(&mut tally, entry);
        }
        tally.report()
    }

    /// Evaluate on the rayon thread pool.
    ///
    /// Each worker folds into its own [Aggregator]; partial results are merged
    /// at the end, so the outcome does not depend on scheduling (up to
    /// floating point rounding).
    pub fn evaluate_par<I>(&self, entries: I) -> Result<Report, Error>
    where
        I: IntoIterator<Item = Result<SourceText, Error>>,
        I::IntoIter: Send,
    {
        let tally = entries
            .into_iter()
            .par_bridge()
            .try_fold(Tally::default, |mut tally, entry| {
                if self.is_cancelled() {
                    return Err(Error::Cancelled);
                }
                self.process(&mut tally, entry);
                Ok(tally)
            })
            .try_reduce(Tally::default, |a, b| Ok(a.merge(b)));

        match tally {
            Ok(tally) => tally.report(),
            Err(e) => {
                warn!("parallel evaluation stopped: {e}");
                Err(e)
            }
        }
    }
}
