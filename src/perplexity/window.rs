//! Scoring a single text.
use std::fmt;
use std::str::FromStr;

use log::trace;

use crate::error::Error;
use crate::models::LanguageModel;

use super::aggregator::{Aggregator, ScoredUnit};

/// A causal model needs a token of context before it can predict one.
pub const MIN_WINDOW: usize = 2;

/// How texts longer than the model context are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowMode {
    /// Score the first `max_length` tokens only.
    #[default]
    Truncate,
    /// Score consecutive non-overlapping windows of `max_length` tokens and
    /// weight each window by its length.
    Chunk,
}

impl FromStr for WindowMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "truncate" => Ok(WindowMode::Truncate),
            "chunk" => Ok(WindowMode::Chunk),
            other => Err(Error::Config(format!(
                "unknown mode {other:?}, expected truncate or chunk"
            ))),
        }
    }
}

impl fmt::Display for WindowMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowMode::Truncate => write!(f, "truncate"),
            WindowMode::Chunk => write!(f, "chunk"),
        }
    }
}

fn score_window<M>(model: &M, window: &[u32]) -> Result<ScoredUnit, Error>
where
    M: LanguageModel + ?Sized,
{
    let loss = model.score(window)?;
    if !loss.is_finite() {
        return Err(Error::ModelInference(format!(
            "non-finite loss {loss} over {} tokens",
            window.len()
        )));
    }
    Ok(ScoredUnit::new(loss, window.len()))
}

/// Tokenize and score `text`.
///
/// Returns `Ok(None)` when the text has fewer than [MIN_WINDOW] tokens, which
/// must never reach the model. The returned token count is the number of
/// attended tokens and never exceeds `max_length` in [WindowMode::Truncate].
pub fn score_text<M>(text: &str, model: &M, mode: WindowMode) -> Result<Option<ScoredUnit>, Error>
where
    M: LanguageModel + ?Sized,
{
    let mut ids = model.tokenize(text)?;
    let max_length = model.max_length();
    trace!("{} tokens, max_length {}", ids.len(), max_length);

    match mode {
        WindowMode::Truncate => {
            ids.truncate(max_length);
            if ids.len() < MIN_WINDOW {
                return Ok(None);
            }
            score_window(model, &ids).map(Some)
        }
        WindowMode::Chunk => {
            let mut windows = Aggregator::new();
            for window in ids.chunks(max_length.max(MIN_WINDOW)) {
                if window.len() < MIN_WINDOW {
                    trace!("dropping trailing window of {} token", window.len());
                    continue;
                }
                windows.add(score_window(model, window)?);
            }
            if windows.total_tokens() == 0 {
                return Ok(None);
            }
            let mean_loss = windows.mean_loss()?;
            Ok(Some(ScoredUnit::new(mean_loss, windows.total_tokens())))
        }
    }
}
