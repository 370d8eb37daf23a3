/*! Perplexity computation.

- [score_text] turns one text into a [ScoredUnit] (mean loss, attended tokens),
- [Aggregator] folds units into token-weighted sums,
- [Evaluator] drives both over a corpus, sequentially or with rayon.
!*/
mod aggregator;
mod evaluator;
mod window;

pub use aggregator::{aggregate, Aggregator, Report, ScoredUnit};
pub use evaluator::Evaluator;
pub use window::{score_text, WindowMode, MIN_WINDOW};
