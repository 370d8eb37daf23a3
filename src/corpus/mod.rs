//! Corpus loading.
//!
//! A corpus is every file under a root directory whose name ends with one of the
//! allowed [Extensions], decoded as UTF-8 with replacement of invalid sequences.
mod extensions;
mod walker;

pub use extensions::{Extensions, DEFAULT_EXTENSIONS};
pub use walker::{decode_lossy, load_corpus, CorpusWalker, SourceText};
