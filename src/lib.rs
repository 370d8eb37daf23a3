//! # codeppl
//!
//! Corpus-level perplexity of a causal language model over a tree of source files.
//!
//! Each file is tokenized and scored (truncated to the model context, or chunked),
//! and per-file mean losses are weighted by their token counts:
//! `perplexity = exp(Σ loss_i * n_i / Σ n_i)`.
//!
//! The model is behind [models::LanguageModel], so the corpus and aggregation code
//! can be used with any scorer.
pub mod config;
pub mod corpus;
pub mod error;
pub mod models;
pub mod perplexity;
pub mod pipeline;
