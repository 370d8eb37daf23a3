//! Perplexity pipeline
//!
//! 1. Validate the [Config]
//! 1. Open the corpus root
//! 1. Load the model (skipped by [PerplexityPipeline::run_with_model])
//! 1. Walk the corpus lazily, scoring each text and folding the results into a [Report]
use log::{debug, info};

use crate::config::Config;
use crate::corpus::CorpusWalker;
use crate::error::Error;
use crate::models::{LanguageModel, ModelBuilder};
use crate::perplexity::{Evaluator, Report};

pub struct PerplexityPipeline {
    config: Config,
}

impl PerplexityPipeline {
    pub fn new(config: Config) -> Self {
        debug!("pipeline config {:?}", config);
        Self { config }
    }

    fn walker(&self) -> Result<CorpusWalker, Error> {
        self.config.validate()?;
        CorpusWalker::new(&self.config.texts_dir, self.config.extensions.clone())
    }

    /// Load the configured model, then evaluate.
    ///
    /// The corpus root is checked first, so a bad `texts_dir` never triggers a
    /// model download.
    pub fn run(&self) -> Result<Report, Error> {
        let walker = self.walker()?;
        let model = ModelBuilder::new(&self.config.model_name)
            .device(self.config.device)
            .max_length(self.config.max_length)
            .build()?;
        self.evaluate(walker, &model)
    }

    /// Evaluate with an already loaded model.
    pub fn run_with_model<M>(&self, model: &M) -> Result<Report, Error>
    where
        M: LanguageModel + ?Sized,
    {
        let walker = self.walker()?;
        self.evaluate(walker, model)
    }

    fn evaluate<M>(&self, walker: CorpusWalker, model: &M) -> Result<Report, Error>
    where
        M: LanguageModel + ?Sized,
    {
        info!(
            "evaluating {:?} (mode {}, max_length {})",
            self.config.texts_dir,
            self.config.mode,
            model.max_length()
        );

        let evaluator = Evaluator::new(model, self.config.mode);
        if self.config.parallel {
            evaluator.evaluate_par(walker)
        } else {
            evaluator.evaluate(walker)
        }
    }
}
