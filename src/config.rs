//! Run configuration, resolved once at startup.
use std::path::PathBuf;

use crate::corpus::Extensions;
use crate::error::Error;
use crate::models::DeviceChoice;
use crate::perplexity::{WindowMode, MIN_WINDOW};

pub const DEFAULT_MODEL: &str = "gpt2";
pub const DEFAULT_MAX_LENGTH: usize = 1024;

#[derive(Debug, Clone)]
pub struct Config {
    /// Hub repository id or local model directory.
    pub model_name: String,
    pub texts_dir: PathBuf,
    pub device: DeviceChoice,
    pub max_length: usize,
    pub mode: WindowMode,
    pub extensions: Extensions,
    pub parallel: bool,
}

impl Config {
    pub fn new(texts_dir: PathBuf) -> Self {
        Self {
            model_name: DEFAULT_MODEL.to_string(),
            texts_dir,
            device: DeviceChoice::default(),
            max_length: DEFAULT_MAX_LENGTH,
            mode: WindowMode::default(),
            extensions: Extensions::default(),
            parallel: false,
        }
    }

    /// Reject values that would make the run meaningless.
    ///
    /// An empty `texts_dir` is refused rather than read as the current directory.
    pub fn validate(&self) -> Result<(), Error> {
        if self.texts_dir.as_os_str().is_empty() {
            return Err(Error::Config(
                "texts_dir is required (an empty path is not scanned)".to_string(),
            ));
        }
        if self.max_length < MIN_WINDOW {
            return Err(Error::Config(format!(
                "max_length must be at least {MIN_WINDOW}, got {}",
                self.max_length
            )));
        }
        Ok(())
    }
}
