use std::path::{Path, PathBuf};

use candle_core::DType;
use candle_nn::VarBuilder;
use hf_hub::api::sync::Api;
use log::{debug, info};
use tokenizers::Tokenizer;

use crate::error::Error;

use super::{DeviceChoice, Gpt2, Gpt2Config};

const CONFIG_FILE: &str = "config.json";
const TOKENIZER_FILE: &str = "tokenizer.json";
const WEIGHTS_FILE: &str = "model.safetensors";

/// Files needed to build a model.
#[derive(Debug)]
struct ModelFiles {
    config: PathBuf,
    tokenizer: PathBuf,
    weights: PathBuf,
}

/// Model builder.
///
/// `model_name` is either a local directory holding `config.json`,
/// `tokenizer.json` and `model.safetensors`, or a HuggingFace hub repository id.
pub struct ModelBuilder {
    model_name: String,
    device: DeviceChoice,
    max_length: usize,
}

impl ModelBuilder {
    pub fn new(model_name: &str) -> Self {
        debug!("New builder: {:?}", model_name);
        Self {
            model_name: model_name.to_string(),
            device: DeviceChoice::default(),
            max_length: 1024,
        }
    }

    pub fn device(mut self, device: DeviceChoice) -> Self {
        self.device = device;
        self
    }

    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    fn local_files(dir: &Path) -> Result<ModelFiles, Error> {
        let files = ModelFiles {
            config: dir.join(CONFIG_FILE),
            tokenizer: dir.join(TOKENIZER_FILE),
            weights: dir.join(WEIGHTS_FILE),
        };
        for path in [&files.config, &files.tokenizer, &files.weights] {
            if !path.exists() {
                return Err(Error::PathNotFound(path.to_path_buf()));
            }
        }
        Ok(files)
    }

    fn hub_files(model_id: &str) -> Result<ModelFiles, Error> {
        info!("fetching {model_id} from the hub");
        let repo = Api::new()?.model(model_id.to_string());
        Ok(ModelFiles {
            config: repo.get(CONFIG_FILE)?,
            tokenizer: repo.get(TOKENIZER_FILE)?,
            weights: repo.get(WEIGHTS_FILE)?,
        })
    }

    pub fn build(&self) -> Result<Gpt2, Error> {
        if self.model_name.trim().is_empty() {
            return Err(Error::Config("model name is empty".to_string()));
        }

        let local = Path::new(&self.model_name);
        let files = if local.is_dir() {
            Self::local_files(local)?
        } else {
            Self::hub_files(&self.model_name)?
        };
        debug!("model files: {:?}", files);

        let config: Gpt2Config =
            serde_json::from_reader(std::fs::File::open(&files.config)?)?;
        let tokenizer = Tokenizer::from_file(&files.tokenizer)?;

        let device = self.device.resolve()?;
        // safety: the weights file is not modified while mapped
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[&files.weights], DType::F32, &device)?
        };

        let model = Gpt2::load(vb, &config, tokenizer, self.max_length)?;
        info!("loaded {} ({} layers)", self.model_name, config.n_layer);
        Ok(model)
    }
}
