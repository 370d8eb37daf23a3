//! Command line arguments and parameters management/parsing.
use std::path::PathBuf;

use structopt::StructOpt;

use codeppl::config::Config;
use codeppl::corpus::Extensions;
use codeppl::error::Error;
use codeppl::models::DeviceChoice;
use codeppl::perplexity::WindowMode;

#[derive(Debug, StructOpt)]
/// Perplexity command and parameters.
///
/// ```sh
/// codeppl 0.1.0
/// Corpus-level perplexity of a causal language model.
///
/// USAGE:
///     codeppl [FLAGS] [OPTIONS] --texts_dir <texts-dir>
///
/// FLAGS:
///     -h, --help        Prints help information
///         --json        print a JSON report instead of the perplexity line
///         --parallel    score files on all cores
///     -V, --version     Prints version information
/// ```
#[structopt(
    name = "codeppl",
    about = "Corpus-level perplexity of a causal language model."
)]
pub struct Codeppl {
    #[structopt(
        long = "model_name",
        default_value = "gpt2",
        help = "HuggingFace hub id or local directory (config.json, tokenizer.json, model.safetensors)"
    )]
    pub model_name: String,
    #[structopt(
        long = "texts_dir",
        parse(from_os_str),
        default_value = "",
        help = "root directory scanned recursively for source files"
    )]
    pub texts_dir: PathBuf,
    #[structopt(
        long = "device",
        default_value = "auto",
        help = "auto, cpu, cuda, cuda:N or metal"
    )]
    pub device: DeviceChoice,
    #[structopt(
        long = "max_length",
        default_value = "1024",
        help = "maximum number of tokens scored per window"
    )]
    pub max_length: usize,
    #[structopt(
        long = "mode",
        default_value = "truncate",
        help = "truncate: first window only. chunk: every window, token weighted"
    )]
    pub mode: WindowMode,
    #[structopt(
        long = "extensions",
        help = "comma-separated file suffixes. Default is .py,.js,.cpp,.java,.c,.go,.rb,.php"
    )]
    pub extensions: Option<String>,
    #[structopt(long = "parallel", help = "score files on all cores")]
    pub parallel: bool,
    #[structopt(long = "json", help = "print a JSON report instead of the perplexity line")]
    pub json: bool,
}

impl Codeppl {
    pub fn to_config(&self) -> Result<Config, Error> {
        let extensions = match &self.extensions {
            Some(list) => Extensions::parse_list(list)?,
            None => Extensions::default(),
        };

        let config = Config {
            model_name: self.model_name.clone(),
            texts_dir: self.texts_dir.clone(),
            device: self.device,
            max_length: self.max_length,
            mode: self.mode,
            extensions,
            parallel: self.parallel,
        };
        config.validate()?;
        Ok(config)
    }
}
