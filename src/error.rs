//! Error enum
use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    /// Invalid or missing configuration value.
    Config(String),
    PathNotFound(PathBuf),
    /// A corpus file could not be read. Recovered by skipping the file.
    CorpusAccess {
        path: PathBuf,
        source: std::io::Error,
    },
    Walk(walkdir::Error),
    /// The model failed to produce a usable loss for a text.
    ModelInference(String),
    Candle(candle_core::Error),
    Tokenizer(String),
    Hub(hf_hub::api::sync::ApiError),
    Serde(serde_json::Error),
    /// Nothing was scored: empty corpus, or every text failed.
    NoTokensScored,
    Cancelled,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "io error: {e}"),
            Error::Config(msg) => write!(f, "configuration error: {msg}"),
            Error::PathNotFound(p) => write!(f, "{p:?} not found"),
            Error::CorpusAccess { path, source } => {
                write!(f, "could not read {path:?}: {source}")
            }
            Error::Walk(e) => write!(f, "error walking corpus: {e}"),
            Error::ModelInference(msg) => write!(f, "model inference error: {msg}"),
            Error::Candle(e) => write!(f, "candle error: {e}"),
            Error::Tokenizer(msg) => write!(f, "tokenizer error: {msg}"),
            Error::Hub(e) => write!(f, "hub error: {e}"),
            Error::Serde(e) => write!(f, "serde error: {e}"),
            Error::NoTokensScored => write!(
                f,
                "no tokens were scored (empty corpus or every file failed), perplexity is undefined"
            ),
            Error::Cancelled => write!(f, "evaluation cancelled"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::CorpusAccess { source, .. } => Some(source),
            Error::Walk(e) => Some(e),
            Error::Candle(e) => Some(e),
            Error::Hub(e) => Some(e),
            Error::Serde(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::Io(e)
    }
}

impl From<walkdir::Error> for Error {
    fn from(e: walkdir::Error) -> Error {
        Error::Walk(e)
    }
}

impl From<candle_core::Error> for Error {
    fn from(e: candle_core::Error) -> Error {
        Error::Candle(e)
    }
}

impl From<hf_hub::api::sync::ApiError> for Error {
    fn from(e: hf_hub::api::sync::ApiError) -> Error {
        Error::Hub(e)
    }
}

impl From<tokenizers::Error> for Error {
    fn from(e: tokenizers::Error) -> Error {
        Error::Tokenizer(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Error {
        Error::Serde(e)
    }
}
