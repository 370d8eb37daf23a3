/*! Corpus walker

Recursively lists source files under a root directory and decodes them.

Unreadable entries are yielded as [Error::CorpusAccess] (or [Error::Walk] for
walker-level failures such as symlink loops) so that the caller decides whether
to log and skip them. Files that do not match the allow-list are never yielded.
!*/
use std::path::{Path, PathBuf};

use log::{debug, trace, warn};
use walkdir::WalkDir;

use crate::error::Error;

use super::Extensions;

/// A decoded corpus file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceText {
    pub path: PathBuf,
    pub text: String,
    /// `true` if invalid UTF-8 sequences were replaced with U+FFFD.
    pub lossy: bool,
}

impl SourceText {
    /// In-memory text, not backed by a decoded file.
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
            lossy: false,
        }
    }
}

/// Decode bytes as UTF-8, substituting U+FFFD for invalid sequences.
///
/// Returns the text and whether any substitution happened.
pub fn decode_lossy(bytes: Vec<u8>) -> (String, bool) {
    match String::from_utf8(bytes) {
        Ok(text) => (text, false),
        Err(e) => (String::from_utf8_lossy(e.as_bytes()).into_owned(), true),
    }
}

/// Lazy iterator over the matching files of a corpus.
pub struct CorpusWalker {
    inner: walkdir::IntoIter,
    extensions: Extensions,
}

impl CorpusWalker {
    /// Errors with [Error::PathNotFound] if `root` does not exist, and with
    /// [Error::Config] if it is not a directory.
    pub fn new(root: &Path, extensions: Extensions) -> Result<Self, Error> {
        if !root.exists() {
            return Err(Error::PathNotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(Error::Config(format!("{root:?} is not a directory")));
        }
        debug!(
            "walking {:?} for {:?}",
            root,
            extensions.iter().collect::<Vec<_>>()
        );

        // walkdir reports symlink loops as errors when following links
        let inner = WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter();

        Ok(Self { inner, extensions })
    }

    fn read(path: PathBuf) -> Result<SourceText, Error> {
        match std::fs::read(&path) {
            Ok(bytes) => {
                let (text, lossy) = decode_lossy(bytes);
                if lossy {
                    warn!("{path:?} is not valid UTF-8, invalid sequences replaced");
                }
                Ok(SourceText { path, text, lossy })
            }
            Err(source) => Err(Error::CorpusAccess { path, source }),
        }
    }
}

impl Iterator for CorpusWalker {
    type Item = Result<SourceText, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    // failing entries outside the allow-list are ignored too
                    if let Some(path) = e.path() {
                        if !path.is_dir() && !self.extensions.matches(path) {
                            trace!("{:?} does not match, ignoring: {e}", path);
                            continue;
                        }
                    }
                    // io failures on a known path are per-file access errors,
                    // anything else (symlink loops) stays a walk error
                    let path = e.path().map(Path::to_path_buf);
                    let err = match (path, e.io_error().map(|io| io.kind())) {
                        (Some(path), Some(kind)) => Error::CorpusAccess {
                            path,
                            source: std::io::Error::new(kind, e),
                        },
                        _ => Error::Walk(e),
                    };
                    return Some(Err(err));
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            if !self.extensions.matches(entry.path()) {
                trace!("{:?} does not match, ignoring", entry.path());
                continue;
            }

            return Some(Self::read(entry.into_path()));
        }
    }
}

/// Eagerly load every readable matching file under `root_dir`.
///
/// Unreadable files are logged and skipped. An empty result is not an error here.
pub fn load_corpus(root_dir: &Path, extensions: &Extensions) -> Result<Vec<SourceText>, Error> {
    let walker = CorpusWalker::new(root_dir, extensions.clone())?;
    let texts: Vec<SourceText> = walker
        .filter_map(|entry| match entry {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("skipping: {e}");
                None
            }
        })
        .collect();

    debug!("loaded {} files from {:?}", texts.len(), root_dir);
    Ok(texts)
}
