//! File suffix allow-list.
use std::collections::BTreeSet;
use std::path::Path;

use lazy_static::lazy_static;

use crate::error::Error;

lazy_static! {
    /// Source file suffixes scanned when none are provided.
    pub static ref DEFAULT_EXTENSIONS: BTreeSet<&'static str> = {
        let mut m = BTreeSet::new();
        m.insert(".py");
        m.insert(".js");
        m.insert(".cpp");
        m.insert(".java");
        m.insert(".c");
        m.insert(".go");
        m.insert(".rb");
        m.insert(".php");
        m
    };
}

/// Set of filename suffixes, always stored with a leading dot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extensions {
    suffixes: BTreeSet<String>,
}

impl Extensions {
    /// Build from user provided suffixes. `py` and `.py` are equivalent.
    ///
    /// Errors if no non-empty suffix remains.
    pub fn new<I, S>(suffixes: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let suffixes: BTreeSet<String> = suffixes
            .into_iter()
            .map(|s| s.as_ref().trim().to_string())
            .filter(|s| !s.is_empty() && s != ".")
            .map(|s| {
                if s.starts_with('.') {
                    s
                } else {
                    format!(".{s}")
                }
            })
            .collect();

        if suffixes.is_empty() {
            return Err(Error::Config(
                "at least one file extension is required".to_string(),
            ));
        }

        Ok(Self { suffixes })
    }

    /// Parse a comma-separated list (`py,.js, cpp`).
    pub fn parse_list(list: &str) -> Result<Self, Error> {
        Self::new(list.split(','))
    }

    /// Suffix test on the file name only.
    pub fn matches(&self, path: &Path) -> bool {
        match path.file_name().and_then(|name| name.to_str()) {
            Some(name) => self.suffixes.iter().any(|s| name.ends_with(s.as_str())),
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.suffixes.iter().map(String::as_str)
    }
}

impl Default for Extensions {
    fn default() -> Self {
        Self {
            suffixes: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}
