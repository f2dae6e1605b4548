//! Error enum
use std::fmt;

use crate::fetch::FetchError;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Serde(serde_json::Error),
    Glob(glob::GlobError),
    GlobPattern(glob::PatternError),
    Fetch(FetchError),
    /// More than two corpus languages were found where exactly two are expected.
    TooManyLanguages(Vec<String>),
    /// A partition name was requested that the quota does not hold.
    MissingPartition(String),
    Custom(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "io error: {}", e),
            Error::Serde(e) => write!(f, "(de)serialization error: {}", e),
            Error::Glob(e) => write!(f, "glob error: {}", e),
            Error::GlobPattern(e) => write!(f, "bad glob pattern: {}", e),
            Error::Fetch(e) => write!(f, "fetch error: {}", e),
            Error::TooManyLanguages(langs) => write!(
                f,
                "a corpus holds exactly two languages, found {}: {:?}",
                langs.len(),
                langs
            ),
            Error::MissingPartition(name) => write!(f, "no partition named {:?}", name),
            Error::Custom(s) => write!(f, "{}", s),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Error {
        Error::Serde(e)
    }
}

impl From<glob::GlobError> for Error {
    fn from(e: glob::GlobError) -> Error {
        Error::Glob(e)
    }
}

impl From<glob::PatternError> for Error {
    fn from(e: glob::PatternError) -> Error {
        Error::GlobPattern(e)
    }
}

impl From<FetchError> for Error {
    fn from(e: FetchError) -> Error {
        Error::Fetch(e)
    }
}

impl From<String> for Error {
    fn from(s: String) -> Error {
        Error::Custom(s)
    }
}
