//! Content parsing and loading errors.

use std::path::PathBuf;
use thiserror::Error;

/// A single document could not be turned into a record.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("document is not valid UTF-8")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("malformed YAML front matter")]
    Yaml(#[source] serde_yaml::Error),

    #[error("malformed TOML front matter")]
    Toml(#[source] toml::de::Error),

    #[error("malformed resume document")]
    Resume(#[source] serde_yaml::Error),
}

/// A load cycle failed; nothing from it may be published.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("content root `{0}` does not exist")]
    MissingRoot(PathBuf),

    #[error("cannot list `{0}`")]
    Walk(PathBuf, #[source] walkdir::Error),

    #[error("cannot read `{0}`")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("cannot parse `{0}`")]
    Document(PathBuf, #[source] ParseError),
}
