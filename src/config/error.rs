//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-related errors; all of them are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config file parsing error")]
    Toml(#[from] toml::de::Error),

    #[error("Config validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_config_error_display() {
        let io_err = ConfigError::Io(
            PathBuf::from("token"),
            Error::new(ErrorKind::NotFound, "file not found"),
        );
        let display = format!("{io_err}");
        assert!(display.contains("IO error"));
        assert!(display.contains("token"));

        let validation_err = ConfigError::Validation("[source.url] is required".to_string());
        assert!(format!("{validation_err}").contains("[source.url] is required"));
    }
}
