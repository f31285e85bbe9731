//! Configuration management for `folio.toml`.
//!
//! # Sections
//!
//! | Section     | Purpose                                      |
//! |-------------|----------------------------------------------|
//! | `[source]`  | Content repository (url, branch, mirror dir) |
//! | `[refresh]` | Background refresh period                    |
//!
//! # Example
//!
//! ```toml
//! [source]
//! url = "https://github.com/user/content.git"
//! branch = "main"
//! dir = "content"
//! token_path = "~/.content-token"
//!
//! [refresh]
//! interval = "5m"
//! ```
//!
//! The file is optional when `--url` is given on the command line. Relative
//! paths resolve against the project root (`--root`, default `./`).

mod defaults;
mod error;
mod refresh;
mod source;

pub use error::ConfigError;
pub use refresh::RefreshConfig;
pub use source::SourceConfig;

use crate::cli::Cli;
use crate::log;
use crate::mirror::Mirror;
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

// ============================================================================
// Helper Functions
// ============================================================================

/// Parse a human-readable duration string.
///
/// Supports suffixes: ms, s, m, h. A bare number is seconds.
///
/// # Examples
/// ```ignore
/// parse_duration("250ms") // → 250 ms
/// parse_duration("5m")    // → 300 s
/// parse_duration("90")    // → 90 s
/// ```
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim().to_ascii_lowercase();
    let (millis_per_unit, suffix_len) = if s.ends_with("ms") {
        (1, 2)
    } else if s.ends_with('h') {
        (3_600_000, 1)
    } else if s.ends_with('m') {
        (60_000, 1)
    } else if s.ends_with('s') {
        (1_000, 1)
    } else {
        (1_000, 0)
    };
    let value: u64 = s[..s.len() - suffix_len].trim().parse().ok()?;
    value.checked_mul(millis_per_unit).map(Duration::from_millis)
}

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing folio.toml
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FolioConfig {
    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Absolute project root (set after loading)
    #[serde(skip)]
    pub root: PathBuf,

    /// Content repository settings
    #[serde(default)]
    pub source: SourceConfig,

    /// Refresh loop settings
    #[serde(default)]
    pub refresh: RefreshConfig,
}

impl FolioConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Load, apply CLI overrides and validate.
    pub fn load(cli: &Cli) -> Result<Self> {
        let root = cli.root.as_deref().unwrap_or(Path::new("./"));
        let config_path = root.join(&cli.config);

        let mut config = if config_path.exists() {
            Self::from_path(&config_path)
                .with_context(|| format!("Failed to load `{}`", config_path.display()))?
        } else {
            log!("config"; "{} not found, using defaults", config_path.display());
            Self::default()
        };
        config.update_with_cli(cli);
        config.validate()?;

        Ok(config)
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        if let Some(source) = cli.source_args() {
            Self::update_option(&mut self.source.url, source.url.as_ref());
            Self::update_option(&mut self.source.branch, source.branch.as_ref());
            Self::update_option(&mut self.source.dir, source.dir.as_ref());
        }
        if let Some(interval) = cli.interval() {
            self.refresh.interval = interval.to_owned();
        }

        let root = cli.root.as_deref().unwrap_or(Path::new("./"));
        self.update_path_with_root(root, &cli.config);
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Resolve every path against `root` and make it absolute.
    fn update_path_with_root(&mut self, root: &Path, config: &Path) {
        let root = Self::normalize_path(root);
        self.config_path = Self::normalize_path(&root.join(config));
        self.source.dir = Self::resolve(&root, &self.source.dir);
        if let Some(token_path) = &self.source.token_path {
            self.source.token_path = Some(Self::resolve(&root, token_path));
        }
        self.root = root;
    }

    /// Tilde-expand, then anchor relative paths at `root`.
    fn resolve(root: &Path, path: &Path) -> PathBuf {
        let expanded = PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned());
        if expanded.is_relative() {
            Self::normalize_path(&root.join(expanded))
        } else {
            Self::normalize_path(&expanded)
        }
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            // For non-existent paths, manually make them absolute
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Validate configuration before anything touches the network.
    pub fn validate(&self) -> Result<()> {
        if self.source.url.trim().is_empty() {
            bail!(ConfigError::Validation(
                "[source.url] is required (set it in folio.toml or pass --url)".into()
            ));
        }
        if self.source.branch.trim().is_empty() {
            bail!(ConfigError::Validation("[source.branch] must not be empty".into()));
        }

        self.interval()?;

        if let Some(path) = &self.source.token_path {
            if !path.exists() {
                bail!(ConfigError::Validation("[source.token_path] not found".into()));
            }
            if !path.is_file() {
                bail!(ConfigError::Validation("[source.token_path] is not a file".into()));
            }
        }

        Self::check_command_installed("git")?;
        Ok(())
    }

    /// Refresh period; zero and unparsable values are rejected.
    pub fn interval(&self) -> Result<Duration, ConfigError> {
        parse_duration(&self.refresh.interval)
            .filter(|d| !d.is_zero())
            .ok_or_else(|| {
                ConfigError::Validation(format!(
                    "[refresh.interval] `{}` must be a positive duration such as 30s, 5m or 1h",
                    self.refresh.interval
                ))
            })
    }

    /// Token from `token_path`, trimmed; an empty file means no token.
    pub fn token(&self) -> Result<Option<String>, ConfigError> {
        let Some(path) = &self.source.token_path else {
            return Ok(None);
        };
        let token = fs::read_to_string(path).map_err(|err| ConfigError::Io(path.clone(), err))?;
        let token = token.trim();
        Ok((!token.is_empty()).then(|| token.to_owned()))
    }

    /// Mirror described by `[source]`.
    pub fn mirror(&self) -> Result<Mirror, ConfigError> {
        Ok(Mirror::new(&self.source.url, &self.source.branch, &self.source.dir)
            .with_token(self.token()?))
    }

    /// Check if a command is installed and available
    fn check_command_installed(cmd: &str) -> Result<()> {
        which::which(cmd).with_context(|| format!("`{cmd}` not found. Please install it first."))?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
