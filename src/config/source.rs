//! `[source]` section configuration.

use super::defaults;
use educe::Educe;
use serde::Deserialize;
use std::path::PathBuf;

/// `[source]` section in folio.toml - the content repository.
///
/// # Example
/// ```toml
/// [source]
/// url = "https://github.com/user/content.git"
/// branch = "main"
/// dir = "content"
/// token_path = "~/.content-token"
/// ```
#[derive(Debug, Clone, Educe, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    /// Repository URL (HTTPS, SSH or `file://`).
    #[serde(default = "defaults::source::url")]
    #[educe(Default = defaults::source::url())]
    pub url: String,

    /// Branch mirrored locally.
    #[serde(default = "defaults::source::branch")]
    #[educe(Default = defaults::source::branch())]
    pub branch: String,

    /// Local mirror directory; also the content root handed to the loader.
    #[serde(default = "defaults::source::dir")]
    #[educe(Default = defaults::source::dir())]
    pub dir: PathBuf,

    /// File holding an access token for private HTTPS repositories.
    ///
    /// Keep it outside the content repository.
    #[serde(default = "defaults::source::token_path")]
    #[educe(Default = defaults::source::token_path())]
    pub token_path: Option<PathBuf>,
}
