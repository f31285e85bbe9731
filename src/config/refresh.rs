//! `[refresh]` section configuration.

use super::defaults;
use educe::Educe;
use serde::Deserialize;

/// `[refresh]` section in folio.toml - background refresh loop.
///
/// # Example
/// ```toml
/// [refresh]
/// interval = "5m"
/// ```
#[derive(Debug, Clone, Educe, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct RefreshConfig {
    /// Period between cycles: a number with an `ms`, `s`, `m` or `h` suffix.
    /// A bare number is seconds.
    #[serde(default = "defaults::refresh::interval")]
    #[educe(Default = defaults::refresh::interval())]
    pub interval: String,
}
