//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// [source] Section Defaults
// ============================================================================

pub mod source {
    use std::path::PathBuf;

    pub fn url() -> String {
        String::new()
    }

    pub fn branch() -> String {
        "main".into()
    }

    pub fn dir() -> PathBuf {
        "content".into()
    }

    pub fn token_path() -> Option<PathBuf> {
        None
    }
}

// ============================================================================
// [refresh] Section Defaults
// ============================================================================

pub mod refresh {
    pub fn interval() -> String {
        "5m".into()
    }
}
