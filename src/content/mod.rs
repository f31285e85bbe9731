//! Content model: documents on disk to published snapshots.
//!
//! | Module     | Role                                          |
//! |------------|-----------------------------------------------|
//! | `markdown` | front matter split + markdown → HTML          |
//! | `resume`   | structured résumé decoding and rendering      |
//! | `loader`   | content root → [`Snapshot`]                   |
//! | `snapshot` | immutable, indexed view of one load           |
//! | `store`    | atomic swap point shared with readers         |

pub mod error;
pub mod loader;
pub mod markdown;
pub mod resume;
pub mod snapshot;
pub mod store;
pub mod types;

pub use error::{LoadError, ParseError};
pub use loader::load_snapshot;
pub use resume::{Bullet, DateRange, Resume, ResumeDate, ResumeDocument};
pub use snapshot::{Snapshot, Summary};
pub use store::SnapshotStore;
pub use types::{Post, PostMeta, Project, ProjectMeta, Record};
