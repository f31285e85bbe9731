//! Record types for the two markdown collections.

use crate::utils::date::DateTimeUtc;
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Metadata shape shared by every markdown collection.
pub trait Meta: DeserializeOwned + Default + Send {
    /// Sort key; records without a date sort last.
    fn date(&self) -> Option<DateTimeUtc>;
}

/// Blog post front matter.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PostMeta {
    pub title: String,
    pub date: Option<DateTimeUtc>,
    pub description: String,
    pub tags: Vec<String>,
    /// Drafts are parsed but never published.
    pub draft: bool,
}

impl Meta for PostMeta {
    fn date(&self) -> Option<DateTimeUtc> {
        self.date
    }
}

/// Project page front matter.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProjectMeta {
    pub title: String,
    pub date: Option<DateTimeUtc>,
    pub description: String,
    pub tags: Vec<String>,
    pub repo: String,
    pub url: String,
    pub featured: bool,
    pub status: String,
}

impl Meta for ProjectMeta {
    fn date(&self) -> Option<DateTimeUtc> {
        self.date
    }
}

/// One loaded markdown document.
///
/// `slug` is the file name without its extension and is unique within a
/// collection. `content` is rendered HTML.
#[derive(Debug, Clone, PartialEq)]
pub struct Record<M> {
    pub slug: String,
    pub meta: M,
    pub content: String,
}

impl<M: Meta> Record<M> {
    #[inline]
    pub fn date(&self) -> Option<DateTimeUtc> {
        self.meta.date()
    }
}

pub type Post = Record<PostMeta>;
pub type Project = Record<ProjectMeta>;

impl Post {
    /// Title for display; falls back to the slug when front matter has none.
    pub fn title(&self) -> &str {
        if self.meta.title.is_empty() {
            &self.slug
        } else {
            &self.meta.title
        }
    }
}
