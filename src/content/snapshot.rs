//! Immutable content snapshot.
//!
//! A snapshot is built once per load cycle and never mutated after it is
//! published. Ordered lists and indexes share the same `Arc` records, so a
//! reader that found a post through the tag index sees exactly the post in
//! the ordered list.

use super::resume::Resume;
use super::types::{Meta, Post, Project, Record};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct Snapshot {
    posts: Vec<Arc<Post>>,
    posts_by_slug: FxHashMap<String, Arc<Post>>,
    posts_by_tag: BTreeMap<String, Vec<Arc<Post>>>,

    projects: Vec<Arc<Project>>,
    projects_by_slug: FxHashMap<String, Arc<Project>>,

    resume: Option<Resume>,

    /// Stamped by the store on publish; zero until then.
    pub(super) generation: u64,
}

impl Snapshot {
    /// Order both collections newest first and build every index.
    ///
    /// Slugs must already be unique per collection.
    pub fn build(posts: Vec<Post>, projects: Vec<Project>, resume: Option<Resume>) -> Self {
        let posts = newest_first(posts);
        let projects = newest_first(projects);

        let posts_by_slug = index_by_slug(&posts);
        let projects_by_slug = index_by_slug(&projects);

        let mut posts_by_tag: BTreeMap<String, Vec<Arc<Post>>> = BTreeMap::new();
        for post in &posts {
            for tag in &post.meta.tags {
                let bucket = posts_by_tag.entry(tag.clone()).or_default();
                // A tag listed twice in one post still indexes it once.
                if !bucket.last().is_some_and(|p| Arc::ptr_eq(p, post)) {
                    bucket.push(Arc::clone(post));
                }
            }
        }

        Self {
            posts,
            posts_by_slug,
            posts_by_tag,
            projects,
            projects_by_slug,
            resume,
            generation: 0,
        }
    }

    // ========================================================================
    // Read interface
    // ========================================================================

    /// Published posts, newest first.
    pub fn posts(&self) -> &[Arc<Post>] {
        &self.posts
    }

    pub fn post(&self, slug: &str) -> Option<&Arc<Post>> {
        self.posts_by_slug.get(slug)
    }

    /// Posts carrying `tag`, in snapshot order. Unknown tags give an empty slice.
    pub fn posts_tagged(&self, tag: &str) -> &[Arc<Post>] {
        self.posts_by_tag
            .get(tag)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Every tag in use, sorted, with its post count.
    pub fn tags(&self) -> impl Iterator<Item = (&str, usize)> {
        self.posts_by_tag
            .iter()
            .map(|(tag, posts)| (tag.as_str(), posts.len()))
    }

    /// Projects, newest first.
    pub fn projects(&self) -> &[Arc<Project>] {
        &self.projects
    }

    pub fn project(&self, slug: &str) -> Option<&Arc<Project>> {
        self.projects_by_slug.get(slug)
    }

    pub fn featured_projects(&self) -> impl Iterator<Item = &Arc<Project>> {
        self.projects.iter().filter(|p| p.meta.featured)
    }

    pub fn resume(&self) -> Option<&Resume> {
        self.resume.as_ref()
    }

    /// Publish sequence number; strictly increases across publishes.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn summary(&self) -> Summary {
        Summary {
            posts: self.posts.len(),
            projects: self.projects.len(),
            tags: self.posts_by_tag.len(),
            resume: self.resume.as_ref().map(Resume::kind),
        }
    }
}

/// Counts for log lines and the `check` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub posts: usize,
    pub projects: usize,
    pub tags: usize,
    pub resume: Option<&'static str>,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} posts, {} projects, {} tags, resume: {}",
            self.posts,
            self.projects,
            self.tags,
            self.resume.unwrap_or("none")
        )
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Stable sort by date descending; undated records go last, ties keep input order.
fn newest_first<M: Meta>(mut records: Vec<Record<M>>) -> Vec<Arc<Record<M>>> {
    records.sort_by(|a, b| b.date().cmp(&a.date()));
    records.into_iter().map(Arc::new).collect()
}

fn index_by_slug<M>(records: &[Arc<Record<M>>]) -> FxHashMap<String, Arc<Record<M>>> {
    records
        .iter()
        .map(|r| (r.slug.clone(), Arc::clone(r)))
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::content::types::{PostMeta, ProjectMeta};
    use crate::utils::date::DateTimeUtc;

    pub(crate) fn post(slug: &str, date: Option<(u16, u8, u8)>, tags: &[&str]) -> Post {
        Post {
            slug: slug.to_owned(),
            meta: PostMeta {
                title: slug.to_uppercase(),
                date: date.map(|(y, m, d)| DateTimeUtc::from_ymd(y, m, d)),
                tags: tags.iter().map(|t| (*t).to_owned()).collect(),
                ..PostMeta::default()
            },
            content: format!("<p>{slug}</p>"),
        }
    }

    fn project(slug: &str, year: u16, featured: bool) -> Project {
        Project {
            slug: slug.to_owned(),
            meta: ProjectMeta {
                date: Some(DateTimeUtc::from_ymd(year, 1, 1)),
                featured,
                ..ProjectMeta::default()
            },
            content: String::new(),
        }
    }

    fn slugs(records: &[Arc<Post>]) -> Vec<&str> {
        records.iter().map(|p| p.slug.as_str()).collect()
    }

    #[test]
    fn test_posts_newest_first() {
        let snapshot = Snapshot::build(
            vec![
                post("older", Some((2024, 1, 1)), &[]),
                post("newer", Some((2024, 1, 2)), &[]),
            ],
            vec![],
            None,
        );
        assert_eq!(slugs(snapshot.posts()), vec!["newer", "older"]);
    }

    #[test]
    fn test_undated_last_and_ties_stable() {
        let snapshot = Snapshot::build(
            vec![
                post("undated", None, &[]),
                post("a", Some((2023, 5, 1)), &[]),
                post("b", Some((2023, 5, 1)), &[]),
                post("latest", Some((2024, 2, 1)), &[]),
            ],
            vec![],
            None,
        );
        assert_eq!(slugs(snapshot.posts()), vec!["latest", "a", "b", "undated"]);
    }

    #[test]
    fn test_indexes_share_records() {
        let snapshot = Snapshot::build(
            vec![
                post("rust-post", Some((2024, 3, 1)), &["rust", "cli"]),
                post("go-post", Some((2024, 2, 1)), &["go"]),
                post("both", Some((2024, 4, 1)), &["rust", "go", "rust"]),
                post("untagged", Some((2024, 5, 1)), &[]),
            ],
            vec![],
            None,
        );

        assert!(snapshot.post("untagged").is_some());
        for (tag, _) in snapshot.tags() {
            assert!(snapshot.posts_tagged(tag).iter().all(|q| q.slug != "untagged"));
        }
        assert!(snapshot.posts_tagged("").is_empty());

        for p in snapshot.posts() {
            assert!(Arc::ptr_eq(snapshot.post(&p.slug).unwrap(), p));
            for tag in &p.meta.tags {
                assert!(snapshot.posts_tagged(tag).iter().any(|q| Arc::ptr_eq(q, p)));
            }
        }

        assert_eq!(slugs(snapshot.posts_tagged("rust")), vec!["both", "rust-post"]);
        assert_eq!(slugs(snapshot.posts_tagged("go")), vec!["both", "go-post"]);
        assert!(snapshot.posts_tagged("python").is_empty());
        assert!(snapshot.post("missing").is_none());

        let tags: Vec<_> = snapshot.tags().collect();
        assert_eq!(tags, vec![("cli", 1), ("go", 2), ("rust", 2)]);
    }

    #[test]
    fn test_projects_and_featured() {
        let snapshot = Snapshot::build(
            vec![],
            vec![
                project("old", 2020, true),
                project("new", 2023, false),
                project("mid", 2021, true),
            ],
            None,
        );
        let order: Vec<_> = snapshot.projects().iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(order, vec!["new", "mid", "old"]);

        let featured: Vec<_> = snapshot.featured_projects().map(|p| p.slug.as_str()).collect();
        assert_eq!(featured, vec!["mid", "old"]);
        assert!(snapshot.project("new").is_some());
    }

    #[test]
    fn test_summary_display() {
        let snapshot = Snapshot::build(
            vec![post("a", None, &["x"])],
            vec![],
            Some(Resume::Markdown { content: String::new() }),
        );
        assert_eq!(
            snapshot.summary().to_string(),
            "1 posts, 0 projects, 1 tags, resume: markdown"
        );
        assert_eq!(snapshot.generation(), 0);
    }
}
