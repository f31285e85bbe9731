//! Directory loader: content root → [`Snapshot`].
//!
//! ```text
//! <root>/
//! ├── blog/        *.md, *.markdown  → posts
//! ├── projects/    *.md, *.markdown  → projects
//! └── resume/      resume.yaml | resume.yml | resume.md
//! ```
//!
//! Only the top level of each directory is read. A missing subdirectory is an
//! empty collection; any unreadable or malformed document fails the whole load
//! so the caller keeps serving its previous snapshot.

use super::error::LoadError;
use super::markdown::parse_document;
use super::resume::{Resume, ResumeDocument};
use super::snapshot::Snapshot;
use super::types::{Meta, Post, Project, Record};
use crate::log;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const BLOG_DIR: &str = "blog";
pub const PROJECTS_DIR: &str = "projects";
pub const RESUME_DIR: &str = "resume";

const EXTENSIONS: &[&str] = &["md", "markdown"];
const RESUME_YAML: &[&str] = &["resume.yaml", "resume.yml"];
const RESUME_MARKDOWN: &str = "resume.md";

/// Load every collection under `root` into a fresh snapshot.
pub fn load_snapshot(root: &Path) -> Result<Snapshot, LoadError> {
    if !root.is_dir() {
        return Err(LoadError::MissingRoot(root.to_path_buf()));
    }

    let posts: Vec<Post> = load_records(&root.join(BLOG_DIR))?;
    let total = posts.len();
    let posts: Vec<Post> = posts.into_iter().filter(|p| !p.meta.draft).collect();
    if posts.len() < total {
        log!("load"; "skipped {} draft posts", total - posts.len());
    }

    let projects: Vec<Project> = load_records(&root.join(PROJECTS_DIR))?;
    let resume = load_resume(&root.join(RESUME_DIR))?;

    Ok(Snapshot::build(posts, projects, resume))
}

// ============================================================================
// Markdown collections
// ============================================================================

/// Eligible files directly inside `dir`, in file name order.
fn eligible_files(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| LoadError::Walk(dir.to_path_buf(), e))?;
        if entry.file_type().is_file() && has_markdown_extension(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

#[inline]
fn has_markdown_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| EXTENSIONS.contains(&ext))
}

fn load_records<M: Meta>(dir: &Path) -> Result<Vec<Record<M>>, LoadError> {
    let files = eligible_files(dir)?;
    let records = files
        .par_iter()
        .map(|path| parse_file(path))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(dedupe_slugs(records, &files))
}

fn parse_file<M: Meta>(path: &Path) -> Result<Record<M>, LoadError> {
    let bytes = fs::read(path).map_err(|e| LoadError::Read(path.to_path_buf(), e))?;
    let (meta, content) =
        parse_document::<M>(&bytes).map_err(|e| LoadError::Document(path.to_path_buf(), e))?;
    Ok(Record {
        slug: slug_of(path),
        meta,
        content,
    })
}

fn slug_of(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// `a.md` and `a.markdown` share a slug; the later file in name order wins.
fn dedupe_slugs<M>(records: Vec<Record<M>>, files: &[PathBuf]) -> Vec<Record<M>> {
    let mut seen: FxHashMap<String, usize> = FxHashMap::default();
    let mut unique: Vec<Record<M>> = Vec::with_capacity(records.len());

    for (record, path) in records.into_iter().zip(files) {
        match seen.get(&record.slug) {
            Some(&i) => {
                log!("warn"; "duplicate slug `{}`, keeping {}", record.slug, path.display());
                unique[i] = record;
            }
            None => {
                seen.insert(record.slug.clone(), unique.len());
                unique.push(record);
            }
        }
    }
    unique
}

// ============================================================================
// Résumé
// ============================================================================

/// Front matter of a legacy markdown résumé carries nothing we keep.
#[derive(Default, Deserialize)]
struct LegacyResumeMeta {}

fn load_resume(dir: &Path) -> Result<Option<Resume>, LoadError> {
    for name in RESUME_YAML {
        let path = dir.join(name);
        if path.is_file() {
            let bytes = fs::read(&path).map_err(|e| LoadError::Read(path.clone(), e))?;
            let doc = ResumeDocument::from_yaml(&bytes).map_err(|e| LoadError::Document(path, e))?;
            return Ok(Some(Resume::Structured(doc)));
        }
    }

    let path = dir.join(RESUME_MARKDOWN);
    if path.is_file() {
        let bytes = fs::read(&path).map_err(|e| LoadError::Read(path.clone(), e))?;
        let (_, content) = parse_document::<LegacyResumeMeta>(&bytes)
            .map_err(|e| LoadError::Document(path, e))?;
        return Ok(Some(Resume::Markdown { content }));
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::error::ParseError;
    use crate::content::store::SnapshotStore;
    use crate::utils::date::DateTimeUtc;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, body: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    fn post(title: &str, date: &str, tags: &str) -> String {
        format!("---\ntitle: {title}\ndate: {date}\ntags: [{tags}]\n---\n\nBody of {title}.\n")
    }

    #[test]
    fn test_missing_root() {
        let dir = TempDir::new().unwrap();
        let err = load_snapshot(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, LoadError::MissingRoot(_)));
    }

    #[test]
    fn test_empty_root_is_empty_snapshot() {
        let dir = TempDir::new().unwrap();
        let snapshot = load_snapshot(dir.path()).unwrap();
        assert!(snapshot.posts().is_empty());
        assert!(snapshot.projects().is_empty());
        assert!(snapshot.resume().is_none());
    }

    #[test]
    fn test_non_matching_files_give_empty_collection() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "blog/readme.txt", "not a post");
        write(root, "blog/Post.MD", &post("Upper", "2024-01-01", ""));
        write(root, "blog/drafts/one.md", &post("Nested", "2024-01-01", ""));
        write(root, "projects/.keep", "");

        let snapshot = load_snapshot(root).unwrap();
        assert!(snapshot.posts().is_empty());
        assert!(snapshot.projects().is_empty());
        assert_eq!(snapshot.tags().count(), 0);
    }

    #[test]
    fn test_loads_posts_newest_first_with_indexes() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "blog/first.md", &post("First", "2024-01-01", "go"));
        write(root, "blog/second.md", &post("Second", "2024-01-02", "go, rust"));
        write(root, "blog/notes.txt", "ignored");
        write(root, "blog/nested/deep.md", &post("Deep", "2025-01-01", "go"));

        let snapshot = load_snapshot(root).unwrap();
        let slugs: Vec<_> = snapshot.posts().iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["second", "first"]);

        let second = snapshot.post("second").unwrap();
        assert_eq!(second.meta.title, "Second");
        assert!(second.content.contains("Body of Second."));
        assert_eq!(snapshot.posts_tagged("go").len(), 2);
        assert_eq!(snapshot.posts_tagged("rust").len(), 1);
    }

    #[test]
    fn test_offset_and_fractional_timestamps_load() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "blog/a.md", &post("A", "2024-01-15T10:00:00+02:00", ""));
        write(root, "blog/b.md", &post("B", "2024-01-15 09:00:00", ""));
        write(root, "blog/c.md", &post("C", "2024-01-15T07:30:00.25Z", ""));

        let snapshot = load_snapshot(root).unwrap();
        let slugs: Vec<_> = snapshot.posts().iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["b", "a", "c"]);
        assert_eq!(
            snapshot.post("a").unwrap().meta.date,
            Some(DateTimeUtc::new(2024, 1, 15, 8, 0, 0))
        );
    }

    #[test]
    fn test_markdown_extension_and_duplicate_slug() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "blog/same.markdown", &post("Earlier", "2024-03-01", ""));
        write(root, "blog/same.md", &post("Later", "2024-03-01", ""));
        write(root, "blog/other.markdown", &post("Other", "2024-02-01", ""));

        let snapshot = load_snapshot(root).unwrap();
        assert_eq!(snapshot.posts().len(), 2);
        // "same.markdown" sorts before "same.md"
        assert_eq!(snapshot.post("same").unwrap().meta.title, "Later");
        assert!(snapshot.post("other").is_some());
    }

    #[test]
    fn test_drafts_are_skipped() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "blog/live.md", &post("Live", "2024-01-01", ""));
        write(root, "blog/wip.md", "---\ntitle: WIP\ndraft: true\n---\n");

        let snapshot = load_snapshot(root).unwrap();
        assert!(snapshot.post("live").is_some());
        assert!(snapshot.post("wip").is_none());
    }

    #[test]
    fn test_projects_from_toml_front_matter() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(
            root,
            "projects/folio.md",
            "+++\ntitle = \"Folio\"\ndate = 2024-05-01\nfeatured = true\n+++\nA tool.",
        );
        write(root, "projects/old.md", "---\ntitle: Old\ndate: 2019-01-01\n---\n");

        let snapshot = load_snapshot(root).unwrap();
        let order: Vec<_> = snapshot.projects().iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(order, vec!["folio", "old"]);
        assert_eq!(snapshot.featured_projects().count(), 1);
    }

    #[test]
    fn test_one_bad_document_aborts_and_store_keeps_previous() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        for i in 0..4 {
            write(root, &format!("blog/p{i}.md"), &post("Fine", "2024-01-01", ""));
        }

        let store = SnapshotStore::new();
        store.store(load_snapshot(root).unwrap());

        write(root, "blog/p9.md", "---\ntitle: [broken\n---\n");
        let err = load_snapshot(root).unwrap_err();
        match err {
            LoadError::Document(path, ParseError::Yaml(_)) => assert!(path.ends_with("p9.md")),
            other => panic!("unexpected error: {other}"),
        }

        let current = store.load().unwrap();
        assert_eq!(current.generation(), 1);
        assert_eq!(current.posts().len(), 4);
    }

    #[test]
    fn test_structured_resume_preferred_over_markdown() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "resume/resume.yaml", "name: Jane\nsummary: \"*hi*\"\n");
        write(root, "resume/resume.md", "# Old resume\n");

        let snapshot = load_snapshot(root).unwrap();
        match snapshot.resume().unwrap() {
            Resume::Structured(doc) => {
                assert_eq!(doc.name, "Jane");
                assert_eq!(doc.summary, "<em>hi</em>");
            }
            other => panic!("expected structured resume, got {other:?}"),
        }
    }

    #[test]
    fn test_legacy_markdown_resume() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "resume/resume.md", "---\ntitle: Resume\n---\n# Experience\n");

        let snapshot = load_snapshot(root).unwrap();
        match snapshot.resume().unwrap() {
            Resume::Markdown { content } => assert!(content.contains("Experience</h1>")),
            other => panic!("expected markdown resume, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_resume_fails_load() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "resume/resume.yml", "experience: [unclosed");

        let err = load_snapshot(root).unwrap_err();
        assert!(matches!(err, LoadError::Document(_, ParseError::Resume(_))));
    }
}
