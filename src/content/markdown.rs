//! Document parsing: front matter extraction and markdown rendering.
//!
//! A document is an optional front matter block followed by a markdown body:
//!
//! ```text
//! ---                      +++
//! title: Hello             title = "Hello"
//! date: 2024-01-15         date = 2024-01-15
//! ---                      +++
//!
//! Body in **markdown**.    Body in **markdown**.
//! ```
//!
//! `---` opens a YAML block and `+++` a TOML block; the same delimiter must
//! close it on its own line. Without a closing line the whole input is body.
//!
//! Rendering goes through `comrak` with GitHub-flavored extensions, heading
//! ids and syntect code highlighting. Raw HTML is passed through because the
//! content repository is trusted.

use super::error::ParseError;
use comrak::{Options, Plugins, markdown_to_html_with_plugins, plugins::syntect::SyntectAdapter};
use serde::de::DeserializeOwned;
use std::sync::LazyLock;

/// Syntax set and themes load once per process; every render borrows them.
static HIGHLIGHTER: LazyLock<SyntectAdapter> =
    LazyLock::new(|| SyntectAdapter::new(Some("base16-ocean.dark")));

// ============================================================================
// Front Matter
// ============================================================================

/// Front matter dialect, chosen by the opening delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontMatterKind {
    Yaml,
    Toml,
}

impl FrontMatterKind {
    fn from_delimiter(line: &str) -> Option<Self> {
        match line {
            "---" => Some(Self::Yaml),
            "+++" => Some(Self::Toml),
            _ => None,
        }
    }
}

/// Raw front matter text, delimiters excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrontMatter<'a> {
    pub kind: FrontMatterKind,
    pub raw: &'a str,
}

impl FrontMatter<'_> {
    /// Decode into the metadata shape of one content kind.
    ///
    /// An empty block yields `M::default()`.
    pub fn decode<M: DeserializeOwned + Default>(&self) -> Result<M, ParseError> {
        if self.raw.trim().is_empty() {
            return Ok(M::default());
        }
        match self.kind {
            FrontMatterKind::Yaml => serde_yaml::from_str(self.raw).map_err(ParseError::Yaml),
            FrontMatterKind::Toml => toml::from_str(self.raw).map_err(ParseError::Toml),
        }
    }
}

/// Split a document into its front matter (if any) and body.
pub fn split_front_matter(src: &str) -> (Option<FrontMatter<'_>>, &str) {
    let src = src.strip_prefix('\u{feff}').unwrap_or(src);

    let Some((first, rest)) = src.split_once('\n') else {
        return (None, src);
    };
    let delimiter = first.trim_end();
    let Some(kind) = FrontMatterKind::from_delimiter(delimiter) else {
        return (None, src);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == delimiter {
            let front = FrontMatter {
                kind,
                raw: &rest[..offset],
            };
            return (Some(front), &rest[offset + line.len()..]);
        }
        offset += line.len();
    }

    (None, src)
}

// ============================================================================
// Parsing
// ============================================================================

/// Parse one raw document into `(metadata, rendered body)`.
///
/// Missing front matter is not an error: the metadata is `M::default()`.
/// Front matter that is present but does not fit `M` fails the document.
pub fn parse_document<M: DeserializeOwned + Default>(
    bytes: &[u8],
) -> Result<(M, String), ParseError> {
    let text = std::str::from_utf8(bytes)?;
    let (front, body) = split_front_matter(text);

    let meta = match front {
        Some(front) => front.decode()?,
        None => M::default(),
    };

    Ok((meta, render_markdown(body)))
}

// ============================================================================
// Rendering
// ============================================================================

fn configure(options: &mut Options) {
    options.extension.table = true;
    options.extension.strikethrough = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.footnotes = true;
    options.extension.header_ids = Some(String::new());
    options.render.unsafe_ = true;
}

/// Render a markdown body to HTML.
pub fn render_markdown(src: &str) -> String {
    let mut options = Options::default();
    configure(&mut options);

    let mut plugins = Plugins::default();
    plugins.render.codefence_syntax_highlighter = Some(&*HIGHLIGHTER);

    markdown_to_html_with_plugins(src, &options, &plugins)
}

/// Render a short fragment for use inside a larger HTML structure.
///
/// Paragraph wrappers are stripped so `**Rust** developer` becomes
/// `<strong>Rust</strong> developer`. Empty input never reaches the renderer.
pub fn render_inline(src: &str) -> String {
    if src.is_empty() {
        return String::new();
    }
    let html = render_markdown(src);
    html.trim()
        .replace("<p>", "")
        .replace("</p>", "")
        .trim()
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::types::{PostMeta, ProjectMeta};
    use crate::utils::date::DateTimeUtc;

    #[test]
    fn test_split_yaml_front_matter() {
        let src = "---\ntitle: Hi\n---\n\nBody\n";
        let (front, body) = split_front_matter(src);
        let front = front.unwrap();

        assert_eq!(front.kind, FrontMatterKind::Yaml);
        assert_eq!(front.raw, "title: Hi\n");
        assert_eq!(body, "\nBody\n");
    }

    #[test]
    fn test_split_toml_front_matter_crlf() {
        let src = "+++\r\ntitle = \"Hi\"\r\n+++\r\nBody";
        let (front, body) = split_front_matter(src);

        assert_eq!(front.unwrap().kind, FrontMatterKind::Toml);
        assert_eq!(body, "Body");
    }

    #[test]
    fn test_split_without_front_matter() {
        let src = "# Title\n\n---\n\ntext";
        let (front, body) = split_front_matter(src);
        assert!(front.is_none());
        assert_eq!(body, src);
    }

    #[test]
    fn test_split_unclosed_is_body() {
        let src = "---\ntitle: never closed\n";
        let (front, body) = split_front_matter(src);
        assert!(front.is_none());
        assert_eq!(body, src);
    }

    #[test]
    fn test_split_strips_bom_and_handles_closing_at_eof() {
        let (front, body) = split_front_matter("\u{feff}---\n---");
        assert_eq!(front.unwrap().raw, "");
        assert_eq!(body, "");
    }

    #[test]
    fn test_parse_document_recovers_metadata() {
        let src = "---\ntitle: Test\ndate: 2024-01-01\ndescription: A test\ntags: [a, b]\n---\n\n# Heading\n\nParagraph with **bold**.\n";
        let (meta, html): (PostMeta, _) = parse_document(src.as_bytes()).unwrap();

        assert_eq!(meta.title, "Test");
        assert_eq!(meta.date, Some(DateTimeUtc::from_ymd(2024, 1, 1)));
        assert_eq!(meta.description, "A test");
        assert_eq!(meta.tags, vec!["a", "b"]);
        assert!(!meta.draft);
        assert!(html.contains("<h1"));
        assert!(html.contains("<strong>bold</strong>"));
        assert!(!html.contains("title: Test"));
    }

    #[test]
    fn test_parse_document_toml_project() {
        let src = "+++\ntitle = \"Tool\"\ndate = 2023-05-02\nfeatured = true\nstatus = \"active\"\n+++\nBody";
        let (meta, _): (ProjectMeta, _) = parse_document(src.as_bytes()).unwrap();

        assert_eq!(meta.title, "Tool");
        assert_eq!(meta.date, Some(DateTimeUtc::from_ymd(2023, 5, 2)));
        assert!(meta.featured);
        assert_eq!(meta.status, "active");
    }

    #[test]
    fn test_parse_document_without_front_matter_is_default() {
        let (meta, html): (PostMeta, _) = parse_document(b"Just text.").unwrap();
        assert_eq!(meta, PostMeta::default());
        assert!(html.contains("Just text."));
    }

    #[test]
    fn test_parse_document_empty_front_matter_is_default() {
        let (meta, _): (ProjectMeta, _) = parse_document(b"---\n---\nBody").unwrap();
        assert_eq!(meta, ProjectMeta::default());
    }

    #[test]
    fn test_parse_document_malformed_front_matter() {
        let src = "---\ntitle: [unclosed\n---\nBody";
        let err = parse_document::<PostMeta>(src.as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::Yaml(_)));
    }

    #[test]
    fn test_parse_document_wrong_shape() {
        let src = "---\ntags: not-a-list-but-a-map: 1\n---\n";
        assert!(parse_document::<PostMeta>(src.as_bytes()).is_err());

        let src = "---\ndate: someday\n---\n";
        assert!(parse_document::<PostMeta>(src.as_bytes()).is_err());
    }

    #[test]
    fn test_parse_document_invalid_utf8() {
        let err = parse_document::<PostMeta>(&[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, ParseError::Utf8(_)));
    }

    #[test]
    fn test_render_markdown_gfm() {
        let html = render_markdown("| a | b |\n|---|---|\n| 1 | 2 |\n\n~~gone~~ https://example.com\n");
        assert!(html.contains("<table>"));
        assert!(html.contains("<del>gone</del>"));
        assert!(html.contains("<a href=\"https://example.com\">"));
    }

    #[test]
    fn test_render_markdown_heading_ids() {
        let html = render_markdown("## Getting Started\n");
        assert!(html.contains("id=\"getting-started\""));
    }

    #[test]
    fn test_render_markdown_highlights_code() {
        let html = render_markdown("```rust\nfn main() {}\n```\n");
        assert!(html.contains("<pre"));
        assert!(html.contains("style="));
    }

    #[test]
    fn test_render_markdown_raw_html_passthrough() {
        let html = render_markdown("<div class=\"note\">hi</div>\n");
        assert!(html.contains("<div class=\"note\">hi</div>"));
    }

    #[test]
    fn test_render_inline_strips_paragraphs() {
        assert_eq!(
            render_inline("**Rust** developer"),
            "<strong>Rust</strong> developer"
        );
    }

    #[test]
    fn test_render_inline_empty() {
        assert_eq!(render_inline(""), "");
    }
}
