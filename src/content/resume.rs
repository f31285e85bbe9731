//! Structured résumé document.
//!
//! `resume/resume.yaml` holds the whole document. Every free-text field is
//! markdown and gets an inline HTML rendering next to its raw text once the
//! YAML is decoded:
//!
//! ```yaml
//! name: Jane Doe
//! summary: "**Rust** developer"
//! experience:
//!   - title: Engineer
//!     organization: Acme
//!     start: { year: 2015, month: 9 }
//!     end: { year: 2020, month: 4 }
//!     bullets:
//!       - Shipped things
//!       - text: Led team
//!         sub:
//!           - text: Deep nested
//!             sub: [Level 3]
//! ```

use super::error::ParseError;
use super::markdown::render_inline;
use serde::Deserialize;
use serde::de::{self, Deserializer, IgnoredAny, MapAccess, Visitor};
use std::fmt;

/// A loaded résumé in either supported form.
#[derive(Debug, Clone, PartialEq)]
pub enum Resume {
    Structured(ResumeDocument),
    /// Legacy single-page `resume/resume.md`, rendered like any document.
    Markdown { content: String },
}

impl Resume {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Structured(_) => "structured",
            Self::Markdown { .. } => "markdown",
        }
    }
}

// ============================================================================
// Document
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ResumeDocument {
    pub name: String,
    pub tagline: String,
    #[serde(rename = "summary")]
    pub raw_summary: String,
    #[serde(skip)]
    pub summary: String,

    pub experience: Vec<ResumeEntry>,
    pub education: Vec<ResumeEntry>,
    pub skills: Vec<ResumeSkill>,
    pub research: Vec<ResumeEntry>,
    pub awards: Vec<String>,
    pub presentations: Vec<Presentation>,
    pub publications: Vec<PublicationSection>,
    #[serde(rename = "opensource")]
    pub open_source: Vec<OpenSourceSection>,
}

impl ResumeDocument {
    /// Decode a YAML résumé and fill every rendered field.
    pub fn from_yaml(bytes: &[u8]) -> Result<Self, ParseError> {
        let mut doc = if bytes.iter().all(u8::is_ascii_whitespace) {
            Self::default()
        } else {
            serde_yaml::from_slice::<Self>(bytes).map_err(ParseError::Resume)?
        };
        doc.render();
        Ok(doc)
    }

    fn render(&mut self) {
        self.summary = render_inline(&self.raw_summary);

        for entry in self
            .experience
            .iter_mut()
            .chain(&mut self.education)
            .chain(&mut self.research)
        {
            entry.render();
        }

        for talk in &mut self.presentations {
            talk.venue = render_inline(&talk.raw_venue);
            talk.date_formatted = talk.date.to_string();
        }

        for section in &mut self.publications {
            section.items = section.raw_items.iter().map(|s| render_inline(s)).collect();
        }

        for project in self.open_source.iter_mut().flat_map(|s| &mut s.projects) {
            project.bullets = project.raw_bullets.iter().map(|s| render_inline(s)).collect();
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ResumeEntry {
    pub title: String,
    pub organization: String,
    pub location: String,
    pub start: ResumeDate,
    pub end: Option<ResumeDate>,
    pub note: String,
    pub bullets: Vec<Bullet>,
    #[serde(skip)]
    pub date_range: String,
}

impl ResumeEntry {
    fn render(&mut self) {
        self.date_range = DateRange::new(self.start, self.end).to_string();
        render_bullets(&mut self.bullets);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ResumeSkill {
    pub category: String,
    pub detail: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Presentation {
    pub title: String,
    #[serde(rename = "venue")]
    pub raw_venue: String,
    #[serde(skip)]
    pub venue: String,
    pub date: ResumeDate,
    #[serde(skip)]
    pub date_formatted: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PublicationSection {
    pub section: String,
    #[serde(rename = "items")]
    pub raw_items: Vec<String>,
    #[serde(skip)]
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct OpenSourceSection {
    pub section: String,
    pub projects: Vec<OpenSourceProject>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct OpenSourceProject {
    pub name: String,
    pub tagline: String,
    #[serde(rename = "bullets")]
    pub raw_bullets: Vec<String>,
    #[serde(skip)]
    pub bullets: Vec<String>,
    pub links: Vec<ResumeLink>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ResumeLink {
    pub text: String,
    pub url: String,
}

// ============================================================================
// Dates
// ============================================================================

const SHORT_MONTHS: [&str; 12] = [
    "Jan.", "Feb.", "Mar.", "Apr.", "May", "June", "July", "Aug.", "Sept.", "Oct.", "Nov.", "Dec.",
];

/// Year with an optional month. Months outside 1..=12 render as year only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ResumeDate {
    #[serde(default)]
    pub year: i64,
    #[serde(default)]
    pub month: Option<i64>,
}

impl ResumeDate {
    pub const fn new(year: i64, month: Option<i64>) -> Self {
        Self { year, month }
    }

    fn month_name(&self) -> Option<&'static str> {
        match self.month {
            Some(m @ 1..=12) => Some(SHORT_MONTHS[m as usize - 1]),
            _ => None,
        }
    }
}

impl fmt::Display for ResumeDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.month_name() {
            Some(month) => write!(f, "{month} {}", self.year),
            None => write!(f, "{}", self.year),
        }
    }
}

/// `"<start> – <end>"`, or `"<start> – Present"` for an open range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: ResumeDate,
    pub end: Option<ResumeDate>,
}

impl DateRange {
    pub const fn new(start: ResumeDate, end: Option<ResumeDate>) -> Self {
        Self { start, end }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.end {
            Some(end) => write!(f, "{} – {end}", self.start),
            None => write!(f, "{} – Present", self.start),
        }
    }
}

// ============================================================================
// Bullets
// ============================================================================

/// A résumé bullet with arbitrarily nested children.
///
/// In YAML a bullet is either a scalar (its text) or a map with `text` and an
/// optional `sub` list of further bullets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bullet {
    pub raw: String,
    pub html: String,
    pub sub: Vec<Bullet>,
}

impl Bullet {
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            ..Self::default()
        }
    }

    /// Nesting depth of this subtree; a leaf is 1.
    pub fn depth(&self) -> usize {
        1 + self.sub.iter().map(Self::depth).max().unwrap_or(0)
    }
}

/// Fill `html` for every bullet in the tree, keeping order.
pub fn render_bullets(bullets: &mut [Bullet]) {
    for bullet in bullets {
        bullet.html = render_inline(&bullet.raw);
        render_bullets(&mut bullet.sub);
    }
}

impl<'de> Deserialize<'de> for Bullet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(BulletVisitor)
    }
}

struct BulletVisitor;

impl<'de> Visitor<'de> for BulletVisitor {
    type Value = Bullet;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a bullet string or a map with `text` and `sub`")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Bullet, E> {
        Ok(Bullet::new(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Bullet, E> {
        Ok(Bullet::new(v))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Bullet, E> {
        Ok(Bullet::new(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Bullet, E> {
        Ok(Bullet::new(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Bullet, E> {
        Ok(Bullet::new(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Bullet, E> {
        Ok(Bullet::new(v.to_string()))
    }

    /// `- ` with nothing after it.
    fn visit_unit<E: de::Error>(self) -> Result<Bullet, E> {
        Ok(Bullet::default())
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Bullet, A::Error> {
        let mut bullet = Bullet::default();
        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "text" => bullet.raw = map.next_value::<Option<String>>()?.unwrap_or_default(),
                "sub" => bullet.sub = map.next_value::<Option<Vec<Bullet>>>()?.unwrap_or_default(),
                _ => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }
        Ok(bullet)
    }
}
