//! Project records: header parsing, loading, ordering and filtering.
//!
//! A source is a markdown file whose header is fenced by `---` lines:
//!
//! ```text
//! ---
//! title: "Pixel Drift"
//! type: game
//! date: 2024-03-01
//! technologies: [TypeScript, PixiJS]
//! links:
//!   play: "https://example.com"
//! ---
//! Body text...
//! ```
//!
//! Everything here is pure except [`load_all`], which reads the directory.

use std::borrow::Borrow;
use std::fmt;
use std::path::{Path, PathBuf};

use smallvec::SmallVec;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("cannot read project directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Game,
    Coding,
}

impl Category {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "game" | "games" => Some(Category::Game),
            "coding" | "code" => Some(Category::Coding),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Game => "game",
            Category::Coding => "coding",
        }
    }

    /// Locale key of the short badge label.
    pub fn badge_key(self) -> &'static str {
        match self {
            Category::Game => "category_game",
            Category::Coding => "category_coding",
        }
    }

    /// Locale key of the modal meta-line label.
    pub fn meta_key(self) -> &'static str {
        match self {
            Category::Game => "meta_game",
            Category::Coding => "meta_coding",
        }
    }
}

/// Calendar date from a `YYYY-MM-DD` header value. Orders chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Date {
    pub year: i32,
    pub month: u8,
    pub day: u8,
}

const MONTHS_EN: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

const MONTHS_IT: [&str; 12] = [
    "gennaio", "febbraio", "marzo", "aprile", "maggio", "giugno", "luglio", "agosto",
    "settembre", "ottobre", "novembre", "dicembre",
];

impl Date {
    /// Parse `YYYY-MM-DD`, ignoring any `T...` time suffix.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let s = s.split_once('T').map_or(s, |(d, _)| d);
        let mut parts = s.splitn(3, '-');
        let year: i32 = parts.next()?.parse().ok()?;
        let month: u8 = parts.next()?.parse().ok()?;
        let day: u8 = parts.next()?.parse().ok()?;
        if !(1..=12).contains(&month) || day == 0 || day > days_in_month(year, month) {
            return None;
        }
        Some(Self { year, month, day })
    }

    /// Long form in the given locale: "March 1, 2024" or "1 marzo 2024".
    pub fn format_long(&self, locale: &str) -> String {
        let idx = usize::from(self.month.clamp(1, 12) - 1);
        match locale {
            "it" => format!("{} {} {}", self.day, MONTHS_IT[idx], self.year),
            _ => format!("{} {}, {}", MONTHS_EN[idx], self.day, self.year),
        }
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

fn days_in_month(year: i32, month: u8) -> u8 {
    match month {
        2 if (year % 4 == 0 && year % 100 != 0) || year % 400 == 0 => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// One entry of a `links:` block, e.g. `source: https://...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub kind: String,
    pub url: String,
}

impl Link {
    /// Kind with its first letter capitalized ("source" -> "Source").
    pub fn label(&self) -> String {
        let mut chars = self.kind.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frontmatter {
    pub title: String,
    pub category: Option<Category>,
    pub genre: Option<String>,
    pub platform: Option<String>,
    pub date: Option<Date>,
    /// From `technologies:` or `tags:`, in header order.
    pub tags: SmallVec<[String; 4]>,
    pub links: Vec<Link>,
    pub image: Option<String>,
    pub featured: bool,
}

/// One loaded project. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectRecord {
    /// Source file stem; unique within a load.
    pub slug: String,
    pub meta: Frontmatter,
    pub body: String,
}

impl ProjectRecord {
    /// Title, or the slug when the header had none.
    pub fn display_title(&self) -> &str {
        if self.meta.title.is_empty() {
            &self.slug
        } else {
            &self.meta.title
        }
    }
}

/// Category selection applied to the shelf.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Filter {
    #[default]
    All,
    Games,
    Coding,
}

impl Filter {
    pub const ALL: [Filter; 3] = [Filter::All, Filter::Games, Filter::Coding];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "all" => Some(Filter::All),
            "games" => Some(Filter::Games),
            "coding" => Some(Filter::Coding),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Filter::All => "all",
            Filter::Games => "games",
            Filter::Coding => "coding",
        }
    }

    pub fn label_key(self) -> &'static str {
        match self {
            Filter::All => "filter_all",
            Filter::Games => "filter_games",
            Filter::Coding => "filter_coding",
        }
    }

    pub fn matches(self, category: Option<Category>) -> bool {
        match self {
            Filter::All => true,
            Filter::Games => category == Some(Category::Game),
            Filter::Coding => category == Some(Category::Coding),
        }
    }
}

/// Problems found while reading a header. The record is still produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderIssue {
    #[error("no `---` fenced header; whole file used as body")]
    MissingFence,
    #[error("header has no title")]
    MissingTitle,
    #[error("header has no date")]
    MissingDate,
    #[error("unparseable date {0:?}")]
    BadDate(String),
    #[error("header has no type")]
    MissingCategory,
    #[error("unknown type {0:?}")]
    UnknownCategory(String),
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse one source into a record plus any header diagnostics.
pub fn parse_source(slug: &str, raw: &str) -> (ProjectRecord, Vec<HeaderIssue>) {
    let text = raw.replace("\r\n", "\n");
    let mut issues = Vec::new();

    let (meta, body) = match split_header(&text) {
        Some((header, body)) => (parse_header(header, &mut issues), body.to_string()),
        None => {
            issues.push(HeaderIssue::MissingFence);
            (Frontmatter::default(), text.clone())
        }
    };

    let record = ProjectRecord {
        slug: slug.to_string(),
        meta,
        body,
    };
    (record, issues)
}

/// Split `---\n<header>\n---\n<body>`. The body may be empty.
fn split_header(text: &str) -> Option<(&str, &str)> {
    let rest = text.strip_prefix("---\n")?;
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches('\n') == "---" {
            let header = rest[..offset].trim_end_matches('\n');
            let body = &rest[offset + line.len()..];
            return Some((header, body));
        }
        offset += line.len();
    }
    None
}

fn parse_header(header: &str, issues: &mut Vec<HeaderIssue>) -> Frontmatter {
    let mut meta = Frontmatter::default();
    let mut saw_date = false;
    let mut saw_category = false;
    let mut in_links = false;

    for line in header.lines() {
        // Lines without a colon carry nothing.
        let Some((raw_key, raw_value)) = line.split_once(':') else {
            continue;
        };
        let key = raw_key.trim();
        let value = raw_value.trim();
        let indented = line.starts_with("  ") || line.starts_with('\t');

        if in_links && indented {
            if !value.is_empty() {
                meta.links.push(Link {
                    kind: key.to_string(),
                    url: unquote(value).to_string(),
                });
            }
            continue;
        }
        in_links = false;

        match key {
            "title" => meta.title = unquote(value).to_string(),
            "type" | "category" => {
                saw_category = true;
                let value = unquote(value);
                meta.category = Category::parse(value);
                if meta.category.is_none() {
                    issues.push(HeaderIssue::UnknownCategory(value.to_string()));
                }
            }
            "genre" => meta.genre = non_empty(unquote(value)),
            "platform" => meta.platform = non_empty(unquote(value)),
            "date" => {
                saw_date = true;
                let value = unquote(value);
                meta.date = Date::parse(value);
                if meta.date.is_none() {
                    issues.push(HeaderIssue::BadDate(value.to_string()));
                }
            }
            "technologies" | "tags" => meta.tags = parse_list(value).collect(),
            "links" => in_links = value.is_empty(),
            "image" => meta.image = non_empty(unquote(value)),
            "featured" => meta.featured = matches!(unquote(value), "true" | "yes"),
            _ => {}
        }
    }

    if meta.title.is_empty() {
        issues.push(HeaderIssue::MissingTitle);
    }
    if !saw_date {
        issues.push(HeaderIssue::MissingDate);
    }
    if !saw_category {
        issues.push(HeaderIssue::MissingCategory);
    }
    meta
}

/// `[a, "b", c]` (or a bare `a, b`) into trimmed, unquoted, non-empty items.
fn parse_list(value: &str) -> impl Iterator<Item = String> + '_ {
    let inner = value.strip_prefix('[').unwrap_or(value);
    let inner = inner.strip_suffix(']').unwrap_or(inner);
    inner
        .split(',')
        .map(|item| unquote(item.trim()))
        .filter(|item| !item.is_empty())
        .map(str::to_string)
}

/// Strip one pair of matching surrounding quotes.
fn unquote(value: &str) -> &str {
    for q in ['"', '\''] {
        if let Some(inner) = value.strip_prefix(q).and_then(|v| v.strip_suffix(q)) {
            return inner;
        }
    }
    value
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

// ---------------------------------------------------------------------------
// Loading, ordering, filtering
// ---------------------------------------------------------------------------

/// Read every `*.md` file in `dir`, in file-name order, and return the
/// records sorted newest first. Unreadable files are skipped with a
/// warning; header issues are logged.
pub fn load_all(dir: impl AsRef<Path>) -> Result<Vec<ProjectRecord>, ProjectError> {
    let dir = dir.as_ref();
    let read_err = |source| ProjectError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(read_err)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "md"))
        .collect();
    paths.sort();

    let mut records = Vec::with_capacity(paths.len());
    for path in paths {
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("skipping {}: {}", path.display(), e);
                continue;
            }
        };
        let Some(slug) = path.file_stem().and_then(|s| s.to_str()) else {
            log::warn!("skipping {}: file name is not valid UTF-8", path.display());
            continue;
        };
        let (record, issues) = parse_source(slug, &raw);
        for issue in &issues {
            log::warn!("{}: {}", path.display(), issue);
        }
        records.push(record);
    }

    sort_by_date(&mut records);
    log::info!("loaded {} project(s) from {}", records.len(), dir.display());
    Ok(records)
}

/// Newest first. Ties keep their current order; undated records go last.
pub fn sort_by_date<R: Borrow<ProjectRecord>>(records: &mut [R]) {
    records.sort_by(|a, b| {
        let (a, b) = (a.borrow().meta.date, b.borrow().meta.date);
        match (a, b) {
            (Some(a), Some(b)) => b.cmp(&a),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        }
    });
}

/// Order-preserving subsequence of `records` that `filter` admits.
pub fn filter<R: Borrow<ProjectRecord>>(records: &[R], filter: Filter) -> Vec<&R> {
    records
        .iter()
        .filter(|r| filter.matches(Borrow::<ProjectRecord>::borrow(*r).meta.category))
        .collect()
}
