//! Defines the [`ContentStore`] interface through which the pipeline receives
//! its documents, the [`RawDocument`] record it hands over, and an in-memory
//! [`MemoryStore`]. The markdown-on-disk implementation lives in
//! [`crate::parser`].

use crate::document::parse_date;
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::fmt;
use std::path::PathBuf;

/// A document as a content store holds it, before the
/// [`crate::document::index`] step has validated it. Fields the store could
/// not fill in are `None`; the index decides whether that is fatal.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawDocument {
    /// Opaque identifier, unique within the store.
    pub id: String,

    /// The document's location relative to the store root (e.g.
    /// `hello-world/index.md`). The slug is derived from it.
    pub source_path: String,

    /// An explicit slug, which overrides the one derived from `source_path`.
    pub slug: Option<String>,

    pub title: Option<String>,

    /// Either `YYYY-MM-DD` or an RFC 3339 timestamp.
    pub date: Option<String>,

    pub tags: Option<Vec<String>>,

    pub excerpt: String,

    pub rendered_body: String,

    /// Display text such as `4 min read`.
    pub reading_time_text: String,
}

impl RawDocument {
    /// Returns `true` if the record lists `tag` among its tags.
    pub fn has_tag(&self, tag: &str) -> bool {
        match &self.tags {
            Some(tags) => tags.iter().any(|t| t == tag),
            None => false,
        }
    }

    /// The record's date, if it has one that parses.
    fn parsed_date(&self) -> Option<DateTime<Utc>> {
        self.date.as_deref().and_then(|date| parse_date(date).ok())
    }
}

/// The order in which a [`ContentStore`] returns records.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    /// Oldest first.
    DateAscending,

    /// Newest first.
    DateDescending,
}

/// Narrows down the records a [`ContentStore::query`] returns. The default
/// query returns every record in store order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    /// Sorts records by date. Records without a valid date sort as the
    /// oldest.
    pub sort: Option<SortOrder>,

    /// Keeps only records carrying this tag.
    pub tag: Option<String>,

    /// Keeps at most this many records (applied after sorting).
    pub limit: Option<usize>,
}

/// The source of raw documents for a build.
pub trait ContentStore {
    fn query(&self, query: &Query) -> Result<Vec<RawDocument>>;
}

/// Applies a [`Query`] to a list of records that is already in store order.
/// Sorting compares parsed dates and is stable, so records with equal dates
/// keep their store order.
pub fn apply_query(mut records: Vec<RawDocument>, query: &Query) -> Vec<RawDocument> {
    if let Some(tag) = &query.tag {
        records.retain(|r| r.has_tag(tag));
    }
    match query.sort {
        Some(SortOrder::DateAscending) => records.sort_by_cached_key(RawDocument::parsed_date),
        Some(SortOrder::DateDescending) => {
            records.sort_by_cached_key(|r| Reverse(r.parsed_date()))
        }
        None => {}
    }
    if let Some(limit) = query.limit {
        records.truncate(limit);
    }
    records
}

/// A [`ContentStore`] over records held in memory. Store order is insertion
/// order.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    records: Vec<RawDocument>,
}

impl MemoryStore {
    pub fn new(records: Vec<RawDocument>) -> MemoryStore {
        MemoryStore { records }
    }
}

impl ContentStore for MemoryStore {
    fn query(&self, query: &Query) -> Result<Vec<RawDocument>> {
        Ok(apply_query(self.records.clone(), query))
    }
}

/// Represents the result of a [`ContentStore`] operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading documents from a [`ContentStore`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when a source file is missing its starting frontmatter fence
    /// (`---`).
    #[error("document must begin with `---`")]
    FrontmatterMissingStartFence,

    /// Returned when a source file is missing its terminal frontmatter fence
    /// (i.e., the starting fence was found but the ending one was missing).
    #[error("missing closing `---`")]
    FrontmatterMissingEndFence,

    /// Returned when there was an error parsing the frontmatter as YAML.
    #[error(transparent)]
    DeserializeYaml(#[from] serde_yaml::Error),

    /// Returned when a source path isn't valid UTF-8.
    #[error("invalid file name: {0:?}")]
    InvalidFileName(PathBuf),

    /// Returned for I/O errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Returned for WalkDir I/O errors.
    #[error(transparent)]
    WalkDir(#[from] walkdir::Error),

    /// An error with an annotation.
    #[error("{0}: {1}")]
    Annotated(String, Box<Error>),
}

impl Error {
    /// Wraps the error with a description of what was being done.
    pub fn annotate(self, annotation: impl fmt::Display) -> Error {
        Error::Annotated(annotation.to_string(), Box::new(self))
    }
}
