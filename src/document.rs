//! Defines the [`Document`] type and the [`index`] function which validates
//! the [`RawDocument`]s a content store returns and sorts them into an
//! [`OrderedDocuments`] sequence. Every later stage of the pipeline works off
//! that sequence and never sees raw records.

use crate::store::RawDocument;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use std::collections::{HashMap, HashSet};
use std::ops::Deref;

/// How long a document takes to read.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReadingTime {
    pub minutes: u32,

    /// The display text, e.g. `4 min read`.
    pub text: String,
}

impl ReadingTime {
    /// Builds a [`ReadingTime`] from its display text. The minutes are the
    /// leading number of the text, or zero if there is none.
    pub fn from_text(text: &str) -> ReadingTime {
        ReadingTime {
            minutes: text
                .split_whitespace()
                .next()
                .and_then(|word| word.parse().ok())
                .unwrap_or(0),
            text: text.to_owned(),
        }
    }
}

/// One authored content item, validated and ready for the pipeline.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    /// Opaque identifier, unique within the build.
    pub id: String,

    /// The routable path of the document, e.g. `/hello-world/`. Unique within
    /// the build.
    pub slug: String,

    pub title: String,
    pub date: DateTime<Utc>,

    /// The document's tags in authored order, without duplicates.
    pub tags: Vec<String>,

    pub excerpt: String,
    pub rendered_body: String,
    pub reading_time: ReadingTime,
}

impl Document {
    /// Returns `true` if the document is tagged with `tag` (case-sensitive).
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// The full set of [`Document`]s for a build, sorted oldest first. Documents
/// with equal dates keep the order in which the store returned them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OrderedDocuments(Vec<Document>);

impl OrderedDocuments {
    /// Sorts already-validated documents oldest first, keeping ties in their
    /// given order. [`index`] is the usual way to build the sequence.
    pub fn new(mut documents: Vec<Document>) -> OrderedDocuments {
        // `sort_by` is stable; ties must keep store order.
        documents.sort_by(|a, b| a.date.cmp(&b.date));
        OrderedDocuments(documents)
    }

    /// Returns the documents newest first. Documents with equal dates keep
    /// their store order, so this is not simply the reverse of the sequence.
    pub fn newest_first(&self) -> Vec<&Document> {
        let mut documents: Vec<&Document> = self.0.iter().collect();
        documents.sort_by(|a, b| b.date.cmp(&a.date));
        documents
    }
}

impl Deref for OrderedDocuments {
    type Target = [Document];

    fn deref(&self) -> &[Document] {
        &self.0
    }
}

/// Validates raw records and sorts them by date, oldest first. The sort is
/// stable: records with equal dates stay in the order the store returned them.
/// Fails on the first record that has no resolvable slug, lacks a date or
/// tags, or clashes with an earlier record's id or slug.
pub fn index(raw_documents: Vec<RawDocument>) -> Result<OrderedDocuments> {
    let mut ids: HashSet<String> = HashSet::with_capacity(raw_documents.len());
    let mut slugs: HashMap<String, String> = HashMap::with_capacity(raw_documents.len());
    let mut documents = Vec::with_capacity(raw_documents.len());

    for raw in raw_documents {
        let document = convert(raw)?;
        if !ids.insert(document.id.clone()) {
            return Err(Error::DuplicateId { id: document.id });
        }
        if let Some(first) = slugs.insert(document.slug.clone(), document.id.clone()) {
            return Err(Error::DuplicateSlug {
                slug: document.slug,
                first,
                second: document.id,
            });
        }
        documents.push(document);
    }

    Ok(OrderedDocuments::new(documents))
}

fn convert(raw: RawDocument) -> Result<Document> {
    let slug = match raw.slug.as_deref().map(str::trim) {
        Some(slug) if !slug.is_empty() => match slug.starts_with('/') {
            true => slug.to_owned(),
            false => {
                return Err(Error::SlugResolution {
                    id: raw.id,
                    path: slug.to_owned(),
                })
            }
        },
        _ => slug_from_source_path(&raw.source_path).ok_or_else(|| Error::SlugResolution {
            id: raw.id.clone(),
            path: raw.source_path.clone(),
        })?,
    };

    let date = match raw.date.as_deref() {
        Some(date) => parse_date(date).map_err(|err| Error::InvalidDate {
            id: raw.id.clone(),
            value: date.to_owned(),
            err,
        })?,
        None => {
            return Err(Error::MissingRequiredField {
                id: raw.id,
                field: "date",
            })
        }
    };

    let tags = match raw.tags {
        Some(tags) => dedupe_tags(tags),
        None => {
            return Err(Error::MissingRequiredField {
                id: raw.id,
                field: "tags",
            })
        }
    };

    Ok(Document {
        title: match raw.title {
            Some(title) if !title.trim().is_empty() => title,
            _ => slug.clone(),
        },
        id: raw.id,
        slug,
        date,
        tags,
        excerpt: raw.excerpt,
        rendered_body: raw.rendered_body,
        reading_time: ReadingTime::from_text(&raw.reading_time_text),
    })
}

// Trims tags, drops blank ones and keeps the first occurrence of each.
fn dedupe_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(tags.len());
    tags.into_iter()
        .map(|tag| tag.trim().to_owned())
        .filter(|tag| !tag.is_empty() && seen.insert(tag.clone()))
        .collect()
}

/// Parses a document date. Accepts a bare `YYYY-MM-DD` date (taken as UTC
/// midnight) or a full RFC 3339 timestamp.
pub fn parse_date(input: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    let input = input.trim();
    match NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        Ok(date) => Ok(Utc.from_utc_datetime(&date.and_time(NaiveTime::default()))),
        Err(_) => DateTime::parse_from_rfc3339(input).map(|date| date.with_timezone(&Utc)),
    }
}

/// Derives a slug from a source path relative to the content root. The
/// extension is dropped, as is an `index` file stem, so that both
/// `hello/index.md` and `hello.md` become `/hello/`. Returns `None` if nothing
/// routable remains (e.g. for a root `index.md`) or the path escapes the root.
pub fn slug_from_source_path(path: &str) -> Option<String> {
    let normalized = path.replace('\\', "/");
    let mut segments: Vec<&str> = normalized
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();
    if segments.contains(&"..") {
        return None;
    }

    let file_name = segments.pop()?;
    let stem = match file_name.rfind('.') {
        Some(i) => &file_name[..i],
        None => file_name,
    };
    if !stem.is_empty() && stem != "index" {
        segments.push(stem);
    }

    match segments.is_empty() {
        true => None,
        false => Some(format!("/{}/", segments.join("/"))),
    }
}

/// Represents the result of indexing documents.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a malformed document. Each variant names the offending document.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when no slug can be derived for a document.
    #[error("document `{id}`: cannot resolve a slug from `{path}`")]
    SlugResolution { id: String, path: String },

    /// Returned when a document lacks a field the pipeline depends on.
    #[error("document `{id}`: missing required field `{field}`")]
    MissingRequiredField { id: String, field: &'static str },

    /// Returned when a document's date is neither `YYYY-MM-DD` nor RFC 3339.
    #[error("document `{id}`: invalid date `{value}`: {err}")]
    InvalidDate {
        id: String,
        value: String,
        #[source]
        err: chrono::ParseError,
    },

    /// Returned when two documents share an id.
    #[error("duplicate document id `{id}`")]
    DuplicateId { id: String },

    /// Returned when two documents resolve to the same slug.
    #[error("documents `{first}` and `{second}` both resolve to slug `{slug}`")]
    DuplicateSlug {
        slug: String,
        first: String,
        second: String,
    },
}
