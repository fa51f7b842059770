//! Derives one [`FeedSpec`] per feed scope: the global feed over every
//! document and one feed per [`Tag`]. A spec carries its filter, sort order
//! and entry mapping as plain values, so selecting a feed's documents can be
//! tested without producing any XML; [`crate::syndication`] does the
//! serialization.

use crate::document::{Document, OrderedDocuments};
use crate::store::SortOrder;
use crate::tag::Tag;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use url::Url;

/// The output path of the global feed.
pub const GLOBAL_FEED_PATH: &str = "/rss.xml";

/// The default title template for tag feeds. `{tag}` is replaced by the tag in
/// its original casing.
pub const DEFAULT_TAG_FEED_TITLE: &str = "{tag} related content";

/// Selects which documents populate a feed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeedScope {
    /// Every document.
    Global,

    /// Documents carrying the tag (case-sensitive).
    Tag(String),
}

impl FeedScope {
    /// The filter predicate of the scope.
    pub fn matches(&self, document: &Document) -> bool {
        match self {
            FeedScope::Global => true,
            FeedScope::Tag(tag) => document.has_tag(tag),
        }
    }
}

/// Titles used when composing feeds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedSettings {
    /// The title of the global feed.
    pub title: String,

    /// The title template of tag feeds, see [`DEFAULT_TAG_FEED_TITLE`].
    pub tag_title: String,
}

impl FeedSettings {
    fn tag_feed_title(&self, tag: &str) -> String {
        self.tag_title.replace("{tag}", tag)
    }
}

/// Everything needed to produce one feed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedSpec {
    pub scope: FeedScope,
    pub output_path: String,
    pub title: String,
    pub sort: SortOrder,
}

impl FeedSpec {
    /// Applies the spec's filter and sort order to the full document sequence.
    pub fn select<'a>(&self, documents: &'a OrderedDocuments) -> Vec<&'a Document> {
        let ordered: Vec<&Document> = match self.sort {
            SortOrder::DateDescending => documents.newest_first(),
            SortOrder::DateAscending => documents.iter().collect(),
        };
        ordered
            .into_iter()
            .filter(|document| self.scope.matches(document))
            .collect()
    }

    /// Maps a document to its feed entry.
    pub fn entry(&self, document: &Document, site_url: &Url) -> FeedEntry {
        let url = document_url(site_url, &document.slug);
        FeedEntry {
            title: document.title.clone(),
            description: document.excerpt.clone(),
            date: document.date,
            guid: url.clone(),
            url,
            content_encoded: document.rendered_body.clone(),
        }
    }

    /// Selects the spec's documents and maps each to a [`FeedEntry`].
    pub fn entries(&self, documents: &OrderedDocuments, site_url: &Url) -> Vec<FeedEntry> {
        self.select(documents)
            .into_iter()
            .map(|document| self.entry(document, site_url))
            .collect()
    }
}

/// One item of a feed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,

    /// The document's excerpt.
    pub description: String,

    pub date: DateTime<Utc>,

    /// The absolute URL of the document page.
    pub url: String,

    /// Same as `url`.
    pub guid: String,

    /// The document's rendered body.
    pub content_encoded: String,
}

/// Joins the site URL and a slug without doubling the slash between them.
pub fn document_url(site_url: &Url, slug: &str) -> String {
    format!(
        "{}/{}",
        site_url.as_str().trim_end_matches('/'),
        slug.trim_start_matches('/')
    )
}

/// The output path of a tag's feed, `/{lowercase(tag)}.xml`.
pub fn tag_feed_path(tag: &str) -> String {
    format!("/{}.xml", tag.to_lowercase())
}

/// Composes the global feed spec followed by one spec per tag, in the order
/// of `tags`. Every feed is sorted newest first. Fails if two feeds would be
/// written to the same path, e.g. for the tags `Go` and `go`.
pub fn compose(
    documents: &OrderedDocuments,
    tags: &[Tag],
    settings: &FeedSettings,
) -> Result<Vec<FeedSpec>> {
    let mut specs = Vec::with_capacity(tags.len() + 1);
    specs.push(FeedSpec {
        scope: FeedScope::Global,
        output_path: GLOBAL_FEED_PATH.to_owned(),
        title: settings.title.clone(),
        sort: SortOrder::DateDescending,
    });
    for tag in tags {
        specs.push(FeedSpec {
            scope: FeedScope::Tag(tag.name.clone()),
            output_path: tag_feed_path(&tag.name),
            title: settings.tag_feed_title(&tag.name),
            sort: SortOrder::DateDescending,
        });
    }

    let mut owners: HashMap<&str, &FeedScope> = HashMap::with_capacity(specs.len());
    for spec in &specs {
        if let Some(first) = owners.insert(&spec.output_path, &spec.scope) {
            return Err(Error::DuplicateFeedPath {
                path: spec.output_path.clone(),
                first: scope_label(first),
                second: scope_label(&spec.scope),
            });
        }
    }

    tracing::debug!(
        documents = documents.len(),
        feeds = specs.len(),
        "composed feed specs"
    );
    Ok(specs)
}

fn scope_label(scope: &FeedScope) -> String {
    match scope {
        FeedScope::Global => String::from("global"),
        FeedScope::Tag(tag) => format!("tag `{}`", tag),
    }
}

/// Represents the result of composing feeds.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem composing feeds.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when two feed scopes map to the same output path.
    #[error("{first} and {second} feeds both write to `{path}`")]
    DuplicateFeedPath {
        path: String,
        first: String,
        second: String,
    },
}
