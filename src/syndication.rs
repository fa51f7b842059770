//! Serializes a [`FeedSpec`] into an RSS 2.0 or Atom document. The output
//! only depends on the documents, never on the wall clock: the channel's
//! build/updated date is the newest entry's date.

use crate::config::Site;
use crate::document::OrderedDocuments;
use crate::feed::{document_url, FeedEntry, FeedSpec};
use atom_syndication::{Content, Entry, Error as AtomError, Feed, FixedDateTime, Link, Text};
use chrono::{DateTime, Utc};
use rss::validation::{Validate, ValidationError};
use rss::{ChannelBuilder, GuidBuilder, Item, ItemBuilder};
use serde::Deserialize;
use std::collections::BTreeMap;

const CONTENT_NAMESPACE: &str = "http://purl.org/rss/1.0/modules/content/";
const GENERATOR: &str = "chronofeed";

/// The syndication format feeds are written in.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FeedFormat {
    /// RSS 2.0 with `content:encoded` bodies.
    #[default]
    Rss,

    /// Atom 1.0.
    Atom,
}

/// Renders feeds for a [`Site`].
pub struct FeedRenderer<'a> {
    site: &'a Site,
}

impl<'a> FeedRenderer<'a> {
    pub fn new(site: &'a Site) -> FeedRenderer<'a> {
        FeedRenderer { site }
    }

    /// Selects the spec's documents and renders them as a feed document in the
    /// site's [`FeedFormat`].
    pub fn render(&self, spec: &FeedSpec, documents: &OrderedDocuments) -> Result<String> {
        let entries = spec.entries(documents, &self.site.url);
        tracing::debug!(
            path = %spec.output_path,
            entries = entries.len(),
            "rendering feed"
        );
        match self.site.feed_format {
            FeedFormat::Rss => self.rss(spec, &entries),
            FeedFormat::Atom => self.atom(spec, &entries),
        }
    }

    fn rss(&self, spec: &FeedSpec, entries: &[FeedEntry]) -> Result<String> {
        let mut namespaces = BTreeMap::new();
        namespaces.insert("content".to_owned(), CONTENT_NAMESPACE.to_owned());

        let channel = ChannelBuilder::default()
            .title(spec.title.clone())
            .link(self.site.url.to_string())
            .description(self.site.description.clone())
            .generator(Some(GENERATOR.to_owned()))
            .last_build_date(newest(entries).map(|date| date.to_rfc2822()))
            .namespaces(namespaces)
            .items(entries.iter().map(rss_item).collect::<Vec<Item>>())
            .build();

        channel.validate()?;
        Ok(channel.to_string())
    }

    fn atom(&self, spec: &FeedSpec, entries: &[FeedEntry]) -> Result<String> {
        let feed_url = document_url(&self.site.url, &spec.output_path);
        let updated: FixedDateTime = newest(entries).unwrap_or_default().into();

        let mut feed = Feed::default();
        feed.set_title(spec.title.clone());
        feed.set_id(feed_url.clone());
        feed.set_updated(updated);
        feed.set_links(vec![
            atom_link(self.site.url.to_string(), "alternate"),
            atom_link(feed_url, "self"),
        ]);
        feed.set_entries(entries.iter().map(atom_entry).collect::<Vec<Entry>>());

        Ok(String::from_utf8(feed.write_to(Vec::new())?)?)
    }
}

fn newest(entries: &[FeedEntry]) -> Option<DateTime<Utc>> {
    entries.iter().map(|entry| entry.date).max()
}

fn rss_item(entry: &FeedEntry) -> Item {
    ItemBuilder::default()
        .title(Some(entry.title.clone()))
        .link(Some(entry.url.clone()))
        .guid(Some(
            GuidBuilder::default()
                .value(entry.guid.clone())
                .permalink(true)
                .build(),
        ))
        .description(Some(entry.description.clone()))
        .pub_date(Some(entry.date.to_rfc2822()))
        .content(Some(entry.content_encoded.clone()))
        .build()
}

fn atom_link(href: String, rel: &str) -> Link {
    let mut link = Link::default();
    link.set_href(href);
    link.set_rel(rel);
    link
}

fn atom_entry(entry: &FeedEntry) -> Entry {
    let date: FixedDateTime = entry.date.into();

    let mut content = Content::default();
    content.set_content_type(Some("html".to_owned()));
    content.set_value(Some(entry.content_encoded.clone()));

    let summary: Text = entry.description.clone().into();

    let mut atom = Entry::default();
    atom.set_id(entry.guid.clone());
    atom.set_title(entry.title.clone());
    atom.set_updated(date);
    atom.set_published(Some(date));
    atom.set_links(vec![atom_link(entry.url.clone(), "alternate")]);
    atom.set_summary(Some(summary));
    atom.set_content(Some(content));
    atom
}

/// Represents the result of rendering a feed.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem serializing a feed.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when the RSS channel fails validation, e.g. for a malformed
    /// link.
    #[error("invalid RSS channel: {0}")]
    Rss(#[from] ValidationError),

    /// Returned when there is an Atom-related error.
    #[error(transparent)]
    Atom(#[from] AtomError),

    /// Returned when the Atom writer produces invalid UTF-8.
    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
}
