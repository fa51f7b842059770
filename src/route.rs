//! Binds the derived artifacts of a build to output paths. The result is a
//! flat list of [`Route`]s which the rendering layer consumes: page routes
//! carry the context a template needs, feed routes carry the finished XML.

use crate::document::OrderedDocuments;
use crate::feed::{tag_feed_path, FeedSpec};
use crate::navigation::NavigationLinks;
use crate::syndication::{Error as FeedError, FeedRenderer};
use crate::tag::{kebab_case, Tag};
use serde::Serialize;
use std::collections::HashMap;

/// The path of the page listing every tag.
pub const TAG_INDEX_PATH: &str = "/tags/";

/// An output path and what should be rendered there.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Route {
    pub path: String,
    pub context: RouteContext,
}

impl Route {
    pub fn kind(&self) -> RouteKind {
        match self.context {
            RouteContext::Feed { .. } => RouteKind::Feed,
            _ => RouteKind::Page,
        }
    }
}

/// Whether a route still needs templating ([`RouteKind::Page`]) or is already
/// a finished document ([`RouteKind::Feed`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteKind {
    Page,
    Feed,
}

/// The context handed to the rendering layer. Serializes with a `kind` field
/// naming the variant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RouteContext {
    /// A document page and its neighbours in date order.
    Document {
        document_id: String,
        previous_id: Option<String>,
        next_id: Option<String>,
    },

    /// The page listing every tag.
    TagIndex { tags: Vec<TagSummary> },

    /// A tag's aggregation page.
    Tag { tag: String },

    /// A serialized feed.
    Feed { xml: String },
}

/// One row of the tag index page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TagSummary {
    pub tag: String,
    pub total_count: usize,
    pub path: String,
    pub feed_path: String,
}

/// Registers a route for every document (in date order), the tag index page,
/// every tag page and every feed, in that order. Identical inputs always
/// produce identical routes. Fails if a document has no navigation link, if a
/// tag has no usable page path, if a feed can't be serialized or if two routes
/// claim the same path. Paths differing only in slashes (`/x` and `/x/`) are
/// the same path.
pub fn register(
    documents: &OrderedDocuments,
    links: &NavigationLinks,
    tags: &[Tag],
    feeds: &[FeedSpec],
    renderer: &FeedRenderer,
) -> Result<Vec<Route>> {
    if let Some(tag) = tags.iter().find(|tag| kebab_case(&tag.name).is_empty()) {
        return Err(Error::UnroutableTag {
            tag: tag.name.clone(),
        });
    }

    let mut routes = Vec::with_capacity(documents.len() + tags.len() + feeds.len() + 1);

    for document in documents.iter() {
        let link = links.get(&document.id).ok_or_else(|| Error::Unlinked {
            id: document.id.clone(),
        })?;
        routes.push(Route {
            path: document.slug.clone(),
            context: RouteContext::Document {
                document_id: document.id.clone(),
                previous_id: link.previous_id.clone(),
                next_id: link.next_id.clone(),
            },
        });
    }

    routes.push(Route {
        path: TAG_INDEX_PATH.to_owned(),
        context: RouteContext::TagIndex {
            tags: tags
                .iter()
                .map(|tag| TagSummary {
                    tag: tag.name.clone(),
                    total_count: tag.total_count,
                    path: tag.page_path(),
                    feed_path: tag_feed_path(&tag.name),
                })
                .collect(),
        },
    });

    routes.extend(tags.iter().map(|tag| Route {
        path: tag.page_path(),
        context: RouteContext::Tag {
            tag: tag.name.clone(),
        },
    }));

    for feed in feeds {
        let xml = renderer
            .render(feed, documents)
            .map_err(|err| Error::Feed {
                path: feed.output_path.clone(),
                err,
            })?;
        routes.push(Route {
            path: feed.output_path.clone(),
            context: RouteContext::Feed { xml },
        });
    }

    let mut seen: HashMap<String, &str> = HashMap::with_capacity(routes.len());
    for route in &routes {
        if let Some(first) = seen.insert(normalize_path(&route.path), &route.path) {
            return Err(Error::DuplicateRoutePath {
                path: route.path.clone(),
                first: first.to_owned(),
            });
        }
    }

    Ok(routes)
}

// Drops empty segments so that paths naming the same output location compare
// equal.
fn normalize_path(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<&str>>()
        .join("/")
}

/// Represents the result of registering routes.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem registering routes.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when a document is missing from the navigation links, which
    /// means the links were computed from a different document set.
    #[error("document `{id}` has no navigation link")]
    Unlinked { id: String },

    /// Returned when a tag's name has nothing to build a page path from, e.g.
    /// `!!!`.
    #[error("tag `{tag}` has no usable page path")]
    UnroutableTag { tag: String },

    /// Returned when two routes claim the same output path, e.g. a document
    /// whose slug is `/tags/`.
    #[error("`{path}` and `{first}` claim the same output path")]
    DuplicateRoutePath { path: String, first: String },

    /// Returned when a feed can't be serialized.
    #[error("rendering feed `{path}`: {err}")]
    Feed {
        path: String,
        #[source]
        err: FeedError,
    },
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Site;
    use crate::document::index;
    use crate::feed::compose;
    use crate::navigation::link;
    use crate::store::RawDocument;
    use crate::tag::aggregate;
    use url::Url;

    fn site() -> Site {
        Site::new(Url::parse("https://example.org/").unwrap(), "Example")
    }

    fn documents(records: &[(&str, &str, &[&str])]) -> OrderedDocuments {
        index(
            records
                .iter()
                .map(|(id, date, tags)| RawDocument {
                    id: id.to_string(),
                    source_path: format!("{}.md", id),
                    date: Some(date.to_string()),
                    tags: Some(tags.iter().map(|t| t.to_string()).collect()),
                    ..RawDocument::default()
                })
                .collect(),
        )
        .unwrap()
    }

    fn routes(documents: &OrderedDocuments) -> Result<Vec<Route>> {
        let site = site();
        let tags = aggregate(documents);
        let feeds = compose(documents, &tags, &site.feed).unwrap();
        register(documents, &link(documents), &tags, &feeds, &FeedRenderer::new(&site))
    }

    #[test]
    fn test_register_scenario() -> Result<()> {
        let documents = documents(&[
            ("1", "2024-01-01", &["go"]),
            ("2", "2024-02-01", &["go", "rust lang"]),
        ]);
        let routes = routes(&documents)?;

        let paths: Vec<&str> = routes.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(
            vec![
                "/1/",
                "/2/",
                "/tags/",
                "/tags/go/",
                "/tags/rust-lang/",
                "/rss.xml",
                "/go.xml",
                "/rust lang.xml",
            ],
            paths
        );

        assert_eq!(
            RouteContext::Document {
                document_id: "1".to_owned(),
                previous_id: None,
                next_id: Some("2".to_owned()),
            },
            routes[0].context
        );
        assert_eq!(
            RouteContext::Tag {
                tag: "rust lang".to_owned()
            },
            routes[4].context
        );
        assert_eq!(RouteKind::Page, routes[3].kind());
        assert_eq!(RouteKind::Feed, routes[5].kind());
        Ok(())
    }

    #[test]
    fn test_tag_index_context() -> Result<()> {
        let documents = documents(&[("1", "2024-01-01", &["go"]), ("2", "2024-01-02", &["go"])]);
        let routes = routes(&documents)?;
        let index = routes.iter().find(|r| r.path == TAG_INDEX_PATH).unwrap();
        assert_eq!(
            RouteContext::TagIndex {
                tags: vec![TagSummary {
                    tag: "go".to_owned(),
                    total_count: 2,
                    path: "/tags/go/".to_owned(),
                    feed_path: "/go.xml".to_owned(),
                }]
            },
            index.context
        );
        Ok(())
    }

    #[test]
    fn test_empty_documents() -> Result<()> {
        let routes = routes(&OrderedDocuments::default())?;
        let paths: Vec<&str> = routes.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(vec!["/tags/", "/rss.xml"], paths);
        Ok(())
    }

    #[test]
    fn test_registration_is_idempotent() -> Result<()> {
        let documents = documents(&[
            ("b", "2024-01-01", &["x", "y"]),
            ("a", "2024-01-01", &["y"]),
            ("c", "2023-01-01", &["x"]),
        ]);
        assert_eq!(routes(&documents)?, routes(&documents)?);
        Ok(())
    }

    #[test]
    fn test_unlinked_document() {
        let documents = documents(&[("1", "2024-01-01", &[])]);
        let site = site();
        let feeds = compose(&documents, &[], &site.feed).unwrap();
        assert!(matches!(
            register(&documents, &NavigationLinks::new(), &[], &feeds, &FeedRenderer::new(&site)),
            Err(Error::Unlinked { id }) if id == "1"
        ));
    }

    #[test]
    fn test_duplicate_route_path() {
        let documents = index(vec![RawDocument {
            id: "tags".to_owned(),
            source_path: "tags/index.md".to_owned(),
            date: Some("2024-01-01".to_owned()),
            tags: Some(Vec::new()),
            ..RawDocument::default()
        }])
        .unwrap();
        assert!(matches!(
            routes(&documents),
            Err(Error::DuplicateRoutePath { path, .. }) if path == "/tags/"
        ));
    }

    #[test]
    fn test_paths_differing_in_slashes_collide() {
        let documents = index(vec![
            RawDocument {
                id: "x.md".to_owned(),
                source_path: "x.md".to_owned(),
                date: Some("2024-01-01".to_owned()),
                tags: Some(Vec::new()),
                ..RawDocument::default()
            },
            RawDocument {
                id: "other.md".to_owned(),
                source_path: "other.md".to_owned(),
                slug: Some("/x".to_owned()),
                date: Some("2024-01-02".to_owned()),
                tags: Some(Vec::new()),
                ..RawDocument::default()
            },
        ])
        .unwrap();
        assert!(matches!(
            routes(&documents),
            Err(Error::DuplicateRoutePath { path, first }) if path == "/x" && first == "/x/"
        ));
    }

    #[test]
    fn test_tag_without_page_path_is_rejected() {
        for name in ["!!!", "#", "…"] {
            let documents = documents(&[("1", "2024-01-01", &[name])]);
            assert!(matches!(
                routes(&documents),
                Err(Error::UnroutableTag { tag }) if tag == name
            ));
        }
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!("tags", normalize_path("/tags//"));
        assert_eq!("tags", normalize_path("/tags/"));
        assert_eq!("a/b", normalize_path("/a//b"));
        assert_eq!("", normalize_path("/"));
    }

    #[test]
    fn test_context_serialization() {
        let context = RouteContext::Document {
            document_id: "1".to_owned(),
            previous_id: None,
            next_id: Some("2".to_owned()),
        };
        assert_eq!(
            r#"{"kind":"document","document_id":"1","previous_id":null,"next_id":"2"}"#,
            serde_json::to_string(&context).unwrap()
        );
    }
}
