//! Exports the [`build_site`] function which stitches together the high-level
//! steps of a build: querying the content store ([`crate::store`]), indexing
//! ([`crate::document`]), linking ([`crate::navigation`]) and tag aggregation
//! plus feed composition ([`crate::tag`], [`crate::feed`]) in parallel,
//! registering routes ([`crate::route`]) and publishing them
//! ([`crate::write`]).

use crate::config::{Config, Error as ConfigError, Site};
use crate::document::{index, Error as IndexError};
use crate::feed::{compose, Error as FeedError};
use crate::navigation::link;
use crate::parser::FileSystemStore;
use crate::route::{register, Error as RouteError, Route};
use crate::store::{ContentStore, Error as StoreError, Query};
use crate::syndication::FeedRenderer;
use crate::tag::aggregate;
use crate::write::{Error as WriteError, Writer};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A flag shared between a running build and whoever may want to stop it.
/// The pipeline checks it between stages; once set, the build returns
/// [`Error::Cancelled`] and nothing is published.
#[derive(Clone, Debug, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    pub fn new() -> Cancellation {
        Cancellation::default()
    }

    /// Requests that the build stop at the next stage boundary.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn check(&self, stage: &'static str) -> Result<()> {
        match self.is_cancelled() {
            true => {
                tracing::warn!(stage, "build cancelled");
                Err(Error::Cancelled)
            }
            false => Ok(()),
        }
    }
}

/// Runs the pipeline over a content store and returns the registered routes.
/// Nothing is written; see [`build_site`] for that.
pub fn derive_routes(
    store: &dyn ContentStore,
    site: &Site,
    cancellation: &Cancellation,
) -> Result<Vec<Route>> {
    let raw_documents = store.query(&Query::default())?;
    cancellation.check("query")?;

    let documents = index(raw_documents)?;
    tracing::info!(documents = documents.len(), "indexed documents");
    cancellation.check("index")?;

    // Linking and tag aggregation only read the document sequence, so they
    // run side by side.
    let (links, tagged) = rayon::join(
        || link(&documents),
        || {
            let tags = aggregate(&documents);
            compose(&documents, &tags, &site.feed).map(|feeds| (tags, feeds))
        },
    );
    let (tags, feeds) = tagged?;
    tracing::info!(tags = tags.len(), feeds = feeds.len(), "aggregated tags");
    cancellation.check("aggregate")?;

    let routes = register(&documents, &links, &tags, &feeds, &FeedRenderer::new(site))?;
    tracing::info!(routes = routes.len(), "registered routes");
    cancellation.check("register")?;

    Ok(routes)
}

/// Builds the site described by a [`Config`]: loads the markdown sources from
/// the content directory, derives the routes and writes them to the output
/// directory. The previous output is only replaced once every route was
/// written, and is kept if the build is cancelled at any point.
pub fn build_site(config: &Config, cancellation: &Cancellation) -> Result<Vec<Route>> {
    let store = FileSystemStore::new(&config.content_directory);
    let routes = derive_routes(&store, &config.site, cancellation)?;

    match Writer::new(&config.output_directory)
        .with_cancellation(cancellation)
        .write(&routes)
    {
        Err(WriteError::Cancelled) => {
            tracing::warn!(stage = "write", "build cancelled");
            return Err(Error::Cancelled);
        }
        result => result?,
    }
    tracing::info!(
        output = %config.output_directory.display(),
        routes = routes.len(),
        "wrote site"
    );
    Ok(routes)
}

/// The result of a build.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Each variant wraps the error of the
/// stage that failed.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when the project configuration can't be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Returned when the content store fails.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Returned for malformed documents.
    #[error(transparent)]
    Index(#[from] IndexError),

    /// Returned when feeds can't be composed.
    #[error(transparent)]
    Feed(#[from] FeedError),

    /// Returned when routes can't be registered.
    #[error(transparent)]
    Route(#[from] RouteError),

    /// Returned for errors writing routes to disk.
    #[error(transparent)]
    Write(#[from] WriteError),

    /// Returned when the build was cancelled before it finished.
    #[error("build cancelled")]
    Cancelled,
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::route::RouteContext;
    use crate::store::{MemoryStore, RawDocument};
    use url::Url;

    fn site() -> Site {
        Site::new(Url::parse("https://example.org/").unwrap(), "Example")
    }

    fn raw(id: &str, date: &str, tags: &[&str]) -> RawDocument {
        RawDocument {
            id: id.to_owned(),
            source_path: format!("{}/index.md", id),
            title: Some(id.to_uppercase()),
            date: Some(date.to_owned()),
            tags: Some(tags.iter().map(|t| t.to_string()).collect()),
            ..RawDocument::default()
        }
    }

    #[test]
    fn test_derive_routes() -> Result<()> {
        let store = MemoryStore::new(vec![
            raw("b", "2024-02-01", &["go"]),
            raw("a", "2024-01-01", &["go"]),
        ]);
        let routes = derive_routes(&store, &site(), &Cancellation::new())?;
        let paths: Vec<&str> = routes.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(vec!["/a/", "/b/", "/tags/", "/tags/go/", "/rss.xml", "/go.xml"], paths);
        assert_eq!(
            RouteContext::Document {
                document_id: "b".to_owned(),
                previous_id: Some("a".to_owned()),
                next_id: None,
            },
            routes[1].context
        );
        Ok(())
    }

    #[test]
    fn test_cancelled_build_returns_no_routes() {
        let store = MemoryStore::new(vec![raw("a", "2024-01-01", &[])]);
        let cancellation = Cancellation::new();
        cancellation.clone().cancel();
        assert!(cancellation.is_cancelled());
        assert!(matches!(
            derive_routes(&store, &site(), &cancellation),
            Err(Error::Cancelled)
        ));
    }

    // Cancels the build from inside the query stage, the way a Ctrl-C
    // arriving mid-build would.
    struct CancellingStore {
        inner: MemoryStore,
        cancellation: Cancellation,
    }

    impl ContentStore for CancellingStore {
        fn query(&self, query: &Query) -> crate::store::Result<Vec<RawDocument>> {
            self.cancellation.cancel();
            self.inner.query(query)
        }
    }

    #[test]
    fn test_cancellation_between_stages() {
        let cancellation = Cancellation::new();
        let store = CancellingStore {
            inner: MemoryStore::new(vec![raw("a", "2024-01-01", &["go"])]),
            cancellation: cancellation.clone(),
        };
        assert!(!cancellation.is_cancelled());
        assert!(matches!(
            derive_routes(&store, &site(), &cancellation),
            Err(Error::Cancelled)
        ));
    }

    #[test]
    fn test_index_errors_propagate() {
        let mut record = raw("a", "2024-01-01", &[]);
        record.date = None;
        let store = MemoryStore::new(vec![record]);
        assert!(matches!(
            derive_routes(&store, &site(), &Cancellation::new()),
            Err(Error::Index(IndexError::MissingRequiredField { .. }))
        ));
    }

    #[test]
    fn test_feed_errors_propagate() {
        let store = MemoryStore::new(vec![
            raw("a", "2024-01-01", &["Go"]),
            raw("b", "2024-01-02", &["go"]),
        ]);
        assert!(matches!(
            derive_routes(&store, &site(), &Cancellation::new()),
            Err(Error::Feed(FeedError::DuplicateFeedPath { .. }))
        ));
    }
}
