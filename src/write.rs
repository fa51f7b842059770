//! Publishes a route set to an output directory. Feed routes become XML files
//! at their path; page routes become `index.json` files holding their
//! [`RouteContext`], ready for a templating layer; `routes.json` lists every
//! route. Everything is written into a staging directory next to the output
//! directory which replaces the output only once every file was written.

use crate::build::Cancellation;
use crate::route::{Route, RouteContext, RouteKind};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// The name of the manifest file listing every route.
pub const MANIFEST_FILE: &str = "routes.json";

/// The file a page route's context is written to, below the route's path.
pub const PAGE_CONTEXT_FILE: &str = "index.json";

/// Responsible for writing [`Route`]s to disk.
pub struct Writer {
    output_directory: PathBuf,
    cancellation: Cancellation,
}

#[derive(Serialize)]
struct ManifestEntry<'a> {
    path: &'a str,
    kind: RouteKind,
}

impl Writer {
    pub fn new(output_directory: impl Into<PathBuf>) -> Writer {
        Writer {
            output_directory: output_directory.into(),
            cancellation: Cancellation::default(),
        }
    }

    /// Makes the writer stop, discarding everything staged so far, once
    /// `cancellation` is set. The flag is checked before each route and
    /// before the output directory is replaced.
    pub fn with_cancellation(mut self, cancellation: &Cancellation) -> Writer {
        self.cancellation = cancellation.clone();
        self
    }

    /// Writes `routes` and swaps them in for the current contents of the
    /// output directory. On failure or cancellation the output directory is
    /// left untouched.
    pub fn write(&self, routes: &[Route]) -> Result<()> {
        let staging = self.staging_directory()?;
        rmdir(&staging)?;
        create_dir_all(&staging)?;

        let staged = self
            .write_routes(&staging, routes)
            .and_then(|()| self.check_cancelled());
        if let Err(err) = staged {
            // The staging directory is scratch space; the original error is
            // the one worth reporting.
            let _ = rmdir(&staging);
            return Err(err);
        }

        rmdir(&self.output_directory)?;
        std::fs::rename(&staging, &self.output_directory).map_err(|err| Error::Io {
            path: self.output_directory.clone(),
            err,
        })
    }

    fn staging_directory(&self) -> Result<PathBuf> {
        let name = self
            .output_directory
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| Error::InvalidOutputDirectory(self.output_directory.clone()))?;
        Ok(self
            .output_directory
            .with_file_name(format!(".{}.staging", name)))
    }

    fn check_cancelled(&self) -> Result<()> {
        match self.cancellation.is_cancelled() {
            true => Err(Error::Cancelled),
            false => Ok(()),
        }
    }

    fn write_routes(&self, directory: &Path, routes: &[Route]) -> Result<()> {
        for route in routes {
            self.check_cancelled()?;
            let file_path = directory.join(route_file(route)?);
            if let Some(parent) = file_path.parent() {
                create_dir_all(parent)?;
            }
            let contents = match &route.context {
                RouteContext::Feed { xml } => xml.as_bytes().to_vec(),
                context => serde_json::to_vec_pretty(context)?,
            };
            write_file(&file_path, &contents)?;
        }

        let manifest: Vec<ManifestEntry> = routes
            .iter()
            .map(|route| ManifestEntry {
                path: &route.path,
                kind: route.kind(),
            })
            .collect();
        write_file(
            &directory.join(MANIFEST_FILE),
            &serde_json::to_vec_pretty(&manifest)?,
        )
    }
}

/// Maps a route to the file it is written to, relative to the output
/// directory. Rejects paths that could escape the output directory.
pub fn route_file(route: &Route) -> Result<PathBuf> {
    let invalid = || Error::InvalidRoutePath(route.path.clone());
    if !route.path.starts_with('/') {
        return Err(invalid());
    }

    let mut file = PathBuf::new();
    for segment in route.path.split('/').filter(|s| !s.is_empty()) {
        if segment == "." || segment == ".." || segment.contains('\\') {
            return Err(invalid());
        }
        file.push(segment);
    }

    match route.kind() {
        RouteKind::Feed if file.as_os_str().is_empty() || route.path.ends_with('/') => {
            Err(invalid())
        }
        RouteKind::Feed => Ok(file),
        RouteKind::Page => Ok(file.join(PAGE_CONTEXT_FILE)),
    }
}

fn create_dir_all(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|err| Error::Io {
        path: dir.to_owned(),
        err,
    })
}

fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    std::fs::write(path, contents).map_err(|err| Error::Io {
        path: path.to_owned(),
        err,
    })
}

fn rmdir(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(x) => Ok(x),
        Err(e) => match e.kind() {
            std::io::ErrorKind::NotFound => Ok(()),
            _ => Err(Error::Io {
                path: dir.to_owned(),
                err: e,
            }),
        },
    }
}

/// The result of a fallible write operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error writing routes to disk.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when the output directory has no usable name to derive the
    /// staging directory from, e.g. `/` or `..`.
    #[error("invalid output directory `{}`", .0.display())]
    InvalidOutputDirectory(PathBuf),

    /// Returned when a route path isn't absolute or would escape the output
    /// directory.
    #[error("invalid route path `{0}`")]
    InvalidRoutePath(String),

    /// Returned when a page context can't be serialized.
    #[error("serializing route context: {0}")]
    Json(#[from] serde_json::Error),

    /// Returned when the write was cancelled before the output was replaced.
    #[error("write cancelled")]
    Cancelled,

    /// Returned for I/O problems writing the output files.
    #[error("writing `{}`: {err}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },
}
