//! Loads the project configuration from a `chronofeed.yaml` file.

use crate::feed::{FeedSettings, DEFAULT_TAG_FEED_TITLE};
use crate::syndication::FeedFormat;
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use url::Url;

/// The name of the project file searched for by [`Config::from_directory`].
pub const PROJECT_FILE: &str = "chronofeed.yaml";

fn default_content_directory() -> PathBuf {
    PathBuf::from("content")
}

#[derive(Deserialize)]
struct Project {
    site_url: Url,
    title: String,

    #[serde(default)]
    description: Option<String>,

    #[serde(default = "default_content_directory")]
    content_directory: PathBuf,

    #[serde(default)]
    feed: FeedSection,
}

#[derive(Default, Deserialize)]
struct FeedSection {
    #[serde(default)]
    title: Option<String>,

    #[serde(default)]
    tag_title: Option<String>,

    #[serde(default)]
    format: FeedFormat,
}

/// The site-wide settings the pipeline needs.
#[derive(Clone, Debug, PartialEq)]
pub struct Site {
    /// The absolute URL the site is served from. Document URLs in feeds are
    /// this URL joined with the document's slug.
    pub url: Url,

    pub title: String,

    /// The feed channel description.
    pub description: String,

    pub feed: FeedSettings,

    pub feed_format: FeedFormat,
}

impl Site {
    /// Builds a [`Site`] with default feed settings: the feed title and
    /// description are the site title.
    pub fn new(url: Url, title: &str) -> Site {
        Site {
            url,
            title: title.to_owned(),
            description: title.to_owned(),
            feed: FeedSettings {
                title: title.to_owned(),
                tag_title: DEFAULT_TAG_FEED_TITLE.to_owned(),
            },
            feed_format: FeedFormat::default(),
        }
    }
}

/// Everything needed to run a build.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub site: Site,

    /// The directory holding the markdown sources.
    pub content_directory: PathBuf,

    /// The directory the routes are written to.
    pub output_directory: PathBuf,
}

impl Config {
    /// Searches `dir` and its ancestors for a [`PROJECT_FILE`] and loads the
    /// first one found.
    pub fn from_directory(dir: &Path, output_directory: &Path) -> Result<Config> {
        let mut current = Some(dir);
        while let Some(dir) = current {
            let path = dir.join(PROJECT_FILE);
            if path.is_file() {
                return Config::from_project_file(&path, output_directory);
            }
            current = dir.parent();
        }
        Err(Error::NotFound(dir.to_owned()))
    }

    /// Loads the project file at `path`. Relative paths in the file are
    /// resolved against the file's directory.
    pub fn from_project_file(path: &Path, output_directory: &Path) -> Result<Config> {
        let file = File::open(path).map_err(|err| Error::Open {
            path: path.to_owned(),
            err,
        })?;
        let project: Project = serde_yaml::from_reader(file).map_err(|err| Error::Parse {
            path: path.to_owned(),
            err,
        })?;
        let project_root = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(project.into_config(project_root, output_directory))
    }
}

impl Project {
    fn into_config(self, project_root: &Path, output_directory: &Path) -> Config {
        let mut site = Site::new(self.site_url, &self.title);
        if let Some(description) = self.description {
            site.description = description;
        }
        if let Some(title) = self.feed.title {
            site.feed.title = title;
        }
        if let Some(tag_title) = self.feed.tag_title {
            site.feed.tag_title = tag_title;
        }
        site.feed_format = self.feed.format;

        Config {
            site,
            content_directory: project_root.join(self.content_directory),
            output_directory: output_directory.to_owned(),
        }
    }
}

/// Represents the result of loading configuration.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem loading the project configuration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when no project file exists in a directory or its ancestors.
    #[error("could not find `{}` in `{}` or any parent directory", PROJECT_FILE, .0.display())]
    NotFound(PathBuf),

    /// Returned when the project file can't be opened.
    #[error("opening project file `{}`: {err}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    /// Returned when the project file isn't valid.
    #[error("parsing project file `{}`: {err}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        err: serde_yaml::Error,
    },
}
