//! Defines [`FileSystemStore`], a [`ContentStore`] over a directory of
//! markdown files with YAML frontmatter.

use crate::markdown;
use crate::store::{apply_query, ContentStore, Error, Query, RawDocument, Result};
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const MARKDOWN_EXTENSION: &str = "md";

/// Loads [`RawDocument`]s from markdown files below a root directory. Each
/// file must be structured as follows:
///
/// 1. Initial frontmatter fence (`---`)
/// 2. YAML frontmatter with fields `title`, `date`, and optionally `tags` and
///    `slug`
/// 3. Terminal frontmatter fence (`---`)
/// 4. Markdown body
///
/// For example:
///
/// ```md
/// ---
/// title: Hello, world!
/// date: 2021-04-16
/// tags: [greet]
/// ---
/// # Hello
///
/// World
/// ```
///
/// A file's id and source path are its path relative to the root, with `/`
/// separators. Files are returned sorted by that path so store order doesn't
/// depend on the file system.
pub struct FileSystemStore {
    root: PathBuf,
}

impl FileSystemStore {
    pub fn new(root: impl Into<PathBuf>) -> FileSystemStore {
        FileSystemStore { root: root.into() }
    }

    fn load(&self) -> Result<Vec<RawDocument>> {
        let mut relative_paths = Vec::new();
        for result in WalkDir::new(&self.root).follow_links(true) {
            let entry = result?;
            if entry.file_type().is_file()
                && entry.path().extension().map_or(false, |e| e == MARKDOWN_EXTENSION)
            {
                // strip_prefix shouldn't fail since `root` is always an
                // ancestor of the entry
                if let Ok(relative) = entry.path().strip_prefix(&self.root) {
                    relative_paths.push(relative_source_path(relative)?);
                }
            }
        }
        relative_paths.sort();

        tracing::debug!(
            root = %self.root.display(),
            files = relative_paths.len(),
            "found markdown sources"
        );
        relative_paths
            .iter()
            .map(|relative_path| self.parse_document(relative_path))
            .collect()
    }

    /// Parses a single document, annotating any error with its path.
    fn parse_document(&self, relative_path: &str) -> Result<RawDocument> {
        self._parse_document(relative_path)
            .map_err(|e| e.annotate(format!("parsing document `{}`", relative_path)))
    }

    fn _parse_document(&self, relative_path: &str) -> Result<RawDocument> {
        use std::io::Read;
        let mut contents = String::new();
        File::open(self.root.join(relative_path))?.read_to_string(&mut contents)?;
        parse_source(relative_path, &contents)
    }
}

impl ContentStore for FileSystemStore {
    fn query(&self, query: &Query) -> Result<Vec<RawDocument>> {
        Ok(apply_query(self.load()?, query))
    }
}

#[derive(Deserialize)]
struct Frontmatter {
    #[serde(default)]
    title: Option<String>,

    /// The date of the document, `YYYY-MM-DD` or RFC 3339.
    #[serde(default)]
    date: Option<String>,

    /// The tags of the document. Absent tags mean none.
    #[serde(default)]
    tags: Vec<String>,

    #[serde(default)]
    slug: Option<String>,
}

/// Parses the contents of a markdown source file located at `relative_path`.
pub fn parse_source(relative_path: &str, input: &str) -> Result<RawDocument> {
    fn frontmatter_indices(input: &str) -> Result<(usize, usize, usize)> {
        const FENCE: &str = "---";
        if !input.starts_with(FENCE) {
            return Err(Error::FrontmatterMissingStartFence);
        }
        match input[FENCE.len()..].find(FENCE) {
            None => Err(Error::FrontmatterMissingEndFence),
            Some(offset) => Ok((
                FENCE.len(),                        // yaml_start
                FENCE.len() + offset,               // yaml_stop
                FENCE.len() + offset + FENCE.len(), // body_start
            )),
        }
    }

    let (yaml_start, yaml_stop, body_start) = frontmatter_indices(input)?;
    let frontmatter: Frontmatter = serde_yaml::from_str(&input[yaml_start..yaml_stop])?;
    let body = &input[body_start..];
    let text = markdown::to_plain_text(body);

    Ok(RawDocument {
        id: relative_path.to_owned(),
        source_path: relative_path.to_owned(),
        slug: frontmatter.slug,
        title: frontmatter.title,
        date: frontmatter.date,
        tags: Some(frontmatter.tags),
        excerpt: markdown::excerpt(&text, markdown::EXCERPT_LENGTH),
        rendered_body: markdown::to_html(body),
        reading_time_text: markdown::reading_time_text(&text),
    })
}

fn relative_source_path(path: &Path) -> Result<String> {
    let segments = path
        .components()
        .map(|c| {
            c.as_os_str()
                .to_str()
                .ok_or_else(|| Error::InvalidFileName(path.to_owned()))
        })
        .collect::<Result<Vec<&str>>>()?;
    Ok(segments.join("/"))
}
