//! Defines the [`Tag`] type, which groups the [`Document`]s carrying one tag
//! value, and the [`aggregate`] function which builds the full tag taxonomy.

use crate::document::{Document, OrderedDocuments};
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};

/// A distinct tag value and the documents that reference it. The tag's
/// identity is its `name` in the original casing; `Go` and `go` are different
/// tags.
#[derive(Clone, Debug)]
pub struct Tag {
    pub name: String,

    /// The number of documents tagged with `name`. A document listing the
    /// same tag twice counts once.
    pub total_count: usize,

    /// The ids of the tagged documents, newest first.
    pub members: Vec<String>,
}

impl Tag {
    /// The path of the tag's aggregation page, `/tags/{kebab-case(name)}/`.
    pub fn page_path(&self) -> String {
        format!("/tags/{}/", kebab_case(&self.name))
    }
}

impl Hash for Tag {
    /// Implements [`Hash`] for [`Tag`] by delegating directly to the `name`
    /// field.
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state)
    }
}

impl PartialEq for Tag {
    /// Implements [`PartialEq`] and [`Eq`] for [`Tag`] by delegating directly
    /// to the `name` field.
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}
impl Eq for Tag {}

/// Builds one [`Tag`] per distinct tag value in `documents`, sorted by name so
/// that the output doesn't depend on the order in which tags were first seen.
/// Documents without tags contribute to no [`Tag`].
pub fn aggregate(documents: &OrderedDocuments) -> Vec<Tag> {
    let mut groups: BTreeMap<&str, Vec<&Document>> = BTreeMap::new();
    for document in documents.newest_first() {
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        for tag in document.tags.iter().map(String::as_str) {
            if seen.insert(tag) {
                groups.entry(tag).or_default().push(document);
            }
        }
    }

    groups
        .into_iter()
        .map(|(name, members)| Tag {
            name: name.to_owned(),
            total_count: members.len(),
            members: members.iter().map(|d| d.id.clone()).collect(),
        })
        .collect()
}

/// Converts a tag into a kebab-case path segment: words are split on
/// non-alphanumeric characters, on lower-to-upper case changes (`fooBar`), at
/// the end of an acronym (`HTMLParser`) and between letters and digits
/// (`Drupal10`), then lowercased, transliterated to ASCII and joined with `-`.
pub fn kebab_case(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut spaced = String::with_capacity(input.len() + 8);
    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && is_word_boundary(chars[i - 1], c, chars.get(i + 1).copied()) {
            spaced.push(' ');
        }
        spaced.push(c);
    }
    slug::slugify(spaced)
}

fn is_word_boundary(prev: char, c: char, next: Option<char>) -> bool {
    let lower_to_upper = (prev.is_lowercase() || prev.is_numeric()) && c.is_uppercase();
    let acronym_end = prev.is_uppercase()
        && c.is_uppercase()
        && next.map_or(false, |n| n.is_lowercase());
    let letter_digit = (prev.is_alphabetic() && c.is_numeric())
        || (prev.is_numeric() && c.is_alphabetic());
    lower_to_upper || acronym_end || letter_digit
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::document::{index, Result};
    use crate::store::RawDocument;

    fn documents(records: &[(&str, &str, &[&str])]) -> Result<OrderedDocuments> {
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
    }

    fn summary(tags: &[Tag]) -> Vec<(&str, usize, Vec<&str>)> {
        tags.iter()
            .map(|t| {
                (
                    t.name.as_str(),
                    t.total_count,
                    t.members.iter().map(String::as_str).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_aggregate_scenario() -> Result<()> {
        let documents = documents(&[
            ("1", "2024-01-01", &["go"]),
            ("2", "2024-02-01", &["go", "rust"]),
        ])?;
        assert_eq!(
            vec![("go", 2, vec!["2", "1"]), ("rust", 1, vec!["2"])],
            summary(&aggregate(&documents))
        );
        Ok(())
    }

    #[test]
    fn test_tags_are_sorted_by_name_and_case_sensitive() -> Result<()> {
        let documents = documents(&[
            ("1", "2024-01-01", &["zig", "Go"]),
            ("2", "2024-01-02", &["go", "algorithms"]),
        ])?;
        let names: Vec<String> = aggregate(&documents).into_iter().map(|t| t.name).collect();
        assert_eq!(vec!["Go", "algorithms", "go", "zig"], names);
        Ok(())
    }

    #[test]
    fn test_repeated_tag_counts_once() -> Result<()> {
        let mut documents = documents(&[("1", "2024-01-01", &["go"])])?.to_vec();
        documents[0].tags.push("go".to_owned());
        let documents = OrderedDocuments::new(documents);
        assert_eq!(vec![("go", 1, vec!["1"])], summary(&aggregate(&documents)));
        Ok(())
    }

    #[test]
    fn test_untagged_documents_contribute_nothing() -> Result<()> {
        let documents = documents(&[("1", "2024-01-01", &[]), ("2", "2024-01-02", &["go"])])?;
        let tags = aggregate(&documents);
        assert_eq!(vec![("go", 1, vec!["2"])], summary(&tags));

        let tagged = documents.iter().filter(|d| !d.tags.is_empty()).count();
        assert!(tags.iter().map(|t| t.total_count).sum::<usize>() >= tagged);
        Ok(())
    }

    #[test]
    fn test_empty() {
        assert!(aggregate(&OrderedDocuments::default()).is_empty());
    }

    #[test]
    fn test_kebab_case() {
        assert_eq!("go", kebab_case("Go"));
        assert_eq!("drupal-10", kebab_case("Drupal 10"));
        assert_eq!("drupal-10", kebab_case("Drupal10"));
        assert_eq!("foo-bar", kebab_case("fooBar"));
        assert_eq!("graph-ql", kebab_case("GraphQL"));
        assert_eq!("html-parser", kebab_case("HTMLParser"));
        assert_eq!("node-js", kebab_case("Node.js"));
        assert_eq!("cafe-creme", kebab_case("Café Crème"));
    }

    #[test]
    fn test_page_path() {
        let tag = Tag {
            name: "Machine Learning".to_owned(),
            total_count: 0,
            members: Vec::new(),
        };
        assert_eq!("/tags/machine-learning/", tag.page_path());
    }
}
