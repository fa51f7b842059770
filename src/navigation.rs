//! Computes the previous/next links between document pages.

use crate::document::Document;
use std::collections::BTreeMap;

/// The neighbours of a document in date order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NavigationLink {
    /// The id of the next-older document, if any.
    pub previous_id: Option<String>,

    /// The id of the next-newer document, if any.
    pub next_id: Option<String>,
}

/// Maps each document id to its [`NavigationLink`].
pub type NavigationLinks = BTreeMap<String, NavigationLink>;

/// Links every document to its immediate neighbours in `documents`, which
/// must be the full date-ascending sequence (never a tag-filtered subset).
/// The oldest document has no previous link and the newest has no next link.
pub fn link(documents: &[Document]) -> NavigationLinks {
    documents
        .iter()
        .enumerate()
        .map(|(i, document)| {
            (
                document.id.clone(),
                NavigationLink {
                    previous_id: match i < 1 {
                        true => None,
                        false => Some(documents[i - 1].id.clone()),
                    },
                    next_id: documents.get(i + 1).map(|next| next.id.clone()),
                },
            )
        })
        .collect()
}
