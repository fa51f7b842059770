//! The library code for the `chronofeed` content pipeline. A build turns a set
//! of authored documents into a route table: one page per document with
//! previous/next links, one page per tag, a tag index page, and a family of
//! syndication feeds. The architecture breaks down into these steps:
//!
//! 1. Querying raw records from a content store ([`crate::store`], with a
//!    markdown implementation in [`crate::parser`])
//! 2. Normalizing them into a date-ordered document sequence
//!    ([`crate::document`])
//! 3. Linking neighbours ([`crate::navigation`]) and grouping by tag
//!    ([`crate::tag`]), which are independent of each other
//! 4. Deriving one feed specification per scope ([`crate::feed`]) and
//!    serializing feeds ([`crate::syndication`])
//! 5. Registering pages and feeds against output paths ([`crate::route`])
//!
//! [`crate::build`] stitches the steps together and [`crate::write`] publishes
//! the resulting routes to disk. Every step after the first is a pure
//! function of the document snapshot, so the same input always produces
//! byte-identical routes.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod document;
pub mod feed;
pub mod markdown;
pub mod navigation;
pub mod parser;
pub mod route;
pub mod store;
pub mod syndication;
pub mod tag;
pub mod write;
