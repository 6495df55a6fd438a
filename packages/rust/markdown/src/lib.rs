//! Semantic content index and patch engine.
//!
//! Parses an HTML fragment into an owned tree, builds an ordered index of its
//! content blocks, renders them as Markdown, and applies text-addressed edit
//! operations that take Markdown as input. Every mutation rebuilds the index.

mod classify;
mod index;
mod ops;
mod render;
mod resolve;
mod schema;
mod tree;

pub use classify::{IGNORED_TAGS, TAGS_OF_INTEREST, classify, heading_level};
pub use index::{IndexEntry, SemanticIndex};
pub use render::{plain_text, render_markdown};
pub use schema::delta_schema;
