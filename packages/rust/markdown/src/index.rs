//! The semantic index: an ordered, derived view of a document's content blocks.
//!
//! The index is never patched in place. Every mutation discards it and walks
//! the tree again, bumping [`SemanticIndex::generation`].

use ego_tree::NodeId;
use scraper::ElementRef;
use tracing::{debug, instrument};

use patchdown_shared::{EngineConfig, Kind, Result};

use crate::classify::{classify, heading_level, is_ignored, is_of_interest};
use crate::render::{plain_text, render_markdown};
use crate::tree::DocumentTree;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// One recognized content block, in document order.
///
/// Entries are only reachable through a shared borrow of the index, so an
/// entry can never outlive the tree state it describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Classification; `None` for links and sectioning elements.
    pub kind: Option<Kind>,
    /// Original HTML tag name.
    pub tag: String,
    /// Whitespace-normalized visible text.
    pub text: String,
    /// Markdown for this node alone.
    pub markdown: String,
    /// Heading depth for h1–h6.
    pub level: Option<u8>,
    /// Component type for component-marked elements.
    pub component_type: Option<String>,
    pub(crate) node: NodeId,
}

/// A parsed document plus its semantic index.
pub struct SemanticIndex {
    pub(crate) tree: DocumentTree,
    pub(crate) config: EngineConfig,
    entries: Vec<IndexEntry>,
    visited: usize,
    generation: u64,
}

impl SemanticIndex {
    /// Parse `html` with the default engine config and build the index.
    pub fn new(html: &str) -> Result<Self> {
        Self::with_config(html, EngineConfig::default())
    }

    /// Parse `html` and build the index using `config`.
    #[instrument(skip(html, config), fields(html_len = html.len()))]
    pub fn with_config(html: &str, config: EngineConfig) -> Result<Self> {
        let tree = DocumentTree::parse(html)?;
        let mut index = Self {
            tree,
            config,
            entries: Vec::new(),
            visited: 0,
            generation: 0,
        };
        index.rebuild();
        Ok(index)
    }

    /// All entries in document order.
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Incremented by every rebuild; entries from an older generation are gone.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Entry markdown joined by newlines.
    pub fn to_markdown(&self) -> String {
        self.entries
            .iter()
            .map(|entry| entry.markdown.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Serialized children of the document body.
    pub fn to_html(&self) -> String {
        self.tree.body_inner_html()
    }

    /// Indexed entries per visited element; a rough "is this real content" signal.
    pub fn content_score(&self) -> f64 {
        if self.visited == 0 {
            return 0.0;
        }
        self.entries.len() as f64 / self.visited as f64
    }

    /// Discard the index and rebuild it from the current tree.
    ///
    /// The arena is compacted first when detached nodes dominate it, so node
    /// ids are only valid until the next rebuild.
    pub(crate) fn rebuild(&mut self) {
        self.tree.compact();

        let mut walker = Walker {
            config: &self.config,
            entries: Vec::new(),
            visited: 0,
        };

        for child in self.tree.root().children().filter_map(ElementRef::wrap) {
            walker.visit(child);
        }

        let Walker {
            entries, visited, ..
        } = walker;
        self.entries = entries;
        self.visited = visited;
        self.generation += 1;

        debug!(
            entries = self.entries.len(),
            visited = self.visited,
            generation = self.generation,
            "semantic index rebuilt"
        );
    }
}

impl std::fmt::Debug for SemanticIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticIndex")
            .field("entries", &self.entries.len())
            .field("visited", &self.visited)
            .field("generation", &self.generation)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Traversal
// ---------------------------------------------------------------------------

struct Walker<'c> {
    config: &'c EngineConfig,
    entries: Vec<IndexEntry>,
    visited: usize,
}

impl Walker<'_> {
    /// Pre-order visit: count, maybe index, then descend unless skipped.
    fn visit(&mut self, el: ElementRef<'_>) {
        self.visited += 1;

        if self.is_wrapper(el) {
            return;
        }

        let tag = el.value().name();
        let component_type = el.value().attr(&self.config.components.attribute);

        if component_type.is_some() || is_of_interest(tag) {
            self.entries.push(IndexEntry {
                kind: if component_type.is_some() {
                    Some(Kind::Component)
                } else {
                    classify(tag)
                },
                tag: tag.to_string(),
                text: plain_text(el),
                markdown: render_markdown(el),
                level: heading_level(tag),
                component_type: component_type.map(str::to_string),
                node: el.id(),
            });
        }

        if is_ignored(tag) {
            return;
        }
        for child in el.children().filter_map(ElementRef::wrap) {
            self.visit(child);
        }
    }

    fn is_wrapper(&self, el: ElementRef<'_>) -> bool {
        let wrapper = &self.config.wrapper;
        el.value().attr(&wrapper.attribute) == Some(wrapper.value.as_str())
    }
}
