//! Owned, mutable HTML document tree.
//!
//! Wraps a `scraper::Html` whose `ego_tree` arena hands out [`NodeId`]s.
//! Nodes are never freed from the arena: a detached node keeps its id but is
//! unreachable from the root, so ids taken from the current index stay valid
//! for the mutation that consumes them.

use ego_tree::{NodeId, NodeRef, Tree};
use pulldown_cmark::{Options, Parser};
use scraper::{ElementRef, Html, Node};
use tracing::debug;

use patchdown_shared::{MarkdownConfig, PatchdownError, Result};

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

/// Arena size below which compaction is never worth a copy.
const COMPACT_MIN_NODES: usize = 64;

/// Parse a full document and drop every comment node.
fn parse_without_comments(html: &str) -> Html {
    let mut doc = Html::parse_document(html);

    let comments: Vec<NodeId> = doc
        .tree
        .root()
        .descendants()
        .filter(|node| node.value().is_comment())
        .map(|node| node.id())
        .collect();

    for id in &comments {
        if let Some(mut node) = doc.tree.get_mut(*id) {
            node.detach();
        }
    }

    doc
}

/// Locate `<body>` (a direct child of `<html>`).
fn find_body(doc: &Html) -> Result<NodeId> {
    doc.tree
        .root()
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "html")
        .flat_map(|html| html.children().filter_map(ElementRef::wrap))
        .find(|el| el.value().name() == "body")
        .map(|body| body.id())
        .ok_or_else(|| PatchdownError::parse("document has no <body> element"))
}

// ---------------------------------------------------------------------------
// Fragment
// ---------------------------------------------------------------------------

/// Nodes produced from caller-supplied Markdown, not yet attached anywhere.
pub(crate) struct Fragment {
    doc: Html,
    body: NodeId,
}

impl Fragment {
    /// Convert Markdown to HTML and parse it; the fragment is the body's children.
    pub(crate) fn from_markdown(markdown: &str, config: &MarkdownConfig) -> Result<Self> {
        let mut options = Options::empty();
        if config.tables {
            options.insert(Options::ENABLE_TABLES);
        }
        if config.strikethrough {
            options.insert(Options::ENABLE_STRIKETHROUGH);
        }

        let mut html = String::new();
        pulldown_cmark::html::push_html(&mut html, Parser::new_ext(markdown, options));

        let doc = parse_without_comments(&html);
        let body = find_body(&doc)
            .map_err(|e| PatchdownError::malformed_markdown(format!("converted HTML unusable: {e}")))?;

        debug!(markdown_len = markdown.len(), html_len = html.len(), "markdown converted");
        Ok(Self { doc, body })
    }

    fn top_level(&self) -> impl Iterator<Item = NodeRef<'_, Node>> {
        self.doc
            .tree
            .get(self.body)
            .into_iter()
            .flat_map(|body| body.children())
    }

    /// `true` when the fragment holds at least one element or non-blank text.
    pub(crate) fn has_content(&self) -> bool {
        self.top_level().any(|node| match node.value() {
            Node::Element(_) => true,
            Node::Text(text) => !text.trim().is_empty(),
            _ => false,
        })
    }
}

// ---------------------------------------------------------------------------
// DocumentTree
// ---------------------------------------------------------------------------

/// The document being edited. Exclusively owned by one `SemanticIndex`.
pub(crate) struct DocumentTree {
    doc: Html,
    body: NodeId,
}

impl DocumentTree {
    pub(crate) fn parse(html: &str) -> Result<Self> {
        let doc = parse_without_comments(html);
        let body = find_body(&doc)?;
        Ok(Self { doc, body })
    }

    pub(crate) fn root(&self) -> NodeRef<'_, Node> {
        self.doc.tree.root()
    }

    pub(crate) fn node(&self, id: NodeId) -> Option<NodeRef<'_, Node>> {
        self.doc.tree.get(id)
    }

    /// Serialized children of `<body>`.
    pub(crate) fn body_inner_html(&self) -> String {
        self.node(self.body)
            .and_then(ElementRef::wrap)
            .map(|body| body.inner_html())
            .unwrap_or_default()
    }

    /// Deep-copy a fragment into this tree's arena as detached subtrees.
    ///
    /// Returns the new top-level ids in document order.
    pub(crate) fn graft(&mut self, fragment: &Fragment) -> Vec<NodeId> {
        fragment
            .top_level()
            .map(|node| copy_subtree(&mut self.doc.tree, node))
            .collect()
    }

    /// Nodes held by the arena, detached ones included.
    pub(crate) fn arena_len(&self) -> usize {
        self.doc.tree.values().count()
    }

    /// Nodes reachable from the document root.
    pub(crate) fn live_len(&self) -> usize {
        self.doc.tree.root().descendants().count()
    }

    /// Copy the reachable tree into a fresh arena once detached nodes
    /// outnumber live ones. Every previously issued id is stale afterwards.
    pub(crate) fn compact(&mut self) -> bool {
        let total = self.arena_len();
        let live = self.live_len();
        if total < COMPACT_MIN_NODES || total <= live * 2 {
            return false;
        }

        let root = self.doc.tree.root();
        let mut fresh = Tree::new(root.value().clone());
        let fresh_root = fresh.root().id();
        for child in root.children() {
            let id = copy_subtree(&mut fresh, child);
            if let Some(mut parent) = fresh.get_mut(fresh_root) {
                parent.append_id(id);
            }
        }

        let old = std::mem::replace(&mut self.doc.tree, fresh);
        match find_body(&self.doc) {
            Ok(body) => {
                self.body = body;
                debug!(before = total, after = live, "document arena compacted");
                true
            }
            Err(_) => {
                self.doc.tree = old;
                false
            }
        }
    }

    /// Attach `nodes` immediately before `anchor`, keeping their order.
    pub(crate) fn insert_before(&mut self, anchor: NodeId, nodes: &[NodeId]) {
        for &id in nodes {
            if let Some(mut target) = self.doc.tree.get_mut(anchor) {
                target.insert_id_before(id);
            }
        }
    }

    /// Attach `nodes` immediately after `anchor`, keeping their order.
    pub(crate) fn insert_after(&mut self, anchor: NodeId, nodes: &[NodeId]) {
        let mut cursor = anchor;
        for &id in nodes {
            if let Some(mut target) = self.doc.tree.get_mut(cursor) {
                target.insert_id_after(id);
                cursor = id;
            }
        }
    }

    /// Append `nodes` as the last children of `<body>`.
    pub(crate) fn append_to_body(&mut self, nodes: &[NodeId]) {
        for &id in nodes {
            if let Some(mut body) = self.doc.tree.get_mut(self.body) {
                body.append_id(id);
            }
        }
    }

    /// Put `nodes` where the first of `targets` stands, then detach every target.
    pub(crate) fn replace(&mut self, targets: &[NodeId], nodes: &[NodeId]) {
        if let Some(&first) = targets.first() {
            self.insert_before(first, nodes);
        }
        for &id in targets {
            self.detach(id);
        }
    }

    pub(crate) fn detach(&mut self, id: NodeId) {
        if let Some(mut node) = self.doc.tree.get_mut(id) {
            node.detach();
        }
    }

    pub(crate) fn snapshot(&self) -> Snapshot {
        Snapshot {
            tree: self.doc.tree.clone(),
            body: self.body,
        }
    }

    /// Restore a snapshot taken from this same document.
    pub(crate) fn restore(&mut self, snapshot: Snapshot) {
        self.doc.tree = snapshot.tree;
        self.body = snapshot.body;
    }
}

/// Saved document state; `body` belongs to `tree`, which may differ from
/// the live arena after a compaction.
pub(crate) struct Snapshot {
    tree: Tree<Node>,
    body: NodeId,
}

/// Recursively copy `src` into `dst` as a detached subtree.
fn copy_subtree(dst: &mut Tree<Node>, src: NodeRef<'_, Node>) -> NodeId {
    let id = dst.orphan(src.value().clone()).id();
    for child in src.children() {
        let child_id = copy_subtree(dst, child);
        if let Some(mut parent) = dst.get_mut(id) {
            parent.append_id(child_id);
        }
    }
    id
}
