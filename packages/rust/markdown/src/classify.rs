//! Tag tables: which elements are indexed, which are skipped, and how tags map to kinds.

use patchdown_shared::Kind;

/// Elements that produce an index entry when visited.
pub const TAGS_OF_INTEREST: &[&str] = &[
    // headings
    "h1", "h2", "h3", "h4", "h5", "h6",
    // paragraphs
    "p", "blockquote",
    // lists
    "ul", "ol", "li",
    // links
    "a",
    // images
    "img", "figure",
    // code
    "code", "pre",
    // tables
    "table",
    // sections
    "section", "article", "aside",
];

/// Elements whose subtree is never descended into.
pub const IGNORED_TAGS: &[&str] = &[
    "script", "style", "nav", "header", "footer", "head", "button", "form", "template",
];

const KIND_TABLE: &[(&str, Kind)] = &[
    ("h1", Kind::Heading),
    ("h2", Kind::Heading),
    ("h3", Kind::Heading),
    ("h4", Kind::Heading),
    ("h5", Kind::Heading),
    ("h6", Kind::Heading),
    ("p", Kind::Paragraph),
    ("ul", Kind::List),
    ("ol", Kind::List),
    ("li", Kind::ListItem),
    ("blockquote", Kind::Blockquote),
    ("code", Kind::Code),
    ("pre", Kind::CodeBlock),
    ("img", Kind::Image),
    ("figure", Kind::Image),
    ("table", Kind::Table),
];

/// Map a tag name to its kind. Links and sections have none.
pub fn classify(tag: &str) -> Option<Kind> {
    KIND_TABLE
        .iter()
        .find(|(name, _)| *name == tag)
        .map(|(_, kind)| *kind)
}

pub fn is_of_interest(tag: &str) -> bool {
    TAGS_OF_INTEREST.contains(&tag)
}

pub fn is_ignored(tag: &str) -> bool {
    IGNORED_TAGS.contains(&tag)
}

/// Depth of a heading tag, clamped to 1–6. `None` for non-headings.
pub fn heading_level(tag: &str) -> Option<u8> {
    let digits = tag.strip_prefix('h')?;
    let level: u8 = digits.parse().ok()?;
    if digits.len() != 1 {
        return None;
    }
    Some(level.clamp(1, 6))
}
