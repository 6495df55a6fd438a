//! Wire and domain types for patch payloads.
//!
//! A [`Delta`] is the JSON object a caller submits to edit one placeholder:
//! an ordered list of [`Operation`]s, most of which locate their block through
//! a [`TargetSpec`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PatchdownError, Result};

// ---------------------------------------------------------------------------
// Kind
// ---------------------------------------------------------------------------

/// Coarse content classification used for target matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Heading,
    Paragraph,
    List,
    ListItem,
    Blockquote,
    Code,
    CodeBlock,
    Image,
    Table,
    Component,
}

impl Kind {
    /// Every recognized kind, in a stable order.
    pub const ALL: [Kind; 10] = [
        Kind::Heading,
        Kind::Paragraph,
        Kind::List,
        Kind::ListItem,
        Kind::Blockquote,
        Kind::Code,
        Kind::CodeBlock,
        Kind::Image,
        Kind::Table,
        Kind::Component,
    ];

    /// Wire name of the kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Heading => "heading",
            Kind::Paragraph => "paragraph",
            Kind::List => "list",
            Kind::ListItem => "list_item",
            Kind::Blockquote => "blockquote",
            Kind::Code => "code",
            Kind::CodeBlock => "code_block",
            Kind::Image => "image",
            Kind::Table => "table",
            Kind::Component => "component",
        }
    }

    /// Look up a kind by its wire name.
    pub fn from_name(name: &str) -> Option<Kind> {
        Kind::ALL.into_iter().find(|k| k.as_str() == name)
    }

    /// Wire names of every recognized kind.
    pub fn names() -> Vec<&'static str> {
        Kind::ALL.iter().map(|k| k.as_str()).collect()
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// TargetSpec
// ---------------------------------------------------------------------------

/// Identifies exactly one block by kind and visible text.
///
/// `kind` stays a plain string so an unrecognized value can be reported as
/// [`PatchdownError::InvalidTarget`] instead of a generic decode failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetSpec {
    pub kind: String,
    /// Exact visible text of the block.
    #[serde(rename = "match")]
    pub match_text: String,
    /// Heading depth (1–6); narrows heading targets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
    /// Component type when `kind` is `component` (e.g. cta, card, hero).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_type: Option<String>,
}

impl TargetSpec {
    pub fn new(kind: impl Into<String>, match_text: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            match_text: match_text.into(),
            level: None,
            component_type: None,
        }
    }

    pub fn with_level(mut self, level: u8) -> Self {
        self.level = Some(level);
        self
    }

    pub fn with_component_type(mut self, component_type: impl Into<String>) -> Self {
        self.component_type = Some(component_type.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Operation
// ---------------------------------------------------------------------------

/// Names of every operation, in wire spelling.
pub const OPERATION_NAMES: [&str; 7] = [
    "replace_block",
    "replace_section",
    "insert_after",
    "insert_before",
    "insert_at_end",
    "remove_block",
    "replace_component",
];

/// One atomic document mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", deny_unknown_fields)]
pub enum Operation {
    /// Replace the target block with the given Markdown.
    ReplaceBlock {
        target: TargetSpec,
        new_markdown: String,
    },
    /// Replace a heading and everything up to the next heading of equal or higher rank.
    ReplaceSection {
        section_title: String,
        new_markdown: String,
    },
    InsertAfter {
        target: TargetSpec,
        new_markdown: String,
    },
    InsertBefore {
        target: TargetSpec,
        new_markdown: String,
    },
    /// Append to the page, or to the end of a section when `section_title` is set.
    InsertAtEnd {
        new_markdown: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        section_title: Option<String>,
    },
    RemoveBlock {
        target: TargetSpec,
    },
    /// Replace a component-marked subtree.
    ReplaceComponent {
        target: TargetSpec,
        new_markdown: String,
    },
}

impl Operation {
    /// Wire name of the operation.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::ReplaceBlock { .. } => "replace_block",
            Operation::ReplaceSection { .. } => "replace_section",
            Operation::InsertAfter { .. } => "insert_after",
            Operation::InsertBefore { .. } => "insert_before",
            Operation::InsertAtEnd { .. } => "insert_at_end",
            Operation::RemoveBlock { .. } => "remove_block",
            Operation::ReplaceComponent { .. } => "replace_component",
        }
    }

    /// The target spec, for operations that take one.
    pub fn target(&self) -> Option<&TargetSpec> {
        match self {
            Operation::ReplaceBlock { target, .. }
            | Operation::InsertAfter { target, .. }
            | Operation::InsertBefore { target, .. }
            | Operation::RemoveBlock { target }
            | Operation::ReplaceComponent { target, .. } => Some(target),
            Operation::ReplaceSection { .. } | Operation::InsertAtEnd { .. } => None,
        }
    }

    /// Parse a single operation object, rejecting unknown `op` names explicitly.
    pub fn from_value(value: Value) -> Result<Self> {
        check_op_name(&value)?;
        serde_json::from_value(value)
            .map_err(|e| PatchdownError::validation(format!("invalid operation: {e}")))
    }
}

fn check_op_name(value: &Value) -> Result<()> {
    let op = value
        .get("op")
        .and_then(Value::as_str)
        .ok_or_else(|| PatchdownError::validation("operation is missing the \"op\" field"))?;

    if OPERATION_NAMES.contains(&op) {
        Ok(())
    } else {
        Err(PatchdownError::UnknownOperation {
            op: op.to_string(),
            valid: OPERATION_NAMES.to_vec(),
        })
    }
}

// ---------------------------------------------------------------------------
// Delta
// ---------------------------------------------------------------------------

/// A full edit payload for one placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Delta {
    /// Identifier of the placeholder being edited.
    pub placeholder_id: String,
    /// Language code for the content (e.g. en, de, fr).
    pub language: String,
    /// Applied sequentially, each against the state left by the previous one.
    pub operations: Vec<Operation>,
}

impl Delta {
    /// Parse and validate a delta payload from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| PatchdownError::validation(format!("payload is not valid JSON: {e}")))?;
        Self::from_value(value)
    }

    /// Validate a delta payload that is already decoded into a JSON value.
    pub fn from_value(value: Value) -> Result<Self> {
        let operations = value
            .get("operations")
            .and_then(Value::as_array)
            .ok_or_else(|| PatchdownError::validation("payload must contain an \"operations\" array"))?;

        if operations.is_empty() {
            return Err(PatchdownError::validation(
                "payload must contain at least one operation",
            ));
        }
        for op in operations {
            check_op_name(op)?;
        }

        let delta: Delta = serde_json::from_value(value)
            .map_err(|e| PatchdownError::validation(format!("invalid delta payload: {e}")))?;

        for (position, op) in delta.operations.iter().enumerate() {
            if let Some(level) = op.target().and_then(|target| target.level) {
                if !(1..=6).contains(&level) {
                    return Err(PatchdownError::validation(format!(
                        "operation {position}: heading level must be between 1 and 6, got {level}"
                    )));
                }
            }
        }

        Ok(delta)
    }
}
