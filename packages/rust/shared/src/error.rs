//! Error types for patchdown.
//!
//! Library crates use [`PatchdownError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Target and operation errors carry structured data ([`PatchdownError::data`])
//! and a stable code ([`PatchdownError::code`]) so a transport layer can turn
//! them into its own error envelope without re-deriving the failure.

use std::path::PathBuf;

use serde::Serialize;
use serde_json::{Value, json};

use crate::types::TargetSpec;

/// Why a target may have matched nothing.
pub const NO_MATCH_REASONS: &[&str] = &[
    "The text does not exist on the placeholder",
    "The wording differs slightly",
    "The content belongs to a different block type",
    "The content is inside a different placeholder",
];

/// Remediation hints for a target that matched nothing.
pub const NO_MATCH_SUGGESTIONS: &[&str] = &[
    "Use a shorter or more general match string",
    "Re-check the placeholder content and try again",
    "Target the surrounding section using replace_section",
    "Insert new content instead of replacing existing content",
];

/// Remediation hints for a target that matched several blocks.
pub const AMBIGUOUS_SUGGESTIONS: &[&str] = &[
    "Use a longer or more specific match string",
    "Choose a different block type if appropriate",
];

/// Why a target kind may have been rejected.
pub const INVALID_TARGET_REASONS: &[&str] = &[
    "No kind has been specified",
    "The kind is not recognized",
];

/// One block that matched an ambiguous target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub kind: String,
    pub text: String,
}

/// Top-level error type for all patchdown operations.
#[derive(Debug, thiserror::Error)]
pub enum PatchdownError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// HTML parsing error (document without a body, unreadable fragment).
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Payload validation error (schema mismatch, empty operation list, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// The target kind is not one of the recognized kinds.
    #[error("invalid target kind: {:?}", .target.kind)]
    InvalidTarget {
        target: TargetSpec,
        recognized: Vec<&'static str>,
    },

    /// No index entry satisfies the target.
    #[error("no content block matches the specified target")]
    NoMatch { target: TargetSpec },

    /// Two or more index entries satisfy the target.
    #[error(
        "{matches_found} content blocks match the specified target; \
         the operation cannot be applied unambiguously"
    )]
    AmbiguousTarget {
        target: TargetSpec,
        matches_found: usize,
        candidates: Vec<Candidate>,
    },

    /// Operation name outside the fixed operation set.
    #[error("unknown operation {op:?}; expected one of: {}", .valid.join(", "))]
    UnknownOperation {
        op: String,
        valid: Vec<&'static str>,
    },

    /// Markdown that produced no usable content.
    #[error("malformed markdown: {message}")]
    MalformedMarkdown { message: String },

    /// An operation inside a delta payload failed; the payload was rolled back.
    #[error("operation {position} ({op}) failed: {source}")]
    DeltaFailed {
        position: usize,
        op: &'static str,
        source: Box<PatchdownError>,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PatchdownError>;

impl PatchdownError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a malformed-markdown error from any displayable message.
    pub fn malformed_markdown(msg: impl Into<String>) -> Self {
        Self::MalformedMarkdown {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Stable, machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config_error",
            Self::Io { .. } => "io_error",
            Self::Parse { .. } => "parse_error",
            Self::Validation { .. } => "invalid_data",
            Self::InvalidTarget { .. } => "invalid_target",
            Self::NoMatch { .. } => "no_match",
            Self::AmbiguousTarget { .. } => "ambiguous_target",
            Self::UnknownOperation { .. } => "unknown_operation",
            Self::MalformedMarkdown { .. } => "malformed_markdown",
            Self::DeltaFailed { source, .. } => source.code(),
        }
    }

    /// Structured payload describing the failure.
    pub fn data(&self) -> Value {
        match self {
            Self::InvalidTarget { target, recognized } => json!({
                "target": target,
                "possible_reasons": INVALID_TARGET_REASONS,
                "suggestions": [
                    "Provide a kind that is recognized by the tool.",
                    format!("Ensure that kind is one of {}", recognized.join(", ")),
                ],
            }),
            Self::NoMatch { target } => json!({
                "target": target,
                "possible_reasons": NO_MATCH_REASONS,
                "suggestions": NO_MATCH_SUGGESTIONS,
            }),
            Self::AmbiguousTarget {
                target,
                matches_found,
                candidates,
            } => json!({
                "target": target,
                "matches_found": matches_found,
                "candidates": candidates,
                "suggestions": AMBIGUOUS_SUGGESTIONS,
            }),
            Self::UnknownOperation { op, valid } => json!({
                "op": op,
                "valid_operations": valid,
            }),
            Self::DeltaFailed {
                position,
                op,
                source,
            } => json!({
                "position": position,
                "op": op,
                "code": source.code(),
                "message": source.to_string(),
                "detail": source.data(),
            }),
            other => json!({ "message": other.to_string() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(kind: &str, text: &str) -> TargetSpec {
        TargetSpec::new(kind, text)
    }

    #[test]
    fn error_display_formatting() {
        let err = PatchdownError::config("missing wrapper attribute");
        assert_eq!(err.to_string(), "config error: missing wrapper attribute");

        let err = PatchdownError::UnknownOperation {
            op: "shuffle".into(),
            valid: vec!["insert_before", "insert_after"],
        };
        assert!(err.to_string().contains("insert_before, insert_after"));
    }

    #[test]
    fn ambiguous_target_data_lists_candidates() {
        let err = PatchdownError::AmbiguousTarget {
            target: target("paragraph", "Keep me"),
            matches_found: 2,
            candidates: vec![
                Candidate {
                    kind: "paragraph".into(),
                    text: "Keep me".into(),
                },
                Candidate {
                    kind: "paragraph".into(),
                    text: "Keep me".into(),
                },
            ],
        };

        let data = err.data();
        assert_eq!(err.code(), "ambiguous_target");
        assert_eq!(data["matches_found"], 2);
        assert_eq!(data["candidates"].as_array().map(Vec::len), Some(2));
        assert_eq!(data["target"]["match"], "Keep me");
    }

    #[test]
    fn no_match_data_carries_suggestions() {
        let err = PatchdownError::NoMatch {
            target: target("heading", "Missing"),
        };
        let data = err.data();
        assert_eq!(err.code(), "no_match");
        assert_eq!(
            data["suggestions"].as_array().map(Vec::len),
            Some(NO_MATCH_SUGGESTIONS.len())
        );
    }

    #[test]
    fn delta_failure_reports_inner_code() {
        let err = PatchdownError::DeltaFailed {
            position: 1,
            op: "remove_block",
            source: Box::new(PatchdownError::NoMatch {
                target: target("paragraph", "Gone"),
            }),
        };
        assert_eq!(err.code(), "no_match");
        assert_eq!(err.data()["position"], 1);
        assert!(err.to_string().starts_with("operation 1 (remove_block) failed"));
    }
}
