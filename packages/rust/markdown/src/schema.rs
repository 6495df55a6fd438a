//! JSON Schema (draft 2020-12) describing the delta payload.

use serde_json::{Value, json};

use patchdown_shared::{Kind, OPERATION_NAMES};

/// Kinds a caller is expected to target. List items and inline code resolve
/// too, but are not advertised.
const TARGET_KINDS: [Kind; 8] = [
    Kind::Heading,
    Kind::Paragraph,
    Kind::List,
    Kind::Blockquote,
    Kind::Image,
    Kind::Table,
    Kind::CodeBlock,
    Kind::Component,
];

/// Build the schema document for a delta payload.
pub fn delta_schema() -> Value {
    let kinds: Vec<&str> = TARGET_KINDS.iter().map(|kind| kind.as_str()).collect();
    let one_of: Vec<Value> = OPERATION_NAMES
        .iter()
        .map(|name| json!({ "$ref": format!("#/$defs/{name}") }))
        .collect();

    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "https://example.com/schemas/page-delta.schema.json",
        "title": "ContentDelta",
        "type": "object",
        "required": ["placeholder_id", "language", "operations"],
        "additionalProperties": false,
        "properties": {
            "placeholder_id": {
                "type": "string",
                "description": "Identifier of the placeholder being edited"
            },
            "language": {
                "type": "string",
                "description": "Language code for the content (e.g. en, de, fr)"
            },
            "operations": {
                "type": "array",
                "minItems": 1,
                "items": { "$ref": "#/$defs/operation" },
                "description": "Ordered list of operations applied sequentially"
            }
        },
        "$defs": {
            "operation": { "oneOf": one_of },
            "target": {
                "type": "object",
                "required": ["kind", "match"],
                "additionalProperties": false,
                "properties": {
                    "kind": { "type": "string", "enum": kinds },
                    "match": {
                        "type": "string",
                        "description": "Visible text used to identify the target node"
                    },
                    "level": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": 6,
                        "description": "Heading level, narrows heading matches"
                    },
                    "component_type": {
                        "type": "string",
                        "description": "Component type when kind=component (e.g. cta, card, hero)"
                    }
                }
            },
            "replace_block": targeted("replace_block", "Markdown content that fully replaces the block"),
            "insert_after": targeted("insert_after", "Markdown inserted right after the target"),
            "insert_before": targeted("insert_before", "Markdown inserted right before the target"),
            "replace_component": targeted("replace_component", "Markdown that replaces the whole component"),
            "replace_section": {
                "type": "object",
                "required": ["op", "section_title", "new_markdown"],
                "additionalProperties": false,
                "properties": {
                    "op": { "const": "replace_section" },
                    "section_title": {
                        "type": "string",
                        "description": "Exact visible text of the section heading"
                    },
                    "new_markdown": {
                        "type": "string",
                        "description": "Markdown for the entire replacement section"
                    }
                }
            },
            "insert_at_end": {
                "type": "object",
                "required": ["op", "new_markdown"],
                "additionalProperties": false,
                "properties": {
                    "op": { "const": "insert_at_end" },
                    "section_title": {
                        "type": "string",
                        "description": "Optional section title to append to; otherwise page end"
                    },
                    "new_markdown": { "type": "string" }
                }
            },
            "remove_block": {
                "type": "object",
                "required": ["op", "target"],
                "additionalProperties": false,
                "properties": {
                    "op": { "const": "remove_block" },
                    "target": { "$ref": "#/$defs/target" }
                }
            }
        }
    })
}

fn targeted(op: &str, description: &str) -> Value {
    json!({
        "type": "object",
        "required": ["op", "target", "new_markdown"],
        "additionalProperties": false,
        "properties": {
            "op": { "const": op },
            "target": { "$ref": "#/$defs/target" },
            "new_markdown": { "type": "string", "description": description }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_operation_has_a_definition() {
        let schema = delta_schema();
        let defs = &schema["$defs"];
        for name in OPERATION_NAMES {
            assert!(defs[name].is_object(), "missing $defs/{name}");
            assert_eq!(defs[name]["properties"]["op"]["const"], name);
        }
        assert_eq!(
            defs["operation"]["oneOf"].as_array().map(Vec::len),
            Some(OPERATION_NAMES.len())
        );
    }

    #[test]
    fn target_kinds_are_advertised() {
        let schema = delta_schema();
        let kinds = schema["$defs"]["target"]["properties"]["kind"]["enum"]
            .as_array()
            .cloned()
            .unwrap_or_default();
        assert_eq!(kinds.len(), 8);
        assert!(kinds.contains(&json!("code_block")));
        assert!(kinds.contains(&json!("component")));
        assert!(!kinds.contains(&json!("list_item")));

        for kind in kinds {
            let name = kind.as_str().unwrap_or_default();
            assert!(Kind::from_name(name).is_some(), "{name} does not resolve");
        }
    }

    #[test]
    fn payload_requires_operations() {
        let schema = delta_schema();
        assert_eq!(schema["properties"]["operations"]["minItems"], 1);
        assert_eq!(schema["additionalProperties"], false);
    }
}
