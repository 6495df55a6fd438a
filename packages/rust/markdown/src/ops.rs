//! Operation executor.
//!
//! Each operation is planned first (target validation, resolution, Markdown
//! conversion) without touching the tree. Only a complete plan is applied,
//! so a failed operation leaves the document exactly as it was.

use ego_tree::NodeId;
use tracing::{debug, instrument, warn};

use patchdown_shared::{Delta, Kind, Operation, PatchdownError, Result, TargetSpec};

use crate::index::SemanticIndex;
use crate::tree::Fragment;

/// Where the new nodes go.
enum Placement {
    Before(NodeId),
    After(NodeId),
    Replace(Vec<NodeId>),
    Remove(NodeId),
    AppendToBody,
}

struct Plan {
    placement: Placement,
    fragment: Option<Fragment>,
}

impl SemanticIndex {
    /// Apply one operation and rebuild the index.
    #[instrument(skip_all, fields(op = operation.name()))]
    pub fn execute(&mut self, operation: &Operation) -> Result<()> {
        let plan = self.plan(operation)?;
        self.apply(plan);
        self.rebuild();
        debug!(entries = self.len(), "operation applied");
        Ok(())
    }

    /// Apply every operation of a payload in order.
    ///
    /// All-or-nothing: on the first failure the document is restored to its
    /// state before the payload and the failing position is reported.
    #[instrument(
        skip_all,
        fields(
            placeholder_id = %delta.placeholder_id,
            language = %delta.language,
            operations = delta.operations.len()
        )
    )]
    pub fn apply_delta(&mut self, delta: &Delta) -> Result<()> {
        let snapshot = self.tree.snapshot();

        for (position, operation) in delta.operations.iter().enumerate() {
            if let Err(source) = self.execute(operation) {
                warn!(
                    position,
                    op = operation.name(),
                    error = %source,
                    "operation failed, rolling back delta"
                );
                self.tree.restore(snapshot);
                self.rebuild();
                return Err(PatchdownError::DeltaFailed {
                    position,
                    op: operation.name(),
                    source: Box::new(source),
                });
            }
        }

        Ok(())
    }

    fn plan(&self, operation: &Operation) -> Result<Plan> {
        match operation {
            Operation::ReplaceBlock {
                target,
                new_markdown,
            } => {
                let node = self.resolve(target)?;
                Ok(Plan {
                    placement: Placement::Replace(vec![node]),
                    fragment: Some(self.convert(new_markdown)?),
                })
            }
            Operation::InsertBefore {
                target,
                new_markdown,
            } => {
                let node = self.resolve(target)?;
                Ok(Plan {
                    placement: Placement::Before(node),
                    fragment: Some(self.convert(new_markdown)?),
                })
            }
            Operation::InsertAfter {
                target,
                new_markdown,
            } => {
                let node = self.resolve(target)?;
                Ok(Plan {
                    placement: Placement::After(node),
                    fragment: Some(self.convert(new_markdown)?),
                })
            }
            Operation::RemoveBlock { target } => Ok(Plan {
                placement: Placement::Remove(self.resolve(target)?),
                fragment: None,
            }),
            Operation::InsertAtEnd {
                new_markdown,
                section_title,
            } => {
                let placement = match section_title {
                    Some(title) => {
                        let heading = self.find_section(title)?;
                        let section = self.section_nodes(heading);
                        // section_nodes always starts with the heading itself
                        Placement::After(*section.last().unwrap_or(&heading.node))
                    }
                    None => Placement::AppendToBody,
                };
                Ok(Plan {
                    placement,
                    fragment: Some(self.convert(new_markdown)?),
                })
            }
            Operation::ReplaceSection {
                section_title,
                new_markdown,
            } => {
                let heading = self.find_section(section_title)?;
                let section = self.section_nodes(heading);
                Ok(Plan {
                    placement: Placement::Replace(section),
                    fragment: Some(self.convert(new_markdown)?),
                })
            }
            Operation::ReplaceComponent {
                target,
                new_markdown,
            } => {
                if self.validate_target(target)? != Kind::Component {
                    return Err(PatchdownError::InvalidTarget {
                        target: target.clone(),
                        recognized: vec![Kind::Component.as_str()],
                    });
                }
                let node = self.resolve(target)?;
                Ok(Plan {
                    placement: Placement::Replace(vec![node]),
                    fragment: Some(self.convert(new_markdown)?),
                })
            }
        }
    }

    /// Validate the target, then find its node.
    fn resolve(&self, target: &TargetSpec) -> Result<NodeId> {
        self.validate_target(target)?;
        Ok(self.find_target(target)?.node)
    }

    fn convert(&self, markdown: &str) -> Result<Fragment> {
        let fragment = Fragment::from_markdown(markdown, &self.config.markdown)?;
        if !fragment.has_content() {
            return Err(PatchdownError::malformed_markdown(
                "new_markdown produced no content",
            ));
        }
        Ok(fragment)
    }

    fn apply(&mut self, plan: Plan) {
        let nodes = plan
            .fragment
            .as_ref()
            .map(|fragment| self.tree.graft(fragment))
            .unwrap_or_default();

        match plan.placement {
            Placement::Before(anchor) => self.tree.insert_before(anchor, &nodes),
            Placement::After(anchor) => self.tree.insert_after(anchor, &nodes),
            Placement::Replace(targets) => self.tree.replace(&targets, &nodes),
            Placement::Remove(node) => self.tree.detach(node),
            Placement::AppendToBody => self.tree.append_to_body(&nodes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(html: &str) -> SemanticIndex {
        SemanticIndex::new(html).expect("index builds")
    }

    fn position(idx: &SemanticIndex, text: &str) -> usize {
        idx.entries()
            .iter()
            .position(|e| e.text == text)
            .unwrap_or_else(|| panic!("no entry with text {text:?}"))
    }

    fn replace_block(kind: &str, text: &str, markdown: &str) -> Operation {
        Operation::ReplaceBlock {
            target: TargetSpec::new(kind, text),
            new_markdown: markdown.into(),
        }
    }

    const SHIPPING: &str = "<h2>Shipping</h2>\
        <p>We offer fast delivery worldwide</p>\
        <h2>Returns</h2>\
        <p>Thirty days</p>";

    #[test]
    fn replace_block_swaps_paragraph() {
        let mut idx = index(SHIPPING);
        idx.execute(&replace_block(
            "paragraph",
            "We offer fast delivery worldwide",
            "We offer [fast delivery](/d) worldwide.",
        ))
        .unwrap();

        let md = idx.to_markdown();
        let html = idx.to_html();
        assert!(!md.contains("We offer fast delivery worldwide"));
        assert!(!html.contains("We offer fast delivery worldwide"));
        assert!(md.contains("[fast delivery](/d)"));
        assert!(html.contains("/d"));

        let shipping = md.find("## Shipping").expect("heading kept");
        let link = md.find("[fast delivery](/d)").expect("link present");
        let returns = md.find("## Returns").expect("heading kept");
        assert!(shipping < link && link < returns);
    }

    #[test]
    fn replace_block_with_several_blocks_keeps_order() {
        let mut idx = index(SHIPPING);
        idx.execute(&replace_block(
            "paragraph",
            "Thirty days",
            "Thirty days.\n\n- Unused items\n- Original packaging",
        ))
        .unwrap();

        let returns = position(&idx, "Returns");
        let para = position(&idx, "Thirty days.");
        let list = position(&idx, "Unused items Original packaging");
        assert!(returns < para && para < list);
    }

    #[test]
    fn insert_at_end_appends_after_everything() {
        let mut idx = index(SHIPPING);
        let before = idx.len();

        idx.execute(&Operation::InsertAtEnd {
            new_markdown: "## Footer".into(),
            section_title: None,
        })
        .unwrap();

        let footer = position(&idx, "Footer");
        assert_eq!(footer, before);
        assert_eq!(footer, idx.len() - 1);
        assert!(idx.to_markdown().ends_with("## Footer\n"));
    }

    #[test]
    fn insert_at_end_of_section() {
        let mut idx = index(SHIPPING);
        idx.execute(&Operation::InsertAtEnd {
            new_markdown: "Tracking included.".into(),
            section_title: Some("Shipping".into()),
        })
        .unwrap();

        let delivery = position(&idx, "We offer fast delivery worldwide");
        let added = position(&idx, "Tracking included.");
        let returns = position(&idx, "Returns");
        assert!(delivery < added && added < returns);
    }

    #[test]
    fn insert_before_and_after_target() {
        let mut idx = index(SHIPPING);
        idx.execute(&Operation::InsertBefore {
            target: TargetSpec::new("heading", "Returns"),
            new_markdown: "Questions? Call us.".into(),
        })
        .unwrap();
        idx.execute(&Operation::InsertAfter {
            target: TargetSpec::new("heading", "Returns").with_level(2),
            new_markdown: "> No receipt needed\n\nSee policy".into(),
        })
        .unwrap();

        let call = position(&idx, "Questions? Call us.");
        let returns = position(&idx, "Returns");
        let quote = position(&idx, "No receipt needed");
        let policy = position(&idx, "See policy");
        let days = position(&idx, "Thirty days");
        assert!(call < returns);
        assert!(returns < quote && quote < policy && policy < days);
    }

    #[test]
    fn remove_block_detaches_target() {
        let mut idx = index(SHIPPING);
        let generation = idx.generation();

        idx.execute(&Operation::RemoveBlock {
            target: TargetSpec::new("paragraph", "Thirty days"),
        })
        .unwrap();

        assert!(!idx.to_markdown().contains("Thirty days"));
        assert!(!idx.to_html().contains("Thirty days"));
        assert!(idx.generation() > generation);
        assert!(idx.entries().iter().all(|e| e.text != "Thirty days"));
    }

    #[test]
    fn replace_section_swaps_heading_and_body() {
        let html = "<h2>Intro</h2><p>Welcome</p>\
            <h2>Pricing</h2><p>Old price</p><h3>Details</h3><p>Fine print</p>\
            <h2>Contact</h2><p>Mail us</p>";
        let mut idx = index(html);

        idx.execute(&Operation::ReplaceSection {
            section_title: "Pricing".into(),
            new_markdown: "## Pricing\n\nNew price".into(),
        })
        .unwrap();

        let md = idx.to_markdown();
        assert!(md.contains("New price"));
        assert!(!md.contains("Old price"));
        assert!(!md.contains("Fine print"));
        assert!(md.contains("Mail us"));
        assert!(position(&idx, "Intro") < position(&idx, "Pricing"));
        assert!(position(&idx, "New price") < position(&idx, "Contact"));
    }

    #[test]
    fn replace_component_swaps_marked_subtree() {
        let html = r#"<p>Intro</p><div data-component="cta"><p>Buy now</p></div>"#;
        let mut idx = index(html);

        idx.execute(&Operation::ReplaceComponent {
            target: TargetSpec::new("component", "Buy now").with_component_type("cta"),
            new_markdown: "**Order today**".into(),
        })
        .unwrap();

        let md = idx.to_markdown();
        assert!(md.contains("Order today"));
        assert!(!md.contains("Buy now"));
        assert!(!idx.to_html().contains("data-component"));
    }

    #[test]
    fn replace_component_requires_component_kind() {
        let mut idx = index("<p>Buy now</p>");
        let err = idx
            .execute(&Operation::ReplaceComponent {
                target: TargetSpec::new("paragraph", "Buy now"),
                new_markdown: "x".into(),
            })
            .unwrap_err();

        match err {
            PatchdownError::InvalidTarget { recognized, .. } => {
                assert_eq!(recognized, ["component"]);
            }
            other => panic!("expected InvalidTarget, got {other}"),
        }
    }

    #[test]
    fn failed_operations_leave_document_untouched() {
        let mut idx = index("<p>Keep me</p><p>Keep me</p><p>Solo</p>");
        let html = idx.to_html();
        let generation = idx.generation();

        let ambiguous = idx.execute(&replace_block("paragraph", "Keep me", "x"));
        assert!(matches!(ambiguous, Err(PatchdownError::AmbiguousTarget { .. })));

        let invalid = idx.execute(&replace_block("footnote", "Solo", "x"));
        assert!(matches!(invalid, Err(PatchdownError::InvalidTarget { .. })));

        let blank = idx.execute(&replace_block("paragraph", "Solo", "   "));
        assert!(matches!(blank, Err(PatchdownError::MalformedMarkdown { .. })));

        assert_eq!(idx.to_html(), html);
        assert_eq!(idx.generation(), generation);
    }

    #[test]
    fn entries_reflect_post_mutation_tree() {
        let mut idx = index("<h1>Title</h1><p>Draft</p>");
        idx.execute(&replace_block("paragraph", "Draft", "Final *copy*"))
            .unwrap();

        let texts: Vec<&str> = idx.entries().iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, ["Title", "Final copy"]);
        assert_eq!(idx.to_markdown(), "# Title\n\nFinal copy\n\n");
    }

    #[test]
    fn repeated_edits_keep_arena_bounded() {
        let mut idx = index("<p>a</p>");
        for round in 0..50 {
            let current = if round == 0 { "a".to_string() } else { format!("a{}", round - 1) };
            idx.execute(&replace_block("paragraph", &current, &format!("a{round}")))
                .unwrap();
        }

        assert_eq!(idx.to_markdown(), "a49\n\n");
        let (arena, live) = (idx.tree.arena_len(), idx.tree.live_len());
        assert!(arena <= (live * 2).max(64), "arena={arena} live={live}");
    }

    #[test]
    fn delta_applies_operations_in_order() {
        let mut idx = index(SHIPPING);
        let delta = Delta::from_json(
            r#"{
                "placeholder_id": "main",
                "language": "en",
                "operations": [
                    {"op": "insert_at_end", "new_markdown": "Last line"},
                    {"op": "replace_block",
                     "target": {"kind": "paragraph", "match": "Last line"},
                     "new_markdown": "Really the last line"}
                ]
            }"#,
        )
        .unwrap();

        idx.apply_delta(&delta).unwrap();
        assert!(idx.to_markdown().ends_with("Really the last line\n\n"));
        assert!(!idx.to_markdown().contains("\nLast line"));
    }

    #[test]
    fn delta_rolls_back_on_failure() {
        let mut idx = index(SHIPPING);
        let html = idx.to_html();
        let markdown = idx.to_markdown();

        let delta = Delta {
            placeholder_id: "main".into(),
            language: "en".into(),
            operations: vec![
                Operation::InsertAtEnd {
                    new_markdown: "## Footer".into(),
                    section_title: None,
                },
                Operation::RemoveBlock {
                    target: TargetSpec::new("paragraph", "Not on the page"),
                },
            ],
        };

        let err = idx.apply_delta(&delta).unwrap_err();
        match &err {
            PatchdownError::DeltaFailed { position, op, source } => {
                assert_eq!(*position, 1);
                assert_eq!(*op, "remove_block");
                assert!(matches!(**source, PatchdownError::NoMatch { .. }));
            }
            other => panic!("expected DeltaFailed, got {other}"),
        }
        assert_eq!(idx.to_html(), html);
        assert_eq!(idx.to_markdown(), markdown);
    }
}
