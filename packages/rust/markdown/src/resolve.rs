//! Target resolution: find exactly one index entry for a [`TargetSpec`].

use ego_tree::NodeId;
use scraper::ElementRef;
use tracing::debug;

use patchdown_shared::{Candidate, Kind, PatchdownError, Result, TargetSpec};

use crate::classify::heading_level;
use crate::index::{IndexEntry, SemanticIndex};

impl SemanticIndex {
    /// Check that the target names a recognized kind.
    pub fn validate_target(&self, target: &TargetSpec) -> Result<Kind> {
        Kind::from_name(&target.kind).ok_or_else(|| PatchdownError::InvalidTarget {
            target: target.clone(),
            recognized: Kind::names(),
        })
    }

    /// The unique entry whose kind and visible text equal the target's.
    ///
    /// `level` narrows heading matches and `component_type` narrows component
    /// matches when present. Text comparison is exact, not substring.
    pub fn find_target(&self, target: &TargetSpec) -> Result<&IndexEntry> {
        let found: Vec<&IndexEntry> = self
            .entries()
            .iter()
            .filter(|entry| matches_target(entry, target))
            .collect();

        debug!(
            kind = %target.kind,
            matches = found.len(),
            "resolved target"
        );

        match found.as_slice() {
            [entry] => Ok(*entry),
            [] => Err(PatchdownError::NoMatch {
                target: target.clone(),
            }),
            many => Err(PatchdownError::AmbiguousTarget {
                target: target.clone(),
                matches_found: many.len(),
                candidates: many
                    .iter()
                    .map(|entry| Candidate {
                        kind: entry.kind.map(Kind::as_str).unwrap_or_default().to_string(),
                        text: entry.text.clone(),
                    })
                    .collect(),
            }),
        }
    }

    /// The unique heading whose visible text is `title`.
    pub fn find_section(&self, title: &str) -> Result<&IndexEntry> {
        self.find_target(&TargetSpec::new(Kind::Heading.as_str(), title))
    }

    /// A heading plus its following siblings up to the next heading of equal or higher rank.
    pub(crate) fn section_nodes(&self, heading: &IndexEntry) -> Vec<NodeId> {
        let rank = heading.level.unwrap_or(1);
        let mut nodes = vec![heading.node];

        if let Some(start) = self.tree.node(heading.node) {
            for sibling in start.next_siblings() {
                let ends_section = ElementRef::wrap(sibling)
                    .and_then(|el| heading_level(el.value().name()))
                    .is_some_and(|level| level <= rank);
                if ends_section {
                    break;
                }
                nodes.push(sibling.id());
            }
        }

        nodes
    }
}

fn matches_target(entry: &IndexEntry, target: &TargetSpec) -> bool {
    let kind_matches = entry.kind.map(Kind::as_str) == Some(target.kind.as_str());
    if !kind_matches || entry.text != target.match_text {
        return false;
    }

    let level_matches = match (target.level, entry.level) {
        (Some(wanted), Some(actual)) => wanted == actual,
        _ => true,
    };
    let component_matches = match &target.component_type {
        Some(wanted) => entry.component_type.as_deref() == Some(wanted.as_str()),
        None => true,
    };

    level_matches && component_matches
}
