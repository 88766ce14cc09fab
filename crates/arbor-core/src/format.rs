//! Document formatting pipeline: load → transforms → save.

use crate::document::{load_document, save_document};
use crate::error::DocumentError;
use crate::model::Diagram;
use std::collections::HashSet;

// ─── Config ───────────────────────────────────────────────────────────────

/// Configuration for `format_document`.
#[derive(Debug, Clone)]
pub struct FormatConfig {
    /// Drop dangling, self and duplicate connections. Default: **true**.
    pub prune_connections: bool,

    /// Forget every manual position so the whole tree is auto-laid out
    /// again. Destructive, so it defaults to **false**.
    pub clear_manual_positions: bool,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            prune_connections: true,
            clear_manual_positions: false,
        }
    }
}

impl FormatConfig {
    pub fn with_prune_connections(mut self, on: bool) -> Self {
        self.prune_connections = on;
        self
    }

    pub fn with_clear_manual_positions(mut self, on: bool) -> Self {
        self.clear_manual_positions = on;
        self
    }
}

// ─── Pipeline ─────────────────────────────────────────────────────────────

/// Load a document, apply the configured transforms and re-emit it.
///
/// Idempotent: formatting already-formatted output changes nothing.
pub fn format_document(text: &str, config: &FormatConfig) -> Result<String, DocumentError> {
    let mut diagram = load_document(text)?;

    if config.prune_connections {
        let removed = prune_connections(&mut diagram);
        if removed > 0 {
            log::debug!("format: pruned {removed} connection(s)");
        }
    }

    if config.clear_manual_positions {
        clear_manual_positions(&mut diagram);
    }

    save_document(&diagram)
}

/// Remove dangling, self-referencing and repeated connections, keeping the
/// first of each `(from, to, type)` triple. Returns how many were removed.
pub fn prune_connections(diagram: &mut Diagram) -> usize {
    let dangling = diagram.prune_dangling_connections();
    let before = diagram.connections.len();
    let mut seen = HashSet::new();
    diagram
        .connections
        .retain(|c| c.from != c.to && seen.insert((c.from, c.to, c.kind)));
    dangling + before - diagram.connections.len()
}

pub fn clear_manual_positions(diagram: &mut Diagram) {
    for idx in diagram.preorder() {
        diagram.graph[idx].attrs.clear_manual_position();
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const INPUT: &str = r#"{
        "tree": {"id": "root", "text": "Root", "attrs": {"manual_x": 12}, "children": [
            {"id": "a", "text": "A"}, {"id": "b", "text": "B"}
        ]},
        "connections": [
            {"from": "a", "to": "b", "type": "arrow"},
            {"from": "a", "to": "b", "type": "arrow"},
            {"from": "a", "to": "a", "type": "single"},
            {"from": "a", "to": "b", "type": "double"}
        ]
    }"#;

    #[test]
    fn format_document_default_is_idempotent() {
        let config = FormatConfig::default();
        let once = format_document(INPUT, &config).unwrap();
        let twice = format_document(&once, &config).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn prune_keeps_first_of_each_kind() {
        let out = format_document(INPUT, &FormatConfig::default()).unwrap();
        let d = load_document(&out).unwrap();
        let kinds: Vec<&str> = d.connections.iter().map(|c| c.kind.as_str()).collect();
        assert_eq!(kinds, vec!["arrow", "double"]);
    }

    #[test]
    fn prune_can_be_disabled() {
        let config = FormatConfig::default().with_prune_connections(false);
        let d = load_document(&format_document(INPUT, &config).unwrap()).unwrap();
        assert_eq!(d.connections.len(), 4);
    }

    #[test]
    fn clear_positions_is_opt_in() {
        let kept = load_document(&format_document(INPUT, &FormatConfig::default()).unwrap())
            .unwrap();
        assert_eq!(kept.get_by_id(kept.root_id()).unwrap().attrs.manual_x, Some(12.0));

        let config = FormatConfig::default().with_clear_manual_positions(true);
        let cleared = load_document(&format_document(INPUT, &config).unwrap()).unwrap();
        assert_eq!(cleared.get_by_id(cleared.root_id()).unwrap().attrs.manual_x, None);
    }
}
