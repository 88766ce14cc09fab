//! Lint diagnostics for diagrams.
//!
//! Reports structural issues without modifying the diagram. Layout-based
//! rules look at a finished `TreeLayout`.

use crate::id::NodeId;
use crate::layout::TreeLayout;
use crate::model::Diagram;
use std::collections::HashSet;

// ─── Diagnostic types ────────────────────────────────────────────────────

/// Severity of a lint finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintSeverity {
    /// Likely a mistake.
    Warning,
    /// Cosmetic.
    Info,
}

/// A single lint diagnostic.
#[derive(Debug, Clone)]
pub struct LintDiagnostic {
    /// The node this diagnostic refers to.
    pub node_id: NodeId,
    /// Human-readable message.
    pub message: String,
    /// Severity level.
    pub severity: LintSeverity,
    /// Short rule identifier (e.g. "self-connection").
    pub rule: &'static str,
}

// ─── Public API ───────────────────────────────────────────────────────────

/// Run all lint rules and return diagnostics.
#[must_use]
pub fn lint_document(diagram: &Diagram, layout: &TreeLayout) -> Vec<LintDiagnostic> {
    let mut diags = Vec::new();
    lint_dangling_connections(diagram, &mut diags);
    lint_self_connections(diagram, &mut diags);
    lint_duplicate_connections(diagram, &mut diags);
    lint_residual_overlap(layout, &mut diags);
    diags
}

// ─── Rules ────────────────────────────────────────────────────────────────

fn lint_dangling_connections(diagram: &Diagram, diags: &mut Vec<LintDiagnostic>) {
    for c in &diagram.connections {
        for end in [c.from, c.to] {
            if !diagram.contains(end) {
                diags.push(LintDiagnostic {
                    node_id: end,
                    message: format!(
                        "Connection `{}` → `{}` points at missing node `{}`; it is not drawn.",
                        c.from, c.to, end
                    ),
                    severity: LintSeverity::Warning,
                    rule: "dangling-connection",
                });
            }
        }
    }
}

fn lint_self_connections(diagram: &Diagram, diags: &mut Vec<LintDiagnostic>) {
    for c in diagram.connections.iter().filter(|c| c.from == c.to) {
        diags.push(LintDiagnostic {
            node_id: c.from,
            message: format!("Connection from `{}` to itself is not drawn.", c.from),
            severity: LintSeverity::Warning,
            rule: "self-connection",
        });
    }
}

fn lint_duplicate_connections(diagram: &Diagram, diags: &mut Vec<LintDiagnostic>) {
    let mut seen = HashSet::new();
    for c in &diagram.connections {
        if !seen.insert((c.from, c.to, c.kind)) {
            diags.push(LintDiagnostic {
                node_id: c.from,
                message: format!(
                    "Duplicate `{}` connection `{}` → `{}` is drawn on top of the first.",
                    c.kind, c.from, c.to
                ),
                severity: LintSeverity::Info,
                rule: "duplicate-connection",
            });
        }
    }
}

/// Report each node whose box overlaps a node painted before it.
fn lint_residual_overlap(layout: &TreeLayout, diags: &mut Vec<LintDiagnostic>) {
    let boxes: Vec<_> = layout.iter().collect();
    for (j, (id, b)) in boxes.iter().enumerate() {
        if let Some((other, _)) = boxes[..j].iter().find(|(_, a)| a.overlaps(b)) {
            diags.push(LintDiagnostic {
                node_id: *id,
                message: format!("`{id}` overlaps `{other}` in the finished layout."),
                severity: LintSeverity::Info,
                rule: "residual-overlap",
            });
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────
