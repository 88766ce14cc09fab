//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `EditorAction`s. On macOS `meta`
//! is ⌘; elsewhere `ctrl` plays the same role.

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorAction {
    Undo,
    Redo,
    /// Delete the selected subtree.
    Delete,
    AddChild,
    RotateOrientation,
    ToggleReverseEdge,
    /// Connect the highlighted node to the selected one.
    Connect,
    /// Mark the selected node as the next connection's "from" end.
    Highlight,
    SelectRoot,
}

/// Resolves key events into editor actions.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action.
    ///
    /// `key` is the `KeyboardEvent.key` value (e.g. `"z"`, `"Delete"`).
    /// Returns `None` if the key combo has no binding.
    pub fn resolve(
        key: &str,
        ctrl: bool,
        shift: bool,
        _alt: bool,
        meta: bool,
    ) -> Option<EditorAction> {
        let cmd = ctrl || meta;

        if cmd && shift {
            return match key {
                "z" | "Z" => Some(EditorAction::Redo),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "z" | "Z" => Some(EditorAction::Undo),
                "y" | "Y" => Some(EditorAction::Redo),
                _ => None,
            };
        }

        match key {
            "Delete" | "Backspace" => Some(EditorAction::Delete),
            "Insert" | "Tab" => Some(EditorAction::AddChild),
            "Escape" => Some(EditorAction::SelectRoot),
            _ if shift => None,
            "o" => Some(EditorAction::RotateOrientation),
            "r" => Some(EditorAction::ToggleReverseEdge),
            "c" => Some(EditorAction::Connect),
            "h" => Some(EditorAction::Highlight),
            _ => None,
        }
    }
}
