use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global string interner for node IDs.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Counter behind `NodeId::fresh`. Shared by every diagram in the process.
static FRESH_COUNTER: AtomicU64 = AtomicU64::new(0);

/// The id every new diagram gives its root node.
pub const ROOT_ID: &str = "root";

/// A lightweight, interned identifier for diagram nodes.
/// Internally a `Spur` index: 4 bytes, `Copy`, O(1) `Eq`/`Hash`.
///
/// Ids loaded from a document are kept verbatim; ids minted by the editor
/// come from [`NodeId::fresh`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(Spur);

impl NodeId {
    /// Intern a string as a NodeId, or return the existing one.
    pub fn intern(s: &str) -> Self {
        NodeId(INTERNER.get_or_intern(s))
    }

    /// The fixed id of the root created at startup.
    pub fn root() -> Self {
        Self::intern(ROOT_ID)
    }

    /// Resolve back to a string slice.
    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// Mint the next `node_<n>` id. Callers that must avoid collisions with
    /// loaded ids go through `Diagram::fresh_id`, which skips taken ones.
    pub fn fresh() -> Self {
        let n = FRESH_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self::intern(&format!("node_{n}"))
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(NodeId::intern(&s))
    }
}
