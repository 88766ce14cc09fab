/// Failure to read a persisted diagram.
///
/// A failed load never touches the caller's in-memory diagram; loading
/// builds a fresh one and only hands it back on success.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("document has no `tree` object")]
    MissingTree,

    #[error("node id `{id}` appears more than once")]
    DuplicateId { id: String },

    #[error("malformed document: {0}")]
    Json(#[from] serde_json::Error),
}
