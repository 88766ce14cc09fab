use arbor_core::DocumentError;

/// A rejected edit. The session is left exactly as it was.
#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error("the root node cannot be deleted")]
    RootNotDeletable,

    #[error("no node with id `{id}`")]
    UnknownNode { id: String },

    #[error("`{value}` is not a valid number for {field}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("a connection needs two different nodes")]
    SelfConnection,

    #[error("no connection at index {index}")]
    NoConnection { index: usize },

    #[error(transparent)]
    Document(#[from] DocumentError),
}
