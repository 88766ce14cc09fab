pub mod error;
pub mod gesture;
pub mod history;
pub mod session;
pub mod shortcuts;

pub use error::EditError;
pub use gesture::DragState;
pub use history::{History, Snapshot};
pub use session::{AttrsPatch, EditorSession, StylePicker};
pub use shortcuts::{EditorAction, ShortcutMap};
