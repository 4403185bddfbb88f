//! Interaction engines built on top of the repository: the due-item review
//! queue, per-item review sessions, free practice, item authoring, and the
//! live library view.

pub mod edit;
pub mod library;
pub mod practice;
pub mod queue;
pub mod session;

pub use edit::{DeleteConfirmation, DeleteState, EditSession, ItemDraft};
pub use library::{Library, LibraryFilter};
pub use practice::{PracticeMode, PracticeSession};
pub use queue::{QueuePhase, ReviewQueue};
pub use session::{ReviewSession, SessionError, SessionPhase};
