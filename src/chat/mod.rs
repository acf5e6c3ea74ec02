//! Chat conversations and the turn-resolution session that drives them.

mod conversation;
mod session;

pub use conversation::{ChatState, Conversation, Role, Turn};
pub use session::{ChatSession, Reply, FAILED_TURN_MESSAGE};
