//! Chat domain - conversations and messages between two participants.
//!
//! A conversation is a durable pairing of exactly two users; messages are
//! directed, creation-ordered, and carry a monotonic read flag. The
//! participant pair is the system-wide uniqueness key for conversations.

mod conversation;
mod error;
mod message;
mod participants;

pub use conversation::Conversation;
pub use error::ChatError;
pub use message::Message;
pub use participants::ParticipantPair;
