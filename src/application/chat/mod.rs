//! Chat application services.
//!
//! `ConversationResolver` owns the find-or-create invariant;
//! `ChatService` is the messaging engine the REST facade and the
//! WebSocket gateway both delegate to.

mod resolver;
mod service;
mod views;

pub use resolver::ConversationResolver;
pub use service::ChatService;
pub use views::{ConversationDetailView, ConversationSummaryView, MessagePageView, MessageView};
