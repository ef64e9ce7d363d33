//! Application layer - orchestration of the messaging use cases.

pub mod chat;
