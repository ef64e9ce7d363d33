//! GymLink Messaging - Real-time coach/athlete messaging backend
//!
//! This crate implements the conversation/message data model, the message
//! delivery and read-tracking engine, and the authenticated WebSocket gateway
//! for the GymLink coaching platform.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
