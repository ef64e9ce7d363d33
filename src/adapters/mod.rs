//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the messaging core to external systems:
//! - `auth` - JWT session validation (+ mock for tests)
//! - `postgres` - sqlx-backed stores and user directory
//! - `memory` - in-memory stores for tests and local development
//! - `http` - axum REST facade
//! - `websocket` - the real-time gateway

pub mod auth;
pub mod http;
pub mod memory;
pub mod postgres;
pub mod websocket;
