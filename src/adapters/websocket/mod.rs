//! Real-time gateway - authenticated WebSocket transport.
//!
//! The gateway authenticates connections at handshake time, binds the
//! verified principal to the channel, and relays new-message events, typing
//! indicators, read receipts, and presence changes between participants.
//! Delivery is best-effort and at-most-once; the stores stay the source of
//! truth.

mod frames;
mod handler;
mod registry;

pub use frames::{ClientFrame, ServerFrame};
pub use handler::{gateway_router, ws_handler, GatewayState};
pub use registry::{ConnectionId, ConnectionRegistry};
