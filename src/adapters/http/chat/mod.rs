//! Chat HTTP adapter - the REST facade over the messaging engine.

mod dto;
mod handlers;
mod routes;

pub use dto::ErrorResponse;
pub use handlers::ChatHandlers;
pub use routes::chat_routes;
