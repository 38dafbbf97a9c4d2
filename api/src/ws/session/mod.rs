pub mod auth;
pub mod emit;
pub mod handlers;
pub mod payload;
pub mod ws_handlers;
