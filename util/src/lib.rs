pub mod config;
pub mod jwt;
pub mod state;
pub mod ws;
