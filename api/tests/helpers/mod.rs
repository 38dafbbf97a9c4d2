pub mod app;
pub mod ws;

pub use app::{TestApp, make_test_app, make_test_app_with_options};
pub use ws::{WsClient, connect_session, expect_close, next_json, spawn_server};
