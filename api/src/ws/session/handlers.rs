use std::sync::Arc;

use axum::{
    extract::{
        Query, State, WebSocketUpgrade,
        ws::{CloseFrame, Message, WebSocket},
    },
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use util::state::AppState;
use util::ws::serve_session;

use super::auth::{HandshakeError, authorize_connection};
use super::ws_handlers::SessionWsHandler;

#[derive(Debug, Default, Deserialize)]
pub struct HandshakeQuery {
    pub token: Option<String>,
    #[serde(alias = "session_id")]
    pub ssn_id: Option<String>,
}

/// GET /ws/session?token=...&ssn_id=...
///
/// The upgrade is always accepted; authentication and authorization run on the open
/// socket so failures can be reported as close frames with a reason.
pub async fn session_ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<AppState>,
    Query(query): Query<HandshakeQuery>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state, query))
}

async fn handle_socket(mut socket: WebSocket, app_state: AppState, query: HandshakeQuery) {
    let authorized = authorize_connection(
        &app_state,
        query.token.as_deref(),
        query.ssn_id.as_deref(),
        Utc::now(),
    )
    .await;

    match authorized {
        Ok((claims, session)) => {
            let session_id = session.id.clone();
            let handler = Arc::new(SessionWsHandler::new(app_state.clone(), session, claims.name.clone()));
            serve_session(
                socket,
                app_state.registry_clone(),
                session_id,
                claims.sub,
                handler,
                app_state.ws_options().clone(),
            )
            .await;
        }
        Err(e) => {
            tracing::info!(stage = ?e.stage(), reason = %e, "Session connection rejected");
            if let HandshakeError::Database(db_err) = &e {
                tracing::error!("Database error during handshake: {db_err}");
            }
            let frame = CloseFrame {
                code: e.close_code(),
                reason: e.to_string().into(),
            };
            let _ = socket.send(Message::Close(Some(frame))).await;
        }
    }
}
