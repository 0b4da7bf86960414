use axum::extract::ws::{Message as WsMessage, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::Response;
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use amora_shared::errors::{AppError, AppResult, ErrorCode};
use amora_shared::middleware::decode_token;

use crate::models::{Dialogue, Message, NewMessage};
use crate::schema::{dialogues, messages};
use crate::socket::hub::ChatDelivery;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub token: String,
}

#[derive(Debug, Deserialize)]
struct InboundChatMessage {
    pub dialogue_id: Uuid,
    pub message: String,
}

/// GET /chat/ws?token=...
///
/// The token authenticates the connection; the sender identity of every
/// frame comes from it, never from the payload.
pub async fn chat_ws(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> AppResult<Response> {
    let claims = decode_token(&query.token)?;
    if claims.is_expired() {
        return Err(AppError::new(ErrorCode::TokenExpired, "token has expired"));
    }

    let user_id = claims.sub;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, user_id)))
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>, user_id: Uuid) {
    let conn_id = Uuid::now_v7();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();

    state.chat_hub.connect(user_id, conn_id, out_tx).await;
    tracing::info!(user_id = %user_id, conn_id = %conn_id, "chat socket connected");

    loop {
        tokio::select! {
            inbound = socket.recv() => {
                match inbound {
                    Some(Ok(WsMessage::Text(text))) => {
                        if let Err(e) = handle_inbound(&state, user_id, &text).await {
                            tracing::warn!(user_id = %user_id, error = %e, "chat frame rejected");
                            let _ = socket
                                .send(WsMessage::Text(error_frame(&e)))
                                .await;
                        }
                    }
                    Some(Ok(WsMessage::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!(user_id = %user_id, error = %e, "chat socket read error");
                        break;
                    }
                }
            }
            outbound = out_rx.recv() => {
                match outbound {
                    Some(payload) => {
                        if socket.send(WsMessage::Text(payload)).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
        }
    }

    state.chat_hub.disconnect(user_id, conn_id).await;
    tracing::info!(user_id = %user_id, conn_id = %conn_id, "chat socket disconnected");
}

/// Parse, authorize, persist, deliver. Delivery goes to the two dialogue
/// participants only.
async fn handle_inbound(state: &Arc<AppState>, user_id: Uuid, text: &str) -> AppResult<()> {
    let frame: InboundChatMessage = serde_json::from_str(text)
        .map_err(|e| AppError::bad_request(format!("malformed chat frame: {e}")))?;

    if frame.message.trim().is_empty() {
        return Err(AppError::new(ErrorCode::ValidationError, "message must not be empty"));
    }

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let dialogue: Dialogue = dialogues::table
        .filter(dialogues::id.eq(frame.dialogue_id))
        .filter(dialogues::deleted_at.is_null())
        .first(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::DialogueNotFound, "dialogue not found"))?;

    if dialogue.user_a != user_id && dialogue.user_b != user_id {
        return Err(AppError::new(
            ErrorCode::NotDialogueParticipant,
            "not a participant of this dialogue",
        ));
    }

    let message: Message = diesel::insert_into(messages::table)
        .values(&NewMessage {
            dialogue_id: dialogue.id,
            sender_id: user_id,
            content: frame.message,
        })
        .get_result(&mut conn)?;

    state
        .chat_hub
        .deliver(
            [dialogue.user_a, dialogue.user_b],
            ChatDelivery {
                dialogue_id: dialogue.id,
                message_id: message.id,
                user_id,
                message: message.content.clone(),
                date: message.created_at,
            },
        )
        .await;

    Ok(())
}

fn error_frame(err: &AppError) -> String {
    serde_json::json!({
        "error": err.to_string(),
    })
    .to_string()
}
