use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{
        event::{ClientEvent, ServerEvent},
        identity::Identity,
        session::{SESSION_MARKER_TTL_SECS, SessionMarker, session_marker_key},
    },
    services::{analysis, token},
    state::AppState,
};

/// Handshake parameters for the realtime endpoint.
#[derive(Deserialize)]
pub struct WsAuthParams {
    /// The bearer credential, same format as the HTTP authorization header.
    token: Option<String>,
}

/// Handles the realtime handshake: `GET /ws?token=<bearer>`.
///
/// The token is validated before the upgrade, so a bad credential is
/// refused with the usual HTTP error and no session state is ever created.
pub async fn ws_handler(
    State(mut state): State<AppState>,
    Query(params): Query<WsAuthParams>,
    ws: WebSocketUpgrade,
) -> Result<Response> {
    let token = params.token.ok_or(AppError::MissingToken)?;
    let identity = token::validate(&mut state.redis, &state.config.jwt_secret, &token).await?;

    Ok(ws.on_upgrade(move |socket| handle_connection(state, identity, socket)))
}

/// Runs one authenticated realtime connection until it closes.
///
/// The connection registers in the channel registry (replacing any earlier
/// connection for the same identity), joins its `user_{id}` room, then
/// processes events strictly in arrival order. Cleanup on close removes the
/// registry binding and deletes the identity's session marker.
async fn handle_connection(state: AppState, identity: Identity, socket: WebSocket) {
    let conn_id = Uuid::new_v4();
    let user_id = identity.user_id;
    tracing::info!("🔌 User {} connected (connection {})", user_id, conn_id);

    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();
    state.registry.register(user_id, conn_id, tx.clone()).await;

    let user_room = format!("user_{}", user_id);
    state.registry.join_room(&user_room, conn_id, tx.clone()).await;

    let (mut sink, mut stream) = socket.split();

    // Outbound pump: registry/handler events -> socket frames.
    let send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match sonic_rs::to_string(&event) {
                Ok(json) => {
                    if sink.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to serialize server event: {}", e);
                }
            }
        }
    });

    while let Some(message) = stream.next().await {
        let message = match message {
            Ok(message) => message,
            Err(e) => {
                tracing::debug!("Socket error for user {}: {}", user_id, e);
                break;
            }
        };

        match message {
            Message::Text(text) => match sonic_rs::from_str::<ClientEvent>(text.as_str()) {
                Ok(event) => handle_event(&state, &identity, conn_id, &tx, event).await,
                Err(e) => {
                    tracing::warn!("Unrecognized event from user {}: {}", user_id, e);
                }
            },
            Message::Close(_) => break,
            // Ping/pong are answered by the protocol layer; binary frames
            // are not part of the event contract.
            _ => {}
        }
    }

    state.registry.leave_room(&user_room, conn_id).await;
    state.registry.unregister(user_id, conn_id).await;

    let deleted: std::result::Result<(), redis::RedisError> = redis::cmd("DEL")
        .arg(session_marker_key(user_id))
        .query_async(&mut state.redis.clone())
        .await;
    if let Err(e) = deleted {
        tracing::error!("Failed to clean up session marker for user {}: {}", user_id, e);
    }

    send_task.abort();
    tracing::info!("👋 User {} disconnected (connection {})", user_id, conn_id);
}

/// Dispatches one client event. All three events run to completion before
/// the next frame is read, preserving per-connection ordering.
async fn handle_event(
    state: &AppState,
    identity: &Identity,
    conn_id: Uuid,
    tx: &mpsc::UnboundedSender<ServerEvent>,
    event: ClientEvent,
) {
    match event {
        ClientEvent::WorkoutStarted { workout_id } => {
            tracing::info!("🏋️ Workout {} started by user {}", workout_id, identity.user_id);

            let marker = SessionMarker {
                workout_id,
                start_time: Utc::now(),
                connection_id: conn_id,
            };

            match sonic_rs::to_string(&marker) {
                Ok(json) => {
                    let stored: std::result::Result<(), redis::RedisError> = redis::cmd("SETEX")
                        .arg(session_marker_key(identity.user_id))
                        .arg(SESSION_MARKER_TTL_SECS)
                        .arg(json)
                        .query_async(&mut state.redis.clone())
                        .await;
                    if let Err(e) = stored {
                        tracing::error!(
                            "Failed to store session marker for user {}: {}",
                            identity.user_id,
                            e
                        );
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to serialize session marker: {}", e);
                }
            }

            state
                .registry
                .broadcast(
                    "analytics",
                    conn_id,
                    &ServerEvent::WorkoutStarted {
                        user_id: identity.user_id,
                        workout_id,
                    },
                )
                .await;
        }

        ClientEvent::AnalyzeFrame(payload) => {
            match analysis::analyze_frame(state, identity.user_id, &payload).await {
                Ok(result) => {
                    let _ = tx.send(ServerEvent::FormFeedback(result));
                }
                Err(e) => {
                    tracing::error!("Frame analysis error for user {}: {}", identity.user_id, e);
                    let _ = tx.send(ServerEvent::AnalysisError {
                        message: "Analysis temporarily unavailable".to_string(),
                    });
                }
            }
        }

        ClientEvent::WorkoutCompleted {
            calories_burned,
            duration,
        } => {
            tracing::info!("✅ Workout completed by user {}", identity.user_id);

            // Missing marker (repeat completion, expired TTL) is a no-op.
            let deleted: std::result::Result<(), redis::RedisError> = redis::cmd("DEL")
                .arg(session_marker_key(identity.user_id))
                .query_async(&mut state.redis.clone())
                .await;
            if let Err(e) = deleted {
                tracing::error!(
                    "Failed to delete session marker for user {}: {}",
                    identity.user_id,
                    e
                );
            }

            let _ = tx.send(ServerEvent::WorkoutCompletedAck {
                message: "Workout completed successfully!".to_string(),
                calories: calories_burned,
                duration,
            });
        }
    }
}
