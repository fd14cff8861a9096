mod config;

use crate::config::Config;
use anyhow::{Context, Result};
use axum::{
    Router,
    extract::State,
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    response::Response,
    routing::get,
};
use futures_util::{SinkExt, StreamExt};
use interviewer_core::generator::LlmGenerator;
use interviewer_core::{InboundEvent, InterviewSession, Lexicon, OutboundEvent};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::fmt::time::ChronoLocal;

/// Shared, read-only dependencies. Session state itself is per-connection.
struct AppState {
    generator: LlmGenerator,
    lexicon: Arc<Lexicon>,
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    tracing::info!("WebSocket upgrade request received");
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Runs one interview session over one WebSocket connection.
///
/// Inbound frames are processed strictly one at a time; the session awaits
/// generation-port calls in place, so a slow model stalls only this
/// connection. Outbound events flow through a channel to a writer task so
/// the session never holds the socket sink across an await.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    tracing::info!("client connected");

    let (mut sink, mut stream) = socket.split();
    let (outbound_tx, mut outbound_rx) = tokio::sync::mpsc::channel::<OutboundEvent>(64);

    let writer = tokio::spawn(async move {
        while let Some(event) = outbound_rx.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!(error = %e, "failed to serialize outbound event");
                    continue;
                }
            };
            if sink.send(Message::Text(json.into())).await.is_err() {
                // Client disconnected.
                break;
            }
        }
    });

    let mut session = InterviewSession::new(state.lexicon.clone());

    // Let the client know the initial state before any events are processed.
    if outbound_tx
        .send(OutboundEvent::StateUpdate { state: session.state })
        .await
        .is_err()
    {
        writer.abort();
        return;
    }

    while let Some(message) = stream.next().await {
        let message = match message {
            Ok(message) => message,
            Err(e) => {
                tracing::info!(error = %e, "WebSocket error");
                break;
            }
        };
        match message {
            Message::Text(text) => {
                let event: InboundEvent = match serde_json::from_str(&text) {
                    Ok(event) => event,
                    Err(e) => {
                        // Malformed input: logged and dropped, no state change.
                        tracing::warn!(error = %e, "dropping undecodable inbound message");
                        continue;
                    }
                };
                if let Err(e) = session.process(&state.generator, event, &outbound_tx).await {
                    // The session stays in its last-known state.
                    tracing::error!(error = %e, "error processing event");
                }
            }
            Message::Close(_) => break,
            // Ping/pong are handled by axum; binary frames are not part of
            // the protocol.
            _ => {}
        }
    }

    drop(outbound_tx);
    let _ = writer.await;
    tracing::info!("client disconnected");
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env().context("Failed to load application configuration")?;

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(ChronoLocal::rfc_3339())
        .init();

    tracing::info!("Configuration loaded successfully. Starting interview gateway...");

    let state = Arc::new(AppState {
        generator: LlmGenerator::new(
            config.api_key.clone(),
            config.api_base_url.clone(),
            config.chat_model.clone(),
            config.transcription_model.clone(),
            config.vision_model.clone(),
        ),
        lexicon: Lexicon::shared(),
    });

    // Permissive CORS so a separate frontend can reach the WebSocket API.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .layer(cors)
        .with_state(state);

    tracing::info!("Starting WebSocket server, listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
