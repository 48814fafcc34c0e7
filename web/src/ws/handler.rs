use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt};
use log::*;
use realtime::session::Session;
use service::AppState;
use std::sync::Arc;
use tokio::sync::mpsc;

/// WebSocket upgrade endpoint for the real-time layer.
///
/// The socket starts anonymous; identity arrives over the socket itself via
/// the `authenticate` event, so no bearer token is required to connect.
/// Returns 503 when the server was started without the real-time layer.
pub(crate) async fn ws_handler(
    State(app_state): State<AppState>,
    ws: WebSocketUpgrade,
) -> Response {
    let Some(manager) = app_state.realtime.clone() else {
        return (StatusCode::SERVICE_UNAVAILABLE, "Real-time layer is disabled").into_response();
    };

    ws.on_upgrade(move |socket| run_connection(socket, manager))
}

/// The per-connection actor: splits the socket into reader and writer
/// halves. The writer task owns the sink and forwards frames from an mpsc
/// channel, which is what lets any part of the system (the session router,
/// room broadcasts, REST-side notifications) push to this client by cloning
/// the sender. The reader loop feeds inbound frames to the session router
/// until the client goes away, then runs disconnect cleanup.
async fn run_connection(socket: WebSocket, manager: Arc<realtime::Manager>) {
    let (ws_sender, mut ws_receiver) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel::<Message>();

    let handle = manager.open_connection(tx);
    let connection_id = handle.id().clone();
    let mut session = Session::new(manager.clone(), handle.clone());

    debug!("WebSocket actor started for connection {connection_id}");

    let writer = tokio::spawn(writer_task(ws_sender, rx));

    while let Some(received) = ws_receiver.next().await {
        match received {
            Ok(Message::Text(text)) => session.handle_frame(&text),
            Ok(Message::Ping(data)) => {
                handle.send(Message::Pong(data));
            }
            Ok(Message::Close(frame)) => {
                debug!("Client closed connection {connection_id}: {frame:?}");
                break;
            }
            Ok(_) => {
                // binary and pong frames are not part of the protocol
            }
            Err(e) => {
                warn!("WebSocket receive error on connection {connection_id}: {e}");
                break;
            }
        }
    }

    writer.abort();

    match manager.close_connection(&connection_id) {
        Some(user_id) => info!("User {user_id} disconnected (connection {connection_id})"),
        None => debug!("Unauthenticated connection {connection_id} disconnected"),
    }
}

/// Writer task: receives frames from the mpsc channel and forwards them to
/// the WebSocket sink.
async fn writer_task(
    mut ws_sender: futures::stream::SplitSink<WebSocket, Message>,
    mut rx: mpsc::UnboundedReceiver<Message>,
) {
    while let Some(message) = rx.recv().await {
        if ws_sender.send(message).await.is_err() {
            // send failed, the connection is broken
            break;
        }
    }
}
