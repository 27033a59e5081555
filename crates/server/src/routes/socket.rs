//! Websocket endpoint.
//!
//! The server assigns each socket its id, so a client can only ever
//! disconnect the socket it actually holds.

use axum::{
    Router,
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
    routing::get,
};
use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio_stream::{StreamMap, wrappers::BroadcastStream};
use tracing::{debug, error, info, warn};
use utils::ids::new_socket_id;

use crate::{
    AppState,
    auth::AuthToken,
    channels::{topics_for, topics_revoked_by},
    mutations::{MutationContext, connect_socket, disconnect_socket},
};

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/socket", get(socket_upgrade))
}

async fn socket_upgrade(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    auth_token: AuthToken,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, auth_token))
}

async fn handle_socket(socket: WebSocket, state: AppState, auth_token: AuthToken) {
    let socket_id = new_socket_id();
    let ctx = MutationContext::new(&state, auth_token.clone(), Some(socket_id.clone()));

    match connect_socket(&ctx, &socket_id).await {
        Ok(Some(_)) => info!(%socket_id, user_id = %auth_token.user_id(), "socket connected"),
        Ok(None) => {
            warn!(user_id = %auth_token.user_id(), "socket for unknown user");
            return;
        }
        Err(err) => {
            error!(error = %err, "failed to register socket");
            return;
        }
    }

    let (mut sender, mut receiver) = socket.split();
    let mut events = StreamMap::new();
    for topic in topics_for(&auth_token) {
        let stream = BroadcastStream::new(state.pubsub.subscribe(&topic));
        events.insert(topic, stream);
    }

    let hello = json!({ "type": "connected", "socketId": socket_id }).to_string();
    if sender.send(Message::Text(hello.into())).await.is_ok() {
        loop {
            tokio::select! {
                Some((topic, item)) = events.next() => match item {
                    Ok(event) => {
                        match serde_json::to_string(&*event) {
                            Ok(text) => {
                                if sender.send(Message::Text(text.into())).await.is_err() {
                                    break;
                                }
                            }
                            Err(err) => error!(error = %err, "failed to encode event"),
                        }
                        // The token still lists a team the user was just
                        // removed from; stop streaming it.
                        for revoked in topics_revoked_by(&event, auth_token.user_id()) {
                            if events.remove(&revoked).is_some() {
                                debug!(%socket_id, topic = %revoked, "unsubscribed from topic");
                            }
                        }
                    }
                    Err(err) => warn!(%socket_id, %topic, error = %err, "socket lagged behind topic"),
                },
                incoming = receiver.next() => match incoming {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                },
            }
        }
    }

    drop(events);
    match disconnect_socket(&ctx, Some(&socket_id)).await {
        Ok(_) => debug!(%socket_id, "socket disconnected"),
        Err(err) => error!(%socket_id, error = %err, "failed to unregister socket"),
    }
    state.pubsub.prune();
}
