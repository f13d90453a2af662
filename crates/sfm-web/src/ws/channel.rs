//! The command channel: one JSON command per text frame, one reply each.

use std::fmt::Display;

use axum::extract::ws::Message;
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{Sink, SinkExt, Stream, StreamExt};

use crate::auth::middleware::AuthUser;
use crate::state::{unix_now, AppState};
use crate::workspace;

/// Frame sent to an unauthenticated client before the socket is closed.
pub const LOGIN_REQUIRED: &str = r#"{"response":{"error":"Please log in first"}}"#;

pub async fn channel_handler(
    user: Option<AuthUser>,
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        let (sender, receiver) = socket.split();
        match user {
            Some(user) => handle_channel(sender, receiver, state, user).await,
            None => reject(sender).await,
        }
    })
}

async fn reject<S>(mut sender: S)
where
    S: Sink<Message> + Unpin,
{
    tracing::warn!("Command channel opened without a session");
    let _ = sender.send(Message::Text(LOGIN_REQUIRED.into())).await;
    let _ = sender.send(Message::Close(None)).await;
}

async fn handle_channel<S, R, E>(
    mut ws_sender: S,
    mut ws_receiver: R,
    state: AppState,
    user: AuthUser,
) where
    S: Sink<Message> + Unpin,
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    tracing::info!("Command channel opened for {} (jti: {})", user.sub, user.jti);
    let session = state.workspaces.session_for(&user);
    tracing::debug!("{} workspace(s) active", state.workspaces.len());

    while let Some(msg) = ws_receiver.next().await {
        let text = match msg {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                tracing::debug!("Command channel receive error: {e}");
                break;
            }
        };

        // A session revoked or expired mid-connection stops being served.
        if state.revoked_tokens.contains_key(&user.jti) || user.exp <= unix_now() {
            let _ = ws_sender.send(Message::Text(LOGIN_REQUIRED.into())).await;
            let _ = ws_sender.send(Message::Close(None)).await;
            break;
        }

        let envelope = match workspace::dispatch(
            state.dispatcher.clone(),
            session.clone(),
            text.as_str().to_owned(),
        )
        .await
        {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::error!("Dispatch task failed: {e}");
                break;
            }
        };

        let reply = match serde_json::to_string(&envelope) {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!("Failed to encode reply: {e}");
                continue;
            }
        };

        if ws_sender.send(Message::Text(reply.into())).await.is_err() {
            break;
        }
    }

    tracing::info!("Command channel closed for {}", user.sub);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use futures::channel::mpsc;
    use futures::stream;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    fn test_state(home: &std::path::Path) -> AppState {
        let mut config = ServerConfig::default();
        config.filesystem.home = home.to_path_buf();
        AppState::new(config)
    }

    fn user(jti: &str) -> AuthUser {
        AuthUser {
            sub: "admin".into(),
            jti: jti.into(),
            exp: u64::MAX,
        }
    }

    fn text(frame: &str) -> Result<Message, axum::Error> {
        Ok(Message::Text(frame.into()))
    }

    /// Runs the channel over `frames` and returns every frame sent back.
    async fn converse(
        state: AppState,
        user: AuthUser,
        frames: Vec<Result<Message, axum::Error>>,
    ) -> Vec<Message> {
        let (tx, rx) = mpsc::unbounded();
        handle_channel(tx, stream::iter(frames), state, user).await;
        rx.collect().await
    }

    fn reply_json(message: &Message) -> Value {
        match message {
            Message::Text(text) => serde_json::from_str(text.as_str()).unwrap(),
            other => panic!("expected a text frame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unauthenticated_client_gets_one_frame_then_close() {
        let (tx, rx) = mpsc::unbounded();
        reject(tx).await;
        let sent: Vec<Message> = rx.collect().await;

        assert_eq!(sent.len(), 2);
        assert_eq!(reply_json(&sent[0]), json!({"response": {"error": "Please log in first"}}));
        assert!(matches!(sent[1], Message::Close(None)));
    }

    #[tokio::test]
    async fn frames_are_answered_in_order() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("sub")).unwrap();
        let state = test_state(tmp.path());

        let sent = converse(
            state,
            user("a"),
            vec![
                text(r#"{"do": "chdir", "path": "", "name": "sub"}"#),
                Ok(Message::Binary(vec![1u8, 2, 3].into())),
                text(r#"{"do": "pwd"}"#),
                text("not json"),
            ],
        )
        .await;

        let sub = tmp.path().join("sub").to_string_lossy().into_owned();
        assert_eq!(sent.len(), 3);
        assert_eq!(
            reply_json(&sent[0]),
            json!({"action": "chdir", "response": {"result": sub}})
        );
        assert_eq!(
            reply_json(&sent[1]),
            json!({"action": "pwd", "response": {"result": sub}})
        );
        assert_eq!(reply_json(&sent[2]), json!({"exception": "Invalid JSON data"}));
    }

    #[tokio::test]
    async fn close_frame_ends_the_channel() {
        let tmp = TempDir::new().unwrap();
        let state = test_state(tmp.path());

        let sent = converse(
            state,
            user("a"),
            vec![Ok(Message::Close(None)), text(r#"{"do": "pwd"}"#)],
        )
        .await;

        assert!(sent.is_empty());
    }

    #[tokio::test]
    async fn revoked_session_stops_being_served() {
        let tmp = TempDir::new().unwrap();
        let state = test_state(tmp.path());
        state.revoke("a", u64::MAX);

        let sent = converse(
            state,
            user("a"),
            vec![text(r#"{"do": "pwd"}"#), text(r#"{"do": "pwd"}"#)],
        )
        .await;

        assert_eq!(sent.len(), 2);
        assert_eq!(reply_json(&sent[0]), json!({"response": {"error": "Please log in first"}}));
        assert!(matches!(sent[1], Message::Close(None)));
    }

    #[tokio::test]
    async fn expired_session_stops_being_served() {
        let tmp = TempDir::new().unwrap();
        let state = test_state(tmp.path());
        let expired = AuthUser {
            exp: 1,
            ..user("a")
        };

        let sent = converse(state, expired, vec![text(r#"{"do": "pwd"}"#)]).await;

        assert_eq!(reply_json(&sent[0]), json!({"response": {"error": "Please log in first"}}));
        assert!(matches!(sent[1], Message::Close(None)));
    }
}
