//! Integration tests for channel subscriptions through the Api facade

use ambra_sdk::cli::commands::listen::ListenArgs;
use ambra_sdk::config::{secret_string, AmbraConfig};
use ambra_sdk::domain::AmbraError;
use ambra_sdk::Api;
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

/// Channel server that accepts one connection
///
/// Subscriptions with any sid other than `sid-1` are rejected. Accepted
/// subscriptions receive `count` `progress` events followed by `ready`.
async fn spawn_channel_server(count: usize) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();

        while let Some(Ok(frame)) = ws.next().await {
            let Message::Text(text) = frame else { continue };
            let msg: Value = serde_json::from_str(&text).unwrap();
            let channel = msg["channel"].clone();

            let mut replies = Vec::new();
            match msg["action"].as_str() {
                Some("subscribe") if msg["sid"] != "sid-1" => {
                    replies.push(json!({"status": "ERROR", "action": "subscribe", "channel": channel, "error_type": "NO_SESSION"}));
                }
                Some("subscribe") => {
                    replies.push(json!({"status": "OK", "action": "subscribe", "channel": channel}));
                    for step in 0..count {
                        replies.push(json!({"channel": channel, "event": "progress", "step": step}));
                    }
                    replies.push(json!({"channel": channel, "event": "ready"}));
                }
                Some(action) => {
                    replies.push(json!({"status": "OK", "action": action, "channel": channel}));
                }
                None => {}
            }
            for reply in replies {
                if ws.send(Message::Text(reply.to_string())).await.is_err() {
                    return;
                }
            }
        }
    });

    format!("ws://{addr}")
}

fn api_for(ws_url: String, sid: &str) -> Api {
    let mut config = AmbraConfig::for_url("https://access.example.com/api/v3");
    config.ambra.sid = Some(secret_string(sid.to_string()));
    config.websocket.url = Some(ws_url);
    config.websocket.reconnect_attempts = 0;
    Api::from_config(&config).unwrap()
}

#[tokio::test]
async fn test_wait_for_event_with_session_sid() {
    let url = spawn_channel_server(3).await;
    let api = api_for(url, "sid-1");

    let sid = api.sid().await.unwrap();
    let ws = api.ws().await.unwrap();
    let event = ws
        .wait_for_event(&sid, "study.abc", "ready", Duration::from_secs(5))
        .await
        .unwrap();

    assert_eq!(event.channel, "study.abc");
    assert_eq!(event.event, "ready");
    ws.close().await.unwrap();
}

#[tokio::test]
async fn test_wrong_sid_is_rejected() {
    let url = spawn_channel_server(0).await;
    let api = api_for(url, "stale");

    let sid = api.sid().await.unwrap();
    let ws = api.ws().await.unwrap();
    let err = ws.subscribe(&sid, "study.abc").await.unwrap_err();

    assert!(matches!(err, AmbraError::WebSocket(ref m) if m.contains("NO_SESSION")));
    ws.close().await.unwrap();
}

#[tokio::test]
async fn test_listen_stops_after_count() {
    let url = spawn_channel_server(5).await;
    let api = api_for(url, "sid-1");
    let sid = api.sid().await.unwrap();
    let ws = api.ws().await.unwrap();

    let args = ListenArgs {
        channel: "study.abc".to_string(),
        event: None,
        timeout: Some(5),
        count: Some(2),
    };
    args.listen(&ws, &sid).await.unwrap();
    ws.close().await.unwrap();
}

#[tokio::test]
async fn test_listen_for_event() {
    let url = spawn_channel_server(1).await;
    let api = api_for(url, "sid-1");
    let sid = api.sid().await.unwrap();
    let ws = api.ws().await.unwrap();

    let args = ListenArgs {
        channel: "study.abc".to_string(),
        event: Some("ready".to_string()),
        timeout: Some(5),
        count: None,
    };
    args.listen(&ws, &sid).await.unwrap();
    ws.close().await.unwrap();
}
