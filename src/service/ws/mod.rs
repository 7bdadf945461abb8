//! WebSocket channel subscriptions
//!
//! ```rust,no_run
//! use ambra_sdk::service::ws::{WsConfig, WsManager};
//! use std::time::Duration;
//!
//! # async fn example(sid: ambra_sdk::domain::Sid) -> ambra_sdk::domain::Result<()> {
//! let url = "wss://access.example.com/api/v3/channel/websocket".parse().unwrap();
//! let ws = WsManager::connect(WsConfig::new(url)).await?;
//! let ready = ws
//!     .wait_for_event(&sid, "study.ready", "ready", Duration::from_secs(60))
//!     .await?;
//! println!("{}", ready.payload);
//! ws.close().await?;
//! # Ok(())
//! # }
//! ```

mod manager;
pub mod protocol;

pub use manager::{Subscription, WsConfig, WsManager};
pub use protocol::{ChannelEvent, ClientMessage, ServerMessage, StatusReply};
