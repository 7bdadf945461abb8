//! Listen command implementation
//!
//! Subscribes to a channel and prints each event as a JSON line until
//! Ctrl+C, `--count` events, or `--timeout` seconds. With `--event` it waits
//! for that one event and exits.

use crate::api::Api;
use crate::cli::exit_code;
use crate::config::load_config;
use crate::domain::{AmbraError, Result, Sid};
use crate::service::{ChannelEvent, Subscription, WsManager};
use clap::Args;
use std::time::Duration;

/// Arguments for the listen command
#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Channel name, e.g. study.<uuid>
    pub channel: String,

    /// Wait for this event, print it and exit
    #[arg(short, long)]
    pub event: Option<String>,

    /// Give up after this many seconds
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Exit after this many events
    #[arg(long)]
    pub count: Option<usize>,
}

fn print_event(event: &ChannelEvent) -> Result<()> {
    println!("{}", serde_json::to_string(&event.payload)?);
    Ok(())
}

impl ListenArgs {
    /// Execute the listen command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("❌ {e}");
                return Ok(2);
            }
        };

        let api = match Api::from_config(&config) {
            Ok(api) => api,
            Err(e) => {
                eprintln!("❌ {e}");
                return Ok(exit_code(&e));
            }
        };

        let outcome = self.run(&api).await;

        match outcome {
            Ok(()) => Ok(0),
            Err(e) => {
                tracing::error!(error = %e, channel = %self.channel, "Listen failed");
                eprintln!("❌ {e}");
                Ok(exit_code(&e))
            }
        }
    }

    async fn run(&self, api: &Api) -> Result<()> {
        let sid = api.sid().await?;
        let ws = api.ws().await?;
        let result = self.listen(&ws, &sid).await;
        if let Err(e) = ws.close().await {
            tracing::debug!(error = %e, "Close after listen failed");
        }
        result
    }

    /// Receive events on an open socket
    pub async fn listen(&self, ws: &WsManager, sid: &Sid) -> Result<()> {
        let timeout = self.timeout.map(Duration::from_secs);

        if let Some(ref event) = self.event {
            // Without a timeout, wait as long as a day
            let wait = timeout.unwrap_or(Duration::from_secs(86_400));
            let found = ws.wait_for_event(sid, &self.channel, event, wait).await?;
            return print_event(&found);
        }

        let mut subscription = ws.subscribe(sid, &self.channel).await?;
        tracing::info!(channel = %self.channel, "Listening");

        let receive = self.receive(&mut subscription);

        let result = match timeout {
            Some(limit) => match tokio::time::timeout(limit, receive).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::info!(channel = %self.channel, "Listen timeout reached");
                    Ok(())
                }
            },
            None => receive.await,
        };

        if let Err(e) = subscription.unsubscribe().await {
            tracing::debug!(error = %e, "Unsubscribe failed");
        }
        result
    }

    async fn receive(&self, subscription: &mut Subscription) -> Result<()> {
        let mut seen = 0usize;
        loop {
            tokio::select! {
                item = subscription.next() => match item {
                    Some(event) => {
                        print_event(&event?)?;
                        seen += 1;
                        if self.count.is_some_and(|limit| seen >= limit) {
                            return Ok(());
                        }
                    }
                    None => return Err(AmbraError::WebSocket("WebSocket closed".to_string())),
                },
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Received Ctrl+C, stopping");
                    return Ok(());
                }
            }
        }
    }
}
