//! Single-connection channel manager
//!
//! One background task owns the socket. Callers talk to it over an mpsc
//! command queue; events flow back through one unbounded queue per
//! [`Subscription`]. When the socket drops the task reconnects up to
//! `reconnect_attempts` times and subscribes every active channel again.
//! Once reconnecting gives up, every waiter and subscription receives a
//! `WebSocket` error and the manager is closed.

use super::protocol::{ChannelEvent, ClientMessage, ServerMessage, StatusReply};
use crate::config::{AmbraConfig, WebSocketConfig};
use crate::domain::{AmbraError, Result, Sid};
use futures::stream::StreamExt;
use futures::{Sink, SinkExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type EventSender = mpsc::UnboundedSender<Result<ChannelEvent>>;
type Reply = oneshot::Sender<Result<()>>;

/// Connection settings
#[derive(Debug, Clone)]
pub struct WsConfig {
    pub url: Url,
    pub ping_interval: Duration,
    pub reconnect_attempts: usize,
    pub reconnect_delay: Duration,
}

impl WsConfig {
    /// Default timings for `url`
    pub fn new(url: Url) -> Self {
        Self::with_settings(url, &WebSocketConfig::default())
    }

    /// Settings from the `[websocket]` section
    pub fn from_config(config: &AmbraConfig) -> Result<Self> {
        Ok(Self::with_settings(config.websocket_url()?, &config.websocket))
    }

    fn with_settings(url: Url, settings: &WebSocketConfig) -> Self {
        Self {
            url,
            ping_interval: Duration::from_secs(settings.ping_interval_seconds.max(1)),
            reconnect_attempts: settings.reconnect_attempts,
            reconnect_delay: Duration::from_millis(settings.reconnect_delay_ms),
        }
    }
}

enum Command {
    Subscribe {
        id: u64,
        channel: String,
        sid: Sid,
        events: EventSender,
        reply: Reply,
    },
    Unsubscribe {
        id: u64,
        reply: Option<Reply>,
    },
    Close {
        reply: Reply,
    },
}

fn closed_error() -> AmbraError {
    AmbraError::WebSocket("WebSocket manager is closed".to_string())
}

/// Handle to the channel socket
pub struct WsManager {
    commands: mpsc::UnboundedSender<Command>,
    next_id: AtomicU64,
    task: Mutex<Option<JoinHandle<()>>>,
    url: Url,
}

impl std::fmt::Debug for WsManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsManager")
            .field("url", &self.url.as_str())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl WsManager {
    /// Open the socket and start the background task
    ///
    /// # Errors
    ///
    /// Returns `WebSocket` when the first connection cannot be made.
    pub async fn connect(config: WsConfig) -> Result<Self> {
        let socket = open(&config.url).await?;
        tracing::info!(url = %config.url, "WebSocket connected");

        let url = config.url.clone();
        let (commands, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(config, rx, socket));

        Ok(Self {
            commands,
            next_id: AtomicU64::new(1),
            task: Mutex::new(Some(task)),
            url,
        })
    }

    /// Socket URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Whether the background task has stopped
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    /// Subscribe to `channel` and wait for the server to confirm
    pub async fn subscribe(&self, sid: &Sid, channel: &str) -> Result<Subscription> {
        if channel.trim().is_empty() {
            return Err(AmbraError::Validation("Channel name cannot be empty".to_string()));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (events, events_rx) = mpsc::unbounded_channel();
        let (reply, reply_rx) = oneshot::channel();

        self.commands
            .send(Command::Subscribe {
                id,
                channel: channel.to_string(),
                sid: sid.clone(),
                events,
                reply,
            })
            .map_err(|_| closed_error())?;

        let subscription = Subscription {
            id,
            channel: channel.to_string(),
            events: events_rx,
            commands: self.commands.clone(),
            active: true,
        };
        reply_rx.await.map_err(|_| closed_error())??;

        tracing::debug!(channel = %channel, "Subscribed");
        Ok(subscription)
    }

    /// Subscribe, wait for `event` on `channel`, then unsubscribe
    pub async fn wait_for_event(
        &self,
        sid: &Sid,
        channel: &str,
        event: &str,
        timeout: Duration,
    ) -> Result<ChannelEvent> {
        let mut subscription = self.subscribe(sid, channel).await?;

        let found = tokio::time::timeout(timeout, async {
            while let Some(item) = subscription.next().await {
                let received = item?;
                if received.event == event {
                    return Ok(received);
                }
            }
            Err::<ChannelEvent, AmbraError>(closed_error())
        })
        .await;

        if let Err(e) = subscription.unsubscribe().await {
            tracing::debug!(channel = %channel, error = %e, "Unsubscribe after wait failed");
        }

        found.map_err(|_| {
            AmbraError::WebSocket(format!(
                "Timed out after {}s waiting for '{event}' on {channel}",
                timeout.as_secs_f32()
            ))
        })?
    }

    /// Send a close frame and stop the background task
    pub async fn close(&self) -> Result<()> {
        let task = match self.task.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        let Some(task) = task else {
            return Ok(());
        };

        let (reply, reply_rx) = oneshot::channel();
        if self.commands.send(Command::Close { reply }).is_ok() {
            let _ = reply_rx.await;
        }
        task.await
            .map_err(|e| AmbraError::WebSocket(format!("WebSocket task failed: {e}")))?;
        tracing::info!(url = %self.url, "WebSocket closed");
        Ok(())
    }
}

/// Events of one channel
///
/// Dropping the subscription unsubscribes in the background.
pub struct Subscription {
    id: u64,
    channel: String,
    events: mpsc::UnboundedReceiver<Result<ChannelEvent>>,
    commands: mpsc::UnboundedSender<Command>,
    active: bool,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("channel", &self.channel)
            .finish()
    }
}

impl Subscription {
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Next event; `None` once the manager is closed
    pub async fn next(&mut self) -> Option<Result<ChannelEvent>> {
        self.events.recv().await
    }

    /// Unsubscribe and wait for the server to confirm
    pub async fn unsubscribe(mut self) -> Result<()> {
        self.active = false;
        let (reply, reply_rx) = oneshot::channel();
        self.commands
            .send(Command::Unsubscribe {
                id: self.id,
                reply: Some(reply),
            })
            .map_err(|_| closed_error())?;
        reply_rx.await.map_err(|_| closed_error())?
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.active {
            let _ = self.commands.send(Command::Unsubscribe {
                id: self.id,
                reply: None,
            });
        }
    }
}

async fn open(url: &Url) -> Result<WsStream> {
    let (socket, _response) = connect_async(url.as_str())
        .await
        .map_err(|e| AmbraError::WebSocket(format!("Failed to connect to {url}: {e}")))?;
    Ok(socket)
}

async fn send<S>(sink: &mut S, message: &ClientMessage) -> Result<()>
where
    S: Sink<Message, Error = WsError> + Unpin,
{
    let text = serde_json::to_string(message)?;
    sink.send(Message::Text(text)).await?;
    Ok(())
}

struct Subscriber {
    id: u64,
    events: EventSender,
}

struct ChannelState {
    sid: Sid,
    subscribers: Vec<Subscriber>,
}

struct Pending {
    action: &'static str,
    channel: String,
    reply: Reply,
}

#[derive(Default)]
struct State {
    channels: HashMap<String, ChannelState>,
    pending: Vec<Pending>,
}

impl State {
    /// Apply a command; an error means the socket is unusable
    async fn handle<S>(&mut self, command: Command, sink: &mut S) -> Result<()>
    where
        S: Sink<Message, Error = WsError> + Unpin,
    {
        match command {
            Command::Subscribe {
                id,
                channel,
                sid,
                events,
                reply,
            } => {
                let subscriber = Subscriber { id, events };
                if let Some(state) = self.channels.get_mut(&channel) {
                    state.subscribers.push(subscriber);
                    let waiting = self
                        .pending
                        .iter()
                        .any(|p| p.action == "subscribe" && p.channel == channel);
                    if waiting {
                        self.pending.push(Pending {
                            action: "subscribe",
                            channel,
                            reply,
                        });
                    } else {
                        let _ = reply.send(Ok(()));
                    }
                    return Ok(());
                }

                self.channels.insert(
                    channel.clone(),
                    ChannelState {
                        sid: sid.clone(),
                        subscribers: vec![subscriber],
                    },
                );
                self.pending.push(Pending {
                    action: "subscribe",
                    channel: channel.clone(),
                    reply,
                });
                send(
                    sink,
                    &ClientMessage::Subscribe {
                        channel,
                        sid: sid.expose().to_string(),
                    },
                )
                .await
            }
            Command::Unsubscribe { id, reply } => {
                let Some((channel, sid)) = self.remove_subscriber(id) else {
                    // Already pruned after its receiver went away
                    if let Some(reply) = reply {
                        let _ = reply.send(Ok(()));
                    }
                    return self.unsubscribe_idle(sink).await;
                };

                if self.channels.contains_key(&channel) {
                    if let Some(reply) = reply {
                        let _ = reply.send(Ok(()));
                    }
                    return self.unsubscribe_idle(sink).await;
                }

                tracing::debug!(channel = %channel, "Unsubscribing");
                if let Some(reply) = reply {
                    self.pending.push(Pending {
                        action: "unsubscribe",
                        channel: channel.clone(),
                        reply,
                    });
                }
                send(
                    sink,
                    &ClientMessage::Unsubscribe {
                        channel,
                        sid: sid.expose().to_string(),
                    },
                )
                .await
            }
            Command::Close { reply } => {
                let _ = reply.send(Ok(()));
                Ok(())
            }
        }
    }

    /// Drop a subscriber; returns its channel and the channel's sid
    ///
    /// When it was the last subscriber the channel is removed from the
    /// active set.
    fn remove_subscriber(&mut self, id: u64) -> Option<(String, Sid)> {
        let (channel, sid) = self
            .channels
            .iter()
            .find(|(_, state)| state.subscribers.iter().any(|s| s.id == id))
            .map(|(name, state)| (name.clone(), state.sid.clone()))?;

        if let Some(state) = self.channels.get_mut(&channel) {
            state.subscribers.retain(|s| s.id != id);
            if state.subscribers.is_empty() {
                self.channels.remove(&channel);
            }
        }
        Some((channel, sid))
    }

    /// Apply a text frame from the server
    async fn dispatch<S>(&mut self, text: &str, sink: &mut S) -> Result<()>
    where
        S: Sink<Message, Error = WsError> + Unpin,
    {
        match ServerMessage::parse(text) {
            Ok(ServerMessage::Event(event)) => {
                self.deliver(event);
                return self.unsubscribe_idle(sink).await;
            }
            Ok(ServerMessage::Status(reply)) => self.resolve(reply),
            Ok(ServerMessage::Other(_)) => {
                tracing::trace!("Ignoring unrecognised WebSocket frame");
            }
            Err(e) => tracing::warn!(error = %e, "Malformed WebSocket frame"),
        }
        Ok(())
    }

    /// Remove channels whose receivers are all gone and unsubscribe them
    async fn unsubscribe_idle<S>(&mut self, sink: &mut S) -> Result<()>
    where
        S: Sink<Message, Error = WsError> + Unpin,
    {
        let idle: Vec<String> = self
            .channels
            .iter_mut()
            .filter_map(|(name, state)| {
                state.subscribers.retain(|s| !s.events.is_closed());
                state.subscribers.is_empty().then(|| name.clone())
            })
            .collect();

        for channel in idle {
            let Some(state) = self.channels.remove(&channel) else {
                continue;
            };
            tracing::debug!(channel = %channel, "No subscribers left, unsubscribing");
            send(
                sink,
                &ClientMessage::Unsubscribe {
                    channel,
                    sid: state.sid.expose().to_string(),
                },
            )
            .await?;
        }
        Ok(())
    }

    fn deliver(&mut self, event: ChannelEvent) {
        let Some(state) = self.channels.get_mut(&event.channel) else {
            tracing::trace!(channel = %event.channel, "Event for inactive channel");
            return;
        };
        tracing::debug!(channel = %event.channel, event = %event.event, "Channel event");
        state
            .subscribers
            .retain(|s| s.events.send(Ok(event.clone())).is_ok());
    }

    fn resolve(&mut self, reply: StatusReply) {
        let Some(action) = reply.action.clone() else {
            return;
        };

        let (matched, rest): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.pending).into_iter().partition(|p| {
                p.action == action
                    && reply.channel.as_deref().map_or(true, |c| c == p.channel)
            });
        self.pending = rest;

        if matched.is_empty() {
            return;
        }

        if !reply.is_ok() && action == "subscribe" {
            for pending in &matched {
                self.channels.remove(&pending.channel);
            }
        }
        for pending in matched {
            let result = reply.clone().into_result();
            let _ = pending.reply.send(result);
        }
    }

    /// Re-send subscribe for every active channel on a new socket
    async fn resubscribe<S>(&mut self, sink: &mut S) -> Result<()>
    where
        S: Sink<Message, Error = WsError> + Unpin,
    {
        let (unsubscribes, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|p| p.action == "unsubscribe");
        self.pending = rest;
        for pending in unsubscribes {
            let _ = pending.reply.send(Ok(()));
        }

        // The old socket held the subscription; nothing to unsubscribe here
        self.channels.retain(|_, state| {
            state.subscribers.retain(|s| !s.events.is_closed());
            !state.subscribers.is_empty()
        });

        for (channel, state) in &self.channels {
            tracing::debug!(channel = %channel, "Resubscribing");
            send(
                sink,
                &ClientMessage::Subscribe {
                    channel: channel.clone(),
                    sid: state.sid.expose().to_string(),
                },
            )
            .await?;
        }
        Ok(())
    }

    fn fail_all(&mut self, message: &str) {
        for pending in self.pending.drain(..) {
            let _ = pending.reply.send(Err(AmbraError::WebSocket(message.to_string())));
        }
        for (_, state) in self.channels.drain() {
            for subscriber in state.subscribers {
                let _ = subscriber
                    .events
                    .send(Err(AmbraError::WebSocket(message.to_string())));
            }
        }
    }
}

async fn reconnect(config: &WsConfig) -> Result<WsStream> {
    let mut last_error = closed_error();
    for attempt in 1..=config.reconnect_attempts {
        tokio::time::sleep(config.reconnect_delay).await;
        match open(&config.url).await {
            Ok(socket) => {
                tracing::info!(url = %config.url, attempt, "WebSocket reconnected");
                return Ok(socket);
            }
            Err(e) => {
                tracing::warn!(
                    attempt,
                    max_attempts = config.reconnect_attempts,
                    error = %e,
                    "WebSocket reconnect failed"
                );
                last_error = e;
            }
        }
    }
    Err(last_error)
}

async fn run(config: WsConfig, mut commands: mpsc::UnboundedReceiver<Command>, socket: WsStream) {
    let mut state = State::default();
    let mut socket = Some(socket);

    loop {
        let ws = match socket.take() {
            Some(ws) => ws,
            None => match reconnect(&config).await {
                Ok(ws) => ws,
                Err(e) => {
                    tracing::error!(error = %e, "WebSocket reconnect attempts exhausted");
                    let message = format!("Connection lost and could not be re-established: {e}");
                    state.fail_all(&message);
                    commands.close();
                    while let Ok(command) = commands.try_recv() {
                        fail_command(command, &message);
                    }
                    return;
                }
            },
        };

        let (mut sink, mut stream) = ws.split();
        if let Err(e) = state.resubscribe(&mut sink).await {
            tracing::warn!(error = %e, "Resubscribe failed");
            continue;
        }

        let mut ping = interval_at(Instant::now() + config.ping_interval, config.ping_interval);

        let lost = loop {
            tokio::select! {
                command = commands.recv() => match command {
                    None => {
                        let _ = sink.send(Message::Close(None)).await;
                        return;
                    }
                    Some(Command::Close { reply }) => {
                        let _ = sink.send(Message::Close(None)).await;
                        state.channels.clear();
                        for pending in state.pending.drain(..) {
                            let _ = pending.reply.send(Err(closed_error()));
                        }
                        let _ = reply.send(Ok(()));
                        return;
                    }
                    Some(command) => {
                        if let Err(e) = state.handle(command, &mut sink).await {
                            break e;
                        }
                    }
                },
                frame = stream.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        if let Err(e) = state.dispatch(&text, &mut sink).await {
                            break e;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        break AmbraError::WebSocket("Connection closed by server".to_string());
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => break e.into(),
                },
                _ = ping.tick() => {
                    if let Err(e) = send(&mut sink, &ClientMessage::Ping).await {
                        break e;
                    }
                }
            }
        };

        tracing::warn!(error = %lost, "WebSocket connection lost");
        if config.reconnect_attempts == 0 {
            let message = format!("Connection lost: {lost}");
            state.fail_all(&message);
            commands.close();
            while let Ok(command) = commands.try_recv() {
                fail_command(command, &message);
            }
            return;
        }
    }
}

fn fail_command(command: Command, message: &str) {
    let reply = match command {
        Command::Subscribe { reply, .. } | Command::Close { reply } => Some(reply),
        Command::Unsubscribe { reply, .. } => reply,
    };
    if let Some(reply) = reply {
        let _ = reply.send(Err(AmbraError::WebSocket(message.to_string())));
    }
}
