//! WebSocket fix channel.
//!
//! One connection carries every session. The protocol is JSON text frames:
//!
//! ```text
//! client -> server   {"action":"subscribe","session":"<id>"}
//!                    {"action":"locate","session":"<id>"}
//!                    {"action":"unsubscribe","session":"<id>"}
//!
//! server -> client   {"session":"<id>","latitude":..,"longitude":..,
//!                     "heading":..,"progressHint":..}
//! ```
//!
//! A position frame without `session` goes to every subscriber. Frames that
//! do not parse are logged and skipped. A subscriber whose buffer is full
//! misses the frame; the connection never waits on one session.
//!
//! Several subscriptions may share a session id. The server is told to
//! subscribe on the first and to unsubscribe when the last one ends.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::channel::{ChannelError, FixChannel, FixSubscription, DEFAULT_CHANNEL_CAPACITY};
use crate::coord::FixMessage;

struct Subscriber {
    id: u64,
    sender: mpsc::Sender<FixMessage>,
}

type Subscribers = Arc<DashMap<String, Vec<Subscriber>>>;

#[derive(Deserialize)]
struct InboundFrame {
    #[serde(default)]
    session: Option<String>,
    #[serde(flatten)]
    fix: FixMessage,
}

fn command(action: &str, session_id: &str) -> String {
    json!({ "action": action, "session": session_id }).to_string()
}

/// Fix channel over a WebSocket connection.
pub struct WebSocketFixChannel {
    url: String,
    commands: mpsc::UnboundedSender<String>,
    subscribers: Subscribers,
    capacity: usize,
    next_subscriber: AtomicU64,
    connection: CancellationToken,
}

impl WebSocketFixChannel {
    /// Connects to `url` (`ws://` or `wss://`).
    pub async fn connect(url: &str) -> Result<Self, ChannelError> {
        Self::connect_with_capacity(url, DEFAULT_CHANNEL_CAPACITY).await
    }

    /// Connects, buffering `capacity` fixes per subscription.
    pub async fn connect_with_capacity(url: &str, capacity: usize) -> Result<Self, ChannelError> {
        let (stream, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| ChannelError::Connect(format!("{}: {}", url, e)))?;
        info!(url = %url, "Fix channel connected");

        let (commands, commands_rx) = mpsc::unbounded_channel();
        let subscribers: Subscribers = Arc::new(DashMap::new());
        let connection = CancellationToken::new();

        tokio::spawn(run_connection(
            stream,
            commands_rx,
            Arc::clone(&subscribers),
            connection.clone(),
        ));

        Ok(Self {
            url: url.to_string(),
            commands,
            subscribers,
            capacity: capacity.max(1),
            next_subscriber: AtomicU64::new(0),
            connection,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whether the connection task is still running.
    pub fn is_connected(&self) -> bool {
        !self.connection.is_cancelled()
    }

    /// Number of live subscriptions for `session_id`.
    pub fn subscriber_count(&self, session_id: &str) -> usize {
        self.subscribers.get(session_id).map_or(0, |subs| subs.len())
    }

    fn send(&self, text: String) -> Result<(), ChannelError> {
        self.commands.send(text).map_err(|_| ChannelError::Closed)
    }
}

/// Removes subscriber `id` of `session`. Returns whether it was the last one.
fn remove_subscriber(subscribers: &Subscribers, session: &str, id: u64) -> bool {
    let emptied = match subscribers.get_mut(session) {
        Some(mut subs) => {
            subs.retain(|s| s.id != id);
            subs.is_empty()
        }
        None => return false,
    };
    if emptied {
        subscribers.remove_if(session, |_, subs| subs.is_empty());
    }
    emptied
}

impl Drop for WebSocketFixChannel {
    fn drop(&mut self) {
        self.connection.cancel();
    }
}

impl FixChannel for WebSocketFixChannel {
    async fn subscribe(&self, session_id: &str) -> Result<FixSubscription, ChannelError> {
        if !self.is_connected() {
            return Err(ChannelError::Closed);
        }

        let (tx, rx) = mpsc::channel(self.capacity);
        let id = self.next_subscriber.fetch_add(1, Ordering::Relaxed);
        let first = {
            let mut subs = self
                .subscribers
                .entry(session_id.to_string())
                .or_default();
            subs.push(Subscriber { id, sender: tx });
            subs.len() == 1
        };
        if first {
            if let Err(e) = self.send(command("subscribe", session_id)) {
                remove_subscriber(&self.subscribers, session_id, id);
                return Err(e);
            }
        }

        let ended = CancellationToken::new();
        let token = ended.clone();
        let connection = self.connection.clone();
        let commands = self.commands.clone();
        let subscribers = Arc::clone(&self.subscribers);
        let session = session_id.to_string();

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    if remove_subscriber(&subscribers, &session, id) {
                        let _ = commands.send(command("unsubscribe", &session));
                        debug!(session = %session, "Fix channel unsubscribed");
                    }
                }
                _ = connection.cancelled() => {}
            }
        });

        debug!(session = %session_id, url = %self.url, "Subscribed to WebSocket fix channel");
        Ok(FixSubscription::new(session_id, rx, ended))
    }

    async fn request_current_position(&self, session_id: &str) -> Result<(), ChannelError> {
        self.send(command("locate", session_id))
    }
}

async fn run_connection<S>(
    stream: tokio_tungstenite::WebSocketStream<S>,
    mut commands: mpsc::UnboundedReceiver<String>,
    subscribers: Subscribers,
    connection: CancellationToken,
) where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send + 'static,
{
    let (mut sink, mut frames) = stream.split();

    loop {
        tokio::select! {
            biased;

            _ = connection.cancelled() => {
                let _ = sink.send(Message::Close(None)).await;
                break;
            }

            outbound = commands.recv() => {
                let Some(text) = outbound else { break };
                if let Err(e) = sink.send(Message::Text(text)).await {
                    warn!(error = %e, "Fix channel send failed");
                    break;
                }
            }

            inbound = frames.next() => match inbound {
                Some(Ok(Message::Text(text))) => dispatch(&text, &subscribers),
                Some(Ok(Message::Close(_))) | None => {
                    info!("Fix channel closed by server");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(error = %e, "Fix channel read failed");
                    break;
                }
            },
        }
    }

    // Ends every subscription's stream
    subscribers.clear();
    connection.cancel();
}

fn dispatch(text: &str, subscribers: &Subscribers) {
    let frame: InboundFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            debug!(error = %e, "Skipping malformed fix frame");
            return;
        }
    };

    let deliver = |session: &str, subs: &[Subscriber]| {
        for sub in subs {
            match sub.sender.try_send(frame.fix) {
                Ok(()) | Err(TrySendError::Closed(_)) => {}
                Err(TrySendError::Full(_)) => {
                    warn!(session = %session, "Subscriber lagging, dropping fix");
                }
            }
        }
    };

    match &frame.session {
        Some(session) => {
            if let Some(subs) = subscribers.get(session) {
                deliver(session, &subs);
            }
        }
        None => {
            for entry in subscribers.iter() {
                deliver(entry.key(), entry.value());
            }
        }
    }
}
