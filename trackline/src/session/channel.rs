//! Fix channel boundary and the in-process implementation.
//!
//! A fix channel delivers [`FixMessage`]s for one tracking session id and
//! can be asked to push the agent's current position on demand (resync).
//! Transport details stay behind the [`FixChannel`] trait.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, warn};

use crate::coord::FixMessage;

/// Default buffer size per subscription.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Errors from a fix channel.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChannelError {
    /// Could not reach the transport.
    #[error("Failed to connect fix channel: {0}")]
    Connect(String),

    /// Could not send a request over the transport.
    #[error("Failed to send on fix channel: {0}")]
    Send(String),

    /// The transport has shut down.
    #[error("Fix channel closed")]
    Closed,
}

/// Stream of fixes for one session.
///
/// Dropping the subscription (or calling [`unsubscribe`](Self::unsubscribe))
/// tells the channel to stop delivering.
pub struct FixSubscription {
    session_id: String,
    receiver: mpsc::Receiver<FixMessage>,
    _guard: DropGuard,
}

impl FixSubscription {
    /// Creates a subscription fed by `receiver`. `cancellation` is cancelled
    /// when the subscription ends.
    pub fn new(
        session_id: impl Into<String>,
        receiver: mpsc::Receiver<FixMessage>,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            receiver,
            _guard: cancellation.drop_guard(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Next message, or `None` once the channel has closed.
    pub async fn recv(&mut self) -> Option<FixMessage> {
        self.receiver.recv().await
    }

    /// Ends the subscription.
    pub fn unsubscribe(self) {
        debug!(session = %self.session_id, "Unsubscribing from fix channel");
    }
}

/// Source of position fixes keyed by tracking session id.
pub trait FixChannel: Send + Sync {
    /// Starts delivering fixes for `session_id`.
    fn subscribe(
        &self,
        session_id: &str,
    ) -> impl Future<Output = Result<FixSubscription, ChannelError>> + Send;

    /// Asks the source to push the agent's current position.
    fn request_current_position(
        &self,
        session_id: &str,
    ) -> impl Future<Output = Result<(), ChannelError>> + Send;
}

/// Answers resync requests for [`MemoryFixChannel`].
pub type PositionProvider = Arc<dyn Fn(&str) -> Option<FixMessage> + Send + Sync>;

struct Topic {
    sender: broadcast::Sender<FixMessage>,
    last: Option<FixMessage>,
}

/// In-process fix hub.
///
/// Each session id is a broadcast topic. Resync requests are answered by
/// the registered [`PositionProvider`], or by re-publishing the last message
/// seen for the session.
pub struct MemoryFixChannel {
    topics: DashMap<String, Topic>,
    capacity: usize,
    position_provider: Option<PositionProvider>,
    resync_requests: AtomicU64,
}

impl MemoryFixChannel {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates a hub buffering `capacity` messages per subscriber.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            topics: DashMap::new(),
            capacity: capacity.max(1),
            position_provider: None,
            resync_requests: AtomicU64::new(0),
        }
    }

    /// Answers resync requests with `provider` instead of the last message.
    pub fn with_position_provider(mut self, provider: PositionProvider) -> Self {
        self.position_provider = Some(provider);
        self
    }

    fn sender(&self, session_id: &str) -> broadcast::Sender<FixMessage> {
        self.topics
            .entry(session_id.to_string())
            .or_insert_with(|| Topic {
                sender: broadcast::channel(self.capacity).0,
                last: None,
            })
            .sender
            .clone()
    }

    /// Publishes `message` to every subscriber of `session_id`.
    ///
    /// Returns the number of subscribers reached.
    pub fn publish(&self, session_id: &str, message: FixMessage) -> usize {
        let sender = self.sender(session_id);
        if let Some(mut topic) = self.topics.get_mut(session_id) {
            topic.last = Some(message);
        }
        sender.send(message).unwrap_or(0)
    }

    /// Number of live subscriptions for `session_id`.
    pub fn subscriber_count(&self, session_id: &str) -> usize {
        self.topics
            .get(session_id)
            .map_or(0, |topic| topic.sender.receiver_count())
    }

    /// Resync requests received so far.
    pub fn resync_requests(&self) -> u64 {
        self.resync_requests.load(Ordering::Relaxed)
    }
}

impl Default for MemoryFixChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl FixChannel for MemoryFixChannel {
    async fn subscribe(&self, session_id: &str) -> Result<FixSubscription, ChannelError> {
        let mut source = self.sender(session_id).subscribe();
        let (tx, rx) = mpsc::channel(self.capacity);
        let cancellation = CancellationToken::new();
        let token = cancellation.clone();
        let session = session_id.to_string();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    received = source.recv() => match received {
                        Ok(message) => {
                            if tx.send(message).await.is_err() {
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(session = %session, skipped, "Fix subscriber lagged, oldest fixes dropped");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
            debug!(session = %session, "Fix forwarder stopped");
        });

        debug!(session = %session_id, "Subscribed to in-memory fix channel");
        Ok(FixSubscription::new(session_id, rx, cancellation))
    }

    async fn request_current_position(&self, session_id: &str) -> Result<(), ChannelError> {
        self.resync_requests.fetch_add(1, Ordering::Relaxed);

        let answer = match &self.position_provider {
            Some(provider) => provider(session_id),
            None => self.topics.get(session_id).and_then(|topic| topic.last),
        };

        match answer {
            Some(message) => {
                debug!(session = %session_id, "Answering resync request");
                self.publish(session_id, message);
            }
            None => debug!(session = %session_id, "Resync requested, no position known"),
        }
        Ok(())
    }
}
