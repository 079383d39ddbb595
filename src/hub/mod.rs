//! Broadcast hub
//!
//! Fans normalized messages out to every registered sink. Each sink gets
//! its own bounded channel drained by a dedicated task, so a slow sink
//! never blocks publishers or its neighbours.
//!
//! The hub remembers the most recent message across all exchanges and
//! replays it to each newly registered sink before any live traffic.

mod outbox;
mod sink;

pub use sink::{Sink, SinkError};

use crate::message::PriceMessage;
use crate::telemetry::{self, GaugeMetric};
use outbox::{Inbox, Outbox, Push, Received};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use thiserror::Error;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub use outbox::MAX_BUFFER;

/// What to do when a sink's buffer is full
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Discard the oldest pending message for that sink
    #[default]
    DropOldest,
    /// Unregister the sink
    Disconnect,
}

/// Hub tuning, the `[hub]` config section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Pending messages held per sink
    pub subscriber_buffer: usize,
    pub overflow: OverflowPolicy,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            subscriber_buffer: 64,
            overflow: OverflowPolicy::DropOldest,
        }
    }
}

/// Registration failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HubError {
    #[error("no Tokio runtime available to drive the sink")]
    NoRuntime,

    #[error("hub is closed")]
    Closed,
}

/// Handle for one registered sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SinkKey(Uuid);

struct Subscriber {
    key: SinkKey,
    sink: Arc<dyn Sink>,
    outbox: Outbox,
    cancel: CancellationToken,
}

#[derive(Default)]
struct Registry {
    subscribers: HashMap<String, Vec<Subscriber>>,
    last: Option<PriceMessage>,
    closed: bool,
}

impl Registry {
    fn sink_count(&self) -> usize {
        self.subscribers.values().map(Vec::len).sum()
    }

    fn remove(&mut self, id: &str, key: SinkKey) -> bool {
        let Some(sinks) = self.subscribers.get_mut(id) else {
            return false;
        };

        let Some(pos) = sinks.iter().position(|s| s.key == key) else {
            return false;
        };

        let removed = sinks.remove(pos);
        removed.cancel.cancel();

        if sinks.is_empty() {
            self.subscribers.remove(id);
        }

        telemetry::set_gauge(GaugeMetric::Subscribers, self.sink_count() as f64);
        true
    }
}

/// Many-to-many broadcast hub
pub struct FeedHub {
    registry: Arc<Mutex<Registry>>,
    config: HubConfig,
}

impl FeedHub {
    pub fn new(config: HubConfig) -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry::default())),
            config,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        lock_registry(&self.registry)
    }

    /// Register `sink` under subscriber `id`
    ///
    /// If a message has already been published it is queued to the new
    /// sink first. The sink's forwarder runs on the current Tokio runtime.
    pub fn subscribe(
        &self,
        id: impl Into<String>,
        sink: Arc<dyn Sink>,
    ) -> Result<SinkKey, HubError> {
        let runtime = Handle::try_current().map_err(|_| HubError::NoRuntime)?;
        let id = id.into();
        let key = SinkKey(Uuid::new_v4());
        let (outbox, inbox) = outbox::channel(self.config.subscriber_buffer, self.config.overflow);
        let cancel = CancellationToken::new();

        {
            let mut registry = self.lock();
            if registry.closed {
                return Err(HubError::Closed);
            }
            if let Some(last) = registry.last.clone() {
                outbox.push(last);
            }
            registry.subscribers.entry(id.clone()).or_default().push(Subscriber {
                key,
                sink: sink.clone(),
                outbox,
                cancel: cancel.clone(),
            });
            telemetry::set_gauge(GaugeMetric::Subscribers, registry.sink_count() as f64);
        }

        tracing::debug!(subscriber = %id, "Sink subscribed");
        runtime.spawn(forward(
            Arc::downgrade(&self.registry),
            id,
            key,
            sink,
            inbox,
            cancel,
        ));

        Ok(key)
    }

    /// Unregister a specific sink previously subscribed under `id`
    ///
    /// Sinks are matched by identity. Returns false if nothing matched.
    pub fn unsubscribe(&self, id: &str, sink: &Arc<dyn Sink>) -> bool {
        let mut registry = self.lock();
        let key = registry.subscribers.get(id).and_then(|sinks| {
            sinks
                .iter()
                .find(|s| same_sink(&s.sink, sink))
                .map(|s| s.key)
        });

        match key {
            Some(key) => {
                tracing::debug!(subscriber = %id, "Sink unsubscribed");
                registry.remove(id, key)
            }
            None => false,
        }
    }

    /// Unregister a sink by the key returned from [`FeedHub::subscribe`]
    pub fn unsubscribe_key(&self, id: &str, key: SinkKey) -> bool {
        self.lock().remove(id, key)
    }

    /// Record `message` as the latest and queue it to every sink
    ///
    /// Never blocks on a sink. Returns the number of sinks it was queued to.
    pub fn publish(&self, message: PriceMessage) -> usize {
        let mut registry = self.lock();
        if registry.closed {
            return 0;
        }

        registry.last = Some(message.clone());

        let mut delivered = 0;
        let mut overflowed = Vec::new();

        for (id, sinks) in &registry.subscribers {
            for subscriber in sinks {
                match subscriber.outbox.push(message.clone()) {
                    Push::Queued => delivered += 1,
                    Push::Overflow => {
                        telemetry::record_sink_overflow(1);
                        overflowed.push((id.clone(), subscriber.key));
                    }
                    Push::Closed => {}
                }
            }
        }

        for (id, key) in overflowed {
            tracing::warn!(subscriber = %id, "Sink buffer full, disconnecting");
            registry.remove(&id, key);
        }

        delivered
    }

    /// Most recently published message, if any
    pub fn last_message(&self) -> Option<PriceMessage> {
        self.lock().last.clone()
    }

    /// Total registered sinks across all ids
    pub fn subscriber_count(&self) -> usize {
        self.lock().sink_count()
    }

    /// Number of sinks registered under `id`
    pub fn sinks_for(&self, id: &str) -> usize {
        self.lock().subscribers.get(id).map_or(0, Vec::len)
    }

    /// Stop all forwarders and reject further publishes
    pub fn close(&self) {
        let mut registry = self.lock();
        if registry.closed {
            return;
        }
        registry.closed = true;

        for subscriber in registry.subscribers.values().flatten() {
            subscriber.cancel.cancel();
        }
        registry.subscribers.clear();
        telemetry::set_gauge(GaugeMetric::Subscribers, 0.0);
    }
}

impl Default for FeedHub {
    fn default() -> Self {
        Self::new(HubConfig::default())
    }
}

impl Drop for FeedHub {
    fn drop(&mut self) {
        self.close();
    }
}

fn lock_registry(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

fn same_sink(a: &Arc<dyn Sink>, b: &Arc<dyn Sink>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

/// Drain one sink's channel until it is cancelled, closes or the sink fails
async fn forward(
    registry: Weak<Mutex<Registry>>,
    id: String,
    key: SinkKey,
    sink: Arc<dyn Sink>,
    mut inbox: Inbox,
    cancel: CancellationToken,
) {
    loop {
        let received = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            received = inbox.recv() => received,
        };

        let message = match received {
            Received::Message(message) => message,
            Received::Lagged(skipped) => {
                telemetry::record_sink_overflow(skipped);
                tracing::debug!(subscriber = %id, skipped, "Sink lagging, dropped oldest messages");
                continue;
            }
            Received::Closed => break,
        };

        if let Err(e) = sink.deliver(message).await {
            tracing::warn!(subscriber = %id, error = %e, "Removing unavailable sink");
            if let Some(registry) = registry.upgrade() {
                lock_registry(&registry).remove(&id, key);
            }
            break;
        }
    }
}
