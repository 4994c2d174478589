//! Thread boundaries of the pipeline.
//!
//! `SignalBridge` is the announcement bus between the vision side and the
//! gesture service: a publish/subscribe channel keyed by [`EventType`]. The
//! two sides never hold references to each other, only to the bridge.
//!
//! `UiNotifier` / `UiNoticeReceiver` carry user-visible side effects to the
//! thread that owns the UI.
//!
//! Both are best-effort. An event published with nobody subscribed is lost,
//! and a full subscriber queue drops the new event for that subscriber.

use crate::config::BridgeConfig;
use crate::types::UiNotice;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Kinds of platform event carried by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// Announcement; the gesture trigger
    Announcement,
    /// A window changed state
    WindowStateChanged,
    /// A view scrolled
    ViewScrolled,
}

impl EventType {
    pub const ALL: [EventType; 3] = [
        EventType::Announcement,
        EventType::WindowStateChanged,
        EventType::ViewScrolled,
    ];
}

/// One event on the bridge. Carries no payload beyond its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformEvent {
    pub event_type: EventType,
    pub at: Instant,
}

impl PlatformEvent {
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            at: Instant::now(),
        }
    }

    pub fn announcement() -> Self {
        Self::new(EventType::Announcement)
    }
}

/// Delivery counters
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct BridgeStats {
    /// Events passed to `publish`
    pub published: u64,
    /// Individual subscriber deliveries that succeeded
    pub delivered: u64,
    /// Events nobody received (no subscriber, or every queue full)
    pub lost: u64,
}

struct BridgeInner {
    subscribers: Mutex<HashMap<EventType, Vec<Sender<PlatformEvent>>>>,
    capacity: usize,
    published: AtomicU64,
    delivered: AtomicU64,
    lost: AtomicU64,
}

/// Cloneable handle to the announcement bus.
#[derive(Clone)]
pub struct SignalBridge {
    inner: Arc<BridgeInner>,
}

impl SignalBridge {
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            inner: Arc::new(BridgeInner {
                subscribers: Mutex::new(HashMap::new()),
                capacity: config.subscriber_capacity.max(1),
                published: AtomicU64::new(0),
                delivered: AtomicU64::new(0),
                lost: AtomicU64::new(0),
            }),
        }
    }

    /// Listen for one kind of event.
    pub fn subscribe(&self, event_type: EventType) -> Subscription {
        self.subscribe_to(&[event_type])
    }

    /// Listen for several kinds of event on one queue.
    ///
    /// The subscription ends when the returned value is dropped.
    pub fn subscribe_to(&self, event_types: &[EventType]) -> Subscription {
        let (tx, rx) = bounded(self.inner.capacity);
        let mut subscribers = self
            .inner
            .subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        for event_type in event_types {
            subscribers.entry(*event_type).or_default().push(tx.clone());
        }
        Subscription { rx }
    }

    /// Post an event to every live subscriber of its kind.
    ///
    /// Returns how many subscribers accepted it. Never blocks.
    pub fn publish(&self, event: PlatformEvent) -> usize {
        self.inner.published.fetch_add(1, Ordering::Relaxed);

        let mut delivered = 0usize;
        {
            let mut subscribers = self
                .inner
                .subscribers
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            if let Some(senders) = subscribers.get_mut(&event.event_type) {
                senders.retain(|tx| match tx.try_send(event) {
                    Ok(()) => {
                        delivered += 1;
                        true
                    }
                    Err(TrySendError::Full(_)) => {
                        tracing::warn!("Subscriber queue full, dropping {:?}", event.event_type);
                        true
                    }
                    Err(TrySendError::Disconnected(_)) => false,
                });
            }
        }

        if delivered == 0 {
            self.inner.lost.fetch_add(1, Ordering::Relaxed);
            tracing::trace!("No active listener for {:?}", event.event_type);
        } else {
            self.inner
                .delivered
                .fetch_add(delivered as u64, Ordering::Relaxed);
        }
        delivered
    }

    /// Fire the gesture trigger
    pub fn announce(&self) -> usize {
        self.publish(PlatformEvent::announcement())
    }

    /// Subscribers currently registered for `event_type`.
    ///
    /// Dropped subscriptions are only pruned on the next publish, so this may
    /// over-count until then.
    pub fn subscriber_count(&self, event_type: EventType) -> usize {
        self.inner
            .subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&event_type)
            .map_or(0, Vec::len)
    }

    pub fn stats(&self) -> BridgeStats {
        BridgeStats {
            published: self.inner.published.load(Ordering::Relaxed),
            delivered: self.inner.delivered.load(Ordering::Relaxed),
            lost: self.inner.lost.load(Ordering::Relaxed),
        }
    }
}

impl Default for SignalBridge {
    fn default() -> Self {
        Self::new(&BridgeConfig::default())
    }
}

/// Receiving end of a bridge subscription
pub struct Subscription {
    rx: Receiver<PlatformEvent>,
}

impl Subscription {
    /// Wait up to `timeout` for the next event.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<PlatformEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    /// Try to receive a single event without blocking.
    pub fn try_recv(&self) -> Option<PlatformEvent> {
        self.rx.try_recv().ok()
    }

    /// Drain all pending events.
    pub fn drain(&self) -> Vec<PlatformEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}

// ============================================================================
// UI notices
// ============================================================================

/// Channel capacity for notices (pipeline → UI).
const UI_CHANNEL_CAPACITY: usize = 256;

/// Create the notice channel: `(notifier_for_pipeline, receiver_for_ui)`.
pub fn ui_channel() -> (UiNotifier, UiNoticeReceiver) {
    let (tx, rx) = bounded(UI_CHANNEL_CAPACITY);
    (UiNotifier { tx }, UiNoticeReceiver { rx })
}

/// Pipeline-side handle; callable from any thread.
#[derive(Clone)]
pub struct UiNotifier {
    tx: Sender<UiNotice>,
}

impl UiNotifier {
    /// Queue a notice for the UI thread. Returns false if it was dropped.
    pub fn notify(&self, notice: UiNotice) -> bool {
        match self.tx.try_send(notice) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!("UI notice queue full, dropping notice");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// UI-side handle.
pub struct UiNoticeReceiver {
    rx: Receiver<UiNotice>,
}

impl UiNoticeReceiver {
    /// Drain all pending notices.
    pub fn drain(&self) -> Vec<UiNotice> {
        let mut notices = Vec::new();
        while let Ok(notice) = self.rx.try_recv() {
            notices.push(notice);
        }
        notices
    }

    /// Try to receive a single notice without blocking.
    pub fn try_recv(&self) -> Option<UiNotice> {
        self.rx.try_recv().ok()
    }

    /// Wait up to `timeout` for the next notice.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<UiNotice> {
        self.rx.recv_timeout(timeout).ok()
    }
}
