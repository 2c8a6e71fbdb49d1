// src/events/dispatcher.rs
//! Observer registry for gesture events

use crate::events::{GestureEvent, GestureKind};
use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{trace, warn};

/// Callback invoked for every event of the subscribed kind
pub type GestureHandler = Arc<dyn Fn(&GestureEvent) + Send + Sync>;

/// Opaque handle returned by every subscribe call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

#[derive(Clone)]
enum Subscriber {
    Callback(GestureHandler),
    Channel(Sender<GestureEvent>),
}

struct Registration {
    id: SubscriptionId,
    kind: GestureKind,
    subscriber: Subscriber,
}

/// Result of one dispatch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Subscribers that received the event
    pub delivered: usize,
    /// Handlers that panicked
    pub failed: usize,
}

/// Dispatcher counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchMetrics {
    /// Events offered to the registry
    pub events_dispatched: u64,
    /// Events nobody was subscribed to
    pub events_without_subscribers: u64,
    /// Successful deliveries
    pub deliveries: u64,
    /// Handler panics
    pub handler_failures: u64,
}

/// Multi-subscriber notification point, one list per [`GestureKind`]
///
/// Handlers run in subscription order on the dispatching thread, outside the
/// registry lock, so a handler may subscribe or unsubscribe freely. The
/// subscriber list is captured when dispatch begins: changes made by a handler
/// take effect from the next event. A panicking handler is logged and skipped.
pub struct EventDispatcher {
    registrations: Mutex<Vec<Registration>>,
    next_id: AtomicU64,

    events_dispatched: AtomicU64,
    events_without_subscribers: AtomicU64,
    deliveries: AtomicU64,
    handler_failures: AtomicU64,
}

impl EventDispatcher {
    /// Empty registry
    pub fn new() -> Self {
        Self {
            registrations: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            events_dispatched: AtomicU64::new(0),
            events_without_subscribers: AtomicU64::new(0),
            deliveries: AtomicU64::new(0),
            handler_failures: AtomicU64::new(0),
        }
    }

    /// Register a callback for `kind`
    pub fn subscribe<F>(&self, kind: GestureKind, handler: F) -> SubscriptionId
    where
        F: Fn(&GestureEvent) + Send + Sync + 'static,
    {
        self.register(kind, Subscriber::Callback(Arc::new(handler)))
    }

    /// Register a channel for `kind`; dropping the receiver ends the subscription
    pub fn subscribe_channel(&self, kind: GestureKind) -> (SubscriptionId, Receiver<GestureEvent>) {
        let (tx, rx) = channel::unbounded();
        (self.register(kind, Subscriber::Channel(tx)), rx)
    }

    /// Remove a subscription. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut registrations = self.registrations.lock();
        let before = registrations.len();
        registrations.retain(|r| r.id != id);
        registrations.len() != before
    }

    /// Live subscriptions for `kind`
    pub fn subscriber_count(&self, kind: GestureKind) -> usize {
        self.registrations.lock().iter().filter(|r| r.kind == kind).count()
    }

    /// Deliver `event` to every subscriber of its kind
    pub fn dispatch(&self, event: &GestureEvent) -> DispatchReport {
        self.events_dispatched.fetch_add(1, Ordering::Relaxed);

        let targets: Vec<(SubscriptionId, Subscriber)> = self
            .registrations
            .lock()
            .iter()
            .filter(|r| r.kind == event.kind)
            .map(|r| (r.id, r.subscriber.clone()))
            .collect();

        if targets.is_empty() {
            self.events_without_subscribers.fetch_add(1, Ordering::Relaxed);
            trace!(kind = %event.kind, "no subscribers, event dropped");
            return DispatchReport::default();
        }

        let mut report = DispatchReport::default();
        let mut disconnected = Vec::new();

        for (id, subscriber) in targets {
            match subscriber {
                Subscriber::Callback(handler) => {
                    match panic::catch_unwind(AssertUnwindSafe(|| handler(event))) {
                        Ok(()) => report.delivered += 1,
                        Err(payload) => {
                            report.failed += 1;
                            warn!(
                                kind = %event.kind,
                                subscription = id.0,
                                reason = panic_message(payload.as_ref()),
                                "gesture handler panicked"
                            );
                        }
                    }
                }
                Subscriber::Channel(tx) => match tx.send(*event) {
                    Ok(()) => report.delivered += 1,
                    Err(_) => disconnected.push(id),
                },
            }
        }

        if !disconnected.is_empty() {
            self.registrations.lock().retain(|r| !disconnected.contains(&r.id));
            trace!(count = disconnected.len(), "pruned closed channel subscriptions");
        }

        self.deliveries.fetch_add(report.delivered as u64, Ordering::Relaxed);
        self.handler_failures.fetch_add(report.failed as u64, Ordering::Relaxed);
        report
    }

    /// Counters since creation
    pub fn metrics(&self) -> DispatchMetrics {
        DispatchMetrics {
            events_dispatched: self.events_dispatched.load(Ordering::Relaxed),
            events_without_subscribers: self.events_without_subscribers.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            handler_failures: self.handler_failures.load(Ordering::Relaxed),
        }
    }

    fn register(&self, kind: GestureKind, subscriber: Subscriber) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.registrations.lock().push(Registration { id, kind, subscriber });
        id
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("subscriptions", &self.registrations.lock().len())
            .field("metrics", &self.metrics())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn blink_at(nanos: u64) -> GestureEvent {
        GestureEvent { kind: GestureKind::Blink, fired_at_nanos: nanos }
    }

    #[test]
    fn test_no_subscribers_is_not_an_error() {
        let dispatcher = EventDispatcher::new();
        assert_eq!(dispatcher.dispatch(&blink_at(0)), DispatchReport::default());
        assert_eq!(dispatcher.metrics().events_without_subscribers, 1);
    }

    #[test]
    fn test_handlers_run_in_insertion_order() {
        let dispatcher = EventDispatcher::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let order = order.clone();
            dispatcher.subscribe(GestureKind::Blink, move |_| order.lock().push(tag));
        }

        let report = dispatcher.dispatch(&blink_at(1));
        assert_eq!(report.delivered, 3);
        assert_eq!(*order.lock(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_events_only_reach_their_kind() {
        let dispatcher = EventDispatcher::new();
        let blinks = Arc::new(AtomicUsize::new(0));
        let clenches = Arc::new(AtomicUsize::new(0));

        let b = blinks.clone();
        dispatcher.subscribe(GestureKind::Blink, move |_| {
            b.fetch_add(1, Ordering::SeqCst);
        });
        let c = clenches.clone();
        dispatcher.subscribe(GestureKind::JawClench, move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        dispatcher.dispatch(&GestureEvent { kind: GestureKind::JawClench, fired_at_nanos: 5 });
        assert_eq!(blinks.load(Ordering::SeqCst), 0);
        assert_eq!(clenches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_panicking_handler_is_isolated() {
        let dispatcher = EventDispatcher::new();
        let reached = Arc::new(AtomicUsize::new(0));

        dispatcher.subscribe(GestureKind::Blink, |_| panic!("display went away"));
        let r = reached.clone();
        dispatcher.subscribe(GestureKind::Blink, move |_| {
            r.fetch_add(1, Ordering::SeqCst);
        });

        let report = dispatcher.dispatch(&blink_at(2));
        assert_eq!(report, DispatchReport { delivered: 1, failed: 1 });
        assert_eq!(reached.load(Ordering::SeqCst), 1);
        assert_eq!(dispatcher.metrics().handler_failures, 1);
    }

    #[test]
    fn test_unsubscribe_from_inside_handler() {
        let dispatcher = Arc::new(EventDispatcher::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let own_id = Arc::new(Mutex::new(None::<SubscriptionId>));

        let d = dispatcher.clone();
        let c = calls.clone();
        let slot = own_id.clone();
        let id = dispatcher.subscribe(GestureKind::Blink, move |_| {
            c.fetch_add(1, Ordering::SeqCst);
            if let Some(id) = *slot.lock() {
                d.unsubscribe(id);
            }
        });
        *own_id.lock() = Some(id);

        dispatcher.dispatch(&blink_at(1));
        dispatcher.dispatch(&blink_at(2));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(dispatcher.subscriber_count(GestureKind::Blink), 0);
    }

    #[test]
    fn test_subscribe_from_inside_handler_applies_to_next_event() {
        let dispatcher = Arc::new(EventDispatcher::new());
        let late_calls = Arc::new(AtomicUsize::new(0));

        let d = dispatcher.clone();
        let late = late_calls.clone();
        dispatcher.subscribe(GestureKind::Blink, move |_| {
            let late = late.clone();
            d.subscribe(GestureKind::Blink, move |_| {
                late.fetch_add(1, Ordering::SeqCst);
            });
        });

        dispatcher.dispatch(&blink_at(1));
        assert_eq!(late_calls.load(Ordering::SeqCst), 0);
        dispatcher.dispatch(&blink_at(2));
        assert_eq!(late_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_channel_subscription_and_pruning() {
        let dispatcher = EventDispatcher::new();
        let (id, rx) = dispatcher.subscribe_channel(GestureKind::Blink);

        dispatcher.dispatch(&blink_at(42));
        assert_eq!(rx.try_recv().unwrap(), blink_at(42));

        drop(rx);
        let report = dispatcher.dispatch(&blink_at(43));
        assert_eq!(report.delivered, 0);
        assert_eq!(dispatcher.subscriber_count(GestureKind::Blink), 0);
        assert!(!dispatcher.unsubscribe(id));
    }

    #[test]
    fn test_unsubscribe_unknown_id() {
        let dispatcher = EventDispatcher::new();
        let id = dispatcher.subscribe(GestureKind::JawClench, |_| {});
        assert!(dispatcher.unsubscribe(id));
        assert!(!dispatcher.unsubscribe(id));
    }
}
