// src/session.rs
//! Gesture service: owns the per-connection session and the subscriber registry
//!
//! A [`GestureService`] is created once with its configuration. Each call to
//! [`start`](GestureService::start) builds a fresh session (zero-filled
//! buffers, idle cooldown gate, new scheduler thread) and each call to
//! [`stop`](GestureService::stop) tears it down again. Subscriptions live on
//! the service, not the session, so they survive reconnects.

use crate::acquisition::{
    ChannelGroup, IngestMetrics, IngestOutcome, SensorChannel, SharedSampleBuffer, SignalIngest,
};
use crate::config::{timing, ConfigLoader, GestureConfig};
use crate::detection::{Classifier, ClassifierMetrics, Scheduler, TickOutcome};
use crate::error::{GestureError, GestureResult};
use crate::events::dispatcher::DispatchMetrics;
use crate::events::{EventDispatcher, GestureEvent, GestureKind, SubscriptionId};
use crate::hal::SampleSink;
use crate::utils::time::{MonotonicTimeProvider, TimeProvider};
use crossbeam::channel::Receiver;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info};

struct ActiveSession {
    ingest: Arc<SignalIngest>,
    classifier: Arc<Classifier>,
    scheduler: Scheduler,
    started_at_nanos: u64,
}

/// Snapshot of service counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Whether a session is active
    pub running: bool,
    /// Clock reading when the current session started
    pub started_at_nanos: Option<u64>,
    /// Counters of the current session; zero while idle
    pub ingest: IngestMetrics,
    /// Classifier counters of the current session; zero while idle
    pub classifier: ClassifierMetrics,
    /// Lifetime dispatcher counters
    pub dispatch: DispatchMetrics,
}

/// Blink and jaw-clench detection service
pub struct GestureService {
    config: GestureConfig,
    dispatcher: Arc<EventDispatcher>,
    clock: Arc<dyn TimeProvider>,
    session: Mutex<Option<ActiveSession>>,
}

impl GestureService {
    /// Create a service on the monotonic clock
    pub fn new(config: GestureConfig) -> GestureResult<Self> {
        Self::with_time_provider(config, Arc::new(MonotonicTimeProvider::new()))
    }

    /// Create a service reading time from `clock`
    pub fn with_time_provider(
        config: GestureConfig,
        clock: Arc<dyn TimeProvider>,
    ) -> GestureResult<Self> {
        config.validate().map_err(GestureError::InvalidConfiguration)?;
        debug!(config = %config.summary(), "gesture service created");

        Ok(Self {
            config,
            dispatcher: Arc::new(EventDispatcher::new()),
            clock,
            session: Mutex::new(None),
        })
    }

    /// Load configuration through `loader` and create a service from it
    pub fn from_loader(loader: &ConfigLoader) -> GestureResult<Self> {
        let config = loader.load()?;
        Self::new(config)
    }

    /// Begin a session. A no-op while one is already running.
    pub fn start(&self) -> GestureResult<()> {
        let mut slot = self.session.lock();
        if slot.is_some() {
            debug!("start ignored: session already running");
            return Ok(());
        }

        let capacity = self.config.buffer.capacity;
        let eye = Arc::new(SharedSampleBuffer::new(capacity));
        let jaw = Arc::new(SharedSampleBuffer::new(capacity));
        let ingest = Arc::new(SignalIngest::new(eye.clone(), jaw.clone()));
        let classifier = Arc::new(Classifier::new(
            eye,
            jaw,
            self.config.thresholds,
            self.config.timing.cooldown(),
            self.dispatcher.clone(),
            self.clock.clone(),
        ));

        let task_classifier = classifier.clone();
        let scheduler = Scheduler::start(
            timing::SCHEDULER_THREAD_NAME,
            self.config.timing.analysis_interval(),
            move || {
                task_classifier.tick();
            },
        )
        .map_err(GestureError::SchedulerSpawn)?;

        let started_at_nanos = self.clock.now_nanos();
        *slot = Some(ActiveSession { ingest, classifier, scheduler, started_at_nanos });

        info!(
            capacity,
            interval_ms = self.config.timing.analysis_interval_ms,
            cooldown_ms = self.config.timing.cooldown_ms,
            "gesture session started"
        );
        Ok(())
    }

    /// End the session and wait for the analysis thread to exit.
    ///
    /// A no-op while idle. Safe to call from a gesture handler; in that case
    /// the tick that delivered the event is the last one.
    pub fn stop(&self) {
        // Taken out first: the scheduler join must not happen under the session lock.
        let Some(mut session) = self.session.lock().take() else {
            debug!("stop ignored: no session running");
            return;
        };

        session.scheduler.stop();
        let classifier = session.classifier.metrics();
        info!(
            ticks = classifier.ticks,
            blinks = classifier.blinks,
            jaw_clenches = classifier.jaw_clenches,
            "gesture session stopped"
        );
    }

    /// Whether a session is active
    pub fn is_running(&self) -> bool {
        self.session.lock().is_some()
    }

    /// Route one batch from `channel` into its group buffer
    pub fn ingest(&self, channel: SensorChannel, samples: &[f32]) -> IngestOutcome {
        match self.current_ingest() {
            Some(ingest) => ingest.ingest(channel, samples),
            None => IngestOutcome::Inactive,
        }
    }

    /// Route one batch identified by a raw transport label such as `"EEG_AF7"`
    pub fn ingest_labeled(&self, label: &str, samples: &[f32]) -> IngestOutcome {
        match self.current_ingest() {
            Some(ingest) => ingest.ingest_labeled(label, samples),
            None => IngestOutcome::Inactive,
        }
    }

    /// Run one analysis pass on the calling thread, outside the schedule.
    ///
    /// Returns `None` while idle.
    pub fn analyze_now(&self) -> Option<TickOutcome> {
        let classifier = self.session.lock().as_ref().map(|s| s.classifier.clone())?;
        Some(classifier.tick())
    }

    /// Oldest-to-newest copy of `group`'s buffer, `None` while idle
    pub fn buffer_snapshot(&self, group: ChannelGroup) -> Option<Vec<f32>> {
        self.current_ingest().map(|ingest| ingest.buffer(group).snapshot())
    }

    /// Call `handler` for every blink
    pub fn on_blink<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&GestureEvent) + Send + Sync + 'static,
    {
        self.dispatcher.subscribe(GestureKind::Blink, handler)
    }

    /// Call `handler` for every jaw clench
    pub fn on_jaw_clench<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&GestureEvent) + Send + Sync + 'static,
    {
        self.dispatcher.subscribe(GestureKind::JawClench, handler)
    }

    /// Call `handler` for every `kind` event
    pub fn subscribe<F>(&self, kind: GestureKind, handler: F) -> SubscriptionId
    where
        F: Fn(&GestureEvent) + Send + Sync + 'static,
    {
        self.dispatcher.subscribe(kind, handler)
    }

    /// Receive `kind` events over a channel instead of a callback
    pub fn subscribe_channel(&self, kind: GestureKind) -> (SubscriptionId, Receiver<GestureEvent>) {
        self.dispatcher.subscribe_channel(kind)
    }

    /// Returns `false` if `id` was not registered
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.dispatcher.unsubscribe(id)
    }

    /// Configuration fixed at construction
    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    /// Current counters
    pub fn stats(&self) -> SessionStats {
        let session = self.session.lock();
        let mut stats = SessionStats {
            running: session.is_some(),
            dispatch: self.dispatcher.metrics(),
            ..SessionStats::default()
        };
        if let Some(active) = session.as_ref() {
            stats.started_at_nanos = Some(active.started_at_nanos);
            stats.ingest = active.ingest.metrics();
            stats.classifier = active.classifier.metrics();
        }
        stats
    }

    fn current_ingest(&self) -> Option<Arc<SignalIngest>> {
        self.session.lock().as_ref().map(|s| s.ingest.clone())
    }
}

impl SampleSink for GestureService {
    fn deliver(&self, channel: SensorChannel, samples: &[f32]) -> IngestOutcome {
        self.ingest(channel, samples)
    }
}

impl Drop for GestureService {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for GestureService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GestureService")
            .field("config", &self.config)
            .field("running", &self.is_running())
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::time::MockTimeProvider;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const MS: u64 = 1_000_000;

    /// Long period so only `analyze_now` drives the classifier
    fn manual_config(capacity: usize) -> GestureConfig {
        let mut config = GestureConfig::default();
        config.buffer.capacity = capacity;
        config.timing.analysis_interval_ms = 3_600_000;
        config
    }

    fn manual_service(capacity: usize) -> (GestureService, Arc<MockTimeProvider>) {
        let clock = Arc::new(MockTimeProvider::new(0));
        let service = GestureService::with_time_provider(manual_config(capacity), clock.clone()).unwrap();
        (service, clock)
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = GestureConfig::default();
        config.buffer.capacity = 0;
        match GestureService::new(config) {
            Err(GestureError::InvalidConfiguration(errors)) => {
                assert_eq!(errors[0].field, "buffer.capacity");
            }
            other => panic!("expected invalid configuration, got {:?}", other),
        }
    }

    #[test]
    fn test_idle_service_ignores_input() {
        let (service, _) = manual_service(4);
        assert!(!service.is_running());
        assert_eq!(service.ingest(SensorChannel::Af7, &[900.0]), IngestOutcome::Inactive);
        assert_eq!(service.ingest_labeled("EEG_TP9", &[900.0]), IngestOutcome::Inactive);
        assert!(service.analyze_now().is_none());
        assert!(service.buffer_snapshot(ChannelGroup::Eye).is_none());
    }

    #[test]
    fn test_start_and_stop_are_idempotent() {
        let (service, _) = manual_service(4);
        service.stop();

        service.start().unwrap();
        service.ingest(SensorChannel::Af7, &[120.0]);
        service.start().unwrap();
        assert_eq!(service.buffer_snapshot(ChannelGroup::Eye).unwrap(), vec![0.0, 0.0, 0.0, 120.0]);

        service.stop();
        service.stop();
        assert!(!service.is_running());
    }

    #[test]
    fn test_restart_uses_fresh_buffers() {
        let (service, clock) = manual_service(3);
        service.start().unwrap();
        service.ingest(SensorChannel::Af8, &[-420.0, 10.0]);
        assert_eq!(service.analyze_now().and_then(|o| o.fired()).map(|e| e.kind), Some(GestureKind::Blink));
        service.stop();

        clock.set_time(200 * MS);
        service.start().unwrap();
        assert_eq!(service.buffer_snapshot(ChannelGroup::Eye).unwrap(), vec![0.0; 3]);
        // New session, new gate: no carried-over cooldown.
        service.ingest(SensorChannel::Tp10, &[700.0]);
        assert_eq!(
            service.analyze_now().and_then(|o| o.fired()).map(|e| e.kind),
            Some(GestureKind::JawClench)
        );
    }

    #[test]
    fn test_subscriptions_survive_restart() {
        let (service, _) = manual_service(2);
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        service.on_jaw_clench(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        for _ in 0..2 {
            service.start().unwrap();
            service.ingest(SensorChannel::Tp9, &[800.0]);
            service.analyze_now();
            service.stop();
        }
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unsubscribed_handler_not_called() {
        let (service, _) = manual_service(2);
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let id = service.on_blink(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        assert!(service.unsubscribe(id));
        assert!(!service.unsubscribe(id));

        service.start().unwrap();
        service.ingest(SensorChannel::Af7, &[999.0]);
        assert!(service.analyze_now().and_then(|o| o.fired()).is_some());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_stats_track_session() {
        let (service, clock) = manual_service(2);
        clock.set_time(5 * MS);
        service.start().unwrap();
        service.ingest(SensorChannel::Af7, &[350.0]);
        service.ingest(SensorChannel::Aux, &[1.0]);
        service.ingest(SensorChannel::Tp9, &[]);
        service.analyze_now();

        let stats = service.stats();
        assert!(stats.running);
        assert_eq!(stats.started_at_nanos, Some(5 * MS));
        assert_eq!(
            stats.ingest,
            IngestMetrics { batches_appended: 1, batches_empty: 1, batches_ignored: 1 }
        );
        assert_eq!(stats.classifier.blinks, 1);
        assert_eq!(stats.dispatch.events_dispatched, 1);

        service.stop();
        let stats = service.stats();
        assert!(!stats.running);
        assert_eq!(stats.ingest, IngestMetrics::default());
        assert_eq!(stats.dispatch.events_dispatched, 1);
    }

    #[test]
    fn test_scheduler_drives_detection() {
        let mut config = GestureConfig::default();
        config.timing.analysis_interval_ms = 5;
        let service = GestureService::new(config).unwrap();
        let (_, rx) = service.subscribe_channel(GestureKind::Blink);

        service.start().unwrap();
        service.ingest_labeled("EEG_AF7", &[15.0, -510.0, 30.0]);
        let event = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(event.kind, GestureKind::Blink);
        service.stop();
    }

    #[test]
    fn test_stop_from_handler() {
        let mut config = GestureConfig::default();
        config.timing.analysis_interval_ms = 5;
        let service = Arc::new(GestureService::new(config).unwrap());
        let fired = Arc::new(AtomicUsize::new(0));

        let weak = Arc::downgrade(&service);
        let f = fired.clone();
        service.on_blink(move |_| {
            f.fetch_add(1, Ordering::SeqCst);
            if let Some(service) = weak.upgrade() {
                service.stop();
            }
        });

        service.start().unwrap();
        service.ingest(SensorChannel::Af7, &[600.0]);

        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while service.is_running() && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(!service.is_running());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
