// src/detection/classifier.rs
//! Threshold classifier with winner-take-all resolution

use crate::acquisition::SharedSampleBuffer;
use crate::config::ThresholdConfig;
use crate::detection::cooldown::CooldownGate;
use crate::events::{EventDispatcher, GestureEvent, GestureKind};
use crate::utils::time::TimeProvider;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Decide which gesture, if any, the current peaks represent.
///
/// A peak must strictly exceed its threshold. When both do, the larger raw
/// peak wins and equal peaks resolve to [`GestureKind::JawClench`].
pub fn decide(eye_peak: f32, jaw_peak: f32, thresholds: &ThresholdConfig) -> Option<GestureKind> {
    let eye_active = eye_peak > thresholds.eye;
    let jaw_active = jaw_peak > thresholds.jaw;

    match (eye_active, jaw_active) {
        (false, false) => None,
        (true, false) => Some(GestureKind::Blink),
        (false, true) => Some(GestureKind::JawClench),
        (true, true) if eye_peak > jaw_peak => Some(GestureKind::Blink),
        (true, true) => Some(GestureKind::JawClench),
    }
}

/// Result of one classifier tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Cooldown active; no decision computed
    Suppressed,
    /// Nothing exceeded its threshold
    Quiet {
        /// Eye window peak read this tick
        eye_peak: f32,
        /// Jaw window peak read this tick
        jaw_peak: f32,
    },
    /// A gesture fired and was dispatched
    Fired(GestureEvent),
}

impl TickOutcome {
    /// The fired event, if any
    pub fn fired(&self) -> Option<GestureEvent> {
        match self {
            TickOutcome::Fired(event) => Some(*event),
            _ => None,
        }
    }
}

/// Classifier counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifierMetrics {
    /// Analysis passes run
    pub ticks: u64,
    /// Passes skipped by the cooldown
    pub ticks_suppressed: u64,
    /// Blinks fired
    pub blinks: u64,
    /// Jaw clenches fired
    pub jaw_clenches: u64,
}

/// Reads both buffers once per tick and fires at most one gesture
pub struct Classifier {
    eye: Arc<SharedSampleBuffer>,
    jaw: Arc<SharedSampleBuffer>,
    thresholds: ThresholdConfig,
    gate: Mutex<CooldownGate>,
    dispatcher: Arc<EventDispatcher>,
    clock: Arc<dyn TimeProvider>,

    ticks: AtomicU64,
    ticks_suppressed: AtomicU64,
    blinks: AtomicU64,
    jaw_clenches: AtomicU64,
}

impl Classifier {
    /// Classify `eye` and `jaw`, dispatching through `dispatcher`
    pub fn new(
        eye: Arc<SharedSampleBuffer>,
        jaw: Arc<SharedSampleBuffer>,
        thresholds: ThresholdConfig,
        cooldown: Duration,
        dispatcher: Arc<EventDispatcher>,
        clock: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            eye,
            jaw,
            thresholds,
            gate: Mutex::new(CooldownGate::new(cooldown)),
            dispatcher,
            clock,
            ticks: AtomicU64::new(0),
            ticks_suppressed: AtomicU64::new(0),
            blinks: AtomicU64::new(0),
            jaw_clenches: AtomicU64::new(0),
        }
    }

    /// Run one analysis pass
    pub fn tick(&self) -> TickOutcome {
        self.ticks.fetch_add(1, Ordering::Relaxed);

        // The gate stays locked until it is armed so concurrent ticks cannot both fire.
        let event = {
            let mut gate = self.gate.lock();
            let now = self.clock.now_nanos();
            if gate.is_suppressed(now) {
                self.ticks_suppressed.fetch_add(1, Ordering::Relaxed);
                return TickOutcome::Suppressed;
            }

            let eye_peak = self.eye.peak();
            let jaw_peak = self.jaw.peak();
            let Some(kind) = decide(eye_peak, jaw_peak, &self.thresholds) else {
                return TickOutcome::Quiet { eye_peak, jaw_peak };
            };

            gate.try_arm(now);
            debug!(%kind, eye_peak, jaw_peak, "threshold crossed");
            GestureEvent { kind, fired_at_nanos: now }
        };

        match event.kind {
            GestureKind::Blink => self.blinks.fetch_add(1, Ordering::Relaxed),
            GestureKind::JawClench => self.jaw_clenches.fetch_add(1, Ordering::Relaxed),
        };
        info!(kind = %event.kind, "gesture fired");
        self.dispatcher.dispatch(&event);
        TickOutcome::Fired(event)
    }

    /// Whether a tick at the current clock reading would be skipped
    pub fn in_cooldown(&self) -> bool {
        let now = self.clock.now_nanos();
        self.gate.lock().is_suppressed(now)
    }

    /// Counters since creation
    pub fn metrics(&self) -> ClassifierMetrics {
        ClassifierMetrics {
            ticks: self.ticks.load(Ordering::Relaxed),
            ticks_suppressed: self.ticks_suppressed.load(Ordering::Relaxed),
            blinks: self.blinks.load(Ordering::Relaxed),
            jaw_clenches: self.jaw_clenches.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for Classifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Classifier")
            .field("thresholds", &self.thresholds)
            .field("metrics", &self.metrics())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::time::MockTimeProvider;

    const MS: u64 = 1_000_000;

    struct Fixture {
        eye: Arc<SharedSampleBuffer>,
        jaw: Arc<SharedSampleBuffer>,
        clock: Arc<MockTimeProvider>,
        dispatcher: Arc<EventDispatcher>,
        classifier: Classifier,
    }

    fn fixture(capacity: usize) -> Fixture {
        let eye = Arc::new(SharedSampleBuffer::new(capacity));
        let jaw = Arc::new(SharedSampleBuffer::new(capacity));
        let clock = Arc::new(MockTimeProvider::new(0));
        let dispatcher = Arc::new(EventDispatcher::new());
        let classifier = Classifier::new(
            eye.clone(),
            jaw.clone(),
            ThresholdConfig::default(),
            Duration::from_secs(1),
            dispatcher.clone(),
            clock.clone(),
        );
        Fixture { eye, jaw, clock, dispatcher, classifier }
    }

    #[test]
    fn test_decision_table() {
        let t = ThresholdConfig::default();
        assert_eq!(decide(0.0, 0.0, &t), None);
        assert_eq!(decide(350.0, 100.0, &t), Some(GestureKind::Blink));
        assert_eq!(decide(100.0, 550.0, &t), Some(GestureKind::JawClench));
        assert_eq!(decide(700.0, 600.0, &t), Some(GestureKind::Blink));
    }

    #[test]
    fn test_threshold_is_strict() {
        let t = ThresholdConfig::default();
        assert_eq!(decide(300.0, 500.0, &t), None);
        assert_eq!(decide(300.0 + 0.01, 0.0, &t), Some(GestureKind::Blink));
        assert_eq!(decide(0.0, 500.0 + 0.01, &t), Some(GestureKind::JawClench));
    }

    #[test]
    fn test_winner_take_all_prefers_larger_peak() {
        let t = ThresholdConfig::default();
        assert_eq!(decide(400.0, 600.0, &t), Some(GestureKind::JawClench));
    }

    #[test]
    fn test_equal_peaks_resolve_to_jaw_clench() {
        let t = ThresholdConfig::default();
        assert_eq!(decide(650.0, 650.0, &t), Some(GestureKind::JawClench));
    }

    #[test]
    fn test_tick_fires_and_dispatches() {
        let f = fixture(4);
        let (_, rx) = f.dispatcher.subscribe_channel(GestureKind::Blink);

        f.clock.set_time(7 * MS);
        f.eye.append(350.0);
        let outcome = f.classifier.tick();

        let expected = GestureEvent { kind: GestureKind::Blink, fired_at_nanos: 7 * MS };
        assert_eq!(outcome, TickOutcome::Fired(expected));
        assert_eq!(rx.try_recv().unwrap(), expected);
        assert!(f.classifier.in_cooldown());
    }

    #[test]
    fn test_quiet_tick_reports_peaks() {
        let f = fixture(4);
        f.eye.append(120.0);
        f.jaw.append(480.0);
        assert_eq!(
            f.classifier.tick(),
            TickOutcome::Quiet { eye_peak: 120.0, jaw_peak: 480.0 }
        );
        assert!(!f.classifier.in_cooldown());
    }

    #[test]
    fn test_cooldown_suppresses_then_releases() {
        let f = fixture(4);
        f.jaw.append(600.0);

        assert!(f.classifier.tick().fired().is_some());

        f.clock.set_time(500 * MS);
        assert_eq!(f.classifier.tick(), TickOutcome::Suppressed);

        f.clock.set_time(1_100 * MS);
        let event = f.classifier.tick().fired().unwrap();
        assert_eq!(event.kind, GestureKind::JawClench);
        assert_eq!(event.fired_at_nanos, 1_100 * MS);

        assert_eq!(
            f.classifier.metrics(),
            ClassifierMetrics { ticks: 3, ticks_suppressed: 1, blinks: 0, jaw_clenches: 2 }
        );
    }

    #[test]
    fn test_gesture_during_cooldown_is_lost() {
        let f = fixture(2);
        f.eye.append(400.0);
        f.classifier.tick();

        f.clock.set_time(300 * MS);
        f.jaw.append(900.0);
        assert_eq!(f.classifier.tick(), TickOutcome::Suppressed);

        // Both spikes age out of the window before cooldown ends.
        f.eye.append(0.0);
        f.eye.append(0.0);
        f.jaw.append(0.0);
        f.jaw.append(0.0);
        f.clock.set_time(1_200 * MS);
        assert!(matches!(f.classifier.tick(), TickOutcome::Quiet { .. }));
    }
}
