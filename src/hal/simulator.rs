// src/hal/simulator.rs
//! Simulated four-electrode headset
//!
//! Produces one batch per channel per round: uniform baseline noise on every
//! channel, plus a single full-amplitude spike while a blink (AF7/AF8) or
//! clench (TP9/TP10) burst is active. Seeded, so runs are reproducible.

use crate::acquisition::{IngestOutcome, SensorChannel};
use crate::config::constants::simulation;
use crate::config::ValidationError;
use crate::detection::Scheduler;
use crate::error::{GestureError, GestureResult};
use crate::events::GestureKind;
use crate::hal::SampleSink;
use crossbeam::channel::{self, Sender};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// Simulator configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SimulatorConfig {
    /// Samples per channel per round
    pub batch_size: usize,
    /// Baseline noise is uniform in `[-baseline_amplitude, baseline_amplitude]`
    pub baseline_amplitude: f32,
    /// Frontal spike height during a blink burst
    pub blink_amplitude: f32,
    /// Temporal spike height during a clench burst
    pub clench_amplitude: f32,
    /// Rounds an injected gesture stays visible
    pub burst_rounds: usize,
    /// RNG seed
    pub seed: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            batch_size: simulation::DEFAULT_BATCH_SIZE,
            baseline_amplitude: simulation::DEFAULT_BASELINE_AMPLITUDE,
            blink_amplitude: simulation::DEFAULT_BLINK_AMPLITUDE,
            clench_amplitude: simulation::DEFAULT_CLENCH_AMPLITUDE,
            burst_rounds: 1,
            seed: simulation::DEFAULT_SEED,
        }
    }
}

impl SimulatorConfig {
    /// Check every field; all problems are reported at once
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.batch_size == 0 {
            errors.push(ValidationError::new("batch_size", "must be at least 1"));
        }
        for (field, value) in [
            ("baseline_amplitude", self.baseline_amplitude),
            ("blink_amplitude", self.blink_amplitude),
            ("clench_amplitude", self.clench_amplitude),
        ] {
            if !value.is_finite() || value < 0.0 {
                errors.push(ValidationError::new(
                    field,
                    format!("{} must be a finite, non-negative amplitude", value),
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Deterministic stand-in for a headset transport
#[derive(Debug)]
pub struct SimulatedHeadset {
    config: SimulatorConfig,
    rng: StdRng,
    blink_rounds_left: usize,
    clench_rounds_left: usize,
    rounds: u64,
}

impl SimulatedHeadset {
    /// Validate `config` and seed the generator
    pub fn new(config: SimulatorConfig) -> GestureResult<Self> {
        config.validate().map_err(GestureError::InvalidConfiguration)?;
        let rng = StdRng::seed_from_u64(config.seed);
        Ok(Self {
            config,
            rng,
            blink_rounds_left: 0,
            clench_rounds_left: 0,
            rounds: 0,
        })
    }

    /// Make `kind` visible for the next `burst_rounds` rounds
    pub fn inject(&mut self, kind: GestureKind) {
        debug!(%kind, rounds = self.config.burst_rounds, "injecting simulated gesture");
        match kind {
            GestureKind::Blink => self.blink_rounds_left = self.config.burst_rounds,
            GestureKind::JawClench => self.clench_rounds_left = self.config.burst_rounds,
        }
    }

    /// Shorthand for `inject(GestureKind::Blink)`
    pub fn queue_blink(&mut self) {
        self.inject(GestureKind::Blink);
    }

    /// Shorthand for `inject(GestureKind::JawClench)`
    pub fn queue_clench(&mut self) {
        self.inject(GestureKind::JawClench);
    }

    /// Generate one round: a batch for every channel, in [`SensorChannel::ALL`] order
    pub fn next_round(&mut self) -> Vec<(SensorChannel, Vec<f32>)> {
        let blink = self.blink_rounds_left > 0;
        let clench = self.clench_rounds_left > 0;
        self.blink_rounds_left = self.blink_rounds_left.saturating_sub(1);
        self.clench_rounds_left = self.clench_rounds_left.saturating_sub(1);
        self.rounds += 1;

        SensorChannel::ALL
            .iter()
            .map(|&channel| {
                let spike = match channel {
                    SensorChannel::Af7 | SensorChannel::Af8 if blink => Some(self.config.blink_amplitude),
                    SensorChannel::Tp9 | SensorChannel::Tp10 if clench => Some(self.config.clench_amplitude),
                    _ => None,
                };
                (channel, self.batch(spike))
            })
            .collect()
    }

    /// Deliver `rounds` rounds into `sink`; returns how many batches were appended
    pub fn pump<S: SampleSink + ?Sized>(&mut self, sink: &S, rounds: usize) -> usize {
        let mut appended = 0;
        for _ in 0..rounds {
            for (channel, samples) in self.next_round() {
                if let IngestOutcome::Appended { .. } = sink.deliver(channel, &samples) {
                    appended += 1;
                }
            }
        }
        trace!(rounds, appended, "simulator pumped");
        appended
    }

    /// Move the headset onto a background thread delivering one round every `interval`
    pub fn spawn(mut self, sink: Arc<dyn SampleSink>, interval: Duration) -> GestureResult<SimulatorHandle> {
        let (commands, command_rx) = channel::unbounded::<GestureKind>();

        let scheduler = Scheduler::start("simulated-headset", interval, move || {
            for kind in command_rx.try_iter() {
                self.inject(kind);
            }
            self.pump(sink.as_ref(), 1);
        })
        .map_err(GestureError::SchedulerSpawn)?;

        debug!(?interval, "simulated headset streaming");
        Ok(SimulatorHandle { scheduler, commands })
    }

    /// Rounds generated so far
    pub fn rounds(&self) -> u64 {
        self.rounds
    }

    /// Active configuration
    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    fn batch(&mut self, spike: Option<f32>) -> Vec<f32> {
        let baseline = self.config.baseline_amplitude;
        let mut samples: Vec<f32> = (0..self.config.batch_size)
            .map(|_| self.rng.gen_range(-baseline..=baseline))
            .collect();

        if let Some(amplitude) = spike {
            let at = self.rng.gen_range(0..samples.len());
            samples[at] = if self.rng.gen::<bool>() { amplitude } else { -amplitude };
        }
        samples
    }
}

/// Control handle for a streaming [`SimulatedHeadset`]
#[derive(Debug)]
pub struct SimulatorHandle {
    scheduler: Scheduler,
    commands: Sender<GestureKind>,
}

impl SimulatorHandle {
    /// Queue a gesture for the next round
    pub fn inject(&self, kind: GestureKind) {
        // The receiver lives as long as the scheduler task; a send after stop is dropped.
        let _ = self.commands.send(kind);
    }

    /// Stop streaming and wait for the thread to exit
    pub fn stop(&mut self) {
        self.scheduler.stop();
    }

    /// False once stopped
    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Rounds delivered so far
    pub fn rounds(&self) -> u64 {
        self.scheduler.ticks()
    }
}
