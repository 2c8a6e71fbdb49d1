// src/acquisition/ingest.rs
//! Demultiplexes channel-tagged batches into the per-group buffers

use crate::acquisition::channels::{ChannelGroup, SensorChannel};
use crate::acquisition::sample_buffer::SharedSampleBuffer;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// What happened to one inbound batch
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IngestOutcome {
    /// The batch peak was appended to `group`'s buffer
    Appended {
        /// Buffer that received the peak
        group: ChannelGroup,
        /// Largest absolute sample in the batch
        peak: f32,
    },
    /// Zero-length batch; nothing to do
    EmptyBatch,
    /// Valid channel without a group (auxiliary input)
    Unmapped(SensorChannel),
    /// The channel label could not be parsed
    Malformed,
    /// No session is running
    Inactive,
}

impl IngestOutcome {
    /// Whether the batch reached a buffer
    pub fn is_appended(&self) -> bool {
        matches!(self, IngestOutcome::Appended { .. })
    }
}

/// Ingest counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestMetrics {
    /// Batches whose peak was appended
    pub batches_appended: u64,
    /// Zero-length batches
    pub batches_empty: u64,
    /// Unmapped or malformed batches
    pub batches_ignored: u64,
}

/// Routes batches from the sensor transport into the eye and jaw buffers
#[derive(Debug)]
pub struct SignalIngest {
    eye: Arc<SharedSampleBuffer>,
    jaw: Arc<SharedSampleBuffer>,

    batches_appended: AtomicU64,
    batches_empty: AtomicU64,
    batches_ignored: AtomicU64,
}

/// Largest absolute value in the batch, or `None` for an empty batch
pub fn batch_peak(samples: &[f32]) -> Option<f32> {
    if samples.is_empty() {
        return None;
    }
    Some(samples.iter().fold(0.0f32, |peak, &s| peak.max(s.abs())))
}

impl SignalIngest {
    /// Route into the given eye and jaw buffers
    pub fn new(eye: Arc<SharedSampleBuffer>, jaw: Arc<SharedSampleBuffer>) -> Self {
        Self {
            eye,
            jaw,
            batches_appended: AtomicU64::new(0),
            batches_empty: AtomicU64::new(0),
            batches_ignored: AtomicU64::new(0),
        }
    }

    /// Buffer that receives `group`'s peaks
    pub fn buffer(&self, group: ChannelGroup) -> &Arc<SharedSampleBuffer> {
        match group {
            ChannelGroup::Eye => &self.eye,
            ChannelGroup::Jaw => &self.jaw,
        }
    }

    /// Reduce `samples` to its peak magnitude and append it to the channel's group buffer
    pub fn ingest(&self, channel: SensorChannel, samples: &[f32]) -> IngestOutcome {
        let Some(group) = channel.group() else {
            self.batches_ignored.fetch_add(1, Ordering::Relaxed);
            debug!(%channel, "ignoring batch from unmapped channel");
            return IngestOutcome::Unmapped(channel);
        };

        let Some(peak) = batch_peak(samples) else {
            self.batches_empty.fetch_add(1, Ordering::Relaxed);
            return IngestOutcome::EmptyBatch;
        };

        self.buffer(group).append(peak);
        self.batches_appended.fetch_add(1, Ordering::Relaxed);
        trace!(%channel, %group, peak, len = samples.len(), "batch ingested");
        IngestOutcome::Appended { group, peak }
    }

    /// Same as [`ingest`](Self::ingest) for a raw transport label such as `"EEG_AF7"`
    pub fn ingest_labeled(&self, label: &str, samples: &[f32]) -> IngestOutcome {
        match label.parse::<SensorChannel>() {
            Ok(channel) => self.ingest(channel, samples),
            Err(err) => {
                self.batches_ignored.fetch_add(1, Ordering::Relaxed);
                debug!(%err, "ignoring batch with malformed channel label");
                IngestOutcome::Malformed
            }
        }
    }

    /// Counters since creation
    pub fn metrics(&self) -> IngestMetrics {
        IngestMetrics {
            batches_appended: self.batches_appended.load(Ordering::Relaxed),
            batches_empty: self.batches_empty.load(Ordering::Relaxed),
            batches_ignored: self.batches_ignored.load(Ordering::Relaxed),
        }
    }
}
