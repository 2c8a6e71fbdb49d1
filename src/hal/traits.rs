// src/hal/traits.rs
//! Core HAL traits for headset transports

use crate::acquisition::{IngestOutcome, SensorChannel, SignalIngest};
use std::sync::Arc;

/// Receiver of per-channel sample batches
///
/// A transport calls `deliver` from its own thread once per notification.
/// Implementations must not block for longer than a buffer append.
pub trait SampleSink: Send + Sync {
    /// Hand over one batch from `channel`
    fn deliver(&self, channel: SensorChannel, samples: &[f32]) -> IngestOutcome;
}

impl SampleSink for SignalIngest {
    fn deliver(&self, channel: SensorChannel, samples: &[f32]) -> IngestOutcome {
        self.ingest(channel, samples)
    }
}

impl<T: SampleSink + ?Sized> SampleSink for Arc<T> {
    fn deliver(&self, channel: SensorChannel, samples: &[f32]) -> IngestOutcome {
        (**self).deliver(channel, samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::{ChannelGroup, SharedSampleBuffer};

    #[test]
    fn test_ingest_is_a_sink() {
        let eye = Arc::new(SharedSampleBuffer::new(2));
        let jaw = Arc::new(SharedSampleBuffer::new(2));
        let sink: Arc<dyn SampleSink> = Arc::new(SignalIngest::new(eye.clone(), jaw));

        let outcome = sink.deliver(SensorChannel::Af8, &[-40.0, 25.0]);
        assert_eq!(outcome, IngestOutcome::Appended { group: ChannelGroup::Eye, peak: 40.0 });
        assert_eq!(eye.snapshot(), vec![0.0, 40.0]);
    }
}
