// src/acquisition/sample_buffer.rs
//! Fixed-capacity amplitude history, one per channel group

use parking_lot::Mutex;
use std::collections::VecDeque;

/// Sliding window of the most recent batch peaks
///
/// The buffer is zero-filled on creation and always holds exactly `capacity`
/// values; each append evicts the oldest one.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    values: VecDeque<f32>,
    capacity: usize,
}

impl SampleBuffer {
    /// Create a zero-filled buffer. A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            values: std::iter::repeat(0.0).take(capacity).collect(),
            capacity,
        }
    }

    /// Evict the oldest value and store `value` as the newest.
    ///
    /// Negative and NaN input is stored as 0 so every entry stays a magnitude.
    pub fn append(&mut self, value: f32) {
        let magnitude = value.max(0.0);
        self.values.pop_front();
        self.values.push_back(magnitude);
    }

    /// Largest stored value, floored at 0
    pub fn peak(&self) -> f32 {
        self.values.iter().copied().fold(0.0, f32::max)
    }

    /// Always equal to the capacity
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Never true; a buffer holds at least one slot
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Window length
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Copy of the contents, oldest first
    pub fn snapshot(&self) -> Vec<f32> {
        self.values.iter().copied().collect()
    }
}

/// A [`SampleBuffer`] behind its own lock
///
/// The transport thread appends while the scheduler thread reads peaks; the
/// lock makes the evict-and-append step atomic with respect to `peak()`.
#[derive(Debug)]
pub struct SharedSampleBuffer {
    inner: Mutex<SampleBuffer>,
}

impl SharedSampleBuffer {
    /// See [`SampleBuffer::new`]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(SampleBuffer::new(capacity)),
        }
    }

    /// See [`SampleBuffer::append`]
    pub fn append(&self, value: f32) {
        self.inner.lock().append(value);
    }

    /// See [`SampleBuffer::peak`]
    pub fn peak(&self) -> f32 {
        self.inner.lock().peak()
    }

    /// Always equal to the capacity
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Never true; a buffer holds at least one slot
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Window length
    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity()
    }

    /// See [`SampleBuffer::snapshot`]
    pub fn snapshot(&self) -> Vec<f32> {
        self.inner.lock().snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_buffer_is_zero_filled() {
        let buffer = SampleBuffer::new(8);
        assert_eq!(buffer.len(), 8);
        assert_eq!(buffer.capacity(), 8);
        assert_eq!(buffer.peak(), 0.0);
        assert!(buffer.snapshot().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_append_evicts_oldest() {
        let mut buffer = SampleBuffer::new(3);
        for value in [1.0, 2.0, 3.0, 4.0] {
            buffer.append(value);
        }
        assert_eq!(buffer.snapshot(), vec![2.0, 3.0, 4.0]);
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn test_peak_forgets_evicted_maximum() {
        let mut buffer = SampleBuffer::new(4);
        buffer.append(900.0);
        assert_eq!(buffer.peak(), 900.0);

        for _ in 0..3 {
            buffer.append(10.0);
        }
        assert_eq!(buffer.peak(), 900.0);

        buffer.append(10.0);
        assert_eq!(buffer.peak(), 10.0);
    }

    #[test]
    fn test_negative_and_nan_are_stored_as_zero() {
        let mut buffer = SampleBuffer::new(2);
        buffer.append(-5.0);
        buffer.append(f32::NAN);
        assert_eq!(buffer.snapshot(), vec![0.0, 0.0]);
        assert_eq!(buffer.peak(), 0.0);
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        let mut buffer = SampleBuffer::new(0);
        assert_eq!(buffer.capacity(), 1);
        buffer.append(7.0);
        assert_eq!(buffer.snapshot(), vec![7.0]);
    }

    #[test]
    fn test_shared_buffer_delegates() {
        let shared = SharedSampleBuffer::new(3);
        shared.append(350.0);
        shared.append(-12.0);
        assert_eq!(shared.snapshot(), vec![0.0, 350.0, 0.0]);
        assert_eq!(shared.peak(), 350.0);
        assert_eq!(shared.len(), shared.capacity());
        assert!(!shared.is_empty());
    }
}
