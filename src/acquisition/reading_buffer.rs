// src/acquisition/reading_buffer.rs
//! Bounded history of recent readings

use crate::hal::BiometricReading;
use std::collections::VecDeque;

/// Fixed-capacity FIFO; the oldest reading is evicted first
#[derive(Debug, Clone)]
pub struct ReadingBuffer {
    readings: VecDeque<BiometricReading>,
    capacity: usize,
}

impl ReadingBuffer {
    /// Create a buffer holding at most `capacity` readings (minimum one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            readings: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a reading, evicting the oldest when full
    pub fn push(&mut self, reading: BiometricReading) {
        if self.readings.len() == self.capacity {
            self.readings.pop_front();
        }
        self.readings.push_back(reading);
    }

    /// Up to `count` most recent readings, oldest first
    pub fn latest(&self, count: usize) -> Vec<BiometricReading> {
        let skip = self.readings.len().saturating_sub(count);
        self.readings.iter().skip(skip).cloned().collect()
    }

    pub fn last(&self) -> Option<&BiometricReading> {
        self.readings.back()
    }

    pub fn clear(&mut self) {
        self.readings.clear();
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Fill ratio, 0.0 to 1.0
    pub fn utilization(&self) -> f32 {
        self.readings.len() as f32 / self.capacity as f32
    }
}
