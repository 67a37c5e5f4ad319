// src/scope/buffer.rs
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use parking_lot::Mutex;
use crate::scope::ScopeError;
/// One capture worth of `(time, voltage)` pairs.
///
/// Both columns always have the same length. An empty buffer is the cleared
/// state and must be shown as "no data".
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SampleBuffer {
    time: Vec<f64>,
    voltage: Vec<f64>,
}
impl SampleBuffer {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            time: Vec::with_capacity(capacity),
            voltage: Vec::with_capacity(capacity),
        }
    }
    pub fn from_columns(time: Vec<f64>, voltage: Vec<f64>) -> Result<Self, ScopeError> {
        if time.len() != voltage.len() {
            return Err(ScopeError::LengthMismatch {
                time: time.len(),
                voltage: voltage.len(),
            });
        }
        Ok(Self { time, voltage })
    }
    pub fn push(&mut self, time: f64, voltage: f64) {
        self.time.push(time);
        self.voltage.push(voltage);
    }
    pub fn len(&self) -> usize {
        self.time.len()
    }
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
    pub fn clear(&mut self) {
        self.time.clear();
        self.voltage.clear();
    }
    pub fn time(&self) -> &[f64] {
        &self.time
    }
    pub fn voltage(&self) -> &[f64] {
        &self.voltage
    }
    /// Plot-ready `[time, voltage]` points.
    pub fn points(&self) -> Vec<[f64; 2]> {
        self.time
            .iter()
            .zip(&self.voltage)
            .map(|(&t, &v)| [t, v])
            .collect()
    }
    /// Smallest and largest timestamp, used for the plot's x extent.
    pub fn time_range(&self) -> Option<(f64, f64)> {
        if self.time.is_empty() {
            return None;
        }
        let min = self.time.iter().copied().fold(f64::INFINITY, f64::min);
        let max = self.time.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some((min, max))
    }
}
/// Single in-flight buffer shared between the producer thread and the GUI.
///
/// Every publish overwrites the previous capture; there is no queue.
#[derive(Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<SampleBuffer>>,
    generation: Arc<AtomicU64>,
}
impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn publish(&self, buffer: SampleBuffer) {
        *self.inner.lock() = buffer;
        self.generation.fetch_add(1, Ordering::Release);
    }
    pub fn clear(&self) {
        self.publish(SampleBuffer::new());
    }
    pub fn snapshot(&self) -> SampleBuffer {
        self.inner.lock().clone()
    }
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}
