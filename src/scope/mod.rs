// src/scope/mod.rs
pub mod buffer;
pub mod capture;
pub mod demo;
pub mod error;
pub mod measure;
pub mod protocol;
pub use buffer::{SampleBuffer, SharedBuffer};
pub use capture::{capture_frame, CaptureOutcome};
pub use demo::{DemoSettings, DemoSynth, WaveKind};
pub use error::ScopeError;
pub use measure::{Measurements, Readout};
pub use protocol::{DeviceCommand, BAUD_RATE};
