// src/generator.rs
use std::num::IntErrorKind;
use crate::scope::{DeviceCommand, ScopeError, WaveKind};
pub const FREQ_MIN: u32 = 1;
pub const FREQ_MAX: u32 = 50_000;
pub const FREQ_DEFAULT: u32 = 1000;
pub const AMP_MIN: u8 = 0;
pub const AMP_MAX: u8 = 255;
pub const AMP_DEFAULT: u8 = 200;
pub const QUICK_FREQUENCIES: [u32; 4] = [100, 500, 1000, 5000];
/// Function generator settings mirrored to the device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GeneratorState {
    pub wave: WaveKind,
    pub frequency_hz: u32,
    pub amplitude: u8,
    pub output_enabled: bool,
}
impl Default for GeneratorState {
    fn default() -> Self {
        Self {
            wave: WaveKind::Sine,
            frequency_hz: FREQ_DEFAULT,
            amplitude: AMP_DEFAULT,
            output_enabled: false,
        }
    }
}
impl GeneratorState {
    pub fn amplitude_fraction(&self) -> f64 {
        self.amplitude as f64 / AMP_MAX as f64
    }
    pub fn set_wave(&mut self, wave: WaveKind) -> DeviceCommand {
        self.wave = wave;
        DeviceCommand::Wave(wave)
    }
    pub fn set_frequency(&mut self, hz: u32) -> DeviceCommand {
        self.frequency_hz = hz.clamp(FREQ_MIN, FREQ_MAX);
        DeviceCommand::Frequency(self.frequency_hz)
    }
    pub fn set_amplitude(&mut self, amplitude: u8) -> DeviceCommand {
        self.amplitude = amplitude;
        DeviceCommand::Amplitude(amplitude)
    }
    pub fn toggle_output(&mut self) -> DeviceCommand {
        self.output_enabled = !self.output_enabled;
        DeviceCommand::Output(self.output_enabled)
    }
    /// Applies typed frequency text. Bad input resets to the default and
    /// returns the error for the caller to show.
    pub fn apply_frequency_entry(&mut self, input: &str) -> Result<DeviceCommand, ScopeError> {
        match parse_frequency(input) {
            Ok(hz) => Ok(self.set_frequency(hz)),
            Err(e) => {
                self.frequency_hz = FREQ_DEFAULT;
                Err(e)
            }
        }
    }
    pub fn apply_amplitude_entry(&mut self, input: &str) -> Result<DeviceCommand, ScopeError> {
        match parse_amplitude(input) {
            Ok(amp) => Ok(self.set_amplitude(amp)),
            Err(e) => {
                self.amplitude = AMP_DEFAULT;
                Err(e)
            }
        }
    }
}
pub fn parse_frequency(input: &str) -> Result<u32, ScopeError> {
    let hz = parse_clamped(input, FREQ_MIN as i64, FREQ_MAX as i64).ok_or(
        ScopeError::InvalidEntry {
            field: "Frequency",
            min: FREQ_MIN as i64,
            max: FREQ_MAX as i64,
        },
    )?;
    Ok(hz as u32)
}
pub fn parse_amplitude(input: &str) -> Result<u8, ScopeError> {
    let amp = parse_clamped(input, AMP_MIN as i64, AMP_MAX as i64).ok_or(
        ScopeError::InvalidEntry {
            field: "Amplitude",
            min: AMP_MIN as i64,
            max: AMP_MAX as i64,
        },
    )?;
    Ok(amp as u8)
}
// Integers outside i64 still clamp by sign; anything else is not a number.
fn parse_clamped(input: &str, min: i64, max: i64) -> Option<i64> {
    match input.trim().parse::<i64>() {
        Ok(v) => Some(v.clamp(min, max)),
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => Some(max),
            IntErrorKind::NegOverflow => Some(min),
            _ => None,
        },
    }
}
