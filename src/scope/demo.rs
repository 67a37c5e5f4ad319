// src/scope/demo.rs
use std::f64::consts::PI;
use std::fmt;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use crate::scope::{SampleBuffer, ScopeError};
/// Mid-rail of the ESP32 ADC (3.3 V / 2).
pub const MIDSCALE_VOLTS: f64 = 1.65;
/// Swing reached at full amplitude (255).
pub const FULL_SWING_VOLTS: f64 = 1.5;
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaveKind {
    #[default]
    Sine,
    Square,
    Triangle,
    Sawtooth,
}
impl WaveKind {
    pub const ALL: [WaveKind; 4] = [
        WaveKind::Sine,
        WaveKind::Square,
        WaveKind::Triangle,
        WaveKind::Sawtooth,
    ];
    /// Name used on the wire and on the front panel.
    pub fn wire_name(self) -> &'static str {
        match self {
            WaveKind::Sine => "SINE",
            WaveKind::Square => "SQUARE",
            WaveKind::Triangle => "TRIANGLE",
            WaveKind::Sawtooth => "SAWTOOTH",
        }
    }
    /// Normalised signal in [-1, 1] at `cycles = f * t`.
    pub fn sample(self, cycles: f64) -> f64 {
        match self {
            WaveKind::Sine => (2.0 * PI * cycles).sin(),
            WaveKind::Square => sign((2.0 * PI * cycles).sin()),
            WaveKind::Triangle => 2.0 * (2.0 * cycles.rem_euclid(1.0) - 1.0).abs() - 1.0,
            WaveKind::Sawtooth => 2.0 * cycles.rem_euclid(1.0) - 1.0,
        }
    }
}
impl fmt::Display for WaveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}
// f64::signum maps 0.0 to 1.0; the square wave needs 0 at the zero crossings.
fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoSettings {
    pub samples: usize,
    pub span_ms: f64,
    pub noise_sigma: f64,
}
impl DemoSettings {
    /// Noise must be a finite, non-negative standard deviation.
    pub fn validate(&self) -> Result<(), ScopeError> {
        let sigma = self.noise_sigma;
        if !sigma.is_finite() || sigma < 0.0 {
            return Err(ScopeError::InvalidNoise(sigma));
        }
        Ok(())
    }
}
impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            samples: 1000,
            span_ms: 100.0,
            noise_sigma: 0.015,
        }
    }
}
/// Produces simulated captures so the app works without hardware.
pub struct DemoSynth {
    settings: DemoSettings,
    rng: StdRng,
}
impl DemoSynth {
    pub fn new(settings: DemoSettings) -> Result<Self, ScopeError> {
        settings.validate()?;
        Ok(Self {
            settings,
            rng: StdRng::from_entropy(),
        })
    }
    pub fn seeded(settings: DemoSettings, seed: u64) -> Result<Self, ScopeError> {
        settings.validate()?;
        Ok(Self {
            settings,
            rng: StdRng::seed_from_u64(seed),
        })
    }
    /// Default settings; cannot fail.
    pub fn with_defaults() -> Self {
        Self {
            settings: DemoSettings::default(),
            rng: StdRng::from_entropy(),
        }
    }
    /// Timestamps are in milliseconds, evenly spaced over `[0, span_ms]`.
    pub fn synthesize(
        &mut self,
        wave: WaveKind,
        frequency_hz: f64,
        amplitude_fraction: f64,
    ) -> SampleBuffer {
        let n = self.settings.samples;
        let mut buffer = SampleBuffer::with_capacity(n);
        let step = if n > 1 {
            self.settings.span_ms / (n - 1) as f64
        } else {
            0.0
        };
        for i in 0..n {
            let t_ms = i as f64 * step;
            let signal = wave.sample(frequency_hz * t_ms / 1000.0);
            let clean = MIDSCALE_VOLTS + amplitude_fraction * FULL_SWING_VOLTS * signal;
            let noise: f64 = self.rng.sample(StandardNormal);
            buffer.push(t_ms, clean + self.settings.noise_sigma * noise);
        }
        buffer
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn shapes_match_reference_points() {
        assert!(WaveKind::Sine.sample(0.25) > 0.999);
        assert_eq!(WaveKind::Square.sample(0.0), 0.0);
        assert_eq!(WaveKind::Square.sample(0.25), 1.0);
        assert_eq!(WaveKind::Square.sample(0.75), -1.0);
        assert_eq!(WaveKind::Triangle.sample(0.0), 1.0);
        assert_eq!(WaveKind::Triangle.sample(0.5), -1.0);
        assert_eq!(WaveKind::Sawtooth.sample(0.0), -1.0);
        assert_eq!(WaveKind::Sawtooth.sample(0.5), 0.0);
    }
    #[test]
    fn fixed_length_over_fixed_span() {
        let mut synth = DemoSynth::seeded(DemoSettings::default(), 7).unwrap();
        let buf = synth.synthesize(WaveKind::Sine, 1000.0, 200.0 / 255.0);
        assert_eq!(buf.len(), 1000);
        assert_eq!(buf.time()[0], 0.0);
        assert!((buf.time()[999] - 100.0).abs() < 1e-9);
    }
    #[test]
    fn every_shape_stays_inside_the_swing() {
        let settings = DemoSettings::default();
        // 8 sigma: practically never exceeded over a few thousand samples.
        let noise_bound = 8.0 * settings.noise_sigma;
        let mut synth = DemoSynth::seeded(settings, 42).unwrap();
        for amp in [0u8, 100, 255] {
            let frac = amp as f64 / 255.0;
            for wave in WaveKind::ALL {
                let buf = synth.synthesize(wave, 1234.0, frac);
                let lo = MIDSCALE_VOLTS - FULL_SWING_VOLTS * frac - noise_bound;
                let hi = MIDSCALE_VOLTS + FULL_SWING_VOLTS * frac + noise_bound;
                for &v in buf.voltage() {
                    assert!(v >= lo && v <= hi, "{wave} amp {amp}: {v} outside [{lo}, {hi}]");
                }
            }
        }
    }
    #[test]
    fn zero_noise_is_exact() {
        let settings = DemoSettings {
            noise_sigma: 0.0,
            ..DemoSettings::default()
        };
        let mut synth = DemoSynth::seeded(settings, 1).unwrap();
        let buf = synth.synthesize(WaveKind::Sawtooth, 100.0, 1.0);
        assert!((buf.voltage()[0] - (MIDSCALE_VOLTS - FULL_SWING_VOLTS)).abs() < 1e-12);
    }
    #[test]
    fn negative_noise_is_rejected() {
        let settings = DemoSettings {
            noise_sigma: -1.0,
            ..DemoSettings::default()
        };
        assert!(matches!(
            DemoSynth::new(settings),
            Err(ScopeError::InvalidNoise(_))
        ));
        let nan = DemoSettings {
            noise_sigma: f64::NAN,
            ..DemoSettings::default()
        };
        assert!(nan.validate().is_err());
        assert!(DemoSettings::default().validate().is_ok());
    }
    #[test]
    fn default_synth_always_produces_a_capture() {
        let mut synth = DemoSynth::with_defaults();
        let buf = synth.synthesize(WaveKind::Square, 500.0, 1.0);
        assert_eq!(buf.len(), DemoSettings::default().samples);
    }
}
