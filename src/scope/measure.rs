// src/scope/measure.rs
use crate::scope::SampleBuffer;
/// Factor applied to crossings-per-time-unit to report Hz.
///
/// Demo captures carry milliseconds, so this yields Hz for them. Serial
/// captures are stored in seconds and read 1000x high with the same factor.
pub const FREQUENCY_SCALE: f64 = 1000.0;
pub const PLACEHOLDER: &str = "----";
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Measurements {
    pub v_max: f64,
    pub v_min: f64,
    pub v_pp: f64,
    pub v_avg: f64,
    pub freq_hz: f64,
}
impl Measurements {
    /// `None` for an empty buffer; there is nothing to measure.
    pub fn compute(buffer: &SampleBuffer) -> Option<Self> {
        let voltage = buffer.voltage();
        let time = buffer.time();
        if voltage.is_empty() {
            return None;
        }
        let v_max = voltage.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let v_min = voltage.iter().copied().fold(f64::INFINITY, f64::min);
        let v_avg = voltage.iter().sum::<f64>() / voltage.len() as f64;
        let crossings = rising_mean_crossings(voltage, v_avg);
        let duration = time[time.len() - 1] - time[0];
        let freq_hz = if duration > 0.0 {
            crossings as f64 / duration * FREQUENCY_SCALE
        } else {
            0.0
        };
        Some(Self {
            v_max,
            v_min,
            v_pp: v_max - v_min,
            v_avg,
            freq_hz,
        })
    }
}
/// Counts transitions from strictly below `mean` to at-or-above it.
pub fn rising_mean_crossings(voltage: &[f64], mean: f64) -> usize {
    voltage
        .windows(2)
        .filter(|w| w[0] < mean && mean <= w[1])
        .count()
}
/// Front-panel text for each measurement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Readout {
    pub vmax: String,
    pub vmin: String,
    pub vpp: String,
    pub vavg: String,
    pub freq: String,
}
impl Readout {
    pub fn placeholder() -> Self {
        Self {
            vmax: PLACEHOLDER.to_owned(),
            vmin: PLACEHOLDER.to_owned(),
            vpp: PLACEHOLDER.to_owned(),
            vavg: PLACEHOLDER.to_owned(),
            freq: PLACEHOLDER.to_owned(),
        }
    }
    /// Label, value and unit, in display order.
    pub fn rows(&self) -> [(&'static str, &str, &'static str); 5] {
        [
            ("Vmax", &self.vmax, "V"),
            ("Vmin", &self.vmin, "V"),
            ("Vpp", &self.vpp, "V"),
            ("Vavg", &self.vavg, "V"),
            ("Freq", &self.freq, "Hz"),
        ]
    }
}
impl From<Option<&Measurements>> for Readout {
    fn from(m: Option<&Measurements>) -> Self {
        match m {
            Some(m) => Self {
                vmax: format!("{:.3}", m.v_max),
                vmin: format!("{:.3}", m.v_min),
                vpp: format!("{:.3}", m.v_pp),
                vavg: format!("{:.3}", m.v_avg),
                freq: format!("{:.1}", m.freq_hz),
            },
            None => Self::placeholder(),
        }
    }
}
