// src/scope/protocol.rs
//! Newline-delimited text protocol spoken by the ESP32 firmware.
//!
//! Host to device: `FREQ:<hz>`, `AMP:<0-255>`, `WAVE:<name>`, `GEN:ON`,
//! `GEN:OFF` and the capture trigger `SCOPE`.
//!
//! Device to host, in answer to `SCOPE`:
//! ```text
//! SCOPE_START
//! <time_ms>,<voltage>
//! ...
//! SCOPE_END
//! ```
use std::fmt;
use crate::scope::{SampleBuffer, ScopeError, WaveKind};
pub const BAUD_RATE: u32 = 115_200;
pub const SCOPE_START: &str = "SCOPE_START";
pub const SCOPE_END: &str = "SCOPE_END";
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceCommand {
    Frequency(u32),
    Amplitude(u8),
    Wave(WaveKind),
    Output(bool),
    Trigger,
}
impl DeviceCommand {
    pub fn to_wire(&self) -> Vec<u8> {
        format!("{self}\n").into_bytes()
    }
}
impl fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceCommand::Frequency(hz) => write!(f, "FREQ:{hz}"),
            DeviceCommand::Amplitude(amp) => write!(f, "AMP:{amp}"),
            DeviceCommand::Wave(kind) => write!(f, "WAVE:{}", kind.wire_name()),
            DeviceCommand::Output(true) => f.write_str("GEN:ON"),
            DeviceCommand::Output(false) => f.write_str("GEN:OFF"),
            DeviceCommand::Trigger => f.write_str("SCOPE"),
        }
    }
}
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScopeLine {
    Start,
    End,
    Sample { time_ms: f64, voltage: f64 },
    /// Has a comma but does not hold exactly two numbers.
    Malformed,
    Other,
}
impl ScopeLine {
    pub fn classify(line: &str) -> Self {
        let line = line.trim();
        if line == SCOPE_START {
            return ScopeLine::Start;
        }
        if line == SCOPE_END {
            return ScopeLine::End;
        }
        if !line.contains(',') {
            return ScopeLine::Other;
        }
        let mut fields = line.split(',');
        let (Some(t), Some(v), None) = (fields.next(), fields.next(), fields.next()) else {
            return ScopeLine::Malformed;
        };
        match (t.trim().parse::<f64>(), v.trim().parse::<f64>()) {
            (Ok(time_ms), Ok(voltage)) => ScopeLine::Sample { time_ms, voltage },
            _ => ScopeLine::Malformed,
        }
    }
}
/// Collects one capture frame out of a stream of lines.
#[derive(Debug, Default)]
pub struct FrameAssembler {
    capturing: bool,
    finished: bool,
    skipped: usize,
    time: Vec<f64>,
    voltage: Vec<f64>,
}
impl FrameAssembler {
    pub fn new() -> Self {
        Self::default()
    }
    /// Feeds one line; returns `true` once the end sentinel was seen.
    pub fn feed(&mut self, line: &str) -> bool {
        if self.finished {
            return true;
        }
        match ScopeLine::classify(line) {
            ScopeLine::Start => {
                self.capturing = true;
                self.time.clear();
                self.voltage.clear();
            }
            ScopeLine::End => self.finished = true,
            ScopeLine::Sample { time_ms, voltage } if self.capturing => {
                self.time.push(time_ms / 1000.0);
                self.voltage.push(voltage);
            }
            ScopeLine::Malformed if self.capturing => self.skipped += 1,
            _ => {}
        }
        self.finished
    }
    pub fn is_finished(&self) -> bool {
        self.finished
    }
    pub fn skipped(&self) -> usize {
        self.skipped
    }
    pub fn into_buffer(self) -> Result<SampleBuffer, ScopeError> {
        SampleBuffer::from_columns(self.time, self.voltage)
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn commands_render_wire_text() {
        assert_eq!(DeviceCommand::Frequency(1000).to_string(), "FREQ:1000");
        assert_eq!(DeviceCommand::Amplitude(200).to_string(), "AMP:200");
        assert_eq!(
            DeviceCommand::Wave(WaveKind::Triangle).to_string(),
            "WAVE:TRIANGLE"
        );
        assert_eq!(DeviceCommand::Output(true).to_string(), "GEN:ON");
        assert_eq!(DeviceCommand::Output(false).to_string(), "GEN:OFF");
        assert_eq!(DeviceCommand::Trigger.to_wire(), b"SCOPE\n".to_vec());
    }
    #[test]
    fn classifies_lines() {
        assert_eq!(ScopeLine::classify("SCOPE_START\r"), ScopeLine::Start);
        assert_eq!(ScopeLine::classify("  SCOPE_END"), ScopeLine::End);
        assert_eq!(
            ScopeLine::classify("12.5,1.65"),
            ScopeLine::Sample {
                time_ms: 12.5,
                voltage: 1.65
            }
        );
        assert_eq!(ScopeLine::classify("1,2,3"), ScopeLine::Malformed);
        assert_eq!(ScopeLine::classify("abc,1.0"), ScopeLine::Malformed);
        assert_eq!(ScopeLine::classify("garbage"), ScopeLine::Other);
    }
    #[test]
    fn assembler_keeps_only_framed_samples() {
        let mut asm = FrameAssembler::new();
        assert!(!asm.feed("0,9.9"));
        asm.feed(SCOPE_START);
        asm.feed("0,1.0");
        asm.feed("no comma here");
        asm.feed("oops,");
        asm.feed("500,2.0");
        assert!(asm.feed(SCOPE_END));
        assert!(asm.feed("1000,3.0"));
        assert_eq!(asm.skipped(), 1);
        let buf = asm.into_buffer().unwrap();
        assert_eq!(buf.time(), &[0.0, 0.5]);
        assert_eq!(buf.voltage(), &[1.0, 2.0]);
    }
    #[test]
    fn repeated_start_restarts_the_frame() {
        let mut asm = FrameAssembler::new();
        asm.feed(SCOPE_START);
        asm.feed("0,1.0");
        asm.feed(SCOPE_START);
        asm.feed("1,2.0");
        let buf = asm.into_buffer().unwrap();
        assert_eq!(buf.len(), 1);
        assert_eq!(buf.voltage(), &[2.0]);
    }
    #[test]
    fn end_without_start_finishes_empty() {
        let mut asm = FrameAssembler::new();
        asm.feed("0,1.0");
        assert!(asm.feed(SCOPE_END));
        assert!(asm.is_finished());
        assert!(asm.feed(SCOPE_START));
        assert!(asm.into_buffer().unwrap().is_empty());
    }
}
