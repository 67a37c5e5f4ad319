// src/scope/error.rs
use std::string::FromUtf8Error;
use thiserror::Error;
#[derive(Debug, Error)]
pub enum ScopeError {
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("device sent a line that is not valid UTF-8")]
    Decode(#[from] FromUtf8Error),
    #[error("time and voltage columns differ in length: {time} vs {voltage}")]
    LengthMismatch { time: usize, voltage: usize },
    #[error("noise sigma must be finite and non-negative, got {0}")]
    InvalidNoise(f64),
    #[error("{field} must be a number between {min} and {max}")]
    InvalidEntry {
        field: &'static str,
        min: i64,
        max: i64,
    },
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },
    #[error("no serial port selected")]
    NoPortSelected,
    #[error("not connected to a device")]
    NotConnected,
    #[error("nothing captured yet")]
    EmptyCapture,
}
