// src/recorder.rs
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use log::info;
use crate::scope::{SampleBuffer, ScopeError};
/// Writes captures to CSV files in one directory.
pub struct CaptureRecorder {
    dir: PathBuf,
}
impl CaptureRecorder {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
    pub fn dir(&self) -> &Path {
        &self.dir
    }
    pub fn save(&self, buffer: &SampleBuffer) -> Result<PathBuf, ScopeError> {
        if buffer.is_empty() {
            return Err(ScopeError::EmptyCapture);
        }
        fs::create_dir_all(&self.dir)?;
        // unix seconds keep files sortable; a clock before 1970 just yields 0
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let path = self.dir.join(format!("scope_capture_{stamp}.csv"));
        let mut w = BufWriter::new(File::create(&path)?);
        writeln!(w, "time,voltage")?;
        for (t, v) in buffer.time().iter().zip(buffer.voltage()) {
            writeln!(w, "{t},{v:.4}")?;
        }
        w.flush()?;
        info!("saved {} samples to {}", buffer.len(), path.display());
        Ok(path)
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn writes_header_and_rows() {
        let dir = std::env::temp_dir().join(format!("esp32scope_rec_{}", std::process::id()));
        let recorder = CaptureRecorder::new(&dir);
        let buf = SampleBuffer::from_columns(vec![0.0, 0.5], vec![1.65, 2.0]).unwrap();
        let path = recorder.save(&buf).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "time,voltage\n0,1.6500\n0.5,2.0000\n");
        let _ = fs::remove_dir_all(&dir);
    }
    #[test]
    fn refuses_empty_capture() {
        let recorder = CaptureRecorder::new(std::env::temp_dir());
        assert!(matches!(
            recorder.save(&SampleBuffer::new()),
            Err(ScopeError::EmptyCapture)
        ));
    }
}
