// src/scope/capture.rs
use std::io::{ErrorKind, Read, Write};
use std::time::{Duration, Instant};
use log::{debug, warn};
use serialport::SerialPort;
use crate::scope::protocol::{DeviceCommand, FrameAssembler, SCOPE_END};
use crate::scope::{SampleBuffer, ScopeError};
/// A byte stream whose blocking reads can be bounded.
pub trait CapturePort: Read + Write {
    fn set_read_timeout(&mut self, timeout: Duration) -> Result<(), ScopeError>;
}
impl CapturePort for dyn SerialPort {
    fn set_read_timeout(&mut self, timeout: Duration) -> Result<(), ScopeError> {
        self.set_timeout(timeout)?;
        Ok(())
    }
}
/// Result of one triggered capture.
#[derive(Debug)]
pub struct CaptureOutcome {
    pub buffer: SampleBuffer,
    /// `false` when the deadline or end of stream came before `SCOPE_END`.
    pub complete: bool,
    pub skipped: usize,
}
/// Splits a byte stream into `\n` terminated lines.
#[derive(Default)]
struct LineSplitter {
    pending: Vec<u8>,
}
impl LineSplitter {
    fn extend(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
    }
    fn next_line(&mut self) -> Option<Vec<u8>> {
        let pos = self.pending.iter().position(|&b| b == b'\n')?;
        let mut line: Vec<u8> = self.pending.drain(..=pos).collect();
        line.pop();
        Some(line)
    }
    fn take_rest(&mut self) -> Option<Vec<u8>> {
        if self.pending.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.pending))
        }
    }
}
/// Triggers a capture and reads the framed samples back.
///
/// Each read blocks for at most `read_timeout` and never past the overall
/// `timeout`; the port is left at `read_timeout` afterwards. Partial data is
/// returned as-is when `timeout` elapses. Any read error other than a port
/// timeout, or a line that is not UTF-8, aborts the capture.
pub fn capture_frame<P>(
    port: &mut P,
    read_timeout: Duration,
    timeout: Duration,
) -> Result<CaptureOutcome, ScopeError>
where
    P: CapturePort + ?Sized,
{
    port.write_all(&DeviceCommand::Trigger.to_wire())?;
    port.flush()?;
    let deadline = Instant::now() + timeout;
    let result = read_frame(port, read_timeout, deadline);
    if let Err(e) = port.set_read_timeout(read_timeout) {
        warn!("could not restore read timeout: {e}");
    }
    result
}
fn read_frame<P>(
    port: &mut P,
    read_timeout: Duration,
    deadline: Instant,
) -> Result<CaptureOutcome, ScopeError>
where
    P: CapturePort + ?Sized,
{
    let mut assembler = FrameAssembler::new();
    let mut splitter = LineSplitter::default();
    let mut chunk = [0u8; 512];
    'read: loop {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        port.set_read_timeout(read_timeout.min(deadline - now))?;
        let n = match port.read(&mut chunk) {
            Ok(0) => {
                debug!("serial stream closed mid-capture");
                break;
            }
            Ok(n) => n,
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                ) =>
            {
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        splitter.extend(&chunk[..n]);
        while let Some(raw) = splitter.next_line() {
            let line = String::from_utf8(raw)?;
            if assembler.feed(&line) {
                break 'read;
            }
        }
    }
    if !assembler.is_finished() {
        if let Some(raw) = splitter.take_rest() {
            assembler.feed(&String::from_utf8(raw)?);
        }
    }
    let complete = assembler.is_finished();
    let skipped = assembler.skipped();
    if !complete {
        warn!("capture ended without {SCOPE_END}");
    }
    if skipped > 0 {
        debug!("skipped {skipped} malformed capture lines");
    }
    Ok(CaptureOutcome {
        buffer: assembler.into_buffer()?,
        complete,
        skipped,
    })
}
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    const READ: Duration = Duration::from_millis(100);
    const WAIT: Duration = Duration::from_secs(1);
    /// In-memory stand-in for a serial port: canned replies, recorded writes.
    struct FakePort {
        rx: Cursor<Vec<u8>>,
        tx: Vec<u8>,
    }
    impl FakePort {
        fn replying(reply: &str) -> Self {
            Self {
                rx: Cursor::new(reply.as_bytes().to_vec()),
                tx: Vec::new(),
            }
        }
    }
    impl Read for FakePort {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.rx.read(buf)
        }
    }
    impl CapturePort for FakePort {
        fn set_read_timeout(&mut self, _timeout: Duration) -> Result<(), ScopeError> {
            Ok(())
        }
    }
    impl Write for FakePort {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.tx.write(buf)
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
    /// Idle device: every read blocks for the port timeout, then times out.
    struct SilentPort {
        timeout: Duration,
        limits: Vec<Duration>,
    }
    impl SilentPort {
        fn new(timeout: Duration) -> Self {
            Self {
                timeout,
                limits: Vec::new(),
            }
        }
    }
    impl Read for SilentPort {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            std::thread::sleep(self.timeout);
            Err(std::io::Error::new(ErrorKind::TimedOut, "no data"))
        }
    }
    impl CapturePort for SilentPort {
        fn set_read_timeout(&mut self, timeout: Duration) -> Result<(), ScopeError> {
            self.timeout = timeout;
            self.limits.push(timeout);
            Ok(())
        }
    }
    impl Write for SilentPort {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
    #[test]
    fn sends_trigger_and_parses_frame() {
        let mut port =
            FakePort::replying("boot noise\nSCOPE_START\r\n0,1.5\r\n1,1.7\r\nSCOPE_END\r\n9,9\n");
        let outcome = capture_frame(&mut port, READ, WAIT).unwrap();
        assert_eq!(port.tx, b"SCOPE\n");
        assert!(outcome.complete);
        assert_eq!(outcome.buffer.time(), &[0.0, 0.001]);
        assert_eq!(outcome.buffer.voltage(), &[1.5, 1.7]);
    }
    #[test]
    fn line_without_comma_does_not_end_capture() {
        let mut port = FakePort::replying("SCOPE_START\n0,1.0\nglitch\n2,3.0\nSCOPE_END\n");
        let outcome = capture_frame(&mut port, READ, WAIT).unwrap();
        assert!(outcome.complete);
        assert_eq!(outcome.buffer.len(), 2);
    }
    #[test]
    fn missing_end_sentinel_yields_partial_data() {
        let mut port = FakePort::replying("SCOPE_START\n0,1.0\n1,2.0\n");
        let outcome = capture_frame(&mut port, READ, WAIT).unwrap();
        assert!(!outcome.complete);
        assert_eq!(outcome.buffer.len(), 2);
    }
    #[test]
    fn unterminated_last_line_still_counts() {
        let mut port = FakePort::replying("SCOPE_START\n0,1.0\nSCOPE_END");
        let outcome = capture_frame(&mut port, READ, WAIT).unwrap();
        assert!(outcome.complete);
        assert_eq!(outcome.buffer.len(), 1);
    }
    #[test]
    fn silent_device_times_out_empty() {
        let started = Instant::now();
        let mut port = SilentPort::new(Duration::from_millis(5));
        let outcome = capture_frame(&mut port, Duration::from_millis(5), Duration::from_millis(50))
            .unwrap();
        assert!(started.elapsed() >= Duration::from_millis(50));
        assert!(!outcome.complete);
        assert!(outcome.buffer.is_empty());
    }
    #[test]
    fn slow_reads_do_not_overrun_the_deadline() {
        let read_timeout = Duration::from_millis(1000);
        let mut port = SilentPort::new(read_timeout);
        let started = Instant::now();
        let outcome = capture_frame(&mut port, read_timeout, Duration::from_millis(150)).unwrap();
        assert!(started.elapsed() < Duration::from_millis(600));
        assert!(!outcome.complete);
        let (restored, per_read) = port.limits.split_last().unwrap();
        assert!(!per_read.is_empty());
        assert!(per_read.iter().all(|&t| t <= Duration::from_millis(150)));
        // restored for command traffic once the capture is over
        assert_eq!(*restored, read_timeout);
    }
    #[test]
    fn invalid_utf8_aborts() {
        let mut port = FakePort {
            rx: Cursor::new(b"SCOPE_START\n0,\xff\xfe\n".to_vec()),
            tx: Vec::new(),
        };
        let err = capture_frame(&mut port, READ, WAIT).unwrap_err();
        assert!(matches!(err, ScopeError::Decode(_)));
    }
}
