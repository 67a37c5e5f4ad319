// src/types.rs
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use crate::connection::ConnectionState;
use crate::generator::GeneratorState;
use crate::scope::DeviceCommand;
// GUI -> engine
#[derive(Clone, Debug)]
pub enum GuiCommand {
    Connect(String),
    Disconnect,
    EnterDemo,
    ExitDemo,
    // New generator snapshot plus the wire command describing the change
    Generator {
        state: GeneratorState,
        command: DeviceCommand,
    },
    // Generator snapshot changed with nothing to send (rejected entry reset)
    SyncGenerator(GeneratorState),
    CaptureSingle,
    StartRun,
    Shutdown,
}
// engine -> GUI
#[derive(Clone, Debug)]
pub enum ScopeMessage {
    Log(String),
    Status(ConnectionState),
    Dialog(Dialog),
    CaptureReady { samples: usize, complete: bool },
    RunState(bool),
}
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DialogKind {
    Info,
    Warning,
    Error,
}
/// A message box the GUI should show.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dialog {
    pub kind: DialogKind,
    pub title: String,
    pub body: String,
}
impl Dialog {
    pub fn info(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            kind: DialogKind::Info,
            title: title.into(),
            body: body.into(),
        }
    }
    pub fn warning(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            kind: DialogKind::Warning,
            title: title.into(),
            body: body.into(),
        }
    }
    pub fn error(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            kind: DialogKind::Error,
            title: title.into(),
            body: body.into(),
        }
    }
}
/// Cooperative stop flag for continuous capture.
///
/// The GUI clears it; the run loop checks it every cycle and while waiting.
#[derive(Clone, Debug, Default)]
pub struct RunToken(Arc<AtomicBool>);
impl RunToken {
    const POLL: Duration = Duration::from_millis(20);
    pub fn new() -> Self {
        Self::default()
    }
    pub fn start(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
    pub fn stop(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
    /// Sleeps up to `period`, returning early once stopped.
    /// Returns whether the run is still active.
    pub fn wait(&self, period: Duration) -> bool {
        let deadline = Instant::now() + period;
        while self.is_running() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::sleep(Self::POLL.min(deadline - now));
        }
        self.is_running()
    }
}
