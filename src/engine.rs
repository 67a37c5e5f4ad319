// src/engine.rs
use std::io::Write;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use log::{debug, error, info, warn};
use serialport::SerialPort;
use crate::config::ScopeConfig;
use crate::connection::ConnectionState;
use crate::generator::GeneratorState;
use crate::scope::{capture_frame, DemoSynth, DeviceCommand, SampleBuffer, ScopeError, SharedBuffer};
use crate::types::*;
const IDLE_POLL: Duration = Duration::from_millis(50);
enum Flow {
    Continue,
    Exit,
}
/// Background worker. Owns the serial port for as long as it is open.
struct Engine {
    config: ScopeConfig,
    state: ConnectionState,
    port: Option<Box<dyn SerialPort>>,
    generator: GeneratorState,
    synth: DemoSynth,
    shared: SharedBuffer,
    run: RunToken,
    // last run state reported to the GUI
    announced_run: bool,
    tx: Sender<ScopeMessage>,
}
pub fn spawn_thread(
    config: ScopeConfig,
    shared: SharedBuffer,
    run: RunToken,
    tx: Sender<ScopeMessage>,
    rx_cmd: Receiver<GuiCommand>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let (synth, fallback) = match DemoSynth::new(config.demo) {
            Ok(s) => (s, None),
            Err(e) => {
                warn!("demo settings rejected: {e}");
                (DemoSynth::with_defaults(), Some(e))
            }
        };
        let mut engine = Engine {
            config,
            state: ConnectionState::Disconnected,
            port: None,
            generator: GeneratorState::default(),
            synth,
            shared,
            run,
            announced_run: false,
            tx,
        };
        engine.log("Scope engine ready.");
        if let Some(e) = fallback {
            engine.log(&format!("Demo settings rejected ({e}), using defaults"));
        }
        engine.event_loop(rx_cmd);
        engine.run.stop();
        engine.port = None;
        info!("scope engine stopped");
    })
}
impl Engine {
    fn event_loop(&mut self, rx_cmd: Receiver<GuiCommand>) {
        loop {
            // 1. drain pending commands
            loop {
                match rx_cmd.try_recv() {
                    Ok(cmd) => {
                        if let Flow::Exit = self.handle(cmd) {
                            return;
                        }
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => return,
                }
            }
            self.sync_run_state();
            // 2. continuous capture, or wait for the next command
            if self.run.is_running() {
                self.acquire_and_publish();
                self.run.wait(self.config.run_interval());
                self.sync_run_state();
            } else {
                match rx_cmd.recv_timeout(IDLE_POLL) {
                    Ok(cmd) => {
                        if let Flow::Exit = self.handle(cmd) {
                            return;
                        }
                    }
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => return,
                }
            }
        }
    }
    fn handle(&mut self, cmd: GuiCommand) -> Flow {
        match cmd {
            GuiCommand::Connect(port) => self.connect(&port),
            GuiCommand::Disconnect => self.disconnect(),
            GuiCommand::EnterDemo => self.enter_demo(),
            GuiCommand::ExitDemo => self.exit_demo(),
            GuiCommand::Generator { state, command } => {
                self.generator = state;
                self.send_command(command);
            }
            GuiCommand::SyncGenerator(state) => self.generator = state,
            GuiCommand::CaptureSingle => {
                if self.require_active() {
                    self.acquire_and_publish();
                }
            }
            GuiCommand::StartRun => {
                if self.require_active() {
                    self.run.start();
                    self.sync_run_state();
                    self.log("Continuous capture started");
                }
            }
            GuiCommand::Shutdown => return Flow::Exit,
        }
        Flow::Continue
    }
    fn connect(&mut self, port_name: &str) {
        let next = match self.state.connect(port_name) {
            Ok(next) => next,
            Err(ScopeError::NoPortSelected) => {
                self.dialog(Dialog::error("Error", "Please select a COM port"));
                return;
            }
            Err(e) => {
                warn!("{e}");
                self.log(&e.to_string());
                return;
            }
        };
        let opened = serialport::new(port_name.trim(), self.config.baud_rate)
            .timeout(self.config.port_timeout())
            .open();
        match opened {
            Ok(port) => {
                thread::sleep(self.config.settle_delay());
                self.port = Some(port);
                self.set_state(next);
                info!("connected to {port_name} at {} baud", self.config.baud_rate);
                self.dialog(Dialog::info(
                    "Success",
                    format!("Connected to ESP32 on {port_name}"),
                ));
            }
            Err(e) => {
                error!("failed to open {port_name}: {e}");
                self.dialog(Dialog::error(
                    "Connection Error",
                    format!("Failed to connect:\n{e}"),
                ));
            }
        }
    }
    fn disconnect(&mut self) {
        match self.state.disconnect() {
            Ok(next) => {
                self.stop_run();
                // dropping the handle closes the port
                self.port = None;
                self.set_state(next);
            }
            Err(e) => self.log(&e.to_string()),
        }
    }
    fn enter_demo(&mut self) {
        match self.state.enter_demo() {
            Ok(next) => {
                self.set_state(next);
                self.dialog(Dialog::info(
                    "Demo Mode",
                    "Demo mode activated!\n\n\
                     All controls are functional with simulated waveforms.\n\
                     Connect ESP32 hardware for real measurements.",
                ));
            }
            Err(e) => self.log(&e.to_string()),
        }
    }
    fn exit_demo(&mut self) {
        match self.state.exit_demo() {
            Ok(next) => {
                self.stop_run();
                self.set_state(next);
            }
            Err(e) => self.log(&e.to_string()),
        }
    }
    fn stop_run(&mut self) {
        self.run.stop();
        self.sync_run_state();
    }
    /// Reports run start/stop, including stops requested through the token.
    fn sync_run_state(&mut self) {
        let running = self.run.is_running();
        if running != self.announced_run {
            self.announced_run = running;
            self.send(ScopeMessage::RunState(running));
        }
    }
    fn require_active(&mut self) -> bool {
        if self.state.can_capture() {
            return true;
        }
        self.dialog(Dialog::warning(
            "Warning",
            "Not connected to ESP32.\n\nEnable Demo Mode to test with simulated data.",
        ));
        false
    }
    fn send_command(&mut self, command: DeviceCommand) {
        if self.state.is_demo() {
            self.log(&format!("[DEMO] Command: {command}"));
            return;
        }
        let Some(port) = self.port.as_mut() else {
            warn!("[NOT CONNECTED] Cannot send: {command}");
            return;
        };
        let written = port
            .write_all(&command.to_wire())
            .and_then(|_| port.flush());
        match written {
            Ok(()) => {
                thread::sleep(self.config.command_gap());
                debug!("[SENT] {command}");
                self.log(&format!("[SENT] {command}"));
            }
            Err(e) => {
                error!("Command error: {e}");
                self.log(&format!("Command error: {e}"));
            }
        }
    }
    /// One capture cycle; failures end this cycle only.
    fn acquire_and_publish(&mut self) {
        match self.acquire() {
            Ok(Some((buffer, complete))) => {
                let samples = buffer.len();
                self.shared.publish(buffer);
                self.send(ScopeMessage::CaptureReady { samples, complete });
            }
            Ok(None) => {}
            Err(e) => {
                error!("Capture error: {e}");
                self.log(&format!("Capture error: {e}"));
            }
        }
    }
    fn acquire(&mut self) -> Result<Option<(SampleBuffer, bool)>, ScopeError> {
        match &self.state {
            ConnectionState::Demo => {
                let buffer = self.synth.synthesize(
                    self.generator.wave,
                    self.generator.frequency_hz as f64,
                    self.generator.amplitude_fraction(),
                );
                Ok(Some((buffer, true)))
            }
            ConnectionState::Connected { .. } => {
                let port = self.port.as_mut().ok_or(ScopeError::NotConnected)?;
                let outcome = capture_frame(
                    &mut **port,
                    self.config.port_timeout(),
                    self.config.capture_timeout(),
                )?;
                if outcome.skipped > 0 {
                    debug!("{} malformed lines dropped", outcome.skipped);
                }
                Ok(Some((outcome.buffer, outcome.complete)))
            }
            ConnectionState::Disconnected => Ok(None),
        }
    }
    fn set_state(&mut self, next: ConnectionState) {
        self.state = next.clone();
        self.send(ScopeMessage::Status(next));
    }
    fn log(&self, msg: &str) {
        self.send(ScopeMessage::Log(msg.to_owned()));
    }
    fn dialog(&self, dialog: Dialog) {
        self.send(ScopeMessage::Dialog(dialog));
    }
    fn send(&self, msg: ScopeMessage) {
        // the GUI may already be gone during shutdown
        self.tx.send(msg).ok();
    }
}
