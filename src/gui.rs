// src/gui.rs
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::JoinHandle;
use std::time::Duration;
use eframe::egui;
use egui::{Color32, RichText};
use egui_plot::{Line, Plot, PlotPoints};
use log::warn;
use crate::config::ScopeConfig;
use crate::connection::{scan_ports, ConnectionState, PortInfo, StartupPrompt};
use crate::engine;
use crate::generator::*;
use crate::recorder::CaptureRecorder;
use crate::scope::{DeviceCommand, Measurements, Readout, SharedBuffer, WaveKind};
use crate::types::*;
const SCOPE_GREEN: Color32 = Color32::from_rgb(0, 255, 0);
const DEMO_MAGENTA: Color32 = Color32::from_rgb(255, 0, 255);
const ALERT_RED: Color32 = Color32::from_rgb(255, 0, 0);
const MAX_LOG_LINES: usize = 12;
pub struct ScopeApp {
    config_path: PathBuf,
    config: ScopeConfig,
    connection: ConnectionState,
    is_running: bool,
    // function generator
    generator: GeneratorState,
    freq_text: String,
    amp_text: String,
    // ports
    ports: Vec<PortInfo>,
    selected_port: String,
    // display
    seen_generation: u64,
    points: Vec<[f64; 2]>,
    x_range: Option<(f64, f64)>,
    readout: Readout,
    // modal flows
    startup: Option<StartupPrompt>,
    dialogs: VecDeque<Dialog>,
    log_messages: Vec<String>,
    recorder: CaptureRecorder,
    // engine link
    shared: SharedBuffer,
    run: RunToken,
    rx: Receiver<ScopeMessage>,
    tx_cmd: Sender<GuiCommand>,
    _engine: JoinHandle<()>,
}
impl ScopeApp {
    pub fn new(config_path: PathBuf, config: ScopeConfig) -> Self {
        let (tx, rx) = channel();
        let (tx_cmd, rx_cmd) = channel();
        let shared = SharedBuffer::new();
        let run = RunToken::new();
        let engine = engine::spawn_thread(config.clone(), shared.clone(), run.clone(), tx, rx_cmd);
        let ports = scan_ports();
        let startup = StartupPrompt::detect(&ports);
        let selected_port = match &startup {
            StartupPrompt::OfferConnect { port } => port.clone(),
            StartupPrompt::OfferDemo => config
                .last_port
                .clone()
                .or_else(|| ports.first().map(|p| p.name.clone()))
                .unwrap_or_default(),
        };
        let generator = GeneratorState::default();
        let recorder = CaptureRecorder::new("captures");
        let greeting = format!("> Captures are saved under {}", recorder.dir().display());
        Self {
            config_path,
            config,
            connection: ConnectionState::Disconnected,
            is_running: false,
            freq_text: generator.frequency_hz.to_string(),
            amp_text: generator.amplitude.to_string(),
            generator,
            ports,
            selected_port,
            seen_generation: shared.generation(),
            points: Vec::new(),
            x_range: None,
            readout: Readout::placeholder(),
            startup: Some(startup),
            dialogs: VecDeque::new(),
            log_messages: vec![greeting],
            recorder,
            shared,
            run,
            rx,
            tx_cmd,
            _engine: engine,
        }
    }
    fn log(&mut self, msg: &str) {
        self.log_messages.push(format!("> {}", msg));
        if self.log_messages.len() > MAX_LOG_LINES {
            self.log_messages.remove(0);
        }
    }
    fn send(&self, cmd: GuiCommand) {
        if self.tx_cmd.send(cmd).is_err() {
            warn!("scope engine is not running");
        }
    }
    fn push_generator(&mut self, command: DeviceCommand) {
        self.send(GuiCommand::Generator {
            state: self.generator,
            command,
        });
    }
    fn refresh_ports(&mut self) {
        self.ports = scan_ports();
        if !self.ports.iter().any(|p| p.name == self.selected_port) {
            self.selected_port = self
                .ports
                .first()
                .map(|p| p.name.clone())
                .unwrap_or_default();
        }
        let names: Vec<&str> = self.ports.iter().map(|p| p.name.as_str()).collect();
        self.log(&format!("Ports: {:?}", names));
    }
    fn remember_port(&mut self, port: &str) {
        if self.config.last_port.as_deref() == Some(port) {
            return;
        }
        self.config.last_port = Some(port.to_owned());
        if let Err(e) = self.config.save(&self.config_path) {
            warn!("could not persist last port: {e:#}");
        }
    }
    fn handle_messages(&mut self) {
        while let Ok(msg) = self.rx.try_recv() {
            match msg {
                ScopeMessage::Log(s) => self.log(&s),
                ScopeMessage::Status(state) => {
                    if let ConnectionState::Connected { port } = &state {
                        self.remember_port(port);
                    }
                    self.connection = state;
                }
                ScopeMessage::Dialog(d) => self.dialogs.push_back(d),
                ScopeMessage::CaptureReady { samples, complete } => {
                    if !complete {
                        self.log(&format!("Capture timed out, kept {samples} samples"));
                    }
                }
                ScopeMessage::RunState(running) => self.is_running = running,
            }
        }
    }
    /// Re-reads the shared buffer once per new publish.
    fn reload_capture(&mut self) {
        let generation = self.shared.generation();
        if generation == self.seen_generation {
            return;
        }
        self.seen_generation = generation;
        let buffer = self.shared.snapshot();
        self.points = buffer.points();
        self.x_range = buffer.time_range();
        self.readout = Readout::from(Measurements::compute(&buffer).as_ref());
    }
    fn clear_display(&mut self) {
        self.shared.clear();
        self.reload_capture();
    }
    fn save_capture(&mut self) {
        match self.recorder.save(&self.shared.snapshot()) {
            Ok(path) => self.log(&format!("Saved {}", path.display())),
            Err(e) => self
                .dialogs
                .push_back(Dialog::error("Save Failed", e.to_string())),
        }
    }
    fn submit_frequency(&mut self) {
        match self.generator.apply_frequency_entry(&self.freq_text) {
            Ok(cmd) => self.push_generator(cmd),
            Err(e) => {
                self.send(GuiCommand::SyncGenerator(self.generator));
                self.dialogs
                    .push_back(Dialog::error("Invalid Input", format!("{e} Hz")));
            }
        }
        self.freq_text = self.generator.frequency_hz.to_string();
    }
    fn submit_amplitude(&mut self) {
        match self.generator.apply_amplitude_entry(&self.amp_text) {
            Ok(cmd) => self.push_generator(cmd),
            Err(e) => {
                self.send(GuiCommand::SyncGenerator(self.generator));
                self.dialogs
                    .push_back(Dialog::error("Invalid Input", e.to_string()));
            }
        }
        self.amp_text = self.generator.amplitude.to_string();
    }
    fn status_color(&self) -> Color32 {
        match self.connection {
            ConnectionState::Disconnected => ALERT_RED,
            ConnectionState::Connected { .. } => SCOPE_GREEN,
            ConnectionState::Demo => DEMO_MAGENTA,
        }
    }
    fn connection_panel(&mut self, ui: &mut egui::Ui) {
        ui.label(RichText::new("CONNECTION").strong());
        let idle = self.connection == ConnectionState::Disconnected;
        ui.add_enabled_ui(idle, |ui| {
            ui.horizontal(|ui| {
                ui.label("PORT:");
                egui::ComboBox::from_id_source("port_combo")
                    .selected_text(self.selected_port.clone())
                    .show_ui(ui, |ui| {
                        for p in &self.ports {
                            let text = if p.description.is_empty() {
                                p.name.clone()
                            } else {
                                format!("{} ({})", p.name, p.description)
                            };
                            ui.selectable_value(&mut self.selected_port, p.name.clone(), text);
                        }
                    });
            });
        });
        ui.horizontal(|ui| {
            let connect_text = if self.connection.is_connected() {
                "DISCONNECT"
            } else {
                "CONNECT"
            };
            if ui
                .add_enabled(!self.connection.is_demo(), egui::Button::new(connect_text))
                .clicked()
            {
                if self.connection.is_connected() {
                    self.send(GuiCommand::Disconnect);
                } else {
                    self.send(GuiCommand::Connect(self.selected_port.clone()));
                }
            }
            if ui.add_enabled(idle, egui::Button::new("REFRESH")).clicked() {
                self.refresh_ports();
            }
        });
        let demo_text = if self.connection.is_demo() {
            "EXIT DEMO"
        } else {
            "DEMO MODE"
        };
        let demo_btn = egui::Button::new(RichText::new(demo_text).color(DEMO_MAGENTA));
        if ui
            .add_enabled(!self.connection.is_connected(), demo_btn)
            .clicked()
        {
            if self.connection.is_demo() {
                self.send(GuiCommand::ExitDemo);
            } else {
                self.send(GuiCommand::EnterDemo);
            }
        }
    }
    fn generator_panel(&mut self, ui: &mut egui::Ui) {
        ui.label(RichText::new("FUNCTION GENERATOR").strong());
        ui.label("WAVEFORM");
        ui.horizontal_wrapped(|ui| {
            for kind in WaveKind::ALL {
                if ui
                    .radio(self.generator.wave == kind, kind.wire_name())
                    .clicked()
                {
                    let cmd = self.generator.set_wave(kind);
                    self.push_generator(cmd);
                }
            }
        });
        ui.add_space(6.0);
        ui.label("FREQUENCY (Hz)");
        ui.horizontal(|ui| {
            ui.label("Enter:");
            let edit = ui.add(egui::TextEdit::singleline(&mut self.freq_text).desired_width(80.0));
            let set = ui.button("SET").clicked();
            if set || edit.lost_focus() {
                self.submit_frequency();
            }
        });
        let slider = ui.add(
            egui::Slider::new(&mut self.generator.frequency_hz, FREQ_MIN..=FREQ_MAX)
                .logarithmic(true)
                .show_value(false),
        );
        if slider.changed() {
            self.freq_text = self.generator.frequency_hz.to_string();
        }
        if slider.drag_released() || (slider.changed() && !slider.dragged()) {
            let cmd = self.generator.set_frequency(self.generator.frequency_hz);
            self.push_generator(cmd);
        }
        ui.horizontal(|ui| {
            for hz in QUICK_FREQUENCIES {
                if ui.small_button(format!("{hz}Hz")).clicked() {
                    let cmd = self.generator.set_frequency(hz);
                    self.freq_text = hz.to_string();
                    self.push_generator(cmd);
                }
            }
        });
        ui.add_space(6.0);
        ui.label("AMPLITUDE (0-255)");
        ui.horizontal(|ui| {
            ui.label("Enter:");
            let edit = ui.add(egui::TextEdit::singleline(&mut self.amp_text).desired_width(80.0));
            let set = ui.button("SET").clicked();
            if set || edit.lost_focus() {
                self.submit_amplitude();
            }
        });
        let slider = ui.add(
            egui::Slider::new(&mut self.generator.amplitude, AMP_MIN..=AMP_MAX).show_value(false),
        );
        if slider.changed() {
            self.amp_text = self.generator.amplitude.to_string();
        }
        if slider.drag_released() || (slider.changed() && !slider.dragged()) {
            let cmd = self.generator.set_amplitude(self.generator.amplitude);
            self.push_generator(cmd);
        }
        ui.add_space(6.0);
        let (out_text, out_color) = if self.generator.output_enabled {
            ("OUTPUT: ON", SCOPE_GREEN)
        } else {
            ("OUTPUT: OFF", ALERT_RED)
        };
        if ui
            .button(RichText::new(out_text).color(out_color).strong())
            .clicked()
        {
            let cmd = self.generator.toggle_output();
            self.push_generator(cmd);
        }
    }
    fn scope_controls(&mut self, ui: &mut egui::Ui) {
        ui.label(RichText::new("OSCILLOSCOPE CONTROLS").strong());
        ui.horizontal(|ui| {
            if ui.button("◉ SINGLE").clicked() {
                self.send(GuiCommand::CaptureSingle);
            }
            let (run_text, run_color) = if self.is_running {
                ("■ STOP", ALERT_RED)
            } else {
                ("▶ RUN", SCOPE_GREEN)
            };
            if ui.button(RichText::new(run_text).color(run_color)).clicked() {
                if self.is_running {
                    // cooperative: the engine notices on its next check
                    self.run.stop();
                } else {
                    self.send(GuiCommand::StartRun);
                }
            }
            if ui.button("⌧ CLEAR").clicked() {
                self.clear_display();
            }
            if ui.button("SAVE CSV").clicked() {
                self.save_capture();
            }
        });
    }
    fn measurement_panel(&self, ui: &mut egui::Ui) {
        ui.label(RichText::new("MEASUREMENTS").strong());
        egui::Grid::new("measurements")
            .num_columns(5)
            .spacing([24.0, 4.0])
            .show(ui, |ui| {
                for (label, _, _) in self.readout.rows() {
                    ui.label(RichText::new(label).color(Color32::GRAY));
                }
                ui.end_row();
                for (_, value, unit) in self.readout.rows() {
                    ui.label(
                        RichText::new(format!("{value} {unit}"))
                            .monospace()
                            .color(SCOPE_GREEN),
                    );
                }
                ui.end_row();
            });
    }
    fn waveform_plot(&self, ui: &mut egui::Ui) {
        let (x_min, x_max) = self.x_range.unwrap_or((0.0, 100.0));
        Plot::new("scope_plot")
            .allow_drag(false)
            .allow_zoom(false)
            .allow_scroll(false)
            .include_x(x_min)
            .include_x(x_max)
            .include_y(0.0)
            .include_y(6.6)
            .x_axis_label("Time")
            .y_axis_label("Voltage (V)")
            .height(ui.available_height() - 80.0)
            .show(ui, |plot_ui| {
                if !self.points.is_empty() {
                    plot_ui.line(
                        Line::new(PlotPoints::new(self.points.clone()))
                            .color(SCOPE_GREEN)
                            .name("CH1"),
                    );
                }
            });
    }
    fn show_modals(&mut self, ctx: &egui::Context) {
        if let Some(prompt) = self.startup.clone() {
            let mut answer = None;
            egui::Window::new(prompt.title())
                .id(egui::Id::new("startup_prompt"))
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.label(prompt.message());
                    ui.horizontal(|ui| {
                        if ui.button("Yes").clicked() {
                            answer = Some(true);
                        }
                        if ui.button("No").clicked() {
                            answer = Some(false);
                        }
                    });
                });
            if let Some(yes) = answer {
                self.startup = None;
                if yes {
                    self.send(prompt.accept());
                }
            }
            return;
        }
        if let Some(dialog) = self.dialogs.front().cloned() {
            let color = match dialog.kind {
                DialogKind::Info => SCOPE_GREEN,
                DialogKind::Warning => Color32::YELLOW,
                DialogKind::Error => ALERT_RED,
            };
            let mut close = false;
            egui::Window::new(dialog.title.as_str())
                .id(egui::Id::new("scope_dialog"))
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.label(RichText::new(dialog.body.as_str()).color(color));
                    if ui.button("OK").clicked() {
                        close = true;
                    }
                });
            if close {
                self.dialogs.pop_front();
            }
        }
    }
}
impl eframe::App for ScopeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_messages();
        self.reload_capture();
        // engine messages arrive without input events
        ctx.request_repaint_after(Duration::from_millis(100));
        let mut visuals = egui::Visuals::dark();
        visuals.panel_fill = Color32::from_rgb(10, 10, 10);
        ctx.set_visuals(visuals);
        egui::TopBottomPanel::top("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading(RichText::new("ESP32 DIGITAL OSCILLOSCOPE").color(SCOPE_GREEN));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(RichText::new(self.connection.label()).color(self.status_color()));
                    ui.label(RichText::new("●").size(20.0).color(self.status_color()));
                });
            });
        });
        egui::SidePanel::left("controls")
            .min_width(320.0)
            .show(ctx, |ui| {
                ui.add_space(6.0);
                self.connection_panel(ui);
                ui.separator();
                self.generator_panel(ui);
                ui.separator();
                self.scope_controls(ui);
                ui.separator();
                egui::ScrollArea::vertical().max_height(160.0).show(ui, |ui| {
                    for m in &self.log_messages {
                        ui.monospace(m);
                    }
                });
            });
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.label(RichText::new(self.connection.banner()).color(self.status_color()));
            self.waveform_plot(ui);
            ui.separator();
            self.measurement_panel(ui);
        });
        self.show_modals(ctx);
    }
}
impl Drop for ScopeApp {
    fn drop(&mut self) {
        self.run.stop();
        self.tx_cmd.send(GuiCommand::Shutdown).ok();
    }
}
