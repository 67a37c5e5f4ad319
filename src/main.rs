// src/main.rs
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]
mod config;
mod connection;
mod engine;
mod generator;
mod gui;
mod recorder;
mod scope;
mod types;
use eframe::egui;
use log::info;
use crate::config::{default_config_path, ScopeConfig};
fn main() -> eframe::Result<()> {
    env_logger::init();
    let config_path = default_config_path();
    let config = ScopeConfig::load_or_default(&config_path);
    info!(
        "baud {} / capture timeout {} ms / run interval {} ms",
        config.baud_rate, config.capture_timeout_ms, config.run_interval_ms
    );
    let viewport = egui::ViewportBuilder::default()
        .with_inner_size([1400.0, 900.0])
        .with_min_inner_size([1100.0, 700.0])
        .with_title("ESP32 Digital Oscilloscope & Function Generator");
    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };
    eframe::run_native(
        "esp32scope",
        options,
        Box::new(move |_cc| Box::new(gui::ScopeApp::new(config_path, config))),
    )
}
