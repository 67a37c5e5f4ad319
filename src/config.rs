// src/config.rs
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use crate::scope::{DemoSettings, BAUD_RATE};
pub fn default_config_path() -> PathBuf {
    PathBuf::from("data/scope_config.json")
}
/// Runtime settings, persisted as JSON.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeConfig {
    pub baud_rate: u32,
    pub port_timeout_ms: u64,
    /// ESP32 boards reset when the port opens; give them time to boot.
    pub settle_ms: u64,
    pub command_gap_ms: u64,
    pub capture_timeout_ms: u64,
    pub run_interval_ms: u64,
    pub demo: DemoSettings,
    pub last_port: Option<String>,
}
impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            baud_rate: BAUD_RATE,
            port_timeout_ms: 1000,
            settle_ms: 2000,
            command_gap_ms: 50,
            capture_timeout_ms: 5000,
            run_interval_ms: 500,
            demo: DemoSettings::default(),
            last_port: None,
        }
    }
}
impl ScopeConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("invalid config in {}", path.display()))
    }
    /// Missing file means defaults; a broken one is reported and ignored.
    /// Invalid demo settings alone fall back to the demo defaults.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            info!("no config at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(mut cfg) => {
                if let Err(e) = cfg.demo.validate() {
                    warn!("{}: {e}; using default demo settings", path.display());
                    cfg.demo = DemoSettings::default();
                }
                cfg
            }
            Err(e) => {
                warn!("{e:#}; using defaults");
                Self::default()
            }
        }
    }
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
    }
    pub fn port_timeout(&self) -> Duration {
        Duration::from_millis(self.port_timeout_ms)
    }
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
    pub fn command_gap(&self) -> Duration {
        Duration::from_millis(self.command_gap_ms)
    }
    pub fn capture_timeout(&self) -> Duration {
        Duration::from_millis(self.capture_timeout_ms)
    }
    pub fn run_interval(&self) -> Duration {
        Duration::from_millis(self.run_interval_ms)
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("esp32scope_{name}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }
    #[test]
    fn partial_json_fills_defaults() {
        let cfg: ScopeConfig =
            serde_json::from_str(r#"{ "run_interval_ms": 100, "demo": { "samples": 10 } }"#)
                .unwrap();
        assert_eq!(cfg.run_interval_ms, 100);
        assert_eq!(cfg.demo.samples, 10);
        assert_eq!(cfg.demo.span_ms, 100.0);
        assert_eq!(cfg.baud_rate, 115_200);
        assert_eq!(cfg.capture_timeout(), Duration::from_secs(5));
    }
    #[test]
    fn save_then_load_keeps_last_port() {
        let dir = scratch_dir("cfg_roundtrip");
        let path = dir.join("nested").join("scope_config.json");
        let cfg = ScopeConfig {
            last_port: Some("/dev/ttyUSB0".into()),
            ..ScopeConfig::default()
        };
        cfg.save(&path).unwrap();
        assert_eq!(ScopeConfig::load_or_default(&path), cfg);
        let _ = fs::remove_dir_all(&dir);
    }
    #[test]
    fn broken_file_falls_back_to_defaults() {
        let dir = scratch_dir("cfg_broken");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("scope_config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(ScopeConfig::load(&path).is_err());
        assert_eq!(ScopeConfig::load_or_default(&path), ScopeConfig::default());
        assert_eq!(
            ScopeConfig::load_or_default(&dir.join("missing.json")),
            ScopeConfig::default()
        );
        let _ = fs::remove_dir_all(&dir);
    }
    #[test]
    fn invalid_demo_noise_is_replaced_on_load() {
        let dir = scratch_dir("cfg_bad_noise");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("scope_config.json");
        fs::write(&path, r#"{ "run_interval_ms": 250, "demo": { "noise_sigma": -1.0 } }"#).unwrap();
        let cfg = ScopeConfig::load_or_default(&path);
        assert_eq!(cfg.run_interval_ms, 250);
        assert_eq!(cfg.demo, DemoSettings::default());
        let _ = fs::remove_dir_all(&dir);
    }
}
