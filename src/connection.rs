// src/connection.rs
use log::warn;
use crate::scope::ScopeError;
use crate::types::GuiCommand;
/// Port descriptions that usually mean an ESP32 dev board is attached.
const DEVICE_HINTS: [&str; 4] = ["USB", "Serial", "CH340", "CP210"];
/// Exactly one of these is active; demo and hardware exclude each other.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected {
        port: String,
    },
    Demo,
}
impl ConnectionState {
    pub fn connect(&self, port: &str) -> Result<Self, ScopeError> {
        match self {
            ConnectionState::Disconnected if port.trim().is_empty() => {
                Err(ScopeError::NoPortSelected)
            }
            ConnectionState::Disconnected => Ok(ConnectionState::Connected {
                port: port.trim().to_owned(),
            }),
            other => Err(other.refuse("connect")),
        }
    }
    pub fn disconnect(&self) -> Result<Self, ScopeError> {
        match self {
            ConnectionState::Connected { .. } => Ok(ConnectionState::Disconnected),
            other => Err(other.refuse("disconnect")),
        }
    }
    pub fn enter_demo(&self) -> Result<Self, ScopeError> {
        match self {
            ConnectionState::Disconnected => Ok(ConnectionState::Demo),
            other => Err(other.refuse("enter demo mode")),
        }
    }
    pub fn exit_demo(&self) -> Result<Self, ScopeError> {
        match self {
            ConnectionState::Demo => Ok(ConnectionState::Disconnected),
            other => Err(other.refuse("exit demo mode")),
        }
    }
    fn refuse(&self, action: &'static str) -> ScopeError {
        ScopeError::InvalidTransition {
            action,
            state: self.describe(),
        }
    }
    fn describe(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connected { .. } => "connected",
            ConnectionState::Demo => "in demo mode",
        }
    }
    pub fn can_capture(&self) -> bool {
        !matches!(self, ConnectionState::Disconnected)
    }
    pub fn is_demo(&self) -> bool {
        matches!(self, ConnectionState::Demo)
    }
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected { .. })
    }
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "DISCONNECTED",
            ConnectionState::Connected { .. } => "CONNECTED",
            ConnectionState::Demo => "DEMO MODE",
        }
    }
    pub fn banner(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "[ DISCONNECTED ]",
            ConnectionState::Connected { .. } => "[ CONNECTED - READY ]",
            ConnectionState::Demo => "[ DEMO MODE - SIMULATED DATA ]",
        }
    }
}
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PortInfo {
    pub name: String,
    pub description: String,
}
pub fn scan_ports() -> Vec<PortInfo> {
    let ports = match serialport::available_ports() {
        Ok(ports) => ports,
        Err(e) => {
            warn!("port scan failed: {e}");
            return Vec::new();
        }
    };
    let mut out: Vec<PortInfo> = ports
        .into_iter()
        .map(|p| {
            let description = match p.port_type {
                serialport::SerialPortType::UsbPort(info) => {
                    let parts: Vec<String> =
                        [info.manufacturer, info.product].into_iter().flatten().collect();
                    if parts.is_empty() {
                        "USB Serial".to_owned()
                    } else {
                        format!("USB {}", parts.join(" "))
                    }
                }
                serialport::SerialPortType::BluetoothPort => "Bluetooth".to_owned(),
                serialport::SerialPortType::PciPort => "PCI".to_owned(),
                serialport::SerialPortType::Unknown => String::new(),
            };
            PortInfo {
                name: p.port_name,
                description,
            }
        })
        .collect();
    out.sort_by(|a, b| a.name.cmp(&b.name));
    out
}
/// Question asked once at startup, decided from the port scan alone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StartupPrompt {
    OfferConnect { port: String },
    OfferDemo,
}
impl StartupPrompt {
    pub fn detect(ports: &[PortInfo]) -> Self {
        ports
            .iter()
            .find(|p| DEVICE_HINTS.iter().any(|hint| p.description.contains(hint)))
            .map(|p| StartupPrompt::OfferConnect {
                port: p.name.clone(),
            })
            .unwrap_or(StartupPrompt::OfferDemo)
    }
    pub fn title(&self) -> &'static str {
        match self {
            StartupPrompt::OfferConnect { .. } => "ESP32 Detected",
            StartupPrompt::OfferDemo => "ESP32 Not Found",
        }
    }
    pub fn message(&self) -> String {
        match self {
            StartupPrompt::OfferConnect { port } => format!("ESP32 found on {port}\n\nConnect now?"),
            StartupPrompt::OfferDemo => "ESP32 device not detected.\n\n\
                 Would you like to enable DEMO MODE?\n\
                 (Demo mode allows you to explore all features with simulated data)"
                .to_owned(),
        }
    }
    /// Command to run when the user answers yes.
    pub fn accept(&self) -> GuiCommand {
        match self {
            StartupPrompt::OfferConnect { port } => GuiCommand::Connect(port.clone()),
            StartupPrompt::OfferDemo => GuiCommand::EnterDemo,
        }
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    fn port(name: &str, description: &str) -> PortInfo {
        PortInfo {
            name: name.into(),
            description: description.into(),
        }
    }
    #[test]
    fn demo_and_hardware_are_mutually_exclusive() {
        let demo = ConnectionState::Disconnected.enter_demo().unwrap();
        assert!(matches!(
            demo.connect("COM3"),
            Err(ScopeError::InvalidTransition { .. })
        ));
        let connected = ConnectionState::Disconnected.connect("COM3").unwrap();
        assert_eq!(
            connected,
            ConnectionState::Connected {
                port: "COM3".into()
            }
        );
        assert!(connected.enter_demo().is_err());
        assert_eq!(connected.disconnect().unwrap(), ConnectionState::Disconnected);
        assert_eq!(demo.exit_demo().unwrap(), ConnectionState::Disconnected);
    }
    #[test]
    fn connect_needs_a_port() {
        assert!(matches!(
            ConnectionState::Disconnected.connect("  "),
            Err(ScopeError::NoPortSelected)
        ));
    }
    #[test]
    fn capture_allowed_only_when_active() {
        assert!(!ConnectionState::Disconnected.can_capture());
        assert!(ConnectionState::Demo.can_capture());
        assert!(ConnectionState::Connected { port: "x".into() }.can_capture());
        assert_eq!(ConnectionState::Demo.label(), "DEMO MODE");
    }
    #[test]
    fn startup_detects_usb_bridge() {
        let ports = [
            port("/dev/ttyS0", ""),
            port("/dev/ttyUSB0", "USB Silicon Labs CP2102"),
        ];
        let prompt = StartupPrompt::detect(&ports);
        assert_eq!(
            prompt,
            StartupPrompt::OfferConnect {
                port: "/dev/ttyUSB0".into()
            }
        );
        assert!(matches!(prompt.accept(), GuiCommand::Connect(p) if p == "/dev/ttyUSB0"));
    }
    #[test]
    fn startup_offers_demo_without_device() {
        let prompt = StartupPrompt::detect(&[port("COM1", "PCI")]);
        assert_eq!(prompt, StartupPrompt::OfferDemo);
        assert!(matches!(prompt.accept(), GuiCommand::EnterDemo));
    }
}
