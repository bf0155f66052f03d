//! Serial port enumeration

use serialport::{available_ports, SerialPortType};
use tracing::info;

use crate::error::PortError;

/// Information about a serial port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialPortInfo {
    /// Port name (e.g., /dev/ttyUSB0, COM3)
    pub port: String,
    /// USB Vendor ID (if USB)
    pub vid: Option<u16>,
    /// USB Product ID (if USB)
    pub pid: Option<u16>,
    /// USB manufacturer string
    pub manufacturer: Option<String>,
    /// USB product string
    pub product: Option<String>,
}

impl SerialPortInfo {
    fn from_serialport(name: String, port_type: &SerialPortType) -> Self {
        match port_type {
            SerialPortType::UsbPort(usb) => Self {
                port: name,
                vid: Some(usb.vid),
                pid: Some(usb.pid),
                manufacturer: usb.manufacturer.clone(),
                product: usb.product.clone(),
            },
            _ => Self {
                port: name,
                vid: None,
                pid: None,
                manufacturer: None,
                product: None,
            },
        }
    }

    /// One-line description: `USB 0403:6001 FTDI FT232R` or `native`
    pub fn description(&self) -> String {
        match (self.vid, self.pid) {
            (Some(vid), Some(pid)) => {
                let mut desc = format!("USB {vid:04X}:{pid:04X}");
                for text in [&self.manufacturer, &self.product].into_iter().flatten() {
                    desc.push(' ');
                    desc.push_str(text);
                }
                desc
            }
            _ => "native".to_string(),
        }
    }
}

/// Serial port scanner
pub struct PortScanner {
    skip_patterns: Vec<String>,
}

impl PortScanner {
    /// Scanner that hides Bluetooth and debug ports
    pub fn new() -> Self {
        Self {
            skip_patterns: vec!["Bluetooth".to_string(), "debug".to_string()],
        }
    }

    /// Scanner that hides ports whose name contains any of `patterns`
    pub fn with_skip_patterns(patterns: Vec<String>) -> Self {
        Self {
            skip_patterns: patterns,
        }
    }

    /// Enumerate available serial ports, sorted by name
    pub fn enumerate_ports(&self) -> Result<Vec<SerialPortInfo>, PortError> {
        info!("Enumerating serial ports...");
        let ports = available_ports().map_err(|e| PortError::EnumerationFailed(e.to_string()))?;

        let mut result: Vec<_> = ports
            .into_iter()
            .map(|p| SerialPortInfo::from_serialport(p.port_name, &p.port_type))
            .filter(|p| !self.should_skip_port(p))
            .collect();
        result.sort_by(|a, b| a.port.cmp(&b.port));

        info!("Found {} serial port(s)", result.len());
        Ok(result)
    }

    fn should_skip_port(&self, port: &SerialPortInfo) -> bool {
        self.skip_patterns
            .iter()
            .any(|pattern| port.port.contains(pattern.as_str()))
    }
}

impl Default for PortScanner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serialport::UsbPortInfo;

    fn usb_port() -> SerialPortInfo {
        let usb_info = SerialPortType::UsbPort(UsbPortInfo {
            vid: 0x0403,
            pid: 0x6001,
            serial_number: Some("12345".to_string()),
            manufacturer: Some("FTDI".to_string()),
            product: Some("FT232R".to_string()),
        });
        SerialPortInfo::from_serialport("/dev/ttyUSB0".to_string(), &usb_info)
    }

    #[test]
    fn test_serial_port_info_from_usb() {
        let info = usb_port();
        assert_eq!(info.vid, Some(0x0403));
        assert_eq!(info.pid, Some(0x6001));
        assert_eq!(info.product.as_deref(), Some("FT232R"));
        assert_eq!(info.description(), "USB 0403:6001 FTDI FT232R");
    }

    #[test]
    fn test_native_port_description() {
        let info = SerialPortInfo::from_serialport("/dev/ttyS0".to_string(), &SerialPortType::Unknown);
        assert_eq!(info.vid, None);
        assert_eq!(info.description(), "native");
    }

    #[test]
    fn test_skip_patterns() {
        let scanner = PortScanner::new();
        let bt = SerialPortInfo::from_serialport(
            "/dev/cu.Bluetooth-Incoming-Port".to_string(),
            &SerialPortType::BluetoothPort,
        );
        assert!(scanner.should_skip_port(&bt));
        assert!(!scanner.should_skip_port(&usb_port()));

        let custom = PortScanner::with_skip_patterns(vec!["ttyUSB".to_string()]);
        assert!(custom.should_skip_port(&usb_port()));
    }
}
