use crate::serial_terminal::{LockInTerminal, TerminalError};
use serialport::{SerialPortInfo, SerialPortType};

/// USB vendor id of PJRC, maker of the Teensy boards the firmware runs on.
const TEENSY_VENDOR_ID: u16 = 0x16c0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockInDevice {
    pub name: String,
    pub port: String,
}

impl LockInDevice {
    pub fn new(name: String, port: String) -> Self {
        Self { name, port }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    #[error("Serial terminal error: {0}")]
    SerialTerminal(#[from] TerminalError),

    #[error("Serial port error: {0}")]
    SerialPort(#[from] serialport::Error),

    #[error("No lock-in device found. Please connect a Teensy or specify the port manually")]
    DeviceNotFound,
}

pub struct LockInConnector;

impl LockInConnector {
    /// Open `port`, or the first lock-in device found when `None`.
    pub fn connect(port: Option<&str>, baud: u32) -> Result<LockInTerminal, ConnectorError> {
        let port = match port {
            Some(port) => port.to_string(),
            None => Self::get_device_port()?,
        };
        log::debug!("Connecting to lock-in on port {}", port);
        Ok(LockInTerminal::open(&port, baud)?)
    }

    fn is_lockin(info: &SerialPortInfo) -> bool {
        match &info.port_type {
            SerialPortType::UsbPort(usb) => usb.vid == TEENSY_VENDOR_ID,
            _ => false,
        }
    }

    fn describe(info: &SerialPortInfo) -> String {
        match &info.port_type {
            SerialPortType::UsbPort(usb) => usb
                .product
                .clone()
                .unwrap_or_else(|| format!("USB {:04x}:{:04x}", usb.vid, usb.pid)),
            SerialPortType::PciPort => "PCI serial".to_string(),
            SerialPortType::BluetoothPort => "Bluetooth serial".to_string(),
            _ => "serial".to_string(),
        }
    }

    /// All serial ports on the system, lock-in candidates first.
    pub fn list_ports() -> Result<Vec<LockInDevice>, ConnectorError> {
        let mut ports = serialport::available_ports()?;
        ports.sort_by_key(|info| !Self::is_lockin(info));

        Ok(ports
            .iter()
            .map(|info| LockInDevice::new(Self::describe(info), info.port_name.clone()))
            .collect())
    }

    /// Serial ports that look like a Teensy running the lock-in firmware.
    pub fn get_available_devices() -> Result<Vec<LockInDevice>, ConnectorError> {
        Ok(Self::filter_devices(serialport::available_ports()?))
    }

    fn filter_devices(ports: Vec<SerialPortInfo>) -> Vec<LockInDevice> {
        ports
            .into_iter()
            .filter(Self::is_lockin)
            .map(|info| LockInDevice::new(Self::describe(&info), info.port_name))
            .collect()
    }

    fn get_device_port() -> Result<String, ConnectorError> {
        log::debug!("Searching for a lock-in device");

        Self::get_available_devices()?
            .into_iter()
            .next()
            .map(|device| device.port)
            .ok_or(ConnectorError::DeviceNotFound)
    }
}
