use std::time::Duration;
use serialport::{DataBits, Parity, SerialPortType, StopBits};
use tokio::time::timeout;

use super::{Result, SerialDeviceInfo, SerialError, SerialLink};

// HC-06 modules ship configured for 9600 8N1
pub const DEFAULT_BAUD_RATE: u32 = 9600;
pub const DEFAULT_RESPONSE_TIMEOUT_MS: u64 = 2000;
// The module sends no terminator, so a reply ends once the line stays quiet this long
pub const DEFAULT_QUIET_PERIOD_MS: u64 = 100;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Line settings used when opening a physical port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSettings {
    pub baud_rate: u32,
    pub parity: Parity,
}

impl Default for LineSettings {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            parity: Parity::None,
        }
    }
}

pub struct SerialInterface {
    link: Option<Box<dyn SerialLink>>,
    port_name: Option<String>,
    // Only set for physical ports
    line_settings: Option<LineSettings>,
    response_timeout_ms: u64,
    quiet_period_ms: u64,
}

impl SerialInterface {
    pub fn new() -> Self {
        Self {
            link: None,
            port_name: None,
            line_settings: None,
            response_timeout_ms: DEFAULT_RESPONSE_TIMEOUT_MS,
            quiet_period_ms: DEFAULT_QUIET_PERIOD_MS,
        }
    }

    /// Wrap an already open link, such as a mock or a virtual module.
    pub fn from_link(link: Box<dyn SerialLink>) -> Self {
        let mut interface = Self::new();
        interface.link = Some(link);
        interface.port_name = Some("virtual".to_string());
        interface
    }

    pub fn with_timing(mut self, response_timeout_ms: u64, quiet_period_ms: u64) -> Self {
        self.response_timeout_ms = response_timeout_ms;
        self.quiet_period_ms = quiet_period_ms;
        self
    }

    /// List every serial port the OS reports.
    pub fn discover_ports() -> Result<Vec<SerialDeviceInfo>> {
        let ports = serialport::available_ports()?;
        let mut devices = Vec::new();

        for port in ports {
            let mut device = SerialDeviceInfo {
                port_name: port.port_name.clone(),
                vid: None,
                pid: None,
                serial_number: None,
                manufacturer: None,
                product: None,
            };
            if let SerialPortType::UsbPort(usb_info) = port.port_type {
                device.vid = Some(usb_info.vid);
                device.pid = Some(usb_info.pid);
                device.serial_number = usb_info.serial_number;
                device.manufacturer = usb_info.manufacturer;
                device.product = usb_info.product;
            }
            devices.push(device);
        }

        Ok(devices)
    }

    /// Open a physical serial port.
    pub fn open_port(port_name: &str, settings: LineSettings) -> Result<Box<dyn serialport::SerialPort>> {
        let known = serialport::available_ports()?
            .iter()
            .any(|p| p.port_name == port_name);
        if !known {
            log::debug!("{} not listed by the OS, trying to open it anyway", port_name);
        }

        serialport::new(port_name, settings.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(settings.parity)
            .stop_bits(StopBits::One)
            .timeout(Duration::from_millis(1000))
            .open()
            .map_err(|e| match e.kind() {
                serialport::ErrorKind::NoDevice => SerialError::PortNotFound(port_name.to_string()),
                _ => SerialError::ConnectionFailed(e.to_string()),
            })
    }

    /// Connect to a module on a physical port
    pub fn connect(&mut self, port_name: &str, settings: LineSettings) -> Result<()> {
        let port = Self::open_port(port_name, settings)?;
        self.link = Some(Box::new(port));
        self.port_name = Some(port_name.to_string());
        self.line_settings = Some(settings);

        log::info!("Connected to {} at {} baud", port_name, settings.baud_rate);
        Ok(())
    }

    /// Reopen the physical port with new line settings.
    ///
    /// Returns `false` without touching the link when it is not a physical
    /// port.
    pub fn reopen(&mut self, settings: LineSettings) -> Result<bool> {
        let Some(port_name) = self.port_name.clone().filter(|_| self.line_settings.is_some()) else {
            log::debug!("Link has no line settings, not reopening");
            return Ok(false);
        };

        self.link = None;
        self.connect(&port_name, settings)?;
        Ok(true)
    }

    pub fn line_settings(&self) -> Option<LineSettings> {
        self.line_settings
    }

    /// Disconnect from the current module
    pub fn disconnect(&mut self) {
        if let Some(name) = &self.port_name {
            log::info!("Disconnecting from {}", name);
        }
        self.link = None;
        self.port_name = None;
        self.line_settings = None;
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    pub fn port_name(&self) -> Option<&str> {
        self.port_name.as_deref()
    }

    fn link_mut(&mut self) -> Result<&mut Box<dyn SerialLink>> {
        self.link
            .as_mut()
            .ok_or(SerialError::ConnectionFailed("Not connected".to_string()))
    }

    /// Send raw bytes to the connected module
    pub async fn send_data(&mut self, data: &[u8]) -> Result<usize> {
        let link = self.link_mut()?;
        link.write_all(data)?;
        Ok(data.len())
    }

    /// Read whatever arrives within `timeout_ms`, waiting for at least one byte
    pub async fn read_data(&mut self, buffer: &mut [u8], timeout_ms: u64) -> Result<usize> {
        let link = self.link_mut()?;

        let read_operation = poll_read(&mut **link, buffer);

        timeout(Duration::from_millis(timeout_ms), read_operation)
            .await
            .map_err(|_| SerialError::Timeout)?
    }

    /// Send a command and collect the reply.
    ///
    /// No line terminator is sent. The first reply byte is awaited for the
    /// response timeout; after that the reply is complete once the line has
    /// been quiet for the quiet period.
    pub async fn send_command(&mut self, command: &str) -> Result<String> {
        log::debug!("TX: {}", command);
        self.send_data(command.as_bytes()).await?;

        // Chunks are trimmed one by one, so a reply split across writes
        // loses the line endings between its pieces.
        let mut response = String::new();
        let mut buffer = [0u8; 256];

        let bytes_read = self.read_data(&mut buffer, self.response_timeout_ms).await?;
        response.push_str(String::from_utf8_lossy(&buffer[..bytes_read]).trim());

        loop {
            match self.read_data(&mut buffer, self.quiet_period_ms).await {
                Ok(n) => response.push_str(String::from_utf8_lossy(&buffer[..n]).trim()),
                Err(SerialError::Timeout) => break,
                Err(e) => return Err(e),
            }
        }

        log::debug!("RX: {}", response);
        Ok(response)
    }
}

async fn poll_read(link: &mut dyn SerialLink, buffer: &mut [u8]) -> Result<usize> {
    while link.bytes_available()? == 0 {
        tokio::time::sleep(POLL_INTERVAL).await;
    }

    let mut total_read = 0;
    while total_read < buffer.len() && link.bytes_available()? > 0 {
        buffer[total_read] = link.read_byte()?;
        total_read += 1;
    }
    Ok(total_read)
}

impl Default for SerialInterface {
    fn default() -> Self {
        Self::new()
    }
}
