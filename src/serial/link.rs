use std::io::{Read, Write};
use std::time::Duration;

use log::{debug, trace};
use serialport::{SerialPort, SerialPortType};
use thiserror::Error;

use crate::config::SerialConfig;
use crate::constants::common;

#[derive(Debug, Error)]
pub enum SerialError {
    #[error("failed to open serial port {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },

    #[error("failed to enumerate serial ports: {0}")]
    Enumerate(#[source] serialport::Error),

    #[error("serial I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Text channel to the microcontroller.
pub struct SerialLink<P> {
    name: String,
    port: P,
    pending: Vec<u8>,
}

impl SerialLink<Box<dyn SerialPort>> {
    pub fn open(config: &SerialConfig) -> Result<Self, SerialError> {
        let port = serialport::new(config.port.as_str(), config.baud_rate)
            .timeout(Duration::from_millis(config.timeout_ms))
            .open()
            .map_err(|source| SerialError::Open {
                port: config.port.clone(),
                source,
            })?;
        let name = port.name().unwrap_or_else(|| config.port.clone());
        Ok(Self::new(name, port))
    }
}

impl<P: Read + Write> SerialLink<P> {
    pub fn new(name: impl Into<String>, port: P) -> Self {
        Self {
            name: name.into(),
            port,
            pending: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn into_inner(self) -> P {
        self.port
    }

    /// Discards up to `max_bytes` of stale input. Returns how much was dropped.
    pub fn clear_input(&mut self, max_bytes: usize) -> usize {
        let mut discard_buffer = vec![0u8; common::SERIAL_READ_SIZE];
        let mut total_bytes_read = self.pending.len();
        self.pending.clear();

        while total_bytes_read < max_bytes {
            match self.port.read(&mut discard_buffer) {
                Ok(0) => break,
                Ok(bytes_read) => total_bytes_read += bytes_read,
                Err(e) => {
                    if !is_timeout(&e) {
                        debug!("stopped clearing {}: {}", self.name, e);
                    }
                    break;
                }
            }
        }
        total_bytes_read
    }

    /// Writes the whole text and flushes.
    pub fn send(&mut self, text: &str) -> Result<(), SerialError> {
        trace!("-> {:?}", text);
        self.port.write_all(text.as_bytes())?;
        self.port.flush()?;
        Ok(())
    }

    /// Reads one line, newline included.
    ///
    /// On timeout whatever arrived so far is returned, or `None` if nothing
    /// did. Bytes past the newline are kept for the next call.
    pub fn read_line(&mut self) -> Result<Option<Vec<u8>>, SerialError> {
        let mut read_buffer = [0u8; common::SERIAL_READ_SIZE];
        loop {
            if let Some(end) = self.pending.iter().position(|&b| b == b'\n') {
                let rest = self.pending.split_off(end + 1);
                return Ok(Some(std::mem::replace(&mut self.pending, rest)));
            }
            if self.pending.len() >= common::MAX_LINE_LENGTH {
                return Ok(Some(std::mem::take(&mut self.pending)));
            }

            match self.port.read(&mut read_buffer) {
                Ok(n) if n > 0 => self.pending.extend_from_slice(&read_buffer[..n]),
                Ok(_) => return Ok(self.take_partial()),
                Err(ref e) if is_timeout(e) => return Ok(self.take_partial()),
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn take_partial(&mut self) -> Option<Vec<u8>> {
        if self.pending.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.pending))
        }
    }
}

fn is_timeout(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
    )
}

/// A serial port as shown by `--list-ports`.
#[derive(Debug, Clone, PartialEq)]
pub struct PortSummary {
    pub name: String,
    pub description: String,
}

pub fn list_ports() -> Result<Vec<PortSummary>, SerialError> {
    let ports = serialport::available_ports().map_err(SerialError::Enumerate)?;
    Ok(ports
        .into_iter()
        .map(|port| PortSummary {
            description: describe(&port.port_type),
            name: port.port_name,
        })
        .collect())
}

fn describe(port_type: &SerialPortType) -> String {
    match port_type {
        SerialPortType::UsbPort(usb) => {
            let product = usb.product.as_deref().unwrap_or("USB device");
            match usb.manufacturer.as_deref() {
                Some(maker) => format!("{} - {} ({:04x}:{:04x})", product, maker, usb.vid, usb.pid),
                None => format!("{} ({:04x}:{:04x})", product, usb.vid, usb.pid),
            }
        }
        SerialPortType::PciPort => "PCI".to_string(),
        SerialPortType::BluetoothPort => "Bluetooth".to_string(),
        SerialPortType::Unknown => "unknown".to_string(),
    }
}
