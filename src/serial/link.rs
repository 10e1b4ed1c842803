use std::io::{Read, Write};

use serialport::SerialPort;

use super::Result;

/// Byte-level view of a serial connection.
///
/// Mirrors how a microcontroller sketch talks to its UART: ask how many bytes
/// are waiting, pull them one at a time, and push replies out verbatim.
pub trait SerialLink: Send {
    /// Number of bytes that can be read right now without blocking.
    fn bytes_available(&mut self) -> Result<usize>;

    /// Read a single byte. Only call after `bytes_available` reported data.
    fn read_byte(&mut self) -> Result<u8>;

    /// Write `data` as-is and flush it.
    fn write_all(&mut self, data: &[u8]) -> Result<()>;
}

impl SerialLink for Box<dyn SerialPort> {
    fn bytes_available(&mut self) -> Result<usize> {
        Ok(self.bytes_to_read()? as usize)
    }

    fn read_byte(&mut self) -> Result<u8> {
        let mut byte = [0u8; 1];
        self.read_exact(&mut byte)?;
        Ok(byte[0])
    }

    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        Write::write_all(self, data)?;
        self.flush()?;
        Ok(())
    }
}

impl SerialLink for Box<dyn SerialLink> {
    fn bytes_available(&mut self) -> Result<usize> {
        (**self).bytes_available()
    }

    fn read_byte(&mut self) -> Result<u8> {
        (**self).read_byte()
    }

    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        (**self).write_all(data)
    }
}
