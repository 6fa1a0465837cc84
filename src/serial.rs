use std::io;

use tokio::io::{AsyncRead, AsyncWrite, DuplexStream};
use tokio_serial::{ClearBuffer, SerialPort, SerialStream};

/// Serial port related errors.
pub mod error;

/// Opening the serial port.
pub(crate) mod serial_port;

/// Codecs for encoding/decoding messages to/from wire.
pub mod codecs {
    /// Newline delimited lines.
    pub mod lines;
}

/// Something a [`crate::channel::CommandChannel`] can talk to.
///
/// A real serial port, or an in-memory pipe for the mock car.
pub trait Device: AsyncRead + AsyncWrite + Unpin + Send {
    /// Throw away anything the operating system has received
    /// but nobody has read yet.
    fn discard_input(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Device for SerialStream {
    fn discard_input(&mut self) -> io::Result<()> {
        self.clear(ClearBuffer::Input).map_err(io::Error::from)
    }
}

impl Device for DuplexStream {}
