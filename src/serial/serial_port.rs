use std::time::Duration;

use tokio::runtime::Handle;
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, info};

use crate::serial::error::ConnectionError;

/// The car only ever talks at this rate.
pub const BAUD: u32 = 115_200;

/// How long a single read attempt may wait for a line.
pub const READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Open the device at `path` as 115200-8-N-1 without flow control.
///
/// Fails with [`ConnectionError::NoRuntime`] outside a tokio runtime.
pub(crate) fn open(path: &str) -> Result<SerialStream, ConnectionError> {
    if Handle::try_current().is_err() {
        return Err(ConnectionError::NoRuntime);
    }

    debug!(%path, baud = BAUD, "Opening port");

    let stream = tokio_serial::new(path, BAUD)
        .data_bits(tokio_serial::DataBits::Eight)
        .parity(tokio_serial::Parity::None)
        .stop_bits(tokio_serial::StopBits::One)
        .flow_control(tokio_serial::FlowControl::None)
        .timeout(READ_TIMEOUT)
        .open_native_async()
        .map_err(|source| ConnectionError::Open {
            path: path.to_string(),
            source,
        })?;

    info!(%path, "Connected to serial port");

    Ok(stream)
}
