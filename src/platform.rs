//! Where the car shows up as a serial device on each operating system.
//!
//! The car pairs over Bluetooth serial, so on Linux it is an `rfcomm` device
//! and on macOS a `tty.<name>-Port` device. On Windows it is a plain COM port.

use std::fmt::Display;

use tracing::debug;

use crate::error::Error;

/// The operating system families we know device paths for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Platform {
    /// `/dev/rfcomm{port}`
    Linux,

    /// `/dev/tty.{port}-Port`
    MacOs,

    /// `\\.\COM{port}`
    Windows,

    /// Anything else, by its `std::env::consts::OS` name.
    Other(String),
}

impl Platform {
    /// The platform this binary was built for.
    pub fn current() -> Self {
        Self::from_os_name(std::env::consts::OS)
    }

    /// Map an OS name as found in `std::env::consts::OS`.
    pub fn from_os_name(os: &str) -> Self {
        match os {
            "linux" => Self::Linux,
            "macos" => Self::MacOs,
            "windows" => Self::Windows,
            other => Self::Other(other.to_string()),
        }
    }

    /// The device path for the given port identifier.
    ///
    /// The identifier is a number on Linux and Windows,
    /// and the paired device's name on macOS.
    pub fn device_path(&self, port: impl Display) -> Result<String, Error> {
        let path = match self {
            Self::Linux => format!("/dev/rfcomm{port}"),
            Self::MacOs => format!("/dev/tty.{port}-Port"),
            Self::Windows => format!(r"\\.\COM{port}"),
            Self::Other(os) => return Err(Error::UnsupportedPlatform(os.clone())),
        };

        debug!(platform = %self, %path, "Resolved device path");

        Ok(path)
    }
}

impl Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Linux => write!(f, "linux"),
            Platform::MacOs => write!(f, "macos"),
            Platform::Windows => write!(f, "windows"),
            Platform::Other(os) => write!(f, "{os}"),
        }
    }
}

/// Names of the serial ports the operating system currently knows about.
pub fn available_ports() -> Result<Vec<String>, Error> {
    let ports = tokio_serial::available_ports()
        .map_err(|e| crate::serial::error::ConnectionError::Io(e.into()))?;

    Ok(ports.into_iter().map(|info| info.port_name).collect())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn linux() {
        assert_eq!(Platform::Linux.device_path(0).unwrap(), "/dev/rfcomm0");
        assert_eq!(Platform::Linux.device_path(12).unwrap(), "/dev/rfcomm12");
    }

    #[test]
    fn macos() {
        assert_eq!(
            Platform::MacOs.device_path("Formula-AllCode").unwrap(),
            "/dev/tty.Formula-AllCode-Port"
        );
        assert_eq!(Platform::MacOs.device_path(3).unwrap(), "/dev/tty.3-Port");
    }

    #[test]
    fn windows() {
        assert_eq!(Platform::Windows.device_path(4).unwrap(), r"\\.\COM4");
        assert_eq!(Platform::Windows.device_path(4).unwrap(), "\\\\.\\COM4");
    }

    #[test]
    fn other_platforms_are_unsupported() {
        let err = Platform::Other("freebsd".into()).device_path(1).unwrap_err();

        assert!(matches!(err, Error::UnsupportedPlatform(os) if os == "freebsd"));
    }

    #[test]
    fn os_names() {
        assert_eq!(Platform::from_os_name("linux"), Platform::Linux);
        assert_eq!(Platform::from_os_name("macos"), Platform::MacOs);
        assert_eq!(Platform::from_os_name("windows"), Platform::Windows);
        assert_eq!(
            Platform::from_os_name("haiku"),
            Platform::Other("haiku".into())
        );
    }
}
