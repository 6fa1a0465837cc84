use std::io;

use thiserror::Error;

/// Problems with the serial connection itself.
///
/// These are never retried: a command whose write fails is lost.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The device could not be opened.
    /// It might not exist, be in use by someone else, or we lack permissions.
    #[error("Could not open `{path}`")]
    Open {
        /// The device path we tried.
        path: String,

        /// What the serial driver said.
        #[source]
        source: tokio_serial::Error,
    },

    /// IO related errors while reading or writing.
    #[error("Underlying IO problem")]
    Io(#[from] io::Error),

    /// The device stopped producing bytes for good (end of stream).
    #[error("Serial device disconnected")]
    Disconnected,

    /// Serial devices are registered with the tokio reactor,
    /// so they can only be opened from within a runtime.
    #[error("Serial ports must be opened from within a tokio runtime")]
    NoRuntime,

    /// A command was issued on a channel which has no open connection.
    #[error("No connection is open")]
    NotOpen,
}
