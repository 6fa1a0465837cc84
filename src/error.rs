use thiserror::Error;

use crate::{command::Verb, serial::error::ConnectionError};

/// Errors that may occur in this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Device paths are only known for Linux, macOS and Windows.
    #[error("Unsupported platform `{0}`")]
    UnsupportedPlatform(String),

    /// The serial connection failed.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// None of the read attempts produced an integer.
    ///
    /// The car may still be busy, may have failed,
    /// or the reply may have been lost. There is no telling which.
    #[error("No response to `{verb}` after {attempts} attempt(s)")]
    NoResponse {
        /// The command which went unanswered.
        verb: Verb,

        /// How many reads were attempted.
        attempts: u32,
    },

    /// Not a verb the car understands.
    #[error("Unknown verb `{0}`")]
    UnknownVerb(String),

    /// Bad configuration file.
    #[error("The configuration is invalid. Problem: {0}")]
    BadConfig(String),
}

impl Error {
    /// True if this is [`Error::NoResponse`].
    pub fn is_no_response(&self) -> bool {
        matches!(self, Error::NoResponse { .. })
    }

    /// Get the inner config problem, if that's what this is.
    pub fn try_into_bad_config(self) -> Option<String> {
        match self {
            Error::BadConfig(problem) => Some(problem),
            _ => None,
        }
    }
}
