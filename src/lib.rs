#![deny(missing_docs)]

//! Talk to a Formula allCode robot car over its serial link.
//!
//! The car understands newline terminated ASCII commands such as `ReadIR 3`
//! or `Forwards 500`.
//! Some commands are answered with a single line holding an integer.
//! There is no framing beyond newlines and no correlation between commands
//! and replies, so stale input is flushed before each request.
//!
//! ```no_run
//! # async fn drive() -> Result<(), allcode_link::error::Error> {
//! let mut car = allcode_link::car::Car::new();
//! car.open(0)?;
//!
//! if car.read_ir(2).await? < 1000 {
//!     car.forwards(200).await?;
//! }
//!
//! car.close().await?;
//! # Ok(())
//! # }
//! ```
//!
//! A [`mock`] car is available to try the protocol without the hardware.

/// The command channel owning the serial connection.
pub mod channel;

/// Every command the car understands.
pub mod car;

/// Commands as they go on the wire.
pub mod command;

/// Device paths per operating system.
pub mod platform;

/// Serial port driver.
pub mod serial;

/// A mock car on an in-memory pipe.
pub mod mock;

/// The command line interface.
pub mod cli;

/// Relates to config files.
pub mod config;

/// Possible errors in this library.
pub mod error;

/// Logging/tracing setup.
pub mod logging;
