use std::fmt::Display;

use futures::{FutureExt, SinkExt, StreamExt};
use tokio::{io::AsyncWriteExt, time::timeout};
use tokio_serial::SerialStream;
use tokio_util::codec::Framed;
use tracing::{debug, info, trace, warn};

use crate::{
    command::{Command, Verb},
    error::Error,
    platform::Platform,
    serial::{
        codecs::lines::LinesCodec,
        error::ConnectionError,
        serial_port::{self, READ_TIMEOUT},
        Device,
    },
};

/// An open device, framed into lines.
#[derive(Debug)]
struct Connection<D> {
    path: String,
    framed: Framed<D, LinesCodec>,
}

/// Owns (at most) one connection to a car and speaks its line protocol.
///
/// Every operation takes `&mut self`, so there is only ever one
/// command in flight.
/// Dropping the channel closes the device.
///
/// Replies are not correlated with commands in any way.
/// The only thing keeping them aligned is [`CommandChannel::flush_incoming`]
/// before each request.
#[derive(Debug)]
pub struct CommandChannel<D = SerialStream> {
    connection: Option<Connection<D>>,
}

impl<D> Default for CommandChannel<D> {
    fn default() -> Self {
        Self { connection: None }
    }
}

impl CommandChannel<SerialStream> {
    /// A channel with nothing open yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the car's port on the platform we are running on.
    ///
    /// See [`Platform::device_path`] for what `port` means.
    /// Outside a tokio runtime this fails with [`ConnectionError::NoRuntime`].
    pub fn open(&mut self, port: impl Display) -> Result<(), Error> {
        self.open_on(&Platform::current(), port)
    }

    /// Open the car's port as it would be named on `platform`.
    ///
    /// Fails without touching any device if the platform is unsupported.
    pub fn open_on(&mut self, platform: &Platform, port: impl Display) -> Result<(), Error> {
        let path = platform.device_path(port)?;
        self.open_path(&path)
    }

    /// Open an explicit device path, skipping platform resolution.
    ///
    /// An already open connection is dropped first.
    pub fn open_path(&mut self, path: &str) -> Result<(), Error> {
        let stream = serial_port::open(path)?;
        self.attach(path, stream);

        Ok(())
    }
}

impl<D: Device> CommandChannel<D> {
    /// A channel over an already open device.
    pub fn from_device(path: impl Into<String>, device: D) -> Self {
        let mut channel = Self::default();
        channel.attach(path, device);
        channel
    }

    fn attach(&mut self, path: impl Into<String>, device: D) {
        let path = path.into();

        if let Some(previous) = self.connection.take() {
            debug!(path = %previous.path, "Replacing open connection");
        }

        self.connection = Some(Connection {
            path,
            framed: Framed::new(device, LinesCodec::new()),
        });
    }

    fn connection_mut(&mut self) -> Result<&mut Connection<D>, ConnectionError> {
        self.connection.as_mut().ok_or(ConnectionError::NotOpen)
    }

    /// Whether a connection is open.
    pub fn is_open(&self) -> bool {
        self.connection.is_some()
    }

    /// The path of the open device.
    pub fn device_path(&self) -> Option<&str> {
        self.connection.as_ref().map(|c| c.path.as_str())
    }

    /// Shut down and release the connection.
    ///
    /// Closing a channel which is not open does nothing.
    pub async fn close(&mut self) -> Result<(), Error> {
        let Some(connection) = self.connection.take() else {
            trace!("Close on a closed channel");
            return Ok(());
        };

        let Connection { path, framed } = connection;
        let mut device = framed.into_inner();

        device.shutdown().await.map_err(ConnectionError::Io)?;
        info!(%path, "Closed");

        Ok(())
    }

    /// Throw away everything received but not yet read.
    ///
    /// This covers complete lines, a partial trailing line, and whatever
    /// the operating system has queued for the device.
    /// Returns how many complete lines were discarded.
    pub fn flush_incoming(&mut self) -> Result<usize, Error> {
        let connection = self.connection_mut()?;
        let mut discarded = 0;

        loop {
            match connection.framed.next().now_or_never() {
                Some(Some(Ok(line))) => {
                    trace!(%line, "Discarding stale line");
                    discarded += 1;
                }
                Some(Some(Err(e))) => return Err(e.into()),
                Some(None) => return Err(ConnectionError::Disconnected.into()),
                None => break,
            }
        }

        connection.framed.read_buffer_mut().clear();
        *connection.framed.codec_mut() = LinesCodec::new();
        connection
            .framed
            .get_mut()
            .discard_input()
            .map_err(ConnectionError::Io)?;

        if discarded > 0 {
            debug!(discarded, "Flushed stale lines");
        }

        Ok(discarded)
    }

    /// Write a command line. Nothing is awaited from the car.
    pub async fn send_command(&mut self, command: &Command) -> Result<(), Error> {
        let connection = self.connection_mut()?;

        debug!(%command, "Sending");
        connection.framed.send(command).await?;

        Ok(())
    }

    /// Write a command line, then read lines until one parses as an integer.
    ///
    /// Each of the `max_attempts` reads waits at most one second.
    /// A line which is not an integer uses up an attempt, as does silence.
    /// So [`Error::NoResponse`] does not tell a busy car from a failed command.
    pub async fn send_command_and_read_int(
        &mut self,
        command: &Command,
        max_attempts: u32,
    ) -> Result<i32, Error> {
        self.send_command(command).await?;
        self.read_int(command.verb(), max_attempts).await
    }

    async fn read_int(&mut self, verb: Verb, max_attempts: u32) -> Result<i32, Error> {
        let connection = self.connection_mut()?;

        for attempt in 1..=max_attempts {
            match timeout(READ_TIMEOUT, connection.framed.next()).await {
                Ok(Some(Ok(line))) => match parse_reply(&line) {
                    Some(value) => {
                        debug!(%verb, value, attempt, "Reply");
                        return Ok(value);
                    }
                    None => trace!(%verb, %line, attempt, "No return"),
                },
                Ok(Some(Err(e))) => return Err(e.into()),
                Ok(None) => return Err(ConnectionError::Disconnected.into()),
                Err(_) => trace!(%verb, attempt, "No return within read timeout"),
            }
        }

        warn!(%verb, attempts = max_attempts, "Gave up waiting for a reply");

        Err(Error::NoResponse {
            verb,
            attempts: max_attempts,
        })
    }

    /// Flush stale input, send, and wait for an integer within `budget` attempts.
    pub(crate) async fn request(&mut self, command: Command, budget: u32) -> Result<i32, Error> {
        self.flush_incoming()?;
        self.send_command_and_read_int(&command, budget).await
    }

    /// Send without expecting anything back.
    pub(crate) async fn post(&mut self, command: Command) -> Result<(), Error> {
        self.send_command(&command).await
    }
}

fn parse_reply(line: &str) -> Option<i32> {
    line.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tokio::io::{duplex, AsyncReadExt, DuplexStream};

    use super::*;

    fn channel() -> (CommandChannel<DuplexStream>, DuplexStream) {
        let (ours, theirs) = duplex(1024);
        (CommandChannel::from_device("duplex", ours), theirs)
    }

    #[test]
    fn replies() {
        assert_eq!(parse_reply("512"), Some(512));
        assert_eq!(parse_reply(" -7 "), Some(-7));
        assert_eq!(parse_reply("+3"), Some(3));
        assert_eq!(parse_reply(""), None);
        assert_eq!(parse_reply("12abc"), None);
        assert_eq!(parse_reply("1.5"), None);
    }

    #[tokio::test]
    async fn closed_channel_refuses_commands() {
        let mut channel = CommandChannel::<DuplexStream>::default();

        let err = channel
            .send_command(&Command::new(Verb::LCDClear))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Connection(ConnectionError::NotOpen)));

        let err = channel.flush_incoming().unwrap_err();
        assert!(matches!(err, Error::Connection(ConnectionError::NotOpen)));
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let (mut channel, _theirs) = channel();

        assert!(channel.is_open());
        assert_eq!(channel.device_path(), Some("duplex"));

        channel.close().await.unwrap();
        assert!(!channel.is_open());

        channel.close().await.unwrap();
        assert!(!channel.is_open());
    }

    #[tokio::test]
    async fn close_signals_end_of_stream() {
        let (mut channel, mut theirs) = channel();

        channel.close().await.unwrap();

        let mut buf = vec![];
        assert_eq!(theirs.read_to_end(&mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn send_writes_one_line() {
        let (mut channel, mut theirs) = channel();

        channel
            .send_command(&Command::new(Verb::ReadIR).arg(3))
            .await
            .unwrap();

        let mut buf = [0; 9];
        theirs.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"ReadIR 3\n");
    }

    #[tokio::test]
    async fn flush_discards_complete_and_partial_lines() {
        let (mut channel, mut theirs) = channel();

        theirs.write_all(b"1\n2\n3").await.unwrap();

        assert_eq!(channel.flush_incoming().unwrap(), 2);

        // The partial "3" must not glue onto the next reply.
        theirs.write_all(b"40\n").await.unwrap();
        let value = channel.read_int(Verb::ReadMic, 1).await.unwrap();
        assert_eq!(value, 40);
    }

    #[tokio::test]
    async fn flush_with_nothing_pending() {
        let (mut channel, _theirs) = channel();

        assert_eq!(channel.flush_incoming().unwrap(), 0);
    }

    #[tokio::test]
    async fn negative_replies_are_values() {
        let (mut channel, mut theirs) = channel();

        theirs.write_all(b"-1\r\n").await.unwrap();
        let value = channel.read_int(Verb::ReadAxis, 1).await.unwrap();

        assert_eq!(value, -1);
    }

    #[tokio::test]
    async fn hang_up_is_a_connection_error() {
        let (mut channel, theirs) = channel();
        drop(theirs);

        let err = channel.read_int(Verb::ReadLight, 3).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Connection(ConnectionError::Disconnected)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn silence_uses_up_every_attempt() {
        let (mut channel, _theirs) = channel();

        let started = tokio::time::Instant::now();
        let err = channel.read_int(Verb::CardInit, 2).await.unwrap_err();

        assert!(matches!(
            err,
            Error::NoResponse {
                verb: Verb::CardInit,
                attempts: 2
            }
        ));
        assert!(started.elapsed() >= READ_TIMEOUT * 2);
    }
}
