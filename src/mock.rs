//! A mock car, useful to test the protocol without the actual robot.
//!
//! The mock sits on the far end of an in-memory pipe.
//! It records every line it receives and answers verbs with scripted replies.

use std::{
    collections::{HashMap, VecDeque},
    time::Duration,
};

use futures::{channel::mpsc, StreamExt};
use tokio::{
    io::{duplex, AsyncWriteExt, DuplexStream},
    task::JoinHandle,
};
use tokio_util::codec::FramedRead;
use tracing::{debug, info_span, trace, warn, Instrument};

use crate::{channel::CommandChannel, command::Verb, serial::codecs::lines::LinesCodec};

const PIPE_CAPACITY: usize = 64 * 1024;

/// What the mock car answers to a single command.
#[derive(Debug, Clone, Default)]
pub struct Reply {
    delay: Duration,
    lines: Vec<String>,
}

impl Reply {
    /// Answer with a single integer.
    pub fn value(value: i32) -> Self {
        Self::lines([value.to_string()])
    }

    /// Answer with these lines, in order.
    pub fn lines<S: Into<String>>(lines: impl IntoIterator<Item = S>) -> Self {
        Self {
            delay: Duration::ZERO,
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// Say nothing at all.
    pub fn silence() -> Self {
        Self::default()
    }

    /// Wait this long before answering.
    #[must_use]
    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Builder for a [`MockCar`].
#[derive(Debug, Default)]
pub struct MockCarBuilder {
    replies: HashMap<Verb, VecDeque<Reply>>,
    stale: Vec<String>,
}

impl MockCarBuilder {
    /// A car which answers nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply to the next unanswered `verb`.
    ///
    /// Each received command of that verb uses up one queued reply.
    /// Once the queue is empty the verb is met with silence.
    pub fn reply(mut self, verb: Verb, reply: Reply) -> Self {
        self.replies.entry(verb).or_default().push_back(reply);
        self
    }

    /// Lines which are already waiting to be read when the channel is handed out.
    pub fn stale_lines<S: Into<String>>(mut self, lines: impl IntoIterator<Item = S>) -> Self {
        self.stale.extend(lines.into_iter().map(Into::into));
        self
    }

    /// Start the mock.
    ///
    /// Returns an open channel connected to it, and the handle to inspect it with.
    pub async fn build(self) -> (CommandChannel<DuplexStream>, MockCar) {
        let (ours, mut theirs) = duplex(PIPE_CAPACITY);

        for line in &self.stale {
            if let Err(e) = theirs.write_all(format!("{line}\n").as_bytes()).await {
                warn!(?e, "Could not pre-buffer stale line");
            }
        }

        let (received_tx, received_rx) = mpsc::unbounded();
        let handle = tokio::spawn(
            run(theirs, self.replies, received_tx).instrument(info_span!("mock-car")),
        );

        (
            CommandChannel::from_device("mock", ours),
            MockCar {
                received: received_rx,
                handle,
            },
        )
    }
}

async fn run(
    device: DuplexStream,
    mut replies: HashMap<Verb, VecDeque<Reply>>,
    received: mpsc::UnboundedSender<String>,
) {
    let (reader, mut writer) = tokio::io::split(device);
    let mut lines = FramedRead::new(reader, LinesCodec::new());

    while let Some(line) = lines.next().await {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(?e, "Mock car read error, exiting");
                break;
            }
        };

        trace!(%line, "Mock car received");

        let verb = line
            .split(' ')
            .next()
            .and_then(|verb| verb.parse::<Verb>().ok());

        if received.unbounded_send(line).is_err() {
            trace!("Nobody is inspecting the mock car");
        }

        let Some(reply) = verb.and_then(|verb| replies.get_mut(&verb)?.pop_front()) else {
            continue;
        };

        if !reply.delay.is_zero() {
            tokio::time::sleep(reply.delay).await;
        }

        for line in reply.lines {
            if let Err(e) = writer.write_all(format!("{line}\n").as_bytes()).await {
                warn!(?e, "Mock car write error, exiting");
                return;
            }
        }
    }

    debug!("Mock car stopped");
}

/// Handle to a running mock car.
#[derive(Debug)]
pub struct MockCar {
    received: mpsc::UnboundedReceiver<String>,
    handle: JoinHandle<()>,
}

impl MockCar {
    /// Await the next line the car received, without its newline.
    ///
    /// `None` once the car has stopped and every line was taken.
    pub async fn next_line(&mut self) -> Option<String> {
        self.received.next().await
    }

    /// The next received line, if one is ready.
    pub fn try_next_line(&mut self) -> Option<String> {
        self.received.try_recv().ok()
    }

    /// Whether the mock has stopped, which happens when the channel closes.
    pub fn is_stopped(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for MockCar {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
