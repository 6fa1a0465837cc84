#![allow(dead_code)]

use std::time::Duration;

use allcode_link::{
    channel::CommandChannel,
    mock::{MockCar, MockCarBuilder},
};
use color_eyre::Result;
use tokio::{io::DuplexStream, time::timeout};
use tracing::Level;

#[macro_export]
macro_rules! assert_no_response {
    ($result:expr, $verb:path, $attempts:expr) => {
        match $result {
            Err(allcode_link::error::Error::NoResponse { verb, attempts }) => {
                assert_eq!(verb, $verb);
                assert_eq!(attempts, $attempts);
            }
            other => panic!("Expected no response, got {other:?}"),
        }
    };
}

pub async fn start(builder: MockCarBuilder) -> (CommandChannel<DuplexStream>, MockCar) {
    allcode_link::logging::init(Level::DEBUG, None).await;

    builder.build().await
}

pub async fn start_silent() -> (CommandChannel<DuplexStream>, MockCar) {
    start(MockCarBuilder::new()).await
}

/// The next line the mock car got.
pub async fn received(car: &mut MockCar) -> Result<String> {
    timeout(Duration::from_secs(5), car.next_line())
        .await?
        .ok_or_else(|| color_eyre::eyre::eyre!("Mock car stopped"))
}

/// The next `n` lines the mock car got.
pub async fn received_n(car: &mut MockCar, n: usize) -> Result<Vec<String>> {
    let mut lines = Vec::with_capacity(n);
    for _ in 0..n {
        lines.push(received(car).await?);
    }
    Ok(lines)
}
