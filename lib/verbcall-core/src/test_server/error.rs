use std::time::Duration;

use crate::client::TransportError;

/// Errors raised while starting a [`TestConsole`](super::TestConsole).
#[derive(Debug, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum TestAppError {
    /// The listener cannot be bound.
    IoError(std::io::Error),

    /// The client cannot be built.
    TransportError(TransportError),

    /// The endpoint URL of the test server is invalid.
    UrlError(url::ParseError),

    /// The server never became healthy.
    #[display("Server is not healthy after {timeout:?}")]
    #[from(skip)]
    UnhealthyServer {
        /// The maximum backoff delay used.
        timeout: Duration,
    },
}
