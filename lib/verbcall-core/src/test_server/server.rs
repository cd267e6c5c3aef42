use std::future::Future;
use std::net::TcpListener;
use std::time::Duration;

use crate::client::{VerbClient, VerbClientBuilder};

/// A verb service started for the duration of a test.
///
/// ```rust,no_run
/// use std::net::TcpListener;
///
/// use verbcall_core::test_server::TestServer;
///
/// #[derive(Debug)]
/// struct StubService;
///
/// impl TestServer for StubService {
///     async fn launch(&self, listener: TcpListener) {
///         listener.set_nonblocking(true).expect("set non-blocking");
///         let _listener = tokio::net::TcpListener::from_std(listener).expect("valid listener");
///         // serve `xyz.block.ftl.v1.VerbService/Call` here
///     }
/// }
/// ```
pub trait TestServer {
    /// Serves on the listener until the test ends.
    fn launch(&self, listener: TcpListener) -> impl Future<Output = ()> + Send;

    /// Tells whether the server is ready.
    ///
    /// By default the server is considered ready as soon as it accepts a
    /// TCP connection.
    fn is_healthy(&self, _client: &VerbClient) -> impl Future<Output = HealthStatus> + Send {
        std::future::ready(HealthStatus::Uncheckable)
    }

    /// Test settings.
    fn config(&self) -> TestServerConfig {
        TestServerConfig::default()
    }
}

/// Result of a health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    /// Ready.
    Healthy,
    /// Not ready yet, retry later.
    Unhealthy,
    /// No specific check, wait for a TCP connection.
    Uncheckable,
}

/// Settings of a [`TestConsole`](super::TestConsole).
#[derive(Debug, Clone)]
pub struct TestServerConfig {
    /// Base client configuration, the endpoint is replaced by the test server address.
    pub client: Option<VerbClientBuilder>,
    /// First retry delay of the health check.
    pub min_backoff_delay: Duration,
    /// Maximum retry delay of the health check.
    pub max_backoff_delay: Duration,
    /// Add jitter to the retry delays.
    pub backoff_jitter: bool,
    /// Maximum number of health check retries.
    pub max_retry_attempts: usize,
}

impl Default for TestServerConfig {
    fn default() -> Self {
        Self {
            client: None,
            min_backoff_delay: Duration::from_millis(10),
            max_backoff_delay: Duration::from_secs(1),
            backoff_jitter: true,
            max_retry_attempts: 10,
        }
    }
}
