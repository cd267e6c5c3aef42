//! Run a console against a verb service started by the test.
//!
//! [`TestConsole`] binds a random local port, launches a [`TestServer`] on it,
//! waits until it is healthy and derefs to a [`VerbConsole`] targeting it. The
//! server task is aborted when the console is dropped.
//!
//! ```rust,no_run
//! use std::net::TcpListener;
//!
//! use verbcall_core::test_server::{TestConsole, TestServer};
//! use verbcall_core::{VerbDescriptor, VerbRef};
//!
//! #[derive(Debug)]
//! struct EchoService;
//!
//! impl TestServer for EchoService {
//!     async fn launch(&self, listener: TcpListener) {
//!         // serve the verbs
//!     }
//! }
//!
//! #[tokio::test]
//! async fn should_echo() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut console = TestConsole::start(EchoService).await?;
//!
//!     console.select_verb(&VerbDescriptor::new(VerbRef::new("echo", "echo")));
//!     console.set_buffer_text(r#"{"name":"sam"}"#);
//!     let outcome = console.submit().await;
//!     assert!(outcome.is_success());
//!     Ok(())
//! }
//! ```

use std::net::{Ipv4Addr, SocketAddr, TcpListener};
use std::sync::Arc;

use backon::{ExponentialBuilder, Retryable};
use tracing::{debug, error};
use url::Url;

use crate::client::VerbClient;
use crate::console::VerbConsole;

mod error;
pub use self::error::*;

mod server;
pub use self::server::*;

/// A [`VerbConsole`] connected to a test server.
#[derive(Debug, derive_more::Deref, derive_more::DerefMut)]
pub struct TestConsole<T> {
    local_addr: SocketAddr,
    #[deref]
    #[deref_mut]
    console: VerbConsole,
    handle: Option<tokio::task::JoinHandle<()>>,
    #[allow(dead_code)]
    test_server: Arc<T>,
}

impl<T> TestConsole<T>
where
    T: TestServer + Send + Sync + 'static,
{
    /// Starts the server and waits until it is healthy.
    ///
    /// # Errors
    ///
    /// Fails if the port cannot be bound or the server never gets healthy.
    pub async fn start(test_server: T) -> Result<Self, TestAppError> {
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, 0));
        let listener = TcpListener::bind(addr)?;
        let local_addr = listener.local_addr()?;

        let test_server = Arc::new(test_server);
        let handle = tokio::spawn({
            let server = Arc::clone(&test_server);
            async move {
                server.launch(listener).await;
            }
        });

        let TestServerConfig {
            client,
            min_backoff_delay,
            max_backoff_delay,
            backoff_jitter,
            max_retry_attempts,
        } = test_server.config();

        let endpoint = Url::parse(&format!("http://{local_addr}"))?;
        let client = client
            .unwrap_or_else(VerbClient::builder)
            .with_endpoint(endpoint)
            .build()?;

        let mut backoff = ExponentialBuilder::default()
            .with_min_delay(min_backoff_delay)
            .with_max_delay(max_backoff_delay)
            .with_max_times(max_retry_attempts);
        if backoff_jitter {
            backoff = backoff.with_jitter();
        }

        let healthy = Self::wait_for_health(&test_server, &client, local_addr, backoff).await;
        if !healthy {
            handle.abort();
            return Err(TestAppError::UnhealthyServer {
                timeout: max_backoff_delay,
            });
        }

        Ok(Self {
            local_addr,
            console: VerbConsole::new(client),
            handle: Some(handle),
            test_server,
        })
    }

    /// Address of the test server.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    async fn wait_for_health(
        test_server: &Arc<T>,
        client: &VerbClient,
        local_addr: SocketAddr,
        backoff: ExponentialBuilder,
    ) -> bool {
        let health_check = || {
            let server = Arc::clone(test_server);
            async move {
                match server.is_healthy(client).await {
                    HealthStatus::Healthy => {
                        debug!("🟢 server healthy");
                        Ok(true)
                    }
                    HealthStatus::Unhealthy => {
                        debug!("🟠 server not yet healthy, retrying");
                        Err(std::io::Error::new(
                            std::io::ErrorKind::ConnectionRefused,
                            "Server not healthy yet",
                        ))
                    }
                    HealthStatus::Uncheckable => {
                        let connection = tokio::net::TcpStream::connect(local_addr).await;
                        if let Err(err) = &connection {
                            error!(?err, %local_addr, "Oops, fail to establish connection");
                        }
                        connection.map(|_| true)
                    }
                }
            }
        };

        health_check.retry(backoff).await.unwrap_or(false)
    }
}

impl<T> Drop for TestConsole<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
