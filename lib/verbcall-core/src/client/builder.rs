use http::header::{HeaderMap, HeaderName, HeaderValue};
use url::Url;

use super::{CALL_PATH, DEFAULT_ENDPOINT, TransportError, VerbClient};

/// Builder of a [`VerbClient`].
///
/// ```rust
/// use verbcall_core::VerbClient;
///
/// let client = VerbClient::builder()
///     .with_endpoint("http://ftl.internal:8892".parse()?)
///     .with_header("authorization", "Bearer secret")?
///     .build()?;
///
/// assert_eq!(
///     client.call_url().as_str(),
///     "http://ftl.internal:8892/xyz.block.ftl.v1.VerbService/Call"
/// );
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct VerbClientBuilder {
    client: Option<reqwest::Client>,
    endpoint: Option<Url>,
    headers: HeaderMap,
}

impl VerbClientBuilder {
    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Fails if the endpoint cannot be used as a base URL.
    pub fn build(self) -> Result<VerbClient, TransportError> {
        let Self {
            client,
            endpoint,
            headers,
        } = self;

        let mut endpoint = match endpoint {
            Some(endpoint) => endpoint,
            None => Url::parse(DEFAULT_ENDPOINT)?,
        };
        if endpoint.cannot_be_a_base() {
            return Err(TransportError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
            });
        }
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }
        let call_url = endpoint.join(CALL_PATH)?;

        Ok(VerbClient {
            client: client.unwrap_or_default(),
            endpoint,
            call_url,
            headers,
        })
    }

    /// Sets the endpoint, `http://127.0.0.1:8892` by default.
    pub fn with_endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Adds a header sent with every call.
    ///
    /// # Errors
    ///
    /// Fails on an invalid header name or value.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, TransportError> {
        self.headers.insert(
            HeaderName::from_bytes(name.as_bytes())?,
            HeaderValue::from_str(value)?,
        );
        Ok(self)
    }

    /// Uses a preconfigured reqwest client (proxy, TLS, timeouts...).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }
}
