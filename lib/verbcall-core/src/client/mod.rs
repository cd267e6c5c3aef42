//! The remote-call channel.
//!
//! Verbs are invoked with a unary `VerbService.Call` using the Connect
//! protocol and its JSON codec. The channel is abstracted by [`VerbTransport`],
//! [`VerbClient`] is the HTTP implementation.

use std::future::Future;

use http::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use tracing::debug;
use url::Url;

mod builder;
pub use self::builder::VerbClientBuilder;

mod error;
pub use self::error::TransportError;

mod wire;
use self::wire::ConnectError;
pub use self::wire::{CallError, CallRequest, CallResponse};

/// Endpoint used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8892";

/// Path of the `Call` procedure, relative to the endpoint.
pub const CALL_PATH: &str = "xyz.block.ftl.v1.VerbService/Call";

const CONNECT_PROTOCOL_VERSION: &str = "connect-protocol-version";

const BODY_MAX_LENGTH: usize = 1024;

/// A channel able to invoke a verb.
///
/// Implementations return the two-variant response of the remote side, or a
/// [`TransportError`] when no such response is available.
pub trait VerbTransport: Send + Sync {
    /// Performs one unary call.
    fn call(
        &self,
        request: CallRequest,
    ) -> impl Future<Output = Result<CallResponse, TransportError>> + Send;
}

/// Connect client of the `VerbService`.
#[derive(Debug, Clone)]
pub struct VerbClient {
    client: reqwest::Client,
    endpoint: Url,
    call_url: Url,
    headers: HeaderMap,
}

impl VerbClient {
    /// Creates a builder, see [`VerbClientBuilder`].
    pub fn builder() -> VerbClientBuilder {
        VerbClientBuilder::default()
    }

    /// The configured endpoint.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// The full URL of the `Call` procedure.
    pub fn call_url(&self) -> &Url {
        &self.call_url
    }
}

impl VerbTransport for VerbClient {
    async fn call(&self, request: CallRequest) -> Result<CallResponse, TransportError> {
        debug!(verb = %request.verb, url = %self.call_url, body_size = request.body.len(), "sending...");
        let response = self
            .client
            .post(self.call_url.clone())
            .headers(self.headers.clone())
            .header(CONTENT_TYPE, HeaderValue::from_str(mime::APPLICATION_JSON.as_ref())?)
            .header(CONNECT_PROTOCOL_VERSION, HeaderValue::from_static("1"))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        debug!(%status, "...receiving");
        let body = response.text().await?;

        if !status.is_success() {
            let ConnectError { code, message } =
                serde_json::from_str::<ConnectError>(&body).unwrap_or_else(|_| ConnectError {
                    code: status
                        .canonical_reason()
                        .unwrap_or("unknown")
                        .to_lowercase(),
                    message: truncate(&body),
                });
            return Err(TransportError::RpcError {
                status: status.as_u16(),
                code,
                message,
            });
        }

        let deserializer = &mut serde_json::Deserializer::from_str(&body);
        serde_path_to_error::deserialize(deserializer).map_err(|err| TransportError::JsonError {
            path: err.path().to_string(),
            error: err.into_inner(),
            body: truncate(&body),
        })
    }
}

fn truncate(body: &str) -> String {
    if body.chars().count() > BODY_MAX_LENGTH {
        let head = body.chars().take(BODY_MAX_LENGTH).collect::<String>();
        format!("{head}... (truncated)")
    } else {
        body.to_string()
    }
}
