/// Errors raised by the remote-call channel.
///
/// Every variant is surfaced to the user as the failure text of the call.
#[derive(Debug, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum TransportError {
    /// HTTP client error from the underlying reqwest library.
    ///
    /// Occurs when the endpoint cannot be reached or the connection breaks.
    ReqwestError(reqwest::Error),

    /// URL parsing error when building the call URL.
    UrlError(url::ParseError),

    /// Invalid HTTP header name.
    InvalidHeaderName(http::header::InvalidHeaderName),

    /// Invalid HTTP header value.
    InvalidHeaderValue(http::header::InvalidHeaderValue),

    /// The endpoint URL cannot be used as a base URL.
    #[display("Invalid endpoint '{endpoint}': cannot be a base URL")]
    #[from(skip)]
    InvalidEndpoint {
        /// The rejected endpoint.
        endpoint: String,
    },

    /// The response envelope is not a `Call` response.
    #[display("Failed to deserialize JSON at '{path}': {error}\n{body}")]
    #[from(skip)]
    JsonError {
        /// Location of the failure inside the envelope.
        path: String,
        /// The underlying JSON parsing error.
        error: serde_json::Error,
        /// The response body that failed to parse.
        body: String,
    },

    /// The endpoint answered with a Connect error.
    #[display("Call failed with status {status} [{code}]: {message}")]
    #[from(skip)]
    RpcError {
        /// HTTP status code.
        status: u16,
        /// Connect error code, e.g. `unavailable`.
        code: String,
        /// Connect error message, or the raw body.
        message: String,
    },
}
