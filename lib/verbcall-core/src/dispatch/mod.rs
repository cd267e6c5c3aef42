//! One remote call per submission.
//!
//! The [`CallDispatcher`] sends the buffer text untouched and turns whatever
//! happens into a [`CallOutcome`]: it never returns an error.

use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::client::{CallRequest, CallResponse, VerbTransport};
use crate::presenter::channel::{DisplayMessage, DisplaySender};
use crate::verb::VerbRef;

/// The resolution of a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    /// The verb answered, the payload is re-indented JSON.
    Success {
        /// JSON text with 2-space indentation.
        payload: String,
    },
    /// The verb failed, or the call did not complete.
    Failure {
        /// Message displayed as-is.
        message: String,
    },
}

impl CallOutcome {
    /// Whether the call succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// A success body that cannot be displayed.
#[derive(Debug, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum DecodeError {
    /// The body is not UTF-8.
    #[display("Invalid UTF-8 in response body: {_0}")]
    Utf8(std::str::Utf8Error),

    /// The body is not JSON.
    #[display("Invalid JSON in response body: {_0}")]
    Json(serde_json::Error),
}

/// Decodes a success body and re-serializes it like
/// `JSON.stringify(JSON.parse(text), null, 2)`: 2-space indentation, key
/// order kept, numbers in their ECMAScript form.
///
/// # Errors
///
/// Fails if the bytes are not UTF-8 JSON.
pub fn decode_payload(bytes: &[u8]) -> Result<String, DecodeError> {
    let text = std::str::from_utf8(bytes)?;
    let value = serde_json::from_str::<Value>(text)?;
    let payload = crate::json::to_string_pretty(&value)?;
    Ok(payload)
}

/// Executes calls on a [`VerbTransport`].
#[derive(Debug)]
pub struct CallDispatcher<T> {
    transport: Arc<T>,
}

impl<T> Clone for CallDispatcher<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T> CallDispatcher<T>
where
    T: VerbTransport,
{
    /// Creates a dispatcher.
    pub fn new(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Calls the verb with the text as body.
    ///
    /// Absent verb parts and invalid JSON are sent as-is, the remote side
    /// rejects them.
    pub async fn dispatch(&self, verb: &VerbRef, text: &str) -> CallOutcome {
        let request = CallRequest::new(verb.clone(), text);
        info!(%verb, body_size = text.len(), "calling verb");

        let outcome = match self.transport.call(request).await {
            Ok(CallResponse::Body(bytes)) => match decode_payload(&bytes) {
                Ok(payload) => CallOutcome::Success { payload },
                Err(error) => CallOutcome::Failure {
                    message: error.to_string(),
                },
            },
            Ok(CallResponse::Error(error)) => CallOutcome::Failure {
                message: error.message,
            },
            Err(error) => {
                warn!(%verb, %error, "call failed");
                CallOutcome::Failure {
                    message: error.to_string(),
                }
            }
        };

        info!(%verb, success = outcome.is_success(), "verb called");
        outcome
    }
}

/// A pending submission.
///
/// The display was already cleared when it was created. Await it to perform
/// the call: the outcome is returned and presented.
#[derive(Debug)]
#[must_use = "a submission does nothing unless awaited or spawned"]
pub struct Submission<T> {
    dispatcher: CallDispatcher<T>,
    display: DisplaySender,
    verb: VerbRef,
    text: String,
}

impl<T> Submission<T>
where
    T: VerbTransport,
{
    pub(crate) fn new(
        dispatcher: CallDispatcher<T>,
        display: DisplaySender,
        verb: VerbRef,
        text: String,
    ) -> Self {
        display.send(DisplayMessage::Clear);
        Self {
            dispatcher,
            display,
            verb,
            text,
        }
    }
}

impl<T> IntoFuture for Submission<T>
where
    T: VerbTransport + 'static,
{
    type Output = CallOutcome;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move {
            let Self {
                dispatcher,
                display,
                verb,
                text,
            } = self;
            let outcome = dispatcher.dispatch(&verb, &text).await;
            display.send(DisplayMessage::Present(outcome.clone()));
            outcome
        })
    }
}
