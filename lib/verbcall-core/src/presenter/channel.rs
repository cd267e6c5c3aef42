use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use super::DisplayState;
use crate::dispatch::CallOutcome;

/// Messages sent to the display task.
#[derive(Debug)]
pub(crate) enum DisplayMessage {
    /// A submission started.
    Clear,

    /// A submission resolved.
    Present(CallOutcome),

    /// Request the current state.
    Snapshot(oneshot::Sender<DisplayState>),
}

/// Sender of display messages.
///
/// Sending never blocks, so a submission clears the display before its call
/// is even issued.
#[derive(Debug, Clone)]
pub(crate) struct DisplaySender {
    inner: mpsc::UnboundedSender<DisplayMessage>,
}

impl DisplaySender {
    pub(crate) fn send(&self, message: DisplayMessage) {
        if self.inner.send(message).is_err() {
            debug!("display task is gone, message dropped");
        }
    }
}

/// Handle on the task owning the [`DisplayState`].
#[derive(Debug, Clone)]
pub struct DisplayHandle {
    sender: DisplaySender,
}

impl DisplayHandle {
    /// Spawns the display task.
    ///
    /// # Panics
    ///
    /// Panics when called outside of a tokio runtime.
    pub fn spawn() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel::<DisplayMessage>();

        tokio::spawn(display_task(receiver));

        Self {
            sender: DisplaySender { inner: sender },
        }
    }

    pub(crate) fn sender(&self) -> DisplaySender {
        self.sender.clone()
    }

    /// The current state, or an empty state if the task stopped.
    pub async fn snapshot(&self) -> DisplayState {
        let (tx, rx) = oneshot::channel();
        self.sender.send(DisplayMessage::Snapshot(tx));
        rx.await.unwrap_or_default()
    }
}

/// Owns the state until every sender is dropped.
async fn display_task(mut receiver: mpsc::UnboundedReceiver<DisplayMessage>) {
    let mut state = DisplayState::default();

    while let Some(message) = receiver.recv().await {
        match message {
            DisplayMessage::Clear => {
                state.clear();
            }
            DisplayMessage::Present(outcome) => {
                state = super::present(Some(&outcome));
            }
            DisplayMessage::Snapshot(responder) => {
                let _ = responder.send(state.clone());
            }
        }
    }
}
