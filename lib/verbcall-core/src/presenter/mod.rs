//! Maps call outcomes to what the console displays.

use crate::dispatch::CallOutcome;

pub(crate) mod channel;
pub use self::channel::DisplayHandle;

/// The result area of the console: a success payload, an error, or nothing.
///
/// Both slots are never set together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayState {
    success: Option<String>,
    error: Option<String>,
}

impl DisplayState {
    /// The displayed success payload.
    pub fn success(&self) -> Option<&str> {
        self.success.as_deref()
    }

    /// The displayed error message.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether nothing is displayed.
    pub fn is_empty(&self) -> bool {
        self.success.is_none() && self.error.is_none()
    }

    /// Displays a success payload, clearing any error.
    pub fn set_success(&mut self, payload: impl Into<String>) {
        self.success = Some(payload.into());
        self.error = None;
    }

    /// Displays an error, clearing any success payload.
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.success = None;
        self.error = Some(message.into());
    }

    /// Displays nothing.
    pub fn clear(&mut self) {
        self.success = None;
        self.error = None;
    }

    /// Terminal rendering: the payload as-is, or the error prefixed with `Error: `.
    pub fn render(&self) -> String {
        match (&self.success, &self.error) {
            (Some(payload), _) => payload.clone(),
            (None, Some(message)) => format!("Error: {message}"),
            (None, None) => String::new(),
        }
    }
}

/// Computes the display state of an optional outcome.
pub fn present(outcome: Option<&CallOutcome>) -> DisplayState {
    let mut state = DisplayState::default();
    match outcome {
        Some(CallOutcome::Success { payload }) => state.set_success(payload.as_str()),
        Some(CallOutcome::Failure { message }) => state.set_error(message.as_str()),
        None => {}
    }
    state
}

impl From<Option<&CallOutcome>> for DisplayState {
    fn from(outcome: Option<&CallOutcome>) -> Self {
        present(outcome)
    }
}
