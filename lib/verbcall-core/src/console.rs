use std::future::IntoFuture;

use tokio::task::JoinHandle;

use crate::client::{VerbClient, VerbTransport};
use crate::dispatch::{CallDispatcher, CallOutcome, Submission};
use crate::editor::{
    Diagnostic, DiagnosticsHost, EditorBinding, EditorBuffer, SchemaDiagnostics, Selection,
};
use crate::faker::SchemaFaker;
use crate::presenter::{DisplayHandle, DisplayState};
use crate::verb::VerbDescriptor;

/// The verb console: select a verb, edit its request, submit it, look at the result.
///
/// ```rust,no_run
/// use verbcall_core::{VerbClient, VerbConsole, VerbDescriptor, VerbRef};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = VerbClient::builder().build()?;
/// let mut console = VerbConsole::new(client);
///
/// let echo = VerbDescriptor::new(VerbRef::new("echo", "echo"))
///     .with_request_schema(r#"{"type":"object","properties":{"name":{"type":"string"}}}"#);
/// console.select_verb(&echo);
/// console.set_buffer_text(r#"{"name":"sam"}"#);
///
/// let outcome = console.submit().await;
/// println!("{outcome:?}");
/// # Ok(())
/// # }
/// ```
///
/// The console must be created inside a tokio runtime: the display state is
/// owned by a background task.
#[derive(Debug)]
pub struct VerbConsole<T = VerbClient, H = SchemaDiagnostics>
where
    H: DiagnosticsHost,
{
    editor: EditorBinding<H>,
    dispatcher: CallDispatcher<T>,
    display: DisplayHandle,
}

impl<T> VerbConsole<T, SchemaDiagnostics>
where
    T: VerbTransport + 'static,
{
    /// Creates a console validating buffers with `jsonschema`.
    ///
    /// # Panics
    ///
    /// Panics when called outside of a tokio runtime.
    pub fn new(transport: T) -> Self {
        Self::with_parts(transport, SchemaDiagnostics::new(), SchemaFaker::new())
    }

    /// Diagnostics of the current buffer.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let buffer = self.editor.buffer();
        self.editor.host().diagnose(buffer.path(), buffer.text())
    }
}

impl<T, H> VerbConsole<T, H>
where
    T: VerbTransport + 'static,
    H: DiagnosticsHost,
{
    /// Creates a console on a custom diagnostics host and faker.
    ///
    /// # Panics
    ///
    /// Panics when called outside of a tokio runtime.
    pub fn with_parts(transport: T, host: H, faker: SchemaFaker) -> Self {
        Self {
            editor: EditorBinding::mount(host, faker),
            dispatcher: CallDispatcher::new(transport),
            display: DisplayHandle::spawn(),
        }
    }

    /// Selects a verb, see [`EditorBinding::select`].
    pub fn select_verb(&mut self, descriptor: &VerbDescriptor) -> Selection {
        self.editor.select(descriptor)
    }

    /// The selected verb.
    pub fn selected(&self) -> Option<&VerbDescriptor> {
        self.editor.selected()
    }

    /// The request buffer.
    pub fn buffer(&self) -> &EditorBuffer {
        self.editor.buffer()
    }

    /// Replaces the request text.
    pub fn set_buffer_text(&mut self, text: impl Into<String>) {
        self.editor.set_text(text);
    }

    /// Warnings raised for the selected verb.
    pub fn warnings(&self) -> &[String] {
        self.editor.warnings()
    }

    /// The diagnostics host.
    pub fn host(&self) -> &H {
        self.editor.host()
    }

    /// The transport.
    pub fn transport(&self) -> &T {
        self.dispatcher.transport()
    }

    /// Submits the current buffer to the selected verb.
    ///
    /// The display is cleared right away; the call happens when the returned
    /// [`Submission`] is awaited.
    pub fn submit(&self) -> Submission<T> {
        let verb = self
            .editor
            .selected()
            .map(|descriptor| descriptor.verb.clone())
            .unwrap_or_default();
        Submission::new(
            self.dispatcher.clone(),
            self.display.sender(),
            verb,
            self.editor.buffer().text().to_string(),
        )
    }

    /// Submits in a background task.
    ///
    /// The task is never cancelled: it updates the display even after a verb
    /// switch.
    pub fn submit_detached(&self) -> JoinHandle<CallOutcome> {
        tokio::spawn(self.submit().into_future())
    }

    /// The current display state.
    pub async fn display_state(&self) -> DisplayState {
        self.display.snapshot().await
    }
}
