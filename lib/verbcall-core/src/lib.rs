//! # Verbcall Core
//!
//! Pick a remote verb, get a schema-valid example request, edit it, call the
//! verb and look at the result.
//!
//! The crate is made of four components, composed by the [`VerbConsole`]:
//!
//! - **[`SchemaFaker`]** generates an example request from the verb JSON Schema,
//! - **[`EditorBinding`](editor::EditorBinding)** keeps the schema diagnostics of the
//!   request buffer scoped to the selected verb,
//! - **[`CallDispatcher`]** performs the call and turns the response into a [`CallOutcome`],
//! - **[`present`]** maps the outcome to a [`DisplayState`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use verbcall_core::{VerbCatalog, VerbClient, VerbConsole, VerbRef};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = VerbCatalog::load("verbs.json")?;
//! let echo = catalog.descriptor(&"echo.echo".parse::<VerbRef>()?)?;
//!
//! let client = VerbClient::builder()
//!     .with_endpoint("http://127.0.0.1:8892".parse()?)
//!     .build()?;
//! let mut console = VerbConsole::new(client);
//!
//! // The buffer starts with a generated request
//! console.select_verb(&echo);
//! println!("{}", console.buffer().text());
//!
//! // Diagnostics are informational, the call is sent anyway
//! for diagnostic in console.diagnostics() {
//!     eprintln!("{diagnostic}");
//! }
//!
//! console.submit().await;
//! println!("{}", console.display_state().await.render());
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing against a stub service
//!
//! See [`test_server`] to start a verb service per test and get a console
//! connected to it.

mod catalog;
mod client;
mod console;
mod dispatch;
pub mod editor;
mod error;
mod faker;
mod json;
mod presenter;
mod verb;

pub mod test_server;

pub use self::catalog::{CatalogModule, CatalogVerb, SchemaSource, VerbCatalog};
pub use self::client::{
    CALL_PATH, CallError, CallRequest, CallResponse, DEFAULT_ENDPOINT, TransportError,
    VerbClient, VerbClientBuilder, VerbTransport,
};
pub use self::console::VerbConsole;
pub use self::dispatch::{CallDispatcher, CallOutcome, DecodeError, Submission, decode_payload};
pub use self::editor::{Diagnostic, EditorBuffer, Selection};
pub use self::error::ConsoleError;
pub use self::faker::{FakerError, FakerOptions, SchemaFaker};
pub use self::presenter::{DisplayHandle, DisplayState, present};
pub use self::verb::{ParseVerbRefError, VerbDescriptor, VerbRef};
