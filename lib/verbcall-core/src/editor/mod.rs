//! The editable request buffer and its schema diagnostics.
//!
//! An [`EditorBinding`] owns the buffer of the selected verb and keeps exactly
//! one schema registration on its [`DiagnosticsHost`]:
//!
//! - selecting another verb regenerates the buffer from the faker and replaces
//!   the registration,
//! - selecting the same verb with another schema only replaces the registration,
//!   the user edits are kept,
//! - a verb without schema gets an empty buffer and no registration,
//! - dropping the binding releases the host.

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde_json::Value;
use tracing::{debug, warn};

use crate::faker::{FakerError, SchemaFaker};
use crate::verb::{VerbDescriptor, VerbRef};

mod diagnostics;
pub use self::diagnostics::{
    Diagnostic, DiagnosticsHost, DiagnosticsOptions, SchemaDiagnostics, SchemaRegistration,
};

/// The request text being edited, and the model path it is bound to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorBuffer {
    text: String,
    path: String,
}

impl EditorBuffer {
    /// The buffer text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The model path of the selected verb, see [`model_path`].
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// What changed on a [`EditorBinding::select`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Another verb: the buffer was regenerated.
    IdentityChanged,
    /// Same verb, another schema: only the diagnostics were replaced.
    SchemaChanged,
    /// Nothing to do.
    Unchanged,
}

/// Characters escaped in each part of a model path.
const PATH_PART: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'.')
    .add(b'/')
    .add(b'?')
    .add(b'~');

/// Marks an absent module or name in a model path.
const ABSENT_PART: &str = "~";

/// The model path of a verb: `module.name`, each part percent-encoded.
///
/// A dot inside a part is escaped, so `("a.b", "c")` and `("a", "b.c")` get
/// distinct paths. An absent part is written `~`, an empty one stays empty.
pub fn model_path(verb: &VerbRef) -> String {
    let part = |value: Option<&str>| {
        value.map_or_else(
            || ABSENT_PART.to_string(),
            |value| utf8_percent_encode(value, PATH_PART).to_string(),
        )
    };
    format!("{}.{}", part(verb.module.as_deref()), part(verb.name.as_deref()))
}

/// The synthetic schema URI of a verb.
pub fn schema_uri(verb: &VerbRef) -> String {
    format!("verbcall://schemas/{}.json", model_path(verb))
}

/// Binds the request buffer to the schema of the selected verb.
#[derive(Debug)]
pub struct EditorBinding<H>
where
    H: DiagnosticsHost,
{
    host: H,
    faker: SchemaFaker,
    selected: Option<VerbDescriptor>,
    buffer: EditorBuffer,
    warnings: Vec<String>,
}

impl<H> EditorBinding<H>
where
    H: DiagnosticsHost,
{
    /// Acquires the host, with validation on and no registration yet.
    pub fn mount(mut host: H, faker: SchemaFaker) -> Self {
        host.set_diagnostics_options(DiagnosticsOptions {
            validate: true,
            schemas: vec![],
        });
        Self {
            host,
            faker,
            selected: None,
            buffer: EditorBuffer::default(),
            warnings: vec![],
        }
    }

    /// Selects a verb.
    ///
    /// The buffer is only regenerated when the verb identity differs from the
    /// previous selection.
    pub fn select(&mut self, descriptor: &VerbDescriptor) -> Selection {
        let selection = match &self.selected {
            Some(previous) if previous.same_identity(descriptor) => {
                if previous.request_schema == descriptor.request_schema {
                    Selection::Unchanged
                } else {
                    Selection::SchemaChanged
                }
            }
            _ => Selection::IdentityChanged,
        };
        debug!(verb = %descriptor.verb, ?selection, "verb selected");

        match selection {
            Selection::Unchanged => {}
            Selection::SchemaChanged => {
                self.warnings.clear();
                self.register(descriptor);
            }
            Selection::IdentityChanged => {
                self.warnings.clear();
                self.buffer = EditorBuffer {
                    text: self.fake_text(descriptor),
                    path: model_path(&descriptor.verb),
                };
                self.register(descriptor);
            }
        }
        self.selected = Some(descriptor.clone());

        selection
    }

    /// The selected verb.
    pub fn selected(&self) -> Option<&VerbDescriptor> {
        self.selected.as_ref()
    }

    /// The current buffer.
    pub fn buffer(&self) -> &EditorBuffer {
        &self.buffer
    }

    /// Replaces the buffer text, like a user edit.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.buffer.text = text.into();
    }

    /// The diagnostics host.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Warnings raised for the selected verb (e.g. an unusable schema).
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    fn fake_text(&mut self, descriptor: &VerbDescriptor) -> String {
        match self.faker.fake_request(descriptor.request_schema.as_deref()) {
            Ok(text) => text,
            // reported by `register`
            Err(FakerError::SchemaParse(_)) => String::new(),
            Err(error) => {
                warn!(verb = %descriptor.verb, %error, "cannot generate an example request");
                self.warnings.push(error.to_string());
                String::new()
            }
        }
    }

    fn register(&mut self, descriptor: &VerbDescriptor) {
        let schema = descriptor
            .request_schema
            .as_deref()
            .and_then(|text| match serde_json::from_str::<Value>(text) {
                Ok(schema) => Some(schema),
                Err(error) => {
                    warn!(verb = %descriptor.verb, %error, "request schema is not JSON, no diagnostics");
                    self.warnings.push(FakerError::SchemaParse(error).to_string());
                    None
                }
            });

        let schemas = schema
            .map(|schema| SchemaRegistration {
                uri: schema_uri(&descriptor.verb),
                file_match: vec![model_path(&descriptor.verb)],
                schema,
            })
            .into_iter()
            .collect();

        self.host.set_diagnostics_options(DiagnosticsOptions {
            validate: true,
            schemas,
        });
    }
}

impl<H> Drop for EditorBinding<H>
where
    H: DiagnosticsHost,
{
    fn drop(&mut self) {
        debug!("release diagnostics host");
        self.host
            .set_diagnostics_options(DiagnosticsOptions::default());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    const ECHO_SCHEMA: &str = r##"{
        "$ref": "#/definitions/echo.EchoRequest",
        "definitions": {
            "echo.EchoRequest": {
                "type": "object",
                "properties": { "name": { "type": "string" } },
                "required": []
            }
        }
    }"##;

    /// Records every options pushed to the host.
    #[derive(Debug, Clone, Default)]
    struct RecordingHost {
        calls: Arc<Mutex<Vec<DiagnosticsOptions>>>,
    }

    impl RecordingHost {
        fn calls(&self) -> Vec<DiagnosticsOptions> {
            self.calls.lock().expect("lock").clone()
        }

        fn last_uris(&self) -> Vec<String> {
            self.calls()
                .last()
                .map(|options| {
                    options
                        .schemas
                        .iter()
                        .map(|registration| registration.uri.clone())
                        .collect()
                })
                .unwrap_or_default()
        }
    }

    impl DiagnosticsHost for RecordingHost {
        fn set_diagnostics_options(&mut self, options: DiagnosticsOptions) {
            self.calls.lock().expect("lock").push(options);
        }
    }

    fn echo() -> VerbDescriptor {
        VerbDescriptor::new(VerbRef::new("echo", "echo")).with_request_schema(ECHO_SCHEMA)
    }

    fn binding() -> (EditorBinding<RecordingHost>, RecordingHost) {
        let host = RecordingHost::default();
        let binding = EditorBinding::mount(host.clone(), SchemaFaker::with_seed(42));
        (binding, host)
    }

    #[test]
    fn should_fake_buffer_on_selection() {
        let (mut binding, host) = binding();

        let selection = binding.select(&echo());

        assert_eq!(selection, Selection::IdentityChanged);
        assert_eq!(binding.buffer().path(), "echo.echo");
        let document = serde_json::from_str::<Value>(binding.buffer().text()).expect("json");
        assert!(document["name"].is_string());
        insta::assert_debug_snapshot!(host.last_uris(), @r#"
        [
            "verbcall://schemas/echo.echo.json",
        ]
        "#);
    }

    #[test]
    fn should_leave_buffer_empty_without_schema() {
        let (mut binding, host) = binding();
        binding.select(&echo());

        binding.select(&VerbDescriptor::new(VerbRef::new("db", "insert")));

        assert_eq!(binding.buffer().text(), "");
        assert_eq!(binding.buffer().path(), "db.insert");
        assert!(host.last_uris().is_empty());
    }

    #[test]
    fn should_keep_edits_on_same_selection() {
        let (mut binding, host) = binding();
        binding.select(&echo());
        binding.set_text(r#"{"name":"sam"}"#);
        let calls = host.calls().len();

        let selection = binding.select(&echo());

        assert_eq!(selection, Selection::Unchanged);
        assert_eq!(binding.buffer().text(), r#"{"name":"sam"}"#);
        assert_eq!(host.calls().len(), calls);
    }

    #[test]
    fn should_keep_edits_on_schema_only_change() {
        let (mut binding, host) = binding();
        binding.select(&echo());
        binding.set_text(r#"{"name":"sam"}"#);

        let updated = VerbDescriptor::new(VerbRef::new("echo", "echo"))
            .with_request_schema(r#"{"type":"object","required":["name"]}"#);
        let selection = binding.select(&updated);

        assert_eq!(selection, Selection::SchemaChanged);
        assert_eq!(binding.buffer().text(), r#"{"name":"sam"}"#);
        let last = host.calls().pop().expect("registration replaced");
        assert_eq!(last.schemas.len(), 1);
        assert_eq!(
            last.schemas[0].schema,
            serde_json::json!({"type":"object","required":["name"]})
        );
    }

    #[test]
    fn should_lose_edits_when_switching_back() {
        let (mut binding, _host) = binding();
        binding.select(&echo());
        binding.set_text(r#"{"name":"edited"}"#);

        binding.select(&VerbDescriptor::new(VerbRef::new("db", "insert")));
        binding.select(&echo());

        assert_ne!(binding.buffer().text(), r#"{"name":"edited"}"#);
        assert!(!binding.buffer().text().is_empty());
    }

    #[test]
    fn should_warn_on_invalid_schema() {
        let (mut binding, host) = binding();

        let broken = VerbDescriptor::new(VerbRef::new("echo", "broken")).with_request_schema("{ nope");
        binding.select(&broken);

        assert_eq!(binding.buffer().text(), "");
        assert_eq!(binding.warnings().len(), 1);
        assert!(host.last_uris().is_empty());

        binding.select(&echo());
        assert!(binding.warnings().is_empty());
    }

    #[test]
    fn should_replace_warnings_on_schema_only_change() {
        let (mut binding, host) = binding();
        binding.select(&echo());
        binding.set_text(r#"{"name":"sam"}"#);

        let broken = VerbDescriptor::new(VerbRef::new("echo", "echo")).with_request_schema("{ nope");
        let selection = binding.select(&broken);

        assert_eq!(selection, Selection::SchemaChanged);
        assert_eq!(binding.buffer().text(), r#"{"name":"sam"}"#);
        assert_eq!(binding.warnings().len(), 1);
        assert!(binding.warnings()[0].starts_with("Invalid request schema"));
        assert!(host.last_uris().is_empty());

        let selection = binding.select(&echo());

        assert_eq!(selection, Selection::SchemaChanged);
        assert!(binding.warnings().is_empty());
        assert_eq!(host.last_uris().len(), 1);
    }

    #[test]
    fn should_escape_dots_in_model_path() {
        let left = VerbRef::new("a.b", "c");
        let right = VerbRef::new("a", "b.c");

        assert_ne!(model_path(&left), model_path(&right));
        assert_ne!(schema_uri(&left), schema_uri(&right));
        assert_eq!(model_path(&left), "a%2Eb.c");
        assert_eq!(model_path(&right), "a.b%2Ec");
    }

    #[test]
    fn should_keep_absent_part_apart_from_empty_part() {
        let absent = VerbRef {
            module: None,
            name: Some("echo".to_string()),
        };
        let empty = VerbRef::new("", "echo");
        let tilde = VerbRef::new("~", "echo");

        assert_eq!(model_path(&absent), "~.echo");
        assert_eq!(model_path(&empty), ".echo");
        assert_eq!(model_path(&tilde), "%7E.echo");
    }

    #[test]
    fn should_register_colliding_display_names_under_distinct_uris() {
        let (mut binding, host) = binding();
        let left = VerbDescriptor::new(VerbRef::new("a.b", "c"))
            .with_request_schema(r#"{"type":"object"}"#);
        let right = VerbDescriptor::new(VerbRef::new("a", "b.c"))
            .with_request_schema(r#"{"type":"object"}"#);

        binding.select(&left);
        let first = host.last_uris();
        let first_path = binding.buffer().path().to_string();
        binding.select(&right);

        assert_ne!(host.last_uris(), first);
        assert_ne!(binding.buffer().path(), first_path);
        let last = host.calls().pop().expect("registration");
        assert_eq!(
            last.schemas[0].file_match,
            vec![binding.buffer().path().to_string()]
        );
    }

    #[test]
    fn should_acquire_and_release_host() {
        let (binding, host) = binding();
        assert_eq!(
            host.calls(),
            vec![DiagnosticsOptions {
                validate: true,
                schemas: vec![]
            }]
        );

        drop(binding);

        assert_eq!(host.calls().last(), Some(&DiagnosticsOptions::default()));
    }

    #[test]
    fn should_keep_a_single_registration() {
        let (mut binding, host) = binding();
        let time = VerbDescriptor::new(VerbRef::new("time", "time"))
            .with_request_schema(r#"{"type":"object"}"#);

        binding.select(&echo());
        binding.select(&time);

        assert!(host.calls().iter().all(|options| options.schemas.len() <= 1));
        insta::assert_debug_snapshot!(host.last_uris(), @r#"
        [
            "verbcall://schemas/time.time.json",
        ]
        "#);
    }
}
