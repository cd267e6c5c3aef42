use std::fmt::{self, Display};

use jsonschema::Validator;
use serde_json::Value;
use tracing::{debug, warn};

/// A JSON Schema bound to the buffers whose model path matches `file_match`.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaRegistration {
    /// Synthetic URI identifying the schema, unique per verb.
    pub uri: String,
    /// Model paths the schema applies to, `*` matches every path.
    pub file_match: Vec<String>,
    /// The schema document.
    pub schema: Value,
}

impl SchemaRegistration {
    /// Whether this registration applies to the buffer at `path`.
    pub fn applies_to(&self, path: &str) -> bool {
        self.file_match
            .iter()
            .any(|pattern| pattern == "*" || pattern == path)
    }
}

/// The diagnostics configuration pushed to a [`DiagnosticsHost`].
///
/// The default value (no validation, no schema) releases the host.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiagnosticsOptions {
    /// Whether the host validates the buffers at all.
    pub validate: bool,
    /// Active schema registrations.
    pub schemas: Vec<SchemaRegistration>,
}

/// The editor side of the diagnostics binding.
///
/// Each call replaces the whole configuration, registrations never accumulate.
pub trait DiagnosticsHost {
    /// Replaces the diagnostics configuration.
    fn set_diagnostics_options(&mut self, options: DiagnosticsOptions);
}

/// A problem found in a buffer. Purely informational.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The buffer is not JSON.
    Syntax {
        /// 1-based line.
        line: usize,
        /// 1-based column.
        column: usize,
        /// Parser message.
        message: String,
    },
    /// The buffer is JSON but violates the schema.
    Schema {
        /// JSON pointer to the offending value, empty for the root.
        pointer: String,
        /// Validator message.
        message: String,
    },
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax {
                line,
                column,
                message,
            } => write!(f, "{line}:{column}: {message}"),
            Self::Schema { pointer, message } if pointer.is_empty() => write!(f, "/: {message}"),
            Self::Schema { pointer, message } => write!(f, "{pointer}: {message}"),
        }
    }
}

/// A [`DiagnosticsHost`] validating buffers with `jsonschema`.
#[derive(derive_more::Debug, Default)]
pub struct SchemaDiagnostics {
    validate: bool,
    registrations: Vec<SchemaRegistration>,
    #[debug(skip)]
    validators: Vec<Validator>,
}

impl SchemaDiagnostics {
    /// Creates a released host.
    pub fn new() -> Self {
        Self::default()
    }

    /// The active registrations.
    pub fn registrations(&self) -> &[SchemaRegistration] {
        &self.registrations
    }

    /// Whether validation is enabled.
    pub fn is_validating(&self) -> bool {
        self.validate
    }

    /// Diagnoses the buffer at `path`.
    ///
    /// A blank buffer has no diagnostic. Schema violations are only reported
    /// by the registrations matching `path`.
    pub fn diagnose(&self, path: &str, text: &str) -> Vec<Diagnostic> {
        if !self.validate || text.trim().is_empty() {
            return vec![];
        }

        let document = match serde_json::from_str::<Value>(text) {
            Ok(document) => document,
            Err(error) => {
                return vec![Diagnostic::Syntax {
                    line: error.line(),
                    column: error.column(),
                    message: error.to_string(),
                }];
            }
        };

        self.registrations
            .iter()
            .zip(&self.validators)
            .filter(|(registration, _)| registration.applies_to(path))
            .flat_map(|(_, validator)| {
                validator
                    .iter_errors(&document)
                    .map(|error| Diagnostic::Schema {
                        pointer: error.instance_path.to_string(),
                        message: error.to_string(),
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}

impl DiagnosticsHost for SchemaDiagnostics {
    fn set_diagnostics_options(&mut self, options: DiagnosticsOptions) {
        let DiagnosticsOptions { validate, schemas } = options;

        let mut registrations = Vec::with_capacity(schemas.len());
        let mut validators = Vec::with_capacity(schemas.len());
        for registration in schemas {
            match jsonschema::validator_for(&registration.schema) {
                Ok(validator) => {
                    debug!(uri = %registration.uri, "schema registered");
                    validators.push(validator);
                    registrations.push(registration);
                }
                Err(error) => {
                    warn!(uri = %registration.uri, %error, "schema cannot be compiled, ignored");
                }
            }
        }

        self.validate = validate;
        self.registrations = registrations;
        self.validators = validators;
    }
}
