//! Listing of the modules and verbs a console can call.
//!
//! A catalog is a JSON document (or YAML with the `yaml` feature):
//!
//! ```json
//! {
//!   "modules": {
//!     "echo": {
//!       "verbs": {
//!         "echo": {
//!           "requestSchema": {
//!             "type": "object",
//!             "properties": { "name": { "type": "string" } }
//!           }
//!         }
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! A request schema is either an inline JSON value or its JSON text.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::ConsoleError;
use crate::verb::{VerbDescriptor, VerbRef};

/// Modules, by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerbCatalog {
    /// The modules, in declaration order.
    #[serde(default)]
    pub modules: IndexMap<String, CatalogModule>,
}

/// Verbs of a module, by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogModule {
    /// The verbs, in declaration order.
    #[serde(default)]
    pub verbs: IndexMap<String, CatalogVerb>,
}

/// A verb entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogVerb {
    /// JSON Schema of the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_schema: Option<SchemaSource>,
}

/// A request schema, as written in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaSource {
    /// The JSON text of the schema.
    Text(String),
    /// The schema itself.
    Inline(Value),
}

impl SchemaSource {
    /// The schema as JSON text.
    pub fn to_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Inline(value) => value.to_string(),
        }
    }
}

impl VerbCatalog {
    /// Parses a JSON catalog.
    ///
    /// # Errors
    ///
    /// Fails if the text is not a JSON catalog.
    pub fn from_json(text: &str) -> Result<Self, ConsoleError> {
        let catalog = serde_json::from_str(text)?;
        Ok(catalog)
    }

    /// Parses a YAML catalog.
    ///
    /// # Errors
    ///
    /// Fails if the text is not a YAML catalog.
    #[cfg(feature = "yaml")]
    pub fn from_yaml(text: &str) -> Result<Self, ConsoleError> {
        serde_saphyr::from_str(text).map_err(|err| ConsoleError::YamlError {
            error: err.to_string(),
        })
    }

    /// Loads a catalog file, the format is chosen from the extension.
    ///
    /// # Errors
    ///
    /// Fails on I/O errors, unsupported extensions and invalid content.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConsoleError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        debug!(path = %path.display(), %extension, "loading catalog");

        let text = std::fs::read_to_string(path)?;
        match extension.as_str() {
            "json" => Self::from_json(&text),
            #[cfg(feature = "yaml")]
            "yml" | "yaml" => Self::from_yaml(&text),
            _ => Err(ConsoleError::UnsupportedFormat { extension }),
        }
    }

    /// Every verb, in declaration order.
    pub fn descriptors(&self) -> Vec<VerbDescriptor> {
        self.modules
            .iter()
            .flat_map(|(module, entry)| {
                entry
                    .verbs
                    .iter()
                    .map(move |(name, verb)| descriptor(module, name, verb))
            })
            .collect()
    }

    /// The descriptor of a verb.
    ///
    /// # Errors
    ///
    /// Fails if the verb is not in the catalog.
    pub fn descriptor(&self, verb: &VerbRef) -> Result<VerbDescriptor, ConsoleError> {
        self.modules
            .get(verb.module())
            .and_then(|module| module.verbs.get(verb.name()))
            .map(|entry| descriptor(verb.module(), verb.name(), entry))
            .ok_or_else(|| ConsoleError::UnknownVerb {
                verb: verb.to_string(),
            })
    }
}

fn descriptor(module: &str, name: &str, entry: &CatalogVerb) -> VerbDescriptor {
    let descriptor = VerbDescriptor::new(VerbRef::new(module, name));
    match &entry.request_schema {
        Some(schema) => descriptor.with_request_schema(schema.to_text()),
        None => descriptor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"{
        "modules": {
            "echo": {
                "verbs": {
                    "echo": {
                        "requestSchema": {
                            "type": "object",
                            "properties": { "name": { "type": "string" } }
                        }
                    }
                }
            },
            "db": {
                "verbs": {
                    "insert": {},
                    "query": { "requestSchema": "{\"type\":\"object\"}" }
                }
            }
        }
    }"#;

    #[test]
    fn should_list_verbs_in_order() {
        let catalog = VerbCatalog::from_json(CATALOG).expect("valid catalog");

        let verbs = catalog
            .descriptors()
            .iter()
            .map(|descriptor| descriptor.verb.to_string())
            .collect::<Vec<_>>();

        insta::assert_debug_snapshot!(verbs, @r#"
        [
            "echo.echo",
            "db.insert",
            "db.query",
        ]
        "#);
    }

    #[test]
    fn should_resolve_schema_sources() {
        let catalog = VerbCatalog::from_json(CATALOG).expect("valid catalog");

        let echo = catalog
            .descriptor(&VerbRef::new("echo", "echo"))
            .expect("known verb");
        let insert = catalog
            .descriptor(&VerbRef::new("db", "insert"))
            .expect("known verb");
        let query = catalog
            .descriptor(&VerbRef::new("db", "query"))
            .expect("known verb");

        insta::assert_snapshot!(echo.request_schema.unwrap_or_default(), @r#"{"type":"object","properties":{"name":{"type":"string"}}}"#);
        assert_eq!(insert.request_schema, None);
        assert_eq!(query.request_schema.as_deref(), Some(r#"{"type":"object"}"#));
    }

    #[test]
    fn should_reject_unknown_verb() {
        let catalog = VerbCatalog::from_json(CATALOG).expect("valid catalog");

        let result = catalog.descriptor(&VerbRef::new("echo", "missing"));

        assert!(matches!(result, Err(ConsoleError::UnknownVerb { verb }) if verb == "echo.missing"));
    }

    #[test]
    fn should_reject_invalid_json() {
        let result = VerbCatalog::from_json("{ \"modules\": [] }");

        assert!(matches!(result, Err(ConsoleError::JsonError(_))));
    }

    #[test]
    fn should_reject_unknown_extension() {
        let path = std::env::temp_dir().join(format!("catalog-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "").expect("write");

        let result = VerbCatalog::load(&path);
        let _ = std::fs::remove_file(&path);

        assert!(matches!(
            result,
            Err(ConsoleError::UnsupportedFormat { extension }) if extension == "toml"
        ));
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn should_parse_yaml_catalog() {
        let yaml = r#"
modules:
  echo:
    verbs:
      echo:
        requestSchema:
          type: object
          properties:
            name:
              type: string
"#;

        let catalog = VerbCatalog::from_yaml(yaml).expect("valid catalog");

        let echo = catalog
            .descriptor(&VerbRef::new("echo", "echo"))
            .expect("known verb");
        insta::assert_snapshot!(echo.request_schema.unwrap_or_default(), @r#"{"type":"object","properties":{"name":{"type":"string"}}}"#);
    }
}
