use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Reference to a remote verb: the `(module, name)` pair.
///
/// Both parts are optional. An incomplete reference is still sent as-is,
/// rejecting it is the remote endpoint's responsibility.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VerbRef {
    /// Module declaring the verb.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    /// Verb name inside the module.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl VerbRef {
    /// Creates a complete reference.
    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: Some(module.into()),
            name: Some(name.into()),
        }
    }

    /// The module part, or an empty string.
    pub fn module(&self) -> &str {
        self.module.as_deref().unwrap_or_default()
    }

    /// The name part, or an empty string.
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    /// Whether both parts are present.
    pub fn is_complete(&self) -> bool {
        self.module.is_some() && self.name.is_some()
    }
}

/// Formats as `module.name`, absent parts render empty.
impl Display for VerbRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module(), self.name())
    }
}

/// Error returned when a `module.name` reference cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Error, derive_more::Display)]
#[display("Invalid verb reference '{input}', expected 'module.name'")]
pub struct ParseVerbRefError {
    /// The rejected input.
    pub input: String,
}

impl FromStr for VerbRef {
    type Err = ParseVerbRefError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let Some((module, name)) = input.split_once('.') else {
            return Err(ParseVerbRefError {
                input: input.to_string(),
            });
        };
        if module.is_empty() || name.is_empty() || name.contains('.') {
            return Err(ParseVerbRefError {
                input: input.to_string(),
            });
        }
        Ok(Self::new(module, name))
    }
}

/// A verb as published by the remote side: its identity and its request schema.
///
/// The identity is the [`VerbRef`], two descriptors with the same identity are
/// interchangeable whatever their schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerbDescriptor {
    /// Identity of the verb.
    pub verb: VerbRef,
    /// JSON Schema text of the request, if the verb declares one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_schema: Option<String>,
}

impl VerbDescriptor {
    /// Creates a descriptor without request schema.
    pub fn new(verb: VerbRef) -> Self {
        Self {
            verb,
            request_schema: None,
        }
    }

    /// Sets the request schema text.
    #[must_use]
    pub fn with_request_schema(mut self, schema: impl Into<String>) -> Self {
        self.request_schema = Some(schema.into());
        self
    }

    /// The identity of this verb.
    pub fn identity(&self) -> &VerbRef {
        &self.verb
    }

    /// Whether both descriptors denote the same verb.
    pub fn same_identity(&self, other: &Self) -> bool {
        self.verb == other.verb
    }
}
