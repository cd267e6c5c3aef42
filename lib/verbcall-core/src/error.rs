use crate::client::TransportError;
use crate::verb::ParseVerbRefError;

/// Errors raised while configuring the console: catalog loading, verb lookup,
/// client setup.
///
/// Call-time failures are never reported with this type, they become a
/// [`CallOutcome::Failure`](crate::CallOutcome::Failure).
#[derive(Debug, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum ConsoleError {
    /// I/O error while reading a catalog or a schema.
    IoError(std::io::Error),

    /// The catalog is not valid JSON.
    #[display("Invalid JSON catalog: {_0}")]
    JsonError(serde_json::Error),

    /// The catalog is not valid YAML.
    #[display("Invalid YAML catalog: {error}")]
    #[from(skip)]
    YamlError {
        /// The YAML error description.
        error: String,
    },

    /// The catalog file extension is not supported.
    #[display("Unsupported catalog format '{extension}', expected json, yml or yaml")]
    #[from(skip)]
    UnsupportedFormat {
        /// The file extension.
        extension: String,
    },

    /// Invalid `module.name` reference.
    InvalidVerb(ParseVerbRefError),

    /// The verb is not in the catalog.
    #[display("Unknown verb '{verb}'")]
    #[from(skip)]
    UnknownVerb {
        /// The requested verb.
        verb: String,
    },

    /// The client cannot be built.
    TransportError(TransportError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<ConsoleError>();
        assert_sync::<ConsoleError>();
    }

    #[test]
    fn test_console_error_conversions() {
        let error = ConsoleError::from("echo".parse::<crate::VerbRef>().expect_err("invalid"));
        insta::assert_snapshot!(error, @"Invalid verb reference 'echo', expected 'module.name'");

        let error = ConsoleError::UnknownVerb {
            verb: "echo.missing".to_string(),
        };
        insta::assert_snapshot!(error, @"Unknown verb 'echo.missing'");
    }
}
