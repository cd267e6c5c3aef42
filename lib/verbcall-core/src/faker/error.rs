/// Errors raised while generating an example document from a JSON Schema.
#[derive(Debug, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum FakerError {
    /// The schema text is not valid JSON.
    #[display("Invalid request schema: {_0}")]
    SchemaParse(serde_json::Error),

    /// A `$ref` points outside of the schema document or to a missing location.
    #[display("Unresolved schema reference '{reference}'")]
    #[from(skip)]
    UnresolvedReference {
        /// The reference as written in the schema.
        reference: String,
    },

    /// The schema constraints contradict each other.
    #[display("Unsatisfiable schema: {reason}")]
    #[from(skip)]
    Unsatisfiable {
        /// Description of the contradiction.
        reason: String,
    },

    /// Required properties keep referencing each other past the depth limit.
    #[display("Schema recursion exceeds depth {depth}")]
    #[from(skip)]
    RecursionLimit {
        /// The depth reached.
        depth: usize,
    },

    /// The generated document could not be serialized.
    #[display("Fail to serialize generated document: {_0}")]
    #[from(skip)]
    Serialization(serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_faker_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<FakerError>();
        assert_sync::<FakerError>();
    }

    #[test]
    fn test_faker_error_display() {
        let error = FakerError::UnresolvedReference {
            reference: "#/definitions/missing".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Unresolved schema reference '#/definitions/missing'"
        );
    }
}
