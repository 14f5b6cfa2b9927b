//! Error types for marshalling operations

use crate::accessor::AccessError;
use crate::path::ParamPath;
use progcall_interface::{DiagnosticMessage, InterfaceError};
use thiserror::Error;

/// Result type for marshalling operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while marshalling, invoking or unmarshalling a program call
#[derive(Error, Debug)]
pub enum Error {
    /// Missing program binding, or caller and remote layouts disagree
    #[error("Schema error: {message}")]
    Schema { message: String },

    /// A declared field could not be read or written on the object graph
    #[error("Access error at {path}: {source}")]
    Access {
        path: String,
        #[source]
        source: AccessError,
    },

    /// Array nesting deeper than the supported number of dimensions
    #[error("Array nesting too deep at {path}: at most {max} array dimensions are supported")]
    PathDepth { path: String, max: usize },

    /// Object-side sequence shorter than the declared array size
    #[error("Index {position} out of range at {path}: sequence holds {len} of {declared} declared elements")]
    Index {
        path: String,
        position: usize,
        len: usize,
        declared: usize,
    },

    /// The remote program reported diagnostic messages; `text` holds them one per line
    #[error("{text}")]
    RemoteProgram { program: String, text: String },

    /// Session acquisition or release failed
    #[error("Session error: {0}")]
    Session(#[source] InterfaceError),

    /// The parameter document rejected a read, write or call
    #[error("Document error: {0}")]
    Document(#[source] InterfaceError),
}

impl Error {
    /// Create a schema error with a message
    pub fn schema<S: Into<String>>(message: S) -> Self {
        Error::Schema {
            message: message.into(),
        }
    }

    /// Attach the parameter path to an accessor failure
    pub fn access(path: &ParamPath, source: AccessError) -> Self {
        Error::Access {
            path: path.to_string(),
            source,
        }
    }

    /// Aggregate host messages, one per line in the order received
    pub fn remote_program(program: impl Into<String>, messages: &[DiagnosticMessage]) -> Self {
        let text = messages
            .iter()
            .map(|m| m.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        Error::RemoteProgram {
            program: program.into(),
            text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_program_joins_messages_in_order() {
        let messages = vec![DiagnosticMessage::new("A"), DiagnosticMessage::new("B")];
        let err = Error::remote_program("PGM", &messages);
        assert_eq!(err.to_string(), "A\nB");
        assert!(matches!(err, Error::RemoteProgram { ref program, .. } if program == "PGM"));
    }

    #[test]
    fn test_schema_error() {
        let err = Error::schema("no binding");
        assert_eq!(err.to_string(), "Schema error: no binding");
    }

    #[test]
    fn test_access_error_carries_path() {
        let path = ParamPath::root("PGM").extend("CNT");
        let err = Error::access(&path, AccessError::NoSuchField("count".to_string()));
        let msg = err.to_string();
        assert!(msg.contains("PGM.CNT"));
        assert!(msg.contains("count"));
    }
}
