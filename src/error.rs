/*!
 * Error types for progcall
 */

use std::fmt;
use std::io;
use std::path::PathBuf;

use progcall_core_marshal::Error as MarshalError;
use progcall_interface::InterfaceError;

pub type Result<T> = std::result::Result<T, ProgcallError>;

/// Exit code constants for structured process exit
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FATAL: i32 = 2;

/// A failed program or command invocation
///
/// `cause` is whatever stopped the call. When the session could not be
/// released afterwards either, that failure rides along in `release_failure`
/// without replacing the cause.
#[derive(Debug)]
pub struct InvocationError {
    /// Program name or command text
    pub target: String,

    pub cause: MarshalError,

    pub release_failure: Option<InterfaceError>,
}

impl InvocationError {
    pub fn new(target: impl Into<String>, cause: MarshalError) -> Self {
        Self {
            target: target.into(),
            cause,
            release_failure: None,
        }
    }

    pub fn with_release_failure(mut self, failure: InterfaceError) -> Self {
        self.release_failure = Some(failure);
        self
    }

    /// Diagnostic text reported by the remote program, if that is what failed
    pub fn remote_text(&self) -> Option<&str> {
        match &self.cause {
            MarshalError::RemoteProgram { text, .. } => Some(text),
            _ => None,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::of(&self.cause)
    }

    /// Whether trying again on a fresh session might succeed
    pub fn is_transient(&self) -> bool {
        matches!(self.cause, MarshalError::Session(_))
    }
}

impl fmt::Display for InvocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invocation of {} failed: {}", self.target, self.cause)?;
        if let Some(release) = &self.release_failure {
            write!(f, " (session release also failed: {})", release)?;
        }
        Ok(())
    }
}

impl std::error::Error for InvocationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}

#[derive(Debug)]
pub enum ProgcallError {
    /// Configuration file missing or malformed
    Config(String),

    /// Program definition file missing or malformed
    Definition { path: PathBuf, reason: String },

    /// I/O error
    Io(io::Error),

    /// Marshalling outside of a session (CLI inspection)
    Marshal(MarshalError),

    /// Program or command invocation failed
    Invocation(InvocationError),
}

impl ProgcallError {
    /// Get error category for logging
    pub fn category(&self) -> ErrorCategory {
        match self {
            ProgcallError::Config(_) => ErrorCategory::Configuration,
            ProgcallError::Definition { .. } => ErrorCategory::Schema,
            ProgcallError::Io(_) => ErrorCategory::IoError,
            ProgcallError::Marshal(err) => ErrorCategory::of(err),
            ProgcallError::Invocation(err) => err.category(),
        }
    }
}

/// Error category for classification and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Missing binding or layout disagreement
    Schema,
    /// Object graph member unreadable or unwritable
    Access,
    /// Array nesting or sequence length violations
    Layout,
    /// Remote program reported diagnostics
    Remote,
    /// Session acquisition or release
    Session,
    /// Parameter document read, write or call
    Document,
    /// Configuration errors
    Configuration,
    /// I/O operation errors
    IoError,
}

impl ErrorCategory {
    pub fn of(err: &MarshalError) -> Self {
        match err {
            MarshalError::Schema { .. } => ErrorCategory::Schema,
            MarshalError::Access { .. } => ErrorCategory::Access,
            MarshalError::PathDepth { .. } | MarshalError::Index { .. } => ErrorCategory::Layout,
            MarshalError::RemoteProgram { .. } => ErrorCategory::Remote,
            MarshalError::Session(_) => ErrorCategory::Session,
            MarshalError::Document(_) => ErrorCategory::Document,
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Schema => write!(f, "schema"),
            ErrorCategory::Access => write!(f, "access"),
            ErrorCategory::Layout => write!(f, "layout"),
            ErrorCategory::Remote => write!(f, "remote"),
            ErrorCategory::Session => write!(f, "session"),
            ErrorCategory::Document => write!(f, "document"),
            ErrorCategory::Configuration => write!(f, "configuration"),
            ErrorCategory::IoError => write!(f, "io"),
        }
    }
}

impl fmt::Display for ProgcallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgcallError::Config(msg) => write!(f, "Configuration error: {}", msg),
            ProgcallError::Definition { path, reason } => {
                write!(f, "Invalid program definition {}: {}", path.display(), reason)
            }
            ProgcallError::Io(err) => write!(f, "I/O error: {}", err),
            ProgcallError::Marshal(err) => write!(f, "{}", err),
            ProgcallError::Invocation(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ProgcallError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProgcallError::Io(err) => Some(err),
            ProgcallError::Marshal(err) => Some(err),
            ProgcallError::Invocation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ProgcallError {
    fn from(err: io::Error) -> Self {
        ProgcallError::Io(err)
    }
}

impl From<MarshalError> for ProgcallError {
    fn from(err: MarshalError) -> Self {
        ProgcallError::Marshal(err)
    }
}

impl From<InvocationError> for ProgcallError {
    fn from(err: InvocationError) -> Self {
        ProgcallError::Invocation(err)
    }
}
