//! Progcall Interface: seams to the remote host
//!
//! This crate defines the collaborators the marshalling engine talks to without
//! knowing how they are implemented:
//!
//! 1. **SessionPool**: hands out authenticated sessions and takes them back
//! 2. **Session**: runs unstructured commands and binds program documents
//! 3. **ParameterDocument**: the path-addressed parameter area of one program call
//!
//! The wire protocol of the host is owned entirely by the implementations of
//! these traits. The engine only ever sees [`ParamValue`]s addressed by a dotted
//! path and an index vector.
//!
//! # Example
//!
//! ```rust,no_run
//! use progcall_interface::{Credentials, Endpoint, ParamValue, ProgramBinding, Session, SessionPool};
//!
//! async fn call<P: SessionPool>(pool: &P) -> progcall_interface::Result<()> {
//!     let endpoint = Endpoint::new("as400.example.com");
//!     let credentials = Credentials::new("QUSER", "secret");
//!
//!     let mut session = pool.acquire(&endpoint, &credentials).await?;
//!     let binding = ProgramBinding::new("ORDERS", "schemas/orders");
//!     let mut document = session.bind(&binding).await?;
//!     document.write("ORDERS.CNT", &[], ParamValue::Int(5))?;
//!     let messages = document.invoke(&binding.program).await?;
//!     assert!(messages.is_empty());
//!     pool.release(session).await
//! }
//! ```

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InterfaceError {
    #[error("Session error: {0}")]
    Session(String),

    #[error("Document error at {path}: {reason}")]
    Document { path: String, reason: String },

    #[error("Command failed: {0}")]
    Command(String),

    #[error("Schema unavailable for {program}: {reason}")]
    Schema { program: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl InterfaceError {
    /// Create a document error for a parameter path
    pub fn document(path: impl Into<String>, reason: impl Into<String>) -> Self {
        InterfaceError::Document {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, InterfaceError>;

/// A single value exchanged with the parameter document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl ParamValue {
    /// Textual values are the only ones subject to padding
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Short name of the variant, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Int(_) => "int",
            ParamValue::Float(_) => "float",
            ParamValue::Text(_) => "text",
            ParamValue::Bytes(_) => "bytes",
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Text(s) => write!(f, "{:?}", s),
            ParamValue::Bytes(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(v as i64)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

impl From<Vec<u8>> for ParamValue {
    fn from(v: Vec<u8>) -> Self {
        ParamValue::Bytes(v)
    }
}

/// The remote program an object graph is bound to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramBinding {
    /// Program name on the host; also the root of every parameter path
    pub program: String,

    /// Name of the schema document describing the program's parameter layout
    pub document: String,
}

impl ProgramBinding {
    pub fn new(program: impl Into<String>, document: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            document: document.into(),
        }
    }
}

/// A message reported by the host after a program or command ran
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticMessage {
    /// Host message identifier (e.g. `CPF9801`), empty when unknown
    #[serde(default)]
    pub id: String,

    /// Message text as reported by the host
    pub text: String,

    #[serde(default)]
    pub severity: u32,
}

impl DiagnosticMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            text: text.into(),
            severity: 0,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

/// Host address sessions are opened against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub host: String,
}

impl Endpoint {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.host)
    }
}

/// User credentials for session acquisition
///
/// The password never appears in `Debug` output.
#[derive(Clone)]
pub struct Credentials {
    pub user: String,
    password: SecretString,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: SecretString::new(password.into().into_boxed_str()),
        }
    }

    pub fn from_secret(user: impl Into<String>, password: SecretString) -> Self {
        Self {
            user: user.into(),
            password,
        }
    }

    /// Expose the password to a pool implementation
    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// The structured parameter area of one program call
///
/// A document is bound to a single program on a single session and lives for
/// one invocation. Values are addressed by a dotted path rooted at the program
/// name (`PROG.HEADER.CNT`) and an index vector with one position per enclosing
/// array, outermost first. An empty index slice addresses a plain field.
#[async_trait]
pub trait ParameterDocument: Send {
    /// Store a value at `path`/`indices`
    fn write(&mut self, path: &str, indices: &[usize], value: ParamValue) -> Result<()>;

    /// Fetch the value at `path`/`indices`
    fn read(&self, path: &str, indices: &[usize]) -> Result<ParamValue>;

    /// Call the bound program and return the diagnostic messages it produced
    ///
    /// An empty list means the call completed cleanly.
    async fn invoke(&mut self, program: &str) -> Result<Vec<DiagnosticMessage>>;
}

/// An authenticated session on the host
#[async_trait]
pub trait Session: Send {
    /// Run an unstructured command string
    async fn run_command(&mut self, command: &str) -> Result<Vec<DiagnosticMessage>>;

    /// Parse the schema document for `binding` and return a fresh parameter document
    async fn bind(&mut self, binding: &ProgramBinding) -> Result<Box<dyn ParameterDocument>>;
}

/// Source of sessions
///
/// Implementations own thread safety, timeouts and connection reuse. `release`
/// is called exactly once for every successful `acquire`, including after a
/// failed call.
#[async_trait]
pub trait SessionPool: Send + Sync {
    type Session: Session + 'static;

    /// Acquire a session; may wait on the network or on pool capacity
    async fn acquire(&self, endpoint: &Endpoint, credentials: &Credentials)
        -> Result<Self::Session>;

    /// Hand a session back to the pool
    async fn release(&self, session: Self::Session) -> Result<()>;
}
