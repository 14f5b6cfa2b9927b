/*!
 * progcall - typed calls to remote legacy programs
 *
 * Declare a program's parameters once, as a `Mapping` on a Rust type or as a
 * program definition file, and let the engine:
 * - write input fields into the program's parameter document before the call
 * - collect the program's diagnostic messages into a single failure
 * - read output fields back into the same object graph afterwards
 * - hand the session back to the pool on every path
 */

pub mod config;
pub mod error;
pub mod logging;
pub mod schema;
pub mod session;

// Re-export commonly used types
pub use config::{Config, ConnectionConfig, LogLevel};
pub use error::{ErrorCategory, InvocationError, ProgcallError, Result};
pub use schema::{load_definition, DirectorySchemaSource};
pub use session::{CallState, SessionManager};

pub use progcall_core_marshal as marshal;
pub use progcall_interface as interface;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
    }
}
