/*!
 * File-backed program definitions
 */

use async_trait::async_trait;
use progcall_core_marshal::{ProgramDefinition, SchemaSource};
use progcall_interface::InterfaceError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{ProgcallError, Result};

/// Parse a definition from file contents, choosing the format by extension
pub fn parse_definition(path: &Path, contents: &str) -> Result<ProgramDefinition> {
    let invalid = |reason: String| ProgcallError::Definition {
        path: path.to_path_buf(),
        reason,
    };
    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => toml::from_str(contents).map_err(|e| invalid(e.to_string())),
        Some("json") => serde_json::from_str(contents).map_err(|e| invalid(e.to_string())),
        _ => Err(invalid("expected a .toml or .json file".to_string())),
    }
}

/// Read and parse a definition file
pub fn load_definition(path: &Path) -> Result<ProgramDefinition> {
    let contents = std::fs::read_to_string(path)?;
    parse_definition(path, &contents)
}

/// Definitions stored as `<dir>/<program>.toml` or `<dir>/<program>.json`
///
/// Each file is parsed on first request and cached for the life of the source.
pub struct DirectorySchemaSource {
    dir: PathBuf,
    cache: RwLock<HashMap<String, ProgramDefinition>>,
}

impl DirectorySchemaSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of definitions parsed so far
    pub async fn cached(&self) -> usize {
        self.cache.read().await.len()
    }

    fn candidates(&self, program: &str) -> [PathBuf; 2] {
        [
            self.dir.join(format!("{}.toml", program)),
            self.dir.join(format!("{}.json", program)),
        ]
    }
}

fn unavailable(program: &str, reason: impl Into<String>) -> InterfaceError {
    InterfaceError::Schema {
        program: program.to_string(),
        reason: reason.into(),
    }
}

#[async_trait]
impl SchemaSource for DirectorySchemaSource {
    async fn definition(&self, program: &str) -> progcall_interface::Result<ProgramDefinition> {
        if let Some(definition) = self.cache.read().await.get(program) {
            return Ok(definition.clone());
        }

        if program.is_empty() || program.contains(['/', '\\']) || program.contains("..") {
            return Err(unavailable(program, "not a valid program name"));
        }

        let mut found = None;
        for path in self.candidates(program) {
            match tokio::fs::read_to_string(&path).await {
                Ok(contents) => {
                    found = Some((path, contents));
                    break;
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(unavailable(program, e.to_string())),
            }
        }
        let (path, contents) = found.ok_or_else(|| {
            unavailable(
                program,
                format!("no definition file in {}", self.dir.display()),
            )
        })?;

        let definition =
            parse_definition(&path, &contents).map_err(|e| unavailable(program, e.to_string()))?;
        if definition.program != program {
            return Err(unavailable(
                program,
                format!("{} declares program {}", path.display(), definition.program),
            ));
        }

        debug!(program, path = %path.display(), "Loaded program definition");
        self.cache
            .write()
            .await
            .insert(program.to_string(), definition.clone());
        Ok(definition)
    }
}
