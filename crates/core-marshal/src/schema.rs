//! Program definitions and layout conformance

use crate::descriptor::{ElementKind, FieldDescriptor, FieldKind};
use crate::error::{Error, Result};
use crate::path::ParamPath;
use async_trait::async_trait;
use progcall_interface::ProgramBinding;
use serde::{Deserialize, Serialize};

/// Full parameter layout of a remote program, as stored in a definition file
///
/// ```toml
/// program = "ORDPGM"
/// document = "schemas/ordpgm"
///
/// [[fields]]
/// id = "count"
/// name = "CNT"
/// usage = "inout"
/// kind = "scalar"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramDefinition {
    pub program: String,

    /// Schema document the session parses to bind the program
    pub document: String,

    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

impl ProgramDefinition {
    pub fn binding(&self) -> ProgramBinding {
        ProgramBinding::new(&self.program, &self.document)
    }
}

/// Lookup of remote program definitions by program name
#[async_trait]
pub trait SchemaSource: Send + Sync {
    async fn definition(&self, program: &str) -> progcall_interface::Result<ProgramDefinition>;
}

/// Verify a caller layout against the layout the remote program declares
///
/// Every caller field must exist remotely under the same remote name, with
/// the same kind, array size and element kind, and with a usage the remote
/// side supports. Remote fields the caller does not declare are ignored. All
/// mismatches are reported together.
pub fn check_conformance(program: &str, local: &[FieldDescriptor], remote: &[FieldDescriptor]) -> Result<()> {
    let mut problems = Vec::new();
    compare(local, remote, &ParamPath::root(program), &mut problems);
    if problems.is_empty() {
        Ok(())
    } else {
        Err(Error::schema(problems.join("; ")))
    }
}

fn compare(local: &[FieldDescriptor], remote: &[FieldDescriptor], parent: &ParamPath, problems: &mut Vec<String>) {
    for field in local {
        let path = parent.extend(&field.name);
        let Some(other) = remote.iter().find(|r| r.name == field.name) else {
            problems.push(format!("{}: not declared by the remote program", path));
            continue;
        };

        if !other.usage.covers(field.usage) {
            problems.push(format!(
                "{}: declared {:?} but the remote program uses it as {:?}",
                path, field.usage, other.usage
            ));
        }

        match (&field.kind, &other.kind) {
            (FieldKind::Scalar { .. }, FieldKind::Scalar { .. }) => {}
            (FieldKind::Structure { members }, FieldKind::Structure { members: theirs }) => {
                compare(members, theirs, &path, problems);
            }
            (
                FieldKind::Array { size, element },
                FieldKind::Array {
                    size: their_size,
                    element: their_element,
                },
            ) => {
                if size != their_size {
                    problems.push(format!(
                        "{}: array of {} but the remote program declares {}",
                        path, size, their_size
                    ));
                }
                match (element, their_element) {
                    (ElementKind::Scalar, ElementKind::Scalar) => {}
                    (ElementKind::Structure(members), ElementKind::Structure(theirs)) => {
                        compare(members, theirs, &path, problems);
                    }
                    _ => problems.push(format!("{}: array element kind differs", path)),
                }
            }
            (mine, theirs) => problems.push(format!(
                "{}: {} but the remote program declares a {}",
                path,
                mine.name(),
                theirs.name()
            )),
        }
    }
}
