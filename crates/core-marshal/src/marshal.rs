//! Write pass: object graph to parameter document

use crate::accessor::Node;
use crate::descriptor::FieldDescriptor;
use crate::error::{Error, Result};
use crate::padding;
use crate::plan::{resolve, Access, AccessPlan, Direction};
use progcall_interface::ParameterDocument;
use tracing::debug;

/// Write every input field of `instance` into `document`
///
/// Returns the number of document writes issued. The layout is planned in
/// full before the first write, so depth violations leave the document
/// untouched.
pub fn marshal(
    program: &str,
    descriptors: &[FieldDescriptor],
    instance: &dyn Node,
    document: &mut dyn ParameterDocument,
) -> Result<usize> {
    let plan = AccessPlan::build(program, descriptors, Direction::Write)?;
    write_plan(&plan, instance, document)
}

/// Execute a write plan
pub fn write_plan(
    plan: &AccessPlan,
    instance: &dyn Node,
    document: &mut dyn ParameterDocument,
) -> Result<usize> {
    if plan.direction() != Direction::Write {
        return Err(Error::schema("a read plan cannot be used to marshal"));
    }

    let mut writes = 0;
    for access in plan.accesses() {
        match access {
            Access::Value {
                route,
                field,
                path,
                indices,
                padding,
            } => {
                let value = resolve(instance, route)
                    .and_then(|node| node.value(field))
                    .map_err(|e| Error::access(path, e))?;
                let value = padding::apply(value, padding.as_ref());
                debug!(path = %path, indices = %indices, "write");
                document
                    .write(path.as_str(), indices.as_slice(), value)
                    .map_err(Error::Document)?;
                writes += 1;
            }
            Access::Array {
                route,
                field,
                path,
                size,
            } => {
                let len = resolve(instance, route)
                    .and_then(|node| node.sequence(field))
                    .map_err(|e| Error::access(path, e))?
                    .len();
                if len < *size {
                    return Err(Error::Index {
                        path: path.to_string(),
                        position: len,
                        len,
                        declared: *size,
                    });
                }
            }
            // Members of the element are resolved through their own routes.
            Access::Element { .. } => {}
            Access::Item {
                route,
                field,
                position,
                path,
                indices,
            } => {
                let value = resolve(instance, route)
                    .and_then(|node| node.sequence(field))
                    .and_then(|sequence| sequence.item(*position))
                    .map_err(|e| Error::access(path, e))?;
                debug!(path = %path, indices = %indices, "write");
                document
                    .write(path.as_str(), indices.as_slice(), value)
                    .map_err(Error::Document)?;
                writes += 1;
            }
        }
    }
    Ok(writes)
}
