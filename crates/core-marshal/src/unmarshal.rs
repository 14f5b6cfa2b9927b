//! Read pass: parameter document back into the object graph

use crate::accessor::Node;
use crate::descriptor::FieldDescriptor;
use crate::error::{Error, Result};
use crate::plan::{resolve_mut, Access, AccessPlan, Direction};
use progcall_interface::ParameterDocument;
use tracing::debug;

/// Populate every output field of `instance` from `document`
///
/// Array members are rebuilt from scratch: their previous contents are
/// discarded and exactly the declared number of elements is appended.
/// Returns the number of document reads issued.
pub fn unmarshal(
    program: &str,
    descriptors: &[FieldDescriptor],
    instance: &mut dyn Node,
    document: &dyn ParameterDocument,
) -> Result<usize> {
    let plan = AccessPlan::build(program, descriptors, Direction::Read)?;
    read_plan(&plan, instance, document)
}

/// Execute a read plan
pub fn read_plan(
    plan: &AccessPlan,
    instance: &mut dyn Node,
    document: &dyn ParameterDocument,
) -> Result<usize> {
    if plan.direction() != Direction::Read {
        return Err(Error::schema("a write plan cannot be used to unmarshal"));
    }

    let mut reads = 0;
    for access in plan.accesses() {
        match access {
            Access::Value {
                route,
                field,
                path,
                indices,
                ..
            } => {
                debug!(path = %path, indices = %indices, "read");
                let value = document
                    .read(path.as_str(), indices.as_slice())
                    .map_err(Error::Document)?;
                reads += 1;
                resolve_mut(&mut *instance, route)
                    .and_then(|node| node.set_value(field, value))
                    .map_err(|e| Error::access(path, e))?;
            }
            Access::Array {
                route, field, path, ..
            } => {
                let node = resolve_mut(&mut *instance, route).map_err(|e| Error::access(path, e))?;
                node.sequence_mut(field)
                    .map_err(|e| Error::access(path, e))?
                    .clear();
            }
            Access::Element {
                route, field, path, ..
            } => {
                let node = resolve_mut(&mut *instance, route).map_err(|e| Error::access(path, e))?;
                node.sequence_mut(field)
                    .and_then(|sequence| sequence.push_blank().map(|_| ()))
                    .map_err(|e| Error::access(path, e))?;
            }
            Access::Item {
                route,
                field,
                path,
                indices,
                ..
            } => {
                debug!(path = %path, indices = %indices, "read");
                let value = document
                    .read(path.as_str(), indices.as_slice())
                    .map_err(Error::Document)?;
                reads += 1;
                let node = resolve_mut(&mut *instance, route).map_err(|e| Error::access(path, e))?;
                node.sequence_mut(field)
                    .and_then(|sequence| sequence.push_item(value))
                    .map_err(|e| Error::access(path, e))?;
            }
        }
    }
    Ok(reads)
}
