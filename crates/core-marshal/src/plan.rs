//! Shared traversal
//!
//! The write pass and the read pass never walk the descriptor tree
//! themselves. [`AccessPlan::build`] walks it once for a given [`Direction`]
//! and flattens it into an ordered list of [`Access`]es, each carrying the
//! remote path, the index vector and the route to the owning object. The
//! marshaller and unmarshaller only execute plans, so an input-output field
//! is addressed identically in both directions.
//!
//! Arrays of structures are expanded index-major: every member of element 0,
//! then every member of element 1, and so on.

use crate::accessor::{AccessError, Node};
use crate::descriptor::{ElementKind, FieldDescriptor, FieldKind, Padding, Usage};
use crate::error::Result;
use crate::path::{IndexVector, ParamPath};
use std::fmt;

/// Which pass a plan is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Object graph to document, before the call
    Write,
    /// Document to object graph, after the call
    Read,
}

impl Direction {
    /// Whether a field declared with `usage` is visited in this direction
    pub fn visits(self, usage: Usage) -> bool {
        match self {
            Direction::Write => usage.writes(),
            Direction::Read => usage.reads(),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Write => write!(f, "write"),
            Direction::Read => write!(f, "read"),
        }
    }
}

/// One step from an object to a nested object
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hop {
    /// Structure member
    Child(String),
    /// Structure element at a position of an array member
    Element(String, usize),
}

/// Steps from the root object to the object owning a member
pub type Route = Vec<Hop>;

/// A single step of a plan
#[derive(Debug, Clone, PartialEq)]
pub enum Access {
    /// Scalar member `field` of the object at `route`
    Value {
        route: Route,
        field: String,
        path: ParamPath,
        indices: IndexVector,
        padding: Option<Padding>,
    },
    /// Array member `field`, visited before any of its elements
    Array {
        route: Route,
        field: String,
        path: ParamPath,
        size: usize,
    },
    /// Structure element `position` of array member `field`; its members follow
    Element {
        route: Route,
        field: String,
        position: usize,
        path: ParamPath,
    },
    /// Scalar element `position` of array member `field`
    Item {
        route: Route,
        field: String,
        position: usize,
        path: ParamPath,
        indices: IndexVector,
    },
}

impl Access {
    pub fn path(&self) -> &ParamPath {
        match self {
            Access::Value { path, .. }
            | Access::Array { path, .. }
            | Access::Element { path, .. }
            | Access::Item { path, .. } => path,
        }
    }

    /// Document address touched by this access, if it touches the document
    pub fn address(&self) -> Option<(&ParamPath, &IndexVector)> {
        match self {
            Access::Value { path, indices, .. } | Access::Item { path, indices, .. } => {
                Some((path, indices))
            }
            Access::Array { .. } | Access::Element { .. } => None,
        }
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::Value { path, indices, .. } | Access::Item { path, indices, .. } => {
                if indices.depth() == 0 {
                    write!(f, "{}", path)
                } else {
                    write!(f, "{} {}", path, indices)
                }
            }
            Access::Array { path, size, .. } => write!(f, "{} (array of {})", path, size),
            Access::Element { path, position, .. } => {
                write!(f, "{} (element {})", path, position)
            }
        }
    }
}

/// Ordered accesses for one pass over one program layout
#[derive(Debug, Clone)]
pub struct AccessPlan {
    direction: Direction,
    accesses: Vec<Access>,
}

impl AccessPlan {
    /// Flatten `descriptors` for `direction`, rooting every path at `program`
    ///
    /// Fails with `Error::PathDepth` when an array or a structure sits below
    /// the maximum number of array dimensions, whatever its usage.
    pub fn build(program: &str, descriptors: &[FieldDescriptor], direction: Direction) -> Result<Self> {
        let mut plan = AccessPlan {
            direction,
            accesses: Vec::new(),
        };
        plan.visit(
            descriptors,
            &Route::new(),
            &ParamPath::root(program),
            &IndexVector::new(),
        )?;
        Ok(plan)
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn accesses(&self) -> &[Access] {
        &self.accesses
    }

    /// Document addresses in the order they are touched
    pub fn addresses(&self) -> impl Iterator<Item = (&ParamPath, &IndexVector)> {
        self.accesses.iter().filter_map(Access::address)
    }

    fn visit(
        &mut self,
        descriptors: &[FieldDescriptor],
        route: &Route,
        path: &ParamPath,
        indices: &IndexVector,
    ) -> Result<()> {
        for descriptor in descriptors {
            let path = path.extend(&descriptor.name);
            if !self.direction.visits(descriptor.usage) {
                // Skipped fields still may not nest too deep.
                check_depth(descriptor, &path, indices)?;
                continue;
            }

            match &descriptor.kind {
                FieldKind::Scalar { padding } => self.accesses.push(Access::Value {
                    route: route.clone(),
                    field: descriptor.id.clone(),
                    path,
                    indices: indices.clone(),
                    padding: *padding,
                }),
                FieldKind::Structure { members } => {
                    indices.ensure_nestable(&path)?;
                    let mut child = route.clone();
                    child.push(Hop::Child(descriptor.id.clone()));
                    self.visit(members, &child, &path, indices)?;
                }
                FieldKind::Array { size, element } => {
                    indices.ensure_nestable(&path)?;
                    self.accesses.push(Access::Array {
                        route: route.clone(),
                        field: descriptor.id.clone(),
                        path: path.clone(),
                        size: *size,
                    });
                    for position in 0..*size {
                        let element_indices = indices.next_index(position, &path)?;
                        match element {
                            ElementKind::Scalar => self.accesses.push(Access::Item {
                                route: route.clone(),
                                field: descriptor.id.clone(),
                                position,
                                path: path.clone(),
                                indices: element_indices,
                            }),
                            ElementKind::Structure(members) => {
                                self.accesses.push(Access::Element {
                                    route: route.clone(),
                                    field: descriptor.id.clone(),
                                    position,
                                    path: path.clone(),
                                });
                                let mut child = route.clone();
                                child.push(Hop::Element(descriptor.id.clone(), position));
                                self.visit(members, &child, &path, &element_indices)?;
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

fn check_depth(descriptor: &FieldDescriptor, path: &ParamPath, indices: &IndexVector) -> Result<()> {
    if let FieldKind::Array { element, .. } = &descriptor.kind {
        let inner = indices.next_index(0, path)?;
        if let ElementKind::Structure(members) = element {
            for member in members {
                check_depth(member, &path.extend(&member.name), &inner)?;
            }
        }
    } else if let FieldKind::Structure { members } = &descriptor.kind {
        indices.ensure_nestable(path)?;
        for member in members {
            check_depth(member, &path.extend(&member.name), indices)?;
        }
    }
    Ok(())
}

/// Object at the end of `route`
pub(crate) fn resolve<'a>(root: &'a dyn Node, route: &[Hop]) -> std::result::Result<&'a dyn Node, AccessError> {
    let mut node = root;
    for hop in route {
        node = match hop {
            Hop::Child(field) => node.child(field)?,
            Hop::Element(field, position) => node.sequence(field)?.node(*position)?,
        };
    }
    Ok(node)
}

/// Object at the end of `route`, materialising missing structures on the way
pub(crate) fn resolve_mut<'a>(
    root: &'a mut dyn Node,
    route: &[Hop],
) -> std::result::Result<&'a mut dyn Node, AccessError> {
    let mut node = root;
    for hop in route {
        node = match hop {
            Hop::Child(field) => node.child_mut(field)?,
            Hop::Element(field, position) => node.sequence_mut(field)?.node_mut(*position)?,
        };
    }
    Ok(node)
}
