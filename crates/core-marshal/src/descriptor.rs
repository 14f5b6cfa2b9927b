//! Field descriptor model
//!
//! A program's parameter layout is a tree of [`FieldDescriptor`]s. Each
//! descriptor names the object-side member (`id`), the remote parameter name it
//! contributes to the path (`name`), its direction of travel (`usage`) and its
//! kind: a scalar, a structure grouping further descriptors, or a fixed-size
//! array of scalars or structures.
//!
//! Descriptors are plain data. They are built once (from a [`Mapping`] or a
//! program definition file) and shared read-only across invocations.
//!
//! [`Mapping`]: crate::mapping::Mapping

use serde::{Deserialize, Serialize};

/// Direction a field travels relative to the remote call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Usage {
    /// Populated by the caller before the call
    Input,
    /// Produced by the call
    Output,
    /// Both
    #[serde(alias = "inout", alias = "input-output")]
    InputOutput,
}

impl Usage {
    /// Whether the field is written into the document before the call
    pub fn writes(self) -> bool {
        matches!(self, Usage::Input | Usage::InputOutput)
    }

    /// Whether the field is read back from the document after the call
    pub fn reads(self) -> bool {
        matches!(self, Usage::Output | Usage::InputOutput)
    }

    /// Whether every direction of `other` is also a direction of `self`
    pub fn covers(self, other: Usage) -> bool {
        (!other.writes() || self.writes()) && (!other.reads() || self.reads())
    }
}

/// Side a padded value is aligned to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    /// Text first, fill characters after it
    #[default]
    Left,
    /// Fill characters first, text after it
    Right,
}

/// Fixed-width rule applied to textual scalars before they are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Padding {
    pub length: usize,

    #[serde(default = "default_fill")]
    pub fill: char,

    #[serde(default)]
    pub align: Align,
}

fn default_fill() -> char {
    ' '
}

impl Padding {
    /// Left-aligned, space-filled
    pub fn spaces(length: usize) -> Self {
        Self {
            length,
            fill: ' ',
            align: Align::Left,
        }
    }

    /// Right-aligned, zero-filled
    pub fn zeros(length: usize) -> Self {
        Self {
            length,
            fill: '0',
            align: Align::Right,
        }
    }

    pub fn with_fill(mut self, fill: char) -> Self {
        self.fill = fill;
        self
    }
}

/// Kind of the values held by an array field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Scalar,
    Structure(Vec<FieldDescriptor>),
}

/// Shape of a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FieldKind {
    Scalar {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        padding: Option<Padding>,
    },
    Structure {
        members: Vec<FieldDescriptor>,
    },
    Array {
        size: usize,
        element: ElementKind,
    },
}

impl FieldKind {
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Scalar { .. } => "scalar",
            FieldKind::Structure { .. } => "structure",
            FieldKind::Array { .. } => "array",
        }
    }
}

/// Static metadata for one member of a parameter layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Object-side member identifier
    pub id: String,

    /// Remote parameter name contributed to the path
    pub name: String,

    pub usage: Usage,

    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FieldDescriptor {
    pub fn scalar(id: impl Into<String>, name: impl Into<String>, usage: Usage) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            usage,
            kind: FieldKind::Scalar { padding: None },
        }
    }

    pub fn padded(
        id: impl Into<String>,
        name: impl Into<String>,
        usage: Usage,
        padding: Padding,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            usage,
            kind: FieldKind::Scalar {
                padding: Some(padding),
            },
        }
    }

    pub fn structure(
        id: impl Into<String>,
        name: impl Into<String>,
        usage: Usage,
        members: Vec<FieldDescriptor>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            usage,
            kind: FieldKind::Structure { members },
        }
    }

    pub fn scalar_array(
        id: impl Into<String>,
        name: impl Into<String>,
        usage: Usage,
        size: usize,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            usage,
            kind: FieldKind::Array {
                size,
                element: ElementKind::Scalar,
            },
        }
    }

    pub fn structure_array(
        id: impl Into<String>,
        name: impl Into<String>,
        usage: Usage,
        size: usize,
        members: Vec<FieldDescriptor>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            usage,
            kind: FieldKind::Array {
                size,
                element: ElementKind::Structure(members),
            },
        }
    }

    /// Nested descriptors, for structures and arrays of structures
    pub fn members(&self) -> &[FieldDescriptor] {
        match &self.kind {
            FieldKind::Structure { members } => members,
            FieldKind::Array {
                element: ElementKind::Structure(members),
                ..
            } => members,
            _ => &[],
        }
    }
}

/// Deepest array nesting found in a descriptor tree
pub fn array_depth(descriptors: &[FieldDescriptor]) -> usize {
    descriptors
        .iter()
        .map(|d| {
            let own = usize::from(matches!(d.kind, FieldKind::Array { .. }));
            own + array_depth(d.members())
        })
        .max()
        .unwrap_or(0)
}

/// Members whose usage reaches beyond their container's usage
///
/// A container's usage gates traversal of all its members, so an output member
/// inside an input-only structure is never read back. Such layouts are
/// reported, not rewritten. Entries are dotted member ids.
pub fn mixed_usage(descriptors: &[FieldDescriptor]) -> Vec<String> {
    let mut found = Vec::new();
    collect_mixed(descriptors, None, "", &mut found);
    found
}

fn collect_mixed(
    descriptors: &[FieldDescriptor],
    container: Option<Usage>,
    prefix: &str,
    found: &mut Vec<String>,
) {
    for d in descriptors {
        let id = if prefix.is_empty() {
            d.id.clone()
        } else {
            format!("{}.{}", prefix, d.id)
        };
        if let Some(outer) = container {
            if !outer.covers(d.usage) {
                found.push(id.clone());
            }
        }
        collect_mixed(d.members(), Some(d.usage), &id, found);
    }
}
