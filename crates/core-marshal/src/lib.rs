//! Core marshalling engine for progcall
//!
//! This crate turns an annotated object graph into writes on a path-addressed
//! parameter document before a remote program call, and reads the results back
//! into the graph afterwards.
//!
//! # Key Concepts
//!
//! - **Field Descriptor**: static metadata for one member (kind, usage, remote name, padding, array size)
//! - **Node / Sequence**: accessor seams through which the engine reads and writes the object graph
//! - **Access Plan**: the flattened traversal shared by the write and read passes
//! - **Record**: a schemaless object graph for layouts loaded at runtime
//!
//! # Example
//!
//! ```
//! use progcall_core_marshal::{marshal, unmarshal, FieldDescriptor, MemoryDocument, Record, Slot, Usage};
//!
//! let layout = vec![
//!     FieldDescriptor::scalar("count", "CNT", Usage::InputOutput),
//!     FieldDescriptor::scalar("status", "STS", Usage::Output),
//! ];
//! let mut order = Record::new().with("count", 5);
//! let mut document = MemoryDocument::new();
//!
//! marshal("ORDPGM", &layout, &order, &mut document).unwrap();
//! document.preset("ORDPGM.STS", &[], "OK");
//! unmarshal("ORDPGM", &layout, &mut order, &document).unwrap();
//!
//! assert_eq!(order.get("status"), Some(&Slot::from("OK")));
//! ```

pub mod accessor;
pub mod descriptor;
pub mod error;
pub mod mapping;
pub mod marshal;
pub mod memory;
pub mod padding;
pub mod path;
pub mod plan;
pub mod program;
pub mod record;
pub mod schema;
pub mod unmarshal;

// Re-export main types for convenience
pub use accessor::{AccessError, Element, Node, Scalar, Sequence};
pub use descriptor::{
    array_depth, mixed_usage, Align, ElementKind, FieldDescriptor, FieldKind, Padding, Usage,
};
pub use error::{Error, Result};
pub use mapping::{Mapped, Mapping, MappingBuilder};
pub use marshal::{marshal, write_plan};
pub use memory::{DocumentOp, MemoryDocument};
pub use path::{IndexVector, ParamPath, MAX_ARRAY_DEPTH};
pub use plan::{Access, AccessPlan, Direction};
pub use program::{RecordCall, RemoteProgram};
pub use record::{Record, Slot};
pub use schema::{check_conformance, ProgramDefinition, SchemaSource};
pub use unmarshal::{read_plan, unmarshal};

pub use progcall_interface::{DiagnosticMessage, ParamValue, ParameterDocument, ProgramBinding};
