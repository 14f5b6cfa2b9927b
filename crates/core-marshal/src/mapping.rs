//! Typed accessor tables
//!
//! A [`Mapping`] is declared once per Rust type. Each builder call names the
//! object-side member, its remote parameter name and usage, and a pair of
//! projection functions. The mapping then serves both as the type's field
//! descriptor list and as its accessor table, so the two can never drift apart.
//!
//! ```
//! use once_cell::sync::Lazy;
//! use progcall_core_marshal::{Mapped, Mapping, Padding, Usage};
//!
//! #[derive(Default)]
//! struct Customer {
//!     number: i64,
//!     name: String,
//! }
//!
//! impl Mapped for Customer {
//!     fn mapping() -> &'static Mapping<Self> {
//!         static MAPPING: Lazy<Mapping<Customer>> = Lazy::new(|| {
//!             Mapping::<Customer>::builder()
//!                 .scalar("number", "CUSNO", Usage::Input, |c| &c.number, |c| &mut c.number)
//!                 .padded("name", "CUSNAM", Usage::Output, Padding::spaces(30), |c| &c.name, |c| &mut c.name)
//!                 .build()
//!         });
//!         &MAPPING
//!     }
//! }
//!
//! assert_eq!(Customer::mapping().descriptors().len(), 2);
//! ```

use crate::accessor::{AccessError, Element, Node, Scalar, Sequence};
use crate::descriptor::{FieldDescriptor, Padding, Usage};
use progcall_interface::ParamValue;

/// A type whose members are reachable through a static [`Mapping`]
pub trait Mapped: Send + Sized + 'static {
    fn mapping() -> &'static Mapping<Self>;
}

trait ScalarLens<T>: Send + Sync {
    fn get(&self, target: &T) -> ParamValue;
    fn set(&self, target: &mut T, value: ParamValue) -> Result<(), AccessError>;
}

trait NodeLens<T>: Send + Sync {
    fn get<'a>(&self, target: &'a T) -> &'a dyn Node;
    fn get_mut<'a>(&self, target: &'a mut T) -> &'a mut dyn Node;
}

trait SequenceLens<T>: Send + Sync {
    fn get<'a>(&self, target: &'a T) -> &'a dyn Sequence;
    fn get_mut<'a>(&self, target: &'a mut T) -> &'a mut dyn Sequence;
}

/// Projection from `T` to one of its members
struct Lens<T, V> {
    get: fn(&T) -> &V,
    get_mut: fn(&mut T) -> &mut V,
}

impl<T, V: Scalar + 'static> ScalarLens<T> for Lens<T, V> {
    fn get(&self, target: &T) -> ParamValue {
        (self.get)(target).to_param()
    }

    fn set(&self, target: &mut T, value: ParamValue) -> Result<(), AccessError> {
        *(self.get_mut)(target) = V::from_param(value)?;
        Ok(())
    }
}

impl<T, V: Node + 'static> NodeLens<T> for Lens<T, V> {
    fn get<'a>(&self, target: &'a T) -> &'a dyn Node {
        (self.get)(target)
    }

    fn get_mut<'a>(&self, target: &'a mut T) -> &'a mut dyn Node {
        (self.get_mut)(target)
    }
}

impl<T, E: Element> SequenceLens<T> for Lens<T, Vec<E>> {
    fn get<'a>(&self, target: &'a T) -> &'a dyn Sequence {
        (self.get)(target)
    }

    fn get_mut<'a>(&self, target: &'a mut T) -> &'a mut dyn Sequence {
        (self.get_mut)(target)
    }
}

enum Accessor<T> {
    Scalar(Box<dyn ScalarLens<T>>),
    Structure(Box<dyn NodeLens<T>>),
    Sequence(Box<dyn SequenceLens<T>>),
}

impl<T> Accessor<T> {
    fn kind(&self) -> &'static str {
        match self {
            Accessor::Scalar(_) => "scalar",
            Accessor::Structure(_) => "structure",
            Accessor::Sequence(_) => "array",
        }
    }
}

/// Field descriptors and accessor table of one type
pub struct Mapping<T> {
    descriptors: Vec<FieldDescriptor>,
    accessors: Vec<(String, Accessor<T>)>,
}

impl<T: 'static> Mapping<T> {
    pub fn builder() -> MappingBuilder<T> {
        MappingBuilder {
            mapping: Mapping {
                descriptors: Vec::new(),
                accessors: Vec::new(),
            },
        }
    }

    /// Descriptors in declaration order
    pub fn descriptors(&self) -> &[FieldDescriptor] {
        &self.descriptors
    }

    fn accessor(&self, field: &str) -> Result<&Accessor<T>, AccessError> {
        self.accessors
            .iter()
            .find(|(id, _)| id == field)
            .map(|(_, accessor)| accessor)
            .ok_or_else(|| AccessError::NoSuchField(field.to_string()))
    }
}

pub struct MappingBuilder<T> {
    mapping: Mapping<T>,
}

impl<T: 'static> MappingBuilder<T> {
    fn push(mut self, descriptor: FieldDescriptor, accessor: Accessor<T>) -> Self {
        self.mapping
            .accessors
            .push((descriptor.id.clone(), accessor));
        self.mapping.descriptors.push(descriptor);
        self
    }

    pub fn scalar<V: Scalar + 'static>(
        self,
        id: &str,
        name: &str,
        usage: Usage,
        get: fn(&T) -> &V,
        get_mut: fn(&mut T) -> &mut V,
    ) -> Self {
        self.push(
            FieldDescriptor::scalar(id, name, usage),
            Accessor::Scalar(Box::new(Lens { get, get_mut })),
        )
    }

    /// A scalar whose textual values are padded or truncated before writing
    pub fn padded<V: Scalar + 'static>(
        self,
        id: &str,
        name: &str,
        usage: Usage,
        padding: Padding,
        get: fn(&T) -> &V,
        get_mut: fn(&mut T) -> &mut V,
    ) -> Self {
        self.push(
            FieldDescriptor::padded(id, name, usage, padding),
            Accessor::Scalar(Box::new(Lens { get, get_mut })),
        )
    }

    /// A nested structure; its members come from `S`'s own mapping
    pub fn structure<S: Mapped>(
        self,
        id: &str,
        name: &str,
        usage: Usage,
        get: fn(&T) -> &S,
        get_mut: fn(&mut T) -> &mut S,
    ) -> Self {
        let members = S::mapping().descriptors().to_vec();
        self.push(
            FieldDescriptor::structure(id, name, usage, members),
            Accessor::Structure(Box::new(Lens { get, get_mut })),
        )
    }

    pub fn scalar_array<E: Element + Scalar>(
        self,
        id: &str,
        name: &str,
        usage: Usage,
        size: usize,
        get: fn(&T) -> &Vec<E>,
        get_mut: fn(&mut T) -> &mut Vec<E>,
    ) -> Self {
        self.push(
            FieldDescriptor::scalar_array(id, name, usage, size),
            Accessor::Sequence(Box::new(Lens { get, get_mut })),
        )
    }

    pub fn structure_array<E: Element + Mapped>(
        self,
        id: &str,
        name: &str,
        usage: Usage,
        size: usize,
        get: fn(&T) -> &Vec<E>,
        get_mut: fn(&mut T) -> &mut Vec<E>,
    ) -> Self {
        let members = E::mapping().descriptors().to_vec();
        self.push(
            FieldDescriptor::structure_array(id, name, usage, size, members),
            Accessor::Sequence(Box::new(Lens { get, get_mut })),
        )
    }

    pub fn build(self) -> Mapping<T> {
        self.mapping
    }
}

fn wrong_kind<T>(expected: &'static str, found: &Accessor<T>) -> AccessError {
    AccessError::KindMismatch {
        expected,
        found: found.kind(),
    }
}

impl<T: Mapped> Node for T {
    fn value(&self, field: &str) -> Result<ParamValue, AccessError> {
        match T::mapping().accessor(field)? {
            Accessor::Scalar(lens) => Ok(lens.get(self)),
            other => Err(wrong_kind("scalar", other)),
        }
    }

    fn set_value(&mut self, field: &str, value: ParamValue) -> Result<(), AccessError> {
        match T::mapping().accessor(field)? {
            Accessor::Scalar(lens) => lens.set(self, value),
            other => Err(wrong_kind("scalar", other)),
        }
    }

    fn child(&self, field: &str) -> Result<&dyn Node, AccessError> {
        match T::mapping().accessor(field)? {
            Accessor::Structure(lens) => Ok(lens.get(self)),
            other => Err(wrong_kind("structure", other)),
        }
    }

    fn child_mut(&mut self, field: &str) -> Result<&mut dyn Node, AccessError> {
        match T::mapping().accessor(field)? {
            Accessor::Structure(lens) => Ok(lens.get_mut(self)),
            other => Err(wrong_kind("structure", other)),
        }
    }

    fn sequence(&self, field: &str) -> Result<&dyn Sequence, AccessError> {
        match T::mapping().accessor(field)? {
            Accessor::Sequence(lens) => Ok(lens.get(self)),
            other => Err(wrong_kind("array", other)),
        }
    }

    fn sequence_mut(&mut self, field: &str) -> Result<&mut dyn Sequence, AccessError> {
        match T::mapping().accessor(field)? {
            Accessor::Sequence(lens) => Ok(lens.get_mut(self)),
            other => Err(wrong_kind("array", other)),
        }
    }
}
