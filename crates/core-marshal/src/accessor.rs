//! Accessor layer
//!
//! The traversal never touches object-graph types directly. It goes through
//! [`Node`] for members of an object and [`Sequence`] for the elements of an
//! array member. Typed structs get `Node` from a [`Mapping`] accessor table;
//! [`Record`] implements it over a dynamic map. Both look the same to the
//! marshaller.
//!
//! [`Mapping`]: crate::mapping::Mapping
//! [`Record`]: crate::record::Record

use progcall_interface::ParamValue;
use thiserror::Error;

/// Failure to read or write a member of an object
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AccessError {
    #[error("no member `{0}`")]
    NoSuchField(String),

    #[error("expected a {expected} member, found a {found}")]
    KindMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("cannot store a {found} value in a {expected} member")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("value {value} does not fit in {target}")]
    ValueRange { value: String, target: &'static str },

    #[error("position {position} out of range for {len} element(s)")]
    OutOfRange { position: usize, len: usize },

    #[error("elements of this sequence cannot be created empty")]
    NotMaterializable,
}

/// An object in the graph, addressed member by member
pub trait Node: Send {
    /// Current value of scalar member `field`
    fn value(&self, field: &str) -> Result<ParamValue, AccessError>;

    /// Replace scalar member `field`
    fn set_value(&mut self, field: &str, value: ParamValue) -> Result<(), AccessError>;

    /// Nested object held by structure member `field`
    fn child(&self, field: &str) -> Result<&dyn Node, AccessError>;

    /// Nested object held by structure member `field`, created if absent
    fn child_mut(&mut self, field: &str) -> Result<&mut dyn Node, AccessError>;

    /// Elements of array member `field`
    fn sequence(&self, field: &str) -> Result<&dyn Sequence, AccessError>;

    /// Elements of array member `field`, created empty if absent
    fn sequence_mut(&mut self, field: &str) -> Result<&mut dyn Sequence, AccessError>;
}

/// Ordered, resizable elements of an array member
pub trait Sequence: Send {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Scalar element at `position`
    fn item(&self, position: usize) -> Result<ParamValue, AccessError>;

    /// Structure element at `position`
    fn node(&self, position: usize) -> Result<&dyn Node, AccessError>;

    fn node_mut(&mut self, position: usize) -> Result<&mut dyn Node, AccessError>;

    fn clear(&mut self);

    /// Append a scalar element
    fn push_item(&mut self, value: ParamValue) -> Result<(), AccessError>;

    /// Append a default structure element and return it for population
    fn push_blank(&mut self) -> Result<&mut dyn Node, AccessError>;
}

/// Conversion between a Rust scalar and a [`ParamValue`]
pub trait Scalar: Sized {
    fn to_param(&self) -> ParamValue;

    fn from_param(value: ParamValue) -> Result<Self, AccessError>;
}

impl Scalar for ParamValue {
    fn to_param(&self) -> ParamValue {
        self.clone()
    }

    fn from_param(value: ParamValue) -> Result<Self, AccessError> {
        Ok(value)
    }
}

impl Scalar for String {
    fn to_param(&self) -> ParamValue {
        ParamValue::Text(self.clone())
    }

    fn from_param(value: ParamValue) -> Result<Self, AccessError> {
        match value {
            ParamValue::Text(s) => Ok(s),
            other => Err(mismatch("text", &other)),
        }
    }
}

impl Scalar for i64 {
    fn to_param(&self) -> ParamValue {
        ParamValue::Int(*self)
    }

    fn from_param(value: ParamValue) -> Result<Self, AccessError> {
        match value {
            ParamValue::Int(v) => Ok(v),
            other => Err(mismatch("int", &other)),
        }
    }
}

macro_rules! narrow_int_scalar {
    ($($ty:ty),+) => {$(
        impl Scalar for $ty {
            fn to_param(&self) -> ParamValue {
                ParamValue::Int(i64::from(*self))
            }

            fn from_param(value: ParamValue) -> Result<Self, AccessError> {
                let wide = i64::from_param(value)?;
                <$ty>::try_from(wide).map_err(|_| AccessError::ValueRange {
                    value: wide.to_string(),
                    target: stringify!($ty),
                })
            }
        }
    )+};
}

narrow_int_scalar!(i32, i16, u32, u16, u8);

impl Scalar for f64 {
    fn to_param(&self) -> ParamValue {
        ParamValue::Float(*self)
    }

    fn from_param(value: ParamValue) -> Result<Self, AccessError> {
        match value {
            ParamValue::Float(v) => Ok(v),
            ParamValue::Int(v) => Ok(v as f64),
            other => Err(mismatch("float", &other)),
        }
    }
}

impl Scalar for f32 {
    fn to_param(&self) -> ParamValue {
        ParamValue::Float(f64::from(*self))
    }

    fn from_param(value: ParamValue) -> Result<Self, AccessError> {
        f64::from_param(value).map(|v| v as f32)
    }
}

impl Scalar for Vec<u8> {
    fn to_param(&self) -> ParamValue {
        ParamValue::Bytes(self.clone())
    }

    fn from_param(value: ParamValue) -> Result<Self, AccessError> {
        match value {
            ParamValue::Bytes(b) => Ok(b),
            other => Err(mismatch("bytes", &other)),
        }
    }
}

fn mismatch(expected: &'static str, found: &ParamValue) -> AccessError {
    AccessError::TypeMismatch {
        expected,
        found: found.type_name(),
    }
}

/// A value that can live in a `Vec` bound to an array member
///
/// Scalars override the item conversions; structure types override the node
/// accessors and `blank` (see [`node_element!`](crate::node_element)).
pub trait Element: Sized + Send + 'static {
    fn to_item(&self) -> Result<ParamValue, AccessError> {
        Err(AccessError::KindMismatch {
            expected: "scalar",
            found: "structure",
        })
    }

    fn from_item(value: ParamValue) -> Result<Self, AccessError> {
        Err(AccessError::TypeMismatch {
            expected: "structure",
            found: value.type_name(),
        })
    }

    fn as_node(&self) -> Option<&dyn Node> {
        None
    }

    fn as_node_mut(&mut self) -> Option<&mut dyn Node> {
        None
    }

    /// A default element for the read pass to populate
    fn blank() -> Option<Self> {
        None
    }
}

macro_rules! scalar_element {
    ($($ty:ty),+) => {$(
        impl Element for $ty {
            fn to_item(&self) -> Result<ParamValue, AccessError> {
                Ok(self.to_param())
            }

            fn from_item(value: ParamValue) -> Result<Self, AccessError> {
                <$ty as Scalar>::from_param(value)
            }
        }
    )+};
}

scalar_element!(ParamValue, String, i64, i32, i16, u32, u16, u8, f64, f32, Vec<u8>);

/// Let a [`Mapped`](crate::mapping::Mapped) structure type be held in array members
///
/// ```
/// use once_cell::sync::Lazy;
/// use progcall_core_marshal::{node_element, Mapped, Mapping, Usage};
///
/// #[derive(Default)]
/// struct Line {
///     sku: String,
/// }
///
/// impl Mapped for Line {
///     fn mapping() -> &'static Mapping<Self> {
///         static MAPPING: Lazy<Mapping<Line>> = Lazy::new(|| {
///             Mapping::<Line>::builder()
///                 .scalar("sku", "SKU", Usage::Input, |l| &l.sku, |l| &mut l.sku)
///                 .build()
///         });
///         &MAPPING
///     }
/// }
///
/// node_element!(Line);
/// ```
#[macro_export]
macro_rules! node_element {
    ($($ty:ty),+ $(,)?) => {$(
        impl $crate::accessor::Element for $ty {
            fn as_node(&self) -> ::std::option::Option<&dyn $crate::accessor::Node> {
                ::std::option::Option::Some(self)
            }

            fn as_node_mut(&mut self) -> ::std::option::Option<&mut dyn $crate::accessor::Node> {
                ::std::option::Option::Some(self)
            }

            fn blank() -> ::std::option::Option<Self> {
                ::std::option::Option::Some(<$ty as ::std::default::Default>::default())
            }
        }
    )+};
}

impl<E: Element> Sequence for Vec<E> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn item(&self, position: usize) -> Result<ParamValue, AccessError> {
        self.get(position)
            .ok_or(AccessError::OutOfRange {
                position,
                len: Vec::len(self),
            })?
            .to_item()
    }

    fn node(&self, position: usize) -> Result<&dyn Node, AccessError> {
        let element = self.get(position).ok_or(AccessError::OutOfRange {
            position,
            len: Vec::len(self),
        })?;
        element.as_node().ok_or(AccessError::KindMismatch {
            expected: "structure",
            found: "scalar",
        })
    }

    fn node_mut(&mut self, position: usize) -> Result<&mut dyn Node, AccessError> {
        let len = Vec::len(self);
        let element = self
            .get_mut(position)
            .ok_or(AccessError::OutOfRange { position, len })?;
        element.as_node_mut().ok_or(AccessError::KindMismatch {
            expected: "structure",
            found: "scalar",
        })
    }

    fn clear(&mut self) {
        Vec::clear(self)
    }

    fn push_item(&mut self, value: ParamValue) -> Result<(), AccessError> {
        self.push(E::from_item(value)?);
        Ok(())
    }

    fn push_blank(&mut self) -> Result<&mut dyn Node, AccessError> {
        let element = E::blank().ok_or(AccessError::NotMaterializable)?;
        self.push(element);
        self.last_mut()
            .and_then(|e| e.as_node_mut())
            .ok_or(AccessError::NotMaterializable)
    }
}
