//! Static type metadata for payload types.
//!
//! Rust has no runtime reflection, so every type used as a request or
//! response payload implements [`Describe`]. Records get their impl from
//! `#[api_dto]`; the standard library types below are covered here.
//! Nested descriptors are produced through function pointers so that a
//! record can mention itself without the description recursing forever.

use std::any::{type_name, Any, TypeId};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::rc::Rc;
use std::sync::mpsc::{Receiver, Sender, SyncSender};
use std::sync::Arc;

use crate::provenance::TypeOrigin;

pub type DescribeFn = fn() -> TypeDescriptor;

/// Implemented by every type that can appear in a payload.
pub trait Describe: 'static {
    fn describe() -> TypeDescriptor;
}

/// The structural shape of a type plus its identity.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    type_id: TypeId,
    type_name: &'static str,
    kind: TypeKind,
}

impl TypeDescriptor {
    pub fn of<T: ?Sized + 'static>(kind: TypeKind) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            kind,
        }
    }

    /// Describes a struct with named fields.
    pub fn record<T: ?Sized + 'static>(
        name: &'static str,
        origin: TypeOrigin,
        fields: fn() -> Vec<Field>,
    ) -> Self {
        Self::of::<T>(TypeKind::Record(Record {
            name,
            origin,
            fields,
        }))
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// The fully qualified Rust type name, used in error messages only.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }
}

#[derive(Debug, Clone)]
pub enum TypeKind {
    Record(Record),
    /// Growable ordered sequence (`Vec<T>`, `VecDeque<T>`, `[T]`).
    Sequence { element: DescribeFn },
    /// Fixed-size array `[T; N]`.
    Array { element: DescribeFn, len: usize },
    Map { value: DescribeFn },
    Primitive(Primitive),
    Optional { inner: DescribeFn },
    /// Owning or borrowing indirection (`Box`, `Rc`, `Arc`, references).
    Pointer { target: DescribeFn },
    RawPointer,
    Function,
    Channel,
    /// A value whose shape is only known at runtime.
    Dynamic,
    /// Carries no payload at all (`()`).
    Invalid,
}

impl TypeKind {
    pub fn name(&self) -> &'static str {
        match self {
            TypeKind::Record(_) => "record",
            TypeKind::Sequence { .. } => "sequence",
            TypeKind::Array { .. } => "array",
            TypeKind::Map { .. } => "map",
            TypeKind::Primitive(_) => "primitive",
            TypeKind::Optional { .. } => "optional",
            TypeKind::Pointer { .. } => "pointer",
            TypeKind::RawPointer => "unsafe pointer",
            TypeKind::Function => "function",
            TypeKind::Channel => "channel",
            TypeKind::Dynamic => "dynamic value",
            TypeKind::Invalid => "invalid",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Record {
    /// The bare type name, without any module path.
    pub name: &'static str,
    pub origin: TypeOrigin,
    pub fields: fn() -> Vec<Field>,
}

#[derive(Debug, Clone, Copy)]
pub struct Field {
    /// The serialized field name.
    pub name: &'static str,
    pub describe: DescribeFn,
}

impl Field {
    pub fn new<T: Describe + ?Sized>(name: &'static str) -> Self {
        Self {
            name,
            describe: <T as Describe>::describe,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Bool,
    Int32,
    Int64,
    Float,
    Double,
    Char,
    String,
}

macro_rules! describe_primitive {
    ($($ty:ty => $primitive:ident),* $(,)?) => {
        $(
            impl Describe for $ty {
                fn describe() -> TypeDescriptor {
                    TypeDescriptor::of::<Self>(TypeKind::Primitive(Primitive::$primitive))
                }
            }
        )*
    };
}

describe_primitive! {
    bool => Bool,
    i8 => Int32,
    i16 => Int32,
    i32 => Int32,
    u8 => Int32,
    u16 => Int32,
    u32 => Int64,
    i64 => Int64,
    u64 => Int64,
    i128 => Int64,
    u128 => Int64,
    isize => Int64,
    usize => Int64,
    f32 => Float,
    f64 => Double,
    char => Char,
    str => String,
    String => String,
}

impl Describe for () {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::of::<Self>(TypeKind::Invalid)
    }
}

impl Describe for serde_json::Value {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::of::<Self>(TypeKind::Dynamic)
    }
}

impl Describe for dyn Any {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::of::<Self>(TypeKind::Dynamic)
    }
}

impl<T: Describe> Describe for Vec<T> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::of::<Self>(TypeKind::Sequence {
            element: T::describe,
        })
    }
}

impl<T: Describe> Describe for VecDeque<T> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::of::<Self>(TypeKind::Sequence {
            element: T::describe,
        })
    }
}

impl<T: Describe> Describe for [T] {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::of::<Self>(TypeKind::Sequence {
            element: T::describe,
        })
    }
}

impl<T: Describe, const N: usize> Describe for [T; N] {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::of::<Self>(TypeKind::Array {
            element: T::describe,
            len: N,
        })
    }
}

impl<K: 'static, V: Describe, S: 'static> Describe for HashMap<K, V, S> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::of::<Self>(TypeKind::Map { value: V::describe })
    }
}

impl<K: 'static, V: Describe> Describe for BTreeMap<K, V> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::of::<Self>(TypeKind::Map { value: V::describe })
    }
}

impl<T: Describe> Describe for Option<T> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::of::<Self>(TypeKind::Optional { inner: T::describe })
    }
}

macro_rules! describe_pointer {
    ($($ty:ty),* $(,)?) => {
        $(
            impl<T: Describe + ?Sized> Describe for $ty {
                fn describe() -> TypeDescriptor {
                    TypeDescriptor::of::<Self>(TypeKind::Pointer { target: T::describe })
                }
            }
        )*
    };
}

describe_pointer!(Box<T>, Rc<T>, Arc<T>, &'static T, &'static mut T);

impl<T: ?Sized + 'static> Describe for *const T {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::of::<Self>(TypeKind::RawPointer)
    }
}

impl<T: ?Sized + 'static> Describe for *mut T {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::of::<Self>(TypeKind::RawPointer)
    }
}

macro_rules! describe_channel {
    ($($ty:ident),* $(,)?) => {
        $(
            impl<T: 'static> Describe for $ty<T> {
                fn describe() -> TypeDescriptor {
                    TypeDescriptor::of::<Self>(TypeKind::Channel)
                }
            }
        )*
    };
}

describe_channel!(Sender, SyncSender, Receiver);

macro_rules! describe_fn {
    ($($arg:ident),*) => {
        impl<R: 'static, $($arg: 'static),*> Describe for fn($($arg),*) -> R {
            fn describe() -> TypeDescriptor {
                TypeDescriptor::of::<Self>(TypeKind::Function)
            }
        }
    };
}

describe_fn!();
describe_fn!(A);
describe_fn!(A, B);
describe_fn!(A, B, C);

#[cfg(test)]
mod tests {
    use super::*;

    fn kind_of<T: Describe + ?Sized>() -> &'static str {
        T::describe().kind().name()
    }

    #[test]
    fn std_types_map_to_kinds() {
        assert_eq!(kind_of::<String>(), "primitive");
        assert_eq!(kind_of::<Vec<i32>>(), "sequence");
        assert_eq!(kind_of::<[u8; 4]>(), "array");
        assert_eq!(kind_of::<HashMap<String, i64>>(), "map");
        assert_eq!(kind_of::<Option<bool>>(), "optional");
        assert_eq!(kind_of::<Box<String>>(), "pointer");
        assert_eq!(kind_of::<&'static str>(), "pointer");
        assert_eq!(kind_of::<*const u8>(), "unsafe pointer");
        assert_eq!(kind_of::<fn(i32) -> i32>(), "function");
        assert_eq!(kind_of::<Sender<i32>>(), "channel");
        assert_eq!(kind_of::<serde_json::Value>(), "dynamic value");
        assert_eq!(kind_of::<()>(), "invalid");
    }

    #[test]
    fn identity_follows_the_rust_type() {
        assert_eq!(i32::describe().type_id(), TypeId::of::<i32>());
        assert_ne!(Vec::<i32>::describe().type_id(), Vec::<i64>::describe().type_id());
        assert!(String::describe().type_name().ends_with("String"));
    }

    #[test]
    fn nested_descriptors_are_lazy() {
        let TypeKind::Sequence { element } = Vec::<Vec<u64>>::describe().kind().clone() else {
            panic!("expected a sequence");
        };
        assert_eq!(element().kind().name(), "sequence");
    }
}
