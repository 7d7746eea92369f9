//! Generates fully inlined schemas from [`TypeDescriptor`]s.
//!
//! Nested records are expanded in place rather than referenced. A record
//! that is reached again while it is still being expanded is a cycle and
//! fails the whole generation.

use std::any::TypeId;

use thiserror::Error;
use utoipa::openapi::schema::{
    AdditionalProperties, ArrayBuilder, KnownFormat, ObjectBuilder, SchemaFormat, SchemaType,
    Type,
};
use utoipa::openapi::{RefOr, Schema};

use crate::describe::{Primitive, TypeDescriptor, TypeKind};
use crate::error::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerateError {
    #[error("cycle detected at type {type_name}")]
    Cycle { type_name: &'static str },

    #[error("type {type_name} has unsupported kind {kind}")]
    Unsupported {
        type_name: &'static str,
        kind: &'static str,
    },
}

impl From<GenerateError> for Error {
    fn from(err: GenerateError) -> Self {
        match err {
            GenerateError::Cycle { type_name } => Error::CyclicType { type_name },
            GenerateError::Unsupported { type_name, kind } => {
                Error::UnsupportedKind { type_name, kind }
            }
        }
    }
}

/// Structural schema generator. Always rejects cyclic type graphs.
#[derive(Debug, Clone, Default)]
pub struct SchemaGenerator;

impl SchemaGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generate(&self, descriptor: &TypeDescriptor) -> Result<RefOr<Schema>, GenerateError> {
        Walk::default().schema(descriptor)
    }
}

#[derive(Default)]
struct Walk {
    expanding: Vec<TypeId>,
}

impl Walk {
    fn schema(&mut self, descriptor: &TypeDescriptor) -> Result<RefOr<Schema>, GenerateError> {
        match descriptor.kind() {
            TypeKind::Primitive(primitive) => Ok(primitive_schema(*primitive)),
            TypeKind::Sequence { element } => Ok(array_schema(self.schema(&element())?, None)),
            TypeKind::Array { element, len } => {
                Ok(array_schema(self.schema(&element())?, Some(*len)))
            }
            TypeKind::Map { value } => {
                let values = self.schema(&value())?;
                Ok(RefOr::T(Schema::Object(
                    ObjectBuilder::new()
                        .schema_type(Type::Object)
                        .additional_properties(Some(AdditionalProperties::RefOr(values)))
                        .build(),
                )))
            }
            TypeKind::Optional { inner } => self.schema(&inner()),
            TypeKind::Pointer { target } => self.schema(&target()),
            TypeKind::Dynamic => Ok(RefOr::T(Schema::Object(
                ObjectBuilder::new().schema_type(SchemaType::AnyValue).build(),
            ))),
            TypeKind::Record(record) => {
                let type_id = descriptor.type_id();
                if self.expanding.contains(&type_id) {
                    return Err(GenerateError::Cycle {
                        type_name: descriptor.type_name(),
                    });
                }
                self.expanding.push(type_id);

                let mut object = ObjectBuilder::new().schema_type(Type::Object);
                for field in (record.fields)() {
                    let field_type = (field.describe)();
                    let required = !matches!(field_type.kind(), TypeKind::Optional { .. });
                    object = object.property(field.name, self.schema(&field_type)?);
                    if required {
                        object = object.required(field.name);
                    }
                }

                self.expanding.pop();
                Ok(RefOr::T(Schema::Object(object.build())))
            }
            kind @ (TypeKind::RawPointer
            | TypeKind::Function
            | TypeKind::Channel
            | TypeKind::Invalid) => Err(GenerateError::Unsupported {
                type_name: descriptor.type_name(),
                kind: kind.name(),
            }),
        }
    }
}

pub(crate) fn array_schema(items: RefOr<Schema>, len: Option<usize>) -> RefOr<Schema> {
    let mut array = ArrayBuilder::new().items(items);
    if let Some(len) = len {
        array = array.min_items(Some(len)).max_items(Some(len));
    }
    RefOr::T(Schema::Array(array.build()))
}

fn primitive_schema(primitive: Primitive) -> RefOr<Schema> {
    let object = match primitive {
        Primitive::Bool => ObjectBuilder::new().schema_type(Type::Boolean),
        Primitive::Int32 => ObjectBuilder::new()
            .schema_type(Type::Integer)
            .format(Some(SchemaFormat::KnownFormat(KnownFormat::Int32))),
        Primitive::Int64 => ObjectBuilder::new()
            .schema_type(Type::Integer)
            .format(Some(SchemaFormat::KnownFormat(KnownFormat::Int64))),
        Primitive::Float => ObjectBuilder::new()
            .schema_type(Type::Number)
            .format(Some(SchemaFormat::KnownFormat(KnownFormat::Float))),
        Primitive::Double => ObjectBuilder::new()
            .schema_type(Type::Number)
            .format(Some(SchemaFormat::KnownFormat(KnownFormat::Double))),
        Primitive::Char => ObjectBuilder::new()
            .schema_type(Type::String)
            .min_length(Some(1))
            .max_length(Some(1)),
        Primitive::String => ObjectBuilder::new().schema_type(Type::String),
    };
    RefOr::T(Schema::Object(object.build()))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::describe::{Describe, Field};
    use crate::provenance::TypeOrigin;

    struct Tag;
    impl Describe for Tag {
        fn describe() -> TypeDescriptor {
            TypeDescriptor::record::<Self>("Tag", TypeOrigin::new(None, "shop::tags"), || {
                vec![Field::new::<String>("label")]
            })
        }
    }

    struct Article;
    impl Describe for Article {
        fn describe() -> TypeDescriptor {
            TypeDescriptor::record::<Self>("Article", TypeOrigin::new(None, "shop::blog"), || {
                vec![
                    Field::new::<u64>("id"),
                    Field::new::<Option<String>>("subtitle"),
                    Field::new::<Vec<Tag>>("tags"),
                    Field::new::<Box<Tag>>("primaryTag"),
                ]
            })
        }
    }

    struct Node;
    impl Describe for Node {
        fn describe() -> TypeDescriptor {
            TypeDescriptor::record::<Self>("Node", TypeOrigin::new(None, "shop::tree"), || {
                vec![Field::new::<Option<Box<Node>>>("parent")]
            })
        }
    }

    struct Callback;
    impl Describe for Callback {
        fn describe() -> TypeDescriptor {
            TypeDescriptor::record::<Self>("Callback", TypeOrigin::new(None, "shop::hooks"), || {
                vec![Field::new::<fn() -> ()>("run")]
            })
        }
    }

    fn to_json(schema: RefOr<Schema>) -> serde_json::Value {
        serde_json::to_value(schema).unwrap()
    }

    #[test]
    fn primitives_carry_formats() {
        let schema = to_json(SchemaGenerator::new().generate(&i64::describe()).unwrap());
        assert_eq!(schema["type"], "integer");
        assert_eq!(schema["format"], "int64");

        let schema = to_json(SchemaGenerator::new().generate(&f32::describe()).unwrap());
        assert_eq!(schema["format"], "float");
    }

    #[test]
    fn records_are_inlined_with_required_fields() {
        let schema = to_json(SchemaGenerator::new().generate(&Article::describe()).unwrap());
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["tags"]["type"], "array");
        assert_eq!(schema["properties"]["tags"]["items"]["properties"]["label"]["type"], "string");
        assert_eq!(schema["properties"]["primaryTag"]["type"], "object");
        assert_eq!(schema["properties"]["subtitle"]["type"], "string");

        let required = schema["required"].as_array().unwrap();
        assert!(required.contains(&json!("id")));
        assert!(required.contains(&json!("tags")));
        assert!(!required.contains(&json!("subtitle")));
    }

    #[test]
    fn sibling_records_are_not_cycles() {
        // `Tag` appears twice under `Article` without nesting in itself.
        assert!(SchemaGenerator::new().generate(&Article::describe()).is_ok());
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let err = SchemaGenerator::new().generate(&Node::describe()).unwrap_err();
        assert!(matches!(err, GenerateError::Cycle { .. }));
    }

    #[test]
    fn maps_become_additional_properties() {
        let schema = to_json(
            SchemaGenerator::new()
                .generate(&std::collections::BTreeMap::<String, bool>::describe())
                .unwrap(),
        );
        assert_eq!(schema["additionalProperties"]["type"], "boolean");
    }

    #[test]
    fn function_fields_are_unsupported() {
        let err = SchemaGenerator::new().generate(&Callback::describe()).unwrap_err();
        assert!(matches!(err, GenerateError::Unsupported { kind: "function", .. }));
    }
}
