//! The `components.schemas` section of a document under construction.
//!
//! Records are stored once under a name derived from their provenance and
//! referenced everywhere else. Sequences and primitives are always inlined.

use std::any::TypeId;
use std::collections::{BTreeMap, HashMap};

use tracing::debug;
use utoipa::openapi::{Components, ComponentsBuilder, Ref, RefOr, Schema};

use crate::describe::{TypeDescriptor, TypeKind};
use crate::error::{Error, Result};
use crate::provenance::SchemaNamer;
use crate::schema_gen::{array_schema, SchemaGenerator};

#[derive(Debug, Clone, Copy)]
struct RegisteredType {
    type_id: TypeId,
    type_name: &'static str,
}

#[derive(Debug, Default)]
pub struct SchemaCatalog {
    namer: SchemaNamer,
    generator: SchemaGenerator,
    registered: HashMap<String, RegisteredType>,
    schemas: BTreeMap<String, RefOr<Schema>>,
}

impl SchemaCatalog {
    pub fn new(namer: SchemaNamer) -> Self {
        Self {
            namer,
            ..Self::default()
        }
    }

    /// Returns the schema to embed wherever `descriptor` is used.
    ///
    /// Records come back as `#/components/schemas/<name>` references and are
    /// cataloged on first use. Resolving the same record again is a no-op.
    pub fn resolve(&mut self, descriptor: &TypeDescriptor) -> Result<RefOr<Schema>> {
        match descriptor.kind() {
            TypeKind::Sequence { element } => Ok(array_schema(self.resolve(&element())?, None)),
            TypeKind::Array { element, len } => {
                Ok(array_schema(self.resolve(&element())?, Some(*len)))
            }
            TypeKind::Map { .. } => Err(Error::MapNotImplemented {
                type_name: descriptor.type_name(),
            }),
            TypeKind::Primitive(_) => Ok(self.generator.generate(descriptor)?),
            TypeKind::Record(record) => {
                let name = self.namer.name_for(&record.origin, record.name)?;
                self.register(name, descriptor)
            }
            kind @ (TypeKind::Optional { .. }
            | TypeKind::Pointer { .. }
            | TypeKind::RawPointer
            | TypeKind::Function
            | TypeKind::Channel
            | TypeKind::Dynamic
            | TypeKind::Invalid) => Err(Error::UnsupportedKind {
                type_name: descriptor.type_name(),
                kind: kind.name(),
            }),
        }
    }

    fn register(&mut self, name: String, descriptor: &TypeDescriptor) -> Result<RefOr<Schema>> {
        match self.registered.get(&name) {
            Some(existing) if existing.type_id == descriptor.type_id() => {}
            Some(existing) => {
                return Err(Error::SchemaNameCollision {
                    name,
                    registered: existing.type_name,
                    requested: descriptor.type_name(),
                })
            }
            None => {
                let schema = self.generator.generate(descriptor)?;
                debug!(schema = %name, type_name = descriptor.type_name(), "cataloged schema");
                self.schemas.insert(name.clone(), schema);
                self.registered.insert(
                    name.clone(),
                    RegisteredType {
                        type_id: descriptor.type_id(),
                        type_name: descriptor.type_name(),
                    },
                );
            }
        }
        Ok(RefOr::Ref(Ref::from_schema_name(name)))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// `None` when nothing was cataloged.
    pub fn into_components(self) -> Option<Components> {
        if self.schemas.is_empty() {
            return None;
        }
        Some(
            ComponentsBuilder::new()
                .schemas_from_iter(self.schemas)
                .build(),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::describe::{Describe, Field};
    use crate::provenance::{HostModule, TypeOrigin};

    const ACME_SHOP: Option<&str> = Some("https://github.com/acme/shop");

    struct CreateUser;
    impl Describe for CreateUser {
        fn describe() -> TypeDescriptor {
            TypeDescriptor::record::<Self>(
                "CreateUser",
                TypeOrigin::new(ACME_SHOP, "shop::contracts"),
                || vec![Field::new::<String>("email")],
            )
        }
    }

    /// Same name and module as `CreateUser`, but a different Rust type.
    struct CreateUserImpostor;
    impl Describe for CreateUserImpostor {
        fn describe() -> TypeDescriptor {
            TypeDescriptor::record::<Self>(
                "CreateUser",
                TypeOrigin::new(ACME_SHOP, "shop::contracts"),
                || vec![Field::new::<u32>("email")],
            )
        }
    }

    struct TreeNode;
    impl Describe for TreeNode {
        fn describe() -> TypeDescriptor {
            TypeDescriptor::record::<Self>(
                "TreeNode",
                TypeOrigin::new(ACME_SHOP, "shop::contracts"),
                || vec![Field::new::<Vec<TreeNode>>("children")],
            )
        }
    }

    fn catalog() -> SchemaCatalog {
        SchemaCatalog::new(SchemaNamer::new(HostModule::new("github.com/acme/shop"), vec![]))
    }

    fn ref_location(schema: &RefOr<Schema>) -> &str {
        match schema {
            RefOr::Ref(reference) => &reference.ref_location,
            RefOr::T(_) => panic!("expected a reference"),
        }
    }

    #[test]
    fn records_are_cataloged_once() {
        let mut catalog = catalog();
        let first = catalog.resolve(&CreateUser::describe()).unwrap();
        let second = catalog.resolve(&CreateUser::describe()).unwrap();

        assert_eq!(ref_location(&first), "#/components/schemas/ContractsCreateUser");
        assert_eq!(first, second);
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn distinct_types_with_one_name_collide() {
        let mut catalog = catalog();
        catalog.resolve(&CreateUser::describe()).unwrap();
        let err = catalog.resolve(&CreateUserImpostor::describe()).unwrap_err();
        assert!(matches!(err, Error::SchemaNameCollision { ref name, .. } if name == "ContractsCreateUser"));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn sequences_wrap_references_inline() {
        let mut catalog = catalog();
        let schema = catalog.resolve(&Vec::<CreateUser>::describe()).unwrap();
        let json = serde_json::to_value(&schema).unwrap();
        assert_eq!(json["type"], "array");
        assert_eq!(json["items"]["$ref"], "#/components/schemas/ContractsCreateUser");
        assert_eq!(catalog.names().collect::<Vec<_>>(), vec!["ContractsCreateUser"]);
    }

    #[test]
    fn primitive_sequences_are_never_cataloged() {
        let mut catalog = catalog();
        let schema = catalog.resolve(&Vec::<i32>::describe()).unwrap();
        assert!(matches!(schema, RefOr::T(Schema::Array(_))));
        assert!(catalog.is_empty());
        assert!(catalog.into_components().is_none());
    }

    #[test]
    fn unsupported_top_level_kinds() {
        let mut catalog = catalog();
        assert!(matches!(
            catalog.resolve(&HashMap::<String, i32>::describe()),
            Err(Error::MapNotImplemented { .. })
        ));
        assert!(matches!(
            catalog.resolve(&Box::<CreateUser>::describe()),
            Err(Error::UnsupportedKind { kind: "pointer", .. })
        ));
        assert!(matches!(
            catalog.resolve(&Option::<CreateUser>::describe()),
            Err(Error::UnsupportedKind { kind: "optional", .. })
        ));
        assert!(matches!(
            catalog.resolve(&serde_json::Value::describe()),
            Err(Error::UnsupportedKind { kind: "dynamic value", .. })
        ));
        assert!(catalog.is_empty());
    }

    #[test]
    fn cycles_leave_nothing_behind() {
        let mut catalog = catalog();
        let err = catalog.resolve(&TreeNode::describe()).unwrap_err();
        assert!(matches!(err, Error::CyclicType { .. }));
        assert!(catalog.is_empty());
    }
}
