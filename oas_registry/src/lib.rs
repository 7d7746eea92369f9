//! # OAS Registry - Programmatic OpenAPI Documents for Rust Services
//!
//! `oas_registry` builds an OpenAPI 3.1 document one endpoint at a time, with
//! no routing framework involved. You describe *what* an endpoint accepts and
//! returns; the registry takes care of the repetitive parts.
//!
//! ## Core Features:
//!
//! - **Derived operation ids**: `GET /users/{userId}/orders` becomes
//!   `getUserOrders`. Collection segments followed by an id placeholder are
//!   singularized, see [`operation_id::synthesize`].
//!
//! - **Schema catalog**: record payloads are placed once under
//!   `components.schemas` and referenced everywhere else. Names come from the
//!   declaring module, local to the host module, with configurable prefixes
//!   trimmed.
//!
//! - **`#[api_dto]`**: derives `serde` traits and [`Describe`] for payload
//!   structs with camelCase JSON by default.
//!
//! - **Fail-fast registration**: duplicates and unsupported shapes are
//!   reported immediately, and any failure poisons the registry so a partial
//!   document is never produced.
//!
//! ```
//! use oas_registry::{api_dto, Registry, RegistryConfig, HostModule};
//! use oas_registry::utoipa::openapi::Info;
//!
//! #[api_dto]
//! pub struct Greeting {
//!     pub message: String,
//! }
//!
//! # fn main() -> oas_registry::Result<()> {
//! let config = RegistryConfig::new().with_host_module(HostModule::unknown());
//! let mut registry = Registry::with_config(Info::new("Greeter", "0.1.0"), config);
//! registry
//!     .add_endpoint("GET", "/greetings")?
//!     .with_response_with_content::<Vec<Greeting>>(200, "")?;
//! let doc = registry.finalize()?;
//! assert_eq!(doc.components.map(|c| c.schemas.len()), Some(1));
//! # Ok(())
//! # }
//! ```

extern crate self as oas_registry;

pub mod catalog;
pub mod config;
pub mod describe;
pub mod error;
pub mod operation_id;
pub mod path_words;
pub mod provenance;
pub mod registry;
pub mod render;
pub mod schema_gen;

pub use catalog::SchemaCatalog;
pub use config::RegistryConfig;
pub use describe::{Describe, Field, Primitive, Record, TypeDescriptor, TypeKind};
pub use error::{Error, ErrorKind, Result};
pub use provenance::{HostModule, SchemaNamer, TypeOrigin};
pub use registry::{Method, OperationBuilder, Registry};
pub use render::{render, DocumentFormat};

#[cfg(feature = "macros")]
pub use oas_registry_macros::api_dto;

pub use serde;
pub use utoipa;
