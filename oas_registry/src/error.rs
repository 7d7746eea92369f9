use thiserror::Error;

use crate::path_words::PathFormatError;

/// Broad classification of [`Error`] variants.
///
/// Every failure is a programmer-input error; there is no transient kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Mutating a finalized or poisoned registry, or finalizing twice.
    UsageOrder,
    /// Something was registered or set twice.
    Duplicate,
    /// The method, path, status code or payload type has a shape the registry does not support.
    UnsupportedShape,
    /// A payload type could not be given a unique, owned catalog name.
    SchemaNaming,
    /// Configuration loading or document serialization failed.
    Config,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot mutate already built registry")]
    AlreadyBuilt,

    #[error("registry is poisoned by an earlier failure: {cause}")]
    Poisoned { cause: String },

    #[error("operation with id {0} already exists")]
    DuplicateOperationId(String),

    #[error("endpoint is already registered for {method} {path}")]
    DuplicateEndpoint { method: String, path: String },

    #[error("{field} has already been set for operation {operation_id}")]
    FieldAlreadySet {
        operation_id: String,
        field: &'static str,
    },

    #[error("response with status code {status} has already been set for operation {operation_id}")]
    DuplicateResponse { operation_id: String, status: u16 },

    #[error("unsupported method: {0}")]
    UnsupportedMethod(String),

    #[error(transparent)]
    PathFormat(#[from] PathFormatError),

    #[error("invalid http status code: {0}")]
    StatusOutOfRange(u16),

    #[error("type {type_name} has unsupported kind: {kind}")]
    UnsupportedKind {
        type_name: &'static str,
        kind: &'static str,
    },

    #[error("map payload {type_name} is not implemented yet")]
    MapNotImplemented { type_name: &'static str },

    #[error("type {type_name} forms a cycle through its fields")]
    CyclicType { type_name: &'static str },

    #[error("type {type_name} has no declaring package path")]
    UnknownProvenance { type_name: &'static str },

    #[error("host module path {0} format not supported")]
    HostModuleFormat(String),

    #[error("type package {package_path} does not belong to organization {organization}; you must own the endpoint contracts")]
    UnownedType {
        package_path: String,
        organization: String,
    },

    #[error("object type name {name} is already registered with type {registered} (requested {requested})")]
    SchemaNameCollision {
        name: String,
        registered: &'static str,
        requested: &'static str,
    },

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("SerdeJson Error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("serialization error: {0}")]
    Serialize(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::AlreadyBuilt | Error::Poisoned { .. } => ErrorKind::UsageOrder,
            Error::DuplicateOperationId(_)
            | Error::DuplicateEndpoint { .. }
            | Error::FieldAlreadySet { .. }
            | Error::DuplicateResponse { .. } => ErrorKind::Duplicate,
            Error::UnsupportedMethod(_)
            | Error::PathFormat(_)
            | Error::StatusOutOfRange(_)
            | Error::UnsupportedKind { .. }
            | Error::MapNotImplemented { .. } => ErrorKind::UnsupportedShape,
            Error::CyclicType { .. }
            | Error::UnknownProvenance { .. }
            | Error::HostModuleFormat(_)
            | Error::UnownedType { .. }
            | Error::SchemaNameCollision { .. } => ErrorKind::SchemaNaming,
            Error::Config(_)
            | Error::Io(_)
            | Error::Toml(_)
            | Error::SerdeJson(_)
            | Error::Serialize(_) => ErrorKind::Config,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
