//! Collects operations and component schemas for endpoints to produce an
//! OpenAPI document.
//!
//! ```
//! use oas_registry::{Registry, RegistryConfig};
//! use oas_registry::utoipa::openapi::Info;
//!
//! # fn main() -> oas_registry::Result<()> {
//! let mut registry = Registry::with_config(Info::new("Shop", "1.0.0"), RegistryConfig::new());
//! registry
//!     .add_endpoint("GET", "/users/{userId}")?
//!     .with_summary("Fetch one user")?
//!     .with_response_with_content::<Vec<String>>(200, "")?;
//!
//! let doc = registry.finalize()?;
//! assert!(doc.paths.paths.contains_key("/users/{userId}"));
//! # Ok(())
//! # }
//! ```

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use tracing::{debug, info, warn};
use utoipa::openapi::path::{Operation, OperationBuilder as PathOperationBuilder, PathItem};
use utoipa::openapi::request_body::RequestBodyBuilder;
use utoipa::openapi::{
    ContentBuilder, Info, OpenApi, OpenApiBuilder, Paths, RefOr, Required, ResponseBuilder,
};

use crate::catalog::SchemaCatalog;
use crate::config::RegistryConfig;
use crate::describe::{Describe, TypeDescriptor};
use crate::error::{Error, Result};
use crate::operation_id;
use crate::provenance::{HostModule, SchemaNamer};

const JSON_CONTENT_TYPE: &str = "application/json";

/// The HTTP methods an endpoint can be registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
        }
    }

    fn operation<'a>(&self, item: &'a PathItem) -> Option<&'a Operation> {
        match self {
            Method::Get => item.get.as_ref(),
            Method::Post => item.post.as_ref(),
            Method::Put => item.put.as_ref(),
            Method::Delete => item.delete.as_ref(),
            Method::Patch => item.patch.as_ref(),
        }
    }

    fn slot<'a>(&self, item: &'a mut PathItem) -> &'a mut Option<Operation> {
        match self {
            Method::Get => &mut item.get,
            Method::Post => &mut item.post,
            Method::Put => &mut item.put,
            Method::Delete => &mut item.delete,
            Method::Patch => &mut item.patch,
        }
    }
}

impl FromStr for Method {
    type Err = Error;

    /// Accepts the canonical upper-case tokens only.
    fn from_str(method: &str) -> Result<Self> {
        match method {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            "PATCH" => Ok(Method::Patch),
            other => Err(Error::UnsupportedMethod(other.to_string())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
struct RegistryState {
    operation_ids: HashSet<String>,
    catalog: SchemaCatalog,
    doc: OpenApi,
    poisoned: Option<String>,
}

type SharedState = Rc<RefCell<Option<RegistryState>>>;

/// Runs `f` against live, unpoisoned state. A failure poisons the registry
/// so that no partial document can be finalized.
fn mutate<T>(
    state: &SharedState,
    f: impl FnOnce(&mut RegistryState) -> Result<T>,
) -> Result<T> {
    let mut guard = state.borrow_mut();
    let state = guard.as_mut().ok_or(Error::AlreadyBuilt)?;
    if let Some(cause) = &state.poisoned {
        return Err(Error::Poisoned {
            cause: cause.clone(),
        });
    }
    let result = f(state);
    if let Err(err) = &result {
        warn!(error = %err, "registry poisoned");
        state.poisoned = Some(err.to_string());
    }
    result
}

/// Registry collects operations and component schemas for endpoints.
///
/// After [`Registry::finalize`] the registry is consumed: every further call
/// on it, or on any [`OperationBuilder`] it handed out, fails with
/// [`Error::AlreadyBuilt`].
#[derive(Debug)]
pub struct Registry {
    state: SharedState,
}

impl Registry {
    /// Creates a registry with the default config, discovering the host
    /// module from the environment.
    pub fn new(info: Info) -> Self {
        Self::with_config(info, RegistryConfig::default())
    }

    pub fn with_config(info: Info, config: RegistryConfig) -> Self {
        let host = config.host_module.unwrap_or_else(HostModule::from_env);
        debug!(host_module = ?host.path(), "creating registry");

        let doc = OpenApiBuilder::new().info(info).paths(Paths::new()).build();
        let namer = SchemaNamer::new(host, config.schema_key_prefixes_to_trim);
        let state = RegistryState {
            operation_ids: HashSet::new(),
            catalog: SchemaCatalog::new(namer),
            doc,
            poisoned: None,
        };
        Self {
            state: Rc::new(RefCell::new(Some(state))),
        }
    }

    /// Registers a new operation and returns a builder for it.
    ///
    /// The operation id is derived from `method` and `path`, see
    /// [`operation_id::synthesize`].
    pub fn add_endpoint(&mut self, method: &str, path: &str) -> Result<OperationBuilder> {
        let (method, operation_id) = mutate(&self.state, |state| {
            let method: Method = method.parse()?;
            let operation_id = operation_id::synthesize(method.as_str(), path)?;

            let taken = state
                .doc
                .paths
                .paths
                .get(path)
                .is_some_and(|item| method.operation(item).is_some());
            if taken {
                return Err(Error::DuplicateEndpoint {
                    method: method.to_string(),
                    path: path.to_string(),
                });
            }
            if !state.operation_ids.insert(operation_id.clone()) {
                return Err(Error::DuplicateOperationId(operation_id));
            }

            let operation = PathOperationBuilder::new()
                .operation_id(Some(operation_id.clone()))
                .build();
            let item = state.doc.paths.paths.entry(path.to_string()).or_default();
            *method.slot(item) = Some(operation);

            debug!(%method, path, operation_id = %operation_id, "registered endpoint");
            Ok((method, operation_id))
        })?;

        Ok(OperationBuilder {
            state: Rc::clone(&self.state),
            method,
            path: path.to_string(),
            operation_id,
        })
    }

    /// Returns the finished document. Can be called exactly once.
    ///
    /// Marshal the result with `to_json()` / `to_yaml()` or [`crate::render`].
    pub fn finalize(&mut self) -> Result<OpenApi> {
        let mut guard = self.state.borrow_mut();
        let state = guard.as_ref().ok_or(Error::AlreadyBuilt)?;
        if let Some(cause) = &state.poisoned {
            return Err(Error::Poisoned {
                cause: cause.clone(),
            });
        }
        let RegistryState {
            operation_ids,
            catalog,
            mut doc,
            ..
        } = guard.take().ok_or(Error::AlreadyBuilt)?;

        info!(
            operations = operation_ids.len(),
            schemas = catalog.len(),
            "finalized OpenAPI document"
        );
        doc.components = catalog.into_components();
        Ok(doc)
    }

    pub fn is_finalized(&self) -> bool {
        self.state.borrow().is_none()
    }

    /// Operation ids registered so far, sorted.
    pub fn operation_ids(&self) -> Result<Vec<String>> {
        let guard = self.state.borrow();
        let state = guard.as_ref().ok_or(Error::AlreadyBuilt)?;
        let mut ids: Vec<String> = state.operation_ids.iter().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    /// Names of the cataloged component schemas, sorted.
    pub fn schema_names(&self) -> Result<Vec<String>> {
        let guard = self.state.borrow();
        let state = guard.as_ref().ok_or(Error::AlreadyBuilt)?;
        Ok(state.catalog.names().map(String::from).collect())
    }
}

/// Fluent handle for filling in one registered operation.
///
/// Every setter consumes and returns the handle so calls chain with `?`.
#[derive(Debug, Clone)]
pub struct OperationBuilder {
    state: SharedState,
    method: Method,
    path: String,
    operation_id: String,
}

impl OperationBuilder {
    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn update(
        &self,
        f: impl FnOnce(&mut SchemaCatalog, &mut Operation) -> Result<()>,
    ) -> Result<()> {
        mutate(&self.state, |state| {
            let RegistryState { catalog, doc, .. } = state;
            // Operations are only ever dropped together with the whole state.
            let operation = doc
                .paths
                .paths
                .get_mut(&self.path)
                .and_then(|item| self.method.slot(item).as_mut())
                .ok_or(Error::AlreadyBuilt)?;
            f(catalog, operation)
        })
    }

    fn already_set(&self, field: &'static str) -> Error {
        Error::FieldAlreadySet {
            operation_id: self.operation_id.clone(),
            field,
        }
    }

    pub fn with_summary(self, summary: impl Into<String>) -> Result<Self> {
        self.update(|_, operation| {
            if operation.summary.is_some() {
                return Err(self.already_set("summary"));
            }
            operation.summary = Some(summary.into());
            Ok(())
        })?;
        Ok(self)
    }

    /// Appends tags; duplicates are kept.
    pub fn with_tags<I, S>(self, tags: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.update(|_, operation| {
            operation
                .tags
                .get_or_insert_with(Vec::new)
                .extend(tags.into_iter().map(Into::into));
            Ok(())
        })?;
        Ok(self)
    }

    pub fn with_description(self, description: impl Into<String>) -> Result<Self> {
        self.update(|_, operation| {
            if operation.description.is_some() {
                return Err(self.already_set("description"));
            }
            operation.description = Some(description.into());
            Ok(())
        })?;
        Ok(self)
    }

    /// Sets a required JSON request body of type `T`.
    pub fn with_request_body<T: Describe + ?Sized>(self) -> Result<Self> {
        self.with_request_body_of(T::describe())
    }

    pub fn with_request_body_of(self, body: TypeDescriptor) -> Result<Self> {
        self.update(|catalog, operation| {
            if operation.request_body.is_some() {
                return Err(self.already_set("request body"));
            }
            let schema = catalog.resolve(&body)?;
            let request_body = RequestBodyBuilder::new()
                .required(Some(Required::True))
                .content(
                    JSON_CONTENT_TYPE,
                    ContentBuilder::new().schema(Some(schema)).build(),
                )
                .build();
            operation.request_body = Some(request_body);
            Ok(())
        })?;
        Ok(self)
    }

    /// Adds a response without a body. An empty description becomes the
    /// status' canonical reason phrase.
    pub fn with_response(self, status: u16, description: &str) -> Result<Self> {
        self.add_response(status, description, None)?;
        Ok(self)
    }

    /// Adds a response with a JSON body of type `T`.
    pub fn with_response_with_content<T: Describe + ?Sized>(
        self,
        status: u16,
        description: &str,
    ) -> Result<Self> {
        self.add_response(status, description, Some(T::describe()))?;
        Ok(self)
    }

    pub fn with_response_with_content_of(
        self,
        status: u16,
        description: &str,
        content: TypeDescriptor,
    ) -> Result<Self> {
        self.add_response(status, description, Some(content))?;
        Ok(self)
    }

    fn add_response(
        &self,
        status: u16,
        description: &str,
        content: Option<TypeDescriptor>,
    ) -> Result<()> {
        self.update(|catalog, operation| {
            if status >= 600 {
                return Err(Error::StatusOutOfRange(status));
            }
            let key = status.to_string();
            if operation.responses.responses.contains_key(&key) {
                return Err(Error::DuplicateResponse {
                    operation_id: self.operation_id.clone(),
                    status,
                });
            }

            let description = if description.is_empty() {
                status_text(status)
            } else {
                description
            };
            let mut response = ResponseBuilder::new().description(description);
            if let Some(content) = content {
                let schema = catalog.resolve(&content)?;
                response = response.content(
                    JSON_CONTENT_TYPE,
                    ContentBuilder::new().schema(Some(schema)).build(),
                );
            }
            operation
                .responses
                .responses
                .insert(key, RefOr::T(response.build()));
            Ok(())
        })
    }
}

fn status_text(status: u16) -> &'static str {
    http::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .unwrap_or("")
}
