//! Where payload types come from, and how that becomes a schema name.
//!
//! A type's package path is its declaring crate's repository (when known)
//! followed by the module path below the crate root, e.g.
//! `github.com/acme/shop/contracts/user-v2`. The host module is the same kind
//! of path for the program doing the registering. Types from the host's
//! organization get names local to the host module, so
//! `github.com/acme/shop/contracts` + `CreateUser` becomes
//! `ContractsCreateUser`.

use std::env;

use serde::Deserialize;

use crate::error::{Error, Result};

pub const HOST_MODULE_ENV: &str = "OAS_REGISTRY_HOST_MODULE";

/// Declaring-site provenance of a record type.
///
/// `#[api_dto]` fills this from `CARGO_PKG_REPOSITORY` and `module_path!()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeOrigin {
    repository: Option<&'static str>,
    module_path: &'static str,
}

impl TypeOrigin {
    pub const fn new(repository: Option<&'static str>, module_path: &'static str) -> Self {
        Self {
            repository,
            module_path,
        }
    }

    /// The '/'-delimited package path, or an empty string when nothing is known.
    pub fn package_path(&self) -> String {
        let mut modules = self.module_path.split("::").filter(|m| !m.is_empty());

        let mut path = match self.repository.map(normalize_module_path) {
            Some(repository) if !repository.is_empty() => {
                // The repository stands in for the crate root.
                modules.next();
                repository
            }
            _ => String::new(),
        };
        for module in modules {
            if !path.is_empty() {
                path.push('/');
            }
            path.push_str(&module.replace('_', "-"));
        }
        path
    }
}

/// Strips URL scheme, ssh user, `.git` suffix and trailing slashes.
fn normalize_module_path(raw: &str) -> String {
    let mut path = raw.trim();
    for scheme in ["https://", "http://", "ssh://", "git://"] {
        if let Some(rest) = path.strip_prefix(scheme) {
            path = rest;
            break;
        }
    }
    let scp_style = path.strip_prefix("git@");
    let mut path = match scp_style {
        Some(rest) => rest.replacen(':', "/", 1),
        None => path.to_string(),
    };
    while path.ends_with('/') {
        path.pop();
    }
    if path.ends_with(".git") {
        path.truncate(path.len() - ".git".len());
    }
    path
}

/// The hosting program's own module identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub struct HostModule(Option<String>);

impl HostModule {
    /// No organization is known; type names keep their full package path.
    pub fn unknown() -> Self {
        Self(None)
    }

    /// A module path like `github.com/acme/shop` or a repository URL.
    pub fn new(path: impl AsRef<str>) -> Self {
        let path = normalize_module_path(path.as_ref());
        Self((!path.is_empty()).then_some(path))
    }

    pub fn from_repository(repository: Option<&str>) -> Self {
        repository.map(Self::new).unwrap_or_default()
    }

    /// Reads `OAS_REGISTRY_HOST_MODULE`; unset means unknown.
    pub fn from_env() -> Self {
        env::var(HOST_MODULE_ENV)
            .map(Self::new)
            .unwrap_or_default()
    }

    pub fn path(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn is_known(&self) -> bool {
        self.0.is_some()
    }
}

impl From<String> for HostModule {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}

/// Captures the calling crate's repository at compile time.
///
/// ```
/// let host = oas_registry::host_module!();
/// # let _ = host;
/// ```
#[macro_export]
macro_rules! host_module {
    () => {
        $crate::HostModule::from_repository(::core::option_env!("CARGO_PKG_REPOSITORY"))
    };
}

/// Derives catalog names for record types.
#[derive(Debug, Clone, Default)]
pub struct SchemaNamer {
    host: HostModule,
    prefixes_to_trim: Vec<String>,
}

impl SchemaNamer {
    pub fn new(host: HostModule, prefixes_to_trim: Vec<String>) -> Self {
        Self {
            host,
            prefixes_to_trim,
        }
    }

    pub fn host(&self) -> &HostModule {
        &self.host
    }

    /// Derives the catalog name of the record `type_name` declared at `origin`.
    pub fn name_for(&self, origin: &TypeOrigin, type_name: &'static str) -> Result<String> {
        let package_path = origin.package_path();
        if package_path.is_empty() {
            return Err(Error::UnknownProvenance { type_name });
        }

        let local_path = match self.host.path() {
            Some(module) => local_package_path(module, &package_path)?,
            None => package_path.as_str(),
        };

        let mut name = pascal_case_path(local_path);
        name.push_str(type_name);
        Ok(self.trim_prefix(name))
    }

    fn trim_prefix(&self, name: String) -> String {
        for prefix in &self.prefixes_to_trim {
            match name.strip_prefix(prefix.as_str()) {
                Some(rest) if !rest.is_empty() => return rest.to_string(),
                _ => {}
            }
        }
        name
    }
}

/// Strips the host organization and, when present, the host module itself.
fn local_package_path<'a>(module: &str, package_path: &'a str) -> Result<&'a str> {
    let org_end = module
        .rfind('/')
        .map(|idx| idx + 1)
        .ok_or_else(|| Error::HostModuleFormat(module.to_string()))?;
    let (organization, module_name) = module.split_at(org_end);

    let in_org = package_path
        .strip_prefix(organization)
        .ok_or_else(|| Error::UnownedType {
            package_path: package_path.to_string(),
            organization: organization.to_string(),
        })?;

    match in_org.strip_prefix(module_name) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => Ok(rest),
        _ => Ok(in_org),
    }
}

/// `contracts/user-v2` -> `ContractsUserV2`.
fn pascal_case_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut at_boundary = true;
    for c in path.chars() {
        if c == '/' || c == '-' {
            at_boundary = true;
            continue;
        }
        if at_boundary {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_boundary = false;
    }
    out
}
