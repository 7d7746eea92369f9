//! Prints the user-service OpenAPI document.
//!
//! Naming options come from `[package.metadata.oas_registry]` in the manifest
//! and can be overridden through `OAS_REGISTRY_*` variables or a `.env` file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use oas_registry::{render, DocumentFormat, Registry, RegistryConfig};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::openapi::{InfoBuilder, OpenApi};

mod dtos;

use dtos::{ApiError, CreateUser, Order, UpdateUser, User};

#[derive(Parser, Debug)]
#[command(author, version, about = "Generates the OpenAPI document for the user service.")]
struct Cli {
    /// Output encoding: json, pretty or yaml.
    #[arg(short, long, default_value = "pretty", env = "OPENAPI_FORMAT")]
    format: DocumentFormat,

    /// Write to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Manifest to read `[package.metadata.oas_registry]` from.
    #[arg(long, default_value = concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml"))]
    manifest: PathBuf,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,oas_registry=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = load_config(&cli.manifest)?;
    let doc = build_document(config).context("Failed to build the OpenAPI document")?;
    let rendered = render(&doc, cli.format)?;

    match &cli.output {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), format = %cli.format, "wrote OpenAPI document");
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

fn load_config(manifest: &Path) -> Result<RegistryConfig> {
    let mut config = RegistryConfig::from_manifest(manifest)
        .with_context(|| format!("Failed to read {}", manifest.display()))?;
    if config.host_module.is_none() {
        config = config.with_host_module(oas_registry::host_module!());
    }
    Ok(config.apply_env()?)
}

fn build_document(config: RegistryConfig) -> oas_registry::Result<OpenApi> {
    let info = InfoBuilder::new()
        .title("User Service API")
        .version(env!("CARGO_PKG_VERSION"))
        .build();
    let mut registry = Registry::with_config(info, config);

    registry
        .add_endpoint("GET", "/users")?
        .with_summary("List users")?
        .with_tags(["users"])?
        .with_response_with_content::<Vec<User>>(200, "")?;

    registry
        .add_endpoint("POST", "/users")?
        .with_summary("Create a user")?
        .with_tags(["users"])?
        .with_request_body::<CreateUser>()?
        .with_response_with_content::<User>(201, "")?
        .with_response_with_content::<ApiError>(409, "Email already registered")?;

    registry
        .add_endpoint("GET", "/users/{userId}")?
        .with_summary("Fetch a user")?
        .with_tags(["users"])?
        .with_response_with_content::<User>(200, "")?
        .with_response_with_content::<ApiError>(404, "")?;

    registry
        .add_endpoint("PATCH", "/users/{userId}")?
        .with_summary("Update a user")?
        .with_tags(["users"])?
        .with_request_body::<UpdateUser>()?
        .with_response_with_content::<User>(200, "")?
        .with_response_with_content::<ApiError>(404, "")?;

    registry
        .add_endpoint("DELETE", "/users/{userId}")?
        .with_summary("Delete a user")?
        .with_description("Also cancels the user's open orders.")?
        .with_tags(["users"])?
        .with_response(204, "")?;

    registry
        .add_endpoint("GET", "/users/{userId}/orders")?
        .with_summary("List a user's orders")?
        .with_tags(["orders"])?
        .with_response_with_content::<Vec<Order>>(200, "")?;

    registry
        .add_endpoint("GET", "/users/{userId}/orders/{orderId}")?
        .with_summary("Fetch one order")?
        .with_tags(["orders"])?
        .with_response_with_content::<Order>(200, "")?
        .with_response_with_content::<ApiError>(404, "")?;

    registry.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest() -> PathBuf {
        PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml"))
    }

    #[test]
    fn manifest_config_trims_module_prefix() {
        let config = RegistryConfig::from_manifest(manifest()).unwrap();
        assert_eq!(config.schema_key_prefixes_to_trim, vec!["Dtos"]);
    }

    #[test]
    fn document_uses_short_schema_names() {
        let config = RegistryConfig::from_manifest(manifest())
            .unwrap()
            .with_host_module(oas_registry::host_module!());
        let doc = build_document(config).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&render(&doc, DocumentFormat::Json).unwrap()).unwrap();
        let mut names: Vec<&String> = json["components"]["schemas"]
            .as_object()
            .unwrap()
            .keys()
            .collect();
        names.sort();
        assert_eq!(names, ["ApiError", "CreateUser", "Order", "UpdateUser", "User"]);

        let order = &json["paths"]["/users/{userId}/orders/{orderId}"]["get"];
        assert_eq!(order["operationId"], "getUserOrder");
        assert_eq!(order["responses"]["404"]["description"], "Not Found");
    }
}
