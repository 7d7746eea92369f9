use std::fmt;
use std::str::FromStr;

use utoipa::openapi::OpenApi;

use crate::error::{Error, Result};

/// Output encodings for a finished document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DocumentFormat {
    #[default]
    Json,
    PrettyJson,
    Yaml,
}

impl FromStr for DocumentFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(DocumentFormat::Json),
            "pretty" | "pretty-json" => Ok(DocumentFormat::PrettyJson),
            "yaml" | "yml" => Ok(DocumentFormat::Yaml),
            other => Err(Error::Config(format!("unknown document format: {other}"))),
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DocumentFormat::Json => "json",
            DocumentFormat::PrettyJson => "pretty",
            DocumentFormat::Yaml => "yaml",
        })
    }
}

/// Serializes a finalized document.
pub fn render(doc: &OpenApi, format: DocumentFormat) -> Result<String> {
    match format {
        DocumentFormat::Json => Ok(doc.to_json()?),
        DocumentFormat::PrettyJson => Ok(doc.to_pretty_json()?),
        DocumentFormat::Yaml => doc.to_yaml().map_err(|e| Error::Serialize(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use utoipa::openapi::{Info, OpenApiBuilder};

    use super::*;

    fn doc() -> OpenApi {
        OpenApiBuilder::new().info(Info::new("Shop", "1.0.0")).build()
    }

    #[test]
    fn formats_parse_case_insensitively() {
        assert_eq!("YAML".parse::<DocumentFormat>().unwrap(), DocumentFormat::Yaml);
        assert_eq!("yml".parse::<DocumentFormat>().unwrap(), DocumentFormat::Yaml);
        assert_eq!("pretty".parse::<DocumentFormat>().unwrap(), DocumentFormat::PrettyJson);
        assert!(matches!("xml".parse::<DocumentFormat>(), Err(Error::Config(_))));
    }

    #[test]
    fn json_is_compact_and_pretty_is_not() {
        let compact = render(&doc(), DocumentFormat::Json).unwrap();
        let pretty = render(&doc(), DocumentFormat::PrettyJson).unwrap();
        assert!(!compact.contains('\n'));
        assert!(pretty.contains('\n'));
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&compact).unwrap(),
            serde_json::from_str::<serde_json::Value>(&pretty).unwrap()
        );
    }

    #[test]
    fn yaml_carries_the_title() {
        let yaml = render(&doc(), DocumentFormat::Yaml).unwrap();
        assert!(yaml.contains("title: Shop"));
        assert!(yaml.starts_with("openapi:"));
    }
}
