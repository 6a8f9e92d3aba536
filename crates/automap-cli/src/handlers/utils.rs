//! Shared utilities for command handlers

use crate::cli::OutputFormat;
use crate::config::{Config, FileFormat};
use crate::error::{Error, Result};
use crate::output::OutputFormatter;
use automap_core::{AutoMapper, FilePlanStore, ShapeCatalog, ShapeDocument, ShapeId};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Read a JSON, YAML or TOML document
pub fn read_document(path: &Path) -> Result<serde_json::Value> {
    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path)?;
    debug!(path = %path.display(), bytes = content.len(), "Document read");

    let format = FileFormat::from_path(path);
    let invalid = |message: String| Error::InvalidFormat {
        path: path.to_path_buf(),
        expected: format.name().to_string(),
        message,
    };

    match format {
        FileFormat::Json => serde_json::from_str(&content).map_err(|e| invalid(e.to_string())),
        FileFormat::Yaml => serde_yaml::from_str(&content).map_err(|e| invalid(e.to_string())),
        FileFormat::Toml => toml::from_str(&content).map_err(|e| invalid(e.to_string())),
    }
}

/// Load the shape catalog from `--shapes` or the configured document
pub fn load_shapes(explicit: Option<&Path>, config: &Config) -> Result<ShapeCatalog> {
    let path = explicit
        .or(config.paths.shapes.as_deref())
        .ok_or_else(|| {
            Error::invalid_args("no shape document: pass --shapes or set paths.shapes")
        })?;

    let document = read_document(path)?;
    let document: ShapeDocument =
        serde_json::from_value(document).map_err(|e| Error::InvalidFormat {
            path: path.to_path_buf(),
            expected: "shape document".to_string(),
            message: e.to_string(),
        })?;
    debug!(
        classes = document.classes.len(),
        enums = document.enums.len(),
        "Shape document loaded"
    );

    Ok(ShapeCatalog::from_document(document)?)
}

/// Build a mapper over `shapes`, persisting plans when a cache directory is configured
pub fn build_mapper(shapes: ShapeCatalog, config: &Config) -> Result<AutoMapper> {
    let mut builder = AutoMapper::builder()
        .shapes(shapes)
        .config(config.mapper.clone());

    if let Some(dir) = &config.paths.plan_cache_dir {
        debug!(dir = %dir.display(), "Using file plan store");
        builder = builder.store(FilePlanStore::new(dir.clone())?);
    }

    Ok(builder.build()?)
}

/// Parse a shape argument (`map`, `dynamic` or a class name)
pub fn parse_shape(text: &str) -> Result<ShapeId> {
    text.parse::<ShapeId>()
        .map_err(|e| Error::invalid_args(e.to_string()))
}

/// Render a value for a file, following the file extension
pub fn render_for_file(value: &serde_json::Value, path: &Path) -> Result<String> {
    let format = match FileFormat::from_path(path) {
        FileFormat::Yaml => OutputFormat::Yaml,
        _ => OutputFormat::JsonPretty,
    };
    format.format(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const SHAPES_YAML: &str = r#"
classes:
  - name: Person
    members:
      - name: firstName
        type: string
      - name: age
        type: int
  - name: PersonDto
    members:
      - name: firstName
        type: string
      - name: age
        type: string
"#;

    #[test]
    fn test_read_documents_by_extension() {
        let dir = TempDir::new().unwrap();
        let yaml = dir.path().join("input.yaml");
        fs::write(&yaml, "name: Ada\nage: 36\n").unwrap();
        let toml_path = dir.path().join("input.toml");
        fs::write(&toml_path, "name = \"Ada\"\nage = 36\n").unwrap();

        let expected = serde_json::json!({"name": "Ada", "age": 36});
        assert_eq!(read_document(&yaml).unwrap(), expected);
        assert_eq!(read_document(&toml_path).unwrap(), expected);
    }

    #[test]
    fn test_read_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        let err = read_document(&path).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat { .. }));
    }

    #[test]
    fn test_load_shapes_from_config_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shapes.yaml");
        fs::write(&path, SHAPES_YAML).unwrap();

        let mut config = Config::default();
        config.paths.shapes = Some(path);
        let catalog = load_shapes(None, &config).unwrap();
        assert_eq!(catalog.class_names().collect::<Vec<_>>(), vec!["Person", "PersonDto"]);
    }

    #[test]
    fn test_load_shapes_requires_a_document() {
        let err = load_shapes(None, &Config::default()).unwrap_err();
        assert!(err.should_show_help());
    }

    #[test]
    fn test_build_mapper_with_plan_cache() {
        let dir = TempDir::new().unwrap();
        let shapes_path = dir.path().join("shapes.yaml");
        fs::write(&shapes_path, SHAPES_YAML).unwrap();

        let mut config = Config::default();
        config.paths.plan_cache_dir = Some(dir.path().join("plans"));
        let catalog = load_shapes(Some(shapes_path.as_path()), &config).unwrap();
        let mapper = build_mapper(catalog, &config).unwrap();

        let plan = mapper
            .plan(&ShapeId::class("Person"), &ShapeId::class("PersonDto"))
            .unwrap();
        let stored = dir
            .path()
            .join("plans")
            .join(format!("{}.json", plan.mapper_name));
        assert!(stored.exists());
    }

    #[test]
    fn test_parse_shape() {
        assert_eq!(parse_shape("map").unwrap(), ShapeId::Map);
        assert_eq!(parse_shape("Person").unwrap(), ShapeId::class("Person"));
        assert!(parse_shape("  ").is_err());
    }

    #[test]
    fn test_render_for_file() {
        let value = serde_json::json!({"a": 1});
        let yaml = render_for_file(&value, &PathBuf::from("out.yml")).unwrap();
        assert_eq!(yaml.trim(), "a: 1");
        let json = render_for_file(&value, &PathBuf::from("out.json")).unwrap();
        assert!(json.contains("\"a\": 1"));
    }
}
