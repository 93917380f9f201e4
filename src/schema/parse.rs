//! Schema file parsing and discovery

use crate::error::{SchemaError, SchemaResult};
use crate::schema::types::SchemaDocument;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default schema file names to search for
pub const SCHEMA_FILE_NAMES: &[&str] = &["polycli.yaml", "polycli.yml", "cli.yaml", "cli.yml"];

/// Find the schema file by searching current and parent directories
pub fn find_schema_file() -> SchemaResult<PathBuf> {
    let cwd = env::current_dir().map_err(|e| SchemaError::Read {
        path: PathBuf::from("."),
        error: format!("Failed to get current directory: {}", e),
    })?;
    find_schema_file_from(cwd)
}

/// Find the schema file starting from a specific directory
pub fn find_schema_file_from(start_dir: PathBuf) -> SchemaResult<PathBuf> {
    let mut current_dir = start_dir;
    let mut searched_paths = Vec::new();

    loop {
        for file_name in SCHEMA_FILE_NAMES {
            let schema_path = current_dir.join(file_name);
            searched_paths.push(schema_path.display().to_string());

            if schema_path.is_file() {
                return Ok(schema_path);
            }
        }

        match current_dir.parent() {
            Some(parent) => current_dir = parent.to_path_buf(),
            None => return Err(SchemaError::NotFound(searched_paths.join(", "))),
        }
    }
}

/// Parse a schema document from a path
pub fn parse_schema_file(path: &Path) -> SchemaResult<SchemaDocument> {
    let contents = fs::read_to_string(path).map_err(|e| SchemaError::Read {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;

    parse_schema(&contents)
}

/// Parse a schema document from a string
pub fn parse_schema(yaml: &str) -> SchemaResult<SchemaDocument> {
    Ok(serde_yaml::from_str(yaml)?)
}

/// Load a schema from an explicit path, or discover one from the current directory
pub fn load_schema(path: Option<&Path>) -> SchemaResult<(SchemaDocument, PathBuf)> {
    let schema_path = match path {
        Some(p) => p.to_path_buf(),
        None => find_schema_file()?,
    };
    let document = parse_schema_file(&schema_path)?;
    Ok((document, schema_path))
}
