use crate::errors::CliError;
use anyhow::Result;
use serde::de::DeserializeOwned;
use specimen::{ClassDecl, Schema, Settings};
use std::path::Path;

fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let content = std::fs::read_to_string(path).map_err(|source| CliError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&content).map_err(|source| CliError::ParseError {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a schema file: a YAML list of class declarations.
pub fn load_schema(path: &Path) -> Result<Schema> {
    let decls: Vec<ClassDecl> = read_yaml(path)?;
    let schema = Schema::builder()
        .classes(decls)
        .build()
        .map_err(|source| CliError::SchemaError {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(schema)
}

/// Load generation settings; absent keys keep their defaults.
pub fn load_settings(path: &Path) -> Result<Settings> {
    let settings: Settings = read_yaml(path)?;
    settings.validate()?;
    Ok(settings)
}
