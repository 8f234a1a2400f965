//! Loading a project's YAML files into a [`Spec`].
//!
//! Every `*.yaml`/`*.yml` file in the project's `src/` folder is a mapping
//! with any of the keys `webhooks`, `functions` and `subgraphs`. Each value
//! is a list of single-key objects:
//!
//! ```yaml
//! webhooks:
//!   - alerts:
//!       url: https://example.com/hook
//!       secret: s3cret
//! functions:
//!   - transfers:
//!       chain_id: CHAIN_ETH_MAINNET
//!       webhook: alerts
//!       code: functions/transfers.ts
//!       triggers:
//!         - type: TRIGGER_TYPE_ADDRESS
//!           address: "0xabc"
//! ```
//!
//! Files are merged in name order. Unknown keys and names declared twice are
//! rejected. Resolution then reads code files, zips source folders and reads
//! schema files, all relative to the project directory.

use crate::code;
use crate::error::{Error, Result};
use crate::trigger::Trigger;
use crate::types::{FunctionSpec, Spec, SubgraphSpec, WebhookSpec};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Folder, relative to the project, holding the YAML files.
pub const YAML_SOURCE_FOLDER: &str = "src";

/// A function as written in YAML, before code resolution.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawFunctionSpec {
    pub chain_id: String,
    #[serde(default)]
    pub triggers: Vec<Trigger>,
    #[serde(default)]
    pub webhook: Option<String>,
    /// Path to a single source file.
    #[serde(default)]
    pub code: Option<String>,
    /// Path to a source folder, bundled as a zip archive.
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub is_enabled: Option<bool>,
    #[serde(default)]
    pub should_send_std_streams: Option<bool>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A subgraph as written in YAML: a path to a GraphQL schema file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawSubgraphSpec {
    pub schema: String,
}

/// Merged YAML declarations, with file references still unresolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSpec {
    pub webhooks: BTreeMap<String, WebhookSpec>,
    pub functions: BTreeMap<String, RawFunctionSpec>,
    pub subgraphs: BTreeMap<String, RawSubgraphSpec>,
}

/// List the YAML files of a source folder, sorted by file name.
pub fn list_yaml_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::Validation(format!(
            "YAML source folder {} does not exist",
            dir.display()
        )));
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
        let path = entry.map_err(|e| Error::io(dir, e))?.path();
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == "yaml" || ext == "yml");
        if is_yaml && path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    log::info!("Found {} yaml files in {}", files.len(), dir.display());
    Ok(files)
}

/// Merge YAML documents, given as `(path, content)` pairs, in order.
pub fn merge_documents(documents: &[(PathBuf, String)]) -> Result<RawSpec> {
    let mut spec = RawSpec::default();

    for (path, content) in documents {
        let document: Value = serde_yaml::from_str(content)
            .map_err(|e| Error::Parse(format!("{}: {}", path.display(), e)))?;

        let mapping = match document {
            Value::Null => continue,
            Value::Mapping(mapping) => mapping,
            _ => {
                return Err(Error::Validation(format!(
                    "Yaml file {} must be a mapping of webhooks, functions and subgraphs",
                    path.display()
                )));
            }
        };

        for (key, value) in mapping {
            let key = key_name(&key, path)?;
            match key.as_str() {
                "webhooks" => merge_section(&mut spec.webhooks, "webhooks", value, path)?,
                "functions" => merge_section(&mut spec.functions, "functions", value, path)?,
                "subgraphs" => merge_section(&mut spec.subgraphs, "subgraphs", value, path)?,
                other => {
                    return Err(Error::Validation(format!(
                        "Unsupported key found in yaml file {}: {}",
                        path.display(),
                        other
                    )));
                }
            }
        }
    }

    Ok(spec)
}

fn key_name(key: &Value, path: &Path) -> Result<String> {
    key.as_str().map(String::from).ok_or_else(|| {
        Error::Validation(format!(
            "Unsupported key found in yaml file {}: {:?}",
            path.display(),
            key
        ))
    })
}

fn merge_section<T: DeserializeOwned>(
    target: &mut BTreeMap<String, T>,
    section: &str,
    value: Value,
    path: &Path,
) -> Result<()> {
    let items = match value {
        Value::Null => return Ok(()),
        Value::Sequence(items) => items,
        _ => {
            return Err(Error::Validation(format!(
                "The {} section of {} must be a list",
                section,
                path.display()
            )));
        }
    };

    for item in items {
        let Value::Mapping(entry) = item else {
            return Err(Error::Validation(format!(
                "Each {} item in {} must be a single-key mapping",
                section,
                path.display()
            )));
        };
        if entry.len() != 1 {
            return Err(Error::Validation(format!(
                "Each {} item in {} must be a single-key mapping",
                section,
                path.display()
            )));
        }

        for (name, body) in entry {
            let name = key_name(&name, path)?;
            if target.contains_key(&name) {
                return Err(Error::Validation(format!(
                    "Duplicate {} item found in {}: {}",
                    section,
                    path.display(),
                    name
                )));
            }
            let parsed: T = serde_yaml::from_value(body).map_err(|e| {
                Error::Validation(format!(
                    "Invalid {} item {} in {}: {}",
                    section,
                    name,
                    path.display(),
                    e
                ))
            })?;
            target.insert(name, parsed);
        }
    }

    Ok(())
}

/// Read and merge every YAML file of a project.
pub fn load_raw(project_dir: &Path) -> Result<RawSpec> {
    let files = list_yaml_files(&project_dir.join(YAML_SOURCE_FOLDER))?;
    let mut documents = Vec::with_capacity(files.len());
    for path in files {
        let content = fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        documents.push((path, content));
    }
    merge_documents(&documents)
}

/// Resolve file references into base64 payloads.
pub fn resolve(raw: RawSpec, base_dir: &Path) -> Result<Spec> {
    let mut spec = Spec {
        webhooks: raw.webhooks,
        ..Spec::default()
    };

    for (name, subgraph) in raw.subgraphs {
        let path = base_dir.join(&subgraph.schema);
        let content = fs::read(&path).map_err(|e| Error::io(&path, e))?;
        spec.subgraphs.insert(
            name,
            SubgraphSpec {
                schema: code::encode(&content),
            },
        );
    }

    for (name, function) in raw.functions {
        let resolved = resolve_function(&name, function, base_dir)?;
        spec.functions.insert(name, resolved);
    }

    Ok(spec)
}

fn resolve_function(name: &str, raw: RawFunctionSpec, base_dir: &Path) -> Result<FunctionSpec> {
    let webhook = raw
        .webhook
        .ok_or_else(|| Error::Validation(format!("Function {name} is missing a webhook")))?;

    let code = match (raw.code, raw.source) {
        (Some(file), None) => {
            let path = base_dir.join(file);
            let content = fs::read(&path).map_err(|e| Error::io(&path, e))?;
            code::encode(&content)
        }
        (None, Some(folder)) => {
            let archive = code::zip_directory(&base_dir.join(folder))?;
            code::encode(&archive)
        }
        _ => {
            return Err(Error::Validation(format!(
                "Function {name} must either include \"code\" or \"source\" fields"
            )));
        }
    };

    Ok(FunctionSpec {
        chain_id: raw.chain_id,
        triggers: raw.triggers,
        webhook,
        code,
        is_enabled: raw.is_enabled,
        should_send_std_streams: raw.should_send_std_streams,
        description: raw.description,
    })
}

/// Load and resolve a whole project.
pub fn load_project(project_dir: &Path) -> Result<Spec> {
    resolve(load_raw(project_dir)?, project_dir)
}
