//! Reading schemas, operation directories and compiled output from disk.

use std::path::{Path, PathBuf};

use apollo_compiler::ast::{Definition, Document, FragmentDefinition};
use apollo_compiler::Node;
use serde_json::Value;
use walkdir::WalkDir;

use crate::error::LoadError;
use crate::printer::reachable_fragments;
use crate::types::{GraphQLOperationFile, LoadOperationsOutput, ParsedOperations};

const OPERATION_EXTENSION: &str = "graphql";

fn read(path: &Path) -> Result<String, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    std::fs::read_to_string(path).map_err(|source| LoadError::ReadError {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a GraphQL schema document.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` if the file doesn't exist,
/// or `LoadError::ReadError` if it can't be read.
pub fn load_schema_sdl(path: &Path) -> Result<String, LoadError> {
    read(path)
}

/// Load a loader output document (`graphql_operation_files`, `invalid`, ...).
///
/// # Errors
///
/// Returns `LoadError::InvalidJson` if the file isn't a loader output document.
pub fn load_operations_json(path: &Path) -> Result<LoadOperationsOutput, LoadError> {
    let content = read(path)?;
    serde_json::from_str(&content).map_err(|source| LoadError::InvalidJson { source })
}

/// Load a variables payload.
///
/// # Errors
///
/// Returns `LoadError::InvalidJson` if the file isn't valid JSON.
pub fn load_variables(path: &Path) -> Result<Value, LoadError> {
    let content = read(path)?;
    serde_json::from_str(&content).map_err(|source| LoadError::InvalidJson { source })
}

/// Load the output of a previous compilation.
pub fn load_compiled_operations(path: &Path) -> Result<ParsedOperations, LoadError> {
    let content = read(path)?;
    serde_json::from_str(&content).map_err(|source| LoadError::InvalidJson { source })
}

/// Collect every `*.graphql` file below `operations_root`.
///
/// The path relative to the root, without extension, is the operation's mount
/// path; slashes become underscores in its name. Fragments from
/// `fragments_root` are appended to each operation that spreads them.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` for a missing root directory, or an IO
/// error while walking or reading it.
pub fn load_operations_dir(
    operations_root: &Path,
    fragments_root: Option<&Path>,
) -> Result<LoadOperationsOutput, LoadError> {
    if !operations_root.is_dir() {
        return Err(LoadError::FileNotFound {
            path: operations_root.to_path_buf(),
        });
    }

    let mut output = LoadOperationsOutput::default();
    let fragments = match fragments_root {
        Some(root) => load_fragments(root, &mut output)?,
        None => Vec::new(),
    };

    for path in graphql_files(operations_root, &mut output.info)? {
        let Some(mount_path) = mount_path(operations_root, &path) else {
            continue;
        };
        if !is_valid_operation_name(&mount_path) {
            output.info.push(format!(
                "skipping {}: operation names must start with a letter and contain only letters, digits and '/'",
                path.display()
            ));
            output.invalid.push(mount_path);
            continue;
        }

        let mut content = read(&path)?;
        for fragment in used_fragments(&content, &path, &fragments) {
            content.push_str("\n\n");
            content.push_str(fragment);
        }

        tracing::debug!(operation = %mount_path, path = %path.display(), "loaded operation file");
        output.graphql_operation_files.push(GraphQLOperationFile {
            operation_name: mount_path.replace('/', "_"),
            api_mount_path: mount_path,
            file_path: path.display().to_string(),
            content,
        });
    }
    Ok(output)
}

/// A fragment definition together with its printed source.
struct SharedFragment {
    definition: Node<FragmentDefinition>,
    source: String,
}

fn load_fragments(
    root: &Path,
    output: &mut LoadOperationsOutput,
) -> Result<Vec<SharedFragment>, LoadError> {
    if !root.is_dir() {
        return Err(LoadError::FileNotFound {
            path: root.to_path_buf(),
        });
    }
    let mut fragments = Vec::new();
    for path in graphql_files(root, &mut output.info)? {
        let content = read(&path)?;
        let document = match Document::parse(content, &path) {
            Ok(document) => document,
            Err(with_errors) => {
                output
                    .errors
                    .push(format!("{}: {}", path.display(), with_errors.errors));
                continue;
            }
        };
        for definition in document.definitions {
            if let Definition::FragmentDefinition(definition) = definition {
                fragments.push(SharedFragment {
                    source: definition.to_string(),
                    definition,
                });
            }
        }
    }
    Ok(fragments)
}

/// Shared fragment sources reachable from the operations in `content`,
/// skipping names the file defines itself.
fn used_fragments<'a>(content: &str, path: &Path, shared: &'a [SharedFragment]) -> Vec<&'a str> {
    if shared.is_empty() {
        return Vec::new();
    }
    // Parse errors are reported later by the compiler.
    let document = Document::parse(content, path).unwrap_or_else(|with_errors| with_errors.partial);

    let local: Vec<&Node<FragmentDefinition>> = document
        .definitions
        .iter()
        .filter_map(|definition| match definition {
            Definition::FragmentDefinition(fragment) => Some(fragment),
            _ => None,
        })
        .collect();
    let mut candidates = local.clone();
    candidates.extend(
        shared
            .iter()
            .map(|fragment| &fragment.definition)
            .filter(|fragment| !local.iter().any(|l| l.name == fragment.name)),
    );

    let mut used: Vec<&'a str> = Vec::new();
    for definition in &document.definitions {
        let Definition::OperationDefinition(operation) = definition else {
            continue;
        };
        for fragment in reachable_fragments(&operation.selection_set, &candidates) {
            if let Some(shared) = shared
                .iter()
                .find(|shared| std::ptr::eq(&shared.definition, fragment))
            {
                if !used.contains(&shared.source.as_str()) {
                    used.push(shared.source.as_str());
                }
            }
        }
    }
    used
}

fn graphql_files(root: &Path, info: &mut Vec<String>) -> Result<Vec<PathBuf>, LoadError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|source| LoadError::Walk {
            path: root.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.into_path();
        if path.extension().and_then(|ext| ext.to_str()) == Some(OPERATION_EXTENSION) {
            files.push(path);
        } else {
            info.push(format!("skipping non-graphql file {}", path.display()));
        }
    }
    Ok(files)
}

/// Relative path without extension, `/`-separated on every platform.
fn mount_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?.with_extension("");
    let components: Vec<&str> = relative
        .components()
        .map(|component| component.as_os_str().to_str())
        .collect::<Option<_>>()?;
    Some(components.join("/"))
}

fn is_valid_operation_name(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '/')
}
