//! `@transform(get:)`: flatten a field's value after the operation resolved.
//!
//! At compile time the directive rewrites the field's response schema and
//! records a [`PostResolveTransformation`]. At runtime the transformation is
//! applied to the response data with [`apply_transformations`].
//!
//! Paths use `"[]"` to mark array boundaries: `["data", "users", "[]", "name"]`
//! addresses the `name` of every element of `data.users`.

use apollo_compiler::ast::Directive;
use serde_json::{json, Value};

use crate::directives::string_argument;
use crate::error::CompileError;
use crate::types::{GetTransformation, PostResolveTransformation, TransformationKind};

/// Path segment marking an array boundary.
pub const ARRAY_SEGMENT: &str = "[]";

/// Resolve `@transform(get:)` against `field_schema`.
///
/// Returns the schema of the value the client receives after flattening.
/// Every array crossed on the way wraps that schema in an array again, since
/// the runtime collects one value per element.
///
/// # Errors
///
/// Returns `CompileError::InvalidTransformPath` if a segment names no
/// property of the schema at its position.
pub(crate) fn handle_transform_directive(
    directive: &Directive,
    field_schema: Value,
    document_path: &[String],
    transformations: &mut Vec<PostResolveTransformation>,
) -> Result<Value, CompileError> {
    let Some(get) = string_argument(directive, "get")? else {
        return Ok(field_schema);
    };
    let invalid = || CompileError::InvalidTransformPath {
        path: get.to_string(),
        schema: field_schema.to_string(),
    };

    let mut resolved = Vec::new();
    let mut arrays = 0;
    let mut node = &field_schema;
    for segment in get.split('.') {
        if segment == ARRAY_SEGMENT {
            node = node.get("items").ok_or_else(invalid)?;
            resolved.push(ARRAY_SEGMENT.to_string());
            arrays += 1;
            continue;
        }
        if let Some(items) = node.get("items") {
            node = items;
            resolved.push(ARRAY_SEGMENT.to_string());
            arrays += 1;
        }
        node = node
            .get("properties")
            .and_then(|properties| properties.get(segment))
            .ok_or_else(invalid)?;
        resolved.push(segment.to_string());
    }

    let mut schema = node.clone();
    for _ in 0..arrays {
        schema = json!({ "type": "array", "items": schema });
    }

    let mut from = document_path.to_vec();
    from.extend(resolved);
    transformations.push(PostResolveTransformation {
        kind: TransformationKind::Get,
        depth: from.len(),
        get: GetTransformation {
            from,
            to: document_path.to_vec(),
        },
    });
    Ok(schema)
}

impl PostResolveTransformation {
    /// Apply this transformation to a response in place.
    ///
    /// Missing values become `null`.
    pub fn apply(&self, response: &mut Value) {
        let to = &self.get.to;
        let suffix = self.get.from.get(to.len()..).unwrap_or_default();
        apply_at(response, to, suffix);
    }
}

/// Apply `transformations` in order.
pub fn apply_transformations(transformations: &[PostResolveTransformation], response: &mut Value) {
    for transformation in transformations {
        transformation.apply(response);
    }
}

fn apply_at(node: &mut Value, to: &[String], suffix: &[String]) {
    let Some((first, rest)) = to.split_first() else {
        *node = extract(node, suffix);
        return;
    };
    if first == ARRAY_SEGMENT {
        if let Value::Array(items) = node {
            for item in items {
                apply_at(item, rest, suffix);
            }
        }
        return;
    }
    if let Some(child) = node.get_mut(first.as_str()) {
        apply_at(child, rest, suffix);
    }
}

fn extract(node: &Value, path: &[String]) -> Value {
    let Some((first, rest)) = path.split_first() else {
        return node.clone();
    };
    if first == ARRAY_SEGMENT {
        return match node {
            Value::Array(items) => Value::Array(items.iter().map(|item| extract(item, rest)).collect()),
            _ => Value::Null,
        };
    }
    match node.get(first.as_str()) {
        Some(child) => extract(child, rest),
        None => Value::Null,
    }
}
