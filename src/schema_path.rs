//! Navigation of generated JSON Schemas by property path.
//!
//! A path is a list of property names starting at the schema root, e.g.
//! `["input", "author", "email"]`. Navigation looks through `$ref` into the
//! root's `definitions`, through the non-null member of a nullable `anyOf`,
//! through array `items` and into the `oneOf` variant that declares a property.

use serde_json::{Map, Value};

/// A path component that names no property at its position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UnresolvedPath {
    pub component: String,
    pub available: Vec<String>,
}

fn ref_name(node: &Value) -> Option<&str> {
    node.get("$ref")?.as_str()?.strip_prefix("#/definitions/")
}

fn is_null_schema(node: &Value) -> bool {
    node.get("type").and_then(Value::as_str) == Some("null")
}

/// Index of the non-null member of `{"anyOf": [schema, {"type": "null"}]}`.
fn non_null_variant(node: &Value) -> Option<usize> {
    node.get("anyOf")?
        .as_array()?
        .iter()
        .position(|member| !is_null_schema(member))
}

fn one_of_variants(node: &Value) -> impl Iterator<Item = &Value> {
    node.get("oneOf")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

fn declares(node: &Value, component: &str) -> bool {
    node.get("properties")
        .and_then(|properties| properties.get(component))
        .is_some()
}

/// Look through references, nullable wrappers and arrays to the object schema.
fn object_node<'a>(definitions: Option<&'a Value>, mut node: &'a Value) -> &'a Value {
    loop {
        if let Some(target) = ref_name(node).and_then(|name| definitions?.get(name)) {
            node = target;
            continue;
        }
        if let Some(index) = non_null_variant(node) {
            node = &node["anyOf"][index];
            continue;
        }
        match node.get("items") {
            Some(items) if node.get("properties").is_none() => node = items,
            _ => return node,
        }
    }
}

/// The property `component` of `object`, declared directly or by a `oneOf` variant.
fn child<'a>(object: &'a Value, component: &str) -> Option<&'a Value> {
    std::iter::once(object)
        .chain(one_of_variants(object))
        .find_map(|node| node.get("properties")?.get(component))
}

fn property_names(node: &Value) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for node in std::iter::once(node).chain(one_of_variants(node)) {
        let Some(properties) = node.get("properties").and_then(Value::as_object) else {
            continue;
        };
        for name in properties.keys() {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
    }
    names
}

/// Resolve `path` read-only against the schema rooted at `root`.
pub(crate) fn resolve<'a>(root: &'a Value, path: &[String]) -> Result<&'a Value, UnresolvedPath> {
    let definitions = root.get("definitions");
    let mut node = root;
    for component in path {
        let object = object_node(definitions, node);
        match child(object, component) {
            Some(next) => node = next,
            None => {
                return Err(UnresolvedPath {
                    component: component.clone(),
                    available: property_names(object),
                })
            }
        }
    }
    Ok(node)
}

/// Mutable access to the property at `path`.
///
/// Every `$ref` crossed on the way, and one held by the property itself, is
/// replaced by a copy of its definition, so the change stays local to this path.
pub(crate) fn property_mut<'a>(root: &'a mut Value, path: &[String]) -> Option<&'a mut Value> {
    let definitions = root.get("definitions").cloned();
    let target = descend_mut(root, path, definitions.as_ref())?;
    if !path.is_empty() {
        inline_ref(target, definitions.as_ref());
    }
    Some(target)
}

/// Remove the property at `path` along with its `required` entry.
///
/// A `oneOf` variant that declared the property is dropped with it. Returns
/// `false` when the path does not resolve.
pub(crate) fn remove_property(root: &mut Value, path: &[String]) -> bool {
    let Some((leaf, parents)) = path.split_last() else {
        return false;
    };
    let definitions = root.get("definitions").cloned();
    let Some(parent) = descend_mut(root, parents, definitions.as_ref()) else {
        return false;
    };
    let Some(Value::Object(object)) = object_node_mut(parent, definitions.as_ref()) else {
        return false;
    };
    if remove_from_object(object, leaf) {
        return true;
    }
    match object.get_mut("oneOf") {
        Some(Value::Array(variants)) => {
            let before = variants.len();
            variants.retain(|variant| !declares(variant, leaf));
            variants.len() != before
        }
        _ => false,
    }
}

fn remove_from_object(object: &mut Map<String, Value>, leaf: &str) -> bool {
    let removed = match object.get_mut("properties") {
        Some(Value::Object(properties)) => properties.shift_remove(leaf).is_some(),
        _ => false,
    };
    if let Some(Value::Array(required)) = object.get_mut("required") {
        required.retain(|name| name != leaf);
        if required.is_empty() {
            object.shift_remove("required");
        }
    }
    removed
}

fn descend_mut<'a>(
    node: &'a mut Value,
    path: &[String],
    definitions: Option<&Value>,
) -> Option<&'a mut Value> {
    let Some((first, rest)) = path.split_first() else {
        return Some(node);
    };
    let object = object_node_mut(node, definitions)?;
    let next = child_mut(object, first)?;
    descend_mut(next, rest, definitions)
}

fn child_mut<'a>(object: &'a mut Value, component: &str) -> Option<&'a mut Value> {
    if declares(object, component) {
        return object.get_mut("properties")?.get_mut(component);
    }
    let variants = object.get_mut("oneOf")?.as_array_mut()?;
    let variant = variants.iter_mut().find(|variant| declares(variant, component))?;
    variant.get_mut("properties")?.get_mut(component)
}

fn inline_ref(node: &mut Value, definitions: Option<&Value>) {
    let inlined = match (ref_name(node), definitions) {
        (Some(name), Some(definitions)) => definitions.get(name).cloned(),
        _ => None,
    };
    if let Some(definition) = inlined {
        *node = definition;
    }
}

fn object_node_mut<'a>(node: &'a mut Value, definitions: Option<&Value>) -> Option<&'a mut Value> {
    inline_ref(node, definitions);
    if let Some(index) = non_null_variant(node) {
        let member = node.get_mut("anyOf")?.get_mut(index)?;
        return object_node_mut(member, definitions);
    }
    if node.get("properties").is_none() && node.get("items").is_some() {
        let items = node.get_mut("items")?;
        return object_node_mut(items, definitions);
    }
    Some(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(p: &str) -> Vec<String> {
        p.split('.').map(str::to_string).collect()
    }

    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "input": { "$ref": "#/definitions/CreateUser" },
                "other": { "$ref": "#/definitions/CreateUser" },
                "tags": { "type": "array", "items": { "$ref": "#/definitions/Tag" } }
            },
            "additionalProperties": false,
            "required": ["input"],
            "definitions": {
                "CreateUser": {
                    "type": "object",
                    "properties": { "email": { "type": "string" }, "name": { "type": "string" } },
                    "additionalProperties": false,
                    "required": ["email", "name"]
                },
                "Tag": {
                    "type": "object",
                    "properties": { "label": { "type": "string" } },
                    "additionalProperties": false
                }
            }
        })
    }

    #[test]
    fn resolve_through_ref_and_items() {
        let schema = schema();
        assert_eq!(resolve(&schema, &path("input.email")).unwrap(), &json!({ "type": "string" }));
        assert_eq!(resolve(&schema, &path("tags.label")).unwrap(), &json!({ "type": "string" }));
    }

    #[test]
    fn resolve_reports_siblings() {
        let schema = schema();
        let err = resolve(&schema, &path("input.emial")).unwrap_err();
        assert_eq!(err.component, "emial");
        assert_eq!(err.available, vec!["email", "name"]);
    }

    #[test]
    fn remove_top_level_property() {
        let mut schema = schema();
        assert!(remove_property(&mut schema, &path("input")));
        assert!(schema["properties"].get("input").is_none());
        assert!(schema.get("required").is_none());
    }

    #[test]
    fn remove_nested_property_is_local() {
        let mut schema = schema();
        assert!(remove_property(&mut schema, &path("input.email")));
        assert_eq!(schema["properties"]["input"]["required"], json!(["name"]));
        assert!(schema["properties"]["input"]["properties"].get("email").is_none());
        // The other reference still sees the full definition.
        assert!(resolve(&schema, &path("other.email")).is_ok());
    }

    #[test]
    fn remove_missing_property() {
        let mut schema = schema();
        assert!(!remove_property(&mut schema, &path("input.age")));
        assert!(!remove_property(&mut schema, &path("missing.email")));
    }

    fn nullable_and_one_of() -> Value {
        json!({
            "type": "object",
            "properties": {
                "maybe": { "anyOf": [{ "$ref": "#/definitions/CreateUser" }, { "type": "null" }] },
                "pick": { "anyOf": [{ "$ref": "#/definitions/Pick" }, { "type": "null" }] }
            },
            "additionalProperties": false,
            "definitions": {
                "CreateUser": {
                    "type": "object",
                    "properties": { "email": { "type": "string" } },
                    "additionalProperties": false,
                    "required": ["email"]
                },
                "Pick": {
                    "type": "object",
                    "oneOf": [
                        {
                            "type": "object",
                            "properties": { "id": { "type": "string" } },
                            "additionalProperties": false,
                            "required": ["id"]
                        },
                        {
                            "type": "object",
                            "properties": { "email": { "type": "string" } },
                            "additionalProperties": false,
                            "required": ["email"]
                        }
                    ]
                }
            }
        })
    }

    #[test]
    fn resolve_through_nullable_reference() {
        let schema = nullable_and_one_of();
        assert_eq!(resolve(&schema, &path("maybe.email")).unwrap(), &json!({ "type": "string" }));
    }

    #[test]
    fn resolve_into_one_of_variant() {
        let schema = nullable_and_one_of();
        assert_eq!(resolve(&schema, &path("pick.id")).unwrap(), &json!({ "type": "string" }));
        let err = resolve(&schema, &path("pick.name")).unwrap_err();
        assert_eq!(err.available, vec!["id", "email"]);
    }

    #[test]
    fn remove_keeps_nullable_wrapper() {
        let mut schema = nullable_and_one_of();
        assert!(remove_property(&mut schema, &path("maybe.email")));
        let maybe = &schema["properties"]["maybe"];
        assert_eq!(maybe["anyOf"][1], json!({ "type": "null" }));
        assert_eq!(maybe["anyOf"][0]["properties"], json!({}));
        assert!(maybe["anyOf"][0].get("required").is_none());
    }

    #[test]
    fn remove_drops_one_of_variant() {
        let mut schema = nullable_and_one_of();
        assert!(remove_property(&mut schema, &path("pick.id")));
        let variants = schema["properties"]["pick"]["anyOf"][0]["oneOf"].as_array().unwrap();
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0]["required"], json!(["email"]));
        assert_eq!(schema["definitions"]["Pick"]["oneOf"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn property_mut_reaches_one_of_variant() {
        let mut schema = nullable_and_one_of();
        let id = property_mut(&mut schema, &path("pick.id")).unwrap();
        id["format"] = json!("uuid");
        assert_eq!(
            schema["properties"]["pick"]["anyOf"][0]["oneOf"][0]["properties"]["id"]["format"],
            json!("uuid")
        );
    }

    #[test]
    fn property_mut_inlines_target_ref() {
        let mut schema = schema();
        let input = property_mut(&mut schema, &path("input")).unwrap();
        assert!(input.get("$ref").is_none());
        input["description"] = json!("new user");
        assert_eq!(schema["properties"]["input"]["properties"]["email"], json!({ "type": "string" }));
        assert!(schema["definitions"]["CreateUser"].get("description").is_none());
    }

    #[test]
    fn property_mut_inlines_refs() {
        let mut schema = schema();
        let email = property_mut(&mut schema, &path("input.email")).unwrap();
        email["maxLength"] = json!(64);
        assert_eq!(schema["properties"]["input"]["properties"]["email"]["maxLength"], json!(64));
        assert!(schema["definitions"]["CreateUser"]["properties"]["email"]
            .get("maxLength")
            .is_none());
    }
}
