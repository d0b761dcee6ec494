//! GraphQL type references to JSON Schema fragments.
//!
//! Nullability follows GraphQL: a nullable type adds `"null"` to the JSON
//! `type`, a non-null type marks the property as required on its parent
//! object (or `minItems: 1` on a parent array). Input objects are emitted once
//! per schema under `definitions` and referenced with `$ref`. Definitions never
//! admit `null`; a nullable reference is `{"anyOf": [{"$ref": ...}, {"type": "null"}]}`.

use apollo_compiler::ast::Type;
use apollo_compiler::schema::{EnumType, ExtendedType, InputObjectType};
use apollo_compiler::Schema;
use indexmap::IndexMap;
use serde_json::{json, Map, Value};

/// The per-schema registry of input object definitions.
pub(crate) type Definitions = Map<String, Value>;

pub(crate) struct TypeMapper<'a> {
    schema: &'a Schema,
    custom_json_scalars: &'a [String],
    interpolate_as_json: &'a [String],
    enum_mappings: Option<&'a IndexMap<String, Vec<String>>>,
}

impl<'a> TypeMapper<'a> {
    pub(crate) fn new(schema: &'a Schema, custom_json_scalars: &'a [String]) -> Self {
        Self {
            schema,
            custom_json_scalars,
            interpolate_as_json: &[],
            enum_mappings: None,
        }
    }

    /// Restrict the named custom scalars to a fixed set of string values.
    pub(crate) fn with_enum_mappings(mut self, mappings: &'a IndexMap<String, Vec<String>>) -> Self {
        self.enum_mappings = Some(mappings);
        self
    }

    /// Render the named types as `{}` (any JSON) instead of their structure.
    pub(crate) fn interpolating(mut self, names: &'a [String]) -> Self {
        self.interpolate_as_json = names;
        self
    }

    /// Map `ty` to a JSON Schema fragment for a property called `name` on `parent`.
    pub(crate) fn type_schema(
        &self,
        definitions: &mut Definitions,
        parent: &mut Map<String, Value>,
        ty: &Type,
        name: &str,
        non_null: bool,
    ) -> Value {
        match ty {
            Type::NonNullNamed(_) | Type::NonNullList(_) => {
                mark_non_null(parent, name);
                self.type_schema(definitions, parent, &nullable(ty), name, true)
            }
            Type::List(inner) => {
                let mut list = Map::new();
                list.insert("type".into(), nullable_type("array", non_null));
                let items = self.type_schema(definitions, &mut list, inner, name, false);
                list.insert("items".into(), items);
                Value::Object(list)
            }
            Type::Named(named) => self.named_schema(definitions, named.as_str(), non_null),
        }
    }

    /// Schema for scalars and enums; `None` for composite or unknown types.
    pub(crate) fn leaf_schema(&self, name: &str, non_null: bool) -> Option<Value> {
        let builtin = match name {
            "Int" => Some(json!({ "type": nullable_type("integer", non_null) })),
            "Float" => Some(json!({ "type": nullable_type("number", non_null) })),
            "Boolean" => Some(json!({ "type": nullable_type("boolean", non_null) })),
            "ID" | "String" => Some(json!({ "type": nullable_type("string", non_null) })),
            "JSON" => Some(json!({})),
            "BigInt" if non_null => Some(json!({ "type": ["string", "number"] })),
            "BigInt" => Some(json!({ "type": ["string", "number", "null"] })),
            _ => None,
        };
        if builtin.is_some() {
            return builtin;
        }
        if self.custom_json_scalars.iter().any(|s| s == name)
            || self.interpolate_as_json.iter().any(|s| s == name)
        {
            return Some(json!({}));
        }
        match self.schema.types.get(name) {
            Some(ExtendedType::Scalar(_)) => {
                match self.enum_mappings.and_then(|mappings| mappings.get(name)) {
                    Some(values) => Some(json!({
                        "type": nullable_type("string", non_null),
                        "enum": enum_values(values.iter().map(String::as_str), non_null),
                    })),
                    None => Some(json!({ "type": nullable_type("string", non_null) })),
                }
            }
            Some(ExtendedType::Enum(def)) => Some(enum_schema(name, def, non_null)),
            _ => None,
        }
    }

    fn named_schema(&self, definitions: &mut Definitions, name: &str, non_null: bool) -> Value {
        if let Some(schema) = self.leaf_schema(name, non_null) {
            return schema;
        }
        match self.schema.types.get(name) {
            Some(ExtendedType::InputObject(def)) => {
                self.input_object_ref(definitions, name, def, non_null)
            }
            _ => json!({}),
        }
    }

    fn input_object_ref(
        &self,
        definitions: &mut Definitions,
        name: &str,
        def: &InputObjectType,
        non_null: bool,
    ) -> Value {
        if !definitions.contains_key(name) {
            // Reserve the slot first so self-referencing inputs terminate.
            definitions.insert(name.to_string(), json!({ "type": "object" }));
            let schema = if def.directives.iter().any(|d| d.name.as_str() == "oneOf") {
                self.one_of_schema(definitions, def)
            } else {
                self.input_object_schema(definitions, def)
            };
            definitions.insert(name.to_string(), schema);
        }

        let reference = json!({ "$ref": format!("#/definitions/{name}") });
        if non_null {
            reference
        } else {
            json!({ "anyOf": [reference, { "type": "null" }] })
        }
    }

    fn input_object_schema(&self, definitions: &mut Definitions, def: &InputObjectType) -> Value {
        let mut schema = Map::new();
        schema.insert("type".into(), json!("object"));
        schema.insert("properties".into(), Value::Object(Map::new()));
        schema.insert("additionalProperties".into(), Value::Bool(false));

        for (field_name, field) in &def.fields {
            // A default value makes a non-null field optional.
            let ty = if field.default_value.is_some() {
                nullable(&field.ty)
            } else {
                (*field.ty).clone()
            };
            let field_schema = self.type_schema(definitions, &mut schema, &ty, field_name, false);
            insert_property(&mut schema, field_name, field_schema);
        }
        Value::Object(schema)
    }

    fn one_of_schema(&self, definitions: &mut Definitions, def: &InputObjectType) -> Value {
        let mut variants = Vec::with_capacity(def.fields.len());
        for (field_name, field) in &def.fields {
            let mut variant = Map::new();
            variant.insert("type".into(), json!("object"));
            variant.insert("properties".into(), Value::Object(Map::new()));
            variant.insert("additionalProperties".into(), Value::Bool(false));
            // The selected member must be present and non-null.
            let field_schema = self.type_schema(
                definitions,
                &mut variant,
                &non_null_of(&field.ty),
                field_name,
                false,
            );
            insert_property(&mut variant, field_name, field_schema);
            variants.push(Value::Object(variant));
        }
        json!({
            "type": "object",
            "oneOf": variants,
        })
    }
}

fn enum_schema(name: &str, def: &EnumType, non_null: bool) -> Value {
    json!({
        "type": nullable_type("string", non_null),
        "x-graphql-enum-name": name,
        "enum": enum_values(def.values.keys().map(|value| value.as_str()), non_null),
    })
}

/// `enum` keyword values; a nullable type also admits `null`.
fn enum_values<'v>(values: impl Iterator<Item = &'v str>, non_null: bool) -> Vec<Value> {
    let mut values: Vec<Value> = values.map(|value| Value::String(value.to_string())).collect();
    if !non_null {
        values.push(Value::Null);
    }
    values
}

/// `kind` or `[kind, "null"]`.
pub(crate) fn nullable_type(kind: &str, non_null: bool) -> Value {
    if non_null {
        json!(kind)
    } else {
        json!([kind, "null"])
    }
}

/// Strip one level of non-null.
pub(crate) fn nullable(ty: &Type) -> Type {
    match ty {
        Type::NonNullNamed(name) => Type::Named(name.clone()),
        Type::NonNullList(inner) => Type::List(inner.clone()),
        other => other.clone(),
    }
}

fn non_null_of(ty: &Type) -> Type {
    match ty {
        Type::Named(name) => Type::NonNullNamed(name.clone()),
        Type::List(inner) => Type::NonNullList(inner.clone()),
        other => other.clone(),
    }
}

/// Whether the schema's `type` is (or includes) `kind`.
pub(crate) fn schema_has_type(schema: &Map<String, Value>, kind: &str) -> bool {
    match schema.get("type") {
        Some(Value::String(t)) => t == kind,
        Some(Value::Array(types)) => types.iter().any(|t| t == kind),
        _ => false,
    }
}

/// Append `name` to `schema.required` unless it is already listed.
pub(crate) fn push_required(schema: &mut Map<String, Value>, name: &str) {
    let required = schema
        .entry("required")
        .or_insert_with(|| Value::Array(Vec::new()));
    if let Value::Array(names) = required {
        if !names.iter().any(|n| n == name) {
            names.push(Value::String(name.to_string()));
        }
    }
}

pub(crate) fn insert_property(schema: &mut Map<String, Value>, name: &str, property: Value) {
    if let Some(Value::Object(properties)) = schema.get_mut("properties") {
        properties.insert(name.to_string(), property);
    }
}

fn mark_non_null(parent: &mut Map<String, Value>, name: &str) {
    if schema_has_type(parent, "object") {
        push_required(parent, name);
    } else if schema_has_type(parent, "array") {
        parent.insert("minItems".into(), json!(1));
    }
}
