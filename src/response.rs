//! JSON Schema of an operation's response, driven by its selection set.

use apollo_compiler::ast::{Definition, Document, Field, OperationDefinition, Selection, Type};
use apollo_compiler::schema::ExtendedType;
use apollo_compiler::Schema;
use serde_json::{json, Map, Value};

use crate::error::CompileError;
use crate::transform::{handle_transform_directive, ARRAY_SEGMENT};
use crate::type_mapper::{insert_property, nullable, push_required, schema_has_type, TypeMapper};
use crate::types::{OperationType, PostResolveTransformation};

/// Build `{data: {...}}` for `operation`.
///
/// Every `@transform` in the selection set rewrites its field's schema and
/// appends its record to `transformations`.
///
/// # Errors
///
/// Fails on a fragment spread without definition in `document`, when the
/// schema lacks the operation's root type, or on an invalid `@transform`.
pub fn operation_response_to_json_schema(
    schema: &Schema,
    document: &Document,
    operation: &OperationDefinition,
    transformations: &mut Vec<PostResolveTransformation>,
    custom_json_scalars: &[String],
) -> Result<Value, CompileError> {
    let root_type = schema
        .root_operation(operation.operation_type)
        .ok_or_else(|| CompileError::MissingRootType {
            operation_type: OperationType::from(operation.operation_type).to_string(),
        })?;

    let mut builder = ResponseBuilder {
        schema,
        document,
        mapper: TypeMapper::new(schema, custom_json_scalars),
        transformations,
    };
    let data = builder.object_schema(
        root_type.as_str(),
        &operation.selection_set,
        &mut vec!["data".to_string()],
    )?;

    Ok(json!({
        "type": "object",
        "properties": { "data": data },
        "additionalProperties": false
    }))
}

struct ResponseBuilder<'a> {
    schema: &'a Schema,
    document: &'a Document,
    mapper: TypeMapper<'a>,
    transformations: &'a mut Vec<PostResolveTransformation>,
}

impl ResponseBuilder<'_> {
    fn object_schema(
        &mut self,
        type_name: &str,
        selections: &[Selection],
        path: &mut Vec<String>,
    ) -> Result<Value, CompileError> {
        let mut object = Map::new();
        object.insert("type".into(), json!("object"));
        object.insert("properties".into(), Value::Object(Map::new()));
        object.insert("additionalProperties".into(), Value::Bool(false));

        self.resolve_selections(selections, type_name, &mut object, path)?;

        // Which fields arrive depends on the concrete type.
        if matches!(
            self.schema.types.get(type_name),
            Some(ExtendedType::Union(_) | ExtendedType::Interface(_))
        ) {
            object.remove("required");
        }
        Ok(Value::Object(object))
    }

    fn resolve_selections(
        &mut self,
        selections: &[Selection],
        type_name: &str,
        parent: &mut Map<String, Value>,
        path: &mut Vec<String>,
    ) -> Result<(), CompileError> {
        let is_union = matches!(self.schema.types.get(type_name), Some(ExtendedType::Union(_)));

        for selection in selections {
            match selection {
                Selection::Field(field) if field.name.as_str() == "__typename" => {
                    let name = response_name(field);
                    add_typenames(parent, name, self.possible_types(type_name));
                    push_required(parent, name);
                }
                Selection::Field(_) if is_union => {}
                Selection::Field(field) => self.resolve_field(field, type_name, parent, path)?,
                Selection::FragmentSpread(spread) => {
                    let document = self.document;
                    let fragment = document
                        .definitions
                        .iter()
                        .find_map(|definition| match definition {
                            Definition::FragmentDefinition(fragment)
                                if fragment.name == spread.fragment_name =>
                            {
                                Some(fragment)
                            }
                            _ => None,
                        })
                        .ok_or_else(|| CompileError::UnknownFragment {
                            name: spread.fragment_name.to_string(),
                        })?;
                    self.resolve_selections(
                        &fragment.selection_set,
                        fragment.type_condition.as_str(),
                        parent,
                        path,
                    )?;
                }
                Selection::InlineFragment(inline) => {
                    let condition = inline
                        .type_condition
                        .as_ref()
                        .map_or(type_name, |condition| condition.as_str());
                    self.resolve_selections(&inline.selection_set, condition, parent, path)?;
                }
            }
        }
        Ok(())
    }

    fn resolve_field(
        &mut self,
        field: &Field,
        parent_type: &str,
        parent: &mut Map<String, Value>,
        path: &mut Vec<String>,
    ) -> Result<(), CompileError> {
        let Some(ty) = self.field_type(parent_type, field.name.as_str()) else {
            return Ok(());
        };
        let name = response_name(field);
        // Conditionally included fields may be absent.
        let ty = if is_conditional(field) { nullable(&ty) } else { ty };

        path.push(name.to_string());
        let mut schema = self.resolve_field_schema(field, &ty, parent, name, path)?;
        if let Some(transform) = field
            .directives
            .iter()
            .find(|directive| directive.name.as_str() == "transform")
        {
            schema = handle_transform_directive(transform, schema, path, self.transformations)?;
        }
        path.pop();

        match parent
            .get_mut("properties")
            .and_then(|properties| properties.get_mut(name))
        {
            Some(existing) => merge_selections(existing, schema),
            None => insert_property(parent, name, schema),
        }
        Ok(())
    }

    fn resolve_field_schema(
        &mut self,
        field: &Field,
        ty: &Type,
        parent: &mut Map<String, Value>,
        name: &str,
        path: &mut Vec<String>,
    ) -> Result<Value, CompileError> {
        match ty {
            Type::NonNullNamed(_) | Type::NonNullList(_) => {
                if schema_has_type(parent, "object") {
                    push_required(parent, name);
                }
                self.resolve_field_schema(field, &nullable(ty), parent, name, path)
            }
            Type::List(inner) => {
                let mut list = Map::new();
                list.insert("type".into(), json!("array"));
                path.push(ARRAY_SEGMENT.to_string());
                let items = self.resolve_field_schema(field, inner, &mut list, name, path);
                path.pop();
                list.insert("items".into(), items?);
                Ok(Value::Object(list))
            }
            Type::Named(named) => {
                if let Some(leaf) = self.mapper.leaf_schema(named.as_str(), true) {
                    return Ok(leaf);
                }
                match self.schema.types.get(named.as_str()) {
                    Some(
                        ExtendedType::Object(_)
                        | ExtendedType::Interface(_)
                        | ExtendedType::Union(_),
                    ) => self.object_schema(named.as_str(), &field.selection_set, path),
                    _ => Ok(json!({})),
                }
            }
        }
    }

    fn field_type(&self, type_name: &str, field_name: &str) -> Option<Type> {
        let fields = match self.schema.types.get(type_name)? {
            ExtendedType::Object(object) => &object.fields,
            ExtendedType::Interface(interface) => &interface.fields,
            _ => return None,
        };
        fields.get(field_name).map(|field| field.ty.clone())
    }

    /// Concrete type names `__typename` can take on `type_name`.
    fn possible_types(&self, type_name: &str) -> Vec<String> {
        match self.schema.types.get(type_name) {
            Some(ExtendedType::Union(union)) => union
                .members
                .iter()
                .map(|member| member.name.to_string())
                .collect(),
            Some(ExtendedType::Interface(_)) => self
                .schema
                .types
                .iter()
                .filter_map(|(name, ty)| match ty {
                    ExtendedType::Object(object)
                        if object
                            .implements_interfaces
                            .iter()
                            .any(|interface| interface.name.as_str() == type_name) =>
                    {
                        Some(name.to_string())
                    }
                    _ => None,
                })
                .collect(),
            _ => vec![type_name.to_string()],
        }
    }
}

fn response_name(field: &Field) -> &str {
    field.alias.as_ref().unwrap_or(&field.name).as_str()
}

fn is_conditional(field: &Field) -> bool {
    field
        .directives
        .iter()
        .any(|directive| matches!(directive.name.as_str(), "skip" | "include"))
}

fn add_typenames(parent: &mut Map<String, Value>, name: &str, types: Vec<String>) {
    let Some(Value::Object(properties)) = parent.get_mut("properties") else {
        return;
    };
    let property = properties
        .entry(name)
        .or_insert_with(|| json!({ "type": "string", "enum": [] }));
    if let Some(Value::Array(values)) = property.get_mut("enum") {
        for ty in types {
            if !values.iter().any(|value| value == ty.as_str()) {
                values.push(Value::String(ty));
            }
        }
    }
}

/// Fold a repeated selection of the same response key into `existing`.
fn merge_selections(existing: &mut Value, incoming: Value) {
    let Value::Object(incoming) = incoming else {
        *existing = incoming;
        return;
    };
    if !existing.is_object() {
        *existing = Value::Object(incoming);
        return;
    }
    let Some(current) = existing.as_object_mut() else {
        return;
    };
    for (key, value) in incoming {
        if !current.contains_key(&key) {
            current.insert(key, value);
            continue;
        }
        match key.as_str() {
            "required" => {
                for name in value.as_array().into_iter().flatten().filter_map(Value::as_str) {
                    push_required(current, name);
                }
            }
            "items" => {
                if let Some(items) = current.get_mut("items") {
                    merge_selections(items, value);
                }
            }
            "properties" => {
                if let (Some(Value::Object(properties)), Value::Object(new_properties)) =
                    (current.get_mut("properties"), value)
                {
                    for (name, property) in new_properties {
                        match properties.get_mut(&name) {
                            Some(existing) => merge_selections(existing, property),
                            None => {
                                properties.insert(name, property);
                            }
                        }
                    }
                }
            }
            _ => {
                current.insert(key, value);
            }
        }
    }
}
