//! JSON Schemas for operation variables.
//!
//! Four variants are derived per operation, each a superset of the previous:
//!
//! | Variant | Hidden variables |
//! |---------|------------------|
//! | public | `@fromClaim`, `@internal`, `@inject*` |
//! | interpolation | same as public, with interpolated types as `{}` |
//! | internal | `@inject*` |
//! | injected | none |
//!
//! With `keep_from_claim_variables` the public and interpolation variants hide
//! only the `@inject*` variables.
//!
//! A hiding directive with an `on:` argument hides only that field of the
//! variable instead of the whole variable.

use apollo_compiler::ast::{OperationDefinition, Type, VariableDefinition};
use apollo_compiler::Schema;
use serde_json::{json, Map, Value};

use crate::config::CompileOptions;
use crate::directives::{directives_named, on_path};
use crate::schema_path;
use crate::type_mapper::{insert_property, nullable, Definitions, TypeMapper};
use crate::types::{INJECTED_VARIABLE_DIRECTIVES, INTERNAL_VARIABLE_DIRECTIVES};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariablesSchemaKind {
    Public,
    Interpolation,
    Internal,
    Injected,
}

impl VariablesSchemaKind {
    fn hidden_by(&self, options: &CompileOptions) -> &'static [&'static str] {
        match self {
            VariablesSchemaKind::Public | VariablesSchemaKind::Interpolation => {
                if options.keep_from_claim_variables {
                    INJECTED_VARIABLE_DIRECTIVES
                } else {
                    INTERNAL_VARIABLE_DIRECTIVES
                }
            }
            VariablesSchemaKind::Internal => INJECTED_VARIABLE_DIRECTIVES,
            VariablesSchemaKind::Injected => &[],
        }
    }
}

/// What a variant hides of one variable.
enum Skip {
    Variable,
    Fields(Vec<Vec<String>>),
}

fn skip_for(variable: &VariableDefinition, hidden_by: &[&str]) -> Skip {
    let mut fields = Vec::new();
    for name in hidden_by {
        for directive in directives_named(variable, name) {
            // A malformed `on:` is reported by the directive processors.
            let path = on_path(directive).unwrap_or_default();
            if path.is_empty() {
                return Skip::Variable;
            }
            fields.push(path);
        }
    }
    Skip::Fields(fields)
}

/// Build the variables schema of `kind` for `operation`.
pub fn operation_variables_to_json_schema(
    schema: &Schema,
    operation: &OperationDefinition,
    kind: VariablesSchemaKind,
    options: &CompileOptions,
) -> Value {
    let mut mapper = TypeMapper::new(schema, &options.custom_json_scalars)
        .with_enum_mappings(&options.custom_enum_mappings);
    if kind == VariablesSchemaKind::Interpolation {
        mapper = mapper.interpolating(&options.interpolate_as_json);
    }

    let mut root = Map::new();
    root.insert("type".into(), json!("object"));
    root.insert("properties".into(), Value::Object(Map::new()));
    root.insert("additionalProperties".into(), Value::Bool(false));
    let mut definitions = Definitions::new();
    let mut skipped_fields = Vec::new();
    let hidden_by = kind.hidden_by(options);

    for variable in &operation.variables {
        let name = variable.name.as_str();
        match skip_for(variable, hidden_by) {
            Skip::Variable => continue,
            Skip::Fields(fields) => skipped_fields.extend(fields.into_iter().map(|field| {
                let mut path = vec![name.to_string()];
                path.extend(field);
                path
            })),
        }

        let non_null = matches!(*variable.ty, Type::NonNullNamed(_) | Type::NonNullList(_));
        let variable_schema = if non_null && variable.default_value.is_some() {
            // Optional because of the default, but never null once resolved.
            mapper.type_schema(&mut definitions, &mut root, &nullable(&variable.ty), name, true)
        } else {
            mapper.type_schema(&mut definitions, &mut root, &variable.ty, name, false)
        };
        insert_property(&mut root, name, variable_schema);
    }

    if !definitions.is_empty() {
        root.insert("definitions".into(), Value::Object(definitions));
    }
    let mut root = Value::Object(root);
    for path in &skipped_fields {
        schema_path::remove_property(&mut root, path);
    }
    root
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definitions::build_schema;
    use crate::validator::validate_against_schema;
    use apollo_compiler::ast::{Definition, Document};
    use apollo_compiler::Node;
    use pretty_assertions::assert_eq;

    const SDL: &str = r#"
        type Query { search(a: Int, filter: Filter, limit: Int!, at: String): [String] }
        type Mutation { update(input: Profile!, id: ID): Boolean }
        input Filter { term: String!, nested: Filter }
        input Profile { id: ID!, name: String }
    "#;

    fn operation(source: &str) -> Node<OperationDefinition> {
        let document = Document::parse(source, "op.graphql").unwrap();
        document
            .definitions
            .into_iter()
            .find_map(|def| match def {
                Definition::OperationDefinition(op) => Some(op),
                _ => None,
            })
            .unwrap()
    }

    fn derive(source: &str, kind: VariablesSchemaKind, options: &CompileOptions) -> Value {
        let schema = build_schema(SDL, options).unwrap();
        operation_variables_to_json_schema(&schema, &operation(source), kind, options)
    }

    #[test]
    fn nullable_int_variable() {
        let schema = derive(
            "query ($a: Int) { search(a: $a) }",
            VariablesSchemaKind::Public,
            &CompileOptions::new(),
        );
        assert_eq!(
            schema,
            json!({
                "type": "object",
                "properties": { "a": { "type": ["integer", "null"] } },
                "additionalProperties": false
            })
        );
    }

    #[test]
    fn non_null_with_default_is_optional() {
        let schema = derive(
            "query ($limit: Int! = 10) { search(limit: $limit) }",
            VariablesSchemaKind::Public,
            &CompileOptions::new(),
        );
        assert_eq!(schema["properties"]["limit"], json!({ "type": "integer" }));
        assert!(schema.get("required").is_none());
    }

    #[test]
    fn definitions_are_deduplicated() {
        let schema = derive(
            "query ($f: Filter, $g: Filter) { a: search(filter: $f) b: search(filter: $g) }",
            VariablesSchemaKind::Public,
            &CompileOptions::new(),
        );
        let reference = json!({ "anyOf": [{ "$ref": "#/definitions/Filter" }, { "type": "null" }] });
        assert_eq!(schema["properties"]["f"], reference);
        assert_eq!(schema["properties"]["g"], reference);
        let definitions = schema["definitions"].as_object().unwrap();
        assert_eq!(definitions.len(), 1);
        assert_eq!(definitions["Filter"]["required"], json!(["term"]));
    }

    #[test]
    fn claim_variable_variants() {
        let source = "query ($at: String! @fromClaim(name: EMAIL), $a: Int) { search(a: $a, at: $at) }";
        let options = CompileOptions::new();

        let public = derive(source, VariablesSchemaKind::Public, &options);
        assert!(public["properties"].get("at").is_none());
        assert!(public.get("required").is_none());

        let internal = derive(source, VariablesSchemaKind::Internal, &options);
        assert_eq!(internal["properties"]["at"], json!({ "type": "string" }));
        assert_eq!(internal["required"], json!(["at"]));
    }

    #[test]
    fn injected_variable_variants() {
        let source = "mutation ($input: Profile!, $id: ID @injectGeneratedUUID) { update(input: $input, id: $id) }";
        let options = CompileOptions::new();

        for kind in [VariablesSchemaKind::Public, VariablesSchemaKind::Internal] {
            let schema = derive(source, kind, &options);
            assert!(schema["properties"].get("id").is_none(), "{kind:?}");
            assert!(schema["properties"].get("input").is_some(), "{kind:?}");
        }
        let injected = derive(source, VariablesSchemaKind::Injected, &options);
        assert_eq!(injected["properties"]["id"], json!({ "type": ["string", "null"] }));
    }

    #[test]
    fn on_path_hides_single_field() {
        let source = r#"mutation ($input: Profile! @injectGeneratedUUID(on: "id")) { update(input: $input) }"#;
        let public = derive(source, VariablesSchemaKind::Public, &CompileOptions::new());
        assert_eq!(
            public["properties"]["input"],
            json!({
                "type": "object",
                "properties": { "name": { "type": ["string", "null"] } },
                "additionalProperties": false
            })
        );
        assert_eq!(public["required"], json!(["input"]));

        let injected = derive(source, VariablesSchemaKind::Injected, &CompileOptions::new());
        assert_eq!(injected["definitions"]["Profile"]["required"], json!(["id"]));
    }

    #[test]
    fn interpolation_variant_uses_any_for_configured_types() {
        let options = CompileOptions::new().interpolate_as_json(["Filter"]);
        let source = "query ($f: Filter) { search(filter: $f) }";

        let interpolation = derive(source, VariablesSchemaKind::Interpolation, &options);
        assert_eq!(interpolation["properties"]["f"], json!({}));
        assert!(interpolation.get("definitions").is_none());

        let public = derive(source, VariablesSchemaKind::Public, &options);
        assert_eq!(
            public["properties"]["f"]["anyOf"][0],
            json!({ "$ref": "#/definitions/Filter" })
        );
    }

    #[test]
    fn nullable_and_required_inputs_share_a_definition() {
        let schema = derive(
            "query ($x: Filter!, $y: Filter) { a: search(filter: $x) b: search(filter: $y) }",
            VariablesSchemaKind::Public,
            &CompileOptions::new(),
        );
        assert_eq!(schema["properties"]["x"], json!({ "$ref": "#/definitions/Filter" }));
        assert_eq!(schema["definitions"]["Filter"]["type"], json!("object"));

        let valid = |payload: Value| validate_against_schema(&schema, &payload).is_ok();
        assert!(valid(json!({ "x": { "term": "a" }, "y": null })));
        assert!(valid(json!({ "x": { "term": "a" }, "y": { "term": "b" } })));
        assert!(!valid(json!({ "x": null })));
        assert!(!valid(json!({ "x": { "term": "a" }, "y": {} })));
    }

    #[test]
    fn kept_claim_variables_stay_client_visible() {
        let source = "query ($at: String! @fromClaim(name: EMAIL), $a: Int @injectGeneratedUUID) { search(a: $a, at: $at) }";
        let options = CompileOptions::new().keep_from_claim_variables(true);

        for kind in [VariablesSchemaKind::Public, VariablesSchemaKind::Interpolation] {
            let schema = derive(source, kind, &options);
            assert_eq!(schema["properties"]["at"], json!({ "type": "string" }), "{kind:?}");
            assert_eq!(schema["required"], json!(["at"]), "{kind:?}");
            assert!(schema["properties"].get("a").is_none(), "{kind:?}");
        }
        let internal = derive(source, VariablesSchemaKind::Internal, &options);
        assert!(internal["properties"].get("at").is_some());
    }

    #[test]
    fn enum_mapped_scalar_variable() {
        let options = CompileOptions::new().custom_enum_mapping("Currency", ["EUR", "USD"]);
        let schema =
            build_schema("type Query { price(in: Currency): Int } scalar Currency", &options).unwrap();
        let public = operation_variables_to_json_schema(
            &schema,
            &operation("query ($c: Currency) { price(in: $c) }"),
            VariablesSchemaKind::Public,
            &options,
        );
        assert_eq!(
            public["properties"]["c"],
            json!({ "type": ["string", "null"], "enum": ["EUR", "USD", null] })
        );
        assert!(validate_against_schema(&public, &json!({ "c": "GBP" })).is_err());
    }

    #[test]
    fn no_variables() {
        let schema = derive(
            "query { search }",
            VariablesSchemaKind::Injected,
            &CompileOptions::new(),
        );
        assert_eq!(
            schema,
            json!({ "type": "object", "properties": {}, "additionalProperties": false })
        );
    }
}
