//! Variable directive processors.
//!
//! Each processor reads one directive from a variable definition and records
//! what it means: claims for authorization, keywords on the variable schemas,
//! or injection instructions. Processors only add information, so their order
//! does not matter.

pub(crate) mod claims;
pub(crate) mod inject;
pub(crate) mod json_schema;

use apollo_compiler::ast::{Directive, OperationDefinition, Value as GraphQLValue, VariableDefinition};
use apollo_compiler::Node;
use indexmap::IndexMap;
use serde_json::Value;

use crate::error::CompileError;
use crate::schema_path;
use crate::types::{AuthenticationConfig, AuthorizationConfig, CustomClaim, VariablesConfiguration};

/// The four variable schemas of one operation.
#[derive(Debug, Clone)]
pub(crate) struct VariableSchemas {
    pub variables: Value,
    pub interpolation: Value,
    pub internal: Value,
    pub injected: Value,
}

impl VariableSchemas {
    pub(crate) fn all_mut(&mut self) -> [&mut Value; 4] {
        [
            &mut self.variables,
            &mut self.interpolation,
            &mut self.internal,
            &mut self.injected,
        ]
    }
}

/// Mutable view of the operation state the processors write to.
pub(crate) struct DirectiveContext<'a> {
    pub schemas: &'a mut VariableSchemas,
    pub authentication: &'a mut AuthenticationConfig,
    pub authorization: &'a mut AuthorizationConfig,
    pub variables_configuration: &'a mut VariablesConfiguration,
    pub custom_claims: &'a IndexMap<String, CustomClaim>,
}

/// Run every processor over every variable of `operation`.
///
/// # Errors
///
/// Returns the first directive error; the operation must then be discarded.
pub(crate) fn process_variable_directives(
    ctx: &mut DirectiveContext<'_>,
    operation: &OperationDefinition,
) -> Result<(), CompileError> {
    for variable in &operation.variables {
        claims::apply_from_claim(ctx, variable)?;
        json_schema::apply_json_schema(ctx, variable)?;
        inject::apply_inject_environment_variable(ctx, variable)?;
        inject::apply_inject_generated_uuid(ctx, variable)?;
        inject::apply_inject_current_date_time(ctx, variable)?;
    }
    Ok(())
}

/// Every occurrence of `name` on the variable (the directives are repeatable).
pub(crate) fn directives_named<'a>(
    variable: &'a VariableDefinition,
    name: &'a str,
) -> impl Iterator<Item = &'a Node<Directive>> + 'a {
    variable
        .directives
        .iter()
        .filter(move |directive| directive.name.as_str() == name)
}

pub(crate) fn argument<'a>(directive: &'a Directive, name: &str) -> Option<&'a GraphQLValue> {
    directive
        .arguments
        .iter()
        .find(|argument| argument.name.as_str() == name)
        .map(|argument| &*argument.value)
}

pub(crate) fn value_kind(value: &GraphQLValue) -> &'static str {
    match value {
        GraphQLValue::Null => "null",
        GraphQLValue::Enum(_) => "an enum value",
        GraphQLValue::Variable(_) => "a variable",
        GraphQLValue::String(_) => "a string",
        GraphQLValue::Float(_) => "a float",
        GraphQLValue::Int(_) => "an int",
        GraphQLValue::Boolean(_) => "a boolean",
        GraphQLValue::List(_) => "a list",
        GraphQLValue::Object(_) => "an object",
    }
}

pub(crate) fn invalid_argument(
    directive: &Directive,
    argument: &str,
    expected: &str,
    actual: &GraphQLValue,
) -> CompileError {
    CompileError::InvalidDirectiveArgument {
        directive: directive.name.to_string(),
        argument: argument.to_string(),
        expected: expected.to_string(),
        actual: value_kind(actual).to_string(),
    }
}

pub(crate) fn missing_argument(directive: &Directive, argument: &str) -> CompileError {
    CompileError::MissingDirectiveArgument {
        directive: directive.name.to_string(),
        argument: argument.to_string(),
    }
}

/// A string argument, if present.
pub(crate) fn string_argument<'a>(
    directive: &'a Directive,
    name: &str,
) -> Result<Option<&'a str>, CompileError> {
    match argument(directive, name) {
        None => Ok(None),
        Some(GraphQLValue::String(value)) => Ok(Some(value.as_str())),
        Some(other) => Err(invalid_argument(directive, name, "a string", other)),
    }
}

/// An enum argument, if present.
pub(crate) fn enum_argument<'a>(
    directive: &'a Directive,
    name: &str,
) -> Result<Option<&'a str>, CompileError> {
    match argument(directive, name) {
        None => Ok(None),
        Some(GraphQLValue::Enum(value)) => Ok(Some(value.as_str())),
        Some(other) => Err(invalid_argument(directive, name, "an enum value", other)),
    }
}

/// The `on:` sub-path of a directive, split into components.
pub(crate) fn on_path(directive: &Directive) -> Result<Vec<String>, CompileError> {
    Ok(string_argument(directive, "on")?
        .map(|on| {
            on.split('.')
                .filter(|component| !component.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default())
}

/// `[variable, ...on]`, checked against the injected variables schema.
///
/// # Errors
///
/// `CompileError::UnresolvedVariablePath` names the first component that
/// does not exist and the fields available at that level.
pub(crate) fn directive_injected_variable_path_components(
    ctx: &DirectiveContext<'_>,
    variable: &VariableDefinition,
    directive: &Directive,
) -> Result<Vec<String>, CompileError> {
    let mut path = vec![variable.name.to_string()];
    path.extend(on_path(directive)?);
    schema_path::resolve(&ctx.schemas.injected, &path).map_err(|unresolved| {
        CompileError::UnresolvedVariablePath {
            path: path.join("."),
            component: unresolved.component,
            available: unresolved.available.join(", "),
        }
    })?;
    Ok(path)
}


#[cfg(test)]
mod tests {
    use super::test_support::Harness;
    use crate::config::CompileOptions;
    use crate::error::CompileError;

    #[test]
    fn unresolved_on_path_names_siblings() {
        let mut harness = Harness::new(
            r#"mutation ($input: CreateUser! @injectGeneratedUUID(on: "emial")) { createUser(input: $input) { id } }"#,
            &CompileOptions::new(),
        );
        match harness.process().unwrap_err() {
            CompileError::UnresolvedVariablePath {
                path,
                component,
                available,
            } => {
                assert_eq!(path, "input.emial");
                assert_eq!(component, "emial");
                assert_eq!(available, "email, name, tags");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn on_path_into_one_of_input() {
        let mut harness = Harness::new(
            r#"query ($by: Pick @injectGeneratedUUID(on: "id")) { lookup(by: $by) { id } }"#,
            &CompileOptions::new(),
        );
        harness.process().unwrap();
        assert_eq!(
            harness.variables_configuration.inject_variables[0].variable_path_components,
            vec!["by", "id"]
        );
        // Clients can only pick the variant the server does not fill in.
        let by = &harness.schemas.variables["properties"]["by"]["anyOf"][0];
        assert_eq!(by["oneOf"].as_array().unwrap().len(), 1);
        assert_eq!(by["oneOf"][0]["required"], serde_json::json!(["email"]));
    }

    #[test]
    fn processors_ignore_plain_variables() {
        let mut harness = Harness::new(
            "query ($id: ID) { user(id: $id) { id } }",
            &CompileOptions::new(),
        );
        harness.process().unwrap();
        assert!(!harness.authentication.required);
        assert!(harness.authorization.claims.is_empty());
        assert!(harness.variables_configuration.inject_variables.is_empty());
    }
}
