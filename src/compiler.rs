//! Compilation pipeline: schema build, per-file isolation, operation assembly.

use std::path::Path;

use apollo_compiler::ast::{Definition, Document, OperationDefinition, VariableDefinition};
use apollo_compiler::validation::Valid;
use apollo_compiler::{Node, Schema};

use crate::config::CompileOptions;
use crate::definitions::build_schema;
use crate::directives::{process_variable_directives, DirectiveContext, VariableSchemas};
use crate::error::CompileError;
use crate::printer::print_operation;
use crate::rbac;
use crate::response::operation_response_to_json_schema;
use crate::types::{
    AuthenticationConfig, AuthorizationConfig, ExecutionEngine, GraphQLOperation,
    GraphQLOperationFile, LoadOperationsOutput, OperationFailure, ParsedOperations,
    VariablesConfiguration,
};
use crate::variables::{operation_variables_to_json_schema, VariablesSchemaKind};

/// Directory name marking operations that are only callable server-side.
const INTERNAL_DIRECTORY: &str = "internal";

/// Compile every operation file in `input` against `schema_sdl`.
///
/// A file that fails to parse, validate or compile is skipped as a whole and
/// reported in [`ParsedOperations::failures`]; the others still compile.
///
/// # Errors
///
/// Only an invalid schema aborts the batch, with `CompileError::InvalidSchema`.
pub fn parse_graphql_operations(
    schema_sdl: &str,
    input: &LoadOperationsOutput,
    options: &CompileOptions,
) -> Result<ParsedOperations, CompileError> {
    let schema = build_schema(schema_sdl, options)?;
    let mut parsed = ParsedOperations::default();

    for file in &input.graphql_operation_files {
        match compile_file(&schema, file, options) {
            Ok(operations) => parsed.operations.extend(operations),
            Err(error) => {
                tracing::error!(file = %file.file_path, error = %error, "skipping operation file");
                parsed.failures.push(OperationFailure {
                    file_path: file.file_path.clone(),
                    message: error.to_string(),
                });
            }
        }
    }

    if !parsed.failures.is_empty() {
        tracing::warn!(
            "{} of {} operation files failed to compile",
            parsed.failures.len(),
            input.graphql_operation_files.len()
        );
    }
    Ok(parsed)
}

#[tracing::instrument(skip_all, fields(file = %file.file_path))]
fn compile_file(
    schema: &Valid<Schema>,
    file: &GraphQLOperationFile,
    options: &CompileOptions,
) -> Result<Vec<GraphQLOperation>, CompileError> {
    let mut document =
        Document::parse(file.content.as_str(), file.file_path.as_str()).map_err(|with_errors| {
            CompileError::Parse {
                file: file.file_path.clone(),
                message: with_errors.errors.to_string(),
            }
        })?;
    strip_hooks_variables(&mut document);

    document
        .to_executable_validate(schema)
        .map_err(|with_errors| CompileError::Validation {
            file: file.file_path.clone(),
            message: with_errors.errors.to_string(),
        })?;

    let in_internal_directory = is_in_internal_directory(&file.api_mount_path);
    document
        .definitions
        .iter()
        .filter_map(|definition| match definition {
            Definition::OperationDefinition(operation) => Some(operation),
            _ => None,
        })
        .map(|operation| -> Result<GraphQLOperation, CompileError> {
            let mut compiled = compile_operation(schema, &document, operation, file, options)?;
            compiled.internal |= in_internal_directory;
            Ok(compiled)
        })
        .collect()
}

/// `@hooksVariable` variables are only visible to hooks, never to the upstream.
fn strip_hooks_variables(document: &mut Document) {
    for definition in &mut document.definitions {
        let Definition::OperationDefinition(operation) = definition else {
            continue;
        };
        let is_hooks_variable = |variable: &Node<VariableDefinition>| {
            variable
                .directives
                .iter()
                .any(|directive| directive.name.as_str() == "hooksVariable")
        };
        if operation.variables.iter().any(is_hooks_variable) {
            operation
                .make_mut()
                .variables
                .retain(|variable| !is_hooks_variable(variable));
        }
    }
}

fn compile_operation(
    schema: &Valid<Schema>,
    document: &Document,
    operation: &OperationDefinition,
    file: &GraphQLOperationFile,
    options: &CompileOptions,
) -> Result<GraphQLOperation, CompileError> {
    let schema_for = |kind| operation_variables_to_json_schema(schema, operation, kind, options);
    let mut schemas = VariableSchemas {
        variables: schema_for(VariablesSchemaKind::Public),
        interpolation: schema_for(VariablesSchemaKind::Interpolation),
        internal: schema_for(VariablesSchemaKind::Internal),
        injected: schema_for(VariablesSchemaKind::Injected),
    };
    let mut authentication = AuthenticationConfig::default();
    let mut authorization = AuthorizationConfig::default();
    let mut variables_configuration = VariablesConfiguration::default();

    process_variable_directives(
        &mut DirectiveContext {
            schemas: &mut schemas,
            authentication: &mut authentication,
            authorization: &mut authorization,
            variables_configuration: &mut variables_configuration,
            custom_claims: &options.custom_claims,
        },
        operation,
    )?;

    let mut transformations = Vec::new();
    let response_schema = operation_response_to_json_schema(
        schema,
        document,
        operation,
        &mut transformations,
        &options.custom_json_scalars,
    )?;

    rbac::apply_operation_directives(schema, operation, &mut authentication, &mut authorization)?;

    let internal = operation
        .directives
        .iter()
        .any(|directive| directive.name.as_str() == "internalOperation");

    tracing::debug!(
        operation = %file.operation_name,
        authentication = authentication.required,
        claims = authorization.claims.len(),
        transformations = transformations.len(),
        "compiled operation"
    );

    Ok(GraphQLOperation {
        name: file.operation_name.clone(),
        path_name: file.api_mount_path.clone(),
        content: print_operation(document, operation),
        operation_type: operation.operation_type.into(),
        execution_engine: ExecutionEngine::Graphql,
        variables_schema: schemas.variables,
        interpolation_variables_schema: schemas.interpolation,
        internal_variables_schema: schemas.internal,
        injected_variables_schema: schemas.injected,
        response_schema,
        authentication_config: authentication,
        authorization_config: authorization,
        variables_configuration,
        internal,
        post_resolve_transformations: transformations,
    })
}

fn is_in_internal_directory(mount_path: &str) -> bool {
    Path::new(mount_path)
        .parent()
        .is_some_and(|parent| parent.components().any(|c| c.as_os_str() == INTERNAL_DIRECTORY))
}
