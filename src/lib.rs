//! GraphQL Operation Compiler
//!
//! Compiles annotated GraphQL operations against a schema into the
//! configuration a runtime needs to serve them: JSON Schemas for variables and
//! responses, authentication and authorization requirements, variable
//! injection instructions and post-resolve transformations.
//!
//! # Example
//!
//! ```
//! use graphql_operations::{
//!     parse_graphql_operations, CompileOptions, GraphQLOperationFile, LoadOperationsOutput,
//! };
//! use serde_json::json;
//!
//! let schema = "type Query { me: User } type User { id: ID! name: String }";
//! let input = LoadOperationsOutput {
//!     graphql_operation_files: vec![GraphQLOperationFile {
//!         operation_name: "Me".into(),
//!         api_mount_path: "Me".into(),
//!         file_path: "operations/Me.graphql".into(),
//!         content: "query Me { me { id name } }".into(),
//!     }],
//!     ..Default::default()
//! };
//!
//! let parsed = parse_graphql_operations(schema, &input, &CompileOptions::new()).unwrap();
//! let me = parsed.operation("Me").unwrap();
//!
//! assert_eq!(me.content, "query Me{me{id name}}");
//! assert_eq!(
//!     me.response_schema["properties"]["data"]["properties"]["me"]["required"],
//!     json!(["id"])
//! );
//! ```
//!
//! # Variable Schemas
//!
//! | Schema | Who sends the variables | Hidden variables |
//! |--------|-------------------------|------------------|
//! | `VariablesSchema` | the client | `@fromClaim`, `@internal`, `@inject*` |
//! | `InterpolationVariablesSchema` | the client, before interpolation | as above |
//! | `InternalVariablesSchema` | the server, claims resolved | `@inject*` |
//! | `InjectedVariablesSchema` | the server, after injection | none |
//!
//! # Directives
//!
//! Variables:
//! ```graphql
//! query ($email: String! @fromClaim(name: EMAIL), $id: ID @injectGeneratedUUID) { ... }
//! ```
//!
//! Fields:
//! ```graphql
//! { me @transform(get: "profile.name") { profile { name } } }
//! ```
//!
//! Operations: `@rbac`, `@requireAuthentication`, `@internalOperation`.

mod compiler;
mod config;
mod definitions;
mod directives;
mod error;
mod loader;
mod printer;
mod rbac;
mod response;
mod schema_path;
mod transform;
mod type_mapper;
mod types;
mod validator;
mod variables;

pub use compiler::parse_graphql_operations;
pub use config::CompileOptions;
pub use definitions::{
    build_schema, directive_definitions, directive_definitions_sdl, DefinitionKind, SdlDefinition,
};
pub use error::{CompileError, LoadError, ValidateError, VariableError};
pub use loader::{
    load_compiled_operations, load_operations_dir, load_operations_json, load_schema_sdl,
    load_variables,
};
pub use printer::print_operation;
pub use rbac::ROLE_ENUM;
pub use response::operation_response_to_json_schema;
pub use transform::{apply_transformations, ARRAY_SEGMENT};
pub use types::{
    AuthenticationConfig, AuthorizationConfig, ClaimConfig, ClaimType, CustomClaim,
    ExecutionEngine, GetTransformation, GraphQLOperation, GraphQLOperationFile,
    InjectVariableKind, LoadOperationsOutput, OperationFailure, OperationType, ParsedOperations,
    PostResolveTransformation, RoleConfig, TransformationKind, ValueType, VariableInjectionConfig,
    VariablesConfiguration,
};
pub use validator::{validate_against_schema, validate_variables, Audience};
pub use variables::{operation_variables_to_json_schema, VariablesSchemaKind};
