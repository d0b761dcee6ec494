//! Core types: operation inputs, compiled operations and their configuration records.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Directives whose variables are hidden from the public variables schema.
pub const INTERNAL_VARIABLE_DIRECTIVES: &[&str] = &[
    "fromClaim",
    "internal",
    "injectGeneratedUUID",
    "injectCurrentDateTime",
    "injectEnvironmentVariable",
];

/// Directives whose variables are only present in the injected variables schema.
pub const INJECTED_VARIABLE_DIRECTIVES: &[&str] = &[
    "injectGeneratedUUID",
    "injectCurrentDateTime",
    "injectEnvironmentVariable",
];

/// One operation source file, as produced by the operation loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphQLOperationFile {
    pub operation_name: String,
    pub api_mount_path: String,
    pub file_path: String,
    pub content: String,
}

/// Result of loading an operations directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadOperationsOutput {
    #[serde(default)]
    pub graphql_operation_files: Vec<GraphQLOperationFile>,
    #[serde(default)]
    pub invalid: Vec<String>,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub info: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationType {
    Query,
    Mutation,
    Subscription,
}

impl From<apollo_compiler::ast::OperationType> for OperationType {
    fn from(value: apollo_compiler::ast::OperationType) -> Self {
        match value {
            apollo_compiler::ast::OperationType::Query => OperationType::Query,
            apollo_compiler::ast::OperationType::Mutation => OperationType::Mutation,
            apollo_compiler::ast::OperationType::Subscription => OperationType::Subscription,
        }
    }
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            OperationType::Query => "QUERY",
            OperationType::Mutation => "MUTATION",
            OperationType::Subscription => "SUBSCRIPTION",
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionEngine {
    #[default]
    #[serde(rename = "ENGINE_GRAPHQL")]
    Graphql,
}

/// A fully compiled operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GraphQLOperation {
    pub name: String,
    pub path_name: String,
    /// Canonical operation text sent to the upstream, without `@transform`.
    pub content: String,
    pub operation_type: OperationType,
    pub execution_engine: ExecutionEngine,
    pub variables_schema: Value,
    pub interpolation_variables_schema: Value,
    pub internal_variables_schema: Value,
    pub injected_variables_schema: Value,
    pub response_schema: Value,
    pub authentication_config: AuthenticationConfig,
    pub authorization_config: AuthorizationConfig,
    pub variables_configuration: VariablesConfiguration,
    pub internal: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub post_resolve_transformations: Vec<PostResolveTransformation>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticationConfig {
    pub required: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationConfig {
    pub claims: Vec<ClaimConfig>,
    pub role_config: RoleConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleConfig {
    pub require_match_all: Vec<String>,
    pub require_match_any: Vec<String>,
    pub deny_match_all: Vec<String>,
    pub deny_match_any: Vec<String>,
}

impl RoleConfig {
    pub fn is_empty(&self) -> bool {
        self.require_match_all.is_empty()
            && self.require_match_any.is_empty()
            && self.deny_match_all.is_empty()
            && self.deny_match_any.is_empty()
    }
}

/// Binds a claim of the authenticated user to a variable (or a field inside one).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimConfig {
    pub variable_path_components: Vec<String>,
    pub claim_type: ClaimType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<CustomClaim>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaimType {
    Issuer,
    Subject,
    Name,
    GivenName,
    FamilyName,
    MiddleName,
    Nickname,
    PreferredUsername,
    Profile,
    Picture,
    Website,
    Email,
    EmailVerified,
    Gender,
    BirthDate,
    ZoneInfo,
    Locale,
    Location,
    Custom,
}

impl ClaimType {
    /// Well-known claims as they appear in the `WG_CLAIM` enum, aliases included.
    pub const WELL_KNOWN: &'static [(&'static str, ClaimType)] = &[
        ("ISSUER", ClaimType::Issuer),
        ("PROVIDER", ClaimType::Issuer),
        ("SUBJECT", ClaimType::Subject),
        ("USERID", ClaimType::Subject),
        ("NAME", ClaimType::Name),
        ("GIVEN_NAME", ClaimType::GivenName),
        ("FAMILY_NAME", ClaimType::FamilyName),
        ("MIDDLE_NAME", ClaimType::MiddleName),
        ("NICKNAME", ClaimType::Nickname),
        ("PREFERRED_USERNAME", ClaimType::PreferredUsername),
        ("PROFILE", ClaimType::Profile),
        ("PICTURE", ClaimType::Picture),
        ("WEBSITE", ClaimType::Website),
        ("EMAIL", ClaimType::Email),
        ("EMAIL_VERIFIED", ClaimType::EmailVerified),
        ("GENDER", ClaimType::Gender),
        ("BIRTH_DATE", ClaimType::BirthDate),
        ("ZONE_INFO", ClaimType::ZoneInfo),
        ("LOCALE", ClaimType::Locale),
        ("LOCATION", ClaimType::Location),
    ];

    /// Parse a well-known claim name.
    ///
    /// Returns `None` for unknown names, including `CUSTOM`.
    pub fn parse(s: &str) -> Option<Self> {
        Self::WELL_KNOWN
            .iter()
            .find(|(name, _)| *name == s)
            .map(|(_, claim)| *claim)
    }
}

/// A claim defined by configuration and read from the token with a JSON path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomClaim {
    pub name: String,
    pub json_path_components: Vec<String>,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    pub required: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueType {
    #[default]
    String,
    Int,
    Float,
    Boolean,
    Any,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariablesConfiguration {
    pub inject_variables: Vec<VariableInjectionConfig>,
}

/// A value the runtime generates for a variable before executing the operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableInjectionConfig {
    pub variable_path_components: Vec<String>,
    pub variable_kind: InjectVariableKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_variable_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_format: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InjectVariableKind {
    EnvironmentVariable,
    Uuid,
    DateTime,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformationKind {
    #[default]
    Get,
}

/// Rewrites the response after execution: the value at `get.to` is replaced
/// by the value found at `get.from`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostResolveTransformation {
    pub kind: TransformationKind,
    pub depth: usize,
    pub get: GetTransformation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetTransformation {
    pub from: Vec<String>,
    pub to: Vec<String>,
}

/// A file the pipeline skipped, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationFailure {
    pub file_path: String,
    pub message: String,
}

/// Output of a compilation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedOperations {
    pub operations: Vec<GraphQLOperation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<OperationFailure>,
}

impl ParsedOperations {
    /// Look up a compiled operation by name.
    pub fn operation(&self, name: &str) -> Option<&GraphQLOperation> {
        self.operations.iter().find(|op| op.name == name)
    }
}
