//! Directive definitions understood by the compiler, merged into the user schema.
//!
//! Operations are validated against the merged schema, so every directive the
//! compiler reads must be declared. Definitions the user schema already
//! carries (including the parser's built-ins) are left alone.

use apollo_compiler::ast::OperationType;
use apollo_compiler::validation::Valid;
use apollo_compiler::Schema;
use indexmap::IndexMap;

use crate::config::CompileOptions;
use crate::directives::inject::DATE_TIME_FORMATS;
use crate::directives::json_schema::COMMON_PATTERNS;
use crate::error::CompileError;
use crate::rbac::ROLE_ENUM;
use crate::types::{ClaimType, CustomClaim};

const SCHEMA_PATH: &str = "schema.graphql";

/// Whether a definition declares a directive or a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionKind {
    Directive,
    Type,
}

/// One SDL definition contributed by the compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdlDefinition {
    pub name: String,
    pub kind: DefinitionKind,
    pub sdl: String,
}

impl SdlDefinition {
    fn directive(name: &str, sdl: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            kind: DefinitionKind::Directive,
            sdl: sdl.into(),
        }
    }

    fn enumeration<'a>(name: &str, values: impl IntoIterator<Item = &'a str>) -> Self {
        let values: Vec<String> = values.into_iter().map(|v| format!("  {v}")).collect();
        Self {
            name: name.to_string(),
            kind: DefinitionKind::Type,
            sdl: format!("enum {name} {{\n{}\n}}", values.join("\n")),
        }
    }
}

/// All definitions for the given roles and custom claims.
///
/// `WG_ROLE` is only emitted for a non-empty role list.
pub fn directive_definitions(
    roles: &[String],
    custom_claims: &IndexMap<String, CustomClaim>,
) -> Vec<SdlDefinition> {
    let mut definitions = vec![
        SdlDefinition::directive(
            "fromClaim",
            r#"directive @fromClaim(name: WG_CLAIM!, on: String = "") repeatable on VARIABLE_DEFINITION"#,
        ),
        SdlDefinition::enumeration(
            "WG_CLAIM",
            custom_claims
                .keys()
                .map(String::as_str)
                .chain(ClaimType::WELL_KNOWN.iter().map(|(name, _)| *name)),
        ),
        SdlDefinition::directive(
            "jsonSchema",
            "directive @jsonSchema(\n  title: String\n  description: String\n  multipleOf: Int\n  maximum: Int\n  exclusiveMaximum: Int\n  minimum: Int\n  exclusiveMinimum: Int\n  maxLength: Int\n  minLength: Int\n  pattern: String\n  maxItems: Int\n  minItems: Int\n  uniqueItems: Boolean\n  commonPattern: COMMON_REGEX_PATTERN\n  on: String\n) repeatable on VARIABLE_DEFINITION",
        ),
        SdlDefinition::enumeration(
            "COMMON_REGEX_PATTERN",
            COMMON_PATTERNS.iter().map(|(name, _)| *name),
        ),
        SdlDefinition::directive(
            "injectGeneratedUUID",
            "directive @injectGeneratedUUID(on: String) repeatable on VARIABLE_DEFINITION",
        ),
        SdlDefinition::directive(
            "injectEnvironmentVariable",
            "directive @injectEnvironmentVariable(name: String!, on: String) repeatable on VARIABLE_DEFINITION",
        ),
        SdlDefinition::directive(
            "injectCurrentDateTime",
            "directive @injectCurrentDateTime(format: TimeFormat = ISO8601, customFormat: String, on: String) repeatable on VARIABLE_DEFINITION",
        ),
        SdlDefinition::enumeration(
            "TimeFormat",
            DATE_TIME_FORMATS.iter().map(|(name, _)| *name),
        ),
        SdlDefinition::directive("internal", "directive @internal on VARIABLE_DEFINITION"),
        SdlDefinition::directive(
            "hooksVariable",
            "directive @hooksVariable on VARIABLE_DEFINITION",
        ),
        SdlDefinition::directive("transform", "directive @transform(get: String!) on FIELD"),
        SdlDefinition::directive(
            "internalOperation",
            "directive @internalOperation on QUERY | MUTATION | SUBSCRIPTION",
        ),
        SdlDefinition::directive(
            "requireAuthentication",
            "directive @requireAuthentication on QUERY | MUTATION | SUBSCRIPTION",
        ),
        SdlDefinition::directive(
            "rbac",
            "directive @rbac(\n  requireMatchAll: [WG_ROLE]\n  requireMatchAny: [WG_ROLE]\n  denyMatchAll: [WG_ROLE]\n  denyMatchAny: [WG_ROLE]\n) on QUERY | MUTATION | SUBSCRIPTION",
        ),
        SdlDefinition::directive("oneOf", "directive @oneOf on INPUT_OBJECT"),
    ];
    if !roles.is_empty() {
        definitions.push(SdlDefinition::enumeration(
            ROLE_ENUM,
            roles.iter().map(String::as_str),
        ));
    }
    definitions
}

/// Render every definition as one SDL document.
pub fn directive_definitions_sdl(options: &CompileOptions) -> String {
    directive_definitions(&options.roles, &options.custom_claims)
        .into_iter()
        .map(|def| def.sdl)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Parse and validate `sdl`, merged with the compiler's directive definitions.
///
/// A schema without a query root gets a placeholder `Query` type.
///
/// # Errors
///
/// Returns `CompileError::InvalidSchema` with the parser's diagnostics.
pub fn build_schema(sdl: &str, options: &CompileOptions) -> Result<Valid<Schema>, CompileError> {
    let existing = match Schema::parse(sdl, SCHEMA_PATH) {
        Ok(schema) => schema,
        Err(with_errors) => with_errors.partial,
    };

    let mut source = sdl.to_string();
    if existing.root_operation(OperationType::Query).is_none() {
        source.push_str("\n\ntype Query {\n  hello: String\n}\n");
    }

    if options.include_directive_definitions {
        let has_roles = !options.roles.is_empty() || existing.types.contains_key(ROLE_ENUM);
        for def in directive_definitions(&options.roles, &options.custom_claims) {
            let defined = match def.kind {
                DefinitionKind::Directive => {
                    existing.directive_definitions.contains_key(def.name.as_str())
                }
                DefinitionKind::Type => existing.types.contains_key(def.name.as_str()),
            };
            if defined || (def.name == "rbac" && !has_roles) {
                continue;
            }
            source.push_str("\n\n");
            source.push_str(&def.sdl);
            source.push('\n');
        }
    }

    Schema::parse_and_validate(source, SCHEMA_PATH).map_err(|with_errors| {
        CompileError::InvalidSchema {
            message: with_errors.errors.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definitions_cover_directives() {
        let names: Vec<String> = directive_definitions(&[], &IndexMap::new())
            .into_iter()
            .map(|def| def.name)
            .collect();
        for expected in [
            "fromClaim",
            "WG_CLAIM",
            "jsonSchema",
            "COMMON_REGEX_PATTERN",
            "injectGeneratedUUID",
            "injectEnvironmentVariable",
            "injectCurrentDateTime",
            "TimeFormat",
            "internal",
            "hooksVariable",
            "transform",
            "internalOperation",
            "requireAuthentication",
            "rbac",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing {expected}");
        }
        assert!(!names.iter().any(|n| n == "WG_ROLE"));
    }

    #[test]
    fn custom_claims_lead_the_claim_enum() {
        let options = CompileOptions::new().custom_claim(CustomClaim {
            name: "TENANT_ID".into(),
            json_path_components: vec!["tenant".into()],
            value_type: crate::types::ValueType::String,
            required: true,
        });
        let sdl = directive_definitions_sdl(&options);
        assert!(sdl.contains("enum WG_CLAIM {\n  TENANT_ID\n  ISSUER\n"));
    }

    #[test]
    fn roles_produce_role_enum() {
        let roles = vec!["admin".to_string(), "user".to_string()];
        let defs = directive_definitions(&roles, &IndexMap::new());
        let role_enum = defs.iter().find(|d| d.name == "WG_ROLE").unwrap();
        assert_eq!(role_enum.sdl, "enum WG_ROLE {\n  admin\n  user\n}");
    }

    #[test]
    fn build_schema_merges_definitions() {
        let schema = build_schema(
            "type Query { me: String }",
            &CompileOptions::new().roles(["admin"]),
        )
        .unwrap();
        assert!(schema.directive_definitions.contains_key("fromClaim"));
        assert!(schema.directive_definitions.contains_key("rbac"));
        assert!(schema.types.contains_key("WG_CLAIM"));
        assert!(schema.types.contains_key("WG_ROLE"));
    }

    #[test]
    fn build_schema_skips_rbac_without_roles() {
        let schema = build_schema("type Query { me: String }", &CompileOptions::new()).unwrap();
        assert!(!schema.directive_definitions.contains_key("rbac"));
        assert!(!schema.types.contains_key("WG_ROLE"));
    }

    #[test]
    fn build_schema_keeps_user_definitions() {
        let sdl = "type Query { me: String }\ndirective @internal(reason: String) on VARIABLE_DEFINITION";
        let schema = build_schema(sdl, &CompileOptions::new()).unwrap();
        let internal = &schema.directive_definitions["internal"];
        assert_eq!(internal.arguments.len(), 1);
    }

    #[test]
    fn build_schema_adds_query_root() {
        let schema = build_schema(
            "type Mutation { ping: Boolean }",
            &CompileOptions::new().include_directive_definitions(false),
        )
        .unwrap();
        assert!(schema.types.contains_key("Query"));
    }

    #[test]
    fn build_schema_reports_invalid_sdl() {
        let err = build_schema("type Query { me: Missing }", &CompileOptions::new()).unwrap_err();
        assert!(matches!(err, CompileError::InvalidSchema { .. }));
    }
}
