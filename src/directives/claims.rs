//! `@fromClaim`: bind a variable to a claim of the authenticated user.

use apollo_compiler::ast::VariableDefinition;

use super::{
    directive_injected_variable_path_components, directives_named, enum_argument,
    missing_argument, DirectiveContext,
};
use crate::error::CompileError;
use crate::types::{ClaimConfig, ClaimType};

/// Record one `ClaimConfig` per `@fromClaim` and require authentication.
///
/// Custom claims from the configuration take precedence over well-known names.
pub(crate) fn apply_from_claim(
    ctx: &mut DirectiveContext<'_>,
    variable: &VariableDefinition,
) -> Result<(), CompileError> {
    for directive in directives_named(variable, "fromClaim") {
        let name = enum_argument(directive, "name")?.ok_or_else(|| missing_argument(directive, "name"))?;
        let variable_path_components =
            directive_injected_variable_path_components(ctx, variable, directive)?;

        let claim = match ctx.custom_claims.get(name) {
            Some(custom) => ClaimConfig {
                variable_path_components,
                claim_type: ClaimType::Custom,
                custom: Some(custom.clone()),
            },
            None => ClaimConfig {
                variable_path_components,
                claim_type: ClaimType::parse(name).ok_or_else(|| CompileError::UnknownClaim {
                    name: name.to_string(),
                })?,
                custom: None,
            },
        };

        tracing::trace!(variable = %variable.name, claim = name, "variable bound to claim");
        ctx.authorization.claims.push(claim);
        ctx.authentication.required = true;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::test_support::Harness;
    use crate::config::CompileOptions;
    use crate::error::CompileError;
    use crate::types::{ClaimType, CustomClaim, ValueType};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn well_known_claim() {
        let mut harness = Harness::new(
            "mutation ($email: String! @fromClaim(name: EMAIL)) { createUser(input: {email: $email}) { id } }",
            &CompileOptions::new(),
        );
        harness.process().unwrap();

        assert!(harness.authentication.required);
        let claims = &harness.authorization.claims;
        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].claim_type, ClaimType::Email);
        assert_eq!(claims[0].variable_path_components, vec!["email"]);
        assert!(claims[0].custom.is_none());
    }

    #[test]
    fn alias_claim_uses_canonical_type() {
        let mut harness = Harness::new(
            "query ($id: ID! @fromClaim(name: USERID)) { user(id: $id) { id } }",
            &CompileOptions::new(),
        );
        harness.process().unwrap();
        assert_eq!(harness.authorization.claims[0].claim_type, ClaimType::Subject);
    }

    #[test]
    fn custom_claim() {
        let options = CompileOptions::new().custom_claim(CustomClaim {
            name: "TENANT_ID".into(),
            json_path_components: vec!["org".into(), "tenant".into()],
            value_type: ValueType::String,
            required: true,
        });
        let mut harness = Harness::new(
            r#"mutation ($input: CreateUser! @fromClaim(name: TENANT_ID, on: "name")) { createUser(input: $input) { id } }"#,
            &options,
        );
        harness.process().unwrap();

        let claim = &harness.authorization.claims[0];
        assert_eq!(claim.claim_type, ClaimType::Custom);
        assert_eq!(claim.variable_path_components, vec!["input", "name"]);
        assert_eq!(
            serde_json::to_value(claim).unwrap(),
            json!({
                "variablePathComponents": ["input", "name"],
                "claimType": "CUSTOM",
                "custom": {
                    "name": "TENANT_ID",
                    "jsonPathComponents": ["org", "tenant"],
                    "type": "STRING",
                    "required": true
                }
            })
        );
    }

    #[test]
    fn repeated_claims_on_sub_fields() {
        let mut harness = Harness::new(
            r#"mutation ($input: CreateUser! @fromClaim(name: EMAIL, on: "email") @fromClaim(name: NAME, on: "name")) {
                createUser(input: $input) { id }
            }"#,
            &CompileOptions::new(),
        );
        harness.process().unwrap();

        let claims: Vec<_> = harness
            .authorization
            .claims
            .iter()
            .map(|c| (c.claim_type, c.variable_path_components.join(".")))
            .collect();
        assert_eq!(
            claims,
            vec![
                (ClaimType::Email, "input.email".to_string()),
                (ClaimType::Name, "input.name".to_string())
            ]
        );
        // The claim-bound fields are hidden from clients only.
        assert_eq!(
            harness.schemas.variables["properties"]["input"]["properties"],
            json!({ "tags": { "type": ["array", "null"], "items": { "type": ["string", "null"] } } })
        );
        assert!(harness.schemas.internal["definitions"]["CreateUser"]["properties"]
            .get("email")
            .is_some());
    }

    const LOOSE_CLAIMS: &str = r#"
        enum LooseClaim { EMAIL SHOE_SIZE }
        directive @fromClaim(name: LooseClaim, on: String) repeatable on VARIABLE_DEFINITION
    "#;

    #[test]
    fn unknown_claim() {
        let mut harness = Harness::with_directives(
            LOOSE_CLAIMS,
            "query ($id: ID @fromClaim(name: SHOE_SIZE)) { user(id: $id) { id } }",
        );
        match harness.process() {
            Err(CompileError::UnknownClaim { name }) => assert_eq!(name, "SHOE_SIZE"),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(!harness.authentication.required);
    }

    #[test]
    fn claim_requires_name() {
        let mut harness = Harness::with_directives(
            LOOSE_CLAIMS,
            "query ($id: ID @fromClaim) { user(id: $id) { id } }",
        );
        match harness.process() {
            Err(CompileError::MissingDirectiveArgument { directive, argument }) => {
                assert_eq!(directive, "fromClaim");
                assert_eq!(argument, "name");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}

