//! Variables payload validation against compiled operations.

use std::str::FromStr;

use serde_json::Value;

use crate::error::{ValidateError, VariableError};
use crate::types::GraphQLOperation;

/// Who supplies the variables, which selects the schema variant to check against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Audience {
    /// A client request: `VariablesSchema`.
    #[default]
    Public,
    /// After claims and internal variables are filled in: `InternalVariablesSchema`.
    Internal,
    /// After injection: `InjectedVariablesSchema`.
    Injected,
}

impl FromStr for Audience {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Audience::Public),
            "internal" => Ok(Audience::Internal),
            "injected" => Ok(Audience::Injected),
            other => Err(format!(
                "unknown audience '{other}', expected public, internal or injected"
            )),
        }
    }
}

impl Audience {
    fn schema<'a>(&self, operation: &'a GraphQLOperation) -> &'a Value {
        match self {
            Audience::Public => &operation.variables_schema,
            Audience::Internal => &operation.internal_variables_schema,
            Audience::Injected => &operation.injected_variables_schema,
        }
    }
}

/// Validate a variables payload against the operation's schema for `audience`.
///
/// # Errors
///
/// Returns `ValidateError::Invalid` with every violation, or
/// `ValidateError::InvalidSchema` if the stored schema doesn't compile.
pub fn validate_variables(
    operation: &GraphQLOperation,
    variables: &Value,
    audience: Audience,
) -> Result<(), ValidateError> {
    validate_against_schema(audience.schema(operation), variables)
}

/// Validate a payload against a variables schema.
pub fn validate_against_schema(schema: &Value, payload: &Value) -> Result<(), ValidateError> {
    let validator = jsonschema::validator_for(schema).map_err(|e| ValidateError::InvalidSchema {
        message: e.to_string(),
    })?;

    let errors: Vec<VariableError> = validator
        .iter_errors(payload)
        .map(|e| VariableError {
            path: e.instance_path.to_string(),
            message: e.to_string(),
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidateError::Invalid { errors })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        AuthenticationConfig, AuthorizationConfig, ExecutionEngine, OperationType,
        VariablesConfiguration,
    };
    use serde_json::json;

    fn operation() -> GraphQLOperation {
        let public = json!({
            "type": "object",
            "properties": { "limit": { "type": ["integer", "null"] } },
            "additionalProperties": false
        });
        let internal = json!({
            "type": "object",
            "properties": {
                "limit": { "type": ["integer", "null"] },
                "email": { "type": "string" }
            },
            "additionalProperties": false,
            "required": ["email"]
        });
        GraphQLOperation {
            name: "Users".into(),
            path_name: "Users".into(),
            content: "query Users($limit:Int$email:String!){users(limit:$limit email:$email){id}}".into(),
            operation_type: OperationType::Query,
            execution_engine: ExecutionEngine::Graphql,
            variables_schema: public.clone(),
            interpolation_variables_schema: public,
            internal_variables_schema: internal.clone(),
            injected_variables_schema: internal,
            response_schema: json!({}),
            authentication_config: AuthenticationConfig { required: true },
            authorization_config: AuthorizationConfig::default(),
            variables_configuration: VariablesConfiguration::default(),
            internal: false,
            post_resolve_transformations: Vec::new(),
        }
    }

    #[test]
    fn public_payload() {
        let op = operation();
        assert!(validate_variables(&op, &json!({ "limit": 10 }), Audience::Public).is_ok());
        assert!(validate_variables(&op, &json!({}), Audience::Public).is_ok());
    }

    #[test]
    fn claim_variables_are_rejected_from_clients() {
        let op = operation();
        let result = validate_variables(&op, &json!({ "email": "a@b.c" }), Audience::Public);
        assert!(matches!(result, Err(ValidateError::Invalid { .. })));
    }

    #[test]
    fn internal_payload_requires_claims() {
        let op = operation();
        let result = validate_variables(&op, &json!({ "limit": 3 }), Audience::Internal);
        match result {
            Err(ValidateError::Invalid { errors }) => {
                assert_eq!(errors.len(), 1);
                assert!(errors[0].message.contains("email"));
            }
            other => panic!("expected a missing-property error, got {other:?}"),
        }
        assert!(
            validate_variables(&op, &json!({ "email": "a@b.c" }), Audience::Internal).is_ok()
        );
    }

    #[test]
    fn error_paths_point_at_values() {
        let op = operation();
        match validate_variables(&op, &json!({ "limit": "ten" }), Audience::Public) {
            Err(ValidateError::Invalid { errors }) => assert_eq!(errors[0].path, "/limit"),
            other => panic!("expected a type error, got {other:?}"),
        }
    }

    #[test]
    fn audience_from_str() {
        assert_eq!("internal".parse::<Audience>(), Ok(Audience::Internal));
        assert!("admin".parse::<Audience>().is_err());
    }
}
