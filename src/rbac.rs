//! Operation-level access requirements: `@rbac` and `@requireAuthentication`.

use apollo_compiler::ast::{OperationDefinition, Value as GraphQLValue};
use apollo_compiler::schema::ExtendedType;
use apollo_compiler::Schema;

use crate::directives::{argument, invalid_argument};
use crate::error::CompileError;
use crate::types::{AuthenticationConfig, AuthorizationConfig};

/// Name of the enum listing the configured roles.
pub const ROLE_ENUM: &str = "WG_ROLE";

/// Collect role requirements and authentication from the operation's directives.
///
/// Role names missing from the `WG_ROLE` enum are dropped; without that enum
/// `@rbac` has no effect. Any role or claim requirement also requires
/// authentication.
pub(crate) fn apply_operation_directives(
    schema: &Schema,
    operation: &OperationDefinition,
    authentication: &mut AuthenticationConfig,
    authorization: &mut AuthorizationConfig,
) -> Result<(), CompileError> {
    let roles: Vec<&str> = match schema.types.get(ROLE_ENUM) {
        Some(ExtendedType::Enum(roles)) => roles.values.keys().map(|role| role.as_str()).collect(),
        _ => Vec::new(),
    };

    for directive in operation.directives.iter() {
        match directive.name.as_str() {
            "requireAuthentication" => authentication.required = true,
            "rbac" if !roles.is_empty() => {
                let role_config = &mut authorization.role_config;
                for (name, target) in [
                    ("requireMatchAll", &mut role_config.require_match_all),
                    ("requireMatchAny", &mut role_config.require_match_any),
                    ("denyMatchAll", &mut role_config.deny_match_all),
                    ("denyMatchAny", &mut role_config.deny_match_any),
                ] {
                    let Some(value) = argument(directive, name) else {
                        continue;
                    };
                    let values: Vec<&GraphQLValue> = match value {
                        GraphQLValue::List(values) => values.iter().map(|value| &**value).collect(),
                        GraphQLValue::Enum(_) => vec![value],
                        other => return Err(invalid_argument(directive, name, "a list of roles", other)),
                    };
                    for value in values {
                        let GraphQLValue::Enum(role) = value else {
                            return Err(invalid_argument(directive, name, "a role", value));
                        };
                        if !roles.contains(&role.as_str()) {
                            tracing::debug!(role = %role, "ignoring unknown role");
                            continue;
                        }
                        if !target.iter().any(|existing| existing == role.as_str()) {
                            target.push(role.to_string());
                        }
                    }
                }
            }
            _ => {}
        }
    }

    if !authorization.role_config.is_empty() || !authorization.claims.is_empty() {
        authentication.required = true;
    }
    Ok(())
}
