//! `@injectEnvironmentVariable`, `@injectGeneratedUUID` and `@injectCurrentDateTime`.

use apollo_compiler::ast::VariableDefinition;

use super::{
    directive_injected_variable_path_components, directives_named, enum_argument,
    missing_argument, string_argument, DirectiveContext,
};
use crate::error::CompileError;
use crate::types::{InjectVariableKind, VariableInjectionConfig};

/// `TimeFormat` enum values and their Go reference-time layouts.
pub(crate) const DATE_TIME_FORMATS: &[(&str, &str)] = &[
    ("ISO8601", RFC3339),
    ("ANSIC", "Mon Jan _2 15:04:05 2006"),
    ("UnixDate", "Mon Jan _2 15:04:05 MST 2006"),
    ("RubyDate", "Mon Jan 02 15:04:05 -0700 2006"),
    ("RFC822", "02 Jan 06 15:04 MST"),
    ("RFC822Z", "02 Jan 06 15:04 -0700"),
    ("RFC850", "Monday, 02-Jan-06 15:04:05 MST"),
    ("RFC1123", "Mon, 02 Jan 2006 15:04:05 MST"),
    ("RFC1123Z", "Mon, 02 Jan 2006 15:04:05 -0700"),
    ("RFC3339", RFC3339),
    ("RFC3339Nano", "2006-01-02T15:04:05.999999999Z07:00"),
    ("Kitchen", "3:04PM"),
    ("Stamp", "Jan _2 15:04:05"),
    ("StampMilli", "Jan _2 15:04:05.000"),
    ("StampMicro", "Jan _2 15:04:05.000000"),
    ("StampNano", "Jan _2 15:04:05.000000000"),
];

const RFC3339: &str = "2006-01-02T15:04:05Z07:00";

fn injection(
    variable_path_components: Vec<String>,
    variable_kind: InjectVariableKind,
) -> VariableInjectionConfig {
    VariableInjectionConfig {
        variable_path_components,
        variable_kind,
        environment_variable_name: None,
        date_format: None,
    }
}

pub(crate) fn apply_inject_environment_variable(
    ctx: &mut DirectiveContext<'_>,
    variable: &VariableDefinition,
) -> Result<(), CompileError> {
    for directive in directives_named(variable, "injectEnvironmentVariable") {
        let name = string_argument(directive, "name")?
            .ok_or_else(|| missing_argument(directive, "name"))?;
        let path = directive_injected_variable_path_components(ctx, variable, directive)?;
        ctx.variables_configuration
            .inject_variables
            .push(VariableInjectionConfig {
                environment_variable_name: Some(name.to_string()),
                ..injection(path, InjectVariableKind::EnvironmentVariable)
            });
    }
    Ok(())
}

pub(crate) fn apply_inject_generated_uuid(
    ctx: &mut DirectiveContext<'_>,
    variable: &VariableDefinition,
) -> Result<(), CompileError> {
    for directive in directives_named(variable, "injectGeneratedUUID") {
        let path = directive_injected_variable_path_components(ctx, variable, directive)?;
        ctx.variables_configuration
            .inject_variables
            .push(injection(path, InjectVariableKind::Uuid));
    }
    Ok(())
}

/// `format` picks a predefined layout, `customFormat` passes one through;
/// neither means RFC 3339.
pub(crate) fn apply_inject_current_date_time(
    ctx: &mut DirectiveContext<'_>,
    variable: &VariableDefinition,
) -> Result<(), CompileError> {
    for directive in directives_named(variable, "injectCurrentDateTime") {
        let format = enum_argument(directive, "format")?;
        let custom_format = string_argument(directive, "customFormat")?;
        let layout = match (format, custom_format) {
            (Some(_), Some(_)) => {
                return Err(CompileError::ConflictingDirectiveArguments {
                    directive: directive.name.to_string(),
                    first: "format".into(),
                    second: "customFormat".into(),
                })
            }
            (Some(format), None) => DATE_TIME_FORMATS
                .iter()
                .find(|(name, _)| *name == format)
                .map(|(_, layout)| (*layout).to_string())
                .ok_or_else(|| CompileError::UnknownEnumValue {
                    directive: directive.name.to_string(),
                    argument: "format".into(),
                    value: format.to_string(),
                })?,
            (None, Some(custom)) => custom.to_string(),
            (None, None) => RFC3339.to_string(),
        };

        let path = directive_injected_variable_path_components(ctx, variable, directive)?;
        ctx.variables_configuration
            .inject_variables
            .push(VariableInjectionConfig {
                date_format: Some(layout),
                ..injection(path, InjectVariableKind::DateTime)
            });
    }
    Ok(())
}
