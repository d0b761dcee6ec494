//! `@jsonSchema`: attach JSON Schema validation keywords to a variable.

use apollo_compiler::ast::{Directive, Value as GraphQLValue, VariableDefinition};
use serde_json::Value;

use super::{
    directive_injected_variable_path_components, directives_named, invalid_argument,
    DirectiveContext,
};
use crate::error::CompileError;
use crate::schema_path;

/// `commonPattern` values and the regular expressions they stand for.
pub(crate) const COMMON_PATTERNS: &[(&str, &str)] = &[
    ("EMAIL", EMAIL_PATTERN),
    ("DOMAIN", r"^([a-z0-9]+(-[a-z0-9]+)*\.)+[a-z]{2,}$"),
    ("URL", URL_PATTERN),
];

const EMAIL_PATTERN: &str = r#"(?:[a-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[a-z0-9!#$%&'*+/=?^_`{|}~-]+)*|"(?:[\x01-\x08\x0b\x0c\x0e-\x1f\x21\x23-\x5b\x5d-\x7f]|\\[\x01-\x09\x0b\x0c\x0e-\x7f])*")@(?:(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+[a-z0-9](?:[a-z0-9-]*[a-z0-9])?|\[(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?|[a-z0-9-]*[a-z0-9]:(?:[\x01-\x08\x0b\x0c\x0e-\x1f\x21-\x5a\x53-\x7f]|\\[\x01-\x09\x0b\x0c\x0e-\x7f])+)\])"#;

const URL_PATTERN: &str = r"(((http|ftp|https)://)+(([0-9a-z_-]+\.)+(aero|asia|biz|cat|com|coop|edu|gov|info|int|jobs|mil|mobi|museum|name|net|org|pro|tel|travel|ac|ad|ae|af|ag|ai|al|am|an|ao|aq|ar|as|at|au|aw|ax|az|ba|bb|bd|be|bf|bg|bh|bi|bj|bm|bn|bo|br|bs|bt|bv|bw|by|bz|ca|cc|cd|cf|cg|ch|ci|ck|cl|cm|cn|co|cr|cu|cv|cx|cy|cz|de|dj|dk|dm|do|dz|ec|ee|eg|er|es|et|eu|fi|fj|fk|fm|fo|fr|ga|gb|gd|ge|gf|gg|gh|gi|gl|gm|gn|gp|gq|gr|gs|gt|gu|gw|gy|hk|hm|hn|hr|ht|hu|id|ie|il|im|in|io|iq|ir|is|it|je|jm|jo|jp|ke|kg|kh|ki|km|kn|kp|kr|kw|ky|kz|la|lb|lc|li|lk|lr|ls|lt|lu|lv|ly|ma|mc|md|me|mg|mh|mk|ml|mn|mo|mp|mr|ms|mt|mu|mv|mw|mx|my|mz|na|nc|ne|nf|ng|ni|nl|no|np|nr|nu|nz|nom|pa|pe|pf|pg|ph|pk|pl|pm|pn|pr|ps|pt|pw|py|qa|re|ra|rs|ru|rw|sa|sb|sc|sd|se|sg|sh|si|sj|sk|sl|sm|sn|so|sr|st|su|sv|sy|sz|tc|td|tf|tg|th|tj|tk|tl|tm|tn|to|tp|tr|tt|tv|tw|tz|ua|ug|uk|us|uy|uz|va|vc|ve|vg|vi|vn|vu|wf|ws|ye|yt|yu|za|zm|zw|arpa)(:[0-9]+)?((/([~0-9a-zA-Z#+%@./_-]+))?(\?[0-9a-zA-Z+%@/&\[\];=_-]+)?)?))\b";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LiteralKind {
    String,
    Int,
    Boolean,
}

const KEYWORDS: &[(&str, LiteralKind)] = &[
    ("title", LiteralKind::String),
    ("description", LiteralKind::String),
    ("multipleOf", LiteralKind::Int),
    ("maximum", LiteralKind::Int),
    ("exclusiveMaximum", LiteralKind::Int),
    ("minimum", LiteralKind::Int),
    ("exclusiveMinimum", LiteralKind::Int),
    ("maxLength", LiteralKind::Int),
    ("minLength", LiteralKind::Int),
    ("pattern", LiteralKind::String),
    ("maxItems", LiteralKind::Int),
    ("minItems", LiteralKind::Int),
    ("uniqueItems", LiteralKind::Boolean),
];

/// Write the keywords of every `@jsonSchema` onto each variable schema that
/// contains the target property.
pub(crate) fn apply_json_schema(
    ctx: &mut DirectiveContext<'_>,
    variable: &VariableDefinition,
) -> Result<(), CompileError> {
    for directive in directives_named(variable, "jsonSchema") {
        let path = directive_injected_variable_path_components(ctx, variable, directive)?;
        let keywords = keywords(directive)?;

        for schema in ctx.schemas.all_mut() {
            let Some(Value::Object(property)) = schema_path::property_mut(schema, &path) else {
                continue;
            };
            for (keyword, value) in &keywords {
                if property.contains_key(*keyword) {
                    return Err(CompileError::KeywordAlreadySet {
                        keyword: keyword.to_string(),
                        path: path.join("."),
                    });
                }
                property.insert(keyword.to_string(), value.clone());
            }
        }
    }
    Ok(())
}

fn keywords(directive: &Directive) -> Result<Vec<(&'static str, Value)>, CompileError> {
    let has_pattern = directive
        .arguments
        .iter()
        .any(|argument| argument.name.as_str() == "pattern");

    let mut keywords = Vec::with_capacity(directive.arguments.len());
    for argument in &directive.arguments {
        let name = argument.name.as_str();
        match name {
            "on" => continue,
            "commonPattern" => {
                if has_pattern {
                    return Err(CompileError::ConflictingDirectiveArguments {
                        directive: directive.name.to_string(),
                        first: "pattern".into(),
                        second: "commonPattern".into(),
                    });
                }
                let GraphQLValue::Enum(value) = &*argument.value else {
                    return Err(invalid_argument(directive, name, "an enum value", &argument.value));
                };
                let (_, pattern) = COMMON_PATTERNS
                    .iter()
                    .find(|(pattern_name, _)| *pattern_name == value.as_str())
                    .ok_or_else(|| CompileError::UnknownEnumValue {
                        directive: directive.name.to_string(),
                        argument: name.to_string(),
                        value: value.to_string(),
                    })?;
                keywords.push(("pattern", Value::String((*pattern).to_string())));
            }
            _ => {
                let Some((keyword, kind)) = KEYWORDS.iter().find(|(keyword, _)| *keyword == name)
                else {
                    return Err(CompileError::InvalidDirectiveArgument {
                        directive: directive.name.to_string(),
                        argument: name.to_string(),
                        expected: "a JSON Schema keyword".into(),
                        actual: name.to_string(),
                    });
                };
                keywords.push((*keyword, literal(directive, keyword, *kind, &argument.value)?));
            }
        }
    }
    Ok(keywords)
}

fn literal(
    directive: &Directive,
    keyword: &str,
    kind: LiteralKind,
    value: &GraphQLValue,
) -> Result<Value, CompileError> {
    match (kind, value) {
        (LiteralKind::String, GraphQLValue::String(s)) => Ok(Value::String(s.to_string())),
        (LiteralKind::Boolean, GraphQLValue::Boolean(b)) => Ok(Value::Bool(*b)),
        (LiteralKind::Int, GraphQLValue::Int(i)) => i
            .as_str()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| invalid_argument(directive, keyword, "a 64-bit integer", value)),
        (LiteralKind::String, other) => Err(invalid_argument(directive, keyword, "a string", other)),
        (LiteralKind::Int, other) => Err(invalid_argument(directive, keyword, "an int", other)),
        (LiteralKind::Boolean, other) => {
            Err(invalid_argument(directive, keyword, "a boolean", other))
        }
    }
}
