//! Compiler options and the JSON configuration file they are loaded from.

use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::LoadError;
use crate::types::{ClaimType, CustomClaim, ValueType};

/// Options for compiling operations.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Named types rendered as `{}` in the interpolation variables schema.
    pub interpolate_as_json: Vec<String>,
    /// Custom scalars carrying arbitrary JSON.
    pub custom_json_scalars: Vec<String>,
    /// Custom scalars restricted to a fixed set of string values in variables.
    pub custom_enum_mappings: IndexMap<String, Vec<String>>,
    /// Custom claims by `WG_CLAIM` enum value.
    pub custom_claims: IndexMap<String, CustomClaim>,
    /// Role names for the `WG_ROLE` enum.
    pub roles: Vec<String>,
    /// Keep `@fromClaim` and `@internal` variables in the client-facing schemas.
    pub keep_from_claim_variables: bool,
    /// Merge the compiler's directive definitions into the schema before validation.
    pub include_directive_definitions: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            interpolate_as_json: Vec::new(),
            custom_json_scalars: Vec::new(),
            custom_enum_mappings: IndexMap::new(),
            custom_claims: IndexMap::new(),
            roles: Vec::new(),
            keep_from_claim_variables: false,
            include_directive_definitions: true,
        }
    }
}

impl CompileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interpolate_as_json<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.interpolate_as_json = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn custom_json_scalars<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.custom_json_scalars = names.into_iter().map(Into::into).collect();
        self
    }

    /// Map the custom scalar `name` to an enum of `values`.
    pub fn custom_enum_mapping<I, S>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.custom_enum_mappings
            .insert(name.into(), values.into_iter().map(Into::into).collect());
        self
    }

    pub fn roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    /// Register a custom claim under its `WG_CLAIM` name.
    pub fn custom_claim(mut self, claim: CustomClaim) -> Self {
        self.custom_claims.insert(claim.name.clone(), claim);
        self
    }

    pub fn keep_from_claim_variables(mut self, keep: bool) -> Self {
        self.keep_from_claim_variables = keep;
        self
    }

    pub fn include_directive_definitions(mut self, include: bool) -> Self {
        self.include_directive_definitions = include;
        self
    }

    /// Load options from a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::FileNotFound`/`ReadError` for IO failures,
    /// `LoadError::InvalidJson` for malformed JSON and
    /// `LoadError::InvalidConfig` for semantically invalid entries.
    pub fn from_file(path: &Path) -> Result<Self, LoadError> {
        if !path.exists() {
            return Err(LoadError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path).map_err(|source| LoadError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Parse options from a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::InvalidJson` or `LoadError::InvalidConfig`.
    pub fn from_json_str(content: &str) -> Result<Self, LoadError> {
        let file: ConfigFile =
            serde_json::from_str(content).map_err(|source| LoadError::InvalidJson { source })?;
        file.into_options()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    #[serde(default, rename = "interpolateVariableDefinitionAsJSON")]
    interpolate_variable_definition_as_json: Vec<String>,
    #[serde(default)]
    custom_json_scalars: Vec<String>,
    #[serde(default)]
    custom_claims: IndexMap<String, CustomClaimEntry>,
    #[serde(default)]
    custom_enum_mappings: Vec<EnumMappingEntry>,
    #[serde(default)]
    roles: Vec<String>,
    #[serde(default)]
    keep_from_claim_variables: bool,
    #[serde(default = "default_true")]
    include_directive_definitions: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnumMappingEntry {
    #[serde(alias = "name")]
    normalised_name: String,
    values: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomClaimEntry {
    json_path: String,
    #[serde(default, rename = "type")]
    value_type: ClaimValueKind,
    #[serde(default = "default_true")]
    required: bool,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ClaimValueKind {
    #[default]
    String,
    Int,
    Float,
    Boolean,
    Any,
}

impl From<ClaimValueKind> for ValueType {
    fn from(kind: ClaimValueKind) -> Self {
        match kind {
            ClaimValueKind::String => ValueType::String,
            ClaimValueKind::Int => ValueType::Int,
            ClaimValueKind::Float => ValueType::Float,
            ClaimValueKind::Boolean => ValueType::Boolean,
            ClaimValueKind::Any => ValueType::Any,
        }
    }
}

fn default_true() -> bool {
    true
}

impl ConfigFile {
    fn into_options(self) -> Result<CompileOptions, LoadError> {
        let mut options = CompileOptions::new()
            .interpolate_as_json(self.interpolate_variable_definition_as_json)
            .custom_json_scalars(self.custom_json_scalars)
            .roles(self.roles)
            .keep_from_claim_variables(self.keep_from_claim_variables)
            .include_directive_definitions(self.include_directive_definitions);

        for entry in self.custom_enum_mappings {
            if entry.values.is_empty() {
                return Err(LoadError::InvalidConfig {
                    message: format!(
                        "customEnumMappings.{}: values must not be empty",
                        entry.normalised_name
                    ),
                });
            }
            options = options.custom_enum_mapping(entry.normalised_name, entry.values);
        }

        for (name, entry) in self.custom_claims {
            if is_reserved_claim_name(&name) {
                return Err(LoadError::InvalidConfig {
                    message: format!("customClaims.{name}: name collides with a well-known claim"),
                });
            }
            let json_path_components: Vec<String> = entry
                .json_path
                .split('.')
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect();
            if json_path_components.is_empty() {
                return Err(LoadError::InvalidConfig {
                    message: format!("customClaims.{name}: jsonPath must not be empty"),
                });
            }
            options = options.custom_claim(CustomClaim {
                name,
                json_path_components,
                value_type: entry.value_type.into(),
                required: entry.required,
            });
        }

        Ok(options)
    }
}

fn is_reserved_claim_name(name: &str) -> bool {
    name == "CUSTOM" || ClaimType::parse(name).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_include_directive_definitions() {
        let options = CompileOptions::new();
        assert!(options.include_directive_definitions);
        assert!(!options.keep_from_claim_variables);
        assert!(options.custom_claims.is_empty());
        assert!(options.custom_enum_mappings.is_empty());
    }

    #[test]
    fn parse_enum_mappings_and_claim_visibility() {
        let options = CompileOptions::from_json_str(
            r#"{
                "keepFromClaimVariables": true,
                "customEnumMappings": [
                    { "normalisedName": "Currency", "values": ["EUR", "USD"] },
                    { "name": "Locale", "values": ["en"] }
                ]
            }"#,
        )
        .unwrap();

        assert!(options.keep_from_claim_variables);
        assert_eq!(options.custom_enum_mappings["Currency"], vec!["EUR", "USD"]);
        assert_eq!(options.custom_enum_mappings["Locale"], vec!["en"]);
    }

    #[test]
    fn empty_enum_mapping_rejected() {
        let err = CompileOptions::from_json_str(
            r#"{"customEnumMappings": [{"normalisedName": "Currency", "values": []}]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("customEnumMappings.Currency"));
    }

    #[test]
    fn parse_config_document() {
        let options = CompileOptions::from_json_str(
            r#"{
                "interpolateVariableDefinitionAsJSON": ["SearchFilter"],
                "customJsonScalars": ["Geometry"],
                "roles": ["admin", "user"],
                "customClaims": {
                    "TENANT_ID": { "jsonPath": "org.tenant.id" },
                    "IS_STAFF": { "jsonPath": "staff", "type": "boolean", "required": false }
                }
            }"#,
        )
        .unwrap();

        assert_eq!(options.interpolate_as_json, vec!["SearchFilter"]);
        assert_eq!(options.custom_json_scalars, vec!["Geometry"]);
        assert_eq!(options.roles, vec!["admin", "user"]);

        let tenant = &options.custom_claims["TENANT_ID"];
        assert_eq!(tenant.json_path_components, vec!["org", "tenant", "id"]);
        assert_eq!(tenant.value_type, ValueType::String);
        assert!(tenant.required);

        let staff = &options.custom_claims["IS_STAFF"];
        assert_eq!(staff.value_type, ValueType::Boolean);
        assert!(!staff.required);
    }

    #[test]
    fn empty_json_path_rejected() {
        let err = CompileOptions::from_json_str(r#"{"customClaims": {"TENANT": {"jsonPath": ""}}}"#)
            .unwrap_err();
        assert!(matches!(err, LoadError::InvalidConfig { .. }));
    }

    #[test]
    fn well_known_claim_name_rejected() {
        let err = CompileOptions::from_json_str(r#"{"customClaims": {"EMAIL": {"jsonPath": "mail"}}}"#)
            .unwrap_err();
        assert!(err.to_string().contains("well-known"));
    }

    #[test]
    fn unknown_claim_type_rejected() {
        let err = CompileOptions::from_json_str(
            r#"{"customClaims": {"TENANT": {"jsonPath": "t", "type": "date"}}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::InvalidJson { .. }));
    }
}
