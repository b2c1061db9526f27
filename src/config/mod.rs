use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::env;

use crate::error::SoftDeleteError;

/// Plugin options as supplied by the caller, before resolution
/// Option names follow the established plugin vocabulary so existing
/// JSON/YAML option blocks deserialize unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoftDeleteConfig {
    #[serde(default)]
    pub field_name_deleted: Option<String>,
    #[serde(default)]
    pub field_name_deleted_at: Option<String>,
    #[serde(default)]
    pub field_name_deleted_by: Option<String>,

    #[serde(default, deserialize_with = "lenient_bool")]
    pub deleted_at: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub deleted_by: Option<bool>,
    #[serde(default)]
    pub deleted_by_type: Option<DeletedByType>,

    #[serde(default)]
    pub index_fields: Option<Selection>,

    #[serde(rename = "use$neOperator", default, deserialize_with = "lenient_bool")]
    pub use_ne_operator: Option<bool>,

    #[serde(default)]
    pub override_methods: Option<Selection>,

    #[serde(default, deserialize_with = "lenient_bool")]
    pub validate_before_delete: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub validate_before_restore: Option<bool>,
}

/// `true`, `"all"`, or an explicit list of names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Selection {
    Flag(bool),
    Keyword(String),
    List(Vec<String>),
}

impl Selection {
    pub fn all() -> Self {
        Selection::Keyword("all".to_string())
    }

    pub fn list<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Selection::List(names.into_iter().map(Into::into).collect())
    }

    /// True for `true` and `"all"`
    pub fn selects_everything(&self) -> bool {
        match self {
            Selection::Flag(flag) => *flag,
            Selection::Keyword(word) => word == "all",
            Selection::List(_) => false,
        }
    }

    /// Parse the environment form: `all`, `true`, `false`, or a comma list
    fn from_env_value(raw: &str) -> Self {
        match raw.trim() {
            "true" => Selection::Flag(true),
            "false" | "" => Selection::Flag(false),
            "all" => Selection::all(),
            list => Selection::list(list.split(',').map(|s| s.trim()).filter(|s| !s.is_empty())),
        }
    }
}

/// Value type stored in the deleted-by field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeletedByType {
    #[default]
    ObjectId,
    String,
    Number,
    Mixed,
}

impl DeletedByType {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "ObjectId" | "objectid" => Some(DeletedByType::ObjectId),
            "String" | "string" => Some(DeletedByType::String),
            "Number" | "number" => Some(DeletedByType::Number),
            "Mixed" | "mixed" => Some(DeletedByType::Mixed),
            _ => None,
        }
    }

    /// Check whether a value is acceptable for this type
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            DeletedByType::ObjectId | DeletedByType::String => value.is_string(),
            DeletedByType::Number => value.is_number(),
            DeletedByType::Mixed => true,
        }
    }
}

/// Non-boolean values are ignored rather than rejected
fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(flag) => Some(flag),
        _ => None,
    })
}

impl SoftDeleteConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(value: Value) -> Result<Self, SoftDeleteError> {
        serde_json::from_value(value)
            .map_err(|e| SoftDeleteError::Config(format!("invalid soft delete options: {}", e)))
    }

    pub fn from_yaml_str(source: &str) -> Result<Self, SoftDeleteError> {
        serde_yaml::from_str(source)
            .map_err(|e| SoftDeleteError::Config(format!("invalid soft delete options: {}", e)))
    }

    /// Defaults overlaid with `SOFT_DELETE_*` environment variables
    pub fn from_env() -> Self {
        // Load .env if present so local runs pick up overrides
        let _ = dotenvy::dotenv();
        Self::default().with_overrides(|key| env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(v) = lookup("SOFT_DELETE_FIELD_NAME_DELETED") {
            self.field_name_deleted = Some(v);
        }
        if let Some(v) = lookup("SOFT_DELETE_FIELD_NAME_DELETED_AT") {
            self.field_name_deleted_at = Some(v);
        }
        if let Some(v) = lookup("SOFT_DELETE_FIELD_NAME_DELETED_BY") {
            self.field_name_deleted_by = Some(v);
        }
        if let Some(v) = lookup("SOFT_DELETE_DELETED_AT") {
            self.deleted_at = v.parse().ok().or(self.deleted_at);
        }
        if let Some(v) = lookup("SOFT_DELETE_DELETED_BY") {
            self.deleted_by = v.parse().ok().or(self.deleted_by);
        }
        if let Some(v) = lookup("SOFT_DELETE_DELETED_BY_TYPE") {
            match DeletedByType::parse(&v) {
                Some(kind) => self.deleted_by_type = Some(kind),
                None => tracing::warn!("Ignoring unknown SOFT_DELETE_DELETED_BY_TYPE '{}'", v),
            }
        }
        if let Some(v) = lookup("SOFT_DELETE_INDEX_FIELDS") {
            self.index_fields = Some(Selection::from_env_value(&v));
        }
        if let Some(v) = lookup("SOFT_DELETE_USE_NE_OPERATOR") {
            self.use_ne_operator = v.parse().ok().or(self.use_ne_operator);
        }
        if let Some(v) = lookup("SOFT_DELETE_OVERRIDE_METHODS") {
            self.override_methods = Some(Selection::from_env_value(&v));
        }
        if let Some(v) = lookup("SOFT_DELETE_VALIDATE_BEFORE_DELETE") {
            self.validate_before_delete = v.parse().ok().or(self.validate_before_delete);
        }
        if let Some(v) = lookup("SOFT_DELETE_VALIDATE_BEFORE_RESTORE") {
            self.validate_before_restore = v.parse().ok().or(self.validate_before_restore);
        }
        self
    }

    pub fn with_field_names(
        mut self,
        deleted: impl Into<String>,
        deleted_at: impl Into<String>,
        deleted_by: impl Into<String>,
    ) -> Self {
        self.field_name_deleted = Some(deleted.into());
        self.field_name_deleted_at = Some(deleted_at.into());
        self.field_name_deleted_by = Some(deleted_by.into());
        self
    }

    pub fn with_deleted_at(mut self) -> Self {
        self.deleted_at = Some(true);
        self
    }

    pub fn with_deleted_by(mut self, kind: DeletedByType) -> Self {
        self.deleted_by = Some(true);
        self.deleted_by_type = Some(kind);
        self
    }

    pub fn with_index_fields(mut self, selection: Selection) -> Self {
        self.index_fields = Some(selection);
        self
    }

    pub fn with_override_methods(mut self, selection: Selection) -> Self {
        self.override_methods = Some(selection);
        self
    }

    pub fn with_ne_operator(mut self, enabled: bool) -> Self {
        self.use_ne_operator = Some(enabled);
        self
    }

    pub fn with_validation(mut self, before_delete: bool, before_restore: bool) -> Self {
        self.validate_before_delete = Some(before_delete);
        self.validate_before_restore = Some(before_restore);
        self
    }
}

// Environment-derived defaults - read once, never consulted at call time
pub static DEFAULTS: Lazy<SoftDeleteConfig> = Lazy::new(SoftDeleteConfig::from_env);

// Convenience function for accessing the environment defaults
pub fn defaults() -> &'static SoftDeleteConfig {
    &DEFAULTS
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn test_deserialize_plugin_options() {
        let config = SoftDeleteConfig::from_json(json!({
            "fieldNameDeleted": "removed",
            "deletedAt": true,
            "deletedBy": true,
            "deletedByType": "String",
            "indexFields": ["removed"],
            "use$neOperator": false,
            "overrideMethods": "all",
            "validateBeforeDelete": false
        }))
        .unwrap();

        assert_eq!(config.field_name_deleted.as_deref(), Some("removed"));
        assert_eq!(config.deleted_at, Some(true));
        assert_eq!(config.deleted_by_type, Some(DeletedByType::String));
        assert_eq!(config.index_fields, Some(Selection::list(["removed"])));
        assert_eq!(config.use_ne_operator, Some(false));
        assert!(config.override_methods.unwrap().selects_everything());
        assert_eq!(config.validate_before_delete, Some(false));
        assert_eq!(config.validate_before_restore, None);
    }

    #[test]
    fn test_non_boolean_flags_are_ignored() {
        let config = SoftDeleteConfig::from_json(json!({
            "use$neOperator": "no",
            "deletedAt": 1
        }))
        .unwrap();
        assert_eq!(config.use_ne_operator, None);
        assert_eq!(config.deleted_at, None);
    }

    #[test]
    fn test_selection_shapes() {
        let flag: Selection = serde_json::from_value(json!(true)).unwrap();
        let word: Selection = serde_json::from_value(json!("all")).unwrap();
        let list: Selection = serde_json::from_value(json!(["find", "count"])).unwrap();
        assert!(flag.selects_everything());
        assert!(word.selects_everything());
        assert!(!list.selects_everything());
        assert!(!Selection::Keyword("some".into()).selects_everything());
    }

    #[test]
    fn test_yaml_options() {
        let config = SoftDeleteConfig::from_yaml_str(
            "deletedAt: true\noverrideMethods:\n  - find\n  - aggregate\n",
        )
        .unwrap();
        assert_eq!(config.deleted_at, Some(true));
        assert_eq!(config.override_methods, Some(Selection::list(["find", "aggregate"])));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("SOFT_DELETE_FIELD_NAME_DELETED", "archived"),
            ("SOFT_DELETE_DELETED_AT", "true"),
            ("SOFT_DELETE_OVERRIDE_METHODS", "find, findOne"),
            ("SOFT_DELETE_INDEX_FIELDS", "all"),
            ("SOFT_DELETE_USE_NE_OPERATOR", "not-a-bool"),
        ]
        .into_iter()
        .collect();

        let config = SoftDeleteConfig::default()
            .with_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.field_name_deleted.as_deref(), Some("archived"));
        assert_eq!(config.deleted_at, Some(true));
        assert_eq!(config.override_methods, Some(Selection::list(["find", "findOne"])));
        assert_eq!(config.index_fields, Some(Selection::all()));
        assert_eq!(config.use_ne_operator, None);
    }

    #[test]
    fn test_invalid_shape_is_config_error() {
        let err = SoftDeleteConfig::from_json(json!({ "fieldNameDeleted": 5 })).unwrap_err();
        assert!(matches!(err, SoftDeleteError::Config(_)));
    }
}
