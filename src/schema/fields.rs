use crate::config::SoftDeleteConfig;

pub const DEFAULT_DELETED_FIELD: &str = "deleted";
pub const DEFAULT_DELETED_AT_FIELD: &str = "deletedAt";
pub const DEFAULT_DELETED_BY_FIELD: &str = "deletedBy";

/// Resolved names of the three soft delete fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldNames {
    pub deleted: String,
    pub deleted_at: String,
    pub deleted_by: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            deleted: DEFAULT_DELETED_FIELD.to_string(),
            deleted_at: DEFAULT_DELETED_AT_FIELD.to_string(),
            deleted_by: DEFAULT_DELETED_BY_FIELD.to_string(),
        }
    }
}

impl FieldNames {
    /// Apply configured overrides; unset or empty names fall back to defaults
    pub fn resolve(config: &SoftDeleteConfig) -> Self {
        fn pick(name: &Option<String>, fallback: &str) -> String {
            name.as_deref()
                .filter(|n| !n.is_empty())
                .unwrap_or(fallback)
                .to_string()
        }

        Self {
            deleted: pick(&config.field_name_deleted, DEFAULT_DELETED_FIELD),
            deleted_at: pick(&config.field_name_deleted_at, DEFAULT_DELETED_AT_FIELD),
            deleted_by: pick(&config.field_name_deleted_by, DEFAULT_DELETED_BY_FIELD),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        [self.deleted.as_str(), self.deleted_at.as_str(), self.deleted_by.as_str()].into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_unset() {
        let names = FieldNames::resolve(&SoftDeleteConfig::default());
        assert_eq!(names, FieldNames::default());
        assert_eq!(names.iter().collect::<Vec<_>>(), vec!["deleted", "deletedAt", "deletedBy"]);
    }

    #[test]
    fn test_overrides_and_empty_names() {
        let config = SoftDeleteConfig {
            field_name_deleted: Some("isRemoved".into()),
            field_name_deleted_at: Some(String::new()),
            field_name_deleted_by: Some("removedBy".into()),
            ..Default::default()
        };
        let names = FieldNames::resolve(&config);
        assert_eq!(names.deleted, "isRemoved");
        assert_eq!(names.deleted_at, "deletedAt");
        assert_eq!(names.deleted_by, "removedBy");
    }
}
