use std::collections::BTreeMap;

use crate::config::{Selection, SoftDeleteConfig};
use super::fields::FieldNames;

/// Which soft delete fields should carry an index
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexFlags {
    pub deleted: bool,
    pub deleted_at: bool,
    pub deleted_by: bool,
}

impl IndexFlags {
    pub fn all() -> Self {
        Self { deleted: true, deleted_at: true, deleted_by: true }
    }

    /// Absent -> none, `true`/`"all"` -> every field, list -> membership by configured name
    pub fn resolve(config: &SoftDeleteConfig, names: &FieldNames) -> Self {
        match &config.index_fields {
            None => Self::default(),
            Some(selection) if selection.selects_everything() => Self::all(),
            Some(Selection::List(listed)) => {
                let contains = |name: &str| listed.iter().any(|l| l == name);
                Self {
                    deleted: contains(&names.deleted),
                    deleted_at: contains(&names.deleted_at),
                    deleted_by: contains(&names.deleted_by),
                }
            }
            Some(other) => {
                tracing::warn!("Ignoring unrecognized indexFields value {:?}", other);
                Self::default()
            }
        }
    }

    /// Flags keyed by the configured field names
    pub fn to_map(&self, names: &FieldNames) -> BTreeMap<String, bool> {
        BTreeMap::from([
            (names.deleted.clone(), self.deleted),
            (names.deleted_at.clone(), self.deleted_at),
            (names.deleted_by.clone(), self.deleted_by),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(selection: Option<Selection>) -> IndexFlags {
        let config = SoftDeleteConfig { index_fields: selection, ..Default::default() };
        IndexFlags::resolve(&config, &FieldNames::resolve(&config))
    }

    #[test]
    fn test_absent_means_no_indexes() {
        assert_eq!(flags(None), IndexFlags::default());
        assert_eq!(flags(Some(Selection::Flag(false))), IndexFlags::default());
    }

    #[test]
    fn test_all_and_true_index_everything() {
        assert_eq!(flags(Some(Selection::all())), IndexFlags::all());
        assert_eq!(flags(Some(Selection::Flag(true))), IndexFlags::all());
    }

    #[test]
    fn test_list_selects_by_name() {
        let resolved = flags(Some(Selection::list(["deleted", "deletedBy", "unknown"])));
        assert_eq!(resolved, IndexFlags { deleted: true, deleted_at: false, deleted_by: true });
    }

    #[test]
    fn test_list_uses_configured_names() {
        let config = SoftDeleteConfig {
            field_name_deleted_by: Some("removedBy".into()),
            index_fields: Some(Selection::list(["removedBy", "deletedBy"])),
            ..Default::default()
        };
        let names = FieldNames::resolve(&config);
        let resolved = IndexFlags::resolve(&config, &names);
        assert!(resolved.deleted_by);

        let map = resolved.to_map(&names);
        assert_eq!(map.get("removedBy"), Some(&true));
        assert_eq!(map.get("deleted"), Some(&false));
        assert!(!map.contains_key("deletedBy"));
    }

    #[test]
    fn test_other_keyword_indexes_nothing() {
        assert_eq!(flags(Some(Selection::Keyword("some".into()))), IndexFlags::default());
    }
}
