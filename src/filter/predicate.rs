use serde_json::{json, Value};

use crate::schema::SoftDeleteDescriptor;
use crate::types::Visibility;

/// Condition on the deleted flag for a visibility mode
///
/// With the `$ne` style, documents missing the flag count as active.
/// Returns None for `IncludeAll`.
pub fn deleted_condition(descriptor: &SoftDeleteDescriptor, visibility: Visibility) -> Option<Value> {
    let use_ne = descriptor.use_ne_operator();
    match visibility {
        Visibility::ExcludeDeleted if use_ne => Some(json!({ "$ne": true })),
        Visibility::ExcludeDeleted => Some(Value::Bool(false)),
        Visibility::OnlyDeleted if use_ne => Some(json!({ "$ne": false })),
        Visibility::OnlyDeleted => Some(Value::Bool(true)),
        Visibility::IncludeAll => None,
    }
}

/// `$match` body for a pipeline stage; always expressed with `$ne`
pub fn match_stage_condition(descriptor: &SoftDeleteDescriptor, visibility: Visibility) -> Option<Value> {
    let field = descriptor.deleted_field();
    match visibility {
        Visibility::ExcludeDeleted => Some(json!({ field: { "$ne": true } })),
        Visibility::OnlyDeleted => Some(json!({ field: { "$ne": false } })),
        Visibility::IncludeAll => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SoftDeleteConfig;

    #[test]
    fn test_ne_style() {
        let descriptor = SoftDeleteDescriptor::default();
        assert_eq!(deleted_condition(&descriptor, Visibility::ExcludeDeleted), Some(json!({ "$ne": true })));
        assert_eq!(deleted_condition(&descriptor, Visibility::OnlyDeleted), Some(json!({ "$ne": false })));
        assert_eq!(deleted_condition(&descriptor, Visibility::IncludeAll), None);
    }

    #[test]
    fn test_equality_style() {
        let descriptor = SoftDeleteDescriptor::from_config(&SoftDeleteConfig::new().with_ne_operator(false));
        assert_eq!(deleted_condition(&descriptor, Visibility::ExcludeDeleted), Some(json!(false)));
        assert_eq!(deleted_condition(&descriptor, Visibility::OnlyDeleted), Some(json!(true)));
    }

    #[test]
    fn test_match_stage_ignores_equality_style() {
        let descriptor = SoftDeleteDescriptor::from_config(
            &SoftDeleteConfig::new().with_ne_operator(false).with_field_names("gone", "goneAt", "goneBy"),
        );
        assert_eq!(
            match_stage_condition(&descriptor, Visibility::ExcludeDeleted),
            Some(json!({ "gone": { "$ne": true } }))
        );
    }
}
