use std::collections::BTreeSet;

use serde_json::Value;

use crate::config::{DeletedByType, Selection, SoftDeleteConfig};
use crate::types::Method;
use super::declaration::{FieldDeclaration, FieldKind};
use super::fields::FieldNames;
use super::index::IndexFlags;

/// Immutable soft delete settings, resolved once from a config
///
/// Every component receives this by `Arc` at construction; nothing reads
/// configuration at call time.
#[derive(Debug, Clone)]
pub struct SoftDeleteDescriptor {
    fields: FieldNames,
    index: IndexFlags,
    declarations: Vec<FieldDeclaration>,
    use_ne_operator: bool,
    methods: BTreeSet<Method>,
    validate_before_delete: bool,
    validate_before_restore: bool,
}

impl Default for SoftDeleteDescriptor {
    fn default() -> Self {
        Self::from_config(&SoftDeleteConfig::default())
    }
}

impl SoftDeleteDescriptor {
    pub fn from_config(config: &SoftDeleteConfig) -> Self {
        let fields = FieldNames::resolve(config);
        let index = IndexFlags::resolve(config, &fields);

        let mut declarations = vec![FieldDeclaration::new(&fields.deleted, FieldKind::Boolean)
            .with_default(Value::Bool(false))
            .indexed(index.deleted)];

        if config.deleted_at == Some(true) {
            declarations.push(
                FieldDeclaration::new(&fields.deleted_at, FieldKind::Date).indexed(index.deleted_at),
            );
        }

        if config.deleted_by == Some(true) {
            let kind = config.deleted_by_type.unwrap_or_default();
            declarations.push(
                FieldDeclaration::new(&fields.deleted_by, FieldKind::DeletedBy(kind))
                    .indexed(index.deleted_by),
            );
        }

        let methods = resolve_methods(config.override_methods.as_ref());
        tracing::debug!(
            "Soft delete descriptor: deleted='{}', declared={}, methods={:?}",
            fields.deleted,
            declarations.len(),
            methods
        );

        Self {
            fields,
            index,
            declarations,
            use_ne_operator: config.use_ne_operator.unwrap_or(true),
            methods,
            validate_before_delete: config.validate_before_delete.unwrap_or(true),
            validate_before_restore: config.validate_before_restore.unwrap_or(true),
        }
    }

    pub fn fields(&self) -> &FieldNames {
        &self.fields
    }

    pub fn deleted_field(&self) -> &str {
        &self.fields.deleted
    }

    pub fn index_flags(&self) -> IndexFlags {
        self.index
    }

    pub fn declarations(&self) -> &[FieldDeclaration] {
        &self.declarations
    }

    /// Look up a declared field by name
    pub fn declaration(&self, name: &str) -> Option<&FieldDeclaration> {
        self.declarations.iter().find(|d| d.name == name)
    }

    pub fn has_deleted_at(&self) -> bool {
        self.declaration(&self.fields.deleted_at).is_some()
    }

    pub fn has_deleted_by(&self) -> bool {
        self.declaration(&self.fields.deleted_by).is_some()
    }

    pub fn deleted_by_type(&self) -> Option<DeletedByType> {
        self.declaration(&self.fields.deleted_by).and_then(|d| match d.kind {
            FieldKind::DeletedBy(kind) => Some(kind),
            _ => None,
        })
    }

    pub fn use_ne_operator(&self) -> bool {
        self.use_ne_operator
    }

    pub fn methods(&self) -> &BTreeSet<Method> {
        &self.methods
    }

    pub fn is_augmented(&self, method: Method) -> bool {
        self.methods.contains(&method)
    }

    pub fn validate_before_delete(&self) -> bool {
        self.validate_before_delete
    }

    pub fn validate_before_restore(&self) -> bool {
        self.validate_before_restore
    }
}

/// Unknown operation names are dropped, not rejected
fn resolve_methods(selection: Option<&Selection>) -> BTreeSet<Method> {
    match selection {
        None => BTreeSet::new(),
        Some(s) if s.selects_everything() => Method::ALL.into_iter().collect(),
        Some(Selection::List(names)) => names
            .iter()
            .filter_map(|name| {
                let method = Method::parse(name);
                if method.is_none() {
                    tracing::warn!("Ignoring unknown overrideMethods entry '{}'", name);
                }
                method
            })
            .collect(),
        Some(_) => BTreeSet::new(),
    }
}
