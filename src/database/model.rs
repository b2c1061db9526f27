// Soft delete model: the augmented surface in front of a DocumentStore
//
// Every augmentable operation is exposed in three variants. Reads receive the
// deleted-flag predicate through the query, writes through the canonical
// conditions slot, aggregation through the pre-aggregate hook.

use std::sync::Arc;

use serde_json::Value;

use crate::config::SoftDeleteConfig;
use crate::database::arguments::{complete, Completion, UpdateCall};
use crate::database::record::Entity;
use crate::database::store::{document_id, DocumentStore, SaveCommand, SaveOptions, UpdateCommand, UpdateResult};
use crate::error::SoftDeleteError;
use crate::filter::predicate::deleted_condition;
use crate::filter::Query;
use crate::observer::{HookObserver, ObserverContext, ObserverPipeline};
use crate::schema::SoftDeleteDescriptor;
use crate::types::{Document, Method, Variant, Visibility};

/// Visibility of each variant of an augmented operation
static VARIANT_TABLE: [(Variant, Visibility); 3] = [
    (Variant::Default, Visibility::ExcludeDeleted),
    (Variant::Deleted, Visibility::OnlyDeleted),
    (Variant::WithDeleted, Visibility::IncludeAll),
];

/// A document store augmented with soft delete semantics
pub struct SoftDeleteModel<S: DocumentStore> {
    store: Arc<S>,
    descriptor: Arc<SoftDeleteDescriptor>,
    observers: ObserverPipeline,
}

impl<S: DocumentStore> SoftDeleteModel<S> {
    /// Resolve `config` once and attach the default hooks
    pub fn new(store: Arc<S>, config: &SoftDeleteConfig) -> Self {
        Self::with_descriptor(store, Arc::new(SoftDeleteDescriptor::from_config(config)))
    }

    /// Use the process-wide options from `SOFT_DELETE_*` environment variables
    pub fn from_env(store: Arc<S>) -> Self {
        Self::new(store, crate::config::defaults())
    }

    pub fn with_descriptor(store: Arc<S>, descriptor: Arc<SoftDeleteDescriptor>) -> Self {
        tracing::info!(
            "Soft delete model ready: deleted field '{}', {} augmented operations",
            descriptor.deleted_field(),
            descriptor.methods().len()
        );
        Self {
            store,
            descriptor,
            observers: ObserverPipeline::with_defaults(),
        }
    }

    /// Register an additional hook observer
    pub fn with_observer(mut self, observer: Box<dyn HookObserver>) -> Self {
        self.observers.register_observer(observer);
        self
    }

    pub fn descriptor(&self) -> &Arc<SoftDeleteDescriptor> {
        &self.descriptor
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Every (operation, variant) pair callable on this model
    pub fn available_variants(&self) -> Vec<(Method, Variant)> {
        Method::ALL
            .iter()
            .flat_map(|&method| {
                VARIANT_TABLE
                    .iter()
                    .map(move |&(variant, _)| (method, variant))
                    .filter(move |&(method, variant)| {
                        variant == Variant::Default || self.descriptor.is_augmented(method)
                    })
            })
            .collect()
    }

    /// Which documents a call should see
    ///
    /// Non-augmented operations only have the passthrough default variant.
    pub fn visibility(&self, method: Method, variant: Variant, with_deleted: bool) -> Result<Visibility, SoftDeleteError> {
        if !self.descriptor.is_augmented(method) {
            return match variant {
                Variant::Default => Ok(Visibility::IncludeAll),
                _ => Err(SoftDeleteError::VariantUnavailable { method, variant }),
            };
        }

        if variant == Variant::Default && with_deleted {
            return Ok(Visibility::IncludeAll);
        }

        Ok(VARIANT_TABLE
            .iter()
            .find(|(v, _)| *v == variant)
            .map_or(Visibility::IncludeAll, |(_, visibility)| *visibility))
    }

    /// Predicate to inject for one dispatch, None for passthrough
    fn injection(&self, method: Method, variant: Variant, with_deleted: bool) -> Result<Option<Value>, SoftDeleteError> {
        let visibility = self.visibility(method, variant, with_deleted)?;
        let condition = deleted_condition(&self.descriptor, visibility);

        let kind = if method.is_read() {
            "read"
        } else if method.is_write() {
            "write"
        } else {
            "pipeline"
        };
        tracing::debug!(
            "Dispatch {} {}{}: visibility={:?}, predicate={:?}",
            kind,
            method,
            variant.suffix(),
            visibility,
            condition
        );
        Ok(condition)
    }

    fn prepare_read(&self, method: Method, variant: Variant, mut query: Query) -> Result<Query, SoftDeleteError> {
        let with_deleted = query.query_options().with_deleted;
        if let Some(condition) = self.injection(method, variant, with_deleted)? {
            query.where_field(self.descriptor.deleted_field(), condition);
        }
        Ok(query)
    }

    fn prepare_write(
        &self,
        method: Method,
        variant: Variant,
        call: UpdateCall,
    ) -> Result<(UpdateCommand, Option<Completion>), SoftDeleteError> {
        let mut args = call.resolve()?;
        let with_deleted = args.options.as_ref().is_some_and(|o| o.with_deleted);
        if let Some(condition) = self.injection(method, variant, with_deleted)? {
            args.conditions
                .get_or_insert_with(Document::new)
                .insert(self.descriptor.deleted_field().to_string(), condition);
        }
        Ok(args.into_command())
    }

    // Reads

    pub async fn count_as(&self, variant: Variant, query: Query) -> Result<u64, SoftDeleteError> {
        let query = self.prepare_read(Method::Count, variant, query)?;
        Ok(self.store.count(query).await?)
    }

    pub async fn count(&self, query: Query) -> Result<u64, SoftDeleteError> {
        self.count_as(Variant::Default, query).await
    }

    pub async fn count_deleted(&self, query: Query) -> Result<u64, SoftDeleteError> {
        self.count_as(Variant::Deleted, query).await
    }

    pub async fn count_with_deleted(&self, query: Query) -> Result<u64, SoftDeleteError> {
        self.count_as(Variant::WithDeleted, query).await
    }

    pub async fn count_documents_as(&self, variant: Variant, query: Query) -> Result<u64, SoftDeleteError> {
        let query = self.prepare_read(Method::CountDocuments, variant, query)?;
        Ok(self.store.count_documents(query).await?)
    }

    pub async fn count_documents(&self, query: Query) -> Result<u64, SoftDeleteError> {
        self.count_documents_as(Variant::Default, query).await
    }

    pub async fn count_documents_deleted(&self, query: Query) -> Result<u64, SoftDeleteError> {
        self.count_documents_as(Variant::Deleted, query).await
    }

    pub async fn count_documents_with_deleted(&self, query: Query) -> Result<u64, SoftDeleteError> {
        self.count_documents_as(Variant::WithDeleted, query).await
    }

    pub async fn find_as(&self, variant: Variant, query: Query) -> Result<Vec<Entity>, SoftDeleteError> {
        let query = self.prepare_read(Method::Find, variant, query)?;
        let documents = self.store.find(query).await?;
        Ok(documents.into_iter().map(Entity::from_document).collect())
    }

    pub async fn find(&self, query: Query) -> Result<Vec<Entity>, SoftDeleteError> {
        self.find_as(Variant::Default, query).await
    }

    pub async fn find_deleted(&self, query: Query) -> Result<Vec<Entity>, SoftDeleteError> {
        self.find_as(Variant::Deleted, query).await
    }

    pub async fn find_with_deleted(&self, query: Query) -> Result<Vec<Entity>, SoftDeleteError> {
        self.find_as(Variant::WithDeleted, query).await
    }

    pub async fn find_one_as(&self, variant: Variant, query: Query) -> Result<Option<Entity>, SoftDeleteError> {
        let query = self.prepare_read(Method::FindOne, variant, query)?;
        let document = self.store.find_one(query).await?;
        Ok(document.map(Entity::from_document))
    }

    pub async fn find_one(&self, query: Query) -> Result<Option<Entity>, SoftDeleteError> {
        self.find_one_as(Variant::Default, query).await
    }

    pub async fn find_one_deleted(&self, query: Query) -> Result<Option<Entity>, SoftDeleteError> {
        self.find_one_as(Variant::Deleted, query).await
    }

    pub async fn find_one_with_deleted(&self, query: Query) -> Result<Option<Entity>, SoftDeleteError> {
        self.find_one_as(Variant::WithDeleted, query).await
    }

    // Writes

    pub async fn find_one_and_update_as(
        &self,
        variant: Variant,
        call: impl Into<UpdateCall>,
    ) -> Result<Option<Document>, SoftDeleteError> {
        let (command, handler) = self.prepare_write(Method::FindOneAndUpdate, variant, call.into())?;
        let result = self.store.find_one_and_update(command).await;
        complete(handler, &result);
        Ok(result?)
    }

    pub async fn find_one_and_update(&self, call: impl Into<UpdateCall>) -> Result<Option<Document>, SoftDeleteError> {
        self.find_one_and_update_as(Variant::Default, call).await
    }

    pub async fn find_one_and_update_deleted(
        &self,
        call: impl Into<UpdateCall>,
    ) -> Result<Option<Document>, SoftDeleteError> {
        self.find_one_and_update_as(Variant::Deleted, call).await
    }

    pub async fn find_one_and_update_with_deleted(
        &self,
        call: impl Into<UpdateCall>,
    ) -> Result<Option<Document>, SoftDeleteError> {
        self.find_one_and_update_as(Variant::WithDeleted, call).await
    }

    pub async fn update_as(&self, variant: Variant, call: impl Into<UpdateCall>) -> Result<UpdateResult, SoftDeleteError> {
        let (command, handler) = self.prepare_write(Method::Update, variant, call.into())?;
        let result = self.store.update(command).await;
        complete(handler, &result);
        Ok(result?)
    }

    pub async fn update(&self, call: impl Into<UpdateCall>) -> Result<UpdateResult, SoftDeleteError> {
        self.update_as(Variant::Default, call).await
    }

    pub async fn update_deleted(&self, call: impl Into<UpdateCall>) -> Result<UpdateResult, SoftDeleteError> {
        self.update_as(Variant::Deleted, call).await
    }

    pub async fn update_with_deleted(&self, call: impl Into<UpdateCall>) -> Result<UpdateResult, SoftDeleteError> {
        self.update_as(Variant::WithDeleted, call).await
    }

    pub async fn update_one_as(
        &self,
        variant: Variant,
        call: impl Into<UpdateCall>,
    ) -> Result<UpdateResult, SoftDeleteError> {
        let (command, handler) = self.prepare_write(Method::UpdateOne, variant, call.into())?;
        let result = self.store.update_one(command).await;
        complete(handler, &result);
        Ok(result?)
    }

    pub async fn update_one(&self, call: impl Into<UpdateCall>) -> Result<UpdateResult, SoftDeleteError> {
        self.update_one_as(Variant::Default, call).await
    }

    pub async fn update_one_deleted(&self, call: impl Into<UpdateCall>) -> Result<UpdateResult, SoftDeleteError> {
        self.update_one_as(Variant::Deleted, call).await
    }

    pub async fn update_one_with_deleted(&self, call: impl Into<UpdateCall>) -> Result<UpdateResult, SoftDeleteError> {
        self.update_one_as(Variant::WithDeleted, call).await
    }

    pub async fn update_many_as(
        &self,
        variant: Variant,
        call: impl Into<UpdateCall>,
    ) -> Result<UpdateResult, SoftDeleteError> {
        let (command, handler) = self.prepare_write(Method::UpdateMany, variant, call.into())?;
        let result = self.store.update_many(command).await;
        complete(handler, &result);
        Ok(result?)
    }

    pub async fn update_many(&self, call: impl Into<UpdateCall>) -> Result<UpdateResult, SoftDeleteError> {
        self.update_many_as(Variant::Default, call).await
    }

    pub async fn update_many_deleted(&self, call: impl Into<UpdateCall>) -> Result<UpdateResult, SoftDeleteError> {
        self.update_many_as(Variant::Deleted, call).await
    }

    pub async fn update_many_with_deleted(&self, call: impl Into<UpdateCall>) -> Result<UpdateResult, SoftDeleteError> {
        self.update_many_as(Variant::WithDeleted, call).await
    }

    // Aggregation

    pub async fn aggregate_as(&self, variant: Variant, pipeline: Vec<Document>) -> Result<Vec<Document>, SoftDeleteError> {
        let visibility = self.visibility(Method::Aggregate, variant, false)?;
        tracing::debug!("Dispatch aggregate{}: visibility={:?}", variant.suffix(), visibility);

        let mut ctx = ObserverContext::new_aggregate(self.descriptor.clone(), pipeline, visibility);
        self.observers.run(&mut ctx).await?;
        let pipeline = ctx.into_pipeline().unwrap_or_default();

        Ok(self.store.aggregate(pipeline).await?)
    }

    pub async fn aggregate(&self, pipeline: Vec<Document>) -> Result<Vec<Document>, SoftDeleteError> {
        self.aggregate_as(Variant::Default, pipeline).await
    }

    pub async fn aggregate_deleted(&self, pipeline: Vec<Document>) -> Result<Vec<Document>, SoftDeleteError> {
        self.aggregate_as(Variant::Deleted, pipeline).await
    }

    pub async fn aggregate_with_deleted(&self, pipeline: Vec<Document>) -> Result<Vec<Document>, SoftDeleteError> {
        self.aggregate_as(Variant::WithDeleted, pipeline).await
    }

    // Persistence

    /// Save through the pre-save hooks with default options
    pub async fn save(&self, entity: &mut Entity) -> Result<(), SoftDeleteError> {
        self.save_with(entity, SaveOptions::default()).await
    }

    pub async fn save_with(&self, entity: &mut Entity, options: SaveOptions) -> Result<(), SoftDeleteError> {
        let mut ctx = ObserverContext::new_save(self.descriptor.clone(), entity.to_document(), options);
        self.observers.run(&mut ctx).await?;
        let Some((document, options)) = ctx.into_save() else {
            return Err(SoftDeleteError::invocation("pre-save hooks replaced the save payload"));
        };

        // stored entities only write what changed, so fields outside a projection survive
        let command = match entity.original() {
            Some(original) => SaveCommand::changes(original, document),
            None => SaveCommand::Replace(document),
        };

        let persisted = self.store.save(command, options).await?;
        tracing::debug!("Saved entity {:?}", document_id(&persisted));
        entity.mark_saved(persisted);
        Ok(())
    }

    /// Build and save a new entity
    pub async fn create(&self, document: Document) -> Result<Entity, SoftDeleteError> {
        let mut entity = Entity::new(document);
        self.save(&mut entity).await?;
        Ok(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Selection;
    use crate::database::memory::MemoryStore;

    fn model(config: SoftDeleteConfig) -> SoftDeleteModel<MemoryStore> {
        SoftDeleteModel::new(Arc::new(MemoryStore::new()), &config)
    }

    #[test]
    fn test_visibility_table() {
        let m = model(SoftDeleteConfig::new().with_override_methods(Selection::Flag(true)));
        assert_eq!(m.visibility(Method::Find, Variant::Default, false).unwrap(), Visibility::ExcludeDeleted);
        assert_eq!(m.visibility(Method::Find, Variant::Default, true).unwrap(), Visibility::IncludeAll);
        assert_eq!(m.visibility(Method::Find, Variant::Deleted, false).unwrap(), Visibility::OnlyDeleted);
        assert_eq!(m.visibility(Method::Find, Variant::WithDeleted, false).unwrap(), Visibility::IncludeAll);
    }

    #[test]
    fn test_unaugmented_method_has_only_passthrough() {
        let m = model(SoftDeleteConfig::new().with_override_methods(Selection::list(["find"])));
        assert_eq!(m.visibility(Method::Count, Variant::Default, false).unwrap(), Visibility::IncludeAll);

        let err = m.visibility(Method::Count, Variant::Deleted, false).unwrap_err();
        assert!(matches!(err, SoftDeleteError::VariantUnavailable { method: Method::Count, .. }));
        assert_eq!(err.to_string(), "countDeleted is not available: 'count' is not in overrideMethods");
    }

    #[test]
    fn test_available_variants() {
        let m = model(SoftDeleteConfig::new().with_override_methods(Selection::list(["find", "aggregate"])));
        let variants = m.available_variants();
        assert_eq!(variants.len(), Method::ALL.len() + 4);
        assert!(variants.contains(&(Method::Aggregate, Variant::WithDeleted)));
        assert!(!variants.contains(&(Method::Count, Variant::Deleted)));
    }

    #[test]
    fn test_write_injection_overwrites_caller_condition() {
        let m = model(SoftDeleteConfig::new().with_override_methods(Selection::Flag(true)));
        let mut conditions = Document::new();
        conditions.insert("deleted".to_string(), Value::Bool(true));
        let args = crate::database::arguments::UpdateArgs::new(conditions, Document::new());

        let (command, _) = m.prepare_write(Method::Update, Variant::Default, args.into()).unwrap();
        assert_eq!(
            command.conditions.unwrap().get("deleted"),
            Some(&serde_json::json!({ "$ne": true }))
        );
    }
}
