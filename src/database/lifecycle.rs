// Lifecycle transitions: Active <-> SoftDeleted
//
// Single-entity transitions go through save (and its hooks); bulk transitions
// go through the store's multi update, reaching documents in either state.

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::database::arguments::{complete, CallArgs, Completion, DeleteArgs, RestoreArgs, UpdateArgs};
use crate::database::model::SoftDeleteModel;
use crate::database::record::Entity;
use crate::database::store::{DocumentStore, SaveOptions, UpdateResult};
use crate::error::SoftDeleteError;
use crate::filter::QueryOptions;
use crate::types::{Document, Method, Variant};

/// Current time as stored in the deleted-at field
pub fn deletion_timestamp() -> Value {
    Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
}

impl<S: DocumentStore> SoftDeleteModel<S> {
    /// Soft delete one entity and persist it
    pub async fn delete(&self, entity: &mut Entity, deleted_by: Option<Value>) -> Result<(), SoftDeleteError> {
        self.check_deleted_by(deleted_by.as_ref())?;
        let fields = self.descriptor().fields().clone();

        entity.set(fields.deleted.as_str(), true);
        if self.descriptor().has_deleted_at() {
            entity.set(fields.deleted_at.as_str(), deletion_timestamp());
        }
        if self.descriptor().has_deleted_by() {
            match deleted_by {
                Some(actor) => {
                    entity.set(fields.deleted_by.as_str(), actor);
                }
                None => {
                    entity.unset(&fields.deleted_by);
                }
            }
        }

        let options = SaveOptions::validate(self.descriptor().validate_before_delete());
        self.save_with(entity, options).await?;
        tracing::info!("Soft deleted entity {:?}", entity.id());
        Ok(())
    }

    /// Return one entity to the active state and persist it
    pub async fn restore(&self, entity: &mut Entity) -> Result<(), SoftDeleteError> {
        let fields = self.descriptor().fields().clone();

        entity.set(fields.deleted.as_str(), false);
        entity.unset(&fields.deleted_at);
        entity.unset(&fields.deleted_by);

        let options = SaveOptions::validate(self.descriptor().validate_before_restore());
        self.save_with(entity, options).await?;
        tracing::info!("Restored entity {:?}", entity.id());
        Ok(())
    }

    /// Bulk delete: `(conditions?, deletedBy?, handler?)`
    pub async fn delete_many(&self, args: CallArgs) -> Result<UpdateResult, SoftDeleteError> {
        let DeleteArgs {
            conditions,
            deleted_by,
            handler,
        } = DeleteArgs::normalize(args)?;
        self.bulk_delete(conditions, deleted_by, handler).await
    }

    /// Bulk delete of a single id: `(id, deletedBy?, handler?)`
    ///
    /// Fails before touching the store when the id is missing or is a callback.
    pub async fn delete_by_id(&self, args: CallArgs) -> Result<UpdateResult, SoftDeleteError> {
        let DeleteArgs {
            conditions,
            deleted_by,
            handler,
        } = DeleteArgs::normalize_by_id(args)?;
        self.bulk_delete(conditions, deleted_by, handler).await
    }

    /// Bulk restore: `(conditions?, handler?)`
    pub async fn restore_many(&self, args: CallArgs) -> Result<UpdateResult, SoftDeleteError> {
        let RestoreArgs { conditions, handler } = RestoreArgs::normalize(args)?;
        self.bulk_restore(conditions, handler).await
    }

    pub async fn delete_where(
        &self,
        conditions: Document,
        deleted_by: Option<Value>,
    ) -> Result<UpdateResult, SoftDeleteError> {
        self.bulk_delete(conditions, deleted_by, None).await
    }

    pub async fn restore_where(&self, conditions: Document) -> Result<UpdateResult, SoftDeleteError> {
        self.bulk_restore(conditions, None).await
    }

    async fn bulk_delete(
        &self,
        conditions: Document,
        deleted_by: Option<Value>,
        handler: Option<Completion>,
    ) -> Result<UpdateResult, SoftDeleteError> {
        self.check_deleted_by(deleted_by.as_ref())?;
        let fields = self.descriptor().fields();

        let mut set = Map::new();
        let mut unset = Map::new();
        set.insert(fields.deleted.clone(), Value::Bool(true));
        if self.descriptor().has_deleted_at() {
            set.insert(fields.deleted_at.clone(), deletion_timestamp());
        }
        if self.descriptor().has_deleted_by() {
            match deleted_by {
                Some(actor) => {
                    set.insert(fields.deleted_by.clone(), actor);
                }
                None => {
                    unset.insert(fields.deleted_by.clone(), Value::String(String::new()));
                }
            }
        }

        let result = self.update_documents_by_query(conditions, update_document(set, unset), handler).await?;
        tracing::info!(
            "Bulk soft delete matched {} documents, modified {}",
            result.matched_count,
            result.modified_count
        );
        Ok(result)
    }

    async fn bulk_restore(&self, conditions: Document, handler: Option<Completion>) -> Result<UpdateResult, SoftDeleteError> {
        let fields = self.descriptor().fields();

        let set = Map::from_iter([(fields.deleted.clone(), Value::Bool(false))]);
        let unset = Map::from_iter([
            (fields.deleted_at.clone(), Value::String(String::new())),
            (fields.deleted_by.clone(), Value::String(String::new())),
        ]);

        let result = self.update_documents_by_query(conditions, update_document(set, unset), handler).await?;
        tracing::info!(
            "Bulk restore matched {} documents, modified {}",
            result.matched_count,
            result.modified_count
        );
        Ok(result)
    }

    /// Multi update reaching documents in any state
    async fn update_documents_by_query(
        &self,
        conditions: Document,
        update: Document,
        handler: Option<Completion>,
    ) -> Result<UpdateResult, SoftDeleteError> {
        let mut args = UpdateArgs::new(conditions, update).with_options(QueryOptions::multi());
        args.handler = handler;

        if self.descriptor().is_augmented(Method::UpdateMany) {
            return self.update_many_as(Variant::WithDeleted, args).await;
        }

        let (command, handler) = args.into_command();
        let result = self.store().update_many(command).await;
        complete(handler, &result);
        Ok(result?)
    }

    fn check_deleted_by(&self, deleted_by: Option<&Value>) -> Result<(), SoftDeleteError> {
        match (self.descriptor().deleted_by_type(), deleted_by) {
            (Some(kind), Some(actor)) if !actor.is_null() && !kind.accepts(actor) => Err(
                SoftDeleteError::invocation(format!("deletedBy value {} is not a valid {:?}", actor, kind)),
            ),
            _ => Ok(()),
        }
    }
}

fn update_document(set: Document, unset: Document) -> Document {
    let mut update = Map::new();
    update.insert("$set".to_string(), Value::Object(set));
    if !unset.is_empty() {
        update.insert("$unset".to_string(), Value::Object(unset));
    }
    update
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DeletedByType, SoftDeleteConfig};
    use crate::database::memory::MemoryStore;
    use serde_json::json;
    use std::sync::Arc;

    fn model(config: SoftDeleteConfig) -> SoftDeleteModel<MemoryStore> {
        SoftDeleteModel::new(Arc::new(MemoryStore::new()), &config)
    }

    #[test]
    fn test_update_document_shape() {
        let set = Map::from_iter([("deleted".to_string(), json!(true))]);
        let update = update_document(set, Map::new());
        assert_eq!(Value::Object(update), json!({ "$set": { "deleted": true } }));
    }

    #[test]
    fn test_deletion_timestamp_is_rfc3339() {
        let stamp = deletion_timestamp();
        let parsed = chrono::DateTime::parse_from_rfc3339(stamp.as_str().unwrap());
        assert!(parsed.is_ok());
    }

    #[tokio::test]
    async fn test_deleted_by_type_checked() {
        let m = model(SoftDeleteConfig::new().with_deleted_by(DeletedByType::Number));
        let mut entity = m.create(Document::new()).await.unwrap();

        let err = m.delete(&mut entity, Some(json!("alice"))).await.unwrap_err();
        assert!(err.is_invocation());
        assert!(!entity.flag("deleted"));

        m.delete(&mut entity, Some(json!(42))).await.unwrap();
        assert_eq!(entity.get("deletedBy"), Some(&json!(42)));
    }
}
