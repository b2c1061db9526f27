// In-process DocumentStore
//
// Evaluates conditions with FilterWhere and supports the update operators
// and aggregation stages the soft delete layer emits. Every call is recorded
// so tests can assert on the exact arguments the store received.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::database::store::{
    document_id, DocumentStore, SaveCommand, SaveOptions, StoreError, UpdateCommand, UpdateResult, ID_FIELD,
};
use crate::filter::filter_order::FilterOrder;
use crate::filter::{FilterError, FilterWhere, Query};
use crate::types::Document;

/// Save-time validation callback
pub type Validator = Box<dyn Fn(&Document) -> Result<(), String> + Send + Sync>;

/// One recorded store invocation
#[derive(Debug, Clone, PartialEq)]
pub struct StoreCall {
    pub operation: &'static str,
    pub payload: Value,
}

#[derive(Clone, Copy, PartialEq)]
enum Scope {
    One,
    Many,
}

pub struct MemoryStore {
    documents: RwLock<Vec<Document>>,
    validator: Option<Validator>,
    calls: Mutex<Vec<StoreCall>>,
    failure: Mutex<Option<StoreError>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_documents(Vec::new())
    }

    /// Seed the store; documents without `_id` get one
    pub fn with_documents(documents: Vec<Document>) -> Self {
        Self {
            documents: RwLock::new(documents.into_iter().map(with_id).collect()),
            validator: None,
            calls: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
        }
    }

    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Document) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validator = Some(Box::new(validator));
        self
    }

    /// Make the next store call fail with `error`
    pub async fn fail_next(&self, error: StoreError) {
        *self.failure.lock().await = Some(error);
    }

    /// Snapshot of all stored documents, in insertion order
    pub async fn documents(&self) -> Vec<Document> {
        self.documents.read().await.clone()
    }

    pub async fn get(&self, id: &Value) -> Option<Document> {
        self.documents
            .read()
            .await
            .iter()
            .find(|d| d.get(ID_FIELD) == Some(id))
            .cloned()
    }

    pub async fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().await.clone()
    }

    pub async fn last_call(&self) -> Option<StoreCall> {
        self.calls.lock().await.last().cloned()
    }

    pub async fn clear_calls(&self) {
        self.calls.lock().await.clear();
    }

    async fn begin(&self, operation: &'static str, payload: Value) -> Result<(), StoreError> {
        tracing::trace!("MemoryStore {}: {}", operation, payload);
        self.calls.lock().await.push(StoreCall { operation, payload });
        match self.failure.lock().await.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn select(&self, query: &Query) -> Result<Vec<Document>, StoreError> {
        let documents = self.documents.read().await;
        let mut matched = Vec::new();
        for document in documents.iter() {
            if query.matches(document).map_err(query_error)? {
                matched.push(document.clone());
            }
        }

        if !query.sort_order().is_empty() {
            matched.sort_by(|a, b| FilterOrder::compare(query.sort_order(), a, b));
        }

        Ok(matched
            .into_iter()
            .skip(query.skip_value().unwrap_or(0))
            .take(query.limit_value().unwrap_or(usize::MAX))
            .map(|d| query.project(d))
            .collect())
    }

    async fn modify(&self, command: UpdateCommand, scope: Scope) -> Result<(UpdateResult, Option<(Document, Document)>), StoreError> {
        let conditions = command.conditions.unwrap_or_default();
        let update = command.update.unwrap_or_default();
        let mut documents = self.documents.write().await;

        let mut result = UpdateResult::default();
        let mut first = None;
        for document in documents.iter_mut() {
            if !FilterWhere::matches(&conditions, document).map_err(query_error)? {
                continue;
            }
            let before = document.clone();
            apply_update(document, &update)?;
            result.matched_count += 1;
            if *document != before {
                result.modified_count += 1;
            }
            if first.is_none() {
                first = Some((before, document.clone()));
            }
            if scope == Scope::One {
                break;
            }
        }

        if result.matched_count == 0 && command.options.upsert {
            let mut document: Document = conditions
                .into_iter()
                .filter(|(k, v)| !k.starts_with('$') && !is_operator_object(v))
                .collect();
            apply_update(&mut document, &update)?;
            let document = with_id(document);
            documents.push(document.clone());
            result.modified_count = 1;
            first = Some((Document::new(), document));
        }

        Ok((result, first))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find(&self, query: Query) -> Result<Vec<Document>, StoreError> {
        self.begin("find", json!({ "conditions": query.conditions() })).await?;
        self.select(&query).await
    }

    async fn find_one(&self, query: Query) -> Result<Option<Document>, StoreError> {
        self.begin("findOne", json!({ "conditions": query.conditions() })).await?;
        Ok(self.select(&query).await?.into_iter().next())
    }

    async fn count(&self, query: Query) -> Result<u64, StoreError> {
        self.begin("count", json!({ "conditions": query.conditions() })).await?;
        Ok(self.select(&query).await?.len() as u64)
    }

    async fn count_documents(&self, query: Query) -> Result<u64, StoreError> {
        self.begin("countDocuments", json!({ "conditions": query.conditions() })).await?;
        Ok(self.select(&query).await?.len() as u64)
    }

    async fn find_one_and_update(&self, command: UpdateCommand) -> Result<Option<Document>, StoreError> {
        self.begin("findOneAndUpdate", command_payload(&command)).await?;
        let return_new = command.options.return_new;
        let (_, first) = self.modify(command, Scope::One).await?;
        Ok(first.map(|(before, after)| if return_new { after } else { before }))
    }

    async fn update(&self, command: UpdateCommand) -> Result<UpdateResult, StoreError> {
        self.begin("update", command_payload(&command)).await?;
        let scope = if command.options.multi { Scope::Many } else { Scope::One };
        Ok(self.modify(command, scope).await?.0)
    }

    async fn update_one(&self, command: UpdateCommand) -> Result<UpdateResult, StoreError> {
        self.begin("updateOne", command_payload(&command)).await?;
        Ok(self.modify(command, Scope::One).await?.0)
    }

    async fn update_many(&self, command: UpdateCommand) -> Result<UpdateResult, StoreError> {
        self.begin("updateMany", command_payload(&command)).await?;
        Ok(self.modify(command, Scope::Many).await?.0)
    }

    async fn aggregate(&self, pipeline: Vec<Document>) -> Result<Vec<Document>, StoreError> {
        self.begin("aggregate", json!({ "pipeline": pipeline })).await?;
        let mut rows = self.documents.read().await.clone();
        for stage in &pipeline {
            rows = run_stage(stage, rows)?;
        }
        Ok(rows)
    }

    async fn save(&self, command: SaveCommand, options: SaveOptions) -> Result<Document, StoreError> {
        self.begin("save", save_payload(&command, &options)).await?;

        let mut documents = self.documents.write().await;
        let (position, document) = match command {
            SaveCommand::Replace(document) => {
                let document = with_id(document);
                let position = documents.iter().position(|d| document_id(d) == document_id(&document));
                (position, document)
            }
            SaveCommand::Patch { id, set, unset } => {
                let position = documents
                    .iter()
                    .position(|d| document_id(d) == Some(&id))
                    .ok_or_else(|| StoreError::NotFound(format!("document {}", id)))?;
                let mut merged = documents[position].clone();
                for field in &unset {
                    merged.remove(field);
                }
                merged.extend(set);
                (Some(position), merged)
            }
        };

        if options.validate_before_save {
            if let Some(validator) = &self.validator {
                validator(&document).map_err(StoreError::Validation)?;
            }
        }

        match position {
            Some(index) => documents[index] = document.clone(),
            None => documents.push(document.clone()),
        }
        Ok(document)
    }
}

fn save_payload(command: &SaveCommand, options: &SaveOptions) -> Value {
    match command {
        SaveCommand::Replace(document) => json!({ "document": document, "options": options }),
        SaveCommand::Patch { id, set, unset } => {
            json!({ "id": id, "set": set, "unset": unset, "options": options })
        }
    }
}

fn with_id(mut document: Document) -> Document {
    if !document.contains_key(ID_FIELD) {
        document.insert(ID_FIELD.to_string(), Value::String(Uuid::new_v4().to_string()));
    }
    document
}

fn query_error(error: FilterError) -> StoreError {
    StoreError::Query(error.to_string())
}

fn is_operator_object(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|o| !o.is_empty() && o.keys().all(|k| k.starts_with('$')))
}

fn command_payload(command: &UpdateCommand) -> Value {
    json!({
        "conditions": command.conditions,
        "update": command.update,
        "options": command.options,
    })
}

/// `$set`, `$unset`, and bare fields (treated as `$set`)
fn apply_update(document: &mut Document, update: &Document) -> Result<(), StoreError> {
    for (key, value) in update {
        match key.as_str() {
            "$set" => {
                let fields = operator_fields(key, value)?;
                for (field, v) in fields {
                    document.insert(field.clone(), v.clone());
                }
            }
            "$unset" => {
                let fields = operator_fields(key, value)?;
                for field in fields.keys() {
                    document.remove(field);
                }
            }
            op if op.starts_with('$') => {
                return Err(StoreError::Query(format!("Unsupported update operator: {}", op)));
            }
            field => {
                document.insert(field.to_string(), value.clone());
            }
        }
    }
    Ok(())
}

fn operator_fields<'a>(op: &str, value: &'a Value) -> Result<&'a Map<String, Value>, StoreError> {
    value
        .as_object()
        .ok_or_else(|| StoreError::Query(format!("{} requires an object", op)))
}

fn run_stage(stage: &Document, rows: Vec<Document>) -> Result<Vec<Document>, StoreError> {
    let mut entries = stage.iter();
    let (name, spec) = match (entries.next(), entries.next()) {
        (Some(entry), None) => entry,
        _ => return Err(StoreError::Query("Pipeline stage must have exactly one key".to_string())),
    };

    match name.as_str() {
        "$match" => {
            let conditions = operator_fields(name, spec)?;
            let mut kept = Vec::new();
            for row in rows {
                if FilterWhere::matches(conditions, &row).map_err(query_error)? {
                    kept.push(row);
                }
            }
            Ok(kept)
        }
        "$count" => {
            let field = spec
                .as_str()
                .ok_or_else(|| StoreError::Query("$count requires a field name".to_string()))?;
            if rows.is_empty() {
                return Ok(vec![]);
            }
            Ok(vec![Map::from_iter([(field.to_string(), json!(rows.len()))])])
        }
        "$limit" => Ok(rows.into_iter().take(stage_size(name, spec)?).collect()),
        "$skip" => Ok(rows.into_iter().skip(stage_size(name, spec)?).collect()),
        "$sort" => {
            let order = FilterOrder::validate_and_parse(spec).map_err(query_error)?;
            let mut rows = rows;
            rows.sort_by(|a, b| FilterOrder::compare(&order, a, b));
            Ok(rows)
        }
        "$project" => {
            let projection = operator_fields(name, spec)?;
            Ok(rows.into_iter().map(|row| project(projection, row)).collect())
        }
        other => Err(StoreError::Query(format!("Unsupported pipeline stage: {}", other))),
    }
}

fn stage_size(name: &str, spec: &Value) -> Result<usize, StoreError> {
    spec.as_u64()
        .map(|n| n as usize)
        .ok_or_else(|| StoreError::Query(format!("{} requires a non-negative integer", name)))
}

fn project(projection: &Map<String, Value>, row: Document) -> Document {
    let included = |v: &Value| matches!(v, Value::Bool(true)) || v.as_i64().is_some_and(|n| n != 0);
    let keep_id = projection.get(ID_FIELD).map_or(true, included);
    let inclusion = projection.iter().any(|(k, v)| k != ID_FIELD && included(v));

    row.into_iter()
        .filter(|(key, _)| {
            if key == ID_FIELD {
                return keep_id;
            }
            match projection.get(key) {
                Some(v) => included(v),
                None => !inclusion,
            }
        })
        .collect()
}
