mod common;

use std::sync::Arc;

use anyhow::Result;
use serde_json::json;
use soft_delete_rust::config::Selection;
use soft_delete_rust::{
    MemoryStore, Method, Query, QueryOptions, SoftDeleteConfig, SoftDeleteError, SoftDeleteModel, Variant,
};

use common::{all_methods, doc, ids, seeded_model};

const ACTIVE: [&str; 3] = ["a1", "a2", "a3"];
const DELETED: [&str; 2] = ["d1", "d2"];

#[tokio::test]
async fn default_find_excludes_deleted() -> Result<()> {
    let (model, store) = seeded_model(all_methods());

    let found = model.find(Query::new()).await?;
    assert_eq!(ids(found), ACTIVE);

    let call = store.last_call().await.expect("store was called");
    assert_eq!(call.operation, "find");
    assert_eq!(call.payload["conditions"], json!({ "deleted": { "$ne": true } }));
    Ok(())
}

#[tokio::test]
async fn with_deleted_option_returns_everything() -> Result<()> {
    let (model, _store) = seeded_model(all_methods());

    let mut query = Query::new();
    query.options(QueryOptions::with_deleted());
    let found = model.find(query).await?;
    assert_eq!(found.len(), 5);
    Ok(())
}

#[tokio::test]
async fn deleted_and_with_deleted_variants() -> Result<()> {
    let (model, _store) = seeded_model(all_methods());

    let deleted = model.find_deleted(Query::new()).await?;
    assert_eq!(ids(deleted), DELETED);

    let every = model.find_with_deleted(Query::new()).await?;
    assert_eq!(every.len(), 5);

    let mut in_group = Query::from_conditions(doc(json!({ "group": "x" })))?;
    in_group.sort(json!("name"))?;
    let names: Vec<_> = model
        .find_with_deleted(in_group)
        .await?
        .iter()
        .filter_map(|e| e.get("name").and_then(|v| v.as_str()).map(str::to_string))
        .collect();
    assert_eq!(names, ["alpha", "charlie", "delta"]);
    Ok(())
}

#[tokio::test]
async fn counts_follow_the_same_partition() -> Result<()> {
    let (model, _store) = seeded_model(all_methods());

    assert_eq!(model.count(Query::new()).await?, 3);
    assert_eq!(model.count_deleted(Query::new()).await?, 2);
    assert_eq!(model.count_with_deleted(Query::new()).await?, 5);

    let group_y = || Query::from_conditions(doc(json!({ "group": "y" })));
    assert_eq!(model.count_documents(group_y()?).await?, 1);
    assert_eq!(model.count_documents_deleted(group_y()?).await?, 1);
    assert_eq!(model.count_documents_with_deleted(group_y()?).await?, 2);
    Ok(())
}

#[tokio::test]
async fn find_one_never_returns_deleted_by_default() -> Result<()> {
    let (model, _store) = seeded_model(all_methods());

    let delta = || Query::from_conditions(doc(json!({ "name": "delta" })));
    assert!(model.find_one(delta()?).await?.is_none());
    assert!(model.find_one_deleted(delta()?).await?.is_some());
    assert!(model.find_one_with_deleted(delta()?).await?.is_some());
    Ok(())
}

#[tokio::test]
async fn caller_condition_on_deleted_cannot_widen_default_view() -> Result<()> {
    let (model, _store) = seeded_model(all_methods());

    let query = Query::from_conditions(doc(json!({ "deleted": true })))?;
    assert!(model.find(query).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn equality_style_predicates() -> Result<()> {
    let (model, store) = seeded_model(all_methods().with_ne_operator(false));

    let found = model.find(Query::new()).await?;
    assert_eq!(ids(found), ACTIVE);
    let call = store.last_call().await.expect("store was called");
    assert_eq!(call.payload["conditions"], json!({ "deleted": false }));

    let deleted = model.find_deleted(Query::new()).await?;
    assert_eq!(ids(deleted), DELETED);
    Ok(())
}

#[tokio::test]
async fn documents_missing_the_flag_are_outside_the_partition() -> Result<()> {
    // only possible when written around the model; pre-save always sets the flag
    let store = Arc::new(MemoryStore::with_documents(vec![doc(json!({ "_id": "l1", "name": "legacy" }))]));
    let ne_style = SoftDeleteModel::new(store.clone(), &all_methods());
    let eq_style = SoftDeleteModel::new(store.clone(), &all_methods().with_ne_operator(false));

    // `$ne: true` and `$ne: false` both match a missing flag
    assert_eq!(ne_style.count(Query::new()).await?, 1);
    assert_eq!(ne_style.count_deleted(Query::new()).await?, 1);
    assert_eq!(eq_style.count(Query::new()).await?, 0);
    assert_eq!(eq_style.count_deleted(Query::new()).await?, 0);

    // saving through the model repairs it
    let mut legacy = ne_style.find_one_with_deleted(Query::new()).await?.expect("seeded");
    ne_style.save(&mut legacy).await?;
    assert_eq!(store.get(&json!("l1")).await.and_then(|d| d.get("deleted").cloned()), Some(json!(false)));
    assert_eq!(ne_style.count_deleted(Query::new()).await?, 0);
    assert_eq!(eq_style.count(Query::new()).await?, 1);
    Ok(())
}

#[tokio::test]
async fn custom_field_name_is_used_in_predicates() -> Result<()> {
    let (model, store) = seeded_model(all_methods().with_field_names("archived", "archivedAt", "archivedBy"));

    // no seeded document carries `archived`, so every one counts as active
    assert_eq!(model.count(Query::new()).await?, 5);
    let call = store.last_call().await.expect("store was called");
    assert_eq!(call.payload["conditions"], json!({ "archived": { "$ne": true } }));
    Ok(())
}

#[tokio::test]
async fn unaugmented_operations_pass_through() -> Result<()> {
    let config = SoftDeleteConfig::new().with_override_methods(Selection::list(["find"]));
    let (model, store) = seeded_model(config);

    assert_eq!(model.count(Query::new()).await?, 5);
    let call = store.last_call().await.expect("store was called");
    assert_eq!(call.payload["conditions"], json!({}));

    let err = model.count_deleted(Query::new()).await.unwrap_err();
    assert!(matches!(
        err,
        SoftDeleteError::VariantUnavailable { method: Method::Count, variant: Variant::Deleted }
    ));
    Ok(())
}

#[tokio::test]
async fn store_errors_propagate_unchanged() -> Result<()> {
    let (model, store) = seeded_model(all_methods());
    let failure = soft_delete_rust::StoreError::Connection("socket closed".to_string());
    store.fail_next(failure.clone()).await;

    let err = model.find(Query::new()).await.unwrap_err();
    assert_eq!(err.as_store_error(), Some(&failure));
    Ok(())
}
