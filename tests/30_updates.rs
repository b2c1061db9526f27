mod common;

use anyhow::Result;
use serde_json::json;
use soft_delete_rust::{CallArgs, QueryOptions, StoreError, UpdateArgs};

use common::{all_methods, capture, doc, recorder, seeded_model};

// Update-style calls: overload resolution and conditions-slot injection

#[tokio::test]
async fn full_call_injects_into_conditions() -> Result<()> {
    let (model, store) = seeded_model(all_methods());
    let seen = capture();

    let args = CallArgs::new()
        .arg(json!({ "group": "x" }))
        .arg(json!({ "$set": { "flagged": true } }))
        .arg(json!({ "multi": true }))
        .callback(recorder(&seen));
    let result = model.update(args).await?;

    assert_eq!(result.matched_count, 2);
    let call = store.last_call().await.expect("store was called");
    assert_eq!(call.operation, "update");
    assert_eq!(call.payload["conditions"], json!({ "group": "x", "deleted": { "$ne": true } }));
    assert_eq!(call.payload["options"], json!({ "multi": true }));

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0], Ok(json!({ "matchedCount": 2, "modifiedCount": 2 })));
    Ok(())
}

#[tokio::test]
async fn document_and_callback_targets_all_active() -> Result<()> {
    let (model, store) = seeded_model(all_methods());
    let seen = capture();

    let args = CallArgs::new()
        .arg(json!({ "$set": { "touched": true } }))
        .callback(recorder(&seen));
    model.update_many(args).await?;

    let call = store.last_call().await.expect("store was called");
    assert_eq!(call.payload["conditions"], json!({ "deleted": { "$ne": true } }));
    assert_eq!(call.payload["update"], json!({ "$set": { "touched": true } }));

    let touched: Vec<_> = store
        .documents()
        .await
        .into_iter()
        .filter(|d| d.get("touched").is_some())
        .collect();
    assert_eq!(common::ids(touched), ["a1", "a2", "a3"]);
    assert_eq!(seen.lock().unwrap().len(), 1);
    Ok(())
}

#[tokio::test]
async fn sole_document_is_the_update() -> Result<()> {
    let (model, store) = seeded_model(all_methods());

    model.update_one(CallArgs::new().arg(json!({ "$set": { "n": 1 } }))).await?;

    let call = store.last_call().await.expect("store was called");
    assert_eq!(call.payload["conditions"], json!({ "deleted": { "$ne": true } }));
    assert_eq!(call.payload["update"], json!({ "$set": { "n": 1 } }));
    Ok(())
}

#[tokio::test]
async fn callback_only_still_receives_outcome() -> Result<()> {
    let (model, store) = seeded_model(all_methods());
    let seen = capture();

    model.update_one(CallArgs::new().callback(recorder(&seen))).await?;

    let call = store.last_call().await.expect("store was called");
    assert_eq!(call.payload["conditions"], json!({ "deleted": { "$ne": true } }));
    assert_eq!(call.payload["update"], json!(null));
    assert_eq!(seen.lock().unwrap().len(), 1);
    Ok(())
}

#[tokio::test]
async fn deleted_variant_only_touches_deleted() -> Result<()> {
    let (model, store) = seeded_model(all_methods());

    let args = UpdateArgs::new(doc(json!({})), doc(json!({ "$set": { "audited": true } })))
        .with_options(QueryOptions::multi());
    let result = model.update_deleted(args).await?;
    assert_eq!(result.matched_count, 2);

    let call = store.last_call().await.expect("store was called");
    assert_eq!(call.payload["conditions"], json!({ "deleted": { "$ne": false } }));
    Ok(())
}

#[tokio::test]
async fn with_deleted_variant_and_option_skip_injection() -> Result<()> {
    let (model, store) = seeded_model(all_methods());

    let args = UpdateArgs::new(doc(json!({ "_id": "d1" })), doc(json!({ "$set": { "note": "x" } })));
    let result = model.update_one_with_deleted(args).await?;
    assert_eq!(result.modified_count, 1);
    assert_eq!(store.last_call().await.unwrap().payload["conditions"], json!({ "_id": "d1" }));

    let mut options = QueryOptions::with_deleted();
    options.multi = true;
    let args = UpdateArgs::new(doc(json!({ "group": "y" })), doc(json!({ "$set": { "note": "y" } })))
        .with_options(options);
    let result = model.update(args).await?;
    assert_eq!(result.matched_count, 2);
    Ok(())
}

#[tokio::test]
async fn find_one_and_update_cannot_reach_deleted() -> Result<()> {
    let (model, _store) = seeded_model(all_methods());

    let args = UpdateArgs::new(doc(json!({ "_id": "d2" })), doc(json!({ "$set": { "name": "x" } })))
        .with_options(QueryOptions { return_new: true, ..Default::default() });
    assert!(model.find_one_and_update(args).await?.is_none());

    let args = UpdateArgs::new(doc(json!({ "_id": "d2" })), doc(json!({ "$set": { "name": "x" } })))
        .with_options(QueryOptions { return_new: true, ..Default::default() });
    let updated = model.find_one_and_update_deleted(args).await?.expect("deleted document found");
    assert_eq!(updated.get("name"), Some(&json!("x")));
    Ok(())
}

#[tokio::test]
async fn store_error_reaches_handler_and_caller() -> Result<()> {
    let (model, store) = seeded_model(all_methods());
    let seen = capture();
    let failure = StoreError::WriteConflict("version mismatch".to_string());
    store.fail_next(failure.clone()).await;

    let args = CallArgs::new()
        .arg(json!({ "_id": "a1" }))
        .arg(json!({ "$set": { "n": 1 } }))
        .callback(recorder(&seen));
    let err = model.update_one(args).await.unwrap_err();

    assert_eq!(err.as_store_error(), Some(&failure));
    let expected: Vec<Result<serde_json::Value, StoreError>> = vec![Err(failure)];
    assert_eq!(*seen.lock().unwrap(), expected);
    Ok(())
}

#[tokio::test]
async fn misuse_fails_before_the_store() -> Result<()> {
    let (model, store) = seeded_model(all_methods());
    store.clear_calls().await;

    let args = CallArgs::new().arg(json!("not a document")).arg(json!({ "$set": {} }));
    let err = model.update(args).await.unwrap_err();

    assert!(err.is_invocation());
    assert!(store.calls().await.is_empty());
    Ok(())
}
