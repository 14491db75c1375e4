//! Integration tests for the append-only version store.

use std::sync::Arc;

use crate::helpers::{TestApp, ctx};

use docvault_core::error::ErrorKind;
use docvault_core::types::DocumentId;
use docvault_entity::permission::{Ability, PrincipalRef, ResourceRef};
use docvault_service::namespace::CreateDocumentRequest;

async fn make_document(app: &TestApp, owner: docvault_core::types::UserId) -> DocumentId {
    app.namespace
        .create_document(
            &ctx(owner),
            CreateDocumentRequest {
                parent_id: None,
                name: crate::helpers::unique("doc"),
                file_type: "txt".to_string(),
            },
        )
        .await
        .expect("create document")
        .id
}

#[tokio::test]
async fn test_document_starts_with_empty_version_one() {
    let Some(app) = TestApp::new().await else { return };
    let owner = app.create_test_user("veruser").await;
    let doc = make_document(&app, owner).await;

    let history = app.versions.version_history(&ctx(owner), doc).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].version_number, 1);

    let content = app.versions.latest_content(&ctx(owner), doc).await.unwrap();
    assert!(content.is_empty());
}

#[tokio::test]
async fn test_append_extends_history_and_latest_content_follows() {
    let Some(app) = TestApp::new().await else { return };
    let owner = app.create_test_user("veruser").await;
    let doc = make_document(&app, owner).await;

    let v2 = app
        .versions
        .append_version(&ctx(owner), doc, b"first draft")
        .await
        .unwrap();
    assert_eq!(v2.version_number, 2);

    let v3 = app
        .versions
        .append_version(&ctx(owner), doc, b"second draft")
        .await
        .unwrap();
    assert_eq!(v3.version_number, 3);

    let content = app.versions.latest_content(&ctx(owner), doc).await.unwrap();
    assert_eq!(content, b"second draft");

    // Newest first.
    let history = app.versions.version_history(&ctx(owner), doc).await.unwrap();
    let numbers: Vec<i32> = history.iter().map(|v| v.version_number).collect();
    assert_eq!(numbers, vec![3, 2, 1]);
}

#[tokio::test]
async fn test_append_updates_cached_document_size() {
    let Some(app) = TestApp::new().await else { return };
    let owner = app.create_test_user("veruser").await;
    let doc = make_document(&app, owner).await;

    app.versions
        .append_version(&ctx(owner), doc, b"12345")
        .await
        .unwrap();

    let row = app.document_repo.find_by_id(doc).await.unwrap().unwrap();
    assert_eq!(row.size_bytes, 5);
}

#[tokio::test]
async fn test_delete_latest_version_is_rejected_non_latest_leaves_gap() {
    let Some(app) = TestApp::new().await else { return };
    let owner = app.create_test_user("veruser").await;
    let doc = make_document(&app, owner).await;

    app.versions
        .append_version(&ctx(owner), doc, b"v2")
        .await
        .unwrap();
    let history = app.versions.version_history(&ctx(owner), doc).await.unwrap();
    let initial = history.iter().find(|v| v.version_number == 1).unwrap().id;
    let tip = history.iter().find(|v| v.version_number == 2).unwrap().id;

    // Deleting the tip always fails.
    let err = app.versions.delete_version(&ctx(owner), tip).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidOperation);

    // Deleting a non-latest version succeeds and leaves a gap.
    app.versions.delete_version(&ctx(owner), initial).await.unwrap();
    let numbers: Vec<i32> = app
        .versions
        .version_history(&ctx(owner), doc)
        .await
        .unwrap()
        .iter()
        .map(|v| v.version_number)
        .collect();
    assert_eq!(numbers, vec![2]);
}

#[tokio::test]
async fn test_revert_appends_instead_of_rewriting() {
    let Some(app) = TestApp::new().await else { return };
    let owner = app.create_test_user("veruser").await;
    let doc = make_document(&app, owner).await;

    let v2 = app
        .versions
        .append_version(&ctx(owner), doc, b"keep me")
        .await
        .unwrap();
    app.versions
        .append_version(&ctx(owner), doc, b"overwrite")
        .await
        .unwrap();

    let reverted = app.versions.revert_to(&ctx(owner), v2.id).await.unwrap();
    assert_eq!(reverted.version_number, 4);

    let content = app.versions.latest_content(&ctx(owner), doc).await.unwrap();
    assert_eq!(content, b"keep me");

    // Nothing was rewritten; all four versions remain.
    let history = app.versions.version_history(&ctx(owner), doc).await.unwrap();
    assert_eq!(history.len(), 4);
}

#[tokio::test]
async fn test_concurrent_appends_allocate_contiguous_numbers() {
    let Some(app) = TestApp::new().await else { return };
    let app = Arc::new(app);
    let owner = app.create_test_user("veruser").await;
    let doc = make_document(&app, owner).await;

    const APPENDERS: usize = 8;
    let mut handles = Vec::new();
    for i in 0..APPENDERS {
        let app = Arc::clone(&app);
        handles.push(tokio::spawn(async move {
            let body = format!("append {i}");
            app.versions
                .append_version(&ctx(owner), doc, body.as_bytes())
                .await
        }));
    }
    for handle in futures::future::join_all(handles).await {
        handle.expect("task panicked").expect("append failed");
    }

    // Initial version plus one per appender, no duplicates, no gaps.
    let mut numbers: Vec<i32> = app
        .versions
        .version_history(&ctx(owner), doc)
        .await
        .unwrap()
        .iter()
        .map(|v| v.version_number)
        .collect();
    numbers.sort_unstable();
    let expected: Vec<i32> = (1..=(APPENDERS as i32 + 1)).collect();
    assert_eq!(numbers, expected);
}

#[tokio::test]
async fn test_append_requires_edit_ability() {
    let Some(app) = TestApp::new().await else { return };
    let owner = app.create_test_user("verowner").await;
    let viewer = app.create_test_user("verviewer").await;
    let doc = make_document(&app, owner).await;

    app.permissions
        .grant(
            &ctx(owner),
            ResourceRef::Document(doc),
            PrincipalRef::User(viewer),
            Ability::View,
        )
        .await
        .unwrap();

    // A VIEW holder may read but not append.
    app.versions.latest_content(&ctx(viewer), doc).await.unwrap();
    let err = app
        .versions
        .append_version(&ctx(viewer), doc, b"sneaky")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::PermissionDenied);
}
