//! Integration tests for the folder/document namespace and its
//! materialized path cache.

use crate::helpers::{self, TestApp, ctx};

use docvault_core::error::ErrorKind;
use docvault_core::types::FolderId;
use docvault_entity::folder::content::EntryKind;
use docvault_entity::permission::{Ability, PrincipalRef, ResourceRef};
use docvault_service::namespace::{CreateDocumentRequest, CreateFolderRequest};

/// Creates a uniquely named container folder at the root so tests do not
/// collide on sibling names.
async fn container(app: &TestApp, owner: docvault_core::types::UserId) -> FolderId {
    app.namespace
        .create_folder(
            &ctx(owner),
            CreateFolderRequest {
                parent_id: None,
                name: helpers::unique("container"),
            },
        )
        .await
        .expect("create container")
        .id
}

async fn make_folder(
    app: &TestApp,
    owner: docvault_core::types::UserId,
    parent: FolderId,
    name: &str,
) -> FolderId {
    app.namespace
        .create_folder(
            &ctx(owner),
            CreateFolderRequest {
                parent_id: Some(parent),
                name: name.to_string(),
            },
        )
        .await
        .expect("create folder")
        .id
}

#[tokio::test]
async fn test_create_folder_builds_materialized_path() {
    let Some(app) = TestApp::new().await else { return };
    let owner = app.create_test_user("nsuser").await;
    let root = container(&app, owner).await;
    let root_path = app.namespace.get_path(&ctx(owner), Some(root)).await.unwrap();

    let reports = make_folder(&app, owner, root, "Reports").await;
    let year = make_folder(&app, owner, reports, "2024").await;

    assert_eq!(
        app.namespace.get_path(&ctx(owner), Some(reports)).await.unwrap(),
        format!("{root_path}/Reports")
    );
    assert_eq!(
        app.namespace.get_path(&ctx(owner), Some(year)).await.unwrap(),
        format!("{root_path}/Reports/2024")
    );
}

#[tokio::test]
async fn test_get_path_of_root_is_empty() {
    let Some(app) = TestApp::new().await else { return };
    let owner = app.create_test_user("nsuser").await;

    let path = app.namespace.get_path(&ctx(owner), None).await.unwrap();
    assert_eq!(path, "");
}

#[tokio::test]
async fn test_rename_folder_propagates_to_subtree() {
    let Some(app) = TestApp::new().await else { return };
    let owner = app.create_test_user("nsuser").await;
    let root = container(&app, owner).await;
    let root_path = app.namespace.get_path(&ctx(owner), Some(root)).await.unwrap();

    let reports = make_folder(&app, owner, root, "Reports").await;
    let year = make_folder(&app, owner, reports, "2024").await;
    let quarter = make_folder(&app, owner, year, "Q1").await;

    app.namespace
        .rename_folder(&ctx(owner), reports, "Archive")
        .await
        .unwrap();

    assert_eq!(
        app.namespace.get_path(&ctx(owner), Some(reports)).await.unwrap(),
        format!("{root_path}/Archive")
    );
    assert_eq!(
        app.namespace.get_path(&ctx(owner), Some(year)).await.unwrap(),
        format!("{root_path}/Archive/2024")
    );
    assert_eq!(
        app.namespace.get_path(&ctx(owner), Some(quarter)).await.unwrap(),
        format!("{root_path}/Archive/2024/Q1")
    );
}

#[tokio::test]
async fn test_path_invariant_holds_after_rename_and_move_chain() {
    let Some(app) = TestApp::new().await else { return };
    let owner = app.create_test_user("nsuser").await;
    let root = container(&app, owner).await;

    let a = make_folder(&app, owner, root, "a").await;
    let b = make_folder(&app, owner, a, "b").await;
    let c = make_folder(&app, owner, b, "c").await;
    let d = make_folder(&app, owner, root, "d").await;

    app.namespace.rename_folder(&ctx(owner), a, "a2").await.unwrap();
    app.namespace.move_folder(&ctx(owner), b, Some(d)).await.unwrap();
    app.namespace.rename_folder(&ctx(owner), d, "d2").await.unwrap();

    // Every folder's cached path must equal its parent's path plus its
    // own name.
    for folder_id in [a, b, c, d] {
        let folder = app.folder_repo.find_by_id(folder_id).await.unwrap().unwrap();
        let parent_path = app.folder_repo.get_path(folder.parent_id).await.unwrap();
        let own_path = app.folder_repo.get_path(Some(folder_id)).await.unwrap();
        let expected = if parent_path.is_empty() {
            folder.name.clone()
        } else {
            format!("{parent_path}/{}", folder.name)
        };
        assert_eq!(own_path, expected, "invariant broken for folder {folder_id}");
    }
}

#[tokio::test]
async fn test_move_folder_under_own_descendant_is_rejected() {
    let Some(app) = TestApp::new().await else { return };
    let owner = app.create_test_user("nsuser").await;
    let root = container(&app, owner).await;

    let outer = make_folder(&app, owner, root, "outer").await;
    let inner = make_folder(&app, owner, outer, "inner").await;

    let err = app
        .namespace
        .move_folder(&ctx(owner), outer, Some(inner))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidOperation);

    // The tree is untouched.
    let outer_row = app.folder_repo.find_by_id(outer).await.unwrap().unwrap();
    assert_eq!(outer_row.parent_id, Some(root));
}

#[tokio::test]
async fn test_move_folder_into_itself_is_rejected() {
    let Some(app) = TestApp::new().await else { return };
    let owner = app.create_test_user("nsuser").await;
    let root = container(&app, owner).await;
    let folder = make_folder(&app, owner, root, "selfie").await;

    let err = app
        .namespace
        .move_folder(&ctx(owner), folder, Some(folder))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidOperation);
}

#[tokio::test]
async fn test_create_folder_under_missing_parent_is_not_found() {
    let Some(app) = TestApp::new().await else { return };
    let owner = app.create_test_user("nsuser").await;

    let err = app
        .namespace
        .create_folder(
            &ctx(owner),
            CreateFolderRequest {
                parent_id: Some(FolderId::new(i64::MAX - 1)),
                name: "orphan".to_string(),
            },
        )
        .await
        .unwrap_err();
    // The gate fires first: no grant can exist on a missing folder.
    assert!(matches!(
        err.kind,
        ErrorKind::NotFound | ErrorKind::PermissionDenied
    ));
}

#[tokio::test]
async fn test_duplicate_sibling_folder_name_conflicts() {
    let Some(app) = TestApp::new().await else { return };
    let owner = app.create_test_user("nsuser").await;
    let root = container(&app, owner).await;

    make_folder(&app, owner, root, "twin").await;
    let err = app
        .namespace
        .create_folder(
            &ctx(owner),
            CreateFolderRequest {
                parent_id: Some(root),
                name: "twin".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
}

#[tokio::test]
async fn test_rename_document_leaves_paths_alone() {
    let Some(app) = TestApp::new().await else { return };
    let owner = app.create_test_user("nsuser").await;
    let root = container(&app, owner).await;
    let root_path = app.namespace.get_path(&ctx(owner), Some(root)).await.unwrap();

    let doc = app
        .namespace
        .create_document(
            &ctx(owner),
            CreateDocumentRequest {
                parent_id: Some(root),
                name: "notes.txt".to_string(),
                file_type: "txt".to_string(),
            },
        )
        .await
        .unwrap();

    let renamed = app
        .namespace
        .rename_document(&ctx(owner), doc.id, "renamed.txt")
        .await
        .unwrap();
    assert_eq!(renamed.name, "renamed.txt");

    // The containing folder's path is untouched by document renames.
    assert_eq!(
        app.namespace.get_path(&ctx(owner), Some(root)).await.unwrap(),
        root_path
    );
}

#[tokio::test]
async fn test_list_children_is_permission_filtered_and_sorted() {
    let Some(app) = TestApp::new().await else { return };
    let owner = app.create_test_user("nsowner").await;
    let viewer = app.create_test_user("nsviewer").await;
    let root = container(&app, owner).await;

    app.namespace
        .create_document(
            &ctx(owner),
            CreateDocumentRequest {
                parent_id: Some(root),
                name: "beta.txt".to_string(),
                file_type: "txt".to_string(),
            },
        )
        .await
        .unwrap();
    let alpha = app
        .namespace
        .create_document(
            &ctx(owner),
            CreateDocumentRequest {
                parent_id: Some(root),
                name: "alpha.txt".to_string(),
                file_type: "txt".to_string(),
            },
        )
        .await
        .unwrap();
    make_folder(&app, owner, root, "zfolder").await;

    // The owner sees everything, folders with no size, sorted by name.
    let entries = app.namespace.list_children(&ctx(owner), Some(root)).await.unwrap();
    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["alpha.txt", "beta.txt", "zfolder"]);
    assert_eq!(entries[0].kind, EntryKind::File);
    assert_eq!(entries[0].size_bytes, Some(0));
    assert_eq!(entries[2].kind, EntryKind::Folder);
    assert_eq!(entries[2].size_bytes, None);

    // A stranger sees nothing.
    let entries = app.namespace.list_children(&ctx(viewer), Some(root)).await.unwrap();
    assert!(entries.is_empty());

    // A VIEW grant reveals exactly the granted document.
    app.permissions
        .grant(
            &ctx(owner),
            ResourceRef::Document(alpha.id),
            PrincipalRef::User(viewer),
            Ability::View,
        )
        .await
        .unwrap();
    let entries = app.namespace.list_children(&ctx(viewer), Some(root)).await.unwrap();
    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["alpha.txt"]);
}

#[tokio::test]
async fn test_list_children_of_missing_parent_is_not_found() {
    let Some(app) = TestApp::new().await else { return };
    let owner = app.create_test_user("nsuser").await;

    let err = app
        .namespace
        .list_children(&ctx(owner), Some(FolderId::new(i64::MAX - 2)))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_delete_folder_without_cascade_orphans_children() {
    let Some(app) = TestApp::new().await else { return };
    let owner = app.create_test_user("nsuser").await;
    let root = container(&app, owner).await;
    let parent = make_folder(&app, owner, root, "doomed").await;
    let child = make_folder(&app, owner, parent, "survivor").await;

    app.namespace.delete_folder(&ctx(owner), parent).await.unwrap();

    assert!(app.folder_repo.find_by_id(parent).await.unwrap().is_none());
    // Legacy soft-orphaning: the child row stays behind.
    assert!(app.folder_repo.find_by_id(child).await.unwrap().is_some());
}

#[tokio::test]
async fn test_delete_folder_with_cascade_removes_subtree_and_documents() {
    let Some(app) = TestApp::new().await else { return };
    let owner = app.create_test_user("nsuser").await;
    let root = container(&app, owner).await;
    let parent = make_folder(&app, owner, root, "doomed").await;
    let child = make_folder(&app, owner, parent, "inner").await;
    let doc = app
        .namespace_cascade
        .create_document(
            &ctx(owner),
            CreateDocumentRequest {
                parent_id: Some(child),
                name: "data.txt".to_string(),
                file_type: "txt".to_string(),
            },
        )
        .await
        .unwrap();

    app.namespace_cascade
        .delete_folder(&ctx(owner), parent)
        .await
        .unwrap();

    assert!(app.folder_repo.find_by_id(parent).await.unwrap().is_none());
    assert!(app.folder_repo.find_by_id(child).await.unwrap().is_none());
    assert!(app.document_repo.find_by_id(doc.id).await.unwrap().is_none());
    assert!(app.version_repo.history(doc.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_move_document_into_folder() {
    let Some(app) = TestApp::new().await else { return };
    let owner = app.create_test_user("nsuser").await;
    let root = container(&app, owner).await;
    let target = make_folder(&app, owner, root, "target").await;

    let doc = app
        .namespace
        .create_document(
            &ctx(owner),
            CreateDocumentRequest {
                parent_id: Some(root),
                name: "mover.txt".to_string(),
                file_type: "txt".to_string(),
            },
        )
        .await
        .unwrap();

    let moved = app
        .namespace
        .move_document(&ctx(owner), doc.id, Some(target))
        .await
        .unwrap();
    assert_eq!(moved.parent_id, Some(target));
}
