//! Integration tests for permission grants and effective-ability
//! resolution.

use crate::helpers::{self, TestApp, ctx};

use docvault_core::error::ErrorKind;
use docvault_core::types::DocumentId;
use docvault_entity::permission::{Ability, PrincipalRef, ResourceRef};
use docvault_entity::team::model::CreateTeam;
use docvault_service::namespace::CreateDocumentRequest;

async fn make_document(app: &TestApp, owner: docvault_core::types::UserId) -> DocumentId {
    app.namespace
        .create_document(
            &ctx(owner),
            CreateDocumentRequest {
                parent_id: None,
                name: helpers::unique("permdoc"),
                file_type: "txt".to_string(),
            },
        )
        .await
        .expect("create document")
        .id
}

#[tokio::test]
async fn test_owner_holds_edit_from_creation() {
    let Some(app) = TestApp::new().await else { return };
    let owner = app.create_test_user("permowner").await;
    let doc = make_document(&app, owner).await;

    let effective = app
        .permissions
        .effective_ability(ResourceRef::Document(doc), owner)
        .await
        .unwrap();
    assert_eq!(effective, Some(Ability::Edit));

    let rows = app
        .permissions
        .permissions_for(&ctx(owner), ResourceRef::Document(doc))
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].user_id, Some(owner));
}

#[tokio::test]
async fn test_grant_overwrites_instead_of_duplicating() {
    let Some(app) = TestApp::new().await else { return };
    let owner = app.create_test_user("permowner").await;
    let grantee = app.create_test_user("permuser").await;
    let doc = make_document(&app, owner).await;
    let resource = ResourceRef::Document(doc);

    app.permissions
        .grant(&ctx(owner), resource, PrincipalRef::User(grantee), Ability::View)
        .await
        .unwrap();
    app.permissions
        .grant(&ctx(owner), resource, PrincipalRef::User(grantee), Ability::Comment)
        .await
        .unwrap();

    // Still one row for the pair, carrying the latest ability.
    let rows = app
        .permissions
        .permissions_for(&ctx(owner), resource)
        .await
        .unwrap();
    let grantee_rows: Vec<_> = rows
        .iter()
        .filter(|p| p.user_id == Some(grantee))
        .collect();
    assert_eq!(grantee_rows.len(), 1);
    assert_eq!(grantee_rows[0].ability, Ability::Comment);
}

#[tokio::test]
async fn test_team_grant_dominates_lower_direct_grant() {
    let Some(app) = TestApp::new().await else { return };
    let owner = app.create_test_user("permowner").await;
    let member = app.create_test_user("permmember").await;
    let doc = make_document(&app, owner).await;
    let resource = ResourceRef::Document(doc);

    let team = app
        .team_repo
        .create(&CreateTeam {
            owner_id: owner,
            name: helpers::unique("team"),
            description: None,
        })
        .await
        .unwrap();
    app.team_repo.add_member(team.id, member).await.unwrap();

    app.permissions
        .grant(&ctx(owner), resource, PrincipalRef::User(member), Ability::View)
        .await
        .unwrap();
    assert_eq!(
        app.permissions.effective_ability(resource, member).await.unwrap(),
        Some(Ability::View)
    );

    // The higher team grant wins because it is higher in the ordering,
    // not because it is newer.
    app.permissions
        .grant(&ctx(owner), resource, PrincipalRef::Team(team.id), Ability::Edit)
        .await
        .unwrap();
    assert_eq!(
        app.permissions.effective_ability(resource, member).await.unwrap(),
        Some(Ability::Edit)
    );
}

#[tokio::test]
async fn test_revoke_leaves_no_effective_ability() {
    let Some(app) = TestApp::new().await else { return };
    let owner = app.create_test_user("permowner").await;
    let grantee = app.create_test_user("permuser").await;
    let doc = make_document(&app, owner).await;
    let resource = ResourceRef::Document(doc);

    let grant = app
        .permissions
        .grant(&ctx(owner), resource, PrincipalRef::User(grantee), Ability::Comment)
        .await
        .unwrap();

    app.permissions.revoke(&ctx(owner), grant.id).await.unwrap();

    assert_eq!(
        app.permissions.effective_ability(resource, grantee).await.unwrap(),
        None
    );
}

#[tokio::test]
async fn test_revoking_owner_permission_is_rejected() {
    let Some(app) = TestApp::new().await else { return };
    let owner = app.create_test_user("permowner").await;
    let doc = make_document(&app, owner).await;

    let rows = app
        .permissions
        .permissions_for(&ctx(owner), ResourceRef::Document(doc))
        .await
        .unwrap();
    let owner_row = rows.iter().find(|p| p.user_id == Some(owner)).unwrap();

    let err = app
        .permissions
        .revoke(&ctx(owner), owner_row.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidOperation);
}

#[tokio::test]
async fn test_set_ability_updates_in_place() {
    let Some(app) = TestApp::new().await else { return };
    let owner = app.create_test_user("permowner").await;
    let grantee = app.create_test_user("permuser").await;
    let doc = make_document(&app, owner).await;
    let resource = ResourceRef::Document(doc);

    let grant = app
        .permissions
        .grant(&ctx(owner), resource, PrincipalRef::User(grantee), Ability::View)
        .await
        .unwrap();

    let updated = app
        .permissions
        .set_ability(&ctx(owner), grant.id, Ability::Edit)
        .await
        .unwrap();
    assert_eq!(updated.id, grant.id);
    assert_eq!(updated.ability, Ability::Edit);

    assert_eq!(
        app.permissions.effective_ability(resource, grantee).await.unwrap(),
        Some(Ability::Edit)
    );
}

#[tokio::test]
async fn test_view_holder_cannot_edit_or_manage_grants() {
    let Some(app) = TestApp::new().await else { return };
    let owner = app.create_test_user("permowner").await;
    let viewer = app.create_test_user("permviewer").await;
    let stranger = app.create_test_user("permstranger").await;
    let doc = make_document(&app, owner).await;
    let resource = ResourceRef::Document(doc);

    app.permissions
        .grant(&ctx(owner), resource, PrincipalRef::User(viewer), Ability::View)
        .await
        .unwrap();

    // Comment holders are not edit holders; view holders even less so.
    let err = app
        .namespace
        .rename_document(&ctx(viewer), doc, "hijacked.txt")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::PermissionDenied);

    // Sharing is a management operation and needs EDIT.
    let err = app
        .permissions
        .grant(&ctx(viewer), resource, PrincipalRef::User(stranger), Ability::View)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::PermissionDenied);
}

#[tokio::test]
async fn test_comment_requires_comment_ability() {
    let Some(app) = TestApp::new().await else { return };
    let owner = app.create_test_user("permowner").await;
    let viewer = app.create_test_user("permviewer").await;
    let commenter = app.create_test_user("permcommenter").await;
    let doc = make_document(&app, owner).await;
    let resource = ResourceRef::Document(doc);

    app.permissions
        .grant(&ctx(owner), resource, PrincipalRef::User(viewer), Ability::View)
        .await
        .unwrap();
    app.permissions
        .grant(&ctx(owner), resource, PrincipalRef::User(commenter), Ability::Comment)
        .await
        .unwrap();

    let err = app
        .comments
        .add_comment(&ctx(viewer), doc, "drive-by")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::PermissionDenied);

    let comment = app
        .comments
        .add_comment(&ctx(commenter), doc, "looks good")
        .await
        .unwrap();
    assert_eq!(comment.created_by, commenter);

    // The view holder can still read the thread.
    let thread = app.comments.list_comments(&ctx(viewer), doc).await.unwrap();
    assert_eq!(thread.len(), 1);
}

#[tokio::test]
async fn test_grant_by_email_resolves_through_directory() {
    let Some(app) = TestApp::new().await else { return };
    let owner = app.create_test_user("permowner").await;
    let doc = make_document(&app, owner).await;
    let resource = ResourceRef::Document(doc);

    let name = helpers::unique("mailuser");
    let email = format!("{name}@test.example");
    let grantee = app
        .user_repo
        .create(&docvault_entity::user::model::CreateUser {
            username: name,
            email: email.clone(),
        })
        .await
        .unwrap()
        .id;

    app.permissions
        .grant_by_email(&ctx(owner), resource, &email, Ability::Comment)
        .await
        .unwrap();
    assert_eq!(
        app.permissions.effective_ability(resource, grantee).await.unwrap(),
        Some(Ability::Comment)
    );

    let err = app
        .permissions
        .grant_by_email(&ctx(owner), resource, "nobody@test.example", Ability::View)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_effective_ability_without_any_grant_is_none() {
    let Some(app) = TestApp::new().await else { return };
    let owner = app.create_test_user("permowner").await;
    let stranger = app.create_test_user("permstranger").await;
    let doc = make_document(&app, owner).await;

    assert_eq!(
        app.permissions
            .effective_ability(ResourceRef::Document(doc), stranger)
            .await
            .unwrap(),
        None
    );
}
