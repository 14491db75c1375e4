//! Shared test helpers for integration tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use docvault_core::config::namespace::NamespaceConfig;
use docvault_core::types::UserId;
use docvault_database::PgPrincipalDirectory;
use docvault_database::repositories::comment::CommentRepository;
use docvault_database::repositories::document::DocumentRepository;
use docvault_database::repositories::folder::FolderRepository;
use docvault_database::repositories::permission::PermissionRepository;
use docvault_database::repositories::team::TeamRepository;
use docvault_database::repositories::user::UserRepository;
use docvault_database::repositories::version::VersionRepository;
use docvault_entity::user::model::CreateUser;
use docvault_service::{
    CommentService, NamespaceService, PermissionGate, PermissionService, RequestContext,
    VersionService,
};

/// Test application context wiring repositories and services against the
/// configured test database.
pub struct TestApp {
    /// Database pool for direct queries.
    pub pool: PgPool,
    /// Namespace service with the default (non-cascading) delete policy.
    pub namespace: NamespaceService,
    /// Namespace service with cascading deletes enabled.
    pub namespace_cascade: NamespaceService,
    /// Version service.
    pub versions: VersionService,
    /// Permission service.
    pub permissions: PermissionService,
    /// Comment service.
    pub comments: CommentService,
    /// Raw repositories, for observing storage state directly.
    pub folder_repo: Arc<FolderRepository>,
    pub document_repo: Arc<DocumentRepository>,
    pub version_repo: Arc<VersionRepository>,
    pub permission_repo: Arc<PermissionRepository>,
    pub team_repo: Arc<TeamRepository>,
    pub user_repo: Arc<UserRepository>,
}

impl TestApp {
    /// Connect to the test database, run migrations, and wire services.
    ///
    /// Returns `None` when `DOCVAULT_TEST_DATABASE_URL` is unset so the
    /// suite can run (as a no-op) without database infrastructure.
    pub async fn new() -> Option<Self> {
        let url = match std::env::var("DOCVAULT_TEST_DATABASE_URL") {
            Ok(url) => url,
            Err(_) => {
                eprintln!("skipping: DOCVAULT_TEST_DATABASE_URL not set");
                return None;
            }
        };

        let pool = PgPoolOptions::new()
            .max_connections(8)
            .connect(&url)
            .await
            .expect("Failed to connect to test database");

        docvault_database::migration::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let folder_repo = Arc::new(FolderRepository::new(pool.clone()));
        let document_repo = Arc::new(DocumentRepository::new(pool.clone()));
        let version_repo = Arc::new(VersionRepository::new(pool.clone()));
        let permission_repo = Arc::new(PermissionRepository::new(pool.clone()));
        let team_repo = Arc::new(TeamRepository::new(pool.clone()));
        let user_repo = Arc::new(UserRepository::new(pool.clone()));
        let comment_repo = Arc::new(CommentRepository::new(pool.clone()));
        let directory = Arc::new(PgPrincipalDirectory::new(pool.clone()));

        let gate = PermissionGate::new(Arc::clone(&permission_repo));

        let namespace = NamespaceService::new(
            Arc::clone(&folder_repo),
            Arc::clone(&document_repo),
            gate.clone(),
            NamespaceConfig {
                cascade_delete: false,
            },
        );
        let namespace_cascade = NamespaceService::new(
            Arc::clone(&folder_repo),
            Arc::clone(&document_repo),
            gate.clone(),
            NamespaceConfig {
                cascade_delete: true,
            },
        );
        let versions = VersionService::new(Arc::clone(&version_repo), gate.clone());
        let permissions =
            PermissionService::new(Arc::clone(&permission_repo), directory, gate.clone());
        let comments = CommentService::new(Arc::clone(&comment_repo), gate);

        Some(Self {
            pool,
            namespace,
            namespace_cascade,
            versions,
            permissions,
            comments,
            folder_repo,
            document_repo,
            version_repo,
            permission_repo,
            team_repo,
            user_repo,
        })
    }

    /// Create a test user with a unique name and email.
    pub async fn create_test_user(&self, prefix: &str) -> UserId {
        let name = unique(prefix);
        self.user_repo
            .create(&CreateUser {
                username: name.clone(),
                email: format!("{name}@test.example"),
            })
            .await
            .expect("Failed to create test user")
            .id
    }
}

/// A request context for the given principal.
pub fn ctx(user_id: UserId) -> RequestContext {
    RequestContext::new(user_id)
}

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// A process-unique name so tests never collide across runs or with each
/// other on shared tables.
pub fn unique(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_nanos();
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{nanos}-{n}")
}
