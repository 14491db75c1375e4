//! Folder repository — the folder half of the namespace store.
//!
//! Rename and move rewrite the materialized path of an entire subtree.
//! Both run as one transaction: the subtree rows are locked `FOR UPDATE`,
//! the cycle check runs after the locks are taken, every affected
//! `path_cache` row is recomputed pre-order from the locked snapshot, and
//! the whole unit commits or rolls back together.

use sqlx::{PgPool, Postgres, Transaction};

use docvault_core::error::{AppError, ErrorKind};
use docvault_core::result::AppResult;
use docvault_core::types::{FolderId, UserId};
use docvault_entity::folder::content::FolderEntry;
use docvault_entity::folder::model::{CreateFolder, Folder};
use docvault_entity::folder::path::{self, PathNode};
use docvault_entity::permission::Ability;

/// Repository for folder CRUD, path lookup, and subtree path propagation.
#[derive(Debug, Clone)]
pub struct FolderRepository {
    pool: PgPool,
}

impl FolderRepository {
    /// Create a new folder repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a folder by ID.
    pub async fn find_by_id(&self, id: FolderId) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>("SELECT * FROM folders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find folder", e))
    }

    /// Return the cached path of a folder; the root sentinel (`None`) has
    /// the empty path.
    pub async fn get_path(&self, folder_id: Option<FolderId>) -> AppResult<String> {
        let Some(folder_id) = folder_id else {
            return Ok(path::ROOT_PATH.to_string());
        };

        sqlx::query_scalar::<_, String>("SELECT path FROM path_cache WHERE folder_id = $1")
            .bind(folder_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to read path", e))?
            .ok_or_else(|| AppError::not_found(format!("Folder {folder_id} not found")))
    }

    /// Create a folder, its path-cache entry, and the owner's EDIT
    /// permission in one transaction.
    pub async fn create(&self, data: &CreateFolder) -> AppResult<Folder> {
        let mut tx = begin(&self.pool).await?;

        let parent_path = locked_path(&mut tx, data.parent_id).await?;
        ensure_no_sibling(&mut tx, data.parent_id, &data.name, None).await?;

        let folder = sqlx::query_as::<_, Folder>(
            "INSERT INTO folders (owner_id, parent_id, created_by, name) \
             VALUES ($1, $2, $1, $3) RETURNING *",
        )
        .bind(data.owner_id)
        .bind(data.parent_id)
        .bind(&data.name)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_insert_error(e, "folder", &data.name))?;

        sqlx::query("INSERT INTO path_cache (folder_id, path) VALUES ($1, $2)")
            .bind(folder.id)
            .bind(path::child_path(&parent_path, &folder.name))
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to cache folder path", e)
            })?;

        insert_owner_permission(&mut tx, None, Some(folder.id), data.owner_id).await?;

        commit(tx).await?;
        Ok(folder)
    }

    /// Rename a folder and rewrite the cached paths of its whole subtree.
    pub async fn rename(&self, folder_id: FolderId, new_name: &str) -> AppResult<Folder> {
        let mut tx = begin(&self.pool).await?;

        let folder = sqlx::query_as::<_, Folder>(
            "UPDATE folders SET name = $2, modified_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(folder_id)
        .bind(new_name)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_insert_error(e, "folder", new_name))?
        .ok_or_else(|| AppError::not_found(format!("Folder {folder_id} not found")))?;

        let parent_path = locked_path(&mut tx, folder.parent_id).await?;
        let subtree = lock_subtree(&mut tx, folder_id).await?;

        let new_path = path::child_path(&parent_path, new_name);
        apply_path_updates(&mut tx, path::propagate_paths(folder_id, &new_path, &subtree)).await?;

        commit(tx).await?;
        Ok(folder)
    }

    /// Move a folder under a new parent and rewrite the cached paths of
    /// its whole subtree. Rejects moves that would introduce a cycle.
    pub async fn move_folder(
        &self,
        folder_id: FolderId,
        new_parent_id: Option<FolderId>,
    ) -> AppResult<Folder> {
        if new_parent_id == Some(folder_id) {
            return Err(AppError::invalid_operation(
                "Cannot move a folder into itself",
            ));
        }

        let mut tx = begin(&self.pool).await?;

        // Lock the moved row before inspecting the tree shape.
        let folder = sqlx::query_as::<_, Folder>("SELECT * FROM folders WHERE id = $1 FOR UPDATE")
            .bind(folder_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load folder", e))?
            .ok_or_else(|| AppError::not_found(format!("Folder {folder_id} not found")))?;

        let target_path = locked_path(&mut tx, new_parent_id).await?;

        if let Some(target) = new_parent_id {
            if is_in_subtree(&mut tx, folder_id, target).await? {
                return Err(AppError::invalid_operation(
                    "Cannot move a folder under its own descendant",
                ));
            }
        }

        ensure_no_sibling(&mut tx, new_parent_id, &folder.name, Some(folder_id)).await?;

        let folder = sqlx::query_as::<_, Folder>(
            "UPDATE folders SET parent_id = $2, modified_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(folder_id)
        .bind(new_parent_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to move folder", e))?;

        let subtree = lock_subtree(&mut tx, folder_id).await?;
        let new_path = path::child_path(&target_path, &folder.name);
        apply_path_updates(&mut tx, path::propagate_paths(folder_id, &new_path, &subtree)).await?;

        commit(tx).await?;
        Ok(folder)
    }

    /// Delete a folder. With `cascade` the whole subtree, its documents,
    /// their versions and comments, and all attached permissions are
    /// removed in one transaction; without it only this row (and its own
    /// path/permission entries) goes away, orphaning any children.
    pub async fn delete(&self, folder_id: FolderId, cascade: bool) -> AppResult<bool> {
        if !cascade {
            let result = sqlx::query("DELETE FROM folders WHERE id = $1")
                .bind(folder_id)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to delete folder", e)
                })?;
            return Ok(result.rows_affected() > 0);
        }

        let mut tx = begin(&self.pool).await?;

        let subtree = lock_subtree(&mut tx, folder_id).await?;
        if subtree.is_empty() {
            return Ok(false);
        }
        let folder_ids: Vec<i64> = subtree.iter().map(|n| n.id.as_i64()).collect();

        let document_ids: Vec<i64> =
            sqlx::query_scalar("SELECT id FROM documents WHERE parent_id = ANY($1) FOR UPDATE")
                .bind(&folder_ids)
                .fetch_all(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to collect documents", e)
                })?;

        sqlx::query("DELETE FROM versions WHERE document_id = ANY($1)")
            .bind(&document_ids)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete versions", e)
            })?;
        sqlx::query("DELETE FROM comments WHERE document_id = ANY($1)")
            .bind(&document_ids)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete comments", e)
            })?;
        sqlx::query("DELETE FROM documents WHERE id = ANY($1)")
            .bind(&document_ids)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete documents", e)
            })?;
        let result = sqlx::query("DELETE FROM folders WHERE id = ANY($1)")
            .bind(&folder_ids)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete folders", e)
            })?;

        commit(tx).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Merged listing of the child folders and documents under a parent
    /// that the given user holds any grant on, sorted by name ascending.
    /// Folders report a NULL size.
    pub async fn list_entries(
        &self,
        parent_id: Option<FolderId>,
        user_id: UserId,
    ) -> AppResult<Vec<FolderEntry>> {
        if let Some(parent) = parent_id {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM folders WHERE id = $1)")
                    .bind(parent)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(|e| {
                        AppError::with_source(ErrorKind::Database, "Failed to check parent", e)
                    })?;
            if !exists {
                return Err(AppError::not_found(format!("Folder {parent} not found")));
            }
        }

        sqlx::query_as::<_, FolderEntry>(
            "SELECT d.id AS id, d.name AS name, 'file'::entry_kind AS kind, \
                    d.created_at AS created_at, d.modified_at AS modified_at, \
                    d.size_bytes AS size_bytes \
             FROM documents d \
             WHERE d.parent_id IS NOT DISTINCT FROM $1 \
               AND EXISTS ( \
                   SELECT 1 FROM permissions p \
                   WHERE p.file_id = d.id \
                     AND (p.user_id = $2 OR p.team_id IN \
                          (SELECT tm.team_id FROM team_memberships tm WHERE tm.user_id = $2))) \
             UNION ALL \
             SELECT f.id, f.name, 'folder'::entry_kind, f.created_at, f.modified_at, NULL::BIGINT \
             FROM folders f \
             WHERE f.parent_id IS NOT DISTINCT FROM $1 \
               AND EXISTS ( \
                   SELECT 1 FROM permissions p \
                   WHERE p.folder_id = f.id \
                     AND (p.user_id = $2 OR p.team_id IN \
                          (SELECT tm.team_id FROM team_memberships tm WHERE tm.user_id = $2))) \
             ORDER BY name ASC",
        )
        .bind(parent_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list folder contents", e))
    }
}

/// Begin a transaction, surfacing pool exhaustion as storage unavailability.
pub(crate) async fn begin(pool: &PgPool) -> AppResult<Transaction<'static, Postgres>> {
    pool.begin().await.map_err(|e| {
        AppError::with_source(
            ErrorKind::StorageUnavailable,
            "Failed to begin transaction",
            e,
        )
    })
}

/// Commit a transaction, surfacing failure as storage unavailability.
pub(crate) async fn commit(tx: Transaction<'static, Postgres>) -> AppResult<()> {
    tx.commit().await.map_err(|e| {
        AppError::with_source(
            ErrorKind::StorageUnavailable,
            "Failed to commit transaction",
            e,
        )
    })
}

/// Insert the owner's EDIT permission row for a freshly created resource.
pub(crate) async fn insert_owner_permission(
    tx: &mut Transaction<'static, Postgres>,
    file_id: Option<docvault_core::types::DocumentId>,
    folder_id: Option<FolderId>,
    owner_id: UserId,
) -> AppResult<()> {
    sqlx::query("INSERT INTO permissions (file_id, folder_id, user_id, ability) VALUES ($1, $2, $3, $4)")
        .bind(file_id)
        .bind(folder_id)
        .bind(owner_id)
        .bind(Ability::Edit)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to create owner permission", e)
        })?;
    Ok(())
}

/// Read the cached path of a parent folder (`None` = root, empty path)
/// while locking the parent's folder row. Rename/move lock the folder rows
/// of the whole subtree, so taking the same row lock here serializes
/// creations and moves into a folder against a concurrent rename of any of
/// its ancestors — the path read below can never be mid-rewrite.
async fn locked_path(
    tx: &mut Transaction<'static, Postgres>,
    folder_id: Option<FolderId>,
) -> AppResult<String> {
    let Some(folder_id) = folder_id else {
        return Ok(path::ROOT_PATH.to_string());
    };

    sqlx::query_scalar::<_, String>(
        "SELECT pc.path FROM folders f \
         INNER JOIN path_cache pc ON pc.folder_id = f.id \
         WHERE f.id = $1 FOR UPDATE OF f",
    )
    .bind(folder_id)
    .fetch_optional(&mut **tx)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to read parent path", e))?
    .ok_or_else(|| AppError::not_found(format!("Folder {folder_id} not found")))
}

/// Fail with `Conflict` if a sibling folder already carries the name.
async fn ensure_no_sibling(
    tx: &mut Transaction<'static, Postgres>,
    parent_id: Option<FolderId>,
    name: &str,
    exclude: Option<FolderId>,
) -> AppResult<()> {
    let taken: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM folders \
         WHERE parent_id IS NOT DISTINCT FROM $1 AND name = $2 AND id IS DISTINCT FROM $3)",
    )
    .bind(parent_id)
    .bind(name)
    .bind(exclude)
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to check sibling names", e))?;

    if taken {
        return Err(AppError::conflict(format!(
            "A folder named '{name}' already exists here"
        )));
    }
    Ok(())
}

/// Collect a folder's subtree (itself included) and lock every row.
///
/// A recursive CTE gathers the ids, a second query takes the row locks,
/// and the ids are re-collected under those locks. A move that committed
/// between the collect and the lock can change the membership, so the
/// snapshot is only accepted once a collect agrees with the set already
/// locked; once every current member is locked, further membership changes
/// block on this transaction.
async fn lock_subtree(
    tx: &mut Transaction<'static, Postgres>,
    root: FolderId,
) -> AppResult<Vec<PathNode>> {
    for _ in 0..3 {
        let ids = collect_subtree_ids(tx, root).await?;

        let rows = sqlx::query_as::<_, PathNode>(
            "SELECT id, parent_id, name FROM folders WHERE id = ANY($1) FOR UPDATE",
        )
        .bind(&ids)
        .fetch_all(&mut **tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to lock subtree", e))?;

        if collect_subtree_ids(tx, root).await? == ids {
            return Ok(rows);
        }
    }

    Err(AppError::conflict(
        "Folder subtree changed concurrently; retry the operation",
    ))
}

async fn collect_subtree_ids(
    tx: &mut Transaction<'static, Postgres>,
    root: FolderId,
) -> AppResult<Vec<i64>> {
    let mut ids: Vec<i64> = sqlx::query_scalar(
        "WITH RECURSIVE subtree AS ( \
            SELECT id FROM folders WHERE id = $1 \
            UNION ALL \
            SELECT f.id FROM folders f INNER JOIN subtree s ON f.parent_id = s.id \
         ) SELECT id FROM subtree",
    )
    .bind(root)
    .fetch_all(&mut **tx)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to collect subtree", e))?;
    ids.sort_unstable();
    Ok(ids)
}

/// Whether `candidate` lies inside the subtree rooted at `root`
/// (the root itself included). Used for the in-transaction cycle check.
async fn is_in_subtree(
    tx: &mut Transaction<'static, Postgres>,
    root: FolderId,
    candidate: FolderId,
) -> AppResult<bool> {
    sqlx::query_scalar(
        "WITH RECURSIVE subtree AS ( \
            SELECT id FROM folders WHERE id = $1 \
            UNION ALL \
            SELECT f.id FROM folders f INNER JOIN subtree s ON f.parent_id = s.id \
         ) SELECT EXISTS(SELECT 1 FROM subtree WHERE id = $2)",
    )
    .bind(root)
    .bind(candidate)
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to run cycle check", e))
}

/// Write recomputed paths back to the cache.
async fn apply_path_updates(
    tx: &mut Transaction<'static, Postgres>,
    updates: Vec<(FolderId, String)>,
) -> AppResult<()> {
    for (folder_id, new_path) in updates {
        sqlx::query("UPDATE path_cache SET path = $2 WHERE folder_id = $1")
            .bind(folder_id)
            .bind(&new_path)
            .execute(&mut **tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to update cached path", e)
            })?;
    }
    Ok(())
}

/// Map insert/update failures, turning sibling-name unique violations into
/// conflicts.
fn map_insert_error(e: sqlx::Error, entity: &str, name: &str) -> AppError {
    match e {
        sqlx::Error::Database(ref db_err)
            if db_err.constraint() == Some("uniq_folders_parent_name") =>
        {
            AppError::conflict(format!("A folder named '{name}' already exists here"))
        }
        _ => AppError::with_source(ErrorKind::Database, format!("Failed to write {entity}"), e),
    }
}
