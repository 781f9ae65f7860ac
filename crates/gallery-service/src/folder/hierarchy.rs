//! Tree helpers shared by the folder and file services.

use tracing::{debug, info};

use gallery_core::error::AppError;
use gallery_core::result::AppResult;
use gallery_core::types::FolderRef;
use gallery_database::FolderStore;
use gallery_entity::Scope;
use gallery_entity::folder::{Folder, FolderHierarchy};

/// Resolve a caller-supplied folder reference (`"root"` or a code).
pub async fn resolve_folder(
    folders: &dyn FolderStore,
    user_id: i64,
    reference: &str,
    scope: Scope,
) -> AppResult<Folder> {
    match FolderRef::parse(reference) {
        FolderRef::Root => folders
            .find_root(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("Root folder not found")),
        FolderRef::Code(code) => folders
            .find_by_code(user_id, code, scope)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Folder not found: {code}"))),
    }
}

/// Path from the root down to `folder`, `folder` itself last.
///
/// Fails if the stored parent chain is broken or does not end at the root.
pub async fn breadcrumb(folders: &dyn FolderStore, folder: &Folder) -> AppResult<Vec<FolderHierarchy>> {
    let mut chain = folders.find_ancestors(folder.user_id, folder.id).await?;
    chain.reverse();

    let linked = chain
        .windows(2)
        .all(|pair| pair[1].parent_id == Some(pair[0].id));
    let rooted = chain.first().is_some_and(Folder::is_root);
    let ends_here = chain.last().is_some_and(|f| f.id == folder.id);
    if !(linked && rooted && ends_here) {
        return Err(AppError::database(format!(
            "Broken parent chain for folder {}",
            folder.id
        )));
    }

    Ok(chain.iter().map(FolderHierarchy::from).collect())
}

/// Restore `folder_id` and every trashed folder above it, live folders in
/// between included. The root is never touched. Returns the ids that were
/// restored, nearest first.
pub async fn restore_upwards(
    folders: &dyn FolderStore,
    user_id: i64,
    folder_id: i64,
) -> AppResult<Vec<i64>> {
    let chain = folders.find_ancestors(user_id, folder_id).await?;
    let mut restored = Vec::new();

    for folder in chain.iter().filter(|f| !f.is_root() && f.is_deleted()) {
        if folders.restore(user_id, folder.id).await? {
            restored.push(folder.id);
        }
    }

    if !restored.is_empty() {
        info!(user_id, folder_id, restored = ?restored, "Restored trashed ancestors");
    }
    Ok(restored)
}

/// Recompute `has_child` of `folder_id` from the rows that remain.
pub async fn refresh_has_child(folders: &dyn FolderStore, user_id: i64, folder_id: i64) -> AppResult<()> {
    let has_child = !folders
        .list_children(user_id, folder_id, Scope::WithDeleted)
        .await?
        .is_empty();
    folders.set_has_child(user_id, folder_id, has_child).await?;
    debug!(user_id, folder_id, has_child, "has_child refreshed");
    Ok(())
}
