//! Integration tests for the folder hierarchy.

mod helpers;

use gallery_core::error::ErrorKind;
use gallery_entity::file::FilePatch;
use gallery_entity::folder::FolderPatch;

use helpers::{TestApp, png};

#[tokio::test]
async fn test_ensure_root_is_idempotent() {
    let app = TestApp::new().await;
    let first = app.services.folders.ensure_root(&app.ctx()).await.expect("root");
    let second = app.services.folders.ensure_root(&app.ctx()).await.expect("root");

    assert_eq!(first.id, second.id);
    assert!(first.is_root());
    assert_eq!(first.name, "/");
    assert_eq!(app.db.folder_count().await, 1);
}

#[tokio::test]
async fn test_breadcrumb_ends_with_target_and_links_parents() {
    let app = TestApp::new().await;
    let a = app.create_folder("root", "A").await;
    let b = app.create_folder(a.code_or_empty(), "B").await;
    let c = app.create_folder(b.code_or_empty(), "C").await;

    let listing = app
        .services
        .folders
        .list_folders(&app.ctx(), c.code_or_empty())
        .await
        .expect("list");

    let names: Vec<&str> = listing.hierarchy.iter().map(|h| h.name.as_str()).collect();
    assert_eq!(names, vec!["/", "A", "B", "C"]);
    assert_eq!(
        listing.hierarchy.last().map(|h| h.code.as_str()),
        Some(c.code_or_empty())
    );

    // Each element's parent is the previous element.
    for pair in listing.hierarchy.windows(2) {
        let child = app
            .services
            .folders
            .list_folders(&app.ctx(), &pair[1].code)
            .await
            .expect("child listing");
        let parent_code = &child.hierarchy[child.hierarchy.len() - 2].code;
        assert_eq!(parent_code, &pair[0].code);
    }
}

#[tokio::test]
async fn test_rename_shows_new_name_exactly_once() {
    let app = TestApp::new().await;
    let folder = app.create_folder("root", "Holiday").await;

    app.services
        .folders
        .patch_folder(
            &app.ctx(),
            folder.code_or_empty(),
            FolderPatch {
                name: Some("  Summer 2024 ".into()),
                ..FolderPatch::default()
            },
        )
        .await
        .expect("rename");

    let listing = app
        .services
        .folders
        .list_folders(&app.ctx(), "root")
        .await
        .expect("list");
    let matches = listing
        .folders
        .iter()
        .filter(|f| f.name == "Summer 2024")
        .count();
    assert_eq!(matches, 1);
    assert!(listing.folders.iter().all(|f| f.name != "Holiday"));
}

#[tokio::test]
async fn test_create_folder_sets_parent_has_child() {
    let app = TestApp::new().await;
    let parent = app.create_folder("root", "Parent").await;
    assert!(!parent.has_child);

    app.create_folder(parent.code_or_empty(), "Child").await;

    let listing = app
        .services
        .folders
        .list_folders(&app.ctx(), parent.code_or_empty())
        .await
        .expect("list");
    assert!(listing.folder.has_child);
    assert_eq!(listing.folders.len(), 1);
}

#[tokio::test]
async fn test_create_folder_validation() {
    let app = TestApp::new().await;

    let err = app
        .services
        .folders
        .create_folder(&app.ctx(), "missing-code", "X")
        .await
        .expect_err("unknown parent");
    assert!(err.is(ErrorKind::NotFound));

    let err = app
        .services
        .folders
        .create_folder(&app.ctx(), "root", "   ")
        .await
        .expect_err("empty name");
    assert!(err.is(ErrorKind::InvalidParam));
}

#[tokio::test]
async fn test_trashed_folder_is_listable_but_hidden_from_parent() {
    let app = TestApp::new().await;
    let a = app.create_folder("root", "A").await;

    let trashed = app
        .services
        .folders
        .delete_folder_temp(&app.ctx(), a.code_or_empty())
        .await
        .expect("trash");
    assert!(trashed.is_deleted());

    let listing = app
        .services
        .folders
        .list_folders(&app.ctx(), a.code_or_empty())
        .await
        .expect("trashed folder still lists");
    assert!(listing.folder.is_deleted());

    let root = app
        .services
        .folders
        .list_folders(&app.ctx(), "root")
        .await
        .expect("root");
    assert!(root.folders.is_empty());

    let trash = app
        .services
        .folders
        .list_trash_folders(&app.ctx())
        .await
        .expect("trash list");
    assert_eq!(trash.len(), 1);
    assert_eq!(trash[0].id, a.id);
}

#[tokio::test]
async fn test_root_cannot_be_trashed_moved_or_renamed() {
    let app = TestApp::new().await;
    let a = app.create_folder("root", "A").await;
    let ctx = app.ctx();

    let err = app
        .services
        .folders
        .delete_folder_temp(&ctx, "root")
        .await
        .expect_err("trash root");
    assert!(err.is(ErrorKind::InvalidParam));

    let err = app
        .services
        .folders
        .patch_folder(
            &ctx,
            "root",
            FolderPatch {
                parent_folder_code: Some(a.code_or_empty().to_string()),
                ..FolderPatch::default()
            },
        )
        .await
        .expect_err("move root");
    assert!(err.is(ErrorKind::InvalidParam));

    let err = app
        .services
        .folders
        .patch_folder(
            &ctx,
            "root",
            FolderPatch {
                name: Some("renamed".into()),
                ..FolderPatch::default()
            },
        )
        .await
        .expect_err("rename root");
    assert!(err.is(ErrorKind::InvalidParam));
}

#[tokio::test]
async fn test_move_into_descendant_is_rejected() {
    let app = TestApp::new().await;
    let a = app.create_folder("root", "A").await;
    let b = app.create_folder(a.code_or_empty(), "B").await;

    for target in [a.code_or_empty(), b.code_or_empty()] {
        let err = app
            .services
            .folders
            .patch_folder(
                &app.ctx(),
                a.code_or_empty(),
                FolderPatch {
                    parent_folder_code: Some(target.to_string()),
                    ..FolderPatch::default()
                },
            )
            .await
            .expect_err("cycle");
        assert!(err.is(ErrorKind::InvalidParam));
    }
}

#[tokio::test]
async fn test_move_updates_has_child_on_both_parents() {
    let app = TestApp::new().await;
    let a = app.create_folder("root", "A").await;
    let b = app.create_folder(a.code_or_empty(), "B").await;
    let c = app.create_folder("root", "C").await;

    let moved = app
        .services
        .folders
        .patch_folder(
            &app.ctx(),
            b.code_or_empty(),
            FolderPatch {
                parent_folder_code: Some(c.code_or_empty().to_string()),
                ..FolderPatch::default()
            },
        )
        .await
        .expect("move");
    assert_eq!(moved.parent_id, Some(c.id));

    let a_listing = app
        .services
        .folders
        .list_folders(&app.ctx(), a.code_or_empty())
        .await
        .expect("a");
    assert!(!a_listing.folder.has_child);
    assert!(a_listing.folders.is_empty());

    let c_listing = app
        .services
        .folders
        .list_folders(&app.ctx(), c.code_or_empty())
        .await
        .expect("c");
    assert!(c_listing.folder.has_child);
    assert_eq!(c_listing.folders.len(), 1);

    let b_listing = app
        .services
        .folders
        .list_folders(&app.ctx(), b.code_or_empty())
        .await
        .expect("b");
    let names: Vec<&str> = b_listing.hierarchy.iter().map(|h| h.name.as_str()).collect();
    assert_eq!(names, vec!["/", "C", "B"]);
}

#[tokio::test]
async fn test_favorite_folders() {
    let app = TestApp::new().await;
    let a = app.create_folder("root", "A").await;
    app.create_folder("root", "B").await;

    app.services
        .folders
        .patch_folder(
            &app.ctx(),
            a.code_or_empty(),
            FolderPatch {
                is_favorite: Some(true),
                ..FolderPatch::default()
            },
        )
        .await
        .expect("favorite");

    let favorites = app
        .services
        .folders
        .list_favorite_folders(&app.ctx())
        .await
        .expect("favorites");
    assert_eq!(favorites.len(), 1);
    assert_eq!(favorites[0].id, a.id);
}

#[tokio::test]
async fn test_restoring_a_file_restores_trashed_ancestors() {
    // root -> A (a1) -> B (b1) -> x.jpg; trash A; restore x.jpg.
    let app = TestApp::new().await;
    let a = app.create_folder("root", "A").await;
    let b = app.create_folder(a.code_or_empty(), "B").await;
    let x = app
        .upload_only(b.code_or_empty(), "x.jpg", "image/png", png(8, 8))
        .await;

    app.services
        .folders
        .delete_folder_temp(&app.ctx(), a.code_or_empty())
        .await
        .expect("trash A");

    let listing = app
        .services
        .folders
        .list_folders(&app.ctx(), a.code_or_empty())
        .await
        .expect("A still lists");
    assert!(listing.folder.is_deleted());

    // Trash is shallow: B and x.jpg keep their own deleted_at.
    let inner = app
        .services
        .folders
        .list_folders(&app.ctx(), b.code_or_empty())
        .await
        .expect("B still lists");
    assert!(inner.folder.deleted_at.is_none());
    let before = app.services.files.get_file(&app.ctx(), x.id).await.expect("x");
    assert!(before.deleted_at.is_none());

    let restored = app
        .services
        .files
        .patch_file(
            &app.ctx(),
            x.id,
            FilePatch {
                restore: true,
                ..FilePatch::default()
            },
        )
        .await
        .expect("restore x");
    assert!(!restored.is_deleted());

    for code in [a.code_or_empty(), b.code_or_empty()] {
        let listing = app
            .services
            .folders
            .list_folders(&app.ctx(), code)
            .await
            .expect("listing");
        assert!(!listing.folder.is_deleted(), "{code} should be restored");
    }
}

#[tokio::test]
async fn test_trash_is_shallow() {
    let app = TestApp::new().await;
    let ctx = app.ctx();
    let a = app.create_folder("root", "A").await;
    let b = app.create_folder(a.code_or_empty(), "B").await;
    let in_a = app.upload_only(a.code_or_empty(), "a.png", "image/png", png(4, 4)).await;
    let in_b = app.upload_only(b.code_or_empty(), "b.png", "image/png", png(4, 4)).await;

    app.services
        .folders
        .delete_folder_temp(&ctx, a.code_or_empty())
        .await
        .expect("trash A");

    let trash = app
        .services
        .folders
        .list_trash_folders(&ctx)
        .await
        .expect("trash");
    assert_eq!(trash.iter().map(|f| f.id).collect::<Vec<_>>(), vec![a.id]);

    let child = app
        .services
        .folders
        .list_folders(&ctx, b.code_or_empty())
        .await
        .expect("B")
        .folder;
    assert!(child.deleted_at.is_none());

    for file in [&in_a, &in_b] {
        let stored = app.services.files.get_file(&ctx, file.id).await.expect("file");
        assert!(stored.deleted_at.is_none(), "{} was flagged", stored.file_name);
    }
    assert!(
        app.services
            .files
            .list_trashcan_files(&ctx)
            .await
            .expect("trash can")
            .is_empty()
    );
}

#[tokio::test]
async fn test_trashed_folder_cannot_be_patched_without_restore() {
    let app = TestApp::new().await;
    let ctx = app.ctx();
    let a = app.create_folder("root", "A").await;
    app.services
        .folders
        .delete_folder_temp(&ctx, a.code_or_empty())
        .await
        .expect("trash A");

    let err = app
        .services
        .folders
        .patch_folder(
            &ctx,
            a.code_or_empty(),
            FolderPatch {
                name: Some("Renamed".into()),
                ..FolderPatch::default()
            },
        )
        .await
        .expect_err("trashed folder");
    assert!(err.is(ErrorKind::NotFound));

    let restored = app
        .services
        .folders
        .patch_folder(
            &ctx,
            a.code_or_empty(),
            FolderPatch {
                name: Some("Renamed".into()),
                restore: true,
                ..FolderPatch::default()
            },
        )
        .await
        .expect("rename with restore");
    assert_eq!(restored.name, "Renamed");
    assert!(!restored.is_deleted());
}

#[tokio::test]
async fn test_restore_three_levels_deep_leaves_root_untouched() {
    let app = TestApp::new().await;
    let ctx = app.ctx();
    let a = app.create_folder("root", "A").await;
    let b = app.create_folder(a.code_or_empty(), "B").await;
    let c = app.create_folder(b.code_or_empty(), "C").await;
    let file = app
        .upload_only(c.code_or_empty(), "deep.png", "image/png", png(4, 4))
        .await;

    let root_before = app
        .services
        .folders
        .list_folders(&ctx, "root")
        .await
        .expect("root")
        .folder;

    for code in [c.code_or_empty(), b.code_or_empty(), a.code_or_empty()] {
        app.services
            .folders
            .delete_folder_temp(&ctx, code)
            .await
            .expect("trash");
    }
    app.services
        .files
        .delete_file_temp(&ctx, file.id)
        .await
        .expect("trash file");

    let restored = app
        .services
        .files
        .patch_file(
            &ctx,
            file.id,
            FilePatch {
                restore: true,
                ..FilePatch::default()
            },
        )
        .await
        .expect("restore");
    assert!(restored.deleted_at.is_none());

    for code in [a.code_or_empty(), b.code_or_empty(), c.code_or_empty()] {
        let folder = app
            .services
            .folders
            .list_folders(&ctx, code)
            .await
            .expect("listing")
            .folder;
        assert!(folder.deleted_at.is_none());
    }

    let root_after = app
        .services
        .folders
        .list_folders(&ctx, "root")
        .await
        .expect("root")
        .folder;
    assert_eq!(root_before, root_after);
}

#[tokio::test]
async fn test_folder_restore_walks_upwards() {
    let app = TestApp::new().await;
    let ctx = app.ctx();
    let a = app.create_folder("root", "A").await;
    let b = app.create_folder(a.code_or_empty(), "B").await;

    app.services
        .folders
        .delete_folder_temp(&ctx, a.code_or_empty())
        .await
        .expect("trash A");
    app.services
        .folders
        .delete_folder_temp(&ctx, b.code_or_empty())
        .await
        .expect("trash B");

    let restored = app
        .services
        .folders
        .patch_folder(
            &ctx,
            b.code_or_empty(),
            FolderPatch {
                restore: true,
                ..FolderPatch::default()
            },
        )
        .await
        .expect("restore B");
    assert!(!restored.is_deleted());

    let trash = app
        .services
        .folders
        .list_trash_folders(&ctx)
        .await
        .expect("trash");
    assert!(trash.is_empty());
}

#[tokio::test]
async fn test_users_do_not_see_each_other() {
    let app = TestApp::new().await;
    let a = app.create_folder("root", "Private").await;

    let other = app.ctx_for(2);
    app.services.folders.ensure_root(&other).await.expect("root 2");

    let err = app
        .services
        .folders
        .list_folders(&other, a.code_or_empty())
        .await
        .expect_err("foreign folder");
    assert!(err.is(ErrorKind::NotFound));
}
