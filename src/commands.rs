//! Command definitions and dispatch.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::info;

use gallery_core::config::AppConfig;
use gallery_core::error::AppError;
use gallery_core::result::AppResult;
use gallery_database::DatabasePool;
use gallery_entity::file::FileListFilter;
use gallery_media::FfmpegEncoder;
use gallery_service::{GalleryServices, RequestContext, UploadedPart};
use gallery_storage::build_object_store;

use crate::output::{self, FileRow, FolderRow, OutputFormat};

/// Web gallery maintenance commands
#[derive(Debug, Parser)]
#[command(name = "gallery", version, about, long_about = None)]
pub struct Cli {
    /// Configuration overlay to load from `config/<env>.toml`
    #[arg(short, long, default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Apply pending database migrations
    Migrate,
    /// Create a user's root folder and buckets if missing
    EnsureRoot {
        #[arg(short, long)]
        user: i64,
    },
    /// List the subfolders of a folder with its breadcrumb
    ListFolders {
        #[arg(short, long)]
        user: i64,
        /// Folder code, or `root`
        #[arg(long, default_value = "root")]
        folder: String,
    },
    /// List favorite or trashed files
    ListFiles {
        #[arg(short, long)]
        user: i64,
        #[arg(long)]
        favorite: bool,
        #[arg(long)]
        trash: bool,
    },
    /// Upload a local file and wait for its derivatives
    Upload {
        #[arg(short, long)]
        user: i64,
        /// Folder code, or `root`
        #[arg(long, default_value = "root")]
        folder: String,
        /// MIME type of the file
        #[arg(long)]
        content_type: String,
        path: PathBuf,
    },
    /// Issue a presigned download URL
    Presign {
        #[arg(short, long)]
        user: i64,
        /// File code
        code: String,
    },
    /// Permanently delete every trashed file
    EmptyTrash {
        #[arg(short, long)]
        user: i64,
    },
    /// Permanently delete a folder and everything below it
    PurgeFolder {
        #[arg(short, long)]
        user: i64,
        /// Folder code
        code: String,
    },
    /// Rebuild the thumbnail and HLS rendition of a file
    Regenerate {
        #[arg(short, long)]
        user: i64,
        file_id: i64,
    },
}

/// Live handles the commands run against.
struct Runtime {
    config: AppConfig,
    db: DatabasePool,
    services: GalleryServices,
    store: Arc<dyn gallery_core::traits::object_store::ObjectStore>,
}

impl Runtime {
    async fn connect(config: AppConfig) -> AppResult<Self> {
        let db = DatabasePool::connect(&config.database).await?;
        let (folders, files) = db.stores();
        let store = build_object_store(&config.storage).await?;
        let encoder = Arc::new(FfmpegEncoder::from_config(&config.pipeline));
        let services = GalleryServices::new(
            folders,
            files,
            encoder,
            &config.storage,
            config.pipeline.clone(),
        );
        Ok(Self {
            config,
            db,
            services,
            store,
        })
    }

    fn context(&self, user_id: i64) -> RequestContext {
        RequestContext::for_user(user_id, self.store.clone(), &self.config.storage.bucket_prefix)
    }
}

impl Cli {
    pub async fn execute(&self, config: AppConfig) -> AppResult<()> {
        info!(version = env!("CARGO_PKG_VERSION"), command = ?self.command, "Starting gallery");

        if let Command::Migrate = self.command {
            let db = DatabasePool::connect(&config.database).await?;
            db.migrate().await?;
            db.close().await;
            output::print_success("Migrations applied");
            return Ok(());
        }

        let rt = Runtime::connect(config).await?;
        let result = self.dispatch(&rt).await;

        if !rt.services.pipeline.wait_idle(Duration::from_secs(30)).await {
            tracing::warn!("Exiting with derivative pipelines still running");
        }
        rt.db.close().await;
        result
    }

    async fn dispatch(&self, rt: &Runtime) -> AppResult<()> {
        let format = self.format;
        let services = &rt.services;

        match &self.command {
            Command::Migrate => Ok(()),
            Command::EnsureRoot { user } => {
                let ctx = rt.context(*user);
                ctx.bucket.ensure_buckets().await?;
                let root = services.folders.ensure_root(&ctx).await?;
                output::print_list(&[FolderRow::from(&root)], format);
                Ok(())
            }
            Command::ListFolders { user, folder } => {
                let ctx = rt.context(*user);
                let listing = services.folders.list_folders(&ctx, folder).await?;
                let path: Vec<&str> = listing.hierarchy.iter().map(|h| h.name.as_str()).collect();
                println!("{}", path.join(" > "));
                let rows: Vec<FolderRow> = listing.folders.iter().map(FolderRow::from).collect();
                output::print_list(&rows, format);
                Ok(())
            }
            Command::ListFiles {
                user,
                favorite,
                trash,
            } => {
                let ctx = rt.context(*user);
                let files = services
                    .files
                    .list_files(
                        &ctx,
                        FileListFilter {
                            is_favorite: *favorite,
                            is_trash: *trash,
                        },
                    )
                    .await?;
                let rows: Vec<FileRow> = files.iter().map(FileRow::from).collect();
                output::print_list(&rows, format);
                Ok(())
            }
            Command::Upload {
                user,
                folder,
                content_type,
                path,
            } => {
                let ctx = rt.context(*user);
                let data = tokio::fs::read(path).await?;
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .ok_or_else(|| AppError::invalid_param("Upload path has no file name"))?;

                let (file, handle) = services
                    .uploads
                    .process_upload(
                        &ctx,
                        folder,
                        UploadedPart {
                            file_name,
                            content_type: content_type.clone(),
                            data: data.into(),
                        },
                    )
                    .await?;
                output::print_list(&[FileRow::from(&file)], format);

                if let Some(handle) = handle {
                    let report = handle
                        .await
                        .map_err(|e| AppError::internal(format!("Pipeline task failed: {e}")))?;
                    println!("pipeline: {} (thumbnail: {:?}, hls: {:?})", report.state, report.thumbnail, report.hls);
                }
                Ok(())
            }
            Command::Presign { user, code } => {
                let ctx = rt.context(*user);
                let url = services.downloads.presigned_url(&ctx, code).await?;
                println!("{url}");
                Ok(())
            }
            Command::EmptyTrash { user } => {
                let ctx = rt.context(*user);
                let removed = services.files.empty_trash_can(&ctx).await?;
                output::print_success(&format!("Removed {} file(s)", removed.len()));
                Ok(())
            }
            Command::PurgeFolder { user, code } => {
                let ctx = rt.context(*user);
                let deleted = services.folders.delete_folder_permanent(&ctx, code).await?;
                output::print_item(&deleted, format);
                Ok(())
            }
            Command::Regenerate { user, file_id } => {
                let ctx = rt.context(*user);
                let report = services.previews.regenerate(&ctx, *file_id).await?;
                println!("pipeline: {} (thumbnail: {:?}, hls: {:?})", report.state, report.thumbnail, report.hls);
                Ok(())
            }
        }
    }
}
