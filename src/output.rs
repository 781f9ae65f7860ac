//! Table and JSON output for command results.

use serde::Serialize;
use tabled::{Table, Tabled};

use gallery_entity::file::File;
use gallery_entity::folder::Folder;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON output
    Json,
}

pub fn print_list<T: Serialize + Tabled>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if items.is_empty() {
                println!("No results found.");
            } else {
                println!("{}", Table::new(items));
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(items).unwrap_or_else(|_| "[]".to_string());
            println!("{json}");
        }
    }
}

pub fn print_item<T: Serialize + std::fmt::Debug>(item: &T, format: OutputFormat) {
    match format {
        OutputFormat::Table => println!("{item:#?}"),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(item).unwrap_or_else(|_| "{}".to_string());
            println!("{json}");
        }
    }
}

pub fn print_success(msg: &str) {
    println!("✓ {msg}");
}

#[derive(Debug, Serialize, Tabled)]
pub struct FolderRow {
    id: i64,
    code: String,
    name: String,
    favorite: bool,
    trashed: bool,
}

impl From<&Folder> for FolderRow {
    fn from(folder: &Folder) -> Self {
        Self {
            id: folder.id,
            code: folder.code_or_empty().to_string(),
            name: folder.name.clone(),
            favorite: folder.is_favorite,
            trashed: folder.is_deleted(),
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
pub struct FileRow {
    id: i64,
    code: String,
    name: String,
    size: i64,
    #[tabled(rename = "type")]
    #[serde(rename = "type")]
    file_type: String,
    previewable: bool,
    trashed: bool,
}

impl From<&File> for FileRow {
    fn from(file: &File) -> Self {
        Self {
            id: file.id,
            code: file.file_code.clone(),
            name: file.file_name.clone(),
            size: file.file_size,
            file_type: file.file_type.clone(),
            previewable: file.is_previewable,
            trashed: file.is_deleted(),
        }
    }
}
