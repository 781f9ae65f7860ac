//! Client-facing folder handles.

use rand::Rng;

/// Folder reference that resolves to the caller's root folder.
pub const ROOT_SENTINEL: &str = "root";

const CODE_ALPHABET: &[u8] = b"_-0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const CODE_LENGTH: usize = 21;

/// A parsed folder reference as supplied by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderRef<'a> {
    /// The `"root"` sentinel.
    Root,
    /// A non-root folder code.
    Code(&'a str),
}

impl<'a> FolderRef<'a> {
    pub fn parse(raw: &'a str) -> Self {
        if raw == ROOT_SENTINEL {
            Self::Root
        } else {
            Self::Code(raw)
        }
    }
}

/// Generate a new random folder code (21 URL-safe characters).
///
/// Uniqueness is enforced by the store; callers regenerate on conflict.
pub fn generate_folder_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}
