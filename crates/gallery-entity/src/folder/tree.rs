//! Id-keyed folder arena used for subtree walks.
//!
//! Nodes reference each other by folder id only; the arena owns every
//! folder and the files directly inside it.

use std::collections::HashMap;

use crate::file::File;

use super::model::Folder;

/// One folder of the arena with the ids of its children and its own files.
#[derive(Debug, Clone)]
pub struct ArenaNode {
    pub folder: Folder,
    pub children: Vec<i64>,
    pub files: Vec<File>,
}

/// A loaded subtree, rooted at `root_id`.
#[derive(Debug, Clone)]
pub struct FolderArena {
    root_id: i64,
    nodes: HashMap<i64, ArenaNode>,
}

impl FolderArena {
    /// Start an arena with a single root node.
    pub fn new(root: Folder) -> Self {
        let root_id = root.id;
        let mut nodes = HashMap::new();
        nodes.insert(
            root_id,
            ArenaNode {
                folder: root,
                children: Vec::new(),
                files: Vec::new(),
            },
        );
        Self { root_id, nodes }
    }

    pub fn root_id(&self) -> i64 {
        self.root_id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&ArenaNode> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: i64) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Attach a folder under its parent.
    ///
    /// Returns `false` (and attaches nothing) when the parent is not in the
    /// arena or the folder is already present, so a malformed parent chain
    /// can never create a cycle.
    pub fn attach_folder(&mut self, folder: Folder) -> bool {
        let Some(parent_id) = folder.parent_id else {
            return false;
        };
        if self.nodes.contains_key(&folder.id) {
            return false;
        }
        let Some(parent) = self.nodes.get_mut(&parent_id) else {
            return false;
        };
        parent.children.push(folder.id);
        self.nodes.insert(
            folder.id,
            ArenaNode {
                folder,
                children: Vec::new(),
                files: Vec::new(),
            },
        );
        true
    }

    /// Record the files that live directly in `folder_id`.
    pub fn attach_files(&mut self, folder_id: i64, files: Vec<File>) {
        if let Some(node) = self.nodes.get_mut(&folder_id) {
            node.files.extend(files);
        }
    }

    /// Folder ids with every child before its parent; the root comes last.
    pub fn post_order(&self) -> Vec<i64> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![(self.root_id, false)];

        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                order.push(id);
                continue;
            }
            stack.push((id, true));
            if let Some(node) = self.nodes.get(&id) {
                for child in node.children.iter().rev() {
                    stack.push((*child, false));
                }
            }
        }

        order
    }

    /// Total number of files across the subtree.
    pub fn file_count(&self) -> usize {
        self.nodes.values().map(|n| n.files.len()).sum()
    }
}
