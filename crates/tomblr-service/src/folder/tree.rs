//! Arena of a user's folders, keyed by id, for subtree walks.

use std::collections::HashMap;

use tomblr_core::types::FolderId;
use tomblr_entity::folder::Folder;

/// Parent-to-children index over a flat folder list.
#[derive(Debug, Default)]
pub struct FolderArena {
    children: HashMap<FolderId, Vec<FolderId>>,
    known: HashMap<FolderId, Option<FolderId>>,
}

impl FolderArena {
    /// Index `folders` by parent.
    pub fn build(folders: &[Folder]) -> Self {
        let mut arena = Self::default();
        for folder in folders {
            arena.known.insert(folder.id, folder.parent_id);
            if let Some(parent) = folder.parent_id {
                arena.children.entry(parent).or_default().push(folder.id);
            }
        }
        arena
    }

    /// Whether `id` is in the arena.
    pub fn contains(&self, id: FolderId) -> bool {
        self.known.contains_key(&id)
    }

    /// `root` followed by every folder beneath it, depth first.
    ///
    /// Walks with an explicit stack; a visited set stops the walk if the
    /// input ever contains a cycle.
    pub fn subtree(&self, root: FolderId) -> Vec<FolderId> {
        if !self.contains(root) {
            return Vec::new();
        }
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            out.push(current);
            if let Some(kids) = self.children.get(&current) {
                stack.extend(kids.iter().rev().copied());
            }
        }
        out
    }
}
