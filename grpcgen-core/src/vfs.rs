//! In-memory output tree.
//!
//! Generation backends assemble their whole output into a
//! [`VirtualDirectory`] first; nothing touches the real filesystem until
//! [`VirtualDirectory::write_to`] flushes the finished tree in one pass.
//! This keeps emission testable without temp directories and makes a
//! failed run leave no partial output behind.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VfsError {
    /// Two generated files (or a file and a directory) claimed the same
    /// path. Always a generator bug, never a user error.
    #[error("duplicate entry `{path}` in generated output")]
    DuplicateEntry { path: String },

    /// A deep insert tried to descend through an existing file.
    #[error("`{path}` is a file, not a directory")]
    NotADirectory { path: String },

    #[error("empty path for generated file")]
    EmptyPath,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum VirtualEntry {
    File(String),
    Directory(VirtualDirectory),
}

/// An in-memory directory of generated files, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VirtualDirectory {
    entries: IndexMap<String, VirtualEntry>,
}

impl VirtualDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file directly under this directory.
    pub fn add_entry(
        &mut self,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<(), VfsError> {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return Err(VfsError::DuplicateEntry { path: name });
        }
        self.entries.insert(name, VirtualEntry::File(content.into()));
        Ok(())
    }

    /// Add a file at a nested path, creating intermediate directories.
    /// The last path segment is the file name.
    pub fn add_deep_entry<S: AsRef<str>>(
        &mut self,
        path: &[S],
        content: impl Into<String>,
    ) -> Result<(), VfsError> {
        let Some((name, dirs)) = path.split_last() else {
            return Err(VfsError::EmptyPath);
        };

        let mut current = self;
        for dir in dirs {
            let entry = current
                .entries
                .entry(dir.as_ref().to_string())
                .or_insert_with(|| VirtualEntry::Directory(VirtualDirectory::new()));
            match entry {
                VirtualEntry::Directory(directory) => current = directory,
                VirtualEntry::File(_) => {
                    return Err(VfsError::NotADirectory {
                        path: dir.as_ref().to_string(),
                    });
                }
            }
        }
        current.add_entry(name.as_ref(), content)
    }

    /// Look up a file by nested path.
    pub fn get_file<S: AsRef<str>>(&self, path: &[S]) -> Option<&str> {
        let (name, dirs) = path.split_last()?;
        let mut current = self;
        for dir in dirs {
            match current.entries.get(dir.as_ref()) {
                Some(VirtualEntry::Directory(directory)) => current = directory,
                _ => return None,
            }
        }
        match current.entries.get(name.as_ref()) {
            Some(VirtualEntry::File(content)) => Some(content),
            _ => None,
        }
    }

    /// Every file in the tree as a relative path plus its content,
    /// depth-first in insertion order.
    pub fn flat_entries(&self) -> Vec<(PathBuf, &str)> {
        let mut out = Vec::new();
        self.collect_flat(&PathBuf::new(), &mut out);
        out
    }

    fn collect_flat<'a>(&'a self, prefix: &Path, out: &mut Vec<(PathBuf, &'a str)>) {
        for (name, entry) in &self.entries {
            let path = prefix.join(name);
            match entry {
                VirtualEntry::File(content) => out.push((path, content)),
                VirtualEntry::Directory(directory) => directory.collect_flat(&path, out),
            }
        }
    }

    /// Flush the tree under `base`, creating directories as needed.
    pub fn write_to(&self, base: &Path) -> Result<(), VfsError> {
        for (relative, content) in self.flat_entries() {
            let path = base.join(relative);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, content)?;
        }
        Ok(())
    }
}
