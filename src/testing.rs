//! Testing utilities for findfiles
//!
//! This module provides an in-memory [`FileSystem`] so traversal and
//! selection can be tested without touching the disk.
//!
//! Only available when compiled with `cfg(test)`.

use std::collections::HashMap;
use std::ffi::OsString;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::time::TimeValue;
use crate::walk::{FileId, FileSystem, ObjectKind, ObjectMeta};

/// Maximum number of links resolved for one lookup
const MAX_LINK_HOPS: usize = 40;

#[derive(Debug, Clone)]
struct MockEntry {
    meta: ObjectMeta,
    children: Vec<OsString>,
    link_target: Option<PathBuf>,
    unreadable: bool,
}

/// In-memory filesystem built up with chained calls
///
/// Directory listings come back in insertion order. A parent directory
/// must be added before its entries.
///
/// # Examples
/// ```ignore
/// let fs = MockFs::new()
///     .dir("top", TimeValue::from_secs(1))
///     .file("top/a.txt", TimeValue::from_secs(2), 10);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    entries: HashMap<PathBuf, MockEntry>,
    next_ino: u64,
}

impl MockFs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(mut self, path: &str, kind: ObjectKind, modified: TimeValue, accessed: TimeValue, size: u64) -> Self {
        self.next_ino += 1;
        let path = PathBuf::from(path);
        if let (Some(parent), Some(name)) = (path.parent(), path.file_name())
            && let Some(dir) = self.entries.get_mut(parent)
        {
            dir.children.push(name.to_os_string());
        }
        self.entries.insert(
            path,
            MockEntry {
                meta: ObjectMeta {
                    kind,
                    accessed,
                    modified,
                    size,
                    id: Some(FileId {
                        dev: 1,
                        ino: self.next_ino,
                    }),
                },
                children: Vec::new(),
                link_target: None,
                unreadable: false,
            },
        );
        self
    }

    /// Add a regular file whose access time equals its modification time
    #[must_use]
    pub fn file(self, path: &str, modified: TimeValue, size: u64) -> Self {
        self.insert(path, ObjectKind::File, modified, modified, size)
    }

    /// Add a regular file with distinct access and modification times
    #[must_use]
    pub fn file_with_access(self, path: &str, modified: TimeValue, accessed: TimeValue, size: u64) -> Self {
        self.insert(path, ObjectKind::File, modified, accessed, size)
    }

    #[must_use]
    pub fn dir(self, path: &str, modified: TimeValue) -> Self {
        self.insert(path, ObjectKind::Directory, modified, modified, 4096)
    }

    /// Add a directory whose listing always fails
    #[must_use]
    pub fn unreadable_dir(self, path: &str, modified: TimeValue) -> Self {
        let mut fs = self.dir(path, modified);
        if let Some(entry) = fs.entries.get_mut(Path::new(path)) {
            entry.unreadable = true;
        }
        fs
    }

    /// Add a fifo, socket or device node
    #[must_use]
    pub fn other(self, path: &str, modified: TimeValue) -> Self {
        self.insert(path, ObjectKind::Other, modified, modified, 0)
    }

    /// Add a symbolic link; relative targets resolve from the mock root
    #[must_use]
    pub fn symlink(self, path: &str, target: &str, modified: TimeValue) -> Self {
        let size = target.len() as u64;
        let mut fs = self.insert(path, ObjectKind::Symlink, modified, modified, size);
        if let Some(entry) = fs.entries.get_mut(Path::new(path)) {
            entry.link_target = Some(PathBuf::from(target));
        }
        fs
    }

    fn not_found(path: &Path) -> io::Error {
        io::Error::new(io::ErrorKind::NotFound, format!("{}: no such entry", path.display()))
    }

    /// Resolve every component through links except, optionally, the last.
    fn resolve(&self, path: &Path, follow_last: bool) -> io::Result<PathBuf> {
        let components: Vec<Component<'_>> = path.components().collect();
        let mut current = PathBuf::new();
        let mut hops = 0;
        for (i, component) in components.iter().enumerate() {
            current.push(component);
            let is_last = i + 1 == components.len();
            if is_last && !follow_last {
                break;
            }
            while let Some(target) = self.entries.get(&current).and_then(|e| e.link_target.clone()) {
                hops += 1;
                if hops > MAX_LINK_HOPS {
                    return Err(io::Error::other("too many levels of symbolic links"));
                }
                current = target;
            }
        }
        Ok(current)
    }

    fn lookup(&self, path: &Path, follow_last: bool) -> io::Result<&MockEntry> {
        let resolved = self.resolve(path, follow_last)?;
        self.entries.get(&resolved).ok_or_else(|| Self::not_found(path))
    }
}

impl FileSystem for MockFs {
    fn symlink_metadata(&self, path: &Path) -> io::Result<ObjectMeta> {
        self.lookup(path, false).map(|e| e.meta)
    }

    fn metadata(&self, path: &Path) -> io::Result<ObjectMeta> {
        self.lookup(path, true).map(|e| e.meta)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<io::Result<OsString>>> {
        let entry = self.lookup(path, true)?;
        if entry.meta.kind != ObjectKind::Directory {
            return Err(io::Error::other(format!("{}: not a directory", path.display())));
        }
        if entry.unreadable {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"));
        }
        Ok(entry.children.iter().cloned().map(Ok).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_lists_children_in_insertion_order() {
        let fs = MockFs::new()
            .dir("d", TimeValue::ZERO)
            .file("d/z", TimeValue::ZERO, 0)
            .file("d/a", TimeValue::ZERO, 0);
        let names: Vec<_> = fs
            .read_dir(Path::new("d"))
            .unwrap()
            .into_iter()
            .map(Result::unwrap)
            .collect();
        assert_eq!(names, vec![OsString::from("z"), OsString::from("a")]);
    }

    #[test]
    fn test_mock_resolves_links_in_the_middle_of_paths() {
        let fs = MockFs::new()
            .dir("real", TimeValue::ZERO)
            .file("real/f", TimeValue::from_secs(7), 3)
            .symlink("alias", "real", TimeValue::ZERO);
        assert_eq!(fs.symlink_metadata(Path::new("alias")).unwrap().kind, ObjectKind::Symlink);
        assert_eq!(fs.metadata(Path::new("alias")).unwrap().kind, ObjectKind::Directory);
        let meta = fs.symlink_metadata(Path::new("alias/f")).unwrap();
        assert_eq!(meta.modified, TimeValue::from_secs(7));
    }

    #[test]
    fn test_mock_link_cycle_is_an_error() {
        let fs = MockFs::new()
            .symlink("a", "b", TimeValue::ZERO)
            .symlink("b", "a", TimeValue::ZERO);
        assert!(fs.metadata(Path::new("a")).is_err());
        assert!(fs.symlink_metadata(Path::new("a")).is_ok());
    }
}
