//! Filesystem access behind a trait
//!
//! The traverser only ever talks to a [`FileSystem`], so traversal can be
//! exercised against an in-memory tree in tests and against the real
//! filesystem through [`OsFileSystem`] everywhere else.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::Path;

use crate::time::{TimeField, TimeValue};

/// Raw classification of a filesystem object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    File,
    Directory,
    Symlink,
    Other,
}

/// Identity of an object on its device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId {
    pub dev: u64,
    pub ino: u64,
}

/// The subset of `stat` information the search needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectMeta {
    pub kind: ObjectKind,
    pub accessed: TimeValue,
    pub modified: TimeValue,
    pub size: u64,
    pub id: Option<FileId>,
}

impl ObjectMeta {
    /// The timestamp a criterion on `field` compares against
    #[must_use]
    pub const fn time(&self, field: TimeField) -> TimeValue {
        match field {
            TimeField::Access => self.accessed,
            TimeField::Modification => self.modified,
        }
    }
}

/// Directory listing and `stat` operations used by the traverser
pub trait FileSystem {
    /// Examine `path` without following a final symbolic link.
    ///
    /// # Errors
    /// Returns the underlying I/O error if the object cannot be examined.
    fn symlink_metadata(&self, path: &Path) -> io::Result<ObjectMeta>;

    /// Examine `path`, following symbolic links.
    ///
    /// # Errors
    /// Returns the underlying I/O error if the object or its link target
    /// cannot be examined.
    fn metadata(&self, path: &Path) -> io::Result<ObjectMeta>;

    /// List the entry names of a directory in the order the system yields them.
    ///
    /// # Errors
    /// Returns the underlying I/O error if the directory cannot be opened.
    /// Failures on individual entries are reported in place.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<io::Result<OsString>>>;
}

/// The real filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl OsFileSystem {
    fn convert(meta: &fs::Metadata) -> ObjectMeta {
        let file_type = meta.file_type();
        let kind = if file_type.is_symlink() {
            ObjectKind::Symlink
        } else if file_type.is_dir() {
            ObjectKind::Directory
        } else if file_type.is_file() {
            ObjectKind::File
        } else {
            ObjectKind::Other
        };
        let (accessed, modified, id) = Self::times_and_id(meta);
        ObjectMeta {
            kind,
            accessed,
            modified,
            size: meta.len(),
            id,
        }
    }

    #[cfg(unix)]
    fn times_and_id(meta: &fs::Metadata) -> (TimeValue, TimeValue, Option<FileId>) {
        use std::os::unix::fs::MetadataExt;
        (
            TimeValue::normalize(meta.atime(), meta.atime_nsec()),
            TimeValue::normalize(meta.mtime(), meta.mtime_nsec()),
            Some(FileId {
                dev: meta.dev(),
                ino: meta.ino(),
            }),
        )
    }

    #[cfg(not(unix))]
    fn times_and_id(meta: &fs::Metadata) -> (TimeValue, TimeValue, Option<FileId>) {
        let modified = meta
            .modified()
            .map(TimeValue::from_system_time)
            .unwrap_or_default();
        let accessed = meta
            .accessed()
            .map(TimeValue::from_system_time)
            .unwrap_or(modified);
        (accessed, modified, None)
    }
}

impl FileSystem for OsFileSystem {
    fn symlink_metadata(&self, path: &Path) -> io::Result<ObjectMeta> {
        fs::symlink_metadata(path).map(|m| Self::convert(&m))
    }

    fn metadata(&self, path: &Path) -> io::Result<ObjectMeta> {
        fs::metadata(path).map(|m| Self::convert(&m))
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<io::Result<OsString>>> {
        Ok(fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.file_name()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_os_filesystem_classifies_objects() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("data.bin");
        fs::write(&file, b"12345").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();

        let fs = OsFileSystem;
        let meta = fs.symlink_metadata(&file).unwrap();
        assert_eq!(meta.kind, ObjectKind::File);
        assert_eq!(meta.size, 5);

        let meta = fs.symlink_metadata(&dir.path().join("sub")).unwrap();
        assert_eq!(meta.kind, ObjectKind::Directory);

        let mut names: Vec<_> = fs
            .read_dir(dir.path())
            .unwrap()
            .into_iter()
            .map(|n| n.unwrap().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["data.bin", "sub"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_os_filesystem_symlink_is_not_followed() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("real")).unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(dir.path().join("real"), &link).unwrap();

        let fs = OsFileSystem;
        assert_eq!(fs.symlink_metadata(&link).unwrap().kind, ObjectKind::Symlink);
        assert_eq!(fs.metadata(&link).unwrap().kind, ObjectKind::Directory);
    }

    #[test]
    fn test_missing_path_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(OsFileSystem.symlink_metadata(&dir.path().join("missing")).is_err());
        assert!(OsFileSystem.read_dir(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_meta_time_by_field() {
        let meta = ObjectMeta {
            kind: ObjectKind::File,
            accessed: TimeValue::from_secs(2),
            modified: TimeValue::from_secs(1),
            size: 0,
            id: None,
        };
        assert_eq!(meta.time(TimeField::Access), TimeValue::from_secs(2));
        assert_eq!(meta.time(TimeField::Modification), TimeValue::from_secs(1));
    }
}
