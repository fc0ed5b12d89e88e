//! Depth-first traversal of command-line targets
//!
//! The [`Traverser`] walks one target at a time and hands every object it
//! reaches to a visitor exactly once. Failures on individual objects are
//! logged and counted, never propagated: a subtree that cannot be read is
//! skipped and the walk carries on with its siblings. Only an error returned
//! by the visitor itself stops the walk.
//!
//! # Depth rules
//!
//! - The target itself is depth 0. A directory target is always expanded.
//! - Below that, a directory is expanded only in recursive mode and only while
//!   its depth is below the maximum depth.
//!
//! # Symbolic links
//!
//! Classification happens in one place, [`Traverser::classify`]. A link is
//! resolved when links are followed, or when it is a top-level target that was
//! given with a trailing separator and points at a directory. Otherwise it is
//! an "other" object.

pub mod fs;

pub use fs::{FileId, FileSystem, ObjectKind, ObjectMeta, OsFileSystem};

use std::path::{Path, PathBuf};

/// Options that stay fixed for the walk of one target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WalkOptions {
    pub recursive: bool,
    pub max_depth: Option<usize>,
    pub follow_symlinks: bool,
}

/// Per-call traversal state, passed down by value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraversalContext {
    pub depth: usize,
    pub max_depth: Option<usize>,
    pub follow_symlinks: bool,
    pub recursive: bool,
}

impl TraversalContext {
    #[must_use]
    pub const fn root(options: &WalkOptions) -> Self {
        Self {
            depth: 0,
            max_depth: options.max_depth,
            follow_symlinks: options.follow_symlinks,
            recursive: options.recursive,
        }
    }

    /// Context for the entries of a directory at this level
    #[must_use]
    pub const fn descend(&self) -> Self {
        Self {
            depth: self.depth + 1,
            ..*self
        }
    }

    /// Whether a directory at this level gets expanded
    #[must_use]
    pub const fn may_expand(&self) -> bool {
        if self.depth == 0 {
            return true;
        }
        if !self.recursive {
            return false;
        }
        match self.max_depth {
            Some(max) => self.depth < max,
            None => true,
        }
    }
}

/// An object handed to the visitor
#[derive(Debug, Clone, Copy)]
pub struct Visit<'a> {
    pub path: &'a Path,
    /// `File`, `Directory` or `Other`; followed links take their target's kind
    pub kind: ObjectKind,
    pub meta: &'a ObjectMeta,
    pub depth: usize,
}

/// Counters for one or more walks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkStats {
    pub visited: usize,
    pub errors: usize,
    pub pruned: usize,
}

/// Result of classifying one path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classified {
    pub kind: ObjectKind,
    pub meta: ObjectMeta,
}

/// Remove trailing separators, keeping a lone root separator.
///
/// Returns the trimmed path and whether anything was removed.
#[must_use]
pub fn strip_trailing_separators(target: &str) -> (&str, bool) {
    let trimmed = target.trim_end_matches(std::path::is_separator);
    if trimmed.is_empty() {
        // "/" or "///" is the root itself
        let root_len = target.chars().next().map_or(0, char::len_utf8);
        return (&target[..root_len], target.len() > root_len);
    }
    (trimmed, trimmed.len() != target.len())
}

/// Depth-first walker over a [`FileSystem`]
#[derive(Debug)]
pub struct Traverser<'a, F: FileSystem> {
    fs: &'a F,
    options: WalkOptions,
    ancestors: Vec<FileId>,
    stats: WalkStats,
}

impl<'a, F: FileSystem> Traverser<'a, F> {
    #[must_use]
    pub const fn new(fs: &'a F, options: WalkOptions) -> Self {
        Self {
            fs,
            options,
            ancestors: Vec::new(),
            stats: WalkStats {
                visited: 0,
                errors: 0,
                pruned: 0,
            },
        }
    }

    #[must_use]
    pub const fn stats(&self) -> WalkStats {
        self.stats
    }

    #[must_use]
    pub const fn options(&self) -> WalkOptions {
        self.options
    }

    /// Use different options for the walks that follow
    pub fn set_options(&mut self, options: WalkOptions) {
        self.options = options;
    }

    /// Record a recoverable failure that happened outside the walk itself
    pub fn record_error(&mut self) {
        self.stats.errors += 1;
    }

    /// Classify `path` into the kind the traversal should treat it as.
    ///
    /// # Errors
    /// Returns the I/O error if `path` itself cannot be examined.
    pub fn classify(&self, path: &Path, ctx: &TraversalContext, trailing_separator: bool) -> std::io::Result<Classified> {
        let meta = self.fs.symlink_metadata(path)?;
        if meta.kind != ObjectKind::Symlink {
            return Ok(Classified { kind: meta.kind, meta });
        }

        let as_other = Classified {
            kind: ObjectKind::Other,
            meta,
        };
        let resolve_dir_only = ctx.depth == 0 && trailing_separator;
        if !ctx.follow_symlinks && !resolve_dir_only {
            return Ok(as_other);
        }

        match self.fs.metadata(path) {
            Ok(target) if ctx.follow_symlinks => {
                tracing::debug!("following link '{}'", path.display());
                Ok(Classified {
                    kind: target.kind,
                    meta: target,
                })
            }
            Ok(target) if target.kind == ObjectKind::Directory => {
                tracing::debug!("resolving '{}' through its trailing separator", path.display());
                Ok(Classified {
                    kind: ObjectKind::Directory,
                    meta: target,
                })
            }
            Ok(_) => Ok(as_other),
            Err(e) => {
                tracing::debug!("dangling link '{}': {e}", path.display());
                Ok(as_other)
            }
        }
    }

    /// Walk one command-line target.
    ///
    /// # Errors
    /// Returns the first error produced by `visit`; filesystem failures are
    /// logged and counted instead.
    pub fn walk<E, V>(&mut self, target: &str, visit: &mut V) -> Result<(), E>
    where
        V: FnMut(Visit<'_>) -> Result<(), E>,
    {
        let (trimmed, trailing) = strip_trailing_separators(target);
        let ctx = TraversalContext::root(&self.options);
        self.ancestors.clear();
        self.visit_path(Path::new(trimmed), ctx, trailing, visit)
    }

    fn visit_path<E, V>(&mut self, path: &Path, ctx: TraversalContext, trailing: bool, visit: &mut V) -> Result<(), E>
    where
        V: FnMut(Visit<'_>) -> Result<(), E>,
    {
        let classified = match self.classify(path, &ctx, trailing) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!("Cannot access '{}': {e}", path.display());
                self.stats.errors += 1;
                return Ok(());
            }
        };
        self.stats.visited += 1;

        visit(Visit {
            path,
            kind: classified.kind,
            meta: &classified.meta,
            depth: ctx.depth,
        })?;

        if classified.kind != ObjectKind::Directory {
            return Ok(());
        }
        if !ctx.may_expand() {
            tracing::debug!("not descending into '{}' at depth {}", path.display(), ctx.depth);
            self.stats.pruned += 1;
            return Ok(());
        }
        self.visit_directory(path, &classified.meta, ctx, visit)
    }

    fn visit_directory<E, V>(&mut self, path: &Path, meta: &ObjectMeta, ctx: TraversalContext, visit: &mut V) -> Result<(), E>
    where
        V: FnMut(Visit<'_>) -> Result<(), E>,
    {
        if let Some(id) = meta.id {
            if self.ancestors.contains(&id) {
                tracing::warn!("Filesystem loop detected at '{}', not descending", path.display());
                self.stats.errors += 1;
                return Ok(());
            }
            self.ancestors.push(id);
        }

        let result = self.visit_entries(path, ctx, visit);

        if meta.id.is_some() {
            self.ancestors.pop();
        }
        result
    }

    fn visit_entries<E, V>(&mut self, path: &Path, ctx: TraversalContext, visit: &mut V) -> Result<(), E>
    where
        V: FnMut(Visit<'_>) -> Result<(), E>,
    {
        let entries = match self.fs.read_dir(path) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Cannot open directory '{}': {e}", path.display());
                self.stats.errors += 1;
                return Ok(());
            }
        };

        let child_ctx = ctx.descend();
        for entry in entries {
            match entry {
                Ok(name) => {
                    if name == "." || name == ".." {
                        continue;
                    }
                    let child: PathBuf = path.join(&name);
                    self.visit_path(&child, child_ctx, false, visit)?;
                }
                Err(e) => {
                    tracing::warn!("Cannot read entry in '{}': {e}", path.display());
                    self.stats.errors += 1;
                }
            }
        }
        Ok(())
    }
}
