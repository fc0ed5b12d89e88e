//! The predicate deciding which visited objects are recorded
//!
//! An object is accepted when its kind is enabled, its name passes the
//! [`PatternChain`], and its relevant time satisfies the active
//! [`SelectionCriterion`] if there is one.

use std::ffi::OsStr;
use std::path::Path;

use crate::patterns::PatternChain;
use crate::time::{SelectionCriterion, TimeField, TimeValue};
use crate::walk::{ObjectKind, ObjectMeta};

/// Which kinds of object are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TypeFilter {
    pub files: bool,
    pub directories: bool,
    pub others: bool,
}

impl TypeFilter {
    #[must_use]
    pub const fn new(files: bool, directories: bool, others: bool) -> Self {
        Self {
            files,
            directories,
            others,
        }
    }

    /// Whether at least one kind is enabled
    #[must_use]
    pub const fn any(&self) -> bool {
        self.files || self.directories || self.others
    }

    /// Whether objects of `kind` are reported.
    ///
    /// Unresolved links count as "other" objects.
    #[must_use]
    pub const fn allows(&self, kind: ObjectKind) -> bool {
        match kind {
            ObjectKind::File => self.files,
            ObjectKind::Directory => self.directories,
            ObjectKind::Symlink | ObjectKind::Other => self.others,
        }
    }
}

/// The name a pattern is matched against: the final path component, or the
/// whole path when it has none (e.g. `/`).
#[must_use]
pub fn match_name(path: &Path) -> &OsStr {
    path.file_name().unwrap_or(path.as_os_str())
}

/// Combined name, kind and time predicate
#[derive(Debug, Default)]
pub struct Selector {
    chain: PatternChain,
    criterion: Option<SelectionCriterion>,
    types: TypeFilter,
}

impl Selector {
    #[must_use]
    pub const fn new(chain: PatternChain, criterion: Option<SelectionCriterion>, types: TypeFilter) -> Self {
        Self {
            chain,
            criterion,
            types,
        }
    }

    #[must_use]
    pub const fn types(&self) -> TypeFilter {
        self.types
    }

    #[must_use]
    pub const fn criterion(&self) -> Option<&SelectionCriterion> {
        self.criterion.as_ref()
    }

    /// The time field that is compared and recorded; modification time
    /// unless an access-time criterion is active.
    #[must_use]
    pub fn relevant_field(&self) -> TimeField {
        self.criterion.map(|c| c.field).unwrap_or_default()
    }

    /// The time recorded for an object
    #[must_use]
    pub fn relevant_time(&self, meta: &ObjectMeta) -> TimeValue {
        meta.time(self.relevant_field())
    }

    /// Decide whether an object is recorded.
    #[must_use]
    pub fn accepts(&self, path: &Path, kind: ObjectKind, meta: &ObjectMeta) -> bool {
        if !self.types.allows(kind) {
            return false;
        }
        if !self.chain.matches(match_name(path).as_encoded_bytes()) {
            return false;
        }
        self.criterion
            .as_ref()
            .is_none_or(|c| c.accepts(&meta.time(c.field)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::Polarity;
    use crate::time::Direction;

    fn meta(kind: ObjectKind, modified: i64, accessed: i64) -> ObjectMeta {
        ObjectMeta {
            kind,
            accessed: TimeValue::from_secs(accessed),
            modified: TimeValue::from_secs(modified),
            size: 0,
            id: None,
        }
    }

    fn txt_chain() -> PatternChain {
        let mut chain = PatternChain::default();
        chain.initialize(r"\.txt$", Polarity::Include, false).unwrap();
        chain
    }

    #[test]
    fn test_type_filter() {
        let filter = TypeFilter::new(true, false, false);
        assert!(filter.any());
        assert!(filter.allows(ObjectKind::File));
        assert!(!filter.allows(ObjectKind::Directory));
        assert!(!filter.allows(ObjectKind::Other));
        assert!(!TypeFilter::default().any());
        assert!(TypeFilter::new(false, false, true).allows(ObjectKind::Symlink));
    }

    #[test]
    fn test_match_name_uses_last_component() {
        assert_eq!(match_name(Path::new("dir/sub/a.txt")), "a.txt");
        assert_eq!(match_name(Path::new("a.txt")), "a.txt");
        assert_eq!(match_name(Path::new("/")), "/");
    }

    #[test]
    fn test_pattern_applies_to_basename_only() {
        let selector = Selector::new(txt_chain(), None, TypeFilter::new(true, true, true));
        let m = meta(ObjectKind::File, 0, 0);
        assert!(selector.accepts(Path::new("x.txt.d/a.txt"), ObjectKind::File, &m));
        assert!(!selector.accepts(Path::new("a.txt.d/b.log"), ObjectKind::File, &m));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_names_are_matched_exactly() {
        use std::os::unix::ffi::OsStrExt;

        let mut chain = PatternChain::default();
        chain.initialize(r"(?-u)^\xFF", Polarity::Include, false).unwrap();
        let selector = Selector::new(chain, None, TypeFilter::new(true, false, false));
        let m = meta(ObjectKind::File, 0, 0);

        let raw = Path::new(OsStr::from_bytes(b"dir/\xFFname"));
        assert!(selector.accepts(raw, ObjectKind::File, &m));
        assert!(!selector.accepts(Path::new("dir/\u{FFFD}name"), ObjectKind::File, &m));
    }

    #[test]
    fn test_disabled_kind_is_rejected() {
        let selector = Selector::new(PatternChain::default(), None, TypeFilter::new(true, false, false));
        assert!(!selector.accepts(Path::new("d"), ObjectKind::Directory, &meta(ObjectKind::Directory, 0, 0)));
    }

    #[test]
    fn test_criterion_uses_its_field() {
        let criterion = SelectionCriterion::new(
            TimeField::Access,
            TimeValue::from_secs(100),
            Direction::NewerOrEqual,
        );
        let selector = Selector::new(PatternChain::default(), Some(criterion), TypeFilter::new(true, false, false));
        assert_eq!(selector.relevant_field(), TimeField::Access);

        // old mtime, recent atime
        let m = meta(ObjectKind::File, 10, 150);
        assert!(selector.accepts(Path::new("f"), ObjectKind::File, &m));
        assert_eq!(selector.relevant_time(&m), TimeValue::from_secs(150));

        let m = meta(ObjectKind::File, 150, 10);
        assert!(!selector.accepts(Path::new("f"), ObjectKind::File, &m));
    }

    #[test]
    fn test_no_criterion_records_modification_time() {
        let selector = Selector::default();
        assert_eq!(selector.relevant_field(), TimeField::Modification);
        let m = meta(ObjectKind::File, 7, 9);
        assert_eq!(selector.relevant_time(&m), TimeValue::from_secs(7));
    }
}
