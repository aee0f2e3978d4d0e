//! Filesystem-like option resolution against the project root.

use std::path::{Component, Path, PathBuf};

/// Resolve `raw` against `base` and normalize it lexically.
///
/// Absolute inputs ignore `base`. The filesystem is never touched, so the
/// directories do not need to exist yet.
#[must_use]
pub fn resolve_dir(base: &Path, raw: impl AsRef<Path>) -> PathBuf {
    let raw = raw.as_ref();
    if raw.is_absolute() {
        normalize_lexically(raw)
    } else {
        normalize_lexically(&base.join(raw))
    }
}

/// Collapse `.` and `..` components without consulting the filesystem.
#[must_use]
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {},
            Component::ParentDir => {
                let popped = matches!(
                    normalized.components().next_back(),
                    Some(Component::Normal(_))
                ) && normalized.pop();
                if !popped && !normalized.has_root() {
                    normalized.push(Component::ParentDir);
                }
            },
            other => normalized.push(other),
        }
    }
    normalized
}

/// Returns true when `candidate` is `container` or lies beneath it.
///
/// Containment is segment-aware: `/site/public-other` is not inside
/// `/site/public`.
#[must_use]
pub fn is_within(candidate: &Path, container: &Path) -> bool {
    normalize_lexically(candidate).starts_with(normalize_lexically(container))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_values_resolve_against_base() {
        let base = Path::new("/work/site");
        assert_eq!(
            resolve_dir(base, "./public/dist"),
            PathBuf::from("/work/site/public/dist")
        );
        assert_eq!(resolve_dir(base, "../shared"), PathBuf::from("/work/shared"));
        assert_eq!(resolve_dir(base, "/abs/out"), PathBuf::from("/abs/out"));
    }

    #[test]
    fn parent_components_stop_at_root() {
        assert_eq!(
            normalize_lexically(Path::new("/a/../../b")),
            PathBuf::from("/b")
        );
        assert_eq!(
            normalize_lexically(Path::new("a/../../b")),
            PathBuf::from("../b")
        );
    }

    #[test]
    fn containment_is_segment_aware() {
        let public = Path::new("/site/public");
        assert!(is_within(Path::new("/site/public/dist"), public));
        assert!(is_within(Path::new("/site/public"), public));
        assert!(!is_within(Path::new("/site/public-other"), public));
        assert!(!is_within(Path::new("/site/dist"), public));
    }
}
