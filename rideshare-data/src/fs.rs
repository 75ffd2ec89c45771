//! Capability-based file helpers for dataset and database paths.
#![forbid(unsafe_code)]

use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};

/// Open a UTF-8 file path for reading using ambient authority.
pub(crate) fn open_utf8_file(path: &Utf8Path) -> io::Result<fs_utf8::File> {
    fs_utf8::File::open_ambient(path, ambient_authority())
}

/// Create every missing directory above `path`.
pub(crate) fn ensure_parent_dir(path: &Utf8Path) -> io::Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_str().is_empty() || parent == Utf8Path::new("/") {
        return Ok(());
    }

    let (base, relative) = split_ambient_base(parent);
    if relative.as_str().is_empty() {
        return Ok(());
    }
    fs_utf8::Dir::open_ambient_dir(base, ambient_authority())?.create_dir_all(&relative)
}

/// Absolute paths resolve from the filesystem root, relative ones from the
/// working directory.
fn split_ambient_base(parent: &Utf8Path) -> (&'static str, Utf8PathBuf) {
    match parent.strip_prefix("/") {
        Ok(relative) => ("/", relative.to_path_buf()),
        Err(_) => (".", parent.to_path_buf()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    #[case("/var/lib/rideshare", "/", "var/lib/rideshare")]
    #[case("data/db", ".", "data/db")]
    fn splits_ambient_base(#[case] parent: &str, #[case] base: &str, #[case] relative: &str) {
        let (actual_base, actual_relative) = split_ambient_base(Utf8Path::new(parent));
        assert_eq!(actual_base, base);
        assert_eq!(actual_relative, Utf8PathBuf::from(relative));
    }

    #[rstest]
    fn creates_nested_parents() {
        let temp = TempDir::new().expect("create temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf-8 path");
        let target = root.join("a/b/rideshare.db");

        ensure_parent_dir(&target).expect("create parents");

        assert!(root.join("a/b").is_dir());
    }
}
