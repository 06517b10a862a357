use super::*;
use protocol::EntryKind;
use std::fs;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};

fn relative_paths(list: &LocalFileList) -> Vec<PathBuf> {
    list.iter().map(|entry| entry.relative_path().to_path_buf()).collect()
}

#[test]
fn empty_root_yields_nothing() {
    let temp = tempfile::tempdir().expect("tempdir");
    let list = LocalFileList::collect(temp.path()).expect("walk");
    assert!(list.is_empty());
}

#[test]
fn walk_is_preorder_and_sorted() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path();
    fs::create_dir_all(root.join("b/inner")).expect("dirs");
    fs::write(root.join("b/inner/z"), b"z").expect("file");
    fs::write(root.join("b/a"), b"a").expect("file");
    fs::write(root.join("a"), b"a").expect("file");
    fs::write(root.join("C"), b"c").expect("file");

    let list = LocalFileList::collect(root).expect("walk");
    assert_eq!(
        relative_paths(&list),
        [
            PathBuf::from("C"),
            PathBuf::from("a"),
            PathBuf::from("b"),
            PathBuf::from("b/a"),
            PathBuf::from("b/inner"),
            PathBuf::from("b/inner/z"),
        ]
    );
    let depths: Vec<usize> = list.iter().map(LocalEntry::depth).collect();
    assert_eq!(depths, [1, 1, 1, 2, 2, 3]);
}

#[test]
fn symlinks_are_reported_but_not_followed() {
    let temp = tempfile::tempdir().expect("tempdir");
    let outside = tempfile::tempdir().expect("tempdir");
    fs::write(outside.path().join("secret"), b"x").expect("file");
    symlink(outside.path(), temp.path().join("link")).expect("symlink");

    let list = LocalFileList::collect(temp.path()).expect("walk");
    assert_eq!(list.len(), 1);
    let entry = &list.entries()[0];
    assert_eq!(entry.kind(), EntryKind::Symlink);
    assert!(!entry.is_dir());
}

#[test]
fn parent_of_top_level_entry_is_dot() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::create_dir(temp.path().join("d")).expect("dir");
    fs::write(temp.path().join("d/f"), b"").expect("file");

    let list = LocalFileList::collect(temp.path()).expect("walk");
    assert_eq!(list.entries()[0].parent(), Path::new("."));
    assert_eq!(list.entries()[1].parent(), Path::new("d"));
    assert_eq!(list.entries()[1].file_name().unwrap(), "f");
}

#[test]
fn kinds_reflect_lstat() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::create_dir(temp.path().join("dir")).expect("dir");
    fs::write(temp.path().join("file"), b"data").expect("file");

    let list = LocalFileList::collect(temp.path()).expect("walk");
    let kinds: Vec<EntryKind> = list.iter().map(LocalEntry::kind).collect();
    assert_eq!(kinds, [EntryKind::Directory, EntryKind::Regular]);
}

#[test]
fn missing_root_is_an_error() {
    let temp = tempfile::tempdir().expect("tempdir");
    let missing = temp.path().join("missing");
    let error = LocalFileList::collect(&missing).unwrap_err();
    assert!(matches!(error.kind(), WalkErrorKind::RootMetadata { .. }));
    assert_eq!(error.path(), missing);
}

#[test]
fn file_root_is_rejected() {
    let temp = tempfile::tempdir().expect("tempdir");
    let file = temp.path().join("plain");
    fs::write(&file, b"").expect("file");
    let error = FileListWalker::new(&file).unwrap_err();
    assert!(matches!(error.kind(), WalkErrorKind::NotADirectory { .. }));
    assert!(error.to_string().contains("not a directory"));
}

#[test]
fn reverse_order_puts_children_before_parents() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::create_dir_all(temp.path().join("x/y")).expect("dirs");
    fs::write(temp.path().join("x/y/z"), b"").expect("file");

    let list = LocalFileList::collect(temp.path()).expect("walk");
    let reversed: Vec<PathBuf> = list
        .iter()
        .rev()
        .map(|entry| entry.relative_path().to_path_buf())
        .collect();
    assert_eq!(
        reversed,
        [PathBuf::from("x/y/z"), PathBuf::from("x/y"), PathBuf::from("x")]
    );
}
