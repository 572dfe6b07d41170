/*!
 * Tests for file utility functions
 */

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tgclean::file_utils::{FileManager, FileStore};
use crate::common;

fn names(paths: &[PathBuf], root: &Path) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
        .collect()
}

/// Test that symbolic links are skipped rather than followed
#[cfg(unix)]
#[test]
fn test_walk_withSymlinkedFile_shouldSkipLink() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    let outside = common::create_temp_dir()?;
    let target = common::create_textgrid(outside.path(), "elsewhere.TextGrid", &["x"])?;
    common::create_textgrid(root, "real.TextGrid", &["x"])?;
    std::os::unix::fs::symlink(&target, root.join("link.TextGrid"))?;

    let files = FileManager::find_files(root, "TextGrid", true);
    assert_eq!(names(&files, root), vec!["real.TextGrid"]);
    Ok(())
}

/// Test that the on-disk store reads, backs up and writes through FileManager
#[test]
fn test_file_store_withFileManager_shouldRoundTripOnDisk() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let file = common::create_test_file(temp_dir.path(), "a.TextGrid", "before")?;
    let store: &dyn FileStore = &FileManager;

    let original = store.read(&file)?;
    let backup = store.backup(&file, &original)?;
    store.write(&file, b"after")?;

    assert_eq!(backup, Some(FileManager::backup_path(&file)));
    assert_eq!(fs::read(FileManager::backup_path(&file))?, b"before");
    assert_eq!(fs::read(&file)?, b"after");
    Ok(())
}

/// Test that file_exists returns true for existing files
#[test]
fn test_file_exists_withExistingFile_shouldReturnTrue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let test_file = common::create_test_file(temp_dir.path(), "test_file_exists.tmp", "test content")?;
    assert!(FileManager::file_exists(&test_file));
    assert!(!FileManager::file_exists(temp_dir.path()));
    Ok(())
}

/// Test that dir_exists returns false for non-existent directories
#[test]
fn test_dir_exists_withNonExistentDir_shouldReturnFalse() {
    assert!(!FileManager::dir_exists("./non_existent_directory_12345"));
    assert!(FileManager::dir_exists("."));
}

/// Test that a non-recursive walk stays at the top level
#[test]
fn test_walk_withoutRecursion_shouldOnlyListTopLevel() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    common::create_test_file(root, "b.TextGrid", "")?;
    common::create_test_file(root, "a.TextGrid", "")?;
    common::create_test_file(root, "notes.txt", "")?;
    common::create_test_file(root, "sub/c.TextGrid", "")?;

    let files = FileManager::find_files(root, "TextGrid", false);
    assert_eq!(names(&files, root), vec!["a.TextGrid", "b.TextGrid"]);
    Ok(())
}

/// Test that a recursive walk finds nested files in a stable order
#[test]
fn test_walk_withRecursion_shouldFindNestedFilesSorted() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    common::create_test_file(root, "z.TextGrid", "")?;
    common::create_test_file(root, "sub/deeper/c.TextGrid", "")?;
    common::create_test_file(root, "sub/b.TextGrid", "")?;
    common::create_test_file(root, "a.TextGrid", "")?;

    let files = FileManager::find_files(root, "TextGrid", true);
    assert_eq!(
        names(&files, root),
        vec!["a.TextGrid", "sub/b.TextGrid", "sub/deeper/c.TextGrid", "z.TextGrid"]
    );

    // Walking again re-reads the filesystem
    common::create_test_file(root, "m.TextGrid", "")?;
    assert_eq!(FileManager::walk(root, "TextGrid", true).count(), 5);
    Ok(())
}

/// Test that the extension match ignores ASCII case and a leading dot
#[test]
fn test_walk_withMixedCaseExtension_shouldMatch() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    common::create_test_file(root, "a.textgrid", "")?;
    common::create_test_file(root, "b.TEXTGRID", "")?;
    common::create_test_file(root, "c.TextGrid.bak", "")?;

    let files = FileManager::find_files(root, ".TextGrid", false);
    assert_eq!(names(&files, root), vec!["a.textgrid", "b.TEXTGRID"]);
    Ok(())
}

/// Test that the backup path appends .bak to the full file name
#[test]
fn test_backup_path_withTextGrid_shouldAppendSuffix() {
    assert_eq!(
        FileManager::backup_path("/data/s01.TextGrid"),
        PathBuf::from("/data/s01.TextGrid.bak")
    );
}

/// Test that a backup is created once and never overwritten
#[test]
fn test_create_backup_withExistingBackup_shouldKeepFirst() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let file = common::create_test_file(temp_dir.path(), "a.TextGrid", "first")?;

    let backup = FileManager::create_backup(&file, b"first")?;
    assert_eq!(backup, Some(FileManager::backup_path(&file)));
    assert_eq!(fs::read_to_string(FileManager::backup_path(&file))?, "first");

    let again = FileManager::create_backup(&file, b"second")?;
    assert_eq!(again, None);
    assert_eq!(fs::read_to_string(FileManager::backup_path(&file))?, "first");
    Ok(())
}

/// Test that atomic writes replace content and leave no temporary files
#[test]
fn test_write_atomic_withExistingFile_shouldReplaceContent() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let file = common::create_test_file(temp_dir.path(), "a.TextGrid", "old content")?;

    FileManager::write_atomic(&file, b"new")?;
    assert_eq!(fs::read(&file)?, b"new");

    let entries: Vec<_> = fs::read_dir(temp_dir.path())?.collect::<std::io::Result<_>>()?;
    assert_eq!(entries.len(), 1);
    Ok(())
}

/// Test reading raw bytes
#[test]
fn test_read_bytes_withMissingFile_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    assert!(FileManager::read_bytes(temp_dir.path().join("missing.TextGrid")).is_err());
    let file = common::create_test_file(temp_dir.path(), "a.TextGrid", "abc")?;
    assert_eq!(FileManager::read_bytes(&file)?, b"abc");
    Ok(())
}
