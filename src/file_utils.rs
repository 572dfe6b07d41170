use std::fmt::Debug;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

// @module: File discovery, backups and atomic writes

// @const: Suffix appended to the full file name of a backup
pub const BACKUP_SUFFIX: &str = ".bak";

/// Storage used by the controller to read, back up and write one file
///
/// `FileManager` is the on-disk implementation. The controller holds the
/// store behind a trait object so that runs can be pointed at another one.
pub trait FileStore: Send + Sync + Debug {
    /// Read the whole file
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Keep `original` as the backup of `path`; `None` if one already exists
    fn backup(&self, path: &Path, original: &[u8]) -> io::Result<Option<PathBuf>>;

    /// Replace the content of `path`
    fn write(&self, path: &Path, content: &[u8]) -> io::Result<()>;
}

// @struct: File operations utility
#[derive(Debug, Clone, Copy, Default)]
pub struct FileManager;

impl FileStore for FileManager {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        Self::read_bytes(path)
    }

    fn backup(&self, path: &Path, original: &[u8]) -> io::Result<Option<PathBuf>> {
        Self::create_backup(path, original)
    }

    fn write(&self, path: &Path, content: &[u8]) -> io::Result<()> {
        Self::write_atomic(path, content)
    }
}

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_dir()
    }

    /// Lazily walk `root` for files with the given extension
    ///
    /// Only the top level is visited unless `recursive` is set. Entries come
    /// out sorted by file name within each directory, so the order is stable
    /// across runs. The extension is matched ASCII case-insensitively and may
    /// be given with or without its leading dot. Unreadable entries are
    /// logged and skipped. Symbolic links below `root` are not followed;
    /// they are skipped with a debug log. Every call walks the filesystem
    /// again.
    pub fn walk<P: AsRef<Path>>(
        root: P,
        extension: &str,
        recursive: bool,
    ) -> impl Iterator<Item = PathBuf> {
        let extension = extension.trim_start_matches('.').to_string();
        let mut walker = WalkDir::new(root.as_ref()).sort_by_file_name();
        if !recursive {
            walker = walker.max_depth(1);
        }

        walker
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping unreadable directory entry: {}", e);
                    None
                }
            })
            .filter(|entry| {
                if entry.depth() > 0 && entry.path_is_symlink() {
                    debug!("Skipping symbolic link: {}", entry.path().display());
                    return false;
                }
                entry.file_type().is_file()
            })
            .map(|entry| entry.into_path())
            .filter(move |path| Self::has_extension(path, &extension))
    }

    /// Collect `walk` into a vector
    pub fn find_files<P: AsRef<Path>>(root: P, extension: &str, recursive: bool) -> Vec<PathBuf> {
        Self::walk(root, extension, recursive).collect()
    }

    // @checks: Extension match, ignoring ASCII case
    pub fn has_extension<P: AsRef<Path>>(path: P, extension: &str) -> bool {
        path.as_ref()
            .extension()
            .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension))
    }

    /// Backup location for a file: the full file name plus `.bak`
    ///
    /// `words.TextGrid` is backed up as `words.TextGrid.bak`.
    pub fn backup_path<P: AsRef<Path>>(path: P) -> PathBuf {
        let mut name = path.as_ref().as_os_str().to_owned();
        name.push(BACKUP_SUFFIX);
        PathBuf::from(name)
    }

    /// Store `original` as the backup of `path`
    ///
    /// Returns the backup path when a backup was written, `None` when one
    /// already exists. An existing backup is never replaced, so running the
    /// tool twice keeps the first original. Anything other than a regular
    /// file at the backup path is an error. The content goes through a
    /// temporary file, so a failed backup never leaves a partial `.bak`.
    pub fn create_backup<P: AsRef<Path>>(path: P, original: &[u8]) -> io::Result<Option<PathBuf>> {
        let backup = Self::backup_path(&path);
        match fs::symlink_metadata(&backup) {
            Ok(meta) if meta.is_file() => {
                debug!("Backup already exists, keeping it: {:?}", backup);
                return Ok(None);
            }
            Ok(_) => {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    "backup path exists and is not a regular file",
                ));
            }
            Err(_) => {}
        }

        let mut temp = NamedTempFile::new_in(Self::parent_dir(&backup))?;
        temp.write_all(original)?;
        temp.as_file().sync_all()?;
        temp.persist_noclobber(&backup).map_err(|e| e.error)?;
        Ok(Some(backup))
    }

    /// Replace the content of `path` without ever leaving it half-written
    ///
    /// The content is written to a temporary file in the same directory and
    /// renamed over the target. The target's permissions are carried over.
    pub fn write_atomic<P: AsRef<Path>>(path: P, content: &[u8]) -> io::Result<()> {
        let path = path.as_ref();
        let permissions = fs::metadata(path).ok().map(|meta| meta.permissions());

        let mut temp = NamedTempFile::new_in(Self::parent_dir(path))?;
        temp.write_all(content)?;
        temp.as_file().sync_all()?;
        if let Some(permissions) = permissions {
            fs::set_permissions(temp.path(), permissions)?;
        }
        temp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Read a whole file
    pub fn read_bytes<P: AsRef<Path>>(path: P) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn parent_dir(path: &Path) -> &Path {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}
