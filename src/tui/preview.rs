//! Preview content provider
//!
//! Reads at most a fixed number of bytes from the file under the cursor
//! and keeps recently shown files in an LRU cache so moving through
//! results does not re-read the same file.

use lru::LruCache;
use std::fs::{self, File};
use std::io::{self, Read};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Default cap on bytes read per preview
pub const DEFAULT_PREVIEW_BYTES: u64 = 64 * 1024;

/// Number of file contents kept around for instant re-display
const PREVIEW_CACHE_SIZE: NonZeroUsize = NonZeroUsize::new(32).unwrap();

const TAB_WIDTH: usize = 4;

/// Why a preview could not be shown. Rendered inline, never propagated.
#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    #[error("is a directory: {0}")]
    IsDirectory(PathBuf),

    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PreviewError {
    fn from_io(path: &Path, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => PreviewError::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => PreviewError::PermissionDenied(path.to_path_buf()),
            io::ErrorKind::IsADirectory => PreviewError::IsDirectory(path.to_path_buf()),
            _ => PreviewError::Io {
                path: path.to_path_buf(),
                source,
            },
        }
    }
}

/// Source of preview text for a candidate path
pub trait PreviewSource {
    fn load(&mut self, path: &Path) -> Result<Arc<str>, PreviewError>;
}

/// Reads previews from the filesystem with a byte cap
pub struct FsPreview {
    max_bytes: u64,
    cache: LruCache<PathBuf, Arc<str>>,
}

impl FsPreview {
    pub fn new(max_bytes: u64) -> Self {
        Self {
            max_bytes,
            cache: LruCache::new(PREVIEW_CACHE_SIZE),
        }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    fn read(&self, path: &Path) -> Result<Arc<str>, PreviewError> {
        let metadata = fs::metadata(path).map_err(|e| PreviewError::from_io(path, e))?;
        if metadata.is_dir() {
            return Err(PreviewError::IsDirectory(path.to_path_buf()));
        }

        let file = File::open(path).map_err(|e| PreviewError::from_io(path, e))?;
        let mut bytes = Vec::with_capacity(metadata.len().min(self.max_bytes) as usize);
        file.take(self.max_bytes)
            .read_to_end(&mut bytes)
            .map_err(|e| PreviewError::from_io(path, e))?;

        if metadata.len() > self.max_bytes {
            debug!(path = %path.display(), size = metadata.len(), "preview truncated");
        }

        Ok(expand_tabs(&String::from_utf8_lossy(&bytes)).into())
    }
}

impl Default for FsPreview {
    fn default() -> Self {
        Self::new(DEFAULT_PREVIEW_BYTES)
    }
}

impl PreviewSource for FsPreview {
    fn load(&mut self, path: &Path) -> Result<Arc<str>, PreviewError> {
        if let Some(content) = self.cache.get(path) {
            return Ok(Arc::clone(content));
        }

        let content = self.read(path)?;
        self.cache.put(path.to_path_buf(), Arc::clone(&content));
        Ok(content)
    }
}

/// Expand tabs to spaces with a tab width of 4.
/// This ensures consistent rendering in the terminal where tab stops vary.
pub fn expand_tabs(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut column = 0;

    for c in s.chars() {
        match c {
            '\t' => {
                let spaces = TAB_WIDTH - (column % TAB_WIDTH);
                result.extend(std::iter::repeat_n(' ', spaces));
                column += spaces;
            }
            '\n' | '\r' => {
                result.push(c);
                column = 0;
            }
            _ => {
                result.push(c);
                column += 1;
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_expand_tabs() {
        assert_eq!(expand_tabs("\tx"), "    x");
        assert_eq!(expand_tabs("ab\tc"), "ab  c");
        assert_eq!(expand_tabs("a\n\tb"), "a\n    b");
    }

    #[test]
    fn test_reads_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, "one\ntwo\n").unwrap();

        let mut preview = FsPreview::default();
        assert_eq!(&*preview.load(&path).unwrap(), "one\ntwo\n");
    }

    #[test]
    fn test_read_is_bounded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("big.txt");
        fs::write(&path, "x".repeat(1000)).unwrap();

        let mut preview = FsPreview::new(100);
        assert_eq!(preview.load(&path).unwrap().len(), 100);
        assert_eq!(preview.max_bytes(), 100);
    }

    #[test]
    fn test_invalid_utf8_is_lossy() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bin");
        fs::write(&path, [b'o', b'k', 0xff, b'\n']).unwrap();

        let mut preview = FsPreview::default();
        let content = preview.load(&path).unwrap();
        assert!(content.starts_with("ok"));
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let mut preview = FsPreview::default();
        let err = preview.load(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, PreviewError::NotFound(_)));
    }

    #[test]
    fn test_directory() {
        let dir = TempDir::new().unwrap();
        let mut preview = FsPreview::default();
        let err = preview.load(dir.path()).unwrap_err();
        assert!(matches!(err, PreviewError::IsDirectory(_)));
        assert!(err.to_string().starts_with("is a directory"));
    }

    #[test]
    fn test_cached_content_survives_deletion() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, "cached").unwrap();

        let mut preview = FsPreview::default();
        preview.load(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(&*preview.load(&path).unwrap(), "cached");
    }
}
