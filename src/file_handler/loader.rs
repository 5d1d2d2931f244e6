//! Line-indexed file loader with change detection
//!
//! [`FileLoader`] owns a [`LineIndex`] for one file together with the size and
//! modification time captured when that index was built. Reads seek straight to the
//! indexed offsets, so any window of lines costs I/O proportional to the window, not
//! to the file. Change detection compares modification times; a changed file is
//! always re-indexed from scratch.
//!
//! The loader is synchronous. It is `Send`, so callers may move it onto a worker
//! thread, but it performs no locking of its own: one thread at a time per instance.

use crate::config::LoaderConfig;
use crate::error::{LogviewError, Result};
use crate::file_handler::line_index::{decode_line, LineIndex};
use crate::file_handler::source::{AccessStrategy, ByteSource};
use crate::file_handler::validation::validate_file_path;
use chrono::{DateTime, Local};
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Format used by [`FileLoader::last_modified`]
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Everything produced by one index build
///
/// Built completely before it replaces the loader's state, so a failed rebuild
/// never leaves a half-updated loader behind.
#[derive(Debug)]
struct Snapshot {
    index: LineIndex,
    file_size: u64,
    modified: SystemTime,
    strategy: AccessStrategy,
}

impl Snapshot {
    fn capture(path: &Path, config: &LoaderConfig) -> Result<Self> {
        let mut file = File::open(path).map_err(|e| LogviewError::from_io(path, e))?;

        let metadata = file.metadata().map_err(|e| {
            LogviewError::file_error(format!("Failed to stat {}", path.display()), e)
        })?;
        let modified = metadata.modified().map_err(|e| {
            LogviewError::file_error(
                format!("Modification time unavailable for {}", path.display()),
                e,
            )
        })?;

        let source = ByteSource::load(&mut file, metadata.len(), config.mmap_threshold, path)?;
        let bytes = source.as_bytes();
        let index = LineIndex::build(bytes);

        log::debug!(
            "Indexed {}: {} lines, {} bytes, {} read, {} bytes of offsets",
            path.display(),
            index.total_lines(),
            bytes.len(),
            source.strategy(),
            index.heap_size()
        );

        Ok(Self {
            file_size: bytes.len() as u64,
            modified,
            strategy: source.strategy(),
            index,
        })
    }
}

/// Random access to the lines of one file
#[derive(Debug)]
pub struct FileLoader {
    path: PathBuf,
    config: LoaderConfig,
    index: LineIndex,
    file_size: u64,
    modified: SystemTime,
    strategy: AccessStrategy,
}

impl FileLoader {
    /// Open and index `path` with the default configuration
    ///
    /// # Errors
    /// * `FileNotFound`, `NotAFile`, `PermissionDenied` when the path is unusable
    /// * `FileError` when reading the file fails
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(path, LoaderConfig::default())
    }

    /// Open and index `path` with an explicit configuration
    pub fn open_with_config(path: impl AsRef<Path>, config: LoaderConfig) -> Result<Self> {
        let path = validate_file_path(path.as_ref())?;
        let snapshot = Snapshot::capture(&path, &config)?;

        log::info!(
            "Opened {} ({} lines, {} bytes)",
            path.display(),
            snapshot.index.total_lines(),
            snapshot.file_size
        );

        Ok(Self {
            path,
            config,
            index: snapshot.index,
            file_size: snapshot.file_size,
            modified: snapshot.modified,
            strategy: snapshot.strategy,
        })
    }

    /// Read up to `count` lines starting at line `start` (0-based)
    ///
    /// # Returns
    /// * Lines without their `\n` / `\r\n` terminators, invalid UTF-8 replaced
    /// * Fewer than `count` lines when the file ends first
    /// * Empty when `start` is past the last line, or when the file can no
    ///   longer be read (the failure is logged, the index is kept)
    pub fn read_lines(&self, start: u64, count: usize) -> Vec<String> {
        let total = self.index.total_lines();
        if start >= total || count == 0 {
            return Vec::new();
        }
        let end = start.saturating_add(count as u64).min(total);

        match self.read_window(start as usize, end as usize) {
            Ok(lines) => lines,
            Err(e) => {
                log::error!(
                    "Failed to read lines {}..{} from {}: {}",
                    start,
                    end,
                    self.path.display(),
                    e
                );
                Vec::new()
            }
        }
    }

    fn read_window(&self, start: usize, end: usize) -> std::io::Result<Vec<String>> {
        let offsets = self.index.offsets();
        let mut reader = BufReader::new(File::open(&self.path)?);
        reader.seek(SeekFrom::Start(offsets[start]))?;

        // Lines with a recorded successor are read as one bounded block
        let bounded_end = end.min(offsets.len() - 1);
        let mut block = Vec::new();
        if bounded_end > start {
            let len = offsets[bounded_end] - offsets[start];
            (&mut reader).take(len).read_to_end(&mut block)?;
        }

        let base = offsets[start];
        let mut lines = Vec::with_capacity(end - start);
        for line in start..bounded_end {
            // A file truncated since indexing yields short or empty lines
            let from = usize::try_from(offsets[line] - base)
                .unwrap_or(usize::MAX)
                .min(block.len());
            let to = usize::try_from(offsets[line + 1] - base)
                .unwrap_or(usize::MAX)
                .min(block.len());
            lines.push(decode_line(&block[from..to]));
        }

        // The unterminated last line runs to the next newline or end of stream
        if end > bounded_end {
            let mut tail = Vec::new();
            reader.read_until(b'\n', &mut tail)?;
            lines.push(decode_line(&tail));
        }

        Ok(lines)
    }

    /// Whether the file's modification time is newer than the indexed snapshot
    ///
    /// Equal timestamps count as unchanged. A file that cannot be stat'ed is
    /// reported as unchanged.
    pub fn has_changed(&self) -> bool {
        match std::fs::metadata(&self.path).and_then(|m| m.modified()) {
            Ok(current) => current > self.modified,
            Err(e) => {
                log::debug!(
                    "Change check failed for {}: {}",
                    self.path.display(),
                    e
                );
                false
            }
        }
    }

    /// Re-index the file if it changed since the last build
    ///
    /// # Returns
    /// * `Ok(true)` when the index was rebuilt
    /// * `Ok(false)` when the file is unchanged (no I/O beyond a stat)
    ///
    /// # Errors
    /// If the rebuild fails the previous index and metadata stay in place.
    pub fn reload(&mut self) -> Result<bool> {
        if !self.has_changed() {
            return Ok(false);
        }

        let snapshot = Snapshot::capture(&self.path, &self.config)?;
        log::info!(
            "Reloaded {} ({} -> {} lines)",
            self.path.display(),
            self.index.total_lines(),
            snapshot.index.total_lines()
        );

        self.index = snapshot.index;
        self.file_size = snapshot.file_size;
        self.modified = snapshot.modified;
        self.strategy = snapshot.strategy;
        Ok(true)
    }

    /// Number of lines as of the last build
    pub fn line_count(&self) -> u64 {
        self.index.total_lines()
    }

    /// Whether the last line had its newline as of the last build
    ///
    /// A writer that has flushed only part of a line leaves this false.
    pub fn last_line_complete(&self) -> bool {
        self.index.last_line_terminated()
    }

    /// File size in bytes as of the last build
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Modification time as of the last build, local time, `YYYY-MM-DD HH:MM:SS`
    pub fn last_modified(&self) -> String {
        DateTime::<Local>::from(self.modified)
            .format(TIMESTAMP_FORMAT)
            .to_string()
    }

    /// Raw modification time as of the last build
    pub fn modified_at(&self) -> SystemTime {
        self.modified
    }

    /// Canonical path of the file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// How the file was read during the last build
    pub fn strategy(&self) -> AccessStrategy {
        self.strategy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    fn create_test_file(content: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content).expect("Failed to write test content");
        file.flush().expect("Failed to flush test file");
        file
    }

    /// Overwrite the file and push its mtime forward so the change is observable
    fn rewrite(file: &NamedTempFile, content: &[u8], loader: &FileLoader) {
        std::fs::write(file.path(), content).unwrap();
        let handle = File::options().write(true).open(file.path()).unwrap();
        handle
            .set_modified(loader.modified_at() + Duration::from_secs(2))
            .unwrap();
    }

    fn forced_mmap() -> LoaderConfig {
        LoaderConfig { mmap_threshold: 0 }
    }

    #[test]
    fn test_unterminated_scenario() {
        let file = create_test_file(b"a\nb\nc");
        let loader = FileLoader::open(file.path()).unwrap();

        assert_eq!(loader.line_count(), 3);
        assert_eq!(loader.read_lines(0, 3), vec!["a", "b", "c"]);
        assert_eq!(loader.read_lines(1, 5), vec!["b", "c"]);
        assert!(loader.read_lines(3, 1).is_empty());
    }

    #[test]
    fn test_empty_file() {
        let file = create_test_file(b"");
        let loader = FileLoader::open(file.path()).unwrap();

        assert_eq!(loader.line_count(), 0);
        assert_eq!(loader.file_size(), 0);
        assert!(loader.read_lines(0, 10).is_empty());
    }

    #[test]
    fn test_crlf_scenario() {
        let file = create_test_file(b"x\r\ny\r\n");
        let loader = FileLoader::open(file.path()).unwrap();

        assert_eq!(loader.line_count(), 2);
        let lines = loader.read_lines(0, 2);
        assert_eq!(lines, vec!["x", "y"]);
        assert!(lines.iter().all(|l| !l.contains('\r')));
    }

    #[test]
    fn test_only_newlines() {
        let file = create_test_file(b"\n\n\n");
        let loader = FileLoader::open(file.path()).unwrap();

        assert_eq!(loader.line_count(), 3);
        assert_eq!(loader.read_lines(0, 10), vec!["", "", ""]);
    }

    #[test]
    fn test_middle_window() {
        let file = create_test_file(b"l0\nl1\nl2\nl3\nl4\n");
        let loader = FileLoader::open(file.path()).unwrap();

        assert_eq!(loader.read_lines(2, 2), vec!["l2", "l3"]);
        assert_eq!(loader.read_lines(4, 1), vec!["l4"]);
        assert!(loader.read_lines(1, 0).is_empty());
        assert!(loader.read_lines(u64::MAX, usize::MAX).is_empty());
    }

    #[test]
    fn test_huge_count_is_clipped() {
        let file = create_test_file(b"a\nb\n");
        let loader = FileLoader::open(file.path()).unwrap();
        assert_eq!(loader.read_lines(1, usize::MAX), vec!["b"]);
    }

    #[test]
    fn test_invalid_utf8_is_substituted() {
        let file = create_test_file(b"good\nbad \xc3\x28 seq\nafter\n");
        let loader = FileLoader::open(file.path()).unwrap();

        let lines = loader.read_lines(0, 3);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "bad \u{FFFD}( seq");
        assert_eq!(lines[2], "after");
    }

    #[test]
    fn test_forced_mmap_matches_buffered() {
        let content = b"first\r\nsecond\n\nfourth without newline";
        let file = create_test_file(content);

        let buffered = FileLoader::open(file.path()).unwrap();
        let mapped = FileLoader::open_with_config(file.path(), forced_mmap()).unwrap();

        assert_eq!(buffered.strategy(), AccessStrategy::Buffered);
        assert_eq!(mapped.strategy(), AccessStrategy::MemoryMapped);
        assert_eq!(buffered.line_count(), mapped.line_count());
        assert_eq!(buffered.read_lines(0, 10), mapped.read_lines(0, 10));
    }

    #[test]
    fn test_open_missing_file_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = FileLoader::open(dir.path().join("missing.log")).unwrap_err();
        assert!(matches!(err, LogviewError::FileNotFound { .. }));
    }

    #[test]
    fn test_path_is_absolute() {
        let file = create_test_file(b"x\n");
        let loader = FileLoader::open(file.path()).unwrap();
        assert!(loader.path().is_absolute());
    }

    #[test]
    fn test_unchanged_reload_is_noop() {
        let file = create_test_file(b"one\ntwo\n");
        let mut loader = FileLoader::open(file.path()).unwrap();

        assert!(!loader.has_changed());
        assert!(!loader.reload().unwrap());
        assert_eq!(loader.line_count(), 2);
        assert_eq!(loader.file_size(), 8);
        assert_eq!(loader.read_lines(0, 2), vec!["one", "two"]);
    }

    #[test]
    fn test_reload_after_rewrite() {
        let file = create_test_file(b"one\ntwo\n");
        let mut loader = FileLoader::open(file.path()).unwrap();

        rewrite(&file, b"alpha\nbeta\ngamma", &loader);
        assert!(loader.has_changed());
        assert!(loader.reload().unwrap());

        assert!(!loader.has_changed());
        assert_eq!(loader.line_count(), 3);
        assert_eq!(loader.file_size(), 16);
        assert_eq!(loader.read_lines(0, 5), vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_reload_after_truncation() {
        let file = create_test_file(b"one\ntwo\nthree\n");
        let mut loader = FileLoader::open(file.path()).unwrap();

        rewrite(&file, b"", &loader);
        assert!(loader.reload().unwrap());
        assert_eq!(loader.line_count(), 0);
        assert!(loader.read_lines(0, 3).is_empty());
    }

    #[test]
    fn test_older_mtime_is_not_a_change() {
        let file = create_test_file(b"one\n");
        let loader = FileLoader::open(file.path()).unwrap();

        let handle = File::options().write(true).open(file.path()).unwrap();
        handle
            .set_modified(loader.modified_at() - Duration::from_secs(60))
            .unwrap();

        assert!(!loader.has_changed());
    }

    #[test]
    fn test_stale_index_reads_are_best_effort() {
        let file = create_test_file(b"one\ntwo\nthree\n");
        let loader = FileLoader::open(file.path()).unwrap();

        // Shrink without reloading: line count still comes from the index
        std::fs::write(file.path(), b"one\n").unwrap();
        let lines = loader.read_lines(0, 3);
        assert_eq!(lines, vec!["one", "", ""]);
    }

    #[test]
    fn test_deleted_file_degrades_gracefully() {
        let file = create_test_file(b"one\ntwo\n");
        let mut loader = FileLoader::open(file.path()).unwrap();
        let modified = loader.last_modified();

        std::fs::remove_file(file.path()).unwrap();

        assert!(loader.read_lines(0, 2).is_empty());
        assert!(!loader.has_changed());
        assert!(!loader.reload().unwrap());
        assert_eq!(loader.line_count(), 2);
        assert_eq!(loader.file_size(), 8);
        assert_eq!(loader.last_modified(), modified);
    }

    #[test]
    fn test_last_line_complete_tracks_reload() {
        let file = create_test_file(b"a\npart");
        let mut loader = FileLoader::open(file.path()).unwrap();
        assert!(!loader.last_line_complete());

        rewrite(&file, b"a\npartial done\n", &loader);
        assert!(loader.reload().unwrap());
        assert!(loader.last_line_complete());
    }

    #[test]
    fn test_last_modified_format() {
        let file = create_test_file(b"x\n");
        let loader = FileLoader::open(file.path()).unwrap();

        let stamp = loader.last_modified();
        assert_eq!(stamp.len(), 19);
        assert!(chrono::NaiveDateTime::parse_from_str(&stamp, TIMESTAMP_FORMAT).is_ok());
    }

    #[test]
    fn test_loader_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<FileLoader>();
    }
}
