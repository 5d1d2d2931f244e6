//! SIMD-accelerated line boundary index
//!
//! This module provides the LineIndex structure that maps logical line numbers to the
//! byte offset where each line starts. The index is always built in one pass over the
//! full content of a file using memchr for newline detection, and is replaced
//! wholesale whenever the file changes.

use memchr::memchr_iter;

/// Offset table mapping line numbers to byte positions
///
/// Offsets are positions in the raw file bytes. A `\r\n` pair counts as a single
/// terminator: the `\r` is not a boundary, so the line structure is the same as
/// for the content with every `\r\n` collapsed to `\n`. The `\r` is stripped when
/// the line is decoded (see [`decode_line`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    /// Byte offsets where each line starts
    ///
    /// - line_offsets[0] = 0 (present even for an empty file)
    /// - line_offsets[n] = byte position after the nth newline
    ///
    /// Strictly increasing. When the content ends without a newline the final
    /// line has no entry past its own start.
    line_offsets: Vec<u64>,

    /// Number of logical lines, including a trailing unterminated one
    total_lines: u64,
}

impl LineIndex {
    /// Index `data` in a single forward scan
    ///
    /// # Performance
    /// * O(n) over the buffer, SIMD-accelerated newline search
    /// * One `u64` per line of heap
    pub fn build(data: &[u8]) -> Self {
        let mut line_offsets = vec![0u64];
        line_offsets.extend(memchr_iter(b'\n', data).map(|pos| (pos + 1) as u64));

        let mut total_lines = (line_offsets.len() - 1) as u64;

        // Content after the final newline (or no newline at all) is one more line
        let last_start = line_offsets[line_offsets.len() - 1];
        if !data.is_empty() && last_start < data.len() as u64 {
            total_lines += 1;
        }

        Self {
            line_offsets,
            total_lines,
        }
    }

    /// Number of logical lines in the indexed content
    pub fn total_lines(&self) -> u64 {
        self.total_lines
    }

    /// All recorded line start offsets
    pub fn offsets(&self) -> &[u64] {
        &self.line_offsets
    }

    /// Byte offset where `line` starts, if the line exists
    pub fn line_start(&self, line: u64) -> Option<u64> {
        if line >= self.total_lines {
            return None;
        }
        self.line_offsets.get(line as usize).copied()
    }

    /// Start offset of the line after `line`, if one was recorded
    ///
    /// Returns None for the last line when the content does not end in a newline;
    /// that line extends to end of stream.
    pub fn next_line_start(&self, line: u64) -> Option<u64> {
        if line >= self.total_lines {
            return None;
        }
        self.line_offsets.get(line as usize + 1).copied()
    }

    /// Whether the final line ends with a newline
    ///
    /// True for empty content, which has no line left open.
    pub fn last_line_terminated(&self) -> bool {
        self.line_offsets.len() as u64 > self.total_lines
    }

    /// Approximate heap footprint of the offset table in bytes
    pub fn heap_size(&self) -> usize {
        self.line_offsets.capacity() * std::mem::size_of::<u64>()
    }
}

impl Default for LineIndex {
    fn default() -> Self {
        Self::build(&[])
    }
}

/// Strip the line terminator (`\n` or `\r\n`) and decode lossily
///
/// Invalid UTF-8 sequences become U+FFFD so a malformed line never fails a read.
/// A lone `\r` that is not followed by `\n` is content and is kept.
pub fn decode_line(bytes: &[u8]) -> String {
    let content = match bytes.strip_suffix(b"\n") {
        Some(rest) => rest.strip_suffix(b"\r").unwrap_or(rest),
        None => bytes,
    };
    String::from_utf8_lossy(content).into_owned()
}
