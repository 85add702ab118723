//! Spill files: sorted chunks stored on file system.

use std::fs;
use std::io::{self, prelude::*};
use std::path::Path;

use tempfile::TempPath;

use crate::cursor::LineCursor;
use crate::line::{self, Line};

/// Spill file name prefix.
const SPILL_PREFIX: &str = "spill-";

/// A sorted chunk of lines written to a uniquely named temporary file, one line per text line.
/// The file is removed when the spill file (or the cursor it was turned into) is dropped.
pub struct SpillFile {
    path: TempPath,
    lines: u64,
}

impl SpillFile {
    /// Writes already sorted lines to a new temporary file in `dir`.
    ///
    /// # Arguments
    /// * `dir` - Directory the file is created in
    /// * `lines` - Lines to be written in the order given
    /// * `buf_size` - File write buffer size
    pub fn build<'a>(
        dir: &Path,
        lines: impl IntoIterator<Item = &'a Line>,
        buf_size: Option<usize>,
    ) -> io::Result<Self> {
        let (tmp_file, path) = tempfile::Builder::new()
            .prefix(SPILL_PREFIX)
            .tempfile_in(dir)?
            .into_parts();

        let mut chunk_writer = match buf_size {
            Some(buf_size) => io::BufWriter::with_capacity(buf_size, tmp_file),
            None => io::BufWriter::new(tmp_file),
        };

        let lines = line::write_lines(&mut chunk_writer, lines.into_iter().map(Vec::as_slice))?;
        chunk_writer.flush()?;

        log::debug!("spill file {} written (lines: {})", path.display(), lines);

        return Ok(SpillFile { path, lines });
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the number of lines stored in the file.
    pub fn len(&self) -> u64 {
        self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines == 0
    }

    /// Opens the file for reading and primes a cursor with its first line.
    /// The cursor takes over the ownership of the file.
    pub fn into_cursor(self, buf_size: Option<usize>) -> io::Result<LineCursor<io::BufReader<fs::File>>> {
        let file = fs::File::open(&self.path)?;
        let chunk_reader = match buf_size {
            Some(buf_size) => io::BufReader::with_capacity(buf_size, file),
            None => io::BufReader::new(file),
        };

        return LineCursor::new(chunk_reader, Some(self.path));
    }
}
