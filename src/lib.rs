//! `file-sort` sorts text files that are too large to comfortably fit in memory.
//!
//! The input is read line by line into chunks bounded by a memory budget (and optionally by a line count).
//! Every chunk is sorted in memory and spilled to a temporary file. The spill files are then merged into the
//! output with a k-way merge driven by a binary heap, each spill file being deleted as soon as it is exhausted.
//! If the whole input fits in a single chunk, it is sorted and written to the output directly without touching
//! the file system. For more information see [External Sorting](https://en.wikipedia.org/wiki/External_sorting).
//!
//! Lines are opaque byte strings compared byte-wise, so input does not have to be valid UTF-8. Line terminators
//! (`\n`, `\r\n`, or a trailing `\r` at the end of the file) are stripped on input and every output line is
//! terminated by `\n`.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use log;
//!
//! use file_sort::{buffer::mem::MemoryLimitedBufferBuilder, ExternalSorter, ExternalSorterBuilder};
//!
//! fn main() {
//!     let sorter: ExternalSorter = ExternalSorterBuilder::new()
//!         .with_tmp_dir(Path::new("./"))
//!         .with_buffer(MemoryLimitedBufferBuilder::new(50 * 1024 * 1024))
//!         .build()
//!         .unwrap();
//!
//!     let summary = sorter.sort_file(Path::new("input.txt"), Path::new("output.txt")).unwrap();
//!     log::info!("sorted {} lines in {} chunks", summary.lines, summary.chunks);
//! }
//! ```

use std::path::Path;

pub mod buffer;
pub mod chunk;
pub mod cursor;
pub mod line;
pub mod merger;
pub mod producer;
pub mod sort;

pub use buffer::{ChunkBuffer, ChunkBufferBuilder, LimitedBuffer, LimitedBufferBuilder};
pub use chunk::SpillFile;
pub use cursor::{Head, LineCursor};
pub use line::Line;
pub use merger::BinaryHeapMerger;
pub use producer::ChunkProducer;
pub use sort::{ExternalSorter, ExternalSorterBuilder, SortError, SortSummary};

use buffer::mem::MemoryLimitedBufferBuilder;

/// Sorts lines of the `input` file into the `output` file using the default memory budget
/// ([`buffer::DEFAULT_CHUNK_BYTES`]).
///
/// # Arguments
/// * `input` - Path of the file to be sorted
/// * `output` - Path of the file to be created (or overwritten) with sorted lines
/// * `tmp_dir` - Directory spill files are created in. OS temporary directory if [`None`]
/// * `max_lines` - Maximum number of lines per in-memory chunk. Unbounded if [`None`]
pub fn sort(
    input: &Path,
    output: &Path,
    tmp_dir: Option<&Path>,
    max_lines: Option<usize>,
) -> Result<SortSummary, SortError> {
    let mut buffer_builder = MemoryLimitedBufferBuilder::default();
    if let Some(max_lines) = max_lines {
        buffer_builder = buffer_builder.with_max_lines(max_lines);
    }

    let mut sorter_builder = ExternalSorterBuilder::new().with_buffer(buffer_builder);
    if let Some(tmp_dir) = tmp_dir {
        sorter_builder = sorter_builder.with_tmp_dir(tmp_dir);
    }

    return sorter_builder.build()?.sort_file(input, output);
}

#[cfg(test)]
mod test {
    use std::fs;
    use std::io::{self, BufRead, Write};

    use rand::Rng;
    use rstest::*;

    use super::sort;

    #[rstest]
    #[case(Some(2), 3)]
    #[case(None, 1)]
    fn test_sort(#[case] max_lines: Option<usize>, #[case] expected_chunks: usize) {
        let tmp_dir = tempfile::tempdir_in("./").unwrap();
        let input = tmp_dir.path().join("input.txt");
        let output = tmp_dir.path().join("output.txt");
        fs::write(&input, "delta\nalpha\r\necho\ncharlie\nbravo\n").unwrap();

        let summary = sort(&input, &output, Some(tmp_dir.path()), max_lines).unwrap();

        assert_eq!(summary.chunks, expected_chunks);
        assert_eq!(fs::read_to_string(&output).unwrap(), "alpha\nbravo\ncharlie\ndelta\necho\n");
        assert_eq!(fs::read_dir(tmp_dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_default_budget_spills_large_input() {
        let tmp_dir = tempfile::tempdir_in("./").unwrap();
        let input = tmp_dir.path().join("input.txt");
        let output = tmp_dir.path().join("output.txt");

        let mut rng = rand::thread_rng();
        let mut writer = io::BufWriter::new(fs::File::create(&input).unwrap());
        for _ in 0..3_000_000 {
            writeln!(writer, "{:20}", rng.gen::<i64>()).unwrap();
        }
        writer.flush().unwrap();
        drop(writer);

        let summary = sort(&input, &output, Some(tmp_dir.path()), None).unwrap();

        assert!(summary.merged());
        assert_eq!(summary.lines, 3_000_000);

        let reader = io::BufReader::new(fs::File::open(&output).unwrap());
        let mut count = 0;
        let mut prev = String::new();
        for line in reader.lines() {
            let line = line.unwrap();
            assert!(prev <= line);
            prev = line;
            count += 1;
        }
        assert_eq!(count, 3_000_000);
        assert_eq!(fs::read_dir(tmp_dir.path()).unwrap().count(), 2);
    }
}
