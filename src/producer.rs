//! Chunk producer.

use std::io::{self, prelude::*};

use crate::buffer::ChunkBuffer;
use crate::line;

/// Splits an input stream into chunks of lines.
/// Each chunk is accumulated in a caller-provided buffer until the buffer reports it is full
/// or the input is exhausted.
pub struct ChunkProducer<R> {
    reader: R,
    lines_read: u64,
}

impl<R: BufRead> ChunkProducer<R> {
    /// Creates a chunk producer reading lines from `reader`.
    pub fn new(reader: R) -> Self {
        ChunkProducer { reader, lines_read: 0 }
    }

    /// Clears `buffer` and fills it with the next chunk of lines.
    /// Returns `true` if the input still has unread data.
    ///
    /// At least one line is read per call as long as the input is not exhausted,
    /// so a buffer that is full right after a single line still makes progress.
    pub fn fill<B: ChunkBuffer>(&mut self, buffer: &mut B) -> io::Result<bool> {
        buffer.clear();

        loop {
            match line::read_line(&mut self.reader)? {
                Some(line) => {
                    buffer.push(line);
                    self.lines_read += 1;
                }
                None => return Ok(false),
            }

            if buffer.is_full() {
                break;
            }
        }

        // peek so that an input ending exactly at the limit reports no more data
        let has_more = !self.reader.fill_buf()?.is_empty();
        log::debug!(
            "chunk filled (lines: {}, more input: {})",
            buffer.len(),
            has_more
        );

        return Ok(has_more);
    }

    /// Returns the total number of lines read so far.
    pub fn lines_read(&self) -> u64 {
        self.lines_read
    }
}
