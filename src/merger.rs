//! Binary heap merger.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::io::{self, prelude::*};

use crate::cursor::LineCursor;
use crate::line::{self, Line};

/// Binary heap merger implementation.
/// Merges multiple sorted runs into a single sorted output.
/// Time complexity is *m* \* log(*n*) in worst case where *m* is the number of lines,
/// *n* is the number of runs (cursors).
pub struct BinaryHeapMerger<R: BufRead> {
    // binary heap is max-heap by default so we reverse it to convert it to min-heap
    frontier: BinaryHeap<Reverse<LineCursor<R>>>,
}

impl<R: BufRead> BinaryHeapMerger<R> {
    /// Creates an instance of a binary heap merger using cursors as inputs.
    /// Cursor lines should be sorted in ascending order otherwise the result is undefined.
    /// Cursors that are already exhausted are erased right away.
    ///
    /// # Arguments
    /// * `cursors` - Cursors to be merged in a single sorted stream
    pub fn new<I>(cursors: I) -> io::Result<Self>
    where
        I: IntoIterator<Item = LineCursor<R>>,
    {
        let cursors = cursors.into_iter();
        let mut frontier = BinaryHeap::with_capacity(cursors.size_hint().0);

        for cursor in cursors {
            if cursor.is_exhausted() {
                cursor.erase()?;
            } else {
                frontier.push(Reverse(cursor));
            }
        }

        log::debug!("merging {} sorted runs", frontier.len());

        return Ok(BinaryHeapMerger { frontier });
    }

    /// Returns the number of cursors that still have lines.
    pub fn live_cursors(&self) -> usize {
        self.frontier.len()
    }

    /// Writes the merged stream to the writer, one line per text line.
    /// Returns the number of lines written.
    pub fn merge_into<W: Write + ?Sized>(self, writer: &mut W) -> io::Result<u64> {
        let mut count = 0;
        for line in self {
            count += line::write_lines(writer, [line?.as_slice()])?;
        }

        return Ok(count);
    }
}

impl<R: BufRead> Iterator for BinaryHeapMerger<R> {
    type Item = io::Result<Line>;

    /// Returns the next line from the inputs in ascending order.
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let Reverse(mut cursor) = self.frontier.pop()?;

            let line = match cursor.advance() {
                Ok(Some(line)) => line,
                Ok(None) => continue,
                Err(err) => return Some(Err(err)),
            };

            if cursor.is_exhausted() {
                if let Err(err) = cursor.erase() {
                    return Some(Err(err));
                }
            } else {
                self.frontier.push(Reverse(cursor));
            }

            return Some(Ok(line));
        }
    }
}
