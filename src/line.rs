//! Line framing shared by the input reader, spill files and the output writer.
//!
//! Lines are opaque byte strings: no encoding is assumed and they are ordered byte-wise.

use std::io::{self, prelude::*};

/// A single line without its terminator.
pub type Line = Vec<u8>;

/// Reads the next line from the reader without its line terminator (`\n`, `\r\n`, or a trailing `\r`
/// at the end of the stream). Returns [`None`] when the reader is exhausted.
pub fn read_line<R: BufRead + ?Sized>(reader: &mut R) -> io::Result<Option<Line>> {
    let mut line = Vec::new();
    if reader.read_until(b'\n', &mut line)? == 0 {
        return Ok(None);
    }

    if line.last() == Some(&b'\n') {
        line.pop();
    }
    if line.last() == Some(&b'\r') {
        line.pop();
    }

    return Ok(Some(line));
}

/// Writes lines to the writer, each one terminated by `\n`.
/// Returns the number of lines written.
pub fn write_lines<'a, W, I>(writer: &mut W, lines: I) -> io::Result<u64>
where
    W: Write + ?Sized,
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut count = 0;
    for line in lines {
        writer.write_all(line)?;
        writer.write_all(b"\n")?;
        count += 1;
    }

    return Ok(count);
}
