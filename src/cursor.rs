//! Merge-time line cursor.

use std::cmp::Ordering;
use std::io::{self, prelude::*};
use std::mem;

use tempfile::TempPath;

use crate::line::{self, Line};

/// Current head of a cursor.
///
/// Variant order matters: the derived ordering places every [`Head::Line`] before [`Head::Exhausted`],
/// and two exhausted heads compare equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Head {
    Line(Line),
    Exhausted,
}

/// A read position into one sorted run exposing its next unread line.
/// Cursors are ordered by their current head.
pub struct LineCursor<R> {
    head: Head,
    reader: R,
    /// Backing spill file, deleted when the cursor is erased or dropped.
    spill: Option<TempPath>,
}

impl<R: BufRead> LineCursor<R> {
    /// Creates a cursor and primes it with the first line of the reader.
    ///
    /// # Arguments
    /// * `reader` - Sorted run to be read line by line
    /// * `spill` - Spill file backing the reader, if any
    pub fn new(mut reader: R, spill: Option<TempPath>) -> io::Result<Self> {
        let head = Self::read_head(&mut reader)?;

        return Ok(LineCursor { head, reader, spill });
    }

    fn read_head(reader: &mut R) -> io::Result<Head> {
        Ok(match line::read_line(reader)? {
            Some(line) => Head::Line(line),
            None => Head::Exhausted,
        })
    }

    /// Returns the current head and moves the cursor to the next line.
    /// Returns [`None`] if the cursor is already exhausted.
    pub fn advance(&mut self) -> io::Result<Option<Line>> {
        if self.head == Head::Exhausted {
            return Ok(None);
        }

        let next = Self::read_head(&mut self.reader)?;
        match mem::replace(&mut self.head, next) {
            Head::Line(line) => Ok(Some(line)),
            Head::Exhausted => Ok(None),
        }
    }
}

impl<R> LineCursor<R> {
    pub fn head(&self) -> &Head {
        &self.head
    }

    pub fn is_exhausted(&self) -> bool {
        self.head == Head::Exhausted
    }

    /// Closes the reader and deletes the backing spill file.
    pub fn erase(self) -> io::Result<()> {
        let LineCursor { reader, spill, .. } = self;
        // the handle must be closed before the file can be removed on every platform
        drop(reader);

        match spill {
            Some(path) => {
                log::debug!("removing exhausted spill file {}", path.display());
                path.close()
            }
            None => Ok(()),
        }
    }
}

impl<R> PartialEq for LineCursor<R> {
    fn eq(&self, other: &Self) -> bool {
        self.head == other.head
    }
}

impl<R> Eq for LineCursor<R> {}

impl<R> PartialOrd for LineCursor<R> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<R> Ord for LineCursor<R> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.head.cmp(&other.head)
    }
}

#[cfg(test)]
mod test {
    use std::cmp::Ordering;
    use std::fs;
    use std::io::{self, Write};

    use rstest::*;

    use super::{Head, LineCursor};

    #[rstest]
    #[case(Head::Line(b"a".to_vec()), Head::Line(b"b".to_vec()), Ordering::Less)]
    #[case(Head::Line(b"b".to_vec()), Head::Line(b"a".to_vec()), Ordering::Greater)]
    #[case(Head::Line(b"a".to_vec()), Head::Line(b"a".to_vec()), Ordering::Equal)]
    #[case(Head::Line(b"".to_vec()), Head::Line(b" ".to_vec()), Ordering::Less)]
    #[case(Head::Line(b"ab".to_vec()), Head::Line(b"b".to_vec()), Ordering::Less)]
    #[case(Head::Line(b"z".to_vec()), Head::Line(b"\xe9".to_vec()), Ordering::Less)]
    #[case(Head::Line(b"\xff\xff".to_vec()), Head::Exhausted, Ordering::Less)]
    #[case(Head::Exhausted, Head::Line(b"".to_vec()), Ordering::Greater)]
    #[case(Head::Exhausted, Head::Exhausted, Ordering::Equal)]
    fn test_head_ordering(#[case] left: Head, #[case] right: Head, #[case] expected: Ordering) {
        assert_eq!(left.cmp(&right), expected);
    }

    #[test]
    fn test_cursor_advance() {
        let mut cursor = LineCursor::new("1\n2\n".as_bytes(), None).unwrap();
        assert_eq!(cursor.head(), &Head::Line(b"1".to_vec()));

        assert_eq!(cursor.advance().unwrap(), Some(b"1".to_vec()));
        assert_eq!(cursor.head(), &Head::Line(b"2".to_vec()));
        assert_eq!(cursor.advance().unwrap(), Some(b"2".to_vec()));
        assert!(cursor.is_exhausted());
        assert_eq!(cursor.advance().unwrap(), None);
    }

    #[test]
    fn test_empty_cursor_is_exhausted() {
        let cursor = LineCursor::new(io::empty(), None).unwrap();
        assert!(cursor.is_exhausted());
    }

    #[test]
    fn test_erase_removes_spill() {
        let tmp_dir = tempfile::tempdir_in("./").unwrap();
        let mut file = tempfile::NamedTempFile::new_in(&tmp_dir).unwrap();
        file.write_all(b"x\n").unwrap();
        let path = file.into_temp_path();

        let reader = io::BufReader::new(fs::File::open(&path).unwrap());
        let location = path.to_path_buf();
        let mut cursor = LineCursor::new(reader, Some(path)).unwrap();

        assert_eq!(cursor.advance().unwrap(), Some(b"x".to_vec()));
        cursor.erase().unwrap();
        assert!(!location.exists());
    }
}
