//! Limited line buffer implementations.

use rayon;

use crate::line::Line;

/// Default chunk memory budget (64 MiB).
pub const DEFAULT_CHUNK_BYTES: u64 = 64 * 1024 * 1024;

/// Buffer builder.
pub trait ChunkBufferBuilder: Default {
    type Buffer: ChunkBuffer;

    /// Creates a new buffer.
    fn build(&self) -> Self::Buffer;
}

/// Base limited buffer interface.
pub trait ChunkBuffer: rayon::slice::ParallelSliceMut<Line> + Send {
    /// Adds a new line to the buffer.
    fn push(&mut self, line: Line);

    /// Returns buffered lines.
    fn lines(&self) -> &[Line];

    /// Drops buffered lines, keeping the allocation for reuse.
    fn clear(&mut self);

    /// Returns buffer length
    fn len(&self) -> usize {
        self.lines().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks if the buffer reached the limit.
    fn is_full(&self) -> bool;
}

#[derive(Clone)]
pub struct LimitedBufferBuilder {
    buffer_limit: usize,
    preallocate: bool,
}

impl LimitedBufferBuilder {
    pub fn new(buffer_limit: usize, preallocate: bool) -> Self {
        LimitedBufferBuilder {
            buffer_limit,
            preallocate,
        }
    }
}

impl ChunkBufferBuilder for LimitedBufferBuilder {
    type Buffer = LimitedBuffer;

    fn build(&self) -> Self::Buffer {
        if self.preallocate {
            LimitedBuffer::with_capacity(self.buffer_limit)
        } else {
            LimitedBuffer::new(self.buffer_limit)
        }
    }
}

impl Default for LimitedBufferBuilder {
    fn default() -> Self {
        LimitedBufferBuilder {
            buffer_limit: usize::MAX,
            preallocate: false,
        }
    }
}

/// Buffer limited by lines count.
pub struct LimitedBuffer {
    limit: usize,
    inner: Vec<Line>,
}

impl LimitedBuffer {
    pub fn new(limit: usize) -> Self {
        LimitedBuffer {
            limit,
            inner: Vec::new(),
        }
    }

    pub fn with_capacity(limit: usize) -> Self {
        LimitedBuffer {
            limit,
            inner: Vec::with_capacity(limit),
        }
    }
}

impl ChunkBuffer for LimitedBuffer {
    fn push(&mut self, line: Line) {
        self.inner.push(line);
    }

    fn lines(&self) -> &[Line] {
        &self.inner
    }

    fn clear(&mut self) {
        self.inner.clear();
    }

    fn is_full(&self) -> bool {
        self.inner.len() >= self.limit
    }
}

impl rayon::slice::ParallelSliceMut<Line> for LimitedBuffer {
    fn as_parallel_slice_mut(&mut self) -> &mut [Line] {
        self.inner.as_mut_slice()
    }
}

#[cfg(test)]
mod test {
    use super::{ChunkBuffer, ChunkBufferBuilder, LimitedBufferBuilder};

    #[test]
    fn test_limited_buffer() {
        let builder = LimitedBufferBuilder::new(2, true);
        let mut buffer = builder.build();

        buffer.push(b"b".to_vec());
        assert_eq!(buffer.is_full(), false);
        buffer.push(b"a".to_vec());
        assert_eq!(buffer.is_full(), true);
        assert_eq!(buffer.lines(), [b"b", b"a"]);

        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.is_full(), false);
    }
}

pub mod mem {
    //! Buffer limited by the memory consumed by its lines.

    #[cfg(not(feature = "memory-limit"))]
    use std::mem;

    use rayon;

    use super::{ChunkBuffer, ChunkBufferBuilder, DEFAULT_CHUNK_BYTES};
    use crate::line::Line;

    /// Returns the memory footprint accounted for a buffered line:
    /// its bytes plus the line header held by the buffer.
    #[cfg(not(feature = "memory-limit"))]
    pub fn line_footprint(line: &Line) -> u64 {
        (line.len() + mem::size_of::<Line>()) as u64
    }

    /// Returns the memory footprint accounted for a buffered line.
    #[cfg(feature = "memory-limit")]
    pub fn line_footprint(line: &Line) -> u64 {
        deepsize::DeepSizeOf::deep_size_of(line) as u64
    }

    #[derive(Clone)]
    pub struct MemoryLimitedBufferBuilder {
        buffer_limit: u64,
        max_lines: Option<usize>,
    }

    impl MemoryLimitedBufferBuilder {
        pub fn new(buffer_limit: u64) -> Self {
            MemoryLimitedBufferBuilder {
                buffer_limit,
                max_lines: None,
            }
        }

        /// Additionally caps the number of lines a buffer may hold.
        pub fn with_max_lines(mut self, max_lines: usize) -> Self {
            self.max_lines = Some(max_lines);
            return self;
        }
    }

    impl ChunkBufferBuilder for MemoryLimitedBufferBuilder {
        type Buffer = MemoryLimitedBuffer;

        fn build(&self) -> Self::Buffer {
            MemoryLimitedBuffer::new(self.buffer_limit, self.max_lines)
        }
    }

    impl Default for MemoryLimitedBufferBuilder {
        fn default() -> Self {
            MemoryLimitedBufferBuilder::new(DEFAULT_CHUNK_BYTES)
        }
    }

    /// Buffer limited by consumed memory and, optionally, by lines count.
    pub struct MemoryLimitedBuffer {
        limit: u64,
        max_lines: Option<usize>,
        current_size: u64,
        inner: Vec<Line>,
    }

    impl MemoryLimitedBuffer {
        pub fn new(limit: u64, max_lines: Option<usize>) -> Self {
            MemoryLimitedBuffer {
                limit,
                max_lines,
                current_size: 0,
                inner: Vec::new(),
            }
        }

        pub fn mem_size(&self) -> u64 {
            self.current_size
        }
    }

    impl ChunkBuffer for MemoryLimitedBuffer {
        fn push(&mut self, line: Line) {
            self.current_size += line_footprint(&line);
            self.inner.push(line);
        }

        fn lines(&self) -> &[Line] {
            &self.inner
        }

        fn clear(&mut self) {
            self.current_size = 0;
            self.inner.clear();
        }

        fn is_full(&self) -> bool {
            if let Some(max_lines) = self.max_lines {
                if self.inner.len() >= max_lines {
                    return true;
                }
            }
            self.current_size >= self.limit
        }
    }

    impl rayon::slice::ParallelSliceMut<Line> for MemoryLimitedBuffer {
        fn as_parallel_slice_mut(&mut self) -> &mut [Line] {
            self.inner.as_mut_slice()
        }
    }

    #[cfg(test)]
    mod test {
        use super::{line_footprint, ChunkBuffer, ChunkBufferBuilder, MemoryLimitedBufferBuilder};

        #[test]
        fn test_memory_limited_buffer() {
            let item1 = b"hello!".to_vec();
            let item2 = b"world!".to_vec();
            let limit = line_footprint(&item1) + line_footprint(&item2);

            let builder = MemoryLimitedBufferBuilder::new(limit);
            let mut buffer = builder.build();

            buffer.push(item1.clone());
            assert_eq!(buffer.mem_size(), line_footprint(&item1));
            assert_eq!(buffer.is_full(), false);

            buffer.push(item2.clone());
            assert_eq!(buffer.mem_size(), limit);
            assert_eq!(buffer.is_full(), true);
            assert_eq!(buffer.lines(), [item1, item2]);

            buffer.clear();
            assert_eq!(buffer.mem_size(), 0);
            assert_eq!(buffer.is_full(), false);
        }

        #[test]
        fn test_memory_limited_buffer_max_lines() {
            let builder = MemoryLimitedBufferBuilder::new(u64::MAX).with_max_lines(3);
            let mut buffer = builder.build();

            for line in [b"c", b"b"] {
                buffer.push(line.to_vec());
                assert_eq!(buffer.is_full(), false);
            }
            buffer.push(b"a".to_vec());
            assert_eq!(buffer.is_full(), true);
        }

        #[cfg(not(feature = "memory-limit"))]
        #[test]
        fn test_line_footprint() {
            let header = std::mem::size_of::<crate::line::Line>() as u64;
            assert_eq!(line_footprint(&Vec::new()), header);
            assert_eq!(line_footprint(&"żółw".as_bytes().to_vec()), header + 7);
        }
    }
}
