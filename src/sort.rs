//! External sorter.

use log;
use std::error::Error;
use std::fmt;
use std::fmt::Display;
use std::fs;
use std::io::{self, prelude::*};
use std::path::Path;

use rayon::slice::ParallelSliceMut;

use crate::buffer::mem::MemoryLimitedBufferBuilder;
use crate::chunk::SpillFile;
use crate::merger::BinaryHeapMerger;
use crate::producer::ChunkProducer;
use crate::{line, ChunkBuffer, ChunkBufferBuilder};

/// Sorting error.
#[derive(Debug)]
pub enum SortError {
    /// Input file opening error.
    Open(io::Error),
    /// Temporary directory or spill file creation error.
    TempDir(io::Error),
    /// Workers thread pool initialization error.
    ThreadPoolBuildError(rayon::ThreadPoolBuildError),
    /// Common I/O error.
    IO(io::Error),
    /// Input data stream error
    InputError(io::Error),
}

impl Error for SortError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(match &self {
            SortError::Open(err) => err,
            SortError::TempDir(err) => err,
            SortError::ThreadPoolBuildError(err) => err,
            SortError::IO(err) => err,
            SortError::InputError(err) => err,
        })
    }
}

impl Display for SortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self {
            SortError::Open(err) => write!(f, "input file not opened: {}", err),
            SortError::TempDir(err) => write!(f, "temporary directory or file not created: {}", err),
            SortError::ThreadPoolBuildError(err) => write!(f, "thread pool initialization failed: {}", err),
            SortError::IO(err) => write!(f, "I/O operation failed: {}", err),
            SortError::InputError(err) => write!(f, "input data stream error: {}", err),
        }
    }
}

/// Outcome of a successful sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSummary {
    /// Number of lines written to the output.
    pub lines: u64,
    /// Number of chunks the input was split into.
    pub chunks: usize,
}

impl SortSummary {
    /// Checks if the output was produced by merging spill files.
    pub fn merged(&self) -> bool {
        self.chunks > 1
    }
}

/// External sorter builder. Provides methods for [`ExternalSorter`] initialization.
#[derive(Clone)]
pub struct ExternalSorterBuilder<B = MemoryLimitedBufferBuilder>
where
    B: ChunkBufferBuilder,
{
    /// Number of threads to be used to sort chunks in parallel.
    threads_number: Option<usize>,
    /// Directory to be used to store temporary data.
    tmp_dir: Option<Box<Path>>,
    /// File read/write buffer size.
    rw_buf_size: Option<usize>,
    /// Chunk buffer builder.
    buffer_builder: B,
}

impl<B> ExternalSorterBuilder<B>
where
    B: ChunkBufferBuilder,
{
    /// Creates an instance of a builder with default parameters.
    pub fn new() -> Self {
        ExternalSorterBuilder::default()
    }

    /// Builds an [`ExternalSorter`] instance using provided configuration.
    pub fn build(self) -> Result<ExternalSorter<B>, SortError> {
        ExternalSorter::new(
            self.threads_number,
            self.tmp_dir.as_deref(),
            self.buffer_builder,
            self.rw_buf_size,
        )
    }

    /// Sets number of threads to be used to sort chunks in parallel.
    pub fn with_threads_number(mut self, threads_number: usize) -> ExternalSorterBuilder<B> {
        self.threads_number = Some(threads_number);
        return self;
    }

    /// Sets directory to be used to store temporary data.
    pub fn with_tmp_dir(mut self, path: &Path) -> ExternalSorterBuilder<B> {
        self.tmp_dir = Some(path.into());
        return self;
    }

    /// Sets buffer builder.
    pub fn with_buffer(mut self, buffer_builder: B) -> ExternalSorterBuilder<B> {
        self.buffer_builder = buffer_builder;
        return self;
    }

    /// Sets file read/write buffer size.
    pub fn with_rw_buf_size(mut self, buf_size: usize) -> ExternalSorterBuilder<B> {
        self.rw_buf_size = Some(buf_size);
        return self;
    }
}

impl<B> Default for ExternalSorterBuilder<B>
where
    B: ChunkBufferBuilder,
{
    fn default() -> Self {
        ExternalSorterBuilder {
            threads_number: None,
            tmp_dir: None,
            rw_buf_size: None,
            buffer_builder: B::default(),
        }
    }
}

/// External sorter.
pub struct ExternalSorter<B = MemoryLimitedBufferBuilder>
where
    B: ChunkBufferBuilder,
{
    /// Sorting thread pool.
    thread_pool: rayon::ThreadPool,
    /// Directory temporary data is placed in. OS temporary directory if [`None`].
    tmp_path: Option<Box<Path>>,
    /// Chunk buffer builder.
    buffer_builder: B,
    /// File read/write buffer size.
    rw_buf_size: Option<usize>,
}

impl<B> ExternalSorter<B>
where
    B: ChunkBufferBuilder,
{
    /// Creates a new external sorter instance.
    ///
    /// # Arguments
    /// * `threads_number` - Number of threads to be used to sort chunks in parallel. If the parameter is [`None`]
    ///   threads number will be selected based on available CPU core number.
    /// * `tmp_path` - Directory to be used to store temporary data. If paramater is [`None`] default OS temporary
    ///   directory will be used.
    /// * `buffer_builder` - An instance of a buffer builder that will be used for chunk buffer creation.
    /// * `rw_buf_size` - Input, output and spill files read/write buffer size.
    pub fn new(
        threads_number: Option<usize>,
        tmp_path: Option<&Path>,
        buffer_builder: B,
        rw_buf_size: Option<usize>,
    ) -> Result<Self, SortError> {
        return Ok(ExternalSorter {
            rw_buf_size,
            buffer_builder,
            thread_pool: Self::init_thread_pool(threads_number)?,
            tmp_path: tmp_path.map(Into::into),
        });
    }

    fn init_thread_pool(threads_number: Option<usize>) -> Result<rayon::ThreadPool, SortError> {
        let mut thread_pool_builder = rayon::ThreadPoolBuilder::new();

        if let Some(threads_number) = threads_number {
            log::info!("initializing thread-pool (threads: {})", threads_number);
            thread_pool_builder = thread_pool_builder.num_threads(threads_number);
        } else {
            log::info!("initializing thread-pool (threads: default)");
        }
        let thread_pool = thread_pool_builder
            .build()
            .map_err(|err| SortError::ThreadPoolBuildError(err))?;

        return Ok(thread_pool);
    }

    /// Creates a private directory for the spill files of a single sort.
    /// The directory and everything left in it is removed when it is dropped.
    fn init_tmp_directory(&self) -> Result<tempfile::TempDir, SortError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("file-sort-");

        let tmp_dir = if let Some(tmp_path) = &self.tmp_path {
            builder.tempdir_in(tmp_path)
        } else {
            builder.tempdir()
        }
        .map_err(|err| SortError::TempDir(err))?;

        log::info!("using {} as a temporary directory", tmp_dir.path().display());

        return Ok(tmp_dir);
    }

    /// Sorts lines of the input file and writes them to the output file.
    /// The output file is created or truncated; on failure it may be left partially written.
    ///
    /// # Arguments
    /// * `input` - Path of the file to be sorted
    /// * `output` - Path of the file sorted lines are written to
    pub fn sort_file(&self, input: &Path, output: &Path) -> Result<SortSummary, SortError> {
        log::info!("sorting {} into {}", input.display(), output.display());

        let input_file = fs::File::open(input).map_err(|err| SortError::Open(err))?;
        let input_reader = match self.rw_buf_size {
            Some(buf_size) => io::BufReader::with_capacity(buf_size, input_file),
            None => io::BufReader::new(input_file),
        };
        let mut producer = ChunkProducer::new(input_reader);
        let mut buffer = self.buffer_builder.build();

        let mut has_more = producer
            .fill(&mut buffer)
            .map_err(|err| SortError::InputError(err))?;

        if !has_more {
            log::debug!("input fits in a single chunk, writing output directly");
            self.sort_chunk(&mut buffer);
            let lines = self.write_output(output, |writer| {
                line::write_lines(writer, buffer.lines().iter().map(Vec::as_slice))
            })?;

            return Ok(SortSummary {
                lines,
                chunks: usize::from(!buffer.is_empty()),
            });
        }

        let tmp_dir = self.init_tmp_directory()?;
        let mut spill_files = Vec::new();
        loop {
            spill_files.push(self.create_spill(tmp_dir.path(), &mut buffer)?);
            if !has_more {
                break;
            }
            has_more = producer
                .fill(&mut buffer)
                .map_err(|err| SortError::InputError(err))?;
        }
        drop(buffer);

        let chunks = spill_files.len();
        log::debug!(
            "external sort preparation done (lines: {}, chunks: {})",
            producer.lines_read(),
            chunks
        );

        let cursors = spill_files
            .into_iter()
            .map(|spill| spill.into_cursor(self.rw_buf_size))
            .collect::<io::Result<Vec<_>>>()
            .map_err(|err| SortError::IO(err))?;
        let merger = BinaryHeapMerger::new(cursors).map_err(|err| SortError::IO(err))?;
        let lines = self.write_output(output, |writer| merger.merge_into(writer))?;

        tmp_dir.close().map_err(|err| SortError::TempDir(err))?;
        log::debug!("merge done (lines: {})", lines);

        return Ok(SortSummary { lines, chunks });
    }

    fn sort_chunk(&self, buffer: &mut B::Buffer) {
        log::debug!("sorting chunk data ...");
        self.thread_pool.install(|| {
            buffer.par_sort_unstable();
        });
    }

    fn create_spill(&self, dir: &Path, buffer: &mut B::Buffer) -> Result<SpillFile, SortError> {
        self.sort_chunk(buffer);

        log::debug!("saving chunk data");
        let spill = SpillFile::build(dir, buffer.lines(), self.rw_buf_size).map_err(|err| SortError::TempDir(err))?;
        buffer.clear();

        return Ok(spill);
    }

    fn write_output<F>(&self, output: &Path, write: F) -> Result<u64, SortError>
    where
        F: FnOnce(&mut io::BufWriter<fs::File>) -> io::Result<u64>,
    {
        let output_file = fs::File::create(output).map_err(|err| SortError::IO(err))?;
        let mut output_writer = match self.rw_buf_size {
            Some(buf_size) => io::BufWriter::with_capacity(buf_size, output_file),
            None => io::BufWriter::new(output_file),
        };

        let lines = write(&mut output_writer).map_err(|err| SortError::IO(err))?;
        output_writer.flush().map_err(|err| SortError::IO(err))?;

        return Ok(lines);
    }
}
