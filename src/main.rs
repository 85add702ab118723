use std::path::PathBuf;
use std::process;

use bytesize::ByteSize;
use clap::Parser;
use env_logger;
use log;

use file_sort::buffer::mem::MemoryLimitedBufferBuilder;
use file_sort::{ExternalSorter, ExternalSorterBuilder};

/// Sorts the lines of a text file that may be too large to fit in memory.
///
/// Lines are compared byte-wise and written to the output terminated by `\n`.
#[derive(Debug, Parser)]
#[clap(name = "file-sort", version)]
struct Args {
    /// Text file whose lines are sorted
    #[clap(short, long, parse(from_os_str))]
    input: PathBuf,

    /// File the sorted lines are written to (created or truncated)
    #[clap(short, long, parse(from_os_str))]
    output: PathBuf,

    /// Maximum number of lines held in memory per chunk
    #[clap(short = 'n', long)]
    max_lines: Option<usize>,

    /// Memory budget of a single chunk, e.g. 64MiB
    #[clap(short, long, default_value = "64MiB")]
    chunk_size: ByteSize,

    /// Directory spill files are created in [default: OS temporary directory]
    #[clap(short = 'd', long, parse(from_os_str))]
    tmp_dir: Option<PathBuf>,

    /// Number of threads sorting chunks in parallel [default: number of CPUs]
    #[clap(short, long)]
    threads: Option<usize>,

    /// Logging level (off, error, warn, info, debug, trace)
    #[clap(short, long = "loglevel", default_value = "info")]
    log_level: log::LevelFilter,
}

impl Args {
    fn sorter_builder(&self) -> ExternalSorterBuilder {
        let mut buffer_builder = MemoryLimitedBufferBuilder::new(self.chunk_size.as_u64());
        if let Some(max_lines) = self.max_lines {
            buffer_builder = buffer_builder.with_max_lines(max_lines);
        }

        let mut sorter_builder = ExternalSorterBuilder::new().with_buffer(buffer_builder);
        if let Some(threads) = self.threads {
            sorter_builder = sorter_builder.with_threads_number(threads);
        }
        if let Some(tmp_dir) = &self.tmp_dir {
            sorter_builder = sorter_builder.with_tmp_dir(tmp_dir);
        }

        return sorter_builder;
    }
}

fn main() {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(args.log_level)
        .format_timestamp_millis()
        .init();

    let sorter: ExternalSorter = match args.sorter_builder().build() {
        Ok(sorter) => sorter,
        Err(err) => {
            log::error!("sorter initialization error: {}", err);
            process::exit(1);
        }
    };

    match sorter.sort_file(&args.input, &args.output) {
        Ok(summary) => log::info!("sorted {} lines (chunks: {})", summary.lines, summary.chunks),
        Err(err) => {
            log::error!("{} not sorted: {}", args.input.display(), err);
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod test {
    use std::path::Path;

    use bytesize::ByteSize;
    use clap::Parser;
    use rstest::*;

    use super::Args;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["file-sort", "-i", "in.txt", "-o", "out.txt"]).unwrap();

        assert_eq!(args.input, Path::new("in.txt"));
        assert_eq!(args.output, Path::new("out.txt"));
        assert_eq!(args.chunk_size, ByteSize::mib(64));
        assert_eq!(args.max_lines, None);
        assert_eq!(args.tmp_dir, None);
        assert_eq!(args.threads, None);
        assert_eq!(args.log_level, log::LevelFilter::Info);
    }

    #[test]
    fn test_all_options() {
        let args = Args::try_parse_from([
            "file-sort", "-i", "in.txt", "-o", "out.txt", "-n", "1000", "-c", "8MiB", "-d", "/var/tmp", "-t", "3",
            "-l", "debug",
        ])
        .unwrap();

        assert_eq!(args.max_lines, Some(1000));
        assert_eq!(args.chunk_size, ByteSize::mib(8));
        assert_eq!(args.tmp_dir.as_deref(), Some(Path::new("/var/tmp")));
        assert_eq!(args.threads, Some(3));
        assert_eq!(args.log_level, log::LevelFilter::Debug);
        assert!(args.sorter_builder().build().is_ok());
    }

    #[rstest]
    #[case(&["file-sort", "-o", "out.txt"])]
    #[case(&["file-sort", "-i", "in.txt", "-o", "out.txt", "-n", "many"])]
    #[case(&["file-sort", "-i", "in.txt", "-o", "out.txt", "-c", "lots"])]
    #[case(&["file-sort", "-i", "in.txt", "-o", "out.txt", "-l", "loud"])]
    fn test_rejected_arguments(#[case] argv: &[&str]) {
        assert!(Args::try_parse_from(argv).is_err());
    }
}
