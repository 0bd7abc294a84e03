use crate::chunking::SplitOptions;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "pbchunkr")]
#[command(about = "Split and reassemble PacBio BAM files at ZMW boundaries")]
#[command(version)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Write up to N chunk BAMs, each cut at a ZMW boundary
    Split {
        /// Input BAM, with its PacBio index next to it (<bam>.pbi)
        bam: PathBuf,

        /// Number of chunks to aim for
        #[arg(short = 'n', long, env = "PBCHUNKR_CHUNKS", default_value = "1")]
        chunks: usize,

        /// Output prefix; chunks are written to <prefix>.chunk<i>.<extension>
        #[arg(long, default_value = "reads")]
        prefix: String,

        /// Chunk file extension, empty for none
        #[arg(long, default_value = "bam")]
        extension: String,

        /// Also write a .pbi for every chunk
        #[arg(long)]
        write_index: bool,
    },

    /// Write the chunk byte ranges of a BAM as a start/end table
    Ranges {
        bam: PathBuf,

        #[arg(short = 'n', long, env = "PBCHUNKR_CHUNKS", default_value = "1")]
        chunks: usize,

        /// Tab-separated output table
        #[arg(short, long, default_value = "chunks.tsv")]
        output: PathBuf,
    },

    /// Copy a single byte range of a BAM into a standalone BAM
    Extract {
        bam: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        /// Size of the BAM header in compressed bytes
        #[arg(long)]
        header_bytes: u64,

        /// Offset of the first record block to copy
        #[arg(long)]
        offset: u64,

        /// Number of bytes to copy
        #[arg(long)]
        length: u64,
    },

    /// Join a header-only file and a records-only file into a BAM
    Combine {
        header: PathBuf,
        records: PathBuf,
        output: PathBuf,
    },

    /// Reassemble chunk BAMs produced by `split`
    GatherBam {
        output: PathBuf,

        /// Size of the BAM header shared by all chunks
        #[arg(long)]
        header_bytes: u64,

        #[arg(required = true)]
        chunks: Vec<PathBuf>,
    },

    /// Merge gzipped per-chunk CCS ZMW metrics
    GatherZmws {
        /// Name of merged json.gz
        merged: PathBuf,

        /// Chunk outputs
        #[arg(required = true)]
        chunks: Vec<PathBuf>,
    },
}

impl Command {
    /// Split settings, when this is a `split` invocation
    pub fn split_options(&self) -> Option<SplitOptions> {
        match self {
            Command::Split {
                prefix,
                extension,
                write_index,
                ..
            } => Some(SplitOptions {
                prefix: prefix.clone(),
                extension: extension.clone(),
                write_index: *write_index,
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_defaults() {
        let config = Config::try_parse_from(["pbchunkr", "split", "movie.bam", "-n", "8"]).unwrap();
        match &config.command {
            Command::Split { bam, chunks, .. } => {
                assert_eq!(bam, &PathBuf::from("movie.bam"));
                assert_eq!(*chunks, 8);
            }
            other => panic!("unexpected command: {:?}", other),
        }

        let options = config.command.split_options().unwrap();
        assert_eq!(options.prefix, "reads");
        assert_eq!(options.extension, "bam");
        assert!(!options.write_index);
    }

    #[test]
    fn test_split_custom_naming() {
        let config = Config::try_parse_from([
            "pbchunkr",
            "split",
            "movie.bam",
            "--prefix",
            "out/movie",
            "--extension",
            "subreads.bam",
            "--write-index",
        ])
        .unwrap();

        let options = config.command.split_options().unwrap();
        assert_eq!(
            options.chunk_path(2),
            PathBuf::from("out/movie.chunk2.subreads.bam")
        );
        assert!(options.write_index);
    }

    #[test]
    fn test_gather_zmws_requires_chunks() {
        assert!(Config::try_parse_from(["pbchunkr", "gather-zmws", "merged.json.gz"]).is_err());
    }

    #[test]
    fn test_split_options_only_for_split() {
        let config = Config::try_parse_from([
            "pbchunkr",
            "combine",
            "header.bam",
            "records.bin",
            "out.bam",
        ])
        .unwrap();
        assert!(config.command.split_options().is_none());
    }
}
