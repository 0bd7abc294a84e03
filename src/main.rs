use clap::Parser;
use std::fs::File;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pbchunkr::{
    Config,
    chunking::{combine_with_header, extract_chunk, gather_chunks, split_bam, write_byte_ranges},
    config::Command,
    diagnostics::TracingDiagnostics,
    gather::gather_zmw_chunks,
};

fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let diagnostics = TracingDiagnostics;

    match &config.command {
        Command::Split { bam, chunks, .. } => {
            let options = config
                .command
                .split_options()
                .ok_or_else(|| anyhow::anyhow!("split options missing"))?;
            let report = split_bam(bam, *chunks, &options, &diagnostics)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Ranges {
            bam,
            chunks,
            output,
        } => {
            let ranges = write_byte_ranges(bam, *chunks, output)?;
            tracing::info!("Wrote {} byte ranges to {:?}", ranges.len(), output);
        }
        Command::Extract {
            bam,
            output,
            header_bytes,
            offset,
            length,
        } => {
            let mut bam_in = File::open(bam)?;
            extract_chunk(&mut bam_in, output, *header_bytes, *offset, *length)?;
            tracing::info!("Wrote {:?}", output);
        }
        Command::Combine {
            header,
            records,
            output,
        } => {
            combine_with_header(header, records, output)?;
            tracing::info!("Wrote {:?}", output);
        }
        Command::GatherBam {
            output,
            header_bytes,
            chunks,
        } => {
            gather_chunks(chunks, *header_bytes, output, &diagnostics)?;
        }
        Command::GatherZmws { merged, chunks } => {
            let n = gather_zmw_chunks(chunks, merged, &diagnostics)?;
            tracing::info!("{} ZMWs written to {:?}", n, merged);
        }
    }

    Ok(())
}
