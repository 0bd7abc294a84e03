//! Progress reporting for split and gather runs.
//!
//! Orchestration functions take a `&dyn Diagnostics` instead of logging
//! through global state, so library callers decide where messages go.

use std::path::Path;

/// Receives progress events from orchestration calls. Every method defaults
/// to doing nothing.
pub trait Diagnostics {
    fn planned(&self, _source: &Path, _n_chunks: usize) {}

    fn writing_chunk(&self, _index: usize, _path: &Path, _offset: u64, _n_bytes: u64) {}

    fn gathered(&self, _output: &Path, _n_inputs: usize) {}
}

/// Discards all events
impl Diagnostics for () {}

/// Forwards events to `tracing` at info level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn planned(&self, source: &Path, n_chunks: usize) {
        tracing::info!(
            "{} will be split into {} chunks",
            source.display(),
            n_chunks
        );
    }

    fn writing_chunk(&self, index: usize, path: &Path, offset: u64, n_bytes: u64) {
        tracing::info!(
            "Writing chunk {} to {} ({} bytes from offset {})",
            index,
            path.display(),
            n_bytes,
            offset
        );
    }

    fn gathered(&self, output: &Path, n_inputs: usize) {
        tracing::info!("Gathered {} inputs into {}", n_inputs, output.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder(RefCell<Vec<String>>);

    impl Diagnostics for Recorder {
        fn writing_chunk(&self, index: usize, path: &Path, _offset: u64, _n_bytes: u64) {
            self.0
                .borrow_mut()
                .push(format!("{}:{}", index, path.display()));
        }
    }

    #[test]
    fn test_default_methods_are_noops() {
        let recorder = Recorder::default();
        recorder.planned(Path::new("in.bam"), 3);
        recorder.gathered(Path::new("out.bam"), 3);
        recorder.writing_chunk(0, Path::new("reads.chunk0.bam"), 0, 10);
        assert_eq!(*recorder.0.borrow(), vec!["0:reads.chunk0.bam".to_string()]);
    }
}
