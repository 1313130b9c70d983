use super::config::Output;
use anyhow::Context;
use parking_lot::Mutex;
use recsweep::{ComputationResult, Error, Identifier, Result, ScoredItem, Sink};
use serde::Serialize;
use std::{
    fs::File,
    io::{self, BufWriter, Write},
};

/// One output line.
#[derive(Serialize)]
struct Record<'a> {
    id: Identifier,
    items: &'a [ScoredItem],
}

/// Writes each result as one JSON object per line.
///
/// Lines from different workers never interleave; their order is whatever
/// order the workers finish in. Buffered output is flushed by
/// [`flush`](Self::flush) and on drop.
pub struct JsonLinesSink {
    out: Mutex<BufWriter<Box<dyn Write + Send>>>,
}

impl JsonLinesSink {
    pub fn new(out: impl Write + Send + 'static) -> Self {
        Self {
            out: Mutex::new(BufWriter::new(Box::new(out))),
        }
    }

    /// Opens stdout or creates (truncating) the output file.
    pub fn open(output: &Output) -> anyhow::Result<Self> {
        Ok(match output {
            Output::Stdout => Self::new(io::stdout()),
            Output::File(path) => {
                let file = File::create(path)
                    .with_context(|| format!("failed to create output {}", path.display()))?;
                Self::new(file)
            }
        })
    }

    pub fn flush(&self) -> io::Result<()> {
        self.out.lock().flush()
    }
}

impl Sink for JsonLinesSink {
    fn write(&self, id: Identifier, result: &ComputationResult) -> Result<()> {
        // Serialize outside the lock so workers only contend on the copy.
        let mut line = serde_json::to_vec(&Record { id, items: result }).map_err(Error::write)?;
        line.push(b'\n');
        self.out.lock().write_all(&line).map_err(Error::write)
    }
}

impl Drop for JsonLinesSink {
    fn drop(&mut self) {
        if let Err(_e) = self.out.get_mut().flush() {
            #[cfg(feature = "tracing")]
            tracing::error!("Failed to flush results: {_e}");
        }
    }
}
