use super::config::{IdInput, RunConfig, SourceKind};
use anyhow::Context;
use recsweep::{ChannelIdSource, IdSource, Identifier, LockIdSource};
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
    sync::Arc,
};

/// Builds the source every worker pulls from.
///
/// A range feeding a [`LockIdSource`] is iterated lazily; every other
/// combination materializes the IDs up front.
pub fn build_source(config: &RunConfig) -> anyhow::Result<Arc<dyn IdSource>> {
    let source: Arc<dyn IdSource> = match (&config.ids, config.source_kind) {
        (IdInput::Range(range), SourceKind::Lock) => {
            Arc::new(LockIdSource::from_range(range.clone()))
        }
        (IdInput::Range(range), SourceKind::Channel) => {
            Arc::new(ChannelIdSource::new(range.clone()))
        }
        (IdInput::File(path), SourceKind::Lock) => {
            Arc::new(LockIdSource::new(load_ids(path)?.into_iter()))
        }
        (IdInput::File(path), SourceKind::Channel) => {
            Arc::new(ChannelIdSource::new(load_ids(path)?))
        }
    };
    Ok(source)
}

/// Number of IDs the sweep will visit, if known without reading a file.
#[cfg_attr(not(feature = "tracing"), allow(dead_code))]
pub fn planned_len(config: &RunConfig) -> Option<u64> {
    match &config.ids {
        IdInput::Range(range) => Some(range.end - range.start),
        IdInput::File(_) => None,
    }
}

fn load_ids(path: &Path) -> anyhow::Result<Vec<Identifier>> {
    let file =
        File::open(path).with_context(|| format!("failed to open ID file {}", path.display()))?;
    let ids = read_ids(BufReader::new(file))
        .with_context(|| format!("failed to read ID file {}", path.display()))?;

    #[cfg(feature = "tracing")]
    tracing::info!("Loaded {} user IDs from {}", ids.len(), path.display());

    Ok(ids)
}

/// Parses one ID per line, skipping blank lines and `#` comments.
fn read_ids(reader: impl BufRead) -> anyhow::Result<Vec<Identifier>> {
    let mut ids = Vec::new();
    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let id = line
            .parse()
            .with_context(|| format!("line {}: invalid user ID {line:?}", number + 1))?;
        ids.push(id);
    }
    Ok(ids)
}
