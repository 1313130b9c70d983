use parking_lot::Mutex;
use std::sync::OnceLock;
use sysinfo::{MemoryRefreshKind, ProcessRefreshKind, ProcessesToUpdate, RefreshKind, System};

const BYTES_PER_MB: u64 = 1_000_000;

static SYSTEM: OnceLock<Mutex<System>> = OnceLock::new();

/// Approximate memory in use by this process versus memory available to it.
///
/// Purely diagnostic: snapshots are logged periodically by workers and by
/// [`StatsTracked`](crate::StatsTracked), and never influence control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemorySnapshot {
    /// Resident set size of this process, in bytes. Falls back to system-wide
    /// used memory when the process can't be inspected.
    pub used_bytes: u64,
    /// Total physical memory, in bytes.
    pub total_bytes: u64,
}

impl MemorySnapshot {
    /// Samples current memory usage.
    ///
    /// The underlying [`System`] handle is created once and reused, so this is
    /// cheap enough to call every few hundred items.
    pub fn capture() -> Self {
        let system = SYSTEM.get_or_init(|| {
            Mutex::new(System::new_with_specifics(
                RefreshKind::nothing()
                    .with_memory(MemoryRefreshKind::nothing().with_ram())
                    .with_processes(ProcessRefreshKind::nothing().with_memory()),
            ))
        });
        let mut system = system.lock();
        system.refresh_memory_specifics(MemoryRefreshKind::nothing().with_ram());

        let process_rss = sysinfo::get_current_pid().ok().and_then(|pid| {
            system.refresh_processes_specifics(
                ProcessesToUpdate::Some(&[pid]),
                false,
                ProcessRefreshKind::nothing().with_memory(),
            );
            system.process(pid).map(|p| p.memory())
        });

        Self {
            used_bytes: process_rss.unwrap_or_else(|| system.used_memory()),
            total_bytes: system.total_memory(),
        }
    }

    /// Used memory in (decimal) megabytes.
    pub const fn used_mb(&self) -> u64 {
        self.used_bytes / BYTES_PER_MB
    }

    /// Total memory in (decimal) megabytes.
    pub const fn total_mb(&self) -> u64 {
        self.total_bytes / BYTES_PER_MB
    }
}

/// Captures a [`MemorySnapshot`] and logs it at info level.
///
/// A no-op when the `tracing` feature is disabled.
pub fn log_memory_statistics() {
    #[cfg(feature = "tracing")]
    {
        let snapshot = MemorySnapshot::capture();
        tracing::info!(
            "Approximate memory used: {}MB / {}MB",
            snapshot.used_mb(),
            snapshot.total_mb()
        );
    }
}
