use crate::{
    BatchStats, ChannelIdSource, Computation, ComputationResult, Error, IdSource, Identifier,
    LockIdSource, PoolConfig, Result, ScoredItem, Sink, Worker, WorkerPool,
};
use crossbeam_channel::{Receiver, Sender, bounded};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use tokio_util::sync::CancellationToken;

/// Returns `result_size` items derived from the ID; fails for IDs matching
/// `fail_if`.
struct MockComputation {
    fail_if: fn(Identifier) -> bool,
}

impl MockComputation {
    fn ok() -> Self {
        Self { fail_if: |_| false }
    }
}

impl Computation for MockComputation {
    fn compute(&self, id: Identifier, result_size: usize) -> Result<ComputationResult> {
        if (self.fail_if)(id) {
            return Err(Error::compute(format!("no model for {id}")));
        }
        Ok((0..result_size as u64)
            .map(|i| ScoredItem::new(id * 100 + i, 1.0 / (i + 1) as f32))
            .collect())
    }
}

/// Records every ID it is asked to write.
#[derive(Default)]
struct RecordingSink {
    written: Mutex<Vec<Identifier>>,
    calls: AtomicUsize,
    fail_if: Option<fn(Identifier) -> bool>,
}

impl RecordingSink {
    fn failing(fail_if: fn(Identifier) -> bool) -> Self {
        Self {
            fail_if: Some(fail_if),
            ..Self::default()
        }
    }

    fn sorted(&self) -> Vec<Identifier> {
        let mut ids = self.written.lock().clone();
        ids.sort_unstable();
        ids
    }
}

impl Sink for RecordingSink {
    fn write(&self, id: Identifier, result: &ComputationResult) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_if.is_some_and(|f| f(id)) {
            return Err(Error::write(std::io::Error::other("index rejected document")));
        }
        assert!(!result.is_empty());
        self.written.lock().push(id);
        Ok(())
    }
}

/// Blocks on every ID until the test releases it, announcing each ID first.
struct GatedComputation {
    started: Sender<Identifier>,
    release: Receiver<()>,
}

impl Computation for GatedComputation {
    fn compute(&self, id: Identifier, _result_size: usize) -> Result<ComputationResult> {
        self.started.send(id).unwrap();
        self.release.recv().unwrap();
        Ok(vec![ScoredItem::new(id, 1.0)])
    }
}

fn run_pool<S>(source: S, num_workers: usize, total: u64)
where
    S: IdSource + 'static,
{
    let sink = Arc::new(RecordingSink::default());
    let stats = BatchStats::new();
    let pool = WorkerPool::new(
        PoolConfig::new(num_workers, 3),
        source,
        MockComputation::ok(),
        Arc::clone(&sink),
        stats.clone(),
    )
    .unwrap();

    let report = pool.run().unwrap();

    assert_eq!(report.workers.len(), num_workers);
    assert_eq!(report.processed(), total);
    assert_eq!(report.failed(), 0);
    assert!(!report.stopped());
    assert_eq!(stats.timing().count(), total);
    assert_eq!(stats.failures().get(), 0);
    // Exactly once: no duplicates, no omissions.
    assert_eq!(sink.sorted(), (0..total).collect::<Vec<_>>());
}

#[test]
fn every_id_delivered_exactly_once() {
    for num_workers in 1..=8 {
        for total in [0, 1, 1_000] {
            run_pool(LockIdSource::from_range(0..total), num_workers, total);
            run_pool(ChannelIdSource::new(0..total), num_workers, total);
        }
    }
}

#[test]
fn computation_failures_are_isolated() {
    const TOTAL: u64 = 500;
    let sink = Arc::new(RecordingSink::default());
    let stats = BatchStats::new();
    let pool = WorkerPool::new(
        PoolConfig::new(4, 5),
        LockIdSource::from_range(0..TOTAL),
        MockComputation {
            fail_if: |id| id % 7 == 0,
        },
        Arc::clone(&sink),
        stats.clone(),
    )
    .unwrap();

    let report = pool.run().unwrap();
    let expected_failures = (0..TOTAL).filter(|id| id % 7 == 0).count() as u64;

    assert_eq!(report.processed(), TOTAL);
    assert_eq!(report.failed(), expected_failures);
    assert_eq!(report.succeeded(), TOTAL - expected_failures);
    assert_eq!(stats.failures().get(), expected_failures);
    assert_eq!(stats.timing().count(), TOTAL - expected_failures);
    // Failed items never reach the sink.
    assert!(sink.sorted().iter().all(|id| id % 7 != 0));
    assert_eq!(sink.calls.load(Ordering::SeqCst) as u64, TOTAL - expected_failures);
}

#[test]
fn write_failures_are_counted_and_skipped() {
    let sink = Arc::new(RecordingSink::failing(|id| id == 3 || id == 8));
    let stats = BatchStats::new();
    let report = WorkerPool::new(
        PoolConfig::new(2, 1),
        ChannelIdSource::new(0..10),
        MockComputation::ok(),
        Arc::clone(&sink),
        stats.clone(),
    )
    .unwrap()
    .run()
    .unwrap();

    assert_eq!(report.processed(), 10);
    assert_eq!(report.failed(), 2);
    assert_eq!(stats.failures().get(), 2);
    assert_eq!(sink.sorted(), vec![0, 1, 2, 4, 5, 6, 7, 9]);
}

#[test]
fn exhausted_source_returns_immediately() {
    let source = Arc::new(LockIdSource::from_range(0..0));
    let sink = Arc::new(RecordingSink::default());
    let stats = BatchStats::new();
    let worker = Worker::new(
        0,
        source,
        Arc::new(MockComputation::ok()),
        Arc::clone(&sink),
        10,
        stats.clone(),
        &CancellationToken::new(),
    );

    let report = worker.run().unwrap();

    assert_eq!(report.processed(), 0);
    assert!(!report.stopped);
    assert_eq!(sink.calls.load(Ordering::SeqCst), 0);
    assert_eq!(stats.timing().count(), 0);
}

#[test]
fn stop_prevents_further_pulls() {
    const TOTAL: u64 = 50;
    let source = Arc::new(ChannelIdSource::new(0..TOTAL));
    let (started_tx, started_rx) = bounded(1);
    let (release_tx, release_rx) = bounded(1);
    let sink = Arc::new(RecordingSink::default());

    let worker = Arc::new(Worker::new(
        7,
        Arc::clone(&source),
        Arc::new(GatedComputation {
            started: started_tx,
            release: release_rx,
        }),
        Arc::clone(&sink),
        1,
        BatchStats::new(),
        &CancellationToken::new(),
    ));

    let handle = {
        let worker = Arc::clone(&worker);
        thread::spawn(move || worker.run())
    };

    // Wait until the first ID is in flight, then stop.
    assert_eq!(started_rx.recv().unwrap(), 0);
    worker.stop();
    assert!(worker.is_stopped());
    release_tx.send(()).unwrap();

    let report = handle.join().unwrap().unwrap();

    // The in-flight item completes; nothing else is pulled.
    assert_eq!(report.worker, 7);
    assert_eq!(report.processed(), 1);
    assert!(report.stopped);
    assert_eq!(sink.sorted(), vec![0]);
    assert_eq!(source.remaining() as u64, TOTAL - 1);
}

#[test]
fn failure_after_stop_is_still_counted() {
    const TOTAL: u64 = 20;
    let source = Arc::new(ChannelIdSource::new(0..TOTAL));
    let (started_tx, started_rx) = bounded(1);
    let (release_tx, release_rx) = bounded(1);
    let sink = Arc::new(RecordingSink::failing(|id| id == 0));
    let stats = BatchStats::new();

    let worker = Arc::new(Worker::new(
        0,
        Arc::clone(&source),
        Arc::new(GatedComputation {
            started: started_tx,
            release: release_rx,
        }),
        Arc::clone(&sink),
        1,
        stats.clone(),
        &CancellationToken::new(),
    ));

    let handle = {
        let worker = Arc::clone(&worker);
        thread::spawn(move || worker.run())
    };

    // Stop while ID 0 is computing; its write then fails.
    assert_eq!(started_rx.recv().unwrap(), 0);
    worker.stop();
    release_tx.send(()).unwrap();

    let report = handle.join().unwrap().unwrap();

    assert_eq!(report.failed, 1);
    assert_eq!(report.succeeded, 0);
    assert!(report.stopped);
    assert_eq!(stats.failures().get(), 1);
    assert_eq!(stats.timing().count(), 0);
    assert_eq!(sink.calls.load(Ordering::SeqCst), 1);
    assert_eq!(source.remaining() as u64, TOTAL - 1);
}

#[test]
fn stopped_worker_never_pulls() {
    let source = Arc::new(ChannelIdSource::new(0..5));
    let worker = Worker::new(
        0,
        Arc::clone(&source),
        Arc::new(MockComputation::ok()),
        Arc::new(RecordingSink::default()),
        1,
        BatchStats::new(),
        &CancellationToken::new(),
    );

    worker.stop();
    let report = worker.run().unwrap();

    assert_eq!(report.processed(), 0);
    assert!(report.stopped);
    assert_eq!(source.remaining(), 5);
}

#[test]
fn cancelled_computation_exits_quietly() {
    struct Cancelling;
    impl Computation for Cancelling {
        fn compute(&self, id: Identifier, _result_size: usize) -> Result<ComputationResult> {
            if id == 2 {
                Err(Error::Cancelled)
            } else {
                Ok(vec![ScoredItem::new(id, 0.5)])
            }
        }
    }

    let source = Arc::new(LockIdSource::from_range(0..10));
    let stats = BatchStats::new();
    let worker = Worker::new(
        0,
        Arc::clone(&source),
        Arc::new(Cancelling),
        Arc::new(RecordingSink::default()),
        1,
        stats.clone(),
        &CancellationToken::new(),
    );

    let report = worker.run().unwrap();

    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 0);
    assert!(report.stopped);
    // Cancellation is not a failure.
    assert_eq!(stats.failures().get(), 0);
    assert_eq!(source.pull().unwrap_ready(), 3);
}

#[test]
fn worker_runs_at_most_once() {
    let worker = Worker::new(
        3,
        Arc::new(LockIdSource::from_range(0..2)),
        Arc::new(MockComputation::ok()),
        Arc::new(RecordingSink::default()),
        1,
        BatchStats::new(),
        &CancellationToken::new(),
    );

    assert_eq!(worker.run().unwrap().processed(), 2);
    assert!(matches!(worker.run(), Err(Error::WorkerReused { worker: 3 })));
}

#[test]
fn parent_token_stops_worker() {
    let parent = CancellationToken::new();
    let source = Arc::new(ChannelIdSource::new(0..3));
    let worker = Worker::new(
        0,
        Arc::clone(&source),
        Arc::new(MockComputation::ok()),
        Arc::new(RecordingSink::default()),
        1,
        BatchStats::new(),
        &parent,
    );

    parent.cancel();
    assert!(worker.is_stopped());
    assert_eq!(worker.run().unwrap().processed(), 0);
    assert_eq!(source.remaining(), 3);
}

#[test]
fn pool_stop_all_drains_in_flight_items() {
    const WORKERS: usize = 3;
    const TOTAL: u64 = 100;
    let source = Arc::new(ChannelIdSource::new(0..TOTAL));
    let (started_tx, started_rx) = bounded(WORKERS);
    let (release_tx, release_rx) = bounded(WORKERS);
    let sink = Arc::new(RecordingSink::default());

    let mut pool = WorkerPool::new(
        PoolConfig::new(WORKERS, 1).with_thread_name_prefix("test-worker"),
        Arc::clone(&source),
        GatedComputation {
            started: started_tx,
            release: release_rx,
        },
        Arc::clone(&sink),
        BatchStats::new(),
    )
    .unwrap();
    pool.start().unwrap();

    // Every worker holds exactly one ID.
    for _ in 0..WORKERS {
        started_rx.recv().unwrap();
    }
    pool.stop_all();
    for _ in 0..WORKERS {
        release_tx.send(()).unwrap();
    }

    let report = pool.join().unwrap();

    assert_eq!(report.processed(), WORKERS as u64);
    assert!(report.workers.iter().all(|w| w.stopped));
    assert_eq!(sink.calls.load(Ordering::SeqCst), WORKERS);
    assert_eq!(source.remaining() as u64, TOTAL - WORKERS as u64);
}

#[test]
fn pool_shutdown_token_cancels_every_worker() {
    let source = Arc::new(LockIdSource::from_range(0..1_000));
    let pool = WorkerPool::new(
        PoolConfig::new(4, 1),
        Arc::clone(&source),
        MockComputation::ok(),
        RecordingSink::default(),
        BatchStats::new(),
    )
    .unwrap();

    pool.shutdown_token().cancel();
    let report = pool.run().unwrap();

    assert_eq!(report.processed(), 0);
    assert!(report.workers.iter().all(|w| w.stopped));
    assert_eq!(source.pull().unwrap_ready(), 0);
}

#[test]
fn pool_rejects_invalid_config() {
    let build = |config| {
        WorkerPool::new(
            config,
            LockIdSource::from_range(0..1),
            MockComputation::ok(),
            RecordingSink::default(),
            BatchStats::new(),
        )
    };

    assert!(matches!(
        build(PoolConfig::new(0, 10)),
        Err(Error::InvalidConfig { .. })
    ));
    assert!(matches!(
        build(PoolConfig::new(2, 0)),
        Err(Error::InvalidConfig { .. })
    ));
}

#[test]
fn pool_starts_once() {
    let mut pool = WorkerPool::new(
        PoolConfig::new(2, 1),
        LockIdSource::from_range(0..10),
        MockComputation::ok(),
        RecordingSink::default(),
        BatchStats::new(),
    )
    .unwrap();

    pool.start().unwrap();
    assert!(matches!(pool.start(), Err(Error::AlreadyStarted)));
    assert_eq!(pool.join().unwrap().processed(), 10);
}

#[test]
fn unstarted_pool_joins_empty() {
    let pool = WorkerPool::new(
        PoolConfig::new(2, 1),
        LockIdSource::from_range(0..10),
        MockComputation::ok(),
        RecordingSink::default(),
        BatchStats::new(),
    )
    .unwrap();

    assert_eq!(pool.num_workers(), 2);
    assert!(pool.join().unwrap().workers.is_empty());
}

#[test]
fn panicking_worker_is_reported_after_join() {
    struct Panicking;
    impl Computation for Panicking {
        fn compute(&self, id: Identifier, _result_size: usize) -> Result<ComputationResult> {
            if id == 0 {
                panic!("computation bug");
            }
            Ok(vec![ScoredItem::new(id, 1.0)])
        }
    }

    let sink = Arc::new(RecordingSink::default());
    let result = WorkerPool::new(
        PoolConfig::new(2, 1),
        LockIdSource::from_range(0..20),
        Panicking,
        Arc::clone(&sink),
        BatchStats::new(),
    )
    .unwrap()
    .run();

    let Err(Error::WorkerPanicked { partial, .. }) = result else {
        panic!("expected a panicked worker");
    };
    // The surviving worker drained the rest and its report is kept.
    assert_eq!(sink.sorted(), (1..20).collect::<Vec<_>>());
    assert_eq!(partial.workers.len(), 1);
    assert_eq!(partial.processed(), 19);
    assert_eq!(partial.failed(), 0);
}
