use crate::{ChannelIdSource, IdSource, Identifier, LockIdSource, Pull};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::thread::scope;

fn run_yields_in_order_then_exhausts<S>(source: S, expected: &[Identifier])
where
    S: IdSource,
{
    for &id in expected {
        assert_eq!(source.pull(), Pull::Ready { id });
    }
    assert!(source.pull().is_exhausted());
    // Exhaustion is sticky.
    for _ in 0..3 {
        assert_eq!(source.pull(), Pull::Exhausted);
    }
}

fn run_each_id_pulled_once_threaded<S>(make_source: impl Fn(Vec<Identifier>) -> S)
where
    S: IdSource,
{
    const THREADS: usize = 8;
    const TOTAL_IDS: u64 = 10_000;

    let source = make_source((0..TOTAL_IDS).collect());
    let seen_ids = Arc::new(Mutex::new(HashSet::with_capacity(TOTAL_IDS as usize)));

    scope(|s| {
        for _ in 0..THREADS {
            let seen_ids = Arc::clone(&seen_ids);
            let source = &source;
            s.spawn(move || {
                while let Pull::Ready { id } = source.pull() {
                    let mut set = seen_ids.lock().unwrap();
                    assert!(set.insert(id), "id {id} pulled twice");
                }
            });
        }
    });

    let seen = seen_ids.lock().unwrap();
    assert_eq!(seen.len(), TOTAL_IDS as usize);
    assert!((0..TOTAL_IDS).all(|id| seen.contains(&id)));
}

#[test]
fn lock_source_yields_in_order() {
    run_yields_in_order_then_exhausts(LockIdSource::from_range(5..9), &[5, 6, 7, 8]);
}

#[test]
fn channel_source_yields_in_order() {
    run_yields_in_order_then_exhausts(ChannelIdSource::new(vec![42, 1, 42_000]), &[42, 1, 42_000]);
}

#[test]
fn empty_sources_start_exhausted() {
    run_yields_in_order_then_exhausts(LockIdSource::new(core::iter::empty()), &[]);
    run_yields_in_order_then_exhausts(ChannelIdSource::new(core::iter::empty()), &[]);
}

#[test]
fn lock_source_stays_exhausted_when_iterator_resumes() {
    // An iterator that yields None once and then resumes.
    struct Flaky(u64);
    impl Iterator for Flaky {
        type Item = u64;
        fn next(&mut self) -> Option<u64> {
            self.0 += 1;
            if self.0 == 2 { None } else { Some(self.0) }
        }
    }

    let source = LockIdSource::new(Flaky(0));
    assert_eq!(source.pull(), Pull::Ready { id: 1 });
    assert_eq!(source.pull(), Pull::Exhausted);
    assert_eq!(source.pull(), Pull::Exhausted);
}

#[test]
fn channel_source_counts_remaining() {
    let source = ChannelIdSource::new(0..3);
    assert_eq!(source.remaining(), 3);
    source.pull().unwrap_ready();
    assert_eq!(source.remaining(), 2);
}

#[test]
fn shared_through_arc() {
    let source: Arc<dyn IdSource> = Arc::new(LockIdSource::from_range(0..1));
    let shared = Arc::clone(&source);
    assert_eq!(shared.pull(), Pull::Ready { id: 0 });
    assert!(source.pull().is_exhausted());
}

#[test]
fn lock_source_threaded() {
    run_each_id_pulled_once_threaded(|ids| LockIdSource::new(ids.into_iter()));
}

#[test]
fn channel_source_threaded() {
    run_each_id_pulled_once_threaded(ChannelIdSource::new::<Vec<Identifier>>);
}
