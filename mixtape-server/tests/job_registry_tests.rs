//! Job registry concurrency tests

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use mixtape_server::jobs::{JobKind, JobRegistry, JobStatus};

#[test]
fn test_concurrent_creates_are_unique() {
    let registry = Arc::new(JobRegistry::new());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || {
                (0..100)
                    .map(|_| registry.create(JobKind::Mixtape))
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut ids = HashSet::new();
    for handle in handles {
        for id in handle.join().unwrap() {
            assert!(ids.insert(id));
        }
    }
    assert_eq!(registry.len(), 800);
}

#[test]
fn test_pollers_never_see_torn_or_backward_states() {
    let registry = Arc::new(JobRegistry::new());
    let id = registry.create(JobKind::Video);

    let poller = {
        let registry = Arc::clone(&registry);
        std::thread::spawn(move || {
            let mut seen = Vec::new();
            loop {
                let job = registry.lookup(id).unwrap();
                match job.status {
                    JobStatus::Pending | JobStatus::Running => {
                        assert!(job.result.is_none());
                        assert!(job.error.is_none());
                    }
                    JobStatus::Completed => {
                        assert_eq!(job.result.as_deref(), Some("/out/video.mp4"));
                        assert!(job.error.is_none());
                    }
                    JobStatus::Failed => panic!("job should not fail"),
                }
                if seen.last() != Some(&job.status) {
                    seen.push(job.status);
                }
                if job.status.is_terminal() {
                    return seen;
                }
            }
        })
    };

    std::thread::sleep(Duration::from_millis(5));
    registry.mark_running(id).unwrap();
    std::thread::sleep(Duration::from_millis(5));
    registry.complete(id, "/out/video.mp4").unwrap();

    let seen = poller.join().unwrap();
    let rank = |s: &JobStatus| match s {
        JobStatus::Pending => 0,
        JobStatus::Running => 1,
        JobStatus::Completed | JobStatus::Failed => 2,
    };
    assert!(seen.windows(2).all(|w| rank(&w[0]) < rank(&w[1])), "seen = {:?}", seen);
    assert_eq!(seen.last(), Some(&JobStatus::Completed));
}

#[test]
fn test_only_one_terminal_transition_wins() {
    let registry = Arc::new(JobRegistry::new());
    let id = registry.create(JobKind::Mixtape);
    registry.mark_running(id).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || {
                if i % 2 == 0 {
                    registry.complete(id, format!("out-{}", i)).is_ok()
                } else {
                    registry.fail(id, format!("err-{}", i)).is_ok()
                }
            })
        })
        .collect();

    let winners = handles.into_iter().map(|h| h.join().unwrap()).filter(|ok| *ok).count();
    assert_eq!(winners, 1);
    assert!(registry.lookup(id).unwrap().status.is_terminal());
}
