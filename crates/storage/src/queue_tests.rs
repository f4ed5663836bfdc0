// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

const TTL: Duration = Duration::from_secs(60);

fn queue() -> (tempfile::TempDir, Queue) {
    let dir = tempfile::tempdir().unwrap();
    let q = Queue::new(dir.path(), TTL);
    (dir, q)
}

fn entry(id: &str) -> QueueEntry {
    QueueEntry { job_id: JobId::new(id), preferred_host: None, require_host: false }
}

fn pinned(id: &str, host: &str) -> QueueEntry {
    QueueEntry {
        job_id: JobId::new(id),
        preferred_host: Some(WorkerId::new(host)),
        require_host: true,
    }
}

#[test]
fn claim_empty_queue_is_none() {
    let (_dir, q) = queue();
    assert!(q.claim(&WorkerId::new("w1")).unwrap().is_none());
}

#[test]
fn enqueue_claim_removes_entry() {
    let (dir, q) = queue();
    q.enqueue(&entry("j-1")).unwrap();

    let claimed = q.claim(&WorkerId::new("w1")).unwrap().unwrap();
    assert_eq!(claimed.job_id, JobId::new("j-1"));

    // Entry and claim file are both gone.
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    assert!(q.claim(&WorkerId::new("w1")).unwrap().is_none());
}

#[test]
fn claim_order_is_mtime_fifo() {
    let (_dir, q) = queue();
    for (i, id) in ["j-a", "j-b", "j-c"].iter().enumerate() {
        q.enqueue(&entry(id)).unwrap();
        // Distinct mtimes; coarse filesystem timestamp granularity would
        // otherwise make the order depend on filename.
        std::thread::sleep(Duration::from_millis(20 + i as u64));
    }

    let w = WorkerId::new("w1");
    assert_eq!(q.claim(&w).unwrap().unwrap().job_id, JobId::new("j-a"));
    assert_eq!(q.claim(&w).unwrap().unwrap().job_id, JobId::new("j-b"));
    assert_eq!(q.claim(&w).unwrap().unwrap().job_id, JobId::new("j-c"));
}

#[test]
fn enqueue_is_idempotent_per_job() {
    let (dir, q) = queue();
    q.enqueue(&entry("j-1")).unwrap();
    q.enqueue(&pinned("j-1", "remote1")).unwrap();

    // One file, carrying the latest payload.
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    let got = q.claim(&WorkerId::new("remote1")).unwrap().unwrap();
    assert!(got.require_host);
}

#[test]
fn required_host_is_enforced() {
    let (_dir, q) = queue();
    q.enqueue(&pinned("j-1", "remote1")).unwrap();

    // The wrong worker cannot take it, and the entry survives the attempt.
    assert!(q.claim(&WorkerId::new("other")).unwrap().is_none());
    assert_eq!(q.entries().unwrap().len(), 1);

    let got = q.claim(&WorkerId::new("remote1")).unwrap().unwrap();
    assert_eq!(got.job_id, JobId::new("j-1"));
}

#[test]
fn preferred_without_require_is_claimable_by_anyone() {
    let (_dir, q) = queue();
    q.enqueue(&QueueEntry {
        job_id: JobId::new("j-1"),
        preferred_host: Some(WorkerId::new("remote1")),
        require_host: false,
    })
    .unwrap();

    assert!(q.claim(&WorkerId::new("other")).unwrap().is_some());
}

#[test]
fn remove_deletes_entry_and_claims() {
    let (dir, q) = queue();
    q.enqueue(&entry("j-1")).unwrap();
    // Simulate a crashed worker's leftover claim.
    std::fs::write(dir.path().join("j-1.json.claim.dead-worker"), b"{}").unwrap();

    q.remove(&JobId::new("j-1")).unwrap();
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

    // Idempotent.
    q.remove(&JobId::new("j-1")).unwrap();
}

#[test]
fn stale_claim_is_recovered_by_any_worker() {
    let dir = tempfile::tempdir().unwrap();
    // Zero TTL: every claim file is immediately stale.
    let q = Queue::new(dir.path(), Duration::ZERO);

    let payload = serde_json::to_vec(&entry("j-1")).unwrap();
    std::fs::write(dir.path().join("j-1.json.claim.crashed"), payload).unwrap();

    let got = q.claim(&WorkerId::new("other")).unwrap().unwrap();
    assert_eq!(got.job_id, JobId::new("j-1"));
}

#[test]
fn fresh_claim_is_left_alone() {
    let (dir, q) = queue();
    let payload = serde_json::to_vec(&entry("j-1")).unwrap();
    std::fs::write(dir.path().join("j-1.json.claim.busy"), payload).unwrap();

    assert!(q.claim(&WorkerId::new("other")).unwrap().is_none());
    assert!(dir.path().join("j-1.json.claim.busy").exists());
}

#[test]
fn stale_claim_with_requeued_entry_is_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let q = Queue::new(dir.path(), Duration::ZERO);

    // The job was requeued while a dead worker's claim lingered.
    q.enqueue(&entry("j-1")).unwrap();
    std::fs::write(dir.path().join("j-1.json.claim.crashed"), b"{\"job_id\":\"j-1\"}").unwrap();

    q.sweep_stale_claims().unwrap();

    // At most one pending file for the job remains.
    let names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["j-1.json".to_string()]);
}

#[test]
fn corrupt_entry_is_dropped_not_fatal() {
    let (dir, q) = queue();
    std::fs::write(dir.path().join("bad.json"), b"{not json").unwrap();
    q.enqueue(&entry("j-1")).unwrap();

    let got = q.claim(&WorkerId::new("w1")).unwrap().unwrap();
    assert_eq!(got.job_id, JobId::new("j-1"));
    assert!(!dir.path().join("bad.json").exists());
}

// Racing workers never claim the same entry twice, and nothing is lost.
#[test]
fn concurrent_claims_are_exclusive() {
    let dir = tempfile::tempdir().unwrap();
    let q = Arc::new(Queue::new(dir.path(), TTL));

    for i in 0..24 {
        q.enqueue(&entry(&format!("j-{i:02}"))).unwrap();
    }

    let handles: Vec<_> = (0..6)
        .map(|w| {
            let q = Arc::clone(&q);
            std::thread::spawn(move || {
                let worker = WorkerId::new(format!("w{w}"));
                let mut got = Vec::new();
                while let Some(e) = q.claim(&worker).unwrap() {
                    got.push(e.job_id);
                }
                got
            })
        })
        .collect();

    let mut all: Vec<JobId> = Vec::new();
    for h in handles {
        all.extend(h.join().unwrap());
    }

    assert_eq!(all.len(), 24, "every entry claimed exactly once");
    let unique: HashSet<_> = all.iter().collect();
    assert_eq!(unique.len(), 24, "no entry claimed twice");
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        // Any interleaving of enqueue/requeue/remove leaves at most one
        // pending file per job id.
        #[test]
        fn at_most_one_entry_per_job(ops in proptest::collection::vec(0u8..3, 1..40)) {
            let dir = tempfile::tempdir().unwrap();
            let q = Queue::new(dir.path(), TTL);
            let id = JobId::new("j-1");

            for op in ops {
                match op {
                    0 => q.enqueue(&entry("j-1")).unwrap(),
                    1 => q.enqueue(&pinned("j-1", "remote1")).unwrap(),
                    _ => q.remove(&id).unwrap(),
                }
                let pending = std::fs::read_dir(dir.path())
                    .unwrap()
                    .filter(|e| {
                        let name = e.as_ref().unwrap().file_name();
                        name.to_string_lossy().starts_with("j-1")
                    })
                    .count();
                prop_assert!(pending <= 1, "found {pending} files for one job");
            }
        }

        // Pinned entries are never handed to the wrong worker, whatever
        // the mix of other entries around them.
        #[test]
        fn affinity_never_leaks(other_jobs in 0usize..5) {
            let dir = tempfile::tempdir().unwrap();
            let q = Queue::new(dir.path(), TTL);

            q.enqueue(&pinned("pinned", "remote1")).unwrap();
            for i in 0..other_jobs {
                q.enqueue(&entry(&format!("free-{i}"))).unwrap();
            }

            let outsider = WorkerId::new("outsider");
            let mut claimed = Vec::new();
            while let Some(e) = q.claim(&outsider).unwrap() {
                claimed.push(e.job_id);
            }

            prop_assert_eq!(claimed.len(), other_jobs);
            prop_assert!(!claimed.contains(&JobId::new("pinned")));
            prop_assert_eq!(q.entries().unwrap().len(), 1);
        }
    }
}
