// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use simq_core::JobStatus;

fn sample_record(status: JobStatus) -> JobRecord {
    JobRecord {
        job_name: "exp-run".to_string(),
        config_path: "configs/exp.yaml".to_string(),
        preferred_host: None,
        require_host: false,
        target_host: None,
        status,
        status_updated_at: 1_000,
        container_id: None,
        container_name: None,
        exit_code: None,
        error: None,
        experiment_name: "exp".to_string(),
        run_name: "run".to_string(),
    }
}

fn registry() -> (tempfile::TempDir, Registry) {
    let dir = tempfile::tempdir().unwrap();
    let layout = SharedLayout::new(dir.path());
    layout.ensure().unwrap();
    (dir, Registry::open(&layout))
}

#[test]
fn empty_registry_snapshot() {
    let (_dir, reg) = registry();
    assert!(reg.snapshot().unwrap().is_empty());
}

#[test]
fn mutate_persists_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let layout = SharedLayout::new(dir.path());
    layout.ensure().unwrap();

    let reg = Registry::open(&layout);
    reg.try_mutate::<_, StorageError>(|jobs| {
        jobs.insert(JobId::new("j-1"), sample_record(JobStatus::Queued));
        Ok(())
    })
    .unwrap();

    // A second handle sees the write: the file is the source of truth.
    let other = Registry::open(&layout);
    let snapshot = other.snapshot().unwrap();
    assert_eq!(snapshot.get(&JobId::new("j-1")).unwrap().status, JobStatus::Queued);
}

#[test]
fn failed_mutation_does_not_persist() {
    let (_dir, reg) = registry();
    reg.try_mutate::<_, StorageError>(|jobs| {
        jobs.insert(JobId::new("j-1"), sample_record(JobStatus::Queued));
        Ok(())
    })
    .unwrap();

    #[derive(Debug, thiserror::Error)]
    enum TestError {
        #[error("storage: {0}")]
        Storage(#[from] StorageError),
        #[error("rejected")]
        Rejected,
    }

    let result: Result<(), TestError> = reg.try_mutate(|jobs| {
        jobs.remove(&JobId::new("j-1"));
        Err(TestError::Rejected)
    });
    assert!(matches!(result, Err(TestError::Rejected)));

    // The removal above was discarded.
    assert!(reg.get(&JobId::new("j-1")).unwrap().is_some());
}

#[test]
fn get_returns_single_record() {
    let (_dir, reg) = registry();
    assert!(reg.get(&JobId::new("missing")).unwrap().is_none());

    reg.try_mutate::<_, StorageError>(|jobs| {
        jobs.insert(JobId::new("j-2"), sample_record(JobStatus::Running));
        Ok(())
    })
    .unwrap();

    assert_eq!(reg.get(&JobId::new("j-2")).unwrap().unwrap().status, JobStatus::Running);
}

#[test]
fn unreadable_file_serves_cached_copy() {
    let dir = tempfile::tempdir().unwrap();
    let layout = SharedLayout::new(dir.path());
    layout.ensure().unwrap();

    let reg = Registry::open(&layout);
    reg.try_mutate::<_, StorageError>(|jobs| {
        jobs.insert(JobId::new("j-1"), sample_record(JobStatus::Queued));
        Ok(())
    })
    .unwrap();

    std::fs::write(layout.registry_path(), b"{torn write").unwrap();

    let snapshot = reg.snapshot().unwrap();
    assert!(snapshot.contains_key(&JobId::new("j-1")));
}

#[test]
fn concurrent_mutations_serialize() {
    let dir = tempfile::tempdir().unwrap();
    let layout = SharedLayout::new(dir.path());
    layout.ensure().unwrap();

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let layout = layout.clone();
            std::thread::spawn(move || {
                let reg = Registry::open(&layout);
                for i in 0..10 {
                    reg.try_mutate::<_, StorageError>(|jobs| {
                        jobs.insert(
                            JobId::new(format!("j-{t}-{i}")),
                            sample_record(JobStatus::Queued),
                        );
                        Ok(())
                    })
                    .unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let reg = Registry::open(&layout);
    assert_eq!(reg.snapshot().unwrap().len(), 40);
}
