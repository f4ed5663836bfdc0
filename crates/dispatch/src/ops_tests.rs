// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::Harness;
use simq_core::WorkerId;
use simq_wire::StatusReport;

fn running_job(h: &Harness) -> JobId {
    let resp = h.submit("exp.yaml", None);
    h.dispatcher.pop_next(&WorkerId::new("local")).unwrap().unwrap();
    let mut report = StatusReport::new(resp.job_id.clone(), "running");
    report.worker_id = Some(WorkerId::new("local"));
    h.dispatcher.update_status(&report).unwrap();
    resp.job_id
}

fn finished_job(h: &Harness) -> JobId {
    let job_id = running_job(h);
    let mut report = StatusReport::new(job_id.clone(), "finished");
    report.exit_code = Some(0);
    h.dispatcher.update_status(&report).unwrap();
    job_id
}

#[test]
fn requeue_dispatched_job_without_force() {
    let h = Harness::with_hosts(&["local"]);
    let resp = h.submit("exp.yaml", None);
    h.dispatcher.pop_next(&WorkerId::new("local")).unwrap().unwrap();

    let out = h.dispatcher.ops_requeue(&resp.job_id, &OpsRequeueRequest::default()).unwrap();
    assert_eq!(out.status, JobStatus::Queued);

    let rec = h.dispatcher.registry().get(&resp.job_id).unwrap().unwrap();
    assert_eq!(rec.status, JobStatus::Queued);
    assert_eq!(rec.target_host, None);
    assert_eq!(h.dispatcher.queue().entries().unwrap().len(), 1);
}

#[test]
fn requeue_running_job_needs_force() {
    let h = Harness::with_hosts(&["local"]);
    let job_id = running_job(&h);

    let err = h.dispatcher.ops_requeue(&job_id, &OpsRequeueRequest::default()).unwrap_err();
    assert!(matches!(err, DispatchError::Conflict(_)));

    let out = h
        .dispatcher
        .ops_requeue(&job_id, &OpsRequeueRequest { force: true, ..Default::default() })
        .unwrap();
    assert_eq!(out.status, JobStatus::Queued);
    assert_eq!(h.dispatcher.queue().entries().unwrap().len(), 1);
}

#[test]
fn requeue_can_retarget_the_entry() {
    let h = Harness::with_hosts(&["local", "remote1"]);
    let resp = h.submit("exp.yaml", None);
    h.dispatcher.pop_next(&WorkerId::new("local")).unwrap().unwrap();

    h.dispatcher
        .ops_requeue(
            &resp.job_id,
            &OpsRequeueRequest {
                force: false,
                preferred_host: Some(WorkerId::new("remote1")),
                require_host: Some(true),
            },
        )
        .unwrap();

    let entries = h.dispatcher.queue().entries().unwrap();
    assert_eq!(entries[0].preferred_host, Some(WorkerId::new("remote1")));
    assert!(entries[0].require_host);

    // Only the pinned host can pick it up now.
    assert!(h.dispatcher.pop_next(&WorkerId::new("local")).unwrap().is_none());
    assert!(h.dispatcher.pop_next(&WorkerId::new("remote1")).unwrap().is_some());
}

#[test]
fn requeue_keeps_single_queue_entry() {
    let h = Harness::with_hosts(&["local"]);
    let resp = h.submit("exp.yaml", None);

    // Requeueing an already-queued job refreshes, never duplicates.
    h.dispatcher.ops_requeue(&resp.job_id, &OpsRequeueRequest::default()).unwrap();
    h.dispatcher.ops_requeue(&resp.job_id, &OpsRequeueRequest::default()).unwrap();

    assert_eq!(h.dispatcher.queue().entries().unwrap().len(), 1);
}

#[test]
fn requeue_terminal_needs_force() {
    let h = Harness::with_hosts(&["local"]);
    let job_id = finished_job(&h);

    let err = h.dispatcher.ops_requeue(&job_id, &OpsRequeueRequest::default()).unwrap_err();
    assert!(matches!(err, DispatchError::Conflict(_)));

    // The forced path bypasses the terminal guard entirely.
    h.dispatcher
        .ops_requeue(&job_id, &OpsRequeueRequest { force: true, ..Default::default() })
        .unwrap();
    assert_eq!(h.dispatcher.registry().get(&job_id).unwrap().unwrap().status, JobStatus::Queued);
}

#[test]
fn fail_refuses_unstarted_jobs() {
    let h = Harness::with_hosts(&["local"]);
    let resp = h.submit("exp.yaml", None);

    let err = h.dispatcher.ops_fail(&resp.job_id, &OpsReasonRequest::default()).unwrap_err();
    let DispatchError::Conflict(msg) = err else { panic!("expected conflict") };
    assert!(msg.contains("cancel"));
}

#[test]
fn fail_running_job_records_reason() {
    let h = Harness::with_hosts(&["local"]);
    let job_id = running_job(&h);

    let out = h
        .dispatcher
        .ops_fail(
            &job_id,
            &OpsReasonRequest { reason: Some("bad node".to_string()), force: false },
        )
        .unwrap();
    assert_eq!(out.status, JobStatus::Failed);

    let rec = h.dispatcher.registry().get(&job_id).unwrap().unwrap();
    assert_eq!(rec.error.as_deref(), Some("bad node"));
}

#[test]
fn fail_terminal_needs_force() {
    let h = Harness::with_hosts(&["local"]);
    let job_id = finished_job(&h);

    assert!(matches!(
        h.dispatcher.ops_fail(&job_id, &OpsReasonRequest::default()),
        Err(DispatchError::Conflict(_))
    ));

    h.dispatcher
        .ops_fail(&job_id, &OpsReasonRequest { reason: None, force: true })
        .unwrap();
    assert_eq!(h.dispatcher.registry().get(&job_id).unwrap().unwrap().status, JobStatus::Failed);
}

#[test]
fn cancel_clears_the_queue_entry() {
    let h = Harness::with_hosts(&["local"]);
    let resp = h.submit("exp.yaml", None);

    let out = h.dispatcher.ops_cancel(&resp.job_id, &OpsReasonRequest::default()).unwrap();
    assert_eq!(out.status, JobStatus::Canceled);
    assert!(h.dispatcher.queue().entries().unwrap().is_empty());
}

#[test]
fn cancel_terminal_needs_force() {
    let h = Harness::with_hosts(&["local"]);
    let job_id = finished_job(&h);

    assert!(matches!(
        h.dispatcher.ops_cancel(&job_id, &OpsReasonRequest::default()),
        Err(DispatchError::Conflict(_))
    ));

    h.dispatcher
        .ops_cancel(&job_id, &OpsReasonRequest { reason: None, force: true })
        .unwrap();
    assert_eq!(
        h.dispatcher.registry().get(&job_id).unwrap().unwrap().status,
        JobStatus::Canceled
    );
}

#[test]
fn ops_on_unknown_job_are_not_found() {
    let h = Harness::with_hosts(&["local"]);
    let ghost = JobId::new("ghost");
    assert!(matches!(
        h.dispatcher.ops_requeue(&ghost, &OpsRequeueRequest::default()),
        Err(DispatchError::NotFound(_))
    ));
    assert!(matches!(
        h.dispatcher.ops_fail(&ghost, &OpsReasonRequest::default()),
        Err(DispatchError::NotFound(_))
    ));
    assert!(matches!(
        h.dispatcher.ops_cancel(&ghost, &OpsReasonRequest::default()),
        Err(DispatchError::NotFound(_))
    ));
}

#[test]
fn cleanup_queue_drops_orphaned_entries() {
    let h = Harness::with_hosts(&["local"]);
    let live = h.submit("a.yaml", None);
    let canceled = h.submit("b.yaml", None);

    // Cancel one job but sneak its entry back in, and add an entry with
    // no registry row at all.
    h.dispatcher.stop(&canceled.job_id).unwrap();
    h.dispatcher
        .queue()
        .enqueue(&simq_core::QueueEntry {
            job_id: canceled.job_id.clone(),
            preferred_host: None,
            require_host: false,
        })
        .unwrap();
    h.dispatcher
        .queue()
        .enqueue(&simq_core::QueueEntry {
            job_id: JobId::new("no-registry-row"),
            preferred_host: None,
            require_host: false,
        })
        .unwrap();

    let out = h.dispatcher.ops_cleanup_queue().unwrap();
    assert_eq!(out.removed.len(), 2);
    assert!(out.removed.contains(&canceled.job_id));
    assert!(out.removed.contains(&JobId::new("no-registry-row")));

    let entries = h.dispatcher.queue().entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].job_id, live.job_id);
}
