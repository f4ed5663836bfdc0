// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;
use simq_core::{JobId, JobStatus, WorkerId};

#[test]
fn submit_request_minimal() {
    let req: SubmitRequest =
        serde_json::from_value(json!({"config_path": "exp.yaml"})).unwrap();
    assert_eq!(req.config_path.as_deref(), Some("exp.yaml"));
    assert!(req.target_host.is_none());
}

#[test]
fn submit_request_rejects_unknown_fields() {
    let result: Result<SubmitRequest, _> =
        serde_json::from_value(json!({"config_path": "exp.yaml", "tarbet_host": "remote1"}));
    assert!(result.is_err());
}

#[test]
fn status_report_rejects_unknown_fields() {
    let result: Result<StatusReport, _> = serde_json::from_value(json!({
        "job_id": "j-1",
        "status": "running",
        "exit": 0,
    }));
    assert!(result.is_err());
}

#[test]
fn status_report_round_trip() {
    let mut report = StatusReport::new(JobId::new("j-1"), "finished");
    report.worker_id = Some(WorkerId::new("remote1"));
    report.exit_code = Some(0);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["status"], "finished");
    assert!(json.get("container_id").is_none());

    let back: StatusReport = serde_json::from_value(json).unwrap();
    assert_eq!(back.exit_code, Some(0));
}

#[test]
fn dispatch_payload_round_trip() {
    let payload = DispatchPayload {
        job_id: JobId::new("j-1"),
        job_name: "Remote-RunA".to_string(),
        config_path: "configs/exp.yaml".to_string(),
        preferred_host: Some(WorkerId::new("remote1")),
        image: "sim:latest".to_string(),
        command: "--config /data/configs/exp.yaml --job_id j-1".to_string(),
        container_name: "simq_j-1_Remote-RunA".to_string(),
        volumes: vec![VolumeBinding {
            host: "/shared".to_string(),
            container: "/data".to_string(),
            mode: "rw".to_string(),
        }],
        env: Default::default(),
    };

    let json = serde_json::to_string(&payload).unwrap();
    let back: DispatchPayload = serde_json::from_str(&json).unwrap();
    assert_eq!(back.volumes, payload.volumes);
    assert_eq!(back.job_id, payload.job_id);
}

#[test]
fn heartbeat_info_is_optional() {
    let req: HeartbeatRequest = serde_json::from_value(json!({"worker_id": "w1"})).unwrap();
    assert!(req.info.is_none());

    let req: HeartbeatRequest =
        serde_json::from_value(json!({"worker_id": "w1", "info": {"gpus": 2}})).unwrap();
    assert_eq!(req.info.unwrap()["gpus"], json!(2));
}

#[test]
fn ops_requests_default_to_unforced() {
    let req: OpsRequeueRequest = serde_json::from_value(json!({})).unwrap();
    assert!(!req.force);
    assert!(req.preferred_host.is_none());

    let req: OpsReasonRequest = serde_json::from_value(json!({"reason": "bad node"})).unwrap();
    assert!(!req.force);
    assert_eq!(req.reason.as_deref(), Some("bad node"));
}

#[test]
fn submit_response_serializes_status_kind() {
    let resp = SubmitResponse {
        job_id: JobId::new("j-1"),
        status: JobStatus::Queued,
        host: None,
        job_name: "n".to_string(),
    };
    let json = serde_json::to_value(&resp).unwrap();
    assert_eq!(json["status"], "queued");
    assert!(json.get("host").is_none());
}
