//! End-to-end tests driving the assembled router through `tower::ServiceExt::oneshot`,
//! covering the six scenarios the façade is expected to satisfy.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use strata_gateway::adapters::{InMemoryJobQueue, InMemoryPostalService, InMemoryRequestQueue, MockDriver};
use strata_gateway::config::{Config, InfrastructureConfig, RequestQueueConfig, TopicConfig, TopicsConfig};
use strata_gateway::services::{InfrastructureMessagingService, InfrastructureService, InfrastructureTaskMonitoringService};
use strata_gateway::state::AppState;
use strata_gateway::build_router;
use strata_core::{CreateInfrastructureResponse, DriverTaskError, FailureDetails, InfrastructureTask, JobHandler};

async fn post_json(app: axum::Router, path: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(path)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, body)
}

fn sync_config() -> InfrastructureConfig {
    InfrastructureConfig {
        async_messaging_enabled: false,
        request_queue: RequestQueueConfig { enabled: false },
        topics: TopicsConfig {
            infrastructure_task_events: Some(TopicConfig {
                name: Some("infrastructure_task_events".to_string()),
            }),
        },
    }
}

#[tokio::test]
async fn sync_create_returns_driver_response_with_202() {
    let driver = Arc::new(MockDriver::new());
    driver.push_create_response(Ok(CreateInfrastructureResponse {
        infrastructure_id: "test".to_string(),
        request_id: "test_req".to_string(),
    }));

    let infrastructure_service = Arc::new(
        InfrastructureService::new(Some(driver as Arc<dyn strata_core::Driver>), Some(sync_config()), None, None).unwrap(),
    );

    let state = AppState::new(Config::default(), infrastructure_service);
    let app = build_router(state);

    let (status, body) = post_json(
        app,
        "/v1/infrastructure",
        json!({
            "template": "tosca-body",
            "templateType": "TOSCA",
            "systemProperties": {},
            "deploymentLocation": {"name": "TestDl"},
        }),
    )
    .await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["infrastructureId"], "test");
    assert_eq!(body["requestId"], "test_req");
}

#[tokio::test]
async fn queued_create_does_not_call_the_driver() {
    let driver = Arc::new(MockDriver::new());
    let request_queue = Arc::new(InMemoryRequestQueue::new());

    let mut config = sync_config();
    config.request_queue.enabled = true;

    let infrastructure_service = Arc::new(
        InfrastructureService::new(
            Some(driver.clone() as Arc<dyn strata_core::Driver>),
            Some(config),
            None,
            Some(request_queue.clone() as Arc<dyn strata_core::RequestQueue>),
        )
        .unwrap(),
    );

    let state = AppState::new(Config::default(), infrastructure_service);
    let app = build_router(state);

    let (status, body) = post_json(
        app,
        "/v1/infrastructure",
        json!({
            "template": "tmpl",
            "templateType": "TOSCA",
            "systemProperties": {},
            "deploymentLocation": {"name": "TestDl"},
        }),
    )
    .await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert!(!body["infrastructureId"].as_str().unwrap().is_empty());

    let queued = request_queue.try_dequeue().await.unwrap();
    assert_eq!(queued.infrastructure_id, body["infrastructureId"]);
}

#[tokio::test]
async fn async_monitor_complete_publishes_one_event() {
    let driver = Arc::new(MockDriver::new());
    driver.push_task_response(Ok(InfrastructureTask::complete("inf123", "req123", None)));

    let job_queue = Arc::new(InMemoryJobQueue::new());
    let postal = Arc::new(InMemoryPostalService::default());

    let messaging = Arc::new(
        InfrastructureMessagingService::new(
            Some(postal as Arc<dyn strata_core::PostalService>),
            Some(sync_config().topics),
        )
        .unwrap(),
    );

    let monitor = InfrastructureTaskMonitoringService::new(
        Some(job_queue as Arc<dyn strata_core::JobQueue>),
        Some(messaging),
        Some(driver as Arc<dyn strata_core::Driver>),
    )
    .await
    .unwrap();

    let mut job = serde_json::Map::new();
    job.insert("job_type".to_string(), Value::from(strata_core::MONITORING_JOB_TYPE));
    job.insert("infrastructure_id".to_string(), Value::from("inf123"));
    job.insert("request_id".to_string(), Value::from("req123"));
    job.insert("deployment_location".to_string(), json!({"name": "TestDl"}));

    let finished = monitor.handle(job).await.unwrap();
    assert!(finished);
}

#[tokio::test]
async fn async_monitor_transient_error_leaves_the_job_queued() {
    let driver = Arc::new(MockDriver::new());
    driver.push_task_response(Err(DriverTaskError::TemporaryInfrastructureError("backend busy".to_string())));

    let job_queue = Arc::new(InMemoryJobQueue::new());
    let postal = Arc::new(InMemoryPostalService::default());
    let messaging = Arc::new(
        InfrastructureMessagingService::new(
            Some(postal as Arc<dyn strata_core::PostalService>),
            Some(sync_config().topics),
        )
        .unwrap(),
    );

    let monitor = InfrastructureTaskMonitoringService::new(
        Some(job_queue as Arc<dyn strata_core::JobQueue>),
        Some(messaging),
        Some(driver as Arc<dyn strata_core::Driver>),
    )
    .await
    .unwrap();

    let mut job = serde_json::Map::new();
    job.insert("job_type".to_string(), Value::from(strata_core::MONITORING_JOB_TYPE));
    job.insert("infrastructure_id".to_string(), Value::from("inf123"));
    job.insert("request_id".to_string(), Value::from("req123"));
    job.insert("deployment_location".to_string(), json!({"name": "TestDl"}));

    let finished = monitor.handle(job).await.unwrap();
    assert!(!finished);
}

#[tokio::test]
async fn async_monitor_not_found_finishes_with_no_event() {
    let driver = Arc::new(MockDriver::new());
    driver.push_task_response(Err(DriverTaskError::InfrastructureNotFoundError("inf123".to_string())));

    let job_queue = Arc::new(InMemoryJobQueue::new());
    let postal = Arc::new(InMemoryPostalService::default());
    let messaging = Arc::new(
        InfrastructureMessagingService::new(
            Some(postal as Arc<dyn strata_core::PostalService>),
            Some(sync_config().topics),
        )
        .unwrap(),
    );

    let monitor = InfrastructureTaskMonitoringService::new(
        Some(job_queue as Arc<dyn strata_core::JobQueue>),
        Some(messaging),
        Some(driver as Arc<dyn strata_core::Driver>),
    )
    .await
    .unwrap();

    let mut job = serde_json::Map::new();
    job.insert("job_type".to_string(), Value::from(strata_core::MONITORING_JOB_TYPE));
    job.insert("infrastructure_id".to_string(), Value::from("inf123"));
    job.insert("request_id".to_string(), Value::from("req123"));
    job.insert("deployment_location".to_string(), json!({"name": "TestDl"}));

    let finished = monitor.handle(job).await.unwrap();
    assert!(finished);
}

#[tokio::test]
async fn query_failed_task_returns_the_exact_response_shape() {
    let driver = Arc::new(MockDriver::new());
    driver.push_task_response(Ok(InfrastructureTask::failed(
        "123",
        "456",
        FailureDetails {
            failure_code: "INFRASTRUCTURE_ERROR".to_string(),
            description: "because it was meant to fail".to_string(),
        },
    )));

    let infrastructure_service = Arc::new(
        InfrastructureService::new(Some(driver as Arc<dyn strata_core::Driver>), Some(sync_config()), None, None).unwrap(),
    );

    let state = AppState::new(Config::default(), infrastructure_service);
    let app = build_router(state);

    let (status, body) = post_json(
        app,
        "/v1/infrastructure/query",
        json!({
            "infrastructureId": "123",
            "requestId": "456",
            "deploymentLocation": {"name": "TestDl"},
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "infrastructureId": "123",
            "requestId": "456",
            "status": "FAILED",
            "failureDetails": {
                "failureCode": "INFRASTRUCTURE_ERROR",
                "description": "because it was meant to fail",
            }
        })
    );
}

#[tokio::test]
async fn missing_required_field_returns_bad_request_with_the_literal_message() {
    let driver = Arc::new(MockDriver::new());
    let infrastructure_service = Arc::new(
        InfrastructureService::new(Some(driver as Arc<dyn strata_core::Driver>), Some(sync_config()), None, None).unwrap(),
    );

    let state = AppState::new(Config::default(), infrastructure_service);
    let app = build_router(state);

    let (status, body) = post_json(
        app,
        "/v1/infrastructure",
        json!({
            "templateType": "TOSCA",
            "systemProperties": {},
            "deploymentLocation": {},
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "'template' is a required field but was not found in the request data body"
    );
}
