//! Core data model shared by the API façade, the infrastructure services, and
//! any driver that plugs into this framework.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A template-input property map: `{name -> value}`.
///
/// The source accepts both a raw scalar value and a `{type, value}` wrapper
/// for any given property and forwards whichever shape it received straight
/// to the driver. A `Map<String, Value>` (rather than a typed struct) is the
/// only representation that can hold both without coercing one into the
/// other.
pub type PropertyValueMap = Map<String, Value>;

/// A mapping identifying the target backend environment for a request
/// (cloud account, region, etc). Opaque to the core; forwarded verbatim to
/// the driver.
pub type DeploymentLocation = Map<String, Value>;

/// An infrastructure create/delete request, as carried on the job queue or
/// returned to callers as response identifiers. Field names follow the
/// internal/queue representation (snake_case), distinct from the camelCase
/// HTTP request body the façade accepts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfrastructureRequest {
    pub infrastructure_id: String,
    pub request_id: String,
    pub template: String,
    pub template_type: String,
    pub properties: PropertyValueMap,
    pub system_properties: PropertyValueMap,
    pub deployment_location: DeploymentLocation,
}

/// Lifecycle status of a provisioning task as observed by polling the
/// driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    InProgress,
    Complete,
    Failed,
}

/// `{failure_code, description}` attached to a task whose status is
/// `FAILED`. `failure_code` is driver-defined; `INFRASTRUCTURE_ERROR`
/// specifically denotes a provisioning-level failure rather than a
/// transport/framework failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureDetails {
    pub failure_code: String,
    pub description: String,
}

/// The state of one provisioning request (create or delete), as returned by
/// `Driver::get_infrastructure_task`. Field names here are the internal
/// snake_case representation; the wire JSON built by the messaging service
/// (§4.4) uses its own explicit camelCase field order, constructed
/// separately rather than derived from this struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfrastructureTask {
    pub infrastructure_id: String,
    pub request_id: String,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_details: Option<FailureDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Map<String, Value>>,
}

impl InfrastructureTask {
    pub fn in_progress(infrastructure_id: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self {
            infrastructure_id: infrastructure_id.into(),
            request_id: request_id.into(),
            status: TaskStatus::InProgress,
            failure_details: None,
            outputs: None,
        }
    }

    pub fn complete(
        infrastructure_id: impl Into<String>,
        request_id: impl Into<String>,
        outputs: Option<Map<String, Value>>,
    ) -> Self {
        Self {
            infrastructure_id: infrastructure_id.into(),
            request_id: request_id.into(),
            status: TaskStatus::Complete,
            failure_details: None,
            outputs,
        }
    }

    pub fn failed(
        infrastructure_id: impl Into<String>,
        request_id: impl Into<String>,
        failure_details: FailureDetails,
    ) -> Self {
        Self {
            infrastructure_id: infrastructure_id.into(),
            request_id: request_id.into(),
            status: TaskStatus::Failed,
            failure_details: Some(failure_details),
            outputs: None,
        }
    }
}

/// The job queued under job type `InfrastructureTaskMonitoring`. The job
/// queue treats this — and every job — as an opaque mapping; the monitoring
/// service only reads back the three fields it wrote.
pub const MONITORING_JOB_TYPE: &str = "InfrastructureTaskMonitoring";

/// A job as carried by the job queue: an opaque mapping preserved verbatim
/// between `queue_job` and delivery to a registered handler.
pub type Job = Map<String, Value>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringJob {
    pub job_type: String,
    pub infrastructure_id: String,
    pub request_id: String,
    pub deployment_location: DeploymentLocation,
}

impl MonitoringJob {
    pub fn new(
        infrastructure_id: impl Into<String>,
        request_id: impl Into<String>,
        deployment_location: DeploymentLocation,
    ) -> Self {
        Self {
            job_type: MONITORING_JOB_TYPE.to_string(),
            infrastructure_id: infrastructure_id.into(),
            request_id: request_id.into(),
            deployment_location,
        }
    }

    /// Converts to the opaque `Job` mapping the job queue actually carries.
    pub fn into_job(self) -> Job {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

/// `{address, message: {content}}`, constructed by the messaging service and
/// handed to the postal service, which owns delivery.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub address: String,
    pub message: EnvelopeMessage,
}

#[derive(Debug, Clone)]
pub struct EnvelopeMessage {
    /// UTF-8 byte form of a JSON document; the postal service treats this as
    /// an opaque payload.
    pub content: Vec<u8>,
}

impl Envelope {
    pub fn new(address: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            address: address.into(),
            message: EnvelopeMessage { content },
        }
    }
}

/// Result returned by the driver for `create_infrastructure`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInfrastructureResponse {
    pub infrastructure_id: String,
    pub request_id: String,
}

/// Result returned by the driver for `delete_infrastructure`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteInfrastructureResponse {
    pub infrastructure_id: String,
    pub request_id: String,
}

/// Result returned by the driver for `find_infrastructure` when a matching
/// instance exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindInfrastructureResult {
    pub infrastructure_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Map<String, Value>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_status_serializes_screaming_snake_case() {
        assert_eq!(serde_json::to_string(&TaskStatus::InProgress).unwrap(), "\"IN_PROGRESS\"");
        assert_eq!(serde_json::to_string(&TaskStatus::Complete).unwrap(), "\"COMPLETE\"");
        assert_eq!(serde_json::to_string(&TaskStatus::Failed).unwrap(), "\"FAILED\"");
    }

    #[test]
    fn property_value_map_does_not_force_a_shape() {
        let mut raw_scalar: PropertyValueMap = Map::new();
        raw_scalar.insert("count".to_string(), Value::from(3));

        let mut typed: PropertyValueMap = Map::new();
        typed.insert(
            "count".to_string(),
            serde_json::json!({"type": "integer", "value": "3"}),
        );

        // Both shapes round-trip untouched; the map never coerces one into the other.
        assert_eq!(raw_scalar.get("count"), Some(&Value::from(3)));
        assert!(typed.get("count").unwrap().is_object());
    }

    #[test]
    fn monitoring_job_round_trips_through_the_opaque_job_map() {
        let mut dl = Map::new();
        dl.insert("name".to_string(), Value::from("TestDl"));
        let job = MonitoringJob::new("inf123", "req123", dl).into_job();

        assert_eq!(job.get("job_type").unwrap(), "InfrastructureTaskMonitoring");
        assert_eq!(job.get("infrastructure_id").unwrap(), "inf123");
        assert_eq!(job.get("request_id").unwrap(), "req123");
        assert!(job.get("deployment_location").is_some());
    }
}
