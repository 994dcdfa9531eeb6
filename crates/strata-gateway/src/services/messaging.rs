//! Infrastructure Messaging Service: serializes terminal task state and
//! posts it to the task-events topic.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use strata_core::{Envelope, InfrastructureTask, PostalError, PostalService};

use crate::config::TopicsConfig;
use crate::error::ConfigurationError;

pub struct InfrastructureMessagingService {
    postal_service: Arc<dyn PostalService>,
    task_events_topic: String,
}

impl InfrastructureMessagingService {
    pub fn new(
        postal_service: Option<Arc<dyn PostalService>>,
        topics_configuration: Option<TopicsConfig>,
    ) -> Result<Self, ConfigurationError> {
        let postal_service = postal_service.ok_or(ConfigurationError::PostalServiceNotProvided)?;
        let topics_configuration = topics_configuration.ok_or(ConfigurationError::TopicsConfigurationNotProvided)?;
        let topic = topics_configuration
            .infrastructure_task_events
            .ok_or(ConfigurationError::InfrastructureTaskEventsTopicNotSet)?;
        let name = topic
            .name
            .filter(|n| !n.is_empty())
            .ok_or(ConfigurationError::InfrastructureTaskEventsTopicNameNotSet)?;

        Ok(Self {
            postal_service,
            task_events_topic: name,
        })
    }

    /// Serializes `task` to the exact field order of the core's §4.4 event
    /// shape and hands it to the postal service. No retry at this layer —
    /// the postal service owns delivery.
    ///
    /// Rejecting a "null" task, as the source does, is handled at the type
    /// level here: the caller must hold an actual `InfrastructureTask`,
    /// which makes the corresponding `ValueError` unreachable rather than
    /// something to check for at runtime.
    pub async fn send_infrastructure_task(&self, task: &InfrastructureTask) -> Result<(), PostalError> {
        let content = event_json_bytes(task);
        let envelope = Envelope::new(self.task_events_topic.clone(), content);
        self.postal_service.post(envelope).await
    }
}

fn event_json_bytes(task: &InfrastructureTask) -> Vec<u8> {
    let mut event = Map::new();
    event.insert("requestId".to_string(), Value::from(task.request_id.clone()));
    event.insert("infrastructureId".to_string(), Value::from(task.infrastructure_id.clone()));
    event.insert("status".to_string(), Value::from(status_tag(task)));

    if let Some(outputs) = &task.outputs {
        event.insert("outputs".to_string(), Value::Object(outputs.clone()));
    }

    if let Some(failure) = &task.failure_details {
        let mut failure_details = Map::new();
        failure_details.insert("failureCode".to_string(), Value::from(failure.failure_code.clone()));
        failure_details.insert("description".to_string(), Value::from(failure.description.clone()));
        event.insert("failureDetails".to_string(), Value::Object(failure_details));
    }

    to_python_style_json(&Value::Object(event))
}

fn status_tag(task: &InfrastructureTask) -> &'static str {
    match task.status {
        strata_core::TaskStatus::InProgress => "IN_PROGRESS",
        strata_core::TaskStatus::Complete => "COMPLETE",
        strata_core::TaskStatus::Failed => "FAILED",
    }
}

/// `serde_json::to_string` is compact with no spaces (`{"a":"b"}`); the
/// source serializes with Python's `json.dumps` defaults (`", "`/`": "`
/// separators). Event consumers compare payloads byte for byte, so this
/// framework matches that spacing via a custom formatter rather than the
/// default compact one.
struct PySpacedFormatter;

impl serde_json::ser::Formatter for PySpacedFormatter {
    fn begin_object_key<W: ?Sized + std::io::Write>(&mut self, writer: &mut W, first: bool) -> std::io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + std::io::Write>(&mut self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(b": ")
    }

    fn begin_array_value<W: ?Sized + std::io::Write>(&mut self, writer: &mut W, first: bool) -> std::io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }
}

fn to_python_style_json(value: &Value) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, PySpacedFormatter);
    value
        .serialize(&mut serializer)
        .expect("serde_json::Value serialization is infallible");
    buf
}
