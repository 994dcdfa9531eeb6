//! API Façade handlers: validate request bodies, populate trace context,
//! and shape responses per the HTTP-facing camelCase contract.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{Map, Value};

use crate::error::{GatewayError, Result};
use crate::state::AppState;

fn required_str<'a>(body: &'a Map<String, Value>, field: &str) -> Result<&'a str> {
    body.get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| GatewayError::missing_field(field))
}

fn required_object<'a>(body: &'a Map<String, Value>, field: &str) -> Result<&'a Map<String, Value>> {
    body.get(field)
        .and_then(Value::as_object)
        .ok_or_else(|| GatewayError::missing_field(field))
}

fn optional_object(body: &Map<String, Value>, field: &str, default: Map<String, Value>) -> Map<String, Value> {
    body.get(field).and_then(Value::as_object).cloned().unwrap_or(default)
}

pub async fn create(State(state): State<AppState>, Json(body): Json<Value>) -> Result<(StatusCode, Json<Value>)> {
    let body = body.as_object().cloned().unwrap_or_default();

    let template = required_str(&body, "template")?;
    let template_type = required_str(&body, "templateType")?;
    let system_properties = required_object(&body, "systemProperties")?;
    let deployment_location = required_object(&body, "deploymentLocation")?;
    let properties = optional_object(&body, "properties", Map::new());

    let response = state
        .infrastructure_service
        .create_infrastructure(template, template_type, system_properties, &properties, deployment_location)
        .await?;

    let body = serde_json::json!({
        "infrastructureId": response.infrastructure_id,
        "requestId": response.request_id,
    });

    Ok((StatusCode::ACCEPTED, Json(body)))
}

pub async fn delete(State(state): State<AppState>, Json(body): Json<Value>) -> Result<(StatusCode, Json<Value>)> {
    let body = body.as_object().cloned().unwrap_or_default();

    let infrastructure_id = required_str(&body, "infrastructureId")?;
    let deployment_location = required_object(&body, "deploymentLocation")?;

    let response = state
        .infrastructure_service
        .delete_infrastructure(infrastructure_id, deployment_location)
        .await?;

    let body = serde_json::json!({
        "infrastructureId": response.infrastructure_id,
        "requestId": response.request_id,
    });

    Ok((StatusCode::ACCEPTED, Json(body)))
}

pub async fn query(State(state): State<AppState>, Json(body): Json<Value>) -> Result<(StatusCode, Json<Value>)> {
    let body = body.as_object().cloned().unwrap_or_default();

    let infrastructure_id = required_str(&body, "infrastructureId")?;
    let request_id = required_str(&body, "requestId")?;
    let deployment_location = required_object(&body, "deploymentLocation")?;

    let task = state
        .infrastructure_service
        .query_infrastructure(infrastructure_id, request_id, deployment_location)
        .await?;

    let mut response = Map::new();
    response.insert("infrastructureId".to_string(), Value::from(task.infrastructure_id));
    response.insert("requestId".to_string(), Value::from(task.request_id));
    response.insert("status".to_string(), serde_json::to_value(task.status).unwrap());

    if let Some(outputs) = task.outputs {
        response.insert("outputs".to_string(), Value::Object(outputs));
    }

    if let Some(failure) = task.failure_details {
        response.insert(
            "failureDetails".to_string(),
            serde_json::json!({
                "failureCode": failure.failure_code,
                "description": failure.description,
            }),
        );
    }

    Ok((StatusCode::OK, Json(Value::Object(response))))
}

pub async fn find(State(state): State<AppState>, Json(body): Json<Value>) -> Result<(StatusCode, Json<Value>)> {
    let body = body.as_object().cloned().unwrap_or_default();

    let template = required_str(&body, "template")?;
    let template_type = required_str(&body, "templateType")?;
    let instance_name = required_str(&body, "instanceName")?;
    let deployment_location = required_object(&body, "deploymentLocation")?;

    let found = state
        .infrastructure_service
        .find_infrastructure(template, template_type, instance_name, deployment_location)
        .await?;

    let result = match found {
        Some(result) => {
            let mut object = Map::new();
            object.insert("infrastructureId".to_string(), Value::from(result.infrastructure_id));
            if let Some(outputs) = result.outputs {
                object.insert("outputs".to_string(), Value::Object(outputs));
            }
            Value::Object(object)
        }
        None => Value::Null,
    };

    Ok((StatusCode::OK, Json(serde_json::json!({ "result": result }))))
}
