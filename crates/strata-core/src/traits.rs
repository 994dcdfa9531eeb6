//! The three pluggable capability sets this framework is built around: the
//! **driver** (backend-specific provisioning I/O), the **job queue**
//! (durable at-least-once background scheduler), and the **postal service**
//! (topic-addressed message bus client). Each is dependency-injected at
//! startup and owned via `Arc` by the services that use it — there is no
//! module-level singleton.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{
    CreateInfrastructureResponse, DeleteInfrastructureResponse, DeploymentLocation, Envelope,
    FindInfrastructureResult, InfrastructureTask, Job, PropertyValueMap,
};

/// Errors a driver may raise from `create_infrastructure`, `delete_infrastructure`,
/// or `find_infrastructure`. Unlike `DriverTaskError`, the core does not
/// classify these beyond propagating them to the caller.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct DriverError(pub String);

impl DriverError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Outcome of `Driver::get_infrastructure_task` beyond a plain `Task`. The
/// monitor handler's classification table (§4.3) is keyed on these four
/// variants plus an open-ended `Other` that it propagates rather than
/// catches.
#[derive(Debug, Error)]
pub enum DriverTaskError {
    /// Transient provisioning-backend failure; retry later.
    #[error("temporary infrastructure error: {0}")]
    TemporaryInfrastructureError(String),
    /// The deployment location could not be reached; retry later.
    #[error("unreachable deployment location: {0}")]
    UnreachableDeploymentLocationError(String),
    /// The infrastructure itself is gone; terminal, no event.
    #[error("infrastructure not found: {0}")]
    InfrastructureNotFoundError(String),
    /// The specific request/task is gone; terminal, no event.
    #[error("infrastructure request not found: {0}")]
    InfrastructureRequestNotFoundError(String),
    /// Anything else the driver raises. The monitor handler does not catch
    /// this — it propagates to the job queue, whose policy decides.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Backend-specific implementation of provisioning I/O. Supplied by the
/// concrete deployment that embeds this framework; the framework core never
/// talks to a provisioning backend directly.
#[async_trait]
pub trait Driver: Send + Sync {
    async fn create_infrastructure(
        &self,
        template: &str,
        template_type: &str,
        system_properties: &PropertyValueMap,
        properties: &PropertyValueMap,
        deployment_location: &DeploymentLocation,
    ) -> Result<CreateInfrastructureResponse, DriverError>;

    async fn delete_infrastructure(
        &self,
        infrastructure_id: &str,
        deployment_location: &DeploymentLocation,
    ) -> Result<DeleteInfrastructureResponse, DriverError>;

    async fn get_infrastructure_task(
        &self,
        infrastructure_id: &str,
        request_id: &str,
        deployment_location: &DeploymentLocation,
    ) -> Result<InfrastructureTask, DriverTaskError>;

    async fn find_infrastructure(
        &self,
        template: &str,
        template_type: &str,
        instance_name: &str,
        deployment_location: &DeploymentLocation,
    ) -> Result<Option<FindInfrastructureResult>, DriverError>;
}

/// Raised by a `JobHandler` for anything the job-handler truth table does
/// not explicitly classify as finished/unfinished; the job queue's own
/// retry policy decides what happens next (typically retain-and-retry).
#[derive(Debug, Error)]
#[error(transparent)]
pub struct JobHandlerError(#[from] pub anyhow::Error);

/// A handler registered against a job type. The queue delivers a job at
/// least once until `handle` returns `Ok(true)` ("finished"); `Ok(false)`
/// means retain and redeliver later; `Err` is the handler propagating an
/// unclassified failure for the queue's own policy to resolve.
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn handle(&self, job: Job) -> Result<bool, JobHandlerError>;
}

/// Durable background job scheduler with at-least-once delivery semantics.
/// The queue must preserve a queued job's fields verbatim.
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn register_job_handler(&self, job_type: &str, handler: Arc<dyn JobHandler>);
    async fn queue_job(&self, job: Job);
}

/// Errors a postal service may raise from `post`. No retry happens at the
/// messaging-service layer above it; delivery is entirely the postal
/// service's responsibility.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct PostalError(pub String);

/// Topic-addressed message bus client. Treats envelopes as opaque byte
/// payloads.
#[async_trait]
pub trait PostalService: Send + Sync {
    async fn post(&self, envelope: Envelope) -> Result<(), PostalError>;
}

/// Durable request queue consumed in `request_queue.enabled` mode. Distinct
/// from the job queue: this one carries whole `InfrastructureRequest`
/// bodies for later synchronous execution, not monitoring polls.
#[async_trait]
pub trait RequestQueue: Send + Sync {
    async fn queue_infrastructure_request(
        &self,
        request: crate::types::InfrastructureRequest,
    ) -> Result<(), PostalError>;
}
