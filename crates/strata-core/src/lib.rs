//! Domain types, the pluggable driver/job-queue/postal-service capability
//! traits, per-request trace context, and the Logstash-style log formatter
//! shared by every infrastructure-driver service built on this framework.

pub mod logstash;
pub mod trace_context;
pub mod traits;
pub mod types;

pub use traits::{Driver, DriverError, DriverTaskError, JobHandler, JobHandlerError, JobQueue, PostalError, PostalService, RequestQueue};
pub use types::{
    CreateInfrastructureResponse, DeleteInfrastructureResponse, DeploymentLocation, Envelope,
    EnvelopeMessage, FailureDetails, FindInfrastructureResult, InfrastructureRequest,
    InfrastructureTask, Job, MonitoringJob, PropertyValueMap, TaskStatus,
    MONITORING_JOB_TYPE,
};
