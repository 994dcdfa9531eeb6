//! Task Monitoring Service: polls the driver for a scheduled infrastructure
//! task via a registered job handler, and classifies the outcome into the
//! retain/finish/propagate decision the job queue acts on.

use std::sync::Arc;

use async_trait::async_trait;
use strata_core::{
    DeploymentLocation, Driver, DriverTaskError, Job, JobHandler, JobHandlerError, JobQueue,
    MonitoringJob, TaskStatus, MONITORING_JOB_TYPE,
};
use tracing::warn;

use crate::error::{ConfigurationError, MonitorArgMissing};
use crate::services::messaging::InfrastructureMessagingService;

pub struct InfrastructureTaskMonitoringService {
    job_queue_service: Arc<dyn JobQueue>,
    inf_messaging_service: Arc<InfrastructureMessagingService>,
    driver: Arc<dyn Driver>,
}

impl InfrastructureTaskMonitoringService {
    /// Constructs the service and registers it as the handler for
    /// `InfrastructureTaskMonitoring` jobs with `job_queue_service`.
    pub async fn new(
        job_queue_service: Option<Arc<dyn JobQueue>>,
        inf_messaging_service: Option<Arc<InfrastructureMessagingService>>,
        driver: Option<Arc<dyn Driver>>,
    ) -> Result<Arc<Self>, ConfigurationError> {
        let job_queue_service = job_queue_service.ok_or(ConfigurationError::JobQueueServiceNotProvided)?;
        let inf_messaging_service = inf_messaging_service.ok_or(ConfigurationError::MessagingServiceNotProvided)?;
        let driver = driver.ok_or(ConfigurationError::DriverNotProvided)?;

        let service = Arc::new(Self {
            job_queue_service,
            inf_messaging_service,
            driver,
        });

        service
            .job_queue_service
            .register_job_handler(MONITORING_JOB_TYPE, service.clone())
            .await;

        Ok(service)
    }

    /// Schedules a monitoring job for the given task identifiers. Each
    /// argument is required; a missing one is a programmer error at the
    /// call site, reported as `MonitorArgMissing` rather than panicking.
    pub async fn monitor_task(
        &self,
        infrastructure_id: Option<&str>,
        request_id: Option<&str>,
        deployment_location: Option<&DeploymentLocation>,
    ) -> Result<(), MonitorArgMissing> {
        let infrastructure_id = infrastructure_id.ok_or(MonitorArgMissing("infrastructure_id"))?;
        let request_id = request_id.ok_or(MonitorArgMissing("request_id"))?;
        let deployment_location = deployment_location.ok_or(MonitorArgMissing("deployment_location"))?;

        let job = MonitoringJob::new(infrastructure_id, request_id, deployment_location.clone()).into_job();
        self.job_queue_service.queue_job(job).await;
        Ok(())
    }
}

#[async_trait]
impl JobHandler for InfrastructureTaskMonitoringService {
    async fn handle(&self, job: Job) -> Result<bool, JobHandlerError> {
        let (infrastructure_id, request_id, deployment_location) =
            match extract_monitoring_fields(&job) {
                Some(fields) => fields,
                None => {
                    warn!("discarding malformed monitoring job: missing required fields");
                    return Ok(true);
                }
            };

        match self
            .driver
            .get_infrastructure_task(&infrastructure_id, &request_id, &deployment_location)
            .await
        {
            Ok(task) => match task.status {
                TaskStatus::InProgress => Ok(false),
                TaskStatus::Complete | TaskStatus::Failed => {
                    self.inf_messaging_service
                        .send_infrastructure_task(&task)
                        .await
                        .map_err(|err| JobHandlerError(anyhow::anyhow!(err.0)))?;
                    Ok(true)
                }
            },
            Err(DriverTaskError::TemporaryInfrastructureError(_)) => Ok(false),
            Err(DriverTaskError::UnreachableDeploymentLocationError(_)) => Ok(false),
            Err(DriverTaskError::InfrastructureNotFoundError(_)) => Ok(true),
            Err(DriverTaskError::InfrastructureRequestNotFoundError(_)) => Ok(true),
            Err(DriverTaskError::Other(err)) => Err(JobHandlerError(err)),
        }
    }
}

fn extract_monitoring_fields(job: &Job) -> Option<(String, String, DeploymentLocation)> {
    let infrastructure_id = job.get("infrastructure_id")?.as_str()?.to_string();
    let request_id = job.get("request_id")?.as_str()?.to_string();
    let deployment_location = job.get("deployment_location")?.as_object()?.clone();
    Some((infrastructure_id, request_id, deployment_location))
}
