//! Infrastructure Service: dispatches create/delete/query/find to the
//! driver, branching between synchronous, queued-asynchronous, and
//! messaging-asynchronous execution modes.

use std::sync::Arc;

use strata_core::{
    CreateInfrastructureResponse, DeleteInfrastructureResponse, DeploymentLocation, Driver,
    DriverError, DriverTaskError, FindInfrastructureResult, InfrastructureRequest,
    InfrastructureTask, PropertyValueMap, RequestQueue,
};
use uuid::Uuid;

use crate::config::InfrastructureConfig;
use crate::error::{ConfigurationError, GatewayError};
use crate::services::task_monitoring::InfrastructureTaskMonitoringService;

pub struct InfrastructureService {
    driver: Arc<dyn Driver>,
    config: InfrastructureConfig,
    monitor_service: Option<Arc<InfrastructureTaskMonitoringService>>,
    request_queue: Option<Arc<dyn RequestQueue>>,
}

impl InfrastructureService {
    pub fn new(
        driver: Option<Arc<dyn Driver>>,
        config: Option<InfrastructureConfig>,
        monitor_service: Option<Arc<InfrastructureTaskMonitoringService>>,
        request_queue: Option<Arc<dyn RequestQueue>>,
    ) -> Result<Self, ConfigurationError> {
        let driver = driver.ok_or(ConfigurationError::DriverNotProvided)?;
        let config = config.ok_or(ConfigurationError::InfrastructureConfigNotProvided)?;

        if config.async_messaging_enabled && monitor_service.is_none() {
            return Err(ConfigurationError::MonitorServiceNotProvided);
        }
        if config.request_queue.enabled && request_queue.is_none() {
            return Err(ConfigurationError::RequestQueueNotProvided);
        }

        Ok(Self {
            driver,
            config,
            monitor_service,
            request_queue,
        })
    }

    /// Precedence: the request queue wins over async messaging. When both
    /// are configured, a queued create/delete is not also monitored at
    /// admission — monitoring is scheduled later, when the dequeued request
    /// actually executes against the driver.
    pub async fn create_infrastructure(
        &self,
        template: &str,
        template_type: &str,
        system_properties: &PropertyValueMap,
        properties: &PropertyValueMap,
        deployment_location: &DeploymentLocation,
    ) -> Result<CreateInfrastructureResponse, GatewayError> {
        if self.config.request_queue.enabled {
            let infrastructure_id = Uuid::new_v4().to_string();
            let request_id = Uuid::new_v4().to_string();

            let request = InfrastructureRequest {
                infrastructure_id: infrastructure_id.clone(),
                request_id: request_id.clone(),
                template: template.to_string(),
                template_type: template_type.to_string(),
                properties: properties.clone(),
                system_properties: system_properties.clone(),
                deployment_location: deployment_location.clone(),
            };

            self.queue_request(request).await?;

            return Ok(CreateInfrastructureResponse {
                infrastructure_id,
                request_id,
            });
        }

        let response = self
            .driver
            .create_infrastructure(template, template_type, system_properties, properties, deployment_location)
            .await?;

        if self.config.async_messaging_enabled {
            self.schedule_monitoring(&response.infrastructure_id, &response.request_id, deployment_location)
                .await;
        }

        Ok(response)
    }

    pub async fn delete_infrastructure(
        &self,
        infrastructure_id: &str,
        deployment_location: &DeploymentLocation,
    ) -> Result<DeleteInfrastructureResponse, GatewayError> {
        if self.config.request_queue.enabled {
            let request_id = Uuid::new_v4().to_string();

            let request = InfrastructureRequest {
                infrastructure_id: infrastructure_id.to_string(),
                request_id: request_id.clone(),
                template: String::new(),
                template_type: String::new(),
                properties: Default::default(),
                system_properties: Default::default(),
                deployment_location: deployment_location.clone(),
            };

            self.queue_request(request).await?;

            return Ok(DeleteInfrastructureResponse {
                infrastructure_id: infrastructure_id.to_string(),
                request_id,
            });
        }

        let response = self.driver.delete_infrastructure(infrastructure_id, deployment_location).await?;

        if self.config.async_messaging_enabled {
            self.schedule_monitoring(&response.infrastructure_id, &response.request_id, deployment_location)
                .await;
        }

        Ok(response)
    }

    pub async fn query_infrastructure(
        &self,
        infrastructure_id: &str,
        request_id: &str,
        deployment_location: &DeploymentLocation,
    ) -> Result<InfrastructureTask, GatewayError> {
        self.driver
            .get_infrastructure_task(infrastructure_id, request_id, deployment_location)
            .await
            .map_err(GatewayError::from)
    }

    pub async fn find_infrastructure(
        &self,
        template: &str,
        template_type: &str,
        instance_name: &str,
        deployment_location: &DeploymentLocation,
    ) -> Result<Option<FindInfrastructureResult>, GatewayError> {
        self.driver
            .find_infrastructure(template, template_type, instance_name, deployment_location)
            .await
            .map_err(GatewayError::from)
    }

    async fn queue_request(&self, request: InfrastructureRequest) -> Result<(), GatewayError> {
        let queue = self
            .request_queue
            .as_ref()
            .expect("request_queue.enabled implies request_queue was validated at construction");

        queue
            .queue_infrastructure_request(request)
            .await
            .map_err(|err| GatewayError::Internal(err.0))
    }

    async fn schedule_monitoring(&self, infrastructure_id: &str, request_id: &str, deployment_location: &DeploymentLocation) {
        let monitor = self
            .monitor_service
            .as_ref()
            .expect("async_messaging_enabled implies monitor_service was validated at construction");

        if let Err(err) = monitor
            .monitor_task(Some(infrastructure_id), Some(request_id), Some(deployment_location))
            .await
        {
            tracing::error!(error = %err, "failed to schedule monitoring for an infrastructure task");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::Map;
    use std::sync::Mutex;
    use strata_core::{JobHandler, JobHandlerError, JobQueue};

    struct RecordingDriver {
        create_calls: Mutex<Vec<(String, String)>>,
    }

    impl Default for RecordingDriver {
        fn default() -> Self {
            Self {
                create_calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Driver for RecordingDriver {
        async fn create_infrastructure(
            &self,
            template: &str,
            template_type: &str,
            _system_properties: &PropertyValueMap,
            _properties: &PropertyValueMap,
            _deployment_location: &DeploymentLocation,
        ) -> Result<CreateInfrastructureResponse, DriverError> {
            self.create_calls
                .lock()
                .unwrap()
                .push((template.to_string(), template_type.to_string()));
            Ok(CreateInfrastructureResponse {
                infrastructure_id: "test".to_string(),
                request_id: "test_req".to_string(),
            })
        }

        async fn delete_infrastructure(
            &self,
            infrastructure_id: &str,
            _deployment_location: &DeploymentLocation,
        ) -> Result<DeleteInfrastructureResponse, DriverError> {
            Ok(DeleteInfrastructureResponse {
                infrastructure_id: infrastructure_id.to_string(),
                request_id: "del_req".to_string(),
            })
        }

        async fn get_infrastructure_task(
            &self,
            infrastructure_id: &str,
            request_id: &str,
            _deployment_location: &DeploymentLocation,
        ) -> Result<InfrastructureTask, DriverTaskError> {
            Ok(InfrastructureTask::in_progress(infrastructure_id, request_id))
        }

        async fn find_infrastructure(
            &self,
            _template: &str,
            _template_type: &str,
            _instance_name: &str,
            _deployment_location: &DeploymentLocation,
        ) -> Result<Option<FindInfrastructureResult>, DriverError> {
            Ok(None)
        }
    }

    #[derive(Default)]
    struct RecordingRequestQueue {
        queued: Mutex<Vec<InfrastructureRequest>>,
    }

    #[async_trait]
    impl RequestQueue for RecordingRequestQueue {
        async fn queue_infrastructure_request(&self, request: InfrastructureRequest) -> Result<(), strata_core::PostalError> {
            self.queued.lock().unwrap().push(request);
            Ok(())
        }
    }

    #[derive(Default)]
    struct NoopJobQueue;

    #[async_trait]
    impl JobQueue for NoopJobQueue {
        async fn register_job_handler(&self, _job_type: &str, _handler: Arc<dyn JobHandler>) {}
        async fn queue_job(&self, _job: strata_core::Job) {}
    }

    #[test]
    fn construction_fails_without_a_driver() {
        let err = InfrastructureService::new(None, Some(InfrastructureConfig::default()), None, None).unwrap_err();
        assert_eq!(err, ConfigurationError::DriverNotProvided);
    }

    #[test]
    fn construction_fails_without_configuration() {
        let driver = Arc::new(RecordingDriver::default()) as Arc<dyn Driver>;
        let err = InfrastructureService::new(Some(driver), None, None, None).unwrap_err();
        assert_eq!(err, ConfigurationError::InfrastructureConfigNotProvided);
    }

    #[test]
    fn construction_fails_when_async_messaging_is_enabled_without_a_monitor_service() {
        let driver = Arc::new(RecordingDriver::default()) as Arc<dyn Driver>;
        let mut config = InfrastructureConfig::default();
        config.async_messaging_enabled = true;
        let err = InfrastructureService::new(Some(driver), Some(config), None, None).unwrap_err();
        assert_eq!(err, ConfigurationError::MonitorServiceNotProvided);
    }

    #[test]
    fn construction_fails_when_request_queue_is_enabled_without_a_request_queue() {
        let driver = Arc::new(RecordingDriver::default()) as Arc<dyn Driver>;
        let mut config = InfrastructureConfig::default();
        config.request_queue.enabled = true;
        let err = InfrastructureService::new(Some(driver), Some(config), None, None).unwrap_err();
        assert_eq!(err, ConfigurationError::RequestQueueNotProvided);
    }

    #[tokio::test]
    async fn sync_create_calls_the_driver_and_returns_its_response_verbatim() {
        let driver = Arc::new(RecordingDriver::default());
        let config = InfrastructureConfig::default();
        let service = InfrastructureService::new(Some(driver.clone() as Arc<dyn Driver>), Some(config), None, None).unwrap();

        let response = service
            .create_infrastructure("tosca-body", "TOSCA", &Map::new(), &Map::new(), &Map::new())
            .await
            .unwrap();

        assert_eq!(response.infrastructure_id, "test");
        assert_eq!(response.request_id, "test_req");
        assert_eq!(driver.create_calls.lock().unwrap()[0], ("tosca-body".to_string(), "TOSCA".to_string()));
    }

    #[tokio::test]
    async fn queued_create_does_not_call_the_driver() {
        let driver = Arc::new(RecordingDriver::default());
        let queue = Arc::new(RecordingRequestQueue::default());
        let mut config = InfrastructureConfig::default();
        config.request_queue.enabled = true;

        let service = InfrastructureService::new(
            Some(driver.clone() as Arc<dyn Driver>),
            Some(config),
            None,
            Some(queue.clone() as Arc<dyn RequestQueue>),
        )
        .unwrap();

        let response = service
            .create_infrastructure("tmpl", "TOSCA", &Map::new(), &Map::new(), &Map::new())
            .await
            .unwrap();

        assert!(driver.create_calls.lock().unwrap().is_empty());
        let queued = queue.queued.lock().unwrap();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].infrastructure_id, response.infrastructure_id);
        assert_eq!(queued[0].request_id, response.request_id);
        assert!(!queued[0].infrastructure_id.is_empty());
        assert!(!queued[0].request_id.is_empty());
    }

    struct NoopPostalService;

    #[async_trait]
    impl strata_core::PostalService for NoopPostalService {
        async fn post(&self, _envelope: strata_core::Envelope) -> Result<(), strata_core::PostalError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn async_messaging_mode_calls_driver_once_then_schedules_monitoring() {
        let driver = Arc::new(RecordingDriver::default());
        let job_queue = Arc::new(NoopJobQueue::default());
        let postal: Arc<dyn strata_core::PostalService> = Arc::new(NoopPostalService);
        let messaging = Arc::new(
            crate::services::InfrastructureMessagingService::new(
                Some(postal),
                Some(crate::config::TopicsConfig {
                    infrastructure_task_events: Some(crate::config::TopicConfig {
                        name: Some("infrastructure_task_events".to_string()),
                    }),
                }),
            )
            .unwrap(),
        );
        let monitor = InfrastructureTaskMonitoringService::new(
            Some(job_queue as Arc<dyn JobQueue>),
            Some(messaging),
            Some(driver.clone() as Arc<dyn Driver>),
        )
        .await
        .unwrap();

        let mut config = InfrastructureConfig::default();
        config.async_messaging_enabled = true;

        let service = InfrastructureService::new(Some(driver.clone() as Arc<dyn Driver>), Some(config), Some(monitor), None).unwrap();

        let response = service
            .create_infrastructure("tmpl", "TOSCA", &Map::new(), &Map::new(), &Map::new())
            .await
            .unwrap();

        assert_eq!(driver.create_calls.lock().unwrap().len(), 1);
        assert_eq!(response.infrastructure_id, "test");
    }

    #[tokio::test]
    async fn query_and_find_always_call_the_driver_synchronously() {
        let driver = Arc::new(RecordingDriver::default());
        let config = InfrastructureConfig::default();
        let service = InfrastructureService::new(Some(driver as Arc<dyn Driver>), Some(config), None, None).unwrap();

        let task = service.query_infrastructure("inf", "req", &Map::new()).await.unwrap();
        assert_eq!(task.infrastructure_id, "inf");

        let result = service.find_infrastructure("t", "tt", "name", &Map::new()).await.unwrap();
        assert!(result.is_none());
    }
}
