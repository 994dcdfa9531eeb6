//! A scriptable `Driver` double for tests and local development against a
//! real instance of this service without a real provisioning backend.
//! Not meant for production use — wire a real driver there.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use strata_core::{
    CreateInfrastructureResponse, DeleteInfrastructureResponse, DeploymentLocation, Driver,
    DriverError, DriverTaskError, FindInfrastructureResult, InfrastructureTask, PropertyValueMap,
};

type CreateResult = Result<CreateInfrastructureResponse, DriverError>;
type DeleteResult = Result<DeleteInfrastructureResponse, DriverError>;
type TaskResult = Result<InfrastructureTask, DriverTaskError>;
type FindResult = Result<Option<FindInfrastructureResult>, DriverError>;

/// Queues of canned responses, consumed in FIFO order as calls arrive. A
/// call made with no queued response panics — tests are expected to script
/// every call they expect to happen.
#[derive(Default)]
pub struct MockDriver {
    create_responses: Mutex<VecDeque<CreateResult>>,
    delete_responses: Mutex<VecDeque<DeleteResult>>,
    task_responses: Mutex<VecDeque<TaskResult>>,
    find_responses: Mutex<VecDeque<FindResult>>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_create_response(&self, response: CreateResult) {
        self.create_responses.lock().unwrap().push_back(response);
    }

    pub fn push_delete_response(&self, response: DeleteResult) {
        self.delete_responses.lock().unwrap().push_back(response);
    }

    pub fn push_task_response(&self, response: TaskResult) {
        self.task_responses.lock().unwrap().push_back(response);
    }

    pub fn push_find_response(&self, response: FindResult) {
        self.find_responses.lock().unwrap().push_back(response);
    }
}

#[async_trait]
impl Driver for MockDriver {
    async fn create_infrastructure(
        &self,
        _template: &str,
        _template_type: &str,
        _system_properties: &PropertyValueMap,
        _properties: &PropertyValueMap,
        _deployment_location: &DeploymentLocation,
    ) -> CreateResult {
        self.create_responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("MockDriver: no create_infrastructure response queued")
    }

    async fn delete_infrastructure(
        &self,
        _infrastructure_id: &str,
        _deployment_location: &DeploymentLocation,
    ) -> DeleteResult {
        self.delete_responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("MockDriver: no delete_infrastructure response queued")
    }

    async fn get_infrastructure_task(
        &self,
        _infrastructure_id: &str,
        _request_id: &str,
        _deployment_location: &DeploymentLocation,
    ) -> TaskResult {
        self.task_responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("MockDriver: no get_infrastructure_task response queued")
    }

    async fn find_infrastructure(
        &self,
        _template: &str,
        _template_type: &str,
        _instance_name: &str,
        _deployment_location: &DeploymentLocation,
    ) -> FindResult {
        self.find_responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("MockDriver: no find_infrastructure response queued")
    }
}
