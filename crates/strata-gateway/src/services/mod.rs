pub mod infrastructure_service;
pub mod messaging;
pub mod task_monitoring;

pub use infrastructure_service::InfrastructureService;
pub use messaging::InfrastructureMessagingService;
pub use task_monitoring::InfrastructureTaskMonitoringService;
