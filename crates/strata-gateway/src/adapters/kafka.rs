//! Kafka-backed postal service, for deployments that publish infrastructure
//! task events to a real broker instead of logging them locally.

use std::time::Duration;

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use strata_core::{Envelope, PostalError, PostalService};
use tracing::debug;

pub struct KafkaPostalService {
    producer: FutureProducer,
}

impl KafkaPostalService {
    pub fn new(bootstrap_servers: &str) -> Result<Self, PostalError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", bootstrap_servers)
            .set("message.timeout.ms", "5000")
            .create()
            .map_err(|err| PostalError(format!("failed to create kafka producer: {err}")))?;

        Ok(Self { producer })
    }
}

#[async_trait]
impl PostalService for KafkaPostalService {
    async fn post(&self, envelope: Envelope) -> Result<(), PostalError> {
        let record: FutureRecord<'_, (), [u8]> =
            FutureRecord::to(&envelope.address).payload(&envelope.message.content);

        self.producer
            .send(record, Duration::from_secs(5))
            .await
            .map_err(|(err, _)| PostalError(format!("kafka publish failed: {err}")))?;

        debug!(address = %envelope.address, "published envelope to kafka");
        Ok(())
    }
}
