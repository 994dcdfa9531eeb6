//! In-process adapters for the driver/job-queue/postal-service/request-queue
//! capability traits. Useful for local development and the integration
//! tests; a deployment wanting durable delivery swaps these for adapters
//! backed by a real broker and a real queue, without touching the core.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use strata_core::{Envelope, InfrastructureRequest, Job, JobHandler, JobQueue, PostalError, PostalService, RequestQueue};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

/// Delay before an unfinished job is redelivered. The core's job-handler
/// contract leaves polling cadence entirely to the queue; this is this
/// adapter's choice, not a core requirement.
const REDELIVERY_DELAY: Duration = Duration::from_millis(200);

/// A job queue that holds jobs in a channel and redelivers anything whose
/// handler returns `false` (or errors) after `REDELIVERY_DELAY`. At-least-once,
/// single-process, no ordering guarantee across jobs — matching the core's
/// contract exactly and nothing more.
pub struct InMemoryJobQueue {
    handlers: Arc<Mutex<HashMap<String, Arc<dyn JobHandler>>>>,
    sender: mpsc::UnboundedSender<Job>,
}

impl InMemoryJobQueue {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let handlers: Arc<Mutex<HashMap<String, Arc<dyn JobHandler>>>> = Arc::new(Mutex::new(HashMap::new()));

        tokio::spawn(Self::run(receiver, handlers.clone(), sender.clone()));

        Self { handlers, sender }
    }

    async fn run(
        mut receiver: mpsc::UnboundedReceiver<Job>,
        handlers: Arc<Mutex<HashMap<String, Arc<dyn JobHandler>>>>,
        sender: mpsc::UnboundedSender<Job>,
    ) {
        while let Some(job) = receiver.recv().await {
            let Some(job_type) = job.get("job_type").and_then(|v| v.as_str()).map(str::to_string) else {
                warn!("discarding job with no job_type");
                continue;
            };

            let handler = handlers.lock().await.get(&job_type).cloned();
            let Some(handler) = handler else {
                warn!(job_type, "no handler registered for job type; discarding");
                continue;
            };

            let sender = sender.clone();
            tokio::spawn(async move {
                match handler.handle(job.clone()).await {
                    Ok(true) => debug!(job_type, "job finished"),
                    Ok(false) => {
                        tokio::time::sleep(REDELIVERY_DELAY).await;
                        let _ = sender.send(job);
                    }
                    Err(err) => {
                        warn!(job_type, error = %err, "job handler errored; redelivering");
                        tokio::time::sleep(REDELIVERY_DELAY).await;
                        let _ = sender.send(job);
                    }
                }
            });
        }
    }
}

impl Default for InMemoryJobQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn register_job_handler(&self, job_type: &str, handler: Arc<dyn JobHandler>) {
        self.handlers.lock().await.insert(job_type.to_string(), handler);
    }

    async fn queue_job(&self, job: Job) {
        let _ = self.sender.send(job);
    }
}

/// A postal service that logs each envelope instead of publishing to a real
/// broker. Suitable for development and for any deployment that does not
/// need `async_messaging_enabled`.
#[derive(Debug, Default)]
pub struct InMemoryPostalService;

#[async_trait]
impl PostalService for InMemoryPostalService {
    async fn post(&self, envelope: Envelope) -> Result<(), PostalError> {
        debug!(
            address = %envelope.address,
            bytes = envelope.message.content.len(),
            "posted envelope"
        );
        Ok(())
    }
}

/// A request queue that holds requests in an unbounded channel. Nothing in
/// this framework drains it — a deployment using `request_queue.enabled`
/// owns its own consumer that dequeues and executes these requests against
/// the driver; this adapter exists to exercise that contract locally.
pub struct InMemoryRequestQueue {
    sender: mpsc::UnboundedSender<InfrastructureRequest>,
    receiver: Mutex<mpsc::UnboundedReceiver<InfrastructureRequest>>,
}

impl InMemoryRequestQueue {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver: Mutex::new(receiver),
        }
    }

    /// Pulls the next queued request, if any is immediately available.
    pub async fn try_dequeue(&self) -> Option<InfrastructureRequest> {
        self.receiver.lock().await.try_recv().ok()
    }
}

impl Default for InMemoryRequestQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RequestQueue for InMemoryRequestQueue {
    async fn queue_infrastructure_request(&self, request: InfrastructureRequest) -> Result<(), PostalError> {
        self.sender
            .send(request)
            .map_err(|err| PostalError(format!("request queue closed: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::JobHandlerError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::timeout;

    struct CountingHandler {
        calls: Arc<AtomicUsize>,
        finish_after: usize,
    }

    #[async_trait]
    impl JobHandler for CountingHandler {
        async fn handle(&self, _job: Job) -> Result<bool, JobHandlerError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(n >= self.finish_after)
        }
    }

    #[tokio::test]
    async fn unfinished_jobs_are_redelivered_until_the_handler_finishes() {
        let queue = InMemoryJobQueue::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let handler = Arc::new(CountingHandler {
            calls: calls.clone(),
            finish_after: 3,
        });

        queue.register_job_handler("test-job", handler).await;

        let mut job = serde_json::Map::new();
        job.insert("job_type".to_string(), serde_json::Value::from("test-job"));
        queue.queue_job(job).await;

        timeout(Duration::from_secs(5), async {
            while calls.load(Ordering::SeqCst) < 3 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("handler should have been redelivered to until it finished");
    }

    #[tokio::test]
    async fn request_queue_round_trips_a_request() {
        let queue = InMemoryRequestQueue::new();
        let request = InfrastructureRequest {
            infrastructure_id: "inf".to_string(),
            request_id: "req".to_string(),
            template: "t".to_string(),
            template_type: "TOSCA".to_string(),
            properties: Default::default(),
            system_properties: Default::default(),
            deployment_location: Default::default(),
        };

        queue.queue_infrastructure_request(request).await.unwrap();

        let dequeued = queue.try_dequeue().await.unwrap();
        assert_eq!(dequeued.infrastructure_id, "inf");
    }
}
