use std::any::{type_name, Any};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, warn};
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::node::{NodeInterface, Publisher, TransportError};

const DEFAULT_DEPTH: usize = 10;

type ServiceHandler<Req, Resp> = Arc<dyn Fn(Req) -> Resp + Send + Sync>;

/// Topic channel with its payload type erased.
struct TopicEntry {
    type_name: &'static str,
    sender: Box<dyn Any + Send + Sync>,
}

struct ServiceEntry {
    handler: Box<dyn Any + Send + Sync>,
}

/// In-process node: topics are broadcast channels, services are plain
/// handlers executed on the runtime's blocking pool.
///
/// Subscription callbacks run on tasks spawned on the given runtime and are
/// aborted when the node is dropped.
pub struct LocalNode {
    name: String,
    runtime: Handle,
    topics: Mutex<HashMap<String, TopicEntry>>,
    services: Mutex<HashMap<String, ServiceEntry>>,
    subscriptions: Mutex<Vec<JoinHandle<()>>>,
}

struct LocalPublisher<T> {
    topic: String,
    sender: broadcast::Sender<T>,
}

impl<T: Send + Sync> Publisher<T> for LocalPublisher<T> {
    fn publish(&self, message: T) -> Result<(), TransportError> {
        // Nobody listening is not a failure
        if self.sender.send(message).is_err() {
            debug!("No subscriber on {}", self.topic);
        }
        Ok(())
    }
}

impl LocalNode {
    pub fn new(name: impl Into<String>, runtime: Handle) -> Self {
        Self {
            name: name.into(),
            runtime,
            topics: Mutex::new(HashMap::new()),
            services: Mutex::new(HashMap::new()),
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    /// Subscribe to `topic` without a callback, e.g. from an external consumer.
    pub fn subscribe<T>(&self, topic: &str) -> Result<broadcast::Receiver<T>, TransportError>
    where
        T: Clone + Send + Sync + 'static,
    {
        Ok(self.topic_sender::<T>(topic, DEFAULT_DEPTH)?.subscribe())
    }

    /// Call a service and wait for its response.
    ///
    /// The handler runs on the blocking pool, so handlers that wait on the
    /// bus never stall the async workers.
    pub async fn call_service<Req, Resp>(&self, name: &str, request: Req) -> Result<Resp, TransportError>
    where
        Req: Send + 'static,
        Resp: Send + 'static,
    {
        let handler = self.service_handler::<Req, Resp>(name)?;
        self.runtime
            .spawn_blocking(move || handler(request))
            .await
            .map_err(|e| TransportError::HandlerFailed {
                service: name.to_string(),
                reason: e.to_string(),
            })
    }

    /// Names of all services registered so far.
    pub fn service_names(&self) -> Vec<String> {
        let mut names: Vec<String> = lock(&self.services).keys().cloned().collect();
        names.sort();
        names
    }

    fn topic_sender<T>(&self, topic: &str, depth: usize) -> Result<broadcast::Sender<T>, TransportError>
    where
        T: Clone + Send + Sync + 'static,
    {
        let mut topics = lock(&self.topics);
        if let Some(entry) = topics.get(topic) {
            return entry
                .sender
                .downcast_ref::<broadcast::Sender<T>>()
                .cloned()
                .ok_or_else(|| TransportError::TypeMismatch {
                    topic: topic.to_string(),
                    existing: entry.type_name,
                });
        }

        let (sender, _) = broadcast::channel::<T>(depth.max(1));
        topics.insert(
            topic.to_string(),
            TopicEntry {
                type_name: type_name::<T>(),
                sender: Box::new(sender.clone()),
            },
        );
        Ok(sender)
    }

    fn service_handler<Req, Resp>(&self, name: &str) -> Result<ServiceHandler<Req, Resp>, TransportError>
    where
        Req: Send + 'static,
        Resp: Send + 'static,
    {
        lock(&self.services)
            .get(name)
            .and_then(|entry| entry.handler.downcast_ref::<ServiceHandler<Req, Resp>>())
            .cloned()
            .ok_or_else(|| TransportError::ServiceNotFound(name.to_string()))
    }
}

impl NodeInterface for LocalNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn create_publisher<T>(&self, topic: &str, depth: usize) -> Result<Arc<dyn Publisher<T>>, TransportError>
    where
        T: Clone + Send + Sync + 'static,
    {
        let sender = self.topic_sender::<T>(topic, depth)?;
        Ok(Arc::new(LocalPublisher {
            topic: topic.to_string(),
            sender,
        }))
    }

    fn create_subscription<T, F>(&self, topic: &str, depth: usize, callback: F) -> Result<(), TransportError>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(T) + Send + Sync + 'static,
    {
        let mut receiver = self.topic_sender::<T>(topic, depth)?.subscribe();
        let topic = topic.to_string();

        let task = self.runtime.spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(message) => callback(message),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Subscriber of {} lagged behind, {} messages skipped", topic, skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        lock(&self.subscriptions).push(task);
        Ok(())
    }

    fn create_service<Req, Resp, F>(&self, name: &str, handler: F) -> Result<(), TransportError>
    where
        Req: Send + 'static,
        Resp: Send + 'static,
        F: Fn(Req) -> Resp + Send + Sync + 'static,
    {
        let mut services = lock(&self.services);
        if services.contains_key(name) {
            return Err(TransportError::ServiceExists(name.to_string()));
        }
        let handler: ServiceHandler<Req, Resp> = Arc::new(handler);
        services.insert(name.to_string(), ServiceEntry { handler: Box::new(handler) });
        Ok(())
    }
}

impl Drop for LocalNode {
    fn drop(&mut self) {
        for task in lock(&self.subscriptions).drain(..) {
            task.abort();
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
