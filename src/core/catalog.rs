use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::time::SystemTime;
use tracing::debug;

use crate::core::error::{BrokerError, Result};

/// Queue id every topic starts with.
pub const DEFAULT_QUEUE_ID: &str = "0";

/// A named stream of messages.
///
/// The retention limit is advisory: it is recorded alongside the topic but
/// not enforced, so partitions grow for the process lifetime.
#[derive(Debug, Clone)]
pub struct Topic {
    pub name: String,
    pub retention_messages: u32,
    pub created_at: SystemTime,
}

/// An ordered sub-log (partition) of a topic, identified by an id unique
/// within that topic.
#[derive(Debug, Clone)]
pub struct Queue {
    pub topic_name: String,
    pub queue_id: String,
    pub created_at: SystemTime,
}

/// Thread-safe store of topic and queue existence and metadata.
#[derive(Debug, Default)]
pub struct TopicCatalog {
    topics: DashMap<String, Topic>,
    queues: DashMap<(String, String), Queue>,
}

impl TopicCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_topic(&self, topic: Topic) -> Result<()> {
        // entry() holds the shard lock across the vacancy check and insert.
        match self.topics.entry(topic.name.clone()) {
            Entry::Occupied(_) => Err(BrokerError::already_exists("topic", topic.name)),
            Entry::Vacant(slot) => {
                debug!(topic = %topic.name, "topic created");
                slot.insert(topic);
                Ok(())
            }
        }
    }

    pub fn get_topic(&self, name: &str) -> Result<Topic> {
        self.topics
            .get(name)
            .map(|t| t.clone())
            .ok_or_else(|| BrokerError::not_found("topic", name))
    }

    /// Unconditional removal. Only exercised by the create-topic rollback.
    pub fn delete_topic(&self, name: &str) {
        self.topics.remove(name);
    }

    /// Snapshot of all topics, in no particular order.
    pub fn list_topics(&self) -> Vec<Topic> {
        self.topics.iter().map(|t| t.value().clone()).collect()
    }

    pub fn create_queue(&self, queue: Queue) -> Result<()> {
        let key = (queue.topic_name.clone(), queue.queue_id.clone());
        match self.queues.entry(key) {
            Entry::Occupied(_) => Err(BrokerError::already_exists(
                "queue",
                format!("{}/{}", queue.topic_name, queue.queue_id),
            )),
            Entry::Vacant(slot) => {
                debug!(topic = %queue.topic_name, queue = %queue.queue_id, "queue created");
                slot.insert(queue);
                Ok(())
            }
        }
    }

    pub fn get_queue(&self, topic_name: &str, queue_id: &str) -> Result<Queue> {
        self.queues
            .get(&(topic_name.to_string(), queue_id.to_string()))
            .map(|q| q.clone())
            .ok_or_else(|| BrokerError::not_found("queue", format!("{topic_name}/{queue_id}")))
    }

    /// Snapshot of a topic's queues. An unknown topic yields an empty list,
    /// never an error.
    pub fn list_queues(&self, topic_name: &str) -> Vec<Queue> {
        self.queues
            .iter()
            .filter(|q| q.key().0 == topic_name)
            .map(|q| q.value().clone())
            .collect()
    }
}
