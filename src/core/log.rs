use dashmap::DashMap;

use crate::core::error::{BrokerError, Result};
use crate::core::message::Message;

/// Append-only, per-(topic, queue) ordered message store.
///
/// Offsets start at 0, are assigned in strict append order and are never
/// reused or reassigned. Appends to one partition serialize on the map's
/// entry lock, so concurrent publishers receive contiguous offsets with no
/// gaps or duplicates. Nothing is ever trimmed or compacted.
#[derive(Debug, Default)]
pub struct PartitionLog {
    partitions: DashMap<(String, String), Vec<Message>>,
}

impl PartitionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns `offset = current partition length`, stores an immutable
    /// copy and returns the message with its offset filled in.
    pub fn append(&self, mut msg: Message) -> Message {
        let key = (msg.topic_name.clone(), msg.queue_id.clone());
        let mut partition = self.partitions.entry(key).or_default();
        msg.offset = partition.len() as i64;
        partition.push(msg.clone());
        msg
    }

    /// Up to `limit` messages starting at `from_offset`, in offset order.
    /// An offset at or past the end of the partition yields an empty vec,
    /// never an error.
    pub fn read(
        &self,
        topic_name: &str,
        queue_id: &str,
        from_offset: i64,
        limit: usize,
    ) -> Vec<Message> {
        let key = (topic_name.to_string(), queue_id.to_string());
        let Some(partition) = self.partitions.get(&key) else {
            return Vec::new();
        };
        let from = from_offset.max(0) as usize;
        if from >= partition.len() {
            return Vec::new();
        }
        let end = (from + limit).min(partition.len());
        partition[from..end].to_vec()
    }

    /// Linear lookup by message identifier within one partition.
    pub fn get_by_id(&self, topic_name: &str, queue_id: &str, message_id: &str) -> Result<Message> {
        let key = (topic_name.to_string(), queue_id.to_string());
        self.partitions
            .get(&key)
            .and_then(|p| p.iter().find(|m| m.id == message_id).cloned())
            .ok_or_else(|| BrokerError::not_found("message", message_id))
    }

    /// Current length of a partition; 0 when it has never seen a message.
    pub fn len(&self, topic_name: &str, queue_id: &str) -> usize {
        self.partitions
            .get(&(topic_name.to_string(), queue_id.to_string()))
            .map(|p| p.len())
            .unwrap_or(0)
    }
}
