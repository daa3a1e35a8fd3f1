use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::time::{Duration, SystemTime};
use tracing::debug;
use uuid::Uuid;

use crate::core::error::{BrokerError, Result};

/// Delivery semantics of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryGuarantee {
    /// Fire-and-forget: the cursor advances at delivery time; a message
    /// lost by the consumer is never redelivered.
    AtMostOnce,
    /// Held in-flight until acknowledged; redelivered once the ack timeout
    /// expires.
    AtLeastOnce,
}

/// A consumer group's attachment to one (topic, queue) pair.
#[derive(Debug, Clone)]
pub struct Subscription {
    pub id: String,
    pub topic_name: String,
    pub queue_id: String,
    pub consumer_group: String,
    pub guarantee: DeliveryGuarantee,
    pub ack_timeout: Duration,
    /// Offset of the next message to read.
    pub cursor: i64,
    pub created_at: SystemTime,
}

pub fn generate_subscription_id() -> String {
    format!("sub-{}", Uuid::new_v4().simple())
}

/// Registry of subscriptions, indexed by id and by (topic, consumer group).
///
/// The queue id is deliberately not part of the uniqueness key: only one
/// subscription per (topic, group) may exist, whichever queue it targets.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    by_id: DashMap<String, Subscription>,
    by_topic_group: DashMap<(String, String), String>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, sub: Subscription) -> Result<()> {
        let key = (sub.topic_name.clone(), sub.consumer_group.clone());
        match self.by_topic_group.entry(key) {
            Entry::Occupied(_) => Err(BrokerError::already_exists(
                "subscription",
                format!("{}/{}", sub.topic_name, sub.consumer_group),
            )),
            Entry::Vacant(slot) => {
                debug!(subscription = %sub.id, topic = %sub.topic_name, group = %sub.consumer_group, "subscription registered");
                slot.insert(sub.id.clone());
                self.by_id.insert(sub.id.clone(), sub);
                Ok(())
            }
        }
    }

    pub fn get(&self, id: &str) -> Result<Subscription> {
        self.by_id
            .get(id)
            .map(|s| s.clone())
            .ok_or_else(|| BrokerError::not_found("subscription", id))
    }

    /// Resolves a subscription through the (topic, consumer group) index.
    pub fn get_by_topic_and_group(
        &self,
        topic_name: &str,
        consumer_group: &str,
    ) -> Result<Subscription> {
        let key = (topic_name.to_string(), consumer_group.to_string());
        self.by_topic_group
            .get(&key)
            .and_then(|id| self.by_id.get(id.value()).map(|s| s.clone()))
            .ok_or_else(|| {
                BrokerError::not_found("subscription", format!("{topic_name}/{consumer_group}"))
            })
    }

    pub fn list_by_topic(&self, topic_name: &str) -> Vec<Subscription> {
        self.by_id
            .iter()
            .filter(|s| s.topic_name == topic_name)
            .map(|s| s.value().clone())
            .collect()
    }

    pub fn list(&self) -> Vec<Subscription> {
        self.by_id.iter().map(|s| s.value().clone()).collect()
    }

    /// Unconditionally sets the cursor. Callers choose a value that keeps
    /// the cursor monotonically non-decreasing; the registry does not
    /// reject a backward move.
    pub fn advance_cursor(&self, id: &str, new_cursor: i64) {
        if let Some(mut sub) = self.by_id.get_mut(id) {
            sub.cursor = new_cursor;
        }
    }
}
