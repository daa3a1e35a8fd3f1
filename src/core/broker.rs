use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use bytes::Bytes;
use tracing::debug;
use uuid::Uuid;

use crate::config::BrokerConfig;
use crate::core::catalog::{Queue, Topic, TopicCatalog, DEFAULT_QUEUE_ID};
use crate::core::error::{BrokerError, Result};
use crate::core::log::PartitionLog;
use crate::core::message::{new_message, Message};
use crate::core::pending::{InFlightTracker, PendingDelivery};
use crate::core::subscriptions::{
    generate_subscription_id, DeliveryGuarantee, Subscription, SubscriptionRegistry,
};

/// Publish path and consume/ack coordination over the catalog, partition
/// log, subscription registry and in-flight tracker.
///
/// The collections are constructed once and passed in as handles; nothing
/// lives in global state. Each collection is independently lock-protected
/// and multi-step operations commit per collection, so a concurrent
/// observer can see intermediate states (a topic without its default queue
/// during creation, an acked delivery whose cursor has not moved yet).
#[derive(Debug)]
pub struct Broker {
    catalog: Arc<TopicCatalog>,
    log: Arc<PartitionLog>,
    subscriptions: Arc<SubscriptionRegistry>,
    in_flight: Arc<InFlightTracker>,
    max_message_size: usize,
    default_retention: u32,
    default_ack_timeout: Duration,
}

impl Broker {
    pub fn new(
        cfg: &BrokerConfig,
        catalog: Arc<TopicCatalog>,
        log: Arc<PartitionLog>,
        subscriptions: Arc<SubscriptionRegistry>,
        in_flight: Arc<InFlightTracker>,
    ) -> Self {
        Self {
            catalog,
            log,
            subscriptions,
            in_flight,
            max_message_size: cfg.max_message_size_bytes,
            default_retention: cfg.default_retention_messages,
            default_ack_timeout: Duration::from_secs(cfg.ack_timeout_secs),
        }
    }

    /// Convenience constructor wiring fresh collections.
    pub fn from_config(cfg: &BrokerConfig) -> Self {
        Self::new(
            cfg,
            Arc::new(TopicCatalog::new()),
            Arc::new(PartitionLog::new()),
            Arc::new(SubscriptionRegistry::new()),
            Arc::new(InFlightTracker::new()),
        )
    }

    // ───────────────────────────────────────────────────────
    // Catalog operations
    // ───────────────────────────────────────────────────────

    /// Creates a topic together with its default queue `"0"`. A retention
    /// of 0 selects the configured default. If the default queue cannot be
    /// created the topic is rolled back (best-effort, not isolated from
    /// concurrent readers) and the queue error surfaces.
    pub fn create_topic(&self, name: &str, retention_messages: u32) -> Result<Topic> {
        let retention = if retention_messages == 0 {
            self.default_retention
        } else {
            retention_messages
        };
        let topic = Topic {
            name: name.to_string(),
            retention_messages: retention,
            created_at: SystemTime::now(),
        };
        self.catalog.create_topic(topic.clone())?;

        let queue = Queue {
            topic_name: name.to_string(),
            queue_id: DEFAULT_QUEUE_ID.to_string(),
            created_at: SystemTime::now(),
        };
        if let Err(err) = self.catalog.create_queue(queue) {
            self.catalog.delete_topic(name);
            return Err(err);
        }
        Ok(topic)
    }

    /// Adds a queue to an existing topic. An empty queue id selects `"0"`.
    pub fn create_queue(&self, topic_name: &str, queue_id: &str) -> Result<Queue> {
        self.catalog.get_topic(topic_name)?;
        let queue_id = default_queue_id(queue_id);
        let queue = Queue {
            topic_name: topic_name.to_string(),
            queue_id: queue_id.to_string(),
            created_at: SystemTime::now(),
        };
        self.catalog.create_queue(queue.clone())?;
        Ok(queue)
    }

    pub fn list_topics(&self) -> Vec<Topic> {
        self.catalog.list_topics()
    }

    pub fn list_queues(&self, topic_name: &str) -> Vec<Queue> {
        self.catalog.list_queues(topic_name)
    }

    // ───────────────────────────────────────────────────────
    // Publish path
    // ───────────────────────────────────────────────────────

    /// Validates and appends a message to the target partition. On any
    /// failure nothing is appended.
    pub fn publish(
        &self,
        topic_name: &str,
        queue_id: &str,
        payload: Bytes,
        key: Option<String>,
        headers: HashMap<String, String>,
    ) -> Result<Message> {
        if payload.len() > self.max_message_size {
            return Err(BrokerError::MessageTooLarge {
                size: payload.len(),
                max_size: self.max_message_size,
            });
        }
        self.catalog.get_topic(topic_name)?;
        let queue_id = default_queue_id(queue_id);
        self.catalog.get_queue(topic_name, queue_id)?;

        let msg = self
            .log
            .append(new_message(topic_name, queue_id, payload, key, headers));
        debug!(topic = topic_name, queue = queue_id, offset = msg.offset, "message appended");
        Ok(msg)
    }

    // ───────────────────────────────────────────────────────
    // Subscriptions
    // ───────────────────────────────────────────────────────

    /// Registers a consumer-group subscription with cursor 0 and the
    /// caller-supplied or configured default ack timeout.
    pub fn subscribe(
        &self,
        topic_name: &str,
        queue_id: &str,
        consumer_group: &str,
        guarantee: DeliveryGuarantee,
        ack_timeout: Option<Duration>,
    ) -> Result<Subscription> {
        self.catalog.get_topic(topic_name)?;
        let queue_id = default_queue_id(queue_id);
        self.catalog.get_queue(topic_name, queue_id)?;

        let sub = Subscription {
            id: generate_subscription_id(),
            topic_name: topic_name.to_string(),
            queue_id: queue_id.to_string(),
            consumer_group: consumer_group.to_string(),
            guarantee,
            ack_timeout: ack_timeout.unwrap_or(self.default_ack_timeout),
            cursor: 0,
            created_at: SystemTime::now(),
        };
        self.subscriptions.insert(sub.clone())?;
        Ok(sub)
    }

    pub fn list_subscriptions(&self, topic_name: Option<&str>) -> Vec<Subscription> {
        match topic_name {
            Some(topic) => self.subscriptions.list_by_topic(topic),
            None => self.subscriptions.list(),
        }
    }

    // ───────────────────────────────────────────────────────
    // Consume / Ack
    // ───────────────────────────────────────────────────────

    /// Pulls up to `max_messages` (clamped to at least 1) for a
    /// subscription.
    ///
    /// At-least-once subscriptions are first served any in-flight entries
    /// already past their expiry, verbatim: same delivery ids, same expiry
    /// timestamps, nothing removed. Those entries keep coming back on every
    /// call until acked or removed. Only when none are expired does the
    /// call read new messages from the cursor; the cursor itself advances
    /// at delivery time for at-most-once and only via `ack` for
    /// at-least-once.
    pub fn consume(&self, subscription_id: &str, max_messages: usize) -> Result<Vec<Message>> {
        let max_messages = max_messages.max(1);
        let sub = self.subscriptions.get(subscription_id)?;

        if sub.guarantee == DeliveryGuarantee::AtLeastOnce {
            let expired = self.in_flight.expired(subscription_id, SystemTime::now());
            if !expired.is_empty() {
                debug!(
                    subscription = subscription_id,
                    count = expired.len(),
                    "redelivering expired in-flight messages"
                );
                return Ok(expired
                    .into_iter()
                    .map(|pd| {
                        let mut msg = pd.message;
                        msg.delivery_id = Some(pd.delivery_id);
                        msg
                    })
                    .collect());
            }
        }

        let msgs = self
            .log
            .read(&sub.topic_name, &sub.queue_id, sub.cursor, max_messages);
        if msgs.is_empty() {
            return Ok(Vec::new());
        }

        match sub.guarantee {
            DeliveryGuarantee::AtMostOnce => {
                if let Some(last) = msgs.last() {
                    self.subscriptions
                        .advance_cursor(subscription_id, last.offset + 1);
                }
                Ok(msgs)
            }
            DeliveryGuarantee::AtLeastOnce => {
                // One fresh prefix per batch; combined with the message id
                // it keeps delivery ids unique within and across batches.
                let batch_prefix = Uuid::new_v4().simple().to_string();
                let expires_at = SystemTime::now() + sub.ack_timeout;
                let mut out = Vec::with_capacity(msgs.len());
                for mut msg in msgs {
                    let delivery_id = format!("{batch_prefix}-{}", msg.id);
                    msg.delivery_id = Some(delivery_id.clone());
                    self.in_flight.add(
                        subscription_id,
                        PendingDelivery {
                            message: msg.clone(),
                            delivery_id,
                            expires_at,
                        },
                    );
                    out.push(msg);
                }
                Ok(out)
            }
        }
    }

    /// Acknowledges one at-least-once delivery and advances the cursor to
    /// `acked offset + 1`, unconditionally: acking a later message moves
    /// the cursor past earlier messages still outstanding.
    pub fn ack(&self, subscription_id: &str, delivery_id: &str) -> Result<()> {
        self.subscriptions.get(subscription_id)?;
        let acked_offset = self.in_flight.ack(subscription_id, delivery_id)?;
        self.subscriptions
            .advance_cursor(subscription_id, acked_offset + 1);
        debug!(
            subscription = subscription_id,
            offset = acked_offset,
            "delivery acknowledged"
        );
        Ok(())
    }
}

fn default_queue_id(queue_id: &str) -> &str {
    if queue_id.is_empty() {
        DEFAULT_QUEUE_ID
    } else {
        queue_id
    }
}
