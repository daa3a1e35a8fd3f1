use dashmap::DashMap;
use std::collections::HashMap;
use std::time::SystemTime;

use crate::core::error::{BrokerError, Result};
use crate::core::message::Message;

/// A message delivered under at-least-once that still awaits its ack.
#[derive(Debug, Clone)]
pub struct PendingDelivery {
    /// Full snapshot of the delivered message, delivery id included.
    pub message: Message,
    pub delivery_id: String,
    pub expires_at: SystemTime,
}

/// Per-subscription sets of in-flight deliveries, keyed by delivery id.
///
/// Sets of different subscriptions never interfere; operations on the same
/// subscription serialize on the map's entry lock.
#[derive(Debug, Default)]
pub struct InFlightTracker {
    by_sub: DashMap<String, HashMap<String, PendingDelivery>>,
}

impl InFlightTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites the entry for `pd.delivery_id`.
    pub fn add(&self, sub_id: &str, pd: PendingDelivery) {
        self.by_sub
            .entry(sub_id.to_string())
            .or_default()
            .insert(pd.delivery_id.clone(), pd);
    }

    /// Removes the entry and returns the acknowledged message's offset.
    /// A repeated ack of an already-removed id fails: double-ack is
    /// rejected.
    pub fn ack(&self, sub_id: &str, delivery_id: &str) -> Result<i64> {
        let mut entries = self
            .by_sub
            .get_mut(sub_id)
            .ok_or_else(|| BrokerError::not_found("delivery", delivery_id))?;
        let pd = entries
            .remove(delivery_id)
            .ok_or_else(|| BrokerError::not_found("delivery", delivery_id))?;
        let emptied = entries.is_empty();
        drop(entries);
        if emptied {
            self.by_sub.remove_if(sub_id, |_, m| m.is_empty());
        }
        Ok(pd.message.offset)
    }

    /// Entries whose expiry is strictly before `as_of`. Nothing is removed
    /// or re-stamped; an expired entry keeps resurfacing until acked or
    /// removed.
    pub fn expired(&self, sub_id: &str, as_of: SystemTime) -> Vec<PendingDelivery> {
        self.by_sub
            .get(sub_id)
            .map(|entries| {
                entries
                    .values()
                    .filter(|pd| pd.expires_at < as_of)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Unconditional removal; absence is not an error.
    pub fn remove(&self, sub_id: &str, delivery_id: &str) {
        if let Some(mut entries) = self.by_sub.get_mut(sub_id) {
            entries.remove(delivery_id);
        }
    }
}
