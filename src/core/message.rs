use bytes::Bytes;
use std::collections::HashMap;
use std::time::SystemTime;
use uuid::Uuid;

/// A single record in a partition log.
///
/// `offset` is assigned by the log at append time and never changes
/// afterwards. `delivery_id` is set only on the instance handed out by an
/// at-least-once consume; the stored record never carries one.
#[derive(Debug, Clone)]
pub struct Message {
    pub id: String,
    pub topic_name: String,
    pub queue_id: String,
    pub payload: Bytes,
    pub key: Option<String>,
    pub headers: HashMap<String, String>,
    pub offset: i64,
    pub created_at: SystemTime,
    pub delivery_id: Option<String>,
}

/// Builds a message ready for appending; the log fills in the offset.
pub fn new_message(
    topic_name: impl Into<String>,
    queue_id: impl Into<String>,
    payload: impl Into<Bytes>,
    key: Option<String>,
    headers: HashMap<String, String>,
) -> Message {
    Message {
        id: generate_id(),
        topic_name: topic_name.into(),
        queue_id: queue_id.into(),
        payload: payload.into(),
        key,
        headers,
        offset: 0,
        created_at: SystemTime::now(),
        delivery_id: None,
    }
}

/// Opaque, globally unique message identifier.
pub fn generate_id() -> String {
    Uuid::new_v4().simple().to_string()
}
