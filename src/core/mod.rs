//! Broker core: message storage, topic/queue catalog, subscriptions and
//! the delivery protocol. Everything in here is synchronous and
//! transport-agnostic; the wire layer lives in [`crate::broker`].

pub mod broker;
pub mod catalog;
pub mod error;
pub mod log;
pub mod message;
pub mod pending;
pub mod subscriptions;

pub use broker::Broker;
pub use catalog::{Queue, Topic, TopicCatalog, DEFAULT_QUEUE_ID};
pub use error::{BrokerError, Result};
pub use log::PartitionLog;
pub use message::{new_message, Message};
pub use pending::{InFlightTracker, PendingDelivery};
pub use subscriptions::{DeliveryGuarantee, Subscription, SubscriptionRegistry};
