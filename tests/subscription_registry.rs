use std::time::{Duration, SystemTime};

use fluxmq::core::subscriptions::generate_subscription_id;
use fluxmq::core::{BrokerError, DeliveryGuarantee, Subscription, SubscriptionRegistry};

fn sub(topic: &str, group: &str, queue: &str) -> Subscription {
    Subscription {
        id: generate_subscription_id(),
        topic_name: topic.to_string(),
        queue_id: queue.to_string(),
        consumer_group: group.to_string(),
        guarantee: DeliveryGuarantee::AtLeastOnce,
        ack_timeout: Duration::from_secs(30),
        cursor: 0,
        created_at: SystemTime::now(),
    }
}

#[test]
fn lookup_by_topic_and_group() {
    let registry = SubscriptionRegistry::new();
    let orders = sub("orders", "g1", "0");
    registry.insert(orders.clone()).expect("insert");
    registry.insert(sub("orders", "g2", "0")).expect("insert");
    registry.insert(sub("billing", "g1", "0")).expect("insert");

    let found = registry
        .get_by_topic_and_group("orders", "g1")
        .expect("lookup failed");
    assert_eq!(found.id, orders.id);
    assert_eq!(found.consumer_group, "g1");
}

#[test]
fn lookup_unknown_pair_fails() {
    let registry = SubscriptionRegistry::new();
    registry.insert(sub("orders", "g1", "0")).expect("insert");

    let err = registry.get_by_topic_and_group("orders", "g2").unwrap_err();
    assert!(matches!(err, BrokerError::NotFound { kind: "subscription", .. }));

    let err = registry.get_by_topic_and_group("billing", "g1").unwrap_err();
    assert!(matches!(err, BrokerError::NotFound { kind: "subscription", .. }));
}

#[test]
fn lookup_survives_rejected_duplicate() {
    let registry = SubscriptionRegistry::new();
    let first = sub("orders", "g1", "0");
    registry.insert(first.clone()).expect("insert");

    // Same (topic, group) on another queue: rejected, index untouched.
    let err = registry.insert(sub("orders", "g1", "1")).unwrap_err();
    assert!(matches!(err, BrokerError::AlreadyExists { kind: "subscription", .. }));

    let found = registry
        .get_by_topic_and_group("orders", "g1")
        .expect("lookup failed");
    assert_eq!(found.id, first.id);
    assert_eq!(found.queue_id, "0");
}
