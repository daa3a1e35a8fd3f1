//! CLI client for a running FluxMQ broker.
//!
//! Covers topic/queue administration plus the full produce/consume cycle:
//!
//!  $ fluxmq-cli create-topic orders
//!  $ fluxmq-cli sub orders g1 --at-least-once
//!  $ fluxmq-cli pub orders "order-1"
//!  $ fluxmq-cli consume sub-<id>
//!  $ fluxmq-cli ack sub-<id> <delivery-id>

use clap::{Parser, Subcommand};
use std::net::SocketAddr;

use fluxmq::broker::wire::pb::{self, request::Body};
use fluxmq::broker::Client;

#[derive(Debug, Parser)]
#[command(
    name = "fluxmq-cli",
    version,
    about = "FluxMQ CLI: topic admin, publish, subscribe, consume, ack"
)]
struct Cli {
    /// Address of the broker (host:port)
    #[arg(short, long, default_value = "127.0.0.1:7070")]
    addr: SocketAddr,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a topic (its default queue "0" comes with it)
    CreateTopic {
        name: String,
        /// Advisory retention limit in messages (0 = broker default)
        #[arg(short, long, default_value_t = 0)]
        retention: i32,
    },
    /// Create an additional queue on an existing topic
    CreateQueue { topic: String, queue: String },
    /// List all topics
    ListTopics,
    /// List the queues of a topic
    ListQueues { topic: String },
    /// Publish a message
    Pub {
        topic: String,
        /// Message payload (quote to include spaces)
        message: String,
        #[arg(short, long, default_value = "")]
        queue: String,
        /// Optional partitioning/grouping key
        #[arg(short, long)]
        key: Option<String>,
    },
    /// Create a consumer-group subscription
    Sub {
        topic: String,
        group: String,
        #[arg(short, long, default_value = "")]
        queue: String,
        /// Use at-least-once delivery (default is at-most-once)
        #[arg(long)]
        at_least_once: bool,
        /// Ack timeout in seconds (0 = broker default)
        #[arg(long, default_value_t = 0)]
        ack_timeout: u32,
    },
    /// Pull messages for a subscription
    Consume {
        subscription: String,
        #[arg(short, long, default_value_t = 0)]
        max: u32,
    },
    /// Acknowledge one at-least-once delivery
    Ack { subscription: String, delivery: String },
    /// List subscriptions, optionally for one topic
    ListSubs {
        #[arg(short, long, default_value = "")]
        topic: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut client = Client::connect(cli.addr).await?;

    let body = match cli.command {
        Command::CreateTopic { name, retention } => Body::CreateTopic(pb::CreateTopicRequest {
            name,
            retention_messages: retention,
        }),
        Command::CreateQueue { topic, queue } => Body::CreateQueue(pb::CreateQueueRequest {
            topic_name: topic,
            queue_id: queue,
        }),
        Command::ListTopics => Body::ListTopics(pb::ListTopicsRequest {}),
        Command::ListQueues { topic } => Body::ListQueues(pb::ListQueuesRequest {
            topic_name: topic,
        }),
        Command::Pub {
            topic,
            message,
            queue,
            key,
        } => Body::Publish(pb::PublishRequest {
            topic_name: topic,
            queue_id: queue,
            payload: message.into_bytes(),
            key: key.unwrap_or_default(),
            headers: Default::default(),
        }),
        Command::Sub {
            topic,
            group,
            queue,
            at_least_once,
            ack_timeout,
        } => Body::Subscribe(pb::SubscribeRequest {
            topic_name: topic,
            queue_id: queue,
            consumer_group: group,
            delivery_guarantee: if at_least_once {
                pb::DeliveryGuarantee::AtLeastOnce as i32
            } else {
                pb::DeliveryGuarantee::AtMostOnce as i32
            },
            ack_timeout_secs: ack_timeout,
        }),
        Command::Consume { subscription, max } => Body::Consume(pb::ConsumeRequest {
            subscription_id: subscription,
            max_messages: max,
        }),
        Command::Ack {
            subscription,
            delivery,
        } => Body::Ack(pb::AckRequest {
            subscription_id: subscription,
            delivery_id: delivery,
        }),
        Command::ListSubs { topic } => {
            Body::ListSubscriptions(pb::ListSubscriptionsRequest { topic_name: topic })
        }
    };

    let resp = client.call_ok(body).await?;
    print_response(resp);
    Ok(())
}

fn print_response(resp: pb::Response) {
    use pb::response::Body as Resp;
    match resp.body {
        Some(Resp::Topic(t)) => println!("topic {} retention={}", t.name, t.retention_messages),
        Some(Resp::Queue(q)) => println!("queue {}/{}", q.topic_name, q.queue_id),
        Some(Resp::Topics(list)) => {
            for t in list.topics {
                println!("{} retention={}", t.name, t.retention_messages);
            }
        }
        Some(Resp::Queues(list)) => {
            for q in list.queues {
                println!("{}/{}", q.topic_name, q.queue_id);
            }
        }
        Some(Resp::Publish(p)) => println!("{} @{}", p.message_id, p.offset),
        Some(Resp::Subscription(s)) => println!(
            "{} {}/{} group={}",
            s.subscription_id, s.topic_name, s.queue_id, s.consumer_group
        ),
        Some(Resp::Messages(list)) => {
            for m in list.messages {
                let payload = String::from_utf8_lossy(&m.payload);
                if m.delivery_id.is_empty() {
                    println!("{} {} {}", m.offset, m.id, payload);
                } else {
                    println!("{} {} {} delivery={}", m.offset, m.id, payload, m.delivery_id);
                }
            }
        }
        Some(Resp::Ack(_)) => println!("acked"),
        Some(Resp::Subscriptions(list)) => {
            for s in list.subscriptions {
                println!(
                    "{} {}/{} group={} cursor={}",
                    s.id, s.topic_name, s.queue_id, s.consumer_group, s.cursor
                );
            }
        }
        None => println!("ok"),
    }
}
