//! Serving loop: accepts connections, parses length-prefixed request
//! frames and dispatches them to the broker core, logging every request
//! outcome.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task;
use tracing::{error, info, warn};

use crate::broker::wire::{self, pb};
use crate::core::error::Result;
use crate::core::Broker;

const INBUF_INIT: usize = 64 * 1024;

/// Serves broker requests on `listener` until `shutdown` flips to true (or
/// its sender is dropped). In-flight connections finish on their own tasks.
pub async fn serve(
    listener: TcpListener,
    broker: Arc<Broker>,
    default_consume_batch: usize,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    info!("broker listening on {}", listener.local_addr()?);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (socket, peer_addr) = accepted?;
                socket.set_nodelay(true)?;
                let broker = Arc::clone(&broker);
                info!("client connected: {}", peer_addr);

                task::spawn(async move {
                    if let Err(e) = handle_client(socket, broker, default_consume_batch).await {
                        error!("error handling {}: {:?}", peer_addr, e);
                    }
                });
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!("shutdown requested, stopping accept loop");
                    return Ok(());
                }
            }
        }
    }
}

async fn handle_client(
    stream: TcpStream,
    broker: Arc<Broker>,
    default_consume_batch: usize,
) -> anyhow::Result<()> {
    let peer = stream.peer_addr()?;
    let (reader_half, writer_half) = stream.into_split();
    let mut reader = BufReader::new(reader_half);
    let mut writer = BufWriter::new(writer_half);

    // Reusable decode buffer; read_buf coalesces many frames per syscall.
    let mut inbuf = BytesMut::with_capacity(INBUF_INIT);

    loop {
        let n = reader.read_buf(&mut inbuf).await?;
        if n == 0 {
            // EOF
            break;
        }

        while let Some(payload) = wire::extract_frame(&mut inbuf)? {
            // Every complete frame gets exactly one response, decodable or
            // not, so request/response clients never stall on bad input.
            let resp = match wire::decode_request(&payload) {
                Ok(req) => dispatch(&broker, req, default_consume_batch, peer),
                Err(e) => {
                    warn!("failed to decode request from {}: {:?}", peer, e);
                    pb::Response {
                        status: Some(pb::Status {
                            code: pb::StatusCode::InvalidArgument as i32,
                            message: "malformed request".to_string(),
                        }),
                        body: None,
                    }
                }
            };
            writer.write_all(&wire::encode_response(&resp)).await?;
        }
        writer.flush().await?;
    }

    Ok(())
}

fn dispatch(
    broker: &Broker,
    req: pb::Request,
    default_consume_batch: usize,
    peer: SocketAddr,
) -> pb::Response {
    let Some(body) = req.body else {
        warn!(%peer, "request with no body");
        return pb::Response {
            status: Some(pb::Status {
                code: pb::StatusCode::InvalidArgument as i32,
                message: "request body missing".to_string(),
            }),
            body: None,
        };
    };

    let method = method_name(&body);
    match handle(broker, body, default_consume_batch) {
        Ok(body) => {
            info!(%peer, method, "ok");
            pb::Response {
                status: Some(wire::status_ok()),
                body,
            }
        }
        Err(err) => {
            warn!(%peer, method, error = %err, "request failed");
            pb::Response {
                status: Some(wire::status_from_error(&err)),
                body: None,
            }
        }
    }
}

fn method_name(body: &pb::request::Body) -> &'static str {
    use pb::request::Body;
    match body {
        Body::CreateTopic(_) => "CreateTopic",
        Body::CreateQueue(_) => "CreateQueue",
        Body::ListTopics(_) => "ListTopics",
        Body::ListQueues(_) => "ListQueues",
        Body::Publish(_) => "Publish",
        Body::Subscribe(_) => "Subscribe",
        Body::Consume(_) => "Consume",
        Body::Ack(_) => "Ack",
        Body::ListSubscriptions(_) => "ListSubscriptions",
    }
}

fn handle(
    broker: &Broker,
    body: pb::request::Body,
    default_consume_batch: usize,
) -> Result<Option<pb::response::Body>> {
    use pb::request::Body as Req;
    use pb::response::Body as Resp;

    match body {
        Req::CreateTopic(r) => {
            let topic = broker.create_topic(&r.name, r.retention_messages.max(0) as u32)?;
            Ok(Some(Resp::Topic(pb::TopicInfo {
                name: topic.name,
                retention_messages: topic.retention_messages as i32,
            })))
        }
        Req::CreateQueue(r) => {
            let queue = broker.create_queue(&r.topic_name, &r.queue_id)?;
            Ok(Some(Resp::Queue(pb::QueueInfo {
                topic_name: queue.topic_name,
                queue_id: queue.queue_id,
            })))
        }
        Req::ListTopics(_) => {
            let topics = broker
                .list_topics()
                .into_iter()
                .map(|t| pb::TopicInfo {
                    name: t.name,
                    retention_messages: t.retention_messages as i32,
                })
                .collect();
            Ok(Some(Resp::Topics(pb::ListTopicsResponse { topics })))
        }
        Req::ListQueues(r) => {
            let queues = broker
                .list_queues(&r.topic_name)
                .into_iter()
                .map(|q| pb::QueueInfo {
                    topic_name: q.topic_name,
                    queue_id: q.queue_id,
                })
                .collect();
            Ok(Some(Resp::Queues(pb::ListQueuesResponse { queues })))
        }
        Req::Publish(r) => {
            let key = if r.key.is_empty() { None } else { Some(r.key) };
            let msg = broker.publish(
                &r.topic_name,
                &r.queue_id,
                Bytes::from(r.payload),
                key,
                r.headers,
            )?;
            Ok(Some(Resp::Publish(pb::PublishResponse {
                message_id: msg.id,
                offset: msg.offset,
            })))
        }
        Req::Subscribe(r) => {
            let guarantee = wire::guarantee_from_wire(r.delivery_guarantee());
            let ack_timeout =
                (r.ack_timeout_secs > 0).then(|| Duration::from_secs(u64::from(r.ack_timeout_secs)));
            let sub = broker.subscribe(
                &r.topic_name,
                &r.queue_id,
                &r.consumer_group,
                guarantee,
                ack_timeout,
            )?;
            Ok(Some(Resp::Subscription(pb::SubscribeResponse {
                subscription_id: sub.id,
                topic_name: sub.topic_name,
                queue_id: sub.queue_id,
                consumer_group: sub.consumer_group,
            })))
        }
        Req::Consume(r) => {
            let max = if r.max_messages == 0 {
                default_consume_batch
            } else {
                r.max_messages as usize
            };
            let messages = broker
                .consume(&r.subscription_id, max)?
                .into_iter()
                .map(wire::message_to_wire)
                .collect();
            Ok(Some(Resp::Messages(pb::ConsumeResponse { messages })))
        }
        Req::Ack(r) => {
            broker.ack(&r.subscription_id, &r.delivery_id)?;
            Ok(Some(Resp::Ack(pb::AckResponse {})))
        }
        Req::ListSubscriptions(r) => {
            let topic = (!r.topic_name.is_empty()).then_some(r.topic_name.as_str());
            let subscriptions = broker
                .list_subscriptions(topic)
                .into_iter()
                .map(|s| pb::SubscriptionInfo {
                    id: s.id,
                    topic_name: s.topic_name,
                    queue_id: s.queue_id,
                    consumer_group: s.consumer_group,
                    delivery_guarantee: wire::guarantee_to_wire(s.guarantee) as i32,
                    cursor: s.cursor,
                })
                .collect();
            Ok(Some(Resp::Subscriptions(pb::ListSubscriptionsResponse {
                subscriptions,
            })))
        }
    }
}
