//! Wire schema and framing.
//!
//! Every frame on the socket is a 4-byte big-endian length prefix followed
//! by a protobuf `Request` or `Response` envelope.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use prost::Message as _;

use crate::core::error::BrokerError;
use crate::core::subscriptions::DeliveryGuarantee;

pub mod pb {
    include!(concat!(env!("OUT_DIR"), "/fluxmq.rs"));
}

/// Cap on a single frame; anything larger drops the connection.
pub const MAX_FRAME_LEN: usize = 8 * 1024 * 1024;

pub fn encode_request(req: &pb::Request) -> Bytes {
    encode_frame(req)
}

pub fn encode_response(resp: &pb::Response) -> Bytes {
    encode_frame(resp)
}

fn encode_frame<M: prost::Message>(msg: &M) -> Bytes {
    let data = msg.encode_to_vec();
    let mut buf = BytesMut::with_capacity(4 + data.len());
    buf.put_u32(data.len() as u32);
    buf.extend_from_slice(&data);
    buf.freeze()
}

/// Extracts one length-prefixed frame payload from `buf`, or `None` when a
/// complete frame is not buffered yet. Errors on an oversized frame.
pub fn extract_frame(buf: &mut BytesMut) -> anyhow::Result<Option<Bytes>> {
    if buf.len() < 4 {
        return Ok(None);
    }
    let len = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
    if len > MAX_FRAME_LEN {
        anyhow::bail!("frame length {} exceeds cap {}", len, MAX_FRAME_LEN);
    }
    if buf.len() < 4 + len {
        return Ok(None);
    }
    buf.advance(4);
    Ok(Some(buf.split_to(len).freeze()))
}

pub fn decode_request(payload: &[u8]) -> Result<pb::Request, prost::DecodeError> {
    pb::Request::decode(payload)
}

pub fn decode_response(payload: &[u8]) -> Result<pb::Response, prost::DecodeError> {
    pb::Response::decode(payload)
}

pub fn status_ok() -> pb::Status {
    pb::Status {
        code: pb::StatusCode::Ok as i32,
        message: String::new(),
    }
}

/// Maps a core error to its wire status. The core never sees status codes;
/// this table is the whole translation.
pub fn status_from_error(err: &BrokerError) -> pb::Status {
    let code = match err {
        BrokerError::NotFound { .. } => pb::StatusCode::NotFound,
        BrokerError::AlreadyExists { .. } => pb::StatusCode::AlreadyExists,
        BrokerError::MessageTooLarge { .. } => pb::StatusCode::InvalidArgument,
        BrokerError::Internal(_) => pb::StatusCode::Internal,
    };
    pb::Status {
        code: code as i32,
        message: err.to_string(),
    }
}

pub fn message_to_wire(msg: crate::core::message::Message) -> pb::Message {
    pb::Message {
        id: msg.id,
        topic_name: msg.topic_name,
        queue_id: msg.queue_id,
        payload: msg.payload.to_vec(),
        key: msg.key.unwrap_or_default(),
        headers: msg.headers,
        offset: msg.offset,
        delivery_id: msg.delivery_id.unwrap_or_default(),
    }
}

pub fn guarantee_from_wire(g: pb::DeliveryGuarantee) -> DeliveryGuarantee {
    match g {
        pb::DeliveryGuarantee::AtMostOnce => DeliveryGuarantee::AtMostOnce,
        pb::DeliveryGuarantee::AtLeastOnce => DeliveryGuarantee::AtLeastOnce,
    }
}

pub fn guarantee_to_wire(g: DeliveryGuarantee) -> pb::DeliveryGuarantee {
    match g {
        DeliveryGuarantee::AtMostOnce => pb::DeliveryGuarantee::AtMostOnce,
        DeliveryGuarantee::AtLeastOnce => pb::DeliveryGuarantee::AtLeastOnce,
    }
}
