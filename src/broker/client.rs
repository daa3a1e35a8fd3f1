//! Minimal request/response client for the wire protocol, used by the CLI
//! and the integration tests.

use anyhow::{anyhow, Context};
use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};

use crate::broker::wire::{self, pb};

pub struct Client {
    stream: TcpStream,
    inbuf: BytesMut,
}

impl Client {
    pub async fn connect(addr: impl ToSocketAddrs) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(addr)
            .await
            .context("failed to connect to broker")?;
        Ok(Self {
            stream,
            inbuf: BytesMut::with_capacity(8 * 1024),
        })
    }

    /// Sends one request and waits for its response frame.
    pub async fn call(&mut self, body: pb::request::Body) -> anyhow::Result<pb::Response> {
        let frame = wire::encode_request(&pb::Request { body: Some(body) });
        self.stream.write_all(&frame).await?;
        self.stream.flush().await?;

        loop {
            if let Some(payload) = wire::extract_frame(&mut self.inbuf)? {
                return Ok(wire::decode_response(&payload)?);
            }
            let n = self.stream.read_buf(&mut self.inbuf).await?;
            if n == 0 {
                return Err(anyhow!("connection closed before response"));
            }
        }
    }

    /// Like [`Client::call`], but turns a non-OK status into an error.
    pub async fn call_ok(&mut self, body: pb::request::Body) -> anyhow::Result<pb::Response> {
        let resp = self.call(body).await?;
        let status = resp.status.clone().unwrap_or_default();
        if status.code != pb::StatusCode::Ok as i32 {
            return Err(anyhow!("{:?}: {}", status.code(), status.message));
        }
        Ok(resp)
    }
}
