// Minimal tokio-tungstenite client speaking the session socket protocol.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type BoxError = Box<dyn std::error::Error>;

pub struct WebSocketClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WebSocketClient {
    /// Single attempt; a refused upgrade surfaces as `Err`.
    pub async fn connect(url: &str) -> Result<Self, BoxError> {
        let (stream, _) = connect_async(url).await?;
        Ok(Self { stream })
    }

    /// Keeps trying while the test server finishes binding.
    pub async fn connect_retry(url: &str, within: Duration) -> Result<Self, BoxError> {
        let deadline = tokio::time::Instant::now() + within;
        loop {
            let err = match Self::connect(url).await {
                Ok(client) => return Ok(client),
                Err(err) => err,
            };
            if tokio::time::Instant::now() >= deadline {
                return Err(err);
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    /// Next frame of any kind. `Ok(None)` when the stream has ended.
    pub async fn recv_timeout(&mut self, wait: Duration) -> Result<Option<Message>, BoxError> {
        let next = tokio::time::timeout(wait, self.stream.next())
            .await
            .map_err(|_| format!("no frame within {wait:?}"))?;
        Ok(next.transpose()?)
    }

    /// Next text frame as JSON. Control and binary frames are skipped;
    /// `None` once the server closes the socket.
    pub async fn recv_json_timeout(&mut self, wait: Duration) -> Result<Option<Value>, BoxError> {
        loop {
            match self.recv_timeout(wait).await? {
                Some(Message::Text(text)) => return Ok(Some(serde_json::from_str(text.as_str())?)),
                Some(Message::Close(_)) | None => return Ok(None),
                Some(_) => {}
            }
        }
    }

    pub async fn expect_json(&mut self, wait: Duration) -> Result<Value, BoxError> {
        self.recv_json_timeout(wait)
            .await?
            .ok_or_else(|| "socket closed while waiting for a message".into())
    }

    /// Consumes `ack` then `snapshot`; returns the snapshot's session.
    pub async fn handshake(&mut self, wait: Duration) -> Result<Value, BoxError> {
        let ack = self.expect_json(wait).await?;
        assert_eq!(ack["type"], "ack", "first frame should be an ack: {ack}");
        assert_eq!(ack["message"], "connected");

        let snapshot = self.expect_json(wait).await?;
        assert_eq!(
            snapshot["type"], "snapshot",
            "second frame should be a snapshot: {snapshot}"
        );
        Ok(snapshot["session"].clone())
    }

    pub async fn send(&mut self, text: &str) -> Result<(), BoxError> {
        self.stream.send(Message::Text(text.into())).await?;
        Ok(())
    }

    pub async fn close(&mut self) -> Result<(), BoxError> {
        self.stream.close(None).await?;
        Ok(())
    }
}
