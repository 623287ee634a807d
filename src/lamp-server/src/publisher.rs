// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Publishers forwarding build status changes.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time;
use tracing::info;

use lamp_core::dispatch::PublishFuture;
use lamp_core::{BuildStatus, DynResult, Publisher};
use lamp_protocol::{encode_line, parse_response, ClientCommand, ClientEnvelope};

use crate::config::PublishConfig;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const IO_TIMEOUT: Duration = Duration::from_secs(10);

pub fn build_publisher(cfg: &PublishConfig) -> DynResult<Box<dyn Publisher>> {
    match cfg.publish_type.as_str() {
        "log" => Ok(Box::new(LogPublisher)),
        "tcp" => {
            let host = cfg.host.as_deref().ok_or("[publish].host is required")?;
            let port = cfg.port.ok_or("[publish].port is required")?;
            Ok(Box::new(TcpPublisher::new(
                format!("{}:{}", host, port),
                cfg.token.clone(),
            )))
        }
        other => Err(format!("Unknown publisher: {}", other).into()),
    }
}

/// Writes every publish call to the log.
pub struct LogPublisher;

impl Publisher for LogPublisher {
    fn publish<'a>(
        &'a self,
        build_id: &'a str,
        build_name: &'a str,
        status: BuildStatus,
    ) -> PublishFuture<'a> {
        info!("Publish {} ({}): {}", build_name, build_id, status);
        Box::pin(async { Ok(()) })
    }

    fn publish_quality_change<'a>(
        &'a self,
        build_id: &'a str,
        build_name: &'a str,
        quality: &'a str,
    ) -> PublishFuture<'a> {
        info!("Publish {} ({}) quality: '{}'", build_name, build_id, quality);
        Box::pin(async { Ok(()) })
    }
}

/// Forwards publish calls to a remote lamp-server listener, one connection
/// per call.
pub struct TcpPublisher {
    addr: String,
    token: Option<String>,
}

impl TcpPublisher {
    pub fn new(addr: String, token: Option<String>) -> Self {
        Self { addr, token }
    }

    async fn send(&self, cmd: ClientCommand) -> DynResult<()> {
        let stream = time::timeout(CONNECT_TIMEOUT, TcpStream::connect(&self.addr))
            .await
            .map_err(|_| format!("connect to {} timed out after {:?}", self.addr, CONNECT_TIMEOUT))??;
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);

        let line = encode_line(&ClientEnvelope::new(self.token.clone(), cmd))?;
        time::timeout(IO_TIMEOUT, async {
            writer.write_all(line.as_bytes()).await?;
            writer.flush().await
        })
        .await
        .map_err(|_| format!("write timed out after {:?}", IO_TIMEOUT))??;

        let mut response = String::new();
        let read = time::timeout(IO_TIMEOUT, reader.read_line(&mut response))
            .await
            .map_err(|_| format!("read timed out after {:?}", IO_TIMEOUT))??;
        if read == 0 {
            return Err("connection closed by remote".into());
        }

        let response = parse_response(&response)?;
        if response.success {
            Ok(())
        } else {
            Err(response
                .error
                .unwrap_or_else(|| "remote error".to_string())
                .into())
        }
    }
}

impl Publisher for TcpPublisher {
    fn publish<'a>(
        &'a self,
        build_id: &'a str,
        build_name: &'a str,
        status: BuildStatus,
    ) -> PublishFuture<'a> {
        Box::pin(self.send(ClientCommand::Publish {
            build_id: build_id.to_string(),
            build_name: build_name.to_string(),
            status,
        }))
    }

    fn publish_quality_change<'a>(
        &'a self,
        build_id: &'a str,
        build_name: &'a str,
        quality: &'a str,
    ) -> PublishFuture<'a> {
        Box::pin(self.send(ClientCommand::PublishQualityChange {
            build_id: build_id.to_string(),
            build_name: build_name.to_string(),
            quality: quality.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use tokio::net::TcpListener;

    use lamp_core::IndicatorState;
    use lamp_protocol::{parse_envelope, ClientResponse};

    use super::*;

    /// Accept one connection, hand the request line back, answer with
    /// `response`.
    async fn one_shot_server(
        response: ClientResponse,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let task = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let (reader, mut writer) = socket.into_split();
            let mut line = String::new();
            BufReader::new(reader).read_line(&mut line).await.unwrap();
            writer
                .write_all(encode_line(&response).unwrap().as_bytes())
                .await
                .unwrap();
            line
        });
        (addr, task)
    }

    #[tokio::test]
    async fn test_tcp_publish_sends_envelope() {
        let (addr, server) = one_shot_server(ClientResponse::ok(IndicatorState::default())).await;
        let publisher = TcpPublisher::new(addr, Some("Bearer abc".to_string()));

        publisher.publish("42", "CI", BuildStatus::Failed).await.unwrap();

        let envelope = parse_envelope(&server.await.unwrap()).unwrap();
        assert_eq!(envelope.token.as_deref(), Some("Bearer abc"));
        assert_eq!(
            envelope.cmd,
            ClientCommand::Publish {
                build_id: "42".into(),
                build_name: "CI".into(),
                status: BuildStatus::Failed,
            }
        );
    }

    #[tokio::test]
    async fn test_tcp_publish_surfaces_remote_error() {
        let (addr, server) =
            one_shot_server(ClientResponse::error("invalid authorization token")).await;
        let publisher = TcpPublisher::new(addr, None);

        let err = publisher
            .publish_quality_change("1", "CI", "Released")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid authorization token");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_tcp_publish_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let publisher = TcpPublisher::new(addr, None);
        assert!(publisher.publish("1", "CI", BuildStatus::Succeeded).await.is_err());
    }

    #[tokio::test]
    async fn test_log_publisher_never_fails() {
        assert!(LogPublisher
            .publish("1", "CI", BuildStatus::Stopped)
            .await
            .is_ok());
    }

    #[test]
    fn test_build_publisher_types() {
        assert!(build_publisher(&PublishConfig::default()).is_ok());
        let tcp_without_port = PublishConfig {
            publish_type: "tcp".into(),
            host: Some("lamp.local".into()),
            ..PublishConfig::default()
        };
        assert!(build_publisher(&tcp_without_port).is_err());
    }
}
