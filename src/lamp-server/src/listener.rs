// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! JSON-over-TCP listener for lamp-server.
//!
//! Accepts clients speaking the `ClientEnvelope`/`ClientResponse` protocol
//! from `lamp-protocol`. Every command that touches the light goes through
//! the indicator task, so remote callers queue behind local dispatches and
//! any flash in progress.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info};

use lamp_core::IndicatorHandle;
use lamp_protocol::{
    client_command_to_indicator, encode_line, parse_envelope, ClientCommand, ClientEnvelope,
    ClientResponse, SimpleTokenValidator, TokenValidator,
};

pub async fn run_listener(
    addr: SocketAddr,
    indicator: IndicatorHandle,
    auth_tokens: Vec<String>,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);
    serve(listener, indicator, auth_tokens).await
}

pub async fn serve(
    listener: TcpListener,
    indicator: IndicatorHandle,
    auth_tokens: Vec<String>,
) -> std::io::Result<()> {
    let validator = Arc::new(SimpleTokenValidator::new(auth_tokens));

    loop {
        let (socket, peer) = listener.accept().await?;
        info!("Client connected: {}", peer);

        let indicator = indicator.clone();
        let validator = Arc::clone(&validator);
        tokio::spawn(async move {
            if let Err(e) = handle_client(socket, peer, indicator, validator).await {
                error!("Client {} error: {:?}", peer, e);
            }
        });
    }
}

async fn handle_client(
    socket: TcpStream,
    peer: SocketAddr,
    indicator: IndicatorHandle,
    validator: Arc<SimpleTokenValidator>,
) -> std::io::Result<()> {
    let (reader, mut writer) = socket.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            info!("Client {} disconnected", peer);
            return Ok(());
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let response = match parse_envelope(trimmed) {
            Ok(envelope) => handle_request(envelope, validator.as_ref(), &indicator).await,
            Err(e) => {
                error!("Invalid JSON from {}: {} / {:?}", peer, trimmed, e);
                ClientResponse::error(format!("Invalid JSON: {}", e))
            }
        };

        writer.write_all(encode_line(&response)?.as_bytes()).await?;
        writer.flush().await?;
    }
}

/// Authorise and execute one request. Replies with the light as it is once
/// the command has been applied.
pub async fn handle_request(
    envelope: ClientEnvelope,
    validator: &dyn TokenValidator,
    indicator: &IndicatorHandle,
) -> ClientResponse {
    if let Err(err) = validator.validate(envelope.token.as_deref()) {
        return ClientResponse::error(err);
    }

    match &envelope.cmd {
        ClientCommand::Publish {
            build_id,
            build_name,
            status,
        } => info!("Remote publish: {} ({}) is {}", build_name, build_id, status),
        ClientCommand::PublishQualityChange {
            build_id,
            build_name,
            quality,
        } => info!(
            "Remote publish: {} ({}) quality '{}'",
            build_name, build_id, quality
        ),
        _ => {}
    }

    let result = match client_command_to_indicator(&envelope.cmd) {
        Some(cmd) => {
            debug!("Remote {}", cmd);
            indicator.apply(cmd).await
        }
        None => indicator.snapshot().await,
    };

    match result {
        Ok(state) => ClientResponse::ok(state),
        Err(e) => ClientResponse::error(e.to_string()),
    }
}
