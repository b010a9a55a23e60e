//! WebSocket server: accept loop and per-session tasks.
//!
//! Each accepted TCP connection is upgraded to a WebSocket and served by its
//! own Tokio task.  Every text frame is one JSON-RPC request: it is forwarded
//! to the core loop through a [`CoreHandle`], and the reply is written back as
//! one text frame.  Sessions never touch the dispatcher directly, so requests
//! from several clients are serialised by the core loop.
//!
//! Shutdown is driven by the shared `running` flag (cleared by the Ctrl+C
//! handler in `main.rs`); the accept loop polls it every 200 ms.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::{
    accept_async,
    tungstenite::{Error as WsError, Message as WsMessage},
};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::application::core_loop::CoreHandle;

const ACCEPT_POLL: Duration = Duration::from_millis(200);

/// Binds `bind_addr` and serves WebSocket sessions until `running` is cleared.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot be bound.
pub async fn run_server(
    bind_addr: SocketAddr,
    core: CoreHandle,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind WebSocket listener on {bind_addr}"))?;
    info!("MCP WebSocket server listening on ws://{bind_addr}");
    serve(listener, core, running).await
}

/// Runs the accept loop on an already bound listener.
pub async fn serve(
    listener: TcpListener,
    core: CoreHandle,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    loop {
        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; stopping accept loop");
            break;
        }

        match timeout(ACCEPT_POLL, listener.accept()).await {
            Ok(Ok((stream, peer_addr))) => {
                let session = Uuid::new_v4();
                info!(%session, %peer_addr, "new client connection");
                let core = core.clone();
                tokio::spawn(async move {
                    match run_session(stream, session, core).await {
                        Ok(()) => info!(%session, "session closed normally"),
                        Err(e) => warn!(%session, "session closed with error: {e:#}"),
                    }
                });
            }
            Ok(Err(e)) => error!("accept error: {e}"),
            Err(_) => {}
        }
    }
    Ok(())
}

async fn run_session(raw_stream: TcpStream, session: Uuid, core: CoreHandle) -> anyhow::Result<()> {
    let ws_stream = accept_async(raw_stream)
        .await
        .with_context(|| format!("WebSocket handshake failed for session {session}"))?;
    let (mut ws_tx, mut ws_rx) = ws_stream.split();

    loop {
        let frame = match ws_rx.next().await {
            Some(Ok(frame)) => frame,
            Some(Err(WsError::ConnectionClosed | WsError::Protocol(_))) | None => {
                debug!(%session, "client stream ended");
                break;
            }
            Some(Err(e)) => return Err(e).context("WebSocket read failed"),
        };

        match frame {
            WsMessage::Text(text) => {
                debug!(%session, bytes = text.len(), "request frame");
                let reply = core
                    .request(text)
                    .await
                    .context("core loop unavailable")?;
                ws_tx
                    .send(WsMessage::Text(reply))
                    .await
                    .context("WebSocket write failed")?;
            }
            WsMessage::Binary(_) => {
                warn!(%session, "unexpected binary frame (ignored)");
            }
            WsMessage::Close(_) => {
                debug!(%session, "close frame received");
                break;
            }
            WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_) => {}
        }
    }
    Ok(())
}
