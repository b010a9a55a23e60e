//! The cooperative core loop.
//!
//! A single dedicated thread owns the [`McpDispatcher`] (and through it the
//! macro engine and the sink binding).  Each iteration it:
//!
//! 1. waits up to one tick interval for an inbound message,
//! 2. handles at most that one message and sends the reply back,
//! 3. ticks the macro engine once.
//!
//! Network tasks never touch core state directly; they send an
//! [`InboundMessage`] through a [`CoreHandle`] and await the reply.  Because
//! only this thread mutates the dispatcher, no lock guards it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, info};

use super::dispatcher::McpDispatcher;

/// How often the engine status line is logged.
const STATUS_LOG_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("core loop has stopped")]
    Stopped,
}

/// One request travelling to the core thread, with its reply slot.
#[derive(Debug)]
pub struct InboundMessage {
    pub text: String,
    pub reply: oneshot::Sender<String>,
}

/// Cloneable sender side of the core loop.
#[derive(Debug, Clone)]
pub struct CoreHandle {
    tx: mpsc::Sender<InboundMessage>,
}

impl CoreHandle {
    /// Sends `text` to the core thread and waits for its reply.
    pub async fn request(&self, text: impl Into<String>) -> Result<String, CoreError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(InboundMessage {
                text: text.into(),
                reply,
            })
            .map_err(|_| CoreError::Stopped)?;
        rx.await.map_err(|_| CoreError::Stopped)
    }
}

/// Starts the core thread.
///
/// The loop exits when `running` is cleared or every [`CoreHandle`] has been
/// dropped.
pub fn spawn_core_loop(
    mut dispatcher: McpDispatcher,
    tick: Duration,
    running: Arc<AtomicBool>,
) -> std::io::Result<(CoreHandle, JoinHandle<()>)> {
    let (tx, rx) = mpsc::channel::<InboundMessage>();

    let join = thread::Builder::new()
        .name("ducky-core".into())
        .spawn(move || {
            info!(tick_ms = tick.as_millis() as u64, "core loop started");
            let mut last_status = Instant::now();

            while running.load(Ordering::SeqCst) {
                match rx.recv_timeout(tick) {
                    Ok(message) => {
                        let reply = dispatcher.handle_message(&message.text);
                        if message.reply.send(reply).is_err() {
                            debug!("requester went away before the reply was sent");
                        }
                    }
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => break,
                }

                dispatcher.tick();

                if last_status.elapsed() >= STATUS_LOG_INTERVAL {
                    info!("{}", dispatcher.engine().status_line());
                    last_status = Instant::now();
                }
            }
            info!("core loop stopped");
        })?;

    Ok((CoreHandle { tx }, join))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::clock::MonotonicClock;
    use crate::application::macro_engine::MacroEngine;
    use crate::infrastructure::storage::MemoryMacroStore;
    use ducky_core::KeyboardLayout;

    fn dispatcher() -> McpDispatcher {
        let engine = MacroEngine::new(Box::new(MemoryMacroStore::new()), Box::new(MonotonicClock::new()));
        McpDispatcher::new(None, engine, KeyboardLayout::Us)
    }

    #[tokio::test]
    async fn test_request_round_trips_through_core_thread() {
        // Arrange
        let running = Arc::new(AtomicBool::new(true));
        let (handle, join) =
            spawn_core_loop(dispatcher(), Duration::from_millis(1), Arc::clone(&running)).unwrap();

        // Act
        let reply = handle
            .request(r#"{"method":"tools/call","id":3,"params":{"name":"system_status"}}"#)
            .await
            .unwrap();

        // Assert
        assert!(reply.contains("HID controller not available"));
        assert!(reply.contains("\"id\":3"));

        running.store(false, Ordering::SeqCst);
        join.join().unwrap();
    }

    #[tokio::test]
    async fn test_request_after_stop_fails() {
        // Arrange
        let running = Arc::new(AtomicBool::new(true));
        let (handle, join) =
            spawn_core_loop(dispatcher(), Duration::from_millis(1), Arc::clone(&running)).unwrap();
        running.store(false, Ordering::SeqCst);
        join.join().unwrap();

        // Act
        let result = handle.request("{}").await;

        // Assert
        assert_eq!(result, Err(CoreError::Stopped));
    }
}
