//! ducky-server library crate.
//!
//! A network-to-HID bridge: MCP clients send JSON-RPC tool calls over a
//! WebSocket, and the server turns them into USB keyboard and mouse reports
//! for a host computer.  It can also record those actions as macros and replay
//! them with their original timing.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! MCP client (JSON-RPC over WebSocket)
//!         ↕
//! [ducky-server]
//!   ├── domain/           ServerConfig, SinkKind
//!   ├── application/      Dispatcher, macro engine, core loop, ports
//!   └── infrastructure/
//!         ├── ws_server/  WebSocket accept loop (tokio-tungstenite)
//!         ├── hid_sink/   USB boot-report encoder, recording mock
//!         └── storage/    Macro document stores, TOML config
//!         ↕
//! Host computer (USB HID keyboard + mouse)
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O.
//! - `application` depends on `domain` and `ducky-core`; it reaches the HID
//!   device, storage and time only through the `HidSink`, `MacroStore` and
//!   `Clock` traits.
//! - `infrastructure` implements those traits and owns all sockets and files.
//!
//! # Threading
//!
//! Network sessions run on the Tokio runtime.  The dispatcher and the macro
//! engine live on one dedicated thread (see `application::core_loop`), which
//! serialises requests and ticks playback between them.

/// Domain layer: configuration types.
pub mod domain;

/// Application layer: dispatcher, macro engine, and ports.
pub mod application;

/// Infrastructure layer: HID sinks, storage, and the WebSocket server.
pub mod infrastructure;
