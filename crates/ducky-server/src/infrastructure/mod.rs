//! Infrastructure layer: adapters for the application ports and the network.
//!
//! - [`hid_sink`] – USB report encoder and the recording mock.
//! - [`storage`] – macro document stores and the TOML config file.
//! - [`ws_server`] – WebSocket accept loop feeding the core loop.

pub mod hid_sink;
pub mod storage;
pub mod ws_server;
