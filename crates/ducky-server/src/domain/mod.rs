//! Domain layer: plain runtime settings with no I/O.

pub mod config;

pub use config::{ServerConfig, SinkKind, UnknownSinkKind};
