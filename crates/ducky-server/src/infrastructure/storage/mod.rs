//! Persistence: the TOML configuration file and the macro document stores.

pub mod config;
pub mod macro_store;

pub use config::{load_config, save_config, AppConfig, ConfigError};
pub use macro_store::{FsMacroStore, MemoryMacroStore};
