//! TOML configuration file for the server.
//!
//! Default location is `ducky.toml` in the working directory; `--config`
//! selects another file.  A missing file is not an error: every field has a
//! default, so the server starts with the built-in settings.
//!
//! ```toml
//! [server]
//! bind_address = "0.0.0.0"
//! port = 8080
//! log_level = "info"
//! tick_interval_ms = 1
//!
//! [hid]
//! layout = "US"
//! sink = "dry-run"          # "dry-run", "gadget" or "none"
//! keyboard_device = "/dev/hidg0"
//! mouse_device = "/dev/hidg1"
//! key_delay_ms = 10
//! stroke_hold_ms = 50
//!
//! [macros]
//! directory = "macros"
//! ```
//!
//! # Serde default values
//!
//! Fields annotated with `#[serde(default = "some_fn")]` take the value of
//! `some_fn()` when absent, so partial files (or files from an older release)
//! still load.

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use ducky_core::KeyboardLayout;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::config::{ServerConfig, SinkKind};

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value parsed but is not acceptable (bad address, layout, sink).
    #[error("invalid config value for `{key}`: {message}")]
    Invalid { key: &'static str, message: String },
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub hid: HidSection,
    #[serde(default)]
    pub macros: MacrosSection,
}

/// Network and logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSection {
    /// IP address to bind to.  `"0.0.0.0"` binds all interfaces.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// WebSocket port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

/// HID output settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HidSection {
    /// Layout code of the target host (`"US"`, `"DE"`, ...).
    #[serde(default = "default_layout")]
    pub layout: String,
    #[serde(default = "default_sink")]
    pub sink: String,
    #[serde(default = "default_keyboard_device")]
    pub keyboard_device: PathBuf,
    #[serde(default = "default_mouse_device")]
    pub mouse_device: PathBuf,
    #[serde(default = "default_key_delay_ms")]
    pub key_delay_ms: u64,
    #[serde(default = "default_stroke_hold_ms")]
    pub stroke_hold_ms: u64,
}

/// Macro storage settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MacrosSection {
    #[serde(default = "default_macro_directory")]
    pub directory: PathBuf,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_tick_interval_ms() -> u64 {
    1
}
fn default_layout() -> String {
    KeyboardLayout::Us.code().to_string()
}
fn default_sink() -> String {
    SinkKind::DryRun.to_string()
}
fn default_keyboard_device() -> PathBuf {
    PathBuf::from("/dev/hidg0")
}
fn default_mouse_device() -> PathBuf {
    PathBuf::from("/dev/hidg1")
}
fn default_key_delay_ms() -> u64 {
    10
}
fn default_stroke_hold_ms() -> u64 {
    50
}
fn default_macro_directory() -> PathBuf {
    PathBuf::from("macros")
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            log_level: default_log_level(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl Default for HidSection {
    fn default() -> Self {
        Self {
            layout: default_layout(),
            sink: default_sink(),
            keyboard_device: default_keyboard_device(),
            mouse_device: default_mouse_device(),
            key_delay_ms: default_key_delay_ms(),
            stroke_hold_ms: default_stroke_hold_ms(),
        }
    }
}

impl Default for MacrosSection {
    fn default() -> Self {
        Self {
            directory: default_macro_directory(),
        }
    }
}

impl AppConfig {
    /// Validates the file values and converts them into a [`ServerConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for an unparseable bind address,
    /// layout code or sink name.
    pub fn to_server_config(&self) -> Result<ServerConfig, ConfigError> {
        let ip: IpAddr = self
            .server
            .bind_address
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                key: "server.bind_address",
                message: e.to_string(),
            })?;
        let layout: KeyboardLayout =
            self.hid
                .layout
                .parse()
                .map_err(|e: ducky_core::keymap::LayoutParseError| ConfigError::Invalid {
                    key: "hid.layout",
                    message: e.to_string(),
                })?;
        let sink: SinkKind = self.hid.sink.parse().map_err(
            |e: crate::domain::config::UnknownSinkKind| ConfigError::Invalid {
                key: "hid.sink",
                message: e.to_string(),
            },
        )?;

        Ok(ServerConfig {
            bind_addr: SocketAddr::new(ip, self.server.port),
            tick_interval: Duration::from_millis(self.server.tick_interval_ms.max(1)),
            layout,
            sink,
            keyboard_device: self.hid.keyboard_device.clone(),
            mouse_device: self.hid.mouse_device.clone(),
            key_delay: Duration::from_millis(self.hid.key_delay_ms),
            stroke_hold: Duration::from_millis(self.hid.stroke_hold_ms),
            macro_dir: self.macros.directory.clone(),
        })
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the file
/// does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let cfg: AppConfig = toml::from_str(&content)?;
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Writes `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}
