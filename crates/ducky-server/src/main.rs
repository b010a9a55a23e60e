//! Ducky HID bridge: entry point.
//!
//! Listens for MCP (JSON-RPC 2.0) requests over WebSocket and drives a USB
//! HID keyboard and mouse, either through Linux USB gadget devices or, in
//! dry-run mode, nowhere at all.
//!
//! # Usage
//!
//! ```text
//! ducky-server [OPTIONS]
//!
//! Options:
//!   --config <PATH>      TOML config file [default: ducky.toml]
//!   --port <PORT>        WebSocket port (overrides [server] port)
//!   --bind <IP>          Bind address (overrides [server] bind_address)
//!   --layout <CODE>      Host keyboard layout: US, UK, DE, FR, ES, IT, PT, SE, NO, DK
//!   --sink <KIND>        dry-run, gadget or none
//!   --macro-dir <PATH>   Directory for macro documents
//!   --init-config        Write the effective config to --config and exit
//! ```
//!
//! # Configuration precedence
//!
//! Command-line flag, then `DUCKY_*` environment variable, then the config
//! file, then the built-in default.
//!
//! | Variable          | Flag          |
//! |-------------------|---------------|
//! | `DUCKY_CONFIG`    | `--config`    |
//! | `DUCKY_PORT`      | `--port`      |
//! | `DUCKY_BIND`      | `--bind`      |
//! | `DUCKY_LAYOUT`    | `--layout`    |
//! | `DUCKY_SINK`      | `--sink`      |
//! | `DUCKY_MACRO_DIR` | `--macro-dir` |
//!
//! The log level comes from `RUST_LOG` when set, otherwise from
//! `[server] log_level`.

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::{anyhow, Context};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use ducky_server::application::{
    spawn_core_loop, HidSink, MacroEngine, McpDispatcher, MonotonicClock,
};
use ducky_server::domain::{ServerConfig, SinkKind};
use ducky_server::infrastructure::hid_sink::{DryRunHidSink, GadgetHidSink};
use ducky_server::infrastructure::storage::{load_config, save_config, AppConfig, FsMacroStore};
use ducky_server::infrastructure::ws_server::run_server;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Ducky HID bridge: MCP tool calls in, USB keyboard and mouse reports out.
#[derive(Debug, Parser)]
#[command(
    name = "ducky-server",
    about = "MCP-over-WebSocket bridge to a USB HID keyboard and mouse",
    version
)]
struct Cli {
    /// Path to the TOML configuration file.  A missing file means defaults.
    #[arg(long, default_value = "ducky.toml", env = "DUCKY_CONFIG")]
    config: PathBuf,

    /// WebSocket listen port.
    #[arg(long, env = "DUCKY_PORT")]
    port: Option<u16>,

    /// IP address to bind the WebSocket server to.
    #[arg(long, env = "DUCKY_BIND")]
    bind: Option<String>,

    /// Keyboard layout configured on the target host.
    #[arg(long, env = "DUCKY_LAYOUT")]
    layout: Option<String>,

    /// HID sink: `dry-run`, `gadget` or `none`.
    #[arg(long, env = "DUCKY_SINK")]
    sink: Option<String>,

    /// Directory for macro documents.
    #[arg(long, env = "DUCKY_MACRO_DIR")]
    macro_dir: Option<PathBuf>,

    /// Write the effective configuration to `--config` and exit.
    #[arg(long)]
    init_config: bool,
}

impl Cli {
    /// Applies command-line overrides on top of the file configuration.
    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(bind) = &self.bind {
            config.server.bind_address = bind.clone();
        }
        if let Some(layout) = &self.layout {
            config.hid.layout = layout.clone();
        }
        if let Some(sink) = &self.sink {
            config.hid.sink = sink.clone();
        }
        if let Some(dir) = &self.macro_dir {
            config.macros.directory = dir.clone();
        }
    }
}

/// Opens the configured HID sink.  `None` means tool calls will be refused.
fn build_sink(config: &ServerConfig) -> anyhow::Result<Option<Arc<dyn HidSink>>> {
    let sink: Arc<dyn HidSink> = match config.sink {
        SinkKind::DryRun => Arc::new(
            DryRunHidSink::dry_run(config.layout)
                .with_timing(config.key_delay, config.stroke_hold),
        ),
        SinkKind::Gadget => Arc::new(
            GadgetHidSink::open_gadget(
                &config.keyboard_device,
                &config.mouse_device,
                config.layout,
            )
            .with_context(|| {
                format!(
                    "failed to open HID gadget devices {} / {}",
                    config.keyboard_device.display(),
                    config.mouse_device.display()
                )
            })?
            .with_timing(config.key_delay, config.stroke_hold),
        ),
        SinkKind::None => {
            warn!("no HID sink configured; tool calls will be refused");
            return Ok(None);
        }
    };
    Ok(Some(sink))
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut file_config = load_config(&cli.config)
        .with_context(|| format!("failed to load config {}", cli.config.display()))?;
    cli.apply_overrides(&mut file_config);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&file_config.server.log_level)),
        )
        .init();

    if cli.init_config {
        save_config(&cli.config, &file_config)
            .with_context(|| format!("failed to write config {}", cli.config.display()))?;
        info!("wrote configuration to {}", cli.config.display());
        return Ok(());
    }

    let config = file_config.to_server_config()?;
    info!(
        "Ducky HID bridge starting: ws={}, layout={}, sink={}, macros={}",
        config.bind_addr,
        config.layout.display_name(),
        config.sink,
        config.macro_dir.display()
    );

    let sink = build_sink(&config)?;
    let engine = MacroEngine::new(
        Box::new(FsMacroStore::new(config.macro_dir.clone())),
        Box::new(MonotonicClock::new()),
    );
    let dispatcher = McpDispatcher::new(sink, engine, config.layout);

    let running = Arc::new(AtomicBool::new(true));
    let (core, core_thread) = spawn_core_loop(dispatcher, config.tick_interval, Arc::clone(&running))
        .context("failed to start core loop thread")?;

    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C; shutting down");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    let served = run_server(config.bind_addr, core, Arc::clone(&running)).await;
    running.store(false, Ordering::SeqCst);
    core_thread
        .join()
        .map_err(|_| anyhow!("core loop thread panicked"))?;
    served?;

    info!("Ducky HID bridge stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use ducky_core::KeyboardLayout;

    #[test]
    fn test_cli_defaults() {
        // Arrange / Act
        let cli = Cli::parse_from(["ducky-server"]);

        // Assert
        assert_eq!(cli.config, PathBuf::from("ducky.toml"));
        assert!(cli.port.is_none());
        assert!(!cli.init_config);
    }

    #[test]
    fn test_cli_overrides_replace_file_values() {
        // Arrange
        let cli = Cli::parse_from([
            "ducky-server",
            "--port",
            "9001",
            "--layout",
            "FR",
            "--sink",
            "none",
            "--macro-dir",
            "/tmp/m",
        ]);
        let mut cfg = AppConfig::default();

        // Act
        cli.apply_overrides(&mut cfg);
        let server = cfg.to_server_config().unwrap();

        // Assert
        assert_eq!(server.bind_addr.port(), 9001);
        assert_eq!(server.layout, KeyboardLayout::Fr);
        assert_eq!(server.sink, SinkKind::None);
        assert_eq!(server.macro_dir, PathBuf::from("/tmp/m"));
    }

    #[test]
    fn test_cli_without_overrides_keeps_file_values() {
        // Arrange
        let cli = Cli::parse_from(["ducky-server"]);
        let mut cfg = AppConfig::default();
        cfg.server.port = 7000;

        // Act
        cli.apply_overrides(&mut cfg);

        // Assert
        assert_eq!(cfg.server.port, 7000);
    }

    #[test]
    fn test_invalid_bind_override_is_rejected() {
        let cli = Cli::parse_from(["ducky-server", "--bind", "not.an.ip"]);
        let mut cfg = AppConfig::default();
        cli.apply_overrides(&mut cfg);
        assert!(cfg.to_server_config().is_err());
    }

    #[test]
    fn test_build_sink_none_yields_no_sink() {
        let config = ServerConfig {
            sink: SinkKind::None,
            ..ServerConfig::default()
        };
        assert!(build_sink(&config).unwrap().is_none());
    }

    #[test]
    fn test_build_sink_dry_run_is_ready() {
        let sink = build_sink(&ServerConfig::default()).unwrap().unwrap();
        assert!(sink.is_ready());
    }

    #[test]
    fn test_build_sink_gadget_with_missing_device_fails() {
        let config = ServerConfig {
            sink: SinkKind::Gadget,
            keyboard_device: PathBuf::from("/nonexistent/hidg0"),
            ..ServerConfig::default()
        };
        assert!(build_sink(&config).is_err());
    }
}
