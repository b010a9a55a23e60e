//! Runtime configuration.
//!
//! [`ServerConfig`] is assembled once at startup from the TOML file and the
//! command line (see `infrastructure::storage::config` and `main.rs`) and then
//! passed by value.  Nothing below `main` reads the environment.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use ducky_core::KeyboardLayout;
use thiserror::Error;

/// Which HID sink the server drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SinkKind {
    /// Encode reports but discard them.  Safe on any machine.
    #[default]
    DryRun,
    /// Write reports to Linux USB gadget character devices.
    Gadget,
    /// No sink bound; every tool call is refused.
    None,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown HID sink '{0}' (expected dry-run, gadget or none)")]
pub struct UnknownSinkKind(pub String);

impl FromStr for SinkKind {
    type Err = UnknownSinkKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dry-run" | "dryrun" => Ok(SinkKind::DryRun),
            "gadget" => Ok(SinkKind::Gadget),
            "none" => Ok(SinkKind::None),
            _ => Err(UnknownSinkKind(s.to_string())),
        }
    }
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SinkKind::DryRun => "dry-run",
            SinkKind::Gadget => "gadget",
            SinkKind::None => "none",
        })
    }
}

/// All runtime settings for the server.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// WebSocket listen address.
    pub bind_addr: SocketAddr,
    /// Upper bound on the wait between two macro-engine ticks.
    pub tick_interval: Duration,
    /// Keyboard layout configured on the target host.
    pub layout: KeyboardLayout,
    pub sink: SinkKind,
    /// Keyboard gadget device (boot-protocol keyboard reports).
    pub keyboard_device: PathBuf,
    /// Mouse gadget device (buttons, x, y, wheel reports).
    pub mouse_device: PathBuf,
    /// Pause between characters while typing text.
    pub key_delay: Duration,
    /// Press-to-release hold for single key strokes.
    pub stroke_hold: Duration,
    /// Directory holding `<name>.json` macro documents.
    pub macro_dir: PathBuf,
}

impl Default for ServerConfig {
    /// | Field            | Default          |
    /// |------------------|------------------|
    /// | bind_addr        | `0.0.0.0:8080`   |
    /// | tick_interval    | 1 ms             |
    /// | layout           | US               |
    /// | sink             | dry-run          |
    /// | keyboard_device  | `/dev/hidg0`     |
    /// | mouse_device     | `/dev/hidg1`     |
    /// | key_delay        | 10 ms            |
    /// | stroke_hold      | 50 ms            |
    /// | macro_dir        | `macros`         |
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            tick_interval: Duration::from_millis(1),
            layout: KeyboardLayout::Us,
            sink: SinkKind::DryRun,
            keyboard_device: PathBuf::from("/dev/hidg0"),
            mouse_device: PathBuf::from("/dev/hidg1"),
            key_delay: Duration::from_millis(10),
            stroke_hold: Duration::from_millis(50),
            macro_dir: PathBuf::from("macros"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_port_is_8080() {
        // Arrange / Act
        let cfg = ServerConfig::default();

        // Assert
        assert_eq!(cfg.bind_addr.port(), 8080);
        assert_eq!(cfg.sink, SinkKind::DryRun);
        assert_eq!(cfg.layout, KeyboardLayout::Us);
    }

    #[test]
    fn test_sink_kind_parses_known_names() {
        assert_eq!("gadget".parse::<SinkKind>(), Ok(SinkKind::Gadget));
        assert_eq!("Dry-Run".parse::<SinkKind>(), Ok(SinkKind::DryRun));
        assert_eq!("none".parse::<SinkKind>(), Ok(SinkKind::None));
        assert!("bluetooth".parse::<SinkKind>().is_err());
    }

    #[test]
    fn test_sink_kind_display_round_trips() {
        for kind in [SinkKind::DryRun, SinkKind::Gadget, SinkKind::None] {
            assert_eq!(kind.to_string().parse::<SinkKind>(), Ok(kind));
        }
    }
}
