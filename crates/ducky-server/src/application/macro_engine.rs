//! MacroEngine: records timestamped HID actions and replays them on a tick.
//!
//! The engine is a three-state machine:
//!
//! ```text
//!   Idle ──start_recording──▶ Recording ──stop_recording──▶ Idle
//!   Idle ──play_macro───────▶ Playing   ──end / stop──────▶ Idle
//!                             Playing   ──end + loop──────▶ Playing
//! ```
//!
//! Only `Idle` may start a new session.  Playback is a polling scheduler:
//! every call to [`MacroEngine::update`] dispatches all actions whose
//! timestamp is at or before the elapsed time, so an action may fire up to
//! one tick late but never early.  `update` never sleeps.
//!
//! # Ownership
//!
//! Saved macros live in `macros` as `Arc<Macro>`.  Playback clones the `Arc`,
//! so deleting or replacing a macro while it plays leaves the running copy
//! intact.
//!
//! # Collaborators
//!
//! The engine is handed a [`MacroStore`] and a [`Clock`] at construction and
//! a [`HidSink`] on every tick.  All three are traits so tests can substitute
//! an in-memory store, a manual clock and a recording sink.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use ducky_core::{ActionKind, DocumentError, Macro, MacroAction, Modifiers, MouseButton};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::clock::Clock;
use super::hid_sink::HidSink;
use super::macro_store::{validate_name, MacroStore, StorageError};

/// How long playback holds a mouse button down for a recorded click.
const PLAYBACK_CLICK_HOLD: Duration = Duration::from_millis(50);

/// Error type for the macro engine.
#[derive(Debug, Error)]
pub enum MacroError {
    #[error("Already recording a macro")]
    AlreadyRecording,
    #[error("Already playing a macro")]
    AlreadyPlaying,
    #[error("Macro engine is busy")]
    Busy,
    #[error("Not recording")]
    NotRecording,
    #[error("Macro '{0}' not found")]
    NotFound(String),
    #[error("Macro '{0}' has no actions")]
    Empty(String),
    #[error("Invalid macro name '{0}'")]
    InvalidName(String),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// The current session.
#[derive(Debug)]
enum SessionState {
    Idle,
    Recording {
        draft: Macro,
        started_at: u32,
    },
    Playing {
        target: Arc<Macro>,
        started_at: u32,
        cursor: usize,
        looping: bool,
    },
}

/// Snapshot reported by `macros/status` and `system_status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineStatus {
    /// `"idle"`, `"recording"` or `"playing"`.
    pub state: &'static str,
    /// Name of the draft or the playing macro.
    #[serde(rename = "macro", skip_serializing_if = "Option::is_none")]
    pub macro_name: Option<String>,
    /// Actions recorded so far, or the playing macro's length.
    pub actions: usize,
    #[serde(rename = "loop")]
    pub looping: bool,
    pub elapsed_ms: u32,
    /// Number of macros held in memory.
    pub loaded: usize,
}

/// Recorder and player for [`Macro`]s.
pub struct MacroEngine {
    state: SessionState,
    macros: BTreeMap<String, Arc<Macro>>,
    store: Box<dyn MacroStore>,
    clock: Box<dyn Clock>,
}

impl MacroEngine {
    pub fn new(store: Box<dyn MacroStore>, clock: Box<dyn Clock>) -> Self {
        Self {
            state: SessionState::Idle,
            macros: BTreeMap::new(),
            store,
            clock,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, SessionState::Idle)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.state, SessionState::Recording { .. })
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.state, SessionState::Playing { .. })
    }

    /// A macro held in memory.
    pub fn get(&self, name: &str) -> Option<Arc<Macro>> {
        self.macros.get(name).cloned()
    }

    // ── Recording ─────────────────────────────────────────────────────────────

    /// Opens a new draft and starts the recording clock.
    pub fn start_recording(&mut self, name: &str, description: &str) -> Result<(), MacroError> {
        match self.state {
            SessionState::Recording { .. } => {
                warn!(name, "start_recording ignored: already recording");
                return Err(MacroError::AlreadyRecording);
            }
            SessionState::Playing { .. } => {
                warn!(name, "start_recording ignored: playback in progress");
                return Err(MacroError::Busy);
            }
            SessionState::Idle => {}
        }
        if validate_name(name).is_err() {
            warn!(name, "start_recording rejected: invalid name");
            return Err(MacroError::InvalidName(name.to_string()));
        }

        self.state = SessionState::Recording {
            draft: Macro::new(name).with_description(description),
            started_at: self.clock.now_ms(),
        };
        info!(name, "macro recording started");
        Ok(())
    }

    /// Closes the draft, keeps it in memory and saves it to storage.
    ///
    /// A storage failure is returned as an error, but the macro remains in
    /// memory and can be played or saved again.
    pub fn stop_recording(&mut self) -> Result<Arc<Macro>, MacroError> {
        let (mut draft, started_at) =
            match std::mem::replace(&mut self.state, SessionState::Idle) {
                SessionState::Recording { draft, started_at } => (draft, started_at),
                other => {
                    self.state = other;
                    return Err(MacroError::NotRecording);
                }
            };

        draft.total_duration = self.clock.now_ms().wrapping_sub(started_at);
        info!(
            name = %draft.name,
            actions = draft.actions.len(),
            duration_ms = draft.total_duration,
            "macro recording stopped"
        );

        let name = draft.name.clone();
        let recorded = Arc::new(draft);
        self.macros.insert(name.clone(), Arc::clone(&recorded));
        self.save_macro(&name)?;
        Ok(recorded)
    }

    fn record(&mut self, kind: ActionKind) -> bool {
        let now = self.clock.now_ms();
        let SessionState::Recording { draft, started_at } = &mut self.state else {
            return false;
        };
        let action = MacroAction::new(now.wrapping_sub(*started_at), kind);
        debug!(
            action = action.kind.label(),
            timestamp = action.timestamp,
            "recorded"
        );
        draft.actions.push(action);
        true
    }

    pub fn record_key_press(&mut self, modifiers: Modifiers, key: u8) -> bool {
        self.record(ActionKind::KeyPress { modifiers, key })
    }

    pub fn record_key_release(&mut self, key: u8) -> bool {
        self.record(ActionKind::KeyRelease { key })
    }

    pub fn record_mouse_move(&mut self, x: i16, y: i16) -> bool {
        self.record(ActionKind::MouseMove { x, y })
    }

    pub fn record_mouse_click(&mut self, button: MouseButton) -> bool {
        self.record(ActionKind::MouseClick { button })
    }

    pub fn record_mouse_scroll(&mut self, amount: i8) -> bool {
        self.record(ActionKind::MouseScroll { amount })
    }

    pub fn record_delay(&mut self, duration: u32) -> bool {
        self.record(ActionKind::Delay { duration })
    }

    // ── Playback ──────────────────────────────────────────────────────────────

    /// Starts playing `name`, loading it from storage if it is not in memory.
    pub fn play_macro(&mut self, name: &str, looping: bool) -> Result<(), MacroError> {
        match self.state {
            SessionState::Playing { .. } => {
                warn!(name, "play_macro ignored: already playing");
                return Err(MacroError::AlreadyPlaying);
            }
            SessionState::Recording { .. } => {
                warn!(name, "play_macro ignored: recording in progress");
                return Err(MacroError::Busy);
            }
            SessionState::Idle => {}
        }

        let target = if let Some(found) = self.get(name) {
            found
        } else if self.store.exists(name) {
            self.load_macro(name)?
        } else {
            return Err(MacroError::NotFound(name.to_string()));
        };
        if target.is_empty() {
            return Err(MacroError::Empty(name.to_string()));
        }

        info!(name, looping, actions = target.actions.len(), "macro playback started");
        self.state = SessionState::Playing {
            target,
            started_at: self.clock.now_ms(),
            cursor: 0,
            looping,
        };
        Ok(())
    }

    /// Stops playback immediately.  Returns `false` if nothing was playing.
    pub fn stop_playback(&mut self) -> bool {
        if let SessionState::Playing { target, .. } = &self.state {
            info!(name = %target.name, "macro playback stopped");
            self.state = SessionState::Idle;
            true
        } else {
            false
        }
    }

    /// One cooperative tick.  Dispatches every due action to `sink` and
    /// returns them in dispatch order.
    ///
    /// Sink failures are logged and the action is skipped; playback carries
    /// on with the next one.
    pub fn update(&mut self, sink: &dyn HidSink) -> Vec<MacroAction> {
        let now = self.clock.now_ms();
        let SessionState::Playing {
            target,
            started_at,
            cursor,
            looping,
        } = &mut self.state
        else {
            return Vec::new();
        };

        let elapsed = now.wrapping_sub(*started_at);
        let mut dispatched = Vec::new();
        while let Some(action) = target.actions.get(*cursor) {
            if action.timestamp > elapsed {
                break;
            }
            execute(sink, action);
            dispatched.push(*action);
            *cursor += 1;
        }

        if *cursor >= target.actions.len() {
            if *looping {
                debug!(name = %target.name, "macro loop restart");
                *cursor = 0;
                *started_at = now;
            } else {
                info!(name = %target.name, "macro playback finished");
                self.state = SessionState::Idle;
            }
        }
        dispatched
    }

    // ── Storage ───────────────────────────────────────────────────────────────

    /// Writes the in-memory macro `name` to storage.
    pub fn save_macro(&self, name: &str) -> Result<(), MacroError> {
        let found = self
            .macros
            .get(name)
            .ok_or_else(|| MacroError::NotFound(name.to_string()))?;
        let document = found.to_document()?;
        self.store.write(name, &document).map_err(|e| {
            warn!(name, error = %e, "failed to save macro");
            MacroError::from(e)
        })?;
        debug!(name, "macro saved");
        Ok(())
    }

    /// Reads `name` from storage into memory, replacing any copy already held.
    pub fn load_macro(&mut self, name: &str) -> Result<Arc<Macro>, MacroError> {
        if !self.store.exists(name) {
            return Err(MacroError::NotFound(name.to_string()));
        }
        let document = self.store.read(name)?;
        let mut loaded = Macro::import(&document).map_err(|e| {
            warn!(name, error = %e, "stored macro is malformed");
            MacroError::from(e)
        })?;
        if loaded.name != name {
            warn!(stored = %loaded.name, name, "stored macro name differs from file; using file name");
            loaded.name = name.to_string();
        }
        let loaded = Arc::new(loaded);
        self.macros.insert(name.to_string(), Arc::clone(&loaded));
        info!(name, actions = loaded.actions.len(), "macro loaded");
        Ok(loaded)
    }

    /// Removes `name` from memory and storage.
    pub fn delete_macro(&mut self, name: &str) -> Result<(), MacroError> {
        let in_memory = self.macros.remove(name).is_some();
        let in_store = self.store.exists(name);
        if in_store {
            self.store.delete(name)?;
        }
        if !in_memory && !in_store {
            return Err(MacroError::NotFound(name.to_string()));
        }
        info!(name, "macro deleted");
        Ok(())
    }

    /// Sorted union of stored and in-memory macro names.
    pub fn list_macros(&self) -> Vec<String> {
        let mut names: Vec<String> = match self.store.list() {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "failed to list stored macros");
                Vec::new()
            }
        };
        names.extend(self.macros.keys().cloned());
        names.sort();
        names.dedup();
        names
    }

    /// The transferable document string for `name`.
    pub fn export_macro(&self, name: &str) -> Result<String, MacroError> {
        if let Some(found) = self.macros.get(name) {
            return Ok(found.export());
        }
        if !self.store.exists(name) {
            return Err(MacroError::NotFound(name.to_string()));
        }
        let document = self.store.read(name)?;
        Ok(Macro::import(&document)?.export())
    }

    /// Parses an exported document, saves it, and keeps it in memory.
    pub fn import_macro(&mut self, document: &str) -> Result<Arc<Macro>, MacroError> {
        let imported = Macro::import(document)?;
        if validate_name(&imported.name).is_err() {
            return Err(MacroError::InvalidName(imported.name));
        }
        let name = imported.name.clone();
        self.store.write(&name, &imported.to_document()?)?;
        let imported = Arc::new(imported);
        self.macros.insert(name.clone(), Arc::clone(&imported));
        info!(name = %name, actions = imported.actions.len(), "macro imported");
        Ok(imported)
    }

    // ── Status ────────────────────────────────────────────────────────────────

    pub fn status(&self) -> EngineStatus {
        let now = self.clock.now_ms();
        let loaded = self.macros.len();
        match &self.state {
            SessionState::Idle => EngineStatus {
                state: "idle",
                macro_name: None,
                actions: 0,
                looping: false,
                elapsed_ms: 0,
                loaded,
            },
            SessionState::Recording { draft, started_at } => EngineStatus {
                state: "recording",
                macro_name: Some(draft.name.clone()),
                actions: draft.actions.len(),
                looping: false,
                elapsed_ms: now.wrapping_sub(*started_at),
                loaded,
            },
            SessionState::Playing {
                target,
                started_at,
                looping,
                ..
            } => EngineStatus {
                state: "playing",
                macro_name: Some(target.name.clone()),
                actions: target.actions.len(),
                looping: *looping,
                elapsed_ms: now.wrapping_sub(*started_at),
                loaded,
            },
        }
    }

    /// One-line summary for the periodic log.
    pub fn status_line(&self) -> String {
        let status = self.status();
        let mut line = format!("Macros: {} loaded", status.loaded);
        let name = status.macro_name.unwrap_or_default();
        match status.state {
            "recording" => {
                line.push_str(&format!(
                    ", RECORDING '{}' ({}s)",
                    name,
                    status.elapsed_ms / 1000
                ));
            }
            "playing" => {
                line.push_str(&format!(", PLAYING '{name}'"));
                if status.looping {
                    line.push_str(" (loop)");
                }
            }
            _ => {}
        }
        line
    }
}

fn execute(sink: &dyn HidSink, action: &MacroAction) {
    debug!(
        action = action.kind.label(),
        timestamp = action.timestamp,
        "dispatching"
    );
    let result = match action.kind {
        ActionKind::KeyPress { modifiers, key } => sink.press_key(key, modifiers),
        ActionKind::KeyRelease { key } => sink.release_key(key),
        ActionKind::MouseMove { x, y } => sink.move_mouse(x, y, true),
        ActionKind::MouseClick { button } => sink.click_mouse(button, PLAYBACK_CLICK_HOLD),
        ActionKind::MouseScroll { amount } => sink.scroll_mouse(amount),
        ActionKind::Delay { .. } => Ok(()),
    };
    if let Err(e) = result {
        warn!(action = action.kind.label(), error = %e, "HID sink rejected macro action");
    }
}
