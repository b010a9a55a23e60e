//! McpDispatcher: routes JSON-RPC requests to HID tools and the macro engine.
//!
//! One inbound text message produces exactly one outbound text message.
//! Errors fall into two groups:
//!
//! - **Protocol errors** (unparseable JSON, unknown method or tool, no HID
//!   sink bound) become a JSON-RPC `error` object with code −32000.
//! - **Validation and HID failures** become a normal `result` whose
//!   `success` is `false` and whose `message` says what went wrong.
//!
//! While the macro engine is recording, every successful HID tool call is
//! also appended to the draft macro, so a client can record a macro simply by
//! driving the tools.
//!
//! The dispatcher owns the [`MacroEngine`]; nothing else mutates it.

use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ducky_core::protocol::{
    initialize_result, tools_list_result, MacroMethod, IMPLEMENTATION_VERSION, PROTOCOL_VERSION,
    SERVER_NAME,
};
use ducky_core::{
    convert_string, parse_shortcut, resolve_key, KeyCode, KeyboardLayout, MacroAction, Method,
    Modifiers, MouseButton, Request, Response, Tool,
};
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use super::hid_sink::{HidError, HidSink};
use super::macro_engine::{MacroEngine, MacroError};

const DEFAULT_CLICK_MS: u64 = 50;
/// Clicks sleep on the core thread, so long holds are refused.
const MAX_CLICK_MS: u64 = 5_000;

/// Converts one inbound request into one response.
pub struct McpDispatcher {
    sink: Option<Arc<dyn HidSink>>,
    engine: MacroEngine,
    layout: KeyboardLayout,
    started: Instant,
}

impl McpDispatcher {
    /// `sink` is `None` when no HID device is available; tool calls are then
    /// refused with "HID controller not available".
    pub fn new(
        sink: Option<Arc<dyn HidSink>>,
        engine: MacroEngine,
        layout: KeyboardLayout,
    ) -> Self {
        Self {
            sink,
            engine,
            layout,
            started: Instant::now(),
        }
    }

    pub fn engine(&self) -> &MacroEngine {
        &self.engine
    }

    pub fn layout(&self) -> KeyboardLayout {
        self.layout
    }

    /// Handles one wire message and returns the wire reply.
    pub fn handle_message(&mut self, text: &str) -> String {
        self.handle(text).to_json()
    }

    pub fn handle(&mut self, text: &str) -> Response {
        let request = match Request::parse(text) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "rejecting inbound message");
                return Response::error(json!(0), e.to_string());
            }
        };
        debug!(method = %request.method, id = %request.id, "request");

        let Some(method) = Method::parse(&request.method) else {
            warn!(method = %request.method, "unknown method");
            return Response::error(request.id, format!("Unknown method: {}", request.method));
        };

        match method {
            Method::Initialize => Response::success(request.id, initialize_result()),
            Method::ToolsList => Response::success(request.id, tools_list_result()),
            Method::ToolsCall => self.call_tool(&request),
            Method::Macro(m) => {
                let result = self.macro_method(m, &request.params);
                Response::success(request.id, result)
            }
        }
    }

    /// Advances macro playback by one tick.
    pub fn tick(&mut self) -> Vec<MacroAction> {
        match &self.sink {
            Some(sink) => self.engine.update(sink.as_ref()),
            None => Vec::new(),
        }
    }

    // ── tools/call ────────────────────────────────────────────────────────────

    fn call_tool(&mut self, request: &Request) -> Response {
        let Some(sink) = self.sink.clone() else {
            warn!("tools/call refused: no HID sink bound");
            return Response::error(request.id.clone(), "HID controller not available");
        };

        let name = request.param_str("name").unwrap_or_default();
        let Ok(tool) = Tool::from_str(name) else {
            warn!(tool = name, "unknown tool");
            return Response::error(request.id.clone(), format!("Unknown tool: {name}"));
        };

        let args = request.args();
        if tool != Tool::SystemStatus && !sink.is_ready() {
            return Response::success(request.id.clone(), failure("HID device not ready"));
        }
        if tool != Tool::SystemStatus && self.engine.is_playing() {
            debug!(tool = tool.name(), "tools/call refused: macro playing");
            return Response::success(request.id.clone(), failure("Macro playback in progress"));
        }

        let result = match tool {
            Tool::KeyboardType => self.keyboard_type(sink.as_ref(), &args),
            Tool::KeyboardKey => self.keyboard_key(sink.as_ref(), &args),
            Tool::KeyboardShortcut => self.keyboard_shortcut(sink.as_ref(), &args),
            Tool::MouseMove => self.mouse_move(sink.as_ref(), &args),
            Tool::MouseClick => self.mouse_click(sink.as_ref(), &args),
            Tool::MouseScroll => self.mouse_scroll(sink.as_ref(), &args),
            Tool::SystemStatus => self.system_status(sink.as_ref()),
        };
        info!(tool = tool.name(), success = %result["success"], "tool call");
        Response::success(request.id.clone(), result)
    }

    fn keyboard_type(&mut self, sink: &dyn HidSink, args: &Value) -> Value {
        let text = match required_str(args, "text") {
            Ok(text) => text,
            Err(result) => return result,
        };

        let outcome = sink.type_text(text);
        if outcome.is_ok() {
            for code in convert_string(text, self.layout) {
                self.record_stroke(code);
            }
        }
        report(
            outcome,
            "Text typed successfully",
            "Failed to type text",
            [("typed_text", json!(text))],
        )
    }

    fn keyboard_key(&mut self, sink: &dyn HidSink, args: &Value) -> Value {
        let key = match required_str(args, "key") {
            Ok(key) => key,
            Err(result) => return result,
        };
        let modifiers = optional_str(args, "modifiers").unwrap_or_default();

        let target = match resolve_key(key) {
            Ok(target) => target,
            Err(e) => return failure(e.to_string()),
        };
        let outcome = sink.send_key_stroke(key, modifiers);
        if outcome.is_ok() {
            self.record_stroke(target.key_code(self.layout, Modifiers::parse(modifiers)));
        }
        report(
            outcome,
            "Key pressed successfully",
            "Failed to press key",
            [("key", json!(key)), ("modifiers", json!(modifiers))],
        )
    }

    fn keyboard_shortcut(&mut self, sink: &dyn HidSink, args: &Value) -> Value {
        let shortcut = optional_str(args, "shortcut").unwrap_or_default();
        if shortcut.trim().is_empty() {
            return failure("Missing shortcut");
        }

        let parsed = parse_shortcut(shortcut);
        if parsed.key.is_empty() {
            return failure("Missing shortcut key");
        }
        let target = match resolve_key(&parsed.key) {
            Ok(target) => target,
            Err(e) => return failure(e.to_string()),
        };
        let outcome = sink.send_key_stroke(&parsed.key, &parsed.modifiers);
        if outcome.is_ok() {
            self.record_stroke(target.key_code(self.layout, Modifiers::parse(&parsed.modifiers)));
        }
        report(
            outcome,
            "Shortcut sent successfully",
            "Failed to send shortcut",
            [
                ("shortcut", json!(shortcut)),
                ("key", json!(parsed.key)),
                ("modifiers", json!(parsed.modifiers)),
            ],
        )
    }

    fn mouse_move(&mut self, sink: &dyn HidSink, args: &Value) -> Value {
        let (x, y) = match (required_int(args, "x"), required_int(args, "y")) {
            (Ok(x), Ok(y)) => (x, y),
            (Err(result), _) | (_, Err(result)) => return result,
        };
        let relative = args
            .get("relative")
            .and_then(Value::as_bool)
            .unwrap_or(true);
        let (Ok(x16), Ok(y16)) = (i16::try_from(x), i16::try_from(y)) else {
            return failure("Mouse movement out of range");
        };
        if !relative {
            return failure("Absolute positioning is not supported");
        }

        let outcome = sink.move_mouse(x16, y16, true);
        if outcome.is_ok() {
            self.engine.record_mouse_move(x16, y16);
        }
        report(
            outcome,
            "Mouse moved successfully",
            "Failed to move mouse",
            [("x", json!(x16)), ("y", json!(y16)), ("relative", json!(relative))],
        )
    }

    fn mouse_click(&mut self, sink: &dyn HidSink, args: &Value) -> Value {
        let button_name = optional_str(args, "button").unwrap_or("left");
        let duration = match args.get("duration") {
            None | Some(Value::Null) => DEFAULT_CLICK_MS,
            Some(value) => match value.as_u64().filter(|ms| *ms <= MAX_CLICK_MS) {
                Some(ms) => ms,
                None => return failure("Click duration out of range"),
            },
        };

        let button = MouseButton::from_name(button_name);
        let outcome = sink.click_mouse(button, Duration::from_millis(duration));
        if outcome.is_ok() {
            self.engine.record_mouse_click(button);
        }
        report(
            outcome,
            "Mouse clicked successfully",
            "Failed to click mouse",
            [("button", json!(button_name)), ("duration", json!(duration))],
        )
    }

    fn mouse_scroll(&mut self, sink: &dyn HidSink, args: &Value) -> Value {
        let scroll = match required_int(args, "scroll") {
            Ok(scroll) => scroll,
            Err(result) => return result,
        };
        let Some(amount) = i8::try_from(scroll).ok().filter(|a| *a != i8::MIN) else {
            return failure("Scroll amount out of range");
        };

        let outcome = sink.scroll_mouse(amount);
        if outcome.is_ok() {
            self.engine.record_mouse_scroll(amount);
        }
        report(
            outcome,
            "Mouse scrolled successfully",
            "Failed to scroll mouse",
            [("scroll", json!(amount))],
        )
    }

    fn system_status(&self, sink: &dyn HidSink) -> Value {
        json!({
            "success": true,
            "server_name": SERVER_NAME,
            "server_version": IMPLEMENTATION_VERSION,
            "protocol_version": PROTOCOL_VERSION,
            "hid_ready": sink.is_ready(),
            "uptime_ms": self.started.elapsed().as_millis() as u64,
            "layout": self.layout.code(),
            "layout_name": self.layout.display_name(),
            "available_layouts": KeyboardLayout::ALL.iter().map(|l| l.code()).collect::<Vec<_>>(),
            "macros": self.engine.status(),
        })
    }

    /// Appends a press/release pair to the draft, if recording.
    fn record_stroke(&mut self, code: KeyCode) {
        if code.is_supported() && self.engine.is_recording() {
            self.engine.record_key_press(code.modifiers, code.scancode);
            self.engine.record_key_release(code.scancode);
        }
    }

    // ── macros/* ──────────────────────────────────────────────────────────────

    fn macro_method(&mut self, method: MacroMethod, params: &Value) -> Value {
        let result = match method {
            MacroMethod::List => {
                let names = self.engine.list_macros();
                Ok(json!({
                    "success": true,
                    "message": format!("{} macros", names.len()),
                    "macros": names,
                }))
            }
            MacroMethod::Status => Ok(json!({
                "success": true,
                "message": self.engine.status_line(),
                "status": self.engine.status(),
            })),
            MacroMethod::RecordStart => self.macro_record_start(params),
            MacroMethod::RecordStop => self.engine.stop_recording().map(|m| {
                json!({
                    "success": true,
                    "message": "Recording stopped",
                    "name": m.name,
                    "actions": m.actions.len(),
                    "totalDuration": m.total_duration,
                })
            }),
            MacroMethod::RecordDelay => self.macro_record_delay(params),
            MacroMethod::Play => self.macro_play(params),
            MacroMethod::Stop => Ok(if self.engine.stop_playback() {
                json!({"success": true, "message": "Playback stopped"})
            } else {
                failure("Not playing")
            }),
            MacroMethod::Load => match required_str(params, "name") {
                Ok(name) => self.engine.load_macro(name).map(|m| {
                    json!({
                        "success": true,
                        "message": "Macro loaded",
                        "name": m.name,
                        "actions": m.actions.len(),
                    })
                }),
                Err(result) => Ok(result),
            },
            MacroMethod::Export => match required_str(params, "name") {
                Ok(name) => self.engine.export_macro(name).map(|data| {
                    json!({
                        "success": true,
                        "message": "Macro exported",
                        "name": name,
                        "data": data,
                    })
                }),
                Err(result) => Ok(result),
            },
            MacroMethod::Import => match required_str(params, "data") {
                Ok(data) => self.engine.import_macro(data).map(|m| {
                    json!({
                        "success": true,
                        "message": "Macro imported",
                        "name": m.name,
                        "actions": m.actions.len(),
                    })
                }),
                Err(result) => Ok(result),
            },
            MacroMethod::Delete => match required_str(params, "name") {
                Ok(name) => self.engine.delete_macro(name).map(|()| {
                    json!({"success": true, "message": "Macro deleted", "name": name})
                }),
                Err(result) => Ok(result),
            },
        };

        result.unwrap_or_else(|e: MacroError| {
            warn!(?method, error = %e, "macro request failed");
            failure(e.to_string())
        })
    }

    fn macro_record_start(&mut self, params: &Value) -> Result<Value, MacroError> {
        let name = match required_str(params, "name") {
            Ok(name) => name,
            Err(result) => return Ok(result),
        };
        let description = optional_str(params, "description").unwrap_or_default();
        self.engine.start_recording(name, description)?;
        Ok(json!({"success": true, "message": "Recording started", "name": name}))
    }

    fn macro_record_delay(&mut self, params: &Value) -> Result<Value, MacroError> {
        let duration = match params
            .get("duration")
            .and_then(Value::as_u64)
            .and_then(|d| u32::try_from(d).ok())
        {
            Some(duration) => duration,
            None => return Ok(failure("Missing required argument: duration")),
        };
        if !self.engine.record_delay(duration) {
            return Err(MacroError::NotRecording);
        }
        Ok(json!({"success": true, "message": "Delay recorded", "duration": duration}))
    }

    fn macro_play(&mut self, params: &Value) -> Result<Value, MacroError> {
        if self.sink.is_none() {
            return Ok(failure("HID controller not available"));
        }
        let name = match required_str(params, "name") {
            Ok(name) => name,
            Err(result) => return Ok(result),
        };
        let looping = params.get("loop").and_then(Value::as_bool).unwrap_or(false);
        self.engine.play_macro(name, looping)?;
        Ok(json!({
            "success": true,
            "message": "Playback started",
            "name": name,
            "loop": looping,
        }))
    }
}

// ── Result helpers ────────────────────────────────────────────────────────────

fn failure(message: impl Into<String>) -> Value {
    json!({"success": false, "message": message.into()})
}

/// `{success, message, <echoed arguments>}` in that key order.
fn report<const N: usize>(
    outcome: Result<(), HidError>,
    ok_message: &str,
    err_message: &str,
    echoed: [(&str, Value); N],
) -> Value {
    let mut result = Map::new();
    result.insert("success".into(), json!(outcome.is_ok()));
    match &outcome {
        Ok(()) => {
            result.insert("message".into(), json!(ok_message));
        }
        Err(e) => {
            warn!(error = %e, "HID sink call failed");
            result.insert("message".into(), json!(err_message));
        }
    }
    for (key, value) in echoed {
        result.insert(key.to_string(), value);
    }
    if let Err(e) = outcome {
        result.insert("error".into(), json!(e.to_string()));
    }
    Value::Object(result)
}

fn missing(key: &str) -> Value {
    failure(format!("Missing required argument: {key}"))
}

fn optional_str<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str, Value> {
    optional_str(args, key).ok_or_else(|| missing(key))
}

fn required_int(args: &Value, key: &str) -> Result<i64, Value> {
    args.get(key).and_then(Value::as_i64).ok_or_else(|| missing(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::clock::ManualClock;
    use crate::infrastructure::hid_sink::mock::{HidCall, MockHidSink};
    use crate::infrastructure::storage::MemoryMacroStore;

    fn dispatcher_with(sink: Arc<MockHidSink>) -> (McpDispatcher, ManualClock) {
        let clock = ManualClock::new(0);
        let engine = MacroEngine::new(Box::new(MemoryMacroStore::new()), Box::new(clock.clone()));
        let sink: Arc<dyn HidSink> = sink;
        (
            McpDispatcher::new(Some(sink), engine, KeyboardLayout::Us),
            clock,
        )
    }

    fn call(tool: &str, args: Value) -> String {
        json!({"jsonrpc": "2.0", "method": "tools/call", "id": 1, "params": {"name": tool, "args": args}})
            .to_string()
    }

    fn result_of(dispatcher: &mut McpDispatcher, message: &str) -> Value {
        let response = dispatcher.handle(message);
        assert!(!response.is_error(), "{response:?}");
        response.result.unwrap()
    }

    #[test]
    fn test_keyboard_type_echoes_text() {
        // Arrange
        let sink = Arc::new(MockHidSink::new());
        let (mut d, _) = dispatcher_with(Arc::clone(&sink));

        // Act
        let result = result_of(&mut d, &call("keyboard_type", json!({"text": "hi"})));

        // Assert
        assert_eq!(result["success"], true);
        assert_eq!(result["message"], "Text typed successfully");
        assert_eq!(result["typed_text"], "hi");
        assert_eq!(sink.calls(), vec![HidCall::TypeText("hi".into())]);
    }

    #[test]
    fn test_missing_argument_is_validation_failure() {
        // Arrange
        let sink = Arc::new(MockHidSink::new());
        let (mut d, _) = dispatcher_with(Arc::clone(&sink));

        // Act
        let result = result_of(&mut d, &call("keyboard_type", json!({})));

        // Assert
        assert_eq!(result["success"], false);
        assert_eq!(result["message"], "Missing required argument: text");
        assert!(sink.calls().is_empty());
    }

    #[test]
    fn test_keyboard_key_rejects_unknown_key_name() {
        // Arrange
        let sink = Arc::new(MockHidSink::new());
        let (mut d, _) = dispatcher_with(Arc::clone(&sink));

        // Act
        let result = result_of(&mut d, &call("keyboard_key", json!({"key": "Hyper"})));

        // Assert
        assert_eq!(result["success"], false);
        assert_eq!(result["message"], "Unknown key: Hyper");
        assert!(sink.calls().is_empty());
    }

    #[test]
    fn test_keyboard_key_passes_modifiers_through() {
        // Arrange
        let sink = Arc::new(MockHidSink::new());
        let (mut d, _) = dispatcher_with(Arc::clone(&sink));

        // Act
        let result = result_of(
            &mut d,
            &call("keyboard_key", json!({"key": "Enter", "modifiers": "ctrl"})),
        );

        // Assert
        assert_eq!(result["message"], "Key pressed successfully");
        assert_eq!(result["modifiers"], "ctrl");
        assert_eq!(
            sink.calls(),
            vec![HidCall::KeyStroke {
                key: "Enter".into(),
                modifiers: "ctrl".into()
            }]
        );
    }

    #[test]
    fn test_keyboard_shortcut_normalises_modifiers() {
        // Arrange
        let sink = Arc::new(MockHidSink::new());
        let (mut d, _) = dispatcher_with(Arc::clone(&sink));

        // Act
        let result = result_of(
            &mut d,
            &call("keyboard_shortcut", json!({"shortcut": "Ctrl+Alt+Delete"})),
        );

        // Assert
        assert_eq!(result["success"], true);
        assert_eq!(result["shortcut"], "Ctrl+Alt+Delete");
        assert_eq!(result["key"], "Delete");
        assert_eq!(result["modifiers"], "ctrl alt");
        assert_eq!(
            sink.calls(),
            vec![HidCall::KeyStroke {
                key: "Delete".into(),
                modifiers: "ctrl alt".into()
            }]
        );
    }

    #[test]
    fn test_keyboard_shortcut_empty_is_rejected() {
        let sink = Arc::new(MockHidSink::new());
        let (mut d, _) = dispatcher_with(sink);
        let result = result_of(&mut d, &call("keyboard_shortcut", json!({"shortcut": ""})));
        assert_eq!(result["message"], "Missing shortcut");
        let result = result_of(&mut d, &call("keyboard_shortcut", json!({"shortcut": "ctrl+"})));
        assert_eq!(result["message"], "Missing shortcut key");
    }

    #[test]
    fn test_mouse_move_defaults_to_relative() {
        // Arrange
        let sink = Arc::new(MockHidSink::new());
        let (mut d, _) = dispatcher_with(Arc::clone(&sink));

        // Act
        let result = result_of(&mut d, &call("mouse_move", json!({"x": 10, "y": -4})));

        // Assert
        assert_eq!(result["relative"], true);
        assert_eq!(
            sink.calls(),
            vec![HidCall::MoveMouse {
                x: 10,
                y: -4,
                relative: true
            }]
        );
    }

    #[test]
    fn test_mouse_move_rejects_absolute_positioning() {
        // Arrange
        let sink = Arc::new(MockHidSink::new());
        let (mut d, _) = dispatcher_with(Arc::clone(&sink));

        // Act
        let result = result_of(
            &mut d,
            &call("mouse_move", json!({"x": 1, "y": 1, "relative": false})),
        );

        // Assert
        assert_eq!(result["success"], false);
        assert_eq!(result["message"], "Absolute positioning is not supported");
        assert!(sink.calls().is_empty());
    }

    #[test]
    fn test_mouse_move_rejects_out_of_range() {
        let sink = Arc::new(MockHidSink::new());
        let (mut d, _) = dispatcher_with(sink);
        let result = result_of(&mut d, &call("mouse_move", json!({"x": 40000, "y": 0})));
        assert_eq!(result["message"], "Mouse movement out of range");
    }

    #[test]
    fn test_mouse_click_defaults_and_unknown_button() {
        // Arrange
        let sink = Arc::new(MockHidSink::new());
        let (mut d, _) = dispatcher_with(Arc::clone(&sink));

        // Act
        let defaulted = result_of(&mut d, &call("mouse_click", json!({})));
        let unknown = result_of(&mut d, &call("mouse_click", json!({"button": "back", "duration": 5})));

        // Assert
        assert_eq!(defaulted["button"], "left");
        assert_eq!(defaulted["duration"], 50);
        assert_eq!(unknown["button"], "back");
        assert_eq!(
            sink.calls()[1],
            HidCall::ClickMouse {
                button: MouseButton::Left,
                duration: Duration::from_millis(5)
            }
        );
    }

    #[test]
    fn test_mouse_scroll_rejects_out_of_range() {
        let sink = Arc::new(MockHidSink::new());
        let (mut d, _) = dispatcher_with(Arc::clone(&sink));
        let result = result_of(&mut d, &call("mouse_scroll", json!({"scroll": 500})));
        assert_eq!(result["message"], "Scroll amount out of range");
        assert!(sink.calls().is_empty());
    }

    #[test]
    fn test_sink_failure_reports_success_false() {
        // Arrange
        let sink = Arc::new(MockHidSink::failing());
        let (mut d, _) = dispatcher_with(sink);

        // Act
        let result = result_of(&mut d, &call("mouse_scroll", json!({"scroll": 1})));

        // Assert
        assert_eq!(result["success"], false);
        assert_eq!(result["message"], "Failed to scroll mouse");
        assert_eq!(result["scroll"], 1);
    }

    #[test]
    fn test_not_ready_sink_refuses_hid_tools_but_reports_status() {
        // Arrange
        let sink = Arc::new(MockHidSink::not_ready());
        let (mut d, _) = dispatcher_with(Arc::clone(&sink));

        // Act
        let typed = result_of(&mut d, &call("keyboard_type", json!({"text": "x"})));
        let status = result_of(&mut d, &call("system_status", json!({})));

        // Assert
        assert_eq!(typed["message"], "HID device not ready");
        assert_eq!(status["success"], true);
        assert_eq!(status["hid_ready"], false);
        assert!(sink.calls().is_empty());
    }

    #[test]
    fn test_system_status_reports_layout_and_engine() {
        // Arrange
        let sink = Arc::new(MockHidSink::new());
        let (mut d, _) = dispatcher_with(sink);

        // Act
        let status = result_of(&mut d, &call("system_status", json!({})));

        // Assert
        assert_eq!(status["server_name"], SERVER_NAME);
        assert_eq!(status["protocol_version"], PROTOCOL_VERSION);
        assert_eq!(status["layout"], "US");
        assert_eq!(status["available_layouts"].as_array().unwrap().len(), 10);
        assert_eq!(status["macros"]["state"], "idle");
    }

    #[test]
    fn test_recording_captures_tool_calls() {
        // Arrange
        let sink = Arc::new(MockHidSink::new());
        let (mut d, clock) = dispatcher_with(sink);
        d.handle(r#"{"method":"macros/record/start","id":1,"params":{"name":"demo"}}"#);

        // Act
        d.handle(&call("keyboard_type", json!({"text": "A"})));
        clock.advance(100);
        d.handle(&call("mouse_scroll", json!({"scroll": -2})));
        let stop = result_of(
            &mut d,
            r#"{"method":"macros/record/stop","id":2}"#,
        );

        // Assert
        assert_eq!(stop["success"], true);
        assert_eq!(stop["actions"], 3);
        let recorded = d.engine().get("demo").unwrap();
        assert!(matches!(
            recorded.actions[0].kind,
            ducky_core::ActionKind::KeyPress { key: 0x04, .. }
        ));
        assert_eq!(recorded.actions[2].timestamp, 100);
    }

    #[test]
    fn test_macro_play_without_sink_fails() {
        // Arrange
        let engine = MacroEngine::new(Box::new(MemoryMacroStore::new()), Box::new(ManualClock::new(0)));
        let mut d = McpDispatcher::new(None, engine, KeyboardLayout::Us);

        // Act
        let result = result_of(&mut d, r#"{"method":"macros/play","id":3,"params":{"name":"x"}}"#);

        // Assert
        assert_eq!(result["success"], false);
        assert_eq!(result["message"], "HID controller not available");
    }

    #[test]
    fn test_macro_errors_are_results_not_protocol_errors() {
        // Arrange
        let sink = Arc::new(MockHidSink::new());
        let (mut d, _) = dispatcher_with(sink);

        // Act
        let result = result_of(&mut d, r#"{"method":"macros/play","id":4,"params":{"name":"nope"}}"#);

        // Assert
        assert_eq!(result["success"], false);
        assert_eq!(result["message"], "Macro 'nope' not found");
    }

    #[test]
    fn test_macro_record_delay_requires_recording() {
        let sink = Arc::new(MockHidSink::new());
        let (mut d, _) = dispatcher_with(sink);
        let result = result_of(
            &mut d,
            r#"{"method":"macros/record/delay","id":5,"params":{"duration":250}}"#,
        );
        assert_eq!(result["message"], "Not recording");
    }

    #[test]
    fn test_tick_plays_macro_through_sink() {
        // Arrange
        let sink = Arc::new(MockHidSink::new());
        let (mut d, clock) = dispatcher_with(Arc::clone(&sink));
        let doc = r#"{"name":"m","actions":[{"type":2,"timestamp":0,"x":3,"y":4}]}"#;
        let import = json!({"method": "macros/import", "id": 6, "params": {"data": doc}}).to_string();
        result_of(&mut d, &import);
        result_of(&mut d, r#"{"method":"macros/play","id":7,"params":{"name":"m"}}"#);

        // Act
        clock.advance(1);
        let dispatched = d.tick();

        // Assert
        assert_eq!(dispatched.len(), 1);
        assert_eq!(
            sink.calls(),
            vec![HidCall::MoveMouse {
                x: 3,
                y: 4,
                relative: true
            }]
        );
    }

    #[test]
    fn test_hid_tools_are_refused_while_macro_plays() {
        // Arrange
        let sink = Arc::new(MockHidSink::new());
        let (mut d, _) = dispatcher_with(Arc::clone(&sink));
        let doc = r#"{"name":"m","actions":[{"type":4,"timestamp":0,"amount":1}]}"#;
        let import = json!({"method": "macros/import", "id": 1, "params": {"data": doc}}).to_string();
        result_of(&mut d, &import);
        result_of(&mut d, r#"{"method":"macros/play","id":2,"params":{"name":"m"}}"#);

        // Act
        let scrolled = result_of(&mut d, &call("mouse_scroll", json!({"scroll": -5})));
        let status = result_of(&mut d, &call("system_status", json!({})));
        let ticked = d.tick();

        // Assert
        assert_eq!(scrolled["success"], false);
        assert_eq!(scrolled["message"], "Macro playback in progress");
        assert_eq!(status["success"], true);
        assert_eq!(status["macros"]["state"], "playing");
        assert_eq!(ticked.len(), 1);
        assert_eq!(sink.calls(), vec![HidCall::ScrollMouse { amount: 1 }]);
    }

    #[test]
    fn test_hid_tools_resume_after_playback_stops() {
        // Arrange
        let sink = Arc::new(MockHidSink::new());
        let (mut d, _) = dispatcher_with(Arc::clone(&sink));
        let doc = r#"{"name":"m","actions":[{"type":5,"timestamp":1000,"duration":10}]}"#;
        let import = json!({"method": "macros/import", "id": 1, "params": {"data": doc}}).to_string();
        result_of(&mut d, &import);
        result_of(&mut d, r#"{"method":"macros/play","id":2,"params":{"name":"m"}}"#);
        result_of(&mut d, r#"{"method":"macros/stop","id":3}"#);

        // Act
        let scrolled = result_of(&mut d, &call("mouse_scroll", json!({"scroll": 2})));

        // Assert
        assert_eq!(scrolled["success"], true);
        assert_eq!(sink.calls(), vec![HidCall::ScrollMouse { amount: 2 }]);
    }

    #[test]
    fn test_mouse_click_duration_is_capped() {
        // Arrange
        let sink = Arc::new(MockHidSink::new());
        let (mut d, _) = dispatcher_with(Arc::clone(&sink));

        // Act
        let at_cap = result_of(&mut d, &call("mouse_click", json!({"duration": 5000})));
        let over_cap = result_of(&mut d, &call("mouse_click", json!({"duration": 5001})));

        // Assert
        assert_eq!(at_cap["success"], true);
        assert_eq!(over_cap["success"], false);
        assert_eq!(over_cap["message"], "Click duration out of range");
        assert_eq!(sink.calls().len(), 1);
    }

    #[test]
    fn test_record_start_with_path_name_fails_and_stays_idle() {
        // Arrange
        let sink = Arc::new(MockHidSink::new());
        let (mut d, _) = dispatcher_with(sink);

        // Act
        let started = result_of(
            &mut d,
            r#"{"method":"macros/record/start","id":1,"params":{"name":"a/b"}}"#,
        );
        let stopped = result_of(&mut d, r#"{"method":"macros/record/stop","id":2}"#);

        // Assert
        assert_eq!(started["success"], false);
        assert_eq!(started["message"], "Invalid macro name 'a/b'");
        assert_eq!(stopped["message"], "Not recording");
        assert!(d.engine().is_idle());
        assert!(d.engine().list_macros().is_empty());
    }

    #[test]
    fn test_keyboard_shortcut_sends_plus_key() {
        // Arrange
        let sink = Arc::new(MockHidSink::new());
        let (mut d, _) = dispatcher_with(Arc::clone(&sink));

        // Act
        let result = result_of(&mut d, &call("keyboard_shortcut", json!({"shortcut": "ctrl++"})));

        // Assert
        assert_eq!(result["success"], true);
        assert_eq!(result["key"], "+");
        assert_eq!(
            sink.calls(),
            vec![HidCall::KeyStroke {
                key: "+".into(),
                modifiers: "ctrl".into()
            }]
        );
    }
}
