//! Integration tests: record a macro, replay it on a simulated clock, and
//! observe the HID primitives reaching the sink.

use std::time::Duration;

use ducky_core::{ActionKind, Modifiers, MouseButton};
use ducky_server::application::{MacroEngine, MacroError, ManualClock, MacroStore};
use ducky_server::infrastructure::hid_sink::{HidCall, MockHidSink};
use ducky_server::infrastructure::storage::{FsMacroStore, MemoryMacroStore};

fn engine_at_zero() -> (MacroEngine, ManualClock, MemoryMacroStore) {
    let clock = ManualClock::new(0);
    let store = MemoryMacroStore::new();
    let engine = MacroEngine::new(Box::new(store.clone()), Box::new(clock.clone()));
    (engine, clock, store)
}

fn record_demo(engine: &mut MacroEngine, clock: &ManualClock) {
    engine.start_recording("demo", "press, move, wait").unwrap();
    clock.set(0);
    engine.record_key_press(Modifiers(Modifiers::CTRL), 0x06);
    clock.set(100);
    engine.record_mouse_move(15, -15);
    clock.set(250);
    engine.record_delay(500);
    clock.set(260);
    engine.stop_recording().unwrap();
}

#[test]
fn test_demo_scenario_dispatches_in_order_then_goes_idle() {
    // Arrange
    let (mut engine, clock, _) = engine_at_zero();
    let sink = MockHidSink::new();
    record_demo(&mut engine, &clock);
    clock.set(1_000);
    engine.play_macro("demo", false).unwrap();

    // Act
    let mut order = Vec::new();
    for t in [0u32, 100, 250, 300] {
        clock.set(1_000 + t);
        order.extend(engine.update(&sink).into_iter().map(|a| a.kind.label()));
    }
    clock.set(2_000);
    let after_idle = engine.update(&sink);

    // Assert
    assert_eq!(order, vec!["KeyPress", "MouseMove", "Delay"]);
    assert!(engine.is_idle());
    assert!(after_idle.is_empty());
    assert_eq!(
        sink.calls(),
        vec![
            HidCall::PressKey {
                key: 0x06,
                modifiers: Modifiers(Modifiers::CTRL)
            },
            HidCall::MoveMouse {
                x: 15,
                y: -15,
                relative: true
            },
        ]
    );
}

#[test]
fn test_demo_scenario_intermediate_ticks_respect_timestamps() {
    // Arrange
    let (mut engine, clock, _) = engine_at_zero();
    let sink = MockHidSink::new();
    record_demo(&mut engine, &clock);
    clock.set(5_000);
    engine.play_macro("demo", false).unwrap();

    // Act / Assert
    clock.set(5_099);
    let first = engine.update(&sink);
    assert_eq!(first.len(), 1, "only the press is due at 99 ms");
    clock.set(5_249);
    assert_eq!(engine.update(&sink).len(), 1, "the move is due at 100 ms");
    assert!(engine.is_playing());
    clock.set(5_250);
    let last = engine.update(&sink);
    assert!(matches!(last[0].kind, ActionKind::Delay { duration: 500 }));
    assert!(engine.is_idle());
}

#[test]
fn test_recorded_macro_is_auto_saved_with_document_shape() {
    // Arrange
    let (mut engine, clock, store) = engine_at_zero();

    // Act
    record_demo(&mut engine, &clock);

    // Assert
    let doc: serde_json::Value = serde_json::from_str(&store.read("demo").unwrap()).unwrap();
    assert_eq!(doc["name"], "demo");
    assert_eq!(doc["description"], "press, move, wait");
    assert_eq!(doc["totalDuration"], 260);
    assert_eq!(doc["loop"], false);
    assert_eq!(doc["actions"][0]["type"], 0);
    assert_eq!(doc["actions"][0]["modifiers"], 1);
    assert_eq!(doc["actions"][1]["x"], 15);
    assert_eq!(doc["actions"][2]["duration"], 500);
}

#[test]
fn test_session_exclusivity_leaves_state_unchanged() {
    // Arrange
    let (mut engine, clock, _) = engine_at_zero();
    record_demo(&mut engine, &clock);
    engine.play_macro("demo", true).unwrap();
    let before = engine.status();

    // Act
    let replay = engine.play_macro("demo", false);
    let record = engine.start_recording("other", "");

    // Assert
    assert!(matches!(replay, Err(MacroError::AlreadyPlaying)));
    assert!(matches!(record, Err(MacroError::Busy)));
    assert_eq!(engine.status(), before);
}

#[test]
fn test_looping_macro_repeats_at_same_cadence() {
    // Arrange
    let (mut engine, clock, _) = engine_at_zero();
    let sink = MockHidSink::new();
    engine.start_recording("clicker", "").unwrap();
    engine.record_mouse_click(MouseButton::Left);
    clock.advance(40);
    engine.record_mouse_scroll(3);
    engine.stop_recording().unwrap();
    clock.set(100);
    engine.play_macro("clicker", true).unwrap();

    // Act
    for t in (100..=300).step_by(10) {
        clock.set(t);
        engine.update(&sink);
    }
    engine.stop_playback();

    // Assert
    let clicks = sink
        .calls()
        .into_iter()
        .filter(|c| {
            matches!(
                c,
                HidCall::ClickMouse {
                    button: MouseButton::Left,
                    duration
                } if *duration == Duration::from_millis(50)
            )
        })
        .count();
    assert_eq!(clicks, 5, "clicks at 100, 150, 190, 230 and 270 ms");
    assert!(engine.is_idle());
}

#[test]
fn test_file_store_survives_engine_restart() {
    // Arrange
    let dir = std::env::temp_dir().join(format!("ducky-playback-{}", uuid::Uuid::new_v4()));
    let clock = ManualClock::new(0);
    let mut first = MacroEngine::new(Box::new(FsMacroStore::new(&dir)), Box::new(clock.clone()));
    record_demo(&mut first, &clock);
    drop(first);

    // Act
    let mut second = MacroEngine::new(Box::new(FsMacroStore::new(&dir)), Box::new(clock.clone()));
    let names = second.list_macros();
    let loaded = second.load_macro("demo").unwrap();

    // Assert
    assert_eq!(names, vec!["demo".to_string()]);
    assert_eq!(loaded.actions.len(), 3);
    assert_eq!(loaded.total_duration, 260);
    std::fs::remove_dir_all(&dir).unwrap();
}
