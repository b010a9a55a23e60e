//! USB boot-protocol report encoder.
//!
//! Turns HID sink primitives into the fixed-size reports a USB keyboard and
//! mouse send to the host, and writes them to two byte sinks.  On a Linux USB
//! gadget those sinks are `/dev/hidg0` (keyboard) and `/dev/hidg1` (mouse);
//! in dry-run mode they are [`std::io::sink`] and the reports only appear in
//! the debug log.
//!
//! # Report formats (for beginners)
//!
//! Keyboard, 8 bytes:
//!
//! | Byte | Meaning                                  |
//! |------|------------------------------------------|
//! | 0    | Modifier bits (Ctrl, Shift, Alt, GUI)    |
//! | 1    | Reserved, always 0                       |
//! | 2–7  | Up to six held key usages, 0 = empty     |
//!
//! Mouse, 4 bytes: `[buttons, dx, dy, wheel]`, where `dx`, `dy` and `wheel`
//! are signed 8-bit deltas.  A move larger than ±127 is therefore split into
//! several reports.
//!
//! # Timing
//!
//! Key strokes and clicks sleep between the press and release reports so the
//! host registers them.  These sleeps happen on the caller's thread.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use ducky_core::{convert_string, resolve_key, KeyCode, KeyboardLayout, Modifiers, MouseButton};
use tracing::{debug, trace};

use crate::application::hid_sink::{HidError, HidSink};

/// Number of key slots in a boot keyboard report.
const KEY_SLOTS: usize = 6;

/// Largest per-report pointer delta.
const MAX_DELTA: i32 = 127;

/// Held keyboard state.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct KeyboardState {
    modifiers: u8,
    keys: [u8; KEY_SLOTS],
}

impl KeyboardState {
    fn report(&self) -> [u8; 8] {
        let mut report = [0u8; 8];
        report[0] = self.modifiers;
        report[2..].copy_from_slice(&self.keys);
        report
    }

    fn press(&mut self, key: u8, modifiers: Modifiers) {
        self.modifiers |= modifiers.0;
        if key == 0 || self.keys.contains(&key) {
            return;
        }
        if let Some(slot) = self.keys.iter_mut().find(|k| **k == 0) {
            *slot = key;
        } else {
            debug!(key, "all six key slots held; key dropped");
        }
    }

    fn release(&mut self, key: u8) {
        for slot in self.keys.iter_mut().filter(|k| **k == key) {
            *slot = 0;
        }
        if self.keys.iter().all(|k| *k == 0) {
            self.modifiers = 0;
        }
    }
}

struct KeyboardPort<W> {
    writer: W,
    state: KeyboardState,
}

impl<W: Write> KeyboardPort<W> {
    fn send(&mut self) -> Result<(), HidError> {
        let report = self.state.report();
        trace!(?report, "keyboard report");
        self.writer.write_all(&report)?;
        self.writer.flush()?;
        Ok(())
    }
}

struct MousePort<W> {
    writer: W,
    buttons: u8,
}

impl<W: Write> MousePort<W> {
    fn send(&mut self, dx: i8, dy: i8, wheel: i8) -> Result<(), HidError> {
        let report = [self.buttons, dx as u8, dy as u8, wheel as u8];
        trace!(?report, "mouse report");
        self.writer.write_all(&report)?;
        self.writer.flush()?;
        Ok(())
    }
}

/// A [`HidSink`] that writes USB boot reports.
pub struct ReportHidSink<K, M> {
    keyboard: Mutex<KeyboardPort<K>>,
    mouse: Mutex<MousePort<M>>,
    layout: KeyboardLayout,
    key_delay: Duration,
    stroke_hold: Duration,
}

/// Report sink backed by the Linux USB gadget device files.
pub type GadgetHidSink = ReportHidSink<File, File>;

/// Report sink that discards every report.
pub type DryRunHidSink = ReportHidSink<io::Sink, io::Sink>;

impl<K: Write + Send, M: Write + Send> ReportHidSink<K, M> {
    pub fn new(keyboard: K, mouse: M, layout: KeyboardLayout) -> Self {
        Self {
            keyboard: Mutex::new(KeyboardPort {
                writer: keyboard,
                state: KeyboardState::default(),
            }),
            mouse: Mutex::new(MousePort {
                writer: mouse,
                buttons: 0,
            }),
            layout,
            key_delay: Duration::from_millis(10),
            stroke_hold: Duration::from_millis(50),
        }
    }

    /// Overrides the pause between typed characters and the hold time of a
    /// named key stroke.
    pub fn with_timing(mut self, key_delay: Duration, stroke_hold: Duration) -> Self {
        self.key_delay = key_delay;
        self.stroke_hold = stroke_hold;
        self
    }

    pub fn layout(&self) -> KeyboardLayout {
        self.layout
    }

    fn with_keyboard<T>(
        &self,
        f: impl FnOnce(&mut KeyboardPort<K>) -> Result<T, HidError>,
    ) -> Result<T, HidError> {
        let mut port = self.keyboard.lock().map_err(|_| HidError::NotReady)?;
        f(&mut port)
    }

    fn with_mouse<T>(
        &self,
        f: impl FnOnce(&mut MousePort<M>) -> Result<T, HidError>,
    ) -> Result<T, HidError> {
        let mut port = self.mouse.lock().map_err(|_| HidError::NotReady)?;
        f(&mut port)
    }

    /// Press, hold, release.
    fn tap(&self, code: KeyCode, hold: Duration) -> Result<(), HidError> {
        self.with_keyboard(|port| {
            port.state.press(code.scancode, code.modifiers);
            port.send()
        })?;
        sleep(hold);
        self.with_keyboard(|port| {
            port.state.release(code.scancode);
            port.send()
        })
    }
}

impl DryRunHidSink {
    pub fn dry_run(layout: KeyboardLayout) -> Self {
        Self::new(io::sink(), io::sink(), layout)
    }
}

impl GadgetHidSink {
    /// Opens the keyboard and mouse gadget devices for writing.
    pub fn open_gadget(
        keyboard_device: &Path,
        mouse_device: &Path,
        layout: KeyboardLayout,
    ) -> Result<Self, HidError> {
        let keyboard = OpenOptions::new().write(true).open(keyboard_device)?;
        let mouse = OpenOptions::new().write(true).open(mouse_device)?;
        debug!(
            keyboard = %keyboard_device.display(),
            mouse = %mouse_device.display(),
            "opened HID gadget devices"
        );
        Ok(Self::new(keyboard, mouse, layout))
    }
}

impl<K: Write + Send, M: Write + Send> HidSink for ReportHidSink<K, M> {
    fn is_ready(&self) -> bool {
        !self.keyboard.is_poisoned() && !self.mouse.is_poisoned()
    }

    fn type_text(&self, text: &str) -> Result<(), HidError> {
        for code in convert_string(text, self.layout) {
            self.tap(code, self.key_delay)?;
            sleep(self.key_delay);
        }
        Ok(())
    }

    fn press_key(&self, key: u8, modifiers: Modifiers) -> Result<(), HidError> {
        self.with_keyboard(|port| {
            port.state.press(key, modifiers);
            port.send()
        })
    }

    fn release_key(&self, key: u8) -> Result<(), HidError> {
        self.with_keyboard(|port| {
            port.state.release(key);
            port.send()
        })
    }

    fn send_key_stroke(&self, key_name: &str, modifiers: &str) -> Result<(), HidError> {
        let target = resolve_key(key_name).map_err(|e| HidError::UnknownKey(e.0))?;
        let code = target.key_code(self.layout, Modifiers::parse(modifiers));
        if !code.is_supported() {
            return Err(HidError::UnknownKey(key_name.to_string()));
        }
        self.tap(code, self.stroke_hold)
    }

    fn move_mouse(&self, x: i16, y: i16, relative: bool) -> Result<(), HidError> {
        if !relative {
            return Err(HidError::Unsupported("absolute mouse positioning"));
        }
        let (mut x, mut y) = (i32::from(x), i32::from(y));
        self.with_mouse(|port| {
            while x != 0 || y != 0 {
                let dx = x.clamp(-MAX_DELTA, MAX_DELTA);
                let dy = y.clamp(-MAX_DELTA, MAX_DELTA);
                port.send(dx as i8, dy as i8, 0)?;
                x -= dx;
                y -= dy;
            }
            Ok(())
        })
    }

    fn click_mouse(&self, button: MouseButton, duration: Duration) -> Result<(), HidError> {
        self.with_mouse(|port| {
            port.buttons |= button.as_u8();
            port.send(0, 0, 0)
        })?;
        sleep(duration);
        self.with_mouse(|port| {
            port.buttons &= !button.as_u8();
            port.send(0, 0, 0)
        })
    }

    fn scroll_mouse(&self, amount: i8) -> Result<(), HidError> {
        self.with_mouse(|port| port.send(0, 0, amount))
    }
}

fn sleep(duration: Duration) {
    if !duration.is_zero() {
        thread::sleep(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// Cloneable in-memory writer so the test can inspect what the sink wrote.
    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        fn reports(&self, size: usize) -> Vec<Vec<u8>> {
            self.0
                .lock()
                .unwrap()
                .chunks(size)
                .map(|c| c.to_vec())
                .collect()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn sink(layout: KeyboardLayout) -> (ReportHidSink<SharedBuf, SharedBuf>, SharedBuf, SharedBuf) {
        let kb = SharedBuf::default();
        let mouse = SharedBuf::default();
        let sink = ReportHidSink::new(kb.clone(), mouse.clone(), layout)
            .with_timing(Duration::ZERO, Duration::ZERO);
        (sink, kb, mouse)
    }

    #[test]
    fn test_type_text_emits_press_and_release_per_character() {
        // Arrange
        let (sink, kb, _) = sink(KeyboardLayout::Us);

        // Act
        sink.type_text("aB").unwrap();

        // Assert
        assert_eq!(
            kb.reports(8),
            vec![
                vec![0, 0, 0x04, 0, 0, 0, 0, 0],
                vec![0; 8],
                vec![Modifiers::SHIFT, 0, 0x05, 0, 0, 0, 0, 0],
                vec![0; 8],
            ]
        );
    }

    #[test]
    fn test_type_text_skips_unsupported_characters() {
        let (sink, kb, _) = sink(KeyboardLayout::Us);
        sink.type_text("\u{2603}").unwrap();
        assert!(kb.reports(8).is_empty());
    }

    #[test]
    fn test_key_stroke_applies_modifiers() {
        // Arrange
        let (sink, kb, _) = sink(KeyboardLayout::Us);

        // Act
        sink.send_key_stroke("delete", "ctrl alt").unwrap();

        // Assert
        let reports = kb.reports(8);
        assert_eq!(reports[0][0], Modifiers::CTRL | Modifiers::ALT);
        assert_eq!(reports[0][2], 0x4C);
        assert_eq!(reports[1], vec![0; 8]);
    }

    #[test]
    fn test_key_stroke_rejects_unknown_name() {
        let (sink, kb, _) = sink(KeyboardLayout::Us);
        let result = sink.send_key_stroke("Hyper", "");
        assert!(matches!(result, Err(HidError::UnknownKey(ref k)) if k == "Hyper"));
        assert!(kb.reports(8).is_empty());
    }

    #[test]
    fn test_modifiers_released_with_last_held_key() {
        // Arrange
        let (sink, kb, _) = sink(KeyboardLayout::Us);

        // Act
        sink.press_key(0x04, Modifiers(Modifiers::SHIFT)).unwrap();
        sink.press_key(0x05, Modifiers::NONE).unwrap();
        sink.release_key(0x04).unwrap();
        sink.release_key(0x05).unwrap();

        // Assert
        let reports = kb.reports(8);
        assert_eq!(reports[1], vec![Modifiers::SHIFT, 0, 0x04, 0x05, 0, 0, 0, 0]);
        assert_eq!(reports[2], vec![Modifiers::SHIFT, 0, 0, 0x05, 0, 0, 0, 0]);
        assert_eq!(reports[3], vec![0; 8]);
    }

    #[test]
    fn test_large_move_is_split_into_report_sized_steps() {
        // Arrange
        let (sink, _, mouse) = sink(KeyboardLayout::Us);

        // Act
        sink.move_mouse(300, -10, true).unwrap();

        // Assert
        assert_eq!(
            mouse.reports(4),
            vec![
                vec![0, 127, (-10i8) as u8, 0],
                vec![0, 127, 0, 0],
                vec![0, 46, 0, 0],
            ]
        );
    }

    #[test]
    fn test_absolute_move_is_unsupported() {
        let (sink, _, mouse) = sink(KeyboardLayout::Us);
        let result = sink.move_mouse(10, 10, false);
        assert!(matches!(result, Err(HidError::Unsupported(_))));
        assert!(mouse.reports(4).is_empty());
    }

    #[test]
    fn test_click_presses_then_releases_button() {
        // Arrange
        let (sink, _, mouse) = sink(KeyboardLayout::Us);

        // Act
        sink.click_mouse(MouseButton::Right, Duration::ZERO).unwrap();

        // Assert
        assert_eq!(mouse.reports(4), vec![vec![0x02, 0, 0, 0], vec![0, 0, 0, 0]]);
    }

    #[test]
    fn test_scroll_writes_signed_wheel_byte() {
        let (sink, _, mouse) = sink(KeyboardLayout::Us);
        sink.scroll_mouse(-5).unwrap();
        assert_eq!(mouse.reports(4), vec![vec![0, 0, 0, (-5i8) as u8]]);
    }

    #[test]
    fn test_typing_uses_configured_layout() {
        // Arrange
        let (sink, kb, _) = sink(KeyboardLayout::De);

        // Act
        sink.type_text("z").unwrap();

        // Assert
        assert_eq!(kb.reports(8)[0][2], 0x1C);
    }

    #[test]
    fn test_dry_run_sink_is_ready() {
        let sink = DryRunHidSink::dry_run(KeyboardLayout::Uk);
        assert!(sink.is_ready());
        assert_eq!(sink.layout(), KeyboardLayout::Uk);
        assert!(sink.type_text("hello").is_ok());
    }
}
