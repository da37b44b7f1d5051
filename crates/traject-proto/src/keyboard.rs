//! Keyboard event decoding.
//!
//! Key instructions arrive as raw keydown/keyup pairs. Decoding folds over
//! them with an explicit accumulator (the active modifier set, the pending
//! printable-text buffer, and the buffer's start timestamp) so there is no
//! hidden mutable state to thread through.
//!
//! Printable keydowns with no active modifier accumulate into one `type`
//! event carrying the timestamp of its first character. A special key or a
//! modified key interrupts the buffer: the pending text flushes, and a
//! `hotkey` event is emitted naming the modifier-joined combination.

use traject_core::ProcessedEvent;

use crate::instruction::Instruction;

/// Keysym range for modifier keys (shift, ctrl, caps, meta, alt, super).
const MODIFIER_FIRST: u32 = 0xFFE1;
const MODIFIER_LAST: u32 = 0xFFEE;

/// One keydown/keyup occurrence distilled from a `key` instruction.
#[derive(Clone, Copy, Debug)]
struct KeyEvent {
    keycode: u32,
    pressed: bool,
    timestamp: i64,
}

/// Fold accumulator for keyboard decoding.
#[derive(Debug, Default)]
struct KeyboardState {
    /// Currently held modifiers, in press order.
    active_modifiers: Vec<String>,
    /// Printable characters typed since the last flush.
    pending_text: String,
    /// Timestamp of the pending buffer's first character.
    pending_start: Option<i64>,
}

impl KeyboardState {
    fn flush_text(&mut self, events: &mut Vec<ProcessedEvent>) {
        if let Some(timestamp) = self.pending_start.take() {
            if !self.pending_text.is_empty() {
                events.push(ProcessedEvent::Type {
                    timestamp,
                    text: std::mem::take(&mut self.pending_text),
                });
            }
        }
    }

    fn hotkey_name(&self, key: &str) -> String {
        if self.active_modifiers.is_empty() {
            key.to_string()
        } else {
            format!("{}-{key}", self.active_modifiers.join("-"))
        }
    }
}

fn is_modifier(keycode: u32) -> bool {
    (MODIFIER_FIRST..=MODIFIER_LAST).contains(&keycode)
}

/// Special (non-printable) keys that interrupt a pending text run.
fn is_special_key(keycode: u32) -> bool {
    matches!(
        keycode,
        0xFE03                // AltGr
        | 0xFF08              // Backspace
        | 0xFF09              // Tab
        | 0xFF0D              // Return
        | 0xFF1B              // Escape
        | 0xFF50..=0xFF57     // Home, arrows, page up/down, end
        | 0xFF63              // Insert
        | 0xFFBE..=0xFFD5     // F1-F24
        | 0xFFE1..=0xFFE5     // Shift, ctrl, caps
        | 0xFFE7..=0xFFEC     // Meta, alt, super
        | 0xFFFF              // Delete
    )
}

/// Human-readable name for a keysym.
fn key_name(keycode: u32) -> String {
    let fixed = match keycode {
        0xFF08 => "backspace",
        0xFF09 => "tab",
        0xFF0D => "enter",
        0xFF1B => "escape",
        0xFF50 => "home",
        0xFF51 => "left",
        0xFF52 => "up",
        0xFF53 => "right",
        0xFF54 => "down",
        0xFF55 => "pageup",
        0xFF56 => "pagedown",
        0xFF57 => "end",
        0xFF63 => "insert",
        0xFFFF => "delete",
        0xFFE1 | 0xFFE2 => "shift",
        0xFFE3 | 0xFFE4 => "ctrl",
        0xFFE5 => "capslock",
        0xFFE7 | 0xFFE8 => "meta",
        0xFFE9 | 0xFFEA => "alt",
        0xFFEB | 0xFFEC => "super",
        _ => "",
    };
    if !fixed.is_empty() {
        return fixed.to_string();
    }
    if (0xFFBE..=0xFFD5).contains(&keycode) {
        return format!("f{}", keycode - 0xFFBE + 1);
    }
    if let Some(c) = printable_char(keycode) {
        return c.to_string();
    }
    format!("key-{keycode:x}")
}

/// Printable character for keysyms in the visible ASCII range.
#[allow(clippy::cast_possible_truncation)]
fn printable_char(keycode: u32) -> Option<char> {
    (32..=126).contains(&keycode).then(|| keycode as u8 as char)
}

/// Decode `key` instructions into `type` and `hotkey` events.
#[must_use]
pub fn extract_keyboard_events(instructions: &[Instruction]) -> Vec<ProcessedEvent> {
    let key_events = instructions.iter().filter_map(|inst| {
        if inst.opcode != "key" || inst.args.len() < 2 {
            return None;
        }
        let keycode = inst.args[0].parse::<u32>().ok()?;
        Some(KeyEvent {
            keycode,
            pressed: inst.args[1] == "1",
            timestamp: inst.timestamp,
        })
    });

    let mut events = Vec::new();
    let mut state = KeyboardState::default();

    for key in key_events {
        if key.pressed {
            handle_keydown(key, &mut state, &mut events);
        } else if is_modifier(key.keycode) {
            let name = key_name(key.keycode);
            state.active_modifiers.retain(|m| *m != name);
        }
    }

    // A session can end mid-word.
    state.flush_text(&mut events);

    events
}

fn handle_keydown(key: KeyEvent, state: &mut KeyboardState, events: &mut Vec<ProcessedEvent>) {
    let name = key_name(key.keycode);

    if is_modifier(key.keycode) {
        if !state.active_modifiers.contains(&name) {
            state.active_modifiers.push(name);
        }
        return;
    }

    let printable = printable_char(key.keycode);

    if is_special_key(key.keycode) || (printable.is_some() && !state.active_modifiers.is_empty()) {
        // Special key, or a chorded printable (ctrl-c and friends): the
        // pending run ends and the combination is emitted as a hotkey.
        state.flush_text(events);
        events.push(ProcessedEvent::Hotkey {
            timestamp: key.timestamp,
            text: state.hotkey_name(&name),
        });
        return;
    }

    if let Some(c) = printable {
        if state.pending_text.is_empty() {
            state.pending_start = Some(key.timestamp);
        }
        state.pending_text.push(c);
    }
    // Non-printable, non-special keysyms outside the tables are dropped.
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
