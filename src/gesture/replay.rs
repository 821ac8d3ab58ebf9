// Pass-through key replay.
//
// When a bound gesture fires while some other application holds focus, the
// original physical combination is re-sent to the system so the key keeps
// its normal meaning outside the file manager.

use std::sync::{Mutex, MutexGuard};

use enigo::{Direction, Enigo, Key, Keyboard, Settings};

use crate::gesture::{KeyCombo, Modifier};

/// Global lock to prevent interleaving multiple synthetic key sequences.
static KEY_SYNTH_MUTEX: Mutex<()> = Mutex::new(());

fn lock_synth() -> MutexGuard<'static, ()> {
    KEY_SYNTH_MUTEX
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReplayError {
    #[error("Unsupported key in combination: {0}")]
    UnsupportedKey(String),
    #[error("Key synthesis failed: {0}")]
    Synthesis(String),
}

/// Sends a physical key combination to the underlying system.
pub trait KeyReplay: Send + Sync {
    fn replay(&self, combo: &KeyCombo) -> Result<(), ReplayError>;
}

/// Key replay backed by the enigo input-synthesis crate.
#[derive(Default)]
pub struct EnigoReplay;

impl EnigoReplay {
    pub fn new() -> Self {
        Self
    }
}

impl KeyReplay for EnigoReplay {
    fn replay(&self, combo: &KeyCombo) -> Result<(), ReplayError> {
        let key = parse_key(&combo.key)?;

        // Serialize synthesis so key sequences can't interleave across threads.
        let _guard = lock_synth();

        let mut enigo = Enigo::new(&Settings::default())
            .map_err(|e| ReplayError::Synthesis(format!("Failed to create synthesizer: {}", e)))?;

        // Press modifiers in order, then click the key. Whatever happens
        // after a press, the matching releases must still be sent so the
        // system is never left with a modifier held down.
        let mut held: Vec<Key> = Vec::with_capacity(combo.modifiers.len());
        for modifier in &combo.modifiers {
            let modifier_key = modifier_to_key(*modifier);
            if let Err(e) = enigo.key(modifier_key, Direction::Press) {
                release_held(&mut enigo, &held);
                return Err(ReplayError::Synthesis(format!(
                    "Failed to press modifier: {}",
                    e
                )));
            }
            held.push(modifier_key);
        }

        let result = enigo
            .key(key, Direction::Click)
            .map_err(|e| ReplayError::Synthesis(format!("Failed to send key: {}", e)));

        release_held(&mut enigo, &held);
        result
    }
}

/// Release held modifiers in reverse press order, best effort.
fn release_held(enigo: &mut Enigo, held: &[Key]) {
    for key in held.iter().rev() {
        if let Err(e) = enigo.key(*key, Direction::Release) {
            crate::warn!("Failed to release modifier during replay: {}", e);
        }
    }
}

fn modifier_to_key(modifier: Modifier) -> Key {
    match modifier {
        Modifier::Control => Key::Control,
        Modifier::Shift => Key::Shift,
        Modifier::Alt => Key::Alt,
        Modifier::Windows => Key::Meta,
    }
}

/// Map a key name from a parsed combo to an enigo key.
///
/// Combo keys arrive lowercased. Anything that is not a known named key
/// or a single character is rejected.
fn parse_key(name: &str) -> Result<Key, ReplayError> {
    let key = match name {
        "enter" | "return" => Key::Return,
        "space" => Key::Space,
        "tab" => Key::Tab,
        "escape" | "esc" => Key::Escape,
        "backspace" => Key::Backspace,
        "delete" => Key::Delete,
        "up" | "arrowup" => Key::UpArrow,
        "down" | "arrowdown" => Key::DownArrow,
        "left" | "arrowleft" => Key::LeftArrow,
        "right" | "arrowright" => Key::RightArrow,
        "home" => Key::Home,
        "end" => Key::End,
        "pageup" => Key::PageUp,
        "pagedown" => Key::PageDown,
        "f1" => Key::F1,
        "f2" => Key::F2,
        "f3" => Key::F3,
        "f4" => Key::F4,
        "f5" => Key::F5,
        "f6" => Key::F6,
        "f7" => Key::F7,
        "f8" => Key::F8,
        "f9" => Key::F9,
        "f10" => Key::F10,
        "f11" => Key::F11,
        "f12" => Key::F12,
        other => {
            let mut chars = other.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Key::Unicode(c),
                _ => return Err(ReplayError::UnsupportedKey(other.to_string())),
            }
        }
    };
    Ok(key)
}
