// Gesture identities, key combinations, and the router that feeds taps
// into the per-gesture disambiguators.

mod replay;
mod router;
mod tap;

pub use replay::{EnigoReplay, KeyReplay, ReplayError};
pub use router::{GestureHandlers, GestureRouter, COMPRESS_DISPATCH_DELAY_MS};
pub use tap::{TapDisambiguator, DEFAULT_TAP_WINDOW_MS};

use serde::{Deserialize, Serialize};

/// The logical gestures the host binds to physical key combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GestureId {
    /// Single: say selection size. Double: compress.
    SizeOrCompress,
    /// Single: copy selected names. Double: copy address bar path.
    CopyOrAddress,
    /// Single: copy file content. Double: invert selection.
    ContentOrInvert,
    /// Direct: open the actions context menu.
    ContextMenu,
    /// Direct: rename the selected file.
    Rename,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Modifier {
    Control,
    Shift,
    Alt,
    Windows,
}

/// A physical key combination in the form the host reports it,
/// e.g. "control+shift+k".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyCombo {
    pub modifiers: Vec<Modifier>,
    pub key: String,
}

impl KeyCombo {
    /// Parse a display form like "control+shift+k". The last segment is
    /// the key; everything before it must be a known modifier.
    pub fn parse(display: &str) -> Option<Self> {
        let mut segments: Vec<&str> = display.split('+').map(str::trim).collect();
        let key = segments.pop()?.to_ascii_lowercase();
        if key.is_empty() {
            return None;
        }
        let mut modifiers = Vec::with_capacity(segments.len());
        for segment in segments {
            modifiers.push(parse_modifier(segment)?);
        }
        Some(Self { modifiers, key })
    }
}

fn parse_modifier(segment: &str) -> Option<Modifier> {
    match segment.to_ascii_lowercase().as_str() {
        "ctrl" | "control" => Some(Modifier::Control),
        "shift" => Some(Modifier::Shift),
        "alt" => Some(Modifier::Alt),
        "win" | "windows" | "meta" | "super" => Some(Modifier::Windows),
        _ => None,
    }
}

/// A gesture event as delivered by the host: which logical gesture, and
/// the physical combo to replay if the file manager is not focused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gesture {
    pub id: GestureId,
    pub combo: KeyCombo,
}
