use serde::{Deserialize, Serialize};

use crate::config::ControllerConfig;
use crate::device::DeviceProfile;
use crate::document::memory::{NodeSpec, Schema};
use crate::document::{FocusTarget, Selection};
use crate::keyboard::{KEY_ENTER, KEY_SPACE};
use crate::surface::TouchPoint;

pub const SCRIPT_VERSION: u32 = 1;

/// A recorded editing session: starting document, environment and the events to feed in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Script {
    pub version: u32,
    #[serde(default)]
    pub config: ControllerConfig,
    #[serde(default)]
    pub device: DeviceProfile,
    #[serde(default)]
    pub schema: Schema,
    pub document: Vec<NodeSpec>,
    /// Initial selection; defaults to the first caret position in the document.
    #[serde(default)]
    pub selection: Option<Selection>,
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A key identifier from the on-screen keyboard.
    Key {
        key: String,
    },
    /// Shorthand for one `Key` per character.
    Type {
        text: String,
    },
    Wait {
        ms: u64,
    },
    Focus,
    Blur,
    TouchStart {
        touches: Vec<TouchPoint>,
    },
    Click,
    /// Focus moves without the editor's involvement (e.g. the user taps another field).
    SetActive {
        target: FocusTarget,
    },
    Resize {
        viewport_width: u32,
    },
    Select {
        from: usize,
        to: usize,
    },
}

/// Key identifiers the keyboard would emit to produce `text`.
pub fn keys_for_text(text: &str) -> Vec<String> {
    text.chars()
        .map(|c| match c {
            ' ' => KEY_SPACE.to_string(),
            '\n' => KEY_ENTER.to_string(),
            c => c.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn text_maps_whitespace_to_special_keys() {
        assert_eq!(
            keys_for_text("a b\nc"),
            vec!["a", "{space}", "b", "{enter}", "c"]
        );
    }

    #[test]
    fn minimal_script_uses_defaults() {
        let json = r#"{
            "version": 1,
            "document": [{"type": "paragraph", "text": "hi"}],
            "events": [
                {"type": "key", "key": "a"},
                {"type": "wait", "ms": 500},
                {"type": "touch_start", "touches": [{"inside_editable": true}]},
                {"type": "set_active", "target": "elsewhere"}
            ]
        }"#;
        let script: Script = serde_json::from_str(json).expect("valid script");
        assert_eq!(script.config, ControllerConfig::default());
        assert_eq!(script.device, DeviceProfile::desktop());
        assert_eq!(script.events.len(), 4);
        assert_eq!(
            script.events[3],
            Event::SetActive {
                target: FocusTarget::Elsewhere
            }
        );
    }
}
