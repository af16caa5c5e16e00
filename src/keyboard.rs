use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

pub const KEY_SPACE: &str = "{space}";
pub const KEY_ENTER: &str = "{enter}";
pub const KEY_BACKSPACE: &str = "{backspace}";
pub const KEY_SHIFT: &str = "{shift}";
pub const KEY_NUMBERS: &str = "{numbers}";
pub const KEY_DEFAULT: &str = "{default}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutName {
    #[default]
    Default,
    Shift,
    Numbers,
}

impl LayoutName {
    pub const ALL: [LayoutName; 3] = [LayoutName::Default, LayoutName::Shift, LayoutName::Numbers];

    pub fn as_str(self) -> &'static str {
        match self {
            LayoutName::Default => "default",
            LayoutName::Shift => "shift",
            LayoutName::Numbers => "numbers",
        }
    }

    /// The layout `{shift}` switches to: `default` goes to `shift`, everything else back to `default`.
    pub fn toggled_shift(self) -> LayoutName {
        match self {
            LayoutName::Default => LayoutName::Shift,
            _ => LayoutName::Default,
        }
    }
}

impl fmt::Display for LayoutName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayoutName {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        LayoutName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| anyhow!("unknown layout {s:?}; expected default, shift or numbers"))
    }
}

/// A key identifier as emitted by the on-screen keyboard widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Space,
    Enter,
    Backspace,
    Shift,
    Numbers,
    Default,
    Unknown(String),
}

impl Key {
    pub fn parse(id: &str) -> Key {
        match id {
            KEY_SPACE => Key::Space,
            KEY_ENTER => Key::Enter,
            KEY_BACKSPACE => Key::Backspace,
            KEY_SHIFT => Key::Shift,
            KEY_NUMBERS => Key::Numbers,
            KEY_DEFAULT => Key::Default,
            _ => {
                let mut chars = id.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Key::Char(c),
                    _ => Key::Unknown(id.to_string()),
                }
            }
        }
    }

    /// Text the key inserts into the document, if it is a content key.
    pub fn text(&self) -> Option<char> {
        match self {
            Key::Char(c) => Some(*c),
            Key::Space => Some(' '),
            _ => None,
        }
    }
}

pub fn layout_rows(layout: LayoutName) -> &'static [&'static str] {
    match layout {
        LayoutName::Default => &[
            "1 2 3 4 5 6 7 8 9 0",
            "q w e r t y u i o p",
            "a s d f g h j k l",
            "{shift} z x c v b n m {backspace}",
            "{numbers} / {space} {enter}",
        ],
        LayoutName::Shift => &[
            "! @ # $ % ^ & * ( )",
            "Q W E R T Y U I O P",
            "A S D F G H J K L",
            "{shift} Z X C V B N M {backspace}",
            "{numbers} / {space} {enter}",
        ],
        LayoutName::Numbers => &[
            "` ~ - _ = + [ ] { } \\ |",
            "; : ' \" , . / ?",
            "! @ # $ % ^ & * ( )",
            "{default} {space} {backspace} {enter}",
        ],
    }
}

/// Key identifiers of a layout in row order.
pub fn layout_keys(layout: LayoutName) -> impl Iterator<Item = &'static str> {
    layout_rows(layout)
        .iter()
        .flat_map(|row| row.split(' ').filter(|id| !id.is_empty()))
}

pub fn display_label(id: &str) -> Option<&'static str> {
    match id {
        KEY_BACKSPACE => Some("⌫"),
        KEY_ENTER => Some("⏎"),
        KEY_SHIFT => Some("⇧"),
        KEY_SPACE => Some("␣"),
        KEY_NUMBERS => Some("123"),
        KEY_DEFAULT => Some("ABC"),
        _ => None,
    }
}

pub const SPECIAL_KEYS: [&str; 6] = [
    KEY_BACKSPACE,
    KEY_ENTER,
    KEY_SHIFT,
    KEY_SPACE,
    KEY_NUMBERS,
    KEY_DEFAULT,
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutTable {
    pub name: LayoutName,
    pub rows: Vec<&'static str>,
}

/// Everything the keyboard widget needs to render the current state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyboardProps {
    pub layout_name: LayoutName,
    pub layouts: Vec<LayoutTable>,
    pub display: Vec<(&'static str, &'static str)>,
    /// Key presses must not take focus away from the editor surface.
    pub prevent_mouse_down_default: bool,
}

impl KeyboardProps {
    pub fn new(layout_name: LayoutName) -> Self {
        Self {
            layout_name,
            layouts: LayoutName::ALL
                .into_iter()
                .map(|name| LayoutTable {
                    name,
                    rows: layout_rows(name).to_vec(),
                })
                .collect(),
            display: SPECIAL_KEYS
                .into_iter()
                .filter_map(|id| display_label(id).map(|label| (id, label)))
                .collect(),
            prevent_mouse_down_default: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_special_and_printable_keys() {
        assert_eq!(Key::parse("a"), Key::Char('a'));
        assert_eq!(Key::parse("{"), Key::Char('{'));
        assert_eq!(Key::parse("{space}"), Key::Space);
        assert_eq!(Key::parse("{backspace}"), Key::Backspace);
        assert_eq!(Key::parse("{tab}"), Key::Unknown("{tab}".to_string()));
        assert_eq!(Key::parse("é"), Key::Char('é'));
    }

    #[test]
    fn every_layout_key_is_understood() {
        for layout in LayoutName::ALL {
            for id in layout_keys(layout) {
                assert!(
                    !matches!(Key::parse(id), Key::Unknown(_)),
                    "{id} in {layout} should be a known key"
                );
            }
        }
    }

    #[test]
    fn shift_toggles_between_default_and_shift() {
        assert_eq!(LayoutName::Default.toggled_shift(), LayoutName::Shift);
        assert_eq!(LayoutName::Shift.toggled_shift(), LayoutName::Default);
        assert_eq!(LayoutName::Numbers.toggled_shift(), LayoutName::Default);
    }

    #[test]
    fn props_carry_all_labels() {
        let props = KeyboardProps::new(LayoutName::Numbers);
        assert_eq!(props.layouts.len(), 3);
        assert_eq!(props.display.len(), 6);
        assert!(props.display.contains(&("{numbers}", "123")));
        assert!(props.prevent_mouse_down_default);
    }
}
