use std::collections::{HashMap, VecDeque};
use std::fmt;

use winit::keyboard::KeyCode;

use crate::project::Filter;

/// Held modifiers at the time of a key press.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ModifierFlags {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl ModifierFlags {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub modifiers: ModifierFlags,
    pub key: KeyCode,
}

impl KeyCombo {
    pub const fn plain(key: KeyCode) -> Self {
        Self {
            modifiers: ModifierFlags::NONE,
            key,
        }
    }
}

/// "Ctrl+Alt+Shift+T" order; keys without a short name print as "?".
impl fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let held = [
            (self.modifiers.ctrl, "Ctrl+"),
            (self.modifiers.alt, "Alt+"),
            (self.modifiers.shift, "Shift+"),
        ];
        for (_, prefix) in held.iter().filter(|(on, _)| *on) {
            f.write_str(prefix)?;
        }
        f.write_str(key_name(self.key))
    }
}

/// What a shortcut does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Close the detail view if it is open.
    CloseModal,
    /// Switch to the next locale in the table.
    CycleLocale,
    ToggleTheme,
    SetFilter(Filter),
}

pub struct KeyBindings {
    map: HashMap<KeyCombo, Action>,
    /// First combo bound to each action, for hint labels.
    hints: HashMap<Action, KeyCombo>,
}

impl KeyBindings {
    /// Later pairs win a combo; the first combo listed for an action is
    /// its hint.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (KeyCombo, Action)>) -> Self {
        let mut map = HashMap::new();
        let mut hints = HashMap::new();
        for (combo, action) in pairs {
            map.insert(combo, action);
            hints.entry(action).or_insert(combo);
        }
        Self { map, hints }
    }

    /// Esc closes, L cycles language, T flips the theme, 1-3 pick a filter.
    pub fn defaults() -> Self {
        Self::from_pairs(
            [
                (KeyCode::Escape, Action::CloseModal),
                (KeyCode::KeyL, Action::CycleLocale),
                (KeyCode::KeyT, Action::ToggleTheme),
                (KeyCode::Digit1, Action::SetFilter(Filter::All)),
                (KeyCode::Digit2, Action::SetFilter(Filter::Games)),
                (KeyCode::Digit3, Action::SetFilter(Filter::Coding)),
            ]
            .map(|(key, action)| (KeyCombo::plain(key), action)),
        )
    }

    pub fn lookup(&self, combo: KeyCombo) -> Option<Action> {
        self.map.get(&combo).copied()
    }

    /// Hint label for an action, e.g. "Esc" or "T".
    pub fn label_for(&self, action: Action) -> Option<String> {
        self.hints.get(&action).map(KeyCombo::to_string)
    }
}

fn key_name(key: KeyCode) -> &'static str {
    match key {
        KeyCode::Escape => "Esc",
        KeyCode::Digit1 => "1",
        KeyCode::Digit2 => "2",
        KeyCode::Digit3 => "3",
        KeyCode::KeyA => "A",
        KeyCode::KeyB => "B",
        KeyCode::KeyL => "L",
        KeyCode::KeyT => "T",
        KeyCode::ArrowUp => "Up",
        KeyCode::ArrowDown => "Down",
        KeyCode::ArrowLeft => "Left",
        KeyCode::ArrowRight => "Right",
        _ => "?",
    }
}

/// ↑ ↑ ↓ ↓ ← → ← → B A
pub const KONAMI: [KeyCode; 10] = [
    KeyCode::ArrowUp,
    KeyCode::ArrowUp,
    KeyCode::ArrowDown,
    KeyCode::ArrowDown,
    KeyCode::ArrowLeft,
    KeyCode::ArrowRight,
    KeyCode::ArrowLeft,
    KeyCode::ArrowRight,
    KeyCode::KeyB,
    KeyCode::KeyA,
];

/// Watches key presses for a fixed sequence.
#[derive(Debug, Clone)]
pub struct SequenceDetector {
    sequence: &'static [KeyCode],
    recent: VecDeque<KeyCode>,
}

impl SequenceDetector {
    pub fn new(sequence: &'static [KeyCode]) -> Self {
        Self {
            sequence,
            recent: VecDeque::with_capacity(sequence.len()),
        }
    }

    pub fn konami() -> Self {
        Self::new(&KONAMI)
    }

    /// Record a press. Returns true when it completes the sequence; the
    /// detector then starts over.
    pub fn push(&mut self, key: KeyCode) -> bool {
        if self.sequence.is_empty() {
            return false;
        }
        if self.recent.len() == self.sequence.len() {
            self.recent.pop_front();
        }
        self.recent.push_back(key);
        let complete = self.recent.iter().eq(self.sequence.iter());
        if complete {
            self.recent.clear();
        }
        complete
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_map_escape_theme_and_filters() {
        let kb = KeyBindings::defaults();
        assert_eq!(
            kb.lookup(KeyCombo::plain(KeyCode::Escape)),
            Some(Action::CloseModal)
        );
        assert_eq!(
            kb.lookup(KeyCombo::plain(KeyCode::KeyT)),
            Some(Action::ToggleTheme)
        );
        assert_eq!(
            kb.lookup(KeyCombo::plain(KeyCode::Digit2)),
            Some(Action::SetFilter(Filter::Games))
        );
    }

    #[test]
    fn unbound_key_has_no_action() {
        let kb = KeyBindings::defaults();
        assert_eq!(kb.lookup(KeyCombo::plain(KeyCode::KeyZ)), None);
    }

    #[test]
    fn labels_for_defaults() {
        let kb = KeyBindings::defaults();
        assert_eq!(kb.label_for(Action::CloseModal).as_deref(), Some("Esc"));
        assert_eq!(kb.label_for(Action::CycleLocale).as_deref(), Some("L"));
        assert_eq!(
            kb.label_for(Action::SetFilter(Filter::Coding)).as_deref(),
            Some("3")
        );
    }

    #[test]
    fn modifier_combo_label() {
        let ctrl_t = KeyCombo {
            modifiers: ModifierFlags {
                ctrl: true,
                ..ModifierFlags::NONE
            },
            key: KeyCode::KeyT,
        };
        let kb = KeyBindings::from_pairs([
            (ctrl_t, Action::ToggleTheme),
            (KeyCombo::plain(KeyCode::KeyT), Action::ToggleTheme),
        ]);
        assert_eq!(kb.label_for(Action::ToggleTheme).as_deref(), Some("Ctrl+T"));
        assert_eq!(kb.lookup(KeyCombo::plain(KeyCode::KeyT)), Some(Action::ToggleTheme));
        assert_eq!(kb.lookup(KeyCombo::plain(KeyCode::KeyL)), None);
    }

    #[test]
    fn konami_completes_once() {
        let mut det = SequenceDetector::konami();
        let hits: Vec<bool> = KONAMI.iter().map(|&k| det.push(k)).collect();
        assert_eq!(hits.iter().filter(|&&h| h).count(), 1);
        assert!(hits[9]);
        // Starts over: one more A does not retrigger.
        assert!(!det.push(KeyCode::KeyA));
    }

    #[test]
    fn konami_survives_extra_leading_presses() {
        let mut det = SequenceDetector::konami();
        // A third Up mid-way must not lose the two before it.
        for k in [KeyCode::KeyX, KeyCode::ArrowUp, KeyCode::ArrowUp] {
            assert!(!det.push(k));
        }
        let completed = KONAMI.iter().any(|&k| det.push(k));
        assert!(completed);
    }

    #[test]
    fn konami_broken_sequence_does_not_fire() {
        let mut det = SequenceDetector::konami();
        for &k in &KONAMI[..8] {
            det.push(k);
        }
        assert!(!det.push(KeyCode::KeyA));
        assert!(!det.push(KeyCode::KeyB));
    }
}
