use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        shift: false,
        alt: false,
        meta: false,
    };

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::NONE
        }
    }

    pub fn meta() -> Self {
        Self {
            meta: true,
            ..Self::NONE
        }
    }

    pub fn alt() -> Self {
        Self {
            alt: true,
            ..Self::NONE
        }
    }

    pub fn ctrl_shift() -> Self {
        Self {
            ctrl: true,
            shift: true,
            ..Self::NONE
        }
    }

    pub fn meta_shift() -> Self {
        Self {
            meta: true,
            shift: true,
            ..Self::NONE
        }
    }

    pub fn ctrl_or_meta(&self) -> bool {
        self.ctrl || self.meta
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyPhase {
    #[default]
    Down,
    Up,
}

impl KeyPhase {
    pub fn label(&self) -> &'static str {
        match self {
            KeyPhase::Down => "KEYDOWN",
            KeyPhase::Up => "KEYUP",
        }
    }
}

/// A keydown or keyup as browsers report it. Any identity field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KeyEvent {
    pub phase: KeyPhase,
    pub key: Option<String>,
    pub code: Option<String>,
    pub key_code: Option<u32>,
    pub which: Option<u32>,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn down(key: &str, modifiers: Modifiers) -> Self {
        Self {
            phase: KeyPhase::Down,
            key: Some(key.to_string()),
            modifiers,
            ..Self::default()
        }
    }

    pub fn up(key: &str, modifiers: Modifiers) -> Self {
        Self {
            phase: KeyPhase::Up,
            ..Self::down(key, modifiers)
        }
    }

    pub fn with_key_code(mut self, key_code: u32) -> Self {
        self.key_code = Some(key_code);
        self
    }

    pub fn key_str(&self) -> &str {
        self.key.as_deref().unwrap_or("")
    }

    pub fn lowercase_key(&self) -> String {
        self.key_str().to_lowercase()
    }

    pub fn is(&self, name: &str) -> bool {
        self.key_str() == name
    }

    pub fn describe(&self) -> String {
        format!(
            "{} (keyCode: {}, which: {}, code: {})",
            self.key.as_deref().unwrap_or("Unknown"),
            self.key_code.map(|c| c.to_string()).unwrap_or_else(|| "N/A".into()),
            self.which.map(|c| c.to_string()).unwrap_or_else(|| "N/A".into()),
            self.code.as_deref().unwrap_or("N/A"),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClipboardAction {
    Copy,
    Paste,
    Cut,
    BeforeCopy,
    BeforePaste,
    ApiRead,
    ApiWrite,
}

/// Raw page events fed to the classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InputEvent {
    Key(KeyEvent),
    Clipboard {
        action: ClipboardAction,
    },
    Visibility {
        hidden: bool,
    },
    WindowFocus {
        focused: bool,
    },
    ContextMenu,
    DragStart,
    SelectStart {
        #[serde(default, rename = "inEditor")]
        in_editor: bool,
    },
    SelectionChange {
        length: usize,
    },
    BeforeUnload,
    /// Someone other than the session asked for a screen-capture stream.
    ScreenCaptureRequest,
}

impl InputEvent {
    pub fn key_down(key: &str, modifiers: Modifiers) -> Self {
        InputEvent::Key(KeyEvent::down(key, modifiers))
    }

    pub fn key_up(key: &str, modifiers: Modifiers) -> Self {
        InputEvent::Key(KeyEvent::up(key, modifiers))
    }

    pub fn clipboard(action: ClipboardAction) -> Self {
        InputEvent::Clipboard { action }
    }
}
