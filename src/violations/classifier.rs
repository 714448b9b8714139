use serde::{Deserialize, Serialize};

use crate::activity_log::LogCategory;

use super::counters::CounterKind;
use super::input::{ClipboardAction, InputEvent, KeyEvent, KeyPhase, Modifiers};

const ENABLE_LOGS: bool = true;

use crate::log_debug;

/// Key codes various browsers and layouts report for Print Screen.
const PRINT_SCREEN_KEY_CODES: [u32; 4] = [44, 124, 154, 122];
const SHORTCUT_KEYS: [&str; 8] = ["c", "v", "x", "a", "t", "w", "s", "p"];
const SCREENSHOT_TOOL_KEYS: [&str; 2] = ["s", "x"];
const MONITORED_FUNCTION_KEYS: [&str; 10] =
    ["F1", "F2", "F3", "F4", "F5", "F6", "F7", "F8", "F9", "F10"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViolationCategory {
    TabSwitch,
    ClipboardBlock,
    ShortcutBlock,
    DevtoolsBlock,
    FullscreenBlock,
    ScreenshotBlock,
    ScreenshotToolBlock,
    SnippingToolBlock,
    ScreenCaptureBlock,
    FocusLost,
    FocusRegained,
    DragBlock,
    ContextMenuBlock,
    LargeSelection,
    SystemKey,
    AppSwitch,
    FunctionKey,
    UnloadAttempt,
}

impl ViolationCategory {
    /// Counter bumped by this category, if it is a counted violation.
    pub fn counter(&self) -> Option<CounterKind> {
        match self {
            ViolationCategory::TabSwitch => Some(CounterKind::TabSwitches),
            ViolationCategory::ClipboardBlock
            | ViolationCategory::ShortcutBlock
            | ViolationCategory::ScreenshotBlock
            | ViolationCategory::ScreenshotToolBlock
            | ViolationCategory::SnippingToolBlock => Some(CounterKind::CopyPasteBlocked),
            ViolationCategory::ScreenCaptureBlock => Some(CounterKind::ScreenshotAttempts),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub category: ViolationCategory,
    pub level: LogCategory,
    pub message: String,
    /// Text for the warning overlay, when the user should be told.
    pub warning: Option<String>,
}

impl Classification {
    fn warning(category: ViolationCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            level: LogCategory::Warning,
            message: message.into(),
            warning: None,
        }
    }

    fn info(category: ViolationCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            level: LogCategory::Info,
            message: message.into(),
            warning: None,
        }
    }

    fn prompt(mut self, text: impl Into<String>) -> Self {
        self.warning = Some(text.into());
        self
    }

    pub fn counter(&self) -> Option<CounterKind> {
        self.category.counter()
    }
}

/// What to do with one input event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Verdict {
    /// Suppress the browser's native action for the event.
    pub suppress_default: bool,
    pub classification: Option<Classification>,
    /// Verbose-mode trace for key events that matched nothing.
    pub debug: Option<String>,
}

impl Verdict {
    fn ignore() -> Self {
        Self::default()
    }

    fn suppress() -> Self {
        Self {
            suppress_default: true,
            ..Self::default()
        }
    }

    fn block(classification: Classification) -> Self {
        Self {
            suppress_default: true,
            classification: Some(classification),
            debug: None,
        }
    }

    fn observe(classification: Classification) -> Self {
        Self {
            suppress_default: false,
            classification: Some(classification),
            debug: None,
        }
    }
}

/// Maps raw page events to violation categories.
///
/// Rules are evaluated in a fixed order and the first match wins. The only
/// memory kept between events is whether Print Screen was blocked on
/// keydown, so its keyup is not counted a second time.
#[derive(Debug, Clone)]
pub struct ViolationClassifier {
    verbose: bool,
    large_selection_chars: usize,
    print_screen_down: bool,
}

impl ViolationClassifier {
    pub fn new(verbose: bool, large_selection_chars: usize) -> Self {
        Self {
            verbose,
            large_selection_chars,
            print_screen_down: false,
        }
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    pub fn reset(&mut self) {
        self.print_screen_down = false;
    }

    /// Classify `event`. When `armed` is false no violation is produced, but a
    /// few native actions are still suppressed on the whole page.
    pub fn classify(&mut self, event: &InputEvent, armed: bool) -> Verdict {
        if !armed {
            return unarmed_verdict(event);
        }

        match event {
            InputEvent::Visibility { hidden: true } => Verdict::observe(
                Classification::warning(
                    ViolationCategory::TabSwitch,
                    "Tab switch detected - User left the test page",
                )
                .prompt("Tab switching detected! This may be considered cheating."),
            ),
            InputEvent::Visibility { hidden: false } => Verdict::ignore(),
            InputEvent::Clipboard { action } => Verdict::block(classify_clipboard(*action)),
            InputEvent::Key(key) => self.classify_key(key),
            InputEvent::WindowFocus { focused: false } => Verdict::observe(Classification::warning(
                ViolationCategory::FocusLost,
                "Window lost focus - Possible tab switch",
            )),
            InputEvent::WindowFocus { focused: true } => Verdict::observe(Classification::info(
                ViolationCategory::FocusRegained,
                "Window regained focus",
            )),
            InputEvent::DragStart => Verdict::block(Classification::warning(
                ViolationCategory::DragBlock,
                "Drag operation blocked",
            )),
            InputEvent::ContextMenu => Verdict::block(
                Classification::warning(
                    ViolationCategory::ContextMenuBlock,
                    "Right-click context menu attempted",
                )
                .prompt("Right-click context menu is disabled during the test!"),
            ),
            InputEvent::SelectStart { in_editor } => {
                if *in_editor {
                    Verdict::ignore()
                } else {
                    Verdict::suppress()
                }
            }
            InputEvent::SelectionChange { length } => {
                if *length > self.large_selection_chars {
                    Verdict::observe(Classification::warning(
                        ViolationCategory::LargeSelection,
                        format!("Large text selection detected: {length} characters"),
                    ))
                } else {
                    Verdict::ignore()
                }
            }
            InputEvent::BeforeUnload => Verdict::block(Classification::warning(
                ViolationCategory::UnloadAttempt,
                "Attempted to leave the test page",
            )),
            InputEvent::ScreenCaptureRequest => Verdict::block(
                Classification::warning(
                    ViolationCategory::ScreenCaptureBlock,
                    "Unauthorized screen capture attempt detected",
                )
                .prompt(
                    "Unauthorized screen recording attempt detected! Only test-approved recording is allowed.",
                ),
            ),
        }
    }

    fn classify_key(&mut self, key: &KeyEvent) -> Verdict {
        let verdict = match key.phase {
            KeyPhase::Down => {
                let verdict = classify_key_down(key);
                self.print_screen_down =
                    category_of(&verdict) == Some(ViolationCategory::ScreenshotBlock);
                verdict
            }
            KeyPhase::Up if self.print_screen_down && is_print_screen(key) => {
                // Already classified when the key went down.
                self.print_screen_down = false;
                Verdict::ignore()
            }
            KeyPhase::Up => classify_key_up(key),
        };

        if verdict.classification.is_none() && self.verbose {
            let trace = format!("{}: {}", key.phase.label(), key.describe());
            log_debug!("unmatched key event {trace}");
            return Verdict {
                debug: Some(trace),
                ..verdict
            };
        }
        verdict
    }
}

fn classify_clipboard(action: ClipboardAction) -> Classification {
    let (message, prompt) = match action {
        ClipboardAction::Copy => (
            "Copy operation blocked",
            "Copy operation is not allowed during the test!",
        ),
        ClipboardAction::Paste => (
            "Paste operation blocked",
            "Paste operation is not allowed during the test!",
        ),
        ClipboardAction::Cut => (
            "Cut operation blocked",
            "Cut operation is not allowed during the test!",
        ),
        ClipboardAction::BeforeCopy => (
            "Copy operation intercepted via beforecopy event",
            "Copy operations are blocked during the test!",
        ),
        ClipboardAction::BeforePaste => (
            "Paste operation intercepted via beforepaste event",
            "Paste operations are blocked during the test!",
        ),
        ClipboardAction::ApiRead => (
            "Unauthorized clipboard read attempt detected",
            "Clipboard access is not allowed during the test!",
        ),
        ClipboardAction::ApiWrite => (
            "Unauthorized clipboard write attempt detected",
            "Clipboard access is not allowed during the test!",
        ),
    };
    Classification::warning(ViolationCategory::ClipboardBlock, message).prompt(prompt)
}

fn classify_key_down(key: &KeyEvent) -> Verdict {
    let mods = key.modifiers;
    let lower = key.lowercase_key();

    if mods.ctrl && mods.shift && SCREENSHOT_TOOL_KEYS.contains(&lower.as_str()) {
        let upper = lower.to_uppercase();
        return Verdict::block(
            Classification::warning(
                ViolationCategory::ScreenshotToolBlock,
                format!("Ctrl+Shift+{upper} blocked - Screenshot tool attempt"),
            )
            .prompt(format!(
                "Ctrl+Shift+{upper} is blocked - Potential screenshot tool shortcut!"
            )),
        );
    }

    if mods.ctrl_or_meta() && SHORTCUT_KEYS.contains(&lower.as_str()) {
        return Verdict::block(shortcut_classification(mods, &lower));
    }

    match key.key_str() {
        "F12" => {
            return Verdict::block(
                Classification::warning(
                    ViolationCategory::DevtoolsBlock,
                    "Attempted to open developer tools (F12)",
                )
                .prompt("Developer tools are not allowed during the test!"),
            )
        }
        "F11" => {
            return Verdict::block(
                Classification::warning(
                    ViolationCategory::FullscreenBlock,
                    "F11 key blocked during test",
                )
                .prompt("Manual fullscreen toggle (F11) is disabled during the test!"),
            )
        }
        "Escape" => {
            return Verdict::block(
                Classification::warning(
                    ViolationCategory::FullscreenBlock,
                    "ESC key blocked - Fullscreen protection",
                )
                .prompt("ESC key is disabled during the test to maintain fullscreen mode!"),
            )
        }
        _ => {}
    }

    if is_print_screen(key) {
        return Verdict::block(print_screen_classification(mods));
    }

    if key.is("Meta") || matches!(key.key_code, Some(91 | 92)) {
        return Verdict::observe(
            Classification::warning(
                ViolationCategory::SystemKey,
                "Windows key pressed - Possible system access attempt",
            )
            .prompt(
                "System shortcuts may interfere with the test. Please avoid using Windows key during the test.",
            ),
        );
    }

    if mods.alt && key.is("Tab") {
        return Verdict::observe(
            Classification::warning(
                ViolationCategory::AppSwitch,
                "Alt+Tab detected - Possible application switching",
            )
            .prompt("Alt+Tab detected! Application switching may be considered a violation."),
        );
    }

    Verdict::ignore()
}

fn classify_key_up(key: &KeyEvent) -> Verdict {
    let mods = key.modifiers;

    if mods.meta && mods.shift && key.lowercase_key() == "s" {
        return Verdict::block(
            Classification::warning(
                ViolationCategory::SnippingToolBlock,
                "Snipping Tool shortcut detected - Screenshot attempt blocked",
            )
            .prompt("Windows+Shift+S (Snipping Tool) is not allowed during the test!"),
        );
    }

    // Some platforms only deliver Print Screen on keyup.
    if is_print_screen(key) {
        return Verdict::block(print_screen_classification(mods));
    }

    if MONITORED_FUNCTION_KEYS.contains(&key.key_str()) {
        return Verdict::observe(Classification::info(
            ViolationCategory::FunctionKey,
            format!(
                "Function key {} pressed - Monitoring for screenshot tools",
                key.key_str()
            ),
        ));
    }

    Verdict::ignore()
}

fn shortcut_classification(mods: Modifiers, lower: &str) -> Classification {
    let modifier = if mods.ctrl { "Ctrl" } else { "Cmd" };
    let upper = lower.to_uppercase();
    match lower {
        "t" => Classification::warning(
            ViolationCategory::ShortcutBlock,
            format!("Attempted to open new tab ({modifier}+T)"),
        )
        .prompt("Opening new tabs is not allowed during the test!"),
        "w" => Classification::warning(
            ViolationCategory::ShortcutBlock,
            format!("Attempted to close tab ({modifier}+W)"),
        )
        .prompt("Closing tabs is not allowed during the test!"),
        _ => Classification::warning(
            ViolationCategory::ShortcutBlock,
            format!("Blocked keyboard shortcut: {modifier}+{upper}"),
        )
        .prompt(format!(
            "Keyboard shortcut {modifier}+{upper} is not allowed during the test!"
        )),
    }
}

fn print_screen_classification(mods: Modifiers) -> Classification {
    let (message, prompt) = if mods.alt {
        (
            "Alt+Print Screen pressed - Window screenshot attempt blocked",
            "Alt+Print Screen is not allowed during the test!",
        )
    } else if mods.ctrl {
        (
            "Ctrl+Print Screen pressed - Screenshot attempt blocked",
            "Ctrl+Print Screen is not allowed during the test!",
        )
    } else if mods.meta {
        (
            "Windows+Print Screen pressed - System screenshot attempt blocked",
            "Windows+Print Screen is not allowed during the test!",
        )
    } else {
        (
            "Print Screen key pressed",
            "Print Screen detected and blocked!",
        )
    };
    Classification::warning(ViolationCategory::ScreenshotBlock, message).prompt(prompt)
}

pub fn is_print_screen(key: &KeyEvent) -> bool {
    // 122 doubles as F11's key code.
    if key.is("F11") || key.code.as_deref() == Some("F11") {
        return false;
    }

    let listed = |code: Option<u32>| code.is_some_and(|code| PRINT_SCREEN_KEY_CODES.contains(&code));
    listed(key.key_code)
        || listed(key.which)
        || matches!(key.key_str(), "PrintScreen" | "Print")
        || matches!(key.code.as_deref(), Some("PrintScreen" | "Print"))
}

fn category_of(verdict: &Verdict) -> Option<ViolationCategory> {
    verdict.classification.as_ref().map(|c| c.category)
}

/// Page-wide suppression that applies with or without a running session.
fn unarmed_verdict(event: &InputEvent) -> Verdict {
    match event {
        InputEvent::ContextMenu | InputEvent::DragStart => Verdict::suppress(),
        InputEvent::SelectStart { in_editor: false } => Verdict::suppress(),
        InputEvent::Key(key) if key.phase == KeyPhase::Down => {
            let mods = key.modifiers;
            let lower = key.lowercase_key();
            let devtools_combo = mods.ctrl && mods.shift && ["i", "c", "j"].contains(&lower.as_str());
            let editing_combo = mods.ctrl && ["u", "c", "v", "x", "a"].contains(&lower.as_str());
            if key.is("F12") || devtools_combo || editing_combo {
                Verdict::suppress()
            } else {
                Verdict::ignore()
            }
        }
        _ => Verdict::ignore(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn armed() -> ViolationClassifier {
        ViolationClassifier::new(false, 50)
    }

    fn category(verdict: &Verdict) -> Option<ViolationCategory> {
        category_of(verdict)
    }

    #[test]
    fn ctrl_c_is_a_counted_shortcut_block() {
        let mut classifier = armed();
        let verdict = classifier.classify(&InputEvent::key_down("c", Modifiers::ctrl()), true);

        assert!(verdict.suppress_default);
        let classification = verdict.classification.expect("classified");
        assert_eq!(classification.category, ViolationCategory::ShortcutBlock);
        assert_eq!(classification.counter(), Some(CounterKind::CopyPasteBlocked));
        assert_eq!(classification.message, "Blocked keyboard shortcut: Ctrl+C");
    }

    #[test]
    fn unarmed_events_are_never_classified() {
        let mut classifier = armed();
        let verdict = classifier.classify(&InputEvent::key_down("c", Modifiers::ctrl()), false);
        assert!(verdict.classification.is_none());
        assert!(verdict.suppress_default);

        let verdict = classifier.classify(&InputEvent::Visibility { hidden: true }, false);
        assert_eq!(verdict, Verdict::default());

        let verdict = classifier.classify(&InputEvent::ContextMenu, false);
        assert!(verdict.suppress_default);
        assert!(verdict.classification.is_none());
    }

    #[test]
    fn print_screen_variants_have_distinct_messages() {
        let mut classifier = armed();
        let plain = KeyEvent::default().with_key_code(44);
        let verdict = classifier.classify(&InputEvent::Key(plain), true);
        let classification = verdict.classification.expect("plain print screen");
        assert_eq!(classification.category, ViolationCategory::ScreenshotBlock);
        assert_eq!(classification.message, "Print Screen key pressed");

        let alt = KeyEvent::down("PrintScreen", Modifiers::alt());
        let message = classifier
            .classify(&InputEvent::Key(alt), true)
            .classification
            .expect("alt print screen")
            .message;
        assert!(message.starts_with("Alt+Print Screen"));

        let meta = KeyEvent {
            code: Some("Print".into()),
            modifiers: Modifiers::meta(),
            ..KeyEvent::default()
        };
        let message = classifier
            .classify(&InputEvent::Key(meta), true)
            .classification
            .expect("meta print screen")
            .message;
        assert!(message.starts_with("Windows+Print Screen"));
    }

    #[test]
    fn print_screen_press_counts_once_across_down_and_up() {
        let mut classifier = armed();
        let down = InputEvent::Key(KeyEvent::down("PrintScreen", Modifiers::NONE));
        let up = InputEvent::Key(KeyEvent::up("PrintScreen", Modifiers::NONE));

        assert!(classifier.classify(&down, true).classification.is_some());
        assert!(classifier.classify(&up, true).classification.is_none());

        // keyup without a preceding keydown still counts
        assert_eq!(
            category(&classifier.classify(&up, true)),
            Some(ViolationCategory::ScreenshotBlock)
        );
    }

    #[test]
    fn f11_is_not_mistaken_for_print_screen() {
        let mut classifier = armed();
        let f11 = KeyEvent::down("F11", Modifiers::NONE).with_key_code(122);
        let classification = classifier
            .classify(&InputEvent::Key(f11), true)
            .classification
            .expect("f11");
        assert_eq!(classification.category, ViolationCategory::FullscreenBlock);
        assert_eq!(classification.counter(), None);
    }

    #[test]
    fn ctrl_shift_s_is_a_screenshot_tool_attempt() {
        let mut classifier = armed();
        let verdict = classifier.classify(&InputEvent::key_down("S", Modifiers::ctrl_shift()), true);
        assert_eq!(category(&verdict), Some(ViolationCategory::ScreenshotToolBlock));
        assert_eq!(
            verdict.classification.expect("classified").message,
            "Ctrl+Shift+S blocked - Screenshot tool attempt"
        );
    }

    #[test]
    fn snipping_tool_is_detected_on_keyup() {
        let mut classifier = armed();
        let verdict = classifier.classify(&InputEvent::key_up("S", Modifiers::meta_shift()), true);
        assert_eq!(category(&verdict), Some(ViolationCategory::SnippingToolBlock));
    }

    #[test]
    fn snipping_tool_press_reports_both_halves() {
        let mut classifier = armed();
        let down = classifier.classify(&InputEvent::key_down("S", Modifiers::meta_shift()), true);
        assert_eq!(category(&down), Some(ViolationCategory::ShortcutBlock));

        let up = classifier.classify(&InputEvent::key_up("S", Modifiers::meta_shift()), true);
        assert_eq!(category(&up), Some(ViolationCategory::SnippingToolBlock));
        assert_eq!(
            up.classification.expect("classified").message,
            "Snipping Tool shortcut detected - Screenshot attempt blocked"
        );
    }

    #[test]
    fn print_screen_keyup_after_another_keydown_counts() {
        let mut classifier = armed();
        classifier.classify(&InputEvent::key_down("PrintScreen", Modifiers::NONE), true);
        classifier.classify(&InputEvent::key_down("c", Modifiers::ctrl()), true);

        // A different key went down in between, so this keyup is a fresh press.
        let up = classifier.classify(&InputEvent::key_up("PrintScreen", Modifiers::NONE), true);
        assert_eq!(category(&up), Some(ViolationCategory::ScreenshotBlock));
    }

    #[test]
    fn devtools_and_escape_are_blocked_but_not_counted() {
        let mut classifier = armed();
        for key in ["F12", "Escape"] {
            let verdict = classifier.classify(&InputEvent::key_down(key, Modifiers::NONE), true);
            assert!(verdict.suppress_default);
            assert_eq!(verdict.classification.expect("classified").counter(), None);
        }
    }

    #[test]
    fn benign_keys_are_ignored_unless_verbose() {
        let mut classifier = armed();
        let event = InputEvent::key_down("q", Modifiers::NONE);
        assert_eq!(classifier.classify(&event, true), Verdict::default());

        classifier.set_verbose(true);
        let verdict = classifier.classify(&event, true);
        assert!(verdict.classification.is_none());
        assert_eq!(
            verdict.debug.as_deref(),
            Some("KEYDOWN: q (keyCode: N/A, which: N/A, code: N/A)")
        );
    }

    #[test]
    fn clipboard_and_tab_switch_map_to_their_counters() {
        let mut classifier = armed();
        let paste = classifier.classify(&InputEvent::clipboard(ClipboardAction::Paste), true);
        assert_eq!(
            paste.classification.expect("paste").counter(),
            Some(CounterKind::CopyPasteBlocked)
        );

        let hidden = classifier.classify(&InputEvent::Visibility { hidden: true }, true);
        assert!(!hidden.suppress_default);
        assert_eq!(
            hidden.classification.expect("hidden").counter(),
            Some(CounterKind::TabSwitches)
        );

        let foreign = classifier.classify(&InputEvent::ScreenCaptureRequest, true);
        assert_eq!(
            foreign.classification.expect("foreign capture").counter(),
            Some(CounterKind::ScreenshotAttempts)
        );
    }

    #[test]
    fn large_selection_threshold_is_exclusive() {
        let mut classifier = armed();
        assert!(classifier
            .classify(&InputEvent::SelectionChange { length: 50 }, true)
            .classification
            .is_none());
        assert_eq!(
            category(&classifier.classify(&InputEvent::SelectionChange { length: 51 }, true)),
            Some(ViolationCategory::LargeSelection)
        );
    }
}
