//! Keybinding registry: maps key events to actions, per view, with config
//! overrides from the `[keybindings]` table.
use crossterm::event::{KeyCode, KeyModifiers};
use std::collections::HashMap;

// ============================================================================
// Action Enum
// ============================================================================

/// All user-facing actions that can be triggered by keybindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Quit,
    NavDown,
    NavUp,
    JumpTop,
    JumpBottom,
    Select,
    Back,
    Refresh,
    EnterSearch,
    ExitSearch,
    CommitSearch,
    CycleSource,
    CycleTime,
    ClearFilters,
    ToggleBookmark,
    ViewBookmarks,
    RemoveBookmark,
    ClearBookmarks,
    OpenInBrowser,
    Share,
    ToggleTheme,
    ShowHelp,
    ScrollDown,
    ScrollUp,
    PageDown,
    PageUp,
}

impl Action {
    /// Human-readable description for the help screen.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Quit => "Quit application",
            Self::NavDown => "Navigate down",
            Self::NavUp => "Navigate up",
            Self::JumpTop => "Jump to first article",
            Self::JumpBottom => "Jump to last loaded article",
            Self::Select => "Open article",
            Self::Back => "Go back / dismiss",
            Self::Refresh => "Refresh feed",
            Self::EnterSearch => "Search articles",
            Self::ExitSearch => "Leave search input",
            Self::CommitSearch => "Search now",
            Self::CycleSource => "Next source",
            Self::CycleTime => "Next time window",
            Self::ClearFilters => "Clear all filters",
            Self::ToggleBookmark => "Toggle bookmark",
            Self::ViewBookmarks => "Show bookmarks",
            Self::RemoveBookmark => "Remove bookmark",
            Self::ClearBookmarks => "Clear all bookmarks",
            Self::OpenInBrowser => "Read full article in browser",
            Self::Share => "Show share links",
            Self::ToggleTheme => "Toggle light/dark theme",
            Self::ShowHelp => "Show help",
            Self::ScrollDown => "Scroll down one line",
            Self::ScrollUp => "Scroll up one line",
            Self::PageDown => "Page down",
            Self::PageUp => "Page up",
        }
    }

    /// Parse an action name from config (`nav_down`, `navdown`, aliases).
    fn from_name(name: &str) -> Option<Self> {
        let action = match name.to_lowercase().replace('-', "_").as_str() {
            "quit" => Self::Quit,
            "nav_down" | "navdown" | "down" => Self::NavDown,
            "nav_up" | "navup" | "up" => Self::NavUp,
            "jump_top" | "top" => Self::JumpTop,
            "jump_bottom" | "bottom" => Self::JumpBottom,
            "select" | "open_detail" => Self::Select,
            "back" => Self::Back,
            "refresh" => Self::Refresh,
            "enter_search" | "search" => Self::EnterSearch,
            "exit_search" => Self::ExitSearch,
            "commit_search" => Self::CommitSearch,
            "cycle_source" | "source" => Self::CycleSource,
            "cycle_time" | "time" => Self::CycleTime,
            "clear_filters" => Self::ClearFilters,
            "toggle_bookmark" | "bookmark" => Self::ToggleBookmark,
            "view_bookmarks" | "bookmarks" => Self::ViewBookmarks,
            "remove_bookmark" => Self::RemoveBookmark,
            "clear_bookmarks" => Self::ClearBookmarks,
            "open_in_browser" | "open" => Self::OpenInBrowser,
            "share" => Self::Share,
            "toggle_theme" | "theme" => Self::ToggleTheme,
            "show_help" | "help" => Self::ShowHelp,
            "scroll_down" => Self::ScrollDown,
            "scroll_up" => Self::ScrollUp,
            "page_down" => Self::PageDown,
            "page_up" => Self::PageUp,
            _ => return None,
        };
        Some(action)
    }
}

// ============================================================================
// Context Enum
// ============================================================================

/// Dispatch context. Bindings in a specific context shadow Global ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Context {
    Global,
    Feed,
    Detail,
    Bookmarks,
    Search,
}

impl Context {
    pub fn label(self) -> &'static str {
        match self {
            Self::Global => "Everywhere",
            Self::Feed => "Feed",
            Self::Detail => "Article",
            Self::Bookmarks => "Bookmarks",
            Self::Search => "Search input",
        }
    }
}

// ============================================================================
// Key Specification
// ============================================================================

/// A key event: code + modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeySpec {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeySpec {
    pub const fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    pub const fn plain(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }

    pub const fn ch(c: char) -> Self {
        Self::plain(KeyCode::Char(c))
    }

    pub const fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    /// Parse a key string from config.
    ///
    /// Supported formats: single chars (`q`, `/`), named keys (`Enter`,
    /// `Esc`, `Tab`, arrows, `Backspace`, `Space`, `PageDown`, `PageUp`,
    /// `Home`, `End`), `Ctrl+<char>` and `F1`..`F12`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();

        if let Some(rest) = s.strip_prefix("Ctrl+") {
            let mut chars = rest.trim().chars();
            let c = chars.next()?;
            return chars.next().is_none().then_some(Self::ctrl(c));
        }

        let named = match s.to_lowercase().as_str() {
            "enter" | "return" => Some(KeyCode::Enter),
            "esc" | "escape" => Some(KeyCode::Esc),
            "tab" => Some(KeyCode::Tab),
            "up" => Some(KeyCode::Up),
            "down" => Some(KeyCode::Down),
            "left" => Some(KeyCode::Left),
            "right" => Some(KeyCode::Right),
            "backspace" => Some(KeyCode::Backspace),
            "space" => Some(KeyCode::Char(' ')),
            "pagedown" => Some(KeyCode::PageDown),
            "pageup" => Some(KeyCode::PageUp),
            "home" => Some(KeyCode::Home),
            "end" => Some(KeyCode::End),
            _ => None,
        };
        if let Some(code) = named {
            return Some(Self::plain(code));
        }

        if let Some(n) = s.strip_prefix(['F', 'f']).and_then(|n| n.parse::<u8>().ok()) {
            return (1..=12).contains(&n).then_some(Self::plain(KeyCode::F(n)));
        }

        let mut chars = s.chars();
        let c = chars.next()?;
        chars.next().is_none().then_some(Self::ch(c))
    }
}

impl std::fmt::Display for KeySpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            f.write_str("Ctrl+")?;
        }
        match self.code {
            KeyCode::Char(' ') => f.write_str("Space"),
            KeyCode::Char(c) => write!(f, "{c}"),
            KeyCode::Enter => f.write_str("Enter"),
            KeyCode::Esc => f.write_str("Esc"),
            KeyCode::Tab => f.write_str("Tab"),
            KeyCode::Up => f.write_str("Up"),
            KeyCode::Down => f.write_str("Down"),
            KeyCode::Left => f.write_str("Left"),
            KeyCode::Right => f.write_str("Right"),
            KeyCode::Backspace => f.write_str("Backspace"),
            KeyCode::PageDown => f.write_str("PageDown"),
            KeyCode::PageUp => f.write_str("PageUp"),
            KeyCode::Home => f.write_str("Home"),
            KeyCode::End => f.write_str("End"),
            KeyCode::F(n) => write!(f, "F{n}"),
            _ => f.write_str("?"),
        }
    }
}

// ============================================================================
// Keybinding Registry
// ============================================================================

const DEFAULT_BINDINGS: &[(Context, KeySpec, Action)] = &[
    (Context::Global, KeySpec::ch('q'), Action::Quit),
    (Context::Global, KeySpec::ctrl('c'), Action::Quit),
    (Context::Global, KeySpec::ch('j'), Action::NavDown),
    (Context::Global, KeySpec::plain(KeyCode::Down), Action::NavDown),
    (Context::Global, KeySpec::ch('k'), Action::NavUp),
    (Context::Global, KeySpec::plain(KeyCode::Up), Action::NavUp),
    (Context::Global, KeySpec::ch('g'), Action::JumpTop),
    (Context::Global, KeySpec::plain(KeyCode::Home), Action::JumpTop),
    (Context::Global, KeySpec::ch('G'), Action::JumpBottom),
    (Context::Global, KeySpec::plain(KeyCode::End), Action::JumpBottom),
    (Context::Global, KeySpec::plain(KeyCode::Enter), Action::Select),
    (Context::Global, KeySpec::plain(KeyCode::Esc), Action::Back),
    (Context::Global, KeySpec::ch('b'), Action::ToggleBookmark),
    (Context::Global, KeySpec::ch('B'), Action::ViewBookmarks),
    (Context::Global, KeySpec::ch('o'), Action::OpenInBrowser),
    (Context::Global, KeySpec::ch('S'), Action::Share),
    (Context::Global, KeySpec::ch('T'), Action::ToggleTheme),
    (Context::Global, KeySpec::ch('?'), Action::ShowHelp),
    (Context::Feed, KeySpec::ch('r'), Action::Refresh),
    (Context::Feed, KeySpec::ch('/'), Action::EnterSearch),
    (Context::Feed, KeySpec::ch('s'), Action::CycleSource),
    (Context::Feed, KeySpec::ch('t'), Action::CycleTime),
    (Context::Feed, KeySpec::ch('c'), Action::ClearFilters),
    (Context::Detail, KeySpec::ch('j'), Action::ScrollDown),
    (Context::Detail, KeySpec::plain(KeyCode::Down), Action::ScrollDown),
    (Context::Detail, KeySpec::ch('k'), Action::ScrollUp),
    (Context::Detail, KeySpec::plain(KeyCode::Up), Action::ScrollUp),
    (Context::Detail, KeySpec::ctrl('d'), Action::PageDown),
    (Context::Detail, KeySpec::plain(KeyCode::PageDown), Action::PageDown),
    (Context::Detail, KeySpec::ctrl('u'), Action::PageUp),
    (Context::Detail, KeySpec::plain(KeyCode::PageUp), Action::PageUp),
    (Context::Bookmarks, KeySpec::ch('d'), Action::RemoveBookmark),
    (Context::Bookmarks, KeySpec::ch('D'), Action::ClearBookmarks),
    (Context::Search, KeySpec::plain(KeyCode::Esc), Action::ExitSearch),
    (Context::Search, KeySpec::plain(KeyCode::Enter), Action::CommitSearch),
];

/// Registry of keybindings, supporting default bindings and config overrides.
///
/// The same key can map to different actions in different contexts; lookups
/// fall back to [`Context::Global`].
pub struct KeybindingRegistry {
    lookup: HashMap<(Context, KeySpec), Action>,
    bindings: Vec<(Context, KeySpec, Action)>,
}

impl KeybindingRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            lookup: HashMap::with_capacity(DEFAULT_BINDINGS.len()),
            bindings: Vec::with_capacity(DEFAULT_BINDINGS.len()),
        };
        for &(context, key, action) in DEFAULT_BINDINGS {
            registry.bind(context, key, action);
        }
        registry
    }

    fn bind(&mut self, context: Context, key: KeySpec, action: Action) {
        self.lookup.insert((context, key), action);
        self.bindings.push((context, key, action));
    }

    /// Apply user overrides from the config `[keybindings]` table.
    ///
    /// An override replaces every default key of the action, in every context
    /// the action was bound in. Returns warnings for unknown action names or
    /// unparseable keys.
    pub fn apply_overrides(&mut self, overrides: &HashMap<String, String>) -> Vec<String> {
        let mut warnings = Vec::new();

        for (action_name, key_str) in overrides {
            let Some(action) = Action::from_name(action_name) else {
                warnings.push(format!("Unknown action '{action_name}', ignoring"));
                continue;
            };
            let Some(key) = KeySpec::parse(key_str) else {
                warnings.push(format!(
                    "Cannot parse key '{key_str}' for action '{action_name}', ignoring"
                ));
                continue;
            };

            let mut contexts: Vec<Context> = Vec::new();
            for (ctx, _, _) in self.bindings.iter().filter(|(_, _, a)| *a == action) {
                if !contexts.contains(ctx) {
                    contexts.push(*ctx);
                }
            }

            self.lookup.retain(|_, a| *a != action);
            self.bindings.retain(|(_, _, a)| *a != action);
            for ctx in contexts {
                self.bind(ctx, key, action);
            }

            tracing::info!(action = %action_name, key = %key_str, "Applied keybinding override");
        }

        warnings
    }

    /// Look up the action for a key, trying `context` first and then Global.
    pub fn action_for_key(
        &self,
        code: KeyCode,
        modifiers: KeyModifiers,
        context: Context,
    ) -> Option<Action> {
        // Terminals report uppercase letters with SHIFT set; the char already
        // carries the case.
        let modifiers = match code {
            KeyCode::Char(_) => modifiers - KeyModifiers::SHIFT,
            _ => modifiers,
        };
        let key = KeySpec::new(code, modifiers);
        self.lookup.get(&(context, key)).copied().or_else(|| {
            (context != Context::Global)
                .then(|| self.lookup.get(&(Context::Global, key)).copied())
                .flatten()
        })
    }

    /// All bindings for the help screen: (context, key label, description).
    pub fn all_bindings(&self) -> Vec<(Context, String, &'static str)> {
        self.bindings
            .iter()
            .map(|(ctx, key, action)| (*ctx, key.to_string(), action.describe()))
            .collect()
    }
}

impl Default for KeybindingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
