//! Theme system for the TUI.
//!
//! Provides semantic color roles that map to ratatui `Style` values.
//! The `ThemeVariant` enum selects between Dark and Light palettes,
//! and `StyleMap` resolves role names to concrete styles.

use ratatui::style::{Color, Modifier, Style};
use std::collections::HashMap;

// ============================================================================
// Theme Variant
// ============================================================================

/// Available theme variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ThemeVariant {
    #[default]
    Dark,
    Light,
}

impl ThemeVariant {
    /// Parse a variant name (case-insensitive, surrounding whitespace ignored).
    pub fn from_str_name(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            _ => None,
        }
    }

    /// The literal persisted in local storage.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }

    /// Interprets a `COLORFGBG` value (`"fg;bg"` or `"fg;default;bg"`).
    ///
    /// Backgrounds 7 (light gray) and 15 (white) mean a light terminal; any
    /// other number means dark. Unparseable values yield `None`.
    pub fn from_colorfgbg(value: &str) -> Option<Self> {
        let bg: u8 = value.rsplit(';').next()?.trim().parse().ok()?;
        Some(if matches!(bg, 7 | 15) {
            Self::Light
        } else {
            Self::Dark
        })
    }

    /// Best guess at the host terminal's preference, used when nothing has
    /// been persisted yet.
    pub fn detect_system() -> Option<Self> {
        std::env::var("COLORFGBG")
            .ok()
            .and_then(|value| Self::from_colorfgbg(&value))
    }

    /// Build the `ColorPalette` for this variant.
    pub fn palette(self) -> ColorPalette {
        match self {
            Self::Dark => ColorPalette::dark(),
            Self::Light => ColorPalette::light(),
        }
    }

    /// The opposite variant: Dark → Light → Dark.
    pub fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }

    /// Human-readable name for status display.
    pub fn name(self) -> &'static str {
        match self {
            Self::Dark => "Dark",
            Self::Light => "Light",
        }
    }
}

// ============================================================================
// Color Palette: semantic roles to Style
// ============================================================================

/// A complete color palette mapping every semantic UI role to a `Style`.
#[derive(Debug, Clone)]
pub struct ColorPalette {
    // -- Article list --
    pub list_normal: Style,
    pub list_selected: Style,
    pub list_title: Style,
    pub list_source: Style,
    pub list_date: Style,
    pub list_bookmark: Style,
    pub list_summary: Style,

    // -- Trending --
    pub trending_border: Style,
    pub trending_rank: Style,
    pub trending_title: Style,

    // -- Filter bar --
    pub filter_label: Style,
    pub filter_active: Style,
    pub search_input: Style,

    // -- Detail --
    pub detail_heading: Style,
    pub detail_body: Style,
    pub detail_meta: Style,
    pub detail_link: Style,

    // -- Load feedback --
    pub notice: Style,
    pub error: Style,
    pub loading: Style,
    pub end_marker: Style,

    // -- Chrome --
    pub status_bar: Style,
    pub panel_border: Style,
    pub panel_border_focused: Style,
}

impl ColorPalette {
    fn dark() -> Self {
        Self {
            list_normal: Style::default(),
            list_selected: Style::default().bg(Color::DarkGray).fg(Color::White),
            list_title: Style::default().add_modifier(Modifier::BOLD),
            list_source: Style::default().fg(Color::Cyan),
            list_date: Style::default().fg(Color::DarkGray),
            list_bookmark: Style::default().fg(Color::Yellow),
            list_summary: Style::default().fg(Color::Gray),

            trending_border: Style::default().fg(Color::Magenta),
            trending_rank: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
            trending_title: Style::default(),

            filter_label: Style::default().fg(Color::DarkGray),
            filter_active: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            search_input: Style::default().fg(Color::Yellow),

            detail_heading: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            detail_body: Style::default(),
            detail_meta: Style::default().fg(Color::DarkGray),
            detail_link: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::UNDERLINED),

            notice: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),
            loading: Style::default().fg(Color::Cyan),
            end_marker: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),

            status_bar: Style::default().bg(Color::DarkGray).fg(Color::White),
            panel_border: Style::default(),
            panel_border_focused: Style::default().fg(Color::Cyan),
        }
    }

    fn light() -> Self {
        Self {
            list_normal: Style::default().fg(Color::Black),
            list_selected: Style::default().bg(Color::Blue).fg(Color::White),
            list_title: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            list_source: Style::default().fg(Color::Blue),
            list_date: Style::default().fg(Color::DarkGray),
            list_bookmark: Style::default().fg(Color::Magenta),
            list_summary: Style::default().fg(Color::DarkGray),

            trending_border: Style::default().fg(Color::Magenta),
            trending_rank: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
            trending_title: Style::default().fg(Color::Black),

            filter_label: Style::default().fg(Color::DarkGray),
            filter_active: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            search_input: Style::default().fg(Color::Magenta),

            detail_heading: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            detail_body: Style::default().fg(Color::Black),
            detail_meta: Style::default().fg(Color::DarkGray),
            detail_link: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::UNDERLINED),

            notice: Style::default().fg(Color::Magenta),
            error: Style::default().fg(Color::Red),
            loading: Style::default().fg(Color::Blue),
            end_marker: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),

            status_bar: Style::default().bg(Color::White).fg(Color::Black),
            panel_border: Style::default().fg(Color::DarkGray),
            panel_border_focused: Style::default().fg(Color::Blue),
        }
    }
}

// ============================================================================
// Style Map: string-keyed lookup used by the renderers
// ============================================================================

/// String-keyed style lookup.
///
/// Built from a `ColorPalette`; renderers resolve role names (e.g.
/// `"detail_heading"`) instead of reaching into palette fields, so a theme
/// switch only rebuilds this map.
#[derive(Debug, Clone)]
pub struct StyleMap {
    map: HashMap<&'static str, Style>,
}

/// All semantic role names, in declaration order.
const ROLE_NAMES: [&str; 24] = [
    "list_normal",
    "list_selected",
    "list_title",
    "list_source",
    "list_date",
    "list_bookmark",
    "list_summary",
    "trending_border",
    "trending_rank",
    "trending_title",
    "filter_label",
    "filter_active",
    "search_input",
    "detail_heading",
    "detail_body",
    "detail_meta",
    "detail_link",
    "notice",
    "error",
    "loading",
    "end_marker",
    "status_bar",
    "panel_border",
    "panel_border_focused",
];

impl StyleMap {
    pub fn from_palette(p: &ColorPalette) -> Self {
        let styles: [Style; 24] = [
            p.list_normal,
            p.list_selected,
            p.list_title,
            p.list_source,
            p.list_date,
            p.list_bookmark,
            p.list_summary,
            p.trending_border,
            p.trending_rank,
            p.trending_title,
            p.filter_label,
            p.filter_active,
            p.search_input,
            p.detail_heading,
            p.detail_body,
            p.detail_meta,
            p.detail_link,
            p.notice,
            p.error,
            p.loading,
            p.end_marker,
            p.status_bar,
            p.panel_border,
            p.panel_border_focused,
        ];

        let map = ROLE_NAMES.iter().copied().zip(styles).collect();
        Self { map }
    }

    /// Resolve a role name to its `Style`. Returns `Style::default()` for unknown roles.
    pub fn resolve(&self, role: &str) -> Style {
        self.map.get(role).copied().unwrap_or_default()
    }
}

// ============================================================================
// Tests
// ============================================================================
