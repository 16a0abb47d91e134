//! Dark theme tokens and style helpers.
//!
//! Surfaces match the exported PNG background (#1e1e1e); chart series use
//! the same colors as the image renderer.

use ratatui::style::{Color, Modifier, Style};

use quotelens_core::chart::ChartColor;

pub const BACKGROUND: Color = Color::Rgb(0x1e, 0x1e, 0x1e);
pub const ACCENT: Color = Color::Rgb(0x5c, 0x59, 0xc5);
pub const HIGHLIGHT: Color = Color::Rgb(0, 255, 255);
pub const WARNING: Color = Color::Rgb(255, 140, 0);
pub const NEGATIVE: Color = Color::Rgb(255, 20, 147);
pub const NEUTRAL: Color = Color::Rgb(147, 112, 219);
pub const MUTED: Color = Color::Rgb(150, 150, 160);
pub const TEXT: Color = Color::White;

/// Terminal color for a chart series color.
pub fn series(color: ChartColor) -> Color {
    Color::Rgb(color.r, color.g, color.b)
}

pub fn accent() -> Style {
    Style::default().fg(HIGHLIGHT)
}

pub fn accent_bold() -> Style {
    accent().add_modifier(Modifier::BOLD)
}

pub fn warning() -> Style {
    Style::default().fg(WARNING)
}

pub fn negative() -> Style {
    Style::default().fg(NEGATIVE)
}

pub fn neutral() -> Style {
    Style::default().fg(NEUTRAL)
}

pub fn muted() -> Style {
    Style::default().fg(MUTED)
}

pub fn text() -> Style {
    Style::default().fg(TEXT)
}

pub fn header() -> Style {
    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
}

pub fn panel_border(active: bool) -> Style {
    if active {
        Style::default().fg(ACCENT)
    } else {
        muted()
    }
}

pub fn panel_title(active: bool) -> Style {
    if active {
        accent_bold()
    } else {
        muted()
    }
}

/// Selector chip: the chosen value is reversed.
pub fn chip(selected: bool) -> Style {
    if selected {
        accent().add_modifier(Modifier::REVERSED)
    } else {
        muted()
    }
}
