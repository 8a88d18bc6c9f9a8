//! Color palette and glyphs.
//!
//! Kanagawa Wave palette by default with an optional high-contrast
//! override; glyphs degrade to ASCII when configured.

use ratatui::style::{Color, Modifier, Style};

mod colors {
    use super::Color;

    pub const BG_DARK: Color = Color::Rgb(22, 22, 29);
    pub const BG_PANEL: Color = Color::Rgb(31, 31, 40);
    pub const BG_HIGHLIGHT: Color = Color::Rgb(42, 42, 55);
    pub const BG_POPUP: Color = Color::Rgb(54, 54, 70);
    pub const BG_BORDER: Color = Color::Rgb(84, 84, 109);

    pub const TEXT_PRIMARY: Color = Color::Rgb(220, 215, 186);
    pub const TEXT_SECONDARY: Color = Color::Rgb(200, 192, 147);
    pub const TEXT_MUTED: Color = Color::Rgb(114, 113, 105);

    pub const PRIMARY: Color = Color::Rgb(149, 127, 184);
    pub const ACCENT: Color = Color::Rgb(127, 180, 202);
    pub const SUCCESS: Color = Color::Rgb(152, 187, 108);
    pub const WARNING: Color = Color::Rgb(230, 195, 132);
    pub const ERROR: Color = Color::Rgb(255, 93, 98);
}

#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub bg_dark: Color,
    pub bg_panel: Color,
    pub bg_highlight: Color,
    pub bg_popup: Color,
    pub bg_border: Color,
    pub text_primary: Color,
    pub text_secondary: Color,
    pub text_muted: Color,
    pub primary: Color,
    pub accent: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
}

impl Palette {
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            bg_dark: colors::BG_DARK,
            bg_panel: colors::BG_PANEL,
            bg_highlight: colors::BG_HIGHLIGHT,
            bg_popup: colors::BG_POPUP,
            bg_border: colors::BG_BORDER,
            text_primary: colors::TEXT_PRIMARY,
            text_secondary: colors::TEXT_SECONDARY,
            text_muted: colors::TEXT_MUTED,
            primary: colors::PRIMARY,
            accent: colors::ACCENT,
            success: colors::SUCCESS,
            warning: colors::WARNING,
            error: colors::ERROR,
        }
    }

    #[must_use]
    pub const fn high_contrast() -> Self {
        Self {
            bg_dark: Color::Black,
            bg_panel: Color::Black,
            bg_highlight: Color::DarkGray,
            bg_popup: Color::Black,
            bg_border: Color::Gray,
            text_primary: Color::White,
            text_secondary: Color::Gray,
            text_muted: Color::Gray,
            primary: Color::Magenta,
            accent: Color::Cyan,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
        }
    }

    #[must_use]
    pub const fn pick(high_contrast: bool) -> Self {
        if high_contrast {
            Self::high_contrast()
        } else {
            Self::standard()
        }
    }

    #[must_use]
    pub fn title(&self) -> Style {
        Style::default()
            .fg(self.primary)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn label(&self) -> Style {
        Style::default().fg(self.text_secondary)
    }

    #[must_use]
    pub fn field(&self, focused: bool) -> Style {
        if focused {
            Style::default()
                .fg(self.text_primary)
                .bg(self.bg_highlight)
        } else {
            Style::default().fg(self.text_primary).bg(self.bg_panel)
        }
    }

    #[must_use]
    pub fn selected_row(&self) -> Style {
        Style::default()
            .bg(self.bg_highlight)
            .add_modifier(Modifier::BOLD)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Glyphs {
    pub bullet: &'static str,
    pub check: &'static str,
    pub cross: &'static str,
    pub spinner: &'static [&'static str],
}

const UNICODE_SPINNER: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const ASCII_SPINNER: &[&str] = &["|", "/", "-", "\\"];

impl Glyphs {
    #[must_use]
    pub const fn pick(ascii_only: bool) -> Self {
        if ascii_only {
            Self {
                bullet: "*",
                check: "ok",
                cross: "x",
                spinner: ASCII_SPINNER,
            }
        } else {
            Self {
                bullet: "•",
                check: "✓",
                cross: "✗",
                spinner: UNICODE_SPINNER,
            }
        }
    }

    #[must_use]
    pub fn spinner_frame(&self, tick: usize) -> &'static str {
        self.spinner[tick % self.spinner.len()]
    }
}
