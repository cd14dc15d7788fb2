//! Color theme and styling for the story TUI

use ratatui::style::{Color, Modifier, Style};

/// Form and preview color theme
#[derive(Debug, Clone)]
pub struct StoryTheme {
    // Base colors
    pub foreground: Color,
    pub border: Color,
    pub border_focused: Color,

    // Text colors
    pub title_text: Color,
    pub student_text: Color,
    pub ai_text: Color,
    pub character_text: Color,
    pub system_text: Color,

    // Row markers
    pub selected_bg: Color,
    pub locked: Color,
}

impl Default for StoryTheme {
    fn default() -> Self {
        Self {
            foreground: Color::White,
            border: Color::DarkGray,
            border_focused: Color::Cyan,

            title_text: Color::Yellow,
            student_text: Color::White,
            ai_text: Color::LightMagenta,
            character_text: Color::LightGreen,
            system_text: Color::DarkGray,

            selected_bg: Color::Rgb(40, 40, 60),
            locked: Color::LightBlue,
        }
    }
}

impl StoryTheme {
    /// Style for step titles and form labels
    pub fn title_style(&self) -> Style {
        Style::default()
            .fg(self.title_text)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for paragraph text, by author
    pub fn step_style(&self, generated: bool) -> Style {
        Style::default().fg(if generated {
            self.ai_text
        } else {
            self.student_text
        })
    }

    pub fn character_style(&self) -> Style {
        Style::default()
            .fg(self.character_text)
            .add_modifier(Modifier::ITALIC)
    }

    /// Get style for system messages and placeholders
    pub fn system_style(&self) -> Style {
        Style::default()
            .fg(self.system_text)
            .add_modifier(Modifier::DIM)
    }

    pub fn locked_style(&self) -> Style {
        Style::default().fg(self.locked)
    }

    pub fn selected_style(&self) -> Style {
        Style::default()
            .bg(self.selected_bg)
            .add_modifier(Modifier::BOLD)
    }

    /// Get border style
    pub fn border_style(&self, focused: bool) -> Style {
        Style::default().fg(if focused {
            self.border_focused
        } else {
            self.border
        })
    }

    pub fn cursor_style(&self) -> Style {
        Style::default()
            .fg(self.foreground)
            .add_modifier(Modifier::UNDERLINED | Modifier::BOLD)
    }
}
