//! Story preview widget: the character profile and the assembled story

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    symbols::scrollbar,
    text::{Line, Span},
    widgets::{
        Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState,
        StatefulWidget, Widget, Wrap,
    },
};

use crate::ui::theme::StoryTheme;

/// Kind of a preview entry, for styling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewKind {
    Heading,
    Character,
    StudentText,
    AiText,
    System,
}

/// A single entry in the preview
#[derive(Debug, Clone)]
pub struct PreviewItem {
    pub content: String,
    pub kind: PreviewKind,
}

impl PreviewItem {
    pub fn new(kind: PreviewKind, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            kind,
        }
    }
}

/// Widget for the scrollable story preview
pub struct StoryPanelWidget<'a> {
    items: &'a [PreviewItem],
    scroll: usize,
    theme: &'a StoryTheme,
    title: &'a str,
}

impl<'a> StoryPanelWidget<'a> {
    pub fn new(items: &'a [PreviewItem], theme: &'a StoryTheme) -> Self {
        Self {
            items,
            scroll: 0,
            theme,
            title: " 지금까지 완성된 이야기 ",
        }
    }

    pub fn scroll(mut self, scroll: usize) -> Self {
        self.scroll = scroll;
        self
    }

    pub fn title(mut self, title: &'a str) -> Self {
        self.title = title;
        self
    }

    fn style_for(&self, kind: PreviewKind) -> Style {
        match kind {
            PreviewKind::Heading => self.theme.title_style(),
            PreviewKind::Character => self.theme.character_style(),
            PreviewKind::StudentText => self.theme.step_style(false),
            PreviewKind::AiText => self.theme.step_style(true),
            PreviewKind::System => self.theme.system_style(),
        }
    }
}

impl Widget for StoryPanelWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(self.title)
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(false));

        let inner = block.inner(area);
        block.render(area, buf);

        let mut lines: Vec<Line> = Vec::new();
        for item in self.items {
            let style = self.style_for(item.kind);
            for line in item.content.lines() {
                lines.push(Line::from(Span::styled(line.to_string(), style)));
            }
            // Headings sit directly above their paragraph
            if item.kind != PreviewKind::Heading {
                lines.push(Line::from(""));
            }
        }

        let visible_height = inner.height as usize;
        let total_lines = lines.len();
        let max_scroll = total_lines.saturating_sub(visible_height);
        let scroll = self.scroll.min(max_scroll);

        Paragraph::new(lines)
            .scroll((scroll as u16, 0))
            .wrap(Wrap { trim: false })
            .render(inner, buf);

        if total_lines > visible_height {
            let scrollbar_area = Rect {
                x: inner.x + inner.width.saturating_sub(1),
                y: inner.y,
                width: 1,
                height: inner.height,
            };

            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .symbols(scrollbar::VERTICAL)
                .thumb_style(Style::default().fg(Color::DarkGray))
                .track_style(Style::default().fg(Color::Black))
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓"));

            let mut scrollbar_state = ScrollbarState::new(max_scroll).position(scroll);
            scrollbar.render(scrollbar_area, buf, &mut scrollbar_state);
        }
    }
}
