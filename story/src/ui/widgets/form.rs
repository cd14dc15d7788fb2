//! Form list widget: student info, seed words and the story steps

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::ui::theme::StoryTheme;

/// How a row is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Field,
    StudentStep,
    AiStep,
}

/// One visible row of the form
#[derive(Debug, Clone)]
pub struct FormRow {
    pub label: String,
    pub value: String,
    pub kind: RowKind,
    pub locked: bool,
}

/// Widget listing the form rows with the selected one highlighted
pub struct FormWidget<'a> {
    rows: &'a [FormRow],
    selected: usize,
    theme: &'a StoryTheme,
    focused: bool,
}

impl<'a> FormWidget<'a> {
    pub fn new(rows: &'a [FormRow], theme: &'a StoryTheme) -> Self {
        Self {
            rows,
            selected: 0,
            theme,
            focused: true,
        }
    }

    pub fn selected(mut self, selected: usize) -> Self {
        self.selected = selected;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    fn row_line(&self, row: &FormRow, width: usize) -> Line<'static> {
        let marker = match (row.kind, row.locked) {
            (_, true) => "✔ ",
            (RowKind::AiStep, false) => "✦ ",
            (RowKind::StudentStep, false) => "✎ ",
            (RowKind::Field, false) => "  ",
        };
        let marker_style = if row.locked {
            self.theme.locked_style()
        } else {
            self.theme.step_style(row.kind == RowKind::AiStep)
        };

        let label = format!("{:<10}", row.label);
        let budget = width.saturating_sub(label.chars().count() + 4);
        let value: String = row.value.lines().next().unwrap_or("").chars().take(budget).collect();
        let value_span = if value.is_empty() {
            let hint = match row.kind {
                RowKind::AiStep => "(g: AI가 써요)",
                _ => "(비어 있음)",
            };
            Span::styled(hint, self.theme.system_style())
        } else {
            Span::styled(value, self.theme.step_style(row.kind == RowKind::AiStep))
        };

        Line::from(vec![
            Span::styled(marker, marker_style),
            Span::styled(label, self.theme.title_style()),
            Span::raw(" "),
            value_span,
        ])
    }
}

impl Widget for FormWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(" 이야기 만들기 [j/k 이동, i 입력] ")
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(self.focused));

        let inner = block.inner(area);
        block.render(area, buf);

        // Keep the selected row visible
        let visible = inner.height as usize;
        let offset = if visible == 0 {
            0
        } else {
            self.selected.saturating_sub(visible.saturating_sub(1))
        };

        let lines: Vec<Line> = self
            .rows
            .iter()
            .enumerate()
            .skip(offset)
            .take(visible)
            .map(|(i, row)| {
                let line = self.row_line(row, inner.width as usize);
                if i == self.selected {
                    line.style(self.theme.selected_style())
                } else {
                    line
                }
            })
            .collect();

        Paragraph::new(lines).render(inner, buf);
    }
}
