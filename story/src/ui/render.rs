//! Render orchestration for the story TUI

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, Field, InputMode};
use crate::ui::widgets::{
    FormRow, FormWidget, InputWidget, PreviewItem, PreviewKind, RowKind, StoryPanelWidget,
};

/// Main render function
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(10),
            Constraint::Length(1),
            Constraint::Length(3),
        ])
        .split(area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(rows[1]);

    render_title_bar(frame, rows[0]);

    let form_rows = form_rows(app);
    let form = FormWidget::new(&form_rows, &app.theme)
        .selected(app.selected)
        .focused(app.input_mode == InputMode::Normal);
    frame.render_widget(form, columns[0]);

    let items = preview_items(app);
    let preview = StoryPanelWidget::new(&items, &app.theme)
        .scroll(app.preview_scroll)
        .title(preview_title(app));
    frame.render_widget(preview, columns[1]);

    render_status_bar(frame, app, rows[2]);
    render_input(frame, app, rows[3]);

    if app.show_help {
        render_help_overlay(frame, app, area);
    }
}

/// Label shown for a form row.
pub fn field_label(app: &App, field: Field) -> String {
    match field {
        Field::Classroom => "반".to_string(),
        Field::Team => "모둠".to_string(),
        Field::Number => "번호".to_string(),
        Field::Name => "이름".to_string(),
        Field::Word(i) => format!("단어 {}", i + 1),
        Field::Step(i) => {
            let title = app.session.step(i).map(|s| s.title.as_str()).unwrap_or("");
            format!("{}. {title}", i + 1)
        }
    }
}

/// Rows of the form, built from the session and the typed words.
pub fn form_rows(app: &App) -> Vec<FormRow> {
    app.fields
        .iter()
        .map(|&field| {
            let (kind, locked) = match field {
                Field::Step(i) => match app.session.step(i) {
                    Some(step) if step.is_generated() => (RowKind::AiStep, step.locked),
                    Some(step) => (RowKind::StudentStep, step.locked),
                    None => (RowKind::StudentStep, false),
                },
                _ => (RowKind::Field, false),
            };
            FormRow {
                label: field_label(app, field),
                value: app.field_value(field).to_string(),
                kind,
                locked,
            }
        })
        .collect()
}

/// Title of the preview panel.
pub fn preview_title(app: &App) -> &'static str {
    if app.session.polished().is_some() {
        " 다듬은 이야기 "
    } else {
        " 지금까지 완성된 이야기 "
    }
}

/// Preview entries: the character, then the polished or assembled story.
pub fn preview_items(app: &App) -> Vec<PreviewItem> {
    let session = &app.session;
    let mut items = Vec::new();

    if !session.character().is_empty() {
        items.push(PreviewItem::new(PreviewKind::Heading, "주인공"));
        items.push(PreviewItem::new(PreviewKind::Character, session.character()));
    }

    if let Some(polished) = session.polished() {
        items.push(PreviewItem::new(PreviewKind::Heading, "다듬은 이야기"));
        items.push(PreviewItem::new(PreviewKind::StudentText, polished));
        return items;
    }

    let mut any = false;
    for step in session.steps().iter().filter(|s| s.is_complete()) {
        any = true;
        let kind = if step.is_generated() {
            PreviewKind::AiText
        } else {
            PreviewKind::StudentText
        };
        items.push(PreviewItem::new(PreviewKind::Heading, step.title.as_str()));
        items.push(PreviewItem::new(kind, step.text.trim()));
    }

    if !any {
        items.push(PreviewItem::new(
            PreviewKind::System,
            "아직 쓴 이야기가 없어요. 세 단어로 주인공을 만들어 보세요!",
        ));
    }
    items
}

fn render_title_bar(frame: &mut Frame, area: Rect) {
    let line = Line::from(Span::styled(
        " 📖 AI와 함께 번갈아 이야기를 써요 ",
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    ));
    frame.render_widget(Paragraph::new(line), area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let mode = match app.input_mode {
        InputMode::Normal => " NORMAL ",
        InputMode::Insert => " INSERT ",
        InputMode::Command => " COMMAND ",
    };
    let progress = app.session.progress();

    let mut spans = vec![
        Span::styled(
            mode,
            Style::default()
                .fg(Color::Black)
                .bg(app.theme.border_focused)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" {}/{} ", progress.completed, progress.total)),
    ];
    if app.busy {
        spans.push(Span::styled("⏳ ", app.theme.title_style()));
    }
    if let Some(message) = app.status_message() {
        spans.push(Span::raw(message.to_string()));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_input(frame: &mut Frame, app: &App, area: Rect) {
    let is_active = matches!(app.input_mode, InputMode::Insert | InputMode::Command);
    let is_command = app.input_mode == InputMode::Command;
    let label = app
        .editing()
        .map(|field| field_label(app, field))
        .unwrap_or_default();

    let input_widget = InputWidget::new(app.input_buffer(), &app.theme)
        .cursor_position(app.cursor_position())
        .label(&label)
        .active(is_active)
        .command_mode(is_command)
        .placeholder("i: 선택한 칸 입력  Enter: 저장  Esc: 취소");

    frame.render_widget(input_widget, area);
}

/// A rect of fixed size centered in `area`, clamped to fit.
fn centered_rect_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn render_help_overlay(frame: &mut Frame, app: &App, area: Rect) {
    let popup_area = centered_rect_fixed(56, 24, area);
    frame.render_widget(Clear, popup_area);

    let heading = |text: &'static str| {
        Line::from(Span::styled(
            text,
            Style::default().add_modifier(Modifier::UNDERLINED),
        ))
    };

    let help_text = vec![
        Line::from(Span::styled(
            " 이야기 만들기 - 도움말 ",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        heading("Form:"),
        Line::from("  j/k or ↑/↓   Move between rows"),
        Line::from("  i or Enter   Edit the selected row"),
        Line::from("  Esc          Cancel editing"),
        Line::from("  J/K          Scroll the story preview"),
        Line::from(""),
        heading("Story:"),
        Line::from("  c            Make the character from the three words"),
        Line::from("  g            Let the AI write the selected step"),
        Line::from("  f / u        Finish / unlock the selected step"),
        Line::from("  p            Polish the whole story"),
        Line::from(""),
        heading("Commands:"),
        Line::from("  :w [dir]     Save the story as a text file"),
        Line::from("  :new         Start a new story"),
        Line::from("  :q           Quit"),
        Line::from(""),
        Line::from(Span::styled(
            "Press Esc or ? to close",
            Style::default().add_modifier(Modifier::DIM),
        )),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(app.theme.border_style(true));

    let paragraph = Paragraph::new(help_text)
        .block(block)
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, popup_area);
}
