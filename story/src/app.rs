//! Main application state and logic

use story_core::{Action, Outcome, SeedWords, StoryError, StorySession, MAX_WORD_CHARS};

use crate::ui::render::preview_items;
use crate::ui::theme::StoryTheme;

/// Vim-style input modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Normal mode - navigation and hotkeys (default)
    #[default]
    Normal,
    /// Insert mode - editing the selected field
    Insert,
    /// Command mode - entering : commands
    Command,
}

/// One row of the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Classroom,
    Team,
    Number,
    Name,
    Word(usize),
    Step(usize),
}

impl Field {
    /// Every row for a template with `steps` slots, top to bottom.
    pub fn all(steps: usize) -> Vec<Field> {
        let mut fields = vec![Field::Classroom, Field::Team, Field::Number, Field::Name];
        fields.extend((0..3).map(Field::Word));
        fields.extend((0..steps).map(Field::Step));
        fields
    }

    pub fn max_chars(self) -> Option<usize> {
        match self {
            Field::Word(_) => Some(MAX_WORD_CHARS),
            _ => None,
        }
    }
}

/// Main application state
pub struct App {
    pub session: StorySession,
    pub theme: StoryTheme,

    // Form state
    pub fields: Vec<Field>,
    pub selected: usize,
    /// Seed words as typed; only validated when the character is requested.
    pub words: [String; 3],
    editing: Option<Field>,

    // Input state
    pub input_mode: InputMode,
    input_buffer: String,
    cursor_position: usize,

    // Preview
    pub preview_scroll: usize,
    pub show_help: bool,

    // Status
    status_message: Option<String>,
    pub busy: bool,
    pub should_quit: bool,
}

impl App {
    pub fn new(session: StorySession) -> Self {
        let fields = Field::all(session.steps().len());
        Self {
            session,
            theme: StoryTheme::default(),
            fields,
            selected: 0,
            words: Default::default(),
            editing: None,
            input_mode: InputMode::Normal,
            input_buffer: String::new(),
            cursor_position: 0,
            preview_scroll: 0,
            show_help: false,
            status_message: Some("i: 입력  c: 주인공 만들기  g: AI 장면  ?: 도움말".to_string()),
            busy: false,
            should_quit: false,
        }
    }

    pub fn selected_field(&self) -> Field {
        self.fields[self.selected.min(self.fields.len() - 1)]
    }

    /// Index of the selected slot, if a step row is selected.
    pub fn selected_step(&self) -> Option<usize> {
        match self.selected_field() {
            Field::Step(i) => Some(i),
            _ => None,
        }
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.fields.len() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Current value of a row.
    pub fn field_value(&self, field: Field) -> &str {
        let student = self.session.student();
        match field {
            Field::Classroom => &student.classroom,
            Field::Team => &student.team,
            Field::Number => &student.number,
            Field::Name => &student.name,
            Field::Word(i) => self.words.get(i).map(String::as_str).unwrap_or(""),
            Field::Step(i) => self.session.step(i).map(|s| s.text.as_str()).unwrap_or(""),
        }
    }

    pub fn seed_words(&self) -> SeedWords {
        let [a, b, c] = &self.words;
        SeedWords::new(a.as_str(), b.as_str(), c.as_str())
    }

    // ========================================================================
    // Editing
    // ========================================================================

    /// Start editing the selected row. Fails for AI-written or finished slots.
    pub fn begin_edit(&mut self) -> Result<(), String> {
        let field = self.selected_field();
        if let Field::Step(i) = field {
            if let Some(step) = self.session.step(i) {
                if step.is_generated() {
                    return Err("AI가 쓰는 칸이에요. g를 눌러 만들어 주세요.".to_string());
                }
                if step.locked {
                    return Err("완성된 칸이에요. u를 눌러 다시 열어 주세요.".to_string());
                }
            }
        }

        self.input_buffer = self.field_value(field).to_string();
        self.cursor_position = self.input_buffer.chars().count();
        self.editing = Some(field);
        self.input_mode = InputMode::Insert;
        Ok(())
    }

    /// Finish editing. Returns the action that stores the value, if the
    /// value lives in the session.
    pub fn commit_edit(&mut self) -> Option<Action> {
        let field = self.editing.take()?;
        let text = std::mem::take(&mut self.input_buffer);
        self.cursor_position = 0;
        self.input_mode = InputMode::Normal;

        let mut student = self.session.student().clone();
        match field {
            Field::Classroom => student.classroom = text,
            Field::Team => student.team = text,
            Field::Number => student.number = text,
            Field::Name => student.name = text,
            Field::Word(i) => {
                if let Some(word) = self.words.get_mut(i) {
                    *word = text;
                }
                return None;
            }
            Field::Step(index) => return Some(Action::WriteStep { index, text }),
        }
        Some(Action::SetStudent(student))
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
        self.input_buffer.clear();
        self.cursor_position = 0;
        self.input_mode = InputMode::Normal;
    }

    pub fn editing(&self) -> Option<Field> {
        self.editing
    }

    // ========================================================================
    // Input buffer
    // ========================================================================

    pub fn input_buffer(&self) -> &str {
        &self.input_buffer
    }

    pub fn cursor_position(&self) -> usize {
        self.cursor_position
    }

    /// Enter command mode (starts with :)
    pub fn enter_command_mode(&mut self) {
        self.input_mode = InputMode::Command;
        self.input_buffer.clear();
        self.input_buffer.push(':');
        self.cursor_position = 1;
    }

    /// Exit to normal mode
    pub fn enter_normal_mode(&mut self) {
        self.input_mode = InputMode::Normal;
        if self.input_buffer.starts_with(':') {
            self.input_buffer.clear();
            self.cursor_position = 0;
        }
    }

    /// Take the typed command, without the leading ':'.
    pub fn submit_command(&mut self) -> String {
        let input = std::mem::take(&mut self.input_buffer);
        self.cursor_position = 0;
        self.input_mode = InputMode::Normal;
        input.trim_start_matches(':').trim().to_string()
    }

    /// Handle a typed character (unicode-safe)
    pub fn type_char(&mut self, c: char) {
        let limit = match self.input_mode {
            InputMode::Insert => self.editing.and_then(Field::max_chars),
            _ => None,
        };
        if limit.is_some_and(|max| self.input_buffer.chars().count() >= max) {
            return;
        }

        let byte_pos = self
            .input_buffer
            .char_indices()
            .nth(self.cursor_position)
            .map(|(i, _)| i)
            .unwrap_or(self.input_buffer.len());
        self.input_buffer.insert(byte_pos, c);
        self.cursor_position += 1;
    }

    /// Handle backspace (unicode-safe)
    pub fn backspace(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
            if let Some((byte_pos, ch)) = self.input_buffer.char_indices().nth(self.cursor_position)
            {
                self.input_buffer
                    .replace_range(byte_pos..byte_pos + ch.len_utf8(), "");
            }
        }
    }

    /// Handle delete (unicode-safe)
    pub fn delete(&mut self) {
        if let Some((byte_pos, ch)) = self.input_buffer.char_indices().nth(self.cursor_position) {
            self.input_buffer
                .replace_range(byte_pos..byte_pos + ch.len_utf8(), "");
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor_position = self.cursor_position.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let char_count = self.input_buffer.chars().count();
        self.cursor_position = (self.cursor_position + 1).min(char_count);
    }

    pub fn cursor_home(&mut self) {
        self.cursor_position = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor_position = self.input_buffer.chars().count();
    }

    // ========================================================================
    // Status and preview
    // ========================================================================

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Jump to the end of the preview; the widget caps the offset.
    pub fn scroll_preview_to_bottom(&mut self) {
        self.preview_scroll = usize::MAX / 2;
    }

    /// Rough max scroll, assuming a ~40 column preview.
    fn estimate_max_scroll(&self) -> usize {
        const ESTIMATED_WIDTH: usize = 40;
        const ESTIMATED_VISIBLE_HEIGHT: usize = 16;

        let estimated_lines: usize = preview_items(self)
            .iter()
            .map(|item| {
                item.content
                    .lines()
                    .map(|line| (line.chars().count() / ESTIMATED_WIDTH).max(1))
                    .sum::<usize>()
                    + 1
            })
            .sum();

        estimated_lines.saturating_sub(ESTIMATED_VISIBLE_HEIGHT)
    }

    pub fn scroll_preview_up(&mut self, lines: usize) {
        let max_scroll = self.estimate_max_scroll();
        self.preview_scroll = self.preview_scroll.min(max_scroll).saturating_sub(lines);
    }

    pub fn scroll_preview_down(&mut self, lines: usize) {
        let max_scroll = self.estimate_max_scroll();
        self.preview_scroll = self.preview_scroll.saturating_add(lines).min(max_scroll + 20);
    }

    /// Status shown while an action is running.
    pub fn busy_message(action: &Action) -> &'static str {
        match action {
            Action::SubmitWords(_) => "주인공을 만드는 중이에요...",
            Action::GenerateStep(_) => "AI가 장면을 쓰는 중이에요...",
            Action::Polish => "이야기를 다듬는 중이에요...",
            Action::Export(_) => "저장하는 중이에요...",
            _ => "",
        }
    }

    /// Reflect a handler's result in the form and the status line.
    pub fn finish_action(&mut self, result: Result<Outcome, StoryError>) {
        self.busy = false;
        match result {
            Ok(outcome) => {
                match outcome {
                    Outcome::Reset => {
                        self.words = Default::default();
                        self.preview_scroll = 0;
                    }
                    Outcome::StepGenerated(_) | Outcome::Polished => {
                        self.scroll_preview_to_bottom();
                    }
                    _ => {}
                }
                self.set_status(outcome.to_string());
            }
            Err(e) => {
                tracing::warn!(error = %e, "action failed");
                self.set_status(e.to_string());
            }
        }
    }
}
