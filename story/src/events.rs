//! Event handling for the story TUI

use std::path::PathBuf;

use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use story_core::Action;

use crate::app::{App, InputMode};

/// Result of handling an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventResult {
    Continue,
    Quit,
    NeedsRedraw,
    /// Run a session handler, then redraw.
    Dispatch(Action),
}

/// Handle a terminal event
pub fn handle_event(app: &mut App, event: Event) -> EventResult {
    match event {
        Event::Key(key) => handle_key_event(app, key),
        Event::Mouse(mouse) => handle_mouse_event(app, mouse),
        Event::Resize(_, _) => EventResult::NeedsRedraw,
        _ => EventResult::Continue,
    }
}

fn handle_mouse_event(app: &mut App, mouse: MouseEvent) -> EventResult {
    match mouse.kind {
        MouseEventKind::ScrollUp => {
            app.scroll_preview_up(3);
            EventResult::NeedsRedraw
        }
        MouseEventKind::ScrollDown => {
            app.scroll_preview_down(3);
            EventResult::NeedsRedraw
        }
        _ => EventResult::Continue,
    }
}

fn handle_key_event(app: &mut App, key: KeyEvent) -> EventResult {
    if let (KeyCode::Char('c'), KeyModifiers::CONTROL) = (key.code, key.modifiers) {
        return EventResult::Quit;
    }

    if app.show_help {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?')) {
            app.toggle_help();
        }
        return EventResult::NeedsRedraw;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Insert => handle_insert_mode(app, key),
        InputMode::Command => handle_command_mode(app, key),
    }
}

/// Handle keys in NORMAL mode (vim-style navigation and hotkeys)
fn handle_normal_mode(app: &mut App, key: KeyEvent) -> EventResult {
    match key.code {
        KeyCode::Char('i') | KeyCode::Enter => {
            if let Err(message) = app.begin_edit() {
                app.set_status(message);
            }
            EventResult::NeedsRedraw
        }
        KeyCode::Char(':') => {
            app.enter_command_mode();
            EventResult::NeedsRedraw
        }
        KeyCode::Char('?') | KeyCode::F(1) => {
            app.toggle_help();
            EventResult::NeedsRedraw
        }
        KeyCode::Char('q') => EventResult::Quit,

        // Navigation
        KeyCode::Char('j') | KeyCode::Down => {
            app.select_next();
            EventResult::NeedsRedraw
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.select_prev();
            EventResult::NeedsRedraw
        }
        KeyCode::Char('J') | KeyCode::PageDown => {
            app.scroll_preview_down(5);
            EventResult::NeedsRedraw
        }
        KeyCode::Char('K') | KeyCode::PageUp => {
            app.scroll_preview_up(5);
            EventResult::NeedsRedraw
        }

        // Story actions
        KeyCode::Char('c') => EventResult::Dispatch(Action::SubmitWords(app.seed_words())),
        KeyCode::Char('g') => step_action(app, Action::GenerateStep),
        KeyCode::Char('f') => step_action(app, Action::FinishStep),
        KeyCode::Char('u') => step_action(app, Action::UnlockStep),
        KeyCode::Char('p') => EventResult::Dispatch(Action::Polish),
        _ => EventResult::Continue,
    }
}

fn step_action(app: &mut App, make: fn(usize) -> Action) -> EventResult {
    match app.selected_step() {
        Some(index) => EventResult::Dispatch(make(index)),
        None => {
            app.set_status("이야기 칸을 먼저 골라 주세요.");
            EventResult::NeedsRedraw
        }
    }
}

/// Handle keys in INSERT mode (editing the selected field)
fn handle_insert_mode(app: &mut App, key: KeyEvent) -> EventResult {
    match key.code {
        KeyCode::Esc => {
            app.cancel_edit();
            EventResult::NeedsRedraw
        }
        KeyCode::Enter => match app.commit_edit() {
            Some(action) => EventResult::Dispatch(action),
            None => EventResult::NeedsRedraw,
        },
        _ => {
            edit_buffer(app, key);
            EventResult::NeedsRedraw
        }
    }
}

/// Handle keys in COMMAND mode (: commands)
fn handle_command_mode(app: &mut App, key: KeyEvent) -> EventResult {
    match key.code {
        KeyCode::Esc => {
            app.enter_normal_mode();
            EventResult::NeedsRedraw
        }
        KeyCode::Enter => {
            let command = app.submit_command();
            execute_command(app, &command)
        }
        KeyCode::Backspace if app.input_buffer() == ":" => {
            app.enter_normal_mode();
            EventResult::NeedsRedraw
        }
        _ => {
            edit_buffer(app, key);
            EventResult::NeedsRedraw
        }
    }
}

fn edit_buffer(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char(c) => app.type_char(c),
        KeyCode::Backspace => app.backspace(),
        KeyCode::Delete => app.delete(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),
        _ => {}
    }
}

/// Execute a : command
fn execute_command(app: &mut App, command: &str) -> EventResult {
    let mut parts = command.split_whitespace();
    match parts.next() {
        Some("q") | Some("quit") => EventResult::Quit,
        Some("w") | Some("write") => {
            let dir = parts.next().map(PathBuf::from);
            EventResult::Dispatch(Action::Export(dir))
        }
        Some("new") => EventResult::Dispatch(Action::Reset),
        Some("help") => {
            app.toggle_help();
            EventResult::NeedsRedraw
        }
        Some(other) => {
            app.set_status(format!("Unknown command: {other}"));
            EventResult::NeedsRedraw
        }
        None => EventResult::NeedsRedraw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Field;
    use std::sync::Arc;
    use story_core::{ScriptedGenerator, SeedWords, StorySession, StoryWriter};

    fn app() -> App {
        let writer = StoryWriter::new(Arc::new(ScriptedGenerator::new()));
        App::new(StorySession::new(writer))
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_str(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_event(app, key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app();
        assert_eq!(handle_event(&mut app, key(KeyCode::Char('q'))), EventResult::Quit);
        let ctrl_c = Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(handle_event(&mut app, ctrl_c), EventResult::Quit);
    }

    #[test]
    fn test_make_character_from_typed_words() {
        let mut app = app();
        let words = ["토끼", "별", "바다"];
        for _ in 0..4 {
            handle_event(&mut app, key(KeyCode::Char('j')));
        }
        for word in words {
            handle_event(&mut app, key(KeyCode::Char('i')));
            type_str(&mut app, word);
            handle_event(&mut app, key(KeyCode::Enter));
            handle_event(&mut app, key(KeyCode::Char('j')));
        }

        assert_eq!(
            handle_event(&mut app, key(KeyCode::Char('c'))),
            EventResult::Dispatch(Action::SubmitWords(SeedWords::new("토끼", "별", "바다")))
        );
    }

    #[test]
    fn test_step_hotkeys_need_step_row() {
        let mut app = app();
        assert_eq!(
            handle_event(&mut app, key(KeyCode::Char('g'))),
            EventResult::NeedsRedraw
        );

        app.selected = app.fields.iter().position(|f| *f == Field::Step(3)).unwrap();
        assert_eq!(
            handle_event(&mut app, key(KeyCode::Char('g'))),
            EventResult::Dispatch(Action::GenerateStep(3))
        );
        assert_eq!(
            handle_event(&mut app, key(KeyCode::Char('f'))),
            EventResult::Dispatch(Action::FinishStep(3))
        );
        assert_eq!(
            handle_event(&mut app, key(KeyCode::Char('u'))),
            EventResult::Dispatch(Action::UnlockStep(3))
        );
    }

    #[test]
    fn test_insert_escape_discards() {
        let mut app = app();
        handle_event(&mut app, key(KeyCode::Char('i')));
        type_str(&mut app, "3-2");
        handle_event(&mut app, key(KeyCode::Esc));
        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.session.student().classroom, "");
    }

    #[test]
    fn test_commands() {
        let mut app = app();
        handle_event(&mut app, key(KeyCode::Char(':')));
        type_str(&mut app, "w stories");
        assert_eq!(
            handle_event(&mut app, key(KeyCode::Enter)),
            EventResult::Dispatch(Action::Export(Some(PathBuf::from("stories"))))
        );

        handle_event(&mut app, key(KeyCode::Char(':')));
        type_str(&mut app, "new");
        assert_eq!(
            handle_event(&mut app, key(KeyCode::Enter)),
            EventResult::Dispatch(Action::Reset)
        );

        handle_event(&mut app, key(KeyCode::Char(':')));
        type_str(&mut app, "bogus");
        assert_eq!(
            handle_event(&mut app, key(KeyCode::Enter)),
            EventResult::NeedsRedraw
        );
        assert_eq!(app.status_message(), Some("Unknown command: bogus"));
    }

    #[test]
    fn test_help_overlay_swallows_keys() {
        let mut app = app();
        handle_event(&mut app, key(KeyCode::Char('?')));
        assert!(app.show_help);
        assert_eq!(
            handle_event(&mut app, key(KeyCode::Char('g'))),
            EventResult::NeedsRedraw
        );
        handle_event(&mut app, key(KeyCode::Esc));
        assert!(!app.show_help);
    }
}
