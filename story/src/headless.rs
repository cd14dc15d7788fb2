//! Headless mode for the story writer.
//!
//! This module provides a simple text-based interface for running a
//! session without a TUI. It's designed for automated testing and scripts.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use story_core::{Action, SeedWords, StorySession, StudentInfo, MAX_WORD_CHARS};

/// One parsed protocol line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Dispatch(Action),
    Show,
    Help,
    Quit,
}

const HELP: &[&str] = &[
    "  #words <a> <b> <c>                  - Make the character from three words",
    "  #gen <n>                            - Let the AI write step n",
    "  #write <n> <text>                   - Write step n yourself",
    "  #finish <n> / #unlock <n>           - Lock or unlock step n",
    "  #student <class> <team> <no> <name> - Set student info (use - for blank)",
    "  #show                               - Show the character and story",
    "  #polish                             - Smooth the whole story",
    "  #export [dir]                       - Save the story file",
    "  #new                                - Start a new story",
    "  #help                               - Show this help",
    "  #quit                               - Exit",
];

/// Parse a `#`-command. Step numbers are 1-based on the wire.
pub fn parse_command(line: &str) -> Result<Command, String> {
    let body = line
        .strip_prefix('#')
        .ok_or_else(|| "Commands start with #. Type #help for help.".to_string())?;
    let (name, rest) = match body.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (body, ""),
    };

    let step = |arg: &str| -> Result<usize, String> {
        match arg.parse::<usize>() {
            Ok(n) if n >= 1 => Ok(n - 1),
            _ => Err(format!("Invalid step number: {arg}")),
        }
    };

    let command = match name {
        "quit" | "exit" => Command::Quit,
        "help" => Command::Help,
        "show" | "status" => Command::Show,
        "polish" => Command::Dispatch(Action::Polish),
        "new" => Command::Dispatch(Action::Reset),
        "export" => {
            let dir = (!rest.is_empty()).then(|| PathBuf::from(rest));
            Command::Dispatch(Action::Export(dir))
        }
        "words" => {
            let words: Vec<&str> = rest.split_whitespace().collect();
            if let Some(long) = words.iter().find(|w| w.chars().count() > MAX_WORD_CHARS) {
                return Err(format!(
                    "Each word can be at most {MAX_WORD_CHARS} characters: {long}"
                ));
            }
            let get = |i: usize| words.get(i).copied().unwrap_or("");
            Command::Dispatch(Action::SubmitWords(SeedWords::new(get(0), get(1), get(2))))
        }
        "gen" | "generate" => Command::Dispatch(Action::GenerateStep(step(rest)?)),
        "finish" => Command::Dispatch(Action::FinishStep(step(rest)?)),
        "unlock" => Command::Dispatch(Action::UnlockStep(step(rest)?)),
        "write" => {
            let (n, text) = rest
                .split_once(char::is_whitespace)
                .ok_or_else(|| "Usage: #write <n> <text>".to_string())?;
            Command::Dispatch(Action::WriteStep {
                index: step(n)?,
                text: text.trim().to_string(),
            })
        }
        "student" => {
            let fields: Vec<&str> = rest.split_whitespace().collect();
            let get = |i: usize| match fields.get(i).copied() {
                Some("-") | None => String::new(),
                Some(f) => f.to_string(),
            };
            Command::Dispatch(Action::SetStudent(StudentInfo::new(
                get(0),
                get(1),
                get(2),
                get(3),
            )))
        }
        other => return Err(format!("Unknown command: #{other}. Type #help for help.")),
    };
    Ok(command)
}

/// Run the session in headless mode.
///
/// Lines starting with `#` are commands; anything else is rejected with a
/// hint. Results are printed with a bracketed tag.
pub async fn run_headless(mut session: StorySession) -> io::Result<()> {
    println!("=== Story Headless Mode ===");
    println!("Steps:");
    for (i, step) in session.steps().iter().enumerate() {
        let who = if step.is_generated() { "AI" } else { "student" };
        println!("  {}. {} ({who})", i + 1, step.title);
    }
    println!();
    println!("Commands:");
    for line in HELP {
        println!("{line}");
    }
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Error reading input: {e}");
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parse_command(line) {
            Ok(Command::Quit) => {
                println!("Goodbye!");
                break;
            }
            Ok(Command::Help) => {
                println!("[HELP]");
                for line in HELP {
                    println!("{line}");
                }
            }
            Ok(Command::Show) => print_story(&session),
            Ok(Command::Dispatch(action)) => {
                print!("[PROCESSING]");
                stdout.flush().ok();
                let result = session.dispatch(action).await;
                print!("\r            \r");

                match result {
                    Ok(outcome) => {
                        println!("[OK] {outcome}");
                        if let Some(text) = latest_text(&session, &outcome) {
                            println!("{text}");
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "headless action failed");
                        println!("[ERROR] {e}");
                    }
                }
            }
            Err(message) => println!("[ERROR] {message}"),
        }
        stdout.flush().ok();
    }

    Ok(())
}

/// Text worth echoing after an outcome.
fn latest_text<'a>(session: &'a StorySession, outcome: &story_core::Outcome) -> Option<&'a str> {
    use story_core::Outcome;
    match outcome {
        Outcome::CharacterCreated => Some(session.character()),
        Outcome::StepGenerated(i) => session.step(*i).map(|s| s.text.as_str()),
        Outcome::Polished => session.polished(),
        _ => None,
    }
}

fn print_story(session: &StorySession) {
    let progress = session.progress();
    println!("[STATUS] {}/{} steps written", progress.completed, progress.total);
    if !session.character().is_empty() {
        println!("[CHARACTER]");
        println!("{}", session.character());
    }
    for (i, step) in session.steps().iter().enumerate() {
        let lock = if step.locked { " (finished)" } else { "" };
        println!("  {}. {}{lock}: {}", i + 1, step.title, step.text);
    }
    match session.assembled_story() {
        Some(story) => {
            println!("[STORY]");
            println!("{}", story.to_markdown());
        }
        None => println!("[STORY] (empty)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_words() {
        assert_eq!(
            parse_command("#words 토끼 별 바다"),
            Ok(Command::Dispatch(Action::SubmitWords(SeedWords::new("토끼", "별", "바다"))))
        );
        // Missing words reach the validator as blanks.
        assert_eq!(
            parse_command("#words 토끼"),
            Ok(Command::Dispatch(Action::SubmitWords(SeedWords::new("토끼", "", ""))))
        );
    }

    #[test]
    fn test_parse_words_length_limit() {
        let long = "가나다라마바사아자차카타파하";
        let err = parse_command(&format!("#words {long} 별 바다")).unwrap_err();
        assert!(err.contains(long));

        let exact: String = long.chars().take(MAX_WORD_CHARS).collect();
        assert_eq!(
            parse_command(&format!("#words {exact} 별 바다")),
            Ok(Command::Dispatch(Action::SubmitWords(SeedWords::new(
                exact.as_str(),
                "별",
                "바다"
            ))))
        );
    }

    #[test]
    fn test_parse_steps_are_one_based() {
        assert_eq!(
            parse_command("#gen 2"),
            Ok(Command::Dispatch(Action::GenerateStep(1)))
        );
        assert_eq!(
            parse_command("#finish 8"),
            Ok(Command::Dispatch(Action::FinishStep(7)))
        );
        assert!(parse_command("#gen 0").is_err());
        assert!(parse_command("#unlock x").is_err());
    }

    #[test]
    fn test_parse_write_keeps_spaces() {
        assert_eq!(
            parse_command("#write 1 옛날에 토끼가 살았어요."),
            Ok(Command::Dispatch(Action::WriteStep {
                index: 0,
                text: "옛날에 토끼가 살았어요.".into()
            }))
        );
        assert!(parse_command("#write 1").is_err());
    }

    #[test]
    fn test_parse_student() {
        assert_eq!(
            parse_command("#student 3-2 - 7 하늘"),
            Ok(Command::Dispatch(Action::SetStudent(StudentInfo::new(
                "3-2", "", "7", "하늘"
            ))))
        );
    }

    #[test]
    fn test_parse_misc() {
        assert_eq!(parse_command("#quit"), Ok(Command::Quit));
        assert_eq!(parse_command("#show"), Ok(Command::Show));
        assert_eq!(
            parse_command("#export out/dir"),
            Ok(Command::Dispatch(Action::Export(Some(PathBuf::from("out/dir")))))
        );
        assert_eq!(
            parse_command("#export"),
            Ok(Command::Dispatch(Action::Export(None)))
        );
        assert!(parse_command("hello").is_err());
        assert!(parse_command("#dance").is_err());
    }
}
