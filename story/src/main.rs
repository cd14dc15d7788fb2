//! Classroom story writer TUI.
//!
//! A vim-style terminal form where a student and an AI take turns writing
//! an eight-step story.
//!
//! # Headless Mode
//!
//! Run with `--headless` for a line-based interface suitable for scripts:
//!
//! ```bash
//! cargo run -p story -- --headless
//! ```

mod app;
mod events;
mod headless;
mod ui;

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::File;
use std::io::{self, stdout};
use std::sync::Mutex;
use std::time::Duration;
use story_core::{StoryConfig, StoryError, StorySession};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use app::App;
use events::{handle_event, EventResult};
use ui::render::render;

const LOG_FILE: &str = "story.log";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    let headless = args.iter().any(|a| a == "--headless");
    init_tracing(headless)?;

    // Configuration problems are fatal before any UI is shown
    let session = match start_session() {
        Ok(session) => session,
        Err(e) => {
            tracing::error!(error = %e, "startup failed");
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    if headless {
        return headless::run_headless(session).await.map_err(|e| e.into());
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, App::new(session)).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;

    if let Err(e) = result {
        eprintln!("Error: {e}");
    }

    Ok(())
}

fn start_session() -> Result<StorySession, StoryError> {
    let config = StoryConfig::from_env()?;
    let session = StorySession::from_config(&config)?;
    tracing::info!(model = %config.model, template = ?config.template, "session ready");
    Ok(session)
}

/// Install the subscriber. The TUI owns the screen, so it logs to a file.
fn init_tracing(headless: bool) -> io::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("story=info,story_core=info"));

    if headless {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(io::stderr))
            .init();
    } else {
        let file = File::create(LOG_FILE)?;
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .init();
    }
    Ok(())
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| render(f, &app))?;

        // Poll for events with a timeout so the loop stays responsive
        if event::poll(Duration::from_millis(100))? {
            let ev = event::read()?;

            match handle_event(&mut app, ev) {
                EventResult::Quit => return Ok(()),
                EventResult::Dispatch(action) => {
                    // Show the busy line before the request blocks the loop
                    app.busy = true;
                    app.set_status(App::busy_message(&action));
                    terminal.draw(|f| render(f, &app))?;

                    let result = app.session.dispatch(action).await;
                    app.finish_action(result);
                }
                EventResult::NeedsRedraw | EventResult::Continue => {}
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn print_help() {
    println!("story - write a story together with an AI, one step at a time");
    println!();
    println!("USAGE:");
    println!("  story [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("  -h, --help       Show this help message");
    println!("  --headless       Run in headless mode (text-only, no TUI)");
    println!();
    println!("ENVIRONMENT:");
    println!("  OPENAI_API_KEY       API key (required)");
    println!("  OPENAI_MODEL         Model name (default: gpt-4o-mini)");
    println!("  OPENAI_BASE_URL      Alternative API endpoint");
    println!("  STORY_TEMPLATE       classroom | ai-first");
    println!("  STORY_LENGTH         sentences | characters");
    println!("  STORY_META_STRATEGY  drop-sentence | truncate");
    println!("  STORY_FILTER_FILE    JSON file with banned_patterns / meta_phrases");
    println!("  STORY_CHARACTER_TOKENS / STORY_STEP_TOKENS / STORY_POLISH_TOKENS");
    println!("                       Output token caps (default: 300 / 400 / 1500)");
    println!("  STORY_EXPORT_DIR     Where exported stories go (default: .)");
    println!("  RUST_LOG             Log filter (TUI logs go to {LOG_FILE})");
    println!();
    println!("EXAMPLES:");
    println!("  story                # Interactive TUI mode");
    println!("  story --headless     # Line-based mode for scripts");
}
