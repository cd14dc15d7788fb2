//! Classroom story co-authoring with an AI partner.
//!
//! This crate provides:
//! - A denylist content filter for the three seed words
//! - An eight-step story template with AI and student slots
//! - Prompt construction and post-processing for generated paragraphs
//! - A per-student session with one handler per user action
//! - Story export to a plain-text file
//!
//! # Quick Start
//!
//! ```ignore
//! use story_core::{Action, SeedWords, StoryConfig, StorySession};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     dotenvy::dotenv().ok();
//!     let config = StoryConfig::from_env()?;
//!     let mut session = StorySession::from_config(&config)?;
//!
//!     session
//!         .dispatch(Action::SubmitWords(SeedWords::new("토끼", "별", "바다")))
//!         .await?;
//!     session.dispatch(Action::GenerateStep(1)).await?;
//!
//!     if let Some(story) = session.assembled_story() {
//!         println!("{}", story.to_markdown());
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod filter;
pub mod generator;
pub mod postprocess;
pub mod prompt;
pub mod session;
pub mod template;
pub mod testing;

// Primary public API
pub use config::{ConfigError, StoryConfig, TemplateKind};
pub use error::{Result, StoryError};
pub use export::{export_filename, AssembledStory, Section, StudentInfo};
pub use filter::{ContentFilter, Rejection, SeedWords, MAX_WORD_CHARS};
pub use generator::{
    Completion, GenerationError, GenerationRequest, StoryWriter, TextGenerator, TokenLimits,
};
pub use postprocess::{MetaPhraseStrategy, Postprocessor};
pub use prompt::LengthCap;
pub use session::{Action, Outcome, Progress, StorySession, StoryStep};
pub use template::{Authorship, StepDefinition, StoryTemplate};
pub use testing::{ScriptedGenerator, TestHarness};
