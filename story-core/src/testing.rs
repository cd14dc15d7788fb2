//! Testing utilities for story sessions.
//!
//! This module provides tools for integration testing:
//! - `ScriptedGenerator` for deterministic testing without API calls
//! - `TestHarness` for scripted classroom scenarios
//! - Assertion helpers for verifying session state

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::Result;
use crate::filter::SeedWords;
use crate::generator::{Completion, GenerationError, GenerationRequest, StoryWriter, TextGenerator};
use crate::session::{Action, Outcome, StorySession};
use crate::template::StoryTemplate;

/// A generator that replays scripted completions in order and records
/// every request it receives.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<std::result::Result<Completion, GenerationError>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.queue_text(text);
        self
    }

    pub fn with_completion(self, completion: Completion) -> Self {
        self.queue(Ok(completion));
        self
    }

    pub fn with_error(self, message: impl Into<String>) -> Self {
        self.queue_error(message);
        self
    }

    pub fn queue_text(&self, text: impl Into<String>) {
        self.queue(Ok(Completion::text(text)));
    }

    pub fn queue_error(&self, message: impl Into<String>) {
        self.queue(Err(GenerationError::new(message)));
    }

    fn queue(&self, entry: std::result::Result<Completion, GenerationError>) {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(entry);
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Prompt of the most recent request.
    pub fn last_prompt(&self) -> Option<String> {
        self.requests().pop().map(|r| r.prompt)
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> std::result::Result<Completion, GenerationError> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);

        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::new("no more scripted responses")))
    }
}

/// Test harness for running classroom scenarios.
pub struct TestHarness {
    /// The scripted generator behind the session.
    pub generator: Arc<ScriptedGenerator>,
    /// The session under test.
    pub session: StorySession,
}

impl TestHarness {
    /// Create a harness with the classroom template.
    pub fn new() -> Self {
        Self::with_template(StoryTemplate::classroom())
    }

    pub fn with_template(template: StoryTemplate) -> Self {
        let generator = Arc::new(ScriptedGenerator::new());
        let session =
            StorySession::new(StoryWriter::new(generator.clone())).with_template(template);
        Self { generator, session }
    }

    /// Queue a completion for the next generation call.
    pub fn expect_text(&mut self, text: impl Into<String>) -> &mut Self {
        self.generator.queue_text(text);
        self
    }

    /// Queue a service failure for the next generation call.
    pub fn expect_error(&mut self, message: impl Into<String>) -> &mut Self {
        self.generator.queue_error(message);
        self
    }

    pub async fn submit_words(&mut self, a: &str, b: &str, c: &str) -> Result<Outcome> {
        self.session
            .dispatch(Action::SubmitWords(SeedWords::new(a, b, c)))
            .await
    }

    pub async fn generate(&mut self, index: usize) -> Result<Outcome> {
        self.session.dispatch(Action::GenerateStep(index)).await
    }

    pub async fn write(&mut self, index: usize, text: &str) -> Result<Outcome> {
        self.session
            .dispatch(Action::WriteStep {
                index,
                text: text.to_string(),
            })
            .await
    }

    pub fn step_text(&self, index: usize) -> &str {
        self.session
            .step(index)
            .map(|s| s.text.as_str())
            .unwrap_or("")
    }

    /// Prompts sent so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.generator
            .requests()
            .into_iter()
            .map(|r| r.prompt)
            .collect()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Assertion Helpers
// ============================================================================

/// Assert that a slot holds exactly `expected`.
#[track_caller]
pub fn assert_step_text(harness: &TestHarness, index: usize, expected: &str) {
    let actual = harness.step_text(index);
    assert_eq!(
        actual, expected,
        "Expected step {index} to be '{expected}', got '{actual}'"
    );
}

/// Assert the lock flag of a slot.
#[track_caller]
pub fn assert_locked(harness: &TestHarness, index: usize, locked: bool) {
    let actual = harness.session.step(index).map(|s| s.locked);
    assert_eq!(
        actual,
        Some(locked),
        "Expected step {index} locked = {locked}, got {actual:?}"
    );
}

/// Assert that the most recent prompt contains `needle`.
#[track_caller]
pub fn assert_last_prompt_contains(harness: &TestHarness, needle: &str) {
    let prompt = harness.generator.last_prompt().unwrap_or_default();
    assert!(
        prompt.contains(needle),
        "Expected last prompt to contain '{needle}', got:\n{prompt}"
    );
}

/// Assert that no assembled story is shown yet.
#[track_caller]
pub fn assert_no_story(harness: &TestHarness) {
    assert!(
        harness.session.assembled_story().is_none(),
        "Expected no assembled story"
    );
}
