//! The text-generation seam and the writer that drives it.
//!
//! [`TextGenerator`] is the only thing the story logic knows about the
//! model. The production implementation wraps [`openai::OpenAi`]; tests use
//! [`crate::testing::ScriptedGenerator`].

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::error::StoryError;
use crate::export::AssembledStory;
use crate::filter::SeedWords;
use crate::postprocess::Postprocessor;
use crate::prompt::{character_prompt, polish_prompt, PromptSettings, StepPrompt};
use crate::template::StoryTemplate;

/// Failure at the generation boundary. The message is shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct GenerationError {
    pub message: String,
}

impl GenerationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<openai::Error> for GenerationError {
    fn from(err: openai::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// A single completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub max_output_tokens: usize,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, max_output_tokens: usize) -> Self {
        Self {
            prompt: prompt.into(),
            max_output_tokens,
        }
    }
}

/// What came back: the convenience text field and the first structured
/// text part, either of which may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    pub primary: String,
    pub secondary: Option<String>,
}

impl Completion {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            primary: text.into(),
            secondary: None,
        }
    }

    /// Trimmed primary text, or the secondary field when the primary is empty.
    pub fn best_text(&self) -> Option<&str> {
        let primary = self.primary.trim();
        if !primary.is_empty() {
            return Some(primary);
        }
        self.secondary
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<Completion, GenerationError>;
}

#[async_trait]
impl TextGenerator for openai::OpenAi {
    async fn generate(&self, request: GenerationRequest) -> Result<Completion, GenerationError> {
        let api_request =
            openai::Request::new(request.prompt).with_max_output_tokens(request.max_output_tokens);
        let response = self.complete(api_request).await?;

        Ok(Completion {
            primary: response.output_text().to_string(),
            secondary: response.first_output_text().map(str::to_string),
        })
    }
}

/// Output caps for each kind of call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenLimits {
    pub character: usize,
    pub step: usize,
    pub polish: usize,
}

impl Default for TokenLimits {
    fn default() -> Self {
        Self {
            character: 300,
            step: 400,
            polish: 1500,
        }
    }
}

/// Builds prompts, calls the generator and cleans up the results.
#[derive(Clone)]
pub struct StoryWriter {
    generator: Arc<dyn TextGenerator>,
    settings: PromptSettings,
    postprocessor: Postprocessor,
    limits: TokenLimits,
}

impl StoryWriter {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            settings: PromptSettings::default(),
            postprocessor: Postprocessor::default(),
            limits: TokenLimits::default(),
        }
    }

    pub fn with_settings(mut self, settings: PromptSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_postprocessor(mut self, postprocessor: Postprocessor) -> Self {
        self.postprocessor = postprocessor;
        self
    }

    pub fn with_limits(mut self, limits: TokenLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn settings(&self) -> &PromptSettings {
        &self.settings
    }

    pub fn postprocessor(&self) -> &Postprocessor {
        &self.postprocessor
    }

    async fn call(&self, prompt: String, max_output_tokens: usize) -> Result<Completion, StoryError> {
        tracing::debug!(prompt_chars = prompt.chars().count(), max_output_tokens, "sending generation request");
        self.generator
            .generate(GenerationRequest::new(prompt, max_output_tokens))
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "generation service failed");
                StoryError::Service(e.message)
            })
    }

    /// Generate the protagonist profile from accepted seed words.
    pub async fn character(&self, words: &SeedWords) -> Result<String, StoryError> {
        tracing::info!("generating character profile");
        let completion = self.call(character_prompt(words), self.limits.character).await?;
        completion.best_text().map(str::to_string).ok_or_else(|| {
            tracing::warn!("character generation returned no text");
            StoryError::EmptyGeneration
        })
    }

    /// Generate and clean up the paragraph for slot `index`.
    pub async fn step(
        &self,
        index: usize,
        template: &StoryTemplate,
        profile: &str,
        prior_context: &str,
    ) -> Result<String, StoryError> {
        let title = template
            .title(index)
            .ok_or(StoryError::StepOutOfRange(index))?;

        tracing::info!(step = index, title, "generating story step");
        let prompt = StepPrompt::new(title)
            .with_profile(profile)
            .with_context(prior_context)
            .with_next_title(template.next_title(index))
            .render(&self.settings);

        let completion = self.call(prompt, self.limits.step).await?;
        let paragraph = completion
            .best_text()
            .and_then(|raw| self.postprocessor.finish(raw, title));

        match paragraph {
            Some(text) => {
                tracing::info!(step = index, chars = text.chars().count(), "story step generated");
                Ok(text)
            }
            None => {
                tracing::warn!(step = index, "generation left no usable text");
                Err(StoryError::EmptyGeneration)
            }
        }
    }

    /// Smooth the whole story. Falls back to the plain concatenation on any
    /// failure.
    pub async fn polish(&self, story: &AssembledStory) -> String {
        let fallback = story.to_plain_text();
        match self.call(polish_prompt(story), self.limits.polish).await {
            Ok(completion) => match completion.best_text() {
                Some(text) => text.to_string(),
                None => {
                    tracing::warn!("polish returned no text, using unpolished story");
                    fallback
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "polish failed, using unpolished story");
                fallback
            }
        }
    }
}

impl std::fmt::Debug for StoryWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoryWriter")
            .field("settings", &self.settings)
            .field("postprocessor", &self.postprocessor)
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::Section;
    use crate::testing::ScriptedGenerator;

    fn writer(generator: &Arc<ScriptedGenerator>) -> StoryWriter {
        StoryWriter::new(generator.clone())
    }

    #[test]
    fn test_completion_best_text() {
        assert_eq!(Completion::text("  hi ").best_text(), Some("hi"));
        let fallback = Completion {
            primary: "   ".into(),
            secondary: Some(" there ".into()),
        };
        assert_eq!(fallback.best_text(), Some("there"));
        assert_eq!(Completion::default().best_text(), None);
    }

    #[test]
    fn test_generation_error_from_openai() {
        let err: GenerationError = openai::Error::Api {
            status: 429,
            message: "quota".into(),
        }
        .into();
        assert!(err.message.contains("429"));
        assert!(err.message.contains("quota"));
    }

    #[tokio::test]
    async fn test_character_uses_cap_and_prompt() {
        let generator = Arc::new(ScriptedGenerator::new().with_text("하늘이는 토끼예요."));
        let profile = writer(&generator)
            .character(&SeedWords::new("토끼", "별", "바다"))
            .await
            .unwrap();

        assert_eq!(profile, "하늘이는 토끼예요.");
        let requests = generator.requests();
        assert_eq!(requests[0].max_output_tokens, 300);
        assert!(requests[0].prompt.contains("'토끼', '별', '바다'"));
    }

    #[tokio::test]
    async fn test_custom_limits_reach_requests() {
        let generator = Arc::new(
            ScriptedGenerator::new()
                .with_text("하늘이는 토끼예요.")
                .with_text("토끼가 뛰었어요."),
        );
        let writer = writer(&generator).with_limits(TokenLimits {
            character: 120,
            step: 250,
            polish: 2000,
        });
        writer
            .character(&SeedWords::new("토끼", "별", "바다"))
            .await
            .unwrap();
        writer
            .step(1, &StoryTemplate::classroom(), "", "")
            .await
            .unwrap();

        let caps: Vec<usize> = generator
            .requests()
            .iter()
            .map(|r| r.max_output_tokens)
            .collect();
        assert_eq!(caps, vec![120, 250]);
    }

    #[tokio::test]
    async fn test_step_postprocesses() {
        let generator =
            Arc::new(ScriptedGenerator::new().with_text("토끼는 놀랐어요. 다음 이야기가 궁금해요!"));
        let text = writer(&generator)
            .step(2, &StoryTemplate::classroom(), "토끼", "옛날에 토끼가 살았어요.")
            .await
            .unwrap();

        assert_eq!(text, "그러던 어느 날 토끼는 놀랐어요.");
        let request = &generator.requests()[0];
        assert_eq!(request.max_output_tokens, 400);
        assert!(request.prompt.contains("다음 장면은 '그래서'로 시작해요."));
    }

    #[tokio::test]
    async fn test_step_uses_secondary_field() {
        let generator = Arc::new(ScriptedGenerator::new().with_completion(Completion {
            primary: String::new(),
            secondary: Some("토끼가 뛰었어요.".into()),
        }));
        let text = writer(&generator)
            .step(3, &StoryTemplate::classroom(), "", "")
            .await
            .unwrap();
        assert_eq!(text, "그래서 토끼가 뛰었어요.");
    }

    #[tokio::test]
    async fn test_step_empty_generation() {
        let generator = Arc::new(ScriptedGenerator::new().with_text("   "));
        let err = writer(&generator)
            .step(1, &StoryTemplate::classroom(), "", "")
            .await
            .unwrap_err();
        assert!(matches!(err, StoryError::EmptyGeneration));
    }

    #[tokio::test]
    async fn test_step_service_error() {
        let generator = Arc::new(ScriptedGenerator::new().with_error("rate limited"));
        let err = writer(&generator)
            .step(1, &StoryTemplate::classroom(), "", "")
            .await
            .unwrap_err();
        assert!(matches!(err, StoryError::Service(ref m) if m == "rate limited"));
    }

    #[tokio::test]
    async fn test_step_out_of_range() {
        let generator = Arc::new(ScriptedGenerator::new());
        let err = writer(&generator)
            .step(8, &StoryTemplate::classroom(), "", "")
            .await
            .unwrap_err();
        assert!(matches!(err, StoryError::StepOutOfRange(8)));
        assert!(generator.requests().is_empty());
    }

    #[tokio::test]
    async fn test_polish_falls_back() {
        let story = AssembledStory::new(vec![Section {
            title: "옛날에".into(),
            text: "옛날에 토끼가 살았어요.".into(),
        }]);

        let failing = Arc::new(ScriptedGenerator::new().with_error("down"));
        assert_eq!(writer(&failing).polish(&story).await, story.to_plain_text());

        let working = Arc::new(ScriptedGenerator::new().with_text("매끄러운 이야기"));
        assert_eq!(writer(&working).polish(&story).await, "매끄러운 이야기");
        assert_eq!(working.requests()[0].max_output_tokens, 1500);
    }
}
