//! Startup configuration read from the environment.
//!
//! The binary loads `.env` with `dotenvy` before calling
//! [`StoryConfig::from_env`]. Parsing goes through [`StoryConfig::from_lookup`]
//! so it can be tested without touching the process environment.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::filter::{ContentFilter, FilterError, DEFAULT_BANNED_PATTERNS};
use crate::generator::{StoryWriter, TextGenerator, TokenLimits};
use crate::postprocess::{MetaPhraseFilter, MetaPhraseStrategy, Postprocessor, DEFAULT_META_PHRASES};
use crate::prompt::{LengthCap, PromptSettings, DEFAULT_FORBIDDEN_WORDS};
use crate::template::StoryTemplate;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Configuration problems. All of them stop the program before the form
/// is shown.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("OPENAI_API_KEY가 설정되지 않았어요. .env 파일이나 환경 변수에 API 키를 넣어 주세요.")]
    MissingApiKey,

    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },

    #[error("cannot read filter file {path}: {message}")]
    FilterFile { path: PathBuf, message: String },

    #[error(transparent)]
    Filter(#[from] FilterError),
}

/// Which slots the AI writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TemplateKind {
    #[default]
    Classroom,
    AiFirst,
}

impl TemplateKind {
    pub fn template(self) -> StoryTemplate {
        match self {
            Self::Classroom => StoryTemplate::classroom(),
            Self::AiFirst => StoryTemplate::ai_first(),
        }
    }
}

impl std::str::FromStr for TemplateKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "classroom" => Ok(Self::Classroom),
            "ai-first" | "ai_first" => Ok(Self::AiFirst),
            other => Err(format!("unknown template: {other}")),
        }
    }
}

/// JSON shape of `STORY_FILTER_FILE`. Missing keys keep the defaults.
#[derive(Debug, Default, Deserialize)]
struct FilterFile {
    #[serde(default)]
    banned_patterns: Option<Vec<String>>,
    #[serde(default)]
    meta_phrases: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct StoryConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: Option<String>,
    pub template: TemplateKind,
    pub length: LengthCap,
    pub meta_strategy: MetaPhraseStrategy,
    pub banned_patterns: Vec<String>,
    pub meta_phrases: Vec<String>,
    /// Words the step prompt tells the model to avoid.
    pub forbidden_words: Vec<String>,
    pub limits: TokenLimits,
    pub export_dir: PathBuf,
}

impl StoryConfig {
    /// Defaults for everything except the key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: None,
            template: TemplateKind::default(),
            length: LengthCap::default(),
            meta_strategy: MetaPhraseStrategy::default(),
            banned_patterns: DEFAULT_BANNED_PATTERNS.iter().map(|p| p.to_string()).collect(),
            meta_phrases: DEFAULT_META_PHRASES.iter().map(|p| p.to_string()).collect(),
            forbidden_words: DEFAULT_FORBIDDEN_WORDS.iter().map(|w| w.to_string()).collect(),
            limits: TokenLimits::default(),
            export_dir: PathBuf::from("."),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = get("OPENAI_API_KEY").ok_or(ConfigError::MissingApiKey)?;
        let mut config = Self::new(api_key);

        if let Some(model) = get("OPENAI_MODEL") {
            config.model = model;
        }
        config.base_url = get("OPENAI_BASE_URL");

        if let Some(value) = get("STORY_TEMPLATE") {
            config.template = value.parse::<TemplateKind>().map_err(|message| ConfigError::InvalidValue {
                key: "STORY_TEMPLATE",
                message,
            })?;
        }
        if let Some(value) = get("STORY_LENGTH") {
            config.length = value.parse::<LengthCap>().map_err(|message| ConfigError::InvalidValue {
                key: "STORY_LENGTH",
                message,
            })?;
        }
        if let Some(value) = get("STORY_META_STRATEGY") {
            config.meta_strategy = value.parse::<MetaPhraseStrategy>().map_err(|message| ConfigError::InvalidValue {
                key: "STORY_META_STRATEGY",
                message,
            })?;
        }
        for (key, slot) in [
            ("STORY_CHARACTER_TOKENS", &mut config.limits.character),
            ("STORY_STEP_TOKENS", &mut config.limits.step),
            ("STORY_POLISH_TOKENS", &mut config.limits.polish),
        ] {
            if let Some(value) = get(key) {
                *slot = value
                    .parse::<usize>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| ConfigError::InvalidValue {
                        key,
                        message: format!("expected a positive token count, got {value}"),
                    })?;
            }
        }
        if let Some(dir) = get("STORY_EXPORT_DIR") {
            config.export_dir = PathBuf::from(dir);
        }
        if let Some(path) = get("STORY_FILTER_FILE") {
            config.apply_filter_file(Path::new(&path))?;
        }

        Ok(config)
    }

    /// Replace the denylists with the ones in a JSON file. A `meta_phrases`
    /// list drives both the prompt's forbidden words and the clean-up.
    pub fn apply_filter_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let read_error = |message: String| ConfigError::FilterFile {
            path: path.to_path_buf(),
            message,
        };
        let raw = std::fs::read_to_string(path).map_err(|e| read_error(e.to_string()))?;
        let file: FilterFile = serde_json::from_str(&raw).map_err(|e| read_error(e.to_string()))?;

        if let Some(patterns) = file.banned_patterns {
            self.banned_patterns = patterns;
        }
        if let Some(phrases) = file.meta_phrases {
            self.forbidden_words = phrases.clone();
            self.meta_phrases = phrases;
        }
        tracing::info!(
            path = %path.display(),
            banned = self.banned_patterns.len(),
            meta = self.meta_phrases.len(),
            "loaded filter file"
        );
        Ok(())
    }

    pub fn content_filter(&self) -> Result<ContentFilter, ConfigError> {
        Ok(ContentFilter::new(&self.banned_patterns)?)
    }

    pub fn postprocessor(&self) -> Postprocessor {
        Postprocessor {
            meta: MetaPhraseFilter::new(&self.meta_phrases, self.meta_strategy),
            ..Postprocessor::default()
        }
    }

    pub fn prompt_settings(&self) -> PromptSettings {
        PromptSettings {
            length: self.length,
            forbidden_words: self.forbidden_words.clone(),
            ..PromptSettings::default()
        }
    }

    pub fn client(&self) -> openai::OpenAi {
        let client = openai::OpenAi::new(&self.api_key).with_model(&self.model);
        match &self.base_url {
            Some(url) => client.with_base_url(url),
            None => client,
        }
    }

    /// A writer over `generator` with this configuration's prompt and
    /// clean-up settings.
    pub fn writer(&self, generator: Arc<dyn TextGenerator>) -> StoryWriter {
        StoryWriter::new(generator)
            .with_settings(self.prompt_settings())
            .with_postprocessor(self.postprocessor())
            .with_limits(self.limits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_api_key() {
        assert!(matches!(
            StoryConfig::from_lookup(lookup(&[])),
            Err(ConfigError::MissingApiKey)
        ));
        assert!(matches!(
            StoryConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "   ")])),
            Err(ConfigError::MissingApiKey)
        ));
    }

    #[test]
    fn test_defaults() {
        let config = StoryConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-test")])).unwrap();
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.template, TemplateKind::Classroom);
        assert_eq!(config.length, LengthCap::SENTENCES);
        assert_eq!(config.meta_strategy, MetaPhraseStrategy::DropSentence);
        assert_eq!(config.export_dir, PathBuf::from("."));
        assert_eq!(config.banned_patterns.len(), DEFAULT_BANNED_PATTERNS.len());
        assert_eq!(config.limits, TokenLimits::default());
        assert!(config.prompt_settings().forbidden_words.iter().any(|w| w == "계속"));
    }

    #[test]
    fn test_overrides() {
        let config = StoryConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_MODEL", "gpt-4o"),
            ("OPENAI_BASE_URL", "http://localhost:8080/v1"),
            ("STORY_TEMPLATE", "ai-first"),
            ("STORY_LENGTH", "characters"),
            ("STORY_META_STRATEGY", "truncate"),
            ("STORY_EXPORT_DIR", "/tmp/stories"),
            ("STORY_STEP_TOKENS", "250"),
            ("STORY_POLISH_TOKENS", "2000"),
        ]))
        .unwrap();

        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.base_url.as_deref(), Some("http://localhost:8080/v1"));
        assert_eq!(config.template.template().generated_positions(), vec![0, 2, 4]);
        assert_eq!(config.length, LengthCap::CHARACTERS);
        assert_eq!(config.postprocessor().meta.strategy(), MetaPhraseStrategy::Truncate);
        assert_eq!(config.export_dir, PathBuf::from("/tmp/stories"));
        assert_eq!(
            config.limits,
            TokenLimits {
                character: 300,
                step: 250,
                polish: 2000,
            }
        );
    }

    #[test]
    fn test_token_counts_must_be_positive() {
        for value in ["0", "many", "-5"] {
            let err = StoryConfig::from_lookup(lookup(&[
                ("OPENAI_API_KEY", "sk-test"),
                ("STORY_CHARACTER_TOKENS", value),
            ]))
            .unwrap_err();
            assert!(matches!(
                err,
                ConfigError::InvalidValue { key: "STORY_CHARACTER_TOKENS", .. }
            ));
        }
    }

    #[test]
    fn test_filter_file_meta_phrases_reach_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filter.json");
        std::fs::write(&path, r#"{ "meta_phrases": ["to be continued"] }"#).unwrap();

        let mut config = StoryConfig::new("sk-test");
        config.apply_filter_file(&path).unwrap();

        let expected = vec!["to be continued".to_string()];
        assert_eq!(config.prompt_settings().forbidden_words, expected);
        assert_eq!(config.postprocessor().meta.phrases(), expected.as_slice());
    }

    #[test]
    fn test_invalid_value() {
        let err = StoryConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("STORY_TEMPLATE", "random"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "STORY_TEMPLATE", .. }));
    }

    #[test]
    fn test_filter_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filter.json");
        std::fs::write(&path, r#"{ "banned_patterns": ["dragon"] }"#).unwrap();

        let config = StoryConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("STORY_FILTER_FILE", path.to_str().unwrap()),
        ]))
        .unwrap();

        assert_eq!(config.banned_patterns, vec!["dragon".to_string()]);
        assert_eq!(config.meta_phrases.len(), DEFAULT_META_PHRASES.len());
        let filter = config.content_filter().unwrap();
        assert!(filter.is_banned("Dragonfly"));
        assert!(!filter.is_banned("knife"));
    }

    #[test]
    fn test_filter_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "not json").unwrap();

        let mut config = StoryConfig::new("sk-test");
        assert!(matches!(
            config.apply_filter_file(&bad),
            Err(ConfigError::FilterFile { .. })
        ));
        assert!(matches!(
            config.apply_filter_file(&dir.path().join("missing.json")),
            Err(ConfigError::FilterFile { .. })
        ));
    }

    #[test]
    fn test_invalid_pattern_surfaces() {
        let mut config = StoryConfig::new("sk-test");
        config.banned_patterns = vec!["(".into()];
        assert!(matches!(config.content_filter(), Err(ConfigError::Filter(_))));
    }
}
