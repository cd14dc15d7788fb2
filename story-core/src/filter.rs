//! Content validation for the seed words that shape the protagonist.
//!
//! The filter is a denylist of regular-expression fragments compiled once
//! into a single case-insensitive alternation. Matching is substring-level:
//! a banned fragment anywhere inside a longer word rejects it.

use regex::{Regex, RegexBuilder};
use thiserror::Error;

/// Maximum length, in characters, of a single seed word in the input form.
pub const MAX_WORD_CHARS: usize = 12;

/// Default denylist: violence, weapons and sexual content in Korean and English.
pub const DEFAULT_BANNED_PATTERNS: &[&str] = &[
    r"살인", r"죽이", r"폭력", r"피바다", r"학대", r"총", r"칼", r"폭탄",
    r"kill", r"murder", r"gun", r"knife", r"blood", r"assault", r"bomb",
    r"성\s*행위", r"야동", r"포르노", r"음란", r"가슴", r"성기", r"자위",
    r"porn", r"sex", r"xxx", r"nude", r"naked",
];

/// Why a set of seed words was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// At least one of the three words is empty after trimming.
    #[error("단어 3개를 모두 입력해 주세요.")]
    MissingWord,

    /// A word contains a denylisted fragment.
    #[error("적절하지 않은 단어입니다. 다시 입력해 주세요.")]
    BannedContent { word: String },
}

/// Errors building a filter from configuration.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("invalid banned pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// The three words a student picks to seed the protagonist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedWords([String; 3]);

impl SeedWords {
    pub fn new(first: impl Into<String>, second: impl Into<String>, third: impl Into<String>) -> Self {
        Self([first.into(), second.into(), third.into()])
    }

    /// Copy of the words with surrounding whitespace removed.
    pub fn trimmed(&self) -> Self {
        let [a, b, c] = &self.0;
        Self::new(a.trim(), b.trim(), c.trim())
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    /// Mutable access for input surfaces that edit one word at a time.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut String> {
        self.0.get_mut(index)
    }
}

/// Denylist-driven validator for free-text input.
#[derive(Debug, Clone)]
pub struct ContentFilter {
    pattern: Option<Regex>,
    fragments: Vec<String>,
}

impl ContentFilter {
    /// Compile a filter from denylist fragments.
    ///
    /// Blank fragments are skipped. An empty list bans nothing.
    pub fn new<S: AsRef<str>>(fragments: &[S]) -> Result<Self, FilterError> {
        let fragments: Vec<String> = fragments
            .iter()
            .map(|f| f.as_ref().trim().to_string())
            .filter(|f| !f.is_empty())
            .collect();

        let pattern = if fragments.is_empty() {
            None
        } else {
            let alternation = fragments
                .iter()
                .map(|f| format!("(?:{f})"))
                .collect::<Vec<_>>()
                .join("|");
            Some(RegexBuilder::new(&alternation).case_insensitive(true).build()?)
        };

        Ok(Self { pattern, fragments })
    }

    /// The fragments this filter was built from.
    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    /// Whether `text` contains any denylisted fragment.
    pub fn is_banned(&self, text: &str) -> bool {
        self.pattern.as_ref().is_some_and(|re| re.is_match(text))
    }

    /// Validate seed words, returning the trimmed triple on success.
    pub fn validate(&self, words: &SeedWords) -> Result<SeedWords, Rejection> {
        let trimmed = words.trimmed();

        if trimmed.as_slice().iter().any(|w| w.is_empty()) {
            return Err(Rejection::MissingWord);
        }

        if let Some(word) = trimmed.as_slice().iter().find(|w| self.is_banned(w)) {
            tracing::debug!(chars = word.chars().count(), "seed word rejected by content filter");
            return Err(Rejection::BannedContent { word: word.clone() });
        }

        Ok(trimmed)
    }
}

impl Default for ContentFilter {
    fn default() -> Self {
        Self::new(DEFAULT_BANNED_PATTERNS).expect("valid regex")
    }
}
