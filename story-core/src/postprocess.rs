//! Clean-up applied to every generated paragraph before it is stored.
//!
//! The pipeline is: trim, strip narrative-breaking meta phrases, make sure
//! the paragraph opens with its step title, fix up the fairy-tale opening,
//! trim again.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::template::OPENING_TITLE;

/// Phrases that break immersion ("next story", "ending", "curious", ...).
pub const DEFAULT_META_PHRASES: &[&str] = &["다음 이야기", "결말", "궁금", "예고", "계속", "이어질"];

/// Subject inserted when the opening sentence names nobody.
pub const DEFAULT_OPENING_PLACEHOLDER: &str = "한 친구가";

/// A word ending in a subject or topic marker.
static SUBJECT_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w+(?:이|가|은|는)$").expect("valid regex"));

/// Describing-word and adverb endings that look like a marker but are not
/// one: 깊은 숲, 노래하는 아이, 많이.
const NON_SUBJECT_ENDINGS: &[&str] = &[
    "하는", "있는", "없는", "않는", "같은", "작은", "깊은", "넓은", "높은", "낮은", "좋은",
    "많은", "적은", "밝은", "맑은", "검은", "붉은", "젊은", "늙은", "짧은", "얕은", "괜찮은",
    "같이", "많이", "깊이", "높이", "길이",
];

/// Whether `word` is a noun followed by 이/가/은/는.
fn is_subject_word(word: &str) -> bool {
    let word = word.trim_matches(|c: char| !c.is_alphanumeric());
    SUBJECT_MARKER.is_match(word) && !NON_SUBJECT_ENDINGS.iter().any(|e| word.ends_with(e))
}

/// How meta phrases are removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MetaPhraseStrategy {
    /// Cut at the earliest phrase and discard everything after it.
    Truncate,
    /// Remove only the sentences containing a phrase.
    #[default]
    DropSentence,
}

impl std::str::FromStr for MetaPhraseStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "truncate" => Ok(Self::Truncate),
            "drop-sentence" | "drop_sentence" | "sentence" => Ok(Self::DropSentence),
            other => Err(format!("unknown meta phrase strategy: {other}")),
        }
    }
}

/// Denylist-driven transform over generated text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaPhraseFilter {
    phrases: Vec<String>,
    strategy: MetaPhraseStrategy,
}

impl MetaPhraseFilter {
    pub fn new<S: AsRef<str>>(phrases: &[S], strategy: MetaPhraseStrategy) -> Self {
        let phrases = phrases
            .iter()
            .map(|p| p.as_ref().trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        Self { phrases, strategy }
    }

    pub fn with_strategy(mut self, strategy: MetaPhraseStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    pub fn strategy(&self) -> MetaPhraseStrategy {
        self.strategy
    }

    pub fn contains_phrase(&self, text: &str) -> bool {
        self.phrases.iter().any(|p| text.contains(p.as_str()))
    }

    /// Remove meta phrases. Text without any phrase comes back unchanged.
    pub fn strip(&self, text: &str) -> String {
        if !self.contains_phrase(text) {
            return text.to_string();
        }

        match self.strategy {
            MetaPhraseStrategy::Truncate => {
                let cut = self
                    .phrases
                    .iter()
                    .filter_map(|p| text.find(p.as_str()))
                    .min()
                    .unwrap_or(text.len());
                text[..cut].trim_end().to_string()
            }
            MetaPhraseStrategy::DropSentence => split_sentences(text)
                .into_iter()
                .filter(|s| !self.contains_phrase(s))
                .collect::<String>()
                .trim()
                .to_string(),
        }
    }
}

impl Default for MetaPhraseFilter {
    fn default() -> Self {
        Self::new(DEFAULT_META_PHRASES, MetaPhraseStrategy::default())
    }
}

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '。' | '…')
}

fn is_closer(c: char) -> bool {
    matches!(c, '"' | '\'' | '”' | '’' | ')' | '」' | '』')
}

/// Split text into sentences, each keeping its terminator, closing quotes
/// and trailing whitespace so that concatenating them yields the input.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        if !is_terminator(c) {
            continue;
        }
        while let Some(&(_, next)) = chars.peek() {
            if is_terminator(next) || is_closer(next) {
                chars.next();
            } else {
                break;
            }
        }
        while let Some(&(_, next)) = chars.peek() {
            if next.is_whitespace() {
                chars.next();
            } else {
                break;
            }
        }
        let end = chars.peek().map_or(text.len(), |&(i, _)| i);
        sentences.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        sentences.push(&text[start..]);
    }
    sentences
}

/// Prepend `"<title> "` unless the text already opens with the title.
pub fn ensure_title_prefix(text: &str, title: &str) -> String {
    if text.starts_with(title) {
        text.to_string()
    } else {
        format!("{title} {text}")
    }
}

/// Fix-up for the fairy-tale opening: the first sentence must name someone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpeningRule {
    pub title: String,
    pub placeholder: String,
}

impl OpeningRule {
    pub fn new(title: impl Into<String>, placeholder: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            placeholder: placeholder.into(),
        }
    }

    pub fn applies_to(&self, title: &str) -> bool {
        self.title == title
    }

    /// Insert the placeholder subject after the title when the opening
    /// sentence has no subject marker.
    pub fn apply(&self, text: &str) -> String {
        let Some(rest) = text.strip_prefix(self.title.as_str()) else {
            return text.to_string();
        };
        let rest = rest.trim_start();
        let first_sentence = split_sentences(rest).into_iter().next().unwrap_or("");
        let named = first_sentence
            .split(|c: char| c.is_whitespace() || c == ',')
            .any(is_subject_word);
        if rest.is_empty() || named {
            return text.to_string();
        }
        format!("{} {} {}", self.title, self.placeholder, rest)
    }
}

impl Default for OpeningRule {
    fn default() -> Self {
        Self::new(OPENING_TITLE, DEFAULT_OPENING_PLACEHOLDER)
    }
}

/// The full clean-up pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Postprocessor {
    pub meta: MetaPhraseFilter,
    pub opening: OpeningRule,
}

impl Postprocessor {
    pub fn new(meta: MetaPhraseFilter, opening: OpeningRule) -> Self {
        Self { meta, opening }
    }

    /// Turn a raw completion into a finished paragraph for `title`.
    ///
    /// Returns `None` when nothing beyond the title survives.
    pub fn finish(&self, raw: &str, title: &str) -> Option<String> {
        let text = raw.trim();
        if text.is_empty() {
            return None;
        }

        let stripped = self.meta.strip(text);
        let stripped = stripped.trim();
        if stripped.is_empty() || stripped == title {
            return None;
        }

        let mut text = ensure_title_prefix(stripped, title);
        if self.opening.applies_to(title) {
            text = self.opening.apply(&text);
        }

        Some(text.trim().to_string())
    }
}
