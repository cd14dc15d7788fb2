//! Prompt construction for the character profile, story steps and the
//! polish pass.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::export::AssembledStory;
use crate::filter::SeedWords;
use crate::template::OPENING_TITLE;

/// Words the model is told never to write ("next story", "ending",
/// "curious", "preview", "continued").
pub const DEFAULT_FORBIDDEN_WORDS: &[&str] =
    &["다음 이야기", "결말", "궁금하다", "예고", "계속", "이어질"];

/// How long a generated paragraph should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "unit")]
pub enum LengthCap {
    Sentences { min: u32, max: u32 },
    Characters { min: u32, max: u32 },
}

impl LengthCap {
    pub const SENTENCES: Self = Self::Sentences { min: 3, max: 5 };
    pub const CHARACTERS: Self = Self::Characters { min: 200, max: 300 };
}

impl Default for LengthCap {
    fn default() -> Self {
        Self::SENTENCES
    }
}

impl fmt::Display for LengthCap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sentences { min, max } => write!(f, "{min}~{max}문장으로"),
            Self::Characters { min, max } => write!(f, "{min}~{max}자 정도로"),
        }
    }
}

impl std::str::FromStr for LengthCap {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sentences" => Ok(Self::SENTENCES),
            "characters" | "chars" => Ok(Self::CHARACTERS),
            other => Err(format!("unknown length cap: {other}")),
        }
    }
}

/// Knobs shared by every step prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSettings {
    pub length: LengthCap,
    /// Mention the next step's title so the scene can lead into it.
    pub next_title_hint: bool,
    pub forbidden_words: Vec<String>,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            length: LengthCap::default(),
            next_title_hint: true,
            forbidden_words: DEFAULT_FORBIDDEN_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }
}

/// Prompt asking for the protagonist's profile from the three seed words.
pub fn character_prompt(words: &SeedWords) -> String {
    let w = words.as_slice();
    format!(
        "'{}', '{}', '{}' 세 단어를 모두 사용해서 초등학교 3학년이 이해하기 쉬운 말로 \
         주인공의 이름, 성격, 좋아하는 일, 사는 곳을 3~4문장으로 소개해 주세요.",
        w[0], w[1], w[2]
    )
}

/// Builder for a single story-step prompt.
#[derive(Debug, Clone, Default)]
pub struct StepPrompt {
    title: String,
    profile: String,
    context: String,
    next_title: Option<String>,
}

impl StepPrompt {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    /// Everything written before this step, already space-joined.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn with_next_title(mut self, next: Option<&str>) -> Self {
        self.next_title = next.map(str::to_string);
        self
    }

    pub fn render(&self, settings: &PromptSettings) -> String {
        let mut prompt = format!(
            "주인공 정보: {}\n\n지금까지의 이야기 (참고만 하세요): {}\n\n",
            self.profile, self.context
        );

        prompt.push_str(&format!(
            "'{}'로 시작하는 새로운 장면을 {} 써 주세요. \
             초등학교 3학년이 이해하기 쉬운 따뜻한 말투로, 자연스럽게 이야기를 이어가 주세요. ",
            self.title, settings.length
        ));

        if self.title == OPENING_TITLE {
            prompt.push_str(
                "'옛날 옛적 어느 마을에 ○○가 살았어요.'처럼 \
                 주인공의 이름과 사는 곳을 밝히며 이야기를 시작해 주세요. ",
            );
        }

        if settings.next_title_hint {
            if let Some(next) = &self.next_title {
                prompt.push_str(&format!(
                    "다음 장면은 '{next}'로 시작해요. 그 장면으로 넘어갈 수 있게 \
                     분위기만 만들어 주고, 다음 장면의 내용은 쓰지 마세요. "
                ));
            }
        }

        if !settings.forbidden_words.is_empty() {
            let quoted = settings
                .forbidden_words
                .iter()
                .map(|w| format!("‘{w}’"))
                .collect::<Vec<_>>()
                .join(", ");
            prompt.push_str(&format!("{quoted} 같은 말은 쓰지 마세요. "));
        }

        prompt.push_str("이 장면까지만 묘사하고 멈춰 주세요.");
        prompt
    }
}

/// Prompt for the optional pass that smooths the whole story.
pub fn polish_prompt(story: &AssembledStory) -> String {
    format!(
        "아래는 초등학생이 AI와 번갈아 쓴 이야기예요. 새로운 사건을 더하지 말고, \
         장면들이 자연스럽게 이어지는 하나의 이야기로 다듬어 주세요. \
         초등학교 3학년이 이해하기 쉬운 따뜻한 말투를 지키고, 제목 없이 본문만 써 주세요.\n\n{}",
        story.to_plain_text()
    )
}
