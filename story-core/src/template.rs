//! The fixed eight-beat story template.
//!
//! Each slot has a title that must open its paragraph and an authorship
//! mode deciding whether the student or the AI writes it.

use serde::{Deserialize, Serialize};

/// The title of the opening beat.
pub const OPENING_TITLE: &str = "옛날에";

/// Canonical beat titles, in slot order.
pub const CLASSROOM_TITLES: [&str; 8] = [
    OPENING_TITLE,
    "그리고 매일",
    "그러던 어느 날",
    "그래서",
    "그래서",
    "그래서",
    "마침내",
    "그날 이후",
];

/// Who writes a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Authorship {
    /// The student types the paragraph.
    Manual,
    /// The paragraph comes from the text-generation service.
    Generated,
}

/// One slot of the template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDefinition {
    pub title: String,
    pub authorship: Authorship,
}

impl StepDefinition {
    pub fn new(title: impl Into<String>, authorship: Authorship) -> Self {
        Self {
            title: title.into(),
            authorship,
        }
    }

    pub fn is_generated(&self) -> bool {
        self.authorship == Authorship::Generated
    }
}

/// Ordered list of step definitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryTemplate {
    steps: Vec<StepDefinition>,
}

impl StoryTemplate {
    /// Build a template from explicit definitions.
    pub fn new(steps: Vec<StepDefinition>) -> Self {
        Self { steps }
    }

    /// Classroom template: the AI writes slots 1, 3 and 5.
    pub fn classroom() -> Self {
        Self::alternating(&[1, 3, 5])
    }

    /// Variant where the AI opens the story and writes slots 0, 2 and 4.
    pub fn ai_first() -> Self {
        Self::alternating(&[0, 2, 4])
    }

    fn alternating(generated: &[usize]) -> Self {
        let steps = CLASSROOM_TITLES
            .iter()
            .enumerate()
            .map(|(i, title)| {
                let authorship = if generated.contains(&i) {
                    Authorship::Generated
                } else {
                    Authorship::Manual
                };
                StepDefinition::new(*title, authorship)
            })
            .collect();
        Self { steps }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&StepDefinition> {
        self.steps.get(index)
    }

    pub fn title(&self, index: usize) -> Option<&str> {
        self.get(index).map(|s| s.title.as_str())
    }

    /// Title of the slot after `index`, if any.
    pub fn next_title(&self, index: usize) -> Option<&str> {
        self.title(index + 1)
    }

    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    /// Indices of the slots the AI writes.
    pub fn generated_positions(&self) -> Vec<usize> {
        self.steps
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_generated())
            .map(|(i, _)| i)
            .collect()
    }
}

impl Default for StoryTemplate {
    fn default() -> Self {
        Self::classroom()
    }
}
