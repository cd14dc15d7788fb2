//! StorySession - the per-student state and one handler per user action.
//!
//! Front ends never touch the fields directly; they turn key presses or
//! protocol lines into an [`Action`], hand it to [`StorySession::dispatch`]
//! and re-render from the session afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{ConfigError, StoryConfig};
use crate::error::{Result, StoryError};
use crate::export::{write_export, AssembledStory, Section, StudentInfo};
use crate::filter::{ContentFilter, SeedWords};
use crate::generator::StoryWriter;
use crate::template::{Authorship, StepDefinition, StoryTemplate};

/// One slot of the story as the student sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryStep {
    pub title: String,
    pub authorship: Authorship,
    pub text: String,
    pub locked: bool,
}

impl StoryStep {
    fn from_definition(def: &StepDefinition) -> Self {
        Self {
            title: def.title.clone(),
            authorship: def.authorship,
            text: String::new(),
            locked: false,
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.text.trim().is_empty()
    }

    pub fn is_generated(&self) -> bool {
        self.authorship == Authorship::Generated
    }
}

/// A user action. Step indices are 0-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SubmitWords(SeedWords),
    GenerateStep(usize),
    WriteStep { index: usize, text: String },
    FinishStep(usize),
    UnlockStep(usize),
    SetStudent(StudentInfo),
    ClearCharacter,
    Polish,
    /// Write the story file, into the configured directory when `None`.
    Export(Option<PathBuf>),
    Reset,
}

/// What a handler changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    CharacterCreated,
    StepGenerated(usize),
    StepWritten(usize),
    StepFinished(usize),
    StepUnlocked(usize),
    StudentUpdated,
    CharacterCleared,
    Polished,
    Exported(PathBuf),
    Reset,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CharacterCreated => write!(f, "주인공이 만들어졌어요!"),
            Self::StepGenerated(i) => write!(f, "{}번 장면을 AI가 썼어요.", i + 1),
            Self::StepWritten(i) => write!(f, "{}번 장면을 저장했어요.", i + 1),
            Self::StepFinished(i) => write!(f, "{}번 장면을 완성했어요.", i + 1),
            Self::StepUnlocked(i) => write!(f, "{}번 장면을 다시 고칠 수 있어요.", i + 1),
            Self::StudentUpdated => write!(f, "학생 정보를 저장했어요."),
            Self::CharacterCleared => write!(f, "주인공을 지웠어요."),
            Self::Polished => write!(f, "이야기를 다듬었어요."),
            Self::Exported(path) => write!(f, "이야기를 저장했어요: {}", path.display()),
            Self::Reset => write!(f, "새 이야기를 시작해요."),
        }
    }
}

/// Completed slots out of all slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

/// A single student's story in progress.
#[derive(Debug)]
pub struct StorySession {
    template: StoryTemplate,
    filter: ContentFilter,
    writer: StoryWriter,
    export_dir: PathBuf,
    words: Option<SeedWords>,
    character: String,
    steps: Vec<StoryStep>,
    student: StudentInfo,
    polished: Option<String>,
}

impl StorySession {
    /// A fresh session with the classroom template and the default filter.
    pub fn new(writer: StoryWriter) -> Self {
        let template = StoryTemplate::default();
        Self {
            steps: Self::empty_steps(&template),
            template,
            filter: ContentFilter::default(),
            writer,
            export_dir: PathBuf::from("."),
            words: None,
            character: String::new(),
            student: StudentInfo::default(),
            polished: None,
        }
    }

    /// Build a session talking to OpenAI from startup configuration.
    pub fn from_config(config: &StoryConfig) -> std::result::Result<Self, ConfigError> {
        let writer = config.writer(Arc::new(config.client()));
        Ok(Self::new(writer)
            .with_template(config.template.template())
            .with_filter(config.content_filter()?)
            .with_export_dir(config.export_dir.clone()))
    }

    pub fn with_template(mut self, template: StoryTemplate) -> Self {
        self.steps = Self::empty_steps(&template);
        self.template = template;
        self
    }

    pub fn with_filter(mut self, filter: ContentFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = dir.into();
        self
    }

    fn empty_steps(template: &StoryTemplate) -> Vec<StoryStep> {
        template.steps().iter().map(StoryStep::from_definition).collect()
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn template(&self) -> &StoryTemplate {
        &self.template
    }

    pub fn filter(&self) -> &ContentFilter {
        &self.filter
    }

    pub fn words(&self) -> Option<&SeedWords> {
        self.words.as_ref()
    }

    pub fn character(&self) -> &str {
        &self.character
    }

    pub fn steps(&self) -> &[StoryStep] {
        &self.steps
    }

    pub fn step(&self, index: usize) -> Option<&StoryStep> {
        self.steps.get(index)
    }

    pub fn student(&self) -> &StudentInfo {
        &self.student
    }

    pub fn polished(&self) -> Option<&str> {
        self.polished.as_deref()
    }

    pub fn export_dir(&self) -> &std::path::Path {
        &self.export_dir
    }

    // ========================================================================
    // Handlers
    // ========================================================================

    /// Route an action to its handler.
    pub async fn dispatch(&mut self, action: Action) -> Result<Outcome> {
        match action {
            Action::SubmitWords(words) => self.submit_words(words).await,
            Action::GenerateStep(i) => self.generate_step(i).await,
            Action::WriteStep { index, text } => self.write_step(index, text),
            Action::FinishStep(i) => self.finish_step(i),
            Action::UnlockStep(i) => self.unlock_step(i),
            Action::SetStudent(info) => {
                self.set_student(info);
                Ok(Outcome::StudentUpdated)
            }
            Action::ClearCharacter => {
                self.clear_character();
                Ok(Outcome::CharacterCleared)
            }
            Action::Polish => self.polish().await.map(|_| Outcome::Polished),
            Action::Export(dir) => self.export(dir).await.map(Outcome::Exported),
            Action::Reset => {
                self.reset();
                Ok(Outcome::Reset)
            }
        }
    }

    /// Validate the seed words and (re)generate the character profile.
    ///
    /// On any failure the previous profile is kept.
    pub async fn submit_words(&mut self, words: SeedWords) -> Result<Outcome> {
        let accepted = self.filter.validate(&words)?;
        let profile = self.writer.character(&accepted).await?;
        tracing::info!(chars = profile.chars().count(), "character profile created");
        self.words = Some(accepted);
        self.character = profile;
        Ok(Outcome::CharacterCreated)
    }

    /// Generate the paragraph for an AI-authored slot, overwriting it.
    pub async fn generate_step(&mut self, index: usize) -> Result<Outcome> {
        let step = self.step_checked(index)?;
        if !step.is_generated() {
            return Err(StoryError::NotGenerated(index));
        }

        let context = self.build_prev_context(index);
        let text = self
            .writer
            .step(index, &self.template, &self.character, &context)
            .await?;

        self.steps[index].text = text;
        self.polished = None;
        Ok(Outcome::StepGenerated(index))
    }

    /// Replace the text of a student-authored slot.
    pub fn write_step(&mut self, index: usize, text: impl Into<String>) -> Result<Outcome> {
        let step = self.step_checked(index)?;
        if step.is_generated() {
            return Err(StoryError::NotManual(index));
        }
        self.steps[index].text = text.into();
        self.polished = None;
        Ok(Outcome::StepWritten(index))
    }

    pub fn finish_step(&mut self, index: usize) -> Result<Outcome> {
        self.steps
            .get_mut(index)
            .ok_or(StoryError::StepOutOfRange(index))?
            .locked = true;
        Ok(Outcome::StepFinished(index))
    }

    pub fn unlock_step(&mut self, index: usize) -> Result<Outcome> {
        self.steps
            .get_mut(index)
            .ok_or(StoryError::StepOutOfRange(index))?
            .locked = false;
        Ok(Outcome::StepUnlocked(index))
    }

    pub fn set_student(&mut self, student: StudentInfo) {
        self.student = student;
    }

    pub fn clear_character(&mut self) {
        self.words = None;
        self.character.clear();
    }

    /// Start over with empty slots. Student info and settings are kept.
    pub fn reset(&mut self) {
        self.clear_character();
        self.steps = Self::empty_steps(&self.template);
        self.polished = None;
    }

    /// Run the polish pass over the assembled story and keep the result.
    pub async fn polish(&mut self) -> Result<&str> {
        let story = self.assembled_story().ok_or(StoryError::NothingToExport)?;
        let text = self.writer.polish(&story).await;
        Ok(self.polished.insert(text).as_str())
    }

    /// Write the story file. Uses the polished text when one is current.
    pub async fn export(&self, dir: Option<PathBuf>) -> Result<PathBuf> {
        let story = self.assembled_story().ok_or(StoryError::NothingToExport)?;
        let text = match &self.polished {
            Some(polished) => polished.clone(),
            None => story.to_plain_text(),
        };
        let dir = dir.unwrap_or_else(|| self.export_dir.clone());
        Ok(write_export(dir, &self.student, &text).await?)
    }

    fn step_checked(&self, index: usize) -> Result<&StoryStep> {
        let step = self.steps.get(index).ok_or(StoryError::StepOutOfRange(index))?;
        if step.locked {
            return Err(StoryError::StepLocked(index));
        }
        Ok(step)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Space-joined texts of every non-empty slot before `index`, in order.
    pub fn build_prev_context(&self, index: usize) -> String {
        self.steps
            .iter()
            .take(index)
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// The titled non-empty slots, or `None` while every slot is empty.
    pub fn assembled_story(&self) -> Option<AssembledStory> {
        let sections: Vec<Section> = self
            .steps
            .iter()
            .filter(|s| s.is_complete())
            .map(|s| Section {
                title: s.title.clone(),
                text: s.text.trim().to_string(),
            })
            .collect();

        (!sections.is_empty()).then(|| AssembledStory::new(sections))
    }

    pub fn progress(&self) -> Progress {
        Progress {
            completed: self.steps.iter().filter(|s| s.is_complete()).count(),
            total: self.steps.len(),
        }
    }
}
