//! Assembling the finished story and exporting it as a text file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Filename used when no identifying field is filled in.
pub const DEFAULT_EXPORT_NAME: &str = "my_story.txt";

/// Identifying fields of the student who wrote the story.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentInfo {
    /// Class, e.g. "3-2".
    pub classroom: String,
    pub team: String,
    pub number: String,
    pub name: String,
}

impl StudentInfo {
    pub fn new(
        classroom: impl Into<String>,
        team: impl Into<String>,
        number: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            classroom: classroom.into(),
            team: team.into(),
            number: number.into(),
            name: name.into(),
        }
    }

    fn fields(&self) -> [&str; 4] {
        [&self.classroom, &self.team, &self.number, &self.name]
    }
}

/// Build the export filename from the student's identifying fields.
///
/// Non-empty fields are joined with underscores and suffixed with
/// `_story.txt`; whitespace and path separators become underscores.
pub fn export_filename(student: &StudentInfo) -> String {
    let parts: Vec<String> = student
        .fields()
        .iter()
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .map(sanitize)
        .collect();

    if parts.is_empty() {
        return DEFAULT_EXPORT_NAME.to_string();
    }

    format!("{}_story.txt", parts.join("_"))
}

fn sanitize(field: &str) -> String {
    field
        .chars()
        .map(|c| {
            if c.is_whitespace() || matches!(c, '/' | '\\' | ':') {
                '_'
            } else {
                c
            }
        })
        .collect()
}

/// One titled section of the assembled story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub text: String,
}

/// Ordered concatenation of every non-empty step, derived on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssembledStory {
    pub sections: Vec<Section>,
}

impl AssembledStory {
    pub fn new(sections: Vec<Section>) -> Self {
        Self { sections }
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Plain-text rendering: each section is its title line then its text.
    pub fn to_plain_text(&self) -> String {
        self.sections
            .iter()
            .map(|s| format!("{}\n{}", s.title, s.text))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Markdown rendering with bold titles.
    pub fn to_markdown(&self) -> String {
        self.sections
            .iter()
            .map(|s| format!("**{}**\n{}", s.title, s.text))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Write `text` into `dir` under the student's export filename.
pub async fn write_export(
    dir: impl AsRef<Path>,
    student: &StudentInfo,
    text: &str,
) -> std::io::Result<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).await?;
    let path = dir.join(export_filename(student));
    fs::write(&path, text).await?;
    tracing::info!(path = %path.display(), bytes = text.len(), "story exported");
    Ok(path)
}
