//! TUI widgets for the story form

pub mod form;
pub mod input;
pub mod story_panel;

pub use form::{FormRow, FormWidget, RowKind};
pub use input::InputWidget;
pub use story_panel::{PreviewItem, PreviewKind, StoryPanelWidget};
