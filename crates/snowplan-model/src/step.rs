//! Steps and their derived fields

use serde::{Deserialize, Serialize};

/// Count whitespace-delimited non-empty tokens
///
/// This is the word-count contract shared by the editor UI and the
/// persisted `word_count` field.
#[inline]
#[must_use]
pub fn word_count(content: &str) -> u32 {
    content.split_whitespace().count() as u32
}

/// One step of a project
///
/// `title` and `icon` are fixed by the template that created the project.
/// `completed` and `word_count` are pure functions of `content` and are
/// recomputed by [`Step::set_content`]; nothing else may write them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    /// Display title, immutable per template
    pub title: String,
    /// Display icon, immutable per template
    pub icon: String,
    /// Free-text content
    pub content: String,
    /// Position in the project's total order
    pub order: u32,
    /// Derived: trimmed content is non-empty
    pub completed: bool,
    /// Derived: whitespace-delimited token count of content
    pub word_count: u32,
}

impl Step {
    /// Create an empty step at the given order
    #[inline]
    #[must_use]
    pub fn new(title: impl Into<String>, icon: impl Into<String>, order: u32) -> Self {
        Self {
            title: title.into(),
            icon: icon.into(),
            content: String::new(),
            order,
            completed: false,
            word_count: 0,
        }
    }

    /// Replace the content and recompute derived fields
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.completed = !self.content.trim().is_empty();
        self.word_count = word_count(&self.content);
    }
}
