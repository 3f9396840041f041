//! Targeted partial updates
//!
//! Writes never replace a whole document: an [`UpdateMap`] names exactly
//! the fields a mutation touches, as typed paths rather than dotted
//! strings. [`FieldPath::to_string`] produces the document notation
//! (`steps.<key>.content`) used in logs and by backends that key on it.

use crate::error::StoreError;
use snowplan_model::{word_count, Project, StepKey};
use std::collections::BTreeMap;

/// Typed path to one scalar field of a project document
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldPath {
    /// `title`
    Title,
    /// `currentStep`
    CurrentStep,
    /// `steps.<key>.content`
    StepContent(StepKey),
    /// `steps.<key>.completed`
    StepCompleted(StepKey),
    /// `steps.<key>.wordCount`
    StepWordCount(StepKey),
    /// `steps.<key>.order`
    StepOrder(StepKey),
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldPath::Title => f.write_str("title"),
            FieldPath::CurrentStep => f.write_str("currentStep"),
            FieldPath::StepContent(k) => write!(f, "steps.{k}.content"),
            FieldPath::StepCompleted(k) => write!(f, "steps.{k}.completed"),
            FieldPath::StepWordCount(k) => write!(f, "steps.{k}.wordCount"),
            FieldPath::StepOrder(k) => write!(f, "steps.{k}.order"),
        }
    }
}

/// Value written to one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Free text
    Text(String),
    /// Boolean flag
    Flag(bool),
    /// Non-negative count or order position
    Count(u32),
    /// Step-key reference
    Key(StepKey),
}

/// An ordered set of field writes applied atomically by a backend
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateMap {
    entries: Vec<(FieldPath, FieldValue)>,
}

impl UpdateMap {
    /// Empty update
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one field write
    #[must_use]
    pub fn set(mut self, path: FieldPath, value: FieldValue) -> Self {
        self.entries.push((path, value));
        self
    }

    /// The three-field write for one step's content edit
    ///
    /// Content, completion, and word count are always written together so
    /// a snapshot can never observe them out of sync.
    #[must_use]
    pub fn content_edit(key: &StepKey, content: &str) -> Self {
        Self::new()
            .set(
                FieldPath::StepContent(key.clone()),
                FieldValue::Text(content.to_string()),
            )
            .set(
                FieldPath::StepCompleted(key.clone()),
                FieldValue::Flag(!content.trim().is_empty()),
            )
            .set(
                FieldPath::StepWordCount(key.clone()),
                FieldValue::Count(word_count(content)),
            )
    }

    /// One order write per step, batched so a partial reorder is never
    /// observable
    #[must_use]
    pub fn reorder(orders: &BTreeMap<StepKey, u32>) -> Self {
        orders.iter().fold(Self::new(), |map, (key, order)| {
            map.set(FieldPath::StepOrder(key.clone()), FieldValue::Count(*order))
        })
    }

    /// Current-step selection write
    #[must_use]
    pub fn select(key: &StepKey) -> Self {
        Self::new().set(FieldPath::CurrentStep, FieldValue::Key(key.clone()))
    }

    /// Project title write
    #[must_use]
    pub fn rename(title: &str) -> Self {
        Self::new().set(FieldPath::Title, FieldValue::Text(title.to_string()))
    }

    /// Whether the update touches no fields
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of field writes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterate over the field writes
    pub fn iter(&self) -> impl Iterator<Item = &(FieldPath, FieldValue)> {
        self.entries.iter()
    }

    /// Apply every entry to a project document
    ///
    /// Backends call this under their own lock; the whole map applies or
    /// none of it does (validation happens before any write).
    ///
    /// # Errors
    /// [`StoreError::NotFound`] for an unknown step key,
    /// [`StoreError::InvalidUpdate`] for a path/value type mismatch.
    pub fn apply(&self, project: &mut Project) -> Result<(), StoreError> {
        // Validate first so a bad entry cannot leave a half-applied map.
        for (path, value) in &self.entries {
            let step_key = match path {
                FieldPath::Title | FieldPath::CurrentStep => None,
                FieldPath::StepContent(k)
                | FieldPath::StepCompleted(k)
                | FieldPath::StepWordCount(k)
                | FieldPath::StepOrder(k) => Some(k),
            };
            if let Some(key) = step_key {
                if !project.contains_step(key) {
                    return Err(StoreError::NotFound);
                }
            }
            let type_ok = matches!(
                (path, value),
                (FieldPath::Title, FieldValue::Text(_))
                    | (FieldPath::CurrentStep, FieldValue::Key(_))
                    | (FieldPath::StepContent(_), FieldValue::Text(_))
                    | (FieldPath::StepCompleted(_), FieldValue::Flag(_))
                    | (FieldPath::StepWordCount(_), FieldValue::Count(_))
                    | (FieldPath::StepOrder(_), FieldValue::Count(_))
            );
            if !type_ok {
                return Err(StoreError::InvalidUpdate(format!(
                    "value type does not match {path}"
                )));
            }
        }

        for (path, value) in &self.entries {
            match (path, value) {
                (FieldPath::Title, FieldValue::Text(s)) => project.title = s.clone(),
                (FieldPath::CurrentStep, FieldValue::Key(k)) => {
                    project.current_step = Some(k.clone());
                }
                (FieldPath::StepContent(k), FieldValue::Text(s)) => {
                    if let Some(step) = project.step_mut(k) {
                        step.content = s.clone();
                    }
                }
                (FieldPath::StepCompleted(k), FieldValue::Flag(b)) => {
                    if let Some(step) = project.step_mut(k) {
                        step.completed = *b;
                    }
                }
                (FieldPath::StepWordCount(k), FieldValue::Count(n)) => {
                    if let Some(step) = project.step_mut(k) {
                        step.word_count = *n;
                    }
                }
                (FieldPath::StepOrder(k), FieldValue::Count(n)) => {
                    if let Some(step) = project.step_mut(k) {
                        step.order = *n;
                    }
                }
                _ => unreachable!("validated above"),
            }
        }
        Ok(())
    }
}
