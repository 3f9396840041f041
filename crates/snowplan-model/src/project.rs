//! Projects: the document unit of persistence and sync

use crate::ids::{ProjectId, StepKey};
use crate::step::Step;
use crate::template::{Template, TemplateError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Creation spec for a project: a title and the template that fixes the
/// step set
#[derive(Debug, Clone)]
pub struct NewProject {
    /// Project title
    pub title: String,
    /// Template supplying the step set
    pub template: Template,
}

impl NewProject {
    /// Create a spec from a title and template
    #[inline]
    #[must_use]
    pub fn new(title: impl Into<String>, template: Template) -> Self {
        Self {
            title: title.into(),
            template,
        }
    }
}

/// A writing project and its fixed set of ordered steps
///
/// The step-key set is established at creation from a template and never
/// mutated afterwards; steps are edited and reordered in place. The
/// stored `word_count` is an aggregate snapshot, not authoritative;
/// consumers should prefer [`Project::total_word_count`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Unique identifier
    pub id: ProjectId,
    /// Title, user-editable
    pub title: String,
    /// Short description copied from the template
    pub description: String,
    /// Template this project was created from
    pub template_id: Option<String>,
    /// Step set keyed by stable step key
    pub steps: HashMap<StepKey, Step>,
    /// Currently selected step, if any
    #[serde(default)]
    pub current_step: Option<StepKey>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp
    pub updated_at: DateTime<Utc>,
    /// Aggregate word count snapshot (derived, not authoritative)
    pub word_count: u32,
}

impl Project {
    /// Instantiate a project from a template
    ///
    /// Step order follows the template's authoring order; the first step
    /// becomes the current step.
    ///
    /// # Errors
    /// [`TemplateError::Empty`] if the template defines no steps.
    pub fn from_template(
        id: ProjectId,
        title: impl Into<String>,
        template: &Template,
        now: DateTime<Utc>,
    ) -> Result<Self, TemplateError> {
        if template.steps.is_empty() {
            return Err(TemplateError::Empty);
        }

        let steps: HashMap<StepKey, Step> = template
            .steps
            .iter()
            .enumerate()
            .map(|(idx, ts)| {
                (
                    ts.key.clone(),
                    Step::new(ts.title.clone(), ts.icon.clone(), idx as u32),
                )
            })
            .collect();

        Ok(Self {
            id,
            title: title.into(),
            description: template.description.clone(),
            template_id: Some(template.id.clone()),
            current_step: Some(template.steps[0].key.clone()),
            steps,
            created_at: now,
            updated_at: now,
            word_count: 0,
        })
    }

    /// Look up a step by key
    #[inline]
    #[must_use]
    pub fn step(&self, key: &StepKey) -> Option<&Step> {
        self.steps.get(key)
    }

    /// Look up a step mutably
    #[inline]
    pub fn step_mut(&mut self, key: &StepKey) -> Option<&mut Step> {
        self.steps.get_mut(key)
    }

    /// Whether a step with this key exists
    #[inline]
    #[must_use]
    pub fn contains_step(&self, key: &StepKey) -> bool {
        self.steps.contains_key(key)
    }

    /// Step keys sorted by order value
    #[must_use]
    pub fn ordered_keys(&self) -> Vec<StepKey> {
        let mut entries: Vec<(&StepKey, u32)> =
            self.steps.iter().map(|(k, s)| (k, s.order)).collect();
        entries.sort_by_key(|(_, order)| *order);
        entries.into_iter().map(|(k, _)| k.clone()).collect()
    }

    /// The current step, falling back to the lowest-order step when the
    /// pointer is absent or names a key that does not exist
    #[must_use]
    pub fn current_or_default(&self) -> Option<StepKey> {
        if let Some(current) = &self.current_step {
            if self.steps.contains_key(current) {
                return Some(current.clone());
            }
        }
        self.steps
            .iter()
            .min_by_key(|(_, s)| s.order)
            .map(|(k, _)| k.clone())
    }

    /// Aggregate word count across all steps, derived on read
    #[must_use]
    pub fn total_word_count(&self) -> u32 {
        self.steps.values().map(|s| s.word_count).sum()
    }
}
