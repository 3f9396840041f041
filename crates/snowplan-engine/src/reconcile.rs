//! Snapshot reconciliation
//!
//! An incoming snapshot replaces the cache wholesale except for fields
//! the coalescer still owns: anything pending or in flight keeps its
//! local optimistic value, so the user never watches their own
//! just-made edit revert while its write is on the wire. There is no
//! per-field timestamp comparison beyond this exclusion.

use crate::events::FieldRef;
use snowplan_model::Project;
use std::collections::HashSet;

/// Merge an incoming snapshot with the local cache
///
/// `dirty` is the set of fields with a pending or in-flight write.
/// Returns the project that becomes the new cache.
#[must_use]
pub fn reconcile(local: &Project, mut incoming: Project, dirty: &HashSet<FieldRef>) -> Project {
    for field in dirty {
        match field {
            FieldRef::Title => {
                incoming.title = local.title.clone();
            }
            FieldRef::CurrentStep => {
                incoming.current_step = local.current_step.clone();
            }
            FieldRef::Ordering => {
                for (key, step) in &local.steps {
                    if let Some(target) = incoming.steps.get_mut(key) {
                        target.order = step.order;
                    }
                }
            }
            FieldRef::Content(key) => {
                // The derived pair travels with content; splitting them
                // would let a snapshot desync completed/word_count from
                // the text on screen.
                if let (Some(local_step), Some(target)) =
                    (local.steps.get(key), incoming.steps.get_mut(key))
                {
                    target.content = local_step.content.clone();
                    target.completed = local_step.completed;
                    target.word_count = local_step.word_count;
                }
            }
        }
    }
    incoming
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use snowplan_model::{ProjectId, StepKey, Template};

    fn project() -> Project {
        Project::from_template(ProjectId::new(), "Local", Template::basic(), Utc::now()).unwrap()
    }

    fn dirty(fields: &[FieldRef]) -> HashSet<FieldRef> {
        fields.iter().cloned().collect()
    }

    #[test]
    fn clean_fields_take_the_snapshot_value() {
        let local = project();
        let mut remote = local.clone();
        remote.title = "Remote".to_string();
        remote
            .step_mut(&StepKey::from("notes"))
            .unwrap()
            .set_content("from another device");

        let merged = reconcile(&local, remote.clone(), &HashSet::new());
        assert_eq!(merged, remote);
    }

    #[test]
    fn in_flight_content_wins_while_unrelated_fields_update() {
        let summary = StepKey::from("summary");
        let mut local = project();
        local.step_mut(&summary).unwrap().set_content("local draft");

        let mut remote = project();
        remote.id = local.id;
        remote.step_mut(&summary).unwrap().set_content("stale remote");
        remote.title = "Renamed elsewhere".to_string();

        let merged = reconcile(&local, remote, &dirty(&[FieldRef::Content(summary.clone())]));
        let step = merged.step(&summary).unwrap();
        assert_eq!(step.content, "local draft");
        assert_eq!(step.word_count, 2);
        assert!(step.completed);
        assert_eq!(merged.title, "Renamed elsewhere");
    }

    #[test]
    fn pending_ordering_wins_over_snapshot_orders() {
        let mut local = project();
        // Local just dragged "notes" to the top.
        local.step_mut(&StepKey::from("notes")).unwrap().order = 0;
        local.step_mut(&StepKey::from("summary")).unwrap().order = 1;
        local.step_mut(&StepKey::from("characters")).unwrap().order = 2;
        local.step_mut(&StepKey::from("scenes")).unwrap().order = 3;

        let mut remote = project();
        remote.id = local.id;
        remote.step_mut(&StepKey::from("summary")).unwrap().set_content("remote words");

        let merged = reconcile(&local, remote, &dirty(&[FieldRef::Ordering]));
        assert_eq!(merged.step(&StepKey::from("notes")).unwrap().order, 0);
        assert_eq!(merged.step(&StepKey::from("summary")).unwrap().order, 1);
        // Content was not dirty, so the remote edit lands.
        assert_eq!(
            merged.step(&StepKey::from("summary")).unwrap().content,
            "remote words"
        );
    }

    #[test]
    fn pending_selection_and_title_win() {
        let mut local = project();
        local.current_step = Some(StepKey::from("scenes"));
        local.title = "Local title".to_string();

        let mut remote = project();
        remote.id = local.id;
        remote.current_step = Some(StepKey::from("summary"));
        remote.title = "Remote title".to_string();

        let merged = reconcile(
            &local,
            remote,
            &dirty(&[FieldRef::CurrentStep, FieldRef::Title]),
        );
        assert_eq!(merged.current_step, Some(StepKey::from("scenes")));
        assert_eq!(merged.title, "Local title");
    }
}
