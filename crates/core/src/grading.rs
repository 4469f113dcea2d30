//! Mark submission and final-mark aggregation.
//!
//! Each grader owns exactly one mark field: the proposing faculty member
//! grades into `main_faculty_mark`, accepted supervisors grade into the field
//! of the slot they were given at acceptance. Every field is write-once.
//!
//! A thesis is fully graded once the main mark and one mark per accepted
//! supervisor are present; the final mark is the plain mean of those marks.
//! With no accepted supervisor there is no completion rule at all, so such a
//! thesis stays `ASSIGNED` after the main mark is recorded.

use serde::Serialize;

use crate::error::CoreError;
use crate::supervision::{self, Invitation, SupervisorSlot};
use crate::types::DbId;

pub const MIN_MARK: f64 = 0.0;
pub const MAX_MARK: f64 = 10.0;

/// The mark field a grader writes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GradingSlot {
    MainFaculty,
    Supervisor1,
    Supervisor2,
}

impl GradingSlot {
    /// Column in `theses` holding this slot's mark.
    pub fn column(self) -> &'static str {
        match self {
            GradingSlot::MainFaculty => "main_faculty_mark",
            GradingSlot::Supervisor1 => "supervisor1_mark",
            GradingSlot::Supervisor2 => "supervisor2_mark",
        }
    }
}

impl From<SupervisorSlot> for GradingSlot {
    fn from(slot: SupervisorSlot) -> Self {
        match slot {
            SupervisorSlot::First => GradingSlot::Supervisor1,
            SupervisorSlot::Second => GradingSlot::Supervisor2,
        }
    }
}

/// The three mark fields of a thesis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Marks {
    pub main_faculty: Option<f64>,
    pub supervisor1: Option<f64>,
    pub supervisor2: Option<f64>,
}

impl Marks {
    pub fn get(&self, slot: GradingSlot) -> Option<f64> {
        match slot {
            GradingSlot::MainFaculty => self.main_faculty,
            GradingSlot::Supervisor1 => self.supervisor1,
            GradingSlot::Supervisor2 => self.supervisor2,
        }
    }

    /// Record `mark` into `slot`. Fails with `Conflict` if already graded;
    /// the existing mark is left untouched.
    pub fn record(&mut self, slot: GradingSlot, mark: f64) -> Result<(), CoreError> {
        let field = match slot {
            GradingSlot::MainFaculty => &mut self.main_faculty,
            GradingSlot::Supervisor1 => &mut self.supervisor1,
            GradingSlot::Supervisor2 => &mut self.supervisor2,
        };
        if field.is_some() {
            return Err(CoreError::Conflict(
                "You have already graded this thesis".to_string(),
            ));
        }
        *field = Some(mark);
        Ok(())
    }
}

/// Validate a submitted mark: finite and within `[0, 10]`.
pub fn validate_mark(mark: f64) -> Result<(), CoreError> {
    if !mark.is_finite() || !(MIN_MARK..=MAX_MARK).contains(&mark) {
        return Err(CoreError::Validation(format!(
            "Mark must be between {MIN_MARK} and {MAX_MARK}"
        )));
    }
    Ok(())
}

/// Resolve which mark field `grader_id` writes into.
///
/// The owner always grades as main faculty. Anyone else must hold an
/// accepted supervisor slot.
pub fn resolve_slot(
    grader_id: DbId,
    owner_id: DbId,
    invitations: &[Invitation],
) -> Result<GradingSlot, CoreError> {
    if grader_id == owner_id {
        return Ok(GradingSlot::MainFaculty);
    }
    supervision::slot_of(invitations, grader_id)
        .map(GradingSlot::from)
        .ok_or_else(|| {
            CoreError::Forbidden("You are not permitted to grade this thesis".to_string())
        })
}

/// Outcome of evaluating the completion rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Completion {
    /// Still waiting for at least one expected grader.
    Pending,
    /// Every expected grader has submitted; carries the final mark.
    Complete { final_mark: f64 },
    /// No accepted supervisor: the rule set defines no completion path.
    NoCompletionPath,
}

/// Apply the completion rule for `active_supervisors` accepted supervisors.
pub fn evaluate_completion(marks: &Marks, active_supervisors: usize) -> Completion {
    let expected = match active_supervisors {
        0 => return Completion::NoCompletionPath,
        1 => vec![marks.main_faculty, marks.supervisor1],
        _ => vec![marks.main_faculty, marks.supervisor1, marks.supervisor2],
    };

    let present: Vec<f64> = expected.iter().flatten().copied().collect();
    if present.len() < expected.len() {
        return Completion::Pending;
    }

    let final_mark = present.iter().sum::<f64>() / present.len() as f64;
    Completion::Complete { final_mark }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::supervision::InvitationState;
    use assert_matches::assert_matches;
    use chrono::Utc;

    fn supervisor(faculty_id: DbId, slot: SupervisorSlot) -> Invitation {
        Invitation {
            faculty_id,
            invited_by_id: 1,
            state: InvitationState::Accepted {
                slot,
                accepted_at: Utc::now(),
            },
        }
    }

    #[test]
    fn mark_bounds_are_inclusive() {
        assert!(validate_mark(0.0).is_ok());
        assert!(validate_mark(10.0).is_ok());
        assert!(validate_mark(7.5).is_ok());
    }

    #[test]
    fn out_of_range_marks_are_rejected() {
        assert_matches!(validate_mark(-0.1), Err(CoreError::Validation(_)));
        assert_matches!(validate_mark(10.01), Err(CoreError::Validation(_)));
        assert_matches!(validate_mark(f64::NAN), Err(CoreError::Validation(_)));
        assert_matches!(validate_mark(f64::INFINITY), Err(CoreError::Validation(_)));
    }

    #[test]
    fn owner_grades_as_main_faculty() {
        assert_eq!(resolve_slot(1, 1, &[]).unwrap(), GradingSlot::MainFaculty);
    }

    #[test]
    fn supervisors_grade_into_their_stored_slot() {
        let invitations = vec![
            supervisor(20, SupervisorSlot::Second),
            supervisor(30, SupervisorSlot::First),
        ];
        assert_eq!(resolve_slot(30, 1, &invitations).unwrap(), GradingSlot::Supervisor1);
        assert_eq!(resolve_slot(20, 1, &invitations).unwrap(), GradingSlot::Supervisor2);
    }

    #[test]
    fn pending_invitee_cannot_grade() {
        let invitations = vec![Invitation::pending(40, 1)];
        assert_matches!(resolve_slot(40, 1, &invitations), Err(CoreError::Forbidden(_)));
        assert_matches!(resolve_slot(41, 1, &invitations), Err(CoreError::Forbidden(_)));
    }

    #[test]
    fn recording_twice_conflicts_and_keeps_first_mark() {
        let mut marks = Marks::default();
        marks.record(GradingSlot::Supervisor1, 6.0).unwrap();
        assert_matches!(
            marks.record(GradingSlot::Supervisor1, 9.0),
            Err(CoreError::Conflict(_))
        );
        assert_eq!(marks.get(GradingSlot::Supervisor1), Some(6.0));
    }

    #[test]
    fn zero_supervisors_never_complete() {
        let marks = Marks {
            main_faculty: Some(8.0),
            ..Marks::default()
        };
        assert_eq!(evaluate_completion(&marks, 0), Completion::NoCompletionPath);
    }

    #[test]
    fn one_supervisor_completes_with_two_marks() {
        let mut marks = Marks::default();
        marks.record(GradingSlot::MainFaculty, 8.0).unwrap();
        assert_eq!(evaluate_completion(&marks, 1), Completion::Pending);
        marks.record(GradingSlot::Supervisor1, 6.0).unwrap();
        assert_eq!(
            evaluate_completion(&marks, 1),
            Completion::Complete { final_mark: 7.0 }
        );
    }

    #[test]
    fn two_supervisors_need_all_three_marks() {
        let marks = Marks {
            main_faculty: Some(9.0),
            supervisor1: Some(7.0),
            supervisor2: None,
        };
        assert_eq!(evaluate_completion(&marks, 2), Completion::Pending);

        let marks = Marks {
            supervisor2: Some(8.0),
            ..marks
        };
        assert_eq!(
            evaluate_completion(&marks, 2),
            Completion::Complete { final_mark: 8.0 }
        );
    }

    #[test]
    fn slot_columns() {
        assert_eq!(GradingSlot::MainFaculty.column(), "main_faculty_mark");
        assert_eq!(GradingSlot::from(SupervisorSlot::Second).column(), "supervisor2_mark");
    }
}
