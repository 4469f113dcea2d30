//! The thesis aggregate: one thesis plus its invitation records.
//!
//! Repositories lock the thesis row, load a [`ThesisAggregate`], call one of
//! the transition methods below and persist what the returned outcome
//! describes, all inside one transaction. The methods mutate `self` so the
//! aggregate always reflects the committed state on success.
//!
//! On error the aggregate is left unchanged. A refused acceptance is not an
//! error at this level: it comes back as [`AcceptOutcome::Refused`] because
//! the deletion of the refused invitation still has to be committed.

use crate::error::CoreError;
use crate::grading::{self, Completion, GradingSlot, Marks};
use crate::roles::Role;
use crate::status::ThesisStatus;
use crate::supervision::{
    self, Invitation, InvitationState, SupervisorSlot, MAX_SUPERVISORS,
};
use crate::thesis::ensure_owner;
use crate::types::{DbId, Timestamp};

#[derive(Debug, Clone, PartialEq)]
pub struct ThesisAggregate {
    pub id: DbId,
    /// Proposing (main) faculty member. Never changes.
    pub faculty_id: DbId,
    pub status: ThesisStatus,
    pub assigned_to_id: Option<DbId>,
    pub marks: Marks,
    pub final_mark: Option<f64>,
    pub invitations: Vec<Invitation>,
}

/// Result of an acceptance attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum AcceptOutcome {
    /// The invitation now holds `slot`. `purged` lists faculty whose pending
    /// invitations were dropped because this acceptance filled the last slot.
    Accepted {
        slot: SupervisorSlot,
        accepted_at: Timestamp,
        purged: Vec<DbId>,
    },
    /// Both slots were already taken; the invitation has been removed.
    Refused,
}

impl AcceptOutcome {
    /// Collapse into the caller-facing result: the 1-indexed position on
    /// success, `Capacity` when refused.
    pub fn into_result(self) -> Result<SupervisorSlot, CoreError> {
        match self {
            AcceptOutcome::Accepted { slot, .. } => Ok(slot),
            AcceptOutcome::Refused => Err(supervision::supervisors_full()),
        }
    }
}

/// Result of a successful mark submission.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeOutcome {
    pub slot: GradingSlot,
    pub mark: f64,
    pub completion: Completion,
    /// Pending invitations dropped because the thesis completed.
    pub purged: Vec<DbId>,
}

impl ThesisAggregate {
    /// A freshly proposed thesis.
    pub fn new_open(id: DbId, faculty_id: DbId) -> Self {
        Self {
            id,
            faculty_id,
            status: ThesisStatus::Open,
            assigned_to_id: None,
            marks: Marks::default(),
            final_mark: None,
            invitations: Vec::new(),
        }
    }

    pub fn accepted_supervisors(&self) -> usize {
        supervision::accepted_count(&self.invitations)
    }

    pub fn invitation(&self, faculty_id: DbId) -> Option<&Invitation> {
        self.invitations.iter().find(|inv| inv.faculty_id == faculty_id)
    }

    /* ----------------------------------------------------------------------
    Status transitions
    ---------------------------------------------------------------------- */

    /// Assign `student_id` to the thesis. Owner only, exactly once.
    pub fn assign(&mut self, actor_id: DbId, student_id: DbId) -> Result<(), CoreError> {
        ensure_owner(self.faculty_id, actor_id)?;
        self.status.ensure_transition(ThesisStatus::Assigned)?;
        self.status = ThesisStatus::Assigned;
        self.assigned_to_id = Some(student_id);
        Ok(())
    }

    /// Cancel the thesis. Allowed for the owner and for any secretary.
    ///
    /// Returns the faculty ids whose pending invitations were dropped.
    pub fn cancel(&mut self, actor_id: DbId, actor_role: Role) -> Result<Vec<DbId>, CoreError> {
        if actor_role != Role::Secretary {
            ensure_owner(self.faculty_id, actor_id)?;
        }
        self.status.ensure_transition(ThesisStatus::Cancelled)?;
        self.status = ThesisStatus::Cancelled;
        Ok(self.purge_pending())
    }

    /* ----------------------------------------------------------------------
    Supervision invitations
    ---------------------------------------------------------------------- */

    /// Invite `target_id` to co-supervise.
    pub fn invite(
        &mut self,
        inviter_id: DbId,
        target_id: DbId,
        target_role: Role,
    ) -> Result<Invitation, CoreError> {
        supervision::ensure_inviter_standing(inviter_id, self.faculty_id, self.assigned_to_id)?;
        if self.status.is_terminal() {
            return Err(CoreError::InvalidState(format!(
                "A {} thesis does not accept new supervisors",
                self.status
            )));
        }
        supervision::ensure_valid_invitee(target_id, target_role, self.faculty_id)?;
        if self.invitation(target_id).is_some() {
            return Err(CoreError::Conflict(
                "This faculty member has already been invited".to_string(),
            ));
        }
        if self.accepted_supervisors() >= MAX_SUPERVISORS {
            return Err(supervision::supervisors_full());
        }

        let invitation = Invitation::pending(target_id, inviter_id);
        self.invitations.push(invitation.clone());
        Ok(invitation)
    }

    /// Accept the pending invitation of `faculty_id`.
    ///
    /// With both slots taken the invitation is removed and
    /// [`AcceptOutcome::Refused`] returned; the caller must still persist the
    /// removal. Filling the last slot drops every other pending invitation.
    ///
    /// A faculty member whose invitation was already dropped because the
    /// slots filled up gets `Capacity`, same as if they had raced and lost.
    pub fn accept(&mut self, faculty_id: DbId, now: Timestamp) -> Result<AcceptOutcome, CoreError> {
        let position = match self.pending_position(faculty_id) {
            Ok(position) => position,
            Err(err) => {
                let supervising = supervision::slot_of(&self.invitations, faculty_id).is_some();
                if !supervising && self.accepted_supervisors() >= MAX_SUPERVISORS {
                    return Err(supervision::supervisors_full());
                }
                return Err(err);
            }
        };
        if self.status.is_terminal() {
            return Err(CoreError::InvalidState(format!(
                "A {} thesis does not accept new supervisors",
                self.status
            )));
        }

        let Some(slot) = supervision::next_free_slot(&self.invitations) else {
            self.invitations.remove(position);
            return Ok(AcceptOutcome::Refused);
        };

        self.invitations[position].state = InvitationState::Accepted {
            slot,
            accepted_at: now,
        };

        let purged = if self.accepted_supervisors() >= MAX_SUPERVISORS {
            self.purge_pending()
        } else {
            Vec::new()
        };

        Ok(AcceptOutcome::Accepted {
            slot,
            accepted_at: now,
            purged,
        })
    }

    /// Reject (delete) the pending invitation of `faculty_id`.
    pub fn reject(&mut self, faculty_id: DbId) -> Result<(), CoreError> {
        let position = self.pending_position(faculty_id)?;
        self.invitations.remove(position);
        Ok(())
    }

    /* ----------------------------------------------------------------------
    Grading
    ---------------------------------------------------------------------- */

    /// Record `mark` from `grader_id` and complete the thesis if every
    /// expected grader has now submitted.
    pub fn grade(&mut self, grader_id: DbId, mark: f64) -> Result<GradeOutcome, CoreError> {
        grading::validate_mark(mark)?;
        if self.status != ThesisStatus::Assigned {
            return Err(CoreError::InvalidState(format!(
                "Only an ASSIGNED thesis can be graded, this one is {}",
                self.status
            )));
        }
        let slot = grading::resolve_slot(grader_id, self.faculty_id, &self.invitations)?;
        self.marks.record(slot, mark)?;

        let completion = grading::evaluate_completion(&self.marks, self.accepted_supervisors());
        let mut purged = Vec::new();
        if let Completion::Complete { final_mark } = completion {
            self.status = ThesisStatus::Completed;
            self.final_mark = Some(final_mark);
            purged = self.purge_pending();
        }

        Ok(GradeOutcome {
            slot,
            mark,
            completion,
            purged,
        })
    }

    /* ----------------------------------------------------------------------
    Helpers
    ---------------------------------------------------------------------- */

    fn pending_position(&self, faculty_id: DbId) -> Result<usize, CoreError> {
        self.invitations
            .iter()
            .position(|inv| inv.faculty_id == faculty_id && inv.state.is_pending())
            .ok_or(CoreError::NotFound {
                entity: "PendingInvitation",
                id: self.id,
            })
    }

    fn purge_pending(&mut self) -> Vec<DbId> {
        let purged = self
            .invitations
            .iter()
            .filter(|inv| inv.state.is_pending())
            .map(|inv| inv.faculty_id)
            .collect();
        self.invitations.retain(|inv| !inv.state.is_pending());
        purged
    }
}
