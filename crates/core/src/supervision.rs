//! Co-supervision invitations.
//!
//! An invitation is either pending or accepted into one of two supervisor
//! slots. There is no rejected state: a rejected, withdrawn or refused
//! invitation is deleted, which is observationally the same as never having
//! been invited.
//!
//! The slot is fixed at acceptance time and stored with the invitation.
//! Acceptances fill slots in arrival order, so the first faculty member to
//! accept grades as supervisor 1 regardless of who was invited first.

use serde::Serialize;

use crate::error::CoreError;
use crate::roles::Role;
use crate::status::InvitationStatus;
use crate::types::{DbId, Timestamp};

/// Maximum number of accepted co-supervisors per thesis.
pub const MAX_SUPERVISORS: usize = 2;

/// One of the two co-supervisor grading slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum SupervisorSlot {
    First = 1,
    Second = 2,
}

impl SupervisorSlot {
    pub const ALL: [SupervisorSlot; MAX_SUPERVISORS] = [SupervisorSlot::First, SupervisorSlot::Second];

    /// 1-indexed position, as stored in `supervising_faculty.slot_index`.
    pub fn index(self) -> i16 {
        self as i16
    }

    pub fn from_index(index: i16) -> Option<Self> {
        match index {
            1 => Some(SupervisorSlot::First),
            2 => Some(SupervisorSlot::Second),
            _ => None,
        }
    }
}

/// State of an existing invitation row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvitationState {
    Pending,
    Accepted {
        slot: SupervisorSlot,
        accepted_at: Timestamp,
    },
}

impl InvitationState {
    pub fn status(&self) -> InvitationStatus {
        match self {
            InvitationState::Pending => InvitationStatus::Pending,
            InvitationState::Accepted { .. } => InvitationStatus::Accepted,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, InvitationState::Pending)
    }

    pub fn slot(&self) -> Option<SupervisorSlot> {
        match self {
            InvitationState::Pending => None,
            InvitationState::Accepted { slot, .. } => Some(*slot),
        }
    }
}

/// A supervision invitation for one faculty member on one thesis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Invitation {
    pub faculty_id: DbId,
    pub invited_by_id: DbId,
    pub state: InvitationState,
}

impl Invitation {
    pub fn pending(faculty_id: DbId, invited_by_id: DbId) -> Self {
        Self {
            faculty_id,
            invited_by_id,
            state: InvitationState::Pending,
        }
    }
}

/// Number of accepted invitations among `invitations`.
pub fn accepted_count(invitations: &[Invitation]) -> usize {
    invitations
        .iter()
        .filter(|inv| !inv.state.is_pending())
        .count()
}

/// The slot held by `faculty_id`, if they are an accepted supervisor.
pub fn slot_of(invitations: &[Invitation], faculty_id: DbId) -> Option<SupervisorSlot> {
    invitations
        .iter()
        .find(|inv| inv.faculty_id == faculty_id)
        .and_then(|inv| inv.state.slot())
}

/// Lowest slot not yet taken, or `None` when both are filled.
///
/// Slots are handed out in acceptance order, so this is slot 1 for the first
/// acceptance and slot 2 for the second.
pub fn next_free_slot(invitations: &[Invitation]) -> Option<SupervisorSlot> {
    SupervisorSlot::ALL
        .into_iter()
        .find(|slot| !invitations.iter().any(|inv| inv.state.slot() == Some(*slot)))
}

/// The error returned when a thesis already holds both supervisors.
pub fn supervisors_full() -> CoreError {
    CoreError::Capacity(format!("Thesis already has {MAX_SUPERVISORS} supervisors"))
}

/// Check who may send an invitation: the assigned student or the owner.
pub fn ensure_inviter_standing(
    inviter_id: DbId,
    owner_id: DbId,
    assigned_to_id: Option<DbId>,
) -> Result<(), CoreError> {
    if inviter_id == owner_id || assigned_to_id == Some(inviter_id) {
        return Ok(());
    }
    Err(CoreError::Forbidden(
        "Only the assigned student or the proposing faculty member can invite supervisors"
            .to_string(),
    ))
}

/// Check the invitation target: a faculty member other than the owner.
pub fn ensure_valid_invitee(
    target_id: DbId,
    target_role: Role,
    owner_id: DbId,
) -> Result<(), CoreError> {
    if target_role != Role::Faculty {
        return Err(CoreError::Validation(
            "Only faculty members can be invited as supervisors".to_string(),
        ));
    }
    if target_id == owner_id {
        return Err(CoreError::Validation(
            "The proposing faculty member cannot supervise their own thesis".to_string(),
        ));
    }
    Ok(())
}
