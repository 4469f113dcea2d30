//! Supervision invitation rows (`supervising_faculty`).

use serde::Serialize;
use sqlx::FromRow;
use thesis_core::error::CoreError;
use thesis_core::status::{InvitationStatus, StatusId};
use thesis_core::supervision::{Invitation, InvitationState, SupervisorSlot};
use thesis_core::types::{DbId, Timestamp};

/// One invitation row. `slot_index` and `accepted_at` are set together,
/// exactly when the invitation is accepted.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SupervisingFaculty {
    pub id: DbId,
    pub thesis_id: DbId,
    pub faculty_id: DbId,
    pub invited_by_id: DbId,
    pub status_id: StatusId,
    pub slot_index: Option<i16>,
    pub accepted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl SupervisingFaculty {
    /// Convert the row into the domain invitation.
    ///
    /// Fails with `Internal` on a row whose status, slot and timestamp
    /// disagree; the table's `CHECK` constraint should make that impossible.
    pub fn to_invitation(&self) -> Result<Invitation, CoreError> {
        let state = match (
            InvitationStatus::from_id(self.status_id),
            self.slot_index.and_then(SupervisorSlot::from_index),
            self.accepted_at,
        ) {
            (Some(InvitationStatus::Pending), None, None) => InvitationState::Pending,
            (Some(InvitationStatus::Accepted), Some(slot), Some(accepted_at)) => {
                InvitationState::Accepted { slot, accepted_at }
            }
            _ => {
                return Err(CoreError::Internal(format!(
                    "Inconsistent supervising_faculty row {}",
                    self.id
                )))
            }
        };
        Ok(Invitation {
            faculty_id: self.faculty_id,
            invited_by_id: self.invited_by_id,
            state,
        })
    }
}

/// A pending invitation as listed for the invited faculty member.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PendingInvitation {
    pub id: DbId,
    pub thesis_id: DbId,
    pub thesis_title: String,
    pub invited_by_id: DbId,
    pub created_at: Timestamp,
}
