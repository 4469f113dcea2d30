//! Integration tests for the thesis lifecycle against a real database.
//!
//! Exercises the workflow repositories end to end:
//! - Selection rules and the one-selection-per-student index
//! - Assignment, cancellation and owner-only deletion
//! - Invitation protocol: slot order, purge on second acceptance, refusals
//! - Grading: write-once slots and completion with the final mark
//! - Concurrent second acceptances serialize on the thesis row lock
//! - Account deletion removes owned and assigned theses and invitations

use assert_matches::assert_matches;
use sqlx::PgPool;
use thesis_core::error::CoreError;
use thesis_core::grading::GradingSlot;
use thesis_core::roles::Role;
use thesis_core::status::{InvitationStatus, ThesisStatus};
use thesis_core::types::DbId;
use thesis_db::models::thesis::{CreateThesis, ThesisFilter, UpdateThesis};
use thesis_db::models::user::CreateUser;
use thesis_db::repositories::{
    GradingRepo, SelectionRepo, SupervisionRepo, ThesisRepo, UserRepo,
};
use thesis_db::RepoError;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn user(pool: &PgPool, username: &str, role: Role) -> DbId {
    let input = CreateUser {
        username: username.to_string(),
        email: format!("{username}@uni.example.edu"),
        password_hash: "not-a-real-hash".to_string(),
        full_name: username.to_string(),
        role,
        student_number: None,
        postal_address: None,
        mobile_phone: None,
        landline_phone: None,
    };
    UserRepo::create(pool, &input).await.unwrap().id
}

async fn open_thesis(pool: &PgPool, faculty_id: DbId, title: &str) -> DbId {
    let input = CreateThesis {
        title: title.to_string(),
        description: "A thesis worth writing".to_string(),
        pdf_url: None,
    };
    ThesisRepo::create(pool, faculty_id, &input).await.unwrap().id
}

struct Cast {
    f1: DbId,
    f2: DbId,
    f3: DbId,
    f4: DbId,
    student: DbId,
    thesis: DbId,
}

/// Four faculty members, one student, and a thesis owned by `f1` already
/// assigned to the student.
async fn assigned_cast(pool: &PgPool) -> Cast {
    let f1 = user(pool, "f1", Role::Faculty).await;
    let f2 = user(pool, "f2", Role::Faculty).await;
    let f3 = user(pool, "f3", Role::Faculty).await;
    let f4 = user(pool, "f4", Role::Faculty).await;
    let student = user(pool, "s1", Role::Student).await;
    let thesis = open_thesis(pool, f1, "Assigned thesis").await;
    ThesisRepo::assign(pool, f1, thesis, student).await.unwrap();
    Cast {
        f1,
        f2,
        f3,
        f4,
        student,
        thesis,
    }
}

fn core_err(result: Result<impl std::fmt::Debug, RepoError>) -> CoreError {
    match result {
        Err(RepoError::Core(err)) => err,
        other => panic!("expected a domain error, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Creation and listing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_requires_title_and_description(pool: PgPool) {
    let f1 = user(&pool, "f1", Role::Faculty).await;
    let input = CreateThesis {
        title: "  ".to_string(),
        description: "Something".to_string(),
        pdf_url: None,
    };

    let err = core_err(ThesisRepo::create(&pool, f1, &input).await);
    assert_matches!(err, CoreError::Validation(_));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_filters_by_status_and_owner(pool: PgPool) {
    let c = assigned_cast(&pool).await;
    open_thesis(&pool, c.f1, "Still open").await;
    open_thesis(&pool, c.f2, "Someone else's").await;

    let open = ThesisRepo::list(
        &pool,
        &ThesisFilter {
            status: Some(ThesisStatus::Open),
            faculty_id: Some(c.f1),
        },
    )
    .await
    .unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].title, "Still open");

    let all = ThesisRepo::list(&pool, &ThesisFilter::default()).await.unwrap();
    assert_eq!(all.len(), 3);
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_single_selection_per_student(pool: PgPool) {
    let f1 = user(&pool, "f1", Role::Faculty).await;
    let student = user(&pool, "s1", Role::Student).await;
    let x = open_thesis(&pool, f1, "X").await;
    let y = open_thesis(&pool, f1, "Y").await;

    SelectionRepo::select(&pool, student, x).await.unwrap();
    assert_matches!(
        core_err(SelectionRepo::select(&pool, student, y).await),
        CoreError::Conflict(_)
    );

    SelectionRepo::unselect(&pool, student, x).await.unwrap();
    SelectionRepo::select(&pool, student, y).await.unwrap();

    let held = SelectionRepo::find_for_student(&pool, student).await.unwrap().unwrap();
    assert_eq!(held.thesis_id, y);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unselect_without_selection_is_not_found(pool: PgPool) {
    let f1 = user(&pool, "f1", Role::Faculty).await;
    let student = user(&pool, "s1", Role::Student).await;
    let x = open_thesis(&pool, f1, "X").await;

    assert_matches!(
        core_err(SelectionRepo::unselect(&pool, student, x).await),
        CoreError::NotFound { .. }
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_select_unknown_thesis_is_not_found(pool: PgPool) {
    let student = user(&pool, "s1", Role::Student).await;
    assert_matches!(
        core_err(SelectionRepo::select(&pool, student, 9_999).await),
        CoreError::NotFound { entity: "Thesis", .. }
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_selections_by_one_student(pool: PgPool) {
    let f1 = user(&pool, "f1", Role::Faculty).await;
    let student = user(&pool, "s1", Role::Student).await;
    let x = open_thesis(&pool, f1, "X").await;
    let y = open_thesis(&pool, f1, "Y").await;

    let (a, b) = tokio::join!(
        SelectionRepo::select(&pool, student, x),
        SelectionRepo::select(&pool, student, y),
    );

    // Different theses lock different rows; the unique index decides.
    assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM thesis_selections WHERE student_id = $1")
            .bind(student)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(count, 1);
}

// ---------------------------------------------------------------------------
// Assignment, cancellation, deletion
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_assign_clears_selection_pool(pool: PgPool) {
    let f1 = user(&pool, "f1", Role::Faculty).await;
    let s1 = user(&pool, "s1", Role::Student).await;
    let s2 = user(&pool, "s2", Role::Student).await;
    let thesis = open_thesis(&pool, f1, "X").await;
    SelectionRepo::select(&pool, s1, thesis).await.unwrap();
    SelectionRepo::select(&pool, s2, thesis).await.unwrap();

    let assigned = ThesisRepo::assign(&pool, f1, thesis, s2).await.unwrap();
    assert_eq!(assigned.status_id, ThesisStatus::Assigned.id());
    assert_eq!(assigned.assigned_to_id, Some(s2));
    assert!(SelectionRepo::list_for_thesis(&pool, thesis).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_assign_rules(pool: PgPool) {
    let f1 = user(&pool, "f1", Role::Faculty).await;
    let f2 = user(&pool, "f2", Role::Faculty).await;
    let s1 = user(&pool, "s1", Role::Student).await;
    let thesis = open_thesis(&pool, f1, "X").await;

    assert_matches!(
        core_err(ThesisRepo::assign(&pool, f2, thesis, s1).await),
        CoreError::Forbidden(_)
    );
    assert_matches!(
        core_err(ThesisRepo::assign(&pool, f1, thesis, f2).await),
        CoreError::NotFound { entity: "Student", .. }
    );

    ThesisRepo::assign(&pool, f1, thesis, s1).await.unwrap();
    assert_matches!(
        core_err(ThesisRepo::assign(&pool, f1, thesis, s1).await),
        CoreError::InvalidState(_)
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_secretary_cancel_drops_pending_invitations(pool: PgPool) {
    let c = assigned_cast(&pool).await;
    let secretary = user(&pool, "sec", Role::Secretary).await;
    SupervisionRepo::invite(&pool, c.student, c.thesis, c.f2).await.unwrap();

    let cancelled = ThesisRepo::cancel(&pool, secretary, Role::Secretary, c.thesis)
        .await
        .unwrap();
    assert_eq!(cancelled.status_id, ThesisStatus::Cancelled.id());
    assert!(SupervisionRepo::list_for_thesis(&pool, c.thesis).await.unwrap().is_empty());

    assert_matches!(
        core_err(ThesisRepo::cancel(&pool, c.f1, Role::Faculty, c.thesis).await),
        CoreError::InvalidState(_)
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_is_owner_only_and_blocked_when_terminal(pool: PgPool) {
    let c = assigned_cast(&pool).await;
    let input = UpdateThesis {
        title: Some("Renamed".to_string()),
        ..UpdateThesis::default()
    };

    assert_matches!(
        core_err(ThesisRepo::update(&pool, c.f2, c.thesis, &input).await),
        CoreError::Forbidden(_)
    );
    let updated = ThesisRepo::update(&pool, c.f1, c.thesis, &input).await.unwrap();
    assert_eq!(updated.title, "Renamed");
    assert_eq!(updated.description, "A thesis worth writing");

    ThesisRepo::cancel(&pool, c.f1, Role::Faculty, c.thesis).await.unwrap();
    assert_matches!(
        core_err(ThesisRepo::update(&pool, c.f1, c.thesis, &input).await),
        CoreError::InvalidState(_)
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_cascades(pool: PgPool) {
    let c = assigned_cast(&pool).await;
    SupervisionRepo::invite(&pool, c.f1, c.thesis, c.f2).await.unwrap();

    assert_matches!(
        core_err(ThesisRepo::delete(&pool, c.f2, c.thesis).await),
        CoreError::Forbidden(_)
    );
    ThesisRepo::delete(&pool, c.f1, c.thesis).await.unwrap();

    assert!(ThesisRepo::find_by_id(&pool, c.thesis).await.unwrap().is_none());
    let (left,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM supervising_faculty WHERE thesis_id = $1")
            .bind(c.thesis)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(left, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_student_pdf_only_by_assigned_student(pool: PgPool) {
    let c = assigned_cast(&pool).await;
    let other = user(&pool, "s2", Role::Student).await;

    assert_matches!(
        core_err(ThesisRepo::attach_student_pdf(&pool, other, c.thesis, "/files/t.pdf").await),
        CoreError::Forbidden(_)
    );
    let thesis = ThesisRepo::attach_student_pdf(&pool, c.student, c.thesis, "/files/t.pdf")
        .await
        .unwrap();
    assert_eq!(thesis.student_pdf_url.as_deref(), Some("/files/t.pdf"));
}

// ---------------------------------------------------------------------------
// Invitations
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_acceptance_order_assigns_slots_and_purges(pool: PgPool) {
    let c = assigned_cast(&pool).await;
    for faculty in [c.f2, c.f3, c.f4] {
        SupervisionRepo::invite(&pool, c.f1, c.thesis, faculty).await.unwrap();
    }
    let pending = SupervisionRepo::list_pending_for_faculty(&pool, c.f4).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].thesis_title, "Assigned thesis");

    let first = SupervisionRepo::accept(&pool, c.f3, c.thesis).await.unwrap();
    assert_eq!(first.slot_index, Some(1));
    let second = SupervisionRepo::accept(&pool, c.f2, c.thesis).await.unwrap();
    assert_eq!(second.slot_index, Some(2));

    let rows = SupervisionRepo::list_for_thesis(&pool, c.thesis).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows
        .iter()
        .all(|r| r.status_id == InvitationStatus::Accepted.id()));
    assert!(SupervisionRepo::list_pending_for_faculty(&pool, c.f4)
        .await
        .unwrap()
        .is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_invite_rules(pool: PgPool) {
    let c = assigned_cast(&pool).await;
    let outsider = user(&pool, "s2", Role::Student).await;

    assert_matches!(
        core_err(SupervisionRepo::invite(&pool, outsider, c.thesis, c.f2).await),
        CoreError::Forbidden(_)
    );
    assert_matches!(
        core_err(SupervisionRepo::invite(&pool, c.student, c.thesis, outsider).await),
        CoreError::Validation(_)
    );
    assert_matches!(
        core_err(SupervisionRepo::invite(&pool, c.student, c.thesis, 9_999).await),
        CoreError::NotFound { entity: "User", .. }
    );

    let row = SupervisionRepo::invite(&pool, c.student, c.thesis, c.f2).await.unwrap();
    assert_eq!(row.invited_by_id, c.student);
    assert_eq!(row.slot_index, None);
    assert_matches!(
        core_err(SupervisionRepo::invite(&pool, c.f1, c.thesis, c.f2).await),
        CoreError::Conflict(_)
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reject_deletes_invitation(pool: PgPool) {
    let c = assigned_cast(&pool).await;
    SupervisionRepo::invite(&pool, c.student, c.thesis, c.f2).await.unwrap();

    SupervisionRepo::reject(&pool, c.f2, c.thesis).await.unwrap();
    assert!(SupervisionRepo::list_for_thesis(&pool, c.thesis).await.unwrap().is_empty());
    assert_matches!(
        core_err(SupervisionRepo::reject(&pool, c.f2, c.thesis).await),
        CoreError::NotFound { .. }
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_second_acceptances_serialize(pool: PgPool) {
    let c = assigned_cast(&pool).await;
    for faculty in [c.f2, c.f3, c.f4] {
        SupervisionRepo::invite(&pool, c.f1, c.thesis, faculty).await.unwrap();
    }
    SupervisionRepo::accept(&pool, c.f2, c.thesis).await.unwrap();

    let results = futures::future::join_all([
        SupervisionRepo::accept(&pool, c.f3, c.thesis),
        SupervisionRepo::accept(&pool, c.f4, c.thesis),
    ])
    .await;

    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "exactly one second acceptance must win");
    for result in results {
        if let Err(err) = result {
            assert_matches!(err, RepoError::Core(CoreError::Capacity(_)));
        }
    }

    let (accepted, pending): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*) FILTER (WHERE status_id = 2), COUNT(*) FILTER (WHERE status_id = 1)
         FROM supervising_faculty WHERE thesis_id = $1",
    )
    .bind(c.thesis)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(accepted, 2);
    assert_eq!(pending, 0);
}

// ---------------------------------------------------------------------------
// Grading
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_main_mark_without_supervisors_stays_assigned(pool: PgPool) {
    let c = assigned_cast(&pool).await;

    let submission = GradingRepo::grade(&pool, c.f1, c.thesis, 8.0).await.unwrap();
    assert_eq!(submission.slot, GradingSlot::MainFaculty);
    assert!(!submission.completed);
    assert_eq!(submission.thesis.status_id, ThesisStatus::Assigned.id());
    assert_eq!(submission.thesis.final_mark, None);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_one_supervisor_completes(pool: PgPool) {
    let c = assigned_cast(&pool).await;
    SupervisionRepo::invite(&pool, c.student, c.thesis, c.f2).await.unwrap();
    SupervisionRepo::accept(&pool, c.f2, c.thesis).await.unwrap();

    GradingRepo::grade(&pool, c.f1, c.thesis, 8.0).await.unwrap();
    let submission = GradingRepo::grade(&pool, c.f2, c.thesis, 6.0).await.unwrap();

    assert!(submission.completed);
    assert_eq!(submission.slot, GradingSlot::Supervisor1);
    assert_eq!(submission.thesis.status_id, ThesisStatus::Completed.id());
    assert_eq!(submission.thesis.final_mark, Some(7.0));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_two_supervisors_complete_and_slots_are_write_once(pool: PgPool) {
    let c = assigned_cast(&pool).await;
    for faculty in [c.f2, c.f3] {
        SupervisionRepo::invite(&pool, c.f1, c.thesis, faculty).await.unwrap();
        SupervisionRepo::accept(&pool, faculty, c.thesis).await.unwrap();
    }

    GradingRepo::grade(&pool, c.f3, c.thesis, 8.0).await.unwrap();
    assert_matches!(
        core_err(GradingRepo::grade(&pool, c.f3, c.thesis, 2.0).await),
        CoreError::Conflict(_)
    );
    assert_matches!(
        core_err(GradingRepo::grade(&pool, c.f4, c.thesis, 5.0).await),
        CoreError::Forbidden(_)
    );
    assert_matches!(
        core_err(GradingRepo::grade(&pool, c.f1, c.thesis, 10.5).await),
        CoreError::Validation(_)
    );

    GradingRepo::grade(&pool, c.f1, c.thesis, 9.0).await.unwrap();
    let last = GradingRepo::grade(&pool, c.f2, c.thesis, 7.0).await.unwrap();

    assert!(last.completed);
    assert_eq!(last.thesis.main_faculty_mark, Some(9.0));
    assert_eq!(last.thesis.supervisor1_mark, Some(7.0));
    assert_eq!(last.thesis.supervisor2_mark, Some(8.0));
    assert_eq!(last.thesis.final_mark, Some(8.0));
}

// ---------------------------------------------------------------------------
// Account deletion
// ---------------------------------------------------------------------------

async fn count(pool: &PgPool, table: &str) -> i64 {
    let (n,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap();
    n
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_deleting_owner_removes_their_theses_and_dependents(pool: PgPool) {
    let c = assigned_cast(&pool).await;
    SupervisionRepo::invite(&pool, c.f1, c.thesis, c.f2).await.unwrap();
    SupervisionRepo::invite(&pool, c.f1, c.thesis, c.f3).await.unwrap();
    SupervisionRepo::accept(&pool, c.f2, c.thesis).await.unwrap();

    let open = open_thesis(&pool, c.f1, "Open thesis").await;
    let applicant = user(&pool, "s2", Role::Student).await;
    SelectionRepo::select(&pool, applicant, open).await.unwrap();

    // Theses f1 neither owns nor is assigned to survive.
    let kept = open_thesis(&pool, c.f4, "Unrelated thesis").await;

    UserRepo::delete(&pool, c.f1).await.unwrap();

    assert!(UserRepo::find_by_id(&pool, c.f1).await.unwrap().is_none());
    assert!(ThesisRepo::find_by_id(&pool, c.thesis).await.unwrap().is_none());
    assert!(ThesisRepo::find_by_id(&pool, open).await.unwrap().is_none());
    assert!(ThesisRepo::find_by_id(&pool, kept).await.unwrap().is_some());
    assert_eq!(count(&pool, "supervising_faculty").await, 0);
    assert_eq!(count(&pool, "thesis_selections").await, 0);
    assert!(UserRepo::find_by_id(&pool, c.student).await.unwrap().is_some());
    assert!(UserRepo::find_by_id(&pool, c.f2).await.unwrap().is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_deleting_assigned_student_removes_the_thesis(pool: PgPool) {
    let c = assigned_cast(&pool).await;

    UserRepo::delete(&pool, c.student).await.unwrap();

    assert!(ThesisRepo::find_by_id(&pool, c.thesis).await.unwrap().is_none());
    assert!(UserRepo::find_by_id(&pool, c.f1).await.unwrap().is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_deleting_a_supervisor_frees_their_slot(pool: PgPool) {
    let c = assigned_cast(&pool).await;
    for faculty in [c.f2, c.f3] {
        SupervisionRepo::invite(&pool, c.f1, c.thesis, faculty).await.unwrap();
    }
    SupervisionRepo::accept(&pool, c.f2, c.thesis).await.unwrap();
    SupervisionRepo::accept(&pool, c.f3, c.thesis).await.unwrap();

    UserRepo::delete(&pool, c.f2).await.unwrap();

    let rows = SupervisionRepo::list_for_thesis(&pool, c.thesis).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].slot_index, Some(2));

    SupervisionRepo::invite(&pool, c.f1, c.thesis, c.f4).await.unwrap();
    let replacement = SupervisionRepo::accept(&pool, c.f4, c.thesis).await.unwrap();
    assert_eq!(replacement.slot_index, Some(1));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_deleting_unknown_user_is_not_found(pool: PgPool) {
    assert_matches!(
        core_err(UserRepo::delete(&pool, 9_999).await),
        CoreError::NotFound { entity: "User", .. }
    );
}
