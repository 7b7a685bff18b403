use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Create-or-edit payload for a proposal. Identity fields are optional;
/// whatever is missing is backfilled from the job and the identity resolver.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SubmitApplicationDto {
    pub job_id: Uuid,
    pub worker_id: Uuid,

    #[validate(email(message = "Invalid worker email"))]
    pub worker_email: Option<String>,

    #[validate(length(max = 120, message = "Name must be at most 120 characters"))]
    pub worker_name: Option<String>,

    pub worker_phone: Option<String>,

    #[validate(email(message = "Invalid client email"))]
    pub client_email: Option<String>,

    #[validate(length(max = 5000, message = "Proposal must be at most 5000 characters"))]
    pub proposal_text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateApplicationStatusDto {
    // Raw string: an unknown status is a 400 validation error
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct WithdrawQuery {
    pub worker_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct AddNoteDto {
    pub author_id: Uuid,

    #[validate(length(min = 1, max = 2000, message = "Note must be between 1 and 2000 characters"))]
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct NoteAuthorQuery {
    pub author_id: Uuid,
}
