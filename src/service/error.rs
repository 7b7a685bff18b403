use thiserror::Error;
use uuid::Uuid;

use crate::{
    error::HttpError,
    models::{applicationmodel::ApplicationStatus, jobmodel::JobStatus},
};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Job {0} not found")]
    JobNotFound(Uuid),

    #[error("Application {0} not found")]
    ApplicationNotFound(Uuid),

    #[error("Note {0} not found")]
    NoteNotFound(Uuid),

    #[error("Notification {0} not found")]
    NotificationNotFound(Uuid),

    #[error("User {0} not found")]
    UserNotFound(Uuid),

    #[error("Invalid job status transition: {} -> {}", .0.to_str(), .1.to_str())]
    InvalidJobTransition(JobStatus, JobStatus),

    #[error("User {0} is not authorized to perform this action on job {1}")]
    UnauthorizedJobAccess(Uuid, Uuid),

    #[error("User {0} is not authorized to perform this action on application {1}")]
    UnauthorizedApplicationAccess(Uuid, Uuid),

    #[error("User {0} is not authorized to perform this action on notification {1}")]
    UnauthorizedNotificationAccess(Uuid, Uuid),

    #[error("User {0} is not a participant of conversation {1}")]
    UnauthorizedConversationAccess(Uuid, String),

    #[error("You have already applied to this job")]
    DuplicateApplication(Uuid),

    #[error("Application {0} can no longer be edited (status {})", .1.to_str())]
    ApplicationNotEditable(Uuid, ApplicationStatus),

    #[error("Application {0} cannot be withdrawn (status {})", .1.to_str())]
    ApplicationNotWithdrawable(Uuid, ApplicationStatus),

    #[error("Job {0} still has an accepted application; complete or cancel it first")]
    JobHasAcceptedApplication(Uuid),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Other error: {0}")]
    Other(String),
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::JobNotFound(_)
            | ServiceError::ApplicationNotFound(_)
            | ServiceError::NoteNotFound(_)
            | ServiceError::NotificationNotFound(_)
            | ServiceError::UserNotFound(_) => HttpError::not_found(error.to_string()),

            ServiceError::InvalidJobTransition(_, _)
            | ServiceError::ApplicationNotWithdrawable(_, _)
            | ServiceError::Validation(_) => HttpError::bad_request(error.to_string()),

            ServiceError::UnauthorizedJobAccess(_, _)
            | ServiceError::UnauthorizedApplicationAccess(_, _)
            | ServiceError::UnauthorizedNotificationAccess(_, _)
            | ServiceError::UnauthorizedConversationAccess(_, _) => {
                HttpError::forbidden(error.to_string())
            }

            ServiceError::DuplicateApplication(_)
            | ServiceError::ApplicationNotEditable(_, _)
            | ServiceError::JobHasAcceptedApplication(_) => HttpError::conflict(error.to_string()),

            _ => HttpError::server_error(error.to_string()),
        }
    }
}

impl From<String> for ServiceError {
    fn from(err: String) -> Self {
        ServiceError::Other(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn permission_errors_map_to_forbidden() {
        let user = Uuid::new_v4();
        let errors = [
            ServiceError::UnauthorizedJobAccess(user, Uuid::new_v4()),
            ServiceError::UnauthorizedApplicationAccess(user, Uuid::new_v4()),
            ServiceError::UnauthorizedNotificationAccess(user, Uuid::new_v4()),
            ServiceError::UnauthorizedConversationAccess(user, "a_b".to_string()),
        ];

        for error in errors {
            assert_eq!(HttpError::from(error).status, StatusCode::FORBIDDEN);
        }
    }

    #[test]
    fn conflict_and_validation_classes_keep_their_codes() {
        let id = Uuid::new_v4();

        assert_eq!(
            HttpError::from(ServiceError::DuplicateApplication(id)).status,
            StatusCode::CONFLICT
        );
        assert_eq!(
            HttpError::from(ServiceError::Validation("bad status".to_string())).status,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            HttpError::from(ServiceError::JobNotFound(id)).status,
            StatusCode::NOT_FOUND
        );
    }
}
