use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::{
        applicationdb::{ApplicationExt, ApplicationUpsert},
        db::DBClient,
        jobdb::JobExt,
    },
    dtos::applicationdtos::SubmitApplicationDto,
    models::{
        applicationmodel::{Application, ApplicationNote, ApplicationStatus},
        jobmodel::Job,
        notificationmodel::NotificationKind,
    },
    service::{
        error::ServiceError,
        identity_service::{ContactIdentity, IdentityResolver},
        notification_service::NotificationService,
    },
};

/// Outcome of a submit: the stored application plus whether this call
/// created it (drives 201 vs 200 and the fan-out).
#[derive(Debug)]
pub struct SubmitOutcome {
    pub application: Application,
    pub inserted: bool,
}

/// Owns the Application lifecycle: the idempotent submit path, status
/// transitions, withdrawal and the notes sub-resource.
#[derive(Clone)]
pub struct ApplicationService {
    db_client: Arc<DBClient>,
    identity: Arc<IdentityResolver>,
    notification_service: Arc<NotificationService>,
}

impl ApplicationService {
    pub fn new(
        db_client: Arc<DBClient>,
        identity: Arc<IdentityResolver>,
        notification_service: Arc<NotificationService>,
    ) -> Self {
        Self {
            db_client,
            identity,
            notification_service,
        }
    }

    /// Create-or-edit a proposal. Edits are only legal while the stored row
    /// is still `pending`. Identity fields missing from both the request and
    /// the stored row are backfilled from the job and the identity resolver;
    /// the upsert itself never blanks a stored value. Concurrent submits for
    /// the same (job, worker) pair collapse into one row.
    pub async fn submit(&self, dto: SubmitApplicationDto) -> Result<SubmitOutcome, ServiceError> {
        if dto.job_id.is_nil() || dto.worker_id.is_nil() {
            return Err(ServiceError::Validation(
                "job_id and worker_id are required".to_string(),
            ));
        }

        let job = self
            .db_client
            .get_job_by_id(dto.job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(dto.job_id))?;

        let existing = self
            .db_client
            .get_application_for_pair(dto.job_id, dto.worker_id)
            .await?;

        if let Some(current) = &existing {
            if current.status != ApplicationStatus::Pending {
                return Err(ServiceError::ApplicationNotEditable(
                    current.id,
                    current.status,
                ));
            }
        }

        let params = self
            .build_upsert(&dto, existing.as_ref(), &job)
            .await;

        let upserted = match self.db_client.upsert_application(&params).await {
            Ok(upserted) => upserted,
            // The upsert absorbs the race under normal flow; if the unique
            // index still fires, surface it as "already applied"
            Err(err) if is_unique_violation(&err) => {
                return Err(ServiceError::DuplicateApplication(dto.job_id));
            }
            Err(err) => return Err(err.into()),
        };

        if upserted.inserted {
            let result = self
                .notification_service
                .notify(
                    job.client_id,
                    "New application received",
                    &format!(
                        "{} applied to your job \"{}\"",
                        display_name(&upserted.application.worker_name),
                        job.title
                    ),
                    NotificationKind::NewApplication,
                    Some(job.id),
                    Some(format!("/jobs/{}/applications", job.id)),
                )
                .await;
            if let Err(err) = result {
                tracing::error!(
                    "new-application fan-out failed for {}: {}",
                    upserted.application.id,
                    err
                );
            }
        }

        Ok(SubmitOutcome {
            application: upserted.application,
            inserted: upserted.inserted,
        })
    }

    async fn build_upsert(
        &self,
        dto: &SubmitApplicationDto,
        existing: Option<&Application>,
        job: &Job,
    ) -> ApplicationUpsert {
        let requested = ContactIdentity {
            email: dto.worker_email.clone().unwrap_or_default(),
            name: dto.worker_name.clone().unwrap_or_default(),
            phone: dto.worker_phone.clone().unwrap_or_default(),
        };
        let stored = existing.map(|app| ContactIdentity {
            email: app.worker_email.clone(),
            name: app.worker_name.clone(),
            phone: app.worker_phone.clone(),
        });

        // Only reach for the resolver when a field is absent on both the
        // request and the stored row
        let worker = if identity_gaps_remain(&requested, stored.as_ref()) {
            let resolved = self.identity.resolve(dto.worker_id).await;
            merge_worker_identity(requested, stored.as_ref(), &resolved)
        } else {
            requested
        };

        let client_email = match dto.client_email.clone().filter(|e| !e.is_empty()) {
            Some(email) => email,
            None => match existing.filter(|app| !app.client_email.is_empty()) {
                Some(app) => app.client_email.clone(),
                None => self.identity.resolve(job.client_id).await.email,
            },
        };

        ApplicationUpsert {
            job_id: dto.job_id,
            worker_id: dto.worker_id,
            client_id: Some(job.client_id),
            worker_email: worker.email,
            worker_name: worker.name,
            worker_phone: worker.phone,
            client_email,
            proposal_text: dto.proposal_text.clone().unwrap_or_default(),
        }
    }

    /// Any of the four statuses is accepted from any current state; the
    /// looser-than-jobs rule is deliberate (documented in DESIGN.md). A
    /// same-status call is a no-op that still bumps `updated_at`. Whether the
    /// status actually changed is read from the update statement itself, so
    /// two racing identical calls cannot both see a change and double-notify.
    pub async fn transition_status(
        &self,
        application_id: Uuid,
        raw_status: &str,
    ) -> Result<Application, ServiceError> {
        let target = ApplicationStatus::from_str(raw_status).ok_or_else(|| {
            ServiceError::Validation(format!(
                "status must be one of pending, accepted, rejected, completed (got: {raw_status})"
            ))
        })?;

        let application = self
            .db_client
            .get_application_by_id(application_id)
            .await?
            .ok_or(ServiceError::ApplicationNotFound(application_id))?;

        if !application.status.can_transition_to(target) {
            return Err(ServiceError::Validation(format!(
                "application cannot move from {} to {}",
                application.status.to_str(),
                target.to_str()
            )));
        }

        let updated = self
            .db_client
            .update_application_status(application_id, target)
            .await?;

        if let Some((title, body, kind)) =
            status_change_fanout(updated.previous_status, updated.application.status)
        {
            let result = self
                .notification_service
                .notify(
                    updated.application.worker_id,
                    title,
                    body,
                    kind,
                    Some(updated.application.job_id),
                    Some(format!("/jobs/{}", updated.application.job_id)),
                )
                .await;
            if let Err(err) = result {
                tracing::error!("status fan-out failed for {}: {}", application_id, err);
            }
        }

        Ok(updated.application)
    }

    /// Withdrawal: owner-only, and never once the proposal has been accepted
    /// or the work completed.
    pub async fn withdraw(&self, application_id: Uuid, worker_id: Uuid) -> Result<(), ServiceError> {
        let application = self
            .db_client
            .get_application_by_id(application_id)
            .await?
            .ok_or(ServiceError::ApplicationNotFound(application_id))?;

        if application.worker_id != worker_id {
            return Err(ServiceError::UnauthorizedApplicationAccess(
                worker_id,
                application_id,
            ));
        }

        if matches!(
            application.status,
            ApplicationStatus::Accepted | ApplicationStatus::Completed
        ) {
            return Err(ServiceError::ApplicationNotWithdrawable(
                application_id,
                application.status,
            ));
        }

        self.db_client.delete_application(application_id).await?;

        if let Some(client_id) = application.client_id {
            let result = self
                .notification_service
                .notify(
                    client_id,
                    "Application withdrawn",
                    &format!(
                        "{} withdrew their application",
                        display_name(&application.worker_name)
                    ),
                    NotificationKind::ApplicationWithdrawn,
                    Some(application.job_id),
                    Some(format!("/jobs/{}/applications", application.job_id)),
                )
                .await;
            if let Err(err) = result {
                tracing::error!("withdraw fan-out failed for {}: {}", application_id, err);
            }
        }

        Ok(())
    }

    pub async fn get_application(&self, application_id: Uuid) -> Result<Application, ServiceError> {
        self.db_client
            .get_application_by_id(application_id)
            .await?
            .ok_or(ServiceError::ApplicationNotFound(application_id))
    }

    pub async fn get_applications_for_job(
        &self,
        job_id: Uuid,
    ) -> Result<Vec<Application>, ServiceError> {
        let applications = self.db_client.get_applications_for_job(job_id).await?;
        Ok(applications)
    }

    pub async fn get_applications_for_worker(
        &self,
        worker_id: Uuid,
    ) -> Result<Vec<Application>, ServiceError> {
        let applications = self.db_client.get_applications_for_worker(worker_id).await?;
        Ok(applications)
    }

    pub async fn add_note(
        &self,
        application_id: Uuid,
        author_id: Uuid,
        body: String,
    ) -> Result<ApplicationNote, ServiceError> {
        if body.trim().is_empty() {
            return Err(ServiceError::Validation("note body is required".to_string()));
        }

        let application = self.get_application(application_id).await?;
        ensure_participant(&application, author_id)?;

        let note = self
            .db_client
            .add_application_note(application_id, author_id, body)
            .await?;

        Ok(note)
    }

    pub async fn get_notes(
        &self,
        application_id: Uuid,
        caller_id: Uuid,
    ) -> Result<Vec<ApplicationNote>, ServiceError> {
        let application = self.get_application(application_id).await?;
        ensure_participant(&application, caller_id)?;

        let notes = self.db_client.get_application_notes(application_id).await?;
        Ok(notes)
    }

    pub async fn delete_note(
        &self,
        application_id: Uuid,
        note_id: Uuid,
        author_id: Uuid,
    ) -> Result<(), ServiceError> {
        // Notes are append-only for everyone except their author
        let note = self
            .db_client
            .get_application_note_by_id(note_id)
            .await?
            .filter(|note| note.application_id == application_id)
            .ok_or(ServiceError::NoteNotFound(note_id))?;

        if note.author_id != author_id {
            return Err(ServiceError::UnauthorizedApplicationAccess(
                author_id,
                application_id,
            ));
        }

        self.db_client.delete_application_note(note_id).await?;
        Ok(())
    }
}

fn ensure_participant(application: &Application, user_id: Uuid) -> Result<(), ServiceError> {
    let is_worker = application.worker_id == user_id;
    let is_client = application.client_id == Some(user_id);

    if is_worker || is_client {
        Ok(())
    } else {
        Err(ServiceError::UnauthorizedApplicationAccess(
            user_id,
            application.id,
        ))
    }
}

fn display_name(name: &str) -> &str {
    if name.is_empty() {
        "A worker"
    } else {
        name
    }
}

/// Decides whether a status write warrants telling the worker, and with
/// what. Only a real change into a decision status notifies; no-op writes
/// and moves back to pending/completed are silent.
fn status_change_fanout(
    previous: ApplicationStatus,
    current: ApplicationStatus,
) -> Option<(&'static str, &'static str, NotificationKind)> {
    if previous == current {
        return None;
    }

    match current {
        ApplicationStatus::Accepted => Some((
            "Application accepted",
            "Congratulations, your application was accepted",
            NotificationKind::ApplicationAccepted,
        )),
        ApplicationStatus::Rejected => Some((
            "Application update",
            "Your application was not selected this time",
            NotificationKind::ApplicationRejected,
        )),
        ApplicationStatus::Pending | ApplicationStatus::Completed => None,
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

/// True when at least one identity field is empty on both the request and
/// the stored row, i.e. the resolver has something to contribute.
fn identity_gaps_remain(requested: &ContactIdentity, stored: Option<&ContactIdentity>) -> bool {
    let mut effective = requested.clone();
    if let Some(stored) = stored {
        effective.fill_missing_from(stored);
    }
    !effective.is_complete()
}

/// Request fields win; stored fields cover request gaps; resolved fields
/// only fill slots empty in both. Stored values are never blanked because
/// the upsert also ignores empty strings.
fn merge_worker_identity(
    requested: ContactIdentity,
    stored: Option<&ContactIdentity>,
    resolved: &ContactIdentity,
) -> ContactIdentity {
    let mut merged = requested;
    if let Some(stored) = stored {
        merged.fill_missing_from(stored);
    }
    merged.fill_missing_from(resolved);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(email: &str, name: &str, phone: &str) -> ContactIdentity {
        ContactIdentity {
            email: email.to_string(),
            name: name.to_string(),
            phone: phone.to_string(),
        }
    }

    #[test]
    fn request_fields_take_precedence() {
        let merged = merge_worker_identity(
            identity("req@example.com", "", ""),
            Some(&identity("stored@example.com", "Stored Name", "")),
            &identity("resolved@example.com", "Resolved Name", "070"),
        );

        assert_eq!(merged.email, "req@example.com");
        assert_eq!(merged.name, "Stored Name");
        assert_eq!(merged.phone, "070");
    }

    #[test]
    fn stored_identity_is_never_blanked() {
        let merged = merge_worker_identity(
            ContactIdentity::default(),
            Some(&identity("stored@example.com", "Stored Name", "080")),
            &ContactIdentity::default(),
        );

        assert_eq!(merged.email, "stored@example.com");
        assert_eq!(merged.name, "Stored Name");
        assert_eq!(merged.phone, "080");
    }

    #[test]
    fn resolver_only_needed_when_gaps_remain() {
        assert!(identity_gaps_remain(&identity("a@b.c", "Ada", ""), None));
        assert!(!identity_gaps_remain(
            &identity("a@b.c", "", ""),
            Some(&identity("", "Ada", "070"))
        ));
        assert!(identity_gaps_remain(&ContactIdentity::default(), None));
    }

    #[test]
    fn participant_check_covers_both_sides() {
        let worker = Uuid::new_v4();
        let client = Uuid::new_v4();
        let stranger = Uuid::new_v4();

        let application = Application {
            id: Uuid::new_v4(),
            job_id: Uuid::new_v4(),
            worker_id: worker,
            client_id: Some(client),
            worker_email: String::new(),
            worker_name: String::new(),
            worker_phone: String::new(),
            client_email: String::new(),
            proposal_text: String::new(),
            status: ApplicationStatus::Pending,
            created_at: None,
            updated_at: None,
        };

        assert!(ensure_participant(&application, worker).is_ok());
        assert!(ensure_participant(&application, client).is_ok());
        assert!(ensure_participant(&application, stranger).is_err());
    }

    #[test]
    fn reopening_a_completed_application_is_permitted() {
        assert!(ApplicationStatus::Completed.can_transition_to(ApplicationStatus::Pending));
        assert!(ApplicationStatus::Rejected.can_transition_to(ApplicationStatus::Accepted));
    }

    #[test]
    fn only_a_real_change_into_a_decision_notifies() {
        let (_, _, kind) =
            status_change_fanout(ApplicationStatus::Pending, ApplicationStatus::Accepted)
                .unwrap();
        assert_eq!(kind, NotificationKind::ApplicationAccepted);

        let (_, _, kind) =
            status_change_fanout(ApplicationStatus::Completed, ApplicationStatus::Rejected)
                .unwrap();
        assert_eq!(kind, NotificationKind::ApplicationRejected);
    }

    #[test]
    fn same_status_writes_are_silent() {
        for status in ApplicationStatus::ALL {
            assert!(status_change_fanout(status, status).is_none());
        }
    }

    #[test]
    fn moves_out_of_a_decision_are_silent() {
        assert!(
            status_change_fanout(ApplicationStatus::Accepted, ApplicationStatus::Pending)
                .is_none()
        );
        assert!(
            status_change_fanout(ApplicationStatus::Rejected, ApplicationStatus::Completed)
                .is_none()
        );
    }
}
