use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    db::{applicationdb::ApplicationExt, db::DBClient, jobdb::JobExt},
    dtos::jobdtos::{CreateJobDto, UpdateJobDto},
    models::{
        jobmodel::{Job, JobStatus, SavedJob},
        notificationmodel::NotificationKind,
    },
    service::{error::ServiceError, notification_service::NotificationService},
};

/// Owns the Job state machine, ownership checks, cascade rules and the
/// expiration sweep.
#[derive(Clone)]
pub struct JobService {
    db_client: Arc<DBClient>,
    notification_service: Arc<NotificationService>,
    // Single-flight guard for the sweep: an overlapping run is skipped
    sweep_lock: Arc<Mutex<()>>,
}

impl JobService {
    pub fn new(db_client: Arc<DBClient>, notification_service: Arc<NotificationService>) -> Self {
        Self {
            db_client,
            notification_service,
            sweep_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn create_job(&self, dto: CreateJobDto) -> Result<Job, ServiceError> {
        let job = self
            .db_client
            .create_job(
                dto.client_id,
                dto.title,
                dto.description,
                dto.category,
                dto.skills,
                dto.budget,
                dto.location,
                dto.latitude,
                dto.longitude,
                dto.expires_at,
                dto.auto_close_enabled.unwrap_or(true),
            )
            .await?;

        tracing::info!("job created: {} by client {}", job.id, job.client_id);
        Ok(job)
    }

    pub async fn get_job(&self, job_id: Uuid) -> Result<Job, ServiceError> {
        self.db_client
            .get_job_by_id(job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(job_id))
    }

    pub async fn list_jobs(&self, limit: i64, offset: i64) -> Result<Vec<Job>, ServiceError> {
        let jobs = self.db_client.get_jobs(limit, offset).await?;
        Ok(jobs)
    }

    /// Status and content update in one call. Ownership is enforced when the
    /// caller supplies an id; status changes must follow the transition table.
    pub async fn update_job(
        &self,
        job_id: Uuid,
        caller_id: Option<Uuid>,
        dto: UpdateJobDto,
    ) -> Result<Job, ServiceError> {
        let job = self.get_job(job_id).await?;

        if let Some(caller) = caller_id {
            if caller != job.client_id {
                return Err(ServiceError::UnauthorizedJobAccess(caller, job_id));
            }
        }

        let new_status = match dto.status.as_deref() {
            Some(raw) => {
                let target = JobStatus::from_str(raw).ok_or_else(|| {
                    ServiceError::Validation(format!("unknown job status: {raw}"))
                })?;
                if target != job.status && !job.status.can_transition_to(target) {
                    return Err(ServiceError::InvalidJobTransition(job.status, target));
                }
                Some(target)
            }
            None => None,
        };

        let updated = self
            .db_client
            .update_job(
                job_id,
                dto.title,
                dto.description,
                dto.category,
                dto.skills,
                dto.budget,
                dto.location,
                dto.expires_at,
                dto.auto_close_enabled,
                new_status,
            )
            .await?;

        if let Some(target) = new_status {
            if target != job.status {
                let result = self
                    .notification_service
                    .notify(
                        updated.client_id,
                        "Job status updated",
                        &format!(
                            "Your job \"{}\" is now {}",
                            updated.title,
                            target.to_str()
                        ),
                        NotificationKind::JobStatusChanged,
                        Some(updated.id),
                        Some(format!("/jobs/{}", updated.id)),
                    )
                    .await;
                if let Err(err) = result {
                    tracing::error!("job status fan-out failed for {}: {}", updated.id, err);
                }
            }
        }

        Ok(updated)
    }

    /// Deletion is refused while an accepted application exists; a permitted
    /// delete cascades to the job's applications.
    pub async fn delete_job(&self, job_id: Uuid, caller_id: Option<Uuid>) -> Result<(), ServiceError> {
        let job = self.get_job(job_id).await?;

        if let Some(caller) = caller_id {
            if caller != job.client_id {
                return Err(ServiceError::UnauthorizedJobAccess(caller, job_id));
            }
        }

        let accepted = self.db_client.count_accepted_for_job(job_id).await?;
        if accepted > 0 {
            return Err(ServiceError::JobHasAcceptedApplication(job_id));
        }

        self.db_client.delete_job(job_id).await?;
        tracing::info!("job deleted: {}", job_id);

        Ok(())
    }

    /// Closes every due auto-close job and notifies each owning client once.
    /// The status flip and the row match happen in one statement, so a
    /// repeated run finds nothing left to close and sends nothing.
    pub async fn run_expiry_sweep(&self) -> Result<usize, ServiceError> {
        let Ok(_guard) = self.sweep_lock.try_lock() else {
            tracing::warn!("expiry sweep already running, skipping this round");
            return Ok(0);
        };

        let expired = self.db_client.expire_due_jobs().await?;
        let count = expired.len();

        for job in expired {
            let result = self
                .notification_service
                .notify(
                    job.client_id,
                    "Job closed automatically",
                    &format!("Your job \"{}\" reached its expiry date and was closed", job.title),
                    NotificationKind::JobExpired,
                    Some(job.id),
                    Some(format!("/jobs/{}", job.id)),
                )
                .await;
            if let Err(err) = result {
                tracing::error!("expiry fan-out failed for job {}: {}", job.id, err);
            }
        }

        if count > 0 {
            tracing::info!("expiry sweep closed {} job(s)", count);
        }

        Ok(count)
    }

    pub async fn save_job(&self, user_id: Uuid, job_id: Uuid) -> Result<SavedJob, ServiceError> {
        // Verify the job exists so a dangling save cannot be created
        self.get_job(job_id).await?;

        let saved = self.db_client.save_job_for_user(user_id, job_id).await?;
        Ok(saved)
    }

    pub async fn unsave_job(&self, user_id: Uuid, job_id: Uuid) -> Result<(), ServiceError> {
        self.db_client.unsave_job_for_user(user_id, job_id).await?;
        Ok(())
    }

    pub async fn get_saved_jobs(&self, user_id: Uuid) -> Result<Vec<Job>, ServiceError> {
        let jobs = self.db_client.get_saved_jobs(user_id).await?;
        Ok(jobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        db::notificationdb::NotificationExt,
        realtime::dispatcher::Dispatcher,
        service::identity_service::IdentityResolver,
    };
    use chrono::{Duration, Utc};
    use sqlx::postgres::PgPoolOptions;

    fn test_config(database_url: &str) -> Config {
        Config {
            database_url: database_url.to_string(),
            app_url: "http://localhost:8000".to_string(),
            port: 8000,
            identity_provider_url: None,
            resend_api_key: String::new(),
            from_email: "Workbridge <noreply@workbridge.app>".to_string(),
        }
    }

    async fn test_services() -> (Arc<DBClient>, JobService) {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for db tests");
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(&url)
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();

        let db_client = Arc::new(DBClient::new(pool));
        let identity = Arc::new(IdentityResolver::new(db_client.clone(), None));
        let notifications = Arc::new(NotificationService::new(
            db_client.clone(),
            Dispatcher::new(),
            identity,
            test_config(&url),
        ));

        (db_client.clone(), JobService::new(db_client, notifications))
    }

    #[tokio::test]
    #[ignore = "needs a running Postgres pointed to by DATABASE_URL"]
    async fn sweep_rerun_notifies_each_client_exactly_once() {
        let (db_client, job_service) = test_services().await;
        let client_id = Uuid::new_v4();

        db_client
            .create_job(
                client_id,
                "Paint the fence".to_string(),
                "Two coats, white".to_string(),
                "painting".to_string(),
                vec![],
                60.0,
                "Abuja".to_string(),
                None,
                None,
                Some(Utc::now() - Duration::days(2)),
                true,
            )
            .await
            .unwrap();

        job_service.run_expiry_sweep().await.unwrap();
        job_service.run_expiry_sweep().await.unwrap();

        let notifications = db_client
            .get_notifications_for_user(client_id, 50, 0)
            .await
            .unwrap();

        let expired: Vec<_> = notifications
            .iter()
            .filter(|n| n.kind == NotificationKind::JobExpired)
            .collect();
        assert_eq!(expired.len(), 1);
    }
}
