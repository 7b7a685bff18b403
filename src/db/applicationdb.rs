use async_trait::async_trait;
use sqlx::Error;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::applicationmodel::{
    Application, ApplicationNote, ApplicationStatus, StatusUpdatedApplication,
    UpsertedApplication,
};

const APPLICATION_COLUMNS: &str = r#"id, job_id, worker_id, client_id, worker_email, worker_name,
       worker_phone, client_email, proposal_text, status, created_at, updated_at"#;

/// Field bundle for the proposal upsert. Empty strings mean "not supplied";
/// the upsert never lets them clobber stored values.
#[derive(Debug, Clone)]
pub struct ApplicationUpsert {
    pub job_id: Uuid,
    pub worker_id: Uuid,
    pub client_id: Option<Uuid>,
    pub worker_email: String,
    pub worker_name: String,
    pub worker_phone: String,
    pub client_email: String,
    pub proposal_text: String,
}

#[async_trait]
pub trait ApplicationExt {
    /// Atomic create-or-update keyed on the unique (job_id, worker_id) pair.
    /// Insert-only defaults: status `pending`, `created_at`. Always applied:
    /// `updated_at` and any non-empty supplied field. Concurrent submits for
    /// the same pair converge to a single row.
    async fn upsert_application(
        &self,
        params: &ApplicationUpsert,
    ) -> Result<UpsertedApplication, Error>;

    async fn get_application_by_id(&self, application_id: Uuid)
        -> Result<Option<Application>, Error>;

    async fn get_application_for_pair(
        &self,
        job_id: Uuid,
        worker_id: Uuid,
    ) -> Result<Option<Application>, Error>;

    async fn get_applications_for_job(&self, job_id: Uuid) -> Result<Vec<Application>, Error>;

    async fn get_applications_for_worker(&self, worker_id: Uuid)
        -> Result<Vec<Application>, Error>;

    /// Writes the status and reports the status the row held beforehand in
    /// the same statement, so concurrent identical updates cannot both
    /// observe a change. Same-status writes still bump `updated_at`.
    async fn update_application_status(
        &self,
        application_id: Uuid,
        status: ApplicationStatus,
    ) -> Result<StatusUpdatedApplication, Error>;

    async fn delete_application(&self, application_id: Uuid) -> Result<(), Error>;

    async fn count_accepted_for_job(&self, job_id: Uuid) -> Result<i64, Error>;

    async fn add_application_note(
        &self,
        application_id: Uuid,
        author_id: Uuid,
        body: String,
    ) -> Result<ApplicationNote, Error>;

    async fn get_application_notes(
        &self,
        application_id: Uuid,
    ) -> Result<Vec<ApplicationNote>, Error>;

    async fn get_application_note_by_id(
        &self,
        note_id: Uuid,
    ) -> Result<Option<ApplicationNote>, Error>;

    async fn delete_application_note(&self, note_id: Uuid) -> Result<(), Error>;
}

#[async_trait]
impl ApplicationExt for DBClient {
    async fn upsert_application(
        &self,
        params: &ApplicationUpsert,
    ) -> Result<UpsertedApplication, Error> {
        // `xmax = 0` distinguishes a fresh insert from a conflict-update.
        sqlx::query_as::<_, UpsertedApplication>(&format!(
            r#"
            INSERT INTO applications
                (job_id, worker_id, client_id, worker_email, worker_name,
                 worker_phone, client_email, proposal_text)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (job_id, worker_id) DO UPDATE SET
                client_id     = COALESCE(applications.client_id, EXCLUDED.client_id),
                worker_email  = CASE WHEN EXCLUDED.worker_email  <> '' THEN EXCLUDED.worker_email
                                     ELSE applications.worker_email  END,
                worker_name   = CASE WHEN EXCLUDED.worker_name   <> '' THEN EXCLUDED.worker_name
                                     ELSE applications.worker_name   END,
                worker_phone  = CASE WHEN EXCLUDED.worker_phone  <> '' THEN EXCLUDED.worker_phone
                                     ELSE applications.worker_phone  END,
                client_email  = CASE WHEN EXCLUDED.client_email  <> '' THEN EXCLUDED.client_email
                                     ELSE applications.client_email  END,
                proposal_text = CASE WHEN EXCLUDED.proposal_text <> '' THEN EXCLUDED.proposal_text
                                     ELSE applications.proposal_text END,
                updated_at    = NOW()
            RETURNING {APPLICATION_COLUMNS}, (xmax = 0) AS inserted
            "#
        ))
        .bind(params.job_id)
        .bind(params.worker_id)
        .bind(params.client_id)
        .bind(&params.worker_email)
        .bind(&params.worker_name)
        .bind(&params.worker_phone)
        .bind(&params.client_email)
        .bind(&params.proposal_text)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_application_by_id(
        &self,
        application_id: Uuid,
    ) -> Result<Option<Application>, Error> {
        sqlx::query_as::<_, Application>(&format!(
            r#"
            SELECT {APPLICATION_COLUMNS}
            FROM applications
            WHERE id = $1
            "#
        ))
        .bind(application_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_application_for_pair(
        &self,
        job_id: Uuid,
        worker_id: Uuid,
    ) -> Result<Option<Application>, Error> {
        sqlx::query_as::<_, Application>(&format!(
            r#"
            SELECT {APPLICATION_COLUMNS}
            FROM applications
            WHERE job_id = $1 AND worker_id = $2
            "#
        ))
        .bind(job_id)
        .bind(worker_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_applications_for_job(&self, job_id: Uuid) -> Result<Vec<Application>, Error> {
        sqlx::query_as::<_, Application>(&format!(
            r#"
            SELECT {APPLICATION_COLUMNS}
            FROM applications
            WHERE job_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(job_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_applications_for_worker(
        &self,
        worker_id: Uuid,
    ) -> Result<Vec<Application>, Error> {
        sqlx::query_as::<_, Application>(&format!(
            r#"
            SELECT {APPLICATION_COLUMNS}
            FROM applications
            WHERE worker_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(worker_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn update_application_status(
        &self,
        application_id: Uuid,
        status: ApplicationStatus,
    ) -> Result<StatusUpdatedApplication, Error> {
        // The self-join exposes the pre-update row; a concurrent writer that
        // lands first is reflected in previous_status once the lock clears
        sqlx::query_as::<_, StatusUpdatedApplication>(
            r#"
            UPDATE applications AS a
            SET status = $2, updated_at = NOW()
            FROM applications AS prev
            WHERE a.id = $1 AND prev.id = a.id
            RETURNING a.id, a.job_id, a.worker_id, a.client_id, a.worker_email,
                      a.worker_name, a.worker_phone, a.client_email,
                      a.proposal_text, a.status, a.created_at, a.updated_at,
                      prev.status AS previous_status
            "#,
        )
        .bind(application_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await
    }

    async fn delete_application(&self, application_id: Uuid) -> Result<(), Error> {
        sqlx::query("DELETE FROM applications WHERE id = $1")
            .bind(application_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn count_accepted_for_job(&self, job_id: Uuid) -> Result<i64, Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM applications
            WHERE job_id = $1 AND status = 'accepted'::application_status
            "#,
        )
        .bind(job_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn add_application_note(
        &self,
        application_id: Uuid,
        author_id: Uuid,
        body: String,
    ) -> Result<ApplicationNote, Error> {
        sqlx::query_as::<_, ApplicationNote>(
            r#"
            INSERT INTO application_notes (application_id, author_id, body)
            VALUES ($1, $2, $3)
            RETURNING id, application_id, author_id, body, created_at
            "#,
        )
        .bind(application_id)
        .bind(author_id)
        .bind(body)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_application_notes(
        &self,
        application_id: Uuid,
    ) -> Result<Vec<ApplicationNote>, Error> {
        sqlx::query_as::<_, ApplicationNote>(
            r#"
            SELECT id, application_id, author_id, body, created_at
            FROM application_notes
            WHERE application_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(application_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_application_note_by_id(
        &self,
        note_id: Uuid,
    ) -> Result<Option<ApplicationNote>, Error> {
        sqlx::query_as::<_, ApplicationNote>(
            r#"
            SELECT id, application_id, author_id, body, created_at
            FROM application_notes
            WHERE id = $1
            "#,
        )
        .bind(note_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_application_note(&self, note_id: Uuid) -> Result<(), Error> {
        sqlx::query("DELETE FROM application_notes WHERE id = $1")
            .bind(note_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::jobdb::JobExt;
    use sqlx::postgres::PgPoolOptions;

    async fn test_client() -> DBClient {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for db tests");
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(&url)
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        DBClient::new(pool)
    }

    async fn seed_job(db: &DBClient) -> Uuid {
        db.create_job(
            Uuid::new_v4(),
            "Fix kitchen sink".to_string(),
            "Leaking trap under the sink".to_string(),
            "plumbing".to_string(),
            vec!["plumbing".to_string()],
            150.0,
            "Lagos".to_string(),
            None,
            None,
            None,
            false,
        )
        .await
        .unwrap()
        .id
    }

    fn upsert_params(job_id: Uuid, worker_id: Uuid) -> ApplicationUpsert {
        ApplicationUpsert {
            job_id,
            worker_id,
            client_id: None,
            worker_email: "ada@example.com".to_string(),
            worker_name: "Ada".to_string(),
            worker_phone: "0801".to_string(),
            client_email: "client@example.com".to_string(),
            proposal_text: "I can start tomorrow".to_string(),
        }
    }

    #[tokio::test]
    #[ignore = "needs a running Postgres pointed to by DATABASE_URL"]
    async fn resubmit_updates_in_place_and_never_blanks_fields() {
        let db = test_client().await;
        let job_id = seed_job(&db).await;
        let worker_id = Uuid::new_v4();

        let first = db
            .upsert_application(&upsert_params(job_id, worker_id))
            .await
            .unwrap();
        assert!(first.inserted);
        assert_eq!(first.application.status, ApplicationStatus::Pending);

        // Resubmit with only new proposal text; identity fields come in empty
        let mut revised = upsert_params(job_id, worker_id);
        revised.worker_email = String::new();
        revised.worker_name = String::new();
        revised.worker_phone = String::new();
        revised.client_email = String::new();
        revised.proposal_text = "Revised offer, can start today".to_string();

        let second = db.upsert_application(&revised).await.unwrap();
        assert!(!second.inserted);
        assert_eq!(second.application.id, first.application.id);
        assert_eq!(second.application.worker_email, "ada@example.com");
        assert_eq!(second.application.worker_name, "Ada");
        assert_eq!(second.application.worker_phone, "0801");
        assert_eq!(second.application.client_email, "client@example.com");
        assert_eq!(
            second.application.proposal_text,
            "Revised offer, can start today"
        );
    }

    #[tokio::test]
    #[ignore = "needs a running Postgres pointed to by DATABASE_URL"]
    async fn status_update_reports_previous_status_and_bumps_updated_at() {
        let db = test_client().await;
        let job_id = seed_job(&db).await;

        let created = db
            .upsert_application(&upsert_params(job_id, Uuid::new_v4()))
            .await
            .unwrap();
        let id = created.application.id;

        let accepted = db
            .update_application_status(id, ApplicationStatus::Accepted)
            .await
            .unwrap();
        assert_eq!(accepted.previous_status, ApplicationStatus::Pending);
        assert_eq!(accepted.application.status, ApplicationStatus::Accepted);

        // Same-status write: no change reported, timestamp still moves
        let again = db
            .update_application_status(id, ApplicationStatus::Accepted)
            .await
            .unwrap();
        assert_eq!(again.previous_status, ApplicationStatus::Accepted);
        assert!(again.application.updated_at >= accepted.application.updated_at);
    }
}
