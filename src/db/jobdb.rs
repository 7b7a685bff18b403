use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Error;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::jobmodel::{Job, JobStatus, SavedJob};

const JOB_COLUMNS: &str = r#"id, client_id, title, description, category, skills, budget,
       location, latitude, longitude, status, expires_at, auto_close_enabled,
       created_at, updated_at"#;

#[async_trait]
pub trait JobExt {
    #[allow(clippy::too_many_arguments)]
    async fn create_job(
        &self,
        client_id: Uuid,
        title: String,
        description: String,
        category: String,
        skills: Vec<String>,
        budget: f64,
        location: String,
        latitude: Option<f64>,
        longitude: Option<f64>,
        expires_at: Option<DateTime<Utc>>,
        auto_close_enabled: bool,
    ) -> Result<Job, Error>;

    async fn get_job_by_id(&self, job_id: Uuid) -> Result<Option<Job>, Error>;

    async fn get_jobs(&self, limit: i64, offset: i64) -> Result<Vec<Job>, Error>;

    /// Single-statement partial update: untouched fields stay as they are,
    /// status included. Transition legality is the service's job.
    #[allow(clippy::too_many_arguments)]
    async fn update_job(
        &self,
        job_id: Uuid,
        title: Option<String>,
        description: Option<String>,
        category: Option<String>,
        skills: Option<Vec<String>>,
        budget: Option<f64>,
        location: Option<String>,
        expires_at: Option<DateTime<Utc>>,
        auto_close_enabled: Option<bool>,
        status: Option<JobStatus>,
    ) -> Result<Job, Error>;

    async fn delete_job(&self, job_id: Uuid) -> Result<(), Error>;

    /// Atomically flips every due auto-close job to `completed` and returns
    /// the affected rows. Because the status flip happens in the same
    /// statement as the match, an immediate re-run returns nothing.
    async fn expire_due_jobs(&self) -> Result<Vec<Job>, Error>;

    /// Active jobs the worker has not yet applied to, in insertion order.
    async fn get_active_jobs_not_applied(&self, worker_id: Uuid) -> Result<Vec<Job>, Error>;

    async fn save_job_for_user(&self, user_id: Uuid, job_id: Uuid) -> Result<SavedJob, Error>;

    async fn unsave_job_for_user(&self, user_id: Uuid, job_id: Uuid) -> Result<u64, Error>;

    async fn get_saved_jobs(&self, user_id: Uuid) -> Result<Vec<Job>, Error>;
}

#[async_trait]
impl JobExt for DBClient {
    async fn create_job(
        &self,
        client_id: Uuid,
        title: String,
        description: String,
        category: String,
        skills: Vec<String>,
        budget: f64,
        location: String,
        latitude: Option<f64>,
        longitude: Option<f64>,
        expires_at: Option<DateTime<Utc>>,
        auto_close_enabled: bool,
    ) -> Result<Job, Error> {
        sqlx::query_as::<_, Job>(&format!(
            r#"
            INSERT INTO jobs
                (client_id, title, description, category, skills, budget,
                 location, latitude, longitude, expires_at, auto_close_enabled)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(client_id)
        .bind(title)
        .bind(description)
        .bind(category)
        .bind(skills)
        .bind(budget)
        .bind(location)
        .bind(latitude)
        .bind(longitude)
        .bind(expires_at)
        .bind(auto_close_enabled)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_job_by_id(&self, job_id: Uuid) -> Result<Option<Job>, Error> {
        sqlx::query_as::<_, Job>(&format!(
            r#"
            SELECT {JOB_COLUMNS}
            FROM jobs
            WHERE id = $1
            "#
        ))
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_jobs(&self, limit: i64, offset: i64) -> Result<Vec<Job>, Error> {
        sqlx::query_as::<_, Job>(&format!(
            r#"
            SELECT {JOB_COLUMNS}
            FROM jobs
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    async fn update_job(
        &self,
        job_id: Uuid,
        title: Option<String>,
        description: Option<String>,
        category: Option<String>,
        skills: Option<Vec<String>>,
        budget: Option<f64>,
        location: Option<String>,
        expires_at: Option<DateTime<Utc>>,
        auto_close_enabled: Option<bool>,
        status: Option<JobStatus>,
    ) -> Result<Job, Error> {
        sqlx::query_as::<_, Job>(&format!(
            r#"
            UPDATE jobs
            SET title              = COALESCE($2, title),
                description        = COALESCE($3, description),
                category           = COALESCE($4, category),
                skills             = COALESCE($5, skills),
                budget             = COALESCE($6, budget),
                location           = COALESCE($7, location),
                expires_at         = COALESCE($8, expires_at),
                auto_close_enabled = COALESCE($9, auto_close_enabled),
                status             = COALESCE($10, status),
                updated_at         = NOW()
            WHERE id = $1
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(job_id)
        .bind(title)
        .bind(description)
        .bind(category)
        .bind(skills)
        .bind(budget)
        .bind(location)
        .bind(expires_at)
        .bind(auto_close_enabled)
        .bind(status)
        .fetch_one(&self.pool)
        .await
    }

    async fn delete_job(&self, job_id: Uuid) -> Result<(), Error> {
        // Applications and notes go with the job via ON DELETE CASCADE
        sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(job_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn expire_due_jobs(&self) -> Result<Vec<Job>, Error> {
        sqlx::query_as::<_, Job>(&format!(
            r#"
            UPDATE jobs
            SET status = 'completed'::job_status,
                updated_at = NOW()
            WHERE auto_close_enabled = true
              AND expires_at IS NOT NULL
              AND expires_at <= NOW()
              AND status NOT IN ('completed'::job_status, 'cancelled'::job_status)
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .fetch_all(&self.pool)
        .await
    }

    async fn get_active_jobs_not_applied(&self, worker_id: Uuid) -> Result<Vec<Job>, Error> {
        sqlx::query_as::<_, Job>(&format!(
            r#"
            SELECT {JOB_COLUMNS}
            FROM jobs
            WHERE status = 'active'::job_status
              AND id NOT IN (SELECT job_id FROM applications WHERE worker_id = $1)
            ORDER BY created_at ASC, id ASC
            "#
        ))
        .bind(worker_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn save_job_for_user(&self, user_id: Uuid, job_id: Uuid) -> Result<SavedJob, Error> {
        // Unique (user_id, job_id): a second save returns the existing row
        sqlx::query_as::<_, SavedJob>(
            r#"
            INSERT INTO saved_jobs (user_id, job_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, job_id) DO UPDATE
                SET saved_at = saved_jobs.saved_at
            RETURNING id, user_id, job_id, saved_at
            "#,
        )
        .bind(user_id)
        .bind(job_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn unsave_job_for_user(&self, user_id: Uuid, job_id: Uuid) -> Result<u64, Error> {
        let result = sqlx::query("DELETE FROM saved_jobs WHERE user_id = $1 AND job_id = $2")
            .bind(user_id)
            .bind(job_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn get_saved_jobs(&self, user_id: Uuid) -> Result<Vec<Job>, Error> {
        sqlx::query_as::<_, Job>(
            r#"
            SELECT j.id, j.client_id, j.title, j.description, j.category, j.skills,
                   j.budget, j.location, j.latitude, j.longitude, j.status,
                   j.expires_at, j.auto_close_enabled, j.created_at, j.updated_at
            FROM jobs j
            INNER JOIN saved_jobs s ON s.job_id = j.id
            WHERE s.user_id = $1
            ORDER BY s.saved_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
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

    async fn seed_job(db: &DBClient, expires_at: Option<DateTime<Utc>>, auto_close: bool) -> Job {
        db.create_job(
            Uuid::new_v4(),
            "Garden cleanup".to_string(),
            "Clear the backyard".to_string(),
            "gardening".to_string(),
            vec![],
            80.0,
            "Ibadan".to_string(),
            None,
            None,
            expires_at,
            auto_close,
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    #[ignore = "needs a running Postgres pointed to by DATABASE_URL"]
    async fn expiry_rerun_finds_nothing_to_close() {
        let db = test_client().await;
        let overdue = seed_job(&db, Some(Utc::now() - Duration::days(1)), true).await;

        let first = db.expire_due_jobs().await.unwrap();
        let flipped = first.iter().find(|j| j.id == overdue.id).unwrap();
        assert_eq!(flipped.status, JobStatus::Completed);

        // The flip happened in the matching statement, so the same job can
        // never come back in a later run
        let second = db.expire_due_jobs().await.unwrap();
        assert!(second.iter().all(|j| j.id != overdue.id));
    }

    #[tokio::test]
    #[ignore = "needs a running Postgres pointed to by DATABASE_URL"]
    async fn expiry_skips_jobs_that_opted_out_or_are_not_due() {
        let db = test_client().await;
        let opted_out = seed_job(&db, Some(Utc::now() - Duration::days(1)), false).await;
        let not_due = seed_job(&db, Some(Utc::now() + Duration::days(30)), true).await;

        let expired = db.expire_due_jobs().await.unwrap();
        assert!(expired.iter().all(|j| j.id != opted_out.id));
        assert!(expired.iter().all(|j| j.id != not_due.id));
    }
}
