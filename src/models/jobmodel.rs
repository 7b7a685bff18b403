use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "job_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Active,
    OnHold,
    Cancelled,
    Completed,
}

impl JobStatus {
    pub fn to_str(&self) -> &str {
        match self {
            JobStatus::Active => "active",
            JobStatus::OnHold => "on_hold",
            JobStatus::Cancelled => "cancelled",
            JobStatus::Completed => "completed",
        }
    }

    pub fn from_str(value: &str) -> Option<JobStatus> {
        match value {
            "active" => Some(JobStatus::Active),
            "on_hold" | "on-hold" => Some(JobStatus::OnHold),
            "cancelled" => Some(JobStatus::Cancelled),
            "completed" => Some(JobStatus::Completed),
            _ => None,
        }
    }

    /// The job lifecycle table. `cancelled` and `completed` are terminal.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Active, JobStatus::OnHold)
                | (JobStatus::Active, JobStatus::Cancelled)
                | (JobStatus::Active, JobStatus::Completed)
                | (JobStatus::OnHold, JobStatus::Active)
                | (JobStatus::OnHold, JobStatus::Cancelled)
        )
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct Job {
    pub id: Uuid,
    pub client_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub skills: Vec<String>,
    pub budget: f64,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub status: JobStatus,
    pub expires_at: Option<DateTime<Utc>>,
    pub auto_close_enabled: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct SavedJob {
    pub id: Uuid,
    pub user_id: Uuid,
    pub job_id: Uuid,
    pub saved_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [JobStatus; 4] = [
        JobStatus::Active,
        JobStatus::OnHold,
        JobStatus::Cancelled,
        JobStatus::Completed,
    ];

    #[test]
    fn transition_table_is_exact() {
        let allowed = [
            (JobStatus::Active, JobStatus::OnHold),
            (JobStatus::Active, JobStatus::Cancelled),
            (JobStatus::Active, JobStatus::Completed),
            (JobStatus::OnHold, JobStatus::Active),
            (JobStatus::OnHold, JobStatus::Cancelled),
        ];

        for from in ALL {
            for to in ALL {
                let expected = allowed.contains(&(from, to));
                assert_eq!(
                    from.can_transition_to(to),
                    expected,
                    "{} -> {}",
                    from.to_str(),
                    to.to_str()
                );
            }
        }
    }

    #[test]
    fn terminal_states_reject_everything() {
        for to in ALL {
            assert!(!JobStatus::Completed.can_transition_to(to));
            assert!(!JobStatus::Cancelled.can_transition_to(to));
        }
    }

    #[test]
    fn parses_both_hyphen_and_underscore_on_hold() {
        assert_eq!(JobStatus::from_str("on_hold"), Some(JobStatus::OnHold));
        assert_eq!(JobStatus::from_str("on-hold"), Some(JobStatus::OnHold));
        assert_eq!(JobStatus::from_str("archived"), None);
    }
}
