use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "application_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Rejected,
    Completed,
}

impl ApplicationStatus {
    pub fn to_str(&self) -> &str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Completed => "completed",
        }
    }

    pub fn from_str(value: &str) -> Option<ApplicationStatus> {
        match value {
            "pending" => Some(ApplicationStatus::Pending),
            "accepted" => Some(ApplicationStatus::Accepted),
            "rejected" => Some(ApplicationStatus::Rejected),
            "completed" => Some(ApplicationStatus::Completed),
            _ => None,
        }
    }

    pub const ALL: [ApplicationStatus; 4] = [
        ApplicationStatus::Pending,
        ApplicationStatus::Accepted,
        ApplicationStatus::Rejected,
        ApplicationStatus::Completed,
    ];

    /// Unlike the job state machine, the proposal set is open: a client may
    /// move a proposal between any of the four statuses, including reopening
    /// a completed one. Kept as an explicit seam so tightening the rules
    /// later is a one-line change.
    pub fn can_transition_to(&self, _target: ApplicationStatus) -> bool {
        true
    }
}

/// A worker's proposal on a job. At most one row exists per
/// (job_id, worker_id) pair, enforced by a unique index.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct Application {
    pub id: Uuid,
    pub job_id: Uuid,
    pub worker_id: Uuid,
    pub client_id: Option<Uuid>,
    pub worker_email: String,
    pub worker_name: String,
    pub worker_phone: String,
    pub client_email: String,
    pub proposal_text: String,
    pub status: ApplicationStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Upsert result carrying whether the row was freshly inserted
/// (derived from `xmax = 0` in the RETURNING clause).
#[derive(Debug, sqlx::FromRow)]
pub struct UpsertedApplication {
    #[sqlx(flatten)]
    pub application: Application,
    pub inserted: bool,
}

/// Status update result carrying the status the row held before the write,
/// read in the same statement so "did it actually change" is race-free.
#[derive(Debug, sqlx::FromRow)]
pub struct StatusUpdatedApplication {
    #[sqlx(flatten)]
    pub application: Application,
    pub previous_status: ApplicationStatus,
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct ApplicationNote {
    pub id: Uuid,
    pub application_id: Uuid,
    pub author_id: Uuid,
    pub body: String,
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_only_the_four_targets() {
        for s in ["pending", "accepted", "rejected", "completed"] {
            let parsed = ApplicationStatus::from_str(s).unwrap();
            assert_eq!(parsed.to_str(), s);
        }
        assert!(ApplicationStatus::from_str("withdrawn").is_none());
        assert!(ApplicationStatus::from_str("Pending").is_none());
        assert!(ApplicationStatus::from_str("").is_none());
    }

    #[test]
    fn every_status_can_reach_every_other() {
        for from in ApplicationStatus::ALL {
            for to in ApplicationStatus::ALL {
                assert!(
                    from.can_transition_to(to),
                    "{} -> {} must be permitted",
                    from.to_str(),
                    to.to_str()
                );
            }
        }
    }
}
