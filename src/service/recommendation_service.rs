use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    db::{db::DBClient, jobdb::JobExt, userdb::UserExt},
    models::jobmodel::Job,
    service::error::ServiceError,
    utils::geo::haversine_km,
};

const SKILL_POINTS: i32 = 10;
const RECENCY_POINTS: i32 = 5;
const RECENCY_WINDOW_DAYS: i64 = 7;
const MAX_RESULTS: usize = 10;

#[derive(Debug, Serialize)]
pub struct JobRecommendation {
    pub job: Job,
    pub score: i32,
}

/// Read-side ranking of open jobs for a worker: skill overlap, geographic
/// proximity and posting recency. No writes, no fan-out.
#[derive(Debug, Clone)]
pub struct RecommendationService {
    db_client: Arc<DBClient>,
}

impl RecommendationService {
    pub fn new(db_client: Arc<DBClient>) -> Self {
        Self { db_client }
    }

    pub async fn recommend(&self, user_id: Uuid) -> Result<Vec<JobRecommendation>, ServiceError> {
        let user = self
            .db_client
            .get_user_by_id(user_id)
            .await?
            .ok_or(ServiceError::UserNotFound(user_id))?;

        let jobs = self.db_client.get_active_jobs_not_applied(user_id).await?;

        let ranked = rank_jobs(jobs, &user.skills, user.latitude, user.longitude, Utc::now());

        Ok(ranked
            .into_iter()
            .map(|(job, score)| JobRecommendation { job, score })
            .collect())
    }
}

/// Scores and orders candidate jobs. Zero-scored jobs are dropped; ties keep
/// the incoming (insertion) order because the sort is stable.
fn rank_jobs(
    jobs: Vec<Job>,
    skills: &[String],
    user_lat: Option<f64>,
    user_lng: Option<f64>,
    now: DateTime<Utc>,
) -> Vec<(Job, i32)> {
    let mut scored: Vec<(Job, i32)> = jobs
        .into_iter()
        .map(|job| {
            let score = score_job(&job, skills, user_lat, user_lng, now);
            (job, score)
        })
        .filter(|(_, score)| *score > 0)
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored.truncate(MAX_RESULTS);
    scored
}

fn score_job(
    job: &Job,
    skills: &[String],
    user_lat: Option<f64>,
    user_lng: Option<f64>,
    now: DateTime<Utc>,
) -> i32 {
    let mut score = SKILL_POINTS * skill_overlap(skills, &job.skills);

    if let (Some(lat), Some(lng), Some(job_lat), Some(job_lng)) =
        (user_lat, user_lng, job.latitude, job.longitude)
    {
        score += distance_bonus(haversine_km(lat, lng, job_lat, job_lng));
    }

    if let Some(created_at) = job.created_at {
        if now - created_at <= Duration::days(RECENCY_WINDOW_DAYS) {
            score += RECENCY_POINTS;
        }
    }

    score
}

fn skill_overlap(worker_skills: &[String], job_skills: &[String]) -> i32 {
    job_skills
        .iter()
        .filter(|skill| {
            worker_skills
                .iter()
                .any(|mine| mine.trim().eq_ignore_ascii_case(skill.trim()))
        })
        .count() as i32
}

fn distance_bonus(distance_km: f64) -> i32 {
    if distance_km <= 10.0 {
        20
    } else if distance_km <= 25.0 {
        10
    } else if distance_km <= 50.0 {
        5
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::jobmodel::JobStatus;

    fn job_with(skills: &[&str], lat: Option<f64>, lng: Option<f64>, age_days: i64) -> Job {
        Job {
            id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            title: "test job".to_string(),
            description: String::new(),
            category: "trades".to_string(),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            budget: 100.0,
            location: "Lagos".to_string(),
            latitude: lat,
            longitude: lng,
            status: JobStatus::Active,
            expires_at: None,
            auto_close_enabled: false,
            created_at: Some(Utc::now() - Duration::days(age_days)),
            updated_at: None,
        }
    }

    fn skills(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn zero_overlap_jobs_are_filtered_out() {
        let jobs = vec![
            job_with(&["plumbing", "tiling"], None, None, 30),
            job_with(&["tiling"], None, None, 30),
        ];

        let ranked = rank_jobs(jobs, &skills(&["plumbing"]), None, None, Utc::now());

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].1, 10);
        assert!(ranked[0].0.skills.contains(&"plumbing".to_string()));
    }

    #[test]
    fn distance_bonus_tiers() {
        assert_eq!(distance_bonus(5.0), 20);
        assert_eq!(distance_bonus(10.0), 20);
        assert_eq!(distance_bonus(20.0), 10);
        assert_eq!(distance_bonus(50.0), 5);
        assert_eq!(distance_bonus(120.0), 0);
    }

    #[test]
    fn nearby_recent_job_collects_all_bonuses() {
        // Job ~0 km away, posted today, one overlapping skill
        let job = job_with(&["plumbing"], Some(6.45), Some(3.39), 0);
        let score = score_job(&job, &skills(&["plumbing"]), Some(6.45), Some(3.39), Utc::now());

        assert_eq!(score, 10 + 20 + 5);
    }

    #[test]
    fn missing_coordinates_skip_the_distance_bonus() {
        let job = job_with(&["plumbing"], None, None, 30);
        let score = score_job(&job, &skills(&["plumbing"]), Some(6.45), Some(3.39), Utc::now());

        assert_eq!(score, 10);
    }

    #[test]
    fn ordering_is_descending_and_ties_are_stable() {
        let first_tie = job_with(&["plumbing"], None, None, 30);
        let winner = job_with(&["plumbing", "welding"], None, None, 30);
        let second_tie = job_with(&["plumbing"], None, None, 30);

        let first_id = first_tie.id;
        let second_id = second_tie.id;

        let ranked = rank_jobs(
            vec![first_tie, winner, second_tie],
            &skills(&["plumbing", "welding"]),
            None,
            None,
            Utc::now(),
        );

        assert_eq!(ranked[0].1, 20);
        assert_eq!(ranked[1].0.id, first_id);
        assert_eq!(ranked[2].0.id, second_id);
    }

    #[test]
    fn returns_at_most_ten_jobs() {
        let jobs: Vec<Job> = (0..15)
            .map(|_| job_with(&["plumbing"], None, None, 30))
            .collect();

        let ranked = rank_jobs(jobs, &skills(&["plumbing"]), None, None, Utc::now());
        assert_eq!(ranked.len(), 10);
    }

    #[test]
    fn skill_match_ignores_case_and_whitespace() {
        assert_eq!(skill_overlap(&skills(&["Plumbing "]), &skills(&["plumbing"])), 1);
        assert_eq!(skill_overlap(&skills(&["tiling"]), &skills(&["plumbing"])), 0);
    }
}
