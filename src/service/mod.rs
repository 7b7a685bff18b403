pub mod application_service;
pub mod background_jobs;
pub mod error;
pub mod identity_service;
pub mod job_service;
pub mod message_service;
pub mod notification_service;
pub mod recommendation_service;
