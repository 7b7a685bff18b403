pub mod applications;
pub mod jobs;
pub mod messages;
pub mod notifications;
