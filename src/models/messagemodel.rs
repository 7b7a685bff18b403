use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: String,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub job_id: Option<Uuid>,
    pub content: String,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

/// One entry in a user's inbox: the latest message of a conversation
/// plus how many messages in it are still unread for that user.
#[derive(Debug, Serialize, Clone)]
pub struct ConversationSummary {
    pub conversation_id: String,
    pub last_message: Message,
    pub unread_count: i64,
}

/// Deterministic conversation key: symmetric in the two participants and
/// scoped by the optional job. Both ingress paths (REST and the gateway)
/// must derive the exact same key for the same message.
pub fn conversation_id(user_a: Uuid, user_b: Uuid, job_id: Option<Uuid>) -> String {
    let (low, high) = if user_a.to_string() <= user_b.to_string() {
        (user_a, user_b)
    } else {
        (user_b, user_a)
    };

    match job_id {
        Some(job) => format!("{}_{}_{}", job, low, high),
        None => format!("{}_{}", low, high),
    }
}

/// The participant ids embedded in a conversation key. UUIDs never contain
/// underscores, so the last two `_`-separated segments are always the
/// sorted participant pair.
pub fn conversation_participants(conversation_id: &str) -> Option<(Uuid, Uuid)> {
    let parts: Vec<&str> = conversation_id.split('_').collect();
    if parts.len() < 2 {
        return None;
    }
    let a = Uuid::parse_str(parts[parts.len() - 2]).ok()?;
    let b = Uuid::parse_str(parts[parts.len() - 1]).ok()?;
    Some((a, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_id_is_symmetric() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let job = Uuid::new_v4();

        assert_eq!(conversation_id(a, b, None), conversation_id(b, a, None));
        assert_eq!(
            conversation_id(a, b, Some(job)),
            conversation_id(b, a, Some(job))
        );
    }

    #[test]
    fn conversation_id_differs_per_job_context() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let job_one = Uuid::new_v4();
        let job_two = Uuid::new_v4();

        let bare = conversation_id(a, b, None);
        let scoped_one = conversation_id(a, b, Some(job_one));
        let scoped_two = conversation_id(a, b, Some(job_two));

        assert_ne!(bare, scoped_one);
        assert_ne!(scoped_one, scoped_two);
        assert!(scoped_one.starts_with(&job_one.to_string()));
    }

    #[test]
    fn participants_round_trip_through_the_key() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let job = Uuid::new_v4();

        for key in [conversation_id(a, b, None), conversation_id(a, b, Some(job))] {
            let (x, y) = conversation_participants(&key).unwrap();
            assert!((x == a && y == b) || (x == b && y == a));
        }

        assert!(conversation_participants("not-a-key").is_none());
    }
}
