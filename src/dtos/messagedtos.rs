use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SendMessageDto {
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub job_id: Option<Uuid>,

    #[validate(length(min = 1, max = 5000, message = "Message text must be between 1 and 5000 characters"))]
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MarkReadDto {
    pub conversation_id: String,
    pub reader_id: Uuid,
}
