use serde_json::json;
use tokio::time::{sleep, Duration};

use crate::config::Config;

const MAX_RETRIES: u32 = 3;
const RETRY_DELAY_MS: u64 = 1000;

/// One-shot email send with bounded retries. The caller decides whether a
/// failure matters; the fan-out path only logs it.
pub async fn send_email(
    to_email: &str,
    subject: &str,
    html_body: &str,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if to_email.is_empty() {
        return Err("Email recipient cannot be empty".into());
    }
    if !to_email.contains('@') {
        return Err(format!("Invalid email address: {}", to_email).into());
    }
    if config.resend_api_key.is_empty() {
        return Err("RESEND_API_KEY is not configured".into());
    }

    send_with_retries(to_email, subject, html_body, config).await
}

async fn send_with_retries(
    to_email: &str,
    subject: &str,
    html_body: &str,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut last_error = None;

    for attempt in 1..=MAX_RETRIES {
        match send_via_resend(to_email, subject, html_body, config).await {
            Ok(email_id) => {
                tracing::info!("email sent to {} (id: {})", to_email, email_id);
                return Ok(());
            }
            Err(e) => {
                last_error = Some(e);
                if attempt < MAX_RETRIES {
                    let delay = RETRY_DELAY_MS * (2_u64.pow(attempt - 1));
                    tracing::warn!(
                        "email send attempt {} failed for {}, retrying in {}ms",
                        attempt,
                        to_email,
                        delay
                    );
                    sleep(Duration::from_millis(delay)).await;
                }
            }
        }
    }

    let error_msg = last_error
        .map(|e| format!("Failed after {} retries: {}", MAX_RETRIES, e))
        .unwrap_or_else(|| "Unknown email sending error".to_string());

    tracing::error!("email failed for {}: {}", to_email, error_msg);
    Err(error_msg.into())
}

async fn send_via_resend(
    to_email: &str,
    subject: &str,
    html_body: &str,
    config: &Config,
) -> Result<String, String> {
    let client = reqwest::Client::new();
    let request_body = json!({
        "from": config.from_email,
        "to": to_email,
        "subject": subject,
        "html": html_body,
    });

    let response = client
        .post("https://api.resend.com/emails")
        .header("Authorization", format!("Bearer {}", config.resend_api_key))
        .header("Content-Type", "application/json")
        .json(&request_body)
        .send()
        .await
        .map_err(|e| format!("Network error: {}", e))?;

    let status = response.status();
    let response_text = response
        .text()
        .await
        .unwrap_or_else(|_| "No response body".to_string());

    if status.is_success() {
        if let Ok(body) = serde_json::from_str::<serde_json::Value>(&response_text) {
            if let Some(id) = body.get("id").and_then(|v| v.as_str()) {
                return Ok(id.to_string());
            }
        }
        Ok("success".to_string())
    } else {
        Err(format!(
            "Resend API error ({}): {}",
            status.as_u16(),
            response_text
        ))
    }
}
