use super::sendmail::send_email;
use crate::config::Config;

/// Renders the lifecycle notification email. Every fan-out email goes
/// through here so the outbound shape stays uniform.
pub async fn send_notification_email(
    to_email: &str,
    subject: &str,
    body_text: &str,
    link: Option<&str>,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let html = build_notification_html(subject, body_text, link, &config.app_url);
    send_email(to_email, subject, &html, config).await
}

fn build_notification_html(
    title: &str,
    body_text: &str,
    link: Option<&str>,
    app_url: &str,
) -> String {
    let action = match link {
        Some(link) => {
            let href = if link.starts_with("http") {
                link.to_string()
            } else {
                format!("{}{}", app_url.trim_end_matches('/'), link)
            };
            format!(
                r#"<p><a href="{href}" style="color:#2563eb">View in Workbridge</a></p>"#
            )
        }
        None => String::new(),
    };

    format!(
        r#"<div style="font-family:sans-serif;max-width:480px;margin:0 auto">
  <h2>{title}</h2>
  <p>{body_text}</p>
  {action}
  <p style="color:#6b7280;font-size:12px">You are receiving this because of activity on your Workbridge account.</p>
</div>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const APP_URL: &str = "https://app.workbridge.example";

    #[test]
    fn html_includes_title_body_and_link() {
        let html = build_notification_html(
            "New application received",
            "Ada applied to your job",
            Some("/jobs/42/applications"),
            APP_URL,
        );

        assert!(html.contains("New application received"));
        assert!(html.contains("Ada applied to your job"));
        assert!(html.contains("https://app.workbridge.example/jobs/42/applications"));
    }

    #[test]
    fn absolute_links_are_kept_as_is() {
        let html = build_notification_html("t", "b", Some("https://example.com/x"), APP_URL);
        assert!(html.contains("href=\"https://example.com/x\""));
    }

    #[test]
    fn link_block_is_omitted_when_absent() {
        let html = build_notification_html("t", "b", None, APP_URL);
        assert!(!html.contains("<a href"));
    }
}
