#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub app_url: String,
    pub port: u16,
    // Optional external identity provider used to backfill missing contact details
    pub identity_provider_url: Option<String>,
    // Email service configuration
    pub resend_api_key: String,
    pub from_email: String,
}

impl Config {
    pub fn init() -> Config {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let app_url = std::env::var("APP_URL").expect("APP_URL must be set");

        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(8000);

        let identity_provider_url = std::env::var("IDENTITY_PROVIDER_URL")
            .ok()
            .filter(|v| !v.is_empty());

        // Email service configurations (with defaults so the server still boots
        // in environments without outbound mail)
        let resend_api_key = std::env::var("RESEND_API_KEY")
            .unwrap_or_else(|_| "".to_string());
        let from_email = std::env::var("FROM_EMAIL")
            .unwrap_or_else(|_| "Workbridge <noreply@workbridge.app>".to_string());

        Config {
            database_url,
            app_url,
            port,
            identity_provider_url,
            resend_api_key,
            from_email,
        }
    }
}
