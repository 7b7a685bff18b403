use std::sync::Arc;

use serde::Deserialize;
use uuid::Uuid;

use crate::db::{db::DBClient, userdb::UserExt};

/// Best-effort contact identity. Unknown fields are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactIdentity {
    pub email: String,
    pub name: String,
    pub phone: String,
}

impl ContactIdentity {
    pub fn is_complete(&self) -> bool {
        !self.email.is_empty() && !self.name.is_empty() && !self.phone.is_empty()
    }

    /// Copies fields from `other` into slots that are still empty here.
    /// Never overwrites a value that is already present.
    pub fn fill_missing_from(&mut self, other: &ContactIdentity) {
        if self.email.is_empty() {
            self.email = other.email.clone();
        }
        if self.name.is_empty() {
            self.name = other.name.clone();
        }
        if self.phone.is_empty() {
            self.phone = other.phone.clone();
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProviderIdentity {
    #[serde(default)]
    email: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    phone: String,
}

/// Resolves a user's contact identity from the profile store, falling back
/// to the external identity provider for fields the store cannot supply.
/// Read-only; every failure degrades to a partial identity.
#[derive(Debug, Clone)]
pub struct IdentityResolver {
    db_client: Arc<DBClient>,
    http: reqwest::Client,
    provider_url: Option<String>,
}

impl IdentityResolver {
    pub fn new(db_client: Arc<DBClient>, provider_url: Option<String>) -> Self {
        Self {
            db_client,
            http: reqwest::Client::new(),
            provider_url,
        }
    }

    pub async fn resolve(&self, user_id: Uuid) -> ContactIdentity {
        let mut identity = self.resolve_from_profile(user_id).await;

        if !identity.is_complete() {
            if let Some(base_url) = &self.provider_url {
                match self.resolve_from_provider(base_url, user_id).await {
                    Ok(external) => identity.fill_missing_from(&external),
                    Err(err) => {
                        tracing::warn!(
                            "identity provider lookup failed for user {}: {}",
                            user_id,
                            err
                        );
                    }
                }
            }
        }

        identity
    }

    async fn resolve_from_profile(&self, user_id: Uuid) -> ContactIdentity {
        let user = match self.db_client.get_user_by_id(user_id).await {
            Ok(user) => user,
            Err(err) => {
                tracing::warn!("profile store lookup failed for user {}: {}", user_id, err);
                None
            }
        };

        let Some(user) = user else {
            return ContactIdentity::default();
        };

        // Prefer the display name; fall back to "first last"
        let name = user
            .display_name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| {
                format!(
                    "{} {}",
                    user.first_name.unwrap_or_default(),
                    user.last_name.unwrap_or_default()
                )
                .trim()
                .to_string()
            });

        ContactIdentity {
            email: user.email.unwrap_or_default(),
            name,
            phone: user.phone.unwrap_or_default(),
        }
    }

    async fn resolve_from_provider(
        &self,
        base_url: &str,
        user_id: Uuid,
    ) -> Result<ContactIdentity, reqwest::Error> {
        let url = format!("{}/users/{}", base_url.trim_end_matches('/'), user_id);

        let identity = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<ProviderIdentity>()
            .await?;

        Ok(ContactIdentity {
            email: identity.email,
            name: identity.name,
            phone: identity.phone,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(email: &str, name: &str, phone: &str) -> ContactIdentity {
        ContactIdentity {
            email: email.to_string(),
            name: name.to_string(),
            phone: phone.to_string(),
        }
    }

    #[test]
    fn fill_missing_never_overwrites_present_fields() {
        let mut base = identity("a@example.com", "", "070");
        base.fill_missing_from(&identity("b@example.com", "Ada", "080"));

        assert_eq!(base.email, "a@example.com");
        assert_eq!(base.name, "Ada");
        assert_eq!(base.phone, "070");
    }

    #[test]
    fn fill_missing_completes_empty_identity() {
        let mut base = ContactIdentity::default();
        base.fill_missing_from(&identity("b@example.com", "Ada", "080"));

        assert!(base.is_complete());
    }
}
