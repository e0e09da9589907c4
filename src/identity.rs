// src/identity.rs
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::models::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityAccount {
    pub id: String,
    pub email: String,
}

#[derive(Debug, Clone, Default)]
pub struct CreateAccountOptions {
    pub password: Option<String>,
    /// Skip the confirmation email; bulk-imported accounts are claimed later
    /// through a password reset.
    pub auto_confirm: bool,
}

/// Externally-managed authentication principals. Accounts share their id with
/// the investor profile they back.
#[async_trait::async_trait]
pub trait IdentityService: Send + Sync {
    async fn create_account(
        &self,
        email: &str,
        options: CreateAccountOptions,
    ) -> Result<IdentityAccount>;

    async fn delete_account(&self, id: &str) -> Result<()>;

    async fn list_accounts(&self) -> Result<Vec<IdentityAccount>>;
}

/// Random one-time password for bulk-created accounts. Never stored or sent
/// anywhere; the investor resets it on first login.
pub fn throwaway_password() -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    (0..24)
        .map(|_| CHARSET[fastrand::usize(..CHARSET.len())] as char)
        .collect()
}

#[derive(Debug, Serialize)]
struct CreateUserRequest<'a> {
    email: &'a str,
    password: &'a str,
    email_confirm: bool,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: String,
    email: String,
}

#[derive(Debug, Deserialize)]
struct ListUsersResponse {
    users: Vec<UserResponse>,
}

/// Admin-API client for the hosted identity provider.
pub struct HttpIdentityClient {
    base_url: String,
    service_key: String,
    client: reqwest::Client,
}

impl HttpIdentityClient {
    pub fn new(base_url: &str, service_key: &str, timeout_seconds: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
            client,
        })
    }
}

#[async_trait::async_trait]
impl IdentityService for HttpIdentityClient {
    async fn create_account(
        &self,
        email: &str,
        options: CreateAccountOptions,
    ) -> Result<IdentityAccount> {
        let password = options.password.unwrap_or_else(throwaway_password);
        let body = CreateUserRequest {
            email,
            password: &password,
            email_confirm: options.auto_confirm,
        };

        let response = self
            .client
            .post(format!("{}/admin/users", self.base_url))
            .bearer_auth(&self.service_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(format!("identity create_account failed ({}): {}", status, detail).into());
        }

        let user: UserResponse = response.json().await?;
        debug!("✅ Identity account created: {} ({})", user.email, user.id);
        Ok(IdentityAccount {
            id: user.id,
            email: user.email,
        })
    }

    async fn delete_account(&self, id: &str) -> Result<()> {
        let response = self
            .client
            .delete(format!("{}/admin/users/{}", self.base_url, id))
            .bearer_auth(&self.service_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(format!("identity delete_account failed ({})", response.status()).into());
        }
        debug!("🗑️ Identity account deleted: {}", id);
        Ok(())
    }

    async fn list_accounts(&self) -> Result<Vec<IdentityAccount>> {
        let response = self
            .client
            .get(format!("{}/admin/users", self.base_url))
            .bearer_auth(&self.service_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(format!("identity list_accounts failed ({})", response.status()).into());
        }

        let listing: ListUsersResponse = response.json().await?;
        Ok(listing
            .users
            .into_iter()
            .map(|u| IdentityAccount {
                id: u.id,
                email: u.email,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throwaway_passwords_are_long_and_distinct() {
        let a = throwaway_password();
        let b = throwaway_password();
        assert_eq!(a.len(), 24);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }
}
