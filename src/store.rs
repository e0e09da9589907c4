// src/store.rs
use chrono::Utc;
use rusqlite::params;
use serde::Serialize;
use tracing::debug;

use crate::database::DbPool;
use crate::models::Result;

#[derive(Debug, Clone, Serialize)]
pub struct Firm {
    pub id: i64,
    pub firm_name: String,
    pub investor_type: Option<String>,
    pub hq_location: Option<String>,
    pub source: String,
}

#[derive(Debug, Clone)]
pub struct NewFirm {
    pub firm_name: String,
    pub investor_type: Option<String>,
    pub hq_location: Option<String>,
    pub source: String,
}

/// Investor profile keyed by the identity account id.
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub investor_category: Option<String>,
    pub investment_preference: String,
    pub location: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewContact {
    pub firm_id: i64,
    pub investor_profile_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Contact {
    pub id: i64,
    pub firm_id: i64,
    pub investor_profile_id: String,
    pub email: String,
}

/// Table-like access to the persisted investor entities: exact-match lookup,
/// insert-returning-id, delete-by-id. The importer talks to this seam so
/// tests can swap in an in-memory double.
#[async_trait::async_trait]
pub trait InvestorStore: Send + Sync {
    async fn find_firm_by_name(&self, firm_name: &str) -> Result<Option<Firm>>;
    async fn insert_firm(&self, firm: &NewFirm) -> Result<i64>;
    async fn delete_firm(&self, id: i64) -> Result<()>;

    async fn find_profile_by_email(&self, email: &str) -> Result<Option<Profile>>;
    async fn insert_profile(&self, profile: &Profile) -> Result<()>;
    async fn delete_profile(&self, id: &str) -> Result<()>;

    async fn find_contact_by_email(&self, email: &str) -> Result<Option<Contact>>;
    async fn insert_contact(&self, contact: &NewContact) -> Result<i64>;
    async fn delete_contact(&self, id: i64) -> Result<()>;
}

pub struct SqliteInvestorStore {
    pool: DbPool,
}

impl SqliteInvestorStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl InvestorStore for SqliteInvestorStore {
    async fn find_firm_by_name(&self, firm_name: &str) -> Result<Option<Firm>> {
        debug!("🔍 find_firm_by_name() - Looking for: {}", firm_name);
        let conn = self.pool.get().await?;

        let mut stmt = conn.prepare(
            "SELECT id, firm_name, investor_type, hq_location, source
             FROM firms WHERE firm_name = ?1",
        )?;

        let mut firm_iter = stmt.query_map([firm_name], |row| {
            let get_optional_string = |idx: usize| -> Option<String> {
                match row.get::<_, Option<String>>(idx) {
                    Ok(Some(s)) if !s.is_empty() => Some(s),
                    _ => None,
                }
            };

            Ok(Firm {
                id: row.get(0)?,
                firm_name: row.get(1)?,
                investor_type: get_optional_string(2),
                hq_location: get_optional_string(3),
                source: row.get(4)?,
            })
        })?;

        if let Some(firm) = firm_iter.next() {
            let firm = firm?;
            debug!("✅ Found firm {} (id {})", firm.firm_name, firm.id);
            return Ok(Some(firm));
        }
        Ok(None)
    }

    async fn insert_firm(&self, firm: &NewFirm) -> Result<i64> {
        let conn = self.pool.get().await?;
        conn.execute(
            r#"
            INSERT INTO firms (firm_name, investor_type, hq_location, source, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                firm.firm_name,
                firm.investor_type.as_deref().unwrap_or(""),
                firm.hq_location.as_deref().unwrap_or(""),
                firm.source,
                Utc::now().to_rfc3339(),
            ],
        )?;
        let id = conn.last_insert_rowid();
        debug!("💾 Firm inserted: {} (id {})", firm.firm_name, id);
        Ok(id)
    }

    async fn delete_firm(&self, id: i64) -> Result<()> {
        let conn = self.pool.get().await?;
        conn.execute("DELETE FROM firms WHERE id = ?1", params![id])?;
        debug!("🗑️ Firm deleted: {}", id);
        Ok(())
    }

    async fn find_profile_by_email(&self, email: &str) -> Result<Option<Profile>> {
        let conn = self.pool.get().await?;

        let mut stmt = conn.prepare(
            "SELECT id, first_name, last_name, email, investor_category,
                    investment_preference, location
             FROM investor_profiles WHERE email = ?1 COLLATE NOCASE",
        )?;

        let mut profile_iter = stmt.query_map([email], |row| {
            let get_optional_string = |idx: usize| -> Option<String> {
                match row.get::<_, Option<String>>(idx) {
                    Ok(Some(s)) if !s.is_empty() => Some(s),
                    _ => None,
                }
            };

            Ok(Profile {
                id: row.get(0)?,
                first_name: row.get(1)?,
                last_name: row.get(2)?,
                email: row.get(3)?,
                investor_category: get_optional_string(4),
                investment_preference: row.get(5)?,
                location: get_optional_string(6),
            })
        })?;

        if let Some(profile) = profile_iter.next() {
            return Ok(Some(profile?));
        }
        Ok(None)
    }

    async fn insert_profile(&self, profile: &Profile) -> Result<()> {
        let conn = self.pool.get().await?;
        conn.execute(
            r#"
            INSERT INTO investor_profiles (
                id, first_name, last_name, email, investor_category,
                investment_preference, location, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                profile.id,
                profile.first_name,
                profile.last_name,
                profile.email,
                profile.investor_category.as_deref().unwrap_or(""),
                profile.investment_preference,
                profile.location.as_deref().unwrap_or(""),
                Utc::now().to_rfc3339(),
            ],
        )?;
        debug!("💾 Profile inserted: {} ({})", profile.email, profile.id);
        Ok(())
    }

    async fn delete_profile(&self, id: &str) -> Result<()> {
        let conn = self.pool.get().await?;
        conn.execute("DELETE FROM investor_profiles WHERE id = ?1", params![id])?;
        debug!("🗑️ Profile deleted: {}", id);
        Ok(())
    }

    async fn find_contact_by_email(&self, email: &str) -> Result<Option<Contact>> {
        let conn = self.pool.get().await?;

        let mut stmt = conn.prepare(
            "SELECT id, firm_id, investor_profile_id, email
             FROM investor_contacts WHERE email = ?1 COLLATE NOCASE",
        )?;

        let mut contact_iter = stmt.query_map([email], |row| {
            Ok(Contact {
                id: row.get(0)?,
                firm_id: row.get(1)?,
                investor_profile_id: row.get(2)?,
                email: row.get(3)?,
            })
        })?;

        if let Some(contact) = contact_iter.next() {
            return Ok(Some(contact?));
        }
        Ok(None)
    }

    async fn insert_contact(&self, contact: &NewContact) -> Result<i64> {
        let conn = self.pool.get().await?;
        conn.execute(
            r#"
            INSERT INTO investor_contacts (
                firm_id, investor_profile_id, first_name, last_name,
                email, title, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                contact.firm_id,
                contact.investor_profile_id,
                contact.first_name,
                contact.last_name,
                contact.email,
                contact.title.as_deref().unwrap_or(""),
                Utc::now().to_rfc3339(),
            ],
        )?;
        let id = conn.last_insert_rowid();
        debug!("💾 Contact inserted: {} (id {})", contact.email, id);
        Ok(id)
    }

    async fn delete_contact(&self, id: i64) -> Result<()> {
        let conn = self.pool.get().await?;
        conn.execute("DELETE FROM investor_contacts WHERE id = ?1", params![id])?;
        debug!("🗑️ Contact deleted: {}", id);
        Ok(())
    }
}
