// src/importer/dedup.rs
use tracing::debug;

use crate::identity::IdentityService;
use crate::models::Result;
use crate::store::{Firm, InvestorStore};

#[derive(Debug)]
pub enum FirmDecision {
    Reuse(Firm),
    Create,
}

/// Pre-mutation checks for a single row. Lookups are live reads against the
/// persisted state on every row: an earlier row in the same batch may have
/// just created the firm or profile a later row collides with.
pub struct DuplicateDetector<'a> {
    store: &'a dyn InvestorStore,
    identity: &'a dyn IdentityService,
}

impl<'a> DuplicateDetector<'a> {
    pub fn new(store: &'a dyn InvestorStore, identity: &'a dyn IdentityService) -> Self {
        Self { store, identity }
    }

    /// An email that already exists as an identity account, a profile, or a
    /// contact makes the row a conflict; nothing may be created for it.
    pub async fn email_conflict(&self, email: &str) -> Result<Option<String>> {
        let lowered = email.to_lowercase();

        let accounts = self.identity.list_accounts().await?;
        if accounts.iter().any(|a| a.email.to_lowercase() == lowered) {
            return Ok(Some(format!(
                "email already exists in identity accounts: {}",
                email
            )));
        }

        if self.store.find_profile_by_email(email).await?.is_some() {
            return Ok(Some(format!(
                "email already exists as an investor profile: {}",
                email
            )));
        }

        if self.store.find_contact_by_email(email).await?.is_some() {
            return Ok(Some(format!(
                "email already exists as a firm contact: {}",
                email
            )));
        }

        Ok(None)
    }

    /// Exact-match lookup only. Fuzzy matching would change dedup semantics
    /// for every caller and stays out of this flow.
    pub async fn firm_lookup(&self, firm_name: &str) -> Result<FirmDecision> {
        match self.store.find_firm_by_name(firm_name).await? {
            Some(firm) => {
                debug!("🏢 Reusing existing firm '{}' (id {})", firm_name, firm.id);
                Ok(FirmDecision::Reuse(firm))
            }
            None => Ok(FirmDecision::Create),
        }
    }
}
