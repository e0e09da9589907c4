// src/importer/reconciler.rs
use tracing::{debug, error};

use crate::identity::{throwaway_password, CreateAccountOptions, IdentityService};
use crate::importer::dedup::{DuplicateDetector, FirmDecision};
use crate::models::{ImportSource, InvestorRecord, Result, RowOutcome};
use crate::store::{InvestorStore, NewContact, NewFirm, Profile};

/// One undo action for an already-committed reconciliation step.
#[derive(Debug)]
pub enum Compensation {
    DeleteFirm(i64),
    DeleteAccount(String),
    DeleteProfile(String),
}

/// Compensating actions pushed after each successful create, unwound strictly
/// in reverse when a later step fails. There is no transaction spanning the
/// identity service and the store, so this cleanup is best-effort: a failed
/// delete is logged and the unwind keeps going.
#[derive(Debug, Default)]
pub struct CompensationStack {
    actions: Vec<Compensation>,
}

impl CompensationStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: Compensation) {
        self.actions.push(action);
    }

    pub async fn unwind(mut self, store: &dyn InvestorStore, identity: &dyn IdentityService) {
        while let Some(action) = self.actions.pop() {
            let result = match &action {
                Compensation::DeleteProfile(id) => store.delete_profile(id).await,
                Compensation::DeleteAccount(id) => identity.delete_account(id).await,
                Compensation::DeleteFirm(id) => store.delete_firm(*id).await,
            };
            match result {
                Ok(()) => debug!("↩️ Compensated: {:?}", action),
                Err(e) => error!("⚠️ Compensation {:?} failed, continuing: {}", action, e),
            }
        }
    }
}

/// Run the ordered create sequence for one record: firm, identity account,
/// profile, contact. Any step failure unwinds what was already created and
/// reports the original error on the row. `reserved_firm` is the id this
/// batch already resolved for the record's firm name, if any.
pub async fn reconcile_row(
    store: &dyn InvestorStore,
    identity: &dyn IdentityService,
    record: &InvestorRecord,
    row_index: usize,
    source: ImportSource,
    reserved_firm: Option<i64>,
) -> Result<RowOutcome> {
    let validation_errors = record.validate();
    if !validation_errors.is_empty() {
        return Ok(RowOutcome::failed(
            row_index,
            &record.email,
            validation_errors.join("; "),
        ));
    }

    let detector = DuplicateDetector::new(store, identity);

    if let Some(reason) = detector.email_conflict(&record.email).await? {
        return Ok(RowOutcome::failed(row_index, &record.email, reason));
    }

    let mut warnings = Vec::new();
    let mut stack = CompensationStack::new();

    // Step 1: firm association (reuse or create). Validation already rejected
    // via-company records without a name, so the name is present here.
    let mut firm_id = None;
    if record.wants_firm() {
        if let Some(firm_name) = record.company_name.as_deref() {
            if let Some(id) = reserved_firm {
                warnings.push(format!(
                    "firm '{}' already exists, creating new contact for existing firm",
                    firm_name
                ));
                firm_id = Some(id);
            } else {
                match detector.firm_lookup(firm_name).await? {
                    FirmDecision::Reuse(firm) => {
                        warnings.push(format!(
                            "firm '{}' already exists, creating new contact for existing firm",
                            firm_name
                        ));
                        firm_id = Some(firm.id);
                    }
                    FirmDecision::Create => {
                        let new_firm = NewFirm {
                            firm_name: firm_name.to_string(),
                            investor_type: record.investor_type.clone(),
                            hq_location: record.hq_location(),
                            source: source.as_str().to_string(),
                        };
                        match store.insert_firm(&new_firm).await {
                            Ok(id) => {
                                stack.push(Compensation::DeleteFirm(id));
                                firm_id = Some(id);
                            }
                            Err(e) => {
                                return Ok(RowOutcome::failed(
                                    row_index,
                                    &record.email,
                                    format!("failed to create firm '{}': {}", firm_name, e),
                                ));
                            }
                        }
                    }
                }
            }
        }
    }

    // Step 2: identity account with a throwaway password.
    let account = match identity
        .create_account(
            &record.email,
            CreateAccountOptions {
                password: Some(throwaway_password()),
                auto_confirm: true,
            },
        )
        .await
    {
        Ok(account) => account,
        Err(e) => {
            let message = format!("failed to create identity account: {}", e);
            stack.unwind(store, identity).await;
            return Ok(RowOutcome::failed(row_index, &record.email, message));
        }
    };
    stack.push(Compensation::DeleteAccount(account.id.clone()));

    // Step 3: profile shares the account id.
    let profile = Profile {
        id: account.id.clone(),
        first_name: record.first_name.clone(),
        last_name: record.last_name.clone(),
        email: record.email.clone(),
        investor_category: record.investor_type.clone(),
        investment_preference: if firm_id.is_some() {
            "company".to_string()
        } else {
            "individual".to_string()
        },
        location: record.hq_location(),
    };
    if let Err(e) = store.insert_profile(&profile).await {
        let message = format!("failed to create investor profile: {}", e);
        stack.unwind(store, identity).await;
        return Ok(RowOutcome::failed(row_index, &record.email, message));
    }
    stack.push(Compensation::DeleteProfile(profile.id.clone()));

    // Step 4: contact links profile and firm, only when a firm exists.
    let contact_id = match firm_id {
        Some(firm_id) => {
            let contact = NewContact {
                firm_id,
                investor_profile_id: profile.id.clone(),
                first_name: record.first_name.clone(),
                last_name: record.last_name.clone(),
                email: record.email.clone(),
                title: record.title.clone(),
            };
            match store.insert_contact(&contact).await {
                Ok(id) => Some(id),
                Err(e) => {
                    let message = format!("failed to create firm contact: {}", e);
                    stack.unwind(store, identity).await;
                    return Ok(RowOutcome::failed(row_index, &record.email, message));
                }
            }
        }
        None => {
            warnings.push(
                "individual investor with no company - no contact record created".to_string(),
            );
            None
        }
    };

    debug!(
        "✅ Row {} reconciled: profile {} firm {:?}",
        row_index, profile.id, firm_id
    );

    Ok(RowOutcome {
        success: true,
        row_index,
        email: record.email.clone(),
        error: None,
        warnings,
        firm_id,
        profile_id: Some(profile.id),
        contact_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::testing::{MockIdentity, MockStore};

    fn record(email: &str, company: Option<&str>) -> InvestorRecord {
        InvestorRecord {
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            email: email.to_string(),
            country: Some("US".to_string()),
            city: Some("NYC".to_string()),
            invests_via_company: company.is_some(),
            company_name: company.map(|c| c.to_string()),
            investor_type: company.map(|_| "VC".to_string()),
            title: None,
        }
    }

    #[tokio::test]
    async fn creates_firm_account_profile_and_contact() {
        let store = MockStore::new();
        let identity = MockIdentity::new();

        let outcome = reconcile_row(
            &store,
            &identity,
            &record("jane@x.com", Some("Acme")),
            0,
            ImportSource::DeeDee,
            None,
        )
        .await
        .unwrap();

        assert!(outcome.success, "{:?}", outcome.error);
        assert!(outcome.firm_id.is_some());
        assert!(outcome.contact_id.is_some());
        assert_eq!(store.firms.lock().unwrap().len(), 1);
        assert_eq!(store.profiles.lock().unwrap().len(), 1);
        assert_eq!(store.contacts.lock().unwrap().len(), 1);
        assert_eq!(identity.accounts.lock().unwrap().len(), 1);
        let firm = &store.firms.lock().unwrap()[0];
        assert_eq!(firm.1.hq_location.as_deref(), Some("NYC, US"));
        assert_eq!(firm.1.source, "deedee");
    }

    #[tokio::test]
    async fn individual_investor_succeeds_without_contact() {
        let store = MockStore::new();
        let identity = MockIdentity::new();

        let outcome = reconcile_row(
            &store,
            &identity,
            &record("solo@x.com", None),
            3,
            ImportSource::DeeDee,
            None,
        )
        .await
        .unwrap();

        assert!(outcome.success);
        assert!(outcome.firm_id.is_none());
        assert!(outcome.contact_id.is_none());
        assert!(outcome
            .warnings
            .iter()
            .any(|w| w.contains("no contact record created")));
        assert_eq!(store.contacts.lock().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn company_name_alone_implies_a_firm_association() {
        let store = MockStore::new();
        let identity = MockIdentity::new();

        // Name given but the via-company flag left unset: the record still
        // wants a firm, so a firm and contact are created.
        let mut rec = record("jane@x.com", Some("Acme"));
        rec.invests_via_company = false;
        rec.investor_type = None;

        let outcome = reconcile_row(&store, &identity, &rec, 0, ImportSource::DeeDee, None)
            .await
            .unwrap();

        assert!(outcome.success, "{:?}", outcome.error);
        assert!(outcome.firm_id.is_some());
        assert!(outcome.contact_id.is_some());
        assert_eq!(store.firms.lock().unwrap().len(), 1);
        assert_eq!(store.contacts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn existing_email_conflict_creates_nothing() {
        let store = MockStore::new();
        let identity = MockIdentity::new();
        identity.seed_account("taken@x.com");

        let outcome = reconcile_row(
            &store,
            &identity,
            &record("taken@x.com", Some("Acme")),
            0,
            ImportSource::DeeDee,
            None,
        )
        .await
        .unwrap();

        assert!(!outcome.success);
        assert!(outcome.error.as_deref().unwrap().contains("already exists"));
        assert_eq!(store.firms.lock().unwrap().len(), 0);
        assert_eq!(store.profiles.lock().unwrap().len(), 0);
        assert_eq!(identity.create_calls(), 0);
    }

    #[tokio::test]
    async fn account_failure_deletes_newly_created_firm() {
        let store = MockStore::new();
        let identity = MockIdentity::new();
        identity.fail_create_account();

        let outcome = reconcile_row(
            &store,
            &identity,
            &record("jane@x.com", Some("Acme")),
            0,
            ImportSource::DeeDee,
            None,
        )
        .await
        .unwrap();

        assert!(!outcome.success);
        assert!(outcome
            .error
            .as_deref()
            .unwrap()
            .contains("failed to create identity account"));
        // Firm was created in step 1, then compensated away.
        assert_eq!(store.firms.lock().unwrap().len(), 0);
        assert_eq!(store.firm_deletes(), 1);
    }

    #[tokio::test]
    async fn profile_failure_deletes_account_then_firm() {
        let store = MockStore::new();
        let identity = MockIdentity::new();
        store.fail_profile_insert();

        let outcome = reconcile_row(
            &store,
            &identity,
            &record("jane@x.com", Some("Acme")),
            0,
            ImportSource::DeeDee,
            None,
        )
        .await
        .unwrap();

        assert!(!outcome.success);
        assert_eq!(identity.accounts.lock().unwrap().len(), 0);
        assert_eq!(store.firms.lock().unwrap().len(), 0);
        // Reverse creation order: account removed before the firm.
        let deletions = store.and_identity_deletions(&identity);
        assert_eq!(deletions, vec!["account".to_string(), "firm".to_string()]);
    }

    #[tokio::test]
    async fn contact_failure_unwinds_profile_account_firm_in_order() {
        let store = MockStore::new();
        let identity = MockIdentity::new();
        store.fail_contact_insert();

        let outcome = reconcile_row(
            &store,
            &identity,
            &record("jane@x.com", Some("Acme")),
            0,
            ImportSource::DeeDee,
            None,
        )
        .await
        .unwrap();

        assert!(!outcome.success);
        assert_eq!(store.profiles.lock().unwrap().len(), 0);
        assert_eq!(identity.accounts.lock().unwrap().len(), 0);
        assert_eq!(store.firms.lock().unwrap().len(), 0);
        let deletions = store.and_identity_deletions(&identity);
        assert_eq!(
            deletions,
            vec![
                "profile".to_string(),
                "account".to_string(),
                "firm".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn compensation_failure_is_swallowed_and_original_error_reported() {
        let store = MockStore::new();
        let identity = MockIdentity::new();
        store.fail_profile_insert();
        store.fail_firm_delete();

        let outcome = reconcile_row(
            &store,
            &identity,
            &record("jane@x.com", Some("Acme")),
            0,
            ImportSource::DeeDee,
            None,
        )
        .await
        .unwrap();

        assert!(!outcome.success);
        assert!(outcome
            .error
            .as_deref()
            .unwrap()
            .contains("failed to create investor profile"));
    }

    #[tokio::test]
    async fn reserved_firm_is_reused_with_warning() {
        let store = MockStore::new();
        let identity = MockIdentity::new();

        let outcome = reconcile_row(
            &store,
            &identity,
            &record("jane@x.com", Some("Acme")),
            1,
            ImportSource::Admin,
            Some(42),
        )
        .await
        .unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.firm_id, Some(42));
        assert!(outcome.warnings.iter().any(|w| w.contains("already exists")));
        assert_eq!(store.firms.lock().unwrap().len(), 0);
    }
}
