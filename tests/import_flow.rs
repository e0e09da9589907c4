// tests/import_flow.rs
//
// End-to-end import runs against the real SQLite store (temp-file database)
// with an in-memory identity double.

use std::sync::Mutex;

use deedee_importer::database::{create_db_pool, DbPool};
use deedee_importer::identity::{CreateAccountOptions, IdentityAccount, IdentityService};
use deedee_importer::importer::BatchCoordinator;
use deedee_importer::models::{ImportSource, InvestorRecord, Result};
use deedee_importer::store::SqliteInvestorStore;

struct FakeIdentity {
    accounts: Mutex<Vec<IdentityAccount>>,
}

impl FakeIdentity {
    fn new() -> Self {
        Self {
            accounts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl IdentityService for FakeIdentity {
    async fn create_account(
        &self,
        email: &str,
        _options: CreateAccountOptions,
    ) -> Result<IdentityAccount> {
        let account = IdentityAccount {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.to_string(),
        };
        self.accounts.lock().unwrap().push(account.clone());
        Ok(account)
    }

    async fn delete_account(&self, id: &str) -> Result<()> {
        self.accounts.lock().unwrap().retain(|a| a.id != id);
        Ok(())
    }

    async fn list_accounts(&self) -> Result<Vec<IdentityAccount>> {
        Ok(self.accounts.lock().unwrap().clone())
    }
}

async fn temp_pool() -> DbPool {
    let path = std::env::temp_dir().join(format!("deedee-test-{}.db", uuid::Uuid::new_v4()));
    create_db_pool(path.to_str().unwrap()).await.unwrap()
}

async fn count(pool: &DbPool, table: &str) -> i64 {
    let conn = pool.get().await.unwrap();
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
        row.get(0)
    })
    .unwrap()
}

fn jane() -> InvestorRecord {
    InvestorRecord {
        first_name: "Jane".to_string(),
        last_name: "Doe".to_string(),
        email: "jane@x.com".to_string(),
        country: Some("US".to_string()),
        city: Some("NYC".to_string()),
        invests_via_company: true,
        company_name: Some("Acme".to_string()),
        investor_type: Some("VC".to_string()),
        title: Some("Partner".to_string()),
    }
}

#[tokio::test]
async fn fresh_import_creates_firm_account_profile_and_contact() {
    let pool = temp_pool().await;
    let store = SqliteInvestorStore::new(pool.clone());
    let identity = FakeIdentity::new();

    let coordinator = BatchCoordinator::new(&store, &identity, ImportSource::DeeDee, 0);
    let report = coordinator.run(&[jane()]).await.unwrap();

    assert_eq!(report.summary.successful, 1);
    assert!(report.results[0].success);
    assert_eq!(count(&pool, "firms").await, 1);
    assert_eq!(count(&pool, "investor_profiles").await, 1);
    assert_eq!(count(&pool, "investor_contacts").await, 1);
    assert_eq!(identity.accounts.lock().unwrap().len(), 1);

    // Profile id is the identity account id.
    let account_id = identity.accounts.lock().unwrap()[0].id.clone();
    assert_eq!(report.results[0].profile_id.as_deref(), Some(account_id.as_str()));
}

#[tokio::test]
async fn rerunning_the_same_batch_yields_conflicts_not_duplicates() {
    let pool = temp_pool().await;
    let store = SqliteInvestorStore::new(pool.clone());
    let identity = FakeIdentity::new();

    let coordinator = BatchCoordinator::new(&store, &identity, ImportSource::DeeDee, 0);
    let first = coordinator.run(&[jane()]).await.unwrap();
    assert_eq!(first.summary.successful, 1);

    let second = coordinator.run(&[jane()]).await.unwrap();
    assert_eq!(second.summary.successful, 0);
    assert!(!second.results[0].success);
    assert!(second.results[0]
        .error
        .as_deref()
        .unwrap()
        .contains("already exists"));

    assert_eq!(count(&pool, "firms").await, 1);
    assert_eq!(count(&pool, "investor_profiles").await, 1);
    assert_eq!(count(&pool, "investor_contacts").await, 1);
    assert_eq!(identity.accounts.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn two_rows_sharing_a_new_firm_create_it_once() {
    let pool = temp_pool().await;
    let store = SqliteInvestorStore::new(pool.clone());
    let identity = FakeIdentity::new();

    let mut john = jane();
    john.first_name = "John".to_string();
    john.email = "john@x.com".to_string();

    let coordinator = BatchCoordinator::new(&store, &identity, ImportSource::Admin, 0);
    let report = coordinator.run(&[jane(), john]).await.unwrap();

    assert_eq!(report.summary.successful, 2);
    assert_eq!(count(&pool, "firms").await, 1);
    assert_eq!(count(&pool, "investor_contacts").await, 2);
    assert_eq!(report.results[0].firm_id, report.results[1].firm_id);

    // Admin-sourced batches stamp their source on created firms.
    let conn = pool.get().await.unwrap();
    let source: String = conn
        .query_row("SELECT source FROM firms", [], |row| row.get(0))
        .unwrap();
    assert_eq!(source, "admin");
}

#[tokio::test]
async fn individual_investor_gets_profile_but_no_contact() {
    let pool = temp_pool().await;
    let store = SqliteInvestorStore::new(pool.clone());
    let identity = FakeIdentity::new();

    let solo = InvestorRecord {
        first_name: "Sam".to_string(),
        last_name: "Lone".to_string(),
        email: "sam@x.com".to_string(),
        country: None,
        city: None,
        invests_via_company: false,
        company_name: None,
        investor_type: None,
        title: None,
    };

    let coordinator = BatchCoordinator::new(&store, &identity, ImportSource::DeeDee, 0);
    let report = coordinator.run(&[solo]).await.unwrap();

    assert!(report.results[0].success);
    assert!(report.results[0]
        .warnings
        .iter()
        .any(|w| w.contains("no contact record created")));
    assert_eq!(count(&pool, "firms").await, 0);
    assert_eq!(count(&pool, "investor_profiles").await, 1);
    assert_eq!(count(&pool, "investor_contacts").await, 0);

    let conn = pool.get().await.unwrap();
    let preference: String = conn
        .query_row(
            "SELECT investment_preference FROM investor_profiles",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(preference, "individual");
}
