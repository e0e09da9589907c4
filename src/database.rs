use mobc::{Manager, Pool};
use rusqlite::{Connection, Result as SqliteResult};
use std::path::Path;
use tracing::{debug, error, info};

pub struct SqliteManager {
    db_path: String,
}

impl SqliteManager {
    pub fn new(db_path: String) -> Self {
        debug!("🔧 Creating SqliteManager for path: {}", db_path);
        Self { db_path }
    }
}

#[async_trait::async_trait]
impl Manager for SqliteManager {
    type Connection = Connection;
    type Error = rusqlite::Error;

    async fn connect(&self) -> Result<Self::Connection, Self::Error> {
        debug!("🔌 Opening database: {}", self.db_path);
        let conn = Connection::open(&self.db_path)?;

        // Some PRAGMA statements return a row; query_row accepts both shapes.
        let exec_pragma = |conn: &Connection, pragma: &str| -> Result<(), rusqlite::Error> {
            match conn.execute(pragma, []) {
                Ok(_) => Ok(()),
                Err(rusqlite::Error::ExecuteReturnedResults) => {
                    conn.query_row(pragma, [], |_| Ok(()))
                }
                Err(e) => {
                    error!("PRAGMA failed ({}): {}", pragma, e);
                    Err(e)
                }
            }
        };

        exec_pragma(&conn, "PRAGMA journal_mode=WAL")?;
        exec_pragma(&conn, "PRAGMA synchronous=NORMAL")?;
        exec_pragma(&conn, "PRAGMA foreign_keys=ON")?;
        exec_pragma(&conn, "PRAGMA temp_store=memory")?;

        init_database(&conn)?;
        Ok(conn)
    }

    async fn check(&self, conn: Self::Connection) -> Result<Self::Connection, Self::Error> {
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(conn)
    }
}

fn init_database(conn: &Connection) -> SqliteResult<()> {
    debug!("🏗️ init_database() - Creating tables and indexes...");

    create_firms_table(conn)?;
    create_profiles_table(conn)?;
    create_contacts_table(conn)?;
    create_indexes(conn)?;

    Ok(())
}

pub type DbPool = Pool<SqliteManager>;

pub async fn create_db_pool(
    db_path: &str,
) -> Result<DbPool, Box<dyn std::error::Error + Send + Sync>> {
    if let Some(parent) = Path::new(db_path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let manager = SqliteManager::new(db_path.to_string());
    let pool = Pool::builder().max_open(10).max_idle(5).build(manager);

    info!("✓ SQLite connection pool created: {}", db_path);
    Ok(pool)
}

fn create_firms_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS firms (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            firm_name TEXT NOT NULL,
            investor_type TEXT,
            hq_location TEXT,
            source TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
        [],
    )?;
    Ok(())
}

fn create_profiles_table(conn: &Connection) -> SqliteResult<()> {
    // id is the identity account id, shared 1-1 with the auth principal
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS investor_profiles (
            id TEXT PRIMARY KEY,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            email TEXT NOT NULL,
            investor_category TEXT,
            investment_preference TEXT NOT NULL,
            location TEXT,
            created_at TEXT NOT NULL
        )
        "#,
        [],
    )?;
    Ok(())
}

fn create_contacts_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS investor_contacts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            firm_id INTEGER NOT NULL,
            investor_profile_id TEXT NOT NULL,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            email TEXT NOT NULL,
            title TEXT,
            created_at TEXT NOT NULL,
            FOREIGN KEY (firm_id) REFERENCES firms (id),
            FOREIGN KEY (investor_profile_id) REFERENCES investor_profiles (id)
        )
        "#,
        [],
    )?;
    Ok(())
}

fn create_indexes(conn: &Connection) -> SqliteResult<()> {
    let indexes = [
        "CREATE INDEX IF NOT EXISTS idx_firms_name ON firms(firm_name)",
        "CREATE INDEX IF NOT EXISTS idx_profiles_email ON investor_profiles(email)",
        "CREATE INDEX IF NOT EXISTS idx_contacts_email ON investor_contacts(email)",
        "CREATE INDEX IF NOT EXISTS idx_contacts_firm ON investor_contacts(firm_id)",
        "CREATE INDEX IF NOT EXISTS idx_contacts_profile ON investor_contacts(investor_profile_id)",
    ];

    for index_sql in indexes.iter() {
        conn.execute(index_sql, [])?;
    }
    Ok(())
}
