// src/server/mod.rs
use std::sync::Arc;

use crate::api::*;
use crate::config::Config;
use crate::database::DbPool;
use crate::identity::IdentityService;
use crate::store::SqliteInvestorStore;
use rocket::{routes, Build, Rocket};

pub mod routes;

pub struct ServerState {
    pub config: Config,
    pub store: SqliteInvestorStore,
    pub identity: Arc<dyn IdentityService>,
}

pub fn build_rocket(
    config: Config,
    db_pool: DbPool,
    identity: Arc<dyn IdentityService>,
) -> Rocket<Build> {
    let state = ServerState {
        config,
        store: SqliteInvestorStore::new(db_pool),
        identity,
    };

    rocket::build().manage(state).mount(
        "/api",
        routes![
            routes::health::health_check,
            routes::health::index,
            import_investors,
            import_investors_file,
            calculate_growth_metrics,
        ],
    )
}
