// src/server/routes.rs
pub mod health {
    use rocket::{get, serde::json::Json};
    use serde_json::{json, Value};

    #[get("/health")]
    pub async fn health_check() -> Json<Value> {
        Json(json!({
            "status": "healthy",
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "service": "deedee-importer"
        }))
    }

    #[get("/")]
    pub async fn index() -> Json<Value> {
        Json(json!({
            "name": "DeeDee Importer API",
            "version": "0.1.0",
            "description": "Bulk investor reconciliation imports and growth metrics",
            "endpoints": {
                "health": "/api/health",
                "import": "/api/investors/import",
                "import_file": "/api/investors/import/file",
                "growth_metrics": "/api/metrics/growth"
            }
        }))
    }
}
