// src/api/metrics.rs
use rocket::{post, serde::json::Json, State};
use serde::Deserialize;
use serde_json::Value;

use crate::api::ApiResponse;
use crate::metrics::{parse_numeric, GrowthMetrics, TractionSnapshot};
use crate::server::ServerState;

/// Traction inputs as they come off a founder-filled form: numbers or strings
/// with thousands separators, any field may be missing.
#[derive(Debug, Deserialize)]
pub struct GrowthMetricsRequest {
    pub this_month_revenue: Option<Value>,
    pub last_month_revenue: Option<Value>,
    pub this_month_clients: Option<Value>,
    pub last_month_clients: Option<Value>,
    pub customer_lifetime_value: Option<Value>,
    pub customer_acquisition_cost: Option<Value>,
    pub ebitda_margin_pct: Option<Value>,
    pub gross_profit_pct: Option<Value>,
}

fn coerce(value: &Option<Value>) -> Option<f64> {
    match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => parse_numeric(s),
        _ => None,
    }
}

impl GrowthMetricsRequest {
    pub fn snapshot(&self) -> TractionSnapshot {
        TractionSnapshot {
            this_month_revenue: coerce(&self.this_month_revenue),
            last_month_revenue: coerce(&self.last_month_revenue),
            this_month_clients: coerce(&self.this_month_clients),
            last_month_clients: coerce(&self.last_month_clients),
            customer_lifetime_value: coerce(&self.customer_lifetime_value),
            customer_acquisition_cost: coerce(&self.customer_acquisition_cost),
            ebitda_margin_pct: coerce(&self.ebitda_margin_pct),
            gross_profit_pct: coerce(&self.gross_profit_pct),
        }
    }
}

#[post("/metrics/growth", data = "<body>")]
pub async fn calculate_growth_metrics(
    _state: &State<ServerState>,
    body: Json<GrowthMetricsRequest>,
) -> Json<ApiResponse<GrowthMetrics>> {
    let snapshot = body.snapshot();
    Json(ApiResponse::success(GrowthMetrics::calculate(&snapshot)))
}
