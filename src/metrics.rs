// src/metrics.rs
//! Growth-metric formulas derived from a raw traction snapshot. Everything
//! here is pure; missing or zero denominators yield 0 instead of failing.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TractionSnapshot {
    pub this_month_revenue: Option<f64>,
    pub last_month_revenue: Option<f64>,
    pub this_month_clients: Option<f64>,
    pub last_month_clients: Option<f64>,
    pub customer_lifetime_value: Option<f64>,
    pub customer_acquisition_cost: Option<f64>,
    pub ebitda_margin_pct: Option<f64>,
    pub gross_profit_pct: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GrowthMetrics {
    pub mrr: f64,
    pub arr: f64,
    pub revenue_growth_pct: f64,
    pub client_growth_pct: f64,
    pub revenue_per_client: f64,
    pub ltv_cac_ratio: f64,
    pub rule_of_40_score: f64,
    pub is_growing: bool,
    pub has_profitable_business: bool,
    pub has_healthy_margins: bool,
    pub has_positive_unit_economics: bool,
}

/// Recurring-revenue assumption baked in: MRR is simply this month's revenue,
/// not derived from a subscription ledger.
pub fn mrr(this_month_revenue: f64) -> f64 {
    this_month_revenue
}

pub fn arr(mrr: f64) -> f64 {
    mrr * 12.0
}

pub fn revenue_growth_pct(this_month: f64, last_month: f64) -> f64 {
    if last_month == 0.0 {
        return 0.0;
    }
    (this_month - last_month) / last_month * 100.0
}

pub fn client_growth_pct(this_month: f64, last_month: f64) -> f64 {
    revenue_growth_pct(this_month, last_month)
}

pub fn revenue_per_client(revenue: f64, clients: f64) -> f64 {
    if clients == 0.0 {
        return 0.0;
    }
    revenue / clients
}

pub fn ltv_cac_ratio(clv: f64, cac: f64) -> f64 {
    if cac == 0.0 {
        return 0.0;
    }
    clv / cac
}

pub fn rule_of_40(revenue_growth_pct: f64, ebitda_margin_pct: f64) -> f64 {
    revenue_growth_pct + ebitda_margin_pct
}

/// Strip thousands separators before float conversion; non-numeric or empty
/// input yields None.
pub fn parse_numeric(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != ',' && *c != ' ' && *c != '\u{a0}')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

impl GrowthMetrics {
    pub fn calculate(snapshot: &TractionSnapshot) -> Self {
        let this_revenue = snapshot.this_month_revenue.unwrap_or(0.0);
        let last_revenue = snapshot.last_month_revenue.unwrap_or(0.0);
        let this_clients = snapshot.this_month_clients.unwrap_or(0.0);
        let last_clients = snapshot.last_month_clients.unwrap_or(0.0);
        let clv = snapshot.customer_lifetime_value.unwrap_or(0.0);
        let cac = snapshot.customer_acquisition_cost.unwrap_or(0.0);
        let ebitda = snapshot.ebitda_margin_pct.unwrap_or(0.0);
        let gross_profit = snapshot.gross_profit_pct.unwrap_or(0.0);

        let mrr = mrr(this_revenue);
        let revenue_growth = revenue_growth_pct(this_revenue, last_revenue);
        let ltv_cac = ltv_cac_ratio(clv, cac);

        Self {
            mrr,
            arr: arr(mrr),
            revenue_growth_pct: revenue_growth,
            client_growth_pct: client_growth_pct(this_clients, last_clients),
            revenue_per_client: revenue_per_client(this_revenue, this_clients),
            ltv_cac_ratio: ltv_cac,
            rule_of_40_score: rule_of_40(revenue_growth, ebitda),
            is_growing: revenue_growth > 0.0,
            has_profitable_business: ebitda > 0.0,
            has_healthy_margins: gross_profit > 30.0,
            has_positive_unit_economics: ltv_cac > 3.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growth_with_zero_baseline_is_zero_not_a_panic() {
        assert_eq!(revenue_growth_pct(0.0, 0.0), 0.0);
        assert_eq!(revenue_growth_pct(500.0, 0.0), 0.0);
    }

    #[test]
    fn ltv_cac_guards_division_by_zero() {
        assert_eq!(ltv_cac_ratio(1200.0, 0.0), 0.0);
        assert_eq!(ltv_cac_ratio(1200.0, 300.0), 4.0);
    }

    #[test]
    fn rule_of_40_adds_growth_and_margin() {
        assert_eq!(rule_of_40(20.0, 25.0), 45.0);
        assert_eq!(rule_of_40(-10.0, 25.0), 15.0);
    }

    #[test]
    fn revenue_per_client_with_no_clients_is_zero() {
        assert_eq!(revenue_per_client(10_000.0, 0.0), 0.0);
        assert_eq!(revenue_per_client(10_000.0, 40.0), 250.0);
    }

    #[test]
    fn parse_numeric_strips_thousands_separators() {
        assert_eq!(parse_numeric("1,250,000"), Some(1_250_000.0));
        assert_eq!(parse_numeric("12 500.75"), Some(12_500.75));
        assert_eq!(parse_numeric("  42  "), Some(42.0));
    }

    #[test]
    fn parse_numeric_rejects_garbage() {
        assert_eq!(parse_numeric(""), None);
        assert_eq!(parse_numeric("n/a"), None);
        assert_eq!(parse_numeric("12x"), None);
    }

    #[test]
    fn calculate_fills_derived_flags() {
        let snapshot = TractionSnapshot {
            this_month_revenue: Some(12_000.0),
            last_month_revenue: Some(10_000.0),
            this_month_clients: Some(40.0),
            last_month_clients: Some(36.0),
            customer_lifetime_value: Some(1_500.0),
            customer_acquisition_cost: Some(300.0),
            ebitda_margin_pct: Some(15.0),
            gross_profit_pct: Some(60.0),
        };
        let metrics = GrowthMetrics::calculate(&snapshot);

        assert_eq!(metrics.mrr, 12_000.0);
        assert_eq!(metrics.arr, 144_000.0);
        assert!((metrics.revenue_growth_pct - 20.0).abs() < 1e-9);
        assert_eq!(metrics.revenue_per_client, 300.0);
        assert_eq!(metrics.ltv_cac_ratio, 5.0);
        assert!((metrics.rule_of_40_score - 35.0).abs() < 1e-9);
        assert!(metrics.is_growing);
        assert!(metrics.has_profitable_business);
        assert!(metrics.has_healthy_margins);
        assert!(metrics.has_positive_unit_economics);
    }

    #[test]
    fn calculate_handles_an_empty_snapshot() {
        let metrics = GrowthMetrics::calculate(&TractionSnapshot::default());
        assert_eq!(metrics.mrr, 0.0);
        assert_eq!(metrics.arr, 0.0);
        assert_eq!(metrics.rule_of_40_score, 0.0);
        assert!(!metrics.is_growing);
        assert!(!metrics.has_positive_unit_economics);
    }
}
