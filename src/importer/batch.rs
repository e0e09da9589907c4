// src/importer/batch.rs
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, warn};

use crate::identity::IdentityService;
use crate::importer::reconciler::reconcile_row;
use crate::models::{ImportReport, ImportSource, ImportSummary, InvestorRecord, Result, RowOutcome};
use crate::store::InvestorStore;

/// Drives one import batch: rows strictly in order, each row's outcome
/// recorded and never allowed to abort the rest of the batch.
pub struct BatchCoordinator<'a> {
    store: &'a dyn InvestorStore,
    identity: &'a dyn IdentityService,
    source: ImportSource,
    row_delay: Duration,
}

impl<'a> BatchCoordinator<'a> {
    pub fn new(
        store: &'a dyn InvestorStore,
        identity: &'a dyn IdentityService,
        source: ImportSource,
        row_delay_ms: u64,
    ) -> Self {
        Self {
            store,
            identity,
            source,
            row_delay: Duration::from_millis(row_delay_ms),
        }
    }

    pub async fn run(&self, records: &[InvestorRecord]) -> Result<ImportReport> {
        if records.is_empty() {
            return Err("no investor records to import".into());
        }

        info!(
            "🚚 Starting import batch: {} records (source: {})",
            records.len(),
            self.source.as_str()
        );

        // Firm names this batch has already resolved (created or matched),
        // keyed lowercased. Later rows naming the same firm reuse the id
        // instead of racing the store lookup.
        let mut firm_reservations: HashMap<String, i64> = HashMap::new();
        let mut outcomes: Vec<RowOutcome> = Vec::with_capacity(records.len());

        for (row_index, record) in records.iter().enumerate() {
            if row_index > 0 && !self.row_delay.is_zero() {
                tokio::time::sleep(self.row_delay).await;
            }

            let reserved_firm = record
                .company_name
                .as_ref()
                .and_then(|name| firm_reservations.get(&name.to_lowercase()).copied());

            let outcome = match reconcile_row(
                self.store,
                self.identity,
                record,
                row_index,
                self.source,
                reserved_firm,
            )
            .await
            {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!("Row {} failed unexpectedly: {}", row_index, e);
                    RowOutcome::failed(row_index, &record.email, format!("unexpected error: {}", e))
                }
            };

            if outcome.success {
                if let (Some(name), Some(firm_id)) = (&record.company_name, outcome.firm_id) {
                    firm_reservations.insert(name.to_lowercase(), firm_id);
                }
            }

            outcomes.push(outcome);
        }

        let summary = summarize(&outcomes);
        info!(
            "✓ Import batch done: {}/{} successful ({}%)",
            summary.successful, summary.total, summary.success_rate
        );

        Ok(ImportReport {
            summary,
            results: outcomes,
        })
    }
}

/// Pure reduction of per-row outcomes into the aggregate counts.
pub fn summarize(outcomes: &[RowOutcome]) -> ImportSummary {
    let total = outcomes.len();
    let successful = outcomes.iter().filter(|o| o.success).count();
    let failed = total - successful;
    let success_rate = if total == 0 {
        0
    } else {
        ((successful as f64 / total as f64) * 100.0).round() as u32
    };

    ImportSummary {
        total,
        successful,
        failed,
        success_rate,
    }
}
