// src/api/import.rs
use base64::Engine;
use rocket::{post, serde::json::Json, State};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::ApiResponse;
use crate::importer::decode::decode_spreadsheet;
use crate::importer::{parse_rows, BatchCoordinator, RowError};
use crate::models::{ImportReport, ImportSource, InvestorRecord};
use crate::server::ServerState;

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub data: Vec<InvestorRecord>,
    pub source: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ImportFileRequest {
    pub filename: String,
    pub content_base64: String,
    pub source: Option<String>,
}

#[derive(Serialize)]
pub struct ParseSummary {
    pub valid_rows: usize,
    pub skipped_rows: usize,
    pub row_errors: Vec<RowError>,
}

#[derive(Serialize)]
pub struct FileImportResponse {
    pub parse: ParseSummary,
    pub import: ImportReport,
}

fn resolve_source(state: &ServerState, requested: &Option<String>) -> Result<ImportSource, String> {
    match requested {
        Some(s) => {
            ImportSource::parse(s).ok_or_else(|| format!("unknown import source: {}", s))
        }
        None => Ok(ImportSource::parse(&state.config.import.default_source)
            .unwrap_or(ImportSource::DeeDee)),
    }
}

async fn run_batch(
    state: &ServerState,
    records: &[InvestorRecord],
    source: ImportSource,
) -> Result<ImportReport, String> {
    if records.is_empty() {
        return Err("no investor records to import".to_string());
    }
    if records.len() > state.config.import.max_batch_size {
        return Err(format!(
            "batch too large: {} records (maximum {})",
            records.len(),
            state.config.import.max_batch_size
        ));
    }

    let coordinator = BatchCoordinator::new(
        &state.store,
        state.identity.as_ref(),
        source,
        state.config.import.row_delay_ms,
    );
    coordinator
        .run(records)
        .await
        .map_err(|e| e.to_string())
}

#[post("/investors/import", data = "<body>")]
pub async fn import_investors(
    state: &State<ServerState>,
    body: Json<ImportRequest>,
) -> Json<ApiResponse<ImportReport>> {
    let source = match resolve_source(state, &body.source) {
        Ok(source) => source,
        Err(e) => return Json(ApiResponse::error(e)),
    };

    match run_batch(state, &body.data, source).await {
        Ok(report) => Json(ApiResponse::success(report)),
        Err(e) => Json(ApiResponse::error(e)),
    }
}

#[post("/investors/import/file", data = "<body>")]
pub async fn import_investors_file(
    state: &State<ServerState>,
    body: Json<ImportFileRequest>,
) -> Json<ApiResponse<FileImportResponse>> {
    let source = match resolve_source(state, &body.source) {
        Ok(source) => source,
        Err(e) => return Json(ApiResponse::error(e)),
    };

    let bytes = match base64::engine::general_purpose::STANDARD.decode(&body.content_base64) {
        Ok(bytes) => bytes,
        Err(e) => return Json(ApiResponse::error(format!("invalid base64 payload: {}", e))),
    };

    let grid = match decode_spreadsheet(&body.filename, &bytes) {
        Ok(grid) => grid,
        Err(e) => return Json(ApiResponse::error(e.to_string())),
    };

    let sheet = match parse_rows(&grid) {
        Ok(sheet) => sheet,
        Err(e) => return Json(ApiResponse::error(e.to_string())),
    };

    info!(
        "📥 File import '{}': {} valid rows, {} row errors, {} skipped",
        body.filename,
        sheet.records.len(),
        sheet.row_errors.len(),
        sheet.skipped_rows
    );

    match run_batch(state, &sheet.records, source).await {
        Ok(report) => Json(ApiResponse::success(FileImportResponse {
            parse: ParseSummary {
                valid_rows: sheet.records.len(),
                skipped_rows: sheet.skipped_rows,
                row_errors: sheet.row_errors,
            },
            import: report,
        })),
        Err(e) => Json(ApiResponse::error(e)),
    }
}
