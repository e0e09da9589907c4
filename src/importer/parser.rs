// src/importer/parser.rs
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

use crate::models::{is_valid_email, InvestorRecord, Result};

#[derive(Debug, Clone, Serialize)]
pub struct RowError {
    /// 1-based spreadsheet row number (header is row 1).
    pub row: usize,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ParsedSheet {
    pub records: Vec<InvestorRecord>,
    pub row_errors: Vec<RowError>,
    pub skipped_rows: usize,
}

/// Canonical fields we try to locate in the header row. Spreadsheets arrive
/// with human-typed column names, so each field carries a synonym list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    FirstName,
    LastName,
    Email,
    Country,
    City,
    InvestsViaCompany,
    CompanyName,
    InvestorType,
    Title,
}

impl Field {
    fn label(&self) -> &'static str {
        match self {
            Field::FirstName => "first_name",
            Field::LastName => "last_name",
            Field::Email => "email",
            Field::Country => "country",
            Field::City => "city",
            Field::InvestsViaCompany => "invests_via_company",
            Field::CompanyName => "company_name",
            Field::InvestorType => "investor_type",
            Field::Title => "title",
        }
    }

    fn synonyms(&self) -> &'static [&'static str] {
        match self {
            Field::FirstName => &["first name", "firstname", "first", "given name"],
            Field::LastName => &["last name", "lastname", "last", "surname", "family name"],
            Field::Email => &["email", "e-mail", "email address", "mail"],
            Field::Country => &["country", "nation"],
            Field::City => &["city", "town"],
            Field::InvestsViaCompany => &[
                "invests via company",
                "via company",
                "investment vehicle",
                "invests via",
            ],
            Field::CompanyName => &["company name", "company", "firm name", "firm", "fund name", "fund"],
            Field::InvestorType => &["investor type", "investor category", "type"],
            Field::Title => &["title", "job title", "role", "position"],
        }
    }

    fn required(&self) -> bool {
        matches!(self, Field::FirstName | Field::LastName | Field::Email)
    }
}

const ALL_FIELDS: [Field; 9] = [
    Field::FirstName,
    Field::LastName,
    Field::Email,
    Field::Country,
    Field::City,
    Field::InvestsViaCompany,
    Field::CompanyName,
    Field::InvestorType,
    Field::Title,
];

#[derive(Debug, Default)]
struct HeaderMap {
    columns: std::collections::HashMap<&'static str, usize>,
}

impl HeaderMap {
    fn column(&self, field: Field) -> Option<usize> {
        self.columns.get(field.label()).copied()
    }
}

/// Exact case-insensitive synonym match first, then substring match in either
/// direction. The exact pass runs for every field before any fuzzy matching
/// happens: a header that is an exact synonym of one field (e.g. "Company")
/// must not be fuzzily claimed by another field whose synonym merely contains
/// it. A column claimed by one field is never handed to another, and a
/// required field without a match aborts the whole parse.
fn match_headers(headers: &[String]) -> Result<HeaderMap> {
    let lowered: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
    let mut map = HeaderMap::default();
    let mut claimed: HashSet<usize> = HashSet::new();

    for field in ALL_FIELDS {
        'exact: for (i, header) in lowered.iter().enumerate() {
            if claimed.contains(&i) {
                continue;
            }
            for syn in field.synonyms() {
                if header == syn {
                    claimed.insert(i);
                    map.columns.insert(field.label(), i);
                    break 'exact;
                }
            }
        }
    }

    for field in ALL_FIELDS {
        if map.column(field).is_none() {
            'fuzzy: for (i, header) in lowered.iter().enumerate() {
                if header.is_empty() || claimed.contains(&i) {
                    continue;
                }
                for syn in field.synonyms() {
                    if header.contains(syn) || syn.contains(header.as_str()) {
                        claimed.insert(i);
                        map.columns.insert(field.label(), i);
                        break 'fuzzy;
                    }
                }
            }
        }

        if map.column(field).is_none() && field.required() {
            return Err(format!(
                "required column '{}' not found in file; available headers: {}",
                field.label(),
                headers.join(", ")
            )
            .into());
        }
    }

    Ok(map)
}

/// "true"/"yes"/"1"/"company"/"via company"/"firm" mean true, anything else false.
fn coerce_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "yes" | "1" | "company" | "via company" | "firm"
    )
}

fn cell(row: &[String], idx: Option<usize>) -> Option<String> {
    let idx = idx?;
    let value = row.get(idx)?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Turn a raw cell grid (first row = headers) into normalized investor
/// records. Row-level problems are accumulated, not short-circuited; the
/// whole parse only fails when headers are unusable or nothing valid remains.
pub fn parse_rows(grid: &[Vec<String>]) -> Result<ParsedSheet> {
    if grid.is_empty() {
        return Err("file contains no rows".into());
    }

    let headers = match_headers(&grid[0])?;

    let mut records = Vec::new();
    let mut row_errors = Vec::new();
    let mut skipped_rows = 0usize;
    let mut seen_emails: HashSet<String> = HashSet::new();

    for (i, row) in grid[1..].iter().enumerate() {
        let row_number = i + 2; // header is row 1

        if row.iter().all(|c| c.trim().is_empty()) {
            skipped_rows += 1;
            continue;
        }

        let first_name = cell(row, headers.column(Field::FirstName));
        let last_name = cell(row, headers.column(Field::LastName));
        let email = cell(row, headers.column(Field::Email));
        let country = cell(row, headers.column(Field::Country));
        let city = cell(row, headers.column(Field::City));
        let company_name = cell(row, headers.column(Field::CompanyName));
        let investor_type = cell(row, headers.column(Field::InvestorType));
        let title = cell(row, headers.column(Field::Title));
        let invests_via_company = cell(row, headers.column(Field::InvestsViaCompany))
            .map(|v| coerce_bool(&v))
            .unwrap_or(false);

        let mut errors: Vec<String> = Vec::new();

        if first_name.is_none() {
            errors.push("missing first_name".to_string());
        }
        if last_name.is_none() {
            errors.push("missing last_name".to_string());
        }
        match &email {
            None => errors.push("missing email".to_string()),
            Some(e) if !is_valid_email(e) => {
                errors.push(format!("invalid email format: {}", e))
            }
            Some(e) => {
                if !seen_emails.insert(e.to_lowercase()) {
                    errors.push("duplicate email found earlier in file".to_string());
                }
            }
        }
        if invests_via_company {
            if company_name.is_none() {
                errors.push("company_name is required when investing via a company".to_string());
            }
            if investor_type.is_none() {
                errors.push("investor_type is required when investing via a company".to_string());
            }
        }

        if !errors.is_empty() {
            row_errors.push(RowError {
                row: row_number,
                message: errors.join("; "),
            });
            continue;
        }

        records.push(InvestorRecord {
            first_name: first_name.unwrap_or_default(),
            last_name: last_name.unwrap_or_default(),
            email: email.unwrap_or_default(),
            country,
            city,
            invests_via_company,
            company_name,
            investor_type,
            title,
        });
    }

    debug!(
        "📄 Parsed sheet: {} valid, {} errors, {} skipped",
        records.len(),
        row_errors.len(),
        skipped_rows
    );

    if records.is_empty() {
        let detail = row_errors
            .first()
            .map(|e| format!(" (row {}: {})", e.row, e.message))
            .unwrap_or_default();
        return Err(format!("no valid investor rows found in file{}", detail).into());
    }

    Ok(ParsedSheet {
        records,
        row_errors,
        skipped_rows,
    })
}
