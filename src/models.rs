use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub fn is_valid_email(email: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap())
        .is_match(email)
}

/// One investor row, normalized from a spreadsheet or submitted directly as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestorRecord {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub country: Option<String>,
    pub city: Option<String>,
    #[serde(default)]
    pub invests_via_company: bool,
    pub company_name: Option<String>,
    pub investor_type: Option<String>,
    pub title: Option<String>,
}

impl InvestorRecord {
    /// "{city}, {country}" with missing parts dropped; None when both are absent.
    pub fn hq_location(&self) -> Option<String> {
        match (self.city.as_deref(), self.country.as_deref()) {
            (Some(city), Some(country)) => Some(format!("{}, {}", city, country)),
            (Some(city), None) => Some(city.to_string()),
            (None, Some(country)) => Some(country.to_string()),
            (None, None) => None,
        }
    }

    /// A firm association is implied either by the explicit flag or by a
    /// company name being supplied on its own.
    pub fn wants_firm(&self) -> bool {
        self.invests_via_company || self.company_name.is_some()
    }

    /// Business-rule validation for a single record. File imports run this at
    /// parse time already; direct JSON submissions hit it here.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.first_name.trim().is_empty() {
            errors.push("missing first_name".to_string());
        }
        if self.last_name.trim().is_empty() {
            errors.push("missing last_name".to_string());
        }
        if self.email.trim().is_empty() {
            errors.push("missing email".to_string());
        } else if !is_valid_email(self.email.trim()) {
            errors.push(format!("invalid email format: {}", self.email));
        }
        if self.invests_via_company {
            if self.company_name.is_none() {
                errors.push("company_name is required when investing via a company".to_string());
            }
            if self.investor_type.is_none() {
                errors.push("investor_type is required when investing via a company".to_string());
            }
        }
        errors
    }
}

/// Which legacy import flow a batch belongs to. The two flows only differ in
/// the source tag stamped on firms they create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportSource {
    #[serde(rename = "deedee")]
    DeeDee,
    #[serde(rename = "admin")]
    Admin,
}

impl ImportSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportSource::DeeDee => "deedee",
            ImportSource::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "deedee" => Some(ImportSource::DeeDee),
            "admin" => Some(ImportSource::Admin),
            _ => None,
        }
    }
}

/// Per-row outcome of a bulk import.
#[derive(Debug, Clone, Serialize)]
pub struct RowOutcome {
    pub success: bool,
    pub row_index: usize,
    pub email: String,
    pub error: Option<String>,
    pub warnings: Vec<String>,
    pub firm_id: Option<i64>,
    pub profile_id: Option<String>,
    pub contact_id: Option<i64>,
}

impl RowOutcome {
    pub fn failed(row_index: usize, email: &str, error: String) -> Self {
        Self {
            success: false,
            row_index,
            email: email.to_string(),
            error: Some(error),
            warnings: Vec::new(),
            firm_id: None,
            profile_id: None,
            contact_id: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub success_rate: u32,
}

#[derive(Debug, Serialize)]
pub struct ImportReport {
    pub summary: ImportSummary,
    pub results: Vec<RowOutcome>,
}
