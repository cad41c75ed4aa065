use crate::filing::FilingRecord;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One hit from a registry search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationSummary {
    pub ein: String,
    pub name: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub ntee_code: Option<String>,
    pub subsection_code: Option<String>,
    /// Relevance score assigned by the registry, if any.
    pub score: Option<Decimal>,
}

/// The result of a registry search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    /// Total hits reported by the registry, which may exceed `organizations.len()`.
    pub total_results: u64,
    pub organizations: Vec<OrganizationSummary>,
}

/// Identity and classification metadata for one organization, plus its filings.
///
/// `filings` keeps the order the registry sent them in, which is not
/// guaranteed to be chronological.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub ein: String,
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zipcode: Option<String>,
    pub tax_exempt_since: Option<String>,
    pub latest_filing_date: Option<String>,
    pub ntee_code: Option<String>,
    pub subsection_code: Option<String>,
    pub foundation_code: Option<String>,
    pub exemption_number: Option<String>,
    pub income_amount: Option<Decimal>,
    pub asset_amount: Option<Decimal>,
    pub website: Option<String>,
    pub filings: Vec<FilingRecord>,
}

impl Organization {
    /// "City, ST" when both parts are known, otherwise whichever part is.
    pub fn location(&self) -> Option<String> {
        join_location(self.city.as_deref(), self.state.as_deref())
    }
}

impl OrganizationSummary {
    pub fn location(&self) -> Option<String> {
        join_location(self.city.as_deref(), self.state.as_deref())
    }
}

fn join_location(city: Option<&str>, state: Option<&str>) -> Option<String> {
    match (city, state) {
        (Some(city), Some(state)) => Some(format!("{city}, {state}")),
        (Some(part), None) | (None, Some(part)) => Some(part.to_string()),
        (None, None) => None,
    }
}
