use crate::error::ApiError;
use core_types::{FilingRecord, Organization, OrganizationSummary, SearchResults};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::str::FromStr;

// The registry is loose about scalar types: EINs and classification codes arrive
// as numbers or strings depending on the record, so those fields go through the
// lenient helpers at the bottom of this file.

/// The body of `GET /search.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub total_results: Option<u64>,
    pub organizations: Vec<SearchHit>,
}

/// A single hit within `SearchResponse::organizations`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    #[serde(deserialize_with = "required_string")]
    pub ein: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub ntee_code: Option<String>,
    #[serde(default, alias = "subseccd", deserialize_with = "lenient_string")]
    pub subsection_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub score: Option<Decimal>,
}

/// The body of `GET /organizations/{ein}.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct OrganizationResponse {
    pub organization: OrganizationRecord,
    /// Kept untyped until each entry passes through the filing field-mapping adapter.
    #[serde(default)]
    pub filings_with_data: Vec<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrganizationRecord {
    #[serde(deserialize_with = "required_string")]
    pub ein: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub zipcode: Option<String>,
    #[serde(default, alias = "ruling_date", deserialize_with = "lenient_string")]
    pub tax_exempt_since: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub latest_filing_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub tax_period: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub ntee_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub subsection_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub foundation_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub exemption_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub income_amount: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub asset_amount: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub website: Option<String>,
}

impl From<SearchResponse> for SearchResults {
    fn from(response: SearchResponse) -> Self {
        let organizations: Vec<OrganizationSummary> = response
            .organizations
            .into_iter()
            .map(|hit| OrganizationSummary {
                ein: normalize_ein(&hit.ein),
                name: hit.name.unwrap_or_default(),
                city: hit.city,
                state: hit.state,
                ntee_code: hit.ntee_code,
                subsection_code: hit.subsection_code,
                score: hit.score,
            })
            .collect();

        Self {
            total_results: response
                .total_results
                .unwrap_or(organizations.len() as u64),
            organizations,
        }
    }
}

impl TryFrom<OrganizationResponse> for Organization {
    type Error = ApiError;

    fn try_from(response: OrganizationResponse) -> Result<Self, Self::Error> {
        let filings = response
            .filings_with_data
            .iter()
            .map(FilingRecord::from_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ApiError::InvalidResponse(format!("filings_with_data: {e}")))?;

        let record = response.organization;
        Ok(Organization {
            ein: normalize_ein(&record.ein),
            name: record.name.unwrap_or_default(),
            address: record.address,
            city: record.city,
            state: record.state,
            zipcode: record.zipcode,
            tax_exempt_since: record.tax_exempt_since,
            latest_filing_date: record.latest_filing_date.or(record.tax_period),
            ntee_code: record.ntee_code,
            subsection_code: record.subsection_code,
            foundation_code: record.foundation_code,
            exemption_number: record.exemption_number,
            income_amount: record.income_amount,
            asset_amount: record.asset_amount,
            website: record.website,
            filings,
        })
    }
}

/// Numeric EINs lose their leading zeros in JSON; restore the nine-digit form.
pub(crate) fn normalize_ein(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.is_empty() && trimmed.len() < 9 && trimmed.chars().all(|c| c.is_ascii_digit()) {
        format!("{trimmed:0>9}")
    } else {
        trimmed.to_string()
    }
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(scalar_to_string))
}

fn required_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    scalar_to_string(value).ok_or_else(|| serde::de::Error::custom("expected a string or number"))
}

fn lenient_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(number)) => {
            let text = number.to_string();
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .ok()
        }
        Some(Value::String(text)) => Decimal::from_str(text.trim()).ok(),
        _ => None,
    })
}
