use crate::enums::FilingField;
use crate::error::CoreError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

/// Keys the fiscal year may be published under, in priority order.
const YEAR_KEYS: [&str; 2] = ["tax_prd_yr", "year"];

/// One fiscal year of tax-form data for one organization.
///
/// Every attribute is optional. An absent value means "not reported" and is
/// never the same thing as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilingRecord {
    pub year: Option<i32>,

    // I. Totals
    pub total_revenue: Option<Decimal>,
    pub total_expenses: Option<Decimal>,
    pub total_assets_end: Option<Decimal>,
    pub total_liabilities_end: Option<Decimal>,
    pub total_current_assets: Option<Decimal>,
    pub total_current_liabilities: Option<Decimal>,

    // II. Functional expenses
    pub program_service_expenses: Option<Decimal>,
    pub management_expenses: Option<Decimal>,
    pub fundraising_expenses: Option<Decimal>,

    // III. Revenue components
    pub contributions: Option<Decimal>,
    pub program_revenue: Option<Decimal>,
    pub investment_income: Option<Decimal>,
    pub other_revenue: Option<Decimal>,
}

impl FilingRecord {
    /// Builds a record from a raw registry filing.
    ///
    /// Keys are resolved through the `FilingField` mapping table. Numbers and
    /// numeric strings are accepted; any other value is treated as absent.
    /// Fails only when `raw` is not a JSON object.
    pub fn from_value(raw: &Value) -> Result<Self, CoreError> {
        let object = raw
            .as_object()
            .ok_or_else(|| CoreError::MalformedFiling(json_kind(raw).to_string()))?;

        let amount = |field: FilingField| lookup(object, field.keys()).and_then(coerce_amount);

        let mut record = Self {
            year: lookup(object, &YEAR_KEYS).and_then(coerce_year),
            total_revenue: amount(FilingField::TotalRevenue),
            total_expenses: amount(FilingField::TotalExpenses),
            total_assets_end: amount(FilingField::TotalAssetsEnd),
            total_liabilities_end: amount(FilingField::TotalLiabilitiesEnd),
            total_current_assets: amount(FilingField::TotalCurrentAssets),
            total_current_liabilities: amount(FilingField::TotalCurrentLiabilities),
            program_service_expenses: amount(FilingField::ProgramServiceExpenses),
            management_expenses: amount(FilingField::ManagementExpenses),
            fundraising_expenses: amount(FilingField::FundraisingExpenses),
            contributions: amount(FilingField::Contributions),
            program_revenue: amount(FilingField::ProgramRevenue),
            investment_income: amount(FilingField::InvestmentIncome),
            other_revenue: amount(FilingField::OtherRevenue),
        };

        // The registry publishes no "other revenue" line; it is whatever the
        // three itemized components leave of the total.
        if record.other_revenue.is_none() {
            record.other_revenue = record.residual_other_revenue();
        }

        Ok(record)
    }

    /// Reads one monetary field.
    pub fn amount(&self, field: FilingField) -> Option<Decimal> {
        match field {
            FilingField::TotalRevenue => self.total_revenue,
            FilingField::TotalExpenses => self.total_expenses,
            FilingField::TotalAssetsEnd => self.total_assets_end,
            FilingField::TotalLiabilitiesEnd => self.total_liabilities_end,
            FilingField::TotalCurrentAssets => self.total_current_assets,
            FilingField::TotalCurrentLiabilities => self.total_current_liabilities,
            FilingField::ProgramServiceExpenses => self.program_service_expenses,
            FilingField::ManagementExpenses => self.management_expenses,
            FilingField::FundraisingExpenses => self.fundraising_expenses,
            FilingField::Contributions => self.contributions,
            FilingField::ProgramRevenue => self.program_revenue,
            FilingField::InvestmentIncome => self.investment_income,
            FilingField::OtherRevenue => self.other_revenue,
        }
    }

    fn residual_other_revenue(&self) -> Option<Decimal> {
        let total = self.total_revenue?;
        total
            .checked_sub(self.program_revenue?)?
            .checked_sub(self.contributions?)?
            .checked_sub(self.investment_income?)
    }
}

fn lookup<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| object.get(*key))
}

fn coerce_amount(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(number) => parse_decimal(&number.to_string()),
        Value::String(text) => parse_decimal(text.trim()),
        _ => None,
    }
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

fn coerce_year(value: &Value) -> Option<i32> {
    match value {
        Value::Number(number) => number.as_i64().and_then(|year| i32::try_from(year).ok()),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn maps_registry_keys() {
        let record = FilingRecord::from_value(&json!({
            "tax_prd_yr": 2022,
            "totfuncexpns": 1000000,
            "totcntrbgfts": 400000,
            "progservexp": 880000,
            "managgenexp": 100000,
            "fundraisingexp": 20000,
            "totcurrassets": 500000,
            "totcurrliab": 200000,
            "pdf_url": null
        }))
        .unwrap();

        assert_eq!(record.year, Some(2022));
        assert_eq!(record.total_expenses, Some(dec!(1000000)));
        assert_eq!(record.program_service_expenses, Some(dec!(880000)));
        assert_eq!(record.management_expenses, Some(dec!(100000)));
        assert_eq!(record.fundraising_expenses, Some(dec!(20000)));
        assert_eq!(record.total_current_liabilities, Some(dec!(200000)));
        assert_eq!(record.total_revenue, None);
    }

    #[test]
    fn maps_camel_case_aliases() {
        let record = FilingRecord::from_value(&json!({
            "year": "2021",
            "totalRevenue": "1500.50",
            "otherRevenue": 12
        }))
        .unwrap();

        assert_eq!(record.year, Some(2021));
        assert_eq!(record.total_revenue, Some(dec!(1500.50)));
        assert_eq!(record.other_revenue, Some(dec!(12)));
    }

    #[test]
    fn registry_key_takes_priority_over_alias() {
        let record = FilingRecord::from_value(&json!({
            "tax_prd_yr": 2020,
            "year": 1999,
            "fundraisingexp": 5,
            "lessdirfndrsng": 7
        }))
        .unwrap();

        assert_eq!(record.year, Some(2020));
        assert_eq!(record.fundraising_expenses, Some(dec!(5)));
    }

    #[test]
    fn non_numeric_values_are_absent_not_zero() {
        let record = FilingRecord::from_value(&json!({
            "totrevenue": "n/a",
            "totfuncexpns": null,
            "totassetsend": true,
            "totliabend": [1],
            "invstmntinc": 0
        }))
        .unwrap();

        assert_eq!(record.total_revenue, None);
        assert_eq!(record.total_expenses, None);
        assert_eq!(record.total_assets_end, None);
        assert_eq!(record.total_liabilities_end, None);
        assert_eq!(record.investment_income, Some(Decimal::ZERO));
    }

    #[test]
    fn derives_other_revenue_from_the_itemized_components() {
        let record = FilingRecord::from_value(&json!({
            "totrevenue": 1000,
            "totprgmrevnue": 200,
            "totcntrbgfts": 500,
            "invstmntinc": 100
        }))
        .unwrap();
        assert_eq!(record.other_revenue, Some(dec!(200)));

        let partial = FilingRecord::from_value(&json!({
            "totrevenue": 1000,
            "totcntrbgfts": 500
        }))
        .unwrap();
        assert_eq!(partial.other_revenue, None);
    }

    #[test]
    fn reads_float_and_exponent_numbers() {
        let record = FilingRecord::from_value(&json!({
            "totrevenue": 1234.5,
            "totfuncexpns": 1e6
        }))
        .unwrap();

        assert_eq!(record.total_revenue, Some(dec!(1234.5)));
        assert_eq!(record.total_expenses, Some(dec!(1000000)));
    }

    #[test]
    fn rejects_values_that_are_not_records() {
        assert_eq!(
            FilingRecord::from_value(&json!([1, 2, 3])),
            Err(CoreError::MalformedFiling("an array".to_string()))
        );
        assert!(FilingRecord::from_value(&json!("2022")).is_err());
        assert!(FilingRecord::from_value(&Value::Null).is_err());
    }

    #[test]
    fn amount_reads_the_selected_field() {
        let record = FilingRecord {
            total_assets_end: Some(dec!(42)),
            ..Default::default()
        };
        assert_eq!(record.amount(FilingField::TotalAssetsEnd), Some(dec!(42)));
        assert_eq!(record.amount(FilingField::TotalRevenue), None);
    }
}
