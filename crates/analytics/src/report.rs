use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A derived value, or the explicit marker that it cannot be computed.
///
/// `NotAvailable` is distinct from zero: zero is a measured result, while
/// `NotAvailable` means an input was missing or a denominator was not positive.
/// Serializes as the decimal or as `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Metric {
    Value(Decimal),
    #[default]
    NotAvailable,
}

impl Metric {
    /// `numerator / denominator` when both are present and the denominator is positive.
    pub fn ratio(numerator: Option<Decimal>, denominator: Option<Decimal>) -> Self {
        match (numerator, denominator) {
            (Some(numerator), Some(denominator)) if denominator > Decimal::ZERO => {
                numerator.checked_div(denominator).into()
            }
            _ => Metric::NotAvailable,
        }
    }

    pub fn value(self) -> Option<Decimal> {
        match self {
            Metric::Value(value) => Some(value),
            Metric::NotAvailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Metric::Value(_))
    }
}

impl From<Option<Decimal>> for Metric {
    fn from(value: Option<Decimal>) -> Self {
        value.map_or(Metric::NotAvailable, Metric::Value)
    }
}

/// Where the functional-expense figures behind the efficiency ratios came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseBasis {
    /// The filing itemized its functional expenses.
    Reported,
    /// The filing itemized nothing, so a fixed split of total expenses was assumed.
    Estimated,
}

/// Efficiency ratios, each a fraction of one (0.88, not 88).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EfficiencyRatios {
    /// Program service expenses / total expenses. Higher is better.
    pub program_efficiency: Metric,
    /// Fundraising expenses / contributions: the cost to raise one dollar. Lower is better.
    pub fundraising_efficiency: Metric,
    /// Management and general expenses / total expenses. Lower is better.
    pub admin_rate: Metric,
    pub basis: ExpenseBasis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevenueSourceKind {
    Contributions,
    Program,
    Investment,
    Other,
}

/// One positive component of total revenue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueSource {
    pub kind: RevenueSourceKind,
    pub amount: Decimal,
    /// Share of total revenue, when total revenue is positive.
    pub share: Metric,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SustainabilityMetrics {
    /// Current assets minus current liabilities. May be negative.
    pub working_capital: Metric,
    pub monthly_expenses: Metric,
    /// Working capital over monthly expenses. Negative values signal distress.
    pub months_of_cash: Metric,
    /// `1 - Σ share²` over the revenue components; higher is more diversified.
    pub diversification_score: Metric,
    pub revenue_sources: Vec<RevenueSource>,
}

/// A named formula, kept alongside the metrics so they can be displayed together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Formula {
    pub metric: String,
    pub expression: String,
}

impl Formula {
    fn new(metric: &str, expression: &str) -> Self {
        Self {
            metric: metric.to_string(),
            expression: expression.to_string(),
        }
    }

    /// The formulas behind every metric in `DerivedMetrics`.
    pub fn standard_set() -> Vec<Formula> {
        vec![
            Formula::new(
                "Program Efficiency",
                "Program Service Expenses / Total Expenses",
            ),
            Formula::new(
                "Fundraising Efficiency",
                "Fundraising Expenses / Total Contributions",
            ),
            Formula::new(
                "Administrative Rate",
                "Management & General Expenses / Total Expenses",
            ),
            Formula::new(
                "Working Capital",
                "Current Assets - Current Liabilities",
            ),
            Formula::new(
                "Months of Cash",
                "Working Capital / (Total Expenses / 12)",
            ),
            Formula::new(
                "Diversification Score",
                "1 - Σ (Revenue Source / Total Revenue)²",
            ),
        ]
    }
}

/// Every metric the engine derives from one filing.
///
/// Recomputed on demand; nothing here is cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub year: Option<i32>,
    pub efficiency: EfficiencyRatios,
    pub sustainability: SustainabilityMetrics,
    pub formulas: Vec<Formula>,
}

/// One year of the multi-year trend series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub year: i32,
    pub revenue: Option<Decimal>,
    pub expenses: Option<Decimal>,
    pub assets: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn ratio_requires_a_positive_denominator() {
        assert_eq!(
            Metric::ratio(Some(dec!(1)), Some(dec!(4))),
            Metric::Value(dec!(0.25))
        );
        assert_eq!(Metric::ratio(Some(dec!(1)), Some(dec!(0))), Metric::NotAvailable);
        assert_eq!(Metric::ratio(Some(dec!(1)), Some(dec!(-4))), Metric::NotAvailable);
        assert_eq!(Metric::ratio(None, Some(dec!(4))), Metric::NotAvailable);
        assert_eq!(Metric::ratio(Some(dec!(1)), None), Metric::NotAvailable);
    }

    #[test]
    fn zero_numerator_is_a_value() {
        assert_eq!(
            Metric::ratio(Some(Decimal::ZERO), Some(dec!(10))),
            Metric::Value(Decimal::ZERO)
        );
    }

    #[test]
    fn serializes_as_decimal_or_null() {
        let available = serde_json::to_value(Metric::Value(dec!(0.5))).unwrap();
        let missing = serde_json::to_value(Metric::NotAvailable).unwrap();
        assert_eq!(available, serde_json::json!("0.5"));
        assert_eq!(missing, serde_json::Value::Null);
    }
}
