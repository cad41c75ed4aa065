use crate::report::{Metric, TrendPoint};
use core_types::{FilingField, FilingRecord};
use rust_decimal::Decimal;

/// Year-over-year growth of `field` between the two most recent filings.
///
/// Filings are sorted by year, newest first, before the pair is chosen; filings
/// without a year sort last. Returns `NotAvailable` when there are fewer than
/// two filings, when either value is missing, or when the previous value is zero.
pub fn try_growth_rate(filings: &[FilingRecord], field: FilingField) -> Metric {
    let mut ordered: Vec<&FilingRecord> = filings.iter().collect();
    ordered.sort_by(|a, b| b.year.cmp(&a.year));

    let [current, previous, ..] = ordered.as_slice() else {
        return Metric::NotAvailable;
    };

    match (current.amount(field), previous.amount(field)) {
        (Some(current), Some(previous)) if !previous.is_zero() => current
            .checked_sub(previous)
            .and_then(|change| change.checked_div(previous))
            .into(),
        _ => Metric::NotAvailable,
    }
}

/// Like `try_growth_rate`, but reports every undefined rate as zero.
///
/// Callers that need to tell "no growth" from "cannot be computed" should use
/// `try_growth_rate` instead.
pub fn compute_growth_rate(filings: &[FilingRecord], field: FilingField) -> Decimal {
    try_growth_rate(filings, field)
        .value()
        .unwrap_or(Decimal::ZERO)
}

/// Revenue, expenses and end-of-year assets per year, oldest first.
///
/// Filings without a year cannot be placed on the series and are skipped.
pub fn financial_trends(filings: &[FilingRecord]) -> Vec<TrendPoint> {
    let mut points: Vec<TrendPoint> = filings
        .iter()
        .filter_map(|filing| {
            Some(TrendPoint {
                year: filing.year?,
                revenue: filing.total_revenue,
                expenses: filing.total_expenses,
                assets: filing.total_assets_end,
            })
        })
        .collect();
    points.sort_by_key(|point| point.year);
    points
}

/// The filing with the greatest year, if any filing has one.
pub fn latest_filing(filings: &[FilingRecord]) -> Option<&FilingRecord> {
    filings
        .iter()
        .filter(|filing| filing.year.is_some())
        .max_by_key(|filing| filing.year)
}
