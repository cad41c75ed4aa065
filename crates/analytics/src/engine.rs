use crate::error::AnalyticsError;
use crate::report::{
    DerivedMetrics, EfficiencyRatios, ExpenseBasis, Formula, Metric, RevenueSource,
    RevenueSourceKind, SustainabilityMetrics,
};
use core_types::FilingRecord;
use rust_decimal::Decimal;
use serde_json::Value;

/// Fixed program / management / fundraising split, applied to total expenses
/// when a filing itemizes none of its functional expenses.
const ESTIMATED_PROGRAM_SHARE: Decimal = Decimal::from_parts(88, 0, 0, false, 2);
const ESTIMATED_MANAGEMENT_SHARE: Decimal = Decimal::from_parts(10, 0, 0, false, 2);
const ESTIMATED_FUNDRAISING_SHARE: Decimal = Decimal::from_parts(2, 0, 0, false, 2);

const MONTHS_PER_YEAR: Decimal = Decimal::from_parts(12, 0, 0, false, 0);

/// Computes program efficiency, fundraising efficiency and administrative rate.
///
/// When the filing itemizes none of program, management or fundraising
/// expenses, a fixed 88/10/2 split of total expenses stands in for them and the
/// result is marked `ExpenseBasis::Estimated`.
pub fn compute_efficiency_ratios(filing: &FilingRecord) -> EfficiencyRatios {
    let itemized = filing.program_service_expenses.is_some()
        || filing.management_expenses.is_some()
        || filing.fundraising_expenses.is_some();

    match (itemized, filing.total_expenses) {
        (false, Some(total)) if total > Decimal::ZERO => {
            let estimated = FilingRecord {
                program_service_expenses: total.checked_mul(ESTIMATED_PROGRAM_SHARE),
                management_expenses: total.checked_mul(ESTIMATED_MANAGEMENT_SHARE),
                fundraising_expenses: total.checked_mul(ESTIMATED_FUNDRAISING_SHARE),
                ..filing.clone()
            };
            EfficiencyRatios {
                basis: ExpenseBasis::Estimated,
                ..compute_efficiency_ratios_reported(&estimated)
            }
        }
        _ => compute_efficiency_ratios_reported(filing),
    }
}

/// Computes the efficiency ratios from reported figures only, without the
/// fixed-split fallback.
pub fn compute_efficiency_ratios_reported(filing: &FilingRecord) -> EfficiencyRatios {
    EfficiencyRatios {
        program_efficiency: Metric::ratio(filing.program_service_expenses, filing.total_expenses),
        fundraising_efficiency: Metric::ratio(filing.fundraising_expenses, filing.contributions),
        admin_rate: Metric::ratio(filing.management_expenses, filing.total_expenses),
        basis: ExpenseBasis::Reported,
    }
}

/// Computes working capital, months of cash and revenue diversification.
pub fn compute_sustainability_metrics(filing: &FilingRecord) -> SustainabilityMetrics {
    let working_capital = match (filing.total_current_assets, filing.total_current_liabilities) {
        (Some(assets), Some(liabilities)) => assets.checked_sub(liabilities),
        _ => None,
    };

    let monthly_expenses = filing
        .total_expenses
        .and_then(|total| total.checked_div(MONTHS_PER_YEAR));

    // working_capital / (total / 12), rearranged so whole-dollar inputs stay exact.
    let months_of_cash = match (working_capital, filing.total_expenses, monthly_expenses) {
        (Some(capital), Some(total), Some(monthly)) if monthly > Decimal::ZERO => capital
            .checked_mul(MONTHS_PER_YEAR)
            .and_then(|scaled| scaled.checked_div(total))
            .into(),
        _ => Metric::NotAvailable,
    };

    SustainabilityMetrics {
        working_capital: working_capital.into(),
        monthly_expenses: monthly_expenses.into(),
        months_of_cash,
        diversification_score: diversification_score(filing),
        revenue_sources: revenue_sources(filing),
    }
}

/// Runs every derivation over one filing.
pub fn derive_metrics(filing: &FilingRecord) -> DerivedMetrics {
    DerivedMetrics {
        year: filing.year,
        efficiency: compute_efficiency_ratios(filing),
        sustainability: compute_sustainability_metrics(filing),
        formulas: Formula::standard_set(),
    }
}

/// Adapts a raw registry filing and derives its metrics.
///
/// Fails with `AnalyticsError::Computation` when `raw` is not a record at all.
pub fn derive_metrics_from_json(raw: &Value) -> Result<DerivedMetrics, AnalyticsError> {
    let filing = FilingRecord::from_value(raw)?;
    Ok(derive_metrics(&filing))
}

fn revenue_components(filing: &FilingRecord) -> [(RevenueSourceKind, Option<Decimal>); 4] {
    [
        (RevenueSourceKind::Contributions, filing.contributions),
        (RevenueSourceKind::Program, filing.program_revenue),
        (RevenueSourceKind::Investment, filing.investment_income),
        (RevenueSourceKind::Other, filing.other_revenue),
    ]
}

/// The amount each revenue share is measured against.
///
/// Normally the reported total revenue. When a loss (negative investment
/// income or residual) offsets part of the inflow, the non-negative components
/// outgrow that total; their gross sum is used instead so shares stay within one.
/// `None` when total revenue is absent or not positive.
fn share_base(filing: &FilingRecord) -> Option<Decimal> {
    let total = filing.total_revenue.filter(|total| *total > Decimal::ZERO)?;
    let gross = revenue_components(filing)
        .into_iter()
        .filter_map(|(_, amount)| amount.filter(|amount| *amount > Decimal::ZERO))
        .try_fold(Decimal::ZERO, |sum, amount| sum.checked_add(amount));
    Some(gross.map_or(total, |gross| gross.max(total)))
}

/// Herfindahl-style score: `1 - Σ share²` over the non-negative shares.
///
/// Negative components carry no share of the mix, and zero components count
/// as shares of zero.
fn diversification_score(filing: &FilingRecord) -> Metric {
    let Some(base) = share_base(filing) else {
        return Metric::NotAvailable;
    };

    let shares: Vec<Decimal> = revenue_components(filing)
        .into_iter()
        .filter_map(|(_, amount)| amount.filter(|amount| *amount >= Decimal::ZERO))
        .filter_map(|amount| amount.checked_div(base))
        .collect();

    if shares.len() < 2 || shares.iter().all(Decimal::is_zero) {
        return Metric::NotAvailable;
    }

    shares
        .iter()
        .try_fold(Decimal::ZERO, |sum, share| {
            share.checked_mul(*share).and_then(|square| sum.checked_add(square))
        })
        .and_then(|concentration| Decimal::ONE.checked_sub(concentration))
        .into()
}

fn revenue_sources(filing: &FilingRecord) -> Vec<RevenueSource> {
    let base = share_base(filing);
    revenue_components(filing)
        .into_iter()
        .filter_map(|(kind, amount)| {
            let amount = amount.filter(|amount| *amount > Decimal::ZERO)?;
            Some(RevenueSource {
                kind,
                amount,
                share: Metric::ratio(Some(amount), base),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn expenses_only(total: Decimal) -> FilingRecord {
        FilingRecord {
            total_expenses: Some(total),
            program_service_expenses: Some(dec!(800)),
            management_expenses: Some(dec!(150)),
            fundraising_expenses: Some(dec!(50)),
            contributions: Some(dec!(1000)),
            ..Default::default()
        }
    }

    #[test]
    fn efficiency_ratios_are_fractions() {
        let ratios = compute_efficiency_ratios(&expenses_only(dec!(1000)));
        assert_eq!(ratios.program_efficiency, Metric::Value(dec!(0.8)));
        assert_eq!(ratios.admin_rate, Metric::Value(dec!(0.15)));
        assert_eq!(ratios.fundraising_efficiency, Metric::Value(dec!(0.05)));
        assert_eq!(ratios.basis, ExpenseBasis::Reported);
    }

    #[test]
    fn non_positive_total_expenses_hide_expense_ratios() {
        for total in [dec!(0), dec!(-10)] {
            let ratios = compute_efficiency_ratios(&expenses_only(total));
            assert_eq!(ratios.program_efficiency, Metric::NotAvailable);
            assert_eq!(ratios.admin_rate, Metric::NotAvailable);
            // Fundraising is measured against contributions, not expenses.
            assert!(ratios.fundraising_efficiency.is_available());
        }

        let missing = FilingRecord {
            total_expenses: None,
            ..expenses_only(dec!(1))
        };
        let ratios = compute_efficiency_ratios(&missing);
        assert_eq!(ratios.program_efficiency, Metric::NotAvailable);
        assert_eq!(ratios.admin_rate, Metric::NotAvailable);
    }

    #[test]
    fn fundraising_needs_positive_contributions() {
        for contributions in [Some(dec!(0)), Some(dec!(-5)), None] {
            let filing = FilingRecord {
                contributions,
                ..expenses_only(dec!(1000))
            };
            assert_eq!(
                compute_efficiency_ratios(&filing).fundraising_efficiency,
                Metric::NotAvailable
            );
        }
    }

    #[test]
    fn partially_itemized_filing_is_not_estimated() {
        let filing = FilingRecord {
            total_expenses: Some(dec!(1000)),
            program_service_expenses: Some(dec!(900)),
            ..Default::default()
        };
        let ratios = compute_efficiency_ratios(&filing);
        assert_eq!(ratios.basis, ExpenseBasis::Reported);
        assert_eq!(ratios.program_efficiency, Metric::Value(dec!(0.9)));
        assert_eq!(ratios.admin_rate, Metric::NotAvailable);
    }

    #[test]
    fn unitemized_filing_falls_back_to_a_flagged_estimate() {
        let filing = FilingRecord {
            total_expenses: Some(dec!(1000)),
            contributions: Some(dec!(200)),
            ..Default::default()
        };

        let estimated = compute_efficiency_ratios(&filing);
        assert_eq!(estimated.basis, ExpenseBasis::Estimated);
        assert_eq!(estimated.program_efficiency, Metric::Value(dec!(0.88)));
        assert_eq!(estimated.admin_rate, Metric::Value(dec!(0.10)));
        assert_eq!(estimated.fundraising_efficiency, Metric::Value(dec!(0.1)));

        let reported = compute_efficiency_ratios_reported(&filing);
        assert_eq!(reported.basis, ExpenseBasis::Reported);
        assert_eq!(reported.program_efficiency, Metric::NotAvailable);
    }

    #[test]
    fn no_estimate_without_usable_total_expenses() {
        let filing = FilingRecord {
            total_expenses: Some(Decimal::ZERO),
            ..Default::default()
        };
        let ratios = compute_efficiency_ratios(&filing);
        assert_eq!(ratios.basis, ExpenseBasis::Reported);
        assert_eq!(ratios.program_efficiency, Metric::NotAvailable);
    }

    #[test]
    fn negative_working_capital_gives_negative_runway() {
        let filing = FilingRecord {
            total_current_assets: Some(dec!(100)),
            total_current_liabilities: Some(dec!(150)),
            total_expenses: Some(dec!(1200)),
            ..Default::default()
        };

        let metrics = compute_sustainability_metrics(&filing);
        assert_eq!(metrics.working_capital, Metric::Value(dec!(-50)));
        assert_eq!(metrics.monthly_expenses, Metric::Value(dec!(100)));
        assert_eq!(metrics.months_of_cash, Metric::Value(dec!(-0.5)));
    }

    #[test]
    fn runway_needs_positive_expenses_and_working_capital() {
        let no_expenses = FilingRecord {
            total_current_assets: Some(dec!(100)),
            total_current_liabilities: Some(dec!(50)),
            total_expenses: Some(Decimal::ZERO),
            ..Default::default()
        };
        let metrics = compute_sustainability_metrics(&no_expenses);
        assert_eq!(metrics.working_capital, Metric::Value(dec!(50)));
        assert_eq!(metrics.months_of_cash, Metric::NotAvailable);

        let no_liabilities = FilingRecord {
            total_current_assets: Some(dec!(100)),
            total_expenses: Some(dec!(1200)),
            ..Default::default()
        };
        let metrics = compute_sustainability_metrics(&no_liabilities);
        assert_eq!(metrics.working_capital, Metric::NotAvailable);
        assert_eq!(metrics.months_of_cash, Metric::NotAvailable);
    }

    fn revenue(
        total: Decimal,
        contributions: Option<Decimal>,
        program: Option<Decimal>,
        investment: Option<Decimal>,
        other: Option<Decimal>,
    ) -> FilingRecord {
        FilingRecord {
            total_revenue: Some(total),
            contributions,
            program_revenue: program,
            investment_income: investment,
            other_revenue: other,
            ..Default::default()
        }
    }

    #[test]
    fn diversification_of_four_equal_sources() {
        let filing = revenue(
            dec!(400),
            Some(dec!(100)),
            Some(dec!(100)),
            Some(dec!(100)),
            Some(dec!(100)),
        );
        assert_eq!(
            compute_sustainability_metrics(&filing).diversification_score,
            Metric::Value(dec!(0.75))
        );
    }

    #[test]
    fn diversification_of_a_single_source_is_zero() {
        let filing = revenue(
            dec!(500),
            Some(dec!(500)),
            Some(dec!(0)),
            Some(dec!(0)),
            None,
        );
        assert_eq!(
            compute_sustainability_metrics(&filing).diversification_score,
            Metric::Value(Decimal::ZERO)
        );
    }

    #[test]
    fn diversification_unavailable_without_revenue_or_components() {
        let zero_total = revenue(
            dec!(0),
            Some(dec!(1)),
            Some(dec!(1)),
            Some(dec!(1)),
            Some(dec!(1)),
        );
        assert_eq!(
            compute_sustainability_metrics(&zero_total).diversification_score,
            Metric::NotAvailable
        );

        let one_component = revenue(dec!(100), Some(dec!(100)), None, None, None);
        assert_eq!(
            compute_sustainability_metrics(&one_component).diversification_score,
            Metric::NotAvailable
        );

        let no_total = FilingRecord {
            contributions: Some(dec!(1)),
            program_revenue: Some(dec!(1)),
            ..Default::default()
        };
        assert_eq!(
            compute_sustainability_metrics(&no_total).diversification_score,
            Metric::NotAvailable
        );
    }

    fn assert_in_unit_range(metric: Metric) {
        let score = metric.value().expect("score should be available");
        assert!(score >= Decimal::ZERO && score < Decimal::ONE, "score {score} out of range");
    }

    #[test]
    fn negative_residual_other_revenue_keeps_the_score_in_range() {
        // Contributions exceed the reported total, so the derived other revenue is -300.
        let metrics = derive_metrics_from_json(&json!({
            "totrevenue": 1000,
            "totcntrbgfts": 1200,
            "totprgmrevnue": 100,
            "invstmntinc": 0
        }))
        .unwrap();

        let sustainability = &metrics.sustainability;
        assert_in_unit_range(sustainability.diversification_score);
        assert_eq!(
            sustainability
                .revenue_sources
                .iter()
                .map(|source| source.kind)
                .collect::<Vec<_>>(),
            vec![RevenueSourceKind::Contributions, RevenueSourceKind::Program]
        );
        for source in &sustainability.revenue_sources {
            assert!(source.share.value().is_some_and(|share| share <= Decimal::ONE));
        }
    }

    #[test]
    fn investment_losses_carry_no_share() {
        let metrics = derive_metrics_from_json(&json!({
            "totrevenue": 1000,
            "totcntrbgfts": 700,
            "totprgmrevnue": 400,
            "invstmntinc": -200
        }))
        .unwrap();
        assert_in_unit_range(metrics.sustainability.diversification_score);

        // Gross positive inflow equals the total once the loss is set aside.
        let filing = revenue(
            dec!(1000),
            Some(dec!(600)),
            Some(dec!(400)),
            Some(dec!(-50)),
            Some(dec!(0)),
        );
        assert_eq!(
            compute_sustainability_metrics(&filing).diversification_score,
            Metric::Value(dec!(0.48))
        );
    }

    #[test]
    fn all_zero_components_have_no_score() {
        let filing = revenue(dec!(100), Some(dec!(0)), Some(dec!(0)), None, None);
        assert_eq!(
            compute_sustainability_metrics(&filing).diversification_score,
            Metric::NotAvailable
        );
    }

    #[test]
    fn revenue_sources_keep_positive_components() {
        let filing = revenue(
            dec!(1000),
            Some(dec!(600)),
            Some(dec!(400)),
            Some(dec!(0)),
            None,
        );
        let sources = compute_sustainability_metrics(&filing).revenue_sources;
        assert_eq!(
            sources,
            vec![
                RevenueSource {
                    kind: RevenueSourceKind::Contributions,
                    amount: dec!(600),
                    share: Metric::Value(dec!(0.6)),
                },
                RevenueSource {
                    kind: RevenueSourceKind::Program,
                    amount: dec!(400),
                    share: Metric::Value(dec!(0.4)),
                },
            ]
        );
    }

    #[test]
    fn derivation_is_repeatable() {
        let filing = FilingRecord {
            year: Some(2020),
            total_revenue: Some(dec!(3)),
            contributions: Some(dec!(1)),
            program_revenue: Some(dec!(2)),
            ..expenses_only(dec!(7))
        };
        let first = derive_metrics(&filing);
        let second = derive_metrics(&filing);
        assert_eq!(first, second);
        assert_eq!(first.year, Some(2020));
        assert_eq!(first.formulas.len(), 6);
    }

    #[test]
    fn end_to_end_from_a_registry_filing() {
        let raw = json!({
            "tax_prd_yr": 2022,
            "totfuncexpns": 1000000,
            "totcntrbgfts": 400000,
            "progservexp": 880000,
            "managgenexp": 100000,
            "fundraisingexp": 20000,
            "totcurrassets": 500000,
            "totcurrliab": 200000
        });

        let metrics = derive_metrics_from_json(&raw).unwrap();
        assert_eq!(metrics.efficiency.program_efficiency, Metric::Value(dec!(0.88)));
        assert_eq!(metrics.efficiency.admin_rate, Metric::Value(dec!(0.10)));
        assert_eq!(metrics.efficiency.fundraising_efficiency, Metric::Value(dec!(0.05)));
        assert_eq!(metrics.sustainability.working_capital, Metric::Value(dec!(300000)));
        assert_eq!(metrics.sustainability.months_of_cash, Metric::Value(dec!(3.6)));
    }

    #[test]
    fn malformed_filing_is_a_computation_error() {
        let error = derive_metrics_from_json(&json!("not a filing")).unwrap_err();
        assert!(matches!(error, AnalyticsError::Computation(_)));
    }
}
