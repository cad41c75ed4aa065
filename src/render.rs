//! Terminal and JSON output for command results.

use crate::rating::RatedMetric;
use analytics::{
    DerivedMetrics, ExpenseBasis, Formula, Metric, RevenueSourceKind, TrendPoint,
};
use chrono::NaiveDate;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use configuration::OutputFormat;
use core_types::{FilingField, Organization, SearchResults};
use rust_decimal::Decimal;
use serde::Serialize;

const PROFILE_URL: &str = "https://projects.propublica.org/nonprofits/organizations";
const NOT_AVAILABLE: &str = "N/A";

/// Everything the `show` command presents for one organization.
#[derive(Debug, Serialize)]
pub struct AnalysisView<'a> {
    pub organization: &'a Organization,
    /// Metrics for the most recent filing that has a year.
    pub latest: Option<DerivedMetrics>,
    pub growth: Vec<GrowthRate>,
    pub trends: Vec<TrendPoint>,
}

/// Fields whose growth `show` reports unless others are requested.
pub const DEFAULT_GROWTH_FIELDS: [FilingField; 3] = [
    FilingField::TotalRevenue,
    FilingField::TotalExpenses,
    FilingField::TotalAssetsEnd,
];

/// Year-over-year growth of one field between the two most recent filings.
#[derive(Debug, Serialize)]
pub struct GrowthRate {
    pub field: FilingField,
    pub rate: Metric,
}

impl<'a> AnalysisView<'a> {
    pub fn build(organization: &'a Organization, growth_fields: &[FilingField]) -> Self {
        let filings = &organization.filings;
        Self {
            organization,
            latest: analytics::latest_filing(filings).map(analytics::derive_metrics),
            growth: growth_fields
                .iter()
                .map(|&field| GrowthRate {
                    field,
                    rate: analytics::try_growth_rate(filings, field),
                })
                .collect(),
            trends: analytics::financial_trends(filings),
        }
    }
}

pub fn print_search(results: &SearchResults, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(results)?),
        OutputFormat::Table => {
            if results.organizations.is_empty() {
                println!("No organizations found");
                return Ok(());
            }

            let mut table = new_table();
            table.set_header(vec!["EIN", "Name", "Location", "NTEE"]);
            for organization in &results.organizations {
                table.add_row(vec![
                    organization.ein.clone(),
                    organization.name.clone(),
                    or_na(organization.location()),
                    or_na(organization.ntee_code.clone()),
                ]);
            }
            println!("{table}");
            println!("Found {} results", results.total_results);
        }
    }
    Ok(())
}

pub fn print_analysis(view: &AnalysisView<'_>, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(view)?),
        OutputFormat::Table => {
            print_details(view.organization);
            match &view.latest {
                Some(metrics) => print_metrics(metrics),
                None => println!("\nNo filing with financial data is available."),
            }
            print_growth(&view.growth);
            print_trends(&view.trends);
            println!(
                "\nFull report: {}",
                profile_url(&view.organization.ein)
            );
        }
    }
    Ok(())
}

pub fn profile_url(ein: &str) -> String {
    format!("{PROFILE_URL}/{ein}")
}

fn print_details(organization: &Organization) {
    let mut table = new_table();
    table.set_header(vec!["Organization Details", ""]);
    let rows = [
        ("EIN", Some(organization.ein.clone())),
        ("Name", Some(organization.name.clone())),
        ("Location", organization.location()),
        (
            "Tax-Exempt Since",
            organization.tax_exempt_since.as_deref().map(format_date),
        ),
        (
            "Last Filing",
            organization.latest_filing_date.as_deref().map(format_date),
        ),
        ("NTEE Code", organization.ntee_code.clone()),
        ("Subsection", organization.subsection_code.clone()),
        ("Foundation Status", organization.foundation_code.clone()),
        ("Revenue", organization.income_amount.map(format_currency)),
        ("Assets", organization.asset_amount.map(format_currency)),
        ("Exemption", organization.exemption_number.clone()),
        ("Address", organization.address.clone()),
        ("ZIP", organization.zipcode.clone()),
        ("Website", organization.website.clone()),
    ];
    for (label, value) in rows {
        table.add_row(vec![label.to_string(), or_na(value)]);
    }
    println!("{table}");
}

fn print_metrics(metrics: &DerivedMetrics) {
    let year = metrics
        .year
        .map_or_else(|| NOT_AVAILABLE.to_string(), |year| year.to_string());
    println!("\nFinancial Health (fiscal year {year})");

    let efficiency = &metrics.efficiency;
    let sustainability = &metrics.sustainability;

    let mut table = new_table();
    table.set_header(vec!["Metric", "Value", "Rating", "Formula"]);
    let rows = [
        (
            "Program Efficiency",
            format_percent(efficiency.program_efficiency),
            Some(RatedMetric::ProgramEfficiency),
            efficiency.program_efficiency,
        ),
        (
            "Fundraising Efficiency",
            format_percent(efficiency.fundraising_efficiency),
            Some(RatedMetric::FundraisingEfficiency),
            efficiency.fundraising_efficiency,
        ),
        (
            "Administrative Rate",
            format_percent(efficiency.admin_rate),
            Some(RatedMetric::AdminRate),
            efficiency.admin_rate,
        ),
        (
            "Working Capital",
            format_metric(sustainability.working_capital, format_currency),
            None,
            sustainability.working_capital,
        ),
        (
            "Months of Cash",
            format_metric(sustainability.months_of_cash, |months| format!("{months:.1}")),
            Some(RatedMetric::MonthsOfCash),
            sustainability.months_of_cash,
        ),
        (
            "Diversification Score",
            format_metric(sustainability.diversification_score, |score| {
                format!("{score:.2}")
            }),
            None,
            sustainability.diversification_score,
        ),
    ];

    for (name, value, rated, metric) in rows {
        let rating = match rated {
            Some(rated) => or_na(rated.rate(metric).map(|rating| rating.to_string())),
            None => "-".to_string(),
        };
        table.add_row(vec![
            name.to_string(),
            value,
            rating,
            formula_for(&metrics.formulas, name),
        ]);
    }
    println!("{table}");

    if efficiency.basis == ExpenseBasis::Estimated {
        println!(
            "Note: this filing does not itemize functional expenses; efficiency ratios \
             assume an 88/10/2 program/management/fundraising split of total expenses."
        );
    }

    if !sustainability.revenue_sources.is_empty() {
        let mut mix = new_table();
        mix.set_header(vec!["Revenue Source", "Amount", "Share"]);
        for source in &sustainability.revenue_sources {
            mix.add_row(vec![
                source_label(source.kind).to_string(),
                format_currency(source.amount),
                format_percent(source.share),
            ]);
        }
        println!("{mix}");
    }
}

fn print_growth(growth: &[GrowthRate]) {
    if growth.is_empty() {
        return;
    }
    let mut table = new_table();
    table.set_header(vec!["Growth (latest vs. previous year)", ""]);
    for line in growth {
        table.add_row(vec![line.field.to_string(), format_percent(line.rate)]);
    }
    println!("\n{table}");
}

fn print_trends(trends: &[TrendPoint]) {
    println!("\nFinancial Trends");
    if trends.is_empty() {
        println!("No historical data available");
        return;
    }

    let mut table = new_table();
    table.set_header(vec!["Year", "Revenue", "Expenses", "Assets"]);
    for point in trends {
        table.add_row(vec![
            point.year.to_string(),
            or_na(point.revenue.map(format_currency_abbreviated)),
            or_na(point.expenses.map(format_currency_abbreviated)),
            or_na(point.assets.map(format_currency_abbreviated)),
        ]);
    }
    println!("{table}");
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn formula_for(formulas: &[Formula], metric: &str) -> String {
    formulas
        .iter()
        .find(|formula| formula.metric == metric)
        .map_or_else(String::new, |formula| formula.expression.clone())
}

fn source_label(kind: RevenueSourceKind) -> &'static str {
    match kind {
        RevenueSourceKind::Contributions => "Contributions",
        RevenueSourceKind::Program => "Program",
        RevenueSourceKind::Investment => "Investment",
        RevenueSourceKind::Other => "Other",
    }
}

fn or_na(value: Option<String>) -> String {
    value.unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn format_metric(metric: Metric, format: impl Fn(Decimal) -> String) -> String {
    or_na(metric.value().map(format))
}

/// Renders a fraction of one as a percentage: 0.8812 becomes "88.1%".
pub fn format_percent(metric: Metric) -> String {
    format_metric(metric, |fraction| {
        format!("{:.1}%", fraction * Decimal::ONE_HUNDRED)
    })
}

/// Whole dollars with thousands separators: "$1,234,567".
pub fn format_currency(amount: Decimal) -> String {
    let rounded = amount.round_dp(0);
    let digits = rounded.abs().trunc().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

/// Short form for trend tables: "$1.2B", "$3.4M", "$56K".
pub fn format_currency_abbreviated(amount: Decimal) -> String {
    let magnitude = amount.abs();
    let sign = if amount.is_sign_negative() && !amount.is_zero() { "-" } else { "" };

    if magnitude >= Decimal::from(1_000_000_000) {
        format!("{sign}${:.1}B", magnitude / Decimal::from(1_000_000_000))
    } else if magnitude >= Decimal::from(1_000_000) {
        format!("{sign}${:.1}M", magnitude / Decimal::from(1_000_000))
    } else if magnitude >= Decimal::from(1_000) {
        format!("{sign}${:.0}K", magnitude / Decimal::from(1_000))
    } else {
        format_currency(amount)
    }
}

/// "1993-06-01" becomes "Jun 1, 1993". Partial dates ("1993-06") use the
/// first of the month; anything unparseable is shown as-is.
pub fn format_date(raw: &str) -> String {
    let trimmed = raw.trim();
    let day = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{trimmed}-01"), "%Y-%m-%d"))
        .map(|date| date.format("%b %-d, %Y").to_string())
        .unwrap_or_else(|_| trimmed.to_string())
}
