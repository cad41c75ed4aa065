//! # Nonprofit Lens Analytics Engine
//!
//! Derives financial-health indicators from a nonprofit's tax filings.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of external systems.
//!   It depends only on `core-types` (Layer 0).
//! - **Stateless Calculation:** Every operation is a free function from plain filing data to
//!   plain metric data. Nothing is cached, nothing is logged, and calling an operation twice
//!   on the same filing yields the same result.
//! - **Explicit Gaps:** A missing input or a non-positive denominator yields
//!   `Metric::NotAvailable`, never a silent zero. Ratios are fractions of one; turning them
//!   into percentages is left to the presentation layer.
//!
//! ## Public API
//!
//! - `compute_efficiency_ratios`, `compute_sustainability_metrics`, `derive_metrics`: per-filing metrics.
//! - `compute_growth_rate`, `try_growth_rate`, `financial_trends`: multi-year views.
//! - `AnalyticsError`: returned only when the input is not a filing at all.

// Declare the modules that constitute this crate.
pub mod engine;
pub mod error;
pub mod report;
pub mod trends;

// Re-export the key components to create a clean, public-facing API.
pub use engine::{
    compute_efficiency_ratios, compute_efficiency_ratios_reported, compute_sustainability_metrics,
    derive_metrics, derive_metrics_from_json,
};
pub use error::AnalyticsError;
pub use report::{
    DerivedMetrics, EfficiencyRatios, ExpenseBasis, Formula, Metric, RevenueSource,
    RevenueSourceKind, SustainabilityMetrics, TrendPoint,
};
pub use trends::{compute_growth_rate, financial_trends, latest_filing, try_growth_rate};
