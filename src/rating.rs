use analytics::Metric;
use rust_decimal::Decimal;
use std::fmt;

/// A five-step health label for one metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rating {
    Excellent,
    Good,
    Fair,
    Concerning,
    Poor,
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Rating::Excellent => "Excellent",
            Rating::Good => "Good",
            Rating::Fair => "Fair",
            Rating::Concerning => "Concerning",
            Rating::Poor => "Poor",
        };
        f.write_str(label)
    }
}

/// The metrics that carry a rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatedMetric {
    ProgramEfficiency,
    AdminRate,
    FundraisingEfficiency,
    MonthsOfCash,
}

impl RatedMetric {
    /// Thresholds from the top band down; a value takes the first band whose
    /// threshold it reaches. Admin rate and fundraising cost are inverted: a
    /// higher value is worse.
    fn bands(&self) -> [(Decimal, Rating); 5] {
        match self {
            RatedMetric::ProgramEfficiency => [
                (Decimal::new(85, 2), Rating::Excellent),
                (Decimal::new(75, 2), Rating::Good),
                (Decimal::new(65, 2), Rating::Fair),
                (Decimal::new(50, 2), Rating::Concerning),
                (Decimal::ZERO, Rating::Poor),
            ],
            RatedMetric::AdminRate => [
                (Decimal::new(25, 2), Rating::Poor),
                (Decimal::new(20, 2), Rating::Concerning),
                (Decimal::new(15, 2), Rating::Fair),
                (Decimal::new(10, 2), Rating::Good),
                (Decimal::ZERO, Rating::Excellent),
            ],
            RatedMetric::FundraisingEfficiency => [
                (Decimal::new(40, 2), Rating::Poor),
                (Decimal::new(30, 2), Rating::Concerning),
                (Decimal::new(20, 2), Rating::Fair),
                (Decimal::new(10, 2), Rating::Good),
                (Decimal::ZERO, Rating::Excellent),
            ],
            RatedMetric::MonthsOfCash => [
                (Decimal::from(12), Rating::Excellent),
                (Decimal::from(9), Rating::Good),
                (Decimal::from(6), Rating::Fair),
                (Decimal::from(3), Rating::Concerning),
                (Decimal::ZERO, Rating::Poor),
            ],
        }
    }

    /// Rates `metric`; `None` when it is not available.
    pub fn rate(&self, metric: Metric) -> Option<Rating> {
        let value = metric.value()?;
        let bands = self.bands();
        let (_, lowest) = bands[bands.len() - 1];
        Some(
            bands
                .iter()
                .find(|(threshold, _)| value >= *threshold)
                .map_or(lowest, |(_, rating)| *rating),
        )
    }
}
