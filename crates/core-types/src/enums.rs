use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Selects one monetary field of a `FilingRecord`.
///
/// Each variant owns its row of the field-mapping table: the registry key it is
/// published under, followed by every alias accepted from other producers.
/// The first key found in a raw record wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilingField {
    TotalRevenue,
    TotalExpenses,
    TotalAssetsEnd,
    TotalLiabilitiesEnd,
    TotalCurrentAssets,
    TotalCurrentLiabilities,
    ProgramServiceExpenses,
    ManagementExpenses,
    FundraisingExpenses,
    Contributions,
    ProgramRevenue,
    InvestmentIncome,
    OtherRevenue,
}

impl FilingField {
    pub const ALL: [FilingField; 13] = [
        FilingField::TotalRevenue,
        FilingField::TotalExpenses,
        FilingField::TotalAssetsEnd,
        FilingField::TotalLiabilitiesEnd,
        FilingField::TotalCurrentAssets,
        FilingField::TotalCurrentLiabilities,
        FilingField::ProgramServiceExpenses,
        FilingField::ManagementExpenses,
        FilingField::FundraisingExpenses,
        FilingField::Contributions,
        FilingField::ProgramRevenue,
        FilingField::InvestmentIncome,
        FilingField::OtherRevenue,
    ];

    /// The keys this field may appear under in a raw filing, in priority order.
    pub fn keys(&self) -> &'static [&'static str] {
        match self {
            FilingField::TotalRevenue => &["totrevenue", "totalRevenue"],
            FilingField::TotalExpenses => &["totfuncexpns", "totalExpenses"],
            FilingField::TotalAssetsEnd => &["totassetsend", "totalAssetsEnd"],
            FilingField::TotalLiabilitiesEnd => &["totliabend", "totalLiabilitiesEnd"],
            FilingField::TotalCurrentAssets => &["totcurrassets", "totalCurrentAssets"],
            FilingField::TotalCurrentLiabilities => &["totcurrliab", "totalCurrentLiabilities"],
            FilingField::ProgramServiceExpenses => &["progservexp", "programServiceExpenses"],
            FilingField::ManagementExpenses => &["managgenexp", "managementExpenses"],
            FilingField::FundraisingExpenses => {
                &["fundraisingexp", "fundraisingExpenses", "lessdirfndrsng"]
            }
            FilingField::Contributions => &["totcntrbgfts", "contributions"],
            FilingField::ProgramRevenue => &["totprgmrevnue", "programRevenue"],
            FilingField::InvestmentIncome => &["invstmntinc", "investmentIncome"],
            FilingField::OtherRevenue => &["othrevnue", "otherRevenue"],
        }
    }

    /// The canonical snake_case name, as used in serialized output.
    pub fn name(&self) -> &'static str {
        match self {
            FilingField::TotalRevenue => "total_revenue",
            FilingField::TotalExpenses => "total_expenses",
            FilingField::TotalAssetsEnd => "total_assets_end",
            FilingField::TotalLiabilitiesEnd => "total_liabilities_end",
            FilingField::TotalCurrentAssets => "total_current_assets",
            FilingField::TotalCurrentLiabilities => "total_current_liabilities",
            FilingField::ProgramServiceExpenses => "program_service_expenses",
            FilingField::ManagementExpenses => "management_expenses",
            FilingField::FundraisingExpenses => "fundraising_expenses",
            FilingField::Contributions => "contributions",
            FilingField::ProgramRevenue => "program_revenue",
            FilingField::InvestmentIncome => "investment_income",
            FilingField::OtherRevenue => "other_revenue",
        }
    }
}

impl fmt::Display for FilingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts the canonical name or any key from the mapping table.
impl FromStr for FilingField {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        FilingField::ALL
            .into_iter()
            .find(|field| field.name() == wanted || field.keys().iter().any(|key| *key == wanted))
            .ok_or_else(|| CoreError::UnknownField(wanted.to_string()))
    }
}
