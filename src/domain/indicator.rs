//! Financial indicator columns.
//!
//! Stored indicators map one-to-one onto numeric CSV columns and index into
//! `StatementRow::values`. Derived indicators are computed from stored ones on
//! read and never appear in the source file.

use serde::{Deserialize, Serialize};

use super::StatementRow;

/// Number of numeric columns carried by every statement row.
pub const STORED_COUNT: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    NetRevenue,
    GrossProfit,
    Ebit,
    NetIncome,
    FinancialExpenses,
    CurrentAssets,
    Cash,
    Inventory,
    TotalAssets,
    CurrentLiabilities,
    LongTermLiabilities,
    Equity,
    Investment,
    CurrentRatio,
    QuickRatio,
    CashRatio,
    GeneralLiquidity,
    GeneralIndebtedness,
    LiabilitiesToAssets,
    DebtComposition,
    InterestCoverage,
    NetMargin,
    ReturnOnAssets,
    ReturnOnEquity,
    AssetTurnover,
    /// `CurrentAssets - CurrentLiabilities`.
    WorkingCapital,
    /// `CurrentLiabilities + LongTermLiabilities`.
    TotalLiabilities,
}

impl Indicator {
    /// Stored indicators in source-column order.
    pub const STORED: [Indicator; STORED_COUNT] = [
        Indicator::NetRevenue,
        Indicator::GrossProfit,
        Indicator::Ebit,
        Indicator::NetIncome,
        Indicator::FinancialExpenses,
        Indicator::CurrentAssets,
        Indicator::Cash,
        Indicator::Inventory,
        Indicator::TotalAssets,
        Indicator::CurrentLiabilities,
        Indicator::LongTermLiabilities,
        Indicator::Equity,
        Indicator::Investment,
        Indicator::CurrentRatio,
        Indicator::QuickRatio,
        Indicator::CashRatio,
        Indicator::GeneralLiquidity,
        Indicator::GeneralIndebtedness,
        Indicator::LiabilitiesToAssets,
        Indicator::DebtComposition,
        Indicator::InterestCoverage,
        Indicator::NetMargin,
        Indicator::ReturnOnAssets,
        Indicator::ReturnOnEquity,
        Indicator::AssetTurnover,
    ];

    /// Position in `StatementRow::values`, or `None` for derived indicators.
    pub fn stored_index(self) -> Option<usize> {
        Self::STORED.iter().position(|&i| i == self)
    }

    pub fn is_derived(self) -> bool {
        self.stored_index().is_none()
    }

    /// Column header in the source CSV. Derived indicators use the label the
    /// dashboard shows for them.
    pub fn header(self) -> &'static str {
        match self {
            Indicator::NetRevenue => "RECEITA LIQUIDA",
            Indicator::GrossProfit => "LUCRO BRUTO",
            Indicator::Ebit => "EBIT",
            Indicator::NetIncome => "LUCRO LIQUIDO",
            Indicator::FinancialExpenses => "DESPESAS FINANCEIRAS",
            Indicator::CurrentAssets => "ATIVO CIRCULANTE",
            Indicator::Cash => "DISPONIVEL",
            Indicator::Inventory => "ESTOQUES",
            Indicator::TotalAssets => "ATIVO TOTAL",
            Indicator::CurrentLiabilities => "PASSIVO CIRCULANTE",
            Indicator::LongTermLiabilities => "EXIGIVEL A LONGO PRAZO",
            Indicator::Equity => "PATRIMONIO LIQUIDO",
            Indicator::Investment => "INVESTIMENTO",
            Indicator::CurrentRatio => "LIQUIDEZ CORRENTE",
            Indicator::QuickRatio => "LIQUIDEZ A SECO",
            Indicator::CashRatio => "LIQUIDEZ IMEDIATA",
            Indicator::GeneralLiquidity => "LIQUIDEZ GERAL",
            Indicator::GeneralIndebtedness => "ENDIVIDAMENTO GERAL",
            Indicator::LiabilitiesToAssets => "EXIGIVEL / ATIVO (TOTAL)",
            Indicator::DebtComposition => "COMPOSICAO DO ENDIVIDAMENTO",
            Indicator::InterestCoverage => "COBERTURA DE JUROS",
            Indicator::NetMargin => "MARGEM LIQUIDA",
            Indicator::ReturnOnAssets => "ROA",
            Indicator::ReturnOnEquity => "ROE",
            Indicator::AssetTurnover => "GIRO DO ATIVO",
            Indicator::WorkingCapital => "ATIVO - PASSIVO",
            Indicator::TotalLiabilities => "PASSIVO TOTAL",
        }
    }

    /// Read this indicator from a row, computing derived values on the fly.
    pub fn value(self, row: &StatementRow) -> Option<f64> {
        match self {
            Indicator::WorkingCapital => {
                let assets = row.get(Indicator::CurrentAssets)?;
                let liabilities = row.get(Indicator::CurrentLiabilities)?;
                Some(assets - liabilities)
            }
            Indicator::TotalLiabilities => {
                let current = row.get(Indicator::CurrentLiabilities)?;
                let long_term = row.get(Indicator::LongTermLiabilities)?;
                Some(current + long_term)
            }
            stored => row.get(stored),
        }
    }
}

impl std::fmt::Display for Indicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.header())
    }
}
