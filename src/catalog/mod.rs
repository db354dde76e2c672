//! Metric group catalog.
//!
//! Each metric group owns an ordered list of declarative chart descriptors.
//! The dashboard interpreter (`app::pipeline`) walks this list instead of
//! branching per group, so adding a chart is a one-line table change.
//!
//! The catalog is static: built at compile time, never mutated.

use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::domain::Indicator;
use crate::error::AppError;
use crate::viz::VizMode;

const ALL_MODES: &[VizMode] = &[VizMode::Line, VizMode::Heatmap, VizMode::Bar];
const LINE_ONLY: &[VizMode] = &[VizMode::Line];
const LINE_OR_BAR: &[VizMode] = &[VizMode::Line, VizMode::Bar];
const LINE_OR_HEATMAP: &[VizMode] = &[VizMode::Line, VizMode::Heatmap];
const HEATMAP_OR_BAR: &[VizMode] = &[VizMode::Heatmap, VizMode::Bar];

/// The eight metric groups offered by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetricGroup {
    Liquidez,
    Endividamento,
    Cobertura,
    Rentabilidade,
    Estrutura,
    Retorno,
    Atividade,
    Insights,
}

/// How a chart slot turns the working subset into a panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    /// Alternative visualizations chosen through the router.
    Routed {
        indicator: Indicator,
        allowed: &'static [VizMode],
    },
    /// Sum per company.
    Total { indicator: Indicator },
    /// Grouped bars, summed per company.
    Grouped { indicators: &'static [Indicator] },
    /// One pie per company, parts summed over the range.
    Composition { parts: &'static [Indicator] },
    /// Raw rows.
    Table { indicators: &'static [Indicator] },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartSpec {
    pub title: &'static str,
    pub kind: ChartKind,
}

const fn routed(title: &'static str, indicator: Indicator, allowed: &'static [VizMode]) -> ChartSpec {
    ChartSpec {
        title,
        kind: ChartKind::Routed { indicator, allowed },
    }
}

const fn total(title: &'static str, indicator: Indicator) -> ChartSpec {
    ChartSpec {
        title,
        kind: ChartKind::Total { indicator },
    }
}

const fn grouped(title: &'static str, indicators: &'static [Indicator]) -> ChartSpec {
    ChartSpec {
        title,
        kind: ChartKind::Grouped { indicators },
    }
}

const fn composition(title: &'static str, parts: &'static [Indicator]) -> ChartSpec {
    ChartSpec {
        title,
        kind: ChartKind::Composition { parts },
    }
}

const fn table(title: &'static str, indicators: &'static [Indicator]) -> ChartSpec {
    ChartSpec {
        title,
        kind: ChartKind::Table { indicators },
    }
}

use crate::domain::Indicator::*;

const LIQUIDEZ: &[ChartSpec] = &[
    grouped("Ativo & Passivo circulante", &[CurrentAssets, CurrentLiabilities]),
    routed("Liquidez corrente", CurrentRatio, ALL_MODES),
    routed("Liquidez seca", QuickRatio, ALL_MODES),
    routed("Liquidez imediata", CashRatio, LINE_OR_BAR),
    routed("Liquidez geral", GeneralLiquidity, ALL_MODES),
    table("Indicadores de liquidez", &[CurrentRatio, QuickRatio, CashRatio, GeneralLiquidity]),
];

const ENDIVIDAMENTO: &[ChartSpec] = &[
    composition("Composição do passivo total", &[LongTermLiabilities, CurrentLiabilities]),
    routed("Endividamento geral", GeneralIndebtedness, ALL_MODES),
    routed("Exigível / Ativo (total)", LiabilitiesToAssets, ALL_MODES),
    routed("Composição do endividamento", DebtComposition, LINE_OR_HEATMAP),
    grouped("Passivo circulante & longo prazo", &[CurrentLiabilities, LongTermLiabilities]),
    total("Somatório Passivo total", TotalLiabilities),
];

const COBERTURA: &[ChartSpec] = &[
    routed("Cobertura de juros", InterestCoverage, ALL_MODES),
    grouped("EBIT & Despesas financeiras", &[Ebit, FinancialExpenses]),
    routed("Despesas financeiras (timeline)", FinancialExpenses, LINE_ONLY),
    total("Somatório EBIT", Ebit),
];

const RENTABILIDADE: &[ChartSpec] = &[
    total("Somatório Receita Líquida", NetRevenue),
    routed("Margem líquida", NetMargin, ALL_MODES),
    grouped("Lucro bruto & Lucro líquido", &[GrossProfit, NetIncome]),
    routed("Receita Líquida (timeline)", NetRevenue, LINE_ONLY),
];

const ESTRUTURA: &[ChartSpec] = &[
    composition("Estrutura de capital", &[CurrentLiabilities, LongTermLiabilities, Equity]),
    grouped("Ativo total & Patrimônio líquido", &[TotalAssets, Equity]),
    routed("Capital de giro", WorkingCapital, ALL_MODES),
    routed("Investimento", Investment, LINE_OR_BAR),
];

const RETORNO: &[ChartSpec] = &[
    routed("ROA", ReturnOnAssets, ALL_MODES),
    routed("ROE", ReturnOnEquity, ALL_MODES),
    grouped("Lucro líquido & Patrimônio líquido", &[NetIncome, Equity]),
    table("Indicadores de retorno", &[ReturnOnAssets, ReturnOnEquity, NetMargin]),
];

const ATIVIDADE: &[ChartSpec] = &[
    routed("Giro do ativo", AssetTurnover, ALL_MODES),
    grouped("Estoques & Disponível", &[Inventory, Cash]),
    routed("Receita Líquida (timeline)", NetRevenue, LINE_ONLY),
    routed("Estoques", Inventory, HEATMAP_OR_BAR),
];

const INSIGHTS: &[ChartSpec] = &[
    total("Somatório Receita Líquida", NetRevenue),
    grouped("Somatório Ativo & Passivo circulante", &[CurrentAssets, CurrentLiabilities]),
    routed("Receita Líquida (timeline)", NetRevenue, LINE_ONLY),
    routed("Ativo - Passivo (timeline)", WorkingCapital, LINE_ONLY),
    composition("Composição do passivo total", &[LongTermLiabilities, CurrentLiabilities]),
    routed("Endividamento geral", GeneralIndebtedness, LINE_ONLY),
    grouped("Liquidez e Endividamento", &[CurrentRatio, QuickRatio, LiabilitiesToAssets]),
];

impl MetricGroup {
    pub const ALL: [MetricGroup; 8] = [
        MetricGroup::Liquidez,
        MetricGroup::Endividamento,
        MetricGroup::Cobertura,
        MetricGroup::Rentabilidade,
        MetricGroup::Estrutura,
        MetricGroup::Retorno,
        MetricGroup::Atividade,
        MetricGroup::Insights,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MetricGroup::Liquidez => "LIQUIDEZ",
            MetricGroup::Endividamento => "ENDIVIDAMENTO",
            MetricGroup::Cobertura => "COBERTURA",
            MetricGroup::Rentabilidade => "RENTABILIDADE",
            MetricGroup::Estrutura => "ESTRUTURA",
            MetricGroup::Retorno => "RETORNO",
            MetricGroup::Atividade => "ATIVIDADE",
            MetricGroup::Insights => "INSIGHTS",
        }
    }

    pub fn charts(self) -> &'static [ChartSpec] {
        match self {
            MetricGroup::Liquidez => LIQUIDEZ,
            MetricGroup::Endividamento => ENDIVIDAMENTO,
            MetricGroup::Cobertura => COBERTURA,
            MetricGroup::Rentabilidade => RENTABILIDADE,
            MetricGroup::Estrutura => ESTRUTURA,
            MetricGroup::Retorno => RETORNO,
            MetricGroup::Atividade => ATIVIDADE,
            MetricGroup::Insights => INSIGHTS,
        }
    }

    /// Routed `(indicator, allowed visualizations)` entries, in chart order.
    pub fn entries(self) -> Vec<(Indicator, &'static [VizMode])> {
        self.charts()
            .iter()
            .filter_map(|c| match c.kind {
                ChartKind::Routed { indicator, allowed } => Some((indicator, allowed)),
                _ => None,
            })
            .collect()
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|&g| g == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|&g| g == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl FromStr for MetricGroup {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        Self::ALL
            .into_iter()
            .find(|g| g.name().eq_ignore_ascii_case(key))
            .ok_or_else(|| AppError::UnknownMetricGroup(s.to_string()))
    }
}

impl std::fmt::Display for MetricGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
