use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::financial::FinancialPeriod;

/// 趨勢圖最多取幾期
pub const TREND_PERIODS: usize = 4;

/// 單一期間的財務比率，全部以百分比 (值 × 100) 表示。
///
/// 分母缺值或為 0 時比率定為 0，不視為錯誤。
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RatioSet {
    /// 毛利率
    pub gross_margin: Decimal,
    /// 營業利益率
    pub operating_margin: Decimal,
    /// 淨利率
    pub net_margin: Decimal,
    /// 股東權益報酬率 (ROE)，權益 = 總資產 - 總負債
    pub return_on_equity: Decimal,
    /// 資產報酬率 (ROA)
    pub return_on_assets: Decimal,
    /// 流動比率
    pub current_ratio: Decimal,
    /// 負債比率
    pub debt_ratio: Decimal,
    /// 營業現金流對淨利比
    pub operating_cash_flow_ratio: Decimal,
}

impl RatioSet {
    pub fn from_period(period: &FinancialPeriod) -> Self {
        let equity = period.total_assets.unwrap_or_default()
            - period.total_liabilities.unwrap_or_default();

        RatioSet {
            gross_margin: percentage(period.gross_profit, period.revenue),
            operating_margin: percentage(period.operating_income, period.revenue),
            net_margin: percentage(period.net_income, period.revenue),
            return_on_equity: percentage(period.net_income, Some(equity)),
            return_on_assets: percentage(period.net_income, period.total_assets),
            current_ratio: percentage(period.current_assets, period.current_liabilities),
            debt_ratio: percentage(period.total_liabilities, period.total_assets),
            operating_cash_flow_ratio: percentage(period.operating_cash_flow, period.net_income),
        }
    }
}

/// 趨勢圖上的一個年度
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub fiscal_year: i32,
    pub revenue: Decimal,
    pub earnings_per_share: Decimal,
}

impl From<&FinancialPeriod> for TrendPoint {
    fn from(period: &FinancialPeriod) -> Self {
        TrendPoint {
            fiscal_year: period.fiscal_year,
            revenue: period.revenue.unwrap_or_default(),
            // 沒有 EPS 就是 0，不拿淨利替代
            earnings_per_share: period.basic_eps.unwrap_or_default(),
        }
    }
}

/// 依年度由舊到新排列的營收/EPS 趨勢
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrendSeries {
    pub points: Vec<TrendPoint>,
}

impl TrendSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn years(&self) -> Vec<i32> {
        self.points.iter().map(|p| p.fiscal_year).collect()
    }
}

/// 一次分析的結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialAnalysis {
    pub ratios: RatioSet,
    pub trend: TrendSeries,
}

/// 以最近一期 (由新到舊排列的第 0 筆) 計算財務比率，沒有任何報表時回傳 `None`。
pub fn compute_ratios(periods: &[FinancialPeriod]) -> Option<RatioSet> {
    periods.first().map(RatioSet::from_period)
}

/// 取最近 4 期整理成由舊到新的趨勢，沒有任何報表時回傳 `None`。
pub fn compute_trend(periods: &[FinancialPeriod]) -> Option<TrendSeries> {
    if periods.is_empty() {
        return None;
    }

    let mut points: Vec<TrendPoint> = periods
        .iter()
        .take(TREND_PERIODS)
        .map(TrendPoint::from)
        .collect();
    points.sort_by_key(|p| p.fiscal_year);

    Some(TrendSeries { points })
}

pub fn analyze(periods: &[FinancialPeriod]) -> Option<FinancialAnalysis> {
    Some(FinancialAnalysis {
        ratios: compute_ratios(periods)?,
        trend: compute_trend(periods)?,
    })
}

/// numerator / denominator × 100，分母缺值或為 0 時回傳 0
fn percentage(numerator: Option<Decimal>, denominator: Option<Decimal>) -> Decimal {
    match denominator {
        Some(d) if !d.is_zero() => numerator
            .unwrap_or_default()
            .checked_div(d)
            .and_then(|ratio| ratio.checked_mul(dec!(100)))
            .unwrap_or_default(),
        _ => Decimal::ZERO,
    }
}
