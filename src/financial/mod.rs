//! # 財務報表與財務比率
//!
//! - [`FinancialPeriod`]：單一會計期間的報表科目，所有科目都可能缺值。
//! - [`ratio`]：由最近一期報表計算獲利與償債比率，並整理近 4 年營收/EPS 趨勢。

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

pub mod ratio;

pub use ratio::{analyze, compute_ratios, compute_trend, FinancialAnalysis, RatioSet, TrendPoint, TrendSeries};

/// 報表科目
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum LineItem {
    /// 營業收入
    Revenue,
    /// 營業毛利
    GrossProfit,
    /// 營業利益
    OperatingIncome,
    /// 稅後淨利
    NetIncome,
    /// 資產總額
    TotalAssets,
    /// 負債總額
    TotalLiabilities,
    /// 流動資產
    CurrentAssets,
    /// 流動負債
    CurrentLiabilities,
    /// 營業活動現金流量
    OperatingCashFlow,
    /// 基本每股盈餘
    BasicEps,
}

impl LineItem {
    /// 上游 (Yahoo fundamentals time-series) 使用的科目名稱
    pub fn provider_key(&self) -> &'static str {
        match self {
            LineItem::Revenue => "TotalRevenue",
            LineItem::GrossProfit => "GrossProfit",
            LineItem::OperatingIncome => "OperatingIncome",
            LineItem::NetIncome => "NetIncome",
            LineItem::TotalAssets => "TotalAssets",
            LineItem::TotalLiabilities => "TotalLiabilitiesNetMinorityInterest",
            LineItem::CurrentAssets => "CurrentAssets",
            LineItem::CurrentLiabilities => "CurrentLiabilities",
            LineItem::OperatingCashFlow => "OperatingCashFlow",
            LineItem::BasicEps => "BasicEPS",
        }
    }

    pub fn from_provider_key(key: &str) -> Option<Self> {
        use strum::IntoEnumIterator;
        LineItem::iter().find(|item| item.provider_key() == key)
    }
}

/// 單一會計期間的財務報表
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FinancialPeriod {
    /// 報表截止日
    pub as_of: NaiveDate,
    /// 會計年度 (西元)
    pub fiscal_year: i32,
    pub revenue: Option<Decimal>,
    pub gross_profit: Option<Decimal>,
    pub operating_income: Option<Decimal>,
    pub net_income: Option<Decimal>,
    pub total_assets: Option<Decimal>,
    pub total_liabilities: Option<Decimal>,
    pub current_assets: Option<Decimal>,
    pub current_liabilities: Option<Decimal>,
    pub operating_cash_flow: Option<Decimal>,
    pub basic_eps: Option<Decimal>,
}

impl FinancialPeriod {
    pub fn new(as_of: NaiveDate) -> Self {
        FinancialPeriod {
            as_of,
            fiscal_year: as_of.year(),
            ..Default::default()
        }
    }

    pub fn get(&self, item: LineItem) -> Option<Decimal> {
        match item {
            LineItem::Revenue => self.revenue,
            LineItem::GrossProfit => self.gross_profit,
            LineItem::OperatingIncome => self.operating_income,
            LineItem::NetIncome => self.net_income,
            LineItem::TotalAssets => self.total_assets,
            LineItem::TotalLiabilities => self.total_liabilities,
            LineItem::CurrentAssets => self.current_assets,
            LineItem::CurrentLiabilities => self.current_liabilities,
            LineItem::OperatingCashFlow => self.operating_cash_flow,
            LineItem::BasicEps => self.basic_eps,
        }
    }

    pub fn set(&mut self, item: LineItem, value: Option<Decimal>) {
        let field = match item {
            LineItem::Revenue => &mut self.revenue,
            LineItem::GrossProfit => &mut self.gross_profit,
            LineItem::OperatingIncome => &mut self.operating_income,
            LineItem::NetIncome => &mut self.net_income,
            LineItem::TotalAssets => &mut self.total_assets,
            LineItem::TotalLiabilities => &mut self.total_liabilities,
            LineItem::CurrentAssets => &mut self.current_assets,
            LineItem::CurrentLiabilities => &mut self.current_liabilities,
            LineItem::OperatingCashFlow => &mut self.operating_cash_flow,
            LineItem::BasicEps => &mut self.basic_eps,
        };
        *field = value;
    }
}
