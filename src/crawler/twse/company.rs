use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::util;

/// 證交所 OpenAPI
const OPEN_API_HOST: &str = "openapi.twse.com.tw";

/// 上市公司基本資料 (OpenAPI t187ap03_L)
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct CompanyProfile {
    #[serde(rename = "公司代號")]
    pub stock_symbol: String,
    #[serde(rename = "公司名稱")]
    pub name: String,
    #[serde(rename = "公司簡稱")]
    pub short_name: String,
    #[serde(rename = "產業別")]
    pub industry: String,
    #[serde(rename = "董事長")]
    pub chairman: String,
    #[serde(rename = "總經理")]
    pub general_manager: String,
    #[serde(rename = "發言人")]
    pub spokesperson: String,
    /// 西元日期 yyyyMMdd
    #[serde(rename = "成立日期")]
    pub founding_date: String,
    /// 西元日期 yyyyMMdd
    #[serde(rename = "上市日期")]
    pub listing_date: String,
    /// 實收資本額 (元)
    #[serde(rename = "實收資本額")]
    pub paid_in_capital: String,
    #[serde(rename = "網址")]
    pub website: String,
}

impl CompanyProfile {
    /// 實收資本額轉成數值，格式不符時回傳 `None`
    pub fn paid_in_capital_amount(&self) -> Option<i128> {
        let capital = self.paid_in_capital.trim();
        if capital.is_empty() || !capital.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }

        capital.parse::<i128>().ok()
    }
}

/// 抓取全部上市公司的基本資料
pub async fn visit() -> Result<Vec<CompanyProfile>> {
    let url = format!("https://{}/v1/opendata/t187ap03_L", OPEN_API_HOST);
    util::http::get_json::<Vec<CompanyProfile>>(&url)
        .await
        .context("Failed to get listed company profiles")
}

/// 依股票代號找出公司資料
pub fn find<'a>(profiles: &'a [CompanyProfile], stock_symbol: &str) -> Option<&'a CompanyProfile> {
    profiles
        .iter()
        .find(|p| p.stock_symbol.trim() == stock_symbol.trim())
}
