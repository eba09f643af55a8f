use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    crawler::twse::{self, TableResponse},
    util::{self, text::parse_number},
};

/// 全市場個股的本益比、殖利率及股價淨值比
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct MarketFundamental {
    #[serde(rename = "證券代號")]
    pub security_code: String,
    #[serde(rename = "證券名稱")]
    pub name: String,
    #[serde(rename = "收盤價")]
    pub closing_price: Option<Decimal>,
    #[serde(rename = "殖利率(%)")]
    pub dividend_yield: Option<Decimal>,
    #[serde(rename = "股利年度")]
    pub dividend_year: String,
    #[serde(rename = "本益比")]
    pub price_earning_ratio: Option<Decimal>,
    #[serde(rename = "股價淨值比")]
    pub price_book_ratio: Option<Decimal>,
    #[serde(rename = "財報年/季")]
    pub fiscal_year_quarter: String,
}

/// 抓取指定日期全市場的基本面數據
pub async fn visit(date: NaiveDate) -> Result<Vec<MarketFundamental>> {
    let url = format!(
        "https://www.{host}/exchangeReport/BWIBBU_d?response=json&date={date}&selectType=ALL",
        host = twse::HOST,
        date = date.format("%Y%m%d"),
    );

    let res = util::http::get_json::<TableResponse>(&url)
        .await
        .with_context(|| format!("Failed to get BWIBBU_d of {}", date))?;

    Ok(parse(&res))
}

pub(crate) fn parse(res: &TableResponse) -> Vec<MarketFundamental> {
    if !res.is_ok() {
        return Vec::new();
    }

    let index = res.field_index();
    res.rows()
        .iter()
        .filter_map(|row| {
            let text = |field: &str| index.get(row, field).unwrap_or_default().to_string();
            let security_code = index.get(row, "證券代號")?;
            if security_code.is_empty() {
                return None;
            }

            Some(MarketFundamental {
                security_code: security_code.to_string(),
                name: text("證券名稱"),
                closing_price: index.get(row, "收盤價").and_then(parse_number),
                dividend_yield: index.get(row, "殖利率(%)").and_then(parse_number),
                dividend_year: text("股利年度"),
                price_earning_ratio: index.get(row, "本益比").and_then(parse_number),
                price_book_ratio: index.get(row, "股價淨值比").and_then(parse_number),
                fiscal_year_quarter: text("財報年/季"),
            })
        })
        .collect()
}
