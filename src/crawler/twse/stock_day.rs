use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    crawler::twse::{self, TableResponse},
    util::{self, datetime, text::parse_number},
};

/// 個股單日成交資訊，欄位名稱沿用證交所的中文欄位 (匯出 CSV 時作為表頭)
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct DailyPrice {
    /// 西元日期 YYYY-MM-DD
    #[serde(rename = "日期")]
    pub date: String,
    #[serde(rename = "成交股數")]
    pub trade_volume: Option<Decimal>,
    #[serde(rename = "成交金額")]
    pub trade_value: Option<Decimal>,
    #[serde(rename = "開盤價")]
    pub opening_price: Option<Decimal>,
    #[serde(rename = "最高價")]
    pub highest_price: Option<Decimal>,
    #[serde(rename = "最低價")]
    pub lowest_price: Option<Decimal>,
    #[serde(rename = "收盤價")]
    pub closing_price: Option<Decimal>,
    #[serde(rename = "漲跌價差")]
    pub change: Option<Decimal>,
    #[serde(rename = "成交筆數")]
    pub transaction: Option<Decimal>,
    #[serde(rename = "註記")]
    pub note: String,
}

/// 抓取個股在 `date` 所屬月份的每日成交資訊
pub async fn visit(stock_symbol: &str, date: NaiveDate) -> Result<Vec<DailyPrice>> {
    let url = format!(
        "https://www.{host}/exchangeReport/STOCK_DAY?response=json&date={date}&stockNo={symbol}",
        host = twse::HOST,
        date = date.format("%Y%m%d"),
        symbol = urlencoding::encode(stock_symbol),
    );

    let res = util::http::get_json::<TableResponse>(&url)
        .await
        .with_context(|| format!("Failed to get STOCK_DAY of {}", stock_symbol))?;

    Ok(parse(&res))
}

/// `stat` 不是 OK 時回傳空集合
pub(crate) fn parse(res: &TableResponse) -> Vec<DailyPrice> {
    if !res.is_ok() {
        return Vec::new();
    }

    let index = res.field_index();
    res.rows()
        .iter()
        .filter_map(|row| {
            let number = |field: &str| index.get(row, field).and_then(parse_number);
            let date = index.get(row, "日期")?;

            Some(DailyPrice {
                date: datetime::convert_date(date),
                trade_volume: number("成交股數"),
                trade_value: number("成交金額"),
                opening_price: number("開盤價"),
                highest_price: number("最高價"),
                lowest_price: number("最低價"),
                closing_price: number("收盤價"),
                change: number("漲跌價差"),
                transaction: number("成交筆數"),
                note: index.get(row, "註記").unwrap_or_default().to_string(),
            })
        })
        .collect()
}
