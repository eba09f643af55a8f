//! # Yahoo 年度財務報表
//!
//! 回應以科目名稱分組，每個科目是一串依 `asOfDate` 標記的數值，例如：
//!
//! ```text
//! {"timeseries":{"result":[
//!   {"meta":{"symbol":["2330.TW"],"type":["annualTotalRevenue"]},
//!    "timestamp":[1703980800],
//!    "annualTotalRevenue":[{"asOfDate":"2023-12-31","reportedValue":{"raw":2161735841000.0}}]}
//! ]}}
//! ```
//!
//! 這裡把它轉成以期間為單位的 [`FinancialPeriod`]，上游沒有回報的科目維持 `None`。
//! 期間以損益表為準，只有資產負債表或現金流量表的年度會被略過。

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::{Datelike, Local, NaiveDate};
use rust_decimal::{prelude::FromPrimitive, Decimal};
use serde_json::Value;
use strum::IntoEnumIterator;

use crate::{
    crawler::yahoo::{listed_symbol, HOST},
    financial::{FinancialPeriod, LineItem},
    logging,
    util::{self, text},
};

/// 年度報表的科目前綴
const ANNUAL_PREFIX: &str = "annual";
/// 往回抓幾年的報表
const LOOKBACK_YEARS: i32 = 10;

/// 抓取年度財務報表，依期間由新到舊排列
pub async fn visit(stock_symbol: &str) -> Result<Vec<FinancialPeriod>> {
    let symbol = listed_symbol(stock_symbol);
    let now = Local::now();
    let start = now
        .date_naive()
        .with_year(now.year() - LOOKBACK_YEARS)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| d.and_utc().timestamp())
        .unwrap_or_default();
    let types = LineItem::iter()
        .map(|item| format!("{}{}", ANNUAL_PREFIX, item.provider_key()))
        .collect::<Vec<_>>()
        .join(",");
    let url = format!(
        "https://{host}/ws/fundamentals-timeseries/v1/finance/timeseries/{symbol}?symbol={symbol}&type={types}&period1={start}&period2={end}",
        host = HOST,
        symbol = urlencoding::encode(&symbol),
        types = types,
        start = start,
        end = now.timestamp(),
    );

    let res = util::http::get_json::<Value>(&url)
        .await
        .with_context(|| format!("Failed to get financial statements of {}", symbol))?;

    Ok(parse(&res))
}

/// 將 time-series 回應轉成由新到舊的期間
pub(crate) fn parse(res: &Value) -> Vec<FinancialPeriod> {
    let Some(results) = res.pointer("/timeseries/result").and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut periods: BTreeMap<NaiveDate, FinancialPeriod> = BTreeMap::new();

    for result in results {
        let Some(key) = result.pointer("/meta/type/0").and_then(Value::as_str) else {
            continue;
        };

        let Some(item) = key
            .strip_prefix(ANNUAL_PREFIX)
            .and_then(LineItem::from_provider_key)
        else {
            logging::debug_file_async(format!("Skip the unknown line item {}", key));
            continue;
        };

        let Some(values) = result.get(key).and_then(Value::as_array) else {
            continue;
        };

        for value in values.iter().filter(|v| !v.is_null()) {
            let Some(as_of) = value
                .get("asOfDate")
                .and_then(Value::as_str)
                .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
            else {
                continue;
            };

            let number = value.pointer("/reportedValue/raw").and_then(to_decimal);
            periods
                .entry(as_of)
                .or_insert_with(|| FinancialPeriod::new(as_of))
                .set(item, number);
        }
    }

    periods
        .into_values()
        .rev()
        .filter(has_income_statement)
        .collect()
}

/// 至少要有一個損益表科目，否則比率與趨勢都會被當成 0
fn has_income_statement(period: &FinancialPeriod) -> bool {
    [
        LineItem::Revenue,
        LineItem::GrossProfit,
        LineItem::OperatingIncome,
        LineItem::NetIncome,
        LineItem::BasicEps,
    ]
    .into_iter()
    .any(|item| period.get(item).is_some())
}

/// JSON 數值轉 Decimal，先以文字解析保留原本的位數
fn to_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(Decimal::from)
            .or_else(|| text::parse_number(&n.to_string()))
            .or_else(|| n.as_f64().and_then(Decimal::from_f64)),
        Value::String(s) => text::parse_number(s),
        _ => None,
    }
}
