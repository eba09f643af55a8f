//! # Yahoo 財經採集模組
//!
//! 透過 Yahoo fundamentals time-series API 取得年度財務報表
//! (損益表、資產負債表、現金流量表的主要科目)，以及 quoteSummary 的公司簡介。
//!
//! - 來源域名：`query2.finance.yahoo.com`
//! - 台股代號需加上 `.TW` 後綴，例如 `2330.TW`。

/// 年度財務報表
pub mod financials;
/// 公司簡介與產業類別
pub mod profile;

/// Yahoo 財經 API 的主機域名
const HOST: &str = "query2.finance.yahoo.com";

/// 上市股票在 Yahoo 的代號
pub fn listed_symbol(stock_symbol: &str) -> String {
    format!("{}.TW", stock_symbol.trim())
}
