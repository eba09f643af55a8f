//! # Yahoo 公司簡介
//!
//! 透過 quoteSummary 的 `assetProfile` 模組取得產業類別與英文公司簡介，
//! 內容原樣保留，不做翻譯。

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    crawler::yahoo::{listed_symbol, HOST},
    util,
};

/// 公司簡介與產業類別
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct BusinessProfile {
    pub stock_symbol: String,
    /// 產業類別 (英文)
    pub sector: Option<String>,
    /// 公司簡介 (英文)
    pub long_business_summary: Option<String>,
}

pub async fn visit(stock_symbol: &str) -> Result<BusinessProfile> {
    let url = format!(
        "https://{}/v10/finance/quoteSummary/{}?modules=assetProfile",
        HOST,
        urlencoding::encode(&listed_symbol(stock_symbol)),
    );

    let res = util::http::get_json::<Value>(&url)
        .await
        .with_context(|| format!("Failed to get the asset profile of {}", stock_symbol))?;

    Ok(parse(stock_symbol, &res))
}

/// 欄位不存在或為空白時維持 `None`
pub(crate) fn parse(stock_symbol: &str, res: &Value) -> BusinessProfile {
    let text = |pointer: &str| {
        res.pointer(pointer)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    BusinessProfile {
        stock_symbol: stock_symbol.to_string(),
        sector: text("/quoteSummary/result/0/assetProfile/sector"),
        long_business_summary: text("/quoteSummary/result/0/assetProfile/longBusinessSummary"),
    }
}
