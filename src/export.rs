//! 匯出 CSV (UTF-8 含 BOM，Excel 開啟中文不會亂碼)

use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::financial::{TrendPoint, TrendSeries};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// 趨勢匯出的一列
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TrendRow {
    #[serde(rename = "年度")]
    pub fiscal_year: i32,
    #[serde(rename = "營收")]
    pub revenue: Decimal,
    #[serde(rename = "每股盈餘")]
    pub earnings_per_share: Decimal,
}

impl From<&TrendPoint> for TrendRow {
    fn from(point: &TrendPoint) -> Self {
        TrendRow {
            fiscal_year: point.fiscal_year,
            revenue: point.revenue,
            earnings_per_share: point.earnings_per_share,
        }
    }
}

/// 將資料寫成 CSV，第一列為表頭；上層目錄不存在時會自動建立。
///
/// 回傳寫入的資料筆數 (不含表頭)。
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<usize> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }

    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    out.write_all(UTF8_BOM)?;

    let mut writer = csv::Writer::from_writer(out);
    for row in rows {
        writer.serialize(row)?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to flush {}", path.display()))?;

    Ok(rows.len())
}

/// 趨勢資料轉成匯出用的列
pub fn trend_rows(trend: &TrendSeries) -> Vec<TrendRow> {
    trend.points.iter().map(TrendRow::from).collect()
}

pub fn stock_price_path(dir: &Path, stock_symbol: &str, month: NaiveDate) -> PathBuf {
    dir.join(format!("stock_price_{}_{}.csv", stock_symbol, month.format("%Y%m")))
}

pub fn stock_history_path(dir: &Path, stock_symbol: &str) -> PathBuf {
    dir.join(format!("stock_history_{}.csv", stock_symbol))
}

pub fn market_fundamentals_path(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!("market_fundamentals_{}.csv", date.format("%Y%m%d")))
}

pub fn financial_trend_path(dir: &Path, stock_symbol: &str) -> PathBuf {
    dir.join(format!("financial_trend_{}.csv", stock_symbol))
}
