pub mod cache;
pub mod config;
pub mod crawler;
pub mod export;
pub mod financial;
pub mod logging;
pub mod report;
pub mod util;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::{
    config::SETTINGS,
    crawler::{
        fetch_price_history,
        twse::{company, fundamentals::MarketFundamental},
        CachedSource, MarketDataSource, PublicSource,
    },
    report::Dashboard,
    util::datetime,
};

#[derive(Parser, Debug)]
#[command(name = "stock_insight")]
#[command(about = "台股公司基本資料、股價走勢與財務體質分析", long_about = None)]
#[command(version)]
struct Args {
    /// 股票代號，未指定時從標準輸入逐行讀取
    #[arg(short, long)]
    symbol: Option<String>,

    /// 抓取最近幾個月的股價
    #[arg(short, long, default_value_t = 3)]
    months: u32,

    /// 將結果匯出成 CSV
    #[arg(short, long)]
    export: bool,

    /// CSV 輸出目錄，預設使用設定檔的 export.dir
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// 一併抓取該日全市場的本益比、殖利率及股價淨值比 (YYYYMMDD)
    #[arg(long, value_parser = parse_yyyymmdd)]
    fundamentals_date: Option<NaiveDate>,
}

fn parse_yyyymmdd(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y%m%d")
        .map_err(|why| format!("'{}' is not a YYYYMMDD date: {}", s, why))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    let source = CachedSource::new(PublicSource);
    let export_dir = args
        .export_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&SETTINGS.export.dir));

    let market = match args.fundamentals_date {
        Some(date) => load_market_fundamentals(&source, date, args.export, &export_dir).await,
        None => None,
    };

    if let Some(symbol) = args.symbol.as_deref() {
        return analyze_symbol(&source, &args, &export_dir, market.as_deref(), symbol).await;
    }

    logging::info_console("請輸入股票代號 (r 清除快取，空白行或 q 離開)".to_string());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let symbol = line.trim();
        if symbol.is_empty() || symbol.eq_ignore_ascii_case("q") {
            break;
        }

        if symbol.eq_ignore_ascii_case("r") {
            source.clear();
            logging::info_console("已清除快取".to_string());
            continue;
        }

        if let Err(why) = analyze_symbol(&source, &args, &export_dir, market.as_deref(), symbol).await
        {
            logging::error_console(format!("Failed to analyze {} because {:?}", symbol, why));
        }
    }

    Ok(())
}

/// 抓取並顯示單一股票的儀表板
async fn analyze_symbol<S: MarketDataSource>(
    source: &S,
    args: &Args,
    export_dir: &Path,
    market: Option<&[MarketFundamental]>,
    symbol: &str,
) -> Result<()> {
    logging::info_file_async(format!("analyze {}", symbol));
    let today = Local::now().date_naive();

    let profiles = source.fetch_company_profiles().await;
    let profile = profiles
        .as_deref()
        .and_then(|list| company::find(list, symbol));
    let business = source.fetch_business_profile(symbol).await;
    let statements = source.fetch_period_statements(symbol).await;
    let analysis = statements.as_deref().and_then(financial::analyze);
    let prices = fetch_price_history(source, symbol, args.months, today).await;
    let fundamental =
        market.and_then(|list| list.iter().find(|f| f.security_code.trim() == symbol));

    let dashboard = Dashboard {
        stock_symbol: symbol,
        profile,
        business: business.as_ref(),
        prices: prices.as_deref(),
        analysis: analysis.as_ref(),
        fundamental,
    };
    println!("{}", dashboard.render());

    if !args.export {
        return Ok(());
    }

    if let Some(prices) = prices.as_deref() {
        for month in datetime::recent_month_starts(today, args.months) {
            let prefix = month.format("%Y-%m").to_string();
            let rows: Vec<_> = prices
                .iter()
                .filter(|p| p.date.starts_with(&prefix))
                .cloned()
                .collect();
            if rows.is_empty() {
                continue;
            }
            let path = export::stock_price_path(export_dir, symbol, month);
            export::write_csv(&path, &rows)?;
        }

        let path = export::stock_history_path(export_dir, symbol);
        export::write_csv(&path, prices)?;
        logging::info_console(format!("已匯出 {}", path.display()));
    }

    if let Some(analysis) = analysis.as_ref() {
        let path = export::financial_trend_path(export_dir, symbol);
        export::write_csv(&path, &export::trend_rows(&analysis.trend))
            .with_context(|| format!("Failed to export trend of {}", symbol))?;
        logging::info_console(format!("已匯出 {}", path.display()));
    }

    Ok(())
}

/// 抓取全市場估值表，需要時一併匯出
async fn load_market_fundamentals<S: MarketDataSource>(
    source: &S,
    date: NaiveDate,
    export: bool,
    export_dir: &Path,
) -> Option<Vec<MarketFundamental>> {
    let list = source.fetch_market_fundamentals(date).await;

    match list.as_deref() {
        None => logging::error_console(format!("{} 沒有全市場估值資料", date)),
        Some(rows) if export => {
            let path = export::market_fundamentals_path(export_dir, date);
            match export::write_csv(&path, rows) {
                Ok(count) => {
                    logging::info_console(format!("已匯出 {} 筆至 {}", count, path.display()))
                }
                Err(why) => logging::error_console(format!(
                    "Failed to export market fundamentals because {:?}",
                    why
                )),
            }
        }
        Some(_) => {}
    }

    list
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args() {
        let args = Args::parse_from(["stock_insight", "--symbol", "2330", "--export"]);
        assert_eq!(args.symbol.as_deref(), Some("2330"));
        assert_eq!(args.months, 3);
        assert!(args.export);
        assert!(args.export_dir.is_none());

        let args = Args::parse_from(["stock_insight", "--fundamentals-date", "20240205", "-m", "6"]);
        assert_eq!(args.fundamentals_date, NaiveDate::from_ymd_opt(2024, 2, 5));
        assert_eq!(args.months, 6);
        assert!(args.symbol.is_none());
    }

    #[test]
    fn test_parse_yyyymmdd() {
        assert!(parse_yyyymmdd("2024-02-05").is_err());
        assert!(parse_yyyymmdd("20240230").is_err());
    }
}
