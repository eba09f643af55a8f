//! # 主控台儀表板
//!
//! 每個區塊都是回傳 `String` 的純函式，只負責排版，不做任何計算以外的格式轉換。
//! 資料抓不到時明確印出「暫無資料」。

use std::fmt::Write;

use rust_decimal::{prelude::ToPrimitive, Decimal};
use rust_decimal_macros::dec;

use crate::{
    crawler::{
        twse::{company::CompanyProfile, fundamentals::MarketFundamental, stock_day::DailyPrice},
        yahoo::profile::BusinessProfile,
    },
    financial::{FinancialAnalysis, RatioSet, TrendSeries},
    util::text::format_thousands,
};

pub const NO_DATA: &str = "暫無資料";
pub const NO_SUMMARY: &str = "暫無詳細描述";
const NOT_AVAILABLE: &str = "N/A";
const SPARK_TICKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const BAR_WIDTH: u32 = 30;
/// 營收以「億」為單位顯示
const HUNDRED_MILLION: Decimal = dec!(100000000);

/// 儀表板的全部內容
pub struct Dashboard<'a> {
    pub stock_symbol: &'a str,
    pub profile: Option<&'a CompanyProfile>,
    pub business: Option<&'a BusinessProfile>,
    pub prices: Option<&'a [DailyPrice]>,
    pub analysis: Option<&'a FinancialAnalysis>,
    pub fundamental: Option<&'a MarketFundamental>,
}

impl Dashboard<'_> {
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&render_company(self.stock_symbol, self.profile, self.business));
        out.push('\n');
        out.push_str(&render_price_trend(self.prices));
        if let Some(fundamental) = self.fundamental {
            out.push('\n');
            out.push_str(&render_valuation(fundamental));
        }
        out.push('\n');
        out.push_str(&render_ratios(self.analysis.map(|a| &a.ratios)));
        out.push('\n');
        out.push_str(&render_trend(self.analysis.map(|a| &a.trend)));
        out
    }
}

fn or_na(value: &str) -> &str {
    let value = value.trim();
    if value.is_empty() {
        NOT_AVAILABLE
    } else {
        value
    }
}

/// 公司基本資料，產業別缺值時改用 Yahoo 的 sector，最後附上未翻譯的公司簡介
pub fn render_company(
    stock_symbol: &str,
    profile: Option<&CompanyProfile>,
    business: Option<&BusinessProfile>,
) -> String {
    let summary = business
        .and_then(|b| b.long_business_summary.as_deref())
        .unwrap_or(NO_SUMMARY);

    let Some(profile) = profile else {
        return format!(
            "== 🏢 {} 公司基本資料 ==\n{}\n📝 公司簡介：{}\n",
            stock_symbol, NO_DATA, summary
        );
    };

    let capital = match profile.paid_in_capital_amount() {
        Some(amount) => format!("{} 元", format_thousands(amount)),
        None => or_na(&profile.paid_in_capital).to_string(),
    };
    let title = if profile.name.trim().is_empty() {
        stock_symbol
    } else {
        profile.name.trim()
    };

    let industry = match profile.industry.trim() {
        "" => business
            .and_then(|b| b.sector.as_deref())
            .unwrap_or(NOT_AVAILABLE),
        industry => industry,
    };

    let mut out = format!("== 🏢 {} 公司基本資料 ==\n", title);
    let _ = writeln!(out, "董事長：{}", or_na(&profile.chairman));
    let _ = writeln!(out, "總經理：{}", or_na(&profile.general_manager));
    let _ = writeln!(out, "發言人：{}", or_na(&profile.spokesperson));
    let _ = writeln!(out, "成立日期：{}", or_na(&profile.founding_date));
    let _ = writeln!(out, "上市日期：{}", or_na(&profile.listing_date));
    let _ = writeln!(out, "實收資本額：{}", capital);
    let _ = writeln!(out, "產業類別：{}", industry);
    let _ = writeln!(out, "網址：{}", or_na(&profile.website));
    let _ = writeln!(out, "📝 公司簡介：{}", summary);
    out
}

/// 短期股價走勢 (收盤價)
pub fn render_price_trend(prices: Option<&[DailyPrice]>) -> String {
    let mut out = String::from("== 📈 短期股價走勢 ==\n");

    let closes: Vec<(&str, Decimal)> = prices
        .unwrap_or_default()
        .iter()
        .filter_map(|p| p.closing_price.map(|close| (p.date.as_str(), close)))
        .collect();

    let (Some(first), Some(last)) = (closes.first(), closes.last()) else {
        out.push_str(NO_DATA);
        out.push('\n');
        return out;
    };

    let values: Vec<Decimal> = closes.iter().map(|(_, close)| *close).collect();
    let high = values.iter().copied().max().unwrap_or_default();
    let low = values.iter().copied().min().unwrap_or_default();

    let _ = writeln!(out, "期間：{} ~ {} ({} 個交易日)", first.0, last.0, closes.len());
    let _ = writeln!(out, "收盤：{} → {}", first.1, last.1);
    let _ = writeln!(out, "最高：{}  最低：{}", high, low);
    let _ = writeln!(out, "{}", sparkline(&values));
    out
}

/// 以方塊字元畫出數列的高低
pub fn sparkline(values: &[Decimal]) -> String {
    let (Some(low), Some(high)) = (values.iter().min(), values.iter().max()) else {
        return String::new();
    };

    let range = *high - *low;
    let top = Decimal::from(SPARK_TICKS.len() - 1);

    values
        .iter()
        .map(|v| {
            let index = if range.is_zero() {
                SPARK_TICKS.len() / 2
            } else {
                ((*v - *low) * top / range)
                    .round()
                    .to_usize()
                    .unwrap_or_default()
            };
            SPARK_TICKS[index.min(SPARK_TICKS.len() - 1)]
        })
        .collect()
}

/// 個股的本益比、殖利率及股價淨值比
pub fn render_valuation(fundamental: &MarketFundamental) -> String {
    let show = |value: Option<Decimal>| match value {
        Some(v) => format!("{:.2}", v.round_dp(2)),
        None => NOT_AVAILABLE.to_string(),
    };

    let mut out = String::from("== 💰 估值指標 ==\n");
    let _ = writeln!(out, "本益比：{}", show(fundamental.price_earning_ratio));
    let _ = writeln!(out, "殖利率：{}%", show(fundamental.dividend_yield));
    let _ = writeln!(out, "股價淨值比：{}", show(fundamental.price_book_ratio));
    let _ = writeln!(out, "財報年/季：{}", or_na(&fundamental.fiscal_year_quarter));
    out
}

/// 最新一期的財務比率
pub fn render_ratios(ratios: Option<&RatioSet>) -> String {
    let mut out = String::from("== 📊 財務體質分析 ==\n");

    let Some(ratios) = ratios else {
        out.push_str(NO_DATA);
        out.push('\n');
        return out;
    };

    let rows = [
        ("毛利率", ratios.gross_margin),
        ("營業利益率", ratios.operating_margin),
        ("淨利率", ratios.net_margin),
        ("ROE (股東權益報酬率)", ratios.return_on_equity),
        ("流動比率", ratios.current_ratio),
        ("負債比率", ratios.debt_ratio),
        ("ROA (資產報酬率)", ratios.return_on_assets),
        ("現金流對淨利比", ratios.operating_cash_flow_ratio),
    ];

    for (label, value) in rows {
        let _ = writeln!(out, "{}：{:.2}%", label, value.round_dp(2));
    }

    out
}

/// 近年營收長條圖與 EPS 走勢
pub fn render_trend(trend: Option<&TrendSeries>) -> String {
    let mut out = String::from("== 📅 歷年營收與 EPS ==\n");

    let Some(trend) = trend.filter(|t| !t.is_empty()) else {
        out.push_str(NO_DATA);
        out.push('\n');
        return out;
    };

    let max_revenue = trend
        .points
        .iter()
        .map(|p| p.revenue)
        .max()
        .unwrap_or_default();

    out.push_str("營收 (億元)\n");
    for point in &trend.points {
        let width = if max_revenue > Decimal::ZERO && point.revenue > Decimal::ZERO {
            (point.revenue * Decimal::from(BAR_WIDTH) / max_revenue)
                .round()
                .to_usize()
                .unwrap_or_default()
        } else {
            0
        };
        let _ = writeln!(
            out,
            "{} │{} {:.2}",
            point.fiscal_year,
            "█".repeat(width),
            (point.revenue / HUNDRED_MILLION).round_dp(2)
        );
    }

    let eps: Vec<Decimal> = trend.points.iter().map(|p| p.earnings_per_share).collect();
    out.push_str("EPS (元)\n");
    let _ = writeln!(out, "{}", sparkline(&eps));
    let line = trend
        .points
        .iter()
        .map(|p| format!("{}: {:.2}", p.fiscal_year, p.earnings_per_share.round_dp(2)))
        .collect::<Vec<_>>()
        .join(" → ");
    let _ = writeln!(out, "{}", line);

    out
}

#[cfg(test)]
mod tests {
    use crate::financial::TrendPoint;

    use super::*;

    fn close(date: &str, price: Decimal) -> DailyPrice {
        DailyPrice {
            date: date.to_string(),
            closing_price: Some(price),
            ..Default::default()
        }
    }

    #[test]
    fn test_render_company() {
        let profile = CompanyProfile {
            stock_symbol: "2330".to_string(),
            name: "台灣積體電路製造股份有限公司".to_string(),
            chairman: "劉德音".to_string(),
            paid_in_capital: "259325245210".to_string(),
            ..Default::default()
        };

        let text = render_company("2330", Some(&profile), None);
        assert!(text.contains("台灣積體電路製造股份有限公司"));
        assert!(text.contains("董事長：劉德音"));
        assert!(text.contains("總經理：N/A"));
        assert!(text.contains("實收資本額：259,325,245,210 元"));
        assert!(text.contains("產業類別：N/A"));
        assert!(text.contains(&format!("公司簡介：{}", NO_SUMMARY)));
    }

    #[test]
    fn test_render_company_with_business_profile() {
        let business = BusinessProfile {
            stock_symbol: "2330".to_string(),
            sector: Some("Technology".to_string()),
            long_business_summary: Some("Taiwan Semiconductor Manufacturing Company Limited manufactures integrated circuits.".to_string()),
        };

        let without_industry = CompanyProfile {
            stock_symbol: "2330".to_string(),
            ..Default::default()
        };
        let text = render_company("2330", Some(&without_industry), Some(&business));
        assert!(text.contains("產業類別：Technology"));
        assert!(text.contains("公司簡介：Taiwan Semiconductor Manufacturing Company Limited manufactures integrated circuits."));
        assert!(!text.contains(NO_SUMMARY));

        let with_industry = CompanyProfile {
            industry: "24".to_string(),
            ..without_industry
        };
        let text = render_company("2330", Some(&with_industry), Some(&business));
        assert!(text.contains("產業類別：24"));
    }

    #[test]
    fn test_render_company_no_data() {
        let text = render_company("9999", None, None);
        assert!(text.contains("9999"));
        assert!(text.contains(NO_DATA));
        assert!(text.contains(NO_SUMMARY));
    }

    #[test]
    fn test_sparkline() {
        assert_eq!(sparkline(&[dec!(1), dec!(8), dec!(4.5)]), "▁█▅");
        assert_eq!(sparkline(&[dec!(5), dec!(5)]), "▅▅");
        assert_eq!(sparkline(&[]), "");
    }

    #[test]
    fn test_render_price_trend() {
        let prices = vec![
            close("2024-01-02", dec!(593)),
            DailyPrice {
                date: "2024-01-03".to_string(),
                ..Default::default()
            },
            close("2024-02-01", dec!(628)),
            close("2024-02-02", dec!(580)),
        ];

        let text = render_price_trend(Some(&prices));
        assert!(text.contains("2024-01-02 ~ 2024-02-02 (3 個交易日)"));
        assert!(text.contains("收盤：593 → 580"));
        assert!(text.contains("最高：628  最低：580"));

        assert!(render_price_trend(None).contains(NO_DATA));
        assert!(render_price_trend(Some(&[])).contains(NO_DATA));
    }

    #[test]
    fn test_render_ratios() {
        let ratios = RatioSet {
            gross_margin: dec!(54.4357),
            debt_ratio: dec!(34.5),
            ..Default::default()
        };

        let text = render_ratios(Some(&ratios));
        assert!(text.contains("毛利率：54.44%"));
        assert!(text.contains("負債比率：34.50%"));
        assert!(text.contains("現金流對淨利比：0.00%"));
        assert!(render_ratios(None).contains(NO_DATA));
    }

    #[test]
    fn test_render_trend() {
        let trend = TrendSeries {
            points: vec![
                TrendPoint {
                    fiscal_year: 2022,
                    revenue: dec!(2263891292000),
                    earnings_per_share: dec!(39.2),
                },
                TrendPoint {
                    fiscal_year: 2023,
                    revenue: dec!(2161735841000),
                    earnings_per_share: dec!(32.34),
                },
            ],
        };

        let text = render_trend(Some(&trend));
        assert!(text.contains(&format!("2022 │{} 22638.91", "█".repeat(30))));
        assert!(text.contains("2023 │"));
        assert!(text.contains("2022: 39.20 → 2023: 32.34"));

        assert!(render_trend(None).contains(NO_DATA));
        assert!(render_trend(Some(&TrendSeries::default())).contains(NO_DATA));
    }

    #[test]
    fn test_render_valuation() {
        let fundamental = MarketFundamental {
            security_code: "2330".to_string(),
            price_earning_ratio: Some(dec!(17.25)),
            dividend_yield: Some(dec!(1.86)),
            ..Default::default()
        };

        let text = render_valuation(&fundamental);
        assert!(text.contains("本益比：17.25"));
        assert!(text.contains("殖利率：1.86%"));
        assert!(text.contains("股價淨值比：N/A"));
    }

    #[test]
    fn test_dashboard_without_data() {
        let dashboard = Dashboard {
            stock_symbol: "9999",
            profile: None,
            business: None,
            prices: None,
            analysis: None,
            fundamental: None,
        };

        let text = dashboard.render();
        assert_eq!(text.matches(NO_DATA).count(), 4);
    }
}
