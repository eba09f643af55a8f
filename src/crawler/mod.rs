use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{
    cache::{Clock, SystemClock, TtlCache},
    config::SETTINGS,
    crawler::{
        twse::{company::CompanyProfile, fundamentals::MarketFundamental, stock_day::DailyPrice},
        yahoo::profile::BusinessProfile,
    },
    financial::FinancialPeriod,
    logging,
    util::datetime,
};

/// 台灣證券交易所
pub mod twse;
/// 雅虎財經
pub mod yahoo;

/// 行情與財報資料來源。
///
/// 抓取失敗一律回傳 `None` (並記錄錯誤)，不重試也不限流。
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// 個股在 `year_month` 所屬月份的每日成交資訊
    async fn fetch_daily_prices(&self, stock_symbol: &str, year_month: NaiveDate)
        -> Option<Vec<DailyPrice>>;

    /// 年度財務報表，由新到舊
    async fn fetch_period_statements(&self, stock_symbol: &str) -> Option<Vec<FinancialPeriod>>;

    /// 全部上市公司的基本資料
    async fn fetch_company_profiles(&self) -> Option<Vec<CompanyProfile>>;

    /// 指定日期全市場的本益比、殖利率及股價淨值比
    async fn fetch_market_fundamentals(&self, date: NaiveDate) -> Option<Vec<MarketFundamental>>;

    /// 公司簡介與產業類別，兩者都沒有時回傳 `None`
    async fn fetch_business_profile(&self, stock_symbol: &str) -> Option<BusinessProfile>;
}

/// 證交所 + Yahoo 的公開資料
#[derive(Debug, Default, Clone, Copy)]
pub struct PublicSource;

#[async_trait]
impl MarketDataSource for PublicSource {
    async fn fetch_daily_prices(
        &self,
        stock_symbol: &str,
        year_month: NaiveDate,
    ) -> Option<Vec<DailyPrice>> {
        match twse::stock_day::visit(stock_symbol, year_month).await {
            Ok(prices) if !prices.is_empty() => Some(prices),
            Ok(_) => None,
            Err(why) => {
                logging::error_file_async(format!("Failed to fetch_daily_prices because {:?}", why));
                None
            }
        }
    }

    async fn fetch_period_statements(&self, stock_symbol: &str) -> Option<Vec<FinancialPeriod>> {
        match yahoo::financials::visit(stock_symbol).await {
            Ok(periods) if !periods.is_empty() => Some(periods),
            Ok(_) => None,
            Err(why) => {
                logging::error_file_async(format!(
                    "Failed to fetch_period_statements because {:?}",
                    why
                ));
                None
            }
        }
    }

    async fn fetch_company_profiles(&self) -> Option<Vec<CompanyProfile>> {
        match twse::company::visit().await {
            Ok(profiles) if !profiles.is_empty() => Some(profiles),
            Ok(_) => None,
            Err(why) => {
                logging::error_file_async(format!(
                    "Failed to fetch_company_profiles because {:?}",
                    why
                ));
                None
            }
        }
    }

    async fn fetch_market_fundamentals(&self, date: NaiveDate) -> Option<Vec<MarketFundamental>> {
        match twse::fundamentals::visit(date).await {
            Ok(list) if !list.is_empty() => Some(list),
            Ok(_) => None,
            Err(why) => {
                logging::error_file_async(format!(
                    "Failed to fetch_market_fundamentals because {:?}",
                    why
                ));
                None
            }
        }
    }

    async fn fetch_business_profile(&self, stock_symbol: &str) -> Option<BusinessProfile> {
        match yahoo::profile::visit(stock_symbol).await {
            Ok(profile) if profile.sector.is_some() || profile.long_business_summary.is_some() => {
                Some(profile)
            }
            Ok(_) => None,
            Err(why) => {
                logging::error_file_async(format!(
                    "Failed to fetch_business_profile because {:?}",
                    why
                ));
                None
            }
        }
    }
}

/// 為任一資料來源加上時效快取：股價、公司基本資料、公司簡介。
///
/// 抓不到資料 (`None`) 的結果不會進快取。
pub struct CachedSource<S, C: Clock = SystemClock> {
    inner: S,
    prices: TtlCache<(String, NaiveDate), Vec<DailyPrice>, Arc<C>>,
    profiles: TtlCache<(), Vec<CompanyProfile>, Arc<C>>,
    business_profiles: TtlCache<String, BusinessProfile, Arc<C>>,
    price_ttl: Duration,
    profile_ttl: Duration,
}

impl<S: MarketDataSource> CachedSource<S, SystemClock> {
    /// 使用系統時鐘與設定檔的 TTL
    pub fn new(inner: S) -> Self {
        Self::with_clock(
            inner,
            Arc::new(SystemClock),
            Duration::from_secs(SETTINGS.cache.price_ttl_secs),
            Duration::from_secs(SETTINGS.cache.profile_ttl_secs),
        )
    }
}

impl<S: MarketDataSource, C: Clock> CachedSource<S, C> {
    pub fn with_clock(inner: S, clock: Arc<C>, price_ttl: Duration, profile_ttl: Duration) -> Self {
        CachedSource {
            inner,
            prices: TtlCache::with_clock(clock.clone()),
            profiles: TtlCache::with_clock(clock.clone()),
            business_profiles: TtlCache::with_clock(clock),
            price_ttl,
            profile_ttl,
        }
    }

    /// 清空全部快取，下次查詢會重新抓取
    pub fn clear(&self) {
        self.prices.clear();
        self.profiles.clear();
        self.business_profiles.clear();
    }
}

#[async_trait]
impl<S: MarketDataSource, C: Clock> MarketDataSource for CachedSource<S, C> {
    async fn fetch_daily_prices(
        &self,
        stock_symbol: &str,
        year_month: NaiveDate,
    ) -> Option<Vec<DailyPrice>> {
        let key = (stock_symbol.to_string(), year_month);
        if let Some(prices) = self.prices.get(&key) {
            return Some(prices);
        }

        let prices = self.inner.fetch_daily_prices(stock_symbol, year_month).await?;
        self.prices.insert(key, prices.clone(), self.price_ttl);
        Some(prices)
    }

    async fn fetch_period_statements(&self, stock_symbol: &str) -> Option<Vec<FinancialPeriod>> {
        self.inner.fetch_period_statements(stock_symbol).await
    }

    async fn fetch_company_profiles(&self) -> Option<Vec<CompanyProfile>> {
        if let Some(profiles) = self.profiles.get(&()) {
            return Some(profiles);
        }

        let profiles = self.inner.fetch_company_profiles().await?;
        self.profiles.insert((), profiles.clone(), self.profile_ttl);
        Some(profiles)
    }

    async fn fetch_market_fundamentals(&self, date: NaiveDate) -> Option<Vec<MarketFundamental>> {
        self.inner.fetch_market_fundamentals(date).await
    }

    async fn fetch_business_profile(&self, stock_symbol: &str) -> Option<BusinessProfile> {
        let key = stock_symbol.to_string();
        if let Some(profile) = self.business_profiles.get(&key) {
            return Some(profile);
        }

        let profile = self.inner.fetch_business_profile(stock_symbol).await?;
        self.business_profiles.insert(key, profile.clone(), self.profile_ttl);
        Some(profile)
    }
}

/// 依序抓取截至 `today` 最近 `months` 個月的股價並依日期排序，全部月份都抓不到時回傳 `None`
pub async fn fetch_price_history<S: MarketDataSource + ?Sized>(
    source: &S,
    stock_symbol: &str,
    months: u32,
    today: NaiveDate,
) -> Option<Vec<DailyPrice>> {
    let month_starts = datetime::recent_month_starts(today, months);
    let mut all = Vec::with_capacity(month_starts.len() * 23);

    for month in month_starts {
        if let Some(prices) = source.fetch_daily_prices(stock_symbol, month).await {
            all.extend(prices);
        }
    }

    if all.is_empty() {
        return None;
    }

    all.sort_by(|a, b| a.date.cmp(&b.date));
    Some(all)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use rust_decimal_macros::dec;

    use crate::cache::tests::ManualClock;

    use super::*;

    /// 回傳固定資料並計算呼叫次數的資料來源
    #[derive(Default)]
    pub(crate) struct StubSource {
        pub price_calls: AtomicUsize,
        pub profile_calls: AtomicUsize,
        pub business_calls: AtomicUsize,
        pub statements: Vec<FinancialPeriod>,
    }

    fn price(date: &str, close: rust_decimal::Decimal) -> DailyPrice {
        DailyPrice {
            date: date.to_string(),
            closing_price: Some(close),
            ..Default::default()
        }
    }

    #[async_trait]
    impl MarketDataSource for StubSource {
        async fn fetch_daily_prices(
            &self,
            _stock_symbol: &str,
            year_month: NaiveDate,
        ) -> Option<Vec<DailyPrice>> {
            self.price_calls.fetch_add(1, Ordering::SeqCst);
            match year_month.format("%Y%m").to_string().as_str() {
                "202401" => Some(vec![
                    price("2024-01-03", dec!(593)),
                    price("2024-01-02", dec!(590)),
                ]),
                "202402" => Some(vec![price("2024-02-01", dec!(628))]),
                _ => None,
            }
        }

        async fn fetch_period_statements(&self, _stock_symbol: &str) -> Option<Vec<FinancialPeriod>> {
            if self.statements.is_empty() {
                None
            } else {
                Some(self.statements.clone())
            }
        }

        async fn fetch_company_profiles(&self) -> Option<Vec<CompanyProfile>> {
            self.profile_calls.fetch_add(1, Ordering::SeqCst);
            Some(vec![CompanyProfile {
                stock_symbol: "2330".to_string(),
                short_name: "台積電".to_string(),
                ..Default::default()
            }])
        }

        async fn fetch_market_fundamentals(&self, _date: NaiveDate) -> Option<Vec<MarketFundamental>> {
            None
        }

        async fn fetch_business_profile(&self, stock_symbol: &str) -> Option<BusinessProfile> {
            self.business_calls.fetch_add(1, Ordering::SeqCst);
            (stock_symbol == "2330").then(|| BusinessProfile {
                stock_symbol: stock_symbol.to_string(),
                sector: Some("Technology".to_string()),
                long_business_summary: None,
            })
        }
    }

    fn month(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_price_history_sorted() {
        let source = StubSource::default();
        let today = NaiveDate::from_ymd_opt(2024, 2, 5).unwrap();

        let prices = fetch_price_history(&source, "2330", 3, today).await.unwrap();
        let dates: Vec<&str> = prices.iter().map(|p| p.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-01-02", "2024-01-03", "2024-02-01"]);
        assert_eq!(source.price_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_fetch_price_history_unavailable() {
        let source = StubSource::default();
        let today = NaiveDate::from_ymd_opt(2020, 1, 15).unwrap();
        assert!(fetch_price_history(&source, "2330", 1, today).await.is_none());
        assert!(fetch_price_history(&source, "2330", 0, today).await.is_none());
    }

    #[tokio::test]
    async fn test_cached_source_prices() {
        let clock = Arc::new(ManualClock::new());
        let cached = CachedSource::with_clock(
            StubSource::default(),
            clock.clone(),
            Duration::from_secs(3600),
            Duration::from_secs(86400),
        );

        for _ in 0..3 {
            assert!(cached.fetch_daily_prices("2330", month(2024, 1)).await.is_some());
        }
        assert_eq!(cached.inner.price_calls.load(Ordering::SeqCst), 1);

        clock.advance(Duration::from_secs(3600));
        assert!(cached.fetch_daily_prices("2330", month(2024, 1)).await.is_some());
        assert_eq!(cached.inner.price_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cached_source_skips_unavailable() {
        let clock = Arc::new(ManualClock::new());
        let cached = CachedSource::with_clock(
            StubSource::default(),
            clock,
            Duration::from_secs(3600),
            Duration::from_secs(86400),
        );

        assert!(cached.fetch_daily_prices("2330", month(2020, 1)).await.is_none());
        assert!(cached.fetch_daily_prices("2330", month(2020, 1)).await.is_none());
        assert_eq!(cached.inner.price_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cached_source_profiles() {
        let clock = Arc::new(ManualClock::new());
        let cached = CachedSource::with_clock(
            StubSource::default(),
            clock.clone(),
            Duration::from_secs(3600),
            Duration::from_secs(86400),
        );

        cached.fetch_company_profiles().await.unwrap();
        clock.advance(Duration::from_secs(86399));
        let profiles = cached.fetch_company_profiles().await.unwrap();
        assert_eq!(profiles[0].short_name, "台積電");
        assert_eq!(cached.inner.profile_calls.load(Ordering::SeqCst), 1);

        clock.advance(Duration::from_secs(1));
        cached.fetch_company_profiles().await.unwrap();
        assert_eq!(cached.inner.profile_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cached_source_business_profile() {
        let clock = Arc::new(ManualClock::new());
        let cached = CachedSource::with_clock(
            StubSource::default(),
            clock,
            Duration::from_secs(3600),
            Duration::from_secs(86400),
        );

        for _ in 0..2 {
            let profile = cached.fetch_business_profile("2330").await.unwrap();
            assert_eq!(profile.sector.as_deref(), Some("Technology"));
        }
        assert_eq!(cached.inner.business_calls.load(Ordering::SeqCst), 1);

        assert!(cached.fetch_business_profile("9999").await.is_none());
        assert!(cached.fetch_business_profile("9999").await.is_none());
        assert_eq!(cached.inner.business_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_cached_source_clear() {
        let clock = Arc::new(ManualClock::new());
        let cached = CachedSource::with_clock(
            StubSource::default(),
            clock,
            Duration::from_secs(3600),
            Duration::from_secs(86400),
        );

        cached.fetch_daily_prices("2330", month(2024, 1)).await.unwrap();
        cached.fetch_company_profiles().await.unwrap();
        cached.clear();
        cached.fetch_daily_prices("2330", month(2024, 1)).await.unwrap();
        cached.fetch_company_profiles().await.unwrap();

        assert_eq!(cached.inner.price_calls.load(Ordering::SeqCst), 2);
        assert_eq!(cached.inner.profile_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    #[ignore]
    async fn test_public_source() {
        dotenv::dotenv().ok();
        logging::debug_file_async("開始 test_public_source".to_string());

        let source = PublicSource;
        let statements = source.fetch_period_statements("2330").await;
        logging::debug_file_async(format!("statements:{:#?}", statements));

        logging::debug_file_async("結束 test_public_source".to_string());
    }
}
