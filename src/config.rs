use std::{env, path::PathBuf, str::FromStr};

use anyhow::Result;
use config::{Config as config_config, File as config_file};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::logging;

const CONFIG_PATH: &str = "app.json";

#[derive(Serialize, Deserialize, Default, Debug, Clone)]
pub struct App {
    #[serde(default)]
    pub http: Http,
    #[serde(default)]
    pub cache: Cache,
    #[serde(default)]
    pub export: Export,
}

const HTTP_ACCEPT_INVALID_CERTS: &str = "HTTP_ACCEPT_INVALID_CERTS";
const HTTP_CA_CERT_FILE: &str = "HTTP_CA_CERT_FILE";
const HTTP_REQUEST_DELAY_MS: &str = "HTTP_REQUEST_DELAY_MS";
const HTTP_TIMEOUT_SECS: &str = "HTTP_TIMEOUT_SECS";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Http {
    /// 關閉憑證驗證，只能明確設定開啟
    #[serde(default)]
    pub accept_invalid_certs: bool,
    /// 額外信任的根憑證 (PEM)
    #[serde(default)]
    pub ca_cert_file: String,
    /// 每次請求後的等待時間，避免被證交所封鎖
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for Http {
    fn default() -> Self {
        Http {
            accept_invalid_certs: false,
            ca_cert_file: String::new(),
            request_delay_ms: default_request_delay_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_request_delay_ms() -> u64 {
    3000
}

fn default_timeout_secs() -> u64 {
    15
}

const CACHE_PRICE_TTL_SECS: &str = "CACHE_PRICE_TTL_SECS";
const CACHE_PROFILE_TTL_SECS: &str = "CACHE_PROFILE_TTL_SECS";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Cache {
    /// 股價快取 1 小時
    #[serde(default = "default_price_ttl_secs")]
    pub price_ttl_secs: u64,
    /// 公司基本資料快取 1 天
    #[serde(default = "default_profile_ttl_secs")]
    pub profile_ttl_secs: u64,
}

impl Default for Cache {
    fn default() -> Self {
        Cache {
            price_ttl_secs: default_price_ttl_secs(),
            profile_ttl_secs: default_profile_ttl_secs(),
        }
    }
}

fn default_price_ttl_secs() -> u64 {
    60 * 60
}

fn default_profile_ttl_secs() -> u64 {
    24 * 60 * 60
}

const EXPORT_DIR: &str = "EXPORT_DIR";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Export {
    #[serde(default = "default_export_dir")]
    pub dir: String,
}

impl Default for Export {
    fn default() -> Self {
        Export {
            dir: default_export_dir(),
        }
    }
}

fn default_export_dir() -> String {
    "stock_data".to_string()
}

pub static SETTINGS: Lazy<App> = Lazy::new(App::new);

impl App {
    pub fn new() -> Self {
        match Self::get() {
            Ok(app) => app,
            Err(why) => {
                logging::error_file_async(format!(
                    "I can't read the config context because {:?}",
                    why
                ));
                App::default().override_with_env()
            }
        }
    }

    fn get() -> Result<Self> {
        let config_path = config_path();
        if !config_path.exists() {
            return Ok(App::default().override_with_env());
        }

        let config: App = config_config::builder()
            .add_source(config_file::from(config_path))
            .build()?
            .try_deserialize()?;

        Ok(config.override_with_env())
    }

    /// 將來至於 env 的設定值覆蓋掉 json 上的設定值
    fn override_with_env(mut self) -> Self {
        if let Ok(accept) = env::var(HTTP_ACCEPT_INVALID_CERTS) {
            self.http.accept_invalid_certs = parse_bool(&accept);
        }

        if let Ok(cert_file) = env::var(HTTP_CA_CERT_FILE) {
            self.http.ca_cert_file = cert_file;
        }

        if let Ok(delay) = env::var(HTTP_REQUEST_DELAY_MS) {
            self.http.request_delay_ms =
                u64::from_str(&delay).unwrap_or(self.http.request_delay_ms);
        }

        if let Ok(timeout) = env::var(HTTP_TIMEOUT_SECS) {
            self.http.timeout_secs = u64::from_str(&timeout).unwrap_or(self.http.timeout_secs);
        }

        if let Ok(ttl) = env::var(CACHE_PRICE_TTL_SECS) {
            self.cache.price_ttl_secs = u64::from_str(&ttl).unwrap_or(self.cache.price_ttl_secs);
        }

        if let Ok(ttl) = env::var(CACHE_PROFILE_TTL_SECS) {
            self.cache.profile_ttl_secs =
                u64::from_str(&ttl).unwrap_or(self.cache.profile_ttl_secs);
        }

        if let Ok(dir) = env::var(EXPORT_DIR) {
            self.export.dir = dir;
        }

        self
    }
}

fn parse_bool(text: &str) -> bool {
    matches!(
        text.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// 回傳設定檔的路徑
fn config_path() -> PathBuf {
    PathBuf::from(CONFIG_PATH)
}
