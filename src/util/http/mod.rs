use std::{
    fs,
    time::{Duration, Instant},
};

use anyhow::{anyhow, Context, Result};
use once_cell::sync::{Lazy, OnceCell};
use reqwest::{header, Certificate, Client, Method, Response};
use serde::de::DeserializeOwned;
use tokio::sync::Semaphore;

use crate::{
    config::{self, SETTINGS},
    logging::{self, Logger},
};

pub mod user_agent;

/// 同一時間只送出一個請求，搭配請求後的等待時間控制抓取頻率
static SEMAPHORE: Lazy<Semaphore> = Lazy::new(|| Semaphore::new(1));

/// A singleton instance of the reqwest client.
static CLIENT: OnceCell<Client> = OnceCell::new();

static LOGGER: Lazy<Logger> = Lazy::new(|| Logger::new("http"));

/// Returns the reqwest client singleton instance or creates one if it doesn't exist.
fn get_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| build_client(&SETTINGS.http))
}

/// 依設定建立 reqwest client。
///
/// 憑證驗證預設開啟；只有在設定檔或環境變數明確指定
/// `accept_invalid_certs` 時才會關閉，並且每次建立都會大聲警告。
pub fn build_client(settings: &config::Http) -> Result<Client> {
    let _ = rustls::crypto::ring::default_provider().install_default();

    let mut builder = Client::builder()
        // ===== 壓縮 =====
        .brotli(true)
        .gzip(true)
        .zstd(true)
        // ===== 超時設置 =====
        .connect_timeout(Duration::from_secs(8))
        .timeout(Duration::from_secs(settings.timeout_secs))
        // ===== 連接池 =====
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Duration::from_secs(90))
        // ===== Cookie 和重定向 =====
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::limited(5))
        // ===== Headers =====
        .referer(true)
        .user_agent(user_agent::gen_random_ua());

    if !settings.ca_cert_file.is_empty() {
        let pem = fs::read(&settings.ca_cert_file).with_context(|| {
            format!("Failed to read the CA certificate {}", settings.ca_cert_file)
        })?;
        let cert = Certificate::from_pem(&pem)
            .map_err(|why| anyhow!("Failed to parse the CA certificate: {:?}", why))?;
        builder = builder.add_root_certificate(cert);
    }

    if settings.accept_invalid_certs {
        let warning = "TLS certificate verification is DISABLED (http.accept_invalid_certs = true). \
                       Responses can be forged by anyone on the network path."
            .to_string();
        logging::error_console(warning.clone());
        logging::warn_file_async(warning);
        builder = builder.danger_accept_invalid_certs(true);
    }

    builder
        .build()
        .map_err(|e| anyhow!("Failed to create reqwest client: {:?}", e))
}

/// Performs an HTTP GET request and deserializes the JSON response into the specified type.
pub async fn get_json<RES: DeserializeOwned>(url: &str) -> Result<RES> {
    let text = get(url, None).await?;
    serde_json::from_str(&text)
        .map_err(|e| anyhow!("Error parsing response JSON from {}: {:?}", url, e))
}

/// Performs an HTTP GET request and returns the response as text.
pub async fn get(url: &str, headers: Option<header::HeaderMap>) -> Result<String> {
    send(Method::GET, url, headers)
        .await?
        .text()
        .await
        .map_err(|e| anyhow!("Error parsing response text: {:?}", e))
}

/// 送出請求，不重試。
///
/// 每次請求之後固定等待 `http.request_delay_ms`，避免被目標網站封禁。
async fn send(method: Method, url: &str, headers: Option<header::HeaderMap>) -> Result<Response> {
    let visit_log = format!("{method}:{url}");
    let client = get_client()?;
    let mut rb = client.request(method, url);

    if let Some(h) = headers {
        rb = rb.headers(h);
    }

    let permit = SEMAPHORE
        .acquire()
        .await
        .map_err(|why| anyhow!("Failed to acquire request permit: {:?}", why))?;
    let start = Instant::now();
    let res = rb.send().await;
    let elapsed = start.elapsed().as_millis();

    tokio::time::sleep(Duration::from_millis(SETTINGS.http.request_delay_ms)).await;
    drop(permit);

    match res {
        Ok(response) => {
            let status = response.status();
            LOGGER.info(format!("{} {} {} ms", visit_log, status, elapsed));
            response
                .error_for_status()
                .map_err(|why| anyhow!("{} responded {:?}", visit_log, why))
        }
        Err(why) => {
            LOGGER.error(format!("{} failed because {:?}. {} ms", visit_log, why, elapsed));
            Err(anyhow!("Failed to send request to {}: {:?}", url, why))
        }
    }
}
