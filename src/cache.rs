//! 具 TTL（存活時間）的快取。
//!
//! 到期與否一律依注入的 [`Clock`] 判斷，測試時可以用手動推進的時鐘，
//! 不必真的等待。讀寫鎖取得失敗時視為未命中，不會 panic。

use std::{
    collections::HashMap,
    hash::Hash,
    sync::{Arc, RwLock},
    time::Duration,
};

use chrono::{DateTime, Local};

use crate::logging;

/// 時間來源
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// 系統時鐘
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

impl<T: Clock + ?Sized> Clock for Arc<T> {
    fn now(&self) -> DateTime<Local> {
        self.as_ref().now()
    }
}

struct Entry<V> {
    value: V,
    expires_at: DateTime<Local>,
}

pub struct TtlCache<K, V, C: Clock = SystemClock> {
    entries: RwLock<HashMap<K, Entry<V>>>,
    clock: C,
}

impl<K, V> TtlCache<K, V, SystemClock>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl<K, V> Default for TtlCache<K, V, SystemClock>
where
    K: Eq + Hash,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, C> TtlCache<K, V, C>
where
    K: Eq + Hash,
    V: Clone,
    C: Clock,
{
    pub fn with_clock(clock: C) -> Self {
        TtlCache {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// 取得尚未過期的值
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        match self.entries.read() {
            Ok(entries) => entries
                .get(key)
                .filter(|entry| entry.expires_at > now)
                .map(|entry| entry.value.clone()),
            Err(why) => {
                logging::error_file_async(format!("Failed to read cache because {:?}", why));
                None
            }
        }
    }

    /// 寫入並回傳舊值 (若舊值尚未過期)
    pub fn insert(&self, key: K, value: V, ttl: Duration) -> Option<V> {
        let now = self.clock.now();
        let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(36500));
        let expires_at = now.checked_add_signed(ttl).unwrap_or(now);

        match self.entries.write() {
            Ok(mut entries) => {
                entries.retain(|_, entry| entry.expires_at > now);
                entries
                    .insert(key, Entry { value, expires_at })
                    .filter(|old| old.expires_at > now)
                    .map(|old| old.value)
            }
            Err(why) => {
                logging::error_file_async(format!("Failed to write cache because {:?}", why));
                None
            }
        }
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }

    /// 尚未過期的筆數
    pub fn len(&self) -> usize {
        let now = self.clock.now();
        self.entries
            .read()
            .map(|entries| entries.values().filter(|e| e.expires_at > now).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
