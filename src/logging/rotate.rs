use std::{
    fs::{self, File, OpenOptions},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

use anyhow::Result;
use chrono::{DateTime, Local, NaiveDate};

use crate::logging;

/// 日誌檔目錄
pub const LOG_DIR: &str = "log";
/// 預設保留天數：7 天
const DEFAULT_MAX_AGE_DAYS: u64 = 7;

/// 以日期切分的日誌檔，日期變更時改寫新檔並清除過期檔案
pub struct DailyFile {
    /// 日誌名稱，檔名為 "{日期}_{name}.log"
    name: String,
    dir: PathBuf,
    /// 目前檔案所屬日期
    date: Option<NaiveDate>,
    out: Option<BufWriter<File>>,
    max_age: Duration,
}

impl DailyFile {
    pub fn new(name: String) -> Self {
        Self::with_options(name, PathBuf::from(LOG_DIR), DEFAULT_MAX_AGE_DAYS)
    }

    pub fn with_options(name: String, dir: PathBuf, max_age_days: u64) -> Self {
        DailyFile {
            name,
            dir,
            date: None,
            out: None,
            max_age: Duration::from_secs(max_age_days * 24 * 60 * 60),
        }
    }

    /// 取得檔案寫入器，跨日時自動開新檔
    pub fn writer(&mut self, now: DateTime<Local>) -> Option<&mut BufWriter<File>> {
        let today = now.date_naive();
        if self.date != Some(today) {
            self.flush();
            self.out = None;

            match self.open(today) {
                Ok(file) => {
                    self.out = Some(BufWriter::with_capacity(4096, file));
                    self.date = Some(today);
                }
                Err(why) => {
                    logging::error_console(format!("Failed to open new log file: {:?}", why));
                    return None;
                }
            }

            remove_expired_files(&self.dir, self.max_age);
        }

        self.out.as_mut()
    }

    /// "log/2025-02-03_default.log"
    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("{}_{}.log", date.format("%Y-%m-%d"), self.name))
    }

    fn open(&self, date: NaiveDate) -> Result<File> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }

        Ok(OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path_for(date))?)
    }

    fn flush(&mut self) {
        if let Some(writer) = self.out.as_mut() {
            let _ = writer.flush();
        }
    }
}

impl Drop for DailyFile {
    fn drop(&mut self) {
        self.flush();
    }
}

/// 刪除目錄中修改時間超過 `max_age` 的 .log 檔，回傳刪除的數量
pub fn remove_expired_files(dir: &Path, max_age: Duration) -> usize {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(why) => {
            logging::error_console(format!(
                "Failed to read log directory {} because {:?}",
                dir.display(),
                why
            ));
            return 0;
        }
    };

    let Some(cut_off) = SystemTime::now().checked_sub(max_age) else {
        return 0;
    };

    let mut removed = 0;
    for path in entries.flatten().map(|entry| entry.path()) {
        if path.extension().and_then(|ext| ext.to_str()) != Some("log") {
            continue;
        }

        let expired = fs::metadata(&path)
            .and_then(|metadata| metadata.modified())
            .map(|modified| modified < cut_off)
            .unwrap_or(false);

        if !expired {
            continue;
        }

        match fs::remove_file(&path) {
            Ok(_) => removed += 1,
            Err(why) => logging::error_console(format!(
                "couldn't remove the file({}). because {:?}",
                path.display(),
                why
            )),
        }
    }

    removed
}
