use std::{fmt::Write as _, io::Write, thread};

use chrono::{format::DelayedFormat, DateTime, Local};
use once_cell::sync::Lazy;
use strum::Display;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::logging::rotate::DailyFile;

pub mod rotate;

/// 累積到這個大小就寫入檔案
const FLUSH_THRESHOLD: usize = 4096;

static LOGGER: Lazy<Logger> = Lazy::new(|| Logger::new("default"));

/// 日誌等級
#[derive(Debug, Copy, Clone, PartialEq, Eq, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

pub struct LogMessage {
    pub level: Level,
    pub msg: String,
    pub created_at: DateTime<Local>,
}

impl LogMessage {
    pub fn new(level: Level, msg: String) -> Self {
        LogMessage {
            level,
            msg,
            created_at: Local::now(),
        }
    }
}

pub struct Logger {
    writer: UnboundedSender<LogMessage>,
}

impl Logger {
    pub fn new(log_name: &str) -> Self {
        let (tx, rx) = unbounded_channel::<LogMessage>();
        let log_name = log_name.to_string();

        // 寫入檔案的操作使用另一個線程處理
        thread::spawn(move || write_loop(DailyFile::new(log_name), rx));

        Logger { writer: tx }
    }

    pub fn debug(&self, log: String) {
        self.send(Level::Debug, log);
    }

    pub fn info(&self, log: String) {
        self.send(Level::Info, log);
    }

    pub fn warn(&self, log: String) {
        self.send(Level::Warn, log);
    }

    pub fn error(&self, log: String) {
        self.send(Level::Error, log);
    }

    fn send(&self, level: Level, msg: String) {
        if let Err(why) = self.writer.send(LogMessage::new(level, msg)) {
            error_console(why.to_string());
        }
    }
}

fn write_loop(mut file: DailyFile, mut rx: UnboundedReceiver<LogMessage>) {
    let mut batch = String::with_capacity(FLUSH_THRESHOLD);

    while let Some(received) = rx.blocking_recv() {
        if writeln!(
            &mut batch,
            "{} {} {}",
            received.created_at.format("%F %X%.6f"),
            received.level,
            received.msg
        )
        .is_err()
        {
            continue;
        }

        if !rx.is_empty() && batch.len() < FLUSH_THRESHOLD {
            continue;
        }

        match file.writer(received.created_at) {
            Some(writer) => {
                if let Err(why) = writer.write_all(batch.as_bytes()) {
                    error_console(format!(
                        "Failed to write to log file. because:{:?}\r\nmsg:{}",
                        why, batch
                    ));
                }

                if let Err(why) = writer.flush() {
                    error_console(format!("Failed to flush log file. because:{:?}", why));
                }
            }
            None => info_console(batch.clone()),
        }

        batch.clear();
    }
}

pub fn debug_file_async(log: String) {
    LOGGER.debug(log);
}

pub fn info_file_async(log: String) {
    LOGGER.info(log);
}

pub fn warn_file_async(log: String) {
    LOGGER.warn(log);
}

pub fn error_file_async(log: String) {
    LOGGER.error(log);
}

pub fn info_console(log: String) {
    println!(
        "{} Info {}",
        Local::now().format("%Y-%m-%d %H:%M:%S.%3f"),
        log
    );
}

pub fn error_console(log: String) {
    println!(
        "{} Error {}",
        DelayedFormat::to_string(&Local::now().format("%Y-%m-%d %H:%M:%S.%3f")),
        log
    );
}
