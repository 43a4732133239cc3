use chrono::{DateTime, Local};
use directories::ProjectDirs;
use fern::Dispatch;
use log::{Level, LevelFilter};
use once_cell::sync::OnceCell;
use std::fs;
use std::path::PathBuf;
use std::sync::mpsc::{SendError, Sender};

use crate::app_settings::LogSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl From<log::Level> for LogLevel {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => LogLevel::Error,
            log::Level::Warn => LogLevel::Warn,
            log::Level::Info => LogLevel::Info,
            log::Level::Debug | log::Level::Trace => LogLevel::Debug,
        }
    }
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "调试",
            LogLevel::Info => "提示",
            LogLevel::Warn => "警告",
            LogLevel::Error => "错误",
        }
    }

    pub fn color(&self) -> egui::Color32 {
        match self {
            LogLevel::Debug => egui::Color32::GRAY,
            LogLevel::Info => egui::Color32::from_rgb(100, 180, 255),
            LogLevel::Warn => egui::Color32::from_rgb(255, 200, 0),
            LogLevel::Error => egui::Color32::from_rgb(255, 100, 100),
        }
    }
}

#[derive(Clone, Debug)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub timestamp: DateTime<Local>,
}

static UI_LOG_SENDER: OnceCell<Sender<LogEntry>> = OnceCell::new();

fn get_log_file_path() -> Result<PathBuf, String> {
    if let Some(proj_dirs) = ProjectDirs::from("com", "UfoSightingsMap", "UfoSightingsMap") {
        let log_dir = proj_dirs.data_local_dir();
        if !log_dir.exists() {
            fs::create_dir_all(log_dir)
                .map_err(|e| format!("无法创建日志目录 {log_dir:?}: {e}"))?;
        }
        Ok(log_dir.join("ufo_sightings_map.log"))
    } else {
        let current_dir_log_path = PathBuf::from("ufo_sightings_map.log");
        eprintln!("无法获取项目日志目录，将尝试在当前目录创建日志: {current_dir_log_path:?}");
        Ok(current_dir_log_path)
    }
}

fn format_line(out: fern::FormatCallback, message: &std::fmt::Arguments, record: &log::Record) {
    out.finish(format_args!(
        "[{}][{}] {}",
        Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
        record.level(),
        message
    ))
}

/// 初始化全局日志：控制台、可选的日志文件，以及发往界面日志面板的通道。
pub fn init_global_logger(ui_sender: Sender<LogEntry>, settings: &LogSettings) {
    if UI_LOG_SENDER.set(ui_sender).is_err() {
        eprintln!("UI Log Sender 已经被初始化过了!");
    }

    let console_dispatch = Dispatch::new()
        .format(format_line)
        .level(settings.console_log_level)
        .chain(std::io::stdout());

    let ui_dispatch = Dispatch::new()
        .filter(|metadata| metadata.level() <= Level::Info)
        .chain(fern::Output::call(|record| {
            if let Some(sender) = UI_LOG_SENDER.get() {
                let entry = LogEntry {
                    level: LogLevel::from(record.level()),
                    message: format!("{}", record.args()),
                    timestamp: Local::now(),
                };
                if let Err(SendError(failed_entry)) = sender.send(entry) {
                    eprintln!("[{}] {}", failed_entry.level.as_str(), failed_entry.message);
                }
            }
        }));

    let mut final_dispatch = Dispatch::new()
        .level(LevelFilter::Debug)
        .chain(console_dispatch)
        .chain(ui_dispatch);

    if settings.enable_file_log {
        match get_log_file_path().and_then(|path| {
            fern::log_file(&path)
                .map(|file| (path.clone(), file))
                .map_err(|e| format!("无法打开日志文件 {path:?}: {e}"))
        }) {
            Ok((path, log_file)) => {
                println!("[Logger Init] 文件日志已启用。日志文件将被写入: {path:?}");
                final_dispatch = final_dispatch.chain(
                    Dispatch::new()
                        .format(format_line)
                        .level(settings.file_log_level)
                        .chain(log_file),
                );
            }
            Err(e) => {
                eprintln!("{e}。文件日志将被禁用。");
            }
        }
    }

    if let Err(e) = final_dispatch.apply() {
        eprintln!("日志记录初始化失败: {e}");
    } else {
        log::info!("日志记录器已初始化。");
    }
}
