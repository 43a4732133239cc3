use directories::ProjectDirs;
use ini::Ini;
use log::LevelFilter;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{AppError, AppResult};

const DATA_SECTION: &str = "Data";
const LOGGING_SECTION: &str = "Logging";
const UI_SECTION: &str = "Ui";

pub const DEFAULT_CSV_PATH: &str = "scrubbed.csv";
pub const DEFAULT_WRAP_WIDTH: usize = 80;
pub const DEFAULT_MISSING_PLACEHOLDER: &str = "Unknown";

#[derive(Debug, Clone, PartialEq)]
pub struct LogSettings {
    pub enable_file_log: bool,
    pub file_log_level: LevelFilter,
    pub console_log_level: LevelFilter,
}

impl Default for LogSettings {
    fn default() -> Self {
        LogSettings {
            enable_file_log: false,
            file_log_level: LevelFilter::Info,
            console_log_level: LevelFilter::Info,
        }
    }
}

/// 数据文件相关设置。
#[derive(Debug, Clone, PartialEq)]
pub struct DataSettings {
    pub csv_path: PathBuf,
    /// 文本换行宽度 (字符数)，至少为 1
    pub wrap_width: usize,
    /// 文本列为空时填入的占位文本
    pub missing_placeholder: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        DataSettings {
            csv_path: PathBuf::from(DEFAULT_CSV_PATH),
            wrap_width: DEFAULT_WRAP_WIDTH,
            missing_placeholder: DEFAULT_MISSING_PLACEHOLDER.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UiSettings {
    /// 用户指定的界面字体族，`None` 时按内置列表查找系统中的中文字体
    pub font_family: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppSettings {
    pub data: DataSettings,
    pub log_settings: LogSettings,
    pub ui: UiSettings,
}

impl AppSettings {
    fn config_path() -> Option<PathBuf> {
        if let Some(proj_dirs) = ProjectDirs::from("com", "UfoSightingsMap", "UfoSightingsMap") {
            let config_dir = proj_dirs.data_local_dir();
            if !config_dir.exists() {
                if let Err(e) = fs::create_dir_all(config_dir) {
                    log::error!("无法创建配置目录 {:?}: {}", config_dir, e);
                    return None;
                }
            }
            Some(config_dir.join("ufo_sightings_map.ini"))
        } else {
            log::error!("无法获取项目配置目录路径。");
            None
        }
    }

    pub fn load() -> Self {
        if let Some(path) = Self::config_path() {
            if path.exists() {
                match Ini::load_from_file(&path) {
                    Ok(conf) => {
                        let settings = Self::from_ini(&conf);
                        log::info!(
                            "从 {:?} 加载配置成功。数据文件: {:?}",
                            path,
                            settings.data.csv_path
                        );
                        return settings;
                    }
                    Err(e) => {
                        log::error!("加载配置文件 {:?} 失败: {}。将使用默认配置。", path, e);
                    }
                }
            } else {
                log::info!("配置文件 {:?} 未找到。将创建并使用默认配置。", path);
                let default_settings = AppSettings::default();
                if default_settings.save().is_err() {
                    log::error!("无法保存初始默认配置文件到 {:?}。", path);
                }
                return default_settings;
            }
        }
        log::warn!("无法确定配置文件路径。将使用运行时默认配置。");
        AppSettings::default()
    }

    /// 从 INI 内容读取设置，缺失或无法解析的键使用默认值。
    pub fn from_ini(conf: &Ini) -> Self {
        let defaults = AppSettings::default();

        let data_section = conf.section(Some(DATA_SECTION));
        let data = DataSettings {
            csv_path: data_section
                .and_then(|s| s.get("CsvPath"))
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.data.csv_path),
            wrap_width: data_section
                .and_then(|s| s.get("WrapWidth"))
                .and_then(|s| s.trim().parse::<usize>().ok())
                .unwrap_or(defaults.data.wrap_width)
                .max(1),
            missing_placeholder: data_section
                .and_then(|s| s.get("MissingPlaceholder"))
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string)
                .unwrap_or(defaults.data.missing_placeholder),
        };

        let log_section = conf.section(Some(LOGGING_SECTION));
        let log_settings = LogSettings {
            enable_file_log: log_section
                .and_then(|s| s.get("EnableFileLog"))
                .and_then(|s| s.parse::<bool>().ok())
                .unwrap_or(defaults.log_settings.enable_file_log),
            file_log_level: log_section
                .and_then(|s| s.get("FileLogLevel"))
                .and_then(|s| LevelFilter::from_str(s).ok())
                .unwrap_or(defaults.log_settings.file_log_level),
            console_log_level: log_section
                .and_then(|s| s.get("ConsoleLogLevel"))
                .and_then(|s| LevelFilter::from_str(s).ok())
                .unwrap_or(defaults.log_settings.console_log_level),
        };

        let ui = UiSettings {
            font_family: conf
                .section(Some(UI_SECTION))
                .and_then(|s| s.get("FontFamily"))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        };

        AppSettings {
            data,
            log_settings,
            ui,
        }
    }

    pub fn to_ini(&self) -> Ini {
        let mut conf = Ini::new();
        conf.with_section(Some(DATA_SECTION))
            .set("CsvPath", self.data.csv_path.to_string_lossy().to_string())
            .set("WrapWidth", self.data.wrap_width.to_string())
            .set("MissingPlaceholder", self.data.missing_placeholder.clone());
        conf.with_section(Some(LOGGING_SECTION))
            .set(
                "EnableFileLog",
                self.log_settings.enable_file_log.to_string(),
            )
            .set("FileLogLevel", self.log_settings.file_log_level.to_string())
            .set(
                "ConsoleLogLevel",
                self.log_settings.console_log_level.to_string(),
            );
        if let Some(font_family) = &self.ui.font_family {
            conf.with_section(Some(UI_SECTION))
                .set("FontFamily", font_family.clone());
        }
        conf
    }

    pub fn save(&self) -> AppResult<()> {
        let Some(path) = Self::config_path() else {
            let err_msg = "无法确定配置文件路径，保存失败。".to_string();
            log::error!("{}", err_msg);
            return Err(AppError::Custom(err_msg));
        };

        match self.to_ini().write_to_file(&path) {
            Ok(_) => {
                log::info!("配置已保存到 {:?}。", path);
                Ok(())
            }
            Err(write_error) => {
                log::error!("保存配置到 {:?} 失败: {}", path, write_error);
                Err(write_error.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ini_round_trip() {
        let settings = AppSettings {
            data: DataSettings {
                csv_path: PathBuf::from("data/ufo.csv"),
                wrap_width: 60,
                missing_placeholder: "N/A".to_string(),
            },
            log_settings: LogSettings {
                enable_file_log: true,
                file_log_level: LevelFilter::Debug,
                console_log_level: LevelFilter::Warn,
            },
            ui: UiSettings {
                font_family: Some("Noto Sans CJK SC".to_string()),
            },
        };
        assert_eq!(AppSettings::from_ini(&settings.to_ini()), settings);
    }

    #[test]
    fn test_missing_and_invalid_keys_fall_back_to_defaults() {
        let conf = Ini::load_from_str(
            "[Data]\nWrapWidth = wide\nMissingPlaceholder =\n[Logging]\nFileLogLevel = loud\n",
        )
        .unwrap();
        let settings = AppSettings::from_ini(&conf);
        assert_eq!(settings, AppSettings::default());
    }

    #[test]
    fn test_zero_wrap_width_is_clamped() {
        let conf = Ini::load_from_str("[Data]\nWrapWidth = 0\n").unwrap();
        assert_eq!(AppSettings::from_ini(&conf).data.wrap_width, 1);
    }
}
