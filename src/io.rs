use std::path::{Path, PathBuf};

use crate::app_settings::DataSettings;
use crate::data_loader::{self, LoadOptions};
use crate::error::AppResult;
use crate::types::SightingTable;

/// 按当前数据设置加载记录表。
pub fn load_table(settings: &DataSettings) -> AppResult<SightingTable> {
    data_loader::load_sightings(&settings.csv_path, &LoadOptions::from(settings))
}

/// 弹出“打开 CSV 文件”对话框，初始目录为当前数据文件所在目录。
pub fn pick_csv_file(current: &Path) -> Option<PathBuf> {
    let initial_dir = current
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    rfd::FileDialog::new()
        .add_filter("CSV 文件", &["csv"])
        .add_filter("所有文件", &["*"])
        .set_title("打开目击记录文件...")
        .set_directory(initial_dir)
        .pick_file()
}
