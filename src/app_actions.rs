use std::path::PathBuf;

use crate::app_settings::AppSettings;

// 主事件枚举
#[derive(Debug, Clone, PartialEq)]
pub enum UserAction {
    Data(DataAction),
    UI(UIAction),
    Settings(SettingsAction),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataAction {
    YearChanged(i32),
    Reload,
    OpenFile(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelType {
    Settings,
    Log,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UIAction {
    TogglePanel(PanelType),
    HidePanel(PanelType),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SettingsAction {
    Save(Box<AppSettings>),
    Cancel,
    Reset,
}
