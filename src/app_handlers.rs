use egui_toast::{Toast, ToastKind, ToastOptions};
use log::{error, info, warn};

use crate::app_actions::{DataAction, PanelType, SettingsAction, UIAction, UserAction};
use crate::app_definition::UfoMapApp;
use crate::app_settings::AppSettings;
use crate::io;
use crate::utils;

impl UfoMapApp {
    pub fn send_action(&mut self, action: UserAction) {
        self.pending_actions.push(action);
    }

    /// 处理本帧积累的全部事件。
    pub fn process_pending_actions(&mut self) {
        let actions = std::mem::take(&mut self.pending_actions);
        for action in actions {
            self.handle_action(action);
        }
    }

    pub fn handle_action(&mut self, action: UserAction) {
        match action {
            UserAction::Data(data_action) => self.handle_data_action(data_action),
            UserAction::UI(ui_action) => self.handle_ui_action(ui_action),
            UserAction::Settings(settings_action) => self.handle_settings_action(settings_action),
        }
    }

    fn handle_data_action(&mut self, action: DataAction) {
        match action {
            DataAction::YearChanged(year) => {
                // 只重新计算汇总，已清洗的记录表保持不变
                if let Some(effective) = self.data.select_year(year) {
                    info!(
                        "[UfoMapApp] 切换到 {} 年，共 {} 次目击，{} 个坐标。",
                        effective,
                        utils::format_thousands(self.data.summary().total),
                        self.data.summary().locations.len()
                    );
                }
            }
            DataAction::Reload => self.reload_data(),
            DataAction::OpenFile(path) => {
                info!("[UfoMapApp] 切换数据文件: {}", path.display());
                self.settings.data.csv_path = path;
                self.ui.temp_edit_settings.data.csv_path = self.settings.data.csv_path.clone();
                if let Err(e) = self.settings.save() {
                    warn!("[UfoMapApp] 保存数据文件路径失败: {e}");
                }
                self.reload_data();
            }
        }
    }

    fn handle_ui_action(&mut self, action: UIAction) {
        match action {
            UIAction::TogglePanel(panel) => match panel {
                PanelType::Log => {
                    self.ui.show_bottom_log_panel = !self.ui.show_bottom_log_panel;
                    if self.ui.show_bottom_log_panel {
                        self.ui.new_trigger_log_exists = false;
                    }
                }
                PanelType::Settings => {
                    if !self.ui.show_settings_window {
                        self.ui.temp_edit_settings = self.settings.clone();
                    }
                    self.ui.show_settings_window = !self.ui.show_settings_window;
                }
            },
            UIAction::HidePanel(panel) => match panel {
                PanelType::Log => {
                    self.ui.show_bottom_log_panel = false;
                    self.ui.new_trigger_log_exists = false;
                }
                PanelType::Settings => self.ui.show_settings_window = false,
            },
        }
    }

    fn handle_settings_action(&mut self, action: SettingsAction) {
        match action {
            SettingsAction::Save(new_settings) => {
                let new_settings = *new_settings;
                let data_changed = new_settings.data != self.settings.data;
                let log_changed = new_settings.log_settings != self.settings.log_settings;
                let font_changed = new_settings.ui != self.settings.ui;

                self.settings = new_settings;
                self.ui.temp_edit_settings = self.settings.clone();
                self.ui.show_settings_window = false;

                match self.settings.save() {
                    Ok(()) => self.show_toast("设置已保存", ToastKind::Success),
                    Err(e) => self.show_toast(&format!("保存设置失败: {e}"), ToastKind::Error),
                }
                if log_changed || font_changed {
                    info!("[UfoMapApp] 日志与字体设置将在下次启动时生效。");
                }
                if data_changed {
                    // 换行宽度、占位文本会影响清洗结果，需要重新加载
                    self.reload_data();
                }
            }
            SettingsAction::Cancel => {
                self.ui.temp_edit_settings = self.settings.clone();
                self.ui.show_settings_window = false;
            }
            SettingsAction::Reset => {
                self.ui.temp_edit_settings = AppSettings::default();
            }
        }
    }

    /// 从当前设置的数据文件重新构建记录表。
    ///
    /// 加载失败时保留已有数据，只记录错误。
    pub fn reload_data(&mut self) {
        match io::load_table(&self.settings.data) {
            Ok(table) => {
                if table.is_empty() {
                    warn!(
                        "[UfoMapApp] 数据文件 {} 中没有有效记录。",
                        self.settings.data.csv_path.display()
                    );
                }
                let kept = table.stats().kept_rows;
                self.data.replace_table(table);
                self.show_toast(
                    &format!("已加载 {} 条目击记录", utils::format_thousands(kept)),
                    ToastKind::Success,
                );
            }
            Err(e) => {
                error!(
                    "[UfoMapApp] 加载数据文件 {} 失败: {e}",
                    self.settings.data.csv_path.display()
                );
                self.data.set_load_error(e);
            }
        }
    }

    fn show_toast(&mut self, text: &str, kind: ToastKind) {
        self.ui.toasts.add(Toast {
            text: text.to_string().into(),
            kind,
            options: ToastOptions::default()
                .duration_in_seconds(3.0)
                .show_progress(true)
                .show_icon(true),
            style: Default::default(),
        });
    }
}
