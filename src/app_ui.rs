use std::path::PathBuf;

use eframe::egui::{self, Color32, RichText};
use log::LevelFilter;

use crate::app_actions::{DataAction, PanelType, SettingsAction, UIAction, UserAction};
use crate::app_definition::UfoMapApp;
use crate::map_view;
use crate::utils;

const LOG_LEVEL_CHOICES: [LevelFilter; 6] = [
    LevelFilter::Off,
    LevelFilter::Error,
    LevelFilter::Warn,
    LevelFilter::Info,
    LevelFilter::Debug,
    LevelFilter::Trace,
];

fn level_filter_combo(ui: &mut egui::Ui, id: &str, label: &str, value: &mut LevelFilter) {
    ui.label(label);
    egui::ComboBox::from_id_salt(id)
        .selected_text(value.to_string())
        .show_ui(ui, |combo_ui| {
            for level in LOG_LEVEL_CHOICES {
                combo_ui.selectable_value(&mut *value, level, level.to_string());
            }
        });
    ui.end_row();
}

impl UfoMapApp {
    /// 顶部工具栏：文件菜单、重新加载、设置与日志开关。
    pub fn draw_toolbar(&mut self, ui: &mut egui::Ui) {
        egui::menu::bar(ui, |ui_bar| {
            ui_bar.menu_button("文件", |file_menu| {
                if file_menu.button("打开 CSV 文件...").clicked() {
                    if let Some(path) = crate::io::pick_csv_file(&self.settings.data.csv_path) {
                        self.send_action(UserAction::Data(DataAction::OpenFile(path)));
                    }
                    file_menu.close_menu();
                }
                if file_menu.button("重新加载").clicked() {
                    self.send_action(UserAction::Data(DataAction::Reload));
                    file_menu.close_menu();
                }
            });

            if ui_bar.button("设置").clicked() {
                self.send_action(UserAction::UI(UIAction::TogglePanel(PanelType::Settings)));
            }

            ui_bar.with_layout(egui::Layout::right_to_left(egui::Align::Center), |right_ui| {
                let log_label = if self.ui.new_trigger_log_exists {
                    RichText::new("日志 ●").color(Color32::from_rgb(255, 200, 0))
                } else {
                    RichText::new("日志")
                };
                if right_ui
                    .selectable_label(self.ui.show_bottom_log_panel, log_label)
                    .clicked()
                {
                    self.send_action(UserAction::UI(UIAction::TogglePanel(PanelType::Log)));
                }

                if let Some(source) = self.data.table().and_then(|t| t.source()) {
                    right_ui.label(RichText::new(source.display().to_string()).weak());
                }
            });
        });
    }

    /// 中央区域：标题、说明、年份选择器、年度总数与地图。
    pub fn draw_main_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("世界地图 - UFO 目击记录");
        ui.label("• 拖动滑块查看某一年的目击记录。");
        ui.label("• 鼠标悬停在任意圆点上，可查看该地点当年的目击次数。");
        ui.label("• 同时会显示该地点当年的一条示例报告。");
        ui.separator();

        if let Some(error) = self.data.load_error() {
            ui.colored_label(
                Color32::from_rgb(255, 100, 100),
                format!("数据加载失败: {error}"),
            );
        }

        let Some((min_year, max_year)) = self.data.table().and_then(|t| t.year_bounds()) else {
            ui.add_space(8.0);
            ui.label(RichText::new("没有可显示的数据。请通过“文件 → 打开 CSV 文件...”选择数据文件。").italics());
            return;
        };

        let mut year = self.data.selected_year().unwrap_or(min_year);
        let slider_response = ui.add(
            egui::Slider::new(&mut year, min_year..=max_year)
                .text("选择年份")
                .step_by(1.0),
        );
        if slider_response.changed() {
            self.send_action(UserAction::Data(DataAction::YearChanged(year)));
        }

        let summary = self.data.summary();
        ui.label(
            RichText::new(format!(
                "{} 年目击总数: {}",
                summary.year,
                utils::format_thousands(summary.total)
            ))
            .heading()
            .strong(),
        );

        egui::Frame::canvas(ui.style()).show(ui, |map_ui| {
            map_view::draw_map(map_ui, summary);
        });
    }

    pub fn draw_log_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("log_panel_id")
            .resizable(true)
            .default_height(150.0)
            .min_height(60.0)
            .max_height(ctx.available_rect().height() * 0.7)
            .show_animated(ctx, self.ui.show_bottom_log_panel, |ui| {
                ui.horizontal(|h_ui| {
                    h_ui.label(RichText::new("日志").strong());
                    h_ui.with_layout(
                        egui::Layout::right_to_left(egui::Align::Center),
                        |btn_ui| {
                            if btn_ui.button("关闭").clicked() {
                                self.pending_actions
                                    .push(UserAction::UI(UIAction::HidePanel(PanelType::Log)));
                            }
                            if btn_ui.button("清空").clicked() {
                                self.ui.log_display_buffer.clear();
                            }
                        },
                    );
                });
                ui.separator();

                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .stick_to_bottom(true)
                    .show(ui, |scroll_ui| {
                        if self.ui.log_display_buffer.is_empty() {
                            scroll_ui.label(RichText::new("暂无日志。").weak().italics());
                            return;
                        }
                        for entry in &self.ui.log_display_buffer {
                            scroll_ui.horizontal_wrapped(|line_ui| {
                                line_ui.label(
                                    RichText::new(
                                        entry.timestamp.format("[%H:%M:%S%.3f]").to_string(),
                                    )
                                    .monospace()
                                    .color(Color32::DARK_GRAY),
                                );
                                line_ui.label(
                                    RichText::new(format!("[{}]", entry.level.as_str()))
                                        .monospace()
                                        .color(entry.level.color())
                                        .strong(),
                                );
                                line_ui.label(RichText::new(&entry.message).monospace().weak());
                            });
                        }
                    });
            });
    }

    pub fn draw_settings_window(&mut self, ctx: &egui::Context) {
        if !self.ui.show_settings_window {
            return;
        }

        let mut open = true;
        egui::Window::new("设置")
            .open(&mut open)
            .resizable(false)
            .collapsible(false)
            .show(ctx, |ui| {
                let temp = &mut self.ui.temp_edit_settings;

                ui.label(RichText::new("数据").strong());
                egui::Grid::new("data_settings_grid")
                    .num_columns(2)
                    .spacing([12.0, 6.0])
                    .show(ui, |grid_ui| {
                        grid_ui.label("CSV 文件路径:");
                        let mut path_text = temp.data.csv_path.to_string_lossy().to_string();
                        if grid_ui.text_edit_singleline(&mut path_text).changed() {
                            temp.data.csv_path = PathBuf::from(path_text);
                        }
                        grid_ui.end_row();

                        grid_ui.label("换行宽度:");
                        grid_ui.add(egui::DragValue::new(&mut temp.data.wrap_width).range(1..=400));
                        grid_ui.end_row();

                        grid_ui.label("缺失文本占位:");
                        grid_ui
                            .text_edit_singleline(&mut temp.data.missing_placeholder)
                            .on_hover_text("文本列为空时填入的内容，修改后会重新加载数据");
                        grid_ui.end_row();
                    });

                ui.separator();
                ui.label(RichText::new("日志").strong());
                egui::Grid::new("log_settings_grid")
                    .num_columns(2)
                    .spacing([12.0, 6.0])
                    .show(ui, |grid_ui| {
                        grid_ui.label("写入日志文件:");
                        grid_ui.checkbox(&mut temp.log_settings.enable_file_log, "");
                        grid_ui.end_row();

                        level_filter_combo(
                            grid_ui,
                            "file_log_level_combo",
                            "文件日志级别:",
                            &mut temp.log_settings.file_log_level,
                        );
                        level_filter_combo(
                            grid_ui,
                            "console_log_level_combo",
                            "控制台日志级别:",
                            &mut temp.log_settings.console_log_level,
                        );
                    });

                ui.separator();
                ui.label(RichText::new("界面").strong());
                ui.horizontal(|row_ui| {
                    row_ui.label("字体:");
                    let mut font_text = temp.ui.font_family.clone().unwrap_or_default();
                    if row_ui
                        .text_edit_singleline(&mut font_text)
                        .on_hover_text("留空时自动查找系统中的中文字体，重启后生效")
                        .changed()
                    {
                        let trimmed = font_text.trim();
                        temp.ui.font_family = (!trimmed.is_empty()).then(|| trimmed.to_string());
                    }
                });

                ui.separator();
                ui.horizontal(|bottom_ui| {
                    if bottom_ui.button("保存并应用").clicked() {
                        let settings = Box::new(self.ui.temp_edit_settings.clone());
                        self.pending_actions
                            .push(UserAction::Settings(SettingsAction::Save(settings)));
                    }
                    if bottom_ui.button("恢复默认").clicked() {
                        self.pending_actions
                            .push(UserAction::Settings(SettingsAction::Reset));
                    }
                    if bottom_ui.button("取消").clicked() {
                        self.pending_actions
                            .push(UserAction::Settings(SettingsAction::Cancel));
                    }
                });
            });

        if !open {
            self.send_action(UserAction::Settings(SettingsAction::Cancel));
        }
    }
}
