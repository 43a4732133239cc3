use eframe::egui;
use egui_toast::{Toast, ToastKind, ToastOptions};
use log::{info, warn};

use crate::app_actions::{DataAction, UserAction};
use crate::app_definition::UfoMapApp;
use crate::logger::LogLevel;

impl eframe::App for UfoMapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        process_log_messages(self);
        handle_file_drops(self, ctx);

        draw_ui_elements(self, ctx);
        self.ui.toasts.show(ctx);

        // 绘制期间产生的事件在帧末统一处理，下一帧即可看到结果
        if !self.pending_actions.is_empty() {
            self.process_pending_actions();
            ctx.request_repaint();
        }
    }
}

/// 把日志通道中的新条目转移到界面日志缓冲区，遇到警告或错误时弹出提示。
pub(crate) fn process_log_messages(app: &mut UfoMapApp) {
    let mut first_warn_or_higher_message: Option<String> = None;

    while let Ok(log_entry) = app.ui_log_receiver.try_recv() {
        if log_entry.level >= LogLevel::Warn && first_warn_or_higher_message.is_none() {
            first_warn_or_higher_message = Some(log_entry.message.clone());
        }
        app.ui.push_log(log_entry);
    }

    if let Some(toast_message) = first_warn_or_higher_message {
        app.ui.toasts.add(Toast {
            text: toast_message.into(),
            kind: ToastKind::Warning,
            options: ToastOptions::default()
                .duration_in_seconds(5.0)
                .show_progress(true)
                .show_icon(true),
            style: Default::default(),
        });
        if !app.ui.show_bottom_log_panel {
            app.ui.new_trigger_log_exists = true;
        }
    }
}

/// 拖入 CSV 文件时切换数据源。
pub(crate) fn handle_file_drops(app: &mut UfoMapApp, ctx: &egui::Context) {
    let dropped_files = ctx.input(|i| i.raw.dropped_files.clone());
    let Some(file) = dropped_files.into_iter().next() else {
        return;
    };

    match file.path {
        Some(path) => {
            let is_csv = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
            if !is_csv {
                warn!("[UfoMapApp] 拖入的文件不是 CSV，已忽略: {}", path.display());
                return;
            }
            info!("[UfoMapApp] 通过拖放打开文件: {}", path.display());
            app.send_action(UserAction::Data(DataAction::OpenFile(path)));
        }
        None => warn!("[UfoMapApp] 拖入的文件没有可用的本地路径。"),
    }
}

pub(crate) fn draw_ui_elements(app: &mut UfoMapApp, ctx: &egui::Context) {
    egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
        app.draw_toolbar(ui);
    });
    app.draw_log_panel(ctx);
    app.draw_settings_window(ctx);

    egui::CentralPanel::default().show(ctx, |ui| {
        app.draw_main_panel(ui);
    });
}
