#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod aggregator;
mod app_actions;
mod app_definition;
mod app_handlers;
mod app_settings;
mod app_ui;
mod app_update;
mod data_loader;
mod error;
mod io;
mod logger;
mod map_view;
mod text_normalizer;
mod types;
mod utils;

use app_settings::AppSettings;
use std::sync::mpsc;

fn main() {
    let app_settings = AppSettings::load();

    // 日志条目通过该通道从日志系统发送到界面的日志面板
    let (ui_log_sender, ui_log_receiver): (
        mpsc::Sender<logger::LogEntry>,
        mpsc::Receiver<logger::LogEntry>,
    ) = mpsc::channel();

    logger::init_global_logger(ui_log_sender, &app_settings.log_settings);

    log::info!(target: "ufo_map_main", "应用程序已启动。");

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([800.0, 600.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    if let Err(e) = eframe::run_native(
        "UFO Sightings Map",
        native_options,
        Box::new(move |cc| {
            let app_instance =
                crate::app_definition::UfoMapApp::new(cc, app_settings, ui_log_receiver);
            Ok(Box::new(app_instance))
        }),
    ) {
        log::error!(target: "ufo_map_main", "Eframe 运行错误: {e}");
    }
}
