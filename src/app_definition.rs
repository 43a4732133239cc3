use std::sync::mpsc::Receiver as StdReceiver;

use egui_toast::Toasts;

use crate::aggregator::YearSummary;
use crate::app_actions::UserAction;
use crate::app_settings::AppSettings;
use crate::error::AppError;
use crate::logger::LogEntry;
use crate::types::SightingTable;
use crate::utils;

const LOG_BUFFER_CAPACITY: usize = 200;

const CJK_FALLBACK_FAMILIES: [&str; 6] = [
    "Microsoft YaHei",
    "PingFang SC",
    "Noto Sans CJK SC",
    "Source Han Sans SC",
    "WenQuanYi Micro Hei",
    "SimHei",
];

pub(super) struct UiState {
    pub(super) show_bottom_log_panel: bool,
    pub(super) new_trigger_log_exists: bool,
    pub(super) show_settings_window: bool,
    pub(super) log_display_buffer: Vec<LogEntry>,
    pub(super) temp_edit_settings: AppSettings,
    pub(super) toasts: Toasts,
}

impl UiState {
    fn new(settings: &AppSettings) -> Self {
        let toasts = Toasts::new()
            .anchor(egui::Align2::LEFT_TOP, (10.0, 10.0))
            .direction(egui::Direction::TopDown);

        Self {
            toasts,
            show_bottom_log_panel: false,
            new_trigger_log_exists: false,
            show_settings_window: false,
            log_display_buffer: Vec::with_capacity(LOG_BUFFER_CAPACITY),
            temp_edit_settings: settings.clone(),
        }
    }

    pub(super) fn push_log(&mut self, entry: LogEntry) {
        if self.log_display_buffer.len() >= LOG_BUFFER_CAPACITY {
            self.log_display_buffer.remove(0);
        }
        self.log_display_buffer.push(entry);
    }
}

/// 数据相关状态：只读记录表、当前选中年份及其汇总结果。
///
/// 记录表只在加载成功时整体替换；切换年份只重新计算汇总，不会重新读取文件。
#[derive(Debug, Default)]
pub struct DataState {
    pub(super) table: Option<SightingTable>,
    pub(super) load_error: Option<AppError>,
    pub(super) selected_year: Option<i32>,
    pub(super) summary: YearSummary,
}

impl DataState {
    /// 用新加载的记录表替换当前数据，并把年份重置为中位数年份。
    pub fn replace_table(&mut self, table: SightingTable) {
        self.load_error = None;
        self.selected_year = table.default_year();
        self.table = Some(table);
        self.recompute_summary();
    }

    /// 记录加载失败。已加载的旧数据保持不变，以便界面继续可用。
    pub fn set_load_error(&mut self, error: AppError) {
        self.load_error = Some(error);
    }

    /// 切换年份。年份会被限制在选择器上下界之内，返回实际生效的年份。
    pub fn select_year(&mut self, year: i32) -> Option<i32> {
        let bounds = self.table.as_ref()?.year_bounds()?;
        let year = utils::clamp_year(year, bounds);
        if self.selected_year != Some(year) {
            self.selected_year = Some(year);
            self.recompute_summary();
        }
        Some(year)
    }

    fn recompute_summary(&mut self) {
        self.summary = match (&self.table, self.selected_year) {
            (Some(table), Some(year)) => YearSummary::compute(table, year),
            _ => YearSummary::default(),
        };
    }

    pub fn table(&self) -> Option<&SightingTable> {
        self.table.as_ref()
    }

    pub fn summary(&self) -> &YearSummary {
        &self.summary
    }

    pub fn selected_year(&self) -> Option<i32> {
        self.selected_year
    }

    pub fn load_error(&self) -> Option<&AppError> {
        self.load_error.as_ref()
    }
}

pub struct UfoMapApp {
    pub(super) settings: AppSettings,
    pub(super) data: DataState,
    pub(super) ui: UiState,
    pub(super) ui_log_receiver: StdReceiver<LogEntry>,
    /// 本帧绘制过程中产生的事件，绘制结束后统一处理
    pub(super) pending_actions: Vec<UserAction>,
}

impl UfoMapApp {
    pub fn new(
        cc: &eframe::CreationContext,
        settings: AppSettings,
        ui_log_receiver: StdReceiver<LogEntry>,
    ) -> Self {
        Self::setup_fonts(&cc.egui_ctx, &settings);

        let mut app = Self {
            ui: UiState::new(&settings),
            settings,
            data: DataState::default(),
            ui_log_receiver,
            pending_actions: Vec::new(),
        };

        // 启动时加载一次数据，之后只在显式重新加载时读取文件
        app.reload_data();
        app
    }

    /// 在系统字体中查找一个中文字体作为后备字体，找不到时只使用 egui 默认字体。
    fn setup_fonts(ctx: &egui::Context, settings: &AppSettings) {
        let mut fonts = egui::FontDefinitions::default();

        let mut db = fontdb::Database::new();
        db.load_system_fonts();

        let candidates: Vec<&str> = settings
            .ui
            .font_family
            .as_deref()
            .into_iter()
            .chain(CJK_FALLBACK_FAMILIES)
            .collect();

        for family_name in candidates {
            let query = fontdb::Query {
                families: &[fontdb::Family::Name(family_name)],
                weight: fontdb::Weight::NORMAL,
                stretch: fontdb::Stretch::Normal,
                style: fontdb::Style::Normal,
            };

            let Some(face_id) = db.query(&query) else {
                continue;
            };
            let loaded_font = db.with_face_data(face_id, |font_data, _face_index| {
                egui::FontData::from_owned(font_data.to_vec())
            });

            if let Some(font_data) = loaded_font {
                let font_key = format!("system_{family_name}");
                fonts
                    .font_data
                    .insert(font_key.clone(), font_data.into());
                for family in [egui::FontFamily::Proportional, egui::FontFamily::Monospace] {
                    fonts
                        .families
                        .entry(family)
                        .or_default()
                        .push(font_key.clone());
                }
                log::info!("[UfoMapApp] 已加载系统字体: {family_name}");
                ctx.set_fonts(fonts);
                return;
            }
            log::error!("[UfoMapApp] 读取字体文件失败: {family_name}");
        }

        log::warn!("[UfoMapApp] 未找到可用的中文字体，界面中文可能无法正常显示。");
        ctx.set_fonts(fonts);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Sighting;
    use chrono::NaiveDate;

    fn table_with_years(years: &[i32]) -> SightingTable {
        let records = years
            .iter()
            .enumerate()
            .map(|(i, &year)| {
                let ts = NaiveDate::from_ymd_opt(year, 1, 1)
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .unwrap();
                Sighting::new(
                    ts,
                    i as f64,
                    0.0,
                    format!("c{i}"),
                    "city".into(),
                    "st".into(),
                    "us".into(),
                    "disk".into(),
                )
            })
            .collect();
        SightingTable::new(records, None)
    }

    #[test]
    fn test_replace_table_selects_median_year() {
        let mut state = DataState::default();
        state.replace_table(table_with_years(&[1990, 2000, 2000, 2010]));
        assert_eq!(state.selected_year(), Some(2000));
        assert_eq!(state.summary().total, 2);
        assert_eq!(state.summary().year, 2000);
    }

    #[test]
    fn test_select_year_recomputes_and_clamps() {
        let mut state = DataState::default();
        state.replace_table(table_with_years(&[1990, 2000, 2010]));

        assert_eq!(state.select_year(1990), Some(1990));
        assert_eq!(state.summary().total, 1);

        // 区间内没有记录的年份得到空结果
        assert_eq!(state.select_year(1995), Some(1995));
        assert_eq!(state.summary().total, 0);
        assert!(state.summary().locations.is_empty());

        assert_eq!(state.select_year(3000), Some(2010));
        assert_eq!(state.summary().year, 2010);
    }

    #[test]
    fn test_select_year_without_table() {
        let mut state = DataState::default();
        assert_eq!(state.select_year(2000), None);
        assert_eq!(state.summary(), &YearSummary::default());
    }

    #[test]
    fn test_load_error_keeps_previous_table() {
        let mut state = DataState::default();
        state.replace_table(table_with_years(&[2000]));
        state.set_load_error(AppError::MissingColumn("latitude".to_string()));
        assert!(state.load_error().is_some());
        assert_eq!(state.table().map(SightingTable::len), Some(1));

        state.replace_table(table_with_years(&[2001]));
        assert!(state.load_error().is_none());
    }
}
