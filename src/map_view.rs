use egui::{Align2, Color32, FontId, Pos2, Rect, Sense, Shape, Stroke, StrokeKind, Vec2};

use crate::aggregator::YearSummary;
use crate::text_normalizer::LINE_BREAK_MARKER;
use crate::types::AggregatedLocation;

/// 标记的最大直径 (像素)。
pub const MARKER_SIZE_MAX: f32 = 15.0;
const MARKER_RADIUS_MIN: f32 = 2.0;
const GRATICULE_STEP_DEG: i32 = 30;

const OCEAN_COLOR: Color32 = Color32::from_rgb(24, 32, 48);
const GRID_COLOR: Color32 = Color32::from_rgb(60, 72, 96);

/// 在可用区域内取一个 2:1 的矩形，用于等距圆柱投影。
pub fn fit_map_rect(available: Rect) -> Rect {
    let width = available.width().min(available.height() * 2.0).max(1.0);
    let size = Vec2::new(width, width / 2.0);
    Rect::from_center_size(available.center(), size)
}

/// 等距圆柱投影：经度 [-180, 180] 映射到水平方向，纬度 [-90, 90] 映射到垂直方向。
pub fn project(latitude: f64, longitude: f64, rect: Rect) -> Pos2 {
    let x = ((longitude + 180.0) / 360.0) as f32;
    let y = ((90.0 - latitude) / 180.0) as f32;
    Pos2::new(
        rect.left() + x * rect.width(),
        rect.top() + y * rect.height(),
    )
}

/// Turbo 色带的多项式近似，`t` 会被限制在 [0, 1]。
pub fn turbo_color(t: f32) -> Color32 {
    let t = t.clamp(0.0, 1.0);
    let r = 0.135_721_38
        + t * (4.615_392_6
            + t * (-42.660_324 + t * (132.131_08 + t * (-152.942_4 + t * 59.286_38))));
    let g = 0.091_402_61
        + t * (2.194_188_4 + t * (4.842_966_6 + t * (-14.185_033 + t * (4.277_298_5 + t * 2.829_566))));
    let b = 0.106_673_3
        + t * (12.641_946 + t * (-60.582_047 + t * (110.362_77 + t * (-89.903_11 + t * 27.348_25))));

    let to_u8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color32::from_rgb(to_u8(r), to_u8(g), to_u8(b))
}

/// 标记半径，面积与目击次数成正比，最大值对应 [`MARKER_SIZE_MAX`] 直径。
pub fn marker_radius(sightings: usize, max_sightings: usize, size_max: f32) -> f32 {
    if max_sightings == 0 {
        return MARKER_RADIUS_MIN;
    }
    let ratio = (sightings as f32 / max_sightings as f32).clamp(0.0, 1.0);
    (size_max * 0.5 * ratio.sqrt()).max(MARKER_RADIUS_MIN)
}

/// 按目击次数在 [min, max] 区间内的位置取色。
pub fn marker_color(sightings: usize, min_sightings: usize, max_sightings: usize) -> Color32 {
    if max_sightings <= min_sightings {
        return turbo_color(0.0);
    }
    let t = (sightings.saturating_sub(min_sightings)) as f32
        / (max_sightings - min_sightings) as f32;
    turbo_color(t)
}

/// 悬停提示文本，`<br>` 换成真正的换行。
pub fn tooltip_text(location: &AggregatedLocation) -> String {
    let to_lines = |s: &str| s.replace(LINE_BREAK_MARKER, "\n");
    format!(
        "sightings: {}\ncomment: {}\ncity: {}\nshape: {}",
        location.sightings,
        to_lines(&location.comment),
        to_lines(&location.city),
        to_lines(&location.shape),
    )
}

/// 找出指针所在的标记，多个重叠时取中心最近的一个。
pub fn pick_marker(summary: &YearSummary, pointer: Pos2, rect: Rect) -> Option<usize> {
    summary
        .locations
        .iter()
        .enumerate()
        .filter_map(|(idx, loc)| {
            let center = project(loc.latitude, loc.longitude, rect);
            let radius = marker_radius(loc.sightings, summary.max_sightings, MARKER_SIZE_MAX);
            let distance = center.distance(pointer);
            (distance <= radius + 1.0).then_some((idx, distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(idx, _)| idx)
}

fn border_stroke() -> Stroke {
    Stroke::new(1.5, GRID_COLOR.gamma_multiply(1.6))
}

/// 背景图形：海洋底色、30° 经纬网与外边框。
fn background_shapes(rect: Rect) -> Vec<Shape> {
    let stroke = Stroke::new(1.0, GRID_COLOR);
    let mut shapes = vec![Shape::rect_filled(rect, 0.0, OCEAN_COLOR)];

    for lon in (-180..=180).step_by(GRATICULE_STEP_DEG as usize) {
        let top = project(90.0, f64::from(lon), rect);
        let bottom = project(-90.0, f64::from(lon), rect);
        shapes.push(Shape::line_segment([top, bottom], stroke));
    }
    for lat in (-90..=90).step_by(GRATICULE_STEP_DEG as usize) {
        let left = project(f64::from(lat), -180.0, rect);
        let right = project(f64::from(lat), 180.0, rect);
        shapes.push(Shape::line_segment([left, right], stroke));
    }

    shapes.push(Shape::rect_stroke(rect, 0.0, border_stroke(), StrokeKind::Inside));
    shapes
}

fn draw_background(painter: &egui::Painter, rect: Rect) {
    painter.extend(background_shapes(rect));
    painter.text(
        rect.left_bottom() + Vec2::new(4.0, -4.0),
        Align2::LEFT_BOTTOM,
        "经纬网间隔 30°",
        FontId::proportional(11.0),
        GRID_COLOR,
    );
}

/// 绘制地图与全部标记，并处理悬停提示。
pub fn draw_map(ui: &mut egui::Ui, summary: &YearSummary) {
    let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::hover());
    let rect = fit_map_rect(response.rect);
    draw_background(&painter, rect);

    let min_sightings = summary
        .locations
        .iter()
        .map(|l| l.sightings)
        .min()
        .unwrap_or(0);

    let hovered = response
        .hover_pos()
        .and_then(|pos| pick_marker(summary, pos, rect));

    for (idx, loc) in summary.locations.iter().enumerate() {
        let center = project(loc.latitude, loc.longitude, rect);
        let radius = marker_radius(loc.sightings, summary.max_sightings, MARKER_SIZE_MAX);
        let color = marker_color(loc.sightings, min_sightings, summary.max_sightings);
        painter.circle_filled(center, radius, color.gamma_multiply(0.85));
        if hovered == Some(idx) {
            painter.circle_stroke(center, radius + 1.5, Stroke::new(1.5, Color32::WHITE));
        }
    }

    if let Some(location) = hovered.and_then(|idx| summary.locations.get(idx)) {
        let text = tooltip_text(location);
        response.on_hover_ui_at_pointer(|tip_ui| {
            tip_ui.label(text);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(lat: f64, lon: f64, sightings: usize) -> AggregatedLocation {
        AggregatedLocation {
            latitude: lat,
            longitude: lon,
            sightings,
            comment: "bright<br>light".to_string(),
            city: "phoenix".to_string(),
            state: "az".to_string(),
            country: "us".to_string(),
            shape: "light".to_string(),
        }
    }

    #[test]
    fn test_project_corners() {
        let rect = Rect::from_min_size(Pos2::new(10.0, 20.0), Vec2::new(360.0, 180.0));
        assert_eq!(project(90.0, -180.0, rect), Pos2::new(10.0, 20.0));
        assert_eq!(project(-90.0, 180.0, rect), Pos2::new(370.0, 200.0));
        assert_eq!(project(0.0, 0.0, rect), Pos2::new(190.0, 110.0));
    }

    #[test]
    fn test_background_has_graticule_and_border() {
        let rect = Rect::from_min_size(Pos2::new(5.0, 5.0), Vec2::new(360.0, 180.0));
        let shapes = background_shapes(rect);

        let lines = shapes
            .iter()
            .filter(|s| matches!(s, Shape::LineSegment { .. }))
            .count();
        assert_eq!(lines, 13 + 7);

        let has_border = shapes.iter().any(|s| {
            matches!(s, Shape::Rect(r)
                if r.rect == rect && r.stroke.width > 0.0 && r.fill == Color32::TRANSPARENT)
        });
        assert!(has_border);
    }

    #[test]
    fn test_fit_map_rect_keeps_aspect() {
        let wide = fit_map_rect(Rect::from_min_size(Pos2::ZERO, Vec2::new(1000.0, 300.0)));
        assert_eq!(wide.size(), Vec2::new(600.0, 300.0));
        let tall = fit_map_rect(Rect::from_min_size(Pos2::ZERO, Vec2::new(400.0, 900.0)));
        assert_eq!(tall.size(), Vec2::new(400.0, 200.0));
    }

    #[test]
    fn test_turbo_endpoints_are_clamped() {
        assert_eq!(turbo_color(-1.0), turbo_color(0.0));
        assert_eq!(turbo_color(2.0), turbo_color(1.0));
        // 低端偏蓝，高端偏红
        let low = turbo_color(0.15);
        let high = turbo_color(1.0);
        assert!(low.b() > low.r());
        assert!(high.r() > high.b());
    }

    #[test]
    fn test_marker_radius_scales_with_area() {
        assert_eq!(marker_radius(100, 100, MARKER_SIZE_MAX), MARKER_SIZE_MAX / 2.0);
        assert_eq!(marker_radius(25, 100, MARKER_SIZE_MAX), MARKER_SIZE_MAX / 4.0);
        assert_eq!(marker_radius(1, 10_000, MARKER_SIZE_MAX), MARKER_RADIUS_MIN);
        assert_eq!(marker_radius(0, 0, MARKER_SIZE_MAX), MARKER_RADIUS_MIN);
    }

    #[test]
    fn test_tooltip_replaces_line_breaks() {
        let text = tooltip_text(&location(1.0, 1.0, 3));
        assert_eq!(
            text,
            "sightings: 3\ncomment: bright\nlight\ncity: phoenix\nshape: light"
        );
    }

    #[test]
    fn test_pick_marker_prefers_nearest() {
        let rect = Rect::from_min_size(Pos2::ZERO, Vec2::new(360.0, 180.0));
        let summary = YearSummary {
            year: 2000,
            total: 3,
            max_sightings: 2,
            locations: vec![location(0.0, 0.0, 2), location(0.0, 3.0, 1)],
        };
        assert_eq!(pick_marker(&summary, Pos2::new(180.5, 90.0), rect), Some(0));
        assert_eq!(pick_marker(&summary, Pos2::new(183.0, 90.0), rect), Some(1));
        assert_eq!(pick_marker(&summary, Pos2::new(10.0, 10.0), rect), None);
    }
}
