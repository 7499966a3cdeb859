//! Animated 2D chart surfaces.
//!
//! Hand-drawn risk-vs-altitude line chart with a time-eased reveal animation,
//! and a color-banded risk heatmap. Each surface is redrawn in full per frame;
//! the line chart's animation is restartable, and restarting cancels whatever
//! run was in flight.

use eframe::egui;

/// One risk sample, ordered ascending by altitude for the line chart.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChartPoint {
    pub altitude_km: f64,
    pub risk: f64,
}

const PAD_L: f32 = 48.0;
const PAD_R: f32 = 18.0;
const PAD_T: f32 = 26.0;
const PAD_B: f32 = 28.0;

const HEAT_PAD_L: f32 = 54.0;
const HEAT_PAD_R: f32 = 20.0;
const HEAT_PAD_T: f32 = 34.0;
const HEAT_PAD_B: f32 = 34.0;

/// Markers and the highlight line appear only this far into the animation,
/// measured on elapsed time, not on the eased lift.
const MARKER_REVEAL_FRACTION: f64 = 0.85;

pub fn markers_revealed(t: f64) -> bool {
    t > MARKER_REVEAL_FRACTION
}

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Ease-out cubic applied to the reveal fraction: fast start, settled finish.
pub fn ease_out_cubic(t: f64) -> f64 {
    1.0 - (1.0 - t).powi(3)
}

/// Axis ranges derived from data extrema. Y is padded 12% below and 18%
/// above the observed span and clamped to the unit risk interval.
#[derive(Clone, Copy, Debug)]
pub struct ChartScales {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl ChartScales {
    pub fn from_points(points: &[ChartPoint]) -> Self {
        if points.is_empty() {
            return Self {
                min_x: 0.0,
                max_x: 1.0,
                min_y: 0.0,
                max_y: 1.0,
            };
        }
        let mut min_x = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for p in points {
            min_x = min_x.min(p.altitude_km);
            max_x = max_x.max(p.altitude_km);
            min_y = min_y.min(p.risk);
            max_y = max_y.max(p.risk);
        }
        let span = if max_y > min_y { max_y - min_y } else { 0.01 };
        Self {
            min_x,
            max_x,
            min_y: (min_y - span * 0.12).max(0.0),
            max_y: (max_y + span * 0.18).min(1.0),
        }
    }

    fn x_to_px(&self, rect: egui::Rect, x: f64) -> f32 {
        let range = if self.max_x > self.min_x {
            self.max_x - self.min_x
        } else {
            1.0
        };
        rect.left()
            + PAD_L
            + ((x - self.min_x) / range) as f32 * (rect.width() - PAD_L - PAD_R)
    }

    fn y_to_px(&self, rect: egui::Rect, y: f64) -> f32 {
        let range = if self.max_y > self.min_y {
            self.max_y - self.min_y
        } else {
            1.0
        };
        rect.top()
            + PAD_T
            + (1.0 - ((y - self.min_y) / range)) as f32 * (rect.height() - PAD_T - PAD_B)
    }
}

/// One animation slot per chart surface. Restarting replaces the run and bumps
/// the generation, so nothing from the previous run can keep advancing.
pub struct SurfaceAnimation {
    started_at: Option<f64>,
    duration_s: f64,
    generation: u64,
}

impl SurfaceAnimation {
    pub fn new(duration_s: f64) -> Self {
        Self {
            started_at: None,
            duration_s,
            generation: 0,
        }
    }

    pub fn restart(&mut self, now: f64) {
        self.started_at = Some(now);
        self.generation += 1;
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Elapsed-time fraction, clamped to [0, 1]. Before the first restart the
    /// surface draws settled (fraction 1).
    pub fn fraction(&self, now: f64) -> f64 {
        match self.started_at {
            Some(start) => ((now - start) / self.duration_s).clamp(0.0, 1.0),
            None => 1.0,
        }
    }

    pub fn finished(&self, now: f64) -> bool {
        self.fraction(now) >= 1.0
    }
}

/// Three-segment color ramp keyed on normalized risk.
pub fn risk_to_color(risk: f64) -> egui::Color32 {
    let t = risk.clamp(0.0, 1.0);
    let (rgb, alpha) = if t < 0.33 {
        ((0, 229, 255), 0.15 + t * 0.6)
    } else if t < 0.66 {
        ((245, 200, 66), 0.15 + (t - 0.33) * 0.9)
    } else {
        ((255, 77, 109), 0.15 + (t - 0.66) * 1.2)
    };
    let a = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
    egui::Color32::from_rgba_unmultiplied(rgb.0, rgb.1, rgb.2, a)
}

fn draw_chart_frame(painter: &egui::Painter, rect: egui::Rect) {
    let mut mesh = egui::Mesh::default();
    let top = egui::Color32::from_rgba_unmultiplied(15, 26, 48, 217);
    let bottom = egui::Color32::from_rgba_unmultiplied(6, 10, 24, 242);
    mesh.colored_vertex(rect.left_top(), top);
    mesh.colored_vertex(rect.right_top(), top);
    mesh.colored_vertex(rect.left_bottom(), bottom);
    mesh.colored_vertex(rect.right_bottom(), bottom);
    mesh.add_triangle(0, 1, 2);
    mesh.add_triangle(2, 1, 3);
    painter.add(egui::Shape::mesh(mesh));

    painter.rect_stroke(
        rect,
        0,
        egui::Stroke::new(1.0, egui::Color32::from_rgba_unmultiplied(0, 229, 255, 36)),
        egui::StrokeKind::Inside,
    );
}

fn draw_grid(painter: &egui::Painter, rect: egui::Rect) {
    let stroke = egui::Stroke::new(1.0, egui::Color32::from_rgba_unmultiplied(0, 229, 255, 20));
    let rows = 4;
    let cols = 6;
    for i in 0..=rows {
        let y = rect.top() + PAD_T + i as f32 * (rect.height() - PAD_T - PAD_B) / rows as f32;
        painter.line_segment(
            [
                egui::pos2(rect.left() + PAD_L, y),
                egui::pos2(rect.right() - PAD_R, y),
            ],
            stroke,
        );
    }
    for i in 0..=cols {
        let x = rect.left() + PAD_L + i as f32 * (rect.width() - PAD_L - PAD_R) / cols as f32;
        painter.line_segment(
            [
                egui::pos2(x, rect.top() + PAD_T),
                egui::pos2(x, rect.bottom() - PAD_B),
            ],
            stroke,
        );
    }
}

fn draw_axis_labels(painter: &egui::Painter, rect: egui::Rect, scales: &ChartScales) {
    painter.text(
        egui::pos2(rect.left() + PAD_L, rect.top() + 8.0),
        egui::Align2::LEFT_TOP,
        "Risk vs Altitude (LEO)",
        egui::FontId::proportional(12.0),
        egui::Color32::from_rgba_unmultiplied(232, 237, 248, 184),
    );

    let label_color = egui::Color32::from_rgba_unmultiplied(107, 122, 157, 242);
    let font = egui::FontId::proportional(11.0);
    painter.text(
        egui::pos2(rect.left() + 8.0, rect.top() + PAD_T + 4.0),
        egui::Align2::LEFT_TOP,
        format!("{:.1}%", scales.max_y * 100.0),
        font.clone(),
        label_color,
    );
    painter.text(
        egui::pos2(rect.left() + 8.0, rect.bottom() - PAD_B - 10.0),
        egui::Align2::LEFT_TOP,
        format!("{:.1}%", scales.min_y * 100.0),
        font.clone(),
        label_color,
    );
    painter.text(
        egui::pos2(rect.left() + PAD_L, rect.bottom() - 14.0),
        egui::Align2::LEFT_TOP,
        format!("{} km", scales.min_x.round()),
        font.clone(),
        label_color,
    );
    painter.text(
        egui::pos2(rect.right() - 70.0, rect.bottom() - 14.0),
        egui::Align2::LEFT_TOP,
        format!("{} km", scales.max_x.round()),
        font,
        label_color,
    );
}

/// Full-frame redraw of the line chart at raw animation fraction `t`. Each
/// vertex is lifted from the baseline toward its true height by the eased
/// fraction; markers and the highlight line join once the reveal threshold
/// passes on elapsed time.
pub fn draw_line_chart(
    painter: &egui::Painter,
    rect: egui::Rect,
    points: &[ChartPoint],
    highlight_alt_km: f64,
    t: f64,
) {
    draw_chart_frame(painter, rect);
    draw_grid(painter, rect);
    if points.is_empty() {
        painter.text(
            rect.center(),
            egui::Align2::CENTER_CENTER,
            "risk data unavailable",
            egui::FontId::proportional(12.0),
            egui::Color32::from_rgba_unmultiplied(107, 122, 157, 242),
        );
        return;
    }

    let scales = ChartScales::from_points(points);
    draw_axis_labels(painter, rect, &scales);

    let baseline = rect.bottom() - PAD_B;
    let lift = ease_out_cubic(t) as f32;
    let path: Vec<egui::Pos2> = points
        .iter()
        .map(|p| {
            let x = scales.x_to_px(rect, p.altitude_km);
            let y = lerp(baseline, scales.y_to_px(rect, p.risk), lift);
            egui::pos2(x, y)
        })
        .collect();

    // Wide glow pass under a thin bright pass.
    painter.add(egui::Shape::line(
        path.clone(),
        egui::Stroke::new(2.2, egui::Color32::from_rgba_unmultiplied(0, 229, 255, 242)),
    ));
    painter.add(egui::Shape::line(
        path,
        egui::Stroke::new(1.4, egui::Color32::from_rgba_unmultiplied(232, 237, 248, 191)),
    ));

    if markers_revealed(t) {
        for p in points {
            painter.circle_filled(
                egui::pos2(
                    scales.x_to_px(rect, p.altitude_km),
                    scales.y_to_px(rect, p.risk),
                ),
                3.2,
                egui::Color32::from_rgba_unmultiplied(255, 255, 255, 217),
            );
        }

        let hx = scales.x_to_px(rect, highlight_alt_km);
        painter.line_segment(
            [
                egui::pos2(hx, rect.top() + 12.0),
                egui::pos2(hx, baseline),
            ],
            egui::Stroke::new(1.2, egui::Color32::from_rgba_unmultiplied(124, 58, 255, 217)),
        );
        painter.text(
            egui::pos2((hx + 8.0).min(rect.right() - 110.0), rect.top() + 28.0),
            egui::Align2::LEFT_TOP,
            format!("alt {} km", highlight_alt_km.round()),
            egui::FontId::proportional(12.0),
            egui::Color32::from_rgba_unmultiplied(124, 58, 255, 242),
        );
    }
}

/// Single non-animated redraw: one vertical band per sample, colored by the
/// risk ramp.
pub fn draw_heatmap(
    painter: &egui::Painter,
    rect: egui::Rect,
    points: &[ChartPoint],
    inclination_deg: f64,
) {
    painter.rect_filled(
        rect,
        0,
        egui::Color32::from_rgba_unmultiplied(6, 10, 24, 242),
    );
    painter.text(
        egui::pos2(rect.left() + 14.0, rect.top() + 8.0),
        egui::Align2::LEFT_TOP,
        format!("LEO Risk Heatmap  |  inclination={}\u{b0}", inclination_deg),
        egui::FontId::proportional(12.0),
        egui::Color32::from_rgba_unmultiplied(0, 229, 255, 204),
    );

    let grid_stroke =
        egui::Stroke::new(1.0, egui::Color32::from_rgba_unmultiplied(0, 229, 255, 20));
    for i in 0..=6 {
        let x = rect.left()
            + HEAT_PAD_L
            + i as f32 * (rect.width() - HEAT_PAD_L - HEAT_PAD_R) / 6.0;
        painter.line_segment(
            [
                egui::pos2(x, rect.top() + HEAT_PAD_T),
                egui::pos2(x, rect.bottom() - HEAT_PAD_B),
            ],
            grid_stroke,
        );
    }
    for i in 0..=4 {
        let y = rect.top()
            + HEAT_PAD_T
            + i as f32 * (rect.height() - HEAT_PAD_T - HEAT_PAD_B) / 4.0;
        painter.line_segment(
            [
                egui::pos2(rect.left() + HEAT_PAD_L, y),
                egui::pos2(rect.right() - HEAT_PAD_R, y),
            ],
            grid_stroke,
        );
    }

    if points.is_empty() {
        return;
    }

    let band_h = rect.height() - HEAT_PAD_T - HEAT_PAD_B;
    let step_w = (rect.width() - HEAT_PAD_L - HEAT_PAD_R) / points.len().max(1) as f32;
    for (i, p) in points.iter().enumerate() {
        let x = rect.left() + HEAT_PAD_L + i as f32 * step_w;
        painter.rect_filled(
            egui::Rect::from_min_size(
                egui::pos2(x, rect.top() + HEAT_PAD_T),
                egui::vec2(step_w + 1.0, band_h),
            ),
            0,
            risk_to_color(p.risk),
        );
    }

    let label_color = egui::Color32::from_rgba_unmultiplied(255, 255, 255, 166);
    let font = egui::FontId::proportional(11.0);
    painter.text(
        egui::pos2(rect.left() + HEAT_PAD_L, rect.bottom() - 20.0),
        egui::Align2::LEFT_TOP,
        format!("{} km", points[0].altitude_km.round()),
        font.clone(),
        label_color,
    );
    painter.text(
        egui::pos2(rect.right() - 70.0, rect.bottom() - 20.0),
        egui::Align2::LEFT_TOP,
        format!("{} km", points[points.len() - 1].altitude_km.round()),
        font,
        label_color,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alpha_byte(alpha: f64) -> u8 {
        (alpha * 255.0).round() as u8
    }

    #[test]
    fn scales_pad_and_clamp_the_risk_axis() {
        let points = [
            ChartPoint { altitude_km: 300.0, risk: 0.2 },
            ChartPoint { altitude_km: 700.0, risk: 0.4 },
        ];
        let s = ChartScales::from_points(&points);
        assert_eq!(s.min_x, 300.0);
        assert_eq!(s.max_x, 700.0);
        assert!((s.min_y - 0.176).abs() < 1e-12);
        assert!((s.max_y - 0.436).abs() < 1e-12);

        let extremes = [
            ChartPoint { altitude_km: 300.0, risk: 0.0 },
            ChartPoint { altitude_km: 700.0, risk: 1.0 },
        ];
        let s = ChartScales::from_points(&extremes);
        assert_eq!(s.min_y, 0.0);
        assert_eq!(s.max_y, 1.0);
    }

    #[test]
    fn flat_data_uses_the_minimum_span() {
        let points = [
            ChartPoint { altitude_km: 300.0, risk: 0.5 },
            ChartPoint { altitude_km: 700.0, risk: 0.5 },
        ];
        let s = ChartScales::from_points(&points);
        assert!((s.min_y - (0.5 - 0.01 * 0.12)).abs() < 1e-12);
        assert!((s.max_y - (0.5 + 0.01 * 0.18)).abs() < 1e-12);
    }

    #[test]
    fn ramp_segments_follow_the_formulas() {
        let low = risk_to_color(0.0);
        assert_eq!((low.r(), low.g(), low.b()), (0, 229, 255));
        assert_eq!(low.a(), alpha_byte(0.15));

        let mid = risk_to_color(0.5);
        assert_eq!((mid.r(), mid.g(), mid.b()), (245, 200, 66));
        assert_eq!(mid.a(), alpha_byte(0.15 + (0.5 - 0.33) * 0.9));

        let high = risk_to_color(1.0);
        assert_eq!((high.r(), high.g(), high.b()), (255, 77, 109));
        assert_eq!(high.a(), alpha_byte(0.15 + (1.0 - 0.66) * 1.2));
    }

    #[test]
    fn ramp_boundaries_match_their_segment_formulas() {
        let just_below = risk_to_color(0.33 - 1e-9);
        assert_eq!((just_below.r(), just_below.g(), just_below.b()), (0, 229, 255));
        assert_eq!(just_below.a(), alpha_byte(0.15 + 0.33 * 0.6));

        let at_boundary = risk_to_color(0.33);
        assert_eq!((at_boundary.r(), at_boundary.g(), at_boundary.b()), (245, 200, 66));
        assert_eq!(at_boundary.a(), alpha_byte(0.15));

        let out_of_range = risk_to_color(3.0);
        assert_eq!(out_of_range, risk_to_color(1.0));
    }

    #[test]
    fn animation_fraction_is_monotonic_and_clamped() {
        let mut anim = SurfaceAnimation::new(0.65);
        anim.restart(10.0);
        let samples = [10.0, 10.1, 10.3, 10.5, 10.65, 11.0];
        let mut last = -1.0;
        for now in samples {
            let f = anim.fraction(now);
            assert!((0.0..=1.0).contains(&f));
            assert!(f >= last);
            last = f;
        }
        assert_eq!(anim.fraction(10.0), 0.0);
        assert_eq!(anim.fraction(11.0), 1.0);
    }

    #[test]
    fn restart_cancels_the_previous_run() {
        let mut anim = SurfaceAnimation::new(0.65);
        anim.restart(10.0);
        let first_gen = anim.generation();
        assert!(anim.finished(11.0));

        anim.restart(11.0);
        assert_ne!(anim.generation(), first_gen);
        // The surface is back at the baseline: the old run no longer drives it.
        assert_eq!(anim.fraction(11.0), 0.0);
        assert!(!anim.finished(11.0));
    }

    #[test]
    fn unstarted_surface_draws_settled() {
        let anim = SurfaceAnimation::new(0.65);
        assert_eq!(anim.fraction(123.0), 1.0);
    }

    #[test]
    fn easing_fixes_the_endpoints() {
        assert_eq!(ease_out_cubic(0.0), 0.0);
        assert_eq!(ease_out_cubic(1.0), 1.0);
        assert!(ease_out_cubic(0.5) > 0.5);
    }

    #[test]
    fn reveal_tracks_elapsed_time_not_the_eased_lift() {
        // Halfway through, the eased lift is already past the threshold but
        // markers must stay hidden until 85% of elapsed time.
        assert!(ease_out_cubic(0.5) > MARKER_REVEAL_FRACTION);
        assert!(!markers_revealed(0.5));
        assert!(!markers_revealed(MARKER_REVEAL_FRACTION));
        assert!(markers_revealed(0.9));
    }
}
