//! 3D globe view: point cloud, orbit track, and highlight marker.
//!
//! Software-projected scene drawn through an egui plot with fixed bounds.
//! The satellite point cloud mirrors the tracker's shared position buffer and
//! is refreshed only when the tracker marks it dirty; the view itself redraws
//! every frame with a constant slow Earth spin, drag rotation, and scroll
//! zoom.

use eframe::egui;
use egui_plot::{Line, Plot, PlotPoints, Points, Polygon};
use nalgebra::{Matrix3, Vector3};
use std::f64::consts::PI;

use crate::math::{rotate_point_matrix, rotation_about_y, rotation_from_drag};

const STAR_COUNT: usize = 900;
const EARTH_VISUAL_RADIUS: f64 = 0.95;
const EARTH_SPIN_PER_FRAME: f64 = 0.0012;

const COLOR_SATELLITE: egui::Color32 = egui::Color32::from_rgb(154, 167, 199);
const COLOR_TRACK: egui::Color32 = egui::Color32::from_rgb(124, 58, 255);
const COLOR_HIGHLIGHT: egui::Color32 = egui::Color32::from_rgb(255, 77, 109);

pub fn dim_color(color: egui::Color32) -> egui::Color32 {
    egui::Color32::from_rgba_unmultiplied(
        (color.r() as f32 * 0.4) as u8,
        (color.g() as f32 * 0.4) as u8,
        (color.b() as f32 * 0.4) as u8,
        200,
    )
}

pub(crate) struct SceneState {
    pub(crate) rotation: Matrix3<f64>,
    pub(crate) zoom: f64,
    spin: f64,
    stars: Vec<Vector3<f64>>,
    /// Renderer-side copy of the tracker's position buffer, refreshed only on
    /// a dirty tick.
    cloud: Vec<Vector3<f64>>,
    pub(crate) density: Vec<Vector3<f64>>,
    pub(crate) highlight: Option<Vector3<f64>>,
    track: Option<Vec<Vector3<f64>>>,
    /// Inclination ring: (radius in scene units, inclination in degrees).
    pub(crate) ring: Option<(f64, f64)>,
}

impl SceneState {
    pub(crate) fn new() -> Self {
        Self {
            rotation: Matrix3::identity(),
            zoom: 1.0,
            spin: 0.0,
            stars: star_field(STAR_COUNT),
            cloud: Vec::new(),
            density: Vec::new(),
            highlight: None,
            track: None,
            ring: None,
        }
    }

    /// Refreshes the renderer-side point buffer from the tracker's shared
    /// buffer. Called only when the tracker reported a dirty tick.
    pub(crate) fn upload_points(&mut self, positions: &[f32]) {
        self.cloud.clear();
        self.cloud.reserve(positions.len() / 3);
        for chunk in positions.chunks_exact(3) {
            self.cloud.push(Vector3::new(
                chunk[0] as f64,
                chunk[1] as f64,
                chunk[2] as f64,
            ));
        }
    }

    /// Replaces the orbit track. The previous polyline is dropped before the
    /// new one is attached; at most one exists at a time.
    pub(crate) fn set_track(&mut self, track: Option<Vec<Vector3<f64>>>) {
        self.track = track;
    }

    pub(crate) fn track(&self) -> Option<&[Vector3<f64>]> {
        self.track.as_deref()
    }

    pub(crate) fn draw(&mut self, ui: &mut egui::Ui, width: f32, height: f32) {
        self.spin += EARTH_SPIN_PER_FRAME;
        let margin = 2.3 / self.zoom;
        let rotation = self.rotation;

        let rotate = |p: &Vector3<f64>| rotate_point_matrix(p.x, p.y, p.z, &rotation);

        let plot = Plot::new("globe")
            .data_aspect(1.0)
            .width(width)
            .height(height)
            .show_axes(false)
            .show_grid(false)
            .show_x(false)
            .show_y(false)
            .allow_drag(false)
            .allow_zoom(false)
            .allow_scroll(false)
            .allow_boxed_zoom(false)
            .cursor_color(egui::Color32::TRANSPARENT);

        let response = plot.show(ui, |plot_ui| {
            plot_ui.set_plot_bounds(egui_plot::PlotBounds::from_min_max(
                [-margin, -margin],
                [margin, margin],
            ));

            let star_pts: PlotPoints = self.stars.iter().map(|p| {
                let (rx, ry, _) = rotate(p);
                [rx, ry]
            }).collect();
            plot_ui.points(
                Points::new("", star_pts)
                    .color(egui::Color32::from_rgba_unmultiplied(255, 255, 255, 90))
                    .radius(0.9),
            );

            // Behind-Earth passes draw dim, then the disc covers whatever sits
            // inside its rim.
            let behind: PlotPoints = self.cloud.iter().filter_map(|p| {
                let (rx, ry, rz) = rotate(p);
                (rz < 0.0).then_some([rx, ry])
            }).collect();
            plot_ui.points(
                Points::new("", behind)
                    .color(dim_color(COLOR_SATELLITE))
                    .radius(1.4)
                    .filled(true),
            );

            if let Some(track) = &self.track {
                for segment in split_segments(track, &rotation, false) {
                    plot_ui.line(
                        Line::new("", PlotPoints::new(segment))
                            .color(dim_color(COLOR_TRACK))
                            .width(1.5),
                    );
                }
            }

            let earth_pts: PlotPoints = (0..=100)
                .map(|i| {
                    let theta = 2.0 * PI * i as f64 / 100.0;
                    [
                        EARTH_VISUAL_RADIUS * theta.cos(),
                        EARTH_VISUAL_RADIUS * theta.sin(),
                    ]
                })
                .collect();
            plot_ui.polygon(
                Polygon::new("", earth_pts)
                    .fill_color(egui::Color32::from_rgb(11, 18, 40))
                    .stroke(egui::Stroke::new(
                        1.5,
                        egui::Color32::from_rgb(70, 130, 180),
                    )),
            );

            self.draw_graticule(plot_ui, &rotation);

            if let Some((radius, inclination_deg)) = self.ring {
                let inc = inclination_deg.to_radians();
                let ring_pts: Vec<[f64; 2]> = (0..=128)
                    .map(|i| {
                        let theta = 2.0 * PI * i as f64 / 128.0;
                        let p = Vector3::new(
                            radius * theta.cos() * inc.cos(),
                            radius * theta.cos() * inc.sin(),
                            radius * theta.sin(),
                        );
                        let (rx, ry, _) = rotate(&p);
                        [rx, ry]
                    })
                    .collect();
                plot_ui.line(
                    Line::new("", PlotPoints::new(ring_pts))
                        .color(egui::Color32::from_rgba_unmultiplied(124, 58, 255, 120))
                        .width(1.0),
                );
            }

            let density_pts: PlotPoints = self.density.iter().filter_map(|p| {
                let (rx, ry, rz) = rotate(p);
                (rz >= 0.0).then_some([rx, ry])
            }).collect();
            plot_ui.points(
                Points::new("", density_pts)
                    .color(egui::Color32::from_rgba_unmultiplied(154, 167, 199, 80))
                    .radius(1.0)
                    .filled(true),
            );

            if let Some(track) = &self.track {
                for segment in split_segments(track, &rotation, true) {
                    plot_ui.line(
                        Line::new("", PlotPoints::new(segment))
                            .color(COLOR_TRACK)
                            .width(1.5),
                    );
                }
            }

            let front: PlotPoints = self.cloud.iter().filter_map(|p| {
                let (rx, ry, rz) = rotate(p);
                (rz >= 0.0).then_some([rx, ry])
            }).collect();
            plot_ui.points(
                Points::new("", front)
                    .color(COLOR_SATELLITE)
                    .radius(1.8)
                    .filled(true),
            );

            if let Some(p) = &self.highlight {
                let (rx, ry, rz) = rotate(p);
                let color = if rz < 0.0 {
                    dim_color(COLOR_HIGHLIGHT)
                } else {
                    COLOR_HIGHLIGHT
                };
                plot_ui.points(
                    Points::new("", PlotPoints::new(vec![[rx, ry]]))
                        .color(color)
                        .radius(4.5)
                        .filled(true),
                );
            }
        });

        if response.response.dragged() && !response.response.drag_started() {
            let drag = response.response.drag_delta();
            let sens = 0.01 / self.zoom.max(1.0);
            let delta_rot = rotation_from_drag(drag.x as f64 * sens, drag.y as f64 * sens);
            self.rotation = delta_rot * self.rotation;
        }

        if response.response.hovered() {
            let scroll = ui.input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                let factor = 1.0 + scroll as f64 * 0.001;
                self.zoom = (self.zoom * factor).clamp(0.2, 20.0);
            }
        }
    }

    fn draw_graticule(&self, plot_ui: &mut egui_plot::PlotUi<'_>, rotation: &Matrix3<f64>) {
        let color = egui::Color32::from_rgba_unmultiplied(70, 130, 180, 60);
        // Graticule lines spin slowly about the pole axis so the globe
        // visibly turns even with no user input.
        let view = rotation * rotation_about_y(self.spin);

        let mut circles: Vec<Vec<Vector3<f64>>> = Vec::new();
        circles.push(
            (0..=72)
                .map(|i| {
                    let lon = 2.0 * PI * i as f64 / 72.0;
                    Vector3::new(
                        EARTH_VISUAL_RADIUS * lon.cos(),
                        0.0,
                        EARTH_VISUAL_RADIUS * lon.sin(),
                    )
                })
                .collect(),
        );
        for k in 0..4 {
            let lon = k as f64 * PI / 4.0;
            circles.push(
                (0..=36)
                    .map(|i| {
                        let lat = -PI / 2.0 + PI * i as f64 / 36.0;
                        Vector3::new(
                            EARTH_VISUAL_RADIUS * lat.cos() * lon.cos(),
                            EARTH_VISUAL_RADIUS * lat.sin(),
                            EARTH_VISUAL_RADIUS * lat.cos() * lon.sin(),
                        )
                    })
                    .collect(),
            );
        }

        for circle in &circles {
            for segment in split_segments(circle, &view, true) {
                plot_ui.line(
                    Line::new("", PlotPoints::new(segment))
                        .color(color)
                        .width(0.8),
                );
            }
        }
    }
}

/// Splits a polyline into runs on one side of the view plane: `front` keeps
/// rz >= 0, otherwise the hidden side.
fn split_segments(
    points: &[Vector3<f64>],
    rotation: &Matrix3<f64>,
    front: bool,
) -> Vec<Vec<[f64; 2]>> {
    let mut segments = Vec::new();
    let mut current: Vec<[f64; 2]> = Vec::new();
    for p in points {
        let (rx, ry, rz) = rotate_point_matrix(p.x, p.y, p.z, rotation);
        let keep = if front { rz >= 0.0 } else { rz < 0.0 };
        if keep {
            current.push([rx, ry]);
        } else if !current.is_empty() {
            segments.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

/// Deterministic star shell around the globe. A small LCG keeps the layout
/// stable across frames and runs without a rand dependency.
fn star_field(count: usize) -> Vec<Vector3<f64>> {
    let mut seed: u64 = 0x5eed_cafe;
    let mut next = move || {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (seed >> 11) as f64 / (1u64 << 53) as f64
    };
    (0..count)
        .map(|_| {
            let r = 1.9 + next() * 1.4;
            let theta = next() * 2.0 * PI;
            let phi = (2.0 * next() - 1.0).acos();
            Vector3::new(
                r * phi.sin() * theta.cos(),
                r * phi.cos(),
                r * phi.sin() * theta.sin(),
            )
        })
        .collect()
}
